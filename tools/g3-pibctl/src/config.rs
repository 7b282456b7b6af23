// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Console configuration.
//!
//! Describes the simulated modem the console drives: frequency plan,
//! stack profile, table capacities and a list of attribute writes applied
//! through the management plane before any command runs.

use g3_pib::{Band, PibConfig, Registry, TableSizes};
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

impl From<g3_pib::ConfigError> for ConfigError {
    fn from(e: g3_pib::ConfigError) -> Self {
        match e {
            g3_pib::ConfigError::Invalid(msg) => ConfigError::Invalid(msg),
        }
    }
}

/// Console configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsoleConfig {
    /// Modem name (for identification).
    #[serde(default = "default_name")]
    pub name: String,

    /// Log level.
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Frequency plan: cenelec-a, cenelec-b, fcc or arib.
    #[serde(default = "default_band")]
    pub band: String,

    /// G3 specification compliance (15 or 17).
    #[serde(default = "default_spec_compliance")]
    pub spec_compliance: u8,

    /// Node acts as PAN coordinator.
    #[serde(default)]
    pub coordinator: bool,

    /// PLC + RF hybrid profile.
    #[serde(default = "default_true")]
    pub hybrid: bool,

    /// Mirror data-plane traffic on the sniffer port.
    #[serde(default = "default_true")]
    pub sniffer: bool,

    /// Table capacity overrides.
    #[serde(default)]
    pub tables: TableOverrides,

    /// Attribute writes applied on start.
    #[serde(default, rename = "preset")]
    pub presets: Vec<Preset>,
}

fn default_name() -> String {
    "g3-modem".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_band() -> String {
    Band::CenelecA.name().to_string()
}

fn default_spec_compliance() -> u8 {
    17
}

fn default_true() -> bool {
    true
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            log_level: default_log_level(),
            band: default_band(),
            spec_compliance: 17,
            coordinator: false,
            hybrid: true,
            sniffer: true,
            tables: TableOverrides::default(),
            presets: Vec::new(),
        }
    }
}

/// Row capacities that differ from the library defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TableOverrides {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub neighbour: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prefix: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub routing: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub broadcast_log: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blacklist: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destination_set: Option<u16>,
}

impl TableOverrides {
    fn apply(&self, sizes: &mut TableSizes) {
        let pairs = [
            (self.neighbour, &mut sizes.neighbour),
            (self.device, &mut sizes.device),
            (self.context, &mut sizes.context),
            (self.prefix, &mut sizes.prefix),
            (self.routing, &mut sizes.routing),
            (self.broadcast_log, &mut sizes.broadcast_log),
            (self.group, &mut sizes.group),
            (self.blacklist, &mut sizes.blacklist),
            (self.destination_set, &mut sizes.destination_set),
        ];
        for (over, slot) in pairs {
            if let Some(rows) = over {
                *slot = rows;
            }
        }
    }
}

/// One attribute write, expressed as it travels on the management plane.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preset {
    /// "adp" or "mac".
    pub registry: String,

    /// Raw attribute id.
    pub id: u32,

    #[serde(default)]
    pub index: u16,

    /// Value in wire order, as hex digits.
    pub value: String,
}

impl Preset {
    pub fn new(registry: &str, id: u32, index: u16, value: &str) -> Self {
        Self {
            registry: registry.to_string(),
            id,
            index,
            value: value.to_string(),
        }
    }

    pub fn registry(&self) -> Result<Registry, ConfigError> {
        parse_registry(&self.registry)
    }

    pub fn value_bytes(&self) -> Result<Vec<u8>, ConfigError> {
        parse_hex(&self.value)
    }
}

/// Parses a registry name as used on the command line and in presets.
pub fn parse_registry(name: &str) -> Result<Registry, ConfigError> {
    match name.to_ascii_lowercase().as_str() {
        "adp" => Ok(Registry::Adp),
        "mac" => Ok(Registry::Mac),
        other => Err(ConfigError::Invalid(format!(
            "unknown registry '{}' (expected adp or mac)",
            other
        ))),
    }
}

/// Parses hex digits, ignoring whitespace, ':' and a leading "0x".
pub fn parse_hex(text: &str) -> Result<Vec<u8>, ConfigError> {
    let trimmed = text.trim();
    let trimmed = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);
    let digits: Vec<u8> = trimmed
        .bytes()
        .filter(|b| !b.is_ascii_whitespace() && *b != b':')
        .collect();
    if digits.len() % 2 != 0 {
        return Err(ConfigError::Invalid(format!(
            "odd number of hex digits in '{}'",
            text
        )));
    }
    digits
        .chunks(2)
        .map(|pair| {
            let s = std::str::from_utf8(pair).unwrap_or("");
            u8::from_str_radix(s, 16)
                .map_err(|_| ConfigError::Invalid(format!("invalid hex byte '{}' in '{}'", s, text)))
        })
        .collect()
}

/// Formats bytes as space-separated hex pairs.
pub fn to_hex(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect::<Vec<_>>()
        .join(" ")
}

impl ConsoleConfig {
    /// Load configuration from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.to_pib_config()?.validate()?;
        for (i, preset) in self.presets.iter().enumerate() {
            preset
                .registry()
                .and_then(|_| preset.value_bytes())
                .map_err(|e| ConfigError::Invalid(format!("preset {}: {}", i, e)))?;
        }
        Ok(())
    }

    /// Store configuration described by this file.
    pub fn to_pib_config(&self) -> Result<PibConfig, ConfigError> {
        let band = Band::from_name(&self.band)
            .ok_or_else(|| ConfigError::Invalid(format!("unknown band '{}'", self.band)))?;
        let mut tables = TableSizes::default();
        self.tables.apply(&mut tables);
        Ok(PibConfig {
            band,
            spec_compliance: self.spec_compliance,
            coordinator: self.coordinator,
            hybrid: self.hybrid,
            tables,
        })
    }

    /// Example configuration written by `gen-config`.
    pub fn example() -> Self {
        Self {
            tables: TableOverrides {
                routing: Some(128),
                ..Default::default()
            },
            presets: vec![
                // PanId
                Preset::new("mac", 0x0000_0050, 0, "78 1d"),
                // MaxHops
                Preset::new("adp", 0x0000_000F, 0, "08"),
            ],
            ..Default::default()
        }
    }
}
