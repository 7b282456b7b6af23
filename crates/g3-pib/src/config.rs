// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

// Information base configuration with validation.

use crate::band::Band;
use crate::catalog::TableKind;
use crate::error::ConfigError;

/// Row capacity of every indexed attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableSizes {
    pub neighbour: u16,
    pub pos: u16,
    pub pos_rf: u16,
    pub device: u16,
    pub device_rf: u16,
    pub context: u16,
    pub prefix: u16,
    pub routing: u16,
    pub broadcast_log: u16,
    pub group: u16,
    pub blacklist: u16,
    pub destination_set: u16,
    pub security_level_rf: u16,
}

impl Default for TableSizes {
    fn default() -> Self {
        Self {
            neighbour: 100,
            pos: 100,
            pos_rf: 100,
            device: 128,
            device_rf: 8,
            context: 16,
            prefix: 16,
            routing: 400,
            broadcast_log: 64,
            group: 16,
            blacklist: 20,
            destination_set: 32,
            security_level_rf: 8,
        }
    }
}

impl TableSizes {
    pub fn rows(&self, kind: TableKind) -> u16 {
        match kind {
            TableKind::Prefix => self.prefix,
            TableKind::Context => self.context,
            TableKind::BroadcastLog => self.broadcast_log,
            TableKind::Routing => self.routing,
            TableKind::Group => self.group,
            TableKind::Blacklist => self.blacklist,
            TableKind::DestinationSet => self.destination_set,
            TableKind::Neighbour => self.neighbour,
            TableKind::Pos => self.pos,
            TableKind::PosRf => self.pos_rf,
            TableKind::Device => self.device,
            TableKind::DeviceRf => self.device_rf,
            TableKind::SecurityLevelRf => self.security_level_rf,
        }
    }
}

/// Configuration for the attribute store.
#[derive(Debug, Clone)]
pub struct PibConfig {
    /// Frequency plan (default: CENELEC-A).
    pub band: Band,
    /// G3 specification compliance, 15 or 17 (default: 17).
    pub spec_compliance: u8,
    /// Node acts as PAN coordinator.
    pub coordinator: bool,
    /// PLC + RF hybrid profile (default: true).
    pub hybrid: bool,
    pub tables: TableSizes,
}

impl Default for PibConfig {
    fn default() -> Self {
        Self {
            band: Band::CenelecA,
            spec_compliance: 17,
            coordinator: false,
            hybrid: true,
            tables: TableSizes::default(),
        }
    }
}

impl PibConfig {
    /// Validate configuration. Returns Ok(()) if valid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.spec_compliance != 15 && self.spec_compliance != 17 {
            return Err(ConfigError::Invalid(format!(
                "spec_compliance must be 15 or 17, got {}",
                self.spec_compliance
            )));
        }
        for kind in TableKind::ALL {
            if self.tables.rows(kind) == 0 {
                return Err(ConfigError::Invalid(format!(
                    "{:?} table must have at least one row",
                    kind
                )));
            }
        }
        // the prefix and context tables are addressed by an 8-bit handle on the stack side
        if self.tables.prefix > 256 || self.tables.context > 256 {
            return Err(ConfigError::Invalid(
                "prefix and context tables are limited to 256 rows".into(),
            ));
        }
        Ok(())
    }
}
