// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Attribute store.
//!
//! Every write follows the same pipeline: resolve the descriptor, check
//! access, check the index, validate the value against the layout and
//! rule, copy it in, and only then run the side effect. A failure at any
//! step leaves the store untouched.

use std::collections::BTreeMap;

use log::{debug, info, warn};

use crate::band::{Band, MacConstants, TONE_MASK_LEN};
use crate::catalog::{
    self, phy_param_shape, rf_phy_param_shape, AttributeDescriptor, Derive, Effect, Field, Init,
    PhyBus, Rows, Rule, TableKind,
};
use crate::config::PibConfig;
use crate::error::{AttrError, ConfigError};
use crate::id::{AttributeId, PhyParam, PlcAttr, RfAttr, RfPhyParam};
use crate::phy::PhyPort;
use crate::value::{AttributeValue, MAX_VALUE_LEN};

/// Version reported by the internal-version attributes: major, minor,
/// revision, year, month, day.
pub const STACK_VERSION: [u8; 6] = [3, 0, 0, 26, 1, 15];

/// Upper bound shared by both backoff exponents.
const MAX_BE_LIMIT: u32 = 20;

/// Current values of the information base.
pub struct AttributeStore {
    config: PibConfig,
    phy: Box<dyn PhyPort>,
    /// Scalar values, one slot per catalog entry.
    values: Vec<AttributeValue>,
    /// Sparse rows of every indexed attribute.
    tables: BTreeMap<TableKind, BTreeMap<u16, AttributeValue>>,
    timing: MacConstants,
    generation: u32,
}

impl AttributeStore {
    /// Create a store with every attribute at its default and push the
    /// band tone mask to the transceiver.
    pub fn new(config: PibConfig, phy: Box<dyn PhyPort>) -> Result<Self, ConfigError> {
        config.validate()?;
        let band = config.band;
        let mut store = Self {
            config,
            phy,
            values: vec![AttributeValue::empty(); catalog::len()],
            tables: TableKind::ALL.iter().map(|&k| (k, BTreeMap::new())).collect(),
            timing: MacConstants::derive(band, &band.default_tone_mask()),
            generation: 0,
        };
        store.reset();
        info!(
            "attribute store initialized: band={} compliance={} hybrid={} coordinator={}",
            band, store.config.spec_compliance, store.config.hybrid, store.config.coordinator
        );
        Ok(store)
    }

    pub fn config(&self) -> &PibConfig {
        &self.config
    }

    pub fn band(&self) -> Band {
        self.config.band
    }

    /// Bumped on every band change. Data-plane geometry derived under an
    /// older generation is stale.
    pub fn generation(&self) -> u32 {
        self.generation
    }

    pub fn timing(&self) -> &MacConstants {
        &self.timing
    }

    /// Direct access to the transceiver, bypassing the attribute rules.
    /// Nothing written here is reflected in the stored attributes.
    pub fn phy_mut(&mut self) -> &mut dyn PhyPort {
        self.phy.as_mut()
    }

    /// Restore every attribute to its default and clear every table.
    ///
    /// A coordinator starts with short address 0x0000 and a zero route cost
    /// to the coordinator; every other node starts with 0xFFFF for both.
    pub fn reset(&mut self) {
        let band = self.config.band;
        let coordinator = self.config.coordinator;
        for (slot, d) in catalog::iter().enumerate() {
            self.values[slot] = default_value(d, band, coordinator);
        }
        for rows in self.tables.values_mut() {
            rows.clear();
        }
        self.apply_tone_mask(band.default_tone_mask());
    }

    /// Switch frequency plan and reset.
    pub fn reinitialize(&mut self, band: Band) {
        self.config.band = band;
        self.generation = self.generation.wrapping_add(1);
        self.reset();
        info!("band changed to {} (generation {})", band, self.generation);
    }

    // -----------------------------------------------------------------------
    // Read path
    // -----------------------------------------------------------------------

    pub fn get(&mut self, id: AttributeId, index: u16) -> Result<AttributeValue, AttrError> {
        let (slot, d) = self.resolve(id)?;
        match d.rows {
            Rows::Scalar => {
                if index != 0 {
                    return Err(AttrError::InvalidIndex);
                }
                match d.init {
                    Init::Derived(what) => self.derive(what, d),
                    _ => Ok(self.values[slot].clone()),
                }
            }
            Rows::Table(kind) => {
                self.check_row(kind, index)?;
                Ok(self
                    .tables
                    .get(&kind)
                    .and_then(|rows| rows.get(&index))
                    .cloned()
                    .unwrap_or_default())
            }
            Rows::Lookup(kind) => self.find_row(kind, index).ok_or(AttrError::InvalidIndex),
            Rows::Phy(PhyBus::Plc) => {
                let param = PhyParam::from_raw(index).ok_or(AttrError::InvalidIndex)?;
                self.phy.get_param(param)
            }
            Rows::Phy(PhyBus::Rf) => {
                let param = RfPhyParam::from_raw(index).ok_or(AttrError::InvalidIndex)?;
                self.phy.get_rf_param(param)
            }
        }
    }

    /// Number of occupied rows of a table.
    pub fn rows(&self, kind: TableKind) -> usize {
        self.tables.get(&kind).map_or(0, BTreeMap::len)
    }

    /// Tone mask currently in effect.
    pub fn tone_mask(&self) -> [u8; TONE_MASK_LEN] {
        let mut mask = self.config.band.default_tone_mask();
        let stored = self.stored(PlcAttr::ToneMask.into());
        if stored.len() == TONE_MASK_LEN {
            mask.copy_from_slice(stored.as_bytes());
        }
        mask
    }

    // -----------------------------------------------------------------------
    // Write path
    // -----------------------------------------------------------------------

    /// Management-plane write.
    pub fn set(&mut self, id: AttributeId, index: u16, value: &[u8]) -> Result<(), AttrError> {
        let (slot, d) = self.resolve(id)?;
        if d.is_read_only() {
            return Err(AttrError::ReadOnly);
        }
        self.write(slot, d, index, value)
    }

    /// Stack-side update of telemetry. Skips the access check only.
    pub fn publish(&mut self, id: AttributeId, index: u16, value: &[u8]) -> Result<(), AttrError> {
        let (slot, d) = self.resolve(id)?;
        self.write(slot, d, index, value)
    }

    /// Bump a stored numeric scalar by one, wrapping at its width.
    pub fn increment(&mut self, id: AttributeId) -> Result<(), AttrError> {
        let (slot, d) = self.resolve(id)?;
        if d.rows != Rows::Scalar || matches!(d.init, Init::Derived(_)) {
            return Err(AttrError::InvalidParameter);
        }
        let next = match d.shape.fields {
            [Field::U8] => AttributeValue::from_u8(self.values[slot].as_bytes()[0].wrapping_add(1)),
            [Field::U16] => {
                let v = self.values[slot].as_uint().unwrap_or(0) as u16;
                AttributeValue::from_u16(v.wrapping_add(1))
            }
            [Field::U32] => {
                let v = self.values[slot].as_uint().unwrap_or(0);
                AttributeValue::from_u32(v.wrapping_add(1))
            }
            _ => return Err(AttrError::InvalidParameter),
        };
        self.values[slot] = next;
        Ok(())
    }

    fn write(
        &mut self,
        slot: usize,
        d: &'static AttributeDescriptor,
        index: u16,
        value: &[u8],
    ) -> Result<(), AttrError> {
        match d.rows {
            Rows::Scalar => {
                if index != 0 {
                    return Err(AttrError::InvalidIndex);
                }
                if matches!(d.init, Init::Derived(_)) {
                    return Err(AttrError::ReadOnly);
                }
                d.shape.check(value)?;
                self.validate(d.rule, value)?;
                self.values[slot] = AttributeValue::from_slice(value)?;
                self.apply_effect(d.effect, value);
            }
            Rows::Table(kind) => {
                self.check_row(kind, index)?;
                if value.is_empty() && kind.clearable() {
                    if let Some(rows) = self.tables.get_mut(&kind) {
                        rows.remove(&index);
                    }
                    debug!("clear {}[{}]", d.id, index);
                    return Ok(());
                }
                d.shape.check(value)?;
                self.validate(d.rule, value)?;
                let row = AttributeValue::from_slice(value)?;
                self.tables.entry(kind).or_default().insert(index, row);
            }
            Rows::Lookup(_) => return Err(AttrError::ReadOnly),
            Rows::Phy(bus) => self.write_phy(bus, index, value)?,
        }
        debug!("set {}[{}] = {:02x?}", d.id, index, value);
        Ok(())
    }

    fn write_phy(&mut self, bus: PhyBus, index: u16, value: &[u8]) -> Result<(), AttrError> {
        match bus {
            PhyBus::Plc => {
                let param = PhyParam::from_raw(index).ok_or(AttrError::InvalidIndex)?;
                if param.is_read_only() {
                    return Err(AttrError::ReadOnly);
                }
                phy_param_shape(param).check(value)?;
                if param == PhyParam::ResetPhyStats {
                    self.phy.reset_stats();
                    Ok(())
                } else {
                    self.phy.set_param(param, value)
                }
            }
            PhyBus::Rf => {
                let param = RfPhyParam::from_raw(index).ok_or(AttrError::InvalidIndex)?;
                if param.is_read_only() {
                    return Err(AttrError::ReadOnly);
                }
                rf_phy_param_shape(param).check(value)?;
                if param == RfPhyParam::StatsReset {
                    self.phy.reset_rf_stats();
                    Ok(())
                } else {
                    self.phy.set_rf_param(param, value)
                }
            }
        }
    }

    fn validate(&self, rule: Rule, value: &[u8]) -> Result<(), AttrError> {
        let v = || {
            AttributeValue::from_slice(value)
                .ok()
                .and_then(|v| v.as_uint())
                .ok_or(AttrError::InvalidParameter)
        };
        match rule {
            Rule::Any => Ok(()),
            Rule::Range(lo, hi) => {
                let v = v()?;
                ensure(v >= lo && v <= hi)
            }
            Rule::Bool => ensure(v()? <= 1),
            Rule::MaxBe => {
                let v = v()?;
                let min = self.stored_uint(PlcAttr::MinBe.into());
                let fairness = self.stored_uint(PlcAttr::CsmaFairnessLimit.into());
                ensure(v <= MAX_BE_LIMIT && v > min && fairness >= 2 * (v - min))
            }
            Rule::MinBe => {
                let v = v()?;
                let max = self.stored_uint(PlcAttr::MaxBe.into());
                let fairness = self.stored_uint(PlcAttr::CsmaFairnessLimit.into());
                ensure(v <= MAX_BE_LIMIT && v < max && fairness >= 2 * (max - v))
            }
            Rule::FairnessLimit => {
                let v = v()?;
                let max = self.stored_uint(PlcAttr::MaxBe.into());
                let min = self.stored_uint(PlcAttr::MinBe.into());
                let k = self.stored_uint(PlcAttr::K.into());
                ensure(v >= 2 * max.saturating_sub(min) && v >= k)
            }
            Rule::WindowK => {
                let v = v()?;
                let fairness = self.stored_uint(PlcAttr::CsmaFairnessLimit.into());
                ensure(v >= 1 && v <= fairness)
            }
            Rule::MaxBeRf => {
                let v = v()?;
                let min = self.stored_uint(RfAttr::MinBeRf.into());
                ensure((3..=8).contains(&v) && v >= min)
            }
            Rule::MinBeRf => {
                let v = v()?;
                let max = self.stored_uint(RfAttr::MaxBeRf.into());
                ensure(v <= max)
            }
            Rule::DebugSet => ensure(debug_read_len(value) <= MAX_VALUE_LEN),
        }
    }

    fn apply_effect(&mut self, effect: Effect, value: &[u8]) {
        match effect {
            Effect::None => {}
            Effect::ToneMask => {
                let mut mask = [0u8; TONE_MASK_LEN];
                mask.copy_from_slice(&value[..TONE_MASK_LEN]);
                self.apply_tone_mask(mask);
            }
            Effect::ResetMacStats => self.reset_counters(|id| matches!(id, AttributeId::Plc(_))),
            Effect::ResetMacStatsRf => self.reset_counters(|id| matches!(id, AttributeId::Rf(_))),
            Effect::SecurityReset => {
                if value.first().copied().unwrap_or(0) != 0 {
                    self.reset_security(PlcAttr::FrameCounter.into(), TableKind::Device);
                }
            }
            Effect::SecurityResetRf => {
                if value.first().copied().unwrap_or(0) != 0 {
                    self.reset_security(RfAttr::FrameCounterRf.into(), TableKind::DeviceRf);
                }
            }
        }
    }

    fn apply_tone_mask(&mut self, mask: [u8; TONE_MASK_LEN]) {
        self.timing = MacConstants::derive(self.config.band, &mask);
        self.phy.set_tone_mask(&mask);
        debug!(
            "tone mask {:02x?}: {} carriers, ack wait {} us",
            mask, self.timing.subcarriers, self.timing.ack_wait_duration
        );
        if self.timing.ack_wait_saturated() {
            warn!(
                "ack wait {} us exceeds the 16-bit attribute, reported as 0xFFFF",
                self.timing.ack_wait_duration
            );
        }
    }

    fn reset_counters(&mut self, select: impl Fn(AttributeId) -> bool) {
        for (slot, d) in catalog::iter().enumerate() {
            if d.init == Init::Counter && select(d.id) {
                self.values[slot] = zeros(d.shape.header_len());
            }
        }
        debug!("MAC statistics cleared");
    }

    fn reset_security(&mut self, counter: AttributeId, devices: TableKind) {
        if let Some(slot) = slot_of(counter) {
            self.values[slot] = AttributeValue::from_u32(0);
        }
        if let Some(rows) = self.tables.get_mut(&devices) {
            rows.clear();
        }
        debug!("security state reset: {}", counter);
    }

    // -----------------------------------------------------------------------
    // Helpers
    // -----------------------------------------------------------------------

    fn resolve(&self, id: AttributeId) -> Result<(usize, &'static AttributeDescriptor), AttrError> {
        if !self.config.hybrid && matches!(id, AttributeId::Rf(_)) {
            return Err(AttrError::UnsupportedAttribute);
        }
        catalog::iter()
            .enumerate()
            .find(|(_, d)| d.id == id)
            .ok_or(AttrError::UnsupportedAttribute)
    }

    fn check_row(&self, kind: TableKind, index: u16) -> Result<(), AttrError> {
        if index < self.config.tables.rows(kind) {
            Ok(())
        } else {
            Err(AttrError::InvalidIndex)
        }
    }

    fn find_row(&self, kind: TableKind, short_addr: u16) -> Option<AttributeValue> {
        let key = short_addr.to_le_bytes();
        self.tables
            .get(&kind)?
            .values()
            .find(|row| row.as_bytes().starts_with(&key))
            .cloned()
    }

    fn stored(&self, id: AttributeId) -> &AttributeValue {
        static EMPTY: AttributeValue = AttributeValue::empty();
        slot_of(id).map_or(&EMPTY, |slot| &self.values[slot])
    }

    fn stored_uint(&self, id: AttributeId) -> u32 {
        self.stored(id).as_uint().unwrap_or(0)
    }

    fn derive(&mut self, what: Derive, d: &AttributeDescriptor) -> Result<AttributeValue, AttrError> {
        let legacy = self.config.spec_compliance == 15;
        let value = match what {
            Derive::AckWaitDuration => AttributeValue::from_u16(self.timing.ack_wait_u16()),
            Derive::BandInformation => {
                AttributeValue::from_slice(&self.config.band.info().to_bytes())?
            }
            Derive::CenelecLegacyMode => {
                AttributeValue::from_u8(u8::from(legacy && self.config.band.is_cenelec()))
            }
            Derive::FccLegacyMode => {
                AttributeValue::from_u8(u8::from(legacy && !self.config.band.is_cenelec()))
            }
            Derive::Count(kind) => {
                let n = self.rows(kind);
                if d.shape.fields == [Field::U32] {
                    AttributeValue::from_u32(n as u32)
                } else {
                    AttributeValue::from_u16(n as u16)
                }
            }
            Derive::Version => AttributeValue::from_slice(&STACK_VERSION)?,
            Derive::DebugRead => {
                let request = self.stored(PlcAttr::ManufDebugSet.into()).clone();
                let len = debug_read_len(request.as_bytes());
                if len == 0 {
                    AttributeValue::empty()
                } else {
                    self.phy.debug_read(request.as_bytes(), len)
                }
            }
            Derive::HybridProfile => AttributeValue::from_u8(u8::from(self.config.hybrid)),
        };
        Ok(value)
    }
}

impl std::fmt::Debug for AttributeStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AttributeStore")
            .field("band", &self.config.band)
            .field("generation", &self.generation)
            .field("timing", &self.timing)
            .finish_non_exhaustive()
    }
}

fn ensure(ok: bool) -> Result<(), AttrError> {
    if ok {
        Ok(())
    } else {
        Err(AttrError::InvalidParameter)
    }
}

fn slot_of(id: AttributeId) -> Option<usize> {
    catalog::iter().position(|d| d.id == id)
}

fn zeros(len: usize) -> AttributeValue {
    AttributeValue::from_slice(&[0u8; 16][..len.min(16)]).unwrap_or_default()
}

/// Read length carried big-endian in the last two bytes of a debug request.
fn debug_read_len(request: &[u8]) -> usize {
    match request {
        [.., hi, lo] if request.len() == 7 => usize::from(u16::from_be_bytes([*hi, *lo])),
        _ => 0,
    }
}

fn default_value(d: &AttributeDescriptor, band: Band, coordinator: bool) -> AttributeValue {
    if d.rows != Rows::Scalar {
        return AttributeValue::empty();
    }
    if coordinator
        && (d.id == AttributeId::from(PlcAttr::ShortAddress)
            || d.id == AttributeId::from(PlcAttr::RcCoord))
    {
        return AttributeValue::from_u16(0x0000);
    }
    match d.init {
        Init::Zero | Init::Counter => zeros(d.shape.header_len()),
        Init::U8(v) => AttributeValue::from_u8(v),
        Init::U16(v) => AttributeValue::from_u16(v),
        Init::U32(v) => AttributeValue::from_u32(v),
        Init::ToneMask => {
            AttributeValue::from_slice(&band.default_tone_mask()).unwrap_or_default()
        }
        Init::Empty | Init::Derived(_) => AttributeValue::empty(),
    }
}
