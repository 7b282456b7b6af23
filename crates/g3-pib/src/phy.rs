// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

// PhyPort trait - the store's view of the PLC and RF transceivers.
//
// The store never talks to hardware directly: tone mask updates, PHY
// parameter reads/writes and debug reads go through this trait.

use std::collections::BTreeMap;

use crate::band::TONE_MASK_LEN;
use crate::error::AttrError;
use crate::id::{PhyParam, RfPhyParam};
use crate::value::AttributeValue;

/// Transceiver side of the information base.
///
/// Values cross this boundary in native encoding (packed little-endian).
/// Width and access checks have already been done by the store.
pub trait PhyPort: Send {
    /// Apply a new tone mask to the PLC transceiver.
    fn set_tone_mask(&mut self, mask: &[u8; TONE_MASK_LEN]);

    fn get_param(&mut self, param: PhyParam) -> Result<AttributeValue, AttrError>;

    fn set_param(&mut self, param: PhyParam, value: &[u8]) -> Result<(), AttrError>;

    fn get_rf_param(&mut self, param: RfPhyParam) -> Result<AttributeValue, AttrError>;

    fn set_rf_param(&mut self, param: RfPhyParam, value: &[u8]) -> Result<(), AttrError>;

    /// Clear the PLC transceiver statistics.
    fn reset_stats(&mut self);

    /// Clear the RF transceiver statistics.
    fn reset_rf_stats(&mut self);

    /// Read `len` bytes of transceiver memory described by a debug request.
    fn debug_read(&mut self, request: &[u8], len: usize) -> AttributeValue;
}

// ---------------------------------------------------------------------------
// Simulated transceiver
// ---------------------------------------------------------------------------

const SIM_PHY_VERSION: u32 = 0x3602_0A01;
const SIM_RF_DEVICE_ID: u16 = 0x0C34;
const SIM_RF_FW_VERSION: [u8; 6] = [1, 0, 2, 24, 6, 12];

/// In-memory transceiver pair. Useful for the console and for tests
/// that do not have hardware attached.
#[derive(Debug, Clone)]
pub struct SimulatedPhy {
    tone_mask: [u8; TONE_MASK_LEN],
    plc: BTreeMap<PhyParam, AttributeValue>,
    rf: BTreeMap<RfPhyParam, AttributeValue>,
    mask_updates: u32,
}

impl SimulatedPhy {
    pub fn new() -> Self {
        let mut phy = Self {
            tone_mask: [0u8; TONE_MASK_LEN],
            plc: BTreeMap::new(),
            rf: BTreeMap::new(),
            mask_updates: 0,
        };
        for &p in PhyParam::ALL {
            phy.plc.insert(p, zero(p.width()));
        }
        for &p in RfPhyParam::ALL {
            phy.rf.insert(p, zero(p.width()));
        }
        phy.plc.insert(PhyParam::Version, AttributeValue::from_u32(SIM_PHY_VERSION));
        phy.rf.insert(RfPhyParam::DeviceId, AttributeValue::from_u16(SIM_RF_DEVICE_ID));
        if let Ok(v) = AttributeValue::from_slice(&SIM_RF_FW_VERSION) {
            phy.rf.insert(RfPhyParam::FwVersion, v);
        }
        phy.rf.insert(RfPhyParam::TurnaroundTime, AttributeValue::from_u16(1000));
        phy
    }

    /// Tone mask last pushed by the store.
    pub fn tone_mask(&self) -> [u8; TONE_MASK_LEN] {
        self.tone_mask
    }

    /// Number of tone mask pushes received.
    pub fn mask_updates(&self) -> u32 {
        self.mask_updates
    }

    /// Stack-side update of a PLC statistic, bypassing access checks.
    pub fn record(&mut self, param: PhyParam, value: u32) {
        let v = match param.width() {
            4 => AttributeValue::from_u32(value),
            2 => AttributeValue::from_u16(value as u16),
            _ => AttributeValue::from_u8(value as u8),
        };
        self.plc.insert(param, v);
    }
}

impl Default for SimulatedPhy {
    fn default() -> Self {
        Self::new()
    }
}

fn zero(width: usize) -> AttributeValue {
    AttributeValue::from_slice(&[0u8; 8][..width.min(8)]).unwrap_or_default()
}

impl PhyPort for SimulatedPhy {
    fn set_tone_mask(&mut self, mask: &[u8; TONE_MASK_LEN]) {
        self.tone_mask = *mask;
        self.mask_updates += 1;
    }

    fn get_param(&mut self, param: PhyParam) -> Result<AttributeValue, AttrError> {
        self.plc.get(&param).cloned().ok_or(AttrError::InvalidIndex)
    }

    fn set_param(&mut self, param: PhyParam, value: &[u8]) -> Result<(), AttrError> {
        let v = AttributeValue::from_slice(value)?;
        self.plc.insert(param, v);
        Ok(())
    }

    fn get_rf_param(&mut self, param: RfPhyParam) -> Result<AttributeValue, AttrError> {
        self.rf.get(&param).cloned().ok_or(AttrError::InvalidIndex)
    }

    fn set_rf_param(&mut self, param: RfPhyParam, value: &[u8]) -> Result<(), AttrError> {
        if param == RfPhyParam::CcaEdConfig && value.len() == 3 {
            // the aggregate also updates its two members
            self.rf.insert(
                RfPhyParam::CcaEdDuration,
                AttributeValue::from_slice(&value[..2])?,
            );
            self.rf.insert(
                RfPhyParam::CcaEdThreshold,
                AttributeValue::from_u8(value[2]),
            );
        }
        self.rf.insert(param, AttributeValue::from_slice(value)?);
        Ok(())
    }

    fn reset_stats(&mut self) {
        for (p, v) in self.plc.iter_mut() {
            if p.is_statistic() {
                *v = zero(p.width());
            }
        }
    }

    fn reset_rf_stats(&mut self) {
        for (p, v) in self.rf.iter_mut() {
            if p.is_statistic() {
                *v = zero(p.width());
            }
        }
    }

    fn debug_read(&mut self, request: &[u8], len: usize) -> AttributeValue {
        // deterministic pattern seeded by the requested address
        let seed = request.get(1).copied().unwrap_or(0);
        let bytes: Vec<u8> = (0..len).map(|i| seed.wrapping_add(i as u8)).collect();
        AttributeValue::from_slice(&bytes).unwrap_or_default()
    }
}
