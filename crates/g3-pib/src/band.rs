// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Frequency plans and the values derived from them.
//!
//! The band fixes the data-plane geometry (tone-map size, sub-band and
//! carrier count), the default tone mask and the MAC timing constants.
//! The timing constants additionally depend on how many carriers the
//! current tone mask leaves active.

use std::fmt;

/// Tone mask length in bytes (72 carrier bits).
pub const TONE_MASK_LEN: usize = 9;

/// Transceiver limit on the PSDU length, identical for every band.
pub const MAX_PHY_DATA_LEN: usize = 494;

/// Carrier count used when the tone mask leaves no carrier active.
const FALLBACK_SUBCARRIERS: u32 = 36;

/// PLC frequency plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Band {
    CenelecA,
    CenelecB,
    Fcc,
    Arib,
}

impl Band {
    pub const ALL: [Band; 4] = [Band::CenelecA, Band::CenelecB, Band::Fcc, Band::Arib];

    /// Band identifier as reported in the band information attribute.
    pub fn as_u8(self) -> u8 {
        match self {
            Band::CenelecA => 0,
            Band::Fcc => 1,
            Band::Arib => 2,
            Band::CenelecB => 3,
        }
    }

    pub fn from_u8(v: u8) -> Option<Self> {
        match v {
            0 => Some(Band::CenelecA),
            1 => Some(Band::Fcc),
            2 => Some(Band::Arib),
            3 => Some(Band::CenelecB),
            _ => None,
        }
    }

    /// Parses a configuration name (`cenelec-a`, `cenelec-b`, `fcc`, `arib`).
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "cenelec-a" | "cenelec_a" | "cen-a" => Some(Band::CenelecA),
            "cenelec-b" | "cenelec_b" | "cen-b" => Some(Band::CenelecB),
            "fcc" => Some(Band::Fcc),
            "arib" => Some(Band::Arib),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Band::CenelecA => "cenelec-a",
            Band::CenelecB => "cenelec-b",
            Band::Fcc => "fcc",
            Band::Arib => "arib",
        }
    }

    pub fn is_cenelec(self) -> bool {
        matches!(self, Band::CenelecA | Band::CenelecB)
    }

    pub fn geometry(self) -> BandGeometry {
        let (tone_map_size, subbands, carriers) = match self {
            Band::CenelecA => (1, 6, 36),
            Band::CenelecB => (1, 4, 16),
            Band::Fcc => (3, 24, 72),
            Band::Arib => (3, 18, 54),
        };
        BandGeometry {
            tone_map_size,
            subbands,
            carriers,
            max_data_len: MAX_PHY_DATA_LEN,
        }
    }

    /// Every carrier of the plan active, reserved trailing bits clear.
    pub fn default_tone_mask(self) -> [u8; TONE_MASK_LEN] {
        match self {
            Band::CenelecA => [0xFF, 0xFF, 0xFF, 0xFF, 0x0F, 0x00, 0x00, 0x00, 0x00],
            Band::CenelecB => [0xFF, 0xFF, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00],
            Band::Fcc => [0xFF; TONE_MASK_LEN],
            Band::Arib => [0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0x3F, 0x00, 0x00],
        }
    }

    pub fn info(self) -> BandInfo {
        let g = self.geometry();
        let (fl_max, tones_in_carrier, fl_band, max_rs_blocks, tx_coef_bits, pilots_freq_spa) =
            match self {
                Band::CenelecA => (63, 6, 4, 1, 4, 12),
                Band::CenelecB => (63, 4, 4, 1, 4, 8),
                Band::Fcc => (511, 3, 1, 2, 2, 12),
                Band::Arib => (511, 3, 1, 1, 2, 12),
            };
        BandInfo {
            fl_max,
            band: self.as_u8(),
            tones: g.carriers as u8,
            carriers: g.subbands as u8,
            tones_in_carrier,
            fl_band,
            max_rs_blocks,
            tx_coef_bits,
            pilots_freq_spa,
        }
    }

    fn timing_base(self) -> TimingBase {
        match self {
            Band::CenelecA | Band::CenelecB => TimingBase {
                pre_symbol: 640,
                symbol: 695,
                fc_size: 33,
                cifs_symbols: 8,
                rifs_symbols: 8,
            },
            Band::Fcc => TimingBase {
                pre_symbol: 213,
                symbol: 232,
                fc_size: 66,
                cifs_symbols: 10,
                rifs_symbols: 10,
            },
            Band::Arib => TimingBase {
                pre_symbol: 213,
                symbol: 232,
                fc_size: 66,
                cifs_symbols: 108,
                rifs_symbols: 10,
            },
        }
    }

    /// Number of carriers left active by `mask` within this plan.
    pub fn active_carriers(self, mask: &[u8; TONE_MASK_LEN]) -> u32 {
        let carriers = self.geometry().carriers;
        (0..carriers)
            .filter(|bit| mask[bit / 8] & (1 << (bit % 8)) != 0)
            .count() as u32
    }
}

impl fmt::Display for Band {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Sizes of the band-dependent data-plane fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BandGeometry {
    pub tone_map_size: usize,
    pub subbands: usize,
    pub carriers: usize,
    pub max_data_len: usize,
}

/// Content of the band information attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BandInfo {
    pub fl_max: u16,
    pub band: u8,
    pub tones: u8,
    pub carriers: u8,
    pub tones_in_carrier: u8,
    pub fl_band: u8,
    pub max_rs_blocks: u8,
    pub tx_coef_bits: u8,
    pub pilots_freq_spa: u8,
}

impl BandInfo {
    pub const LEN: usize = 10;

    /// Native (little-endian, packed) encoding.
    pub fn to_bytes(&self) -> [u8; Self::LEN] {
        let fl = self.fl_max.to_le_bytes();
        [
            fl[0],
            fl[1],
            self.band,
            self.tones,
            self.carriers,
            self.tones_in_carrier,
            self.fl_band,
            self.max_rs_blocks,
            self.tx_coef_bits,
            self.pilots_freq_spa,
        ]
    }
}

struct TimingBase {
    pre_symbol: u32,
    symbol: u32,
    fc_size: u32,
    cifs_symbols: u32,
    rifs_symbols: u32,
}

/// MAC timing constants in microseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MacConstants {
    pub subcarriers: u32,
    pub fch_symbols: u32,
    pub pre_symbol: u32,
    pub symbol: u32,
    pub slot: u32,
    pub cifs: u32,
    pub rifs: u32,
    pub ack_time: u32,
    pub ack_wait_duration: u32,
    pub eifs: u32,
}

impl MacConstants {
    pub fn derive(band: Band, mask: &[u8; TONE_MASK_LEN]) -> Self {
        let base = band.timing_base();
        let subcarriers = match band.active_carriers(mask) {
            0 => FALLBACK_SUBCARRIERS,
            n => n,
        };
        let fch_symbols = ((base.fc_size + 6) * 12).div_ceil(subcarriers);
        let symbol = base.symbol;
        let cifs = symbol * base.cifs_symbols;
        let rifs = symbol * base.rifs_symbols;
        let ack_time = base.pre_symbol * 19 / 2 + symbol * fch_symbols;
        let ack_wait_duration = rifs + ack_time + cifs;
        let eifs = fch_symbols * symbol + 2 * symbol + symbol * 252 + rifs + cifs + ack_time;
        Self {
            subcarriers,
            fch_symbols,
            pre_symbol: base.pre_symbol,
            symbol,
            slot: 2 * symbol,
            cifs,
            rifs,
            ack_time,
            ack_wait_duration,
            eifs,
        }
    }

    /// Ack wait duration as carried by the 16-bit attribute, in microseconds.
    ///
    /// Saturates at 0xFFFF. Only plans with a handful of active carriers
    /// get there; [`ack_wait_duration`](Self::ack_wait_duration) keeps the
    /// full value.
    pub fn ack_wait_u16(&self) -> u16 {
        if self.ack_wait_saturated() {
            u16::MAX
        } else {
            self.ack_wait_duration as u16
        }
    }

    /// The ack wait duration does not fit the 16-bit attribute.
    pub fn ack_wait_saturated(&self) -> bool {
        self.ack_wait_duration > u32::from(u16::MAX)
    }
}
