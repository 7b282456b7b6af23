// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

// Data-plane frames exchanged with the PLC transceiver.
//
// Every multi-byte field is little-endian. Tone-map, preemphasis and
// carrier-SNR lengths come from the band geometry captured when the codec
// was built; a codec must be rebuilt after a band change.

use byteorder::{ByteOrder, LittleEndian};

use crate::band::{Band, BandGeometry};
use crate::error::CodecError;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Largest tone map over every band.
pub const MAX_TONE_MAP_SIZE: usize = 3;

/// Largest sub-band count over every band.
pub const MAX_SUBBANDS: usize = 24;

/// Largest carrier count over every band.
pub const MAX_CARRIERS: usize = 72;

/// Time (4) + data length (2).
pub const TX_HEADER_LEN: usize = 6;

/// Mode, power, mod type, mod scheme, pdc, 2rs, delimiter.
pub const TX_TRAILER_LEN: usize = 7;

/// Fixed part of a receive indication, before the band-dependent arrays.
pub const RX_HEADER_LEN: usize = 42;

/// RMS estimate (4) + end-of-transmission time (4) + result (1).
pub const TX_CONFIRMATION_LEN: usize = 9;

// TX mode bits
pub const TX_MODE_FORCED: u8 = 0x01;
pub const TX_MODE_RELATIVE: u8 = 0x02;
pub const TX_MODE_SYNCP_CONTINUOUS: u8 = 0x04;
pub const TX_MODE_SYMBOLS_CONTINUOUS: u8 = 0x08;
pub const TX_MODE_CANCEL: u8 = 0x10;

// ---------------------------------------------------------------------------
// Field enums
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ModType {
    Bpsk = 0,
    Qpsk = 1,
    Psk8 = 2,
    Qam = 3,
    BpskRobo = 4,
}

impl ModType {
    pub fn from_u8(v: u8) -> Option<Self> {
        match v {
            0 => Some(Self::Bpsk),
            1 => Some(Self::Qpsk),
            2 => Some(Self::Psk8),
            3 => Some(Self::Qam),
            4 => Some(Self::BpskRobo),
            _ => None,
        }
    }

    pub fn as_u8(self) -> u8 {
        self as u8
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ModScheme {
    Differential = 0,
    Coherent = 1,
}

impl ModScheme {
    pub fn from_u8(v: u8) -> Option<Self> {
        match v {
            0 => Some(Self::Differential),
            1 => Some(Self::Coherent),
            _ => None,
        }
    }

    pub fn as_u8(self) -> u8 {
        self as u8
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum DelimiterType {
    SofNoResponse = 0,
    SofResponse = 1,
    Ack = 2,
    Nack = 3,
}

impl DelimiterType {
    pub fn from_u8(v: u8) -> Option<Self> {
        match v {
            0 => Some(Self::SofNoResponse),
            1 => Some(Self::SofResponse),
            2 => Some(Self::Ack),
            3 => Some(Self::Nack),
            _ => None,
        }
    }

    pub fn as_u8(self) -> u8 {
        self as u8
    }
}

/// Result code of a transmission confirmation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxResult {
    Process,
    Success,
    InvalidLength,
    BusyChannel,
    BusyTx,
    BusyRx,
    InvalidScheme,
    Timeout,
    InvalidToneMap,
    InvalidModType,
    InvalidDelimiter,
    Cancelled,
    HighTemp120,
    HighTemp110,
    NoTx,
    /// Code not known to this codec, preserved as received.
    Unknown(u8),
}

impl TxResult {
    pub fn from_u8(v: u8) -> Self {
        match v {
            0 => Self::Process,
            1 => Self::Success,
            2 => Self::InvalidLength,
            3 => Self::BusyChannel,
            4 => Self::BusyTx,
            5 => Self::BusyRx,
            6 => Self::InvalidScheme,
            7 => Self::Timeout,
            8 => Self::InvalidToneMap,
            9 => Self::InvalidModType,
            10 => Self::InvalidDelimiter,
            11 => Self::Cancelled,
            12 => Self::HighTemp120,
            13 => Self::HighTemp110,
            255 => Self::NoTx,
            other => Self::Unknown(other),
        }
    }

    pub fn as_u8(self) -> u8 {
        match self {
            Self::Process => 0,
            Self::Success => 1,
            Self::InvalidLength => 2,
            Self::BusyChannel => 3,
            Self::BusyTx => 4,
            Self::BusyRx => 5,
            Self::InvalidScheme => 6,
            Self::Timeout => 7,
            Self::InvalidToneMap => 8,
            Self::InvalidModType => 9,
            Self::InvalidDelimiter => 10,
            Self::Cancelled => 11,
            Self::HighTemp120 => 12,
            Self::HighTemp110 => 13,
            Self::NoTx => 255,
            Self::Unknown(v) => v,
        }
    }
}

pub(crate) fn field<T>(
    name: &'static str,
    value: u8,
    parsed: Option<T>,
) -> Result<T, CodecError> {
    parsed.ok_or(CodecError::InvalidField { field: name, value })
}

// ---------------------------------------------------------------------------
// Frames
// ---------------------------------------------------------------------------

/// Transmission request. Only the band-sized prefix of `preemphasis` and
/// `tone_map` goes on the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxMessage<'a> {
    pub time: u32,
    pub preemphasis: [u8; MAX_SUBBANDS],
    pub tone_map: [u8; MAX_TONE_MAP_SIZE],
    pub mode: u8,
    pub power: u8,
    pub mod_type: ModType,
    pub mod_scheme: ModScheme,
    pub pdc: u8,
    pub two_rs_blocks: bool,
    pub delimiter: DelimiterType,
    pub data: &'a [u8],
}

impl<'a> TxMessage<'a> {
    /// Immediate ROBO transmission on every carrier.
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            time: 0,
            preemphasis: [0u8; MAX_SUBBANDS],
            tone_map: [0xFF; MAX_TONE_MAP_SIZE],
            mode: TX_MODE_RELATIVE,
            power: 0,
            mod_type: ModType::BpskRobo,
            mod_scheme: ModScheme::Differential,
            pdc: 0,
            two_rs_blocks: false,
            delimiter: DelimiterType::SofNoResponse,
            data,
        }
    }
}

/// Receive indication. `data` borrows the PDU from the input buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RxMessage<'a> {
    pub time: u32,
    pub frame_duration: u32,
    pub rssi: u16,
    pub zct_diff: u8,
    pub rs_corrected_errors: u8,
    pub mod_type: ModType,
    pub mod_scheme: ModScheme,
    pub agc_factor: u32,
    pub agc_fine: u16,
    pub agc_offset: i16,
    pub agc_active: u8,
    pub agc_pga: u8,
    pub snr_fch: i16,
    pub snr_payload: i16,
    pub corrupted_carriers: u16,
    pub noised_symbols: u16,
    pub snr_worst_carrier: u8,
    pub snr_worst_symbol: u8,
    pub snr_impulsive: u8,
    pub snr_band: u8,
    pub snr_background: u8,
    pub lqi: u8,
    pub delimiter: DelimiterType,
    pub crc_ok: bool,
    pub tone_map: [u8; MAX_TONE_MAP_SIZE],
    pub carrier_snr: [u8; MAX_CARRIERS],
    pub data: &'a [u8],
}

impl<'a> RxMessage<'a> {
    /// Indication with neutral quality fields, for simulation and tests.
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            time: 0,
            frame_duration: 0,
            rssi: 0,
            zct_diff: 0,
            rs_corrected_errors: 0,
            mod_type: ModType::BpskRobo,
            mod_scheme: ModScheme::Differential,
            agc_factor: 0,
            agc_fine: 0,
            agc_offset: 0,
            agc_active: 0,
            agc_pga: 0,
            snr_fch: 0,
            snr_payload: 0,
            corrupted_carriers: 0,
            noised_symbols: 0,
            snr_worst_carrier: 0,
            snr_worst_symbol: 0,
            snr_impulsive: 0,
            snr_band: 0,
            snr_background: 0,
            lqi: 0,
            delimiter: DelimiterType::SofNoResponse,
            crc_ok: true,
            tone_map: [0u8; MAX_TONE_MAP_SIZE],
            carrier_snr: [0u8; MAX_CARRIERS],
            data,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TxConfirmation {
    pub rms_calc: u32,
    pub time: u32,
    pub result: TxResult,
}

impl TxConfirmation {
    pub fn to_bytes(&self) -> [u8; TX_CONFIRMATION_LEN] {
        let mut buf = [0u8; TX_CONFIRMATION_LEN];
        LittleEndian::write_u32(&mut buf[0..4], self.rms_calc);
        LittleEndian::write_u32(&mut buf[4..8], self.time);
        buf[8] = self.result.as_u8();
        buf
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToneMapResponse {
    pub mod_type: ModType,
    pub mod_scheme: ModScheme,
    pub tone_map: [u8; MAX_TONE_MAP_SIZE],
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MaxPsduLenParams {
    pub mod_type: ModType,
    pub mod_scheme: ModScheme,
    pub two_rs_blocks: bool,
    pub tone_map: [u8; MAX_TONE_MAP_SIZE],
}

// ---------------------------------------------------------------------------
// Codec
// ---------------------------------------------------------------------------

/// Data-plane codec bound to one band geometry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WireCodec {
    band: Band,
    geometry: BandGeometry,
}

impl WireCodec {
    pub fn new(band: Band) -> Self {
        Self {
            band,
            geometry: band.geometry(),
        }
    }

    pub fn band(&self) -> Band {
        self.band
    }

    pub fn geometry(&self) -> BandGeometry {
        self.geometry
    }

    /// Encoded size of a transmission request carrying `data_len` bytes.
    pub fn tx_len(&self, data_len: usize) -> usize {
        TX_HEADER_LEN
            + self.geometry.subbands
            + self.geometry.tone_map_size
            + TX_TRAILER_LEN
            + data_len
    }

    fn data_len_ok(&self, len: usize) -> bool {
        len != 0 && len <= self.geometry.max_data_len
    }

    /// Writes a transmission request into `out` and returns its length.
    ///
    /// Returns 0 without touching `out` when the payload is empty, larger
    /// than the band maximum, or does not fit in `out`.
    pub fn encode_tx(&self, msg: &TxMessage<'_>, out: &mut [u8]) -> usize {
        let len = msg.data.len();
        if !self.data_len_ok(len) {
            return 0;
        }
        let total = self.tx_len(len);
        if out.len() < total {
            return 0;
        }
        let g = &self.geometry;
        LittleEndian::write_u32(&mut out[0..4], msg.time);
        LittleEndian::write_u16(&mut out[4..6], len as u16);
        let mut pos = TX_HEADER_LEN;
        out[pos..pos + g.subbands].copy_from_slice(&msg.preemphasis[..g.subbands]);
        pos += g.subbands;
        out[pos..pos + g.tone_map_size].copy_from_slice(&msg.tone_map[..g.tone_map_size]);
        pos += g.tone_map_size;
        out[pos..pos + TX_TRAILER_LEN].copy_from_slice(&[
            msg.mode,
            msg.power,
            msg.mod_type.as_u8(),
            msg.mod_scheme.as_u8(),
            msg.pdc,
            u8::from(msg.two_rs_blocks),
            msg.delimiter.as_u8(),
        ]);
        pos += TX_TRAILER_LEN;
        out[pos..total].copy_from_slice(msg.data);
        total
    }

    /// Inverse of [`encode_tx`](Self::encode_tx). The payload is borrowed.
    pub fn decode_tx<'a>(&self, buf: &'a [u8]) -> Result<TxMessage<'a>, CodecError> {
        if buf.len() < TX_HEADER_LEN {
            return Err(CodecError::BufferTooShort);
        }
        let len = usize::from(LittleEndian::read_u16(&buf[4..6]));
        if !self.data_len_ok(len) {
            return Err(CodecError::CodecReject { len });
        }
        let total = self.tx_len(len);
        if buf.len() != total {
            return Err(CodecError::LengthMismatch {
                expected: total,
                got: buf.len(),
            });
        }
        let g = &self.geometry;
        let mut msg = TxMessage::new(&buf[total - len..]);
        msg.time = LittleEndian::read_u32(&buf[0..4]);
        let mut pos = TX_HEADER_LEN;
        msg.preemphasis[..g.subbands].copy_from_slice(&buf[pos..pos + g.subbands]);
        pos += g.subbands;
        msg.tone_map = [0u8; MAX_TONE_MAP_SIZE];
        msg.tone_map[..g.tone_map_size].copy_from_slice(&buf[pos..pos + g.tone_map_size]);
        pos += g.tone_map_size;
        let t = &buf[pos..pos + TX_TRAILER_LEN];
        msg.mode = t[0];
        msg.power = t[1];
        msg.mod_type = field("mod type", t[2], ModType::from_u8(t[2]))?;
        msg.mod_scheme = field("mod scheme", t[3], ModScheme::from_u8(t[3]))?;
        msg.pdc = t[4];
        msg.two_rs_blocks = t[5] != 0;
        msg.delimiter = field("delimiter", t[6], DelimiterType::from_u8(t[6]))?;
        Ok(msg)
    }

    /// Encoded size of a receive indication carrying `data_len` bytes.
    pub fn rx_len(&self, data_len: usize) -> usize {
        RX_HEADER_LEN + self.geometry.tone_map_size + self.geometry.carriers + data_len
    }

    /// Writes a receive indication. Used on the transceiver side.
    pub fn encode_rx(&self, msg: &RxMessage<'_>, out: &mut Vec<u8>) -> Result<(), CodecError> {
        let len = msg.data.len();
        if !self.data_len_ok(len) {
            return Err(CodecError::CodecReject { len });
        }
        let g = &self.geometry;
        let start = out.len();
        out.resize(start + RX_HEADER_LEN, 0);
        let h = &mut out[start..];
        LittleEndian::write_u32(&mut h[0..4], msg.time);
        LittleEndian::write_u32(&mut h[4..8], msg.frame_duration);
        LittleEndian::write_u16(&mut h[8..10], msg.rssi);
        LittleEndian::write_u16(&mut h[10..12], len as u16);
        h[12] = msg.zct_diff;
        h[13] = msg.rs_corrected_errors;
        h[14] = msg.mod_type.as_u8();
        h[15] = msg.mod_scheme.as_u8();
        LittleEndian::write_u32(&mut h[16..20], msg.agc_factor);
        LittleEndian::write_u16(&mut h[20..22], msg.agc_fine);
        LittleEndian::write_i16(&mut h[22..24], msg.agc_offset);
        h[24] = msg.agc_active;
        h[25] = msg.agc_pga;
        LittleEndian::write_i16(&mut h[26..28], msg.snr_fch);
        LittleEndian::write_i16(&mut h[28..30], msg.snr_payload);
        LittleEndian::write_u16(&mut h[30..32], msg.corrupted_carriers);
        LittleEndian::write_u16(&mut h[32..34], msg.noised_symbols);
        h[34] = msg.snr_worst_carrier;
        h[35] = msg.snr_worst_symbol;
        h[36] = msg.snr_impulsive;
        h[37] = msg.snr_band;
        h[38] = msg.snr_background;
        h[39] = msg.lqi;
        h[40] = msg.delimiter.as_u8();
        h[41] = u8::from(msg.crc_ok);
        out.extend_from_slice(&msg.tone_map[..g.tone_map_size]);
        out.extend_from_slice(&msg.carrier_snr[..g.carriers]);
        out.extend_from_slice(msg.data);
        Ok(())
    }

    /// Parses a receive indication.
    ///
    /// The data length is checked before the trailing PDU is located and the
    /// buffer must end exactly after it. The returned message borrows the
    /// PDU from `buf`.
    pub fn decode_rx<'a>(&self, buf: &'a [u8]) -> Result<RxMessage<'a>, CodecError> {
        if buf.len() < RX_HEADER_LEN {
            return Err(CodecError::BufferTooShort);
        }
        let len = usize::from(LittleEndian::read_u16(&buf[10..12]));
        if !self.data_len_ok(len) {
            return Err(CodecError::CodecReject { len });
        }
        let expected = self.rx_len(len);
        if buf.len() != expected {
            return Err(CodecError::LengthMismatch {
                expected,
                got: buf.len(),
            });
        }
        let g = &self.geometry;
        let h = &buf[..RX_HEADER_LEN];
        let tm_start = RX_HEADER_LEN;
        let snr_start = tm_start + g.tone_map_size;
        let data_start = snr_start + g.carriers;

        let mut msg = RxMessage::new(&buf[data_start..data_start + len]);
        msg.time = LittleEndian::read_u32(&h[0..4]);
        msg.frame_duration = LittleEndian::read_u32(&h[4..8]);
        msg.rssi = LittleEndian::read_u16(&h[8..10]);
        msg.zct_diff = h[12];
        msg.rs_corrected_errors = h[13];
        msg.mod_type = field("mod type", h[14], ModType::from_u8(h[14]))?;
        msg.mod_scheme = field("mod scheme", h[15], ModScheme::from_u8(h[15]))?;
        msg.agc_factor = LittleEndian::read_u32(&h[16..20]);
        msg.agc_fine = LittleEndian::read_u16(&h[20..22]);
        msg.agc_offset = LittleEndian::read_i16(&h[22..24]);
        msg.agc_active = h[24];
        msg.agc_pga = h[25];
        msg.snr_fch = LittleEndian::read_i16(&h[26..28]);
        msg.snr_payload = LittleEndian::read_i16(&h[28..30]);
        msg.corrupted_carriers = LittleEndian::read_u16(&h[30..32]);
        msg.noised_symbols = LittleEndian::read_u16(&h[32..34]);
        msg.snr_worst_carrier = h[34];
        msg.snr_worst_symbol = h[35];
        msg.snr_impulsive = h[36];
        msg.snr_band = h[37];
        msg.snr_background = h[38];
        msg.lqi = h[39];
        msg.delimiter = field("delimiter", h[40], DelimiterType::from_u8(h[40]))?;
        msg.crc_ok = h[41] != 0;
        msg.tone_map[..g.tone_map_size].copy_from_slice(&buf[tm_start..snr_start]);
        msg.carrier_snr[..g.carriers].copy_from_slice(&buf[snr_start..data_start]);
        Ok(msg)
    }

    /// Parses a transmission confirmation. Only the total length can be wrong.
    pub fn decode_tx_confirmation(&self, buf: &[u8]) -> Result<TxConfirmation, CodecError> {
        if buf.len() != TX_CONFIRMATION_LEN {
            return Err(CodecError::LengthMismatch {
                expected: TX_CONFIRMATION_LEN,
                got: buf.len(),
            });
        }
        Ok(TxConfirmation {
            rms_calc: LittleEndian::read_u32(&buf[0..4]),
            time: LittleEndian::read_u32(&buf[4..8]),
            result: TxResult::from_u8(buf[8]),
        })
    }

    pub fn encode_tone_map_response(&self, rsp: &ToneMapResponse, out: &mut Vec<u8>) {
        out.push(rsp.mod_type.as_u8());
        out.push(rsp.mod_scheme.as_u8());
        out.extend_from_slice(&rsp.tone_map[..self.geometry.tone_map_size]);
    }

    pub fn decode_tone_map_response(&self, buf: &[u8]) -> Result<ToneMapResponse, CodecError> {
        let expected = 2 + self.geometry.tone_map_size;
        if buf.len() != expected {
            return Err(CodecError::LengthMismatch {
                expected,
                got: buf.len(),
            });
        }
        let mut tone_map = [0u8; MAX_TONE_MAP_SIZE];
        tone_map[..self.geometry.tone_map_size].copy_from_slice(&buf[2..]);
        Ok(ToneMapResponse {
            mod_type: field("mod type", buf[0], ModType::from_u8(buf[0]))?,
            mod_scheme: field("mod scheme", buf[1], ModScheme::from_u8(buf[1]))?,
            tone_map,
        })
    }

    pub fn encode_max_psdu_len_params(&self, params: &MaxPsduLenParams, out: &mut Vec<u8>) {
        out.push(params.mod_type.as_u8());
        out.push(params.mod_scheme.as_u8());
        out.push(u8::from(params.two_rs_blocks));
        out.extend_from_slice(&params.tone_map[..self.geometry.tone_map_size]);
    }
}
