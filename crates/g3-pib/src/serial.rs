// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

// PHY frames as exchanged with a serial host.
//
// The serial interface carries the same transmission requests, confirmations
// and receive indications as the transceiver link, with a command byte in
// front, big-endian multi-byte fields and a different field order. Tone maps
// travel most significant byte first. The two-RS-blocks flag is present only
// on the FCC and ARIB bands.

use byteorder::{BigEndian, ByteOrder};

use crate::band::{Band, BandGeometry};
use crate::error::CodecError;
use crate::wire::{
    field, DelimiterType, ModScheme, ModType, RxMessage, TxConfirmation, TxMessage, TxResult,
    MAX_TONE_MAP_SIZE,
};

/// Serial PHY command: transmission request.
pub const CMD_SEND_MSG: u8 = 6;

/// Serial PHY command: transmission confirmation.
pub const CMD_SEND_MSG_RSP: u8 = 7;

/// Serial PHY command: receive indication.
pub const CMD_RECEIVE_MSG: u8 = 8;

/// Command, result, RMS estimate (4), end-of-transmission time (4).
pub const SERIAL_CFM_LEN: usize = 10;

// command + mode, power, mod type, mod scheme, pdc
const TX_LEAD_LEN: usize = 6;
// delimiter + time (4) + data length (2)
const TX_TAIL_LEN: usize = 7;
// command + mod type + mod scheme
const IND_LEAD_LEN: usize = 3;
// snr fch, snr payload, rssi, agc factor, zct, delimiter, lqi
const IND_QUALITY_LEN: usize = 13;
// worst carrier, corrupted, noised, worst symbol, impulsive, band,
// background, rs corrected, data length, time, duration
const IND_TAIL_LEN: usize = 20;

/// Serial-side PHY codec bound to one band geometry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SerialCodec {
    band: Band,
    geometry: BandGeometry,
}

impl SerialCodec {
    pub fn new(band: Band) -> Self {
        Self {
            band,
            geometry: band.geometry(),
        }
    }

    pub fn band(&self) -> Band {
        self.band
    }

    fn has_rs_flag(&self) -> bool {
        !self.band.is_cenelec()
    }

    fn data_len_ok(&self, len: usize) -> bool {
        len != 0 && len <= self.geometry.max_data_len
    }

    fn tx_header_len(&self) -> usize {
        TX_LEAD_LEN
            + self.geometry.tone_map_size
            + usize::from(self.has_rs_flag())
            + self.geometry.subbands
            + TX_TAIL_LEN
    }

    /// Size of a transmission request frame carrying `data_len` bytes.
    pub fn tx_len(&self, data_len: usize) -> usize {
        self.tx_header_len() + data_len
    }

    /// Size of a receive indication frame carrying `data_len` bytes.
    pub fn ind_len(&self, data_len: usize) -> usize {
        IND_LEAD_LEN
            + self.geometry.tone_map_size
            + IND_QUALITY_LEN
            + self.geometry.carriers
            + IND_TAIL_LEN
            + data_len
    }

    // -----------------------------------------------------------------------
    // Transmission request
    // -----------------------------------------------------------------------

    /// Appends a transmission request frame to `out`. Used on the host side.
    pub fn encode_tx(&self, msg: &TxMessage<'_>, out: &mut Vec<u8>) -> Result<(), CodecError> {
        let len = msg.data.len();
        if !self.data_len_ok(len) {
            return Err(CodecError::CodecReject { len });
        }
        let g = &self.geometry;
        out.reserve(self.tx_len(len));
        out.extend_from_slice(&[
            CMD_SEND_MSG,
            msg.mode,
            msg.power,
            msg.mod_type.as_u8(),
            msg.mod_scheme.as_u8(),
            msg.pdc,
        ]);
        out.extend(msg.tone_map[..g.tone_map_size].iter().rev());
        if self.has_rs_flag() {
            out.push(u8::from(msg.two_rs_blocks));
        }
        out.extend_from_slice(&msg.preemphasis[..g.subbands]);
        out.push(msg.delimiter.as_u8());
        let mut tail = [0u8; 6];
        BigEndian::write_u32(&mut tail[0..4], msg.time);
        BigEndian::write_u16(&mut tail[4..6], len as u16);
        out.extend_from_slice(&tail);
        out.extend_from_slice(msg.data);
        Ok(())
    }

    /// Parses a transmission request frame, command byte included.
    ///
    /// The announced data length is checked before the payload is located
    /// and the frame must end exactly after it.
    pub fn decode_tx<'a>(&self, frame: &'a [u8]) -> Result<TxMessage<'a>, CodecError> {
        let header = self.tx_header_len();
        if frame.len() < header {
            return Err(CodecError::BufferTooShort);
        }
        if frame[0] != CMD_SEND_MSG {
            return Err(CodecError::InvalidField {
                field: "command",
                value: frame[0],
            });
        }
        let len = usize::from(BigEndian::read_u16(&frame[header - 2..header]));
        if !self.data_len_ok(len) {
            return Err(CodecError::CodecReject { len });
        }
        if frame.len() != header + len {
            return Err(CodecError::LengthMismatch {
                expected: header + len,
                got: frame.len(),
            });
        }

        let g = &self.geometry;
        let mut msg = TxMessage::new(&frame[header..]);
        msg.mode = frame[1];
        msg.power = frame[2];
        msg.mod_type = field("mod type", frame[3], ModType::from_u8(frame[3]))?;
        msg.mod_scheme = field("mod scheme", frame[4], ModScheme::from_u8(frame[4]))?;
        msg.pdc = frame[5];
        let mut pos = TX_LEAD_LEN;
        msg.tone_map = [0u8; MAX_TONE_MAP_SIZE];
        for (dst, &src) in msg.tone_map[..g.tone_map_size]
            .iter_mut()
            .zip(frame[pos..pos + g.tone_map_size].iter().rev())
        {
            *dst = src;
        }
        pos += g.tone_map_size;
        if self.has_rs_flag() {
            msg.two_rs_blocks = frame[pos] != 0;
            pos += 1;
        }
        msg.preemphasis[..g.subbands].copy_from_slice(&frame[pos..pos + g.subbands]);
        pos += g.subbands;
        msg.delimiter = field("delimiter", frame[pos], DelimiterType::from_u8(frame[pos]))?;
        msg.time = BigEndian::read_u32(&frame[pos + 1..pos + 5]);
        Ok(msg)
    }

    // -----------------------------------------------------------------------
    // Confirmation
    // -----------------------------------------------------------------------

    /// Appends a transmission confirmation frame to `out`.
    pub fn encode_cfm(&self, cfm: &TxConfirmation, out: &mut Vec<u8>) {
        let mut buf = [0u8; SERIAL_CFM_LEN];
        buf[0] = CMD_SEND_MSG_RSP;
        buf[1] = cfm.result.as_u8();
        BigEndian::write_u32(&mut buf[2..6], cfm.rms_calc);
        BigEndian::write_u32(&mut buf[6..10], cfm.time);
        out.extend_from_slice(&buf);
    }

    /// Parses a transmission confirmation frame, command byte included.
    pub fn decode_cfm(&self, frame: &[u8]) -> Result<TxConfirmation, CodecError> {
        if frame.len() != SERIAL_CFM_LEN {
            return Err(CodecError::LengthMismatch {
                expected: SERIAL_CFM_LEN,
                got: frame.len(),
            });
        }
        if frame[0] != CMD_SEND_MSG_RSP {
            return Err(CodecError::InvalidField {
                field: "command",
                value: frame[0],
            });
        }
        Ok(TxConfirmation {
            rms_calc: BigEndian::read_u32(&frame[2..6]),
            time: BigEndian::read_u32(&frame[6..10]),
            result: TxResult::from_u8(frame[1]),
        })
    }

    // -----------------------------------------------------------------------
    // Receive indication
    // -----------------------------------------------------------------------

    /// Appends a receive indication frame to `out`.
    ///
    /// AGC fine/offset/active, PGA and CRC status are not part of the serial
    /// layout.
    pub fn encode_ind(&self, msg: &RxMessage<'_>, out: &mut Vec<u8>) -> Result<(), CodecError> {
        let len = msg.data.len();
        if !self.data_len_ok(len) {
            return Err(CodecError::CodecReject { len });
        }
        let g = &self.geometry;
        out.reserve(self.ind_len(len));
        out.extend_from_slice(&[CMD_RECEIVE_MSG, msg.mod_type.as_u8(), msg.mod_scheme.as_u8()]);
        out.extend(msg.tone_map[..g.tone_map_size].iter().rev());

        let mut q = [0u8; IND_QUALITY_LEN];
        BigEndian::write_i16(&mut q[0..2], msg.snr_fch);
        BigEndian::write_i16(&mut q[2..4], msg.snr_payload);
        BigEndian::write_u16(&mut q[4..6], msg.rssi);
        BigEndian::write_u32(&mut q[6..10], msg.agc_factor);
        q[10] = msg.zct_diff;
        q[11] = msg.delimiter.as_u8();
        q[12] = msg.lqi;
        out.extend_from_slice(&q);
        out.extend_from_slice(&msg.carrier_snr[..g.carriers]);

        let mut t = [0u8; IND_TAIL_LEN];
        t[0] = msg.snr_worst_carrier;
        BigEndian::write_u16(&mut t[1..3], msg.corrupted_carriers);
        BigEndian::write_u16(&mut t[3..5], msg.noised_symbols);
        t[5] = msg.snr_worst_symbol;
        t[6] = msg.snr_impulsive;
        t[7] = msg.snr_band;
        t[8] = msg.snr_background;
        t[9] = msg.rs_corrected_errors;
        BigEndian::write_u16(&mut t[10..12], len as u16);
        BigEndian::write_u32(&mut t[12..16], msg.time);
        BigEndian::write_u32(&mut t[16..20], msg.frame_duration);
        out.extend_from_slice(&t);
        out.extend_from_slice(msg.data);
        Ok(())
    }

    /// Parses a receive indication frame, command byte included. Fields the
    /// serial layout does not carry keep the neutral values of
    /// [`RxMessage::new`].
    pub fn decode_ind<'a>(&self, frame: &'a [u8]) -> Result<RxMessage<'a>, CodecError> {
        let header = self.ind_len(0);
        if frame.len() < header {
            return Err(CodecError::BufferTooShort);
        }
        if frame[0] != CMD_RECEIVE_MSG {
            return Err(CodecError::InvalidField {
                field: "command",
                value: frame[0],
            });
        }
        let g = &self.geometry;
        let tail_start = header - IND_TAIL_LEN;
        let t = &frame[tail_start..header];
        let len = usize::from(BigEndian::read_u16(&t[10..12]));
        if !self.data_len_ok(len) {
            return Err(CodecError::CodecReject { len });
        }
        if frame.len() != header + len {
            return Err(CodecError::LengthMismatch {
                expected: header + len,
                got: frame.len(),
            });
        }

        let mut msg = RxMessage::new(&frame[header..]);
        msg.mod_type = field("mod type", frame[1], ModType::from_u8(frame[1]))?;
        msg.mod_scheme = field("mod scheme", frame[2], ModScheme::from_u8(frame[2]))?;
        let mut pos = IND_LEAD_LEN;
        for (dst, &src) in msg.tone_map[..g.tone_map_size]
            .iter_mut()
            .zip(frame[pos..pos + g.tone_map_size].iter().rev())
        {
            *dst = src;
        }
        pos += g.tone_map_size;

        let q = &frame[pos..pos + IND_QUALITY_LEN];
        msg.snr_fch = BigEndian::read_i16(&q[0..2]);
        msg.snr_payload = BigEndian::read_i16(&q[2..4]);
        msg.rssi = BigEndian::read_u16(&q[4..6]);
        msg.agc_factor = BigEndian::read_u32(&q[6..10]);
        msg.zct_diff = q[10];
        msg.delimiter = field("delimiter", q[11], DelimiterType::from_u8(q[11]))?;
        msg.lqi = q[12];
        pos += IND_QUALITY_LEN;
        msg.carrier_snr[..g.carriers].copy_from_slice(&frame[pos..pos + g.carriers]);

        msg.snr_worst_carrier = t[0];
        msg.corrupted_carriers = BigEndian::read_u16(&t[1..3]);
        msg.noised_symbols = BigEndian::read_u16(&t[3..5]);
        msg.snr_worst_symbol = t[5];
        msg.snr_impulsive = t[6];
        msg.snr_band = t[7];
        msg.snr_background = t[8];
        msg.rs_corrected_errors = t[9];
        msg.time = BigEndian::read_u32(&t[12..16]);
        msg.frame_duration = BigEndian::read_u32(&t[16..20]);
        Ok(msg)
    }
}
