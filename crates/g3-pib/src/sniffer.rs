// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

// Sniffer frames for PC capture tools.
//
// Every received frame and every successfully transmitted frame is reported
// on the G3 sniffer protocol with a fixed 25-byte header followed by the PDU.
// Multi-byte fields are big-endian. The tap remembers the last transmission
// request because the confirmation carries only its end time.

use std::sync::{Arc, Mutex, MutexGuard};

use byteorder::{BigEndian, ByteOrder};

use crate::band::{Band, TONE_MASK_LEN};
use crate::router::{CommandHandler, Outbox};
use crate::store::AttributeStore;
use crate::wire::{
    DelimiterType, ModScheme, ModType, RxMessage, TxConfirmation, TxMessage, TxResult,
    MAX_TONE_MAP_SIZE,
};

/// First header byte of every sniffer frame.
pub const SNIFFER_CMD_G3: u8 = 0x00;

/// Sniffer frame format version.
pub const SNIFFER_VERSION: u8 = 0x02;

/// Capturing device: G3 PLC transceiver.
pub const SNIFFER_DEVICE_G3: u8 = 0x12;

/// Inbound sniffer command: tone mask bitfield for the transceiver.
pub const SNIFFER_CMD_SET_TONE_MASK: u8 = 1;

/// Header in front of the PDU.
pub const SNIFFER_HEADER_LEN: usize = 25;

/// SNR byte of frames that carry no link quality.
const NO_SNR: u8 = 0xFF;

/// RSSI and AGC fields of transmitted frames.
const NO_LEVEL: u16 = 0x00FF;

#[derive(Debug, Clone, PartialEq, Eq)]
struct LastTx {
    time: u32,
    mod_type: ModType,
    mod_scheme: ModScheme,
    tone_map: [u8; MAX_TONE_MAP_SIZE],
    delimiter: DelimiterType,
    data: Vec<u8>,
}

struct Fields<'a> {
    modulation: u8,
    tone_map: [u8; MAX_TONE_MAP_SIZE],
    symbols: u16,
    snr: u8,
    delimiter: DelimiterType,
    time_ini: u32,
    time_end: u32,
    rssi: u16,
    agc: u16,
    data: &'a [u8],
}

/// Builds sniffer frames from data-plane traffic.
#[derive(Debug, Clone)]
pub struct SnifferTap {
    band: Band,
    last_tx: Option<LastTx>,
}

impl SnifferTap {
    pub fn new(band: Band) -> Self {
        Self {
            band,
            last_tx: None,
        }
    }

    pub fn band(&self) -> Band {
        self.band
    }

    /// Follow a band change. The remembered transmission is forgotten.
    pub fn reconfigure(&mut self, band: Band) {
        self.band = band;
        self.last_tx = None;
    }

    /// Remember `msg` until its confirmation arrives.
    pub fn record_tx(&mut self, msg: &TxMessage<'_>) {
        self.last_tx = Some(LastTx {
            time: msg.time,
            mod_type: msg.mod_type,
            mod_scheme: msg.mod_scheme,
            tone_map: msg.tone_map,
            delimiter: msg.delimiter,
            data: msg.data.to_vec(),
        });
    }

    /// Frame a received message. ACK and NACK frames carry neither
    /// modulation, tone map nor symbol count.
    pub fn indication(&self, rx: &RxMessage<'_>, payload_symbols: u16) -> Vec<u8> {
        let is_data = matches!(
            rx.delimiter,
            DelimiterType::SofNoResponse | DelimiterType::SofResponse
        );
        let (modulation, tone_map, symbols, snr) = if is_data {
            (
                modulation_byte(rx.mod_type, rx.mod_scheme),
                self.tone_map(&rx.tone_map),
                payload_symbols,
                rx.lqi,
            )
        } else {
            (0, [0u8; MAX_TONE_MAP_SIZE], 0, NO_SNR)
        };
        encode(&Fields {
            modulation,
            tone_map,
            symbols,
            snr,
            delimiter: rx.delimiter,
            time_ini: rx.time.wrapping_sub(rx.frame_duration),
            time_end: rx.time,
            rssi: rx.rssi,
            agc: rx.agc_factor as u16,
            data: rx.data,
        })
    }

    /// Frame the remembered transmission once confirmed. Returns None for
    /// any result other than success, or when nothing was recorded.
    pub fn confirmation(&self, cfm: &TxConfirmation, payload_symbols: u16) -> Option<Vec<u8>> {
        if cfm.result != TxResult::Success {
            return None;
        }
        let tx = self.last_tx.as_ref()?;
        Some(encode(&Fields {
            modulation: modulation_byte(tx.mod_type, tx.mod_scheme),
            tone_map: self.tone_map(&tx.tone_map),
            symbols: payload_symbols,
            snr: NO_SNR,
            delimiter: tx.delimiter,
            time_ini: tx.time,
            time_end: cfm.time,
            rssi: NO_LEVEL,
            agc: NO_LEVEL,
            data: &tx.data,
        }))
    }

    // most significant byte first; CENELEC-A has a single byte
    fn tone_map(&self, tm: &[u8; MAX_TONE_MAP_SIZE]) -> [u8; MAX_TONE_MAP_SIZE] {
        match self.band {
            Band::CenelecA => [0, 0, tm[0]],
            _ => [tm[2], tm[1], tm[0]],
        }
    }
}

fn modulation_byte(mod_type: ModType, mod_scheme: ModScheme) -> u8 {
    ((mod_type.as_u8() << 4) & 0xF0) | (mod_scheme.as_u8() & 0x0F)
}

fn encode(f: &Fields<'_>) -> Vec<u8> {
    let mut out = vec![0u8; SNIFFER_HEADER_LEN];
    out[0] = SNIFFER_CMD_G3;
    out[1] = SNIFFER_VERSION;
    out[2] = SNIFFER_DEVICE_G3;
    out[3] = f.modulation;
    out[4..7].copy_from_slice(&f.tone_map);
    BigEndian::write_u16(&mut out[7..9], f.symbols);
    out[9] = f.snr;
    out[10] = f.delimiter.as_u8();
    BigEndian::write_u32(&mut out[11..15], f.time_ini);
    BigEndian::write_u32(&mut out[15..19], f.time_end);
    BigEndian::write_u16(&mut out[19..21], f.rssi);
    BigEndian::write_u16(&mut out[21..23], f.agc);
    BigEndian::write_u16(&mut out[23..25], f.data.len() as u16);
    out.extend_from_slice(f.data);
    out
}

// ---------------------------------------------------------------------------
// Inbound commands
// ---------------------------------------------------------------------------

/// Handler for commands sent by the capture tool.
///
/// The tone mask goes straight to the transceiver; the MAC tone mask
/// attribute and the timing derived from it are left alone.
pub struct SnifferHandler {
    store: Arc<Mutex<AttributeStore>>,
}

impl SnifferHandler {
    pub fn new(store: Arc<Mutex<AttributeStore>>) -> Self {
        Self { store }
    }

    fn store(&self) -> MutexGuard<'_, AttributeStore> {
        match self.store.lock() {
            Ok(g) => g,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl CommandHandler for SnifferHandler {
    fn handle(&mut self, payload: &[u8], _outbox: &mut Outbox) -> bool {
        match payload.split_first() {
            Some((&SNIFFER_CMD_SET_TONE_MASK, body)) => {
                let mask: [u8; TONE_MASK_LEN] = match body.try_into() {
                    Ok(mask) => mask,
                    Err(_) => {
                        log::warn!("sniffer tone mask of {} bytes ignored", body.len());
                        return true;
                    }
                };
                log::debug!("sniffer tone mask {:02x?}", mask);
                self.store().phy_mut().set_tone_mask(&mask);
                true
            }
            _ => false,
        }
    }
}

impl std::fmt::Debug for SnifferHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SnifferHandler").finish_non_exhaustive()
    }
}
