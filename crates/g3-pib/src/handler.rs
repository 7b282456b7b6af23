// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

// Router handlers for the management plane and the PHY data plane.
//
// MibHandler decodes get/set requests, runs them against a shared
// AttributeStore and answers with confirmations. DataPlane accepts
// serial transmission requests, keeps at most one of them outstanding
// and frames confirmations and receive indications for the host.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::band::Band;
use crate::error::{AttrError, CodecError, MibError, RouterError, Status};
use crate::id::AttributeId;
use crate::mib::{MessageKind, MessageSet, MibMarshaler};
use crate::router::{CommandHandler, Outbox, ProtocolId};
use crate::serial::{SerialCodec, CMD_SEND_MSG, SERIAL_CFM_LEN};
use crate::sniffer::SnifferTap;
use crate::store::AttributeStore;
use crate::wire::{RxMessage, TxConfirmation, TxMessage, TxResult, WireCodec};

// ---------------------------------------------------------------------------
// Management plane
// ---------------------------------------------------------------------------

/// Protocol that carries the messages of a message set.
pub fn protocol_of(set: MessageSet) -> ProtocolId {
    match set {
        MessageSet::Mac => ProtocolId::MacG3,
        MessageSet::Adp | MessageSet::AdpMac => ProtocolId::AdpG3,
    }
}

/// Get/set request handler bound to one store.
pub struct MibHandler {
    store: Arc<Mutex<AttributeStore>>,
    marshalers: Vec<MibMarshaler>,
}

impl MibHandler {
    /// Serve the requests of `sets`. Tags of other sets are not recognized.
    pub fn new(store: Arc<Mutex<AttributeStore>>, sets: &[MessageSet]) -> Self {
        Self {
            store,
            marshalers: sets.iter().map(|&s| MibMarshaler::new(s)).collect(),
        }
    }

    fn store(&self) -> MutexGuard<'_, AttributeStore> {
        match self.store.lock() {
            Ok(g) => g,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn marshaler(&self, set: MessageSet) -> Option<MibMarshaler> {
        self.marshalers.iter().copied().find(|m| m.message_set() == set)
    }

    fn on_get(&self, m: MibMarshaler, body: &[u8], out: &mut Vec<u8>) -> Result<(), MibError> {
        let req = m.decode_get_request(body)?;
        let result = AttributeId::resolve(m.registry(), req.raw_id)
            .ok_or(AttrError::UnsupportedAttribute)
            .and_then(|id| self.store().get(id, req.index));
        match result {
            Ok(value) => {
                m.encode_get_confirm(req.raw_id, req.index, Status::Success, value.as_bytes(), out)
            }
            Err(e) => {
                log::debug!("get 0x{:08x}[{}]: {}", req.raw_id, req.index, e);
                m.encode_get_confirm(req.raw_id, req.index, e.status(), &[], out)
            }
        }
        Ok(())
    }

    fn on_set(&self, m: MibMarshaler, body: &[u8], out: &mut Vec<u8>) -> Result<(), MibError> {
        match m.decode_set_request(body) {
            Ok(req) => {
                let result = self.store().set(req.id, req.index, req.value.as_bytes());
                if let Err(e) = result {
                    log::debug!("set {}[{}]: {}", req.id, req.index, e);
                }
                m.encode_set_confirm(req.id.raw(), req.index, Status::from(result), out);
                Ok(())
            }
            Err(MibError::Rejected {
                raw_id,
                index,
                error,
                ..
            }) => {
                log::debug!("set 0x{:08x}[{}] rejected: {}", raw_id, index, error);
                m.encode_set_confirm(raw_id, index, error.status(), out);
                Ok(())
            }
            Err(e) => Err(e),
        }
    }
}

impl CommandHandler for MibHandler {
    fn handle(&mut self, payload: &[u8], outbox: &mut Outbox) -> bool {
        let (&tag, body) = match payload.split_first() {
            Some(split) => split,
            None => return false,
        };
        let (set, kind) = match MessageSet::classify(tag) {
            Some(c) => c,
            None => return false,
        };
        let m = match self.marshaler(set) {
            Some(m) => m,
            None => return false,
        };

        let mut reply = Vec::new();
        let result = match kind {
            MessageKind::GetRequest => self.on_get(m, body, &mut reply),
            MessageKind::SetRequest => self.on_set(m, body, &mut reply),
            // confirms travel the other way
            MessageKind::GetConfirm | MessageKind::SetConfirm => return false,
        };
        match result {
            Ok(()) => {
                outbox.send(protocol_of(set), reply);
                true
            }
            Err(e) => {
                log::warn!("{:?} request dropped: {}", set, e);
                false
            }
        }
    }
}

impl std::fmt::Debug for MibHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MibHandler")
            .field(
                "sets",
                &self.marshalers.iter().map(|m| m.message_set()).collect::<Vec<_>>(),
            )
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Data plane
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct PendingTx {
    time: u32,
    len: usize,
}

/// Transmission channel between a serial host and the PLC transceiver.
///
/// Requests arrive in the serial layout and are handed to the transceiver
/// in its own layout; confirmations and indications travel back the other
/// way. An attached [`SnifferTap`] mirrors the traffic for capture tools.
#[derive(Debug)]
pub struct DataPlane {
    codec: WireCodec,
    serial: SerialCodec,
    generation: u32,
    pending: Option<PendingTx>,
    transmitted: VecDeque<Vec<u8>>,
    sniffer: Option<SnifferTap>,
}

impl DataPlane {
    pub fn new(band: Band) -> Self {
        Self {
            codec: WireCodec::new(band),
            serial: SerialCodec::new(band),
            generation: 0,
            pending: None,
            transmitted: VecDeque::new(),
            sniffer: None,
        }
    }

    /// Mirror transmissions and receptions as sniffer frames.
    pub fn with_sniffer(mut self) -> Self {
        self.sniffer = Some(SnifferTap::new(self.codec.band()));
        self
    }

    /// Transceiver-side codec.
    pub fn codec(&self) -> &WireCodec {
        &self.codec
    }

    /// Host-side codec.
    pub fn serial(&self) -> &SerialCodec {
        &self.serial
    }

    pub fn sniffer(&self) -> Option<&SnifferTap> {
        self.sniffer.as_ref()
    }

    /// A transmission is waiting for its confirmation.
    pub fn is_busy(&self) -> bool {
        self.pending.is_some()
    }

    /// Rebuild the codecs for `band`. A pending transmission is abandoned.
    pub fn reconfigure(&mut self, band: Band) {
        if let Some(p) = self.pending.take() {
            log::warn!("band change abandons pending transmission at t={}", p.time);
        }
        self.codec = WireCodec::new(band);
        self.serial = SerialCodec::new(band);
        if let Some(tap) = self.sniffer.as_mut() {
            tap.reconfigure(band);
        }
        log::info!("data plane reconfigured for {}", band);
    }

    /// Follow band changes of `store`. Returns true when the codecs were rebuilt.
    pub fn sync(&mut self, store: &AttributeStore) -> bool {
        if store.generation() == self.generation && store.band() == self.codec.band() {
            return false;
        }
        self.generation = store.generation();
        self.reconfigure(store.band());
        true
    }

    /// Queue a transmission for the transceiver.
    ///
    /// Only one transmission may be outstanding; a second one before its
    /// confirmation is refused with `ChannelBusy`.
    pub fn submit(&mut self, msg: &TxMessage<'_>) -> Result<(), RouterError> {
        if self.pending.is_some() {
            return Err(RouterError::ChannelBusy);
        }
        let mut frame = vec![0u8; self.codec.tx_len(msg.data.len())];
        let n = self.codec.encode_tx(msg, &mut frame);
        if n == 0 {
            return Err(RouterError::PayloadTooLarge(msg.data.len()));
        }
        frame.truncate(n);
        self.pending = Some(PendingTx {
            time: msg.time,
            len: msg.data.len(),
        });
        if let Some(tap) = self.sniffer.as_mut() {
            tap.record_tx(msg);
        }
        self.transmitted.push_back(frame);
        Ok(())
    }

    /// Frames handed to the transceiver since the last call.
    pub fn take_transmitted(&mut self) -> Vec<Vec<u8>> {
        self.transmitted.drain(..).collect()
    }

    /// Close the outstanding transmission and frame its confirmation for
    /// the host. Returns None when nothing was pending.
    pub fn confirm(&mut self, cfm: TxConfirmation) -> Option<Vec<u8>> {
        let pending = match self.pending.take() {
            Some(p) => p,
            None => {
                log::warn!("confirmation {:?} without pending transmission", cfm.result);
                return None;
            }
        };
        log::debug!(
            "tx of {} bytes at t={} confirmed: {:?}",
            pending.len,
            pending.time,
            cfm.result
        );
        let mut frame = Vec::with_capacity(SERIAL_CFM_LEN);
        self.serial.encode_cfm(&cfm, &mut frame);
        Some(frame)
    }

    /// Frame a receive indication for the host.
    pub fn indicate(&self, rx: &RxMessage<'_>) -> Result<Vec<u8>, CodecError> {
        let mut frame = Vec::with_capacity(self.serial.ind_len(rx.data.len()));
        self.serial.encode_ind(rx, &mut frame)?;
        Ok(frame)
    }

    /// Sniffer frame for a confirmed transmission. `payload_symbols` is the
    /// payload length in OFDM symbols as reported by the transceiver.
    pub fn sniff_confirm(&self, cfm: &TxConfirmation, payload_symbols: u16) -> Option<Vec<u8>> {
        self.sniffer.as_ref()?.confirmation(cfm, payload_symbols)
    }

    /// Sniffer frame for a received message.
    pub fn sniff_indication(&self, rx: &RxMessage<'_>, payload_symbols: u16) -> Option<Vec<u8>> {
        self.sniffer.as_ref().map(|tap| tap.indication(rx, payload_symbols))
    }

    fn reject(&self, outbox: &mut Outbox, result: TxResult) {
        let cfm = TxConfirmation {
            rms_calc: 0,
            time: 0,
            result,
        };
        let mut frame = Vec::with_capacity(SERIAL_CFM_LEN);
        self.serial.encode_cfm(&cfm, &mut frame);
        outbox.send(ProtocolId::PhyAtpl2x0, frame);
    }
}

impl CommandHandler for DataPlane {
    fn handle(&mut self, payload: &[u8], outbox: &mut Outbox) -> bool {
        if payload.first() != Some(&CMD_SEND_MSG) {
            return false;
        }
        let msg = match self.serial.decode_tx(payload) {
            Ok(msg) => msg,
            Err(CodecError::CodecReject { len }) => {
                log::warn!("transmission of {} bytes rejected", len);
                self.reject(outbox, TxResult::InvalidLength);
                return true;
            }
            Err(e) => {
                log::warn!("malformed transmission request dropped: {}", e);
                return true;
            }
        };
        match self.submit(&msg) {
            Ok(()) => {}
            Err(RouterError::ChannelBusy) => self.reject(outbox, TxResult::BusyTx),
            Err(e) => {
                log::warn!("transmission refused: {}", e);
                self.reject(outbox, TxResult::InvalidLength);
            }
        }
        true
    }
}
