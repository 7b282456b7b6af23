// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

// Tests for g3-pib.
//
// Covers the management-plane round trip over every writable attribute,
// store validation and side effects, PHY parameter dispatch, the
// transceiver and serial data-plane codecs, sniffer frames, router
// dispatch and the single outstanding transmission.

use std::sync::{Arc, Mutex};

use crate::band::{Band, MacConstants, MAX_PHY_DATA_LEN, TONE_MASK_LEN};
use crate::catalog::{self, PhyBus, Rows, Rule, Shape, SubLen, TableKind};
use crate::config::PibConfig;
use crate::error::*;
use crate::handler::{DataPlane, MibHandler};
use crate::id::*;
use crate::mib::*;
use crate::phy::{PhyPort, SimulatedPhy};
use crate::router::*;
use crate::serial::*;
use crate::sniffer::*;
use crate::store::{AttributeStore, STACK_VERSION};
use crate::value::AttributeValue;
use crate::wire::*;

fn new_store() -> AttributeStore {
    AttributeStore::new(PibConfig::default(), Box::new(SimulatedPhy::new())).unwrap()
}

fn store_with(config: PibConfig) -> AttributeStore {
    AttributeStore::new(config, Box::new(SimulatedPhy::new())).unwrap()
}

fn message_set_for(id: AttributeId) -> MessageSet {
    match id.registry() {
        Registry::Adp => MessageSet::Adp,
        Registry::Mac => MessageSet::Mac,
    }
}

fn uint_bytes(v: u32, width: usize) -> Vec<u8> {
    v.to_le_bytes()[..width].to_vec()
}

fn pattern(len: usize, seed: u8) -> Vec<u8> {
    (0..len).map(|i| seed.wrapping_add((i as u8).wrapping_mul(7))).collect()
}

/// A native value the store accepts for `shape` under `rule`, assuming
/// every other attribute is at its default.
fn sample_for(shape: &Shape, rule: Rule, seed: u8) -> Vec<u8> {
    let width = shape.header_len();
    match rule {
        Rule::Range(lo, _) => return uint_bytes(lo, width),
        Rule::Bool => return uint_bytes(1, width),
        Rule::MaxBe => return vec![8],
        Rule::MinBe => return vec![3],
        Rule::FairnessLimit => return vec![15],
        Rule::WindowK => return vec![5],
        Rule::MaxBeRf => return vec![5],
        Rule::MinBeRf => return vec![3],
        Rule::DebugSet => return vec![0, 0x20, 0, 0, 0, 0x00, 0x10],
        Rule::Any => {}
    }
    let mut data = pattern(width, seed);
    if let Some(tail) = shape.tail {
        match tail.sub {
            SubLen::BitsAt(offset) => {
                data[offset] = 16;
                data.extend(pattern(2, seed));
            }
            SubLen::Free => data.extend(pattern(tail.min.max(1), seed)),
        }
    }
    data
}

fn get_request(set: MessageSet, raw_id: u32, index: u16) -> Vec<u8> {
    let mut out = Vec::new();
    MibMarshaler::new(set).encode_get_request(raw_id, index, &mut out);
    out
}

/// Transceiver shared with the test after the store takes ownership.
struct SharedPhy(Arc<Mutex<SimulatedPhy>>);

impl SharedPhy {
    fn phy(&self) -> std::sync::MutexGuard<'_, SimulatedPhy> {
        self.0.lock().unwrap()
    }
}

impl PhyPort for SharedPhy {
    fn set_tone_mask(&mut self, mask: &[u8; TONE_MASK_LEN]) {
        self.phy().set_tone_mask(mask)
    }
    fn get_param(&mut self, param: PhyParam) -> Result<AttributeValue, AttrError> {
        self.phy().get_param(param)
    }
    fn set_param(&mut self, param: PhyParam, value: &[u8]) -> Result<(), AttrError> {
        self.phy().set_param(param, value)
    }
    fn get_rf_param(&mut self, param: RfPhyParam) -> Result<AttributeValue, AttrError> {
        self.phy().get_rf_param(param)
    }
    fn set_rf_param(&mut self, param: RfPhyParam, value: &[u8]) -> Result<(), AttrError> {
        self.phy().set_rf_param(param, value)
    }
    fn reset_stats(&mut self) {
        self.phy().reset_stats()
    }
    fn reset_rf_stats(&mut self) {
        self.phy().reset_rf_stats()
    }
    fn debug_read(&mut self, request: &[u8], len: usize) -> AttributeValue {
        self.phy().debug_read(request, len)
    }
}

fn serial_tx_frame(band: Band, msg: &TxMessage<'_>) -> Vec<u8> {
    let mut frame = Vec::new();
    SerialCodec::new(band).encode_tx(msg, &mut frame).unwrap();
    frame
}

fn context_row(bits: u8, context: &[u8]) -> Vec<u8> {
    let mut row = vec![0x2C, 0x01, 1, bits];
    row.extend_from_slice(context);
    row
}

// -----------------------------------------------------------------------
// 1. Round trip: get confirm of every writable attribute decodes back
// -----------------------------------------------------------------------
#[test]
fn test_round_trip_every_writable_attribute() {
    let mut store = new_store();
    let mut checked = 0;

    for (n, d) in catalog::iter().enumerate().filter(|(_, d)| !d.is_read_only()) {
        let seed = (n as u8) | 1;
        let cases: Vec<(u16, Vec<u8>)> = match d.rows {
            Rows::Phy(PhyBus::Plc) => vec![
                (PhyParam::RrcNotchIndex.raw(), vec![3]),
                (
                    PhyParam::TimeBetweenNoiseCaptures.raw(),
                    60_000u32.to_le_bytes().to_vec(),
                ),
            ],
            Rows::Phy(PhyBus::Rf) => vec![
                (RfPhyParam::ChannelNum.raw(), 0x0102u16.to_le_bytes().to_vec()),
                (RfPhyParam::CcaEdConfig.raw(), vec![0x40, 0x01, 0xB5]),
            ],
            Rows::Table(_) => vec![(1, sample_for(&d.shape, d.rule, seed))],
            _ => vec![(0, sample_for(&d.shape, d.rule, seed))],
        };
        let m = MibMarshaler::new(message_set_for(d.id));

        for (index, sample) in cases {
            store
                .set(d.id, index, &sample)
                .unwrap_or_else(|e| panic!("{} rejected {:02x?}: {}", d.id, sample, e));
            let value = store.get(d.id, index).unwrap();

            let mut confirm = Vec::new();
            m.encode_get_confirm(d.id.raw(), index, Status::Success, value.as_bytes(), &mut confirm);
            assert_eq!(confirm[1], STATUS_SUCCESS, "{}", d.id);

            let req = m.decode_set_request(&confirm[2..]).unwrap();
            assert_eq!(req.id, d.id);
            assert_eq!(req.index, index);
            assert_eq!(req.value, value, "{}", d.id);
            checked += 1;
        }
    }
    assert!(checked >= 100, "only {} attributes checked", checked);
}

// -----------------------------------------------------------------------
// 2. Round trip: wire bytes survive decode then encode
// -----------------------------------------------------------------------
#[test]
fn test_wire_bytes_survive_decode_encode() {
    let m = MibMarshaler::new(MessageSet::Adp);
    let id = AttributeId::from(AdpAttr::RoutingTable);
    // dst, next hop, cost, hop count, media type, valid time (big-endian)
    let payload = [0x00, 0x05, 0x00, 0x01, 0x00, 0x20, 0x02, 0x00, 0x01, 0x68];

    let mut request = vec![MSG_ADP_SET_REQUEST];
    request.extend_from_slice(&id.raw().to_be_bytes());
    request.extend_from_slice(&3u16.to_be_bytes());
    request.push(payload.len() as u8);
    request.extend_from_slice(&payload);

    let req = m.decode_set_request(&request[1..]).unwrap();
    assert_eq!(req.value.as_bytes()[..2], [0x05, 0x00]);

    let mut again = Vec::new();
    m.encode_set_request(req.id, req.index, req.value.as_bytes(), &mut again)
        .unwrap();
    assert_eq!(again, request);
}

// -----------------------------------------------------------------------
// 3. Rejection purity: read-only attributes never change
// -----------------------------------------------------------------------
#[test]
fn test_read_only_set_never_mutates() {
    let mut store = new_store();
    let junk: [&[u8]; 4] = [&[], &[0xAA], &[0xAA, 0xBB], &[0x55; 12]];

    for d in catalog::iter().filter(|d| d.is_read_only() && !d.indexed()) {
        let before = store.get(d.id, 0).unwrap();
        for bytes in junk {
            assert_eq!(store.set(d.id, 0, bytes), Err(AttrError::ReadOnly), "{}", d.id);
        }
        assert_eq!(store.get(d.id, 0).unwrap(), before, "{}", d.id);
    }
}

// -----------------------------------------------------------------------
// 4. Bounds: MaxFrameRetries above 10 is refused
// -----------------------------------------------------------------------
#[test]
fn test_max_frame_retries_bound() {
    let mut store = new_store();
    let id = AttributeId::from(PlcAttr::MaxFrameRetries);
    assert_eq!(store.set(id, 0, &[11]), Err(AttrError::InvalidParameter));
    assert_eq!(store.get(id, 0).unwrap().as_uint(), Some(5));
    store.set(id, 0, &[10]).unwrap();
    assert_eq!(store.get(id, 0).unwrap().as_uint(), Some(10));
}

// -----------------------------------------------------------------------
// 5. Cross-attribute: backoff exponent ordering
// -----------------------------------------------------------------------
#[test]
fn test_backoff_exponent_ordering() {
    let mut store = new_store();
    let max_be = AttributeId::from(PlcAttr::MaxBe);
    let min_be = AttributeId::from(PlcAttr::MinBe);

    // defaults: MaxBe 8, MinBe 3
    assert_eq!(store.set(max_be, 0, &[2]), Err(AttrError::InvalidParameter));
    assert_eq!(store.set(max_be, 0, &[3]), Err(AttrError::InvalidParameter));
    assert_eq!(store.set(min_be, 0, &[9]), Err(AttrError::InvalidParameter));
    assert_eq!(store.set(min_be, 0, &[8]), Err(AttrError::InvalidParameter));
    assert_eq!(store.set(max_be, 0, &[21]), Err(AttrError::InvalidParameter));

    store.set(min_be, 0, &[5]).unwrap();
    store.set(max_be, 0, &[6]).unwrap();
    assert_eq!(store.get(max_be, 0).unwrap().as_uint(), Some(6));
    assert_eq!(store.get(min_be, 0).unwrap().as_uint(), Some(5));
}

// -----------------------------------------------------------------------
// 6. Cross-attribute: fairness limit and K
// -----------------------------------------------------------------------
#[test]
fn test_fairness_limit_and_window_k() {
    let mut store = new_store();
    let fairness = AttributeId::from(PlcAttr::CsmaFairnessLimit);
    let k = AttributeId::from(PlcAttr::K);
    let max_be = AttributeId::from(PlcAttr::MaxBe);

    // 2 * (8 - 3) = 10
    assert_eq!(store.set(fairness, 0, &[9]), Err(AttrError::InvalidParameter));
    store.set(fairness, 0, &[10]).unwrap();

    // MaxBe 9 would need a limit of 12
    assert_eq!(store.set(max_be, 0, &[9]), Err(AttrError::InvalidParameter));

    assert_eq!(store.set(k, 0, &[0]), Err(AttrError::InvalidParameter));
    assert_eq!(store.set(k, 0, &[11]), Err(AttrError::InvalidParameter));
    store.set(k, 0, &[10]).unwrap();

    // limit may not drop below K
    store.set(max_be, 0, &[4]).unwrap();
    assert_eq!(store.set(fairness, 0, &[9]), Err(AttrError::InvalidParameter));
}

// -----------------------------------------------------------------------
// 7. Cross-attribute: RF backoff exponents
// -----------------------------------------------------------------------
#[test]
fn test_rf_backoff_exponents() {
    let mut store = new_store();
    let max_be = AttributeId::from(RfAttr::MaxBeRf);
    let min_be = AttributeId::from(RfAttr::MinBeRf);

    assert_eq!(store.set(max_be, 0, &[9]), Err(AttrError::InvalidParameter));
    assert_eq!(store.set(max_be, 0, &[2]), Err(AttrError::InvalidParameter));
    assert_eq!(store.set(min_be, 0, &[6]), Err(AttrError::InvalidParameter));
    store.set(min_be, 0, &[5]).unwrap();
    assert_eq!(store.set(max_be, 0, &[4]), Err(AttrError::InvalidParameter));
    store.set(max_be, 0, &[8]).unwrap();
}

// -----------------------------------------------------------------------
// 8. Scenario: default tone mask on CENELEC-A
// -----------------------------------------------------------------------
#[test]
fn test_default_tone_mask() {
    let mut store = new_store();
    let mask = store.get(PlcAttr::ToneMask.into(), 0).unwrap();
    assert_eq!(
        mask.as_bytes(),
        &[0xFF, 0xFF, 0xFF, 0xFF, 0x0F, 0x00, 0x00, 0x00, 0x00]
    );
    let active: u32 = mask.as_bytes().iter().map(|b| b.count_ones()).sum();
    assert_eq!(active, 36);
}

// -----------------------------------------------------------------------
// 9. Scenario: PAN id through the management plane
// -----------------------------------------------------------------------
#[test]
fn test_pan_id_round_trip() {
    let mut store = new_store();
    let id = AttributeId::from(PlcAttr::PanId);
    store.set(id, 0, &0x781Du16.to_le_bytes()).unwrap();
    assert_eq!(store.get(id, 0).unwrap().as_uint(), Some(0x781D));

    let m = MibMarshaler::new(MessageSet::Mac);
    let mut confirm = Vec::new();
    let value = store.get(id, 0).unwrap();
    m.encode_get_confirm(id.raw(), 0, Status::Success, value.as_bytes(), &mut confirm);
    // payload is big-endian on the wire
    assert_eq!(&confirm[CONFIRM_HEADER_LEN..], &[0x78, 0x1D]);
}

// -----------------------------------------------------------------------
// 10. Scenario: unknown id
// -----------------------------------------------------------------------
#[test]
fn test_unknown_id_reports_unsupported() {
    let store = Arc::new(Mutex::new(new_store()));
    let mut handler = MibHandler::new(store, &MessageSet::ALL);
    let mut outbox = Outbox::new();

    assert!(handler.handle(&get_request(MessageSet::Mac, 0xDEAD_BEEF, 0), &mut outbox));
    let (proto, confirm) = outbox.drain().next().unwrap();
    assert_eq!(proto, ProtocolId::MacG3);
    assert_eq!(
        confirm,
        vec![MSG_MAC_GET_CONFIRM, STATUS_UNSUPPORTED_ATTRIBUTE, 0xDE, 0xAD, 0xBE, 0xEF, 0, 0, 0]
    );
}

// -----------------------------------------------------------------------
// 11. Scenario: context entry with inconsistent sub-length
// -----------------------------------------------------------------------
#[test]
fn test_context_sub_length_mismatch() {
    let mut store = new_store();
    let id = AttributeId::from(AdpAttr::ContextInformationTable);
    let good = context_row(64, &[0xFD, 0, 0, 0, 0, 0, 0, 0]);
    store.set(id, 0, &good).unwrap();

    // 64 context bits announced, 4 bytes supplied
    let bad = context_row(64, &[0xFE, 0x80, 0, 0]);
    assert_eq!(store.set(id, 0, &bad), Err(AttrError::InvalidParameter));
    assert_eq!(store.get(id, 0).unwrap().as_bytes(), good.as_slice());

    // the wire path refuses it before the store
    let m = MibMarshaler::new(MessageSet::Adp);
    let mut body = id.raw().to_be_bytes().to_vec();
    body.extend_from_slice(&0u16.to_be_bytes());
    body.push(bad.len() as u8);
    body.extend_from_slice(&[0x01, 0x2C, 1, 64, 0xFE, 0x80, 0, 0]);
    match m.decode_set_request(&body) {
        Err(MibError::Rejected { error, .. }) => assert_eq!(error, AttrError::InvalidParameter),
        other => panic!("unexpected {:?}", other),
    }
}

// -----------------------------------------------------------------------
// 12. Tables: row bounds, clearing, lookups and counts
// -----------------------------------------------------------------------
#[test]
fn test_table_rows_and_counts() {
    let mut store = new_store();
    let routing = AttributeId::from(AdpAttr::RoutingTable);
    let row = [0x05, 0x00, 0x01, 0x00, 0x20, 0x00, 2, 0, 0x68, 0x01];

    assert_eq!(store.set(routing, 400, &row), Err(AttrError::InvalidIndex));
    store.set(routing, 7, &row).unwrap();
    assert_eq!(store.rows(TableKind::Routing), 1);
    assert_eq!(
        store.get(AdpAttr::ManufRoutingTableCount.into(), 0).unwrap().as_uint(),
        Some(1)
    );

    // lookup by short address
    let element = AttributeId::from(AdpAttr::ManufRoutingTableElement);
    assert_eq!(store.get(element, 0x0005).unwrap().as_bytes(), &row);
    assert_eq!(store.get(element, 0x0006), Err(AttrError::InvalidIndex));
    assert_eq!(store.set(element, 0x0005, &row), Err(AttrError::ReadOnly));

    // empty value clears the row, empty row reads as Length 0
    store.set(routing, 7, &[]).unwrap();
    assert_eq!(store.rows(TableKind::Routing), 0);
    assert!(store.get(routing, 7).unwrap().is_empty());

    // non-clearable tables still need a full row
    assert_eq!(
        store.set(AdpAttr::GroupTable.into(), 0, &[]),
        Err(AttrError::InvalidParameter)
    );
}

// -----------------------------------------------------------------------
// 13. Scalars: index must be zero
// -----------------------------------------------------------------------
#[test]
fn test_scalar_rejects_non_zero_index() {
    let mut store = new_store();
    let id = AttributeId::from(PlcAttr::PanId);
    assert_eq!(store.get(id, 1), Err(AttrError::InvalidIndex));
    assert_eq!(store.set(id, 1, &[0, 0]), Err(AttrError::InvalidIndex));
    assert_eq!(store.set(id, 0, &[0]), Err(AttrError::InvalidParameter));
}

// -----------------------------------------------------------------------
// 14. PHY container: index, access and width checks
// -----------------------------------------------------------------------
#[test]
fn test_phy_param_container() {
    let mut store = new_store();
    let plc = AttributeId::from(PlcAttr::ManufPhyParam);
    let rf = AttributeId::from(RfAttr::ManufPhyParamRf);

    assert_eq!(store.get(plc, 0x9999), Err(AttrError::InvalidIndex));
    assert_eq!(store.set(plc, 0x9999, &[1]), Err(AttrError::InvalidIndex));

    // access is checked before width
    let version = PhyParam::Version.raw();
    assert_eq!(store.set(plc, version, &[1]), Err(AttrError::ReadOnly));
    assert_eq!(store.get(plc, version).unwrap().as_uint(), Some(0x3602_0A01));

    let notch = PhyParam::RrcNotchIndex.raw();
    assert_eq!(store.set(plc, notch, &[1, 2]), Err(AttrError::InvalidParameter));
    store.set(plc, notch, &[4]).unwrap();
    assert_eq!(store.get(plc, notch).unwrap().as_bytes(), &[4]);

    assert_eq!(store.set(rf, RfPhyParam::DeviceId.raw(), &[0, 0]), Err(AttrError::ReadOnly));
    store
        .set(rf, RfPhyParam::CcaEdConfig.raw(), &[0x40, 0x01, 0xB5])
        .unwrap();
    assert_eq!(
        store.get(rf, RfPhyParam::CcaEdThreshold.raw()).unwrap().as_bytes(),
        &[0xB5]
    );

    // the container wire layout follows the index
    let m = MibMarshaler::new(MessageSet::Mac);
    let mut confirm = Vec::new();
    let v = store.get(plc, version).unwrap();
    m.encode_get_confirm(plc.raw(), version, Status::Success, v.as_bytes(), &mut confirm);
    assert_eq!(&confirm[CONFIRM_HEADER_LEN..], &[0x36, 0x02, 0x0A, 0x01]);
}

// -----------------------------------------------------------------------
// 15. PHY statistics reset
// -----------------------------------------------------------------------
#[test]
fn test_phy_stats_reset() {
    let mut phy = SimulatedPhy::new();
    phy.record(PhyParam::TxTotal, 42);
    let mut store = AttributeStore::new(PibConfig::default(), Box::new(phy)).unwrap();
    let plc = AttributeId::from(PlcAttr::ManufPhyParam);

    assert_eq!(store.get(plc, PhyParam::TxTotal.raw()).unwrap().as_uint(), Some(42));
    store.set(plc, PhyParam::ResetPhyStats.raw(), &[1]).unwrap();
    assert_eq!(store.get(plc, PhyParam::TxTotal.raw()).unwrap().as_uint(), Some(0));
    assert_eq!(
        store.get(plc, PhyParam::Version.raw()).unwrap().as_uint(),
        Some(0x3602_0A01)
    );
}

// -----------------------------------------------------------------------
// 16. Debug read: length from the debug request
// -----------------------------------------------------------------------
#[test]
fn test_debug_read_length() {
    let mut store = new_store();
    let set = AttributeId::from(PlcAttr::ManufDebugSet);
    let read = AttributeId::from(PlcAttr::ManufDebugRead);

    assert!(store.get(read, 0).unwrap().is_empty());

    store.set(set, 0, &[0, 0x40, 0, 0, 0, 0x00, 0x04]).unwrap();
    assert_eq!(store.get(read, 0).unwrap().as_bytes(), &[0x40, 0x41, 0x42, 0x43]);

    // 300 bytes cannot be carried in one value
    let before = store.get(set, 0).unwrap();
    assert_eq!(
        store.set(set, 0, &[0, 0x40, 0, 0, 0, 0x01, 0x2C]),
        Err(AttrError::InvalidParameter)
    );
    assert_eq!(store.get(set, 0).unwrap(), before);

    store.set(set, 0, &[0, 0x00, 0, 0, 0, 0x00, 0xFF]).unwrap();
    assert_eq!(store.get(read, 0).unwrap().len(), 255);
}

// -----------------------------------------------------------------------
// 17. MAC statistics reset, per registry
// -----------------------------------------------------------------------
#[test]
fn test_reset_mac_stats() {
    let mut store = new_store();
    let tx = AttributeId::from(PlcAttr::TxDataPacketCount);
    let retry_rf = AttributeId::from(RfAttr::RetryCountRf);

    store.increment(tx).unwrap();
    store.increment(tx).unwrap();
    store.increment(retry_rf).unwrap();
    assert_eq!(store.get(tx, 0).unwrap().as_uint(), Some(2));

    store.set(PlcAttr::ManufResetMacStats.into(), 0, &[]).unwrap();
    assert_eq!(store.get(tx, 0).unwrap().as_uint(), Some(0));
    assert_eq!(store.get(retry_rf, 0).unwrap().as_uint(), Some(1));

    store.set(RfAttr::ManufResetMacStatsRf.into(), 0, &[]).unwrap();
    assert_eq!(store.get(retry_rf, 0).unwrap().as_uint(), Some(0));
}

// -----------------------------------------------------------------------
// 18. Security reset clears frame counter and device table
// -----------------------------------------------------------------------
#[test]
fn test_security_reset() {
    let mut store = new_store();
    let counter = AttributeId::from(PlcAttr::FrameCounter);
    store.set(counter, 0, &77u32.to_le_bytes()).unwrap();
    store
        .set(PlcAttr::ManufDeviceTable.into(), 2, &[1, 0, 2, 0, 9, 0, 0, 0])
        .unwrap();

    store.set(PlcAttr::ManufSecurityReset.into(), 0, &[0]).unwrap();
    assert_eq!(store.get(counter, 0).unwrap().as_uint(), Some(77));

    store.set(PlcAttr::ManufSecurityReset.into(), 0, &[1]).unwrap();
    assert_eq!(store.get(counter, 0).unwrap().as_uint(), Some(0));
    assert_eq!(store.rows(TableKind::Device), 0);
}

// -----------------------------------------------------------------------
// 19. Tone mask updates MAC timing
// -----------------------------------------------------------------------
#[test]
fn test_tone_mask_updates_ack_wait() {
    let mut store = new_store();
    let ack_wait = AttributeId::from(PlcAttr::AckWaitDuration);
    let before = store.get(ack_wait, 0).unwrap().as_uint().unwrap();

    let mask = [0x00, 0x00, 0xFF, 0xFF, 0x0F, 0, 0, 0, 0];
    store.set(PlcAttr::ToneMask.into(), 0, &mask).unwrap();
    let after = store.get(ack_wait, 0).unwrap().as_uint().unwrap();

    let expected = MacConstants::derive(Band::CenelecA, &mask);
    assert_eq!(after, u32::from(expected.ack_wait_u16()));
    assert_ne!(after, before);
    assert_eq!(store.timing().subcarriers, 20);
    assert_eq!(store.tone_mask(), mask);

    assert_eq!(
        store.set(PlcAttr::ToneMask.into(), 0, &[0xFF; TONE_MASK_LEN - 1]),
        Err(AttrError::InvalidParameter)
    );
}

// -----------------------------------------------------------------------
// 20. Derived attributes
// -----------------------------------------------------------------------
#[test]
fn test_derived_attributes() {
    let mut store = new_store();
    assert_eq!(
        store.get(AdpAttr::SoftVersion.into(), 0).unwrap().as_bytes(),
        &STACK_VERSION
    );
    assert_eq!(
        store.get(PlcAttr::ManufBandInformation.into(), 0).unwrap().len(),
        10
    );
    assert_eq!(store.get(PlcAttr::CenelecLegacyMode.into(), 0).unwrap().as_uint(), Some(0));
    assert_eq!(store.get(AdpAttr::ManufHybridProfile.into(), 0).unwrap().as_uint(), Some(1));
    assert_eq!(
        store.get(PlcAttr::ManufMaxMacPayloadSize.into(), 0).unwrap().as_uint(),
        Some(400)
    );

    let mut legacy = store_with(PibConfig {
        spec_compliance: 15,
        ..PibConfig::default()
    });
    assert_eq!(legacy.get(PlcAttr::CenelecLegacyMode.into(), 0).unwrap().as_uint(), Some(1));
    assert_eq!(legacy.get(PlcAttr::FccLegacyMode.into(), 0).unwrap().as_uint(), Some(0));
}

// -----------------------------------------------------------------------
// 21. Non-hybrid configuration hides the RF registry
// -----------------------------------------------------------------------
#[test]
fn test_plc_only_rejects_rf_attributes() {
    let mut store = store_with(PibConfig {
        hybrid: false,
        ..PibConfig::default()
    });
    let id = AttributeId::from(RfAttr::MaxBeRf);
    assert_eq!(store.get(id, 0), Err(AttrError::UnsupportedAttribute));
    assert_eq!(store.set(id, 0, &[5]), Err(AttrError::UnsupportedAttribute));
    assert_eq!(store.get(AdpAttr::ManufHybridProfile.into(), 0).unwrap().as_uint(), Some(0));
}

// -----------------------------------------------------------------------
// 22. Stack-side publish and reset
// -----------------------------------------------------------------------
#[test]
fn test_publish_and_reset() {
    let mut store = new_store();
    let lqi = AttributeId::from(AdpAttr::ManufLqiToCoord);
    assert_eq!(store.set(lqi, 0, &[80]), Err(AttrError::ReadOnly));
    store.publish(lqi, 0, &[80]).unwrap();
    assert_eq!(store.get(lqi, 0).unwrap().as_uint(), Some(80));
    assert_eq!(store.publish(lqi, 0, &[80, 1]), Err(AttrError::InvalidParameter));

    store.set(PlcAttr::PanId.into(), 0, &[0x1D, 0x78]).unwrap();
    store.reset();
    assert_eq!(store.get(lqi, 0).unwrap().as_uint(), Some(0));
    assert_eq!(store.get(PlcAttr::PanId.into(), 0).unwrap().as_uint(), Some(0xFFFF));
}

// -----------------------------------------------------------------------
// 23. Band change bumps the generation
// -----------------------------------------------------------------------
#[test]
fn test_reinitialize_changes_band() {
    let mut store = new_store();
    assert_eq!(store.generation(), 0);
    store.reinitialize(Band::Fcc);
    assert_eq!(store.generation(), 1);
    assert_eq!(store.band(), Band::Fcc);
    assert_eq!(store.tone_mask(), [0xFF; TONE_MASK_LEN]);
    assert_eq!(
        store.get(PlcAttr::AckWaitDuration.into(), 0).unwrap().as_uint(),
        Some(9447)
    );

    let mut dp = DataPlane::new(Band::CenelecA);
    assert!(dp.sync(&store));
    assert_eq!(dp.codec().band(), Band::Fcc);
    assert!(!dp.sync(&store));
}

// -----------------------------------------------------------------------
// 24. Configuration validation
// -----------------------------------------------------------------------
#[test]
fn test_config_validation() {
    assert!(PibConfig::default().validate().is_ok());

    let bad = PibConfig {
        spec_compliance: 16,
        ..PibConfig::default()
    };
    assert!(matches!(bad.validate(), Err(ConfigError::Invalid(_))));

    let mut empty = PibConfig::default();
    empty.tables.group = 0;
    assert!(AttributeStore::new(empty, Box::new(SimulatedPhy::new())).is_err());
}

// -----------------------------------------------------------------------
// 25. Marshaler: truncated headers and length mismatches
// -----------------------------------------------------------------------
#[test]
fn test_marshaler_malformed_requests() {
    let m = MibMarshaler::new(MessageSet::Mac);
    assert_eq!(
        m.decode_set_request(&[0, 0, 0]),
        Err(MibError::Truncated { got: 3 })
    );
    assert!(matches!(
        m.decode_get_request(&[0, 0, 0, 0, 0]),
        Err(MibError::Truncated { got: 5 })
    ));

    // Length says 2, one byte follows
    let id = AttributeId::from(PlcAttr::PanId);
    let mut body = id.raw().to_be_bytes().to_vec();
    body.extend_from_slice(&[0, 0, 2, 0x78]);
    assert_eq!(
        m.decode_set_request(&body),
        Err(MibError::Rejected {
            registry: Registry::Mac,
            raw_id: id.raw(),
            index: 0,
            error: AttrError::InvalidParameter,
        })
    );

    // the same request decodes on its own message set
    let mut body = AdpAttr::MaxHops.raw().to_be_bytes().to_vec();
    body.extend_from_slice(&[0, 0, 1, 4]);
    assert!(matches!(
        MibMarshaler::new(MessageSet::Adp).decode_set_request(&body),
        Ok(SetRequest { .. })
    ));
}

// -----------------------------------------------------------------------
// 26. Marshaler: failed get confirm carries no payload
// -----------------------------------------------------------------------
#[test]
fn test_get_confirm_failure_has_no_payload() {
    let m = MibMarshaler::new(MessageSet::AdpMac);
    let id = AttributeId::from(PlcAttr::PanId);
    let mut out = Vec::new();
    m.encode_get_confirm(id.raw(), 0, Status::InvalidIndex, &[1, 2], &mut out);
    assert_eq!(out[0], MSG_ADP_MAC_GET_CONFIRM);
    assert_eq!(out[1], STATUS_INVALID_INDEX);
    assert_eq!(out[CONFIRM_HEADER_LEN - 1], 0);
    assert_eq!(out.len(), CONFIRM_HEADER_LEN);

    // a value that does not fit the layout is reported, not sent
    out.clear();
    m.encode_get_confirm(id.raw(), 0, Status::Success, &[1, 2, 3], &mut out);
    assert_eq!(out[1], STATUS_INVALID_PARAMETER);
    assert_eq!(out.len(), CONFIRM_HEADER_LEN);

    let decoded = m.decode_get_confirm(&out[1..]).unwrap();
    assert_eq!(decoded.status, Status::InvalidParameter);
    assert!(decoded.value.is_empty());
}

// -----------------------------------------------------------------------
// 27. Message tags
// -----------------------------------------------------------------------
#[test]
fn test_message_tags() {
    assert_eq!(MessageSet::Mac.tag(MessageKind::GetRequest), 52);
    assert_eq!(MessageSet::Mac.tag(MessageKind::SetConfirm), 63);
    assert_eq!(MessageSet::Adp.tag(MessageKind::SetRequest), 17);
    assert_eq!(MessageSet::AdpMac.tag(MessageKind::GetConfirm), 46);
    for set in MessageSet::ALL {
        for kind in [
            MessageKind::GetRequest,
            MessageKind::SetRequest,
            MessageKind::GetConfirm,
            MessageKind::SetConfirm,
        ] {
            assert_eq!(MessageSet::classify(set.tag(kind)), Some((set, kind)));
        }
    }
    assert_eq!(MessageSet::classify(0), None);
}

// -----------------------------------------------------------------------
// 28. Registries are disjoint
// -----------------------------------------------------------------------
#[test]
fn test_registries_resolve_separately() {
    let raw = PlcAttr::MaxBe.raw();
    assert_eq!(
        AttributeId::resolve(Registry::Mac, raw),
        Some(AttributeId::Plc(PlcAttr::MaxBe))
    );
    assert_eq!(
        AttributeId::resolve(Registry::Mac, RfAttr::MaxBeRf.raw()),
        Some(AttributeId::Rf(RfAttr::MaxBeRf))
    );
    assert_eq!(AttributeId::resolve(Registry::Mac, 0xDEAD_BEEF), None);
    for d in catalog::iter() {
        assert_eq!(AttributeId::resolve(d.id.registry(), d.id.raw()), Some(d.id));
        assert!(catalog::describe(d.id).is_some());
    }
}

// -----------------------------------------------------------------------
// 29. Data plane: transmission bounds
// -----------------------------------------------------------------------
#[test]
fn test_encode_tx_bounds() {
    let codec = WireCodec::new(Band::CenelecA);
    let mut out = [0u8; 1024];

    assert_eq!(codec.encode_tx(&TxMessage::new(&[]), &mut out), 0);

    let big = [0u8; MAX_PHY_DATA_LEN + 1];
    assert_eq!(codec.encode_tx(&TxMessage::new(&big), &mut out), 0);
    assert!(out.iter().all(|&b| b == 0));

    let max = [0xA5u8; MAX_PHY_DATA_LEN];
    let n = codec.encode_tx(&TxMessage::new(&max), &mut out);
    assert_eq!(n, codec.tx_len(MAX_PHY_DATA_LEN));

    let mut small = [0u8; 8];
    assert_eq!(codec.encode_tx(&TxMessage::new(&[1, 2, 3]), &mut small), 0);
}

// -----------------------------------------------------------------------
// 30. Data plane: transmission layout
// -----------------------------------------------------------------------
#[test]
fn test_encode_tx_layout() {
    let codec = WireCodec::new(Band::Fcc);
    let data = [0x11, 0x22, 0x33];
    let mut msg = TxMessage::new(&data);
    msg.time = 0x0102_0304;
    msg.preemphasis = [0x07; MAX_SUBBANDS];
    msg.tone_map = [0xAA, 0xBB, 0xCC];
    msg.mode = TX_MODE_FORCED | TX_MODE_CANCEL;
    msg.power = 2;
    msg.mod_type = ModType::Qpsk;
    msg.mod_scheme = ModScheme::Coherent;
    msg.two_rs_blocks = true;
    msg.delimiter = DelimiterType::SofResponse;

    let mut out = [0u8; 128];
    let n = codec.encode_tx(&msg, &mut out);
    assert_eq!(n, 6 + 24 + 3 + 7 + 3);
    assert_eq!(&out[..6], &[0x04, 0x03, 0x02, 0x01, 0x03, 0x00]);
    assert_eq!(&out[30..33], &[0xAA, 0xBB, 0xCC]);
    assert_eq!(&out[33..40], &[0x11, 2, 1, 1, 0, 1, 1]);
    assert_eq!(&out[40..43], &data);

    let back = codec.decode_tx(&out[..n]).unwrap();
    assert_eq!(back, msg);
}

// -----------------------------------------------------------------------
// 31. Data plane: receive indication
// -----------------------------------------------------------------------
#[test]
fn test_decode_rx() {
    let codec = WireCodec::new(Band::CenelecA);
    let pdu = [0xDE, 0xAD, 0xBE, 0xEF];
    let mut rx = RxMessage::new(&pdu);
    rx.time = 1000;
    rx.rssi = 93;
    rx.agc_offset = -12;
    rx.snr_fch = -3;
    rx.lqi = 60;
    rx.tone_map[0] = 0x3F;
    rx.carrier_snr[35] = 9;

    let mut buf = Vec::new();
    codec.encode_rx(&rx, &mut buf).unwrap();
    assert_eq!(buf.len(), RX_HEADER_LEN + 1 + 36 + pdu.len());
    assert_eq!(&buf[10..12], &[4, 0]);

    let back = codec.decode_rx(&buf).unwrap();
    assert_eq!(back, rx);
    assert_eq!(back.data, &pdu);

    // zero payload length is rejected
    buf[10] = 0;
    assert_eq!(codec.decode_rx(&buf), Err(CodecError::CodecReject { len: 0 }));

    // over-maximum length is rejected before looking for the payload
    buf[10..12].copy_from_slice(&(MAX_PHY_DATA_LEN as u16 + 1).to_le_bytes());
    assert!(matches!(codec.decode_rx(&buf), Err(CodecError::CodecReject { .. })));

    assert_eq!(codec.decode_rx(&buf[..20]), Err(CodecError::BufferTooShort));
}

// -----------------------------------------------------------------------
// 32. Data plane: confirmation record
// -----------------------------------------------------------------------
#[test]
fn test_tx_confirmation() {
    let codec = WireCodec::new(Band::Arib);
    let cfm = codec
        .decode_tx_confirmation(&[1, 0, 0, 0, 0x10, 0x27, 0, 0, 1])
        .unwrap();
    assert_eq!(cfm.rms_calc, 1);
    assert_eq!(cfm.time, 10_000);
    assert_eq!(cfm.result, TxResult::Success);
    assert_eq!(cfm.to_bytes(), [1, 0, 0, 0, 0x10, 0x27, 0, 0, 1]);

    assert_eq!(
        codec.decode_tx_confirmation(&[0; 8]),
        Err(CodecError::LengthMismatch { expected: 9, got: 8 })
    );
    assert_eq!(TxResult::from_u8(255), TxResult::NoTx);
    assert_eq!(TxResult::from_u8(77), TxResult::Unknown(77));
    assert_eq!(TxResult::Unknown(77).as_u8(), 77);
}

// -----------------------------------------------------------------------
// 33. Data plane: tone map response and PSDU parameters
// -----------------------------------------------------------------------
#[test]
fn test_tone_map_response() {
    let codec = WireCodec::new(Band::Fcc);
    let rsp = ToneMapResponse {
        mod_type: ModType::Psk8,
        mod_scheme: ModScheme::Coherent,
        tone_map: [1, 2, 3],
    };
    let mut out = Vec::new();
    codec.encode_tone_map_response(&rsp, &mut out);
    assert_eq!(out, vec![2, 1, 1, 2, 3]);
    assert_eq!(codec.decode_tone_map_response(&out).unwrap(), rsp);
    assert_eq!(
        codec.decode_tone_map_response(&[7, 0, 0, 0, 0]),
        Err(CodecError::InvalidField {
            field: "mod type",
            value: 7
        })
    );

    let mut out = Vec::new();
    WireCodec::new(Band::CenelecB).encode_max_psdu_len_params(
        &MaxPsduLenParams {
            mod_type: ModType::BpskRobo,
            mod_scheme: ModScheme::Differential,
            two_rs_blocks: false,
            tone_map: [0x0F, 0, 0],
        },
        &mut out,
    );
    assert_eq!(out, vec![4, 0, 0, 0x0F]);
}

// -----------------------------------------------------------------------
// 34. Router: dispatch through registered handlers
// -----------------------------------------------------------------------
#[test]
fn test_router_dispatch() {
    let store = Arc::new(Mutex::new(new_store()));
    let mut router = UsiRouter::new();
    router
        .register(
            ProtocolId::MacG3,
            0,
            Box::new(MibHandler::new(store.clone(), &[MessageSet::Mac])),
        )
        .unwrap();

    let pan = PlcAttr::PanId.raw();
    let mut set = Vec::new();
    MibMarshaler::new(MessageSet::Mac)
        .encode_set_request(PlcAttr::PanId.into(), 0, &0x781Du16.to_le_bytes(), &mut set)
        .unwrap();
    router.deliver(0, ProtocolId::MacG3.as_u8(), &set).unwrap();
    router
        .deliver(0, ProtocolId::MacG3.as_u8(), &get_request(MessageSet::Mac, pan, 0))
        .unwrap();
    // unregistered protocol
    router.deliver(0, ProtocolId::AdpG3.as_u8(), &[18]).unwrap();

    assert_eq!(router.process(), 2);
    assert_eq!(router.dropped(), 1);

    let out = router.take_outbound();
    assert_eq!(out.len(), 2);
    assert_eq!(out[0].payload[..2], [MSG_MAC_SET_CONFIRM, STATUS_SUCCESS]);
    let cfm = MibMarshaler::new(MessageSet::Mac)
        .decode_get_confirm(&out[1].payload[1..])
        .unwrap();
    assert_eq!(cfm.status, Status::Success);
    assert_eq!(cfm.value.as_uint(), Some(0x781D));

    let stored = store.lock().unwrap().get(PlcAttr::PanId.into(), 0).unwrap();
    assert_eq!(stored.as_uint(), Some(0x781D));
}

// -----------------------------------------------------------------------
// 35. Router: registration limits and send
// -----------------------------------------------------------------------
#[test]
fn test_router_registration() {
    struct Echo;
    impl CommandHandler for Echo {
        fn handle(&mut self, payload: &[u8], outbox: &mut Outbox) -> bool {
            outbox.send(ProtocolId::UserDefined, payload.to_vec());
            true
        }
    }

    let mut router = UsiRouter::new();
    assert!(!router.is_registered(ProtocolId::UserDefined));
    router.register(ProtocolId::UserDefined, 1, Box::new(Echo)).unwrap();
    assert!(router.is_registered(ProtocolId::UserDefined));
    assert!(!router.is_registered(ProtocolId::SnifG3));
    assert_eq!(
        router.register(ProtocolId::UserDefined, 1, Box::new(Echo)),
        Err(RouterError::AlreadyRegistered(0xFE))
    );
    assert_eq!(
        router.send(ProtocolId::SnifG3, &[1]),
        Err(RouterError::ProtocolNotRegistered(0x23))
    );

    router.send(ProtocolId::UserDefined, &[9, 9]).unwrap();
    // wrong port
    router.deliver(0, 0xFE, &[1]).unwrap();
    router.deliver(1, 0xFE, &[2]).unwrap();
    assert_eq!(router.process(), 1);
    assert_eq!(
        router.take_outbound(),
        vec![
            Frame {
                port: 1,
                protocol: 0xFE,
                payload: vec![9, 9]
            },
            Frame {
                port: 1,
                protocol: 0xFE,
                payload: vec![2]
            },
        ]
    );
    assert_eq!(
        router.deliver(1, 0xFE, &vec![0u8; MAX_FRAME_LEN + 1]),
        Err(RouterError::PayloadTooLarge(MAX_FRAME_LEN + 1))
    );
}

// -----------------------------------------------------------------------
// 36. Data plane handler: one outstanding transmission
// -----------------------------------------------------------------------
#[test]
fn test_single_outstanding_transmission() {
    let dp = Arc::new(Mutex::new(DataPlane::new(Band::CenelecA)));
    let mut router = UsiRouter::new();
    router
        .register(ProtocolId::PhyAtpl2x0, 0, Box::new(dp.clone()))
        .unwrap();

    let data = [1u8, 2, 3, 4];
    let msg = TxMessage::new(&data);
    let frame = serial_tx_frame(Band::CenelecA, &msg);
    assert_eq!(frame[0], CMD_SEND_MSG);

    router.deliver(0, 0x22, &frame).unwrap();
    router.deliver(0, 0x22, &frame).unwrap();
    router.process();

    // second request answered busy
    let out = router.take_outbound();
    assert_eq!(out.len(), 1);
    assert_eq!(out[0].payload.len(), SERIAL_CFM_LEN);
    assert_eq!(out[0].payload[..2], [CMD_SEND_MSG_RSP, TxResult::BusyTx.as_u8()]);

    // the transceiver gets its own layout
    let codec = WireCodec::new(Band::CenelecA);
    let mut expected = vec![0u8; codec.tx_len(data.len())];
    codec.encode_tx(&msg, &mut expected);

    let mut plane = dp.lock().unwrap();
    assert!(plane.is_busy());
    assert_eq!(plane.take_transmitted(), vec![expected]);
    assert_eq!(
        plane.submit(&TxMessage::new(&data)),
        Err(RouterError::ChannelBusy)
    );

    let cfm = TxConfirmation {
        rms_calc: 0x0102,
        time: 5,
        result: TxResult::Success,
    };
    let confirm = plane.confirm(cfm).unwrap();
    assert_eq!(confirm, vec![CMD_SEND_MSG_RSP, 1, 0, 0, 0x01, 0x02, 0, 0, 0, 5]);
    assert_eq!(plane.serial().decode_cfm(&confirm).unwrap(), cfm);
    assert!(!plane.is_busy());
    assert!(plane.confirm(cfm).is_none());
    plane.submit(&TxMessage::new(&data)).unwrap();
}

// -----------------------------------------------------------------------
// 37. Data plane handler: invalid lengths and indications
// -----------------------------------------------------------------------
#[test]
fn test_data_plane_rejects_and_indicates() {
    let mut dp = DataPlane::new(Band::CenelecB);
    let mut outbox = Outbox::new();

    // header announcing zero bytes
    let mut frame = serial_tx_frame(Band::CenelecB, &TxMessage::new(&[9]));
    let n = frame.len();
    frame[n - 3..n - 1].copy_from_slice(&[0, 0]);
    frame.truncate(n - 1);
    assert!(dp.handle(&frame, &mut outbox));
    let (proto, rsp) = outbox.drain().next().unwrap();
    assert_eq!(proto, ProtocolId::PhyAtpl2x0);
    assert_eq!(rsp[..2], [CMD_SEND_MSG_RSP, TxResult::InvalidLength.as_u8()]);
    assert!(!dp.is_busy());

    assert!(!dp.handle(&[CMD_RECEIVE_MSG], &mut outbox));
    assert!(!dp.handle(&[], &mut outbox));

    let pdu = [7u8; 10];
    let ind = dp.indicate(&RxMessage::new(&pdu)).unwrap();
    assert_eq!(ind[0], CMD_RECEIVE_MSG);
    assert_eq!(dp.serial().decode_ind(&ind).unwrap().data, &pdu);
    assert_eq!(
        dp.indicate(&RxMessage::new(&[])),
        Err(CodecError::CodecReject { len: 0 })
    );
}

// -----------------------------------------------------------------------
// 38. Values
// -----------------------------------------------------------------------
#[test]
fn test_attribute_value_limits() {
    assert!(AttributeValue::from_slice(&[0u8; 255]).is_ok());
    assert_eq!(
        AttributeValue::from_slice(&[0u8; 256]),
        Err(AttrError::InvalidParameter)
    );
    assert_eq!(AttributeValue::from_u16(0x1234).as_bytes(), &[0x34, 0x12]);
    assert_eq!(AttributeValue::from_slice(&[1, 2, 3]).unwrap().as_uint(), None);
    assert_eq!(Status::from_u8(0xFB), Some(Status::ReadOnly));
    assert_eq!(Status::from(Err::<(), _>(AttrError::InvalidIndex)), Status::InvalidIndex);
}

// -----------------------------------------------------------------------
// 39. Data plane: receive indication ends with its payload
// -----------------------------------------------------------------------
#[test]
fn test_decode_rx_rejects_trailing_bytes() {
    let codec = WireCodec::new(Band::CenelecA);
    let pdu = [0x41, 0x88, 0x01];
    let mut buf = Vec::new();
    codec.encode_rx(&RxMessage::new(&pdu), &mut buf).unwrap();
    let exact = buf.len();
    assert_eq!(exact, codec.rx_len(pdu.len()));

    buf.extend_from_slice(&[0xEE; 5]);
    assert_eq!(
        codec.decode_rx(&buf),
        Err(CodecError::LengthMismatch {
            expected: exact,
            got: exact + 5
        })
    );
    assert_eq!(
        codec.decode_rx(&buf[..exact - 1]),
        Err(CodecError::LengthMismatch {
            expected: exact,
            got: exact - 1
        })
    );
    assert_eq!(codec.decode_rx(&buf[..exact]).unwrap().data, &pdu);
}

// -----------------------------------------------------------------------
// 40. Serial: transmission request layout
// -----------------------------------------------------------------------
#[test]
fn test_serial_tx_layout() {
    let data = [0x11, 0x22, 0x33];
    let mut msg = TxMessage::new(&data);
    msg.time = 0x0102_0304;
    msg.preemphasis = [0x07; MAX_SUBBANDS];
    msg.tone_map = [0xAA, 0xBB, 0xCC];
    msg.mode = TX_MODE_FORCED;
    msg.power = 2;
    msg.mod_type = ModType::Qpsk;
    msg.mod_scheme = ModScheme::Coherent;
    msg.pdc = 9;
    msg.two_rs_blocks = true;
    msg.delimiter = DelimiterType::SofResponse;

    let fcc = SerialCodec::new(Band::Fcc);
    let mut frame = Vec::new();
    fcc.encode_tx(&msg, &mut frame).unwrap();
    assert_eq!(frame.len(), fcc.tx_len(data.len()));
    assert_eq!(frame.len(), 6 + 3 + 1 + 24 + 7 + 3);
    assert_eq!(&frame[..6], &[CMD_SEND_MSG, TX_MODE_FORCED, 2, 1, 1, 9]);
    // tone map most significant byte first, then the RS flag
    assert_eq!(&frame[6..10], &[0xCC, 0xBB, 0xAA, 1]);
    assert_eq!(&frame[34..41], &[1, 0x01, 0x02, 0x03, 0x04, 0x00, 0x03]);
    assert_eq!(&frame[41..], &data);
    assert_eq!(fcc.decode_tx(&frame).unwrap(), msg);

    // CENELEC has no RS flag and a single tone map byte
    let cen = SerialCodec::new(Band::CenelecA);
    let mut frame = Vec::new();
    cen.encode_tx(&msg, &mut frame).unwrap();
    assert_eq!(frame.len(), 6 + 1 + 6 + 7 + 3);
    assert_eq!(frame[6], 0xAA);
    let back = cen.decode_tx(&frame).unwrap();
    assert!(!back.two_rs_blocks);
    assert_eq!(back.tone_map, [0xAA, 0, 0]);
    assert_eq!(back.time, msg.time);
    assert_eq!(back.data, &data);
}

// -----------------------------------------------------------------------
// 41. Serial: malformed transmission requests
// -----------------------------------------------------------------------
#[test]
fn test_serial_tx_rejects() {
    let codec = SerialCodec::new(Band::Arib);
    let data = [5u8; 4];
    let mut frame = Vec::new();
    codec.encode_tx(&TxMessage::new(&data), &mut frame).unwrap();
    let exact = frame.len();

    let mut long = frame.clone();
    long.push(0);
    assert_eq!(
        codec.decode_tx(&long),
        Err(CodecError::LengthMismatch {
            expected: exact,
            got: exact + 1
        })
    );
    assert_eq!(codec.decode_tx(&frame[..10]), Err(CodecError::BufferTooShort));

    let mut bad = frame.clone();
    bad[3] = 9;
    assert_eq!(
        codec.decode_tx(&bad),
        Err(CodecError::InvalidField {
            field: "mod type",
            value: 9
        })
    );

    let mut wrong = frame.clone();
    wrong[0] = CMD_RECEIVE_MSG;
    assert!(matches!(
        codec.decode_tx(&wrong),
        Err(CodecError::InvalidField { field: "command", .. })
    ));

    let big = vec![0u8; MAX_PHY_DATA_LEN + 1];
    assert_eq!(
        codec.encode_tx(&TxMessage::new(&big), &mut Vec::new()),
        Err(CodecError::CodecReject {
            len: MAX_PHY_DATA_LEN + 1
        })
    );
}

// -----------------------------------------------------------------------
// 42. Serial: receive indication layout
// -----------------------------------------------------------------------
#[test]
fn test_serial_indication_layout() {
    let codec = SerialCodec::new(Band::CenelecA);
    let pdu = [0xDE, 0xAD];
    let mut rx = RxMessage::new(&pdu);
    rx.mod_type = ModType::Qam;
    rx.mod_scheme = ModScheme::Coherent;
    rx.tone_map[0] = 0x3F;
    rx.snr_fch = -2;
    rx.snr_payload = 0x0102;
    rx.rssi = 93;
    rx.agc_factor = 0x0A0B_0C0D;
    rx.agc_offset = -7;
    rx.zct_diff = 4;
    rx.delimiter = DelimiterType::SofResponse;
    rx.lqi = 60;
    rx.carrier_snr[0] = 11;
    rx.carrier_snr[35] = 12;
    rx.snr_worst_carrier = 1;
    rx.corrupted_carriers = 0x0203;
    rx.noised_symbols = 0x0405;
    rx.rs_corrected_errors = 6;
    rx.time = 0x1122_3344;
    rx.frame_duration = 0x5566;

    let mut frame = Vec::new();
    codec.encode_ind(&rx, &mut frame).unwrap();
    assert_eq!(frame.len(), codec.ind_len(pdu.len()));
    assert_eq!(frame.len(), 3 + 1 + 13 + 36 + 20 + 2);
    assert_eq!(&frame[..4], &[CMD_RECEIVE_MSG, 3, 1, 0x3F]);
    assert_eq!(
        &frame[4..17],
        &[0xFF, 0xFE, 0x01, 0x02, 0, 93, 0x0A, 0x0B, 0x0C, 0x0D, 4, 1, 60]
    );
    assert_eq!(frame[17], 11);
    assert_eq!(frame[52], 12);
    assert_eq!(&frame[53..63], &[1, 0x02, 0x03, 0x04, 0x05, 0, 0, 0, 0, 6]);
    assert_eq!(&frame[63..73], &[0, 2, 0x11, 0x22, 0x33, 0x44, 0, 0, 0x55, 0x66]);
    assert_eq!(&frame[73..], &pdu);

    // AGC details are not carried by the serial layout
    let back = codec.decode_ind(&frame).unwrap();
    assert_eq!(back.agc_offset, 0);
    rx.agc_offset = 0;
    assert_eq!(back, rx);

    frame.push(0);
    assert!(matches!(
        codec.decode_ind(&frame),
        Err(CodecError::LengthMismatch { .. })
    ));
    assert_eq!(
        codec.decode_cfm(&[CMD_SEND_MSG_RSP, 1, 0, 0]),
        Err(CodecError::LengthMismatch {
            expected: SERIAL_CFM_LEN,
            got: 4
        })
    );
}

// -----------------------------------------------------------------------
// 43. Sniffer: received and transmitted frames
// -----------------------------------------------------------------------
#[test]
fn test_sniffer_frames() {
    let dp_band = Band::Fcc;
    let mut dp = DataPlane::new(dp_band).with_sniffer();
    let pdu = [0x41, 0x88, 0x07];
    let mut rx = RxMessage::new(&pdu);
    rx.mod_type = ModType::Psk8;
    rx.mod_scheme = ModScheme::Coherent;
    rx.tone_map = [0x01, 0x02, 0x03];
    rx.lqi = 48;
    rx.time = 10_000;
    rx.frame_duration = 2_500;
    rx.rssi = 0x0102;
    rx.agc_factor = 0x0009_0A0B;

    let ind = dp.sniff_indication(&rx, 0x0123).unwrap();
    assert_eq!(ind.len(), SNIFFER_HEADER_LEN + pdu.len());
    assert_eq!(&ind[..3], &[SNIFFER_CMD_G3, SNIFFER_VERSION, SNIFFER_DEVICE_G3]);
    assert_eq!(&ind[3..11], &[0x21, 0x03, 0x02, 0x01, 0x01, 0x23, 48, 0]);
    assert_eq!(&ind[11..19], &[0, 0, 0x1D, 0x4C, 0, 0, 0x27, 0x10]);
    assert_eq!(&ind[19..25], &[0x01, 0x02, 0x0A, 0x0B, 0, 3]);
    assert_eq!(&ind[25..], &pdu);

    // acknowledgements carry no modulation, tone map or symbols
    rx.delimiter = DelimiterType::Ack;
    let ack = dp.sniff_indication(&rx, 0x0123).unwrap();
    assert_eq!(&ack[3..11], &[0, 0, 0, 0, 0, 0, 0xFF, 2]);

    let data = [0xAB; 4];
    let mut msg = TxMessage::new(&data);
    msg.time = 500;
    msg.tone_map = [0x0F, 0, 0];
    dp.submit(&msg).unwrap();

    let failed = TxConfirmation {
        rms_calc: 0,
        time: 900,
        result: TxResult::BusyChannel,
    };
    assert!(dp.sniff_confirm(&failed, 12).is_none());

    let ok = TxConfirmation {
        result: TxResult::Success,
        ..failed
    };
    dp.confirm(ok).unwrap();
    let tx = dp.sniff_confirm(&ok, 12).unwrap();
    assert_eq!(&tx[3..11], &[0x40, 0, 0, 0x0F, 0, 12, 0xFF, 0]);
    assert_eq!(&tx[11..19], &[0, 0, 0x01, 0xF4, 0, 0, 0x03, 0x84]);
    assert_eq!(&tx[19..25], &[0x00, 0xFF, 0x00, 0xFF, 0, 4]);
    assert_eq!(&tx[25..], &data);

    // CENELEC-A reports its single tone map byte last
    let mut tap = SnifferTap::new(Band::CenelecA);
    assert!(tap.confirmation(&ok, 1).is_none());
    tap.record_tx(&msg);
    assert_eq!(&tap.confirmation(&ok, 1).unwrap()[4..7], &[0, 0, 0x0F]);

    // without a tap nothing is mirrored
    let plain = DataPlane::new(dp_band);
    assert!(plain.sniff_indication(&rx, 0).is_none());
}

// -----------------------------------------------------------------------
// 44. Sniffer: tone mask command reaches the transceiver only
// -----------------------------------------------------------------------
#[test]
fn test_sniffer_tone_mask_command() {
    let phy = Arc::new(Mutex::new(SimulatedPhy::new()));
    let shared = Box::new(SharedPhy(phy.clone()));
    let store = AttributeStore::new(PibConfig::default(), shared).unwrap();
    let store = Arc::new(Mutex::new(store));
    let updates = phy.lock().unwrap().mask_updates();

    let mut router = UsiRouter::new();
    router
        .register(ProtocolId::SnifG3, 2, Box::new(SnifferHandler::new(store.clone())))
        .unwrap();

    let mask = [0x0F, 0xF0, 0, 0, 0, 0, 0, 0, 0];
    let mut cmd = vec![SNIFFER_CMD_SET_TONE_MASK];
    cmd.extend_from_slice(&mask);
    router.deliver(2, ProtocolId::SnifG3.as_u8(), &cmd).unwrap();
    // short mask and unknown command
    router.deliver(2, ProtocolId::SnifG3.as_u8(), &cmd[..5]).unwrap();
    router.deliver(2, ProtocolId::SnifG3.as_u8(), &[7]).unwrap();
    assert_eq!(router.process(), 3);
    assert!(router.take_outbound().is_empty());

    let phy = phy.lock().unwrap();
    assert_eq!(phy.tone_mask(), mask);
    assert_eq!(phy.mask_updates(), updates + 1);

    // the MAC attribute keeps the band default
    let store = store.lock().unwrap();
    assert_eq!(store.tone_mask(), Band::CenelecA.default_tone_mask());
    assert_eq!(store.timing().subcarriers, 36);
}

// -----------------------------------------------------------------------
// 45. Coordinator role defaults
// -----------------------------------------------------------------------
#[test]
fn test_coordinator_defaults() {
    let short = AttributeId::from(PlcAttr::ShortAddress);
    let rc = AttributeId::from(PlcAttr::RcCoord);

    let mut device = new_store();
    assert_eq!(device.get(short, 0).unwrap().as_uint(), Some(0xFFFF));
    assert_eq!(device.get(rc, 0).unwrap().as_uint(), Some(0xFFFF));

    let mut coord = store_with(PibConfig {
        coordinator: true,
        ..PibConfig::default()
    });
    assert_eq!(coord.get(short, 0).unwrap().as_uint(), Some(0));
    assert_eq!(coord.get(rc, 0).unwrap().as_uint(), Some(0));

    coord.set(short, 0, &0x0042u16.to_le_bytes()).unwrap();
    coord.reinitialize(Band::Fcc);
    assert_eq!(coord.get(short, 0).unwrap().as_uint(), Some(0));
    assert_eq!(coord.get(rc, 0).unwrap().as_uint(), Some(0));
}
