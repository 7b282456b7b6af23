// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Static attribute catalog.
//!
//! One descriptor per attribute. The store, the get-confirm encoder and the
//! set-request decoder all derive their behavior from the same [`Shape`],
//! so the PLC and RF branches cannot drift apart.

use crate::error::AttrError;
use crate::id::{AdpAttr, AttributeId, PhyParam, PlcAttr, Registry, RfAttr, RfPhyParam};
use crate::value::MAX_VALUE_LEN;

use AdpAttr as Ad;
use PlcAttr as Pl;
use RfAttr as Rr;

// ---------------------------------------------------------------------------
// Field layout
// ---------------------------------------------------------------------------

/// One fixed-width field of a packed value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    U8,
    U16,
    U32,
    /// Opaque bytes, copied without conversion.
    Bytes(usize),
}

impl Field {
    pub const fn width(self) -> usize {
        match self {
            Field::U8 => 1,
            Field::U16 => 2,
            Field::U32 => 4,
            Field::Bytes(n) => n,
        }
    }
}

/// How the variable tail length is tied to the fixed header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubLen {
    Free,
    /// Tail length must be `ceil(bits / 8)` where `bits` is the header byte at this offset.
    BitsAt(usize),
}

/// Variable-length opaque tail following the fixed fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tail {
    pub min: usize,
    pub max: usize,
    pub sub: SubLen,
}

/// Ordered field list of a value, optionally followed by a variable tail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Shape {
    pub fields: &'static [Field],
    pub tail: Option<Tail>,
}

impl Shape {
    pub const fn fixed(fields: &'static [Field]) -> Self {
        Self { fields, tail: None }
    }

    pub const fn with_tail(fields: &'static [Field], min: usize, max: usize, sub: SubLen) -> Self {
        Self {
            fields,
            tail: Some(Tail { min, max, sub }),
        }
    }

    /// Total width of the fixed fields.
    pub const fn header_len(&self) -> usize {
        let mut i = 0;
        let mut n = 0;
        while i < self.fields.len() {
            n += self.fields[i].width();
            i += 1;
        }
        n
    }

    /// Native size, or `None` for a variable-length value.
    pub fn native_size(&self) -> Option<usize> {
        match self.tail {
            None => Some(self.header_len()),
            Some(_) => None,
        }
    }

    /// Checks a packed value against the layout, including an embedded sub-length.
    pub fn check(&self, data: &[u8]) -> Result<(), AttrError> {
        let header = self.header_len();
        let Some(tail) = self.tail else {
            return if data.len() == header {
                Ok(())
            } else {
                Err(AttrError::InvalidParameter)
            };
        };
        if data.len() < header + tail.min || data.len() > header + tail.max {
            return Err(AttrError::InvalidParameter);
        }
        if let SubLen::BitsAt(offset) = tail.sub {
            let bits = usize::from(data[offset]);
            if data.len() - header != bits.div_ceil(8) {
                return Err(AttrError::InvalidParameter);
            }
        }
        Ok(())
    }
}

const U8: Shape = Shape::fixed(&[Field::U8]);
const U16: Shape = Shape::fixed(&[Field::U16]);
const U32: Shape = Shape::fixed(&[Field::U32]);
const NONE: Shape = Shape::fixed(&[]);
const VERSION: Shape = Shape::fixed(&[Field::Bytes(6)]);

const PREFIX_ENTRY: Shape = Shape::with_tail(
    // prefix length (bits), on-link, autonomous, valid time, preferred time
    &[Field::U8, Field::U8, Field::U8, Field::U32, Field::U32],
    0,
    16,
    SubLen::BitsAt(0),
);
const CONTEXT_ENTRY: Shape = Shape::with_tail(
    // valid time, valid for compression, context length (bits)
    &[Field::U16, Field::U8, Field::U8],
    0,
    16,
    SubLen::BitsAt(3),
);
const BROADCAST_LOG_ENTRY: Shape = Shape::fixed(&[Field::U16, Field::U8, Field::U16]);
// dst, next hop, cost, hop/weak-link count, media type, valid time
const ROUTING_ENTRY: Shape = Shape::fixed(&[
    Field::U16,
    Field::U16,
    Field::U16,
    Field::U8,
    Field::U8,
    Field::U16,
]);
const GROUP_ENTRY: Shape = Shape::fixed(&[Field::U16, Field::U8]);
const BLACKLIST_ENTRY: Shape = Shape::fixed(&[Field::U16, Field::U8, Field::U16]);
const NEIGHBOUR_ENTRY: Shape = Shape::fixed(&[
    Field::U16,      // short address
    Field::Bytes(3), // tone map
    Field::U8,       // modulation type
    Field::U8,       // tx gain
    Field::U8,       // tx resolution
    Field::Bytes(6), // tx coefficients
    Field::U8,       // modulation scheme
    Field::U8,       // phase differential
    Field::U8,       // lqi
    Field::U16,      // tmr valid time
    Field::U16,      // neighbour valid time
]);
const POS_ENTRY: Shape = Shape::fixed(&[Field::U16, Field::U8, Field::U16]);
const POS_ENTRY_RF: Shape = Shape::fixed(&[
    Field::U16,
    Field::U8,
    Field::U8,
    Field::U8,
    Field::U8,
    Field::U8,
    Field::U16,
]);
const DEVICE_ENTRY: Shape = Shape::fixed(&[Field::U16, Field::U16, Field::U32]);
// duration, threshold
const CCA_ED_CONFIG: Shape = Shape::fixed(&[Field::U16, Field::U8]);

/// Layout of a PLC PHY parameter.
pub fn phy_param_shape(param: PhyParam) -> Shape {
    match param.width() {
        4 => U32,
        2 => U16,
        _ => U8,
    }
}

/// Layout of an RF PHY parameter.
pub fn rf_phy_param_shape(param: RfPhyParam) -> Shape {
    match param {
        RfPhyParam::FwVersion => VERSION,
        RfPhyParam::CcaEdConfig => CCA_ED_CONFIG,
        p => match p.width() {
            4 => U32,
            2 => U16,
            _ => U8,
        },
    }
}

// ---------------------------------------------------------------------------
// Descriptor
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    ReadOnly,
    ReadWrite,
}

/// Backing table of an indexed attribute. Bounds come from configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TableKind {
    Prefix,
    Context,
    BroadcastLog,
    Routing,
    Group,
    Blacklist,
    DestinationSet,
    Neighbour,
    Pos,
    PosRf,
    Device,
    DeviceRf,
    SecurityLevelRf,
}

impl TableKind {
    pub const ALL: [TableKind; 13] = [
        TableKind::Prefix,
        TableKind::Context,
        TableKind::BroadcastLog,
        TableKind::Routing,
        TableKind::Group,
        TableKind::Blacklist,
        TableKind::DestinationSet,
        TableKind::Neighbour,
        TableKind::Pos,
        TableKind::PosRf,
        TableKind::Device,
        TableKind::DeviceRf,
        TableKind::SecurityLevelRf,
    ];

    /// An empty write clears the row.
    pub fn clearable(self) -> bool {
        matches!(self, TableKind::Prefix | TableKind::Context | TableKind::Routing)
    }
}

/// PHY the container attribute forwards to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhyBus {
    Plc,
    Rf,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rows {
    /// Index must be zero.
    Scalar,
    /// Index is the row number.
    Table(TableKind),
    /// Index is the short address stored in the row's first field.
    Lookup(TableKind),
    /// Index selects a PHY parameter.
    Phy(PhyBus),
}

/// Value check run before any write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rule {
    Any,
    /// Inclusive numeric range on the whole value.
    Range(u32, u32),
    Bool,
    /// At most 20, above MinBe, and within the fairness limit.
    MaxBe,
    /// At most 20, below MaxBe, and within the fairness limit.
    MinBe,
    /// At least `2 * (MaxBe - MinBe)` and at least K.
    FairnessLimit,
    /// K in `1..=CsmaFairnessLimit`.
    WindowK,
    MaxBeRf,
    MinBeRf,
    /// Embedded big-endian read length must fit one value.
    DebugSet,
}

/// Values computed on read instead of stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Derive {
    AckWaitDuration,
    BandInformation,
    CenelecLegacyMode,
    FccLegacyMode,
    Count(TableKind),
    Version,
    DebugRead,
    HybridProfile,
}

/// Reset default.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Init {
    Zero,
    /// Zero, and cleared again by the statistics reset of its registry.
    Counter,
    U8(u8),
    U16(u16),
    U32(u32),
    /// Empty value (Length 0).
    Empty,
    /// Default tone mask of the configured band.
    ToneMask,
    Derived(Derive),
}

/// Side effect run after a successful write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    None,
    /// Recompute MAC timing and push the mask to the transceiver.
    ToneMask,
    ResetMacStats,
    ResetMacStatsRf,
    SecurityReset,
    SecurityResetRf,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttributeDescriptor {
    pub id: AttributeId,
    pub access: Access,
    pub rows: Rows,
    pub shape: Shape,
    pub rule: Rule,
    pub init: Init,
    pub effect: Effect,
}

impl AttributeDescriptor {
    const fn new(id: AttributeId, shape: Shape) -> Self {
        Self {
            id,
            access: Access::ReadWrite,
            rows: Rows::Scalar,
            shape,
            rule: Rule::Any,
            init: Init::Zero,
            effect: Effect::None,
        }
    }

    const fn ro(mut self) -> Self {
        self.access = Access::ReadOnly;
        self
    }

    const fn rule(mut self, rule: Rule) -> Self {
        self.rule = rule;
        self
    }

    const fn init(mut self, init: Init) -> Self {
        self.init = init;
        self
    }

    const fn effect(mut self, effect: Effect) -> Self {
        self.effect = effect;
        self
    }

    const fn rows(mut self, rows: Rows) -> Self {
        self.rows = rows;
        self
    }

    const fn flag(self) -> Self {
        self.rule(Rule::Bool)
    }

    const fn counter(self) -> Self {
        self.ro().init(Init::Counter)
    }

    const fn derived(self, d: Derive) -> Self {
        self.ro().init(Init::Derived(d))
    }

    pub fn name(&self) -> &'static str {
        self.id.name()
    }

    pub fn is_read_only(&self) -> bool {
        self.access == Access::ReadOnly
    }

    /// Whether the attribute takes a non-zero index.
    pub fn indexed(&self) -> bool {
        self.rows != Rows::Scalar
    }

    /// Native size, `None` when variable or index-dependent.
    pub fn native_size(&self) -> Option<usize> {
        match self.rows {
            Rows::Phy(_) => None,
            _ => self.shape.native_size(),
        }
    }

    /// Layout of the value at `index`. Only PHY containers depend on it.
    pub fn shape_at(&self, index: u16) -> Result<Shape, AttrError> {
        match self.rows {
            Rows::Phy(PhyBus::Plc) => PhyParam::from_raw(index)
                .map(phy_param_shape)
                .ok_or(AttrError::InvalidIndex),
            Rows::Phy(PhyBus::Rf) => RfPhyParam::from_raw(index)
                .map(rf_phy_param_shape)
                .ok_or(AttrError::InvalidIndex),
            _ => Ok(self.shape),
        }
    }
}

// ---------------------------------------------------------------------------
// Table
// ---------------------------------------------------------------------------

const fn adp(a: AdpAttr, shape: Shape) -> AttributeDescriptor {
    AttributeDescriptor::new(AttributeId::Adp(a), shape)
}

const fn plc(a: PlcAttr, shape: Shape) -> AttributeDescriptor {
    AttributeDescriptor::new(AttributeId::Plc(a), shape)
}

const fn rf(a: RfAttr, shape: Shape) -> AttributeDescriptor {
    AttributeDescriptor::new(AttributeId::Rf(a), shape)
}

static CATALOG: &[AttributeDescriptor] = &[
    // -- adaptation layer ---------------------------------------------------
    adp(Ad::SecurityLevel, U8).init(Init::U8(5)),
    adp(Ad::PrefixTable, PREFIX_ENTRY)
        .rows(Rows::Table(TableKind::Prefix))
        .init(Init::Empty),
    adp(Ad::BroadcastLogTableEntryTtl, U16).init(Init::U16(2)),
    adp(Ad::MetricType, U8).init(Init::U8(0x0F)),
    adp(Ad::LowLqiValue, U8),
    adp(Ad::HighLqiValue, U8).init(Init::U8(255)),
    adp(Ad::RrepWait, U8).init(Init::U8(4)),
    adp(Ad::ContextInformationTable, CONTEXT_ENTRY)
        .rows(Rows::Table(TableKind::Context))
        .init(Init::Empty),
    adp(Ad::CoordShortAddress, U16),
    adp(Ad::RlcEnabled, U8).flag().init(Init::U8(1)),
    adp(Ad::AddRevLinkCost, U8),
    adp(Ad::BroadcastLogTable, BROADCAST_LOG_ENTRY).rows(Rows::Table(TableKind::BroadcastLog)),
    adp(Ad::RoutingTable, ROUTING_ENTRY).rows(Rows::Table(TableKind::Routing)),
    adp(Ad::UnicastRreqGenEnable, U8).flag().init(Init::U8(1)),
    adp(Ad::GroupTable, GROUP_ENTRY).rows(Rows::Table(TableKind::Group)),
    adp(Ad::MaxHops, U8).rule(Rule::Range(1, 14)).init(Init::U8(8)),
    adp(Ad::DeviceType, U8).rule(Rule::Range(0, 2)).init(Init::U8(2)),
    adp(Ad::NetTraversalTime, U8).init(Init::U8(20)),
    adp(Ad::RoutingTableEntryTtl, U16).init(Init::U16(360)),
    adp(Ad::Kr, U8),
    adp(Ad::Km, U8),
    adp(Ad::Kc, U8),
    adp(Ad::Kq, U8).init(Init::U8(10)),
    adp(Ad::Kh, U8).init(Init::U8(4)),
    adp(Ad::RreqRetries, U8),
    adp(Ad::RreqRerrWait, U8).init(Init::U8(30)),
    adp(Ad::WeakLqiValue, U8).init(Init::U8(52)),
    adp(Ad::Krt, U8),
    adp(Ad::SoftVersion, VERSION).derived(Derive::Version),
    adp(Ad::SnifferMode, U8).flag(),
    adp(Ad::BlacklistTable, BLACKLIST_ENTRY).rows(Rows::Table(TableKind::Blacklist)),
    adp(Ad::BlacklistTableEntryTtl, U16).init(Init::U16(10)),
    adp(Ad::MaxJoinWaitTime, U16).init(Init::U16(20)),
    adp(Ad::PathDiscoveryTime, U8).init(Init::U8(40)),
    adp(Ad::ActiveKeyIndex, U8).rule(Rule::Range(0, 1)),
    adp(Ad::DestinationAddressSet, U16).rows(Rows::Table(TableKind::DestinationSet)),
    adp(Ad::DefaultCoordRouteEnabled, U8).flag(),
    adp(Ad::LowLqiValueRf, U8),
    adp(Ad::HighLqiValueRf, U8).init(Init::U8(255)),
    adp(Ad::KqRf, U8).init(Init::U8(10)),
    adp(Ad::KhRf, U8).init(Init::U8(4)),
    adp(Ad::KrtRf, U8),
    adp(Ad::KdcRf, U8).init(Init::U8(10)),
    adp(Ad::UseBackupMedia, U8).flag(),
    adp(Ad::DisableDefaultRouting, U8).flag(),
    adp(Ad::ManufReassemblyTimer, U16).init(Init::U16(60)),
    adp(Ad::ManufIpv6HeaderCompression, U8).flag().init(Init::U8(1)),
    adp(
        Ad::ManufEapNetworkAccessIdentifier,
        Shape::with_tail(&[], 8, 36, SubLen::Free),
    )
    .init(Init::Empty),
    adp(Ad::ManufBroadcastSequenceNumber, U8),
    adp(Ad::ManufDatagramTag, U16),
    adp(Ad::ManufRoutingTableCount, U32).derived(Derive::Count(TableKind::Routing)),
    adp(Ad::ManufForcedNoAckRequest, U8).flag(),
    adp(Ad::ManufLqiToCoord, U8).ro(),
    adp(Ad::ManufBroadcastRouteAll, U8).flag(),
    adp(Ad::ManufKeepParamsAfterKickLeave, U8).flag(),
    adp(Ad::ManufAdpInternalVersion, VERSION).derived(Derive::Version),
    adp(Ad::ManufCircularRoutesDetected, U16).ro(),
    adp(Ad::ManufLastCircularRouteAddress, U16).ro(),
    adp(Ad::ManufIpv6UlaDestShortAddress, U16),
    adp(Ad::ManufMaxRepairResendAttempts, U8).init(Init::U8(5)),
    adp(Ad::ManufDisableAutoRreq, U8).flag(),
    adp(Ad::ManufAllNeighborsBlacklistedCount, U16).ro(),
    adp(Ad::ManufQueuedEntriesRemovedTimeoutCount, U16).ro(),
    adp(Ad::ManufQueuedEntriesRemovedRouteErrorCount, U16).ro(),
    adp(Ad::ManufPendingDataIndShortAddress, U16).ro(),
    adp(Ad::ManufGetBandContextTones, U8),
    adp(Ad::ManufUpdateNonVolatileData, U8).flag(),
    adp(Ad::ManufDiscoverRouteGlobalSeqNum, U16),
    adp(Ad::ManufFragmentDelay, U16),
    adp(Ad::ManufDynamicFragmentDelayEnabled, U8).flag(),
    adp(Ad::ManufDynamicFragmentDelayFactor, U16),
    adp(Ad::ManufBlacklistTableCount, U16).derived(Derive::Count(TableKind::Blacklist)),
    adp(Ad::ManufBroadcastLogTableCount, U16).derived(Derive::Count(TableKind::BroadcastLog)),
    adp(Ad::ManufContextInformationTableCount, U16).derived(Derive::Count(TableKind::Context)),
    adp(Ad::ManufGroupTableCount, U16).derived(Derive::Count(TableKind::Group)),
    adp(Ad::ManufRoutingTableElement, ROUTING_ENTRY)
        .ro()
        .rows(Rows::Lookup(TableKind::Routing)),
    adp(Ad::ManufSetPhaseDiffPreqPrep, U8).flag(),
    adp(Ad::ManufHybridProfile, U8).derived(Derive::HybridProfile),
    // -- PLC MAC ------------------------------------------------------------
    plc(Pl::AckWaitDuration, U16).derived(Derive::AckWaitDuration),
    plc(Pl::MaxBe, U8).rule(Rule::MaxBe).init(Init::U8(8)),
    plc(Pl::Bsn, U8),
    plc(Pl::Dsn, U8),
    plc(Pl::MaxCsmaBackoffs, U8).init(Init::U8(50)),
    plc(Pl::MinBe, U8).rule(Rule::MinBe).init(Init::U8(3)),
    plc(Pl::PanId, U16).init(Init::U16(0xFFFF)),
    plc(Pl::PromiscuousMode, U8).flag(),
    plc(Pl::ShortAddress, U16).init(Init::U16(0xFFFF)),
    plc(Pl::MaxFrameRetries, U8).rule(Rule::Range(0, 10)).init(Init::U8(5)),
    plc(Pl::TimestampSupported, U8).ro(),
    plc(Pl::SecurityEnabled, U8).ro(),
    plc(Pl::FrameCounter, U32),
    plc(Pl::HighPriorityWindowSize, U8).rule(Rule::Range(1, 7)).init(Init::U8(7)),
    plc(Pl::TxDataPacketCount, U32).counter(),
    plc(Pl::RxDataPacketCount, U32).counter(),
    plc(Pl::TxCmdPacketCount, U32).counter(),
    plc(Pl::RxCmdPacketCount, U32).counter(),
    plc(Pl::CsmaFailCount, U32).counter(),
    plc(Pl::CsmaNoAckCount, U32).counter(),
    plc(Pl::RxDataBroadcastCount, U32).counter(),
    plc(Pl::TxDataBroadcastCount, U32).counter(),
    plc(Pl::BadCrcCount, U32).counter(),
    plc(Pl::NeighbourTable, NEIGHBOUR_ENTRY).rows(Rows::Table(TableKind::Neighbour)),
    plc(Pl::FreqNotching, U8).flag(),
    plc(Pl::CsmaFairnessLimit, U8).rule(Rule::FairnessLimit).init(Init::U8(15)),
    plc(Pl::TmrTtl, U8).init(Init::U8(10)),
    plc(Pl::PosTableEntryTtl, U8).init(Init::U8(255)),
    plc(Pl::RcCoord, U16).init(Init::U16(0xFFFF)),
    plc(Pl::ToneMask, Shape::fixed(&[Field::Bytes(9)]))
        .init(Init::ToneMask)
        .effect(Effect::ToneMask),
    plc(Pl::BeaconRandomizationWindowLength, U8)
        .rule(Rule::Range(1, 254))
        .init(Init::U8(12)),
    plc(Pl::A, U8).rule(Rule::Range(3, 20)).init(Init::U8(8)),
    plc(Pl::K, U8).rule(Rule::WindowK).init(Init::U8(5)),
    plc(Pl::MinCwAttempts, U8).rule(Rule::Range(1, 255)).init(Init::U8(10)),
    plc(Pl::CenelecLegacyMode, U8).derived(Derive::CenelecLegacyMode),
    plc(Pl::FccLegacyMode, U8).derived(Derive::FccLegacyMode),
    plc(Pl::BroadcastMaxCwEnable, U8).flag(),
    plc(Pl::TransmitAtten, U8),
    plc(Pl::PosTable, POS_ENTRY).rows(Rows::Table(TableKind::Pos)),
    plc(Pl::ManufDeviceTable, DEVICE_ENTRY).rows(Rows::Table(TableKind::Device)),
    plc(Pl::ManufExtendedAddress, Shape::fixed(&[Field::Bytes(8)])),
    plc(Pl::ManufNeighbourTableElement, NEIGHBOUR_ENTRY)
        .ro()
        .rows(Rows::Lookup(TableKind::Neighbour)),
    plc(Pl::ManufBandInformation, Shape::fixed(&[Field::U16, Field::Bytes(8)]))
        .derived(Derive::BandInformation),
    plc(Pl::ManufCoordShortAddress, U16),
    plc(Pl::ManufMaxMacPayloadSize, U16).ro().init(Init::U16(400)),
    plc(Pl::ManufSecurityReset, U8)
        .flag()
        .effect(Effect::SecurityReset),
    plc(Pl::ManufForcedModScheme, U8).rule(Rule::Range(0, 2)),
    plc(Pl::ManufForcedModType, U8).rule(Rule::Range(0, 4)),
    plc(Pl::ManufForcedToneMap, Shape::fixed(&[Field::Bytes(3)])),
    plc(Pl::ManufForcedModSchemeOnTmResponse, U8).rule(Rule::Range(0, 2)),
    plc(Pl::ManufForcedModTypeOnTmResponse, U8).rule(Rule::Range(0, 4)),
    plc(Pl::ManufForcedToneMapOnTmResponse, Shape::fixed(&[Field::Bytes(3)])),
    plc(Pl::ManufLastRxModScheme, U8).ro(),
    plc(Pl::ManufLastRxModType, U8).ro(),
    plc(Pl::ManufLbpFrameReceived, U8).ro(),
    plc(Pl::ManufLngFrameReceived, U8).ro(),
    plc(Pl::ManufBcnFrameReceived, U8).ro(),
    plc(Pl::ManufNeighbourTableCount, U16).derived(Derive::Count(TableKind::Neighbour)),
    plc(Pl::ManufRxOtherDestinationCount, U32).counter(),
    plc(Pl::ManufRxInvalidFrameLengthCount, U32).counter(),
    plc(Pl::ManufRxMacRepetitionCount, U32).counter(),
    plc(Pl::ManufRxWrongAddrModeCount, U32).counter(),
    plc(Pl::ManufRxUnsupportedSecurityCount, U32).counter(),
    plc(Pl::ManufRxWrongKeyIdCount, U32).counter(),
    plc(Pl::ManufRxInvalidKeyCount, U32).counter(),
    plc(Pl::ManufRxWrongFcCount, U32).counter(),
    plc(Pl::ManufRxDecryptionErrorCount, U32).counter(),
    plc(Pl::ManufRxSegmentDecodeErrorCount, U32).counter(),
    plc(Pl::ManufEnableMacSniffer, U8).flag(),
    plc(Pl::ManufPosTableCount, U16).derived(Derive::Count(TableKind::Pos)),
    plc(Pl::ManufRetriesLeftToForceRobo, U8),
    plc(Pl::ManufPhyParam, NONE).rows(Rows::Phy(PhyBus::Plc)),
    plc(Pl::ManufMacInternalVersion, VERSION).derived(Derive::Version),
    plc(Pl::ManufMacRtInternalVersion, VERSION).derived(Derive::Version),
    plc(Pl::ManufResetMacStats, NONE).effect(Effect::ResetMacStats),
    plc(Pl::ManufSleepMode, U8).flag(),
    plc(Pl::ManufDebugSet, Shape::fixed(&[Field::Bytes(7)])).rule(Rule::DebugSet),
    plc(
        Pl::ManufDebugRead,
        Shape::with_tail(&[], 0, MAX_VALUE_LEN, SubLen::Free),
    )
    .derived(Derive::DebugRead),
    plc(Pl::ManufPosTableElement, POS_ENTRY)
        .ro()
        .rows(Rows::Lookup(TableKind::Pos)),
    // -- RF MAC -------------------------------------------------------------
    rf(Rr::DsnRf, U8),
    rf(Rr::MaxBeRf, U8).rule(Rule::MaxBeRf).init(Init::U8(5)),
    rf(Rr::MaxCsmaBackoffsRf, U8).rule(Rule::Range(0, 5)).init(Init::U8(4)),
    rf(Rr::MaxFrameRetriesRf, U8).rule(Rule::Range(0, 7)).init(Init::U8(3)),
    rf(Rr::MinBeRf, U8).rule(Rule::MinBeRf).init(Init::U8(3)),
    rf(Rr::TimestampSupportedRf, U8).ro(),
    rf(Rr::DeviceTableRf, DEVICE_ENTRY).rows(Rows::Table(TableKind::DeviceRf)),
    rf(Rr::FrameCounterRf, U32),
    rf(Rr::DuplicateDetectionTtlRf, U8).init(Init::U8(3)),
    rf(Rr::CounterOctetsRf, U8).ro().init(Init::U8(4)),
    rf(Rr::RetryCountRf, U32).counter(),
    rf(Rr::MultipleRetryCountRf, U32).counter(),
    rf(Rr::TxFailCountRf, U32).counter(),
    rf(Rr::TxSuccessCountRf, U32).counter(),
    rf(Rr::FcsErrorCountRf, U32).counter(),
    rf(Rr::SecurityFailureCountRf, U32).counter(),
    rf(Rr::DuplicateFrameCountRf, U32).counter(),
    rf(Rr::RxSuccessCountRf, U32).counter(),
    rf(Rr::NackCountRf, U32).counter(),
    rf(Rr::UseEnhancedBeaconRf, U8).flag(),
    rf(Rr::EbHeaderIeListRf, Shape::fixed(&[Field::Bytes(1)])),
    rf(Rr::EbPayloadIeListRf, NONE).ro(),
    rf(Rr::EbFilteringEnabledRf, U8).flag(),
    rf(Rr::EbsnRf, U8),
    rf(Rr::EbAutoSaRf, U8).rule(Rule::Range(0, 2)),
    rf(Rr::SecSecurityLevelListRf, Shape::fixed(&[Field::Bytes(4)]))
        .rows(Rows::Table(TableKind::SecurityLevelRf)),
    rf(Rr::PosTableRf, POS_ENTRY_RF).rows(Rows::Table(TableKind::PosRf)),
    rf(Rr::OperatingModeRf, U8).init(Init::U8(1)),
    rf(Rr::ChannelNumberRf, U16),
    rf(Rr::DutyCycleUsageRf, U8).ro(),
    rf(Rr::DutyCyclePeriodRf, U16).init(Init::U16(3600)),
    rf(Rr::DutyCycleLimitRf, U16).init(Init::U16(90)),
    rf(Rr::DutyCycleThresholdRf, U8)
        .rule(Rule::Range(0, 100))
        .init(Init::U8(10)),
    rf(Rr::DisablePhyRf, U8).flag(),
    rf(Rr::ManufSecurityResetRf, U8)
        .flag()
        .effect(Effect::SecurityResetRf),
    rf(Rr::ManufLbpFrameReceivedRf, U8).ro(),
    rf(Rr::ManufLngFrameReceivedRf, U8).ro(),
    rf(Rr::ManufBcnFrameReceivedRf, U8).ro(),
    rf(Rr::ManufRxInvalidFrameLengthCountRf, U32).counter(),
    rf(Rr::ManufRxWrongAddrModeCountRf, U32).counter(),
    rf(Rr::ManufRxUnsupportedSecurityCountRf, U32).counter(),
    rf(Rr::ManufRxWrongKeyIdCountRf, U32).counter(),
    rf(Rr::ManufRxInvalidKeyCountRf, U32).counter(),
    rf(Rr::ManufRxWrongFcCountRf, U32).counter(),
    rf(Rr::ManufRxDecryptionErrorCountRf, U32).counter(),
    rf(Rr::ManufTxDataPacketCountRf, U32).counter(),
    rf(Rr::ManufRxDataPacketCountRf, U32).counter(),
    rf(Rr::ManufTxCmdPacketCountRf, U32).counter(),
    rf(Rr::ManufRxCmdPacketCountRf, U32).counter(),
    rf(Rr::ManufCsmaFailCountRf, U32).counter(),
    rf(Rr::ManufRxDataBroadcastCountRf, U32).counter(),
    rf(Rr::ManufTxDataBroadcastCountRf, U32).counter(),
    rf(Rr::ManufBadCrcCountRf, U32).counter(),
    rf(Rr::ManufRxOtherDestinationCountRf, U32).counter(),
    rf(Rr::ManufEnableMacSnifferRf, U8).flag(),
    rf(Rr::ManufPosTableCountRf, U16).derived(Derive::Count(TableKind::PosRf)),
    rf(Rr::ManufMacInternalVersionRf, VERSION).derived(Derive::Version),
    rf(Rr::ManufResetMacStatsRf, NONE).effect(Effect::ResetMacStatsRf),
    rf(Rr::ManufPosTableElementRf, POS_ENTRY_RF)
        .ro()
        .rows(Rows::Lookup(TableKind::PosRf)),
    rf(Rr::ManufAckTxDelayRf, U32).init(Init::U32(1000)),
    rf(Rr::ManufAckRxWaitTimeRf, U32).init(Init::U32(10_000)),
    rf(Rr::ManufAckConfirmWaitTimeRf, U32).init(Init::U32(20_000)),
    rf(Rr::ManufDataConfirmWaitTimeRf, U32).init(Init::U32(200_000)),
    rf(Rr::ManufPhyParamRf, NONE).rows(Rows::Phy(PhyBus::Rf)),
];

/// Descriptor of a resolved id.
pub fn describe(id: AttributeId) -> Option<&'static AttributeDescriptor> {
    CATALOG.iter().find(|d| d.id == id)
}

/// Descriptor of a raw id received on `registry`.
pub fn lookup(registry: Registry, raw: u32) -> Option<&'static AttributeDescriptor> {
    AttributeId::resolve(registry, raw).and_then(describe)
}

/// Every descriptor, in catalog order.
pub fn iter() -> impl Iterator<Item = &'static AttributeDescriptor> {
    CATALOG.iter()
}

pub(crate) fn len() -> usize {
    CATALOG.len()
}
