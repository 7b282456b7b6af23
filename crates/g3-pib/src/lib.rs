// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! G3-PLC information base for a PLC/RF hybrid modem.
//!
//! Holds the adaptation-layer (ADP) and MAC attributes of a G3 node,
//! validates every write against its declared layout and bounds, and
//! serializes attributes for the management plane. Separate codecs frame
//! data-plane messages for the serial host and for the PLC transceiver,
//! and a sniffer tap mirrors that traffic for capture tools.
//!
//! # Architecture
//!
//! ```text
//!  host / serial port                 this crate                    transceiver
//!        |                                |                               |
//!        |-- MAC/ADP get,set (BE) -----> UsiRouter --> MibHandler          |
//!        |                                |              |                |
//!        |                                |        AttributeStore --PhyPort-->|
//!        |                                |         (catalog rules)        |
//!        |<-- get,set confirm (BE) ------|                               |
//!        |                                |                               |
//!        |-- PHY send (BE) ------------> UsiRouter --> DataPlane --------->|
//!        |<-- confirm / rx indication ---|  SerialCodec   WireCodec (LE)  |
//!        |<-- sniffer frames ------------|  SnifferTap <------------------|
//! ```
//!
//! # Registries
//!
//! | Registry | Enum | Message sets |
//! |----------|------|--------------|
//! | ADP | [`AdpAttr`] | ADP get/set (tags 18/17) |
//! | MAC, PLC | [`PlcAttr`] | MAC (52/53), ADP-to-MAC (23/22) |
//! | MAC, RF | [`RfAttr`] | same as PLC, hybrid builds only |
//!
//! Every attribute is described once in the [`catalog`]; the store and the
//! marshaler both derive their behavior from that table.

pub mod band;
pub mod catalog;
pub mod config;
pub mod error;
pub mod handler;
pub mod id;
pub mod mib;
pub mod phy;
pub mod router;
pub mod serial;
pub mod sniffer;
pub mod store;
pub mod value;
pub mod wire;

// Re-exports for convenience.
pub use band::{Band, BandGeometry, BandInfo, MacConstants, MAX_PHY_DATA_LEN, TONE_MASK_LEN};
pub use catalog::{AttributeDescriptor, Rows, Shape, TableKind};
pub use config::{PibConfig, TableSizes};
pub use error::{AttrError, CodecError, ConfigError, MibError, RouterError, Status};
pub use handler::{DataPlane, MibHandler};
pub use id::{AdpAttr, AttributeId, PhyParam, PlcAttr, Registry, RfAttr, RfPhyParam};
pub use mib::{MessageKind, MessageSet, MibMarshaler};
pub use phy::{PhyPort, SimulatedPhy};
pub use router::{CommandHandler, CommandRouter, Frame, Outbox, ProtocolId, UsiRouter};
pub use serial::SerialCodec;
pub use sniffer::{SnifferHandler, SnifferTap};
pub use store::AttributeStore;
pub use value::AttributeValue;
pub use wire::{
    DelimiterType, ModScheme, ModType, RxMessage, TxConfirmation, TxMessage, TxResult, WireCodec,
};

#[cfg(test)]
mod tests;
