// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

// Management-plane wire format: get/set requests and confirms.
//
// Header fields and every multi-byte attribute field are big-endian on
// the wire; values are handed to and from the store in native order.
// Malformed input returns Err, never panics.

use byteorder::{BigEndian, ByteOrder, LittleEndian, ReadBytesExt, WriteBytesExt};

use crate::catalog::{self, Field, Rows, Shape};
use crate::error::{AttrError, MibError, Status};
use crate::id::{AttributeId, Registry};
use crate::value::AttributeValue;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Id (4) + index (2).
pub const GET_REQUEST_LEN: usize = 6;

/// Id (4) + index (2) + length (1).
pub const ATTR_HEADER_LEN: usize = 7;

/// Tag + status + attribute header.
pub const CONFIRM_HEADER_LEN: usize = 2 + ATTR_HEADER_LEN;

/// Set confirm: tag + status + id + index.
pub const SET_CONFIRM_LEN: usize = 2 + GET_REQUEST_LEN;

pub const MSG_ADP_SET_REQUEST: u8 = 17;
pub const MSG_ADP_GET_REQUEST: u8 = 18;
pub const MSG_ADP_MAC_SET_REQUEST: u8 = 22;
pub const MSG_ADP_MAC_GET_REQUEST: u8 = 23;
pub const MSG_ADP_SET_CONFIRM: u8 = 39;
pub const MSG_ADP_GET_CONFIRM: u8 = 40;
pub const MSG_ADP_MAC_SET_CONFIRM: u8 = 45;
pub const MSG_ADP_MAC_GET_CONFIRM: u8 = 46;
pub const MSG_MAC_GET_REQUEST: u8 = 52;
pub const MSG_MAC_SET_REQUEST: u8 = 53;
pub const MSG_MAC_GET_CONFIRM: u8 = 62;
pub const MSG_MAC_SET_CONFIRM: u8 = 63;

// ---------------------------------------------------------------------------
// Message sets
// ---------------------------------------------------------------------------

/// A family of get/set messages sharing one registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageSet {
    /// MAC serial interface.
    Mac,
    /// ADP serial interface, adaptation-layer attributes.
    Adp,
    /// ADP serial interface, MAC attributes.
    AdpMac,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    GetRequest,
    SetRequest,
    GetConfirm,
    SetConfirm,
}

impl MessageSet {
    pub const ALL: [MessageSet; 3] = [MessageSet::Mac, MessageSet::Adp, MessageSet::AdpMac];

    pub fn registry(self) -> Registry {
        match self {
            MessageSet::Adp => Registry::Adp,
            MessageSet::Mac | MessageSet::AdpMac => Registry::Mac,
        }
    }

    pub fn tag(self, kind: MessageKind) -> u8 {
        use MessageKind::*;
        match (self, kind) {
            (MessageSet::Mac, GetRequest) => MSG_MAC_GET_REQUEST,
            (MessageSet::Mac, SetRequest) => MSG_MAC_SET_REQUEST,
            (MessageSet::Mac, GetConfirm) => MSG_MAC_GET_CONFIRM,
            (MessageSet::Mac, SetConfirm) => MSG_MAC_SET_CONFIRM,
            (MessageSet::Adp, GetRequest) => MSG_ADP_GET_REQUEST,
            (MessageSet::Adp, SetRequest) => MSG_ADP_SET_REQUEST,
            (MessageSet::Adp, GetConfirm) => MSG_ADP_GET_CONFIRM,
            (MessageSet::Adp, SetConfirm) => MSG_ADP_SET_CONFIRM,
            (MessageSet::AdpMac, GetRequest) => MSG_ADP_MAC_GET_REQUEST,
            (MessageSet::AdpMac, SetRequest) => MSG_ADP_MAC_SET_REQUEST,
            (MessageSet::AdpMac, GetConfirm) => MSG_ADP_MAC_GET_CONFIRM,
            (MessageSet::AdpMac, SetConfirm) => MSG_ADP_MAC_SET_CONFIRM,
        }
    }

    /// Message set and kind of a tag byte.
    pub fn classify(tag: u8) -> Option<(MessageSet, MessageKind)> {
        use MessageKind::*;
        for set in Self::ALL {
            for kind in [GetRequest, SetRequest, GetConfirm, SetConfirm] {
                if set.tag(kind) == tag {
                    return Some((set, kind));
                }
            }
        }
        None
    }
}

// ---------------------------------------------------------------------------
// Decoded messages
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GetRequest {
    pub raw_id: u32,
    pub index: u16,
}

/// Set request with its value already converted to native order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetRequest {
    pub id: AttributeId,
    pub index: u16,
    pub value: AttributeValue,
}

/// Get confirm with its value converted to native order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GetConfirm {
    pub status: Status,
    pub raw_id: u32,
    pub index: u16,
    pub value: AttributeValue,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SetConfirm {
    pub status: Status,
    pub raw_id: u32,
    pub index: u16,
}

struct AttrHeader {
    raw_id: u32,
    index: u16,
    len: usize,
}

impl AttrHeader {
    fn parse(buf: &[u8]) -> Result<Self, MibError> {
        if buf.len() < ATTR_HEADER_LEN {
            return Err(MibError::Truncated { got: buf.len() });
        }
        Ok(Self {
            raw_id: BigEndian::read_u32(&buf[0..4]),
            index: BigEndian::read_u16(&buf[4..6]),
            len: usize::from(buf[6]),
        })
    }
}

// ---------------------------------------------------------------------------
// Marshaler
// ---------------------------------------------------------------------------

/// Encoder/decoder for one message set.
///
/// All encoders append to a caller-supplied buffer; nothing is kept
/// between calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MibMarshaler {
    set: MessageSet,
}

impl MibMarshaler {
    pub fn new(set: MessageSet) -> Self {
        Self { set }
    }

    pub fn message_set(&self) -> MessageSet {
        self.set
    }

    pub fn registry(&self) -> Registry {
        self.set.registry()
    }

    // -- requests -----------------------------------------------------------

    pub fn encode_get_request(&self, raw_id: u32, index: u16, out: &mut Vec<u8>) {
        out.push(self.set.tag(MessageKind::GetRequest));
        out.extend_from_slice(&raw_id.to_be_bytes());
        out.extend_from_slice(&index.to_be_bytes());
    }

    /// Decodes the body of a get request (tag stripped).
    pub fn decode_get_request(&self, body: &[u8]) -> Result<GetRequest, MibError> {
        if body.len() < GET_REQUEST_LEN {
            return Err(MibError::Truncated { got: body.len() });
        }
        Ok(GetRequest {
            raw_id: BigEndian::read_u32(&body[0..4]),
            index: BigEndian::read_u16(&body[4..6]),
        })
    }

    /// Encodes a set request from a native value.
    pub fn encode_set_request(
        &self,
        id: AttributeId,
        index: u16,
        value: &[u8],
        out: &mut Vec<u8>,
    ) -> Result<(), MibError> {
        let mut payload = Vec::with_capacity(value.len());
        if !value.is_empty() {
            let shape = self.shape_of(id, index)?;
            native_to_wire(&shape, value, &mut payload)
                .map_err(|e| MibError::rejected_id(id, index, e))?;
        }
        let len = u8::try_from(payload.len())
            .map_err(|_| MibError::rejected_id(id, index, AttrError::InvalidParameter))?;
        out.push(self.set.tag(MessageKind::SetRequest));
        out.extend_from_slice(&id.raw().to_be_bytes());
        out.extend_from_slice(&index.to_be_bytes());
        out.push(len);
        out.extend_from_slice(&payload);
        Ok(())
    }

    /// Decodes the body of a set request (tag stripped) into a native value.
    ///
    /// The payload must be exactly as long as the Length field and must
    /// fit the attribute layout, otherwise the request is rejected with
    /// `InvalidParameter` before it reaches the store.
    pub fn decode_set_request(&self, body: &[u8]) -> Result<SetRequest, MibError> {
        let hdr = AttrHeader::parse(body)?;
        let reject = |e| MibError::rejected(self.registry(), hdr.raw_id, hdr.index, e);

        let id = AttributeId::resolve(self.registry(), hdr.raw_id)
            .ok_or_else(|| reject(AttrError::UnsupportedAttribute))?;
        let payload = &body[ATTR_HEADER_LEN..];
        if payload.len() != hdr.len {
            return Err(reject(AttrError::InvalidParameter));
        }

        let d = catalog::describe(id).ok_or_else(|| reject(AttrError::UnsupportedAttribute))?;
        let clears_row = matches!(d.rows, Rows::Table(kind) if kind.clearable());
        if payload.is_empty() && clears_row {
            return Ok(SetRequest {
                id,
                index: hdr.index,
                value: AttributeValue::empty(),
            });
        }

        let shape = d.shape_at(hdr.index).map_err(reject)?;
        let mut native = Vec::with_capacity(payload.len());
        wire_to_native(&shape, payload, &mut native).map_err(reject)?;
        Ok(SetRequest {
            id,
            index: hdr.index,
            value: AttributeValue::from_slice(&native).map_err(reject)?,
        })
    }

    // -- confirms -----------------------------------------------------------

    /// Encodes a get confirm. Failures carry Length 0 and no payload.
    pub fn encode_get_confirm(
        &self,
        raw_id: u32,
        index: u16,
        status: Status,
        value: &[u8],
        out: &mut Vec<u8>,
    ) {
        let mut status = status;
        let mut payload = Vec::with_capacity(value.len());
        if status.is_success() && !value.is_empty() {
            let converted = catalog::lookup(self.registry(), raw_id)
                .ok_or(AttrError::UnsupportedAttribute)
                .and_then(|d| d.shape_at(index))
                .and_then(|shape| native_to_wire(&shape, value, &mut payload));
            if let Err(e) = converted {
                log::warn!(
                    "get confirm 0x{:08x}[{}]: value does not fit layout ({})",
                    raw_id,
                    index,
                    e
                );
                payload.clear();
                status = e.status();
            }
        }
        let payload: &[u8] = if status.is_success() { &payload[..] } else { &[] };

        out.push(self.set.tag(MessageKind::GetConfirm));
        out.push(status.as_u8());
        out.extend_from_slice(&raw_id.to_be_bytes());
        out.extend_from_slice(&index.to_be_bytes());
        out.push(payload.len().min(u8::MAX as usize) as u8);
        out.extend_from_slice(payload);
    }

    /// Decodes the body of a get confirm (tag stripped).
    pub fn decode_get_confirm(&self, body: &[u8]) -> Result<GetConfirm, MibError> {
        let (status_byte, rest) = match body.split_first() {
            Some((s, rest)) => (*s, rest),
            None => return Err(MibError::Truncated { got: 0 }),
        };
        let hdr = AttrHeader::parse(rest)?;
        let reject = |e| MibError::rejected(self.registry(), hdr.raw_id, hdr.index, e);
        let status = Status::from_u8(status_byte).ok_or_else(|| reject(AttrError::InvalidParameter))?;
        let payload = &rest[ATTR_HEADER_LEN..];
        if payload.len() != hdr.len {
            return Err(reject(AttrError::InvalidParameter));
        }

        let mut native = Vec::with_capacity(payload.len());
        if !payload.is_empty() {
            let d = catalog::lookup(self.registry(), hdr.raw_id)
                .ok_or_else(|| reject(AttrError::UnsupportedAttribute))?;
            let shape = d.shape_at(hdr.index).map_err(reject)?;
            wire_to_native(&shape, payload, &mut native).map_err(reject)?;
        }
        Ok(GetConfirm {
            status,
            raw_id: hdr.raw_id,
            index: hdr.index,
            value: AttributeValue::from_slice(&native).map_err(reject)?,
        })
    }

    pub fn encode_set_confirm(&self, raw_id: u32, index: u16, status: Status, out: &mut Vec<u8>) {
        out.push(self.set.tag(MessageKind::SetConfirm));
        out.push(status.as_u8());
        out.extend_from_slice(&raw_id.to_be_bytes());
        out.extend_from_slice(&index.to_be_bytes());
    }

    /// Decodes the body of a set confirm (tag stripped).
    pub fn decode_set_confirm(&self, body: &[u8]) -> Result<SetConfirm, MibError> {
        if body.len() < SET_CONFIRM_LEN - 1 {
            return Err(MibError::Truncated { got: body.len() });
        }
        let raw_id = BigEndian::read_u32(&body[1..5]);
        let index = BigEndian::read_u16(&body[5..7]);
        let status = Status::from_u8(body[0]).ok_or(MibError::rejected(
            self.registry(),
            raw_id,
            index,
            AttrError::InvalidParameter,
        ))?;
        Ok(SetConfirm {
            status,
            raw_id,
            index,
        })
    }

    fn shape_of(&self, id: AttributeId, index: u16) -> Result<Shape, MibError> {
        catalog::describe(id)
            .ok_or(AttrError::UnsupportedAttribute)
            .and_then(|d| d.shape_at(index))
            .map_err(|e| MibError::rejected_id(id, index, e))
    }
}

// ---------------------------------------------------------------------------
// Field conversion
// ---------------------------------------------------------------------------

/// Native (little-endian) value to wire (big-endian) payload.
pub fn native_to_wire(shape: &Shape, value: &[u8], out: &mut Vec<u8>) -> Result<(), AttrError> {
    transcode::<LittleEndian, BigEndian>(shape, value, out)
}

/// Wire (big-endian) payload to native (little-endian) value.
pub fn wire_to_native(shape: &Shape, payload: &[u8], out: &mut Vec<u8>) -> Result<(), AttrError> {
    transcode::<BigEndian, LittleEndian>(shape, payload, out)
}

/// Re-encodes each numeric field from `R` to `W` order; opaque fields and
/// the tail are copied as-is. Consumes exactly the whole input.
fn transcode<R: ByteOrder, W: ByteOrder>(
    shape: &Shape,
    src: &[u8],
    out: &mut Vec<u8>,
) -> Result<(), AttrError> {
    shape.check(src)?;
    let bad = |_| AttrError::InvalidParameter;
    let mut rd = src;
    for field in shape.fields {
        match *field {
            Field::U8 => out.write_u8(rd.read_u8().map_err(bad)?).map_err(bad)?,
            Field::U16 => out
                .write_u16::<W>(rd.read_u16::<R>().map_err(bad)?)
                .map_err(bad)?,
            Field::U32 => out
                .write_u32::<W>(rd.read_u32::<R>().map_err(bad)?)
                .map_err(bad)?,
            Field::Bytes(n) => {
                let head = rd.get(..n).ok_or(AttrError::InvalidParameter)?;
                out.extend_from_slice(head);
                rd = &rd[n..];
            }
        }
    }
    out.extend_from_slice(rd);
    Ok(())
}
