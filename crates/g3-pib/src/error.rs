// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Status codes and error types shared by the registry, the marshaler,
//! the data-plane codec and the router.
//!
//! Every failure on the management plane is reported inline as a
//! [`Status`] byte in the corresponding confirmation. Nothing here aborts.

use thiserror::Error;

use crate::id::{AttributeId, Registry};

// ---------------------------------------------------------------------------
// Status byte
// ---------------------------------------------------------------------------

pub const STATUS_SUCCESS: u8 = 0x00;
pub const STATUS_CHANNEL_ACCESS_FAILURE: u8 = 0xE1;
pub const STATUS_DENIED: u8 = 0xE2;
pub const STATUS_INVALID_PARAMETER: u8 = 0xE8;
pub const STATUS_NO_ACK: u8 = 0xE9;
pub const STATUS_TRANSACTION_OVERFLOW: u8 = 0xF1;
pub const STATUS_UNSUPPORTED_ATTRIBUTE: u8 = 0xF4;
pub const STATUS_INVALID_INDEX: u8 = 0xF9;
pub const STATUS_READ_ONLY: u8 = 0xFB;

/// Status byte carried in get/set confirmations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Status {
    Success = STATUS_SUCCESS,
    ChannelAccessFailure = STATUS_CHANNEL_ACCESS_FAILURE,
    Denied = STATUS_DENIED,
    InvalidParameter = STATUS_INVALID_PARAMETER,
    NoAck = STATUS_NO_ACK,
    TransactionOverflow = STATUS_TRANSACTION_OVERFLOW,
    UnsupportedAttribute = STATUS_UNSUPPORTED_ATTRIBUTE,
    InvalidIndex = STATUS_INVALID_INDEX,
    ReadOnly = STATUS_READ_ONLY,
}

impl Status {
    pub fn from_u8(v: u8) -> Option<Self> {
        match v {
            STATUS_SUCCESS => Some(Self::Success),
            STATUS_CHANNEL_ACCESS_FAILURE => Some(Self::ChannelAccessFailure),
            STATUS_DENIED => Some(Self::Denied),
            STATUS_INVALID_PARAMETER => Some(Self::InvalidParameter),
            STATUS_NO_ACK => Some(Self::NoAck),
            STATUS_TRANSACTION_OVERFLOW => Some(Self::TransactionOverflow),
            STATUS_UNSUPPORTED_ATTRIBUTE => Some(Self::UnsupportedAttribute),
            STATUS_INVALID_INDEX => Some(Self::InvalidIndex),
            STATUS_READ_ONLY => Some(Self::ReadOnly),
            _ => None,
        }
    }

    pub fn as_u8(self) -> u8 {
        self as u8
    }

    pub fn is_success(self) -> bool {
        self == Self::Success
    }
}

impl From<Result<(), AttrError>> for Status {
    fn from(r: Result<(), AttrError>) -> Self {
        match r {
            Ok(()) => Status::Success,
            Err(e) => e.status(),
        }
    }
}

// ---------------------------------------------------------------------------
// Attribute errors
// ---------------------------------------------------------------------------

/// Why a get or set on the information base was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AttrError {
    /// Unknown identifier in the queried registry.
    #[error("unsupported attribute")]
    UnsupportedAttribute,

    /// Non-zero index on a scalar, or a row outside the table bounds.
    #[error("invalid index")]
    InvalidIndex,

    /// Length mismatch, out-of-range value or failed cross-attribute rule.
    #[error("invalid parameter")]
    InvalidParameter,

    /// Write attempted on a read-only attribute.
    #[error("read-only attribute")]
    ReadOnly,
}

impl AttrError {
    /// Status byte reported in the confirmation.
    pub fn status(self) -> Status {
        match self {
            Self::UnsupportedAttribute => Status::UnsupportedAttribute,
            Self::InvalidIndex => Status::InvalidIndex,
            Self::InvalidParameter => Status::InvalidParameter,
            Self::ReadOnly => Status::ReadOnly,
        }
    }
}

// ---------------------------------------------------------------------------
// Marshaler errors
// ---------------------------------------------------------------------------

/// Failure while decoding a management-plane request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum MibError {
    /// The header itself is incomplete. No confirmation can be built.
    #[error("truncated request ({got} bytes)")]
    Truncated { got: usize },

    /// The header parsed, the request is refused with a status.
    #[error("request for 0x{raw_id:08x}[{index}] in {registry:?} rejected: {error}")]
    Rejected {
        registry: Registry,
        raw_id: u32,
        index: u16,
        error: AttrError,
    },
}

impl MibError {
    pub(crate) fn rejected(registry: Registry, raw_id: u32, index: u16, error: AttrError) -> Self {
        Self::Rejected {
            registry,
            raw_id,
            index,
            error,
        }
    }

    pub(crate) fn rejected_id(id: AttributeId, index: u16, error: AttrError) -> Self {
        Self::rejected(id.registry(), id.raw(), index, error)
    }
}

// ---------------------------------------------------------------------------
// Data-plane codec errors
// ---------------------------------------------------------------------------

/// Data-plane frame rejected by the codec.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CodecError {
    /// Zero or over-maximum payload length.
    #[error("payload length {len} rejected")]
    CodecReject { len: usize },

    /// Fixed-size frame with the wrong total length.
    #[error("frame length mismatch: expected {expected}, got {got}")]
    LengthMismatch { expected: usize, got: usize },

    /// Not enough bytes for the band-dependent layout.
    #[error("buffer too short")]
    BufferTooShort,

    /// Enumerated field with a value outside its range.
    #[error("invalid {field}: {value}")]
    InvalidField { field: &'static str, value: u8 },
}

// ---------------------------------------------------------------------------
// Router errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RouterError {
    #[error("protocol 0x{0:02x} not registered")]
    ProtocolNotRegistered(u8),

    #[error("protocol table full")]
    TooManyProtocols,

    #[error("protocol 0x{0:02x} already registered")]
    AlreadyRegistered(u8),

    /// A confirmation is still pending on this logical channel.
    #[error("channel busy: confirmation pending")]
    ChannelBusy,

    #[error("payload of {0} bytes exceeds the frame limit")]
    PayloadTooLarge(usize),
}

// ---------------------------------------------------------------------------
// Configuration errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("invalid configuration: {0}")]
    Invalid(String),
}
