// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Fixed-capacity attribute value.

use std::fmt;

use crate::error::AttrError;

/// Largest value the one-byte Length field can describe.
pub const MAX_VALUE_LEN: usize = 255;

/// Native encoding of one attribute value: packed little-endian fields.
#[derive(Clone, PartialEq, Eq)]
pub struct AttributeValue {
    len: u8,
    bytes: [u8; MAX_VALUE_LEN],
}

impl AttributeValue {
    pub const fn empty() -> Self {
        Self {
            len: 0,
            bytes: [0u8; MAX_VALUE_LEN],
        }
    }

    pub fn from_slice(data: &[u8]) -> Result<Self, AttrError> {
        let len = u8::try_from(data.len()).map_err(|_| AttrError::InvalidParameter)?;
        let mut v = Self::empty();
        v.bytes[..data.len()].copy_from_slice(data);
        v.len = len;
        Ok(v)
    }

    pub fn from_u8(x: u8) -> Self {
        let mut v = Self::empty();
        v.bytes[0] = x;
        v.len = 1;
        v
    }

    pub fn from_u16(x: u16) -> Self {
        let mut v = Self::empty();
        v.bytes[..2].copy_from_slice(&x.to_le_bytes());
        v.len = 2;
        v
    }

    pub fn from_u32(x: u32) -> Self {
        let mut v = Self::empty();
        v.bytes[..4].copy_from_slice(&x.to_le_bytes());
        v.len = 4;
        v
    }

    pub fn len(&self) -> usize {
        self.len as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes[..self.len()]
    }

    /// Unsigned little-endian reading of a 1, 2 or 4 byte value.
    pub fn as_uint(&self) -> Option<u32> {
        let b = self.as_bytes();
        match b.len() {
            1 => Some(u32::from(b[0])),
            2 => Some(u32::from(u16::from_le_bytes([b[0], b[1]]))),
            4 => Some(u32::from_le_bytes([b[0], b[1], b[2], b[3]])),
            _ => None,
        }
    }
}

impl Default for AttributeValue {
    fn default() -> Self {
        Self::empty()
    }
}

impl fmt::Debug for AttributeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AttributeValue[{}](", self.len)?;
        for b in self.as_bytes() {
            write!(f, "{:02x}", b)?;
        }
        write!(f, ")")
    }
}

impl AsRef<[u8]> for AttributeValue {
    fn as_ref(&self) -> &[u8] {
        self.as_bytes()
    }
}
