// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

// Command routing between serial ports and protocol handlers.
//
// Frames are tagged with a protocol identifier. A router owns the
// registered handlers and dispatches each inbound frame to the handler of
// its protocol; handlers answer through an `Outbox` and never hold a
// reference to the router.

use std::collections::{BTreeMap, VecDeque};
use std::sync::{Arc, Mutex};

use crate::error::RouterError;

// ---------------------------------------------------------------------------
// Protocol identifiers
// ---------------------------------------------------------------------------

/// Most protocols a router can serve at once.
pub const MAX_PROTOCOLS: usize = 12;

/// Largest payload carried in one frame.
pub const MAX_FRAME_LEN: usize = 2048;

/// Serialized protocol carried by a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum ProtocolId {
    PhyAtpl2x0 = 0x22,
    SnifG3 = 0x23,
    MacG3 = 0x24,
    AdpG3 = 0x25,
    CoordG3 = 0x26,
    PhyRf215 = 0x28,
    Internal = 0x3F,
    UserDefined = 0xFE,
}

impl ProtocolId {
    pub fn from_u8(v: u8) -> Option<Self> {
        match v {
            0x22 => Some(Self::PhyAtpl2x0),
            0x23 => Some(Self::SnifG3),
            0x24 => Some(Self::MacG3),
            0x25 => Some(Self::AdpG3),
            0x26 => Some(Self::CoordG3),
            0x28 => Some(Self::PhyRf215),
            0x3F => Some(Self::Internal),
            0xFE => Some(Self::UserDefined),
            _ => None,
        }
    }

    pub fn as_u8(self) -> u8 {
        self as u8
    }
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// A frame queued for a serial port.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub port: u8,
    pub protocol: u8,
    pub payload: Vec<u8>,
}

/// Replies collected while a handler runs.
#[derive(Debug, Default)]
pub struct Outbox {
    frames: Vec<(ProtocolId, Vec<u8>)>,
}

impl Outbox {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn send(&mut self, protocol: ProtocolId, payload: Vec<u8>) {
        self.frames.push((protocol, payload));
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn drain(&mut self) -> impl Iterator<Item = (ProtocolId, Vec<u8>)> + '_ {
        self.frames.drain(..)
    }
}

/// Receiver for the frames of one protocol.
pub trait CommandHandler: Send {
    /// Handle one frame. Returns false when the command is not recognized.
    fn handle(&mut self, payload: &[u8], outbox: &mut Outbox) -> bool;
}

/// Shared handlers stay reachable by the caller after registration.
impl<T: CommandHandler> CommandHandler for Arc<Mutex<T>> {
    fn handle(&mut self, payload: &[u8], outbox: &mut Outbox) -> bool {
        let mut guard = match self.lock() {
            Ok(g) => g,
            Err(poisoned) => poisoned.into_inner(),
        };
        guard.handle(payload, outbox)
    }
}

/// Framing service between ports and handlers.
pub trait CommandRouter {
    /// Bind `protocol` on `port` to `handler`.
    fn register(
        &mut self,
        protocol: ProtocolId,
        port: u8,
        handler: Box<dyn CommandHandler>,
    ) -> Result<(), RouterError>;

    /// Dispatch every pending inbound frame. Returns the number handled.
    fn process(&mut self) -> usize;

    /// Queue `payload` for the port bound to `protocol`.
    fn send(&mut self, protocol: ProtocolId, payload: &[u8]) -> Result<(), RouterError>;
}

// ---------------------------------------------------------------------------
// In-memory router
// ---------------------------------------------------------------------------

struct Route {
    port: u8,
    handler: Box<dyn CommandHandler>,
}

/// Router over in-memory port queues.
///
/// Inbound frames are queued per port with [`deliver`](Self::deliver) and
/// dispatched by [`process`](CommandRouter::process). Replies and frames
/// queued with `send` are collected by [`take_outbound`](Self::take_outbound).
#[derive(Default)]
pub struct UsiRouter {
    routes: BTreeMap<ProtocolId, Route>,
    inbound: BTreeMap<u8, VecDeque<(u8, Vec<u8>)>>,
    outbound: VecDeque<Frame>,
    dropped: u64,
}

impl UsiRouter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a frame as if it arrived on `port`.
    pub fn deliver(&mut self, port: u8, protocol: u8, payload: &[u8]) -> Result<(), RouterError> {
        if payload.len() > MAX_FRAME_LEN {
            return Err(RouterError::PayloadTooLarge(payload.len()));
        }
        self.inbound
            .entry(port)
            .or_default()
            .push_back((protocol, payload.to_vec()));
        Ok(())
    }

    /// Remove and return every frame waiting to go out.
    pub fn take_outbound(&mut self) -> Vec<Frame> {
        self.outbound.drain(..).collect()
    }

    /// Inbound frames dropped since creation (unregistered protocol or
    /// wrong port).
    pub fn dropped(&self) -> u64 {
        self.dropped
    }

    pub fn is_registered(&self, protocol: ProtocolId) -> bool {
        self.routes.contains_key(&protocol)
    }

    fn dispatch(&mut self, port: u8, protocol: u8, payload: &[u8]) -> bool {
        let id = match ProtocolId::from_u8(protocol) {
            Some(id) => id,
            None => {
                log::warn!("port {}: unknown protocol 0x{:02x}, frame dropped", port, protocol);
                return false;
            }
        };
        let route = match self.routes.get_mut(&id) {
            Some(r) if r.port == port => r,
            Some(r) => {
                log::warn!(
                    "{:?} is bound to port {}, frame from port {} dropped",
                    id,
                    r.port,
                    port
                );
                return false;
            }
            None => {
                log::warn!("{:?} not registered, frame dropped", id);
                return false;
            }
        };

        let mut outbox = Outbox::new();
        let recognized = route.handler.handle(payload, &mut outbox);
        if !recognized {
            log::debug!("{:?}: command not recognized ({} bytes)", id, payload.len());
        }
        for (reply_proto, reply) in outbox.drain() {
            let reply_port = self.routes.get(&reply_proto).map_or(port, |r| r.port);
            self.outbound.push_back(Frame {
                port: reply_port,
                protocol: reply_proto.as_u8(),
                payload: reply,
            });
        }
        true
    }
}

impl CommandRouter for UsiRouter {
    fn register(
        &mut self,
        protocol: ProtocolId,
        port: u8,
        handler: Box<dyn CommandHandler>,
    ) -> Result<(), RouterError> {
        if self.routes.contains_key(&protocol) {
            return Err(RouterError::AlreadyRegistered(protocol.as_u8()));
        }
        if self.routes.len() >= MAX_PROTOCOLS {
            return Err(RouterError::TooManyProtocols);
        }
        log::debug!("{:?} registered on port {}", protocol, port);
        self.routes.insert(protocol, Route { port, handler });
        Ok(())
    }

    fn process(&mut self) -> usize {
        let mut handled = 0;
        let ports: Vec<u8> = self.inbound.keys().copied().collect();
        for port in ports {
            while let Some((protocol, payload)) =
                self.inbound.get_mut(&port).and_then(VecDeque::pop_front)
            {
                if self.dispatch(port, protocol, &payload) {
                    handled += 1;
                } else {
                    self.dropped += 1;
                }
            }
        }
        handled
    }

    fn send(&mut self, protocol: ProtocolId, payload: &[u8]) -> Result<(), RouterError> {
        let port = self
            .routes
            .get(&protocol)
            .map(|r| r.port)
            .ok_or(RouterError::ProtocolNotRegistered(protocol.as_u8()))?;
        if payload.len() > MAX_FRAME_LEN {
            return Err(RouterError::PayloadTooLarge(payload.len()));
        }
        self.outbound.push_back(Frame {
            port,
            protocol: protocol.as_u8(),
            payload: payload.to_vec(),
        });
        Ok(())
    }
}

impl std::fmt::Debug for UsiRouter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UsiRouter")
            .field("protocols", &self.routes.keys().collect::<Vec<_>>())
            .field("outbound", &self.outbound.len())
            .field("dropped", &self.dropped)
            .finish()
    }
}
