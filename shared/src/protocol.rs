//! Framed message types: a fixed-size header carrying the message kind and
//! body length, followed by an opaque serialized body.

use serde::{de::DeserializeOwned, Serialize};
use std::io;

/// Bytes occupied by an encoded [`Header`]: one kind byte plus a
/// little-endian `u32` body length.
pub const HEADER_LEN: usize = 5;

/// Upper bound on a declared body length, checked before the receive buffer
/// is allocated so a corrupted or hostile peer cannot ask for gigabytes.
pub const MAX_BODY_LEN: u32 = 1024 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    /// Client -> server: one serialized [`crate::PlayerAction`].
    PlayerAction,
    /// Server -> client: one serialized [`crate::GameSnapshot`].
    GameState,
}

impl MessageKind {
    pub fn to_byte(self) -> u8 {
        match self {
            MessageKind::PlayerAction => 0,
            MessageKind::GameState => 1,
        }
    }

    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0 => Some(MessageKind::PlayerAction),
            1 => Some(MessageKind::GameState),
            _ => None,
        }
    }
}

/// Fixed-size message header. `body_len` must equal the exact byte length of
/// the body that follows; a mismatch is a framing error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    pub kind: MessageKind,
    pub body_len: u32,
}

impl Header {
    pub fn encode(&self) -> [u8; HEADER_LEN] {
        let mut buf = [0u8; HEADER_LEN];
        buf[0] = self.kind.to_byte();
        buf[1..].copy_from_slice(&self.body_len.to_le_bytes());
        buf
    }

    pub fn decode(buf: &[u8; HEADER_LEN]) -> io::Result<Self> {
        let kind = MessageKind::from_byte(buf[0]).ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::InvalidData,
                format!("unknown message kind byte {:#04x}", buf[0]),
            )
        })?;
        let body_len = u32::from_le_bytes([buf[1], buf[2], buf[3], buf[4]]);
        Ok(Header { kind, body_len })
    }
}

/// One framed message: header plus exactly `header.body_len` body bytes.
/// The framing layer is payload-agnostic; bodies are produced and consumed
/// by the bincode helpers below.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub header: Header,
    pub body: Vec<u8>,
}

impl Message {
    /// Builds a message around raw body bytes, keeping the declared length
    /// consistent with the actual body.
    pub fn new(kind: MessageKind, body: Vec<u8>) -> Self {
        let header = Header {
            kind,
            body_len: body.len() as u32,
        };
        Message { header, body }
    }

    /// Serializes `payload` with bincode and wraps it in a frame.
    pub fn from_payload<T: Serialize>(kind: MessageKind, payload: &T) -> bincode::Result<Self> {
        let body = bincode::serialize(payload)?;
        Ok(Message::new(kind, body))
    }

    /// Deserializes the body back into a payload value.
    pub fn payload<T: DeserializeOwned>(&self) -> bincode::Result<T> {
        bincode::deserialize(&self.body)
    }

    pub fn kind(&self) -> MessageKind {
        self.header.kind
    }
}

/// An inbound message tagged with the id of the connection that produced it.
/// Only the server attributes messages to an origin; clients use
/// [`crate::connection::NO_OWNER`].
#[derive(Debug, Clone)]
pub struct OwnedMessage {
    pub owner_id: u32,
    pub message: Message,
}
