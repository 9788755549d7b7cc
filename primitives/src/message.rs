/// Wire codec for the synchronization group's messages.
///
/// Both message kinds share a fixed header and ring id block; the request
/// kind appends a NUL-terminated service name. Layout (network byte order,
/// trailing variable field zero-padded to an 8-byte boundary):
///
/// ```text
/// offset  0   size      u32   total encoded length in bytes
/// offset  4   kind      u32   0 = barrier start, 1 = sync request
/// offset  8   rep       u32   ring id representative node
/// offset 12   reserved  u32   zero
/// offset 16   seq       u64   ring id sequence number
/// offset 24   name_len  u32   request only: name length incl. NUL
/// offset 28   reserved  u32   zero
/// offset 32   name      name_len bytes, NUL-terminated
/// ```
///
/// The `rep`, `seq`, and `name_len` fields are byte-swapped on decode when
/// the transport flags a foreign-byte-order sender; `size` and `kind` are
/// converted by the transport layer itself and always arrive network order.
use thiserror::Error;

use crate::ring::RingId;
use crate::types::NodeId;

pub const MESSAGE_KIND_BARRIER: u32 = 0;
pub const MESSAGE_KIND_REQUEST: u32 = 1;

const RING_BLOCK_END: usize = 24;
const NAME_OFFSET: usize = 32;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CodecError {
    #[error("message truncated: need {need} bytes, have {have}")]
    Truncated { need: usize, have: usize },
    #[error("declared size {declared} does not match buffer length {actual}")]
    SizeMismatch { declared: u32, actual: usize },
    #[error("unknown message kind {0}")]
    UnknownKind(u32),
    #[error("name length {0} overruns the message")]
    NameOutOfBounds(u32),
    #[error("service name is not valid utf-8")]
    InvalidName,
}

/// A message exchanged over the "sync" process group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncMessage {
    /// Announces this node's arrival at the barrier for the given round.
    BarrierStart { ring_id: RingId },
    /// Asks every node to resynchronize the named service.
    Request { ring_id: RingId, name: String },
}

impl SyncMessage {
    pub fn kind(&self) -> u32 {
        match self {
            SyncMessage::BarrierStart { .. } => MESSAGE_KIND_BARRIER,
            SyncMessage::Request { .. } => MESSAGE_KIND_REQUEST,
        }
    }

    pub fn ring_id(&self) -> RingId {
        match self {
            SyncMessage::BarrierStart { ring_id } => *ring_id,
            SyncMessage::Request { ring_id, .. } => *ring_id,
        }
    }

    pub fn encode(&self) -> Vec<u8> {
        let total = match self {
            SyncMessage::BarrierStart { .. } => RING_BLOCK_END,
            SyncMessage::Request { name, .. } => {
                NAME_OFFSET + pad_to_eight(name.len() + 1)
            }
        };

        let ring_id = self.ring_id();
        let mut bytes = Vec::with_capacity(total);
        bytes.extend_from_slice(&(total as u32).to_be_bytes());
        bytes.extend_from_slice(&self.kind().to_be_bytes());
        bytes.extend_from_slice(&ring_id.rep.0.to_be_bytes());
        bytes.extend_from_slice(&[0u8; 4]);
        bytes.extend_from_slice(&ring_id.seq.to_be_bytes());

        if let SyncMessage::Request { name, .. } = self {
            let name_len = name.len() as u32 + 1;
            bytes.extend_from_slice(&name_len.to_be_bytes());
            bytes.extend_from_slice(&[0u8; 4]);
            bytes.extend_from_slice(name.as_bytes());
            bytes.push(0);
            bytes.resize(total, 0);
        }

        bytes
    }

    pub fn decode(bytes: &[u8], foreign_endian: bool) -> Result<Self, CodecError> {
        if bytes.len() < RING_BLOCK_END {
            return Err(CodecError::Truncated {
                need: RING_BLOCK_END,
                have: bytes.len(),
            });
        }

        let declared = read_u32(bytes, 0, false);
        if declared as usize != bytes.len() {
            return Err(CodecError::SizeMismatch {
                declared,
                actual: bytes.len(),
            });
        }

        let kind = read_u32(bytes, 4, false);
        let ring_id = RingId {
            rep: NodeId(read_u32(bytes, 8, foreign_endian)),
            seq: read_u64(bytes, 16, foreign_endian),
        };

        match kind {
            MESSAGE_KIND_BARRIER => Ok(SyncMessage::BarrierStart { ring_id }),
            MESSAGE_KIND_REQUEST => {
                if bytes.len() < NAME_OFFSET {
                    return Err(CodecError::Truncated {
                        need: NAME_OFFSET,
                        have: bytes.len(),
                    });
                }
                let name_len = read_u32(bytes, 24, foreign_endian);
                let end = NAME_OFFSET
                    .checked_add(name_len as usize)
                    .ok_or(CodecError::NameOutOfBounds(name_len))?;
                if end > bytes.len() {
                    return Err(CodecError::NameOutOfBounds(name_len));
                }
                let raw = &bytes[NAME_OFFSET..end];
                // The sender appends a NUL; anything after the first NUL
                // is alignment padding.
                let terminated = match raw.iter().position(|byte| *byte == 0) {
                    Some(nul) => &raw[..nul],
                    None => raw,
                };
                let name = std::str::from_utf8(terminated)
                    .map_err(|_| CodecError::InvalidName)?
                    .to_owned();
                Ok(SyncMessage::Request { ring_id, name })
            }
            other => Err(CodecError::UnknownKind(other)),
        }
    }
}

fn pad_to_eight(len: usize) -> usize {
    len.div_ceil(8) * 8
}

fn read_u32(bytes: &[u8], offset: usize, foreign_endian: bool) -> u32 {
    let mut buf = [0u8; 4];
    buf.copy_from_slice(&bytes[offset..offset + 4]);
    if foreign_endian {
        u32::from_le_bytes(buf)
    } else {
        u32::from_be_bytes(buf)
    }
}

fn read_u64(bytes: &[u8], offset: usize, foreign_endian: bool) -> u64 {
    let mut buf = [0u8; 8];
    buf.copy_from_slice(&bytes[offset..offset + 8]);
    if foreign_endian {
        u64::from_le_bytes(buf)
    } else {
        u64::from_be_bytes(buf)
    }
}
