//! Protocol message frames.
//!
//! Every frame on the wire carries:
//! - 1 byte: message type code
//! - 1 byte: id-present flag
//! - 2 bytes: big-endian frame id (only when the flag is set)
//! - 4 bytes: big-endian payload length
//! - N bytes: payload (the deterministic encoding of the typed message)
//!
//! Responses carry no correlation id of the requester's choosing; request
//! and response are matched by payload contents downstream.

use bytes::{Buf, BufMut, BytesMut};

use crate::error::FrameError;

/// Maximum payload size in bytes (32 MiB).
pub const MAX_FRAME_SIZE: usize = 32 * 1024 * 1024;

/// Fixed part of the frame header: type byte, flag byte, length word.
const HEADER_SIZE: usize = 1 + 1 + 4;

/// Message type codes of the wallet protocol.
///
/// This is a closed enumeration; frames carrying any other code are rejected
/// by the frame codec.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
#[allow(missing_docs)]
pub enum ProtocolMessageType {
    Handshake = 1,
    NewPeakWallet = 39,
    RequestBlockHeader = 40,
    RespondBlockHeader = 41,
    RejectHeaderRequest = 42,
    RequestRemovals = 43,
    RespondRemovals = 44,
    RejectRemovalsRequest = 45,
    RequestAdditions = 46,
    RespondAdditions = 47,
    RejectAdditionsRequest = 48,
    RequestHeaderBlocks = 49,
    RejectHeaderBlocks = 50,
    RespondHeaderBlocks = 51,
    RequestPuzzleSolution = 55,
    RespondPuzzleSolution = 56,
    RejectPuzzleSolution = 57,
    SendTransaction = 58,
    TransactionAck = 59,
    RegisterInterestInPuzzleHash = 66,
    RespondToPhUpdate = 67,
    RegisterInterestInCoin = 68,
    RespondToCoinUpdate = 69,
    RequestChildren = 70,
    RespondChildren = 71,
}

impl ProtocolMessageType {
    /// Decode a type code from its wire value.
    pub fn from_u8(code: u8) -> Option<Self> {
        use ProtocolMessageType::*;
        let t = match code {
            1 => Handshake,
            39 => NewPeakWallet,
            40 => RequestBlockHeader,
            41 => RespondBlockHeader,
            42 => RejectHeaderRequest,
            43 => RequestRemovals,
            44 => RespondRemovals,
            45 => RejectRemovalsRequest,
            46 => RequestAdditions,
            47 => RespondAdditions,
            48 => RejectAdditionsRequest,
            49 => RequestHeaderBlocks,
            50 => RejectHeaderBlocks,
            51 => RespondHeaderBlocks,
            55 => RequestPuzzleSolution,
            56 => RespondPuzzleSolution,
            57 => RejectPuzzleSolution,
            58 => SendTransaction,
            59 => TransactionAck,
            66 => RegisterInterestInPuzzleHash,
            67 => RespondToPhUpdate,
            68 => RegisterInterestInCoin,
            69 => RespondToCoinUpdate,
            70 => RequestChildren,
            71 => RespondChildren,
            _ => return None,
        };
        Some(t)
    }

    /// Get the wire value of this type code.
    pub fn to_u8(self) -> u8 {
        self as u8
    }

    /// Get a human-readable name for the message type.
    pub fn name(&self) -> &'static str {
        use ProtocolMessageType::*;
        match self {
            Handshake => "handshake",
            NewPeakWallet => "new_peak_wallet",
            RequestBlockHeader => "request_block_header",
            RespondBlockHeader => "respond_block_header",
            RejectHeaderRequest => "reject_header_request",
            RequestRemovals => "request_removals",
            RespondRemovals => "respond_removals",
            RejectRemovalsRequest => "reject_removals_request",
            RequestAdditions => "request_additions",
            RespondAdditions => "respond_additions",
            RejectAdditionsRequest => "reject_additions_request",
            RequestHeaderBlocks => "request_header_blocks",
            RejectHeaderBlocks => "reject_header_blocks",
            RespondHeaderBlocks => "respond_header_blocks",
            RequestPuzzleSolution => "request_puzzle_solution",
            RespondPuzzleSolution => "respond_puzzle_solution",
            RejectPuzzleSolution => "reject_puzzle_solution",
            SendTransaction => "send_transaction",
            TransactionAck => "transaction_ack",
            RegisterInterestInPuzzleHash => "register_interest_in_puzzle_hash",
            RespondToPhUpdate => "respond_to_ph_update",
            RegisterInterestInCoin => "register_interest_in_coin",
            RespondToCoinUpdate => "respond_to_coin_update",
            RequestChildren => "request_children",
            RespondChildren => "respond_children",
        }
    }
}

impl std::fmt::Display for ProtocolMessageType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// A framed protocol message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    /// Message type code.
    pub msg_type: ProtocolMessageType,
    /// Optional frame id. The wallet protocol does not use it for
    /// correlation; it is carried for wire compatibility.
    pub id: Option<u16>,
    /// Encoded payload.
    pub data: Vec<u8>,
}

impl Message {
    /// Create a message with no frame id.
    pub fn new(msg_type: ProtocolMessageType, data: Vec<u8>) -> Self {
        Self {
            msg_type,
            id: None,
            data,
        }
    }

    /// Encode the message into wire bytes.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buf = BytesMut::with_capacity(HEADER_SIZE + 2 + self.data.len());

        buf.put_u8(self.msg_type.to_u8());
        match self.id {
            Some(id) => {
                buf.put_u8(1);
                buf.put_u16(id);
            }
            None => buf.put_u8(0),
        }
        buf.put_u32(self.data.len() as u32);
        buf.put_slice(&self.data);

        buf.to_vec()
    }

    /// Decode a message from wire bytes.
    ///
    /// The input must contain exactly one frame; trailing bytes are an error
    /// since the transport delivers whole frames.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, FrameError> {
        let mut buf = bytes;

        if buf.remaining() < 2 {
            return Err(FrameError::Truncated);
        }

        let code = buf.get_u8();
        let msg_type =
            ProtocolMessageType::from_u8(code).ok_or(FrameError::UnknownType(code))?;

        let id = match buf.get_u8() {
            0 => None,
            _ => {
                if buf.remaining() < 2 {
                    return Err(FrameError::Truncated);
                }
                Some(buf.get_u16())
            }
        };

        if buf.remaining() < 4 {
            return Err(FrameError::Truncated);
        }
        let length = buf.get_u32() as usize;
        if length > MAX_FRAME_SIZE {
            return Err(FrameError::TooLarge {
                size: length,
                max: MAX_FRAME_SIZE,
            });
        }
        if buf.remaining() < length {
            return Err(FrameError::Truncated);
        }

        let data = buf[..length].to_vec();
        buf.advance(length);

        if buf.has_remaining() {
            return Err(FrameError::TrailingBytes(buf.remaining()));
        }

        Ok(Self { msg_type, id, data })
    }
}

impl std::fmt::Display for Message {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}({} bytes)", self.msg_type, self.data.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roundtrip_without_id() {
        let original = Message::new(ProtocolMessageType::NewPeakWallet, vec![1, 2, 3]);

        let bytes = original.to_bytes();
        let decoded = Message::from_bytes(&bytes).unwrap();

        assert_eq!(decoded, original);
    }

    #[test]
    fn test_roundtrip_with_id() {
        let original = Message {
            msg_type: ProtocolMessageType::RequestBlockHeader,
            id: Some(7),
            data: vec![9; 40],
        };

        let bytes = original.to_bytes();
        let decoded = Message::from_bytes(&bytes).unwrap();

        assert_eq!(decoded, original);
    }

    #[test]
    fn test_roundtrip_empty_payload() {
        let original = Message::new(ProtocolMessageType::RequestChildren, Vec::new());

        let decoded = Message::from_bytes(&original.to_bytes()).unwrap();
        assert_eq!(decoded, original);
    }

    #[test]
    fn test_truncated_header() {
        let result = Message::from_bytes(&[39]);
        assert_eq!(result, Err(FrameError::Truncated));
    }

    #[test]
    fn test_truncated_payload() {
        let mut bytes = Message::new(ProtocolMessageType::NewPeakWallet, vec![1, 2, 3, 4]).to_bytes();
        bytes.truncate(bytes.len() - 2);

        let result = Message::from_bytes(&bytes);
        assert_eq!(result, Err(FrameError::Truncated));
    }

    #[test]
    fn test_unknown_type() {
        let mut bytes = Message::new(ProtocolMessageType::NewPeakWallet, Vec::new()).to_bytes();
        bytes[0] = 200;

        let result = Message::from_bytes(&bytes);
        assert_eq!(result, Err(FrameError::UnknownType(200)));
    }

    #[test]
    fn test_trailing_bytes() {
        let mut bytes = Message::new(ProtocolMessageType::NewPeakWallet, vec![1]).to_bytes();
        bytes.push(0xFF);

        let result = Message::from_bytes(&bytes);
        assert_eq!(result, Err(FrameError::TrailingBytes(1)));
    }

    #[test]
    fn test_oversized_declared_length() {
        let mut bytes = Message::new(ProtocolMessageType::NewPeakWallet, Vec::new()).to_bytes();
        // Rewrite the length word to exceed the maximum
        let len = (MAX_FRAME_SIZE as u32 + 1).to_be_bytes();
        bytes[2..6].copy_from_slice(&len);

        let result = Message::from_bytes(&bytes);
        assert!(matches!(result, Err(FrameError::TooLarge { .. })));
    }

    #[test]
    fn test_type_code_roundtrip() {
        for code in 0..=u8::MAX {
            if let Some(t) = ProtocolMessageType::from_u8(code) {
                assert_eq!(t.to_u8(), code);
            }
        }
    }

    #[test]
    fn test_type_names() {
        assert_eq!(ProtocolMessageType::NewPeakWallet.name(), "new_peak_wallet");
        assert_eq!(
            ProtocolMessageType::RespondToPhUpdate.name(),
            "respond_to_ph_update"
        );
    }
}
