//! # Wire Codec
//!
//! Control messages travel as blocks of exactly [`MESSAGE_SIZE`] bytes: the
//! bincode form of the [`Message`], zero padded. A message whose encoded form
//! does not fit is rejected before it reaches a socket.

use crate::errors::CodecError;
use crate::message::Message;
use crate::MESSAGE_SIZE;
use tracing::warn;

/// Encode `msg` into one fixed-size block.
pub fn encode(msg: &Message) -> Result<Vec<u8>, CodecError> {
    let mut buf = bincode::serialize(msg).map_err(|e| CodecError::Encode(e.to_string()))?;
    if buf.len() > MESSAGE_SIZE {
        warn!(
            message_type = %msg.message_type(),
            size = buf.len(),
            "Encoded message exceeds block size"
        );
        return Err(CodecError::Oversize {
            size: buf.len(),
            max: MESSAGE_SIZE,
        });
    }
    buf.resize(MESSAGE_SIZE, 0);
    Ok(buf)
}

/// Decode one fixed-size block. Padding after the message is ignored.
pub fn decode(block: &[u8]) -> Result<Message, CodecError> {
    if block.len() != MESSAGE_SIZE {
        return Err(CodecError::WrongLength {
            len: block.len(),
            expected: MESSAGE_SIZE,
        });
    }
    bincode::deserialize(block).map_err(|e| CodecError::Decode(e.to_string()))
}
