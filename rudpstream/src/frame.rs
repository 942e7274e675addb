use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::error::{Result, RudpError};

/// Fixed length of every frame header on the wire.
pub const HEADER_LEN: usize = 45;

/// Message id carried by control-only segments (RESET, ACK-for-reset).
pub const CONTROL_MESSAGE_ID: i64 = -1;

/// Command byte at the start of every frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Command {
    Push = 81,
    Ack = 82,
    /// Window probe request. Parsed but not acted on.
    AskWin = 83,
    /// Window size announcement. Parsed but not acted on.
    TellWin = 84,
    Reset = 85,
}

impl TryFrom<u8> for Command {
    type Error = RudpError;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            81 => Ok(Command::Push),
            82 => Ok(Command::Ack),
            83 => Ok(Command::AskWin),
            84 => Ok(Command::TellWin),
            85 => Ok(Command::Reset),
            other => Err(RudpError::UnknownCommand(other)),
        }
    }
}

/// Decoded frame header.
///
/// Binary layout (all fields big-endian):
///
/// ```text
/// +-----+------------+-----------+--------+-----------+-----------+-----------+-------------+
/// | cmd | message_id | remaining | window | timestamp | seq       | ack_base  | payload_len |
/// | 1B  | 8B (i64)   | 4B (u32)  | 4B     | 8B (i64)  | 8B (i64)  | 8B (i64)  | 4B (u32)    |
/// +-----+------------+-----------+--------+-----------+-----------+-----------+-------------+
/// ```
///
/// `payload_len` bytes of opaque payload follow the header. Several frames
/// may be concatenated in one datagram.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SegmentHeader {
    pub command: Command,
    pub message_id: i64,
    pub remaining_count: u32,
    pub declared_window: u32,
    pub timestamp: i64,
    pub sequence_number: i64,
    pub ack_base: i64,
}

impl SegmentHeader {
    /// Write the header for a payload of `payload_len` bytes.
    pub fn encode_into(&self, payload_len: usize, buf: &mut BytesMut) {
        buf.put_u8(self.command as u8);
        buf.put_i64(self.message_id);
        buf.put_u32(self.remaining_count);
        buf.put_u32(self.declared_window);
        buf.put_i64(self.timestamp);
        buf.put_i64(self.sequence_number);
        buf.put_i64(self.ack_base);
        buf.put_u32(payload_len as u32);
    }
}

/// Encode one frame (header followed by payload) into a fresh buffer.
pub fn encode(header: &SegmentHeader, payload: &[u8]) -> Bytes {
    let mut buf = BytesMut::with_capacity(HEADER_LEN + payload.len());
    header.encode_into(payload.len(), &mut buf);
    buf.put_slice(payload);
    buf.freeze()
}

/// Decode the next frame from the front of `data`, advancing past it.
///
/// The payload is returned as a zero-copy slice of `data`. The declared
/// payload length is validated before the command byte, so a frame that is
/// both truncated and carries a bad command reports `Truncated`.
pub fn decode(data: &mut Bytes) -> Result<(SegmentHeader, Bytes)> {
    if data.len() < HEADER_LEN {
        return Err(RudpError::TooShort {
            expected: HEADER_LEN,
            actual: data.len(),
        });
    }

    let raw_command = data.get_u8();
    let message_id = data.get_i64();
    let remaining_count = data.get_u32();
    let declared_window = data.get_u32();
    let timestamp = data.get_i64();
    let sequence_number = data.get_i64();
    let ack_base = data.get_i64();
    let payload_len = data.get_u32() as usize;

    if data.len() < payload_len {
        return Err(RudpError::Truncated {
            declared: payload_len,
            available: data.len(),
        });
    }
    let command = Command::try_from(raw_command)?;
    let payload = data.split_to(payload_len);

    Ok((
        SegmentHeader {
            command,
            message_id,
            remaining_count,
            declared_window,
            timestamp,
            sequence_number,
            ack_base,
        },
        payload,
    ))
}
