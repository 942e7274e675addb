//! Message codec seam between application messages and session payloads.
//!
//! A session only moves opaque bytes. Whatever turns an application message
//! into those bytes, and back, lives behind [`MessageCodec`].

use bytes::Bytes;

use crate::error::Result;

/// Converts application messages to and from raw session payloads.
pub trait MessageCodec {
    type Message;

    /// Serialize `message`, returning its message id and encoded bytes.
    fn encode(&self, message: &Self::Message) -> Result<(i64, Bytes)>;

    /// Rebuild a message from one reassembled payload and the message id its
    /// fragments carried.
    fn decode(&self, message_id: i64, raw: Bytes) -> Result<Self::Message>;
}

/// Passthrough codec: a message is its id plus the raw bytes.
#[derive(Debug, Clone, Copy, Default)]
pub struct BytesCodec;

impl MessageCodec for BytesCodec {
    type Message = (i64, Bytes);

    fn encode(&self, message: &Self::Message) -> Result<(i64, Bytes)> {
        Ok(message.clone())
    }

    fn decode(&self, message_id: i64, raw: Bytes) -> Result<Self::Message> {
        Ok((message_id, raw))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bytes_codec_is_passthrough() {
        let codec = BytesCodec;
        let message = (42, Bytes::from_static(b"payload"));
        let (id, raw) = codec.encode(&message).unwrap();
        assert_eq!(codec.decode(id, raw).unwrap(), message);
    }
}
