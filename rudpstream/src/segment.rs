//! The atomic retransmittable unit.

use bytes::{BufMut, Bytes, BytesMut};

use crate::frame::{Command, SegmentHeader, CONTROL_MESSAGE_ID, HEADER_LEN};

/// One fragment of a message, or a control segment, plus the local
/// retransmission bookkeeping for it.
///
/// A segment lives in exactly one session queue at a time. Moving it between
/// queues moves its payload; dropping it releases the payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    pub command: Command,
    pub message_id: i64,
    /// Fragments still to come for this message. `0` marks the last one.
    pub remaining_count: u32,
    pub declared_window: u32,
    pub timestamp: i64,
    /// Assigned once, when the segment is admitted to the in-flight window.
    pub sequence_number: i64,
    pub ack_base: i64,
    pub payload: Bytes,

    // Local-only retransmission state; never on the wire.
    pub transmit_count: u32,
    pub retransmit_timeout: u32,
    pub next_retransmit_at: i64,
    pub fast_ack_hits: u32,
}

impl Segment {
    /// A fresh PUSH fragment that has not been admitted yet.
    pub fn fragment(message_id: i64, remaining_count: u32, payload: Bytes) -> Self {
        Self {
            command: Command::Push,
            message_id,
            remaining_count,
            declared_window: 0,
            timestamp: 0,
            sequence_number: 0,
            ack_base: 0,
            payload,
            transmit_count: 0,
            retransmit_timeout: 0,
            next_retransmit_at: 0,
            fast_ack_hits: 0,
        }
    }

    /// A zero-payload RESET control segment.
    pub fn reset() -> Self {
        Self {
            command: Command::Reset,
            ..Self::fragment(CONTROL_MESSAGE_ID, 0, Bytes::new())
        }
    }

    /// Rebuild a received segment from its decoded header and payload.
    pub fn from_wire(header: &SegmentHeader, payload: Bytes) -> Self {
        Self {
            command: header.command,
            message_id: header.message_id,
            remaining_count: header.remaining_count,
            declared_window: header.declared_window,
            timestamp: header.timestamp,
            sequence_number: header.sequence_number,
            ack_base: header.ack_base,
            ..Self::fragment(header.message_id, header.remaining_count, payload)
        }
    }

    /// Wire header describing this segment as currently stamped.
    pub fn header(&self) -> SegmentHeader {
        SegmentHeader {
            command: self.command,
            message_id: self.message_id,
            remaining_count: self.remaining_count,
            declared_window: self.declared_window,
            timestamp: self.timestamp,
            sequence_number: self.sequence_number,
            ack_base: self.ack_base,
        }
    }

    /// Encode header and payload into one outbound datagram.
    pub fn encode(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(self.encoded_len());
        self.header().encode_into(self.payload.len(), &mut buf);
        buf.put_slice(&self.payload);
        buf.freeze()
    }

    pub fn encoded_len(&self) -> usize {
        HEADER_LEN + self.payload.len()
    }

    /// `true` for the final fragment of a message.
    pub fn is_last_fragment(&self) -> bool {
        self.remaining_count == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame;

    #[test]
    fn reset_segment_is_control_only() {
        let seg = Segment::reset();
        assert_eq!(seg.command, Command::Reset);
        assert_eq!(seg.message_id, CONTROL_MESSAGE_ID);
        assert!(seg.payload.is_empty());
        assert!(seg.is_last_fragment());
    }

    #[test]
    fn encode_then_decode_preserves_fields() {
        let mut seg = Segment::fragment(77, 1, Bytes::from_static(b"part"));
        seg.sequence_number = 12;
        seg.ack_base = 5;
        seg.timestamp = 300;
        seg.declared_window = 20;

        let mut wire = seg.encode();
        assert_eq!(wire.len(), seg.encoded_len());
        let (header, payload) = frame::decode(&mut wire).unwrap();
        let back = Segment::from_wire(&header, payload);

        assert_eq!(back.header(), seg.header());
        assert_eq!(back.payload, seg.payload);
        assert_eq!(back.transmit_count, 0);
    }
}
