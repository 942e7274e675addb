//! Receive reassembly: pending set -> ordered queue -> whole messages.

use bytes::{Bytes, BytesMut};

use crate::codec::MessageCodec;
use crate::error::Result;
use crate::output::Output;
use crate::segment::Segment;
use crate::seq;

use super::Session;

impl<O: Output> Session<O> {
    /// Buffer a received segment unless it is out of window or a duplicate.
    pub(super) fn parse_recv_data(&mut self, seg: Segment) {
        let sn = seg.sequence_number;
        let window_end = self.recv_next.wrapping_add(self.config.recv_window as i64);
        if seq::at_or_after(sn, window_end) || seq::before(sn, self.recv_next) {
            self.stats.out_of_window_dropped += 1;
            tracing::trace!(seq = sn, recv_next = self.recv_next, "segment outside receive window");
            return;
        }
        if self.recv_pending.contains_key(&sn) {
            self.stats.duplicates_dropped += 1;
            tracing::trace!(seq = sn, "duplicate segment dropped");
            return;
        }
        self.recv_pending.insert(sn, seg);
    }

    /// Drop stale pending segments and promote the contiguous run starting
    /// at `recv_next` into the ordered queue.
    ///
    /// The pending-size bound never binds: `parse_recv_data` admits only
    /// distinct sequences inside the receive window, so the set holds at most
    /// `recv_window` segments. A set holding exactly a full window always
    /// contains `recv_next` and must be allowed to drain.
    pub(super) fn arrange_recv_data(&mut self) {
        let recv_next = self.recv_next;
        self.recv_pending
            .retain(|&sn, _| !seq::before(sn, recv_next));

        while self.recv_pending.len() <= self.config.recv_window as usize {
            let Some(seg) = self.recv_pending.remove(&self.recv_next) else {
                break;
            };
            self.recv_ordered.push_back(seg);
            self.recv_next = self.recv_next.wrapping_add(1);
        }
    }

    /// Byte length of the next whole message, if all its fragments are in
    /// the ordered queue.
    pub fn peek_size(&self) -> Option<usize> {
        let head = self.recv_ordered.front()?;
        if head.is_last_fragment() {
            return Some(head.payload.len());
        }
        if self.recv_ordered.len() < head.remaining_count as usize + 1 {
            return None;
        }
        let mut len = 0;
        for seg in &self.recv_ordered {
            len += seg.payload.len();
            if seg.is_last_fragment() {
                return Some(len);
            }
        }
        None
    }

    /// `true` when [`Session::recv`] would return a message.
    pub fn can_recv(&self) -> bool {
        self.peek_size().is_some()
    }

    /// Pop the next whole message, returning its id and reassembled bytes.
    pub fn recv_with_id(&mut self) -> Option<(i64, Bytes)> {
        let len = self.peek_size()?;
        let message_id = self.recv_ordered.front()?.message_id;

        let payload = match self.recv_ordered.pop_front() {
            Some(seg) if seg.is_last_fragment() => seg.payload,
            Some(first) => {
                let mut buf = BytesMut::with_capacity(len);
                buf.extend_from_slice(&first.payload);
                while let Some(seg) = self.recv_ordered.pop_front() {
                    buf.extend_from_slice(&seg.payload);
                    if seg.is_last_fragment() {
                        break;
                    }
                }
                buf.freeze()
            }
            None => return None,
        };

        self.arrange_recv_data();
        Some((message_id, payload))
    }

    /// Pop the next whole message's bytes.
    ///
    /// Returns `None` until every fragment of the message at the head of the
    /// ordered queue has arrived.
    pub fn recv(&mut self) -> Option<Bytes> {
        self.recv_with_id().map(|(_, payload)| payload)
    }

    /// Pop the next whole message and decode it through `codec`.
    pub fn recv_message<C: MessageCodec>(&mut self, codec: &C) -> Result<Option<C::Message>> {
        match self.recv_with_id() {
            Some((message_id, payload)) => codec.decode(message_id, payload).map(Some),
            None => Ok(None),
        }
    }
}
