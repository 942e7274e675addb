//! Send / fragmentation path.
//!
//! Producers split outbound messages into MSS-sized segments and hand them to
//! the session through a lock-free queue. The driver thread drains that queue
//! on every flush, so producers never wait on the driver.
//!
//! All fragments of one message are pushed as a single batch. Two producers
//! sending concurrently can therefore interleave whole messages but never the
//! fragments of one message, which keeps every fragment run contiguous for the
//! receiver's reassembly.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use bytes::Bytes;
use crossbeam_queue::SegQueue;

use crate::codec::MessageCodec;
use crate::error::{Result, RudpError};
use crate::segment::Segment;

/// Queue shared between producers and the driving session.
#[derive(Debug, Default)]
pub(crate) struct SendQueue {
    batches: SegQueue<Vec<Segment>>,
    /// Segments currently inside `batches`.
    queued: AtomicUsize,
}

impl SendQueue {
    fn push(&self, batch: Vec<Segment>) {
        self.queued.fetch_add(batch.len(), Ordering::AcqRel);
        self.batches.push(batch);
    }

    /// Pop the oldest batch. Only the driver calls this.
    pub(crate) fn pop(&self) -> Option<Vec<Segment>> {
        let batch = self.batches.pop()?;
        self.queued.fetch_sub(batch.len(), Ordering::AcqRel);
        Some(batch)
    }

    pub(crate) fn len(&self) -> usize {
        self.queued.load(Ordering::Acquire)
    }
}

/// Cloneable producer handle for one session.
///
/// `SendHandle` is `Send + Sync`; hand clones to any thread that needs to
/// enqueue messages while the session is driven elsewhere.
#[derive(Debug, Clone)]
pub struct SendHandle {
    queue: Arc<SendQueue>,
    mss: usize,
}

impl SendHandle {
    pub(crate) fn new(queue: Arc<SendQueue>, mss: usize) -> Self {
        Self { queue, mss }
    }

    /// Fragment `payload` and enqueue it under `message_id`.
    ///
    /// Produces `ceil(len / mss)` segments whose `remaining_count` counts down
    /// to zero. The payload is consumed; fragments are zero-copy slices of it.
    /// Returns the number of segments enqueued.
    pub fn send(&self, mut payload: Bytes, message_id: i64) -> Result<usize> {
        if payload.is_empty() {
            return Err(RudpError::EmptyPayload);
        }

        let count = payload.len().div_ceil(self.mss);
        let mut batch = Vec::with_capacity(count);
        for i in 0..count {
            let take = payload.len().min(self.mss);
            let chunk = payload.split_to(take);
            batch.push(Segment::fragment(message_id, (count - i - 1) as u32, chunk));
        }

        tracing::trace!(message_id, fragments = count, "message enqueued");
        self.queue.push(batch);
        Ok(count)
    }

    /// Encode `message` through `codec` and enqueue the result.
    pub fn send_message<C: MessageCodec>(&self, codec: &C, message: &C::Message) -> Result<usize> {
        let (message_id, payload) = codec.encode(message)?;
        self.send(payload, message_id)
    }

    /// Enqueue a single RESET control segment.
    pub fn send_reset(&self) {
        tracing::debug!("reset enqueued");
        self.queue.push(vec![Segment::reset()]);
    }

    /// Segments enqueued by producers and not yet picked up by a flush.
    pub fn queued(&self) -> usize {
        self.queue.len()
    }

    /// Maximum payload bytes per segment.
    pub fn mss(&self) -> usize {
        self.mss
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::Command;

    fn handle(mss: usize) -> (SendHandle, Arc<SendQueue>) {
        let queue = Arc::new(SendQueue::default());
        (SendHandle::new(queue.clone(), mss), queue)
    }

    #[test]
    fn empty_payload_rejected() {
        let (h, queue) = handle(10);
        assert!(matches!(
            h.send(Bytes::new(), 1),
            Err(RudpError::EmptyPayload)
        ));
        assert_eq!(queue.len(), 0);
    }

    #[test]
    fn small_payload_is_one_fragment() {
        let (h, queue) = handle(10);
        assert_eq!(h.send(Bytes::from_static(b"hello"), 3).unwrap(), 1);
        let batch = queue.pop().unwrap();
        assert_eq!(batch.len(), 1);
        assert_eq!(batch[0].remaining_count, 0);
        assert_eq!(batch[0].message_id, 3);
    }

    #[test]
    fn fragments_count_down_to_zero() {
        let (h, queue) = handle(4);
        let n = h.send(Bytes::from_static(b"abcdefghij"), 8).unwrap();
        assert_eq!(n, 3);
        assert_eq!(h.queued(), 3);

        let batch = queue.pop().unwrap();
        let remaining: Vec<u32> = batch.iter().map(|s| s.remaining_count).collect();
        assert_eq!(remaining, vec![2, 1, 0]);
        let joined: Vec<u8> = batch.iter().flat_map(|s| s.payload.to_vec()).collect();
        assert_eq!(joined, b"abcdefghij");
        assert_eq!(batch[0].payload.len(), 4);
        assert_eq!(batch[2].payload.len(), 2);
        assert_eq!(queue.len(), 0);
    }

    #[test]
    fn exact_multiple_has_no_empty_tail() {
        let (h, queue) = handle(4);
        assert_eq!(h.send(Bytes::from_static(b"abcdefgh"), 1).unwrap(), 2);
        let batch = queue.pop().unwrap();
        assert!(batch.iter().all(|s| s.payload.len() == 4));
    }

    #[test]
    fn reset_is_control_segment() {
        let (h, queue) = handle(4);
        h.send_reset();
        let batch = queue.pop().unwrap();
        assert_eq!(batch.len(), 1);
        assert_eq!(batch[0].command, Command::Reset);
        assert_eq!(batch[0].message_id, -1);
    }

    #[test]
    fn concurrent_producers_keep_messages_contiguous() {
        let (h, queue) = handle(2);
        let threads: Vec<_> = (0..4)
            .map(|t| {
                let h = h.clone();
                std::thread::spawn(move || {
                    for _ in 0..25 {
                        h.send(Bytes::from_static(b"0123456789"), t).unwrap();
                    }
                })
            })
            .collect();
        for t in threads {
            t.join().unwrap();
        }

        assert_eq!(queue.len(), 4 * 25 * 5);
        while let Some(batch) = queue.pop() {
            assert_eq!(batch.len(), 5);
            let id = batch[0].message_id;
            assert!(batch.iter().all(|s| s.message_id == id));
        }
    }
}
