//! Session state machine.
//!
//! A [`Session`] is one end of a reliable, ordered message stream carried
//! over datagrams. It is driven from outside:
//!
//! - producers enqueue messages through [`Session::send`] or a cloned
//!   [`SendHandle`];
//! - the driver calls [`Session::flush`] on every tick and
//!   [`Session::input`] for every datagram that arrives;
//! - the application pulls whole messages with [`Session::recv`].
//!
//! Segments move through four queues: the send queue (producer side), the
//! in-flight queue (admitted, awaiting ACK, ascending sequence), the pending
//! set (received out of order, keyed by sequence) and the ordered queue
//! (contiguous, ready for reassembly). A segment is in exactly one of them at
//! a time and its payload is released when it leaves the last one.

mod flush;
mod input;
mod reassembly;

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Instant;

use bytes::Bytes;

use crate::codec::MessageCodec;
use crate::config::SessionConfig;
use crate::error::Result;
use crate::output::Output;
use crate::rtt::RttEstimator;
use crate::segment::Segment;
use crate::send::{SendHandle, SendQueue};

/// Counters describing what a session has done so far.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionStats {
    /// Data and control segments transmitted, retransmissions included.
    pub segments_sent: u64,
    pub timeout_retransmits: u64,
    pub fast_retransmits: u64,
    pub acks_sent: u64,
    /// Received segments dropped because the same sequence was pending.
    pub duplicates_dropped: u64,
    /// Received segments dropped for lying outside the receive window.
    pub out_of_window_dropped: u64,
}

/// One end of a reliable session.
pub struct Session<O: Output> {
    config: SessionConfig,
    output: O,

    /// Producer side of the send queue.
    send_queue: Arc<SendQueue>,
    /// Segments drained from `send_queue` but not yet admitted.
    staged: VecDeque<Segment>,
    inflight: VecDeque<Segment>,
    recv_pending: HashMap<i64, Segment>,
    recv_ordered: VecDeque<Segment>,

    send_next: i64,
    send_una: i64,
    recv_next: i64,

    rtt: RttEstimator,
    dead_link: bool,
    stats: SessionStats,
    started: Instant,
}

impl<O: Output> Session<O> {
    /// Create a session that writes datagrams to `output`.
    pub fn new(config: SessionConfig, output: O) -> Result<Self> {
        config.validate()?;
        let rtt = RttEstimator::new(
            config.rto_default,
            config.rto_min,
            config.rto_max,
            config.interval,
        );
        Ok(Self {
            config,
            output,
            send_queue: Arc::new(SendQueue::default()),
            staged: VecDeque::new(),
            inflight: VecDeque::new(),
            recv_pending: HashMap::new(),
            recv_ordered: VecDeque::new(),
            send_next: 0,
            send_una: 0,
            recv_next: 0,
            rtt,
            dead_link: false,
            stats: SessionStats::default(),
            started: Instant::now(),
        })
    }

    /// A producer handle sharing this session's send queue.
    pub fn sender(&self) -> SendHandle {
        SendHandle::new(self.send_queue.clone(), self.config.mss())
    }

    /// Fragment and enqueue `payload`. See [`SendHandle::send`].
    pub fn send(&self, payload: Bytes, message_id: i64) -> Result<usize> {
        self.sender().send(payload, message_id)
    }

    /// Encode `message` through `codec` and enqueue it.
    pub fn send_message<C: MessageCodec>(&self, codec: &C, message: &C::Message) -> Result<usize> {
        self.sender().send_message(codec, message)
    }

    /// Enqueue a RESET control segment.
    pub fn send_reset(&self) {
        self.sender().send_reset()
    }

    /// Segments queued or in flight; embedders throttle producers on this.
    pub fn wait_send(&self) -> usize {
        self.send_queue.len() + self.staged.len() + self.inflight.len()
    }

    /// Tear the session down, releasing every queued payload.
    pub fn release(&mut self) {
        while self.send_queue.pop().is_some() {}
        let released = self.staged.len()
            + self.inflight.len()
            + self.recv_pending.len()
            + self.recv_ordered.len();
        self.staged.clear();
        self.inflight.clear();
        self.recv_pending.clear();
        self.recv_ordered.clear();
        tracing::debug!(
            session_id = self.config.session_id,
            released,
            "session released"
        );
    }

    /// Restart sequence numbering after the peer asked for a reset.
    ///
    /// In-flight, pending and ordered segments all carry numbers from the
    /// abandoned numbering, so they are released with it. Queued segments
    /// are kept and numbered afresh on admission.
    fn reset(&mut self) {
        tracing::debug!(
            session_id = self.config.session_id,
            dropped_inflight = self.inflight.len(),
            dropped_pending = self.recv_pending.len(),
            dropped_ordered = self.recv_ordered.len(),
            "sequence state reset by peer"
        );
        self.inflight.clear();
        self.recv_pending.clear();
        self.recv_ordered.clear();
        self.send_next = 0;
        self.send_una = 0;
        self.recv_next = 1;
    }

    /// Receive headroom advertised to the peer.
    fn unused_recv_window(&self) -> u32 {
        (self.config.recv_window as usize).saturating_sub(self.recv_ordered.len()) as u32
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn output(&self) -> &O {
        &self.output
    }

    pub fn output_mut(&mut self) -> &mut O {
        &mut self.output
    }

    pub fn session_id(&self) -> u64 {
        self.config.session_id
    }

    pub fn mss(&self) -> usize {
        self.config.mss()
    }

    /// Recommended tick interval in milliseconds.
    pub fn interval(&self) -> u32 {
        self.config.interval
    }

    pub fn send_next(&self) -> i64 {
        self.send_next
    }

    pub fn send_una(&self) -> i64 {
        self.send_una
    }

    pub fn recv_next(&self) -> i64 {
        self.recv_next
    }

    /// Current retransmission timeout in milliseconds.
    pub fn rto(&self) -> u32 {
        self.rtt.rto()
    }

    pub fn srtt(&self) -> Option<u32> {
        self.rtt.srtt()
    }

    /// `true` once any segment has been transmitted `dead_link` times.
    ///
    /// The session keeps running; tearing it down is the embedder's call.
    pub fn is_dead_link(&self) -> bool {
        self.dead_link
    }

    /// Segments waiting for admission, including those still in producer
    /// batches.
    pub fn send_queue_len(&self) -> usize {
        self.send_queue.len() + self.staged.len()
    }

    pub fn inflight_len(&self) -> usize {
        self.inflight.len()
    }

    pub fn recv_pending_len(&self) -> usize {
        self.recv_pending.len()
    }

    pub fn recv_ordered_len(&self) -> usize {
        self.recv_ordered.len()
    }

    /// Sequence numbers currently in flight, oldest first.
    pub fn inflight_sequences(&self) -> Vec<i64> {
        self.inflight.iter().map(|s| s.sequence_number).collect()
    }

    pub fn stats(&self) -> SessionStats {
        self.stats
    }

    /// Milliseconds since the session was created, usable as `now`.
    pub fn elapsed_ms(&self) -> i64 {
        self.started.elapsed().as_millis() as i64
    }
}

/// Hand a datagram to the sink, skipping empty buffers.
fn emit<O: Output>(output: &mut O, session_id: u64, datagram: Bytes, sequence_number: i64) {
    if datagram.is_empty() {
        return;
    }
    output.output(datagram, session_id, sequence_number);
}
