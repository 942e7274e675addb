//! Flush / retransmission engine.

use crate::frame::Command;
use crate::output::Output;
use crate::seq;

use super::{emit, Session};

/// Why a segment goes out on this tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Transmit {
    First,
    Fast,
    Timeout,
}

impl<O: Output> Session<O> {
    /// Run one tick at time `now` (milliseconds).
    ///
    /// Admits queued segments into the window, then sends every in-flight
    /// segment that is new, fast-acked past the threshold, or past its
    /// retransmit deadline. Returns the interval until the next tick.
    pub fn flush(&mut self, now: i64) -> u32 {
        self.admit();

        let rto = self.rtt.rto();
        let window = self.unused_recv_window();
        let ack_base = self.recv_next;
        let session_id = self.config.session_id;
        let fast_resend = self.config.fast_resend;
        let dead_link = self.config.dead_link;

        for seg in self.inflight.iter_mut() {
            let reason = if seg.transmit_count == 0 {
                seg.retransmit_timeout = rto;
                Transmit::First
            } else if seg.fast_ack_hits >= fast_resend {
                seg.retransmit_timeout = rto;
                Transmit::Fast
            } else if seq::at_or_after(now, seg.next_retransmit_at) {
                seg.retransmit_timeout = seg.retransmit_timeout.saturating_add(rto);
                Transmit::Timeout
            } else {
                continue;
            };

            seg.fast_ack_hits = 0;
            seg.next_retransmit_at = now + seg.retransmit_timeout as i64;
            seg.transmit_count += 1;
            seg.timestamp = now;
            seg.declared_window = window;
            seg.ack_base = ack_base;

            match reason {
                Transmit::First => {}
                Transmit::Fast => {
                    self.stats.fast_retransmits += 1;
                    tracing::debug!(
                        session_id,
                        seq = seg.sequence_number,
                        xmit = seg.transmit_count,
                        "fast retransmit"
                    );
                }
                Transmit::Timeout => {
                    self.stats.timeout_retransmits += 1;
                    tracing::debug!(
                        session_id,
                        seq = seg.sequence_number,
                        xmit = seg.transmit_count,
                        timeout = seg.retransmit_timeout,
                        "timeout retransmit"
                    );
                }
            }

            if seg.transmit_count >= dead_link && !self.dead_link {
                self.dead_link = true;
                tracing::warn!(
                    session_id,
                    seq = seg.sequence_number,
                    xmit = seg.transmit_count,
                    "dead link: segment retransmitted past threshold"
                );
            }

            self.stats.segments_sent += 1;
            emit(&mut self.output, session_id, seg.encode(), seg.sequence_number);
        }

        self.config.interval
    }

    /// Move segments from the send queue into the in-flight window while
    /// `send_next - send_una < min(send_window, remote_window)`.
    fn admit(&mut self) {
        let window = self.config.send_window.min(self.config.remote_window) as i64;
        while seq::before(self.send_next, self.send_una.wrapping_add(window)) {
            if self.staged.is_empty() {
                match self.send_queue.pop() {
                    Some(batch) => self.staged.extend(batch),
                    None => break,
                }
            }
            let Some(mut seg) = self.staged.pop_front() else {
                break;
            };
            if seg.command != Command::Reset {
                seg.command = Command::Push;
            }
            seg.sequence_number = self.send_next;
            self.send_next = self.send_next.wrapping_add(1);
            self.inflight.push_back(seg);
        }
    }
}
