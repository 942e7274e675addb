//! Input / acknowledgment processor.

use bytes::Bytes;

use crate::error::{Result, RudpError};
use crate::frame::{self, Command, SegmentHeader, HEADER_LEN};
use crate::output::Output;
use crate::segment::Segment;
use crate::seq;

use super::{emit, Session};

impl<O: Output> Session<O> {
    /// Process one inbound datagram received at `now` (milliseconds).
    ///
    /// The datagram may carry several concatenated frames; parsing stops when
    /// fewer than a header's worth of bytes remain. A truncated frame or an
    /// unknown command aborts the rest of the datagram and is returned as an
    /// error, but frames processed before it keep their effect.
    pub fn input(&mut self, mut data: Bytes, now: i64) -> Result<()> {
        if data.len() < HEADER_LEN {
            return Err(RudpError::TooShort {
                expected: HEADER_LEN,
                actual: data.len(),
            });
        }

        while data.len() >= HEADER_LEN {
            let (header, payload) = frame::decode(&mut data).map_err(|err| {
                tracing::debug!(
                    session_id = self.config.session_id,
                    error = %err,
                    "malformed frame, dropping rest of datagram"
                );
                err
            })?;

            self.parse_una(header.ack_base);
            self.shrink_buf();

            match header.command {
                Command::Ack => {
                    self.affirm_ack(header.sequence_number);
                    self.affirm_fast_ack(header.sequence_number, header.timestamp);
                    self.shrink_buf();
                    let rtt = seq::diff(now, header.timestamp);
                    if rtt >= 0 {
                        self.rtt.update(rtt as u32);
                    }
                }
                Command::Push => {
                    if self.within_recv_window(header.sequence_number) {
                        self.flush_ack(&header);
                        self.parse_recv_data(Segment::from_wire(&header, payload));
                        self.arrange_recv_data();
                    } else {
                        self.stats.out_of_window_dropped += 1;
                        tracing::trace!(
                            session_id = self.config.session_id,
                            seq = header.sequence_number,
                            recv_next = self.recv_next,
                            "push beyond receive window dropped"
                        );
                    }
                }
                Command::AskWin | Command::TellWin => {
                    // Window negotiation is not implemented; the advertised
                    // window is carried but never applied.
                    tracing::trace!(
                        session_id = self.config.session_id,
                        command = ?header.command,
                        window = header.declared_window,
                        "window control frame ignored"
                    );
                }
                Command::Reset => {
                    if self.within_recv_window(header.sequence_number) {
                        self.reset();
                        self.flush_ack(&header);
                    }
                }
            }
        }
        Ok(())
    }

    /// `sn < recv_next + recv_window`, the acceptance test for PUSH and RESET.
    fn within_recv_window(&self, sn: i64) -> bool {
        seq::before(sn, self.recv_next.wrapping_add(self.config.recv_window as i64))
    }

    /// Retire in-flight segments below the cumulative ack cursor.
    fn parse_una(&mut self, una: i64) {
        while let Some(head) = self.inflight.front() {
            if !seq::before(head.sequence_number, una) {
                break;
            }
            self.inflight.pop_front();
        }
    }

    /// Recompute `send_una` from the in-flight head.
    fn shrink_buf(&mut self) {
        self.send_una = match self.inflight.front() {
            Some(seg) => seg.sequence_number,
            None => self.send_next,
        };
    }

    fn ack_in_range(&self, sn: i64) -> bool {
        !seq::before(sn, self.send_una) && seq::before(sn, self.send_next)
    }

    /// Retire the single in-flight segment acknowledged by `sn`.
    fn affirm_ack(&mut self, sn: i64) {
        if !self.ack_in_range(sn) {
            return;
        }
        let mut found = None;
        for (i, seg) in self.inflight.iter().enumerate() {
            if seg.sequence_number == sn {
                found = Some(i);
                break;
            }
            if seq::before(sn, seg.sequence_number) {
                break;
            }
        }
        if let Some(i) = found {
            self.inflight.remove(i);
        }
    }

    /// Count an out-of-order ack against every older segment sent no later
    /// than the acknowledged one.
    fn affirm_fast_ack(&mut self, sn: i64, ts: i64) {
        if !self.ack_in_range(sn) {
            return;
        }
        for seg in self.inflight.iter_mut() {
            if !seq::before(seg.sequence_number, sn) {
                break;
            }
            if !seq::before(ts, seg.timestamp) {
                seg.fast_ack_hits += 1;
            }
        }
    }

    /// Send an immediate ACK echoing `header`'s sequence, timestamp and id.
    fn flush_ack(&mut self, header: &SegmentHeader) {
        let ack = SegmentHeader {
            command: Command::Ack,
            message_id: header.message_id,
            remaining_count: 0,
            declared_window: self.unused_recv_window(),
            timestamp: header.timestamp,
            sequence_number: header.sequence_number,
            ack_base: self.recv_next,
        };
        self.stats.acks_sent += 1;
        emit(
            &mut self.output,
            self.config.session_id,
            frame::encode(&ack, &[]),
            ack.sequence_number,
        );
    }
}
