//! Per-session tunables.

use crate::error::{Result, RudpError};
use crate::frame::HEADER_LEN;

/// Default MTU in bytes; bounds the payload of every segment.
pub const DEFAULT_MTU: usize = 1400;
/// Default flush interval in milliseconds.
pub const DEFAULT_INTERVAL: u32 = 100;
pub const DEFAULT_SEND_WINDOW: u32 = 32;
pub const DEFAULT_RECV_WINDOW: u32 = 32;
pub const RTO_MIN: u32 = 100;
pub const RTO_DEFAULT: u32 = 200;
pub const RTO_MAX: u32 = 60_000;
/// Out-of-order acks after which a segment is fast-retransmitted.
pub const DEFAULT_FAST_RESEND: u32 = 10;
/// Transmissions of one segment after which the link is considered dead.
pub const DEFAULT_DEAD_LINK: u32 = 10;

/// Configuration for one session. Times are in milliseconds, windows in
/// segments.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Opaque id handed to the output sink with every datagram.
    pub session_id: u64,
    pub mtu: usize,
    /// Tick interval returned by `flush`; also the RTO variance floor.
    pub interval: u32,
    pub send_window: u32,
    pub recv_window: u32,
    /// Peer receive window assumed for admission. Not negotiated.
    pub remote_window: u32,
    pub rto_min: u32,
    pub rto_default: u32,
    pub rto_max: u32,
    pub fast_resend: u32,
    pub dead_link: u32,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            session_id: 0,
            mtu: DEFAULT_MTU,
            interval: DEFAULT_INTERVAL,
            send_window: DEFAULT_SEND_WINDOW,
            recv_window: DEFAULT_RECV_WINDOW,
            remote_window: DEFAULT_RECV_WINDOW,
            rto_min: RTO_MIN,
            rto_default: RTO_DEFAULT,
            rto_max: RTO_MAX,
            fast_resend: DEFAULT_FAST_RESEND,
            dead_link: DEFAULT_DEAD_LINK,
        }
    }
}

impl SessionConfig {
    /// Largest payload carried by a single segment.
    pub fn mss(&self) -> usize {
        self.mtu.saturating_sub(HEADER_LEN)
    }

    /// Check the settings are internally consistent.
    pub fn validate(&self) -> Result<()> {
        if self.mtu <= HEADER_LEN {
            return Err(RudpError::InvalidConfig(format!(
                "mtu {} must exceed the {HEADER_LEN}-byte header",
                self.mtu
            )));
        }
        if self.send_window == 0 || self.recv_window == 0 || self.remote_window == 0 {
            return Err(RudpError::InvalidConfig("windows must be non-zero".into()));
        }
        if self.rto_min > self.rto_max {
            return Err(RudpError::InvalidConfig(format!(
                "rto_min {} exceeds rto_max {}",
                self.rto_min, self.rto_max
            )));
        }
        if !(self.rto_min..=self.rto_max).contains(&self.rto_default) {
            return Err(RudpError::InvalidConfig(format!(
                "rto_default {} outside [{}, {}]",
                self.rto_default, self.rto_min, self.rto_max
            )));
        }
        if self.fast_resend == 0 {
            return Err(RudpError::InvalidConfig("fast_resend must be non-zero".into()));
        }
        if self.dead_link == 0 {
            return Err(RudpError::InvalidConfig("dead_link must be non-zero".into()));
        }
        Ok(())
    }
}
