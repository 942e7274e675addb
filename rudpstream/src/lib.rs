//! rudpstream -- reliable, ordered message delivery over unreliable datagrams.
//!
//! An ARQ session engine in the KCP family:
//! - **Fragmentation**: messages are split into MTU-sized segments
//! - **Selective + cumulative ACK**: every PUSH is acked immediately and every
//!   frame carries a cumulative ack cursor
//! - **Retransmission**: per-segment timers with additive backoff, plus fast
//!   retransmit after repeated out-of-order acks
//! - **Reassembly**: out-of-order segments are buffered and released to the
//!   application as whole messages, in order
//!
//! The engine owns no socket and no clock. The embedder feeds it datagrams
//! through [`Session::input`], ticks it with [`Session::flush`], and receives
//! outbound datagrams through an [`Output`] sink.

pub mod codec;
pub mod config;
pub mod error;
pub mod frame;
pub mod output;
pub mod rtt;
pub mod segment;
pub mod send;
pub mod seq;
pub mod session;

// Re-export key public types at crate root.
pub use codec::{BytesCodec, MessageCodec};
pub use config::SessionConfig;
pub use error::{Result, RudpError};
pub use frame::{Command, SegmentHeader, HEADER_LEN};
pub use output::{Datagram, DatagramQueue, Output};
pub use rtt::RttEstimator;
pub use segment::Segment;
pub use send::SendHandle;
pub use session::{Session, SessionStats};
