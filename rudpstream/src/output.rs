//! The output sink a session hands encoded datagrams to.
//!
//! The session never touches a socket. Every datagram it produces goes to an
//! [`Output`] together with the session id and the sequence number it carries,
//! and ownership of the buffer passes to the sink.

use std::collections::VecDeque;
use std::sync::Arc;

use bytes::Bytes;
use parking_lot::Mutex;

/// Accepts fully encoded datagrams for transmission.
pub trait Output {
    fn output(&mut self, datagram: Bytes, session_id: u64, sequence_number: i64);
}

impl<F> Output for F
where
    F: FnMut(Bytes, u64, i64),
{
    fn output(&mut self, datagram: Bytes, session_id: u64, sequence_number: i64) {
        self(datagram, session_id, sequence_number)
    }
}

/// One datagram captured by a [`DatagramQueue`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Datagram {
    pub session_id: u64,
    pub sequence_number: i64,
    pub data: Bytes,
}

/// Cloneable sink that buffers datagrams until a socket task drains them.
///
/// Clones share the same queue, so the session can own one handle while the
/// I/O side holds another.
#[derive(Debug, Clone, Default)]
pub struct DatagramQueue {
    inner: Arc<Mutex<VecDeque<Datagram>>>,
}

impl DatagramQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pop the oldest datagram, if any.
    pub fn pop(&self) -> Option<Datagram> {
        self.inner.lock().pop_front()
    }

    /// Take every buffered datagram, oldest first.
    pub fn drain(&self) -> Vec<Datagram> {
        self.inner.lock().drain(..).collect()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }
}

impl Output for DatagramQueue {
    fn output(&mut self, datagram: Bytes, session_id: u64, sequence_number: i64) {
        self.inner.lock().push_back(Datagram {
            session_id,
            sequence_number,
            data: datagram,
        });
    }
}
