//! Module `handle`
//!
//! Server-side representative of one peer's live connection. The handle owns
//! the sending side of the connection's bounded outbound queue; a writer task
//! drains the queue into the socket. When the queue is full, sends are skipped.

use std::fmt;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::mpsc::{self, Receiver, Sender, error::TrySendError};

use crate::error::SendError;
use crate::protocol::ServerMessage;

static NEXT_CLIENT_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique connection identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ClientId(u64);

impl ClientId {
    pub fn next() -> Self {
        Self(NEXT_CLIENT_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Cloneable handle used by the registry and router to reach a peer.
#[derive(Debug, Clone)]
pub struct ClientHandle {
    id: ClientId,
    addr: SocketAddr,
    outbound: Sender<String>,
}

impl ClientHandle {
    /// Creates a handle together with the receiving end of its outbound queue,
    /// which holds at most `capacity` frames.
    pub fn channel(addr: SocketAddr, capacity: usize) -> (Self, Receiver<String>) {
        let (outbound, rx) = mpsc::channel(capacity);
        let handle = Self {
            id: ClientId::next(),
            addr,
            outbound,
        };
        (handle, rx)
    }

    pub fn id(&self) -> ClientId {
        self.id
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Returns false once the writer side of the connection has gone away.
    pub fn is_open(&self) -> bool {
        !self.outbound.is_closed()
    }

    /// Queues a relay-originated message for this peer.
    pub fn send(&self, message: &ServerMessage) -> Result<(), SendError> {
        self.send_text(&message.to_json())
    }

    /// Queues raw text, used when relaying a peer's payload verbatim.
    pub fn send_text(&self, text: &str) -> Result<(), SendError> {
        self.outbound
            .try_send(text.to_string())
            .map_err(|e| match e {
                TrySendError::Full(_) => SendError::QueueFull(self.id),
                TrySendError::Closed(_) => SendError::ChannelClosed(self.id),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr() -> SocketAddr {
        "127.0.0.1:40000".parse().unwrap()
    }

    #[test]
    fn test_ids_are_unique() {
        let (a, _rx_a) = ClientHandle::channel(addr(), 4);
        let (b, _rx_b) = ClientHandle::channel(addr(), 4);
        assert_ne!(a.id(), b.id());
        assert_eq!(a.clone().id(), a.id());
    }

    #[test]
    fn test_send_queues_serialized_message() {
        let (handle, mut rx) = ClientHandle::channel(addr(), 4);
        handle.send(&ServerMessage::PeerLeft).unwrap();
        handle.send_text(r#"{"type":"move"}"#).unwrap();
        assert_eq!(rx.try_recv().unwrap(), r#"{"type":"peer_left"}"#);
        assert_eq!(rx.try_recv().unwrap(), r#"{"type":"move"}"#);
    }

    #[test]
    fn test_send_after_close_fails() {
        let (handle, rx) = ClientHandle::channel(addr(), 4);
        assert!(handle.is_open());
        drop(rx);
        assert!(!handle.is_open());
        assert_eq!(
            handle.send(&ServerMessage::PeerJoined),
            Err(SendError::ChannelClosed(handle.id()))
        );
    }

    #[test]
    fn test_full_queue_skips_send() {
        let (handle, mut rx) = ClientHandle::channel(addr(), 2);
        handle.send_text("1").unwrap();
        handle.send_text("2").unwrap();
        assert_eq!(handle.send_text("3"), Err(SendError::QueueFull(handle.id())));
        assert!(handle.is_open());

        assert_eq!(rx.try_recv().unwrap(), "1");
        handle.send_text("4").unwrap();
        assert_eq!(rx.try_recv().unwrap(), "2");
        assert_eq!(rx.try_recv().unwrap(), "4");
    }
}
