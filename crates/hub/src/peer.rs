use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;

/// Capacity of a single peer's outbound frame queue. Overflow is dropped,
/// never blocked on.
pub const SEND_QUEUE_CAPACITY: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PeerKind {
    Controller,
    Browser,
}

impl PeerKind {
    /// The `type` query parameter on the WS upgrade classifies the peer.
    /// `"moblin"` is the historical wire identifier for the controller.
    pub fn from_query_type(raw: Option<&str>) -> Self {
        match raw {
            Some("moblin") => PeerKind::Controller,
            _ => PeerKind::Browser,
        }
    }
}

/// A registered connection. Shared between the hub's registry (for routing
/// and fan-out) and that connection's own read pump (for auth state).
///
/// The outbound queue's `Sender` lives here; the matching `Receiver` is held
/// solely by the connection's write pump. Once every `Arc<Peer>` referencing
/// a given sender is dropped — which happens when the hub evicts it from
/// the registry and the read pump's local reference goes out of scope — the
/// channel closes and the write pump exits.
pub struct Peer {
    pub id: String,
    pub kind: PeerKind,
    authorized: AtomicBool,
    sender: mpsc::Sender<String>,
}

impl Peer {
    /// Build a new peer and its outbound queue. `authorized` starts true
    /// iff the relay's WS password is empty.
    pub fn new(id: String, kind: PeerKind, authorized: bool) -> (Arc<Self>, mpsc::Receiver<String>) {
        let (sender, receiver) = mpsc::channel(SEND_QUEUE_CAPACITY);
        let peer = Arc::new(Self {
            id,
            kind,
            authorized: AtomicBool::new(authorized),
            sender,
        });
        (peer, receiver)
    }

    pub fn is_authorized(&self) -> bool {
        self.authorized.load(Ordering::SeqCst)
    }

    pub fn set_authorized(&self, value: bool) {
        self.authorized.store(value, Ordering::SeqCst);
    }

    /// Non-blocking enqueue. Returns `false` (dropped) if the queue is full
    /// or already closed — never blocks the caller.
    pub fn try_send(&self, frame: String) -> bool {
        self.sender.try_send(frame).is_ok()
    }
}
