//! Connection registry and message router.
//!
//! Owns exactly one event loop (see [`hub::run`]) that serializes register,
//! unregister, and routing events. Nothing here touches a real socket —
//! `courtrelay-gateway` drives this module from the actual WebSocket
//! read/write pumps.

mod hub;
mod peer;
mod protocol;

pub use hub::{spawn_hub, HubHandle, HubSnapshot};
pub use peer::{Peer, PeerKind, SEND_QUEUE_CAPACITY};
pub use protocol::{
    decide_inbound, InboundDecision, AUTH_FAILED_FRAME, AUTH_SUCCESS_FRAME,
    CONTROLLER_CONNECTED_FRAME, CONTROLLER_DISCONNECTED_FRAME, NOT_AUTHORIZED_FRAME,
};
