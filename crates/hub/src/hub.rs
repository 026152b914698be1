use crate::peer::{Peer, PeerKind};
use crate::protocol::{CONTROLLER_CONNECTED_FRAME, CONTROLLER_DISCONNECTED_FRAME};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tracing::debug;

const COMMAND_QUEUE_CAPACITY: usize = 256;

enum Command {
    Register(Arc<Peer>),
    Unregister(String),
    Broadcast(String),
    RouteFromController(String),
    RouteFromBrowser(String),
    Snapshot(oneshot::Sender<HubSnapshot>),
}

/// Point-in-time view of the registry, useful for tests and health checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HubSnapshot {
    pub controller_id: Option<String>,
    pub browser_ids: Vec<String>,
}

/// Cloneable front for the hub's single-owner actor task.
#[derive(Clone)]
pub struct HubHandle {
    tx: mpsc::Sender<Command>,
}

impl HubHandle {
    pub async fn register(&self, peer: Arc<Peer>) {
        let _ = self.tx.send(Command::Register(peer)).await;
    }

    pub async fn unregister(&self, id: impl Into<String>) {
        let _ = self.tx.send(Command::Unregister(id.into())).await;
    }

    /// Fan a frame out to every registered peer (used for store-update
    /// notifications and other relay-wide announcements).
    pub async fn broadcast(&self, frame: impl Into<String>) {
        let _ = self.tx.send(Command::Broadcast(frame.into())).await;
    }

    /// Controller → every authorized browser.
    pub async fn route_from_controller(&self, frame: impl Into<String>) {
        let _ = self
            .tx
            .send(Command::RouteFromController(frame.into()))
            .await;
    }

    /// Browser → the controller, if present; dropped otherwise.
    pub async fn route_from_browser(&self, frame: impl Into<String>) {
        let _ = self.tx.send(Command::RouteFromBrowser(frame.into())).await;
    }

    pub async fn snapshot(&self) -> HubSnapshot {
        let (tx, rx) = oneshot::channel();
        let _ = self.tx.send(Command::Snapshot(tx)).await;
        rx.await.unwrap_or(HubSnapshot {
            controller_id: None,
            browser_ids: Vec::new(),
        })
    }
}

/// Spawn the hub's serial event loop and return a handle to it.
pub fn spawn_hub() -> HubHandle {
    let (tx, rx) = mpsc::channel(COMMAND_QUEUE_CAPACITY);
    tokio::spawn(run(rx));
    HubHandle { tx }
}

async fn run(mut rx: mpsc::Receiver<Command>) {
    let mut controller: Option<Arc<Peer>> = None;
    let mut browsers: HashMap<String, Arc<Peer>> = HashMap::new();

    while let Some(cmd) = rx.recv().await {
        match cmd {
            Command::Register(peer) => match peer.kind {
                PeerKind::Controller => {
                    debug!(id = %peer.id, "controller registered");
                    controller = Some(peer);
                    fan_out(&browsers, CONTROLLER_CONNECTED_FRAME);
                }
                PeerKind::Browser => {
                    debug!(id = %peer.id, "browser registered");
                    browsers.insert(peer.id.clone(), peer);
                }
            },
            Command::Unregister(id) => {
                let was_controller = controller.as_ref().is_some_and(|c| c.id == id);
                if was_controller {
                    controller = None;
                    debug!(id = %id, "controller unregistered");
                    fan_out(&browsers, CONTROLLER_DISCONNECTED_FRAME);
                } else if browsers.remove(&id).is_some() {
                    debug!(id = %id, "browser unregistered");
                }
            }
            Command::Broadcast(frame) => {
                if let Some(c) = &controller {
                    c.try_send(frame.clone());
                }
                fan_out(&browsers, &frame);
            }
            Command::RouteFromController(frame) => {
                for peer in browsers.values() {
                    if peer.is_authorized() {
                        peer.try_send(frame.clone());
                    }
                }
            }
            Command::RouteFromBrowser(frame) => {
                if let Some(c) = &controller {
                    c.try_send(frame);
                }
                // No controller present: the spec tolerates silently
                // dropping the frame.
            }
            Command::Snapshot(reply) => {
                let snapshot = HubSnapshot {
                    controller_id: controller.as_ref().map(|c| c.id.clone()),
                    browser_ids: browsers.keys().cloned().collect(),
                };
                let _ = reply.send(snapshot);
            }
        }
    }
}

fn fan_out(browsers: &HashMap<String, Arc<Peer>>, frame: &str) {
    for peer in browsers.values() {
        peer.try_send(frame.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::peer::Peer;
    use tokio::sync::mpsc::Receiver;

    fn browser(id: &str) -> (Arc<Peer>, Receiver<String>) {
        Peer::new(id.to_string(), PeerKind::Browser, true)
    }

    fn controller(id: &str) -> (Arc<Peer>, Receiver<String>) {
        Peer::new(id.to_string(), PeerKind::Controller, true)
    }

    #[tokio::test]
    async fn registering_a_controller_notifies_browsers() {
        let hub = spawn_hub();
        let (b1, mut b1_rx) = browser("b1");
        hub.register(b1).await;

        let (c1, _c1_rx) = controller("c1");
        hub.register(c1).await;

        assert_eq!(b1_rx.recv().await.unwrap(), CONTROLLER_CONNECTED_FRAME);
    }

    #[tokio::test]
    async fn new_controller_replaces_the_slot_atomically() {
        let hub = spawn_hub();
        let (c1, _c1_rx) = controller("c1");
        hub.register(c1).await;
        let (c2, _c2_rx) = controller("c2");
        hub.register(c2).await;

        let snapshot = hub.snapshot().await;
        assert_eq!(snapshot.controller_id, Some("c2".to_string()));
    }

    #[tokio::test]
    async fn unregistering_a_stale_controller_id_does_not_clear_the_new_one() {
        let hub = spawn_hub();
        let (c1, _c1_rx) = controller("c1");
        hub.register(c1).await;
        let (c2, _c2_rx) = controller("c2");
        hub.register(c2).await;

        hub.unregister("c1").await;

        let snapshot = hub.snapshot().await;
        assert_eq!(snapshot.controller_id, Some("c2".to_string()));
    }

    #[tokio::test]
    async fn unregistering_the_live_controller_notifies_browsers() {
        let hub = spawn_hub();
        let (b1, mut b1_rx) = browser("b1");
        hub.register(b1).await;
        let (c1, _c1_rx) = controller("c1");
        hub.register(c1).await;
        assert_eq!(b1_rx.recv().await.unwrap(), CONTROLLER_CONNECTED_FRAME);

        hub.unregister("c1").await;
        assert_eq!(b1_rx.recv().await.unwrap(), CONTROLLER_DISCONNECTED_FRAME);
    }

    #[tokio::test]
    async fn controller_frame_reaches_only_authorized_browsers() {
        let hub = spawn_hub();
        let (authorized, mut auth_rx) = Peer::new("b1".into(), PeerKind::Browser, true);
        let (gated, mut gated_rx) = Peer::new("b2".into(), PeerKind::Browser, false);
        hub.register(authorized).await;
        hub.register(gated).await;

        hub.route_from_controller(r#"{"type":"telemetry"}"#).await;

        assert_eq!(auth_rx.recv().await.unwrap(), r#"{"type":"telemetry"}"#);
        // give the unauthorized peer's queue a moment, then confirm nothing arrived
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        assert!(gated_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn browser_frame_routes_to_the_controller() {
        let hub = spawn_hub();
        let (c1, mut c1_rx) = controller("c1");
        hub.register(c1).await;

        hub.route_from_browser(r#"{"type":"ack"}"#).await;
        assert_eq!(c1_rx.recv().await.unwrap(), r#"{"type":"ack"}"#);
    }

    #[tokio::test]
    async fn browser_frame_with_no_controller_is_dropped_silently() {
        let hub = spawn_hub();
        hub.route_from_browser(r#"{"type":"ack"}"#).await;
        let snapshot = hub.snapshot().await; // just prove the hub is still alive
        assert!(snapshot.controller_id.is_none());
    }

    #[tokio::test]
    async fn slow_browser_does_not_stall_broadcast_to_others() {
        let hub = spawn_hub();
        let (slow, _slow_rx) = Peer::new("slow".into(), PeerKind::Browser, true);
        // fill the slow peer's queue without anyone draining it
        for i in 0..crate::peer::SEND_QUEUE_CAPACITY {
            assert!(slow.try_send(format!("filler-{i}")));
        }
        hub.register(slow).await;

        let (fast, mut fast_rx) = browser("fast");
        hub.register(fast).await;

        hub.broadcast(r#"{"type":"scout_update","version":2}"#).await;
        assert_eq!(
            fast_rx.recv().await.unwrap(),
            r#"{"type":"scout_update","version":2}"#
        );
    }

    #[tokio::test]
    async fn unregister_is_idempotent() {
        let hub = spawn_hub();
        let (b1, _rx) = browser("b1");
        hub.register(b1).await;
        hub.unregister("b1").await;
        hub.unregister("b1").await; // second call: no panic, no-op
        let snapshot = hub.snapshot().await;
        assert!(snapshot.browser_ids.is_empty());
    }
}
