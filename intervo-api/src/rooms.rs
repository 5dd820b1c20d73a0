//! Room registry and cross-instance fanout
//!
//! Every WebSocket connection registers an outbound channel here. Connections
//! join at most one room (keyed by session id); re-joining moves the
//! connection out of its previous room. Broadcasts go to local members
//! directly and are republished on the bus so sibling instances can deliver
//! to their own members.

use async_trait::async_trait;
use intervo_common::events::ServerEvent;
use std::collections::HashMap;
use std::sync::{Arc, RwLock, Weak};
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, warn};
use uuid::Uuid;

/// Unique id assigned to one WebSocket connection
pub type ConnId = Uuid;

/// What the orchestrator needs from the room layer
pub trait RoomSink: Send + Sync {
    /// Deliver `event` to every member of the session's room
    fn broadcast(&self, session_id: Uuid, event: ServerEvent);

    /// Deliver `event` to a single connection
    fn emit_to(&self, conn_id: ConnId, event: ServerEvent);
}

/// One event republished between instances
#[derive(Debug, Clone)]
pub struct BusMessage {
    /// Instance that originated the broadcast
    pub origin: Uuid,
    pub session_id: Uuid,
    pub event: ServerEvent,
}

/// Cross-instance fanout channel
pub trait BroadcastBus: Send + Sync {
    fn publish(&self, message: BusMessage);
    fn subscribe(&self) -> broadcast::Receiver<BusMessage>;
}

/// Single-process bus backed by a tokio broadcast channel. Instances sharing
/// a `LocalBus` see each other's room broadcasts; a networked backend slots
/// in behind the same trait.
pub struct LocalBus {
    tx: broadcast::Sender<BusMessage>,
}

impl LocalBus {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }
}

impl Default for LocalBus {
    fn default() -> Self {
        Self::new(256)
    }
}

impl BroadcastBus for LocalBus {
    fn publish(&self, message: BusMessage) {
        // Err means no subscribers, which is fine
        let _ = self.tx.send(message);
    }

    fn subscribe(&self) -> broadcast::Receiver<BusMessage> {
        self.tx.subscribe()
    }
}

#[derive(Default)]
struct RegistryInner {
    /// session id → member connections
    rooms: HashMap<Uuid, Vec<ConnId>>,
    /// connection → the room it currently occupies
    memberships: HashMap<ConnId, Uuid>,
    /// connection → outbound event channel
    senders: HashMap<ConnId, mpsc::UnboundedSender<ServerEvent>>,
}

/// Tracks live connections and room membership for this instance
pub struct RoomRegistry {
    instance_id: Uuid,
    inner: RwLock<RegistryInner>,
    bus: Arc<dyn BroadcastBus>,
}

impl RoomRegistry {
    /// Create a registry wired to `bus` and start the task that delivers
    /// broadcasts originating on other instances.
    pub fn new(bus: Arc<dyn BroadcastBus>) -> Arc<Self> {
        let registry = Arc::new(Self {
            instance_id: Uuid::new_v4(),
            inner: RwLock::new(RegistryInner::default()),
            bus,
        });

        let weak: Weak<RoomRegistry> = Arc::downgrade(&registry);
        let mut rx = registry.bus.subscribe();
        tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(message) => {
                        let Some(registry) = weak.upgrade() else { break };
                        if message.origin == registry.instance_id {
                            continue;
                        }
                        registry.deliver_local(message.session_id, message.event);
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!("Room bus receiver lagged, skipped {} events", skipped);
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        });

        registry
    }

    /// Register a new connection's outbound channel
    pub fn register(&self, conn_id: ConnId, tx: mpsc::UnboundedSender<ServerEvent>) {
        let mut inner = self.inner.write().unwrap_or_else(|e| e.into_inner());
        inner.senders.insert(conn_id, tx);
    }

    /// Drop a connection entirely (on disconnect)
    pub fn unregister(&self, conn_id: ConnId) {
        let mut inner = self.inner.write().unwrap_or_else(|e| e.into_inner());
        inner.senders.remove(&conn_id);
        Self::remove_membership(&mut inner, conn_id);
    }

    /// Put `conn_id` in the room for `session_id`, leaving any previous room
    pub fn join(&self, conn_id: ConnId, session_id: Uuid) {
        let mut inner = self.inner.write().unwrap_or_else(|e| e.into_inner());
        Self::remove_membership(&mut inner, conn_id);
        inner.rooms.entry(session_id).or_default().push(conn_id);
        inner.memberships.insert(conn_id, session_id);
        debug!(%conn_id, %session_id, "Connection joined room");
    }

    /// Remove `conn_id` from its room without dropping the connection
    pub fn leave(&self, conn_id: ConnId) {
        let mut inner = self.inner.write().unwrap_or_else(|e| e.into_inner());
        Self::remove_membership(&mut inner, conn_id);
    }

    /// Number of local members in a session's room
    pub fn room_size(&self, session_id: Uuid) -> usize {
        let inner = self.inner.read().unwrap_or_else(|e| e.into_inner());
        inner.rooms.get(&session_id).map_or(0, Vec::len)
    }

    fn remove_membership(inner: &mut RegistryInner, conn_id: ConnId) {
        if let Some(session_id) = inner.memberships.remove(&conn_id) {
            if let Some(members) = inner.rooms.get_mut(&session_id) {
                members.retain(|id| *id != conn_id);
                if members.is_empty() {
                    inner.rooms.remove(&session_id);
                }
            }
        }
    }

    /// Deliver to local members only, without touching the bus
    fn deliver_local(&self, session_id: Uuid, event: ServerEvent) {
        let inner = self.inner.read().unwrap_or_else(|e| e.into_inner());
        let Some(members) = inner.rooms.get(&session_id) else {
            return;
        };
        for conn_id in members {
            if let Some(tx) = inner.senders.get(conn_id) {
                // Send failures mean the connection is already tearing down
                let _ = tx.send(event.clone());
            }
        }
    }
}

impl RoomSink for RoomRegistry {
    fn broadcast(&self, session_id: Uuid, event: ServerEvent) {
        self.deliver_local(session_id, event.clone());
        self.bus.publish(BusMessage {
            origin: self.instance_id,
            session_id,
            event,
        });
    }

    fn emit_to(&self, conn_id: ConnId, event: ServerEvent) {
        let inner = self.inner.read().unwrap_or_else(|e| e.into_inner());
        if let Some(tx) = inner.senders.get(&conn_id) {
            let _ = tx.send(event);
        }
    }
}
