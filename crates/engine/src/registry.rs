//! Connection registry — maps a user identity to its live WebSocket
//! connections.
//!
//! A connection `register`s under the identity it presents, is
//! `unregister`ed when the socket closes, and `publish` clones an event into
//! every connection currently joined for an identity. Delivery is
//! fire-and-forget over unbounded channels: no acknowledgment, no retry, and
//! no store-and-forward for users with no live connection.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio::sync::mpsc::UnboundedSender;
use uuid::Uuid;

use mindmend_common::types::ServerEvent;

/// Registry of live connections, keyed by user identity.
///
/// Cheap to clone; all clones share the same underlying table.
#[derive(Clone, Default)]
pub struct ConnectionRegistry {
    inner: Arc<Mutex<HashMap<Uuid, HashMap<Uuid, UnboundedSender<ServerEvent>>>>>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Join a connection to the channel for `user_id`.
    ///
    /// Idempotent: re-registering the same `conn_id` replaces its slot and
    /// never duplicates delivery.
    pub fn register(&self, user_id: Uuid, conn_id: Uuid, sender: UnboundedSender<ServerEvent>) {
        let mut inner = self.inner.lock().expect("registry lock poisoned");
        inner.entry(user_id).or_default().insert(conn_id, sender);
        tracing::debug!(%user_id, %conn_id, "Connection joined notification channel");
    }

    /// Remove a connection from the channel for `user_id`. No-op if the
    /// connection was never joined.
    pub fn unregister(&self, user_id: Uuid, conn_id: Uuid) {
        let mut inner = self.inner.lock().expect("registry lock poisoned");
        if let Some(conns) = inner.get_mut(&user_id) {
            conns.remove(&conn_id);
            if conns.is_empty() {
                inner.remove(&user_id);
            }
            tracing::debug!(%user_id, %conn_id, "Connection left notification channel");
        }
    }

    /// Push an event to every live connection joined for `user_id`.
    ///
    /// Connections whose receiving side has gone away are pruned on the
    /// spot. Returns the number of connections the event was handed to;
    /// zero means the event was dropped.
    pub fn publish(&self, user_id: Uuid, event: &ServerEvent) -> usize {
        let mut inner = self.inner.lock().expect("registry lock poisoned");
        let Some(conns) = inner.get_mut(&user_id) else {
            return 0;
        };

        let mut delivered = 0;
        conns.retain(|_, sender| match sender.send(event.clone()) {
            Ok(()) => {
                delivered += 1;
                true
            }
            Err(_) => false,
        });

        if conns.is_empty() {
            inner.remove(&user_id);
        }

        delivered
    }

    /// Number of connections currently joined for `user_id`.
    pub fn connection_count(&self, user_id: Uuid) -> usize {
        let inner = self.inner.lock().expect("registry lock poisoned");
        inner.get(&user_id).map_or(0, HashMap::len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use mindmend_common::types::{Notification, NotificationKind};
    use tokio::sync::mpsc::unbounded_channel;

    fn make_event(recipient_id: Uuid) -> ServerEvent {
        ServerEvent::NotificationReceived(Notification {
            id: Uuid::new_v4(),
            recipient_id,
            title: "Booking Confirmed!".to_string(),
            message: "Your session is confirmed".to_string(),
            kind: NotificationKind::BookingConfirmed,
            read: false,
            link: None,
            data: serde_json::json!({}),
            created_at: Utc::now(),
        })
    }

    #[test]
    fn test_publish_reaches_joined_connection() {
        let registry = ConnectionRegistry::new();
        let user = Uuid::new_v4();
        let (tx, mut rx) = unbounded_channel();

        registry.register(user, Uuid::new_v4(), tx);
        let delivered = registry.publish(user, &make_event(user));

        assert_eq!(delivered, 1);
        assert!(rx.try_recv().is_ok());
    }

    #[test]
    fn test_publish_without_connections_drops_event() {
        let registry = ConnectionRegistry::new();
        let delivered = registry.publish(Uuid::new_v4(), &make_event(Uuid::new_v4()));
        assert_eq!(delivered, 0);
    }

    #[test]
    fn test_join_after_publish_misses_past_events() {
        let registry = ConnectionRegistry::new();
        let user = Uuid::new_v4();

        registry.publish(user, &make_event(user));

        let (tx, mut rx) = unbounded_channel();
        registry.register(user, Uuid::new_v4(), tx);

        assert!(rx.try_recv().is_err(), "past events must not replay");
    }

    #[test]
    fn test_duplicate_join_is_idempotent() {
        let registry = ConnectionRegistry::new();
        let user = Uuid::new_v4();
        let conn = Uuid::new_v4();
        let (tx, mut rx) = unbounded_channel();

        registry.register(user, conn, tx.clone());
        registry.register(user, conn, tx);

        assert_eq!(registry.connection_count(user), 1);
        let delivered = registry.publish(user, &make_event(user));
        assert_eq!(delivered, 1);
        assert!(rx.try_recv().is_ok());
        assert!(rx.try_recv().is_err(), "one join, one delivery");
    }

    #[test]
    fn test_every_joined_connection_receives() {
        let registry = ConnectionRegistry::new();
        let user = Uuid::new_v4();
        let (tx1, mut rx1) = unbounded_channel();
        let (tx2, mut rx2) = unbounded_channel();

        registry.register(user, Uuid::new_v4(), tx1);
        registry.register(user, Uuid::new_v4(), tx2);

        let delivered = registry.publish(user, &make_event(user));
        assert_eq!(delivered, 2);
        assert!(rx1.try_recv().is_ok());
        assert!(rx2.try_recv().is_ok());
    }

    #[test]
    fn test_unregister_stops_delivery() {
        let registry = ConnectionRegistry::new();
        let user = Uuid::new_v4();
        let conn = Uuid::new_v4();
        let (tx, mut rx) = unbounded_channel();

        registry.register(user, conn, tx);
        registry.unregister(user, conn);

        assert_eq!(registry.publish(user, &make_event(user)), 0);
        assert!(rx.try_recv().is_err());
        assert_eq!(registry.connection_count(user), 0);
    }

    #[test]
    fn test_closed_connections_are_pruned() {
        let registry = ConnectionRegistry::new();
        let user = Uuid::new_v4();
        let (tx, rx) = unbounded_channel();

        registry.register(user, Uuid::new_v4(), tx);
        drop(rx);

        assert_eq!(registry.publish(user, &make_event(user)), 0);
        assert_eq!(registry.connection_count(user), 0);
    }

    #[test]
    fn test_publish_is_scoped_to_one_identity() {
        let registry = ConnectionRegistry::new();
        let alice = Uuid::new_v4();
        let bob = Uuid::new_v4();
        let (tx, mut rx) = unbounded_channel();

        registry.register(bob, Uuid::new_v4(), tx);
        let delivered = registry.publish(alice, &make_event(alice));

        assert_eq!(delivered, 0);
        assert!(rx.try_recv().is_err());
    }
}
