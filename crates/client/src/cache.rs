//! Client notification cache — a local projection of the unread set.
//!
//! A pure state machine holding the newest-first notification list and an
//! unread counter. It is hydrated from a server page on load and updated
//! incrementally from push frames. Read-acknowledgment mutations apply
//! optimistically and hand back an undo token, so a caller whose server
//! mutation is rejected can restore the prior state instead of drifting.
//!
//! Push frames are not de-duplicated: a frame carrying an id already
//! present counts as new.

use uuid::Uuid;

use mindmend_common::types::Notification;

#[derive(Debug, Clone, Default)]
pub struct NotificationCache {
    notifications: Vec<Notification>,
    unread_count: usize,
}

/// Token restoring the cache state preceding an optimistic mutation.
#[derive(Debug, Clone)]
pub enum CacheUndo {
    MarkRead { id: Uuid, was_unread: bool },
    MarkAllRead { previously_unread: Vec<Uuid> },
}

impl NotificationCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Notifications currently cached, newest first.
    pub fn notifications(&self) -> &[Notification] {
        &self.notifications
    }

    /// Number of cached notifications with `read == false`.
    pub fn unread_count(&self) -> usize {
        self.unread_count
    }

    /// Replace the contents with a freshly fetched server page (newest
    /// first) and recompute the unread count.
    pub fn hydrate(&mut self, notifications: Vec<Notification>) {
        self.unread_count = notifications.iter().filter(|n| !n.read).count();
        self.notifications = notifications;
    }

    /// Apply an incoming push frame: prepend it and count it unread.
    pub fn apply_push(&mut self, notification: Notification) {
        self.notifications.insert(0, notification);
        self.unread_count += 1;
    }

    /// Optimistically mark one entry read.
    ///
    /// The unread count drops by at most 1 and never below zero; marking
    /// an entry that is already read changes nothing. Returns `None` when
    /// the id is not cached (nothing applied, nothing to revert).
    pub fn mark_read(&mut self, id: Uuid) -> Option<CacheUndo> {
        let entry = self.notifications.iter_mut().find(|n| n.id == id)?;
        let was_unread = !entry.read;
        entry.read = true;
        if was_unread {
            self.unread_count = self.unread_count.saturating_sub(1);
        }
        Some(CacheUndo::MarkRead { id, was_unread })
    }

    /// Optimistically mark every entry read and zero the counter.
    pub fn mark_all_read(&mut self) -> CacheUndo {
        let previously_unread = self
            .notifications
            .iter()
            .filter(|n| !n.read)
            .map(|n| n.id)
            .collect();
        for entry in &mut self.notifications {
            entry.read = true;
        }
        self.unread_count = 0;
        CacheUndo::MarkAllRead { previously_unread }
    }

    /// Restore the state preceding an optimistic mutation whose server
    /// call was rejected.
    pub fn revert(&mut self, undo: CacheUndo) {
        match undo {
            CacheUndo::MarkRead { id, was_unread } => {
                if was_unread
                    && let Some(entry) = self.notifications.iter_mut().find(|n| n.id == id)
                {
                    entry.read = false;
                    self.unread_count += 1;
                }
            }
            CacheUndo::MarkAllRead { previously_unread } => {
                for id in &previously_unread {
                    if let Some(entry) = self.notifications.iter_mut().find(|n| n.id == *id) {
                        entry.read = false;
                    }
                }
                self.unread_count = self.notifications.iter().filter(|n| !n.read).count();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use mindmend_common::types::NotificationKind;

    fn make_notification(read: bool) -> Notification {
        Notification {
            id: Uuid::new_v4(),
            recipient_id: Uuid::new_v4(),
            title: "title".to_string(),
            message: "message".to_string(),
            kind: NotificationKind::System,
            read,
            link: None,
            data: serde_json::json!({}),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_hydrate_computes_unread_count() {
        let mut cache = NotificationCache::new();
        cache.hydrate(vec![
            make_notification(false),
            make_notification(true),
            make_notification(false),
        ]);
        assert_eq!(cache.unread_count(), 2);
        assert_eq!(cache.notifications().len(), 3);
    }

    #[test]
    fn test_push_prepends_and_increments() {
        let mut cache = NotificationCache::new();
        cache.hydrate(vec![make_notification(true)]);

        let pushed = make_notification(false);
        let pushed_id = pushed.id;
        cache.apply_push(pushed);

        assert_eq!(cache.unread_count(), 1);
        assert_eq!(cache.notifications()[0].id, pushed_id);
    }

    #[test]
    fn test_duplicate_push_counts_twice() {
        // Deliberately unhandled: the feed performs no de-duplication, so a
        // replayed frame inflates both the list and the counter.
        let mut cache = NotificationCache::new();
        let n = make_notification(false);
        cache.apply_push(n.clone());
        cache.apply_push(n);

        assert_eq!(cache.notifications().len(), 2);
        assert_eq!(cache.unread_count(), 2);
    }

    #[test]
    fn test_mark_read_decrements_once() {
        let mut cache = NotificationCache::new();
        let n = make_notification(false);
        let id = n.id;
        cache.hydrate(vec![n, make_notification(false)]);

        cache.mark_read(id).unwrap();
        assert_eq!(cache.unread_count(), 1);
        assert!(cache.notifications().iter().find(|n| n.id == id).unwrap().read);

        // Marking the same entry again changes nothing.
        cache.mark_read(id).unwrap();
        assert_eq!(cache.unread_count(), 1);
    }

    #[test]
    fn test_mark_read_unknown_id_is_noop() {
        let mut cache = NotificationCache::new();
        cache.hydrate(vec![make_notification(false)]);
        assert!(cache.mark_read(Uuid::new_v4()).is_none());
        assert_eq!(cache.unread_count(), 1);
    }

    #[test]
    fn test_revert_mark_read_restores_state() {
        let mut cache = NotificationCache::new();
        let n = make_notification(false);
        let id = n.id;
        cache.hydrate(vec![n]);

        let undo = cache.mark_read(id).unwrap();
        assert_eq!(cache.unread_count(), 0);

        cache.revert(undo);
        assert_eq!(cache.unread_count(), 1);
        assert!(!cache.notifications()[0].read);
    }

    #[test]
    fn test_revert_of_noop_mark_read_does_not_inflate() {
        let mut cache = NotificationCache::new();
        let n = make_notification(true);
        let id = n.id;
        cache.hydrate(vec![n]);

        let undo = cache.mark_read(id).unwrap();
        cache.revert(undo);

        // The entry was already read before the mutation; revert must not
        // invent an unread entry.
        assert_eq!(cache.unread_count(), 0);
        assert!(cache.notifications()[0].read);
    }

    #[test]
    fn test_mark_all_read_and_revert_round_trip() {
        let mut cache = NotificationCache::new();
        let unread_a = make_notification(false);
        let already_read = make_notification(true);
        let unread_b = make_notification(false);
        let unread_ids = [unread_a.id, unread_b.id];
        let read_id = already_read.id;
        cache.hydrate(vec![unread_a, already_read, unread_b]);

        let undo = cache.mark_all_read();
        assert_eq!(cache.unread_count(), 0);
        assert!(cache.notifications().iter().all(|n| n.read));

        cache.revert(undo);
        assert_eq!(cache.unread_count(), 2);
        for n in cache.notifications() {
            if unread_ids.contains(&n.id) {
                assert!(!n.read);
            }
            if n.id == read_id {
                assert!(n.read, "an entry read before the mutation stays read");
            }
        }
    }
}
