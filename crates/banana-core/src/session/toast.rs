//! Short-lived notifications, each expiring on its own timer.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// Severity of a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastKind {
    Success,
    Error,
    Info,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
    pub id: u64,
    pub kind: ToastKind,
    pub message: String,
    pub created_at: Instant,
}

/// Notifications in the order they were raised.
#[derive(Debug, Clone)]
pub struct ToastQueue {
    ttl: Duration,
    next_id: u64,
    toasts: VecDeque<Toast>,
}

impl Default for ToastQueue {
    fn default() -> Self {
        Self::new(Duration::from_millis(5000))
    }
}

impl ToastQueue {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            next_id: 1,
            toasts: VecDeque::new(),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Raise a notification now. Returns its id.
    pub fn push(&mut self, kind: ToastKind, message: impl Into<String>) -> u64 {
        self.push_at(kind, message, Instant::now())
    }

    /// Raise a notification with an explicit timestamp.
    pub fn push_at(&mut self, kind: ToastKind, message: impl Into<String>, now: Instant) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        self.toasts.push_back(Toast {
            id,
            kind,
            message: message.into(),
            created_at: now,
        });
        id
    }

    /// Close a notification early. Returns false if it was already gone.
    pub fn dismiss(&mut self, id: u64) -> bool {
        let before = self.toasts.len();
        self.toasts.retain(|t| t.id != id);
        self.toasts.len() != before
    }

    /// Drop every notification older than the TTL, returning them.
    pub fn expire_at(&mut self, now: Instant) -> Vec<Toast> {
        let ttl = self.ttl;
        let (expired, live): (Vec<Toast>, Vec<Toast>) = self
            .toasts
            .drain(..)
            .partition(|t| now.saturating_duration_since(t.created_at) >= ttl);
        self.toasts = live.into();
        expired
    }

    pub fn expire(&mut self) -> Vec<Toast> {
        self.expire_at(Instant::now())
    }

    /// Live notifications, oldest first.
    pub fn active(&self) -> impl Iterator<Item = &Toast> {
        self.toasts.iter()
    }

    pub fn latest(&self) -> Option<&Toast> {
        self.toasts.back()
    }

    pub fn len(&self) -> usize {
        self.toasts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.toasts.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_unique_and_ordered() {
        let mut queue = ToastQueue::default();
        let now = Instant::now();
        let a = queue.push_at(ToastKind::Info, "first", now);
        let b = queue.push_at(ToastKind::Error, "second", now);
        assert!(b > a);

        let messages: Vec<&str> = queue.active().map(|t| t.message.as_str()).collect();
        assert_eq!(messages, vec!["first", "second"]);
    }

    #[test]
    fn test_dismiss() {
        let mut queue = ToastQueue::default();
        let id = queue.push(ToastKind::Success, "done");
        assert!(queue.dismiss(id));
        assert!(!queue.dismiss(id));
        assert!(queue.is_empty());
    }

    #[test]
    fn test_each_toast_expires_independently() {
        let mut queue = ToastQueue::new(Duration::from_millis(5000));
        let t0 = Instant::now();
        queue.push_at(ToastKind::Info, "old", t0);
        queue.push_at(ToastKind::Info, "new", t0 + Duration::from_millis(3000));

        assert!(queue.expire_at(t0 + Duration::from_millis(4999)).is_empty());
        assert_eq!(queue.len(), 2);

        let expired = queue.expire_at(t0 + Duration::from_millis(5000));
        assert_eq!(expired.len(), 1);
        assert_eq!(expired[0].message, "old");
        assert_eq!(queue.latest().map(|t| t.message.as_str()), Some("new"));

        let expired = queue.expire_at(t0 + Duration::from_millis(8000));
        assert_eq!(expired.len(), 1);
        assert!(queue.is_empty());
    }
}
