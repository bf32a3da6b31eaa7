//! Ephemeral, self-expiring notifications.
//!
//! At most one notification is visible. Showing a new one replaces the
//! current message and restarts its expiry timer.

use log::debug;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

/// Visual tone of a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    Success,
    Error,
}

/// A message currently on screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub message: String,
    pub kind: NotificationKind,
}

/// Shared handle to the notification surface.
#[derive(Clone)]
pub struct Notifier {
    inner: Arc<NotifierInner>,
}

struct NotifierInner {
    sender: watch::Sender<Option<Notification>>,
    /// Bumped on every show/clear; an expiry timer only clears its own generation.
    generation: Mutex<u64>,
    ttl: Duration,
}

impl Notifier {
    pub fn new(ttl: Duration) -> Self {
        let (sender, _) = watch::channel(None);
        Self {
            inner: Arc::new(NotifierInner {
                sender,
                generation: Mutex::new(0),
                ttl,
            }),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.inner.ttl
    }

    /// Show `message`, replacing whatever is visible.
    ///
    /// Expiry is scheduled on the ambient tokio runtime; outside a runtime the
    /// message stays until the next `show` or `clear`.
    pub fn show(&self, message: impl Into<String>, kind: NotificationKind) {
        let notification = Notification {
            message: message.into(),
            kind,
        };
        let generation = {
            let mut generation = self.inner.generation.lock();
            *generation += 1;
            self.inner.sender.send_replace(Some(notification));
            *generation
        };
        debug!("notification shown (kind={kind:?}, generation={generation})");

        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            debug!("no runtime available; notification will not expire");
            return;
        };
        let inner = Arc::clone(&self.inner);
        handle.spawn(async move {
            tokio::time::sleep(inner.ttl).await;
            let current = inner.generation.lock();
            if *current == generation {
                inner.sender.send_replace(None);
            }
        });
    }

    pub fn success(&self, message: impl Into<String>) {
        self.show(message, NotificationKind::Success);
    }

    pub fn error(&self, message: impl Into<String>) {
        self.show(message, NotificationKind::Error);
    }

    pub fn current(&self) -> Option<Notification> {
        self.inner.sender.borrow().clone()
    }

    /// Dismiss the current notification, if any.
    pub fn clear(&self) {
        let mut generation = self.inner.generation.lock();
        *generation += 1;
        self.inner.sender.send_replace(None);
    }

    /// Receive every change to the visible notification.
    pub fn subscribe(&self) -> watch::Receiver<Option<Notification>> {
        self.inner.sender.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::{Notification, NotificationKind, Notifier};
    use pretty_assertions::assert_eq;
    use std::time::Duration;

    #[tokio::test]
    async fn newer_message_replaces_older() {
        let notifier = Notifier::new(Duration::from_secs(60));
        notifier.success("A");
        notifier.error("B");
        assert_eq!(
            notifier.current(),
            Some(Notification {
                message: "B".to_string(),
                kind: NotificationKind::Error,
            })
        );
    }

    #[tokio::test]
    async fn message_expires_after_ttl() {
        let notifier = Notifier::new(Duration::from_millis(50));
        assert_eq!(notifier.current(), None);
        notifier.success("saved");
        assert!(notifier.current().is_some());
        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(notifier.current(), None);
    }

    #[tokio::test]
    async fn replacing_resets_the_timer() {
        let notifier = Notifier::new(Duration::from_millis(150));
        notifier.success("A");
        tokio::time::sleep(Duration::from_millis(100)).await;
        notifier.success("B");
        // A's timer fires here but must not clear B.
        tokio::time::sleep(Duration::from_millis(80)).await;
        assert_eq!(
            notifier.current().map(|notification| notification.message),
            Some("B".to_string())
        );
        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(notifier.current(), None);
    }

    #[tokio::test]
    async fn subscribers_observe_changes() {
        let notifier = Notifier::new(Duration::from_secs(60));
        let mut receiver = notifier.subscribe();
        notifier.success("hello");
        receiver.changed().await.expect("changed");
        assert_eq!(
            receiver.borrow().as_ref().map(|n| n.message.clone()),
            Some("hello".to_string())
        );
        notifier.clear();
        receiver.changed().await.expect("changed");
        assert!(receiver.borrow().is_none());
    }
}
