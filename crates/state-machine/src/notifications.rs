use async_broadcast::{InactiveReceiver, Receiver, Sender, TrySendError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    Info,
    Error,
}

/// Transient, user-facing message about the outcome of a command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub level: NotificationLevel,
    pub message: String,
}

/// Broadcast channel of [`Notification`]s
///
/// The channel overflows instead of blocking: when nobody reads, the oldest
/// notification is dropped.
#[derive(Debug, Clone)]
pub struct Notifier {
    sender: Sender<Notification>,
    receiver: InactiveReceiver<Notification>,
}

impl Notifier {
    pub fn new(capacity: usize) -> Self {
        let (mut sender, receiver) = async_broadcast::broadcast(capacity.max(1));
        sender.set_overflow(true);
        Self {
            sender,
            receiver: receiver.deactivate(),
        }
    }

    pub fn subscribe(&self) -> Receiver<Notification> {
        self.receiver.activate_cloned()
    }

    pub fn info(&self, message: impl Into<String>) {
        self.publish(NotificationLevel::Info, message.into());
    }

    pub fn error(&self, message: impl Into<String>) {
        self.publish(NotificationLevel::Error, message.into());
    }

    fn publish(&self, level: NotificationLevel, message: String) {
        match self.sender.try_broadcast(Notification { level, message }) {
            Ok(None) => {}
            Ok(Some(dropped)) => {
                tracing::debug!(message = %dropped.message, "Notification buffer full, dropped oldest");
            }
            Err(TrySendError::Inactive(notification)) => {
                tracing::trace!(message = %notification.message, "No notification listeners");
            }
            Err(e) => tracing::warn!(error = %e, "Failed to publish notification"),
        }
    }
}
