// src/events/sync.rs
//
// Cross-session sync notifier.
//
// Sessions sharing one durable store tell each other which slice of it
// changed. Payloads are topic-only; receivers reload from storage.
// A session never receives its own notifications.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

const SYNC_CHANNEL_CAPACITY: usize = 64;

/// Slice of shared storage that changed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SyncTopic {
    PlaylistsChanged,
    TracksChanged,
    ArtistDataChanged,
    SettingsChanged,
}

#[derive(Debug, Clone)]
struct SyncMessage {
    origin: Uuid,
    topic: SyncTopic,
}

/// The shared channel every session of a deployment attaches to
#[derive(Clone)]
pub struct SyncHub {
    sender: broadcast::Sender<SyncMessage>,
}

impl SyncHub {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(SYNC_CHANNEL_CAPACITY);
        Self { sender }
    }

    /// A new session identity on this hub
    pub fn attach(&self) -> SyncHandle {
        SyncHandle {
            origin: Uuid::new_v4(),
            sender: self.sender.clone(),
        }
    }
}

impl Default for SyncHub {
    fn default() -> Self {
        Self::new()
    }
}

/// One session's view of the hub
#[derive(Clone)]
pub struct SyncHandle {
    origin: Uuid,
    sender: broadcast::Sender<SyncMessage>,
}

impl SyncHandle {
    pub fn origin(&self) -> Uuid {
        self.origin
    }

    /// Notify the other sessions. Returns how many receivers were reached.
    pub fn publish(&self, topic: SyncTopic) -> usize {
        let message = SyncMessage {
            origin: self.origin,
            topic,
        };
        match self.sender.send(message) {
            Ok(n) => n,
            Err(_) => {
                log::debug!("No sync receivers for {:?}", topic);
                0
            }
        }
    }

    pub fn subscribe(&self) -> SyncSubscription {
        SyncSubscription {
            origin: self.origin,
            receiver: self.sender.subscribe(),
        }
    }
}

pub struct SyncSubscription {
    origin: Uuid,
    receiver: broadcast::Receiver<SyncMessage>,
}

impl SyncSubscription {
    /// Next topic from another session; `None` once the hub is gone
    pub async fn recv(&mut self) -> Option<SyncTopic> {
        loop {
            match self.receiver.recv().await {
                Ok(msg) if msg.origin == self.origin => continue,
                Ok(msg) => return Some(msg.topic),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    log::warn!("Sync receiver lagged, {} notifications dropped", skipped);
                    continue;
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    /// Non-blocking variant of [`recv`](Self::recv)
    pub fn try_recv(&mut self) -> Option<SyncTopic> {
        loop {
            match self.receiver.try_recv() {
                Ok(msg) if msg.origin == self.origin => continue,
                Ok(msg) => return Some(msg.topic),
                Err(broadcast::error::TryRecvError::Lagged(skipped)) => {
                    log::warn!("Sync receiver lagged, {} notifications dropped", skipped);
                    continue;
                }
                Err(_) => return None,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_own_notifications_are_skipped() {
        let hub = SyncHub::new();
        let a = hub.attach();
        let b = hub.attach();
        let mut a_rx = a.subscribe();
        let mut b_rx = b.subscribe();

        a.publish(SyncTopic::ArtistDataChanged);

        assert_eq!(a_rx.try_recv(), None);
        assert_eq!(b_rx.try_recv(), Some(SyncTopic::ArtistDataChanged));
        assert_eq!(b_rx.try_recv(), None);
    }

    #[test]
    fn test_publish_without_receivers() {
        let hub = SyncHub::new();
        assert_eq!(hub.attach().publish(SyncTopic::TracksChanged), 0);
    }

    #[tokio::test]
    async fn test_async_receive() {
        let hub = SyncHub::new();
        let a = hub.attach();
        let b = hub.attach();
        let mut b_rx = b.subscribe();

        a.publish(SyncTopic::TracksChanged);
        b.publish(SyncTopic::SettingsChanged);
        a.publish(SyncTopic::PlaylistsChanged);

        assert_eq!(b_rx.recv().await, Some(SyncTopic::TracksChanged));
        assert_eq!(b_rx.recv().await, Some(SyncTopic::PlaylistsChanged));
    }
}
