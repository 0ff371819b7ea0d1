//! Typed in-process publish/subscribe channel.
//!
//! Backed by a bounded `tokio::sync::broadcast` channel. Every subscriber that
//! exists when an event is published receives it; subscribers created later
//! only see later events. A subscriber that falls more than `capacity` events
//! behind skips the oldest ones and keeps going.

use tokio::sync::broadcast;

/// Default channel capacity.
pub const DEFAULT_CAPACITY: usize = 256;

/// Publisher side of a notification channel. Cheap to clone.
#[derive(Debug)]
pub struct Bus<E> {
    sender: broadcast::Sender<E>,
}

impl<E> Clone for Bus<E> {
    fn clone(&self) -> Self {
        Self {
            sender: self.sender.clone(),
        }
    }
}

impl<E: Clone> Default for Bus<E> {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl<E: Clone> Bus<E> {
    /// Create a bus holding at most `capacity` undelivered events per subscriber.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Publish an event to every current subscriber.
    ///
    /// Returns the number of subscribers that will see it. Publishing with no
    /// subscribers is not an error.
    pub fn publish(&self, event: E) -> usize {
        self.sender.send(event).unwrap_or(0)
    }

    /// Start receiving events published from now on.
    #[must_use]
    pub fn subscribe(&self) -> Subscription<E> {
        Subscription {
            receiver: self.sender.subscribe(),
            missed: 0,
        }
    }

    /// Number of live subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

/// Receiving side of a [`Bus`].
#[derive(Debug)]
pub struct Subscription<E> {
    receiver: broadcast::Receiver<E>,
    missed: u64,
}

impl<E: Clone> Subscription<E> {
    /// Wait for the next event. Returns `None` once every publisher is gone.
    pub async fn recv(&mut self) -> Option<E> {
        loop {
            match self.receiver.recv().await {
                Ok(event) => return Some(event),
                Err(broadcast::error::RecvError::Lagged(skipped)) => self.missed += skipped,
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    /// Take the next already-published event without waiting.
    pub fn try_recv(&mut self) -> Option<E> {
        loop {
            match self.receiver.try_recv() {
                Ok(event) => return Some(event),
                Err(broadcast::error::TryRecvError::Lagged(skipped)) => self.missed += skipped,
                Err(
                    broadcast::error::TryRecvError::Empty | broadcast::error::TryRecvError::Closed,
                ) => return None,
            }
        }
    }

    /// Events dropped because this subscriber fell behind.
    #[must_use]
    pub const fn missed(&self) -> u64 {
        self.missed
    }

    /// Unwrap into the underlying broadcast receiver (for stream adapters).
    #[must_use]
    pub fn into_receiver(self) -> broadcast::Receiver<E> {
        self.receiver
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_every_subscriber_receives() {
        let bus = Bus::new(8);
        let mut header = bus.subscribe();
        let mut page = bus.subscribe();

        assert_eq!(bus.publish(3u32), 2);
        assert_eq!(header.recv().await, Some(3));
        assert_eq!(page.recv().await, Some(3));
    }

    #[test]
    fn test_publish_without_subscribers() {
        let bus: Bus<u32> = Bus::default();
        assert_eq!(bus.publish(1), 0);
    }

    #[test]
    fn test_late_subscriber_misses_earlier_events() {
        let bus = Bus::new(8);
        bus.publish(1u32);
        let mut late = bus.subscribe();
        assert_eq!(late.try_recv(), None);
        bus.publish(2);
        assert_eq!(late.try_recv(), Some(2));
    }

    #[test]
    fn test_lagging_subscriber_resumes() {
        let bus = Bus::new(2);
        let mut slow = bus.subscribe();
        for n in 0..5u32 {
            bus.publish(n);
        }
        assert_eq!(slow.try_recv(), Some(3));
        assert_eq!(slow.missed(), 3);
        assert_eq!(slow.try_recv(), Some(4));
        assert_eq!(slow.try_recv(), None);
    }

    #[tokio::test]
    async fn test_recv_ends_when_bus_dropped() {
        let bus: Bus<u32> = Bus::new(4);
        let mut sub = bus.subscribe();
        drop(bus);
        assert_eq!(sub.recv().await, None);
    }
}
