use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};
use uuid::Uuid;

use picochan_types::events::GatewayEvent;

/// Events a subscriber may have queued before new ones are dropped for it.
pub const SUBSCRIBER_QUEUE_DEPTH: usize = 1024;

/// Registry of live push connections.
///
/// Delivery policy is deliver-or-drop: `publish` offers each event to every
/// sink without waiting. A sink that is full or already closed simply misses
/// the event. The publisher is never blocked and never sees an error.
#[derive(Clone)]
pub struct Dispatcher {
    inner: Arc<DispatcherInner>,
}

struct DispatcherInner {
    /// Per-connection sinks: conn_id -> sender
    sinks: RwLock<HashMap<Uuid, mpsc::Sender<GatewayEvent>>>,

    /// Cancelled once at shutdown; every stream loop watches it
    shutdown: CancellationToken,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(DispatcherInner {
                sinks: RwLock::new(HashMap::new()),
                shutdown: CancellationToken::new(),
            }),
        }
    }

    /// Register a new sink. The returned handle unsubscribes itself on drop.
    pub fn subscribe(&self) -> Subscriber {
        let id = Uuid::new_v4();
        let (tx, rx) = mpsc::channel(SUBSCRIBER_QUEUE_DEPTH);
        self.write_sinks().insert(id, tx);
        debug!("Subscriber {} registered", id);

        Subscriber {
            id,
            rx,
            dispatcher: self.clone(),
        }
    }

    /// Remove a sink. Removing an unknown id is a no-op.
    pub fn unsubscribe(&self, id: Uuid) {
        if self.write_sinks().remove(&id).is_some() {
            debug!("Subscriber {} unregistered", id);
        }
    }

    /// Offer `event` to every registered sink. Returns how many accepted it.
    pub fn publish(&self, event: GatewayEvent) -> usize {
        let sinks = self.read_sinks();
        let mut delivered = 0;
        for (id, tx) in sinks.iter() {
            match tx.try_send(event.clone()) {
                Ok(()) => delivered += 1,
                Err(_) => trace!("Dropped event for subscriber {}", id),
            }
        }
        delivered
    }

    pub fn subscriber_count(&self) -> usize {
        self.read_sinks().len()
    }

    /// End every open stream. Idempotent.
    pub fn shutdown(&self) {
        self.inner.shutdown.cancel();
    }

    pub fn shutdown_token(&self) -> CancellationToken {
        self.inner.shutdown.clone()
    }

    // Every sink-map critical section is a single insert, remove or
    // iteration, so a poisoned lock still guards a valid map.
    fn read_sinks(&self) -> RwLockReadGuard<'_, HashMap<Uuid, mpsc::Sender<GatewayEvent>>> {
        self.inner.sinks.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write_sinks(&self) -> RwLockWriteGuard<'_, HashMap<Uuid, mpsc::Sender<GatewayEvent>>> {
        self.inner.sinks.write().unwrap_or_else(|e| e.into_inner())
    }
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}

/// One live connection's delivery queue.
pub struct Subscriber {
    id: Uuid,
    rx: mpsc::Receiver<GatewayEvent>,
    dispatcher: Dispatcher,
}

impl Subscriber {
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Next queued event, or `None` once the sink has been unregistered and
    /// drained.
    pub async fn recv(&mut self) -> Option<GatewayEvent> {
        self.rx.recv().await
    }

    #[cfg(test)]
    fn try_recv(&mut self) -> Option<GatewayEvent> {
        self.rx.try_recv().ok()
    }
}

impl Drop for Subscriber {
    fn drop(&mut self) {
        self.dispatcher.unsubscribe(self.id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use picochan_types::models::Pixel;

    fn pixel(x: i64) -> GatewayEvent {
        GatewayEvent::Pixel(Pixel::new(x, 0, "#"))
    }

    #[tokio::test]
    async fn publish_reaches_every_subscriber() {
        let dispatcher = Dispatcher::new();
        let mut a = dispatcher.subscribe();
        let mut b = dispatcher.subscribe();

        assert_eq!(dispatcher.publish(pixel(1)), 2);
        assert_eq!(a.recv().await, Some(pixel(1)));
        assert_eq!(b.recv().await, Some(pixel(1)));
    }

    #[tokio::test]
    async fn only_live_events_are_delivered() {
        let dispatcher = Dispatcher::new();
        dispatcher.publish(pixel(1));

        let mut late = dispatcher.subscribe();
        dispatcher.publish(pixel(2));
        assert_eq!(late.recv().await, Some(pixel(2)));
        assert_eq!(late.try_recv(), None);
    }

    #[test]
    fn unsubscribe_is_idempotent() {
        let dispatcher = Dispatcher::new();
        let sub = dispatcher.subscribe();
        let id = sub.id();
        assert_eq!(dispatcher.subscriber_count(), 1);

        dispatcher.unsubscribe(id);
        dispatcher.unsubscribe(id);
        assert_eq!(dispatcher.subscriber_count(), 0);
        assert_eq!(dispatcher.publish(pixel(0)), 0);

        // Drop after explicit unsubscribe is also fine
        drop(sub);
        assert_eq!(dispatcher.subscriber_count(), 0);
    }

    #[test]
    fn dropping_subscriber_detaches_it() {
        let dispatcher = Dispatcher::new();
        let keep = dispatcher.subscribe();
        {
            let _gone = dispatcher.subscribe();
            assert_eq!(dispatcher.subscriber_count(), 2);
        }
        assert_eq!(dispatcher.subscriber_count(), 1);
        assert_eq!(dispatcher.publish(pixel(0)), 1);
        drop(keep);
    }

    #[test]
    fn full_sink_is_skipped_without_blocking() {
        let dispatcher = Dispatcher::new();
        let mut slow = dispatcher.subscribe();
        for i in 0..SUBSCRIBER_QUEUE_DEPTH as i64 {
            assert_eq!(dispatcher.publish(pixel(i)), 1);
        }

        let mut fast = dispatcher.subscribe();
        assert_eq!(dispatcher.publish(pixel(-1)), 1);
        assert_eq!(fast.try_recv(), Some(pixel(-1)));

        // The slow sink kept its backlog and missed the overflow
        assert_eq!(slow.try_recv(), Some(pixel(0)));
    }

    #[test]
    fn shutdown_cancels_token() {
        let dispatcher = Dispatcher::new();
        let token = dispatcher.shutdown_token();
        assert!(!token.is_cancelled());
        dispatcher.shutdown();
        dispatcher.shutdown();
        assert!(token.is_cancelled());
    }
}
