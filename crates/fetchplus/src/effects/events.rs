//! Lifecycle notifications for fetch attempts.
//!
//! Two ways to observe a [`Client`](crate::Client): synchronous listeners
//! registered per [`EventKind`], or a channel from [`EventBus::subscribe`]
//! that receives every event.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::mpsc;

use crate::data::{EventKind, FetchEvent};

type Listener = Arc<dyn Fn(&FetchEvent) + Send + Sync>;

/// Handle returned by [`EventBus::on`], used to unregister.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(u64);

struct Registration {
    /// `None` receives every kind.
    kind: Option<EventKind>,
    listener: Listener,
}

#[derive(Default)]
struct Registry {
    next_id: u64,
    listeners: BTreeMap<ListenerId, Registration>,
    channels: Vec<mpsc::UnboundedSender<FetchEvent>>,
}

/// Publish/subscribe hub for [`FetchEvent`]s. Clones share listeners.
#[derive(Clone, Default)]
pub struct EventBus {
    registry: Arc<Mutex<Registry>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Call `listener` for every event of `kind`.
    pub fn on<F>(&self, kind: EventKind, listener: F) -> ListenerId
    where
        F: Fn(&FetchEvent) + Send + Sync + 'static,
    {
        self.register(Some(kind), Arc::new(listener))
    }

    /// Call `listener` for every event.
    pub fn on_any<F>(&self, listener: F) -> ListenerId
    where
        F: Fn(&FetchEvent) + Send + Sync + 'static,
    {
        self.register(None, Arc::new(listener))
    }

    /// Unregister a listener. Returns `false` if it was already gone.
    pub fn off(&self, id: ListenerId) -> bool {
        self.lock().listeners.remove(&id).is_some()
    }

    /// Receive every event published after this call.
    ///
    /// Dropping the receiver unsubscribes.
    pub fn subscribe(&self) -> mpsc::UnboundedReceiver<FetchEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.lock().channels.push(tx);
        rx
    }

    /// Number of listeners that would receive an event of `kind`,
    /// including `on_any` listeners but not channel subscribers.
    pub fn listener_count(&self, kind: EventKind) -> usize {
        self.lock()
            .listeners
            .values()
            .filter(|r| r.kind.is_none_or(|k| k == kind))
            .count()
    }

    /// Deliver `event` to every matching listener, in registration order.
    ///
    /// Listeners run outside the registry lock, so they may call `on` or
    /// `off` themselves. A listener registered during emission first sees
    /// the next event.
    pub fn emit(&self, event: &FetchEvent) {
        let kind = event.kind();
        let listeners: Vec<Listener> = {
            let mut registry = self.lock();
            registry.channels.retain(|tx| tx.send(event.clone()).is_ok());
            registry
                .listeners
                .values()
                .filter(|r| r.kind.is_none_or(|k| k == kind))
                .map(|r| Arc::clone(&r.listener))
                .collect()
        };

        for listener in listeners {
            listener(event);
        }
    }

    fn register(&self, kind: Option<EventKind>, listener: Listener) -> ListenerId {
        let mut registry = self.lock();
        let id = ListenerId(registry.next_id);
        registry.next_id += 1;
        registry.listeners.insert(id, Registration { kind, listener });
        id
    }

    // A panicking listener runs outside the lock, so poisoning only means
    // another thread panicked mid-update of plain collections.
    fn lock(&self) -> MutexGuard<'_, Registry> {
        self.registry.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let registry = self.lock();
        f.debug_struct("EventBus")
            .field("listeners", &registry.listeners.len())
            .field("channels", &registry.channels.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use super::*;
    use crate::data::{ErrorEvent, RequestEvent};

    fn request_event(attempt: u32) -> FetchEvent {
        FetchEvent::Request(RequestEvent {
            attempt,
            max_attempts: 3,
            method: "GET".into(),
            url: "http://test.com/".into(),
        })
    }

    fn error_event() -> FetchEvent {
        FetchEvent::Error(ErrorEvent {
            attempt: 1,
            max_attempts: 3,
            method: "GET".into(),
            url: "http://test.com/".into(),
            message: "socket hang up".into(),
            response_time: Duration::from_millis(5),
        })
    }

    #[test]
    fn emit_without_listeners_is_fine() {
        let bus = EventBus::new();
        bus.emit(&error_event());
        assert_eq!(bus.listener_count(EventKind::Error), 0);
    }

    #[test]
    fn listeners_only_see_their_kind() {
        let bus = EventBus::new();
        let requests = Arc::new(AtomicUsize::new(0));
        let all = Arc::new(AtomicUsize::new(0));

        let counter = Arc::clone(&requests);
        bus.on(EventKind::Request, move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        let counter = Arc::clone(&all);
        bus.on_any(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        bus.emit(&request_event(1));
        bus.emit(&error_event());

        assert_eq!(requests.load(Ordering::SeqCst), 1);
        assert_eq!(all.load(Ordering::SeqCst), 2);
        assert_eq!(bus.listener_count(EventKind::Request), 2);
        assert_eq!(bus.listener_count(EventKind::Response), 1);
    }

    #[test]
    fn off_unregisters() {
        let bus = EventBus::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let id = bus.on(EventKind::Request, move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        bus.emit(&request_event(1));
        assert!(bus.off(id));
        assert!(!bus.off(id));
        bus.emit(&request_event(2));

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn listener_can_unregister_itself() {
        let bus = EventBus::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let slot: Arc<Mutex<Option<ListenerId>>> = Arc::default();

        let (inner_bus, inner_slot, counter) = (bus.clone(), Arc::clone(&slot), Arc::clone(&calls));
        let id = bus.on_any(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            if let Some(id) = *inner_slot.lock().unwrap() {
                inner_bus.off(id);
            }
        });
        *slot.lock().unwrap() = Some(id);

        bus.emit(&request_event(1));
        bus.emit(&request_event(2));

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn subscribers_receive_events_in_order() {
        let bus = EventBus::new();
        let mut rx = bus.subscribe();

        bus.emit(&request_event(1));
        bus.emit(&error_event());

        assert_eq!(rx.recv().await, Some(request_event(1)));
        assert_eq!(rx.recv().await.map(|e| e.kind()), Some(EventKind::Error));
    }

    #[test]
    fn dropped_subscribers_are_pruned() {
        let bus = EventBus::new();
        drop(bus.subscribe());
        bus.emit(&request_event(1));
        assert_eq!(bus.lock().channels.len(), 0);
    }
}
