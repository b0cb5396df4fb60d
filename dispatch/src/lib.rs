use std::sync::{
    Arc, Mutex, MutexGuard, PoisonError,
    atomic::{AtomicBool, Ordering},
};

use flume::{Receiver, Sender};
use tether_core::{Event, ObjectId};
use tokio_util::sync::CancellationToken;

mod registry;

use crate::registry::Registry;
pub use crate::registry::{Listener, ListenerId, Retain};

/// Something events can be listened on.
///
/// Implementors scope the registration to their own target id.
pub trait Listenable {
    fn on_listener(&self, event_name: &str, listener: Listener) -> ListenerId;

    fn off(&self, event_name: &str, id: ListenerId) -> bool;

    fn on<F>(&self, event_name: &str, listener: F) -> ListenerId
    where
        F: Fn(&Event) -> Retain + Send + Sync + 'static,
        Self: Sized,
    {
        self.on_listener(event_name, Arc::new(listener))
    }
}

/// Routes events to listeners keyed by `(target id, event name)`.
///
/// Events handed to [`Dispatcher::dispatch`] are queued and delivered one at
/// a time by a single loop, so every listener of every object runs on that
/// loop. Listeners must return quickly and hand long work to another task.
#[derive(Clone)]
pub struct Dispatcher(Arc<DispatcherInner>);

struct DispatcherInner {
    started: AtomicBool,
    inbox: Receiver<Event>,
    inbox_tx: Sender<Event>,
    registry: Mutex<Registry>,
    closed: CancellationToken,
}

impl Dispatcher {
    pub fn new() -> Self {
        let (inbox_tx, inbox) = flume::unbounded();

        Self(Arc::new(DispatcherInner {
            started: AtomicBool::new(false),
            inbox,
            inbox_tx,
            registry: Mutex::new(Registry::default()),
            closed: CancellationToken::new(),
        }))
    }

    fn registry(&self) -> MutexGuard<'_, Registry> {
        self.0
            .registry
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    pub fn add_listener(
        &self,
        target_id: ObjectId,
        event_name: &str,
        listener: Listener,
    ) -> ListenerId {
        self.registry().add(target_id, event_name, listener)
    }

    pub fn on<F>(&self, target_id: ObjectId, event_name: &str, listener: F) -> ListenerId
    where
        F: Fn(&Event) -> Retain + Send + Sync + 'static,
    {
        self.add_listener(target_id, event_name, Arc::new(listener))
    }

    pub fn remove_listener(&self, target_id: &ObjectId, event_name: &str, id: ListenerId) -> bool {
        self.registry().remove(target_id, event_name, id)
    }

    /// Forget every listener of one target, e.g. once the object is gone.
    pub fn remove_target(&self, target_id: &ObjectId) -> usize {
        self.registry().remove_target(target_id)
    }

    pub fn listener_count(&self, target_id: &ObjectId, event_name: &str) -> usize {
        self.registry().count(target_id, event_name)
    }

    /// Queue an event for delivery. Never blocks, so it is safe to call from
    /// inside a listener.
    pub fn dispatch(&self, event: Event) {
        if self.is_closed() {
            tracing::debug!("dispatcher closed, dropping {}", event.name);
            return;
        }

        if let Err(error) = self.0.inbox_tx.send(event) {
            tracing::warn!("failed to queue event {}", error.into_inner().name);
        }
    }

    /// Run every listener registered for the event's pair, in registration
    /// order, and drop the ones that asked to be removed.
    ///
    /// The registry lock is released while listeners run so they can add or
    /// remove listeners themselves. Returns how many listeners ran.
    pub fn deliver(&self, event: &Event) -> usize {
        let listeners = self.registry().snapshot(&event.target_id, &event.name);
        if listeners.is_empty() {
            tracing::trace!("no listener for {} on {:?}", event.name, &*event.target_id);
            return 0;
        }

        let mut finished = Vec::new();
        for (id, listener) in &listeners {
            if listener(event) == Retain::Remove {
                finished.push(*id);
            }
        }

        if !finished.is_empty() {
            let mut registry = self.registry();
            for id in finished {
                registry.remove(&event.target_id, &event.name, id);
            }
        }

        listeners.len()
    }

    /// Spawn the delivery loop on the current runtime. Later calls are no-ops.
    pub fn start(&self) {
        if self.0.started.swap(true, Ordering::SeqCst) {
            return;
        }

        let dispatcher = self.clone();
        tokio::spawn(async move { dispatcher.run().await });
    }

    /// The delivery loop. Returns once [`Dispatcher::close`] is called.
    pub async fn run(&self) {
        loop {
            tokio::select! {
                biased;
                _ = self.0.closed.cancelled() => break,
                received = self.0.inbox.recv_async() => match received {
                    Ok(event) => {
                        self.deliver(&event);
                    }
                    Err(_) => break,
                },
            }
        }

        tracing::debug!("dispatcher stopped");
    }

    /// Stop the delivery loop. Calling it again has no effect.
    pub fn close(&self) {
        self.0.closed.cancel();
    }

    pub fn is_closed(&self) -> bool {
        self.0.closed.is_cancelled()
    }
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}
