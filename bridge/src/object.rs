use std::{sync::Arc, time::Duration};

use tether_core::{Event, Identifier, ObjectId};
use tether_dispatch::{Dispatcher, Listenable, Listener, ListenerId, Retain};
use tether_transport::Writer;
use tokio_util::sync::CancellationToken;

use crate::{
    BridgeError,
    call::{synchronous_event, with_timeout},
};

/// The pieces of a bridge every remote object shares. None of them are
/// owned by the objects; they outlive all of them.
#[derive(Clone)]
pub(crate) struct Link {
    pub(crate) dispatcher: Dispatcher,
    pub(crate) writer: Writer,
    pub(crate) identifier: Arc<Identifier>,
    pub(crate) scope: CancellationToken,
    pub(crate) call_timeout: Option<Duration>,
}

impl Link {
    pub(crate) fn new(call_timeout: Option<Duration>) -> Self {
        Self {
            dispatcher: Dispatcher::new(),
            writer: Writer::detached(),
            identifier: Arc::new(Identifier::new()),
            scope: CancellationToken::new(),
            call_timeout,
        }
    }
}

/// Base of every remote-controllable entity: a fresh id, a lifetime scope
/// derived from the bridge's, and listener registration scoped to the id.
///
/// Higher-level objects hold one of these and check
/// [`Object::is_actionable`] before sending anything. Dropping it forgets
/// every listener registered under its id.
pub struct Object {
    id: ObjectId,
    scope: CancellationToken,
    link: Link,
}

impl Object {
    pub(crate) fn new(link: &Link) -> Self {
        let id = link.identifier.next_id();
        tracing::debug!("new object {id}");

        Self {
            id,
            scope: link.scope.child_token(),
            link: link.clone(),
        }
    }

    /// Like [`Object::new`], and the object is destroyed as soon as the GUI
    /// process reports `destroyed_event` for it.
    pub(crate) fn with_destroy_event(link: &Link, destroyed_event: &str) -> Self {
        let object = Self::new(link);
        let scope = object.scope.clone();
        let id = object.id.clone();
        object.on(destroyed_event, move |_| {
            tracing::debug!("object {id} destroyed");
            scope.cancel();
            Retain::Remove
        });
        object
    }

    pub fn id(&self) -> &ObjectId {
        &self.id
    }

    pub fn scope(&self) -> &CancellationToken {
        &self.scope
    }

    pub fn writer(&self) -> &Writer {
        &self.link.writer
    }

    pub fn is_destroyed(&self) -> bool {
        self.scope.is_cancelled()
    }

    /// Fails when the bridge has stopped or this object is destroyed.
    pub fn is_actionable(&self) -> Result<(), BridgeError> {
        if self.link.scope.is_cancelled() {
            Err(BridgeError::Stopped)
        } else if self.scope.is_cancelled() {
            Err(BridgeError::Destroyed(self.id.clone()))
        } else {
            Ok(())
        }
    }

    /// Mark the object destroyed without telling the GUI process.
    pub fn destroy_local(&self) {
        self.scope.cancel();
    }

    /// An event addressed to this object.
    pub fn event(&self, name: &str) -> Event {
        Event::for_target(name, self.id.clone())
    }

    /// Send `event` and wait for `done_event` addressed to this object.
    pub async fn call(&self, event: Event, done_event: &str) -> Result<Event, BridgeError> {
        self.is_actionable()?;

        let call = synchronous_event(&self.scope, self, &self.link.writer, &event, done_event);
        with_timeout(self.link.call_timeout, done_event, call).await
    }

    /// Send `event` without waiting for anything.
    pub async fn send(&self, event: Event) -> Result<(), BridgeError> {
        self.is_actionable()?;

        self.link
            .writer
            .write(&event)
            .await
            .map_err(|source| BridgeError::Write {
                name: event.name,
                source,
            })
    }
}

impl Drop for Object {
    fn drop(&mut self) {
        let removed = self.link.dispatcher.remove_target(&self.id);
        if removed > 0 {
            tracing::debug!("object {} dropped with {removed} listener(s)", self.id);
        }
    }
}

impl Listenable for Object {
    fn on_listener(&self, event_name: &str, listener: Listener) -> ListenerId {
        self.link
            .dispatcher
            .add_listener(self.id.clone(), event_name, listener)
    }

    fn off(&self, event_name: &str, id: ListenerId) -> bool {
        self.link.dispatcher.remove_listener(&self.id, event_name, id)
    }
}
