use std::{
    collections::HashMap,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use tether_core::{Event, GlobalShortcutsPayload, names::global_shortcuts};
use tether_dispatch::{Listenable, Listener, ListenerId, Retain};

use crate::{BridgeError, object::Object};

type Callback = Arc<dyn Fn() + Send + Sync>;

#[derive(Default)]
struct Callbacks(Mutex<HashMap<String, Callback>>);

impl Callbacks {
    fn lock(&self) -> MutexGuard<'_, HashMap<String, Callback>> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn run(&self, accelerator: &str) {
        let callback = self.lock().get(accelerator).cloned();
        match callback {
            Some(callback) => callback(),
            None => tracing::debug!("no callback for shortcut {accelerator}"),
        }
    }
}

/// Keyboard shortcuts registered with the OS through the GUI process.
///
/// Callbacks run on the dispatcher loop when the shortcut is triggered, so
/// they must return quickly.
pub struct GlobalShortcuts {
    object: Object,
    callbacks: Arc<Callbacks>,
}

impl GlobalShortcuts {
    pub(crate) fn new(object: Object) -> Self {
        let callbacks = Arc::new(Callbacks::default());

        let triggered = callbacks.clone();
        object.on(global_shortcuts::EVENT_TRIGGERED, move |event| {
            match &event.global_shortcuts {
                Some(payload) => triggered.run(&payload.accelerator),
                None => tracing::warn!("{} without an accelerator", event.name),
            }
            Retain::Keep
        });

        Self { object, callbacks }
    }

    pub fn object(&self) -> &Object {
        &self.object
    }

    fn command(&self, name: &str, accelerator: &str) -> Event {
        let mut event = self.object.event(name);
        event.global_shortcuts = Some(GlobalShortcutsPayload::new(accelerator));
        event
    }

    /// Register `accelerator`. The callback is kept only if the GUI process
    /// reports the shortcut as registered; a new registration replaces the
    /// previous callback.
    pub async fn register<F>(&self, accelerator: &str, callback: F) -> Result<bool, BridgeError>
    where
        F: Fn() + Send + Sync + 'static,
    {
        let reply = self
            .object
            .call(
                self.command(global_shortcuts::CMD_REGISTER, accelerator),
                global_shortcuts::EVENT_REGISTERED,
            )
            .await?;

        let registered = is_registered(&reply);
        if registered {
            self.callbacks
                .lock()
                .insert(accelerator.to_owned(), Arc::new(callback));
        }
        Ok(registered)
    }

    pub async fn is_registered(&self, accelerator: &str) -> Result<bool, BridgeError> {
        let reply = self
            .object
            .call(
                self.command(global_shortcuts::CMD_IS_REGISTERED, accelerator),
                global_shortcuts::EVENT_IS_REGISTERED,
            )
            .await?;
        Ok(is_registered(&reply))
    }

    /// The stale callback is left in place: the shortcut no longer fires and
    /// registering it again replaces it.
    pub async fn unregister(&self, accelerator: &str) -> Result<(), BridgeError> {
        self.object
            .call(
                self.command(global_shortcuts::CMD_UNREGISTER, accelerator),
                global_shortcuts::EVENT_UNREGISTERED,
            )
            .await?;
        Ok(())
    }

    pub async fn unregister_all(&self) -> Result<(), BridgeError> {
        self.object
            .call(
                self.object.event(global_shortcuts::CMD_UNREGISTER_ALL),
                global_shortcuts::EVENT_UNREGISTERED_ALL,
            )
            .await?;
        self.callbacks.lock().clear();
        Ok(())
    }
}

fn is_registered(reply: &Event) -> bool {
    reply
        .global_shortcuts
        .as_ref()
        .is_some_and(|payload| payload.is_registered)
}

impl Listenable for GlobalShortcuts {
    fn on_listener(&self, event_name: &str, listener: Listener) -> ListenerId {
        self.object.on_listener(event_name, listener)
    }

    fn off(&self, event_name: &str, id: ListenerId) -> bool {
        self.object.off(event_name, id)
    }
}
