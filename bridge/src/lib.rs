use std::{
    net::SocketAddr,
    sync::{
        Arc, OnceLock,
        atomic::{AtomicBool, Ordering},
    },
};

use tether_core::{
    Event, NotificationOptions, ObjectId, Supported,
    names::{self, app},
};
use tether_dispatch::{Dispatcher, Listenable, Listener, ListenerId, Retain};
use tether_transport::{Acceptor, Writer};
use tokio_util::sync::CancellationToken;

pub mod call;
mod display;
mod error;
mod global_shortcuts;
mod notification;
mod object;
mod options;
mod protocol;
mod session;
#[cfg(test)]
mod testing;

pub use crate::display::{Display, Rectangle, Size};
pub use crate::error::BridgeError;
pub use crate::global_shortcuts::GlobalShortcuts;
pub use crate::notification::Notification;
pub use crate::object::Object;
pub use crate::options::{DEFAULT_ACCEPT_TIMEOUT, Options};
pub use crate::session::Session;
use crate::{display::DisplayPool, object::Link};

/// The Rust side of the bridge to an out-of-process GUI.
///
/// A bridge owns the root scope every remote object derives from, the
/// dispatcher all inbound events go through and the writer all commands
/// go out on. [`Bridge::start`] opens the listening socket; whoever spawns
/// the GUI process hands it the returned address.
pub struct Bridge {
    options: Options,
    link: Link,
    started: AtomicBool,
    local_addr: OnceLock<SocketAddr>,
    ready: Arc<OnceLock<Event>>,
    ready_token: CancellationToken,
    displays: Arc<DisplayPool>,
}

impl Bridge {
    pub fn new(options: Options) -> Self {
        let link = Link::new(options.call_timeout);
        let ready = Arc::new(OnceLock::new());
        let ready_token = CancellationToken::new();
        let displays = Arc::new(DisplayPool::default());

        for name in [app::CMD_STOP, app::CMD_QUIT] {
            let scope = link.scope.clone();
            link.dispatcher.on(ObjectId::app(), name, move |event| {
                tracing::debug!("{} received, stopping", event.name);
                scope.cancel();
                Retain::Keep
            });
        }

        {
            let ready = ready.clone();
            let ready_token = ready_token.clone();
            let displays = displays.clone();
            link.dispatcher
                .on(ObjectId::app(), app::EVENT_READY, move |event| {
                    tracing::info!("GUI process is ready");
                    if let Some(reported) = &event.displays {
                        displays.update(reported);
                    }
                    let _ = ready.set(event.clone());
                    ready_token.cancel();
                    Retain::Remove
                });
        }

        for name in [
            names::display::EVENT_ADDED,
            names::display::EVENT_METRICS_CHANGED,
            names::display::EVENT_REMOVED,
        ] {
            let displays = displays.clone();
            link.dispatcher.on(ObjectId::app(), name, move |event| {
                match &event.displays {
                    Some(reported) => displays.update(reported),
                    None => tracing::warn!("{} without displays", event.name),
                }
                Retain::Keep
            });
        }

        Self {
            options,
            link,
            started: AtomicBool::new(false),
            local_addr: OnceLock::new(),
            ready,
            ready_token,
            displays,
        }
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.link.dispatcher
    }

    pub fn writer(&self) -> &Writer {
        &self.link.writer
    }

    /// The root scope. Cancelled when the bridge stops.
    pub fn scope(&self) -> &CancellationToken {
        &self.link.scope
    }

    /// Start the dispatcher loop and listen for the GUI process.
    ///
    /// Returns the address it has to connect to. A bridge starts at most
    /// once; a start that failed to listen may be retried.
    pub async fn start(&self) -> Result<SocketAddr, BridgeError> {
        if self.is_stopped() {
            return Err(BridgeError::Stopped);
        }
        if self.started.swap(true, Ordering::SeqCst) {
            return Err(BridgeError::AlreadyStarted);
        }

        let (acceptor, local_addr) = match self.listen().await {
            Ok(listening) => listening,
            Err(error) => {
                self.started.store(false, Ordering::SeqCst);
                return Err(error);
            }
        };
        let _ = self.local_addr.set(local_addr);
        tracing::info!("listening on {local_addr}");

        self.link.dispatcher.start();

        let dispatcher = self.link.dispatcher.clone();
        let writer = self.link.writer.clone();
        let scope = self.link.scope.clone();
        tokio::spawn(async move {
            let outcome = acceptor.run(dispatcher, writer, scope).await;
            tracing::debug!("acceptor finished: {outcome:?}");
        });

        Ok(local_addr)
    }

    async fn listen(&self) -> Result<(Acceptor, SocketAddr), BridgeError> {
        let addr = self.options.bind_addr();
        let listen_error = move |source| BridgeError::Listen { addr, source };
        let acceptor = Acceptor::bind(addr, self.options.accept_timeout)
            .await
            .map_err(listen_error)?;
        let local_addr = acceptor.local_addr().map_err(listen_error)?;
        Ok((acceptor, local_addr))
    }

    /// The listening address, once started.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.local_addr.get().copied()
    }

    /// Wait for `app.event.ready` and return what the GUI process reported
    /// as supported.
    pub async fn wait_ready(&self) -> Result<Supported, BridgeError> {
        tokio::select! {
            biased;
            _ = self.ready_token.cancelled() => Ok(self.supported().unwrap_or_default()),
            _ = self.link.scope.cancelled() => Err(BridgeError::Stopped),
        }
    }

    pub fn is_ready(&self) -> bool {
        self.ready_token.is_cancelled()
    }

    /// Features from the ready event, if it has arrived and carried any.
    pub fn supported(&self) -> Option<Supported> {
        self.ready.get().and_then(|event| event.supported.clone())
    }

    /// Displays as last reported by the GUI process.
    pub fn displays(&self) -> Vec<Display> {
        self.displays.all()
    }

    pub fn primary_display(&self) -> Option<Display> {
        self.displays.primary()
    }

    /// Cancel the root scope. Every object and pending call ends with it.
    pub fn stop(&self) {
        if !self.link.scope.is_cancelled() {
            tracing::debug!("stopping bridge");
        }
        self.link.scope.cancel();
    }

    pub fn is_stopped(&self) -> bool {
        self.link.scope.is_cancelled()
    }

    /// Resolves once the bridge has stopped.
    pub async fn wait(&self) {
        self.link.scope.cancelled().await;
    }

    /// Stop, then close the dispatcher and the connection.
    pub async fn close(&self) {
        tracing::debug!("closing bridge");
        self.stop();
        self.link.dispatcher.close();
        if let Err(error) = self.link.writer.close().await {
            tracing::warn!("failed to close connection: {error}");
        }
    }

    /// Ask the GUI process to quit.
    pub async fn quit(&self) -> Result<(), BridgeError> {
        if self.is_stopped() {
            return Err(BridgeError::Stopped);
        }

        self.link
            .writer
            .write(&Event::new(app::CMD_QUIT))
            .await
            .map_err(|source| BridgeError::Write {
                name: app::CMD_QUIT.to_owned(),
                source,
            })
    }

    /// A bare remote object with a fresh id.
    pub fn new_object(&self) -> Object {
        Object::new(&self.link)
    }

    /// A remote object that is destroyed when the GUI process reports
    /// `destroyed_event` for it.
    pub fn new_object_with_destroy_event(&self, destroyed_event: &str) -> Object {
        Object::with_destroy_event(&self.link, destroyed_event)
    }

    pub fn new_session(&self) -> Session {
        Session::new(self.new_object())
    }

    pub fn new_global_shortcuts(&self) -> GlobalShortcuts {
        GlobalShortcuts::new(self.new_object())
    }

    /// A notification, live only if the ready event reported notifications
    /// as supported.
    pub fn new_notification(&self, options: NotificationOptions) -> Notification {
        let supported = self
            .supported()
            .and_then(|supported| supported.notification)
            .unwrap_or(false);
        Notification::new(self.new_object(), options, supported)
    }
}

impl Default for Bridge {
    fn default() -> Self {
        Self::new(Options::default())
    }
}

/// Listens on process-scoped events.
impl Listenable for Bridge {
    fn on_listener(&self, event_name: &str, listener: Listener) -> ListenerId {
        self.link
            .dispatcher
            .add_listener(ObjectId::app(), event_name, listener)
    }

    fn off(&self, event_name: &str, id: ListenerId) -> bool {
        self.link
            .dispatcher
            .remove_listener(&ObjectId::app(), event_name, id)
    }
}
