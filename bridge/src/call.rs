//! Request/response on top of fire-and-forget events.
//!
//! A call registers a one-shot listener for the reply, runs its action
//! (usually writing the command) and then waits until the reply arrives or
//! the caller's scope is cancelled. Cancellation also ends a call whose
//! action is still running.

use std::{
    future::{Future, Ready},
    io,
    sync::{Arc, Mutex, PoisonError},
    time::Duration,
};

use tether_core::Event;
use tether_dispatch::{Listenable, ListenerId, Retain};
use tether_transport::{TransportError, Writer};
use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;

use crate::BridgeError;

/// Removes the reply listener when the call ends, however it ends.
struct ListenerGuard<'a, L: Listenable + ?Sized> {
    listenable: &'a L,
    event_name: &'a str,
    id: ListenerId,
}

impl<L: Listenable + ?Sized> Drop for ListenerGuard<'_, L> {
    fn drop(&mut self) {
        self.listenable.off(self.event_name, self.id);
    }
}

/// Run `action` and block until `done_event` is dispatched on `listenable`.
///
/// Returns the reply, or [`BridgeError::Cancelled`] if `scope` is cancelled
/// first. Without an outer cancellation or timeout the wait is unbounded.
pub async fn synchronous_func<L, F>(
    scope: &CancellationToken,
    listenable: &L,
    action: Option<F>,
    done_event: &str,
) -> Result<Event, BridgeError>
where
    L: Listenable + ?Sized,
    F: Future<Output = Result<(), BridgeError>>,
{
    let call = scope.child_token();
    let (reply_tx, mut reply_rx) = oneshot::channel();
    let reply_tx = Mutex::new(Some(reply_tx));

    let listener_scope = call.clone();
    let id = listenable.on_listener(
        done_event,
        Arc::new(move |event: &Event| {
            // whoever cancels first wins; a late reply is dropped
            if listener_scope.is_cancelled() {
                tracing::debug!("dropping late {}", event.name);
                return Retain::Remove;
            }

            if let Some(reply_tx) = reply_tx
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .take()
            {
                let _ = reply_tx.send(event.clone());
            }
            listener_scope.cancel();
            Retain::Remove
        }),
    );
    let _guard = ListenerGuard {
        listenable,
        event_name: done_event,
        id,
    };

    if let Some(action) = action {
        tokio::select! {
            biased;
            _ = call.cancelled() => {}
            done = action => done?,
        }
    }

    call.cancelled().await;
    reply_rx
        .try_recv()
        .map_err(|_| BridgeError::Cancelled(done_event.to_owned()))
}

/// Block until `done_event` is dispatched without sending anything first.
pub async fn wait_for<L>(
    scope: &CancellationToken,
    listenable: &L,
    done_event: &str,
) -> Result<Event, BridgeError>
where
    L: Listenable + ?Sized,
{
    synchronous_func(
        scope,
        listenable,
        None::<Ready<Result<(), BridgeError>>>,
        done_event,
    )
    .await
}

/// Write `event` and block until `done_event` comes back.
///
/// A failed write surfaces as [`BridgeError::Write`], distinct from a
/// cancelled wait. The line is written on its own task, so a call cancelled
/// mid-write never leaves half a line on the wire.
pub async fn synchronous_event<L>(
    scope: &CancellationToken,
    listenable: &L,
    writer: &Writer,
    event: &Event,
    done_event: &str,
) -> Result<Event, BridgeError>
where
    L: Listenable + ?Sized,
{
    let send = async {
        let writer = writer.clone();
        let line = event.clone();
        tokio::spawn(async move { writer.write(&line).await })
            .await
            .unwrap_or_else(|error| Err(TransportError::Io(io::Error::other(error))))
            .map_err(|source| BridgeError::Write {
                name: event.name.clone(),
                source,
            })
    };

    synchronous_func(scope, listenable, Some(send), done_event).await
}

pub(crate) async fn with_timeout<F>(
    timeout: Option<Duration>,
    done_event: &str,
    call: F,
) -> Result<Event, BridgeError>
where
    F: Future<Output = Result<Event, BridgeError>>,
{
    let Some(after) = timeout else {
        return call.await;
    };

    tokio::time::timeout(after, call)
        .await
        .map_err(|_| BridgeError::TimedOut {
            event: done_event.to_owned(),
            after,
        })?
}
