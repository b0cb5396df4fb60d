use std::{io, net::SocketAddr, time::Duration};

use tether_core::ObjectId;
use tether_transport::TransportError;

#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    #[error("bridge is stopped")]
    Stopped,
    #[error("bridge is already started")]
    AlreadyStarted,
    #[error("object {0} is destroyed")]
    Destroyed(ObjectId),
    #[error("cancelled while waiting for {0}")]
    Cancelled(String),
    #[error("timed out after {after:?} waiting for {event}")]
    TimedOut { event: String, after: Duration },
    #[error("failed to send {name}")]
    Write {
        name: String,
        #[source]
        source: TransportError,
    },
    #[error("failed to listen on {addr}")]
    Listen {
        addr: SocketAddr,
        #[source]
        source: io::Error,
    },
}
