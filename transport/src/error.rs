#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("transport is not connected yet")]
    NotConnected,
    #[error("transport is already connected")]
    AlreadyConnected,
    #[error("transport is closed")]
    Closed,
    #[error("failed to encode event {name}")]
    Encode {
        name: String,
        #[source]
        source: serde_json::Error,
    },
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
