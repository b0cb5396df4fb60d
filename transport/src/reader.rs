use std::io;

use tether_core::Event;
use tether_dispatch::Dispatcher;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio_util::sync::CancellationToken;

use crate::TransportError;

/// Reads newline-delimited JSON events from the GUI process and hands them to
/// the dispatcher.
pub struct Reader<R> {
    dispatcher: Dispatcher,
    transport: BufReader<R>,
    closed: CancellationToken,
}

/// Closes a [`Reader`] from another task while it is blocked reading.
#[derive(Clone, Debug)]
pub struct ReaderHandle(CancellationToken);

impl ReaderHandle {
    pub fn close(&self) {
        self.0.cancel();
    }

    pub fn is_closed(&self) -> bool {
        self.0.is_cancelled()
    }
}

impl<R: AsyncRead + Unpin> Reader<R> {
    pub fn new(dispatcher: Dispatcher, transport: R) -> Self {
        Self {
            dispatcher,
            transport: BufReader::new(transport),
            closed: CancellationToken::new(),
        }
    }

    /// Close this reader whenever `scope` is cancelled.
    pub fn with_scope(mut self, scope: &CancellationToken) -> Self {
        self.closed = scope.child_token();
        self
    }

    pub fn handle(&self) -> ReaderHandle {
        ReaderHandle(self.closed.clone())
    }

    /// Read until the peer goes away or the reader is closed; both count as a
    /// normal end. Lines that fail to decode are logged and skipped.
    pub async fn read(mut self) -> Result<(), TransportError> {
        let mut line = Vec::new();

        loop {
            line.clear();

            let read = tokio::select! {
                biased;
                _ = self.closed.cancelled() => {
                    tracing::debug!("reader closed");
                    return Ok(());
                }
                read = self.transport.read_until(b'\n', &mut line) => read,
            };

            match read {
                Ok(0) => {
                    tracing::debug!("peer closed the connection");
                    return Ok(());
                }
                Ok(_) => {}
                Err(error) if is_disconnect(&error) => {
                    tracing::debug!("peer dropped the connection: {error}");
                    return Ok(());
                }
                Err(error) => return Err(error.into()),
            }

            let trimmed = line.trim_ascii();
            if trimmed.is_empty() {
                continue;
            }

            tracing::debug!("received {}", String::from_utf8_lossy(trimmed));

            match serde_json::from_slice::<Event>(trimmed) {
                Ok(event) => self.dispatcher.dispatch(event),
                Err(error) => {
                    tracing::error!(
                        "failed to decode event {}: {error}",
                        String::from_utf8_lossy(trimmed)
                    );
                }
            }
        }
    }
}

fn is_disconnect(error: &io::Error) -> bool {
    matches!(
        error.kind(),
        io::ErrorKind::UnexpectedEof
            | io::ErrorKind::ConnectionReset
            | io::ErrorKind::ConnectionAborted
            | io::ErrorKind::BrokenPipe
    )
}
