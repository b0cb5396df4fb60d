use std::sync::Arc;

use tether_core::Event;
use tokio::{
    io::{AsyncWrite, AsyncWriteExt},
    sync::Mutex,
};
use tokio_util::sync::CancellationToken;

use crate::TransportError;

type Transport = Box<dyn AsyncWrite + Send + Unpin>;

#[derive(Default)]
enum State {
    #[default]
    Detached,
    Attached(Transport),
    Closed,
}

/// Sends events to the GUI process as newline-delimited JSON.
///
/// A writer can be created before the connection exists and attached once it
/// is accepted, so remote objects can hold it for their whole lifetime.
#[derive(Clone, Default)]
pub struct Writer {
    state: Arc<Mutex<State>>,
    closed: CancellationToken,
}

impl Writer {
    pub fn new(transport: impl AsyncWrite + Send + Unpin + 'static) -> Self {
        Self {
            state: Arc::new(Mutex::new(State::Attached(Box::new(transport)))),
            closed: CancellationToken::new(),
        }
    }

    pub fn detached() -> Self {
        Self::default()
    }

    pub async fn attach(
        &self,
        transport: impl AsyncWrite + Send + Unpin + 'static,
    ) -> Result<(), TransportError> {
        if self.is_closed() {
            return Err(TransportError::Closed);
        }

        let mut state = self.state.lock().await;
        match *state {
            State::Attached(_) => return Err(TransportError::AlreadyConnected),
            State::Closed => return Err(TransportError::Closed),
            State::Detached => {}
        }

        *state = State::Attached(Box::new(transport));
        Ok(())
    }

    /// Write one event as a single line. Concurrent writes are serialized so
    /// lines never interleave.
    ///
    /// A write stuck on a peer that stopped reading gives up with
    /// [`TransportError::Closed`] as soon as [`Writer::close`] is called.
    pub async fn write(&self, event: &Event) -> Result<(), TransportError> {
        let mut line = serde_json::to_vec(event).map_err(|source| TransportError::Encode {
            name: event.name.clone(),
            source,
        })?;
        line.push(b'\n');

        let mut state = tokio::select! {
            biased;
            _ = self.closed.cancelled() => return Err(TransportError::Closed),
            state = self.state.lock() => state,
        };
        let transport = match &mut *state {
            State::Attached(transport) => transport,
            State::Detached => return Err(TransportError::NotConnected),
            State::Closed => return Err(TransportError::Closed),
        };

        tracing::debug!("sending {}", String::from_utf8_lossy(&line).trim_end());
        tokio::select! {
            biased;
            _ = self.closed.cancelled() => {
                tracing::debug!("writer closed while sending {}", event.name);
                Err(TransportError::Closed)
            }
            written = send_line(transport, &line) => written,
        }
    }

    /// Shut the transport down. Later writes fail with
    /// [`TransportError::Closed`], and so does a write blocked right now.
    pub async fn close(&self) -> Result<(), TransportError> {
        self.closed.cancel();

        let previous = std::mem::replace(&mut *self.state.lock().await, State::Closed);
        if let State::Attached(mut transport) = previous {
            transport.shutdown().await?;
        }
        Ok(())
    }

    pub fn is_closed(&self) -> bool {
        self.closed.is_cancelled()
    }
}

async fn send_line(transport: &mut Transport, line: &[u8]) -> Result<(), TransportError> {
    transport.write_all(line).await?;
    transport.flush().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use tether_core::ObjectId;
    use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader, duplex};

    use super::*;

    #[tokio::test]
    async fn test_write_line() {
        let (host, mut peer) = duplex(1024);
        let writer = Writer::new(host);

        writer
            .write(&Event::for_target("test", ObjectId::from("target_id")))
            .await
            .unwrap();
        writer.close().await.unwrap();

        let mut received = String::new();
        peer.read_to_string(&mut received).await.unwrap();
        assert_eq!(received, "{\"name\":\"test\",\"targetID\":\"target_id\"}\n");
    }

    #[tokio::test]
    async fn test_write_before_attach() {
        let writer = Writer::detached();
        let result = writer.write(&Event::new("early")).await;
        assert!(matches!(result, Err(TransportError::NotConnected)));

        let (host, _peer) = duplex(64);
        writer.attach(host).await.unwrap();
        writer.write(&Event::new("late")).await.unwrap();

        let (again, _peer) = duplex(64);
        assert!(matches!(
            writer.attach(again).await,
            Err(TransportError::AlreadyConnected)
        ));
    }

    #[tokio::test]
    async fn test_write_after_close() {
        let (host, _peer) = duplex(64);
        let writer = Writer::new(host);
        writer.close().await.unwrap();
        writer.close().await.unwrap();
        assert!(writer.is_closed());

        let result = writer.write(&Event::new("gone")).await;
        assert!(matches!(result, Err(TransportError::Closed)));

        let (host, _peer) = duplex(64);
        assert!(matches!(writer.attach(host).await, Err(TransportError::Closed)));
    }

    #[tokio::test]
    async fn test_close_while_write_is_blocked() {
        // the peer never reads, so the write fills the pipe and waits
        let (host, _peer) = duplex(16);
        let writer = Writer::new(host);

        let blocked = tokio::spawn({
            let writer = writer.clone();
            async move {
                let event = Event::new("big").with_message("x".repeat(4096)).unwrap();
                writer.write(&event).await
            }
        });
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!blocked.is_finished());

        tokio::time::timeout(Duration::from_secs(2), writer.close())
            .await
            .expect("close waited for the blocked write")
            .unwrap();
        assert!(matches!(blocked.await.unwrap(), Err(TransportError::Closed)));
        assert!(matches!(
            writer.write(&Event::new("after")).await,
            Err(TransportError::Closed)
        ));
    }

    #[tokio::test]
    async fn test_write_to_dropped_peer() {
        let (host, peer) = duplex(64);
        drop(peer);
        let writer = Writer::new(host);

        let result = writer.write(&Event::new("orphan")).await;
        assert!(matches!(result, Err(TransportError::Io(_))));
    }

    #[tokio::test]
    async fn test_concurrent_writes_do_not_interleave() {
        let (host, peer) = duplex(256);
        let writer = Writer::new(host);

        let tasks: Vec<_> = (0..32)
            .map(|i| {
                let writer = writer.clone();
                tokio::spawn(async move {
                    let event = Event::for_target(format!("event.{i}"), ObjectId::from("1"))
                        .with_message("x".repeat(100))
                        .unwrap();
                    writer.write(&event).await.unwrap();
                })
            })
            .collect();

        let reading = tokio::spawn(async move {
            let mut lines = BufReader::new(peer).lines();
            let mut received = Vec::new();
            while let Some(line) = lines.next_line().await.unwrap() {
                received.push(serde_json::from_str::<Event>(&line).unwrap());
            }
            received
        });

        for task in tasks {
            task.await.unwrap();
        }
        writer.close().await.unwrap();

        let received = reading.await.unwrap();
        assert_eq!(received.len(), 32);
    }
}
