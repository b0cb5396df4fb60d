use std::{io, net::SocketAddr, time::Duration};

use tether_core::{Event, names::app};
use tether_dispatch::Dispatcher;
use tokio::{
    io::AsyncRead,
    net::{TcpListener, TcpStream},
};
use tokio_util::sync::CancellationToken;

use crate::{Reader, Writer};

pub const DEFAULT_ACCEPT_TIMEOUT: Duration = Duration::from_secs(30);

/// How an [`Acceptor`] finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcceptOutcome {
    /// The scope was cancelled; nothing went wrong.
    Shutdown,
    /// Nobody connected before the deadline.
    NoAccept,
    /// A second peer connected after the first one.
    TooManyAccept,
    /// The listening socket failed.
    AcceptError,
}

/// Listens for the single connection the GUI process makes back to us.
///
/// The first connection gets a reader and is attached to the writer. A
/// second connection, an accept failure or a missed deadline is fatal: the
/// matching app event is dispatched, followed by `app.cmd.stop`.
pub struct Acceptor {
    listener: TcpListener,
    timeout: Duration,
}

impl Acceptor {
    pub async fn bind(addr: SocketAddr, timeout: Duration) -> io::Result<Self> {
        let listener = TcpListener::bind(addr).await?;
        let timeout = if timeout.is_zero() {
            DEFAULT_ACCEPT_TIMEOUT
        } else {
            timeout
        };

        Ok(Self { listener, timeout })
    }

    /// The address the GUI process has to connect to.
    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Drive the accept policy until it reaches a final state. The listening
    /// socket is closed when this returns.
    pub async fn run(
        self,
        dispatcher: Dispatcher,
        writer: Writer,
        scope: CancellationToken,
    ) -> AcceptOutcome {
        let deadline = tokio::time::sleep(self.timeout);

        let accepted = tokio::select! {
            biased;
            _ = scope.cancelled() => return AcceptOutcome::Shutdown,
            accepted = self.listener.accept() => accepted,
            _ = deadline => {
                tracing::error!(
                    "no connection has been accepted in the past {:?}",
                    self.timeout
                );
                raise(&dispatcher, app::NO_ACCEPT);
                return AcceptOutcome::NoAccept;
            }
        };

        let (stream, peer) = match accepted {
            Ok(accepted) => accepted,
            Err(error) => return accept_failed(&dispatcher, &error),
        };

        tracing::info!("accepted connection from {peer}");
        if !connect(stream, &dispatcher, &writer, &scope).await {
            return AcceptOutcome::Shutdown;
        }

        tokio::select! {
            biased;
            _ = scope.cancelled() => AcceptOutcome::Shutdown,
            accepted = self.listener.accept() => match accepted {
                Ok((stream, peer)) => {
                    tracing::error!("too many connections, rejecting {peer}");
                    drop(stream);
                    raise(&dispatcher, app::TOO_MANY_ACCEPT);
                    AcceptOutcome::TooManyAccept
                }
                Err(error) => accept_failed(&dispatcher, &error),
            },
        }
    }
}

async fn connect(
    stream: TcpStream,
    dispatcher: &Dispatcher,
    writer: &Writer,
    scope: &CancellationToken,
) -> bool {
    let (read_half, write_half) = stream.into_split();

    if let Err(error) = writer.attach(write_half).await {
        tracing::warn!("dropping connection: {error}");
        return false;
    }

    let reader = Reader::new(dispatcher.clone(), read_half).with_scope(scope);
    tokio::spawn(read_connection(reader, dispatcher.clone(), scope.clone()));
    true
}

async fn read_connection<R>(reader: Reader<R>, dispatcher: Dispatcher, scope: CancellationToken)
where
    R: AsyncRead + Unpin,
{
    match reader.read().await {
        Ok(()) if scope.is_cancelled() => {}
        Ok(()) => {
            tracing::info!("peer disconnected");
            raise(&dispatcher, app::CLOSE);
        }
        Err(error) => {
            tracing::error!("failed to read from peer: {error}");
            raise(&dispatcher, app::ERROR_READ);
        }
    }
}

fn accept_failed(dispatcher: &Dispatcher, error: &io::Error) -> AcceptOutcome {
    tracing::error!("failed to accept connection: {error}");
    raise(dispatcher, app::ERROR_ACCEPT);
    AcceptOutcome::AcceptError
}

/// Dispatch a fatal condition and ask the bridge to stop.
fn raise(dispatcher: &Dispatcher, name: &str) {
    dispatcher.dispatch(Event::new(name));
    dispatcher.dispatch(Event::new(app::CMD_STOP));
}

#[cfg(test)]
mod tests {
    use std::net::{Ipv4Addr, SocketAddrV4};

    use tether_core::ObjectId;
    use tether_dispatch::Retain;
    use tokio::{
        io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader},
        sync::mpsc,
        task::JoinHandle,
    };

    use super::*;
    use crate::testing::FailingRead;

    const LOOPBACK: SocketAddr = SocketAddr::V4(SocketAddrV4::new(Ipv4Addr::LOCALHOST, 0));

    struct Harness {
        dispatcher: Dispatcher,
        writer: Writer,
        scope: CancellationToken,
        addr: SocketAddr,
        raised: mpsc::UnboundedReceiver<String>,
        task: JoinHandle<AcceptOutcome>,
    }

    async fn harness(timeout: Duration) -> Harness {
        let dispatcher = Dispatcher::new();
        let (tx, raised) = mpsc::unbounded_channel();
        for name in [
            app::NO_ACCEPT,
            app::TOO_MANY_ACCEPT,
            app::ERROR_ACCEPT,
            app::ERROR_READ,
            app::CLOSE,
            app::CMD_STOP,
        ] {
            let tx = tx.clone();
            dispatcher.on(ObjectId::app(), name, move |event| {
                let _ = tx.send(event.name.clone());
                Retain::Keep
            });
        }
        dispatcher.start();

        let acceptor = Acceptor::bind(LOOPBACK, timeout).await.unwrap();
        let addr = acceptor.local_addr().unwrap();
        let writer = Writer::detached();
        let scope = CancellationToken::new();
        let task = tokio::spawn(acceptor.run(dispatcher.clone(), writer.clone(), scope.clone()));

        Harness {
            dispatcher,
            writer,
            scope,
            addr,
            raised,
            task,
        }
    }

    async fn settle() {
        tokio::time::sleep(Duration::from_millis(50)).await;
    }

    #[tokio::test]
    async fn test_first_connection_is_wired() {
        let mut h = harness(Duration::from_secs(5)).await;
        let (tx, mut received) = mpsc::unbounded_channel();
        h.dispatcher.on(ObjectId::from("1"), "hello", move |event| {
            let _ = tx.send(event.clone());
            Retain::Keep
        });

        let mut peer = TcpStream::connect(h.addr).await.unwrap();
        peer.write_all(b"{\"name\":\"hello\",\"targetID\":\"1\"}\n")
            .await
            .unwrap();
        let event = received.recv().await.unwrap();
        assert_eq!(event.name, "hello");

        // the writer may not be attached yet right after connect returns
        let mut attempts = 0;
        while h.writer.write(&Event::new("welcome")).await.is_err() {
            attempts += 1;
            assert!(attempts < 50, "writer never attached");
            settle().await;
        }
        let mut line = String::new();
        BufReader::new(&mut peer).read_line(&mut line).await.unwrap();
        assert_eq!(line, "{\"name\":\"welcome\"}\n");

        h.scope.cancel();
        assert_eq!(h.task.await.unwrap(), AcceptOutcome::Shutdown);
        settle().await;
        assert!(h.raised.try_recv().is_err());
        h.dispatcher.close();
    }

    #[tokio::test]
    async fn test_second_connection_is_rejected_once() {
        let mut h = harness(Duration::from_secs(5)).await;

        let _first = TcpStream::connect(h.addr).await.unwrap();
        settle().await;
        let mut second = TcpStream::connect(h.addr).await.unwrap();

        assert_eq!(h.task.await.unwrap(), AcceptOutcome::TooManyAccept);
        assert_eq!(h.raised.recv().await.as_deref(), Some(app::TOO_MANY_ACCEPT));
        assert_eq!(h.raised.recv().await.as_deref(), Some(app::CMD_STOP));

        let mut buf = [0u8; 8];
        let read = second.read(&mut buf).await.unwrap_or(0);
        assert_eq!(read, 0, "rejected connection should be closed");

        settle().await;
        assert!(h.raised.try_recv().is_err());
        h.scope.cancel();
        h.dispatcher.close();
    }

    #[tokio::test]
    async fn test_deadline_raises_no_accept_once() {
        let mut h = harness(Duration::from_millis(20)).await;

        assert_eq!(h.task.await.unwrap(), AcceptOutcome::NoAccept);
        assert_eq!(h.raised.recv().await.as_deref(), Some(app::NO_ACCEPT));
        assert_eq!(h.raised.recv().await.as_deref(), Some(app::CMD_STOP));
        settle().await;
        assert!(h.raised.try_recv().is_err());

        // the listening socket is gone
        assert!(TcpStream::connect(h.addr).await.is_err());
        h.dispatcher.close();
    }

    #[tokio::test]
    async fn test_deadline_disarmed_by_connection() {
        let mut h = harness(Duration::from_millis(100)).await;

        let _peer = TcpStream::connect(h.addr).await.unwrap();
        tokio::time::sleep(Duration::from_millis(250)).await;
        assert!(h.raised.try_recv().is_err());
        assert!(!h.task.is_finished());

        h.scope.cancel();
        assert_eq!(h.task.await.unwrap(), AcceptOutcome::Shutdown);
        h.dispatcher.close();
    }

    #[tokio::test]
    async fn test_peer_hangup_raises_close() {
        let mut h = harness(Duration::from_secs(5)).await;

        let peer = TcpStream::connect(h.addr).await.unwrap();
        settle().await;
        drop(peer);

        assert_eq!(h.raised.recv().await.as_deref(), Some(app::CLOSE));
        assert_eq!(h.raised.recv().await.as_deref(), Some(app::CMD_STOP));
        h.scope.cancel();
        h.dispatcher.close();
    }

    fn recorder(dispatcher: &Dispatcher) -> mpsc::UnboundedReceiver<String> {
        let (tx, raised) = mpsc::unbounded_channel();
        for name in [app::ERROR_ACCEPT, app::ERROR_READ, app::CLOSE, app::CMD_STOP] {
            let tx = tx.clone();
            dispatcher.on(ObjectId::app(), name, move |event| {
                let _ = tx.send(event.name.clone());
                Retain::Keep
            });
        }
        raised
    }

    #[tokio::test]
    async fn test_read_error_raises_error_read() {
        let dispatcher = Dispatcher::new();
        let mut raised = recorder(&dispatcher);
        dispatcher.start();

        let scope = CancellationToken::new();
        let reader = Reader::new(dispatcher.clone(), FailingRead(io::ErrorKind::PermissionDenied));
        read_connection(reader, dispatcher.clone(), scope).await;

        assert_eq!(raised.recv().await.as_deref(), Some(app::ERROR_READ));
        assert_eq!(raised.recv().await.as_deref(), Some(app::CMD_STOP));
        settle().await;
        assert!(raised.try_recv().is_err());
        dispatcher.close();
    }

    #[tokio::test]
    async fn test_reset_while_stopping_raises_nothing() {
        let dispatcher = Dispatcher::new();
        let mut raised = recorder(&dispatcher);
        dispatcher.start();

        let scope = CancellationToken::new();
        scope.cancel();
        let reader = Reader::new(dispatcher.clone(), FailingRead(io::ErrorKind::ConnectionReset));
        read_connection(reader, dispatcher.clone(), scope).await;

        settle().await;
        assert!(raised.try_recv().is_err());
        dispatcher.close();
    }

    #[tokio::test]
    async fn test_accept_error_raises_error_accept() {
        let dispatcher = Dispatcher::new();
        let mut raised = recorder(&dispatcher);
        dispatcher.start();

        let error = io::Error::other("too many open files");
        assert_eq!(accept_failed(&dispatcher, &error), AcceptOutcome::AcceptError);

        assert_eq!(raised.recv().await.as_deref(), Some(app::ERROR_ACCEPT));
        assert_eq!(raised.recv().await.as_deref(), Some(app::CMD_STOP));
        settle().await;
        assert!(raised.try_recv().is_err());
        dispatcher.close();
    }

    #[tokio::test]
    async fn test_zero_timeout_uses_default() {
        let acceptor = Acceptor::bind(LOOPBACK, Duration::ZERO).await.unwrap();
        assert_eq!(acceptor.timeout, DEFAULT_ACCEPT_TIMEOUT);
    }
}
