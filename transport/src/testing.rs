//! Transports that misbehave on purpose.

use std::{
    io,
    pin::Pin,
    task::{Context, Poll},
};

use tokio::io::{AsyncRead, ReadBuf};

/// Fails every read with the given kind.
pub(crate) struct FailingRead(pub(crate) io::ErrorKind);

impl AsyncRead for FailingRead {
    fn poll_read(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        _buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        Poll::Ready(Err(io::Error::new(self.0, "boom")))
    }
}
