//! An in-memory GUI process for tests.

use std::time::Duration;

use tether_core::Event;
use tether_transport::Reader;
use tokio::io::{
    AsyncBufReadExt, AsyncWriteExt, BufReader, DuplexStream, Lines, ReadHalf, WriteHalf, duplex,
    split,
};

use crate::object::Link;

pub(crate) struct Peer {
    lines: Lines<BufReader<ReadHalf<DuplexStream>>>,
    sink: WriteHalf<DuplexStream>,
}

impl Peer {
    pub(crate) async fn send(&mut self, event: &Event) {
        let mut line = serde_json::to_vec(event).unwrap();
        line.push(b'\n');
        self.sink.write_all(&line).await.unwrap();
    }

    pub(crate) async fn recv(&mut self) -> Event {
        let line = self.lines.next_line().await.unwrap().unwrap();
        serde_json::from_str(&line).unwrap()
    }

    /// The next command, if one shows up soon.
    pub(crate) async fn try_recv(&mut self) -> Option<Event> {
        tokio::time::timeout(Duration::from_millis(50), self.recv())
            .await
            .ok()
    }

    /// Answer the next command with `name`, addressed to the same target.
    pub(crate) async fn reply(&mut self, name: &str) -> Event {
        self.reply_with(name, |event| event).await
    }

    pub(crate) async fn reply_with(
        &mut self,
        name: &str,
        fill: impl FnOnce(Event) -> Event,
    ) -> Event {
        let command = self.recv().await;
        let reply = fill(Event::for_target(name, command.target_id.clone()));
        self.send(&reply).await;
        command
    }
}

/// A link whose writer and reader are wired to an in-memory peer.
pub(crate) async fn connected(call_timeout: Option<Duration>) -> (Link, Peer) {
    let link = Link::new(call_timeout);
    let peer = attach(&link).await;
    (link, peer)
}

pub(crate) async fn attach(link: &Link) -> Peer {
    let (host, remote) = duplex(64 * 1024);
    let (host_read, host_write) = split(host);
    let (remote_read, remote_write) = split(remote);

    link.writer.attach(host_write).await.unwrap();
    link.dispatcher.start();
    let reader = Reader::new(link.dispatcher.clone(), host_read).with_scope(&link.scope);
    tokio::spawn(reader.read());

    Peer {
        lines: BufReader::new(remote_read).lines(),
        sink: remote_write,
    }
}
