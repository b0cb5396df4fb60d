mod acceptor;
mod error;
mod reader;
#[cfg(test)]
mod testing;
mod writer;

pub use crate::{
    acceptor::{AcceptOutcome, Acceptor, DEFAULT_ACCEPT_TIMEOUT},
    error::TransportError,
    reader::{Reader, ReaderHandle},
    writer::Writer,
};
