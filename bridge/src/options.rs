use std::{
    net::{IpAddr, Ipv4Addr, SocketAddr},
    time::Duration,
};

pub use tether_transport::DEFAULT_ACCEPT_TIMEOUT;

#[derive(Debug, Clone)]
pub struct Options {
    /// Address the GUI process connects back to.
    pub host: IpAddr,
    /// Zero lets the OS pick a free port.
    pub port: u16,
    /// How long to wait for the GUI process to connect.
    pub accept_timeout: Duration,
    /// Upper bound for every object-level synchronous call. `None` waits
    /// until the reply arrives or the bridge stops.
    pub call_timeout: Option<Duration>,
}

impl Options {
    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

impl Default for Options {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: 0,
            accept_timeout: DEFAULT_ACCEPT_TIMEOUT,
            call_timeout: None,
        }
    }
}
