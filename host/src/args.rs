use std::{
    fmt,
    net::{IpAddr, Ipv4Addr},
    str::FromStr,
    time::Duration,
};

use clap::Parser;
use tether_bridge::{DEFAULT_ACCEPT_TIMEOUT, Options};

#[derive(Parser)]
#[command(name = "tether", about = "Bridge to an out-of-process GUI", long_about = None)]
pub struct Args {
    /// Address the GUI process connects back to
    ///
    /// Examples:
    ///   --bind 127.0.0.1          Bind to IP, OS-assigned port
    ///   --bind :9000              Bind to localhost on port 9000
    ///   --bind 127.0.0.1:9000     Bind to IP and port
    ///   --bind [::1]:9000         Bind to IPv6 address with port (use brackets)
    ///   (default is localhost with an OS-assigned port)
    #[arg(long, env = "TETHER_BIND", default_value_t = BindAddress::default())]
    pub bind: BindAddress,

    /// How long to wait for the GUI process to connect, e.g. `30s`, `500ms`
    #[arg(long, env = "TETHER_ACCEPT_TIMEOUT", value_parser = parse_duration)]
    pub accept_timeout: Option<Duration>,

    /// Upper bound for every synchronous call, e.g. `5s`; unbounded if unset
    #[arg(long, env = "TETHER_CALL_TIMEOUT", value_parser = parse_duration)]
    pub call_timeout: Option<Duration>,
}

impl Args {
    pub fn options(&self) -> Options {
        Options {
            host: self.bind.ip,
            port: self.bind.port,
            accept_timeout: self.accept_timeout.unwrap_or(DEFAULT_ACCEPT_TIMEOUT),
            call_timeout: self.call_timeout,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BindAddress {
    pub ip: IpAddr,
    /// Zero lets the OS pick.
    pub port: u16,
}

impl Default for BindAddress {
    fn default() -> Self {
        Self {
            ip: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: 0,
        }
    }
}

impl FromStr for BindAddress {
    type Err = anyhow::Error;

    fn from_str(bind: &str) -> Result<Self, Self::Err> {
        if bind == "localhost" {
            return Ok(Self::default());
        }

        // ":port" means localhost
        if let Some(port) = bind.strip_prefix(':') {
            return Ok(Self {
                port: parse_port(port)?,
                ..Self::default()
            });
        }

        // "[::1]" or "[::1]:port"
        if let Some(rest) = bind.strip_prefix('[') {
            let Some((ip, after)) = rest.split_once(']') else {
                anyhow::bail!("unclosed bracket in IPv6 address");
            };
            let ip: IpAddr = ip
                .parse()
                .map_err(|_| anyhow::anyhow!("invalid IPv6 address: {ip}"))?;

            let port = match after {
                "" => 0,
                _ => match after.strip_prefix(':') {
                    Some(port) => parse_port(port)?,
                    None => anyhow::bail!("expected ':' after IPv6 address in brackets"),
                },
            };
            return Ok(Self { ip, port });
        }

        if let Ok(ip) = bind.parse::<IpAddr>() {
            return Ok(Self { ip, port: 0 });
        }

        let Some((ip, port)) = bind.rsplit_once(':') else {
            anyhow::bail!("invalid bind address: {bind}");
        };
        let ip: IpAddr = ip
            .parse()
            .map_err(|_| anyhow::anyhow!("invalid bind address: {bind}"))?;
        Ok(Self {
            ip,
            port: parse_port(port)?,
        })
    }
}

impl fmt::Display for BindAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.ip, self.port) {
            (ip, 0) if ip == IpAddr::V4(Ipv4Addr::LOCALHOST) => write!(f, "localhost"),
            (ip, 0) => write!(f, "{ip}"),
            (ip, port) if ip == IpAddr::V4(Ipv4Addr::LOCALHOST) => write!(f, ":{port}"),
            (IpAddr::V6(ip), port) => write!(f, "[{ip}]:{port}"),
            (ip, port) => write!(f, "{ip}:{port}"),
        }
    }
}

fn parse_port(port: &str) -> anyhow::Result<u16> {
    port.parse()
        .map_err(|_| anyhow::anyhow!("invalid port number: {port}"))
}

/// Accepts `<n>ms`, `<n>s`, `<n>m` or a bare number of seconds.
fn parse_duration(value: &str) -> anyhow::Result<Duration> {
    let value = value.trim();
    let (number, unit) = match value.find(|c: char| !c.is_ascii_digit()) {
        Some(split) => value.split_at(split),
        None => (value, "s"),
    };
    let number: u64 = number
        .parse()
        .map_err(|_| anyhow::anyhow!("invalid duration: {value}"))?;

    match unit {
        "ms" => Ok(Duration::from_millis(number)),
        "s" => Ok(Duration::from_secs(number)),
        "m" => Ok(Duration::from_secs(number * 60)),
        _ => anyhow::bail!("unknown duration unit in {value}, expected ms, s or m"),
    }
}
