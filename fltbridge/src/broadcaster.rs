/*!
UDP fan-out.

One send-only socket is shared by every destination. Each sentence is one
datagram, attempted on every destination even when an earlier one fails;
any failure is still reported so the scheduler can stop.
*/

use shared::{BridgeError, Result};
use socket2::{Domain, Protocol, Socket, Type};
use std::fmt;
use std::io;
use std::net::{IpAddr, SocketAddr, ToSocketAddrs, UdpSocket};
use tracing::{error, info, trace};

/// Something that can send a datagram to an address
pub trait Transport {
    fn send_to(&self, buf: &[u8], addr: SocketAddr) -> io::Result<usize>;
}

impl Transport for UdpSocket {
    fn send_to(&self, buf: &[u8], addr: SocketAddr) -> io::Result<usize> {
        UdpSocket::send_to(self, buf, addr)
    }
}

/// A resolved receiver
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Destination {
    /// As written on the command line or in the config file
    pub host: String,
    pub addr: SocketAddr,
}

impl Destination {
    /// Parse `host`, `ip`, `host:port` or `ip:port`. `default_port` applies
    /// when no port is given.
    pub fn parse(spec: &str, default_port: u16) -> Result<Self> {
        let spec = spec.trim();
        if spec.is_empty() {
            return Err(BridgeError::config("empty destination address"));
        }

        let addr = if let Ok(addr) = spec.parse::<SocketAddr>() {
            addr
        } else if let Ok(ip) = spec.parse::<IpAddr>() {
            SocketAddr::new(ip, default_port)
        } else {
            let (host, port) = match spec.rsplit_once(':') {
                Some((host, port)) => {
                    let port = port.parse::<u16>().map_err(|_| {
                        BridgeError::config(format!("invalid port in destination '{}'", spec))
                    })?;
                    (host, port)
                }
                None => (spec, default_port),
            };
            (host, port)
                .to_socket_addrs()
                .map_err(|e| BridgeError::config(format!("cannot resolve destination '{}': {}", spec, e)))?
                .find(SocketAddr::is_ipv4)
                .ok_or_else(|| BridgeError::config(format!("no IPv4 address for destination '{}'", spec)))?
        };

        Ok(Self {
            host: spec.to_string(),
            addr,
        })
    }
}

impl fmt::Display for Destination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.host == self.addr.to_string() {
            write!(f, "{}", self.addr)
        } else {
            write!(f, "{} ({})", self.host, self.addr)
        }
    }
}

/// Create the outbound socket
pub fn bind_socket(bind_addr: &str, enable_broadcast: bool) -> Result<UdpSocket> {
    let ip: IpAddr = bind_addr
        .parse()
        .map_err(|_| BridgeError::config(format!("invalid bind address '{}'", bind_addr)))?;
    let local = SocketAddr::new(ip, 0);

    let socket = Socket::new(Domain::for_address(local), Type::DGRAM, Some(Protocol::UDP))?;
    if enable_broadcast {
        socket.set_broadcast(true)?;
    }
    socket.bind(&local.into())?;

    let socket: UdpSocket = socket.into();
    info!("🔌 UDP socket bound to {}{}", socket.local_addr()?,
          if enable_broadcast { " (broadcast enabled)" } else { "" });
    Ok(socket)
}

/// Sends every sentence to every destination
pub struct Broadcaster<T: Transport = UdpSocket> {
    transport: T,
    destinations: Vec<Destination>,
    datagrams_sent: u64,
    send_errors: u64,
}

impl<T: Transport> Broadcaster<T> {
    /// At least one destination is required
    pub fn new(transport: T, destinations: Vec<Destination>) -> Result<Self> {
        if destinations.is_empty() {
            return Err(BridgeError::config("a destination address is required"));
        }

        Ok(Self {
            transport,
            destinations,
            datagrams_sent: 0,
            send_errors: 0,
        })
    }

    pub fn destinations(&self) -> &[Destination] {
        &self.destinations
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Datagrams delivered to the socket so far
    pub fn datagrams_sent(&self) -> u64 {
        self.datagrams_sent
    }

    pub fn send_errors(&self) -> u64 {
        self.send_errors
    }

    /// Send `sentence` to every destination.
    ///
    /// All destinations are attempted. If any failed, the first failure is
    /// returned.
    pub fn send(&mut self, sentence: &str) -> Result<()> {
        let payload = sentence.as_bytes();
        let mut first_failure: Option<BridgeError> = None;

        for destination in &self.destinations {
            match self.transport.send_to(payload, destination.addr) {
                Ok(_) => {
                    self.datagrams_sent += 1;
                    trace!("→ {} {}", destination.addr, sentence);
                }
                Err(e) => {
                    self.send_errors += 1;
                    error!("❌ Send to {} failed: {}", destination, e);
                    if first_failure.is_none() {
                        first_failure = Some(BridgeError::transport(destination.addr, e));
                    }
                }
            }
        }

        match first_failure {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}
