//! Network reachability probing for the first-run wait.

use std::net::{SocketAddr, TcpStream, ToSocketAddrs};
use std::time::Duration;

/// `connect_timeout` rejects a zero timeout.
const MIN_TIMEOUT: Duration = Duration::from_millis(100);

pub trait Connectivity: Send + Sync {
    fn is_online(&self) -> bool;
}

/// Online when a TCP connection to `host:port` succeeds within `timeout`.
#[derive(Debug, Clone)]
pub struct TcpProbe {
    host: String,
    port: u16,
    timeout: Duration,
}

impl TcpProbe {
    pub fn new(host: impl Into<String>, port: u16, timeout: Duration) -> Self {
        Self {
            host: host.into(),
            port,
            timeout: timeout.max(MIN_TIMEOUT),
        }
    }

    fn addrs(&self) -> Vec<SocketAddr> {
        match (self.host.as_str(), self.port).to_socket_addrs() {
            Ok(addrs) => addrs.collect(),
            Err(e) => {
                log::debug!("Probe: Cannot resolve {}: {}", self.host, e);
                Vec::new()
            }
        }
    }
}

impl Connectivity for TcpProbe {
    fn is_online(&self) -> bool {
        self.addrs()
            .iter()
            .any(|addr| TcpStream::connect_timeout(addr, self.timeout).is_ok())
    }
}
