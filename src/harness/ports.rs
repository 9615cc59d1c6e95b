use std::net::SocketAddr;
use std::net::ToSocketAddrs;

use tracing::debug;

use crate::Error;
use crate::ReservedSocket;
use crate::Result;

/// Reserves ephemeral ports ahead of node configuration.
///
/// Every allocation binds a fresh socket on an OS-assigned port and hands
/// back the bound socket itself, never just the number, so the node started
/// later serves on exactly that socket.
#[derive(Debug, Clone)]
pub struct PortAllocator {
    host: String,
}

/// The two sockets one node needs
#[derive(Debug)]
pub struct NodeSockets {
    pub peer: ReservedSocket,
    pub client: ReservedSocket,
}

impl PortAllocator {
    /// `host` may be an IP literal, a bracketed IPv6 literal or a name
    pub fn new(host: impl Into<String>) -> Self {
        Self { host: host.into() }
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    /// Binds one socket on an OS-assigned port
    ///
    /// # Errors
    /// `Error::Bind` if the host cannot be resolved or the bind is refused.
    /// Not retried.
    pub fn allocate(&self) -> Result<(ReservedSocket, u16)> {
        let addr = self.resolve()?;
        let socket = ReservedSocket::bind(addr).map_err(|source| Error::Bind {
            address: addr.to_string(),
            source,
        })?;
        let port = socket.port();
        debug!(host = %self.host, port, "reserved ephemeral port");
        Ok((socket, port))
    }

    /// Peer socket first, then client socket
    pub fn allocate_node(&self) -> Result<NodeSockets> {
        let (peer, _) = self.allocate()?;
        let (client, _) = self.allocate()?;
        Ok(NodeSockets { peer, client })
    }

    fn resolve(&self) -> Result<SocketAddr> {
        let host = self.host.trim_start_matches('[').trim_end_matches(']');
        let bind_error = |source: std::io::Error| Error::Bind {
            address: format!("{}:0", self.host),
            source,
        };

        (host, 0)
            .to_socket_addrs()
            .map_err(bind_error)?
            .next()
            .ok_or_else(|| {
                bind_error(std::io::Error::new(
                    std::io::ErrorKind::AddrNotAvailable,
                    "host resolved to no address",
                ))
            })
    }
}
