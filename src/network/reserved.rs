use std::fmt;
use std::io;
use std::net::SocketAddr;

use tokio::net::TcpListener;
use tokio::net::TcpSocket;

/// A TCP socket bound to a concrete port but not yet listening.
///
/// The port belongs to this process from the moment of binding, while
/// connection attempts are still refused until [`ReservedSocket::into_listener`]
/// turns it into a listener.
pub struct ReservedSocket {
    socket: TcpSocket,
    local_addr: SocketAddr,
}

impl ReservedSocket {
    /// Binds `addr`; port 0 lets the operating system pick one
    pub fn bind(addr: SocketAddr) -> io::Result<Self> {
        let socket = if addr.is_ipv4() {
            TcpSocket::new_v4()?
        } else {
            TcpSocket::new_v6()?
        };
        socket.bind(addr)?;
        let local_addr = socket.local_addr()?;
        Ok(Self { socket, local_addr })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn port(&self) -> u16 {
        self.local_addr.port()
    }

    /// Starts listening on the reserved port. Must run inside a tokio runtime.
    ///
    /// `SO_REUSEADDR` is set first so that, once the listener and its
    /// accepted connections are gone, the port can be bound again even while
    /// closed connections linger in TIME_WAIT.
    pub fn into_listener(
        self,
        backlog: u32,
    ) -> io::Result<TcpListener> {
        self.socket.set_reuseaddr(true)?;
        self.socket.listen(backlog)
    }
}

impl fmt::Debug for ReservedSocket {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.debug_struct("ReservedSocket").field("local_addr", &self.local_addr).finish()
    }
}
