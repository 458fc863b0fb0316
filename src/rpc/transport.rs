//! Transport abstraction: one datagram socket shared by every worker.
//!
//! Concrete implementations:
//! - [`UdpTransport`] over a bound `std::net::UdpSocket`
//! - in-memory fakes in the integration tests
//!
//! The workers are generic over `Transport`, so the whole receive →
//! dispatch → pipe path runs in tests without a network.

use std::io;
use std::net::{SocketAddr, UdpSocket};
use std::time::Duration;

use log::info;

use crate::error::TransportError;

/// Largest payload a UDP datagram can carry.
pub const MAX_DATAGRAM: usize = 65_507;

/// Datagram channel.  Both calls take `&self`: the receive worker and the
/// pipe worker use the socket at the same time.
pub trait Transport: Send + Sync {
    /// Error type for this transport.
    type Error: core::fmt::Debug + core::fmt::Display;

    /// Send one datagram.  Returns the number of bytes sent.
    fn send_to(&self, data: &[u8], dest: SocketAddr) -> Result<usize, Self::Error>;

    /// Wait a bounded time for one datagram.  `Ok(None)` means the wait
    /// timed out and the caller should poll its other duties.
    fn recv_from(&self, buf: &mut [u8]) -> Result<Option<(usize, SocketAddr)>, Self::Error>;
}

/// UDP socket bound to the local protocol port.
pub struct UdpTransport {
    socket: UdpSocket,
}

impl UdpTransport {
    /// Bind `0.0.0.0:port` with a receive timeout.
    pub fn bind(port: u16, recv_timeout: Duration) -> Result<Self, TransportError> {
        let socket = UdpSocket::bind(("0.0.0.0", port))
            .map_err(|e| TransportError::Bind(format!("port {port}: {e}")))?;
        socket
            .set_read_timeout(Some(recv_timeout))
            .map_err(|e| TransportError::Bind(e.to_string()))?;
        info!("UDP: bound {}", socket.local_addr().map_or_else(|_| port.to_string(), |a| a.to_string()));
        Ok(Self { socket })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.socket.local_addr()
    }
}

impl Transport for UdpTransport {
    type Error = io::Error;

    fn send_to(&self, data: &[u8], dest: SocketAddr) -> io::Result<usize> {
        self.socket.send_to(data, dest)
    }

    fn recv_from(&self, buf: &mut [u8]) -> io::Result<Option<(usize, SocketAddr)>> {
        match self.socket.recv_from(buf) {
            Ok(got) => Ok(Some(got)),
            Err(e) if matches!(e.kind(), io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut) => {
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loopback_roundtrip_and_timeout() {
        let a = UdpTransport::bind(0, Duration::from_millis(50)).unwrap();
        let b = UdpTransport::bind(0, Duration::from_millis(50)).unwrap();
        let b_addr: SocketAddr = ([127, 0, 0, 1], b.local_addr().unwrap().port()).into();

        let mut buf = [0u8; 16];
        assert!(b.recv_from(&mut buf).unwrap().is_none());

        assert_eq!(a.send_to(b"hello", b_addr).unwrap(), 5);
        let (n, _) = b.recv_from(&mut buf).unwrap().unwrap();
        assert_eq!(&buf[..n], b"hello");
    }
}
