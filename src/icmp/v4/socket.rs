use crate::probe::Ttl;
use socket2::{Domain, Protocol, Type};
use std::net::IpAddr;
use std::{io, time::Duration};

/// One raw ICMP channel: sends TTL-stamped datagrams and receives whole IP
/// packets, with a bounded blocking receive.
pub trait ProbeSocket: Sized {
    fn open(timeout: Duration) -> io::Result<Self>;
    fn set_ttl(&self, ttl: Ttl) -> io::Result<()>;
    fn send_to(&self, buf: &[u8], addr: &socket2::SockAddr) -> io::Result<usize>;
    /// Blocks up to the timeout given at `open`. `Ok(None)` means the
    /// deadline passed without any datagram arriving.
    fn recv_from(&self, buf: &mut [u8]) -> io::Result<Option<(usize, IpAddr)>>;
}

pub struct RawSocket {
    socket: socket2::Socket,
}

impl ProbeSocket for RawSocket {
    fn open(timeout: Duration) -> io::Result<RawSocket> {
        tracing::trace!("opening raw ICMPv4 socket");
        let socket = socket2::Socket::new(Domain::IPV4, Type::RAW, Some(Protocol::ICMPV4))?;
        socket.set_read_timeout(Some(timeout))?;
        Ok(RawSocket { socket })
    }

    fn set_ttl(&self, ttl: Ttl) -> io::Result<()> {
        self.socket.set_ttl(u32::from(ttl.0))
    }

    fn send_to(&self, buf: &[u8], addr: &socket2::SockAddr) -> io::Result<usize> {
        self.socket.send_to(buf, addr)
    }

    fn recv_from(&self, buf: &mut [u8]) -> io::Result<Option<(usize, IpAddr)>> {
        let mut recv_buf = [0u8; 512];

        // Socket2 gives a safety guaranty which allows us to do an unsafe cast
        // from `&mut [u8]` to `&mut [std::mem::MaybeUninit<u8>]`.
        // https://docs.rs/socket2/0.4.7/socket2/struct.Socket.html#method.recv
        //
        // On a RAW socket we get a whole IP packet, header included.
        let received = socket2::Socket::recv_from(&self.socket, unsafe {
            &mut *(std::ptr::addr_of_mut!(recv_buf) as *mut [u8]
                as *mut [std::mem::MaybeUninit<u8>])
        });
        let (size, socket_addr) = match received {
            Err(e) if matches!(e.kind(), io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut) => {
                return Ok(None);
            }
            Err(e) => return Err(e),
            Ok(ok) => ok,
        };

        let size = size.min(buf.len());
        buf[..size].copy_from_slice(&recv_buf[..size]);
        let ip = socket_addr
            .as_socket_ipv4()
            .map(|addr| IpAddr::V4(*addr.ip()))
            .ok_or_else(|| {
                io::Error::new(io::ErrorKind::InvalidData, "sender address is not IPv4")
            })?;
        Ok(Some((size, ip)))
    }
}
