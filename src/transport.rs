use crate::icmp::v4::packet::{self, IcmpReply};
use crate::icmp::v4::{ProbeSocket, RawSocket};
use crate::probe::{ProbeOutcome, SequenceNumber, Ttl};
use crate::TraceError;
use pnet_packet::icmp::IcmpTypes;
use std::marker::PhantomData;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::{Duration, Instant};

/// Issues one probe and waits for one correlated reply, bounded by the
/// per-probe deadline. The only seam that touches the network; sweep logic
/// is tested against simulated implementations.
pub trait ProbeTransport {
    /// `Err` is reserved for fatal conditions (no privilege to open the raw
    /// channel). Everything that should not abort the sweep comes back as a
    /// `ProbeOutcome`.
    fn send_and_wait(
        &mut self,
        ttl: Ttl,
        sequence_number: SequenceNumber,
    ) -> Result<ProbeOutcome, TraceError>;
}

/// The raw-socket transport. A fresh channel is opened per probe and dropped
/// before the next probe begins; nothing is pooled across probes.
pub struct IcmpTransport<S = RawSocket> {
    destination: Ipv4Addr,
    identifier: u16,
    timeout: Duration,
    socket_type: PhantomData<S>,
}

impl<S> IcmpTransport<S>
where
    S: ProbeSocket,
{
    pub fn new(destination: Ipv4Addr, identifier: u16, timeout: Duration) -> IcmpTransport<S> {
        IcmpTransport {
            destination,
            identifier,
            timeout,
            socket_type: PhantomData,
        }
    }

    fn probe_on(&self, socket: &S, ttl: Ttl, sequence_number: SequenceNumber) -> ProbeOutcome {
        if let Err(e) = socket.set_ttl(ttl) {
            return ProbeOutcome::TransportError { cause: e.to_string() };
        }

        let Some(request) =
            packet::build_echo_request(self.identifier, sequence_number, &packet::timestamp_payload())
        else {
            return ProbeOutcome::TransportError {
                cause: "could not build echo request".to_owned(),
            };
        };

        let addr: socket2::SockAddr = SocketAddr::new(IpAddr::V4(self.destination), 0).into();
        let sent_at = Instant::now();
        if let Err(e) = socket.send_to(&request, &addr) {
            tracing::debug!("send failed for ttl {ttl}: {e}");
            return ProbeOutcome::TransportError { cause: e.to_string() };
        }

        let mut buf = [0u8; 512];
        match socket.recv_from(&mut buf) {
            Ok(None) => ProbeOutcome::TimedOut,
            Err(e) => {
                tracing::debug!("receive failed for ttl {ttl}: {e}");
                ProbeOutcome::TransportError { cause: e.to_string() }
            }
            Ok(Some((size, responder))) => {
                let rtt = sent_at.elapsed();
                self.classify(packet::parse_reply(&buf[..size]), responder, rtt)
            }
        }
    }

    fn classify(&self, reply: Option<IcmpReply>, responder: IpAddr, rtt: Duration) -> ProbeOutcome {
        match reply {
            Some(reply)
                if reply.icmp_type == IcmpTypes::EchoReply
                    && reply.identifier == self.identifier =>
            {
                ProbeOutcome::Answered { responder, rtt, is_destination: true }
            }
            // A Time-Exceeded outer header does not carry our identifier at
            // the echo field positions, so it is accepted by type alone.
            Some(reply) if reply.icmp_type == IcmpTypes::TimeExceeded => {
                ProbeOutcome::Answered { responder, rtt, is_destination: false }
            }
            // Anything else, including an echo reply for some other session:
            // the uncorrelated packet consumed the deadline, there is no
            // re-wait.
            Some(reply) => {
                tracing::debug!(
                    "ignoring icmp type {} code {} from {responder}",
                    reply.icmp_type.0,
                    reply.icmp_code.0
                );
                ProbeOutcome::TimedOut
            }
            None => ProbeOutcome::TimedOut,
        }
    }
}

impl<S> ProbeTransport for IcmpTransport<S>
where
    S: ProbeSocket,
{
    fn send_and_wait(
        &mut self,
        ttl: Ttl,
        sequence_number: SequenceNumber,
    ) -> Result<ProbeOutcome, TraceError> {
        let socket = S::open(self.timeout).map_err(TraceError::from_open_error)?;
        let outcome = self.probe_on(&socket, ttl, sequence_number);
        // socket dropped here, on every exit path
        Ok(outcome)
    }
}
