use std::net::IpAddr;
use std::time::Duration;

/// IP time-to-live stamped on an outbound probe. The TTL value doubles as
/// the hop number it targets.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Ttl(pub u8);

impl From<u8> for Ttl {
    fn from(integer: u8) -> Self {
        Ttl(integer)
    }
}

impl From<Ttl> for u8 {
    fn from(ttl: Ttl) -> Self {
        ttl.0
    }
}

impl std::fmt::Display for Ttl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// ICMP sequence number of one probe.
#[derive(Copy, Clone, Debug, Eq, Hash, PartialEq)]
pub struct SequenceNumber(pub u16);

impl SequenceNumber {
    /// Sequence number for the `query`-th probe of a hop. `ttl * 1000 + query`
    /// keeps sequence numbers unique across the whole sweep, so a stale reply
    /// to an earlier probe can never be mistaken for the current one.
    ///
    /// The encoding only fits the 16-bit sequence field for TTLs up to 64,
    /// and each TTL owns a 1000-wide band of query indices; session
    /// construction rejects larger `max_hops` and `queries`.
    pub fn for_probe(ttl: Ttl, query: u16) -> SequenceNumber {
        SequenceNumber(u16::from(ttl.0) * 1000 + query)
    }
}

impl From<u16> for SequenceNumber {
    fn from(integer: u16) -> Self {
        SequenceNumber(integer)
    }
}

impl From<SequenceNumber> for u16 {
    fn from(sequence_number: SequenceNumber) -> Self {
        sequence_number.0
    }
}

/// Result of a single probe, produced by the transport and aggregated per hop.
#[derive(Clone, Debug, PartialEq)]
pub enum ProbeOutcome {
    /// A correlated reply arrived before the deadline.
    Answered {
        responder: IpAddr,
        rtt: Duration,
        is_destination: bool,
    },
    /// The deadline passed, or an uncorrelated packet consumed it.
    TimedOut,
    /// The probe could not be sent or received. Non-fatal; the hop records
    /// it as a lost probe.
    TransportError { cause: String },
}
