#![warn(rust_2018_idioms)]
#![warn(clippy::pedantic)]
#![allow(clippy::missing_errors_doc)]

//! ICMP path discovery: enumerate the routers between this host and an IPv4
//! destination by sweeping TTL-bounded Echo Requests, and measure the
//! round-trip time to each hop.
//!
//! The sweep is driven by a [`Tracer`] over a [`ProbeTransport`]; the
//! raw-socket transport ([`IcmpTransport`]) requires the privilege to open
//! raw ICMP sockets and surfaces [`TraceError::PermissionDenied`] when it is
//! missing.

pub use hop::HopResult;
pub use probe::{ProbeOutcome, SequenceNumber, Ttl};
pub use trace_error::{GenericError, TraceError};
pub use tracer::{SweepState, TraceConfig, TraceSession, Tracer, MAX_HOP_QUERIES, MAX_SWEEP_HOPS};
pub use transport::{IcmpTransport, ProbeTransport};

mod hop;
pub mod icmp;
mod probe;
pub mod report;
pub mod resolve;
mod trace_error;
mod tracer;
mod transport;
