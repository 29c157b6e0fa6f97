use crate::hop::{probe_hop, HopResult};
use crate::icmp::v4::RawSocket;
use crate::probe::Ttl;
use crate::resolve;
use crate::transport::{IcmpTransport, ProbeTransport};
use crate::TraceError;
use std::net::Ipv4Addr;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::Duration;

/// Largest `max_hops` the session accepts; keeps the `ttl * 1000 + query`
/// sequence encoding inside the 16-bit ICMP sequence field.
pub const MAX_SWEEP_HOPS: u8 = 64;

/// Largest `queries` the session accepts; a hop's query indices must stay
/// below the 1000-wide sequence band its TTL owns, or sequence numbers
/// collide across hops.
pub const MAX_HOP_QUERIES: u16 = 1000;

/// Tunable sweep parameters; the defaults match the classic tools.
#[derive(Clone, Copy, Debug)]
pub struct TraceConfig {
    pub max_hops: u8,
    pub timeout: Duration,
    pub queries: u16,
}

impl Default for TraceConfig {
    fn default() -> TraceConfig {
        TraceConfig {
            max_hops: 30,
            timeout: Duration::from_secs(2),
            queries: 3,
        }
    }
}

/// One traceroute run: the resolved destination plus the parameters every
/// probe shares. The identifier is fixed for the whole session so replies
/// from unrelated traces are rejected.
#[derive(Clone, Debug)]
pub struct TraceSession {
    pub destination: String,
    pub destination_ip: Ipv4Addr,
    pub max_hops: u8,
    pub timeout: Duration,
    pub queries: u16,
    pub identifier: u16,
}

impl TraceSession {
    /// Forward-resolves the destination once; a resolution failure is fatal
    /// and the sweep never starts.
    pub fn new(destination: &str, config: &TraceConfig) -> Result<TraceSession, TraceError> {
        Self::validate(config)?;
        let destination_ip = resolve::resolve_destination(destination)?;
        Ok(TraceSession {
            destination: destination.to_owned(),
            destination_ip,
            max_hops: config.max_hops,
            timeout: config.timeout,
            queries: config.queries,
            identifier: (std::process::id() & 0xFFFF) as u16,
        })
    }

    fn validate(config: &TraceConfig) -> Result<(), TraceError> {
        if config.max_hops == 0 || config.max_hops > MAX_SWEEP_HOPS {
            return Err(TraceError::InvalidSession {
                message: format!("max hops must be in 1..={MAX_SWEEP_HOPS}"),
            });
        }
        if config.queries == 0 || config.queries > MAX_HOP_QUERIES {
            return Err(TraceError::InvalidSession {
                message: format!("queries per hop must be in 1..={MAX_HOP_QUERIES}"),
            });
        }
        if config.timeout.is_zero() {
            return Err(TraceError::InvalidSession {
                message: "timeout must be positive".to_owned(),
            });
        }
        Ok(())
    }
}

/// Sweep progress. Terminal states are `Reached` (destination confirmed) and
/// `Exhausted` (hop budget spent without confirmation).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SweepState {
    Sweeping(Ttl),
    Reached,
    Exhausted,
}

/// Drives the TTL sweep from 1 upward, one hop at a time. Hops are visited
/// strictly in increasing order, never re-probed and never skipped; an
/// unresponsive hop is reported and the sweep continues.
pub struct Tracer<T> {
    session: TraceSession,
    transport: T,
    state: SweepState,
    abort: Arc<AtomicBool>,
}

impl Tracer<IcmpTransport<RawSocket>> {
    /// Tracer over the raw-socket transport.
    pub fn for_session(session: TraceSession) -> Self {
        let transport =
            IcmpTransport::new(session.destination_ip, session.identifier, session.timeout);
        Tracer::with_transport(session, transport)
    }
}

impl<T> Tracer<T>
where
    T: ProbeTransport,
{
    pub fn with_transport(session: TraceSession, transport: T) -> Tracer<T> {
        Tracer {
            session,
            transport,
            state: SweepState::Sweeping(Ttl(1)),
            abort: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn session(&self) -> &TraceSession {
        &self.session
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn state(&self) -> SweepState {
        self.state
    }

    /// Flag for external cancellation; raising it stops the sweep promptly
    /// and the hop in progress is discarded, not reported.
    pub fn abort_handle(&self) -> Arc<AtomicBool> {
        self.abort.clone()
    }

    /// Runs the sweep to a terminal state, streaming each completed hop to
    /// `emit` before the next one starts. Returns the state the sweep ended
    /// in; a non-terminal state means the run was interrupted.
    pub fn run<F>(&mut self, mut emit: F) -> Result<SweepState, TraceError>
    where
        F: FnMut(&HopResult),
    {
        while let SweepState::Sweeping(ttl) = self.state {
            let Some(hop) =
                probe_hop(&mut self.transport, ttl, self.session.queries, &self.abort)?
            else {
                return Ok(self.state);
            };
            let reached = hop.reached_destination;
            emit(&hop);
            tracing::trace!("hop {ttl} done, reached={reached}");

            self.state = if reached {
                SweepState::Reached
            } else if ttl.0 == self.session.max_hops {
                SweepState::Exhausted
            } else {
                SweepState::Sweeping(Ttl(ttl.0 + 1))
            };
        }
        Ok(self.state)
    }
}
