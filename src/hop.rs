use crate::probe::{ProbeOutcome, SequenceNumber, Ttl};
use crate::transport::ProbeTransport;
use crate::TraceError;
use std::net::IpAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

/// Aggregation over the queries issued for one TTL.
#[derive(Clone, Debug, PartialEq)]
pub struct HopResult {
    pub hop: Ttl,
    /// First address seen among the answered queries; `None` when every
    /// query was lost.
    pub responder: Option<IpAddr>,
    /// Per-query round-trip times in issue order. `None` marks a lost probe
    /// and is never dropped, so the slot order communicates loss.
    pub rtts: Vec<Option<Duration>>,
    pub reached_destination: bool,
}

impl HopResult {
    pub fn is_unresponsive(&self) -> bool {
        self.responder.is_none()
    }
}

/// Runs `queries` probes for one TTL and summarizes. Returns `Ok(None)` when
/// the abort flag was raised first; the partial hop is discarded, never
/// reported. Fatal transport conditions propagate.
pub(crate) fn probe_hop<T>(
    transport: &mut T,
    ttl: Ttl,
    queries: u16,
    abort: &AtomicBool,
) -> Result<Option<HopResult>, TraceError>
where
    T: ProbeTransport,
{
    let mut rtts = Vec::with_capacity(usize::from(queries));
    let mut responder: Option<IpAddr> = None;
    let mut reached_destination = false;

    for query in 0..queries {
        if abort.load(Ordering::Relaxed) {
            tracing::debug!("aborting sweep at ttl {ttl}");
            return Ok(None);
        }
        let sequence_number = SequenceNumber::for_probe(ttl, query);
        match transport.send_and_wait(ttl, sequence_number)? {
            ProbeOutcome::Answered { responder: from, rtt, is_destination } => {
                rtts.push(Some(rtt));
                responder.get_or_insert(from);
                reached_destination |= is_destination;
            }
            ProbeOutcome::TimedOut => rtts.push(None),
            ProbeOutcome::TransportError { cause } => {
                // One bad query must not abort the trace; count it as lost.
                tracing::warn!("probe ttl {ttl} query {query} failed: {cause}");
                rtts.push(None);
            }
        }
    }

    Ok(Some(HopResult { hop: ttl, responder, rtts, reached_destination }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Arc;

    struct ScriptedTransport {
        script: VecDeque<ProbeOutcome>,
        issued: Vec<(Ttl, SequenceNumber)>,
        abort_after_first: Option<Arc<AtomicBool>>,
    }

    impl ScriptedTransport {
        fn new(script: Vec<ProbeOutcome>) -> Self {
            ScriptedTransport {
                script: script.into(),
                issued: vec![],
                abort_after_first: None,
            }
        }
    }

    impl ProbeTransport for ScriptedTransport {
        fn send_and_wait(
            &mut self,
            ttl: Ttl,
            sequence_number: SequenceNumber,
        ) -> Result<ProbeOutcome, TraceError> {
            self.issued.push((ttl, sequence_number));
            if let Some(flag) = &self.abort_after_first {
                flag.store(true, Ordering::Relaxed);
            }
            Ok(self.script.pop_front().unwrap_or(ProbeOutcome::TimedOut))
        }
    }

    fn answered(last_octet: u8, millis: u64, is_destination: bool) -> ProbeOutcome {
        ProbeOutcome::Answered {
            responder: IpAddr::V4(std::net::Ipv4Addr::new(10, 0, 0, last_octet)),
            rtt: Duration::from_millis(millis),
            is_destination,
        }
    }

    fn no_abort() -> AtomicBool {
        AtomicBool::new(false)
    }

    #[test]
    fn all_queries_lost() {
        let mut transport = ScriptedTransport::new(vec![
            ProbeOutcome::TimedOut,
            ProbeOutcome::TimedOut,
            ProbeOutcome::TimedOut,
        ]);
        let hop = probe_hop(&mut transport, Ttl(5), 3, &no_abort())
            .unwrap()
            .unwrap();

        assert!(hop.is_unresponsive());
        assert_eq!(vec![None, None, None], hop.rtts);
        assert!(!hop.reached_destination);
    }

    #[test]
    fn first_answer_names_the_hop_and_order_is_preserved() {
        let mut transport = ScriptedTransport::new(vec![
            ProbeOutcome::TimedOut,
            answered(7, 12, false),
            answered(8, 34, false),
        ]);
        let hop = probe_hop(&mut transport, Ttl(2), 3, &no_abort())
            .unwrap()
            .unwrap();

        assert_eq!(Some("10.0.0.7".parse().unwrap()), hop.responder);
        assert_eq!(
            vec![
                None,
                Some(Duration::from_millis(12)),
                Some(Duration::from_millis(34)),
            ],
            hop.rtts
        );
    }

    #[test]
    fn any_destination_answer_marks_the_hop_reached() {
        let mut transport = ScriptedTransport::new(vec![
            answered(9, 5, false),
            answered(9, 6, true),
            ProbeOutcome::TimedOut,
        ]);
        let hop = probe_hop(&mut transport, Ttl(9), 3, &no_abort())
            .unwrap()
            .unwrap();

        assert!(hop.reached_destination);
        assert_eq!(3, hop.rtts.len());
    }

    #[test]
    fn transport_error_counts_as_lost_probe() {
        let mut transport = ScriptedTransport::new(vec![
            ProbeOutcome::TransportError { cause: "send failed".to_owned() },
            answered(3, 8, false),
        ]);
        let hop = probe_hop(&mut transport, Ttl(3), 2, &no_abort())
            .unwrap()
            .unwrap();

        assert_eq!(vec![None, Some(Duration::from_millis(8))], hop.rtts);
        assert_eq!(Some("10.0.0.3".parse().unwrap()), hop.responder);
    }

    #[test]
    fn sequence_numbers_follow_ttl_and_query_index() {
        let mut transport = ScriptedTransport::new(vec![]);
        probe_hop(&mut transport, Ttl(7), 3, &no_abort()).unwrap();

        let sequences: Vec<u16> = transport.issued.iter().map(|(_, s)| s.0).collect();
        assert_eq!(vec![7000, 7001, 7002], sequences);
    }

    #[test]
    fn abort_mid_hop_discards_the_partial_result() {
        let abort = Arc::new(AtomicBool::new(false));
        let mut transport = ScriptedTransport::new(vec![answered(1, 1, false)]);
        transport.abort_after_first = Some(abort.clone());

        let result = probe_hop(&mut transport, Ttl(1), 3, &abort).unwrap();

        assert_eq!(None, result);
        assert_eq!(1, transport.issued.len());
    }
}
