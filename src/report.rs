use crate::hop::HopResult;
use crate::resolve;
use crate::tracer::{SweepState, TraceSession};
use std::time::Duration;

pub fn header_line(session: &TraceSession) -> String {
    format!(
        "traceroute to {} ({}), {} hops max",
        session.destination, session.destination_ip, session.max_hops
    )
}

/// One line per hop: hop number, responder, then one RTT slot per query in
/// issue order. A lost query renders as `*`, so loss is visible in place and
/// distinguishable from "not yet probed".
pub fn hop_line(hop: &HopResult, numeric: bool) -> String {
    let mut line = format!("{:2}  ", hop.hop.0);
    match hop.responder {
        None => {
            for _ in &hop.rtts {
                line.push_str("*  ");
            }
            line.push_str("(request timed out)");
        }
        Some(ip) => {
            if numeric {
                line.push_str(&ip.to_string());
            } else {
                line.push_str(&resolve::display_name(ip));
            }
            for rtt in &hop.rtts {
                line.push_str("  ");
                line.push_str(&rtt_slot(*rtt));
            }
        }
    }
    line
}

pub fn summary_line(session: &TraceSession, state: SweepState) -> String {
    match state {
        SweepState::Reached => format!(
            "reached {} ({})",
            session.destination, session.destination_ip
        ),
        SweepState::Exhausted => format!(
            "destination not reached within {} hops",
            session.max_hops
        ),
        SweepState::Sweeping(_) => "trace interrupted".to_owned(),
    }
}

fn rtt_slot(rtt: Option<Duration>) -> String {
    match rtt {
        Some(rtt) => format!("{:.2} ms", rtt.as_secs_f64() * 1000.0),
        None => "*".to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::probe::Ttl;
    use crate::tracer::TraceConfig;

    fn session() -> TraceSession {
        TraceSession::new("192.0.2.1", &TraceConfig::default()).unwrap()
    }

    #[test]
    fn responsive_hop_line() {
        let hop = HopResult {
            hop: Ttl(3),
            responder: Some("10.1.2.3".parse().unwrap()),
            rtts: vec![
                Some(Duration::from_micros(12_340)),
                None,
                Some(Duration::from_micros(15_000)),
            ],
            reached_destination: false,
        };
        assert_eq!(" 3  10.1.2.3  12.34 ms  *  15.00 ms", hop_line(&hop, true));
    }

    #[test]
    fn unresponsive_hop_line_marks_every_query() {
        let hop = HopResult {
            hop: Ttl(11),
            responder: None,
            rtts: vec![None, None, None],
            reached_destination: false,
        };
        assert_eq!("11  *  *  *  (request timed out)", hop_line(&hop, true));
    }

    #[test]
    fn header_and_summaries() {
        let session = session();
        assert_eq!(
            "traceroute to 192.0.2.1 (192.0.2.1), 30 hops max",
            header_line(&session)
        );
        assert_eq!(
            "reached 192.0.2.1 (192.0.2.1)",
            summary_line(&session, SweepState::Reached)
        );
        assert_eq!(
            "destination not reached within 30 hops",
            summary_line(&session, SweepState::Exhausted)
        );
        assert_eq!(
            "trace interrupted",
            summary_line(&session, SweepState::Sweeping(Ttl(9)))
        );
    }
}
