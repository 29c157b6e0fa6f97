use argh::FromArgs;
use hoptrace::{report, SweepState, TraceConfig, TraceSession, Tracer};
use std::io::Write;
use std::process::ExitCode;
use std::sync::atomic::Ordering;
use std::time::Duration;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

#[derive(FromArgs)]
/// Trace the network path to a destination and measure per-hop latency.
struct Args {
    /// destination host name or IPv4 address
    #[argh(positional)]
    destination: String,

    /// maximum number of hops (default 30)
    #[argh(option, short = 'm', default = "30")]
    max_hops: u8,

    /// per-probe timeout in seconds (default 2)
    #[argh(option, short = 't', default = "2.0")]
    timeout: f64,

    /// number of probes per hop (default 3)
    #[argh(option, short = 'q', default = "3")]
    queries: u16,

    /// print addresses numerically, skip reverse DNS
    #[argh(switch, short = 'n')]
    numeric: bool,

    /// log internal events to stderr
    #[argh(switch, short = 'v')]
    verbose: bool,
}

fn main() -> ExitCode {
    let args: Args = argh::from_env();

    let level = if args.verbose { Level::DEBUG } else { Level::WARN };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("hoptrace: could not install log subscriber: {e}");
    }

    if !args.timeout.is_finite() || args.timeout <= 0.0 {
        eprintln!("hoptrace: timeout must be a positive number of seconds");
        return ExitCode::FAILURE;
    }
    let config = TraceConfig {
        max_hops: args.max_hops,
        timeout: Duration::from_secs_f64(args.timeout),
        queries: args.queries,
    };

    let session = match TraceSession::new(&args.destination, &config) {
        Ok(session) => session,
        Err(e) => {
            eprintln!("hoptrace: {e}");
            return ExitCode::FAILURE;
        }
    };
    println!("{}", report::header_line(&session));

    let mut tracer = Tracer::for_session(session);
    let abort = tracer.abort_handle();
    if let Err(e) = ctrlc::set_handler(move || abort.store(true, Ordering::Relaxed)) {
        tracing::warn!("could not install interrupt handler: {e}");
    }

    let numeric = args.numeric;
    let result = tracer.run(|hop| {
        println!("{}", report::hop_line(hop, numeric));
        let _ = std::io::stdout().flush();
    });

    match result {
        Ok(state) => {
            println!();
            println!("{}", report::summary_line(tracer.session(), state));
            match state {
                SweepState::Reached | SweepState::Exhausted => ExitCode::SUCCESS,
                SweepState::Sweeping(_) => ExitCode::FAILURE,
            }
        }
        Err(e) => {
            eprintln!("hoptrace: {e}");
            ExitCode::FAILURE
        }
    }
}
