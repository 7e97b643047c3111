//! Service binary entry point.

use clap::Parser;
use tracing_subscriber::EnvFilter;

use eventstream::config::CliArgs;
use eventstream::vsphere::SimulatorSource;

#[tokio::main]
async fn main() {
    let args = CliArgs::parse();

    let default_filter = if args.debug {
        "eventstream=debug,eventlog=debug,info"
    } else {
        "info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .init();

    tracing::info!(
        port = args.port,
        stream_begin = ?args.stream_begin,
        max_segment_size = args.max_segment_size,
        max_record_size = args.max_record_size,
        "starting eventstream"
    );

    // The production SOAP collector plugs in at the EventSource seam; this
    // binary runs against the built-in simulator.
    let source = SimulatorSource::new(1).with_stream_begin(args.stream_begin);

    if let Err(err) = eventstream::run(args, source).await {
        tracing::error!(error = %err, "service failed");
        std::process::exit(1);
    }
}
