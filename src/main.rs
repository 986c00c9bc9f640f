use clap::Parser;
use listmachine::cli::commands::Cli;
use listmachine::cli::handlers;
use tracing_subscriber::EnvFilter;

fn main() {
    init_tracing();
    let cli = Cli::parse();

    if let Err(e) = handlers::dispatch(cli) {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}

/// Log to stderr, filtered by `LISTMACHINE_LOG` (default: warnings only).
fn init_tracing() {
    let filter = EnvFilter::try_from_env("LISTMACHINE_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}
