use std::fs::OpenOptions;
use std::sync::Mutex;

use checklist_overlay::cli::commands::Cli;
use checklist_overlay::cli::handlers;
use checklist_overlay::io::paths::DataDir;
use clap::Parser;
use tracing_subscriber::EnvFilter;

fn main() {
    let cli = Cli::parse();
    init_tracing(&cli);

    if let Err(e) = handlers::dispatch(cli) {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}

/// RUST_LOG wins; otherwise warnings, or debug with -v. The overlay owns
/// the terminal, so it logs to a file in the data directory instead.
fn init_tracing(cli: &Cli) {
    let default = if cli.verbose {
        "checklist_overlay=debug"
    } else {
        "checklist_overlay=warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    if cli.command.is_some() {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .init();
        return;
    }

    let data_dir = DataDir::resolve(cli.data_dir.as_deref());
    let log_file = data_dir.ensure_exists().and_then(|()| {
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(data_dir.log_path())
    });
    if let Ok(file) = log_file {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_ansi(false)
            .with_writer(Mutex::new(file))
            .init();
    }
}
