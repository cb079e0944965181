//! davenportd binary entry point.

use std::process::ExitCode;
use std::sync::Arc;

use camino::Utf8PathBuf;
use clap::Parser;
use tracing::error;

use davenport_config::{Endpoint, ServerOptions};
use davenportd::{MemoryTree, bootstrap};

/// WebDAV-class request pipeline daemon.
#[derive(Debug, Parser)]
#[command(name = "davenportd", version, about)]
struct Args {
    /// Path to a JSON options file.
    #[arg(long)]
    config: Option<Utf8PathBuf>,

    /// Listen endpoint override, e.g. `http://127.0.0.1:1900`.
    #[arg(long)]
    listen: Option<Endpoint>,
}

fn main() -> ExitCode {
    let args = Args::parse();

    let mut options = match &args.config {
        Some(path) => match ServerOptions::from_file(path) {
            Ok(options) => options,
            Err(err) => {
                // Telemetry is not up yet.
                eprintln!("davenportd: {err}");
                return ExitCode::FAILURE;
            }
        },
        None => ServerOptions::default(),
    };

    if let Some(endpoint) = &args.listen {
        if endpoint.secure && options.tls.is_none() {
            eprintln!("davenportd: --listen {endpoint} requires TLS material in the options file");
            return ExitCode::FAILURE;
        }
        if !endpoint.secure {
            options.tls = None;
        }
        options.host = endpoint.host.clone();
        options.port = endpoint.port;
    }

    let tree = Arc::new(MemoryTree::new());
    let mut server = match bootstrap(options, tree) {
        Ok(server) => server,
        Err(err) => {
            eprintln!("davenportd: {err}");
            return ExitCode::FAILURE;
        }
    };

    if let Err(err) = server.start() {
        error!("failed to start server: {err}");
        return ExitCode::FAILURE;
    }

    wait_for_shutdown_signal();

    match server.stop() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("shutdown failed: {err}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(unix)]
fn wait_for_shutdown_signal() {
    use signal_hook::consts::{SIGINT, SIGTERM};
    use signal_hook::iterator::Signals;

    match Signals::new([SIGINT, SIGTERM]) {
        Ok(mut signals) => {
            signals.forever().next();
        }
        Err(err) => {
            error!("failed to install signal handlers: {err}");
            std::thread::park();
        }
    }
}

#[cfg(not(unix))]
fn wait_for_shutdown_signal() {
    std::thread::park();
}
