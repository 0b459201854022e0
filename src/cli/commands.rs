use crate::app::{build_service, HandlerConfig};
use crate::client::HttpClient;
use crate::config::ServiceConfig;
use crate::endpoints::Endpoints;
use crate::logging::{init_logging_with_config, LogConfig};
use crate::middleware::MetricsMiddleware;
use crate::server::{HttpServer, ServerHandle};
use crate::service::{BasicService, LoggingService};
use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

const READY_TIMEOUT: Duration = Duration::from_secs(5);

/// Command-line interface for addsvc
#[derive(Parser, Debug)]
#[command(name = "addsvc", version, about = "Sum and concatenate over HTTP/JSON", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Commands {
    /// Run the HTTP server
    Serve {
        /// YAML configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Listen address, overrides the config file and environment
        #[arg(short, long)]
        addr: Option<String>,
    },
    /// Sum two integers on a remote instance
    Sum {
        /// Base URL of the instance, e.g. `localhost:8081`
        #[arg(short, long, default_value = "localhost:8081")]
        target: String,

        #[arg(allow_negative_numbers = true)]
        a: i64,

        #[arg(allow_negative_numbers = true)]
        b: i64,
    },
    /// Concatenate two strings on a remote instance
    Concat {
        /// Base URL of the instance, e.g. `localhost:8081`
        #[arg(short, long, default_value = "localhost:8081")]
        target: String,

        a: String,

        b: String,
    },
}

/// Parse `std::env::args` and run the selected command.
///
/// # Errors
///
/// Returns any startup, configuration or remote-call failure.
pub fn run_cli() -> anyhow::Result<()> {
    run(Cli::parse())
}

fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Serve { config, addr } => serve(config, addr),
        Commands::Sum { target, a, b } => {
            let client = HttpClient::new(&target)?;
            let v = client
                .sum(a, b)
                .with_context(|| format!("sum({a}, {b}) on {target}"))?;
            println!("{a} + {b} = {v}");
            Ok(())
        }
        Commands::Concat { target, a, b } => {
            let client = HttpClient::new(&target)?;
            let v = client
                .concat(&a, &b)
                .with_context(|| format!("concat({a:?}, {b:?}) on {target}"))?;
            println!("{a:?} + {b:?} = {v:?}");
            Ok(())
        }
    }
}

fn serve(config_path: Option<PathBuf>, addr: Option<String>) -> anyhow::Result<()> {
    let _log_guard = init_logging_with_config(&LogConfig::from_env())?;

    let mut config = ServiceConfig::load(config_path.as_deref())?;
    if let Some(addr) = addr {
        config.http_addr = addr;
    }
    may::config().set_stack_size(config.stack_size);

    let service = LoggingService::new(BasicService::new(config.max_concat_len));
    let endpoints = Endpoints::new(Arc::new(service));
    let handler_config = HandlerConfig {
        metrics: config
            .metrics_enabled
            .then(|| Arc::new(MetricsMiddleware::new())),
        tracing: true,
        middlewares: Vec::new(),
    };
    let app = build_service(&endpoints, handler_config);

    let handle = HttpServer(app)
        .start(config.http_addr.as_str())
        .with_context(|| format!("failed to bind {}", config.http_addr))?;
    handle
        .wait_ready(READY_TIMEOUT)
        .context("server did not start accepting connections")?;
    info!(
        addr = %handle.addr(),
        stack_size = config.stack_size,
        max_concat_len = config.max_concat_len,
        metrics = config.metrics_enabled,
        "addsvc listening"
    );

    wait_for_shutdown(handle)
}

#[cfg(unix)]
fn wait_for_shutdown(handle: ServerHandle) -> anyhow::Result<()> {
    use signal_hook::consts::{SIGINT, SIGTERM};
    use signal_hook::iterator::Signals;

    let mut signals =
        Signals::new([SIGINT, SIGTERM]).context("failed to install signal handlers")?;
    if let Some(signal) = signals.forever().next() {
        info!(signal, "Shutting down");
    }
    handle.stop();
    Ok(())
}

#[cfg(not(unix))]
fn wait_for_shutdown(handle: ServerHandle) -> anyhow::Result<()> {
    handle
        .join()
        .map_err(|_| anyhow::anyhow!("server coroutine panicked"))
}
