use std::sync::Arc;

use anyhow::{Result, anyhow};
use clap::{Parser, ValueEnum};
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use bedrockd::{ActivityRef, Config, Coordinator, ManagedProcess, ProcessSpec};

/// Supervises a bedrock server living next to this binary.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Server executable name, resolved in this binary's directory.
    #[arg(long, default_value = "bedrock_server")]
    server: String,

    /// Log output format.
    #[arg(long, value_enum, default_value_t = LogFormat::Json)]
    log_format: LogFormat,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum LogFormat {
    Json,
    Text,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    initialize_logging(args.log_format)?;

    let cfg = Config::default();
    let process: ActivityRef = Arc::new(ManagedProcess::new(ProcessSpec::beside(args.server)));

    info!("starting background threads...");
    let coordinator = Coordinator::new(cfg, process);

    match coordinator.run().await {
        Ok(shutdown) => {
            if let Err(err) = shutdown.result {
                warn!(error = %err, "server exited with an error after stop");
            }
            info!("threads stopped successfully, exiting");
            Ok(())
        }
        Err(err) => {
            error!(error = %err, label = err.as_label(), "supervisor terminating");
            std::process::exit(err.exit_code());
        }
    }
}

fn initialize_logging(format: LogFormat) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = fmt().with_env_filter(env_filter).with_writer(std::io::stdout);

    match format {
        LogFormat::Text => subscriber.try_init(),
        LogFormat::Json => subscriber.json().try_init(),
    }
    .map_err(|err| anyhow!("failed to init tracing: {err}"))
}
