//! CLI for topic-relay
//!
//! `topic-relay [PORT]` starts the relay; type `exit` (or press Ctrl-C) to
//! stop it.

use std::process::ExitCode;

use clap::Parser;
use topic_relay::config::{DEFAULT_CONFIG_PATH, Settings, load_config_from};
use topic_relay::transport::{Server, control};
use topic_relay::utils::{Result, logging};
use tracing::error;

#[derive(Parser)]
#[command(name = "topic-relay", version, about = "UDP to TCP topic relay")]
struct Cli {
    /// Port shared by the subscriber listener (TCP) and publishers (UDP)
    port: Option<u16>,

    /// Address to bind
    #[arg(long)]
    host: Option<String>,

    /// error, warn, info, debug or trace
    #[arg(long)]
    log_level: Option<String>,

    /// Configuration file, extension optional
    #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
    config: String,
}

impl Cli {
    fn apply(self, settings: &mut Settings) {
        if let Some(port) = self.port {
            settings.server.port = port;
        }
        if let Some(host) = self.host {
            settings.server.host = host;
        }
        if let Some(level) = self.log_level {
            settings.server.log_level = level;
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let settings = match load_settings(cli) {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("{e}");
            return ExitCode::FAILURE;
        }
    };
    logging::init(&settings.server.log_level);

    match run(settings).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn load_settings(cli: Cli) -> Result<Settings> {
    let mut settings = load_config_from(&cli.config)?;
    cli.apply(&mut settings);
    Ok(settings)
}

async fn run(settings: Settings) -> Result<()> {
    let server = Server::bind(&settings).await?;
    let control = control::spawn_console();
    server.run(control).await?;
    Ok(())
}
