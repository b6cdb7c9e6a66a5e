use std::net::SocketAddr;
use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;

use voip_tictactoe::config::{self, ServerConfig};
use voip_tictactoe::identity::PhoneNumber;
use voip_tictactoe::logging::{self, LogLevel};
use voip_tictactoe::server::Server;

#[derive(Debug, Parser)]
#[command(name = "vt-server", version, about = "Tic-tac-toe played over phone calls")]
struct Cli {
    /// Number shown in the browser for players to call.
    #[arg(long, env = "VT_CALL_PHONE_NUMBER")]
    call_phone_number: String,

    /// Listen address for browsers.
    #[arg(long, env = "VT_PUBLIC_ADDR", default_value = config::DEFAULT_PUBLIC_ADDR)]
    public_addr: SocketAddr,

    /// Listen address for registration and audio forks.
    #[arg(long, env = "VT_PRIVATE_ADDR", default_value = config::DEFAULT_PRIVATE_ADDR)]
    private_addr: SocketAddr,

    #[arg(long, env = "VT_SHUTDOWN_TIMEOUT_SECS", default_value_t = config::DEFAULT_SHUTDOWN_TIMEOUT.as_secs())]
    shutdown_timeout_secs: u64,

    #[arg(long, env = "VT_AUDIO_POLL_INTERVAL_MS", default_value_t = config::DEFAULT_AUDIO_POLL_INTERVAL.as_millis() as u64)]
    audio_poll_interval_ms: u64,

    #[arg(long, env = "VT_WEBHOOK_TIMEOUT_SECS", default_value_t = config::DEFAULT_WEBHOOK_TIMEOUT.as_secs())]
    webhook_timeout_secs: u64,

    #[arg(long, env = "VT_LOG_LEVEL", value_enum, default_value_t = LogLevel::Info)]
    log_level: LogLevel,
}

impl Cli {
    fn into_config(self) -> ServerConfig {
        ServerConfig {
            public_addr: self.public_addr,
            private_addr: self.private_addr,
            shutdown_timeout: Duration::from_secs(self.shutdown_timeout_secs),
            audio_poll_interval: Duration::from_millis(self.audio_poll_interval_ms),
            webhook_timeout: Duration::from_secs(self.webhook_timeout_secs),
            log_level: self.log_level,
            ..ServerConfig::new(PhoneNumber::new(self.call_phone_number.trim()))
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init(cli.log_level);

    let config = cli.into_config();
    tracing::info!(
        call_phone_number = %config.call_phone_number,
        public_addr = %config.public_addr,
        private_addr = %config.private_addr,
        "starting server"
    );

    match Server::new(config).run(ctrl_c()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "server failed");
            ExitCode::FAILURE
        }
    }
}

async fn ctrl_c() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for ctrl-c, running until killed");
        std::future::pending::<()>().await;
    }
}
