use std::net::SocketAddr;
use std::time::Duration;

use crate::identity::PhoneNumber;
use crate::logging::LogLevel;

pub const DEFAULT_PUBLIC_ADDR: &str = "0.0.0.0:8080";
pub const DEFAULT_PRIVATE_ADDR: &str = "0.0.0.0:8081";
pub const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);
pub const DEFAULT_AUDIO_POLL_INTERVAL: Duration = Duration::from_millis(200);
pub const DEFAULT_WEBHOOK_TIMEOUT: Duration = Duration::from_secs(10);

/// Runtime configuration of the game server.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Number the browser tells the user to dial.
    pub call_phone_number: PhoneNumber,
    /// Browser-facing listener.
    pub public_addr: SocketAddr,
    /// Listener for the phone side: registration and audio forks.
    pub private_addr: SocketAddr,
    pub shutdown_timeout: Duration,
    /// Upper bound between two checks for a pending audio fork.
    pub audio_poll_interval: Duration,
    pub webhook_timeout: Duration,
    pub log_level: LogLevel,
}

impl ServerConfig {
    /// Defaults for everything except the number to call.
    pub fn new(call_phone_number: PhoneNumber) -> Self {
        Self {
            call_phone_number,
            public_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            private_addr: SocketAddr::from(([0, 0, 0, 0], 8081)),
            shutdown_timeout: DEFAULT_SHUTDOWN_TIMEOUT,
            audio_poll_interval: DEFAULT_AUDIO_POLL_INTERVAL,
            webhook_timeout: DEFAULT_WEBHOOK_TIMEOUT,
            log_level: LogLevel::default(),
        }
    }
}
