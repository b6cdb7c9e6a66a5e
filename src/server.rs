use std::future::{Future, IntoFuture};
use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::sync::watch;

use crate::api;
use crate::config::ServerConfig;
use crate::matcher::Matcher;
use crate::registry::SessionRegistry;
use crate::stats::SessionStats;
use crate::webhook::WebhookClient;

#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },
    #[error("serve: {0}")]
    Serve(#[source] std::io::Error),
    #[error("build webhook client: {0}")]
    WebhookClient(#[from] reqwest::Error),
}

/// The game server: both listeners plus the matcher.
pub struct Server {
    config: ServerConfig,
    stats: Arc<SessionStats>,
}

impl Server {
    pub fn new(config: ServerConfig) -> Self {
        Self {
            config,
            stats: SessionStats::new(),
        }
    }

    pub fn stats(&self) -> Arc<SessionStats> {
        Arc::clone(&self.stats)
    }

    /// Binds the configured addresses and serves until `shutdown` resolves.
    pub async fn run(self, shutdown: impl Future<Output = ()> + Send + 'static) -> Result<(), ServerError> {
        let public = bind(self.config.public_addr).await?;
        let private = bind(self.config.private_addr).await?;
        self.serve(public, private, shutdown).await
    }

    /// Serves on already bound listeners until `shutdown` resolves.
    ///
    /// Once shutdown is requested the matcher stops and both HTTP servers
    /// drain. Anything still running after the shutdown timeout is aborted.
    pub async fn serve(
        self,
        public: TcpListener,
        private: TcpListener,
        shutdown: impl Future<Output = ()> + Send + 'static,
    ) -> Result<(), ServerError> {
        let public_addr = public.local_addr().map_err(ServerError::Serve)?;
        let private_addr = private.local_addr().map_err(ServerError::Serve)?;
        let webhooks = WebhookClient::new(self.config.webhook_timeout)?;
        let (registry, queue) = SessionRegistry::new(self.config.call_phone_number.clone());
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let matcher = Matcher::new(
            Arc::clone(&registry),
            queue,
            webhooks,
            Arc::clone(&self.stats),
            shutdown_rx.clone(),
            self.config.audio_poll_interval,
        );
        let mut matcher = tokio::spawn(matcher.run());

        let public_app = api::public_router(Arc::clone(&registry)).into_make_service_with_connect_info::<SocketAddr>();
        let mut public_server = tokio::spawn(
            axum::serve(public, public_app)
                .with_graceful_shutdown(stopped(shutdown_rx.clone()))
                .into_future(),
        );
        tracing::info!(addr = %public_addr, "serving public API");

        let private_app = api::private_router(registry).into_make_service_with_connect_info::<SocketAddr>();
        let mut private_server = tokio::spawn(
            axum::serve(private, private_app)
                .with_graceful_shutdown(stopped(shutdown_rx))
                .into_future(),
        );
        tracing::info!(addr = %private_addr, "serving private API");

        shutdown.await;
        tracing::info!("shutting down server");
        let _ = shutdown_tx.send(true);

        let drained = tokio::time::timeout(self.config.shutdown_timeout, async {
            tokio::join!(&mut public_server, &mut private_server, &mut matcher)
        })
        .await;

        let result = match drained {
            Ok((public, private, _)) => [public, private]
                .into_iter()
                .try_for_each(|joined| match joined {
                    Ok(served) => served.map_err(ServerError::Serve),
                    Err(e) => {
                        tracing::error!(error = %e, "server task failed");
                        Ok(())
                    }
                }),
            Err(_) => {
                tracing::warn!(
                    timeout_ms = self.config.shutdown_timeout.as_millis() as u64,
                    "graceful shutdown timed out, forcing close"
                );
                public_server.abort();
                private_server.abort();
                matcher.abort();
                Ok(())
            }
        };

        self.stats.log();
        tracing::info!("server stopped");
        result
    }
}

async fn bind(addr: SocketAddr) -> Result<TcpListener, ServerError> {
    TcpListener::bind(addr)
        .await
        .map_err(|source| ServerError::Bind { addr, source })
}

async fn stopped(mut shutdown: watch::Receiver<bool>) {
    let _ = shutdown.wait_for(|stop| *stop).await;
}
