#![forbid(unsafe_code)]

mod auth;
mod error;
mod handlers;
mod routes;
mod state;

pub use error::ApiError;
pub use routes::create_router;
pub use state::{AppState, ServerConfig};

use std::future::Future;
use std::sync::Arc;

use axum::Router;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::info;

use placehub_common::ConfigError;
use placehub_storage::{Housekeeper, SharedClock, TokioClock};

/// Servidor HTTP: estado compartilhado + tasks de manutenção.
pub struct ApiServer {
    config: ServerConfig,
    state: Arc<AppState>,
}

impl ApiServer {
    pub fn new(config: ServerConfig) -> Result<Self, ConfigError> {
        Self::with_clock(config, Arc::new(TokioClock))
    }

    pub fn with_clock(config: ServerConfig, clock: SharedClock) -> Result<Self, ConfigError> {
        config.ttl.validate()?;
        let state = Arc::new(AppState::new(&config, clock));
        Ok(Self { config, state })
    }

    pub fn router(&self) -> Router {
        create_router(self.state.clone()).layer(TraceLayer::new_for_http())
    }

    /// Faz bind em `host:port` e serve até `shutdown` completar.
    pub async fn run<F>(self, shutdown: F) -> std::io::Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr = format!("{}:{}", self.config.host, self.config.port);
        let listener = TcpListener::bind(&addr).await?;
        info!("PlaceHub escutando em {addr}");
        self.serve(listener, shutdown).await
    }

    /// Serve num listener já aberto. O sweeper e o expirer vivem enquanto o
    /// servidor estiver de pé.
    pub async fn serve<F>(self, listener: TcpListener, shutdown: F) -> std::io::Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let keeper = Housekeeper::start(
            &self.state.places,
            &self.state.scripts,
            self.config.ttl.clean_interval,
        );

        let result = axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown)
            .await;

        keeper.stop().await;
        info!("servidor encerrado");
        result
    }
}
