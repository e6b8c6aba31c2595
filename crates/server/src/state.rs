use placehub_common::{DEFAULT_HOST, DEFAULT_PORT, TtlConfig};
use placehub_storage::{PendingScriptQueue, PlaceRegistry, SharedClock};

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub ttl: TtlConfig,
    /// Segredo compartilhado esperado no cookie `auth`.
    pub auth_token: String,
}

impl ServerConfig {
    pub fn new(auth_token: impl Into<String>) -> Self {
        Self {
            host: DEFAULT_HOST.into(),
            port: DEFAULT_PORT,
            ttl: TtlConfig::default(),
            auth_token: auth_token.into(),
        }
    }
}

/// Os dois stores, compostos só aqui na borda HTTP.
pub struct AppState {
    pub places: PlaceRegistry,
    pub scripts: PendingScriptQueue,
    auth_token: String,
}

impl AppState {
    pub fn new(config: &ServerConfig, clock: SharedClock) -> Self {
        Self {
            places: PlaceRegistry::new(config.ttl.place_ttl, clock.clone()),
            scripts: PendingScriptQueue::new(config.ttl.script_ttl, clock),
            auth_token: config.auth_token.clone(),
        }
    }

    pub fn auth_token(&self) -> &str {
        &self.auth_token
    }
}
