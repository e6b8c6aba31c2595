//! Rotas HTTP compartilhadas entre servidor e clientes.

pub const ADD_PLACE: &str = "/api/addPlace";
pub const OPTIONS: &str = "/api/options";
pub const EXECUTE: &str = "/api/execute";
pub const PENDING_SCRIPTS: &str = "/api/pendingScripts";
pub const HEALTH: &str = "/health";
