#![forbid(unsafe_code)]

mod config;
mod error;

pub use config::*;
pub use error::*;

pub const DEFAULT_PORT: u16 = 5000;
pub const DEFAULT_HOST: &str = "127.0.0.1";
/// Nome do cookie que carrega o segredo compartilhado.
pub const AUTH_COOKIE: &str = "auth";
