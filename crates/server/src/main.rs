use clap::Parser;
use tokio::signal;
use tracing::{error, info};

use placehub_common::{
    DEFAULT_CLEAN_MS, DEFAULT_HOST, DEFAULT_PLACE_TTL_MS, DEFAULT_PORT, DEFAULT_SCRIPT_TTL_MS,
    TtlConfig,
};
use placehub_server::{ApiServer, ServerConfig};

#[derive(Parser, Debug)]
#[command(
    name = "placehub-server",
    about = "PlaceHub — registro de places e fila de scripts pendentes"
)]
struct Args {
    #[arg(long, env = "PLACEHUB_HOST", default_value = DEFAULT_HOST)]
    host: String,
    #[arg(long, env = "PLACEHUB_PORT", default_value_t = DEFAULT_PORT)]
    port: u16,
    /// Segredo esperado no cookie `auth` das rotas protegidas
    #[arg(long, env = "PLACEHUB_AUTH_TOKEN", hide_env_values = true)]
    auth_token: String,
    /// Tempo sem heartbeat até um place sumir
    #[arg(long, env = "PLACE_TTL_MS", default_value_t = DEFAULT_PLACE_TTL_MS)]
    place_ttl_ms: u64,
    /// Intervalo do sweeper
    #[arg(long, env = "CLEAN_MS", default_value_t = DEFAULT_CLEAN_MS)]
    clean_ms: u64,
    /// Tempo de vida de um script pendente
    #[arg(long, env = "SCRIPT_TTL_MS", default_value_t = DEFAULT_SCRIPT_TTL_MS)]
    script_ttl_ms: u64,
}

async fn shutdown_signal() {
    if let Err(e) = signal::ctrl_c().await {
        error!("falha ao escutar ctrl-c: {e}");
        return;
    }
    info!("shutdown signal recebido");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "placehub_server=info,placehub_storage=info,tower_http=info".into()
            }),
        )
        .init();

    let args = Args::parse();

    let config = ServerConfig {
        host: args.host,
        port: args.port,
        ttl: TtlConfig::from_millis(args.place_ttl_ms, args.clean_ms, args.script_ttl_ms),
        auth_token: args.auth_token,
    };
    info!(
        place_ttl_ms = args.place_ttl_ms,
        clean_ms = args.clean_ms,
        script_ttl_ms = args.script_ttl_ms,
        "configuração carregada"
    );

    let server = ApiServer::new(config)?;
    server.run(shutdown_signal()).await?;

    Ok(())
}
