use mimalloc::MiMalloc;
use petfeed_relay::api::DownstreamClient;
use petfeed_relay::config::Config;
use petfeed_relay::db::RegistryStore;
use petfeed_relay::router::{RelayState, relay_router};
use petfeed_relay::service::session_reaper;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    let cfg = Config::load()?;

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(cfg.basic.loglevel.clone()));
    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_level(true)
                .with_target(false),
        )
        .init();

    info!(
        database_url = %cfg.basic.database_url,
        api_base = %cfg.downstream.api_base,
        module_base = %cfg.downstream.module_base,
        error_mode = ?cfg.basic.error_mode,
        loglevel = %cfg.basic.loglevel
    );

    let store = RegistryStore::connect(&cfg.basic.database_url).await?;
    session_reaper::spawn(
        store.clone(),
        Duration::from_secs(cfg.basic.session_sweep_secs.max(1)),
    );

    let downstream = DownstreamClient::new(&cfg.downstream)?;
    let state = RelayState::new(downstream, store, cfg.basic.error_mode);
    let app = relay_router(state);

    let listener = TcpListener::bind(cfg.basic.listen_addr.as_str()).await?;
    info!("HTTP server listening on {}", cfg.basic.listen_addr);
    axum::serve(listener, app).await?;
    Ok(())
}
