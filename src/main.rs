use std::sync::Arc;

use optserve::config::Config;
use optserve::server::{self, AppState};
use optserve::{logger, ServeError};

fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let cfg = Config::load().map_err(ServeError::from)?;
    logger::init(&cfg.logging)?;

    // Worker threads default to the number of CPU cores
    let mut runtime_builder = tokio::runtime::Builder::new_multi_thread();
    runtime_builder.enable_all();
    if let Some(workers) = cfg.server.workers {
        runtime_builder.worker_threads(workers);
    }
    let runtime = runtime_builder.build()?;

    runtime.block_on(async_main(cfg))
}

async fn async_main(cfg: Config) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let addr = cfg.get_socket_addr()?;
    let listener = server::create_reusable_listener(addr).map_err(ServeError::from)?;
    let state = Arc::new(AppState::from_config(&cfg));

    logger::log_server_start(&addr, &cfg);
    server::run(listener, state).await?;
    Ok(())
}
