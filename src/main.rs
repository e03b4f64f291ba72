use std::sync::atomic::Ordering;
use std::sync::Arc;

mod config;
mod handler;
mod http;
mod logger;
mod server;
mod storage;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cfg = config::Config::load()?;

    let mut runtime_builder = tokio::runtime::Builder::new_multi_thread();
    runtime_builder.enable_all();
    if let Some(workers) = cfg.server.workers {
        runtime_builder.worker_threads(workers);
    }
    let runtime = runtime_builder.build()?;

    runtime.block_on(async_main(cfg))
}

async fn async_main(cfg: config::Config) -> Result<(), Box<dyn std::error::Error>> {
    let addr = cfg.get_socket_addr()?;

    // Database variant only: an unreachable database aborts startup here
    let store = storage::DiagramStore::connect(&cfg.storage).await?;

    let listener = server::create_reusable_listener(addr)?;

    logger::log_server_start(&addr, &cfg);
    if cfg.logging.level == "debug" {
        match cfg.to_toml() {
            Ok(rendered) => println!("[CONFIG] Effective configuration:\n{rendered}"),
            Err(e) => logger::log_warning(&format!("Could not render configuration: {e}")),
        }
    }

    let state = Arc::new(config::AppState::new(cfg, store));

    let signals = server::SignalHandler::new();
    server::signal::start_signal_handler(&signals);

    loop {
        tokio::select! {
            accepted = listener.accept() => match accepted {
                Ok((stream, peer_addr)) => {
                    if state.cached_access_log.load(Ordering::Relaxed) {
                        logger::log_connection_accepted(&peer_addr);
                    }
                    server::spawn_connection(stream, peer_addr, Arc::clone(&state));
                }
                Err(e) => logger::log_error(&format!("Failed to accept connection: {e}")),
            },

            () = signals.shutdown.notified() => {
                logger::log_shutdown();
                break;
            }
        }
    }

    Ok(())
}
