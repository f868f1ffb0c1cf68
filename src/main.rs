use std::sync::Arc;

mod config;
mod handler;
mod http;
mod logger;
mod routes;
mod routing;
mod server;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Config path without extension, e.g. `config` for `config.toml`
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| config::DEFAULT_CONFIG_PATH.to_string());
    let cfg = config::Config::load_from(&config_path)?;

    logger::init(&cfg)?;

    let mut runtime_builder = tokio::runtime::Builder::new_multi_thread();
    runtime_builder.enable_all();

    if let Some(workers) = cfg.server.workers {
        runtime_builder.worker_threads(workers);
        println!("[CONFIG] Using {workers} worker threads");
    } else {
        println!("[CONFIG] Using default worker threads (CPU cores)");
    }

    let runtime = runtime_builder.build()?;

    runtime.block_on(async_main(cfg))
}

async fn async_main(cfg: config::Config) -> Result<(), Box<dyn std::error::Error>> {
    let addr = cfg.get_socket_addr()?;
    let listener = server::create_reusable_listener(addr)?;
    // Report the bound address; port 0 resolves here
    let addr = listener.local_addr()?;

    let state = Arc::new(config::AppState::new(&cfg));
    let active_connections = Arc::new(server::ActiveConnections::new());

    logger::log_server_start(&addr, &cfg, &state.routes);
    println!("[CONFIG] Loaded configuration:");
    println!("  - Max body size: {} bytes", cfg.http.max_body_size);
    println!("  - Max connections: {:?}", cfg.performance.max_connections);
    println!("  - Access log format: {}\n", cfg.logging.access_log_format);

    let signals = Arc::new(server::SignalHandler::new());
    server::start_signal_handler(Arc::clone(&signals));

    // Use LocalSet for spawn_local support
    let local = tokio::task::LocalSet::new();
    local
        .run_until(server::start_server_loop(
            listener,
            state,
            active_connections,
            signals,
        ))
        .await
}
