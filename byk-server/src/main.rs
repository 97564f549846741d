use byk_server::{Config, Server, ServerState, init_logger_with_file, print_banner};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. .env, then configuration
    dotenv::dotenv().ok();
    let config = Config::from_env();

    // 2. Logging
    if let Some(dir) = &config.log_dir {
        std::fs::create_dir_all(dir)?;
    }
    init_logger_with_file(
        Some(&config.log_level),
        Some(config.is_production()),
        config.log_dir.as_deref(),
    );

    print_banner();
    tracing::info!(
        environment = %config.environment,
        timezone = %config.timezone,
        slot_minutes = config.slot_duration_minutes,
        "Byk server starting..."
    );

    // 3. State (database, table seed, managers)
    let state = ServerState::initialize(&config)?;

    // 4. HTTP server until ctrl-c
    let server = Server::with_state(config, state);
    if let Err(e) = server.run().await {
        tracing::error!("Server error: {:#}", e);
        return Err(e);
    }

    Ok(())
}
