use broker::Broker;
use log::*;
use service::config::Config;
use service::logging::Logger;
use service::AppState;
use std::sync::Arc;

#[tokio::main]
async fn main() {
    let config = Config::new();
    Logger::init_logger(&config);

    info!("Starting email relay in {} mode", config.runtime_env);

    let broker = Arc::new(Broker::new());
    let app_state = AppState::new(config, &broker);

    if let Err(e) = web::init_server(app_state).await {
        error!("Server error: {e}");
        std::process::exit(1);
    }
}
