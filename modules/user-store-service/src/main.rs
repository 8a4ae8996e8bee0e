//! User Store Service: standalone binary serving the CSV user table and
//! per-user context logs.
//!
//! Default: http://0.0.0.0:8001/

use std::sync::Arc;
use user_store_service::build_router;
use user_store_service::config::Config;
use user_store_service::routes::AppState;
use user_store_service::service::UserStore;

#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();
    env_logger::init();

    let config = Config::from_env();

    log::info!("Storing user data under: {}", config.data_dir.display());
    if config.uses_default_key() {
        log::warn!("No API key configured, using the default development key");
    }

    let state = Arc::new(AppState {
        store: UserStore::new(config.data_dir.clone()),
        api_key: config.api_key.clone(),
    });

    let app = build_router(state);

    let addr = config.bind_addr();
    log::info!("User Store Service listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("Failed to bind");

    axum::serve(listener, app).await.expect("Server error");
}
