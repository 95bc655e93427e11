use actix_web::{middleware::Logger, web, App, HttpServer};
use d2d_lib::config::{get_env_var_or_default, Settings, DEV_OBJECT_URL_SECRET};
use log::{info, warn};
use std::env;

pub(crate) mod router;
pub(crate) mod state;

use state::AppState;

#[tokio::main]
async fn main() -> std::io::Result<()> {
    dotenv::dotenv().ok();
    let log_level = env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));
    info!("Logger initialized at log level: {}", log_level);

    if let Err(e) = d2d_database::setup().await {
        panic!("Failed to setup database connection: {}", e);
    }

    let settings = Settings::from_env();
    if settings.object_url_secret == DEV_OBJECT_URL_SECRET {
        warn!("OBJECT_URL_SECRET is not set, download links are signed with the development secret");
    }
    let state = match AppState::from_settings(settings) {
        Ok(state) => web::Data::new(state),
        Err(e) => panic!("Failed to build application state: {}", e),
    };
    info!(
        "Storing objects in {} ({}), fitting with {}",
        state.settings.object_store_root,
        state.objects.backend_tag(),
        state.settings.fit_service_url
    );

    let bind_address = get_env_var_or_default("BIND_ADDRESS", "0.0.0.0");
    let port = get_env_var_or_default("PORT", "8080")
        .parse::<u16>()
        .unwrap_or(8080);

    HttpServer::new(move || {
        let cors = actix_cors::Cors::default()
            .allow_any_origin()
            .allow_any_method()
            .allow_any_header();
        App::new()
            .app_data(state.clone())
            .wrap(Logger::default())
            .wrap(cors)
            .configure(router::configure)
    })
    .bind((bind_address, port))?
    .run()
    .await
}
