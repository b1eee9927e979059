use dotenvy::dotenv;
use std::net::TcpListener;
use std::sync::Arc;

use authgate::configuration::get_configuration;
use authgate::startup::run;
use authgate::store::JsonFileUserStore;
use authgate::telemetry::init_telemetry;

#[tokio::main]
async fn main() -> std::io::Result<()> {
    // A local .env may supply PORT and the token secrets
    dotenv().ok();

    let configuration = get_configuration().map_err(|e| {
        eprintln!("Failed to read configuration: {}", e);
        std::io::Error::new(std::io::ErrorKind::InvalidInput, "Configuration error")
    })?;

    init_telemetry(&configuration.logging);
    tracing::info!("Configuration loaded successfully");

    if configuration.jwt.uses_development_secrets() {
        tracing::warn!(
            "Using development token secrets; set ACCESS_TOKEN_SECRET and REFRESH_TOKEN_SECRET in production"
        );
    }

    let store = JsonFileUserStore::new(configuration.storage.users_file.clone())
        .await
        .map_err(|e| {
            tracing::error!("Failed to open user store: {}", e);
            std::io::Error::new(std::io::ErrorKind::Other, "User store error")
        })?;

    let address = configuration.application.address();
    let listener = TcpListener::bind(&address)?;
    tracing::info!("Server listening on: {}", address);

    let server = run(
        listener,
        Arc::new(store),
        configuration.jwt.clone(),
        configuration.hashing.clone(),
    )?;

    server.await
}
