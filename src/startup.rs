use actix_cors::Cors;
use actix_web::dev::Server;
use actix_web::{error, web, App, HttpServer};
use std::net::TcpListener;
use std::sync::Arc;

use crate::auth::AuthService;
use crate::configuration::{HashingSettings, JwtSettings};
use crate::error::{AppError, ValidationError};
use crate::logger::RequestLogger;
use crate::middleware::JwtMiddleware;
use crate::routes::{get_profile, health_check, index, login, refresh, register};
use crate::store::UserStore;

/// Malformed JSON bodies become a 400 in the service's error format
fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err, _req| {
        let app_error = AppError::Validation(ValidationError::MalformedBody(err.to_string()));
        error::Error::from(app_error)
    })
}

pub fn run(
    listener: TcpListener,
    store: Arc<dyn UserStore>,
    jwt_config: JwtSettings,
    hashing: HashingSettings,
) -> Result<Server, std::io::Error> {
    let service = web::Data::new(AuthService::new(
        store,
        jwt_config.clone(),
        hashing.bcrypt_cost,
    ));

    let server = HttpServer::new(move || {
        App::new()
            .wrap(RequestLogger)
            // Browser frontends on any origin may call the API
            .wrap(Cors::permissive())
            .app_data(service.clone())
            .app_data(json_config())
            // Public routes
            .route("/", web::get().to(index))
            .route("/health_check", web::get().to(health_check))
            .service(
                web::scope("/auth")
                    .route("/register", web::post().to(register))
                    .route("/login", web::post().to(login))
                    .route("/refresh", web::post().to(refresh)),
            )
            // Protected routes (require a valid access token)
            .service(
                web::scope("/profile")
                    .wrap(JwtMiddleware::new(jwt_config.clone()))
                    .route("", web::get().to(get_profile)),
            )
    })
    .listen(listener)?
    .run();

    Ok(server)
}
