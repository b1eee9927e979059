use config::ConfigError;
use std::path::PathBuf;

use crate::auth::password::{MAX_COST, MIN_COST};

/// Development-only signing secrets used when nothing else is configured
pub const DEV_ACCESS_SECRET: &str = "youraccesstokensecret";
pub const DEV_REFRESH_SECRET: &str = "yourrefreshtokensecret";

#[derive(serde::Deserialize, Clone, Debug)]
pub struct Settings {
    pub application: ApplicationSettings,
    pub jwt: JwtSettings,
    pub storage: StorageSettings,
    pub hashing: HashingSettings,
    pub logging: LogSettings,
}

#[derive(serde::Deserialize, Clone, Debug)]
pub struct ApplicationSettings {
    pub host: String,
    pub port: u16,
}

impl ApplicationSettings {
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// JWT signing settings. Access and refresh tokens never share a secret.
#[derive(serde::Deserialize, Clone)]
pub struct JwtSettings {
    pub access_secret: String,
    pub refresh_secret: String,
    pub access_token_expiry: i64,   // seconds (1800 = 30 minutes)
    pub refresh_token_expiry: i64,  // seconds (604800 = 7 days)
    pub issuer: String,
}

impl JwtSettings {
    /// True when either secret is still the built-in development value
    pub fn uses_development_secrets(&self) -> bool {
        self.access_secret == DEV_ACCESS_SECRET || self.refresh_secret == DEV_REFRESH_SECRET
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.access_secret.is_empty() || self.refresh_secret.is_empty() {
            return Err(ConfigError::Message("jwt secrets must not be empty".into()));
        }
        if self.access_secret == self.refresh_secret {
            return Err(ConfigError::Message(
                "jwt.access_secret and jwt.refresh_secret must differ".into(),
            ));
        }
        if self.access_token_expiry <= 0 || self.refresh_token_expiry <= 0 {
            return Err(ConfigError::Message("token lifetimes must be positive".into()));
        }
        Ok(())
    }
}

// Secrets stay out of logs.
impl std::fmt::Debug for JwtSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtSettings")
            .field("access_secret", &"[redacted]")
            .field("refresh_secret", &"[redacted]")
            .field("access_token_expiry", &self.access_token_expiry)
            .field("refresh_token_expiry", &self.refresh_token_expiry)
            .field("issuer", &self.issuer)
            .finish()
    }
}

#[derive(serde::Deserialize, Clone, Debug)]
pub struct StorageSettings {
    /// JSON file holding the user collection
    pub users_file: PathBuf,
}

#[derive(serde::Deserialize, Clone, Debug)]
pub struct HashingSettings {
    pub bcrypt_cost: u32,
}

#[derive(serde::Deserialize, Clone, Debug)]
pub struct LogSettings {
    /// Default filter directive, overridden by RUST_LOG
    pub level: String,
    pub json: bool,
}

/// Load settings from defaults, an optional `configuration` file,
/// `APP_*` environment variables and the legacy variables
/// `PORT`, `ACCESS_TOKEN_SECRET`, `REFRESH_TOKEN_SECRET`, `USERS_FILE`.
pub fn get_configuration() -> Result<Settings, ConfigError> {
    let settings = config::Config::builder()
        .set_default("application.host", "127.0.0.1")?
        .set_default("application.port", 5000_i64)?
        .set_default("jwt.access_secret", DEV_ACCESS_SECRET)?
        .set_default("jwt.refresh_secret", DEV_REFRESH_SECRET)?
        .set_default("jwt.access_token_expiry", 1800_i64)?
        .set_default("jwt.refresh_token_expiry", 604_800_i64)?
        .set_default("jwt.issuer", "authgate")?
        .set_default("storage.users_file", "data/users.json")?
        .set_default("hashing.bcrypt_cost", 10_i64)?
        .set_default("logging.level", "info")?
        .set_default("logging.json", true)?
        .add_source(config::File::with_name("configuration").required(false))
        .add_source(
            config::Environment::with_prefix("APP")
                .prefix_separator("_")
                .separator("__"),
        )
        .set_override_option("application.port", std::env::var("PORT").ok())?
        .set_override_option("jwt.access_secret", std::env::var("ACCESS_TOKEN_SECRET").ok())?
        .set_override_option("jwt.refresh_secret", std::env::var("REFRESH_TOKEN_SECRET").ok())?
        .set_override_option("storage.users_file", std::env::var("USERS_FILE").ok())?
        .build()?;

    let settings = settings.try_deserialize::<Settings>()?;
    settings.validate()?;
    Ok(settings)
}

impl Settings {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.jwt.validate()?;
        if !(MIN_COST..=MAX_COST).contains(&self.hashing.bcrypt_cost) {
            return Err(ConfigError::Message(format!(
                "hashing.bcrypt_cost must be between {} and {}",
                MIN_COST,
                MAX_COST
            )));
        }
        Ok(())
    }
}
