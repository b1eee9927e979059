use std::sync::Arc;

use tracing::instrument;

use super::claims::Identity;
use super::domain::{non_empty, LoginRequest, RefreshRequest, RegisterRequest, TokenPair, UserProfile};
use super::jwt::{generate_access_token, generate_refresh_token, validate_refresh_token};
use super::password::{hash_password, verify_password};
use crate::configuration::JwtSettings;
use crate::error::{AppError, AuthError, StoreError, TokenError, ValidationError};
use crate::store::{NewUser, UserStore};

const REGISTER_FIELDS_MISSING: &str = "Please fill in all fields";
const LOGIN_FIELDS_MISSING: &str = "Please provide email and password";
const UNKNOWN_USER_PASSWORD: &str = "authgate-unknown-user";

/// Register, login, refresh and profile lookup, independent of the web layer
pub struct AuthService {
    store: Arc<dyn UserStore>,
    jwt: JwtSettings,
    bcrypt_cost: u32,
    /// Verified against on logins for unknown emails, at the same cost as
    /// real digests, so both failure paths do the same bcrypt work
    unknown_user_digest: String,
}

impl AuthService {
    pub fn new(store: Arc<dyn UserStore>, jwt: JwtSettings, bcrypt_cost: u32) -> Self {
        let unknown_user_digest = hash_password(UNKNOWN_USER_PASSWORD, bcrypt_cost)
            .unwrap_or_else(|e| {
                tracing::warn!(error = %e, "Failed to prepare digest for unknown-user logins");
                String::new()
            });

        Self {
            store,
            jwt,
            bcrypt_cost,
            unknown_user_digest,
        }
    }

    /// Create an account and return its id. Does not log the user in.
    #[instrument(name = "register", skip(self, request), fields(email = tracing::field::Empty))]
    pub async fn register(&self, request: RegisterRequest) -> Result<u64, AppError> {
        let (email, first_name, last_name, password) = match (
            non_empty(request.email),
            non_empty(request.first_name),
            non_empty(request.last_name),
            non_empty(request.password),
        ) {
            (Some(email), Some(first), Some(last), Some(password)) => (email, first, last, password),
            _ => return Err(ValidationError::MissingFields(REGISTER_FIELDS_MISSING).into()),
        };
        tracing::Span::current().record("email", email.as_str());

        if self.store.find_by_email(&email).await?.is_some() {
            return Err(StoreError::DuplicateIdentity(email).into());
        }

        let cost = self.bcrypt_cost;
        let password_hash =
            tokio::task::spawn_blocking(move || hash_password(&password, cost)).await??;

        // The store re-checks uniqueness under its lock, so a concurrent
        // registration of the same email still ends in DuplicateIdentity.
        let user = self
            .store
            .create(NewUser {
                email,
                first_name,
                last_name,
                password_hash,
            })
            .await?;

        tracing::info!(user_id = user.id, "User registered successfully");
        Ok(user.id)
    }

    /// Verify credentials and issue an access and refresh token.
    ///
    /// Unknown email and wrong password produce the same error.
    #[instrument(name = "login", skip(self, request), fields(email = tracing::field::Empty))]
    pub async fn login(&self, request: LoginRequest) -> Result<TokenPair, AppError> {
        let (email, password) = match (non_empty(request.email), non_empty(request.password)) {
            (Some(email), Some(password)) => (email, password),
            _ => return Err(ValidationError::MissingFields(LOGIN_FIELDS_MISSING).into()),
        };
        tracing::Span::current().record("email", email.as_str());

        let user = self.store.find_by_email(&email).await?;

        // Unknown emails still pay for one bcrypt verify.
        let digest = user
            .as_ref()
            .map_or_else(|| self.unknown_user_digest.clone(), |u| u.password_hash.clone());
        let password_valid =
            tokio::task::spawn_blocking(move || verify_password(&password, &digest)).await?;

        let user = match user {
            Some(user) if password_valid => user,
            Some(user) => {
                tracing::debug!(user_id = user.id, "Login with wrong password");
                return Err(AuthError::InvalidCredentials.into());
            }
            None => {
                tracing::debug!("Login for unknown email");
                return Err(AuthError::InvalidCredentials.into());
            }
        };

        let identity = Identity {
            id: user.id,
            email: user.email,
        };
        let tokens = TokenPair {
            access_token: generate_access_token(&identity, &self.jwt)?,
            refresh_token: generate_refresh_token(&identity, &self.jwt)?,
        };

        tracing::info!(user_id = identity.id, "User logged in successfully");
        Ok(tokens)
    }

    /// Mint a new access token from a valid refresh token.
    ///
    /// The refresh token is not rotated and stays usable until it expires.
    #[instrument(name = "refresh", skip(self, request))]
    pub async fn refresh(&self, request: RefreshRequest) -> Result<String, AppError> {
        let token = non_empty(request.refresh_token).ok_or(ValidationError::MissingToken)?;

        let claims = validate_refresh_token(&token, &self.jwt).map_err(|e| {
            match &e {
                TokenError::Expired => tracing::info!("Refresh token expired"),
                TokenError::Invalid(reason) => {
                    tracing::warn!(reason = %reason, "Refresh token rejected")
                }
            }
            AppError::from(AuthError::InvalidOrExpiredToken)
        })?;

        let access_token = generate_access_token(&claims.identity(), &self.jwt)?;

        tracing::info!(user_id = claims.id, "Access token refreshed");
        Ok(access_token)
    }

    /// Profile of the user a verified access token names
    #[instrument(name = "profile", skip(self))]
    pub async fn profile(&self, user_id: u64) -> Result<UserProfile, AppError> {
        self.store
            .find_by_id(user_id)
            .await?
            .map(UserProfile::from)
            .ok_or_else(|| AuthError::UserNotFound.into())
    }
}
