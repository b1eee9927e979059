/// Token Issuer and Verifier
///
/// HS256 tokens in two classes. Each class has its own secret and its own
/// lifetime, so a refresh token never verifies as an access token and a
/// leaked key of one class cannot forge the other.

use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};

use crate::auth::claims::{Claims, Identity};
use crate::configuration::JwtSettings;
use crate::error::{AppError, TokenError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Access,
    Refresh,
}

impl TokenKind {
    fn secret(self, config: &JwtSettings) -> &[u8] {
        match self {
            TokenKind::Access => config.access_secret.as_bytes(),
            TokenKind::Refresh => config.refresh_secret.as_bytes(),
        }
    }

    /// Lifetime in seconds
    fn lifetime(self, config: &JwtSettings) -> i64 {
        match self {
            TokenKind::Access => config.access_token_expiry,
            TokenKind::Refresh => config.refresh_token_expiry,
        }
    }
}

/// Sign a token of `kind` for `identity`
pub fn issue_token(
    kind: TokenKind,
    identity: &Identity,
    config: &JwtSettings,
) -> Result<String, AppError> {
    let claims = Claims::new(identity, kind.lifetime(config), &config.issuer);

    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(kind.secret(config)),
    )
    .map_err(|e| AppError::Internal(format!("{:?} token generation failed: {}", kind, e)))
}

/// Check signature, issuer and expiry of a `kind` token and return its claims
pub fn validate_token(
    kind: TokenKind,
    token: &str,
    config: &JwtSettings,
) -> Result<Claims, TokenError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_issuer(&[&config.issuer]);
    validation.set_required_spec_claims(&["exp", "iss"]);
    validation.leeway = 0;

    let claims = decode::<Claims>(
        token,
        &DecodingKey::from_secret(kind.secret(config)),
        &validation,
    )
    .map(|data| data.claims)
    .map_err(|e| match e.kind() {
        ErrorKind::ExpiredSignature => TokenError::Expired,
        _ => TokenError::Invalid(e.to_string()),
    })?;

    if claims.email.is_empty() {
        return Err(TokenError::Invalid("empty subject email".to_string()));
    }

    Ok(claims)
}

pub fn generate_access_token(identity: &Identity, config: &JwtSettings) -> Result<String, AppError> {
    issue_token(TokenKind::Access, identity, config)
}

pub fn generate_refresh_token(identity: &Identity, config: &JwtSettings) -> Result<String, AppError> {
    issue_token(TokenKind::Refresh, identity, config)
}

pub fn validate_access_token(token: &str, config: &JwtSettings) -> Result<Claims, TokenError> {
    validate_token(TokenKind::Access, token, config)
}

pub fn validate_refresh_token(token: &str, config: &JwtSettings) -> Result<Claims, TokenError> {
    validate_token(TokenKind::Refresh, token, config)
}
