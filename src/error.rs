/// Error Handling Module
///
/// One application error type, `AppError`, built from small domain enums:
/// 1. Validation errors (malformed or incomplete input)
/// 2. Store errors (persistence and uniqueness)
/// 3. Auth errors (credentials, tokens, guard rejections)
/// 4. Token errors (raw verifier outcome, mapped by each caller)
///
/// Client errors map to 4xx with a readable message. Store and internal
/// failures are logged in full and surface as an opaque 500.

use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};
use std::error::Error as StdError;
use std::fmt;

/// ============================================================================
/// 1. DOMAIN-SPECIFIC ERROR TYPES
/// ============================================================================

/// Input errors detected before any store or token work happens
#[derive(Debug, Clone)]
pub enum ValidationError {
    /// One or more required fields are absent or empty. Carries the
    /// message shown to the client.
    MissingFields(&'static str),
    MissingToken,
    MalformedBody(String),
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::MissingFields(msg) => write!(f, "{}", msg),
            ValidationError::MissingToken => write!(f, "Refresh token is required"),
            ValidationError::MalformedBody(_) => write!(f, "Request body must be valid JSON"),
        }
    }
}

impl StdError for ValidationError {}

/// Credential store errors
#[derive(Debug)]
pub enum StoreError {
    /// A record with this email already exists
    DuplicateIdentity(String),
    /// Backing file could not be read, parsed or written
    Unavailable(String),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::DuplicateIdentity(_) => write!(f, "User with this email already exists"),
            StoreError::Unavailable(msg) => write!(f, "User store unavailable: {}", msg),
        }
    }
}

impl StdError for StoreError {}

/// Authentication and authorization errors
#[derive(Debug)]
pub enum AuthError {
    /// Unknown email or wrong password. Deliberately a single variant.
    InvalidCredentials,
    InvalidOrExpiredToken,
    /// No bearer credential on a guarded request
    Unauthenticated,
    /// Bearer credential present but rejected by the verifier
    Forbidden,
    /// Token is valid but its subject no longer resolves to a record
    UserNotFound,
}

impl fmt::Display for AuthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthError::InvalidCredentials => write!(f, "Invalid credentials"),
            AuthError::InvalidOrExpiredToken => write!(f, "Invalid or expired refresh token"),
            AuthError::Unauthenticated => write!(f, "Missing or invalid authorization header"),
            AuthError::Forbidden => write!(f, "Invalid or expired token"),
            AuthError::UserNotFound => write!(f, "User not found"),
        }
    }
}

impl StdError for AuthError {}

/// Outcome of a failed token verification
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenError {
    /// Bad signature, wrong secret, wrong issuer or unexpected claim shape
    Invalid(String),
    Expired,
}

impl fmt::Display for TokenError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenError::Invalid(reason) => write!(f, "invalid token: {}", reason),
            TokenError::Expired => write!(f, "token has expired"),
        }
    }
}

impl StdError for TokenError {}

/// ============================================================================
/// 2. UNIFIED APPLICATION ERROR TYPE
/// ============================================================================

#[derive(Debug)]
pub enum AppError {
    Validation(ValidationError),
    Store(StoreError),
    Auth(AuthError),
    Internal(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Validation(e) => write!(f, "{}", e),
            AppError::Store(e) => write!(f, "{}", e),
            AppError::Auth(e) => write!(f, "{}", e),
            AppError::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl StdError for AppError {}

impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        AppError::Validation(err)
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        AppError::Store(err)
    }
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        AppError::Auth(err)
    }
}

impl From<tokio::task::JoinError> for AppError {
    fn from(err: tokio::task::JoinError) -> Self {
        AppError::Internal(format!("blocking task failed: {}", err))
    }
}

// ============================================================================
// 3. HTTP RESPONSE MAPPING
// ============================================================================

/// Error response body
#[derive(Debug, serde::Serialize)]
pub struct ErrorResponse {
    /// Unique error ID, also written to the server log
    pub error_id: String,
    pub message: String,
    /// Error code for client-side handling
    pub code: String,
    pub status: u16,
    pub timestamp: String,
}

impl ErrorResponse {
    pub fn new(error_id: String, message: String, code: String, status: u16) -> Self {
        Self {
            error_id,
            message,
            code,
            status,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

impl AppError {
    /// Status, machine code and client-safe message for this error
    fn describe(&self) -> (StatusCode, &'static str, String) {
        match self {
            AppError::Validation(e) => {
                let code = match e {
                    ValidationError::MissingFields(_) => "MISSING_FIELDS",
                    ValidationError::MissingToken => "MISSING_TOKEN",
                    ValidationError::MalformedBody(_) => "MALFORMED_BODY",
                };
                (StatusCode::BAD_REQUEST, code, e.to_string())
            }
            AppError::Store(e) => match e {
                StoreError::DuplicateIdentity(_) => {
                    (StatusCode::BAD_REQUEST, "DUPLICATE_IDENTITY", e.to_string())
                }
                StoreError::Unavailable(_) => (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "STORE_UNAVAILABLE",
                    "Server error".to_string(),
                ),
            },
            AppError::Auth(e) => {
                let (status, code) = match e {
                    AuthError::InvalidCredentials => {
                        (StatusCode::BAD_REQUEST, "INVALID_CREDENTIALS")
                    }
                    AuthError::InvalidOrExpiredToken => {
                        (StatusCode::FORBIDDEN, "INVALID_OR_EXPIRED_TOKEN")
                    }
                    AuthError::Unauthenticated => (StatusCode::UNAUTHORIZED, "UNAUTHENTICATED"),
                    AuthError::Forbidden => (StatusCode::FORBIDDEN, "FORBIDDEN"),
                    AuthError::UserNotFound => (StatusCode::NOT_FOUND, "USER_NOT_FOUND"),
                };
                (status, code, e.to_string())
            }
            AppError::Internal(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                "Server error".to_string(),
            ),
        }
    }

    /// Build the response body tagged with `request_id`
    pub fn to_error_response(&self, request_id: &str) -> (StatusCode, ErrorResponse) {
        let (status, code, message) = self.describe();
        let body = ErrorResponse::new(
            request_id.to_string(),
            message,
            code.to_string(),
            status.as_u16(),
        );
        (status, body)
    }

    pub fn log_error(&self, request_id: &str) {
        match self {
            AppError::Validation(ValidationError::MalformedBody(detail)) => {
                tracing::warn!(request_id = request_id, error = %detail, "Malformed request body");
            }
            AppError::Validation(e) => {
                tracing::warn!(request_id = request_id, error = %e, "Validation error");
            }
            AppError::Store(StoreError::DuplicateIdentity(email)) => {
                tracing::warn!(request_id = request_id, email = %email, "Duplicate registration attempt");
            }
            AppError::Store(e) => {
                tracing::error!(request_id = request_id, error = %e, "User store error");
            }
            AppError::Auth(AuthError::InvalidCredentials) => {
                tracing::warn!(request_id = request_id, "Invalid credentials attempt");
            }
            AppError::Auth(e) => {
                tracing::warn!(request_id = request_id, error = %e, "Authentication error");
            }
            AppError::Internal(msg) => {
                tracing::error!(request_id = request_id, error = %msg, "Internal error");
            }
        }
    }
}

impl ResponseError for AppError {
    fn error_response(&self) -> HttpResponse {
        let request_id = uuid::Uuid::new_v4().to_string();
        self.log_error(&request_id);

        let (status, body) = self.to_error_response(&request_id);
        HttpResponse::build(status).json(body)
    }

    fn status_code(&self) -> StatusCode {
        self.describe().0
    }
}
