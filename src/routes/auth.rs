/// Authentication Routes
///
/// Thin adapters from HTTP to `AuthService`. Status codes for failures come
/// from `AppError`'s `ResponseError` impl.

use actix_web::{web, HttpResponse};

use crate::auth::domain::{
    AccessTokenResponse, LoginRequest, RefreshRequest, RegisterRequest, RegisterResponse,
};
use crate::auth::AuthService;
use crate::error::AppError;

/// POST /auth/register
///
/// Body: `{email, firstName, lastName, password}`
///
/// # Responses
/// - 201: `{message, userId}`
/// - 400: missing fields, or email already registered
/// - 500: store or internal failure
pub async fn register(
    form: web::Json<RegisterRequest>,
    service: web::Data<AuthService>,
) -> Result<HttpResponse, AppError> {
    let user_id = service.register(form.into_inner()).await?;

    Ok(HttpResponse::Created().json(RegisterResponse {
        message: "User registered successfully".to_string(),
        user_id,
    }))
}

/// POST /auth/login
///
/// Body: `{email, password}`
///
/// # Responses
/// - 200: `{accessToken, refreshToken}`
/// - 400: missing fields or invalid credentials (one message for both
///   unknown email and wrong password)
/// - 500: store or internal failure
pub async fn login(
    form: web::Json<LoginRequest>,
    service: web::Data<AuthService>,
) -> Result<HttpResponse, AppError> {
    let tokens = service.login(form.into_inner()).await?;
    Ok(HttpResponse::Ok().json(tokens))
}

/// POST /auth/refresh
///
/// Body: `{refreshToken}`
///
/// # Responses
/// - 200: `{accessToken}`
/// - 400: no refresh token supplied
/// - 403: refresh token invalid or expired
pub async fn refresh(
    form: web::Json<RefreshRequest>,
    service: web::Data<AuthService>,
) -> Result<HttpResponse, AppError> {
    let access_token = service.refresh(form.into_inner()).await?;
    Ok(HttpResponse::Ok().json(AccessTokenResponse { access_token }))
}
