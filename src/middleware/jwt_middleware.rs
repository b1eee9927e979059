/// Request Guard
///
/// Validates the bearer access token on protected routes and injects its
/// claims into request extensions for handlers (`web::ReqData<Claims>`).
/// Only the token is checked; the user store is never touched here.

use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    http::header::AUTHORIZATION,
    Error, HttpMessage,
};
use futures::future::LocalBoxFuture;
use std::rc::Rc;

use crate::auth::{validate_access_token, Claims};
use crate::configuration::JwtSettings;
use crate::error::{AppError, AuthError, TokenError};

/// Extract the token from an `Authorization: Bearer <token>` value.
/// The scheme name is matched case-insensitively.
pub fn bearer_token(header: Option<&str>) -> Option<&str> {
    let (scheme, token) = header?.trim_start().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("Bearer") {
        return None;
    }
    Some(token.trim()).filter(|token| !token.is_empty())
}

/// Decide a guarded request from its raw `Authorization` header.
///
/// - no bearer credential: `Unauthenticated`
/// - credential rejected by the verifier: `Forbidden`
/// - otherwise the verified claims
pub fn authorize(header: Option<&str>, config: &JwtSettings) -> Result<Claims, AuthError> {
    let token = bearer_token(header).ok_or(AuthError::Unauthenticated)?;

    validate_access_token(token, config).map_err(|e| {
        match e {
            TokenError::Expired => tracing::info!("Access token expired"),
            TokenError::Invalid(reason) => tracing::warn!(reason = %reason, "Access token rejected"),
        }
        AuthError::Forbidden
    })
}

/// JWT middleware for protecting routes
pub struct JwtMiddleware {
    jwt_config: Rc<JwtSettings>,
}

impl JwtMiddleware {
    pub fn new(jwt_config: JwtSettings) -> Self {
        Self {
            jwt_config: Rc::new(jwt_config),
        }
    }
}

impl<S, B> Transform<S, ServiceRequest> for JwtMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = JwtMiddlewareService<S>;
    type Future = std::future::Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        std::future::ready(Ok(JwtMiddlewareService {
            service: Rc::new(service),
            jwt_config: self.jwt_config.clone(),
        }))
    }
}

pub struct JwtMiddlewareService<S> {
    service: Rc<S>,
    jwt_config: Rc<JwtSettings>,
}

impl<S, B> Service<ServiceRequest> for JwtMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let header = req
            .headers()
            .get(AUTHORIZATION)
            .and_then(|h| h.to_str().ok());

        match authorize(header, &self.jwt_config) {
            Ok(claims) => {
                tracing::debug!(user_id = claims.id, "Access token validated");
                req.extensions_mut().insert(claims);

                let service = self.service.clone();
                Box::pin(async move { service.call(req).await })
            }
            Err(e) => Box::pin(async move { Err(AppError::Auth(e).into()) }),
        }
    }
}
