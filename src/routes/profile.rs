use actix_web::{web, HttpResponse};

use crate::auth::{AuthService, Claims};
use crate::error::AppError;

/// GET /profile
///
/// Requires `Authorization: Bearer <access_token>`; the guard injects the
/// claims. Responds 404 if the token's user no longer exists.
pub async fn get_profile(
    claims: web::ReqData<Claims>,
    service: web::Data<AuthService>,
) -> Result<HttpResponse, AppError> {
    let profile = service.profile(claims.id).await?;
    Ok(HttpResponse::Ok().json(profile))
}
