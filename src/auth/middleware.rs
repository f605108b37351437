use actix_web::error::ErrorUnauthorized;
use actix_web::{Error, HttpRequest};

use super::jwt::validate_token;
use super::model::{AuthUser, Claims};

/// Extract token from Authorization header
fn extract_token(req: &HttpRequest) -> Option<String> {
    req.headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|auth| auth.strip_prefix("Bearer ").map(|t| t.to_string()))
}

/// Validate token from HttpRequest and return claims
pub fn validate_request_token(req: &HttpRequest, secret: &str) -> Result<Claims, Error> {
    let token =
        extract_token(req).ok_or_else(|| ErrorUnauthorized("Missing authorization token"))?;

    let claims = validate_token(secret, &token).map_err(|e| {
        log::warn!("Token validation failed: {:?}", e);
        ErrorUnauthorized("Invalid or expired token")
    })?;

    if claims.token_type != "access" {
        return Err(ErrorUnauthorized("Invalid token type"));
    }

    Ok(claims)
}

/// Authenticated identity for a request, with the role already parsed.
pub fn authenticated_user(req: &HttpRequest, secret: &str) -> Result<AuthUser, Error> {
    let claims = validate_request_token(req, secret)?;
    claims
        .auth_user()
        .ok_or_else(|| ErrorUnauthorized("Malformed token claims"))
}
