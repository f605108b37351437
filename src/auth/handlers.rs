use actix_web::{web, HttpResponse, Responder};
use bcrypt::verify;

use super::jwt::{
    generate_access_token, generate_refresh_token, get_access_token_expiry, validate_token,
};
use super::model::{LoginRequest, RefreshRequest, Role, TokenResponse};
use crate::{AppState, ErrorResponse};

fn issue_tokens(secret: &str, account_id: i64, role: Role) -> Result<TokenResponse, HttpResponse> {
    let access_token = generate_access_token(secret, account_id, role).map_err(|e| {
        log::error!("Failed to generate access token: {:?}", e);
        HttpResponse::InternalServerError()
            .json(ErrorResponse::internal_error("Failed to generate token"))
    })?;
    let refresh_token = generate_refresh_token(secret, account_id, role).map_err(|e| {
        log::error!("Failed to generate refresh token: {:?}", e);
        HttpResponse::InternalServerError()
            .json(ErrorResponse::internal_error("Failed to generate token"))
    })?;
    Ok(TokenResponse {
        access_token,
        refresh_token,
        token_type: "Bearer".to_string(),
        expires_in: get_access_token_expiry(),
    })
}

/// Login endpoint
#[utoipa::path(
    post,
    path = "/api/auth/login",
    tag = "Authentication",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = TokenResponse),
        (status = 401, description = "Invalid credentials")
    )
)]
pub async fn login(state: web::Data<AppState>, body: web::Json<LoginRequest>) -> impl Responder {
    let compte = match state.store.get_compte_by_email(&body.email).await {
        Ok(Some(compte)) => compte,
        Ok(None) => {
            return HttpResponse::Unauthorized().json(ErrorResponse::new(
                "Unauthorized",
                "Invalid email or password",
            ));
        }
        Err(e) => {
            log::error!("Database error during login: {:?}", e);
            return HttpResponse::InternalServerError()
                .json(ErrorResponse::internal_error("Login failed"));
        }
    };

    let password_valid = verify(&body.password, &compte.password_hash).unwrap_or(false);
    if !password_valid {
        return HttpResponse::Unauthorized().json(ErrorResponse::new(
            "Unauthorized",
            "Invalid email or password",
        ));
    }

    match issue_tokens(&state.config.jwt_secret, compte.id, compte.role) {
        Ok(tokens) => HttpResponse::Ok().json(tokens),
        Err(resp) => resp,
    }
}

/// Exchange a refresh token for a fresh access/refresh pair.
#[utoipa::path(
    post,
    path = "/api/auth/refresh",
    tag = "Authentication",
    request_body = RefreshRequest,
    responses(
        (status = 200, description = "Token refreshed", body = TokenResponse),
        (status = 401, description = "Invalid refresh token")
    )
)]
pub async fn refresh(state: web::Data<AppState>, body: web::Json<RefreshRequest>) -> impl Responder {
    let claims = match validate_token(&state.config.jwt_secret, &body.refresh_token) {
        Ok(claims) if claims.token_type == "refresh" => claims,
        Ok(_) => {
            return HttpResponse::Unauthorized()
                .json(ErrorResponse::new("Unauthorized", "Invalid token type"));
        }
        Err(e) => {
            log::warn!("Refresh token validation failed: {:?}", e);
            return HttpResponse::Unauthorized()
                .json(ErrorResponse::new("Unauthorized", "Invalid refresh token"));
        }
    };

    let Some(user) = claims.auth_user() else {
        return HttpResponse::Unauthorized()
            .json(ErrorResponse::new("Unauthorized", "Malformed token claims"));
    };

    match issue_tokens(&state.config.jwt_secret, user.id, user.role) {
        Ok(tokens) => HttpResponse::Ok().json(tokens),
        Err(resp) => resp,
    }
}
