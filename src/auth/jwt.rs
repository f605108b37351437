use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};

use super::model::{Claims, Role};

const ACCESS_TOKEN_EXPIRY_SECONDS: i64 = 15 * 60; // 15 minutes
const REFRESH_TOKEN_EXPIRY_SECONDS: i64 = 7 * 24 * 60 * 60; // 7 days

/// Generate access token (short-lived)
pub fn generate_access_token(
    secret: &str,
    account_id: i64,
    role: Role,
) -> Result<String, jsonwebtoken::errors::Error> {
    generate_token(secret, account_id, role, "access", ACCESS_TOKEN_EXPIRY_SECONDS)
}

/// Generate refresh token (long-lived)
pub fn generate_refresh_token(
    secret: &str,
    account_id: i64,
    role: Role,
) -> Result<String, jsonwebtoken::errors::Error> {
    generate_token(secret, account_id, role, "refresh", REFRESH_TOKEN_EXPIRY_SECONDS)
}

fn generate_token(
    secret: &str,
    account_id: i64,
    role: Role,
    token_type: &str,
    expiry_seconds: i64,
) -> Result<String, jsonwebtoken::errors::Error> {
    let now = chrono::Utc::now().timestamp() as usize;
    let claims = Claims {
        sub: account_id.to_string(),
        role: role.as_str().to_string(),
        exp: now + expiry_seconds as usize,
        iat: now,
        token_type: token_type.to_string(),
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
}

/// Validate and decode a token
pub fn validate_token(secret: &str, token: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )?;
    Ok(token_data.claims)
}

/// Get access token expiry in seconds
pub fn get_access_token_expiry() -> i64 {
    ACCESS_TOKEN_EXPIRY_SECONDS
}
