use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Closed set of roles the middleware can attach to a call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Citoyen,
    Agent,
    Admin,
    SuperAdmin,
}

impl Role {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "citoyen" => Some(Role::Citoyen),
            "agent" => Some(Role::Agent),
            "admin" => Some(Role::Admin),
            "super_admin" => Some(Role::SuperAdmin),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Citoyen => "citoyen",
            Role::Agent => "agent",
            Role::Admin => "admin",
            Role::SuperAdmin => "super_admin",
        }
    }

    /// Roles allowed to sign documents and read any artifact.
    pub fn is_admin_level(&self) -> bool {
        matches!(self, Role::Admin | Role::SuperAdmin)
    }
}

/// Identity attached to an authenticated call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthUser {
    pub id: i64,
    pub role: Role,
}

/// Account record used for login.
#[derive(Debug, Clone)]
pub struct Compte {
    pub id: i64,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
}

/// Login request payload
#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Token response after successful login
#[derive(Debug, Serialize, ToSchema)]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    pub expires_in: i64,
}

/// Refresh token request
#[derive(Debug, Deserialize, ToSchema)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

/// JWT Claims structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // account id
    pub role: String,
    pub exp: usize,         // expiration time
    pub iat: usize,         // issued at
    pub token_type: String, // "access" or "refresh"
}

impl Claims {
    /// Typed identity, rejecting malformed subjects or unknown roles.
    pub fn auth_user(&self) -> Option<AuthUser> {
        let id = self.sub.parse().ok()?;
        let role = Role::parse(&self.role)?;
        Some(AuthUser { id, role })
    }
}
