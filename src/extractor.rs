use axum::async_trait;
use axum::{
    extract::FromRequestParts,
    http::{request::Parts, StatusCode},
};
use jsonwebtoken::{decode, DecodingKey, Validation};
use serde::Deserialize;

pub const ANONYMOUS_ROLE: &str = "anonymous";

#[derive(Deserialize)]
struct Claims {
    sub: i32,
    role: String,
    #[allow(dead_code)]
    exp: usize,
}

/// Identity of whoever is making the request, passed explicitly into handlers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    pub user_id: i32,
    pub role: String,
}

impl AuthUser {
    /// Operator identity used while the login flow is switched off.
    pub fn anonymous() -> Self {
        Self {
            user_id: 0,
            role: ANONYMOUS_ROLE.to_string(),
        }
    }

    pub fn is_anonymous(&self) -> bool {
        self.role == ANONYMOUS_ROLE
    }
}

pub fn token_from_parts(parts: &Parts) -> Option<String> {
    let from_cookie = parts
        .headers
        .get(axum::http::header::COOKIE)
        .and_then(|header| header.to_str().ok())
        .and_then(|cookies| {
            cookies.split(';').find_map(|c| {
                let c = c.trim();
                c.strip_prefix("auth_token=").map(|s| s.to_string())
            })
        });
    from_cookie.or_else(|| {
        parts
            .headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|authz| authz.to_str().ok())
            .and_then(|s| s.strip_prefix("Bearer ").map(|s| s.to_string()))
    })
}

pub fn decode_token(token: &str, secret: &str) -> Result<AuthUser, (StatusCode, String)> {
    let decoded = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|_| (StatusCode::UNAUTHORIZED, "Invalid token".to_string()))?;
    Ok(AuthUser {
        user_id: decoded.claims.sub,
        role: decoded.claims.role,
    })
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, String);

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        if !*crate::config::AUTH_ENABLED {
            return Ok(AuthUser::anonymous());
        }
        let token = token_from_parts(parts)
            .ok_or_else(|| (StatusCode::UNAUTHORIZED, "Missing token".to_string()))?;
        decode_token(&token, crate::config::JWT_SECRET.as_str())
    }
}
