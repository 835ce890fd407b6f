use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use chrono::{Duration, Utc};
use cookie::Cookie;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{Role, User};
use crate::errors::AppError;
use crate::InnerState;

pub const AUTH_COOKIE: &str = "auth-token";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub user_id: Uuid,
    pub role: Role,
    pub exp: usize,
}

pub fn issue_token(user: &User, secret: &Secret<String>, ttl: Duration) -> Result<String, AppError> {
    let claims = Claims {
        sub: user.username.clone(),
        user_id: user.id,
        role: user.role,
        exp: (Utc::now() + ttl).timestamp().max(0) as usize,
    };
    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret.expose_secret().as_bytes()),
    )
    .map_err(|e| AppError::Unexpected(anyhow::Error::new(e).context("Failed to sign token")))
}

pub fn decode_token(token: &str, secret: &Secret<String>) -> Result<Claims, AppError> {
    let validation = Validation::new(Algorithm::HS256);
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.expose_secret().as_bytes()),
        &validation,
    )
    .map(|data| data.claims)
    .map_err(|e| AppError::Authentication(anyhow::Error::new(e).context("JWT validation failed")))
}

/// Validates the token and loads the acting user into the request extensions.
/// Blocked users are refused on every route.
pub async fn auth_middleware(
    State(inner): State<InnerState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = extract_token(&request)
        .ok_or_else(|| AppError::Authentication(anyhow::anyhow!("Missing token")))?;
    let claims = decode_token(&token, &inner.jwt_secret)?;

    let actor = inner.service.user(claims.user_id).await.map_err(|e| match e {
        AppError::NotFound(_) => {
            AppError::Authentication(anyhow::anyhow!("Unknown user {}", claims.user_id))
        }
        other => other,
    })?;

    if !actor.is_active() {
        return Err(AppError::InvalidActorRole(format!(
            "User {} is blocked",
            actor.username
        )));
    }

    request.extensions_mut().insert(actor);
    Ok(next.run(request).await)
}

/// Extracts JWT from either the `Authorization` header or `Cookie` header.
fn extract_token<B>(req: &axum::http::Request<B>) -> Option<String> {
    let bearer = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(|token| token.trim().to_string());
    if bearer.is_some() {
        return bearer;
    }

    let cookies = req.headers().get(header::COOKIE)?.to_str().ok()?;
    cookies
        .split(';')
        .filter_map(|raw| Cookie::parse(raw.trim()).ok())
        .find(|cookie| cookie.name() == AUTH_COOKIE)
        .map(|cookie| cookie.value().to_string())
}
