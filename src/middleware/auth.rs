use crate::entities::user::Entity as UserEntity;
use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::Response,
};
use chrono::{DateTime, Duration, Utc};
use dotenvy::dotenv;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use sea_orm::{DatabaseConnection, EntityTrait};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

const ACCESS_TOKEN_HOURS: i64 = 1;
const REFRESH_TOKEN_DAYS: i64 = 7;

pub async fn auth_middleware(
    State(state): State<AuthState>,
    mut req: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let db = state.db;

    let auth_header = req
        .headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok());

    let token = match auth_header {
        Some(header) if header.starts_with("Bearer ") => match header.strip_prefix("Bearer ") {
            Some(token) => token,
            _ => return Err(StatusCode::UNAUTHORIZED),
        },
        _ => return Err(StatusCode::UNAUTHORIZED),
    };

    let claims: Claims = match validate_access_token(db.clone(), token).await {
        Ok(claims) => claims,
        Err(err) => {
            tracing::debug!(error = %err, "Rejected bearer token");
            return Err(StatusCode::UNAUTHORIZED);
        }
    };

    req.extensions_mut().insert(claims);
    Ok(next.run(req).await)
}

//Access-token claims; inserted as a request extension by the middleware.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Claims {
    pub user_id: i32,
    pub role: String,
    pub exp: usize,
}

//Refresh-token claims; the jti keys a refresh_tokens row so logout can
//revoke the token before its JWT expiry.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RefreshClaims {
    pub user_id: i32,
    pub jti: String,
    pub exp: usize,
}

#[derive(Clone, Debug)]
pub struct AuthState {
    pub db: Arc<DatabaseConnection>,
}

pub fn generate_access_token(user_id: i32, role: String) -> Result<String, AuthMiddlewareError> {
    let exp = Utc::now()
        .checked_add_signed(Duration::hours(ACCESS_TOKEN_HOURS))
        .ok_or(AuthMiddlewareError::GenerationFail)?
        .timestamp() as usize;

    let claims = Claims { user_id, role, exp };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(get_secret_key().as_bytes()),
    )
    .map_err(|_| AuthMiddlewareError::GenerationFail)
}

//Returns the signed token together with its jti and expiry, so the caller
//can persist the refresh_tokens row in the same transaction.
pub fn generate_refresh_token(
    user_id: i32,
) -> Result<(String, String, DateTime<Utc>), AuthMiddlewareError> {
    let expires_at = Utc::now()
        .checked_add_signed(Duration::days(REFRESH_TOKEN_DAYS))
        .ok_or(AuthMiddlewareError::GenerationFail)?;

    let jti = Uuid::new_v4().to_string();
    let claims = RefreshClaims {
        user_id,
        jti: jti.clone(),
        exp: expires_at.timestamp() as usize,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(get_secret_key().as_bytes()),
    )
    .map_err(|_| AuthMiddlewareError::GenerationFail)?;

    Ok((token, jti, expires_at))
}

pub async fn validate_access_token(
    db: Arc<DatabaseConnection>,
    token: &str,
) -> Result<Claims, AuthMiddlewareError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = true;

    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(get_secret_key().as_bytes()),
        &validation,
    )
    .map_err(|_| AuthMiddlewareError::TokenExpired)?;

    let claims = token_data.claims;

    match UserEntity::find_by_id(claims.user_id).one(&*db).await {
        Ok(Some(_)) => Ok(claims),
        Ok(None) => Err(AuthMiddlewareError::InvalidUser),
        Err(_) => Err(AuthMiddlewareError::InternalServerError),
    }
}

pub fn decode_refresh_token(token: &str) -> Result<RefreshClaims, AuthMiddlewareError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = true;

    decode::<RefreshClaims>(
        token,
        &DecodingKey::from_secret(get_secret_key().as_bytes()),
        &validation,
    )
    .map(|data| data.claims)
    .map_err(|_| AuthMiddlewareError::TokenExpired)
}

#[derive(Error, Debug)]
pub enum AuthMiddlewareError {
    #[error("Invalid user id")]
    InvalidUser,
    #[error("Token expired")]
    TokenExpired,
    #[error("Failed to generate token")]
    GenerationFail,
    #[error("Internal server error")]
    InternalServerError,
}

fn get_secret_key() -> String {
    dotenv().ok();
    std::env::var("SECRET").expect("SECRET not found in .env file")
}
