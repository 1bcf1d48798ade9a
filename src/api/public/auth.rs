use argon2::{
    password_hash::{rand_core::OsRng, PasswordHasher, SaltString},
    Argon2,
};
use axum::{
    extract::Extension, http::StatusCode, response::Response, routing::post, Json, Router,
};
use once_cell::sync::Lazy;
use regex::Regex;
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set, TransactionTrait,
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use validator::Validate;

use crate::entities::user::{self, Entity as UserEntity, Role};
use crate::entities::refresh_token;
use crate::middleware::auth::{generate_access_token, generate_refresh_token};
use crate::middleware::logging::{to_response, ApiError};

//ROUTERS
pub fn auth_router(db: Arc<DatabaseConnection>) -> Router {
    Router::new()
        .route("/signup", post(signup))
        .route("/signin", post(signin))
        .layer(Extension(db))
}

//ROUTES
async fn signup(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Json(payload): Json<SignUp>,
) -> Response {
    if let Some(err) = payload.validate().err() {
        let detail = err.to_string();
        return to_response(
            (
                StatusCode::BAD_REQUEST,
                Json(json!({
                    "error": "Validation failed",
                    "fields": err
                })),
            ),
            Err(ApiError::ValidationFail(detail)),
        );
    }

    let txn = match db.begin().await {
        Ok(txn) => txn,
        Err(_) => {
            return to_response(
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({
                        "error": "Internal server error"
                    })),
                ),
                Err(ApiError::TransactionCreationFailed),
            );
        }
    };

    let password = match hash_password(&payload.password) {
        Ok(password) => password,
        Err(err) => {
            return to_response(
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({
                        "error": "Internal server error"
                    })),
                ),
                Err(ApiError::PasswordHashFailed(err.to_string())),
            );
        }
    };

    let new_user = user::ActiveModel {
        username: Set(payload.username.clone()),
        email: Set(payload.email.clone()),
        password: Set(password),
        role: Set(Role::User),
        ..Default::default()
    };

    match UserEntity::insert(new_user).exec(&txn).await {
        Ok(res) => match txn.commit().await {
            Ok(_) => to_response(
                (
                    StatusCode::CREATED,
                    Json(json!({
                        "id": res.last_insert_id,
                        "username": payload.username,
                        "email": payload.email
                    })),
                ),
                Ok(()),
            ),
            Err(err) => to_response(
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({
                        "error": "Internal server error"
                    })),
                ),
                Err(ApiError::DbError(err.to_string())),
            ),
        },
        Err(err) => {
            //Unique violation on username
            let _ = txn.rollback().await;
            to_response(
                (
                    StatusCode::BAD_REQUEST,
                    Json(json!({
                        "error": "Username already exists"
                    })),
                ),
                Err(ApiError::DbError(err.to_string())),
            )
        }
    }
}

async fn signin(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Json(payload): Json<SignIn>,
) -> Response {
    let txn = match db.begin().await {
        Ok(txn) => txn,
        Err(_) => {
            return to_response(
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({
                        "error": "Internal server error"
                    })),
                ),
                Err(ApiError::TransactionCreationFailed),
            );
        }
    };

    let model = match UserEntity::find()
        .filter(user::Column::Username.eq(&*payload.username))
        .one(&txn)
        .await
    {
        Ok(Some(model)) => model,
        Ok(None) => {
            return to_response(
                (
                    StatusCode::BAD_REQUEST,
                    Json(json!({
                        "error": "Invalid credentials"
                    })),
                ),
                Err(ApiError::General("Unknown username".into())),
            );
        }
        Err(err) => {
            return to_response(
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({
                        "error": "Internal server error"
                    })),
                ),
                Err(ApiError::DbError(err.to_string())),
            );
        }
    };

    if model.check_hash(&payload.password).is_err() {
        return to_response(
            (
                StatusCode::BAD_REQUEST,
                Json(json!({
                    "error": "Invalid credentials"
                })),
            ),
            Err(ApiError::General("Password verification failed".into())),
        );
    }

    let access = match generate_access_token(model.id, model.role.to_string()) {
        Ok(token) => token,
        Err(err) => {
            return to_response(
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({
                        "error": "Internal server error"
                    })),
                ),
                Err(ApiError::TokenGenerationFailed(err.to_string())),
            );
        }
    };

    let (refresh, jti, expires_at) = match generate_refresh_token(model.id) {
        Ok(parts) => parts,
        Err(err) => {
            return to_response(
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({
                        "error": "Internal server error"
                    })),
                ),
                Err(ApiError::TokenGenerationFailed(err.to_string())),
            );
        }
    };

    let token_row = refresh_token::ActiveModel {
        jti: Set(jti),
        user_id: Set(model.id),
        revoked: Set(false),
        expires_at: Set(expires_at),
        ..Default::default()
    };

    match refresh_token::Entity::insert(token_row).exec(&txn).await {
        Ok(_) => match txn.commit().await {
            Ok(_) => to_response(
                (
                    StatusCode::OK,
                    Json(json!({
                        "access": access,
                        "refresh": refresh
                    })),
                ),
                Ok(()),
            ),
            Err(err) => to_response(
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({
                        "error": "Internal server error"
                    })),
                ),
                Err(ApiError::DbError(err.to_string())),
            ),
        },
        Err(err) => {
            let _ = txn.rollback().await;
            to_response(
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({
                        "error": "Internal server error"
                    })),
                ),
                Err(ApiError::DbError(err.to_string())),
            )
        }
    }
}

//utilities
fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    let password_hash = argon2
        .hash_password(password.as_bytes(), &salt)?
        .to_string();

    Ok(password_hash)
}

//structs
#[derive(Deserialize, Clone, Debug, Validate)]
struct SignUp {
    #[validate(regex(
        path = *USERNAME_REGEX,
        message = "Username should be 3-30 characters of letters, numbers or '_'"
    ))]
    username: String,
    #[validate(email(message = "Email is malformed"))]
    email: String,
    #[validate(length(min = 4, message = "Password should be at least 4 characters"))]
    password: String,
}

#[derive(Deserialize, Clone, Debug)]
struct SignIn {
    username: String,
    password: String,
}

static USERNAME_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[a-zA-Z0-9_]{3,30}$").unwrap());
