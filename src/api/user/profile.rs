use axum::{
    extract::Extension,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set,
    TransactionTrait,
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

use crate::entities::refresh_token::{self, Entity as RefreshTokenEntity};
use crate::entities::user::Entity as UserEntity;
use crate::middleware::auth::{decode_refresh_token, Claims};
use crate::middleware::logging::{to_response, ApiError};

pub fn profile_router(db: Arc<DatabaseConnection>) -> Router {
    Router::new()
        .route("/profile", get(get_profile))
        .route("/logout", post(logout))
        .layer(Extension(db))
}

async fn get_profile(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Extension(claims): Extension<Claims>,
) -> impl IntoResponse {
    let user_id = claims.user_id;

    let txn = match db.begin().await {
        Ok(txn) => txn,
        Err(_) => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "error": "Internal server error"
                })),
            );
        }
    };

    match UserEntity::find_by_id(user_id).one(&txn).await {
        Ok(Some(model)) => (
            StatusCode::OK,
            Json(json!({
                "id": model.id,
                "username": model.username,
                "email": model.email
            })),
        ),
        Ok(None) => (
            StatusCode::NOT_FOUND,
            Json(json!({
                "error": "Not found"
            })),
        ),
        Err(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({
                "error": "Internal server error"
            })),
        ),
    }
}

//Revokes the refresh token's jti; the access token simply ages out.
async fn logout(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<Logout>,
) -> Response {
    let refresh_claims = match decode_refresh_token(&payload.refresh) {
        Ok(refresh_claims) => refresh_claims,
        Err(err) => {
            return to_response(
                (
                    StatusCode::BAD_REQUEST,
                    Json(json!({
                        "error": "Invalid or expired refresh token"
                    })),
                ),
                Err(ApiError::General(err.to_string())),
            );
        }
    };

    //A refresh token only counts for the account that is logging out.
    if refresh_claims.user_id != claims.user_id {
        return to_response(
            (
                StatusCode::BAD_REQUEST,
                Json(json!({
                    "error": "Invalid or expired refresh token"
                })),
            ),
            Err(ApiError::General("Refresh token user mismatch".into())),
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

    match RefreshTokenEntity::find()
        .filter(refresh_token::Column::Jti.eq(&*refresh_claims.jti))
        .one(&txn)
        .await
    {
        Ok(Some(row)) if !row.revoked => {
            let mut row: refresh_token::ActiveModel = row.into();
            row.revoked = Set(true);
            match row.update(&txn).await {
                Ok(_) => match txn.commit().await {
                    Ok(_) => to_response(
                        (
                            StatusCode::OK,
                            Json(json!({
                                "message": "Logged out successfully"
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
        Ok(Some(_)) | Ok(None) => to_response(
            (
                StatusCode::BAD_REQUEST,
                Json(json!({
                    "error": "Invalid or expired refresh token"
                })),
            ),
            Err(ApiError::General("Refresh token unknown or revoked".into())),
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
    }
}

#[derive(Deserialize)]
struct Logout {
    refresh: String,
}
