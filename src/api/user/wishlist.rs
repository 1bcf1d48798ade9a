use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set,
    TransactionTrait,
};
use serde_json::json;
use std::sync::Arc;

use crate::entities::{
    lead,
    wishlist::{self, Entity as WishlistEntity},
};
use crate::middleware::auth::Claims;

//ROUTERS
pub fn wishlist_router(db: Arc<DatabaseConnection>) -> Router {
    Router::new()
        .route("/wishlists/", get(get_wishlist))
        .route("/wishlists/:lead_id/", post(add_lead).delete(remove_lead))
        .layer(Extension(db))
}

async fn get_wishlist(
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
            )
                .into_response();
        }
    };

    match WishlistEntity::find()
        .filter(wishlist::Column::UserId.eq(user_id))
        .all(&txn)
        .await
    {
        Ok(entries) => (StatusCode::OK, Json(entries)).into_response(),
        Err(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({
                "error": "Internal server error."
            })),
        )
            .into_response(),
    }
}

async fn add_lead(
    Path(lead_id): Path<i32>,
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
            )
                .into_response();
        }
    };

    match lead::Entity::find_by_id(lead_id).one(&txn).await {
        Ok(Some(_)) => {}
        Ok(None) => {
            return (
                StatusCode::NOT_FOUND,
                Json(json!({
                    "error": "Lead not found"
                })),
            )
                .into_response();
        }
        Err(_) => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "error": "Internal server error."
                })),
            )
                .into_response();
        }
    }

    let existing = WishlistEntity::find()
        .filter(wishlist::Column::UserId.eq(user_id))
        .filter(wishlist::Column::LeadId.eq(lead_id))
        .one(&txn)
        .await;

    match existing {
        Ok(Some(_)) => (
            StatusCode::CONFLICT,
            Json(json!({
                "error": "Lead already in wishlist"
            })),
        )
            .into_response(),
        Ok(None) => {
            let new_entry = wishlist::ActiveModel {
                user_id: Set(user_id),
                lead_id: Set(lead_id),
                created_at: Set(Utc::now()),
                ..Default::default()
            };

            match WishlistEntity::insert(new_entry).exec_with_returning(&txn).await {
                Ok(model) => match txn.commit().await {
                    Ok(_) => (StatusCode::CREATED, Json(model)).into_response(),
                    Err(_) => (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        Json(json!({
                            "error": "Internal server error"
                        })),
                    )
                        .into_response(),
                },
                Err(_) => {
                    //A concurrent duplicate hit the unique index first.
                    let _ = txn.rollback().await;
                    (
                        StatusCode::CONFLICT,
                        Json(json!({
                            "error": "Lead already in wishlist"
                        })),
                    )
                        .into_response()
                }
            }
        }
        Err(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({
                "error": "Internal server error."
            })),
        )
            .into_response(),
    }
}

async fn remove_lead(
    Path(lead_id): Path<i32>,
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

    match WishlistEntity::find()
        .filter(wishlist::Column::UserId.eq(user_id))
        .filter(wishlist::Column::LeadId.eq(lead_id))
        .one(&txn)
        .await
    {
        Ok(Some(entry)) => {
            let entry: wishlist::ActiveModel = entry.into();
            match entry.delete(&txn).await {
                Ok(_) => {
                    let _ = txn.commit().await;
                    (
                        StatusCode::OK,
                        Json(json!({
                            "message": "Removed from wishlist"
                        })),
                    )
                }
                Err(_) => {
                    let _ = txn.rollback().await;
                    (
                        StatusCode::BAD_REQUEST,
                        Json(json!({
                            "error": "Failed to delete this resource"
                        })),
                    )
                }
            }
        }
        Ok(None) => (
            StatusCode::NOT_FOUND,
            Json(json!({
                "error": "Lead not in wishlist"
            })),
        ),
        Err(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({
                "error": "Internal server error."
            })),
        ),
    }
}
