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
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

use crate::entities::{
    cart::{self, Entity as CartEntity},
    lead,
};
use crate::middleware::auth::Claims;

//ROUTERS
pub fn cart_router(db: Arc<DatabaseConnection>) -> Router {
    Router::new()
        .route("/cart/", get(get_cart))
        .route("/cart/:lead_id/", post(add_lead).delete(remove_lead))
        .layer(Extension(db))
}

async fn get_cart(
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

    match CartEntity::find()
        .filter(cart::Column::UserId.eq(user_id))
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

//Add is additive, not replace: a second add for the same lead bumps the
//existing row's quantity by the requested amount.
async fn add_lead(
    Path(lead_id): Path<i32>,
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Extension(claims): Extension<Claims>,
    payload: Option<Json<AddToCart>>,
) -> impl IntoResponse {
    let user_id = claims.user_id;
    let quantity = payload.and_then(|Json(p)| p.quantity).unwrap_or(1);

    if quantity == 0 {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({
                "error": "Quantity should be greater than 0"
            })),
        )
            .into_response();
    }

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

    let existing = CartEntity::find()
        .filter(cart::Column::UserId.eq(user_id))
        .filter(cart::Column::LeadId.eq(lead_id))
        .one(&txn)
        .await;

    match existing {
        Ok(Some(entry)) => {
            let mut entry: cart::ActiveModel = entry.into();
            entry.quantity = Set(entry.quantity.unwrap() + quantity);
            match entry.update(&txn).await {
                Ok(updated) => match txn.commit().await {
                    Ok(_) => (StatusCode::CREATED, Json(updated)).into_response(),
                    Err(_) => (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        Json(json!({
                            "error": "Internal server error"
                        })),
                    )
                        .into_response(),
                },
                Err(_) => {
                    let _ = txn.rollback().await;
                    (
                        StatusCode::BAD_REQUEST,
                        Json(json!({
                            "error": "Failed to patch this resource"
                        })),
                    )
                        .into_response()
                }
            }
        }
        Ok(None) => {
            let new_entry = cart::ActiveModel {
                user_id: Set(user_id),
                lead_id: Set(lead_id),
                quantity: Set(quantity),
                created_at: Set(Utc::now()),
                ..Default::default()
            };

            match CartEntity::insert(new_entry).exec_with_returning(&txn).await {
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
                            "error": "Cart entry already exists"
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

    match CartEntity::find()
        .filter(cart::Column::UserId.eq(user_id))
        .filter(cart::Column::LeadId.eq(lead_id))
        .one(&txn)
        .await
    {
        Ok(Some(entry)) => {
            let entry: cart::ActiveModel = entry.into();
            match entry.delete(&txn).await {
                Ok(_) => {
                    let _ = txn.commit().await;
                    (
                        StatusCode::OK,
                        Json(json!({
                            "message": "Removed from cart"
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
                "error": "Lead not in cart"
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

//Structs
#[derive(Deserialize, Debug)]
struct AddToCart {
    quantity: Option<u32>,
}
