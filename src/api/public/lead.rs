use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use sea_orm::{DatabaseConnection, EntityTrait, TransactionTrait};
use serde_json::json;
use std::sync::Arc;

use crate::entities::lead::Entity as LeadEntity;

//Catalog reads are public: anyone, authenticated or not, can browse leads.
pub fn lead_router(db: Arc<DatabaseConnection>) -> Router {
    Router::new()
        .route("/leads/", get(get_leads))
        .route("/leads/:id/", get(get_lead))
        .layer(Extension(db))
}

async fn get_leads(Extension(db): Extension<Arc<DatabaseConnection>>) -> impl IntoResponse {
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

    match LeadEntity::find().all(&txn).await {
        Ok(leads) => (StatusCode::OK, Json(leads)).into_response(),
        Err(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({
                "error": "Internal server error."
            })),
        )
            .into_response(),
    }
}

async fn get_lead(
    Path(id): Path<i32>,
    Extension(db): Extension<Arc<DatabaseConnection>>,
) -> impl IntoResponse {
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

    match LeadEntity::find_by_id(id).one(&txn).await {
        Ok(Some(lead)) => (StatusCode::OK, Json(lead)).into_response(),
        Ok(None) => (
            StatusCode::NOT_FOUND,
            Json(json!({
                "error": "Lead not found"
            })),
        )
            .into_response(),
        Err(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({
                "error": "Internal server error."
            })),
        )
            .into_response(),
    }
}
