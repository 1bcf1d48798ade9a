use axum::{
    extract::{Extension, Path},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::Response,
    routing::get,
    Json, Router,
};
use sea_orm::{DatabaseConnection, EntityTrait, TransactionTrait};
use serde_json::json;
use std::sync::Arc;

use crate::entities::lead::Entity as LeadEntity;
use crate::export::{fetch_lead_image, render_lead_pdf};
use crate::middleware::logging::{to_response, ApiError};

pub fn download_router(db: Arc<DatabaseConnection>) -> Router {
    Router::new()
        .route("/leads/download/:id/", get(download_lead_pdf))
        .layer(Extension(db))
}

//Unlike the JSON endpoints this one answers with binary content, or a
//plain-text body on 404.
async fn download_lead_pdf(
    Path(id): Path<i32>,
    Extension(db): Extension<Arc<DatabaseConnection>>,
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

    let lead = match LeadEntity::find_by_id(id).one(&txn).await {
        Ok(Some(lead)) => lead,
        Ok(None) => {
            return to_response(
                (StatusCode::NOT_FOUND, "Lead not found"),
                Err(ApiError::General(format!("No lead with {id} id was found"))),
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

    let image_bytes = match &lead.image_url {
        Some(url) => fetch_lead_image(url).await,
        None => None,
    };

    let pdf = match render_lead_pdf(&lead, image_bytes.as_deref()) {
        Ok(pdf) => pdf,
        Err(err) => {
            return to_response(
                (StatusCode::INTERNAL_SERVER_ERROR, "Failed to render PDF"),
                Err(ApiError::General(err.to_string())),
            );
        }
    };

    let mut headers = HeaderMap::new();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/pdf"),
    );
    headers.insert(
        header::CONTENT_DISPOSITION,
        HeaderValue::from_str(&format!("attachment; filename=\"lead_{id}.pdf\""))
            .unwrap_or(HeaderValue::from_static("attachment")),
    );

    to_response((headers, pdf), Ok(()))
}
