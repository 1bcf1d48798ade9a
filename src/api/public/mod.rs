pub mod auth;
pub mod download;
pub mod lead;
pub mod review;

use axum::Router;
use sea_orm::DatabaseConnection;
use std::sync::Arc;

use auth::auth_router;
use download::download_router;
use lead::lead_router;
use review::review_router;

pub fn public_api_router(db: Arc<DatabaseConnection>) -> Router {
    let auth_router = auth_router(db.clone());
    let lead_router = lead_router(db.clone());
    let review_router = review_router(db.clone());
    let download_router = download_router(db.clone());

    Router::new()
        .merge(auth_router)
        .merge(lead_router)
        .merge(review_router)
        .merge(download_router)
}
