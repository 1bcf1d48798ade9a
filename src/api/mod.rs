pub mod public;
pub mod user;

use axum::Router;
use sea_orm::DatabaseConnection;
use std::sync::Arc;

use public::public_api_router;
use user::user_api_router;

//Public GETs and authenticated writes share paths (e.g. "/leads/"), so the
//two tiers are merged rather than nested.
pub fn create_api_router(shared_db: Arc<DatabaseConnection>) -> Router {
    Router::new()
        .merge(public_api_router(shared_db.clone()))
        .merge(user_api_router(shared_db))
}
