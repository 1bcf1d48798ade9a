pub mod address;
pub mod cart;
pub mod lead;
pub mod order;
pub mod profile;
pub mod review;
pub mod wishlist;

use axum::{middleware::from_fn_with_state, Router};
use sea_orm::DatabaseConnection;
use std::sync::Arc;

use crate::middleware::auth::{auth_middleware, AuthState};

use address::address_router;
use cart::cart_router;
use lead::lead_router;
use order::order_router;
use profile::profile_router;
use review::review_router;
use wishlist::wishlist_router;

pub fn user_api_router(db: Arc<DatabaseConnection>) -> Router {
    Router::new()
        .merge(profile_router(db.clone()))
        .merge(lead_router(db.clone()))
        .merge(review_router(db.clone()))
        .merge(wishlist_router(db.clone()))
        .merge(cart_router(db.clone()))
        .merge(address_router(db.clone()))
        .merge(order_router(db.clone()))
        .layer(from_fn_with_state(AuthState { db }, auth_middleware))
}
