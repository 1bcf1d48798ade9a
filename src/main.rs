use sea_orm::{Database, DatabaseConnection};
use std::sync::Arc;

mod api;
mod entities;
mod export;
mod middleware;

use crate::api::create_api_router;
use crate::entities::setup_schema;
use crate::middleware::logging::logging_middleware;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    dotenvy::dotenv().ok();

    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    let db: DatabaseConnection = Database::connect(&database_url).await.unwrap();
    setup_schema(&db).await;

    let shared_db = Arc::new(db);

    let app = create_api_router(shared_db)
        .layer(axum::middleware::from_fn(logging_middleware));

    let listener = tokio::net::TcpListener::bind("0.0.0.0:3000").await.unwrap();
    println!("Running at {:?}", listener);
    axum::serve(listener, app).await.unwrap();
}
