use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::Response,
    routing::{post, put},
    Json, Router,
};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, DatabaseConnection, EntityTrait, Set, TransactionTrait,
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use validator::Validate;

use crate::entities::{
    lead,
    review::{self, Entity as ReviewEntity},
};
use crate::middleware::auth::Claims;
use crate::middleware::logging::{to_response, ApiError};

//ROUTERS
pub fn review_router(db: Arc<DatabaseConnection>) -> Router {
    Router::new()
        .route("/leads/:id/reviews/", post(create_review))
        .route("/reviews/:id/", put(update_review).delete(delete_review))
        .layer(Extension(db))
}

//ROUTES
async fn create_review(
    Path(lead_id): Path<i32>,
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<CreateReview>,
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

    match lead::Entity::find_by_id(lead_id).one(&txn).await {
        Ok(Some(_)) => {}
        Ok(None) => {
            return to_response(
                (
                    StatusCode::NOT_FOUND,
                    Json(json!({
                        "error": "Lead not found"
                    })),
                ),
                Err(ApiError::General(format!(
                    "No lead with {lead_id} id was found"
                ))),
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
    }

    //The author is always the token's user, whatever the payload says.
    let new_review = review::ActiveModel {
        lead_id: Set(lead_id),
        user_id: Set(claims.user_id),
        name: Set(payload.name),
        email: Set(payload.email),
        rating: Set(payload.rating),
        review_text: Set(payload.review_text),
        created_at: Set(Utc::now()),
        ..Default::default()
    };

    match ReviewEntity::insert(new_review).exec_with_returning(&txn).await {
        Ok(model) => match txn.commit().await {
            Ok(_) => to_response((StatusCode::CREATED, Json(model)), Ok(())),
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

async fn update_review(
    Path(id): Path<i32>,
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<UpdateReview>,
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

    match ReviewEntity::find_by_id(id).one(&txn).await {
        Ok(Some(model)) => {
            //404 and 403 stay distinct: the row exists, the caller is just
            //not its author.
            if model.user_id != claims.user_id {
                return to_response(
                    (
                        StatusCode::FORBIDDEN,
                        Json(json!({
                            "error": "You can only update your own review"
                        })),
                    ),
                    Err(ApiError::General("Review author mismatch".into())),
                );
            }

            let mut model: review::ActiveModel = model.into();

            if let Some(name) = payload.name {
                model.name = Set(name);
            }
            if let Some(email) = payload.email {
                model.email = Set(email);
            }
            if let Some(rating) = payload.rating {
                model.rating = Set(rating);
            }
            if let Some(review_text) = payload.review_text {
                model.review_text = Set(review_text);
            }

            match model.update(&txn).await {
                Ok(updated) => match txn.commit().await {
                    Ok(_) => to_response((StatusCode::OK, Json(updated)), Ok(())),
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
                            StatusCode::BAD_REQUEST,
                            Json(json!({
                                "error": "Failed to patch this resource"
                            })),
                        ),
                        Err(ApiError::DbError(err.to_string())),
                    )
                }
            }
        }
        Ok(None) => to_response(
            (
                StatusCode::NOT_FOUND,
                Json(json!({
                    "error": "Review not found"
                })),
            ),
            Err(ApiError::General(format!(
                "No review with {id} id was found"
            ))),
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

async fn delete_review(
    Path(id): Path<i32>,
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Extension(claims): Extension<Claims>,
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

    match ReviewEntity::find_by_id(id).one(&txn).await {
        Ok(Some(model)) => {
            if model.user_id != claims.user_id {
                return to_response(
                    (
                        StatusCode::FORBIDDEN,
                        Json(json!({
                            "error": "You can only delete your own review"
                        })),
                    ),
                    Err(ApiError::General("Review author mismatch".into())),
                );
            }

            let model: review::ActiveModel = model.into();
            match model.delete(&txn).await {
                Ok(_) => match txn.commit().await {
                    Ok(_) => to_response(
                        (
                            StatusCode::OK,
                            Json(json!({
                                "message": "Review deleted successfully"
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
                            StatusCode::BAD_REQUEST,
                            Json(json!({
                                "error": "Failed to delete this resource"
                            })),
                        ),
                        Err(ApiError::DbError(err.to_string())),
                    )
                }
            }
        }
        Ok(None) => to_response(
            (
                StatusCode::NOT_FOUND,
                Json(json!({
                    "error": "Review not found"
                })),
            ),
            Err(ApiError::General(format!(
                "No review with {id} id was found"
            ))),
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

//structs
#[derive(Deserialize, Clone, Debug, Validate)]
struct CreateReview {
    #[validate(length(min = 1, message = "Name is required"))]
    name: String,
    #[validate(email(message = "Email is malformed"))]
    email: String,
    #[validate(range(min = 1, max = 5, message = "Rating should be between 1 and 5"))]
    rating: i32,
    #[validate(length(min = 1, message = "Review text is required"))]
    review_text: String,
}

#[derive(Deserialize, Clone, Debug, Validate)]
struct UpdateReview {
    #[validate(length(min = 1, message = "Name should not be empty"))]
    name: Option<String>,
    #[validate(email(message = "Email is malformed"))]
    email: Option<String>,
    #[validate(range(min = 1, max = 5, message = "Rating should be between 1 and 5"))]
    rating: Option<i32>,
    review_text: Option<String>,
}
