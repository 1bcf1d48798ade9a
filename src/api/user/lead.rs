use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::Response,
    routing::{post, put},
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
use validator::Validate;

use crate::entities::{
    cart, lead,
    lead::Entity as LeadEntity,
    review, wishlist,
};
use crate::middleware::logging::{to_response, ApiError};

//ROUTERS
pub fn lead_router(db: Arc<DatabaseConnection>) -> Router {
    Router::new()
        .route("/leads/", post(create_lead))
        .route("/leads/:id/", put(update_lead).delete(delete_lead))
        .layer(Extension(db))
}

//ROUTES
async fn create_lead(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Json(payload): Json<CreateLead>,
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

    let new_lead = lead::ActiveModel {
        name: Set(payload.name),
        location: Set(payload.location),
        property_type: Set(payload.property_type),
        property_status: Set(payload.property_status),
        service_required_on: Set(payload.service_required_on),
        budget: Set(payload.budget),
        requirement: Set(payload.requirement),
        tags: Set(payload.tags),
        image_url: Set(payload.image_url),
        price: Set(payload.price),
        discount_price: Set(payload.discount_price),
        created_at: Set(Utc::now()),
        ..Default::default()
    };

    match LeadEntity::insert(new_lead).exec_with_returning(&txn).await {
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

async fn update_lead(
    Path(id): Path<i32>,
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Json(payload): Json<UpdateLead>,
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

    match LeadEntity::find_by_id(id).one(&txn).await {
        Ok(Some(model)) => {
            let mut model: lead::ActiveModel = model.into();

            //Partial semantics: unspecified fields keep their prior value;
            //created_at is never touched.
            if let Some(name) = payload.name {
                model.name = Set(name);
            }
            if let Some(location) = payload.location {
                model.location = Set(location);
            }
            if let Some(property_type) = payload.property_type {
                model.property_type = Set(property_type);
            }
            if let Some(property_status) = payload.property_status {
                model.property_status = Set(property_status);
            }
            if let Some(service_required_on) = payload.service_required_on {
                model.service_required_on = Set(service_required_on);
            }
            if let Some(budget) = payload.budget {
                model.budget = Set(budget);
            }
            if let Some(requirement) = payload.requirement {
                model.requirement = Set(requirement);
            }
            if let Some(tags) = payload.tags {
                model.tags = Set(Some(tags));
            }
            if let Some(image_url) = payload.image_url {
                model.image_url = Set(Some(image_url));
            }
            if let Some(price) = payload.price {
                model.price = Set(Some(price));
            }
            if let Some(discount_price) = payload.discount_price {
                model.discount_price = Set(Some(discount_price));
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
                    "error": "Lead not found"
                })),
            ),
            Err(ApiError::General(format!("No lead with {id} id was found"))),
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

async fn delete_lead(
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

    let model = match LeadEntity::find_by_id(id).one(&txn).await {
        Ok(Some(model)) => model,
        Ok(None) => {
            return to_response(
                (
                    StatusCode::NOT_FOUND,
                    Json(json!({
                        "error": "Lead not found"
                    })),
                ),
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

    //Cascade is explicit: dependent rows go in the same transaction, order
    //items stay (they are snapshots).
    let cascade = async {
        review::Entity::delete_many()
            .filter(review::Column::LeadId.eq(id))
            .exec(&txn)
            .await?;
        wishlist::Entity::delete_many()
            .filter(wishlist::Column::LeadId.eq(id))
            .exec(&txn)
            .await?;
        cart::Entity::delete_many()
            .filter(cart::Column::LeadId.eq(id))
            .exec(&txn)
            .await?;
        let model: lead::ActiveModel = model.into();
        model.delete(&txn).await?;
        Ok::<(), sea_orm::DbErr>(())
    };

    match cascade.await {
        Ok(_) => match txn.commit().await {
            Ok(_) => to_response(
                (
                    StatusCode::OK,
                    Json(json!({
                        "message": "Lead deleted successfully"
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

//structs
#[derive(Deserialize, Clone, Debug, Validate)]
struct CreateLead {
    #[validate(length(min = 1, message = "Name is required"))]
    name: String,
    #[validate(length(min = 1, message = "Location is required"))]
    location: String,
    #[validate(length(min = 1, message = "Property type is required"))]
    property_type: String,
    #[validate(length(min = 1, message = "Property status is required"))]
    property_status: String,
    #[validate(length(min = 1, message = "Service date is required"))]
    service_required_on: String,
    #[validate(range(min = 0.0, message = "Budget should not be negative"))]
    budget: f32,
    #[validate(length(min = 1, message = "Requirement is required"))]
    requirement: String,
    tags: Option<String>,
    #[validate(url(message = "Image URL is malformed"))]
    image_url: Option<String>,
    #[validate(range(min = 0.0, message = "Price should not be negative"))]
    price: Option<f32>,
    #[validate(range(min = 0.0, message = "Discount price should not be negative"))]
    discount_price: Option<f32>,
}

#[derive(Deserialize, Clone, Debug, Validate)]
struct UpdateLead {
    #[validate(length(min = 1, message = "Name should not be empty"))]
    name: Option<String>,
    #[validate(length(min = 1, message = "Location should not be empty"))]
    location: Option<String>,
    property_type: Option<String>,
    property_status: Option<String>,
    service_required_on: Option<String>,
    #[validate(range(min = 0.0, message = "Budget should not be negative"))]
    budget: Option<f32>,
    requirement: Option<String>,
    tags: Option<String>,
    #[validate(url(message = "Image URL is malformed"))]
    image_url: Option<String>,
    #[validate(range(min = 0.0, message = "Price should not be negative"))]
    price: Option<f32>,
    #[validate(range(min = 0.0, message = "Discount price should not be negative"))]
    discount_price: Option<f32>,
}
