use axum::{
    extract::Extension,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use once_cell::sync::Lazy;
use regex::Regex;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set,
    TransactionTrait,
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use validator::Validate;

use crate::entities::address::{self, AddressType, Entity as AddressEntity};
use crate::middleware::auth::Claims;
use crate::middleware::logging::{to_response, ApiError};

//ROUTERS
pub fn address_router(db: Arc<DatabaseConnection>) -> Router {
    Router::new()
        .route(
            "/addresses/",
            get(get_addresses).post(create_address).put(update_address),
        )
        .layer(Extension(db))
}

//ROUTES
async fn get_addresses(
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

    match AddressEntity::find()
        .filter(address::Column::UserId.eq(user_id))
        .all(&txn)
        .await
    {
        Ok(addresses) => (StatusCode::OK, Json(addresses)).into_response(),
        Err(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({
                "error": "Internal server error."
            })),
        )
            .into_response(),
    }
}

async fn create_address(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<CreateAddress>,
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

    let user_id = claims.user_id;
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

    //One address per type per user; a second POST is told to use PUT.
    match AddressEntity::find()
        .filter(address::Column::UserId.eq(user_id))
        .filter(address::Column::AddressType.eq(payload.address_type))
        .one(&txn)
        .await
    {
        Ok(Some(_)) => {
            return to_response(
                (
                    StatusCode::CONFLICT,
                    Json(json!({
                        "error": format!(
                            "{} address already exists. Use PUT to update.",
                            payload.address_type
                        )
                    })),
                ),
                Err(ApiError::General("Duplicate address type".into())),
            );
        }
        Ok(None) => {}
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

    //The owner comes from the token, never from the payload.
    let new_address = address::ActiveModel {
        user_id: Set(user_id),
        address_type: Set(payload.address_type),
        first_name: Set(payload.first_name),
        last_name: Set(payload.last_name),
        company_name: Set(payload.company_name),
        country: Set(payload.country),
        street_address: Set(payload.street_address),
        city: Set(payload.city),
        state: Set(payload.state),
        postcode: Set(payload.postcode),
        phone: Set(payload.phone),
        email: Set(payload.email),
        ..Default::default()
    };

    match AddressEntity::insert(new_address).exec_with_returning(&txn).await {
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
            //A concurrent duplicate hit the unique index first.
            let _ = txn.rollback().await;
            to_response(
                (
                    StatusCode::CONFLICT,
                    Json(json!({
                        "error": format!(
                            "{} address already exists. Use PUT to update.",
                            payload.address_type
                        )
                    })),
                ),
                Err(ApiError::DbError(err.to_string())),
            )
        }
    }
}

async fn update_address(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<UpdateAddress>,
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

    let user_id = claims.user_id;
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

    match AddressEntity::find()
        .filter(address::Column::UserId.eq(user_id))
        .filter(address::Column::AddressType.eq(payload.address_type))
        .one(&txn)
        .await
    {
        Ok(Some(model)) => {
            let mut model: address::ActiveModel = model.into();

            //address_type and user_id are fixed at creation.
            if let Some(first_name) = payload.first_name {
                model.first_name = Set(first_name);
            }
            if let Some(last_name) = payload.last_name {
                model.last_name = Set(last_name);
            }
            if let Some(company_name) = payload.company_name {
                model.company_name = Set(Some(company_name));
            }
            if let Some(country) = payload.country {
                model.country = Set(country);
            }
            if let Some(street_address) = payload.street_address {
                model.street_address = Set(street_address);
            }
            if let Some(city) = payload.city {
                model.city = Set(city);
            }
            if let Some(state) = payload.state {
                model.state = Set(state);
            }
            if let Some(postcode) = payload.postcode {
                model.postcode = Set(postcode);
            }
            if let Some(phone) = payload.phone {
                model.phone = Set(phone);
            }
            if let Some(email) = payload.email {
                model.email = Set(email);
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
                    "error": format!(
                        "{} address not found. Please create it first.",
                        payload.address_type
                    )
                })),
            ),
            Err(ApiError::General("Address type not created yet".into())),
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
struct CreateAddress {
    address_type: AddressType,
    #[validate(length(min = 1, message = "First name is required"))]
    first_name: String,
    #[validate(length(min = 1, message = "Last name is required"))]
    last_name: String,
    company_name: Option<String>,
    #[validate(length(min = 1, message = "Country is required"))]
    country: String,
    #[validate(length(min = 1, message = "Street address is required"))]
    street_address: String,
    #[validate(length(min = 1, message = "City is required"))]
    city: String,
    #[validate(length(min = 1, message = "State is required"))]
    state: String,
    #[validate(length(min = 1, max = 20, message = "Postcode is malformed"))]
    postcode: String,
    #[validate(regex(path = *PHONE_REGEX, message = "Phone number is malformed"))]
    phone: String,
    #[validate(email(message = "Email is malformed"))]
    email: String,
}

#[derive(Deserialize, Clone, Debug, Validate)]
struct UpdateAddress {
    address_type: AddressType,
    #[validate(length(min = 1, message = "First name should not be empty"))]
    first_name: Option<String>,
    #[validate(length(min = 1, message = "Last name should not be empty"))]
    last_name: Option<String>,
    company_name: Option<String>,
    country: Option<String>,
    street_address: Option<String>,
    city: Option<String>,
    state: Option<String>,
    #[validate(length(min = 1, max = 20, message = "Postcode is malformed"))]
    postcode: Option<String>,
    #[validate(regex(path = *PHONE_REGEX, message = "Phone number is malformed"))]
    phone: Option<String>,
    #[validate(email(message = "Email is malformed"))]
    email: Option<String>,
}

pub(crate) static PHONE_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\+?[0-9 ()-]{7,15}$").unwrap());
