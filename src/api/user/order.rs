use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::Response,
    routing::post,
    Json, Router,
};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DatabaseTransaction, DbErr, EntityTrait,
    QueryFilter, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use validator::Validate;

use crate::entities::{
    address::{self, AddressType, Entity as AddressEntity},
    lead,
    order::{self, Entity as OrderEntity, PaymentStatus},
    order_item,
};
use crate::middleware::auth::Claims;
use crate::middleware::logging::{to_response, ApiError};

use super::address::PHONE_REGEX;

//Two fixed GST components, each taken on the order subtotal.
const CGST_RATE: f32 = 0.09;
const SGST_RATE: f32 = 0.09;

//ROUTERS
pub fn order_router(db: Arc<DatabaseConnection>) -> Router {
    Router::new()
        .route("/orders/fill-details/", post(fill_details))
        .route("/orders/", post(create_order))
        .route("/orders/:id/pay/", post(process_payment))
        .layer(Extension(db))
}

//ROUTES

//Checkout step one: capture billing and shipping details, upserting the
//caller's address of each type.
async fn fill_details(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<FillDetails>,
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

    let result = async {
        upsert_address(&txn, user_id, AddressType::Billing, payload.billing_address).await?;
        upsert_address(&txn, user_id, AddressType::Shipping, payload.shipping_address).await?;
        Ok::<(), DbErr>(())
    };

    match result.await {
        Ok(_) => match txn.commit().await {
            Ok(_) => to_response(
                (
                    StatusCode::OK,
                    Json(json!({
                        "message": "Details saved successfully"
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

//The order and all of its items are one atomic unit: any invalid item
//rolls everything back.
async fn create_order(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<CreateOrder>,
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

    //Address snapshots: payload wins, stored address is the fallback.
    let billing = match resolve_address_snapshot(
        &txn,
        user_id,
        AddressType::Billing,
        payload.billing_address,
    )
    .await
    {
        Ok(Some(snapshot)) => snapshot,
        Ok(None) => {
            return to_response(
                (
                    StatusCode::BAD_REQUEST,
                    Json(json!({
                        "error": "Billing address is required"
                    })),
                ),
                Err(ApiError::General("No billing address".into())),
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

    let shipping = match resolve_address_snapshot(
        &txn,
        user_id,
        AddressType::Shipping,
        payload.shipping_address,
    )
    .await
    {
        Ok(Some(snapshot)) => snapshot,
        Ok(None) => {
            return to_response(
                (
                    StatusCode::BAD_REQUEST,
                    Json(json!({
                        "error": "Shipping address is required"
                    })),
                ),
                Err(ApiError::General("No shipping address".into())),
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

    //Validate every item and snapshot its unit price before writing
    //anything.
    let mut priced_items: Vec<(i32, f32, u32)> = Vec::with_capacity(payload.items.len());
    for item in &payload.items {
        if item.quantity == 0 {
            let _ = txn.rollback().await;
            return to_response(
                (
                    StatusCode::BAD_REQUEST,
                    Json(json!({
                        "error": "Quantity should be greater than 0"
                    })),
                ),
                Err(ApiError::General(format!(
                    "Zero quantity for lead {}",
                    item.lead_id
                ))),
            );
        }

        let model = match lead::Entity::find_by_id(item.lead_id).one(&txn).await {
            Ok(Some(model)) => model,
            Ok(None) => {
                let _ = txn.rollback().await;
                return to_response(
                    (
                        StatusCode::NOT_FOUND,
                        Json(json!({
                            "error": format!("Lead {} not found", item.lead_id)
                        })),
                    ),
                    Err(ApiError::General(format!(
                        "No lead with {} id was found",
                        item.lead_id
                    ))),
                );
            }
            Err(err) => {
                let _ = txn.rollback().await;
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

        let unit_price = match model.discount_price.or(model.price) {
            Some(price) => price,
            None => {
                let _ = txn.rollback().await;
                return to_response(
                    (
                        StatusCode::BAD_REQUEST,
                        Json(json!({
                            "error": format!("Lead {} has no price set", item.lead_id)
                        })),
                    ),
                    Err(ApiError::General(format!(
                        "Lead {} is not purchasable",
                        item.lead_id
                    ))),
                );
            }
        };

        priced_items.push((item.lead_id, unit_price, item.quantity));
    }

    let subtotal = round2(
        priced_items
            .iter()
            .map(|(_, price, quantity)| price * *quantity as f32)
            .sum(),
    );
    let cgst = round2(subtotal * CGST_RATE);
    let sgst = round2(subtotal * SGST_RATE);
    let total = round2(subtotal + cgst + sgst);

    let new_order = order::ActiveModel {
        user_id: Set(user_id),
        billing_address: Set(billing),
        shipping_address: Set(shipping),
        subtotal: Set(subtotal),
        cgst: Set(cgst),
        sgst: Set(sgst),
        total: Set(total),
        payment_status: Set(PaymentStatus::Pending),
        created_at: Set(Utc::now()),
        ..Default::default()
    };

    let order_model = match OrderEntity::insert(new_order).exec_with_returning(&txn).await {
        Ok(model) => model,
        Err(err) => {
            let _ = txn.rollback().await;
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

    let item_rows: Vec<order_item::ActiveModel> = priced_items
        .into_iter()
        .map(|(lead_id, price, quantity)| order_item::ActiveModel {
            order_id: Set(order_model.id),
            lead_id: Set(lead_id),
            price: Set(price),
            quantity: Set(quantity),
            ..Default::default()
        })
        .collect();

    if let Err(err) = order_item::Entity::insert_many(item_rows).exec(&txn).await {
        let _ = txn.rollback().await;
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

    let items = match order_item::Entity::find()
        .filter(order_item::Column::OrderId.eq(order_model.id))
        .all(&txn)
        .await
    {
        Ok(items) => items,
        Err(err) => {
            let _ = txn.rollback().await;
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

    match txn.commit().await {
        Ok(_) => {
            let mut body = match serde_json::to_value(&order_model) {
                Ok(body) => body,
                Err(_) => json!({ "id": order_model.id }),
            };
            body["items"] = serde_json::to_value(&items).unwrap_or_else(|_| json!([]));
            to_response((StatusCode::CREATED, Json(body)), Ok(()))
        }
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

//The gateway outcome signal: flips a Pending order to Paid or Failed.
async fn process_payment(
    Path(id): Path<i32>,
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<PayOrder>,
) -> Response {
    if payload.status == PaymentStatus::Pending {
        return to_response(
            (
                StatusCode::BAD_REQUEST,
                Json(json!({
                    "error": "Invalid payment status"
                })),
            ),
            Err(ApiError::General("Pending is not a payment outcome".into())),
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

    match OrderEntity::find_by_id(id)
        .filter(order::Column::UserId.eq(claims.user_id))
        .one(&txn)
        .await
    {
        Ok(Some(model)) => {
            if model.payment_status != PaymentStatus::Pending {
                return to_response(
                    (
                        StatusCode::CONFLICT,
                        Json(json!({
                            "error": "Order already processed"
                        })),
                    ),
                    Err(ApiError::General(format!(
                        "Order {id} is already {}",
                        model.payment_status
                    ))),
                );
            }

            let mut model: order::ActiveModel = model.into();
            model.payment_status = Set(payload.status);

            match model.update(&txn).await {
                Ok(_) => match txn.commit().await {
                    Ok(_) => to_response(
                        (
                            StatusCode::OK,
                            Json(json!({
                                "message": "Payment processed successfully",
                                "payment_status": payload.status
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
        Ok(None) => to_response(
            (
                StatusCode::NOT_FOUND,
                Json(json!({
                    "error": "Order not found"
                })),
            ),
            Err(ApiError::General(format!("No order with {id} id was found"))),
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

//utilities
async fn upsert_address(
    txn: &DatabaseTransaction,
    user_id: i32,
    address_type: AddressType,
    fields: AddressFields,
) -> Result<(), DbErr> {
    let existing = AddressEntity::find()
        .filter(address::Column::UserId.eq(user_id))
        .filter(address::Column::AddressType.eq(address_type))
        .one(txn)
        .await?;

    match existing {
        Some(model) => {
            let mut model: address::ActiveModel = model.into();
            model.first_name = Set(fields.first_name);
            model.last_name = Set(fields.last_name);
            model.company_name = Set(fields.company_name);
            model.country = Set(fields.country);
            model.street_address = Set(fields.street_address);
            model.city = Set(fields.city);
            model.state = Set(fields.state);
            model.postcode = Set(fields.postcode);
            model.phone = Set(fields.phone);
            model.email = Set(fields.email);
            model.update(txn).await?;
        }
        None => {
            let new_address = address::ActiveModel {
                user_id: Set(user_id),
                address_type: Set(address_type),
                first_name: Set(fields.first_name),
                last_name: Set(fields.last_name),
                company_name: Set(fields.company_name),
                country: Set(fields.country),
                street_address: Set(fields.street_address),
                city: Set(fields.city),
                state: Set(fields.state),
                postcode: Set(fields.postcode),
                phone: Set(fields.phone),
                email: Set(fields.email),
                ..Default::default()
            };
            AddressEntity::insert(new_address).exec(txn).await?;
        }
    }

    Ok(())
}

//Payload snapshot wins; otherwise fall back to the stored address of that
//type, serialized as it was at order time.
async fn resolve_address_snapshot(
    txn: &DatabaseTransaction,
    user_id: i32,
    address_type: AddressType,
    payload: Option<serde_json::Value>,
) -> Result<Option<serde_json::Value>, DbErr> {
    if let Some(snapshot) = payload {
        return Ok(Some(snapshot));
    }

    let stored = AddressEntity::find()
        .filter(address::Column::UserId.eq(user_id))
        .filter(address::Column::AddressType.eq(address_type))
        .one(txn)
        .await?;

    Ok(stored.and_then(|model| serde_json::to_value(&model).ok()))
}

fn round2(value: f32) -> f32 {
    (value * 100.0).round() / 100.0
}

//structs
#[derive(Deserialize, Clone, Debug, Validate)]
struct FillDetails {
    #[validate(nested)]
    billing_address: AddressFields,
    #[validate(nested)]
    shipping_address: AddressFields,
}

#[derive(Deserialize, Clone, Debug, Validate)]
struct AddressFields {
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
struct CreateOrder {
    #[validate(length(min = 1, message = "Order should contain at least one item"))]
    items: Vec<OrderItemInput>,
    billing_address: Option<serde_json::Value>,
    shipping_address: Option<serde_json::Value>,
}

#[derive(Deserialize, Serialize, Clone, Debug)]
struct OrderItemInput {
    lead_id: i32,
    quantity: u32,
}

#[derive(Deserialize, Clone, Debug)]
struct PayOrder {
    status: PaymentStatus,
}
