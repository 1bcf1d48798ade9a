#![allow(dead_code)]

use reqwest::header;
use reqwest::StatusCode;
use serde_json::json;
use std::time::{SystemTime, UNIX_EPOCH};

pub const BASE_URL: &str = "http://127.0.0.1:3000";

//Usernames are uniquified from the clock so every test file can run against
//the same live server in any order.
pub fn unique_username(prefix: &str) -> String {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("Clock went backwards")
        .as_nanos();
    format!("{prefix}_{nanos}")
}

pub fn bearer_headers(token: &str) -> header::HeaderMap {
    let mut headers = header::HeaderMap::new();
    headers.insert(
        header::AUTHORIZATION,
        header::HeaderValue::from_str(&format!("Bearer {}", token))
            .expect("Failed to create Authorization header"),
    );
    headers
}

//Registers a fresh account and signs in, returning (access, refresh).
pub async fn signup_and_signin(client: &reqwest::Client, prefix: &str) -> (String, String) {
    let username = unique_username(prefix);

    let signup_payload = json!({
        "username": username,
        "email": format!("{username}@example.com"),
        "password": "Secret15"
    });

    let signup_response = client
        .post(format!("{BASE_URL}/signup"))
        .json(&signup_payload)
        .send()
        .await
        .expect("Failed to send signup request");

    assert_eq!(signup_response.status(), StatusCode::CREATED);

    let signin_payload = json!({
        "username": username,
        "password": "Secret15"
    });

    let signin_response = client
        .post(format!("{BASE_URL}/signin"))
        .json(&signin_payload)
        .send()
        .await
        .expect("Failed to send signin request");

    assert_eq!(signin_response.status(), StatusCode::OK);

    let signin_body = signin_response
        .json::<serde_json::Value>()
        .await
        .expect("Failed to parse signin response JSON");

    let access = signin_body["access"]
        .as_str()
        .expect("Access token not found in signin response")
        .to_string();
    let refresh = signin_body["refresh"]
        .as_str()
        .expect("Refresh token not found in signin response")
        .to_string();

    (access, refresh)
}

pub fn lead_payload() -> serde_json::Value {
    json!({
        "name": "3BHK Renovation",
        "location": "Pune",
        "property_type": "Apartment",
        "property_status": "Vacant",
        "service_required_on": "2025-09-15",
        "budget": 250000.0,
        "requirement": "Modular kitchen and wardrobes",
        "tags": "kitchen,wardrobe",
        "price": 1200.0,
        "discount_price": 999.0
    })
}

//Creates a lead with the given payload and returns its id.
pub async fn create_lead(
    client: &reqwest::Client,
    headers: &header::HeaderMap,
    payload: &serde_json::Value,
) -> i64 {
    let create_response = client
        .post(format!("{BASE_URL}/leads/"))
        .headers(headers.clone())
        .json(payload)
        .send()
        .await
        .expect("Failed to send create lead request");

    assert_eq!(create_response.status(), StatusCode::CREATED);

    let create_body = create_response
        .json::<serde_json::Value>()
        .await
        .expect("Failed to parse create lead response JSON");

    create_body["id"].as_i64().expect("Lead id not in response")
}
