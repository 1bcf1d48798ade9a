mod common;

use common::{bearer_headers, signup_and_signin, BASE_URL};
use reqwest::StatusCode;
use serde_json::json;

fn billing_payload() -> serde_json::Value {
    json!({
        "address_type": "billing",
        "first_name": "Asha",
        "last_name": "Verma",
        "company_name": "Verma Interiors",
        "country": "India",
        "street_address": "12 MG Road",
        "city": "Pune",
        "state": "Maharashtra",
        "postcode": "411001",
        "phone": "+91 2026123456",
        "email": "asha@example.com"
    })
}

#[tokio::test]
async fn test_create_then_duplicate_conflicts() {
    let client = reqwest::Client::new();
    let (access, _) = signup_and_signin(&client, "addr").await;
    let headers = bearer_headers(&access);

    let create_response = client
        .post(format!("{BASE_URL}/addresses/"))
        .headers(headers.clone())
        .json(&billing_payload())
        .send()
        .await
        .expect("Failed to send create address request");

    assert_eq!(create_response.status(), StatusCode::CREATED);

    // A second billing address is refused and the first one stays put
    let mut duplicate = billing_payload();
    duplicate["city"] = json!("Nashik");

    let duplicate_response = client
        .post(format!("{BASE_URL}/addresses/"))
        .headers(headers.clone())
        .json(&duplicate)
        .send()
        .await
        .expect("Failed to send create address request");

    assert_eq!(duplicate_response.status(), StatusCode::CONFLICT);

    let list_response = client
        .get(format!("{BASE_URL}/addresses/"))
        .headers(headers.clone())
        .send()
        .await
        .expect("Failed to send list addresses request");

    assert_eq!(list_response.status(), StatusCode::OK);

    let addresses = list_response
        .json::<serde_json::Value>()
        .await
        .expect("Failed to parse list addresses response JSON");

    let addresses = addresses.as_array().expect("Addresses is not an array");
    assert_eq!(addresses.len(), 1);
    assert_eq!(addresses[0]["city"].as_str(), Some("Pune"));
}

#[tokio::test]
async fn test_update_requires_existing_address() {
    let client = reqwest::Client::new();
    let (access, _) = signup_and_signin(&client, "addrupd").await;
    let headers = bearer_headers(&access);

    // Nothing created yet: PUT is a 404
    let early_update = client
        .put(format!("{BASE_URL}/addresses/"))
        .headers(headers.clone())
        .json(&json!({ "address_type": "shipping", "city": "Nagpur" }))
        .send()
        .await
        .expect("Failed to send update address request");

    assert_eq!(early_update.status(), StatusCode::NOT_FOUND);

    let mut shipping = billing_payload();
    shipping["address_type"] = json!("shipping");

    let create_response = client
        .post(format!("{BASE_URL}/addresses/"))
        .headers(headers.clone())
        .json(&shipping)
        .send()
        .await
        .expect("Failed to send create address request");

    assert_eq!(create_response.status(), StatusCode::CREATED);

    let update_response = client
        .put(format!("{BASE_URL}/addresses/"))
        .headers(headers.clone())
        .json(&json!({ "address_type": "shipping", "city": "Nagpur" }))
        .send()
        .await
        .expect("Failed to send update address request");

    assert_eq!(update_response.status(), StatusCode::OK);

    let updated = update_response
        .json::<serde_json::Value>()
        .await
        .expect("Failed to parse update address response JSON");

    assert_eq!(updated["city"].as_str(), Some("Nagpur"));
    assert_eq!(updated["street_address"].as_str(), Some("12 MG Road"));
}

#[tokio::test]
async fn test_both_types_can_coexist() {
    let client = reqwest::Client::new();
    let (access, _) = signup_and_signin(&client, "addrboth").await;
    let headers = bearer_headers(&access);

    let billing_response = client
        .post(format!("{BASE_URL}/addresses/"))
        .headers(headers.clone())
        .json(&billing_payload())
        .send()
        .await
        .expect("Failed to send create address request");

    assert_eq!(billing_response.status(), StatusCode::CREATED);

    let mut shipping = billing_payload();
    shipping["address_type"] = json!("shipping");

    let shipping_response = client
        .post(format!("{BASE_URL}/addresses/"))
        .headers(headers.clone())
        .json(&shipping)
        .send()
        .await
        .expect("Failed to send create address request");

    assert_eq!(shipping_response.status(), StatusCode::CREATED);

    let list_response = client
        .get(format!("{BASE_URL}/addresses/"))
        .headers(headers.clone())
        .send()
        .await
        .expect("Failed to send list addresses request");

    let addresses = list_response
        .json::<serde_json::Value>()
        .await
        .expect("Failed to parse list addresses response JSON");

    assert_eq!(addresses.as_array().map(|a| a.len()), Some(2));
}

#[tokio::test]
async fn test_malformed_email_is_rejected() {
    let client = reqwest::Client::new();
    let (access, _) = signup_and_signin(&client, "addrmail").await;

    let mut payload = billing_payload();
    payload["email"] = json!("not-an-email");

    let create_response = client
        .post(format!("{BASE_URL}/addresses/"))
        .headers(bearer_headers(&access))
        .json(&payload)
        .send()
        .await
        .expect("Failed to send create address request");

    assert_eq!(create_response.status(), StatusCode::BAD_REQUEST);

    let body = create_response
        .json::<serde_json::Value>()
        .await
        .expect("Failed to parse create address response JSON");

    assert!(body["fields"]["email"].is_array());
}
