mod common;

use common::{bearer_headers, create_lead, lead_payload, signup_and_signin, BASE_URL};
use reqwest::StatusCode;

#[tokio::test]
async fn test_add_and_list_wishlist() {
    let client = reqwest::Client::new();
    let (access, _) = signup_and_signin(&client, "wish").await;
    let headers = bearer_headers(&access);

    let lead_id = create_lead(&client, &headers, &lead_payload()).await;

    let add_response = client
        .post(format!("{BASE_URL}/wishlists/{lead_id}/"))
        .headers(headers.clone())
        .send()
        .await
        .expect("Failed to send add wishlist request");

    assert_eq!(add_response.status(), StatusCode::CREATED);

    let added = add_response
        .json::<serde_json::Value>()
        .await
        .expect("Failed to parse add wishlist response JSON");

    assert_eq!(added["lead_id"].as_i64(), Some(lead_id));

    let list_response = client
        .get(format!("{BASE_URL}/wishlists/"))
        .headers(headers.clone())
        .send()
        .await
        .expect("Failed to send list wishlist request");

    assert_eq!(list_response.status(), StatusCode::OK);

    let list_body = list_response
        .json::<serde_json::Value>()
        .await
        .expect("Failed to parse list wishlist response JSON");

    assert_eq!(list_body.as_array().map(|a| a.len()), Some(1));
}

#[tokio::test]
async fn test_duplicate_add_conflicts_and_keeps_one_row() {
    let client = reqwest::Client::new();
    let (access, _) = signup_and_signin(&client, "wishdupe").await;
    let headers = bearer_headers(&access);

    let lead_id = create_lead(&client, &headers, &lead_payload()).await;

    let first = client
        .post(format!("{BASE_URL}/wishlists/{lead_id}/"))
        .headers(headers.clone())
        .send()
        .await
        .expect("Failed to send add wishlist request");

    assert_eq!(first.status(), StatusCode::CREATED);

    let second = client
        .post(format!("{BASE_URL}/wishlists/{lead_id}/"))
        .headers(headers.clone())
        .send()
        .await
        .expect("Failed to send add wishlist request");

    assert_eq!(second.status(), StatusCode::CONFLICT);

    let second_body = second
        .json::<serde_json::Value>()
        .await
        .expect("Failed to parse add wishlist response JSON");

    assert_eq!(
        second_body["error"].as_str(),
        Some("Lead already in wishlist")
    );

    let list_response = client
        .get(format!("{BASE_URL}/wishlists/"))
        .headers(headers.clone())
        .send()
        .await
        .expect("Failed to send list wishlist request");

    let list_body = list_response
        .json::<serde_json::Value>()
        .await
        .expect("Failed to parse list wishlist response JSON");

    assert_eq!(list_body.as_array().map(|a| a.len()), Some(1));
}

#[tokio::test]
async fn test_add_missing_lead_returns_404() {
    let client = reqwest::Client::new();
    let (access, _) = signup_and_signin(&client, "wishmiss").await;

    let add_response = client
        .post(format!("{BASE_URL}/wishlists/987654321/"))
        .headers(bearer_headers(&access))
        .send()
        .await
        .expect("Failed to send add wishlist request");

    assert_eq!(add_response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_remove_then_remove_again() {
    let client = reqwest::Client::new();
    let (access, _) = signup_and_signin(&client, "wishrm").await;
    let headers = bearer_headers(&access);

    let lead_id = create_lead(&client, &headers, &lead_payload()).await;

    let add_response = client
        .post(format!("{BASE_URL}/wishlists/{lead_id}/"))
        .headers(headers.clone())
        .send()
        .await
        .expect("Failed to send add wishlist request");

    assert_eq!(add_response.status(), StatusCode::CREATED);

    let remove_response = client
        .delete(format!("{BASE_URL}/wishlists/{lead_id}/"))
        .headers(headers.clone())
        .send()
        .await
        .expect("Failed to send remove wishlist request");

    assert_eq!(remove_response.status(), StatusCode::OK);

    let remove_body = remove_response
        .json::<serde_json::Value>()
        .await
        .expect("Failed to parse remove wishlist response JSON");

    assert_eq!(
        remove_body["message"].as_str(),
        Some("Removed from wishlist")
    );

    let second_remove = client
        .delete(format!("{BASE_URL}/wishlists/{lead_id}/"))
        .headers(headers.clone())
        .send()
        .await
        .expect("Failed to send remove wishlist request");

    assert_eq!(second_remove.status(), StatusCode::NOT_FOUND);
}
