mod common;

use common::{bearer_headers, create_lead, lead_payload, signup_and_signin, BASE_URL};
use reqwest::StatusCode;
use serde_json::json;

fn review_payload() -> serde_json::Value {
    json!({
        "name": "Reviewer",
        "email": "reviewer@example.com",
        "rating": 4,
        "review_text": "Responsive owner, clear requirements"
    })
}

#[tokio::test]
async fn test_create_and_list_reviews() {
    let client = reqwest::Client::new();
    let (access, _) = signup_and_signin(&client, "review").await;
    let headers = bearer_headers(&access);

    let lead_id = create_lead(&client, &headers, &lead_payload()).await;

    let create_response = client
        .post(format!("{BASE_URL}/leads/{lead_id}/reviews/"))
        .headers(headers.clone())
        .json(&review_payload())
        .send()
        .await
        .expect("Failed to send create review request");

    assert_eq!(create_response.status(), StatusCode::CREATED);

    let created = create_response
        .json::<serde_json::Value>()
        .await
        .expect("Failed to parse create review response JSON");

    assert_eq!(created["rating"].as_i64(), Some(4));
    assert!(created["user_id"].as_i64().is_some());

    // Listing is public
    let list_response = client
        .get(format!("{BASE_URL}/leads/{lead_id}/reviews/"))
        .send()
        .await
        .expect("Failed to send list reviews request");

    assert_eq!(list_response.status(), StatusCode::OK);

    let list_body = list_response
        .json::<serde_json::Value>()
        .await
        .expect("Failed to parse list reviews response JSON");

    assert_eq!(list_body.as_array().map(|a| a.len()), Some(1));
}

#[tokio::test]
async fn test_rating_out_of_range_is_rejected() {
    let client = reqwest::Client::new();
    let (access, _) = signup_and_signin(&client, "badrating").await;
    let headers = bearer_headers(&access);

    let lead_id = create_lead(&client, &headers, &lead_payload()).await;

    let mut payload = review_payload();
    payload["rating"] = json!(6);

    let create_response = client
        .post(format!("{BASE_URL}/leads/{lead_id}/reviews/"))
        .headers(headers.clone())
        .json(&payload)
        .send()
        .await
        .expect("Failed to send create review request");

    assert_eq!(create_response.status(), StatusCode::BAD_REQUEST);

    let body = create_response
        .json::<serde_json::Value>()
        .await
        .expect("Failed to parse create review response JSON");

    assert!(body["fields"]["rating"].is_array());
}

#[tokio::test]
async fn test_review_for_missing_lead_returns_404() {
    let client = reqwest::Client::new();
    let (access, _) = signup_and_signin(&client, "reviewmiss").await;

    let create_response = client
        .post(format!("{BASE_URL}/leads/987654321/reviews/"))
        .headers(bearer_headers(&access))
        .json(&review_payload())
        .send()
        .await
        .expect("Failed to send create review request");

    assert_eq!(create_response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_only_author_can_update_or_delete() {
    let client = reqwest::Client::new();
    let (author_access, _) = signup_and_signin(&client, "author").await;
    let (other_access, _) = signup_and_signin(&client, "other").await;
    let author_headers = bearer_headers(&author_access);
    let other_headers = bearer_headers(&other_access);

    let lead_id = create_lead(&client, &author_headers, &lead_payload()).await;

    let create_response = client
        .post(format!("{BASE_URL}/leads/{lead_id}/reviews/"))
        .headers(author_headers.clone())
        .json(&review_payload())
        .send()
        .await
        .expect("Failed to send create review request");

    assert_eq!(create_response.status(), StatusCode::CREATED);

    let review_id = create_response
        .json::<serde_json::Value>()
        .await
        .expect("Failed to parse create review response JSON")["id"]
        .as_i64()
        .expect("Review id not in response");

    // A different user gets 403, never 200
    let foreign_update = client
        .put(format!("{BASE_URL}/reviews/{review_id}/"))
        .headers(other_headers.clone())
        .json(&json!({ "rating": 1 }))
        .send()
        .await
        .expect("Failed to send update review request");

    assert_eq!(foreign_update.status(), StatusCode::FORBIDDEN);

    let foreign_delete = client
        .delete(format!("{BASE_URL}/reviews/{review_id}/"))
        .headers(other_headers.clone())
        .send()
        .await
        .expect("Failed to send delete review request");

    assert_eq!(foreign_delete.status(), StatusCode::FORBIDDEN);

    // The author can do both
    let author_update = client
        .put(format!("{BASE_URL}/reviews/{review_id}/"))
        .headers(author_headers.clone())
        .json(&json!({ "rating": 5 }))
        .send()
        .await
        .expect("Failed to send update review request");

    assert_eq!(author_update.status(), StatusCode::OK);

    let updated = author_update
        .json::<serde_json::Value>()
        .await
        .expect("Failed to parse update review response JSON");

    assert_eq!(updated["rating"].as_i64(), Some(5));

    let author_delete = client
        .delete(format!("{BASE_URL}/reviews/{review_id}/"))
        .headers(author_headers.clone())
        .send()
        .await
        .expect("Failed to send delete review request");

    assert_eq!(author_delete.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_update_missing_review_returns_404() {
    let client = reqwest::Client::new();
    let (access, _) = signup_and_signin(&client, "reviewgone").await;

    let update_response = client
        .put(format!("{BASE_URL}/reviews/987654321/"))
        .headers(bearer_headers(&access))
        .json(&json!({ "rating": 3 }))
        .send()
        .await
        .expect("Failed to send update review request");

    assert_eq!(update_response.status(), StatusCode::NOT_FOUND);
}
