mod common;

use common::{bearer_headers, signup_and_signin, unique_username, BASE_URL};
use reqwest::StatusCode;
use serde_json::json;

#[tokio::test]
async fn test_signup_signin_profile_flow() {
    let client = reqwest::Client::new();
    let username = unique_username("alice");

    // Step 1: Sign up
    let signup_payload = json!({
        "username": username,
        "email": format!("{username}@example.com"),
        "password": "pw123"
    });

    let signup_response = client
        .post(format!("{BASE_URL}/signup"))
        .json(&signup_payload)
        .send()
        .await
        .expect("Failed to send signup request");

    assert_eq!(signup_response.status(), StatusCode::CREATED);

    let signup_body = signup_response
        .json::<serde_json::Value>()
        .await
        .expect("Failed to parse signup response JSON");

    assert_eq!(signup_body["username"].as_str(), Some(username.as_str()));
    assert!(signup_body["id"].as_i64().is_some());
    assert!(signup_body.get("password").is_none());

    // Step 2: Sign in
    let signin_payload = json!({
        "username": username,
        "password": "pw123"
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
        .expect("Access token not found in signin response");
    assert!(signin_body["refresh"].as_str().is_some());

    // Step 3: Fetch own profile
    let profile_response = client
        .get(format!("{BASE_URL}/profile"))
        .headers(bearer_headers(access))
        .send()
        .await
        .expect("Failed to send profile request");

    assert_eq!(profile_response.status(), StatusCode::OK);

    let profile_body = profile_response
        .json::<serde_json::Value>()
        .await
        .expect("Failed to parse profile response JSON");

    assert_eq!(profile_body["username"].as_str(), Some(username.as_str()));
}

#[tokio::test]
async fn test_signup_rejects_duplicate_username() {
    let client = reqwest::Client::new();
    let username = unique_username("dupe");

    let signup_payload = json!({
        "username": username,
        "email": format!("{username}@example.com"),
        "password": "Secret15"
    });

    let first = client
        .post(format!("{BASE_URL}/signup"))
        .json(&signup_payload)
        .send()
        .await
        .expect("Failed to send signup request");

    assert_eq!(first.status(), StatusCode::CREATED);

    let second = client
        .post(format!("{BASE_URL}/signup"))
        .json(&signup_payload)
        .send()
        .await
        .expect("Failed to send signup request");

    assert_eq!(second.status(), StatusCode::BAD_REQUEST);

    let second_body = second
        .json::<serde_json::Value>()
        .await
        .expect("Failed to parse signup response JSON");

    assert_eq!(
        second_body["error"].as_str(),
        Some("Username already exists")
    );
}

#[tokio::test]
async fn test_signup_rejects_malformed_email() {
    let client = reqwest::Client::new();

    let signup_payload = json!({
        "username": unique_username("bademail"),
        "email": "not-an-email",
        "password": "Secret15"
    });

    let signup_response = client
        .post(format!("{BASE_URL}/signup"))
        .json(&signup_payload)
        .send()
        .await
        .expect("Failed to send signup request");

    assert_eq!(signup_response.status(), StatusCode::BAD_REQUEST);

    let body = signup_response
        .json::<serde_json::Value>()
        .await
        .expect("Failed to parse signup response JSON");

    assert!(body["fields"]["email"].is_array());
}

#[tokio::test]
async fn test_signin_rejects_bad_credentials() {
    let client = reqwest::Client::new();
    let username = unique_username("wrongpw");

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

    // Wrong password for a real account
    let signin_response = client
        .post(format!("{BASE_URL}/signin"))
        .json(&json!({ "username": username, "password": "nope" }))
        .send()
        .await
        .expect("Failed to send signin request");

    assert_eq!(signin_response.status(), StatusCode::BAD_REQUEST);

    let body = signin_response
        .json::<serde_json::Value>()
        .await
        .expect("Failed to parse signin response JSON");

    assert_eq!(body["error"].as_str(), Some("Invalid credentials"));

    // Unknown username gets the same answer
    let unknown_response = client
        .post(format!("{BASE_URL}/signin"))
        .json(&json!({ "username": unique_username("ghost"), "password": "nope" }))
        .send()
        .await
        .expect("Failed to send signin request");

    assert_eq!(unknown_response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_profile_requires_token() {
    let client = reqwest::Client::new();

    let profile_response = client
        .get(format!("{BASE_URL}/profile"))
        .send()
        .await
        .expect("Failed to send profile request");

    assert_eq!(profile_response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_logout_revokes_refresh_token() {
    let client = reqwest::Client::new();
    let (access, refresh) = signup_and_signin(&client, "logout").await;

    // Step 1: Log out with the fresh refresh token
    let logout_response = client
        .post(format!("{BASE_URL}/logout"))
        .headers(bearer_headers(&access))
        .json(&json!({ "refresh": refresh }))
        .send()
        .await
        .expect("Failed to send logout request");

    assert_eq!(logout_response.status(), StatusCode::OK);

    let logout_body = logout_response
        .json::<serde_json::Value>()
        .await
        .expect("Failed to parse logout response JSON");

    assert_eq!(
        logout_body["message"].as_str(),
        Some("Logged out successfully")
    );

    // Step 2: The same token is now revoked
    let second_logout = client
        .post(format!("{BASE_URL}/logout"))
        .headers(bearer_headers(&access))
        .json(&json!({ "refresh": refresh }))
        .send()
        .await
        .expect("Failed to send logout request");

    assert_eq!(second_logout.status(), StatusCode::BAD_REQUEST);

    let second_body = second_logout
        .json::<serde_json::Value>()
        .await
        .expect("Failed to parse logout response JSON");

    assert_eq!(
        second_body["error"].as_str(),
        Some("Invalid or expired refresh token")
    );
}

#[tokio::test]
async fn test_logout_rejects_garbage_token() {
    let client = reqwest::Client::new();
    let (access, _) = signup_and_signin(&client, "garbage").await;

    let logout_response = client
        .post(format!("{BASE_URL}/logout"))
        .headers(bearer_headers(&access))
        .json(&json!({ "refresh": "not-a-jwt" }))
        .send()
        .await
        .expect("Failed to send logout request");

    assert_eq!(logout_response.status(), StatusCode::BAD_REQUEST);
}
