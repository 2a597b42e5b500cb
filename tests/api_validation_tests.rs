// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! API input validation tests.
//!
//! Validation is rejected before any store write, so these run against the
//! offline mock database: a 400 proves the request never reached Firestore.

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};
use tower::ServiceExt;

mod common;

fn authed_request(
    state: &std::sync::Arc<murmur_feed::AppState>,
    method: &str,
    uri: &str,
    body: serde_json::Value,
) -> Request<Body> {
    let token = common::create_test_jwt("user-1", &state.config.jwt_signing_key);
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn test_empty_murmur_rejected() {
    let (app, state) = common::create_test_app();

    let request = authed_request(&state, "POST", "/api/murmurs", serde_json::json!({"text": ""}));
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_whitespace_only_murmur_rejected() {
    let (app, state) = common::create_test_app();

    let request = authed_request(
        &state,
        "POST",
        "/api/murmurs",
        serde_json::json!({"text": "   \n\t  "}),
    );
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_oversized_murmur_rejected() {
    let (app, state) = common::create_test_app();

    let text = "x".repeat(281);
    let request = authed_request(&state, "POST", "/api/murmurs", serde_json::json!({"text": text}));
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_max_length_murmur_passes_validation() {
    let (app, state) = common::create_test_app();

    // Exactly 280 code points is valid; with the offline db the request
    // then fails at the store, not at validation.
    let text = "x".repeat(280);
    let request = authed_request(&state, "POST", "/api/murmurs", serde_json::json!({"text": text}));
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_self_follow_rejected() {
    let (app, state) = common::create_test_app();

    // Toggling a follow on yourself fails validation before any edge write
    let request = authed_request(
        &state,
        "POST",
        "/api/users/user-1/follow",
        serde_json::json!({}),
    );
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_invalid_feed_cursor_rejected() {
    let (app, state) = common::create_test_app();
    let token = common::create_test_jwt("user-1", &state.config.jwt_signing_key);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/feed?cursor=%24%24not-base64%24%24")
                .header(header::AUTHORIZATION, format!("Bearer {}", token))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_zero_per_page_rejected() {
    let (app, state) = common::create_test_app();
    let token = common::create_test_jwt("user-1", &state.config.jwt_signing_key);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/feed?per_page=0")
                .header(header::AUTHORIZATION, format!("Bearer {}", token))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_empty_display_name_rejected() {
    let (app, state) = common::create_test_app();

    let request = authed_request(
        &state,
        "PUT",
        "/api/me",
        serde_json::json!({"display_name": "  "}),
    );
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_empty_reply_rejected() {
    let (app, state) = common::create_test_app();

    let request = authed_request(
        &state,
        "POST",
        "/api/murmurs/some-id/replies",
        serde_json::json!({"text": ""}),
    );
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
