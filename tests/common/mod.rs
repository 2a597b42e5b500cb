// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use murmur_feed::config::Config;
use murmur_feed::db::FirestoreDb;
use murmur_feed::models::User;
use murmur_feed::routes::create_router;
use murmur_feed::services::{EngagementService, FeedService};
use murmur_feed::AppState;
use std::sync::Arc;

/// Check if emulator is available via environment variable.
#[allow(dead_code)]
pub fn emulator_available() -> bool {
    std::env::var("FIRESTORE_EMULATOR_HOST").is_ok()
}

/// Skip test with message if emulator not available.
#[macro_export]
macro_rules! require_emulator {
    () => {
        if !crate::common::emulator_available() {
            eprintln!("⚠️  Skipping: FIRESTORE_EMULATOR_HOST not set");
            return;
        }
    };
}

/// Create a test database connection.
#[allow(dead_code)]
pub async fn test_db() -> FirestoreDb {
    FirestoreDb::new("test-project")
        .await
        .expect("Failed to connect to Firestore emulator")
}

/// Create a mock database connection (offline).
#[allow(dead_code)]
pub fn test_db_offline() -> FirestoreDb {
    FirestoreDb::new_mock()
}

/// Create a test app over the given database.
/// Returns the router and the shared state.
#[allow(dead_code)]
pub fn create_test_app_with(db: FirestoreDb) -> (axum::Router, Arc<AppState>) {
    let config = Config::test_default();
    let feed_service = FeedService::new(db.clone());
    let engagement_service = EngagementService::new(db.clone(), feed_service.clone());

    let state = Arc::new(AppState {
        config,
        db,
        feed_service,
        engagement_service,
    });

    (create_router(state.clone()), state)
}

/// Create a test app with offline mock dependencies.
#[allow(dead_code)]
pub fn create_test_app() -> (axum::Router, Arc<AppState>) {
    create_test_app_with(test_db_offline())
}

/// Mint a session JWT the way the identity provider would.
#[allow(dead_code)]
pub fn create_test_jwt(user_id: &str, signing_key: &[u8]) -> String {
    murmur_feed::middleware::auth::create_jwt(user_id, signing_key)
        .expect("Failed to create test JWT")
}

/// Generate a unique user ID for test isolation.
#[allow(dead_code)]
pub fn unique_user_id(prefix: &str) -> String {
    use std::time::{SystemTime, UNIX_EPOCH};
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    format!("{}-{}", prefix, nanos)
}

/// Helper to create a basic test user profile.
#[allow(dead_code)]
pub fn test_user(user_id: &str, display_name: &str) -> User {
    User {
        user_id: user_id.to_string(),
        display_name: display_name.to_string(),
        email: Some(format!("{}@example.com", display_name.to_lowercase())),
        photo_url: None,
        follower_count: 0,
        following_count: 0,
        created_at: chrono::Utc::now().to_rfc3339(),
    }
}
