//! User profile model for storage and API.

use serde::{Deserialize, Serialize};

/// User profile stored in Firestore.
///
/// `follower_count` and `following_count` are advisory caches refreshed
/// best-effort after follow toggles. The source of truth is the server-side
/// count over the `follows` collection; reads that need an accurate number
/// recount there.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Identity-provider user ID (also used as document ID)
    pub user_id: String,
    /// Display name shown on murmurs and replies
    pub display_name: String,
    /// Email address (may be None if not shared)
    pub email: Option<String>,
    /// Avatar URL
    pub photo_url: Option<String>,
    /// Cached follower count (advisory, may lag)
    #[serde(default)]
    pub follower_count: u32,
    /// Cached following count (advisory, may lag)
    #[serde(default)]
    pub following_count: u32,
    /// When the profile was created (RFC3339)
    pub created_at: String,
}

impl User {
    /// Placeholder profile used when an author lookup fails or the profile
    /// record is missing. Enrichment must never fail a whole page over one
    /// absent profile.
    pub fn placeholder(user_id: &str) -> Self {
        Self {
            user_id: user_id.to_string(),
            display_name: "Anonymous".to_string(),
            email: None,
            photo_url: None,
            follower_count: 0,
            following_count: 0,
            created_at: String::new(),
        }
    }
}
