// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Murmur (post), like edge, and reply models.

use serde::{Deserialize, Serialize};

/// Maximum murmur/reply length in Unicode code points.
pub const MAX_TEXT_CODE_POINTS: usize = 280;

/// A short text post, stored in `murmurs/{murmur_id}`.
///
/// Immutable after creation except for deletion and `like_count`, which is
/// a cached hint of the like-edge count. The authoritative count is always
/// an aggregation over the `likes` subcollection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Murmur {
    /// UUIDv4, also the document ID
    pub murmur_id: String,
    /// Owning user; never changes after creation
    pub author_id: String,
    /// Post body, at most [`MAX_TEXT_CODE_POINTS`] code points
    pub text: String,
    /// Server-assigned creation time (RFC3339, microsecond precision)
    pub created_at: String,
    /// Advisory like count; may lag the subcollection
    #[serde(default)]
    pub like_count: u32,
}

/// Like edge, stored in `murmurs/{murmur_id}/likes/{user_id}`.
///
/// The document's existence IS the liked state; there is no boolean flag
/// anywhere. The user ID doubles as the document ID, which makes the
/// like/unlike writes idempotent by key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LikeEdge {
    pub user_id: String,
    pub liked_at: String,
}

/// Reply, stored in `murmurs/{murmur_id}/replies/{reply_id}`.
///
/// Listed oldest-first (thread order), opposite of the feed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reply {
    /// UUIDv4, also the document ID
    pub reply_id: String,
    pub author_id: String,
    pub text: String,
    pub created_at: String,
}

/// Validate and normalize murmur/reply text.
///
/// Returns the trimmed text, or an error message when it is empty after
/// trimming or exceeds the code-point limit. Runs before any store write.
pub fn validate_text(text: &str) -> Result<String, String> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err("Text must not be empty".to_string());
    }
    let code_points = trimmed.chars().count();
    if code_points > MAX_TEXT_CODE_POINTS {
        return Err(format!(
            "Text exceeds {} code points (got {})",
            MAX_TEXT_CODE_POINTS, code_points
        ));
    }
    Ok(trimmed.to_string())
}
