// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Denormalized feed item models (enrichment output).

use serde::Serialize;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Author details attached to a murmur or reply at read time.
#[derive(Serialize, Clone, Debug)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct AuthorSummary {
    pub user_id: String,
    pub display_name: String,
    pub photo_url: Option<String>,
}

/// A murmur enriched with its author profile and authoritative like count.
#[derive(Serialize, Clone, Debug)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct FeedItem {
    pub murmur_id: String,
    pub text: String,
    pub created_at: String,
    pub author: AuthorSummary,
    /// Like count from the engagement store, not the cached field
    pub like_count: u32,
    /// Whether the requesting user has liked this murmur
    pub liked_by_me: bool,
}
