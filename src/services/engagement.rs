// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Toggle coordinator: idempotent like/unlike and follow/unfollow.
//!
//! Both toggles are check-then-act, not atomic. Two racing toggles from
//! the same user can both observe the same prior state and issue the same
//! write; because likes and follow edges are keyed by deterministic
//! document IDs, the duplicate write lands on the same document and the
//! net state still converges. A read immediately after a racing toggle may
//! see a stale count for a short window; that is accepted, not corrected.

use crate::db::FirestoreDb;
use crate::error::{AppError, Result};
use crate::models::murmur::validate_text;
use crate::models::{FollowEdge, LikeEdge, Reply};
use crate::services::FeedService;
use crate::time_utils::{format_utc_rfc3339, monotonic_now};
use serde::Serialize;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Outcome of a like toggle.
#[derive(Serialize, Debug)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct LikeToggleResult {
    pub liked: bool,
    /// Authoritative count recomputed after the flip
    pub like_count: u32,
}

/// Outcome of a follow toggle.
#[derive(Serialize, Debug)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct FollowToggleResult {
    pub following: bool,
}

/// Coordinates edge mutations against the engagement and social-graph
/// collections.
#[derive(Clone)]
pub struct EngagementService {
    db: FirestoreDb,
    feed: FeedService,
}

impl EngagementService {
    pub fn new(db: FirestoreDb, feed: FeedService) -> Self {
        Self { db, feed }
    }

    // ─── Likes ───────────────────────────────────────────────────

    /// Flip the like edge for (user, murmur).
    ///
    /// Reads current edge existence, then applies the complementary keyed
    /// write. The advisory `like_count` on the murmur document is refreshed
    /// best-effort afterwards; failure to refresh is logged, never surfaced.
    pub async fn toggle_like(&self, user_id: &str, murmur_id: &str) -> Result<LikeToggleResult> {
        let murmur = self
            .db
            .get_murmur(murmur_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Murmur {} not found", murmur_id)))?;

        let was_liked = self.db.get_like(murmur_id, user_id).await?.is_some();

        if was_liked {
            self.db.delete_like(murmur_id, user_id).await?;
        } else {
            let edge = LikeEdge {
                user_id: user_id.to_string(),
                liked_at: format_utc_rfc3339(monotonic_now()),
            };
            self.db.set_like(murmur_id, &edge).await?;
        }

        self.feed.invalidate_like_count(murmur_id);
        let like_count = self.db.count_likes(murmur_id).await?;

        // Advisory cache on the murmur document; the count above stays
        // authoritative even if this write is lost.
        let mut updated = murmur;
        updated.like_count = like_count;
        if let Err(e) = self.db.set_murmur(&updated).await {
            tracing::warn!(murmur_id, error = %e, "Failed to refresh like_count hint");
        }

        tracing::debug!(user_id, murmur_id, liked = !was_liked, like_count, "Like toggled");

        Ok(LikeToggleResult {
            liked: !was_liked,
            like_count,
        })
    }

    // ─── Follows ─────────────────────────────────────────────────

    /// Create a follow edge. Idempotent: following twice leaves one edge.
    pub async fn follow(&self, follower_id: &str, following_id: &str) -> Result<()> {
        if follower_id == following_id {
            return Err(AppError::Validation(
                "Users cannot follow themselves".to_string(),
            ));
        }

        let edge = FollowEdge {
            follower_id: follower_id.to_string(),
            following_id: following_id.to_string(),
            created_at: format_utc_rfc3339(monotonic_now()),
        };
        self.db.set_follow(&edge).await
    }

    /// Remove a follow edge. Idempotent: unfollowing a non-existent edge
    /// is a no-op success.
    pub async fn unfollow(&self, follower_id: &str, following_id: &str) -> Result<()> {
        self.db.delete_follow(follower_id, following_id).await
    }

    /// Flip the follow edge for (user, target).
    ///
    /// Layered on `follow`/`unfollow`, which are individually idempotent,
    /// so the toggle is safe to retry even when the existence check raced.
    pub async fn toggle_follow(&self, user_id: &str, target_id: &str) -> Result<FollowToggleResult> {
        if user_id == target_id {
            return Err(AppError::Validation(
                "Users cannot follow themselves".to_string(),
            ));
        }

        let was_following = self.db.is_following(user_id, target_id).await?;

        if was_following {
            self.unfollow(user_id, target_id).await?;
        } else {
            self.follow(user_id, target_id).await?;
        }

        self.refresh_follow_counters(user_id, target_id).await;

        tracing::debug!(user_id, target_id, following = !was_following, "Follow toggled");

        Ok(FollowToggleResult {
            following: !was_following,
        })
    }

    /// Refresh the advisory follower/following counters on both profiles.
    /// Best-effort: the authoritative numbers always come from edge counts,
    /// so a failed refresh only leaves a stale hint.
    async fn refresh_follow_counters(&self, user_id: &str, target_id: &str) {
        for id in [user_id, target_id] {
            let result = async {
                let Some(mut user) = self.db.get_user(id).await? else {
                    return Ok(());
                };
                user.follower_count = self.db.count_followers(id).await?;
                user.following_count = self.db.count_following(id).await?;
                self.db.upsert_user(&user).await
            }
            .await;

            if let Err(e) = result {
                tracing::warn!(user_id = id, error = %e, "Failed to refresh follow counters");
            }
        }
    }

    // ─── Replies ─────────────────────────────────────────────────

    /// Add a reply to a murmur. Same text rules as murmurs themselves.
    pub async fn add_reply(
        &self,
        author_id: &str,
        murmur_id: &str,
        text: &str,
    ) -> Result<Reply> {
        let text = validate_text(text).map_err(AppError::Validation)?;

        if self.db.get_murmur(murmur_id).await?.is_none() {
            return Err(AppError::NotFound(format!(
                "Murmur {} not found",
                murmur_id
            )));
        }

        let reply = Reply {
            reply_id: uuid::Uuid::new_v4().to_string(),
            author_id: author_id.to_string(),
            text,
            created_at: format_utc_rfc3339(monotonic_now()),
        };
        self.db.set_reply(murmur_id, &reply).await?;

        Ok(reply)
    }
}
