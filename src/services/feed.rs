// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Feed assembly service.
//!
//! Produces the reverse-chronological timeline:
//! 1. Ordered scan over murmurs, resumed from a caller-held cursor
//! 2. Per-item enrichment fan-out (author profile, like count, viewer state)
//! 3. Next-page cursor from the last returned item
//!
//! The service holds no per-caller pagination state; the opaque cursor the
//! caller carries is the only position token, so concurrent callers and a
//! "reload from top" never interfere with each other.

use crate::db::{FeedCursor, FirestoreDb};
use crate::error::{AppError, Result};
use crate::models::{AuthorSummary, FeedItem, Murmur, User};
use dashmap::DashMap;
use futures_util::{stream, StreamExt};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Page size when the caller does not specify one.
pub const DEFAULT_PAGE_SIZE: u32 = 10;
/// Upper bound on requested page size.
pub const MAX_PAGE_SIZE: u32 = 50;

/// Enrichment lookups in flight at once per page.
const ENRICH_CONCURRENCY: usize = 10;

/// How long a cached like count stays fresh. Stale counts within this
/// window are accepted by design; toggles invalidate their entry eagerly.
const LIKE_COUNT_TTL: Duration = Duration::from_secs(5);

/// One page of the timeline.
pub struct FeedPage {
    pub items: Vec<FeedItem>,
    /// Position of the last item; absent on the terminal page.
    pub next_cursor: Option<FeedCursor>,
}

/// A reply enriched with its author profile.
#[derive(Debug, Clone, serde::Serialize)]
#[cfg_attr(feature = "binding-generation", derive(ts_rs::TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct ReplyItem {
    pub reply_id: String,
    pub text: String,
    pub created_at: String,
    pub author: AuthorSummary,
}

/// Assembles paginated, denormalized timeline pages.
#[derive(Clone)]
pub struct FeedService {
    db: FirestoreDb,
    /// Short-TTL in-process cache of authoritative like counts, shared
    /// across request handlers within this instance.
    like_counts: Arc<DashMap<String, (u32, Instant)>>,
}

impl FeedService {
    pub fn new(db: FirestoreDb) -> Self {
        Self {
            db,
            like_counts: Arc::new(DashMap::new()),
        }
    }

    /// Load one timeline page strictly after `cursor` (or from the top).
    ///
    /// Fetches one extra row to decide whether another page exists; the
    /// returned cursor encodes the last item's `(created_at, murmur_id)`,
    /// so head inserts during pagination cannot shift or duplicate items
    /// on later pages. An empty store yields an empty page with no cursor.
    pub async fn load_page(
        &self,
        viewer_id: &str,
        cursor: Option<&FeedCursor>,
        page_size: u32,
    ) -> Result<FeedPage> {
        let limit = page_size.clamp(1, MAX_PAGE_SIZE);
        let fetch_limit = limit.saturating_add(1);

        let mut murmurs = self.db.get_murmurs_page(cursor, fetch_limit).await?;

        let has_more = murmurs.len() > limit as usize;
        if has_more {
            murmurs.truncate(limit as usize);
        }

        let next_cursor = if has_more {
            murmurs.last().map(|m| FeedCursor {
                created_at: m.created_at.clone(),
                murmur_id: m.murmur_id.clone(),
            })
        } else {
            None
        };

        // Independent per-item lookups; bounded fan-out, order preserved.
        let items = stream::iter(murmurs)
            .map(|murmur| self.enrich(viewer_id, murmur))
            .buffered(ENRICH_CONCURRENCY)
            .collect::<Vec<FeedItem>>()
            .await;

        Ok(FeedPage { items, next_cursor })
    }

    /// Load a single murmur with full enrichment.
    pub async fn load_murmur(&self, viewer_id: &str, murmur_id: &str) -> Result<FeedItem> {
        let murmur = self
            .db
            .get_murmur(murmur_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Murmur {} not found", murmur_id)))?;
        Ok(self.enrich(viewer_id, murmur).await)
    }

    /// Load a murmur's replies, oldest first, with author enrichment.
    pub async fn load_replies(&self, murmur_id: &str) -> Result<Vec<ReplyItem>> {
        if self.db.get_murmur(murmur_id).await?.is_none() {
            return Err(AppError::NotFound(format!(
                "Murmur {} not found",
                murmur_id
            )));
        }

        let replies = self.db.get_replies(murmur_id).await?;

        let items = stream::iter(replies)
            .map(|reply| async move {
                let author = self.author_or_placeholder(&reply.author_id).await;
                ReplyItem {
                    reply_id: reply.reply_id,
                    text: reply.text,
                    created_at: reply.created_at,
                    author: AuthorSummary {
                        user_id: author.user_id,
                        display_name: author.display_name,
                        photo_url: author.photo_url,
                    },
                }
            })
            .buffered(ENRICH_CONCURRENCY)
            .collect::<Vec<ReplyItem>>()
            .await;

        Ok(items)
    }

    /// Authoritative like count with a short-TTL cache in front.
    pub async fn like_count(&self, murmur_id: &str) -> Result<u32> {
        if let Some(entry) = self.like_counts.get(murmur_id) {
            let (count, cached_at) = *entry;
            if cached_at.elapsed() < LIKE_COUNT_TTL {
                return Ok(count);
            }
        }

        let count = self.db.count_likes(murmur_id).await?;
        self.like_counts
            .insert(murmur_id.to_string(), (count, Instant::now()));
        Ok(count)
    }

    /// Drop the cached count after a toggle so the next read recounts.
    pub fn invalidate_like_count(&self, murmur_id: &str) {
        self.like_counts.remove(murmur_id);
    }

    /// Enrich one murmur. Never fails: a lost profile degrades to the
    /// "Anonymous" placeholder and a failed count falls back to the
    /// murmur's advisory `like_count` field.
    async fn enrich(&self, viewer_id: &str, murmur: Murmur) -> FeedItem {
        let author = self.author_or_placeholder(&murmur.author_id).await;

        let like_count = match self.like_count(&murmur.murmur_id).await {
            Ok(count) => count,
            Err(e) => {
                tracing::warn!(
                    murmur_id = %murmur.murmur_id,
                    error = %e,
                    "Like count lookup failed, using cached field"
                );
                murmur.like_count
            }
        };

        let liked_by_me = match self.db.get_like(&murmur.murmur_id, viewer_id).await {
            Ok(edge) => edge.is_some(),
            Err(e) => {
                tracing::warn!(
                    murmur_id = %murmur.murmur_id,
                    error = %e,
                    "Viewer like lookup failed"
                );
                false
            }
        };

        FeedItem {
            murmur_id: murmur.murmur_id,
            text: murmur.text,
            created_at: murmur.created_at,
            author: AuthorSummary {
                user_id: author.user_id,
                display_name: author.display_name,
                photo_url: author.photo_url,
            },
            like_count,
            liked_by_me,
        }
    }

    async fn author_or_placeholder(&self, author_id: &str) -> User {
        match self.db.get_user(author_id).await {
            Ok(Some(user)) => user,
            Ok(None) => User::placeholder(author_id),
            Err(e) => {
                tracing::warn!(author_id, error = %e, "Author lookup failed");
                User::placeholder(author_id)
            }
        }
    }
}
