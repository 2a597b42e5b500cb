// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore client wrapper with typed operations.
//!
//! Provides high-level operations for:
//! - Users (profile storage)
//! - Murmurs (posts, ordered scan for the feed)
//! - Follows (directed edges, keyed by the ordered pair)
//! - Likes and Replies (subcollections of their murmur)

use crate::db::collections;
use crate::error::AppError;
use crate::models::{FollowEdge, LikeEdge, Murmur, Reply, User};
use serde::Deserialize;

// Firestore limits batch/transaction writes to 500 operations.
// We use a safe limit of 400 to allow headroom.
const BATCH_SIZE: usize = 400;

/// Position in the feed's ordered scan: the `(created_at, murmur_id)` of the
/// last item already returned. The next page starts strictly after it, so
/// newer posts inserted at the head never shift pages already fetched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedCursor {
    pub created_at: String,
    pub murmur_id: String,
}

/// Row shape for Firestore count aggregation results.
#[derive(Deserialize)]
struct CountAggregate {
    count: u32,
}

/// Firestore database client.
#[derive(Clone)]
pub struct FirestoreDb {
    client: Option<firestore::FirestoreDb>,
}

impl FirestoreDb {
    /// Create a new Firestore client.
    ///
    /// For local development with emulator, set FIRESTORE_EMULATOR_HOST.
    pub async fn new(project_id: &str) -> Result<Self, AppError> {
        // If the emulator environment variable is set, use unauthenticated connection
        // to avoid local credential warnings and leakage.
        if std::env::var("FIRESTORE_EMULATOR_HOST").is_ok() {
            return Self::create_emulator_client(project_id).await;
        }

        let client = firestore::FirestoreDb::new(project_id)
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect to Firestore: {}", e)))?;

        tracing::info!(project = project_id, "Connected to Firestore");

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a Firestore client for the emulator with unauthenticated access.
    async fn create_emulator_client(project_id: &str) -> Result<Self, AppError> {
        tracing::info!("Using unauthenticated connection for Firestore Emulator");

        let token_source = gcloud_sdk::ExternalJwtFunctionSource::new(|| async {
            Ok(gcloud_sdk::Token {
                token_type: "Bearer".to_string(),
                token: gcloud_sdk::SecretValue::new(
                    "eyJhbGciOiJub25lIn0.eyJ1aWQiOiJ0ZXN0In0."
                        .to_string()
                        .into(),
                ),
                expiry: chrono::Utc::now() + chrono::Duration::hours(1),
            })
        });

        let options = firestore::FirestoreDbOptions::new(project_id.to_string());

        let client = firestore::FirestoreDb::with_options_token_source(
            options,
            gcloud_sdk::GCP_DEFAULT_SCOPES.clone(),
            gcloud_sdk::TokenSourceType::ExternalSource(Box::new(token_source)),
        )
        .await
        .map_err(|e| {
            AppError::Database(format!("Failed to connect to Firestore Emulator: {}", e))
        })?;

        tracing::info!(
            project = project_id,
            "Connected to Firestore (Emulator/Unauthenticated)"
        );

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a mock Firestore client for testing (offline mode).
    ///
    /// All database operations will return an error if called.
    pub fn new_mock() -> Self {
        Self { client: None }
    }

    /// Helper to get the client or return an error if offline.
    fn get_client(&self) -> Result<&firestore::FirestoreDb, AppError> {
        self.client
            .as_ref()
            .ok_or_else(|| AppError::Database("Database not connected (offline mode)".to_string()))
    }

    // ─── User Operations ─────────────────────────────────────────

    /// Get a user profile by ID.
    pub async fn get_user(&self, user_id: &str) -> Result<Option<User>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::USERS)
            .obj()
            .one(user_id)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create or update a user profile.
    pub async fn upsert_user(&self, user: &User) -> Result<(), AppError> {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::USERS)
            .document_id(&user.user_id)
            .object(user)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    // ─── Murmur Operations ───────────────────────────────────────

    /// Get a murmur by ID.
    pub async fn get_murmur(&self, murmur_id: &str) -> Result<Option<Murmur>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::MURMURS)
            .obj()
            .one(murmur_id)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Store a murmur (document ID is the murmur ID).
    pub async fn set_murmur(&self, murmur: &Murmur) -> Result<(), AppError> {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::MURMURS)
            .document_id(&murmur.murmur_id)
            .object(murmur)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Get all murmurs by one author, newest first (profile view).
    pub async fn get_murmurs_by_author(&self, author_id: &str) -> Result<Vec<Murmur>, AppError> {
        let author_id = author_id.to_string();
        self.get_client()?
            .fluent()
            .select()
            .from(collections::MURMURS)
            .filter(move |q| q.for_all([q.field("author_id").eq(author_id.clone())]))
            .order_by([(
                "created_at",
                firestore::FirestoreQueryDirection::Descending,
            )])
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Ordered scan over all murmurs for the feed.
    ///
    /// Total order is `(created_at desc, murmur_id desc)`; the tie-break on
    /// murmur_id keeps pagination stable when two posts share a timestamp.
    /// With a cursor, results resume strictly after that position.
    pub async fn get_murmurs_page(
        &self,
        cursor: Option<&FeedCursor>,
        limit: u32,
    ) -> Result<Vec<Murmur>, AppError> {
        let query = self
            .get_client()?
            .fluent()
            .select()
            .from(collections::MURMURS)
            .order_by([
                (
                    "created_at",
                    firestore::FirestoreQueryDirection::Descending,
                ),
                (
                    "murmur_id",
                    firestore::FirestoreQueryDirection::Descending,
                ),
            ]);

        let query = if let Some(cursor) = cursor {
            query.start_at(firestore::FirestoreQueryCursor::AfterValue(vec![
                cursor.created_at.clone().into(),
                cursor.murmur_id.clone().into(),
            ]))
        } else {
            query
        };

        query
            .limit(limit)
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Delete a murmur and purge its like and reply subcollections.
    ///
    /// The caller is responsible for the ownership check. Subcollection
    /// documents are deleted first so a crash mid-way cannot leave dangling
    /// children reachable through a still-existing parent.
    pub async fn delete_murmur_cascade(&self, murmur_id: &str) -> Result<usize, AppError> {
        let likes = self.list_likes(murmur_id).await?;
        let replies = self.get_replies(murmur_id).await?;

        let mut deleted_count = 0;

        let count = likes.len();
        self.batch_delete_children(murmur_id, collections::LIKES, &likes, |like: &LikeEdge| {
            like.user_id.clone()
        })
        .await?;
        deleted_count += count;
        tracing::debug!(murmur_id, count, "Deleted like edges");

        let count = replies.len();
        self.batch_delete_children(
            murmur_id,
            collections::REPLIES,
            &replies,
            |reply: &Reply| reply.reply_id.clone(),
        )
        .await?;
        deleted_count += count;
        tracing::debug!(murmur_id, count, "Deleted replies");

        self.get_client()?
            .fluent()
            .delete()
            .from(collections::MURMURS)
            .document_id(murmur_id)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        deleted_count += 1;

        tracing::info!(murmur_id, deleted_count, "Murmur deletion complete");

        Ok(deleted_count)
    }

    /// Helper to batch delete subcollection documents using transactions.
    async fn batch_delete_children<T, F>(
        &self,
        murmur_id: &str,
        collection: &str,
        items: &[T],
        id_extractor: F,
    ) -> Result<(), AppError>
    where
        F: Fn(&T) -> String,
    {
        let client = self.get_client()?;
        let parent_path = self
            .get_client()?
            .parent_path(collections::MURMURS, murmur_id)
            .map_err(|e| AppError::Database(e.to_string()))?;

        for chunk in items.chunks(BATCH_SIZE) {
            let mut transaction = client
                .begin_transaction()
                .await
                .map_err(|e| AppError::Database(format!("Failed to begin transaction: {}", e)))?;

            for item in chunk {
                let doc_id = id_extractor(item);
                client
                    .fluent()
                    .delete()
                    .from(collection)
                    .parent(&parent_path)
                    .document_id(&doc_id)
                    .add_to_transaction(&mut transaction)
                    .map_err(|e| {
                        AppError::Database(format!(
                            "Failed to add deletion to transaction for {}: {}",
                            collection, e
                        ))
                    })?;
            }

            transaction.commit().await.map_err(|e| {
                AppError::Database(format!("Failed to commit batch deletion: {}", e))
            })?;
        }

        Ok(())
    }

    // ─── Like Edge Operations ────────────────────────────────────

    /// Get a like edge, if present. Presence is the liked state.
    pub async fn get_like(
        &self,
        murmur_id: &str,
        user_id: &str,
    ) -> Result<Option<LikeEdge>, AppError> {
        let parent_path = self
            .get_client()?
            .parent_path(collections::MURMURS, murmur_id)
            .map_err(|e| AppError::Database(e.to_string()))?;
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::LIKES)
            .parent(&parent_path)
            .obj()
            .one(user_id)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create a like edge. Keyed by user ID, so a concurrent duplicate
    /// create converges to a single edge instead of erroring.
    pub async fn set_like(&self, murmur_id: &str, like: &LikeEdge) -> Result<(), AppError> {
        let parent_path = self
            .get_client()?
            .parent_path(collections::MURMURS, murmur_id)
            .map_err(|e| AppError::Database(e.to_string()))?;
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::LIKES)
            .document_id(&like.user_id)
            .parent(&parent_path)
            .object(like)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Delete a like edge. Deleting an absent edge is a no-op success.
    pub async fn delete_like(&self, murmur_id: &str, user_id: &str) -> Result<(), AppError> {
        let parent_path = self
            .get_client()?
            .parent_path(collections::MURMURS, murmur_id)
            .map_err(|e| AppError::Database(e.to_string()))?;
        self.get_client()?
            .fluent()
            .delete()
            .from(collections::LIKES)
            .parent(&parent_path)
            .document_id(user_id)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Authoritative like count: server-side aggregation over the like
    /// subcollection. The murmur's `like_count` field is only a hint.
    pub async fn count_likes(&self, murmur_id: &str) -> Result<u32, AppError> {
        let parent_path = self
            .get_client()?
            .parent_path(collections::MURMURS, murmur_id)
            .map_err(|e| AppError::Database(e.to_string()))?;
        let rows: Vec<CountAggregate> = self
            .get_client()?
            .fluent()
            .select()
            .from(collections::LIKES)
            .parent(&parent_path)
            .aggregate(|a| a.fields([a.field("count").count()]))
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(rows.first().map(|r| r.count).unwrap_or(0))
    }

    /// List all like edges for a murmur (cascade deletion only).
    async fn list_likes(&self, murmur_id: &str) -> Result<Vec<LikeEdge>, AppError> {
        let parent_path = self
            .get_client()?
            .parent_path(collections::MURMURS, murmur_id)
            .map_err(|e| AppError::Database(e.to_string()))?;
        self.get_client()?
            .fluent()
            .select()
            .from(collections::LIKES)
            .parent(&parent_path)
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    // ─── Follow Edge Operations ──────────────────────────────────

    /// Create a follow edge. The deterministic document ID makes a repeated
    /// follow overwrite the same document: exactly one edge per ordered pair.
    pub async fn set_follow(&self, edge: &FollowEdge) -> Result<(), AppError> {
        let doc_id = FollowEdge::doc_id(&edge.follower_id, &edge.following_id);
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::FOLLOWS)
            .document_id(&doc_id)
            .object(edge)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Delete a follow edge. Deleting an absent edge is a no-op success,
    /// indistinguishable from "already unfollowed".
    pub async fn delete_follow(
        &self,
        follower_id: &str,
        following_id: &str,
    ) -> Result<(), AppError> {
        let doc_id = FollowEdge::doc_id(follower_id, following_id);
        self.get_client()?
            .fluent()
            .delete()
            .from(collections::FOLLOWS)
            .document_id(&doc_id)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// O(1) existence check by composite document ID; never scans edges.
    pub async fn is_following(
        &self,
        follower_id: &str,
        following_id: &str,
    ) -> Result<bool, AppError> {
        let doc_id = FollowEdge::doc_id(follower_id, following_id);
        let edge: Option<FollowEdge> = self
            .get_client()?
            .fluent()
            .select()
            .by_id_in(collections::FOLLOWS)
            .obj()
            .one(&doc_id)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(edge.is_some())
    }

    /// Count followers of a user via server-side aggregation.
    pub async fn count_followers(&self, user_id: &str) -> Result<u32, AppError> {
        self.count_follow_edges("following_id", user_id).await
    }

    /// Count how many users a user follows via server-side aggregation.
    pub async fn count_following(&self, user_id: &str) -> Result<u32, AppError> {
        self.count_follow_edges("follower_id", user_id).await
    }

    async fn count_follow_edges(&self, field: &str, user_id: &str) -> Result<u32, AppError> {
        let field = field.to_string();
        let user_id = user_id.to_string();
        let rows: Vec<CountAggregate> = self
            .get_client()?
            .fluent()
            .select()
            .from(collections::FOLLOWS)
            .filter(move |q| q.for_all([q.field(field.clone()).eq(user_id.clone())]))
            .aggregate(|a| a.fields([a.field("count").count()]))
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(rows.first().map(|r| r.count).unwrap_or(0))
    }

    // ─── Reply Operations ────────────────────────────────────────

    /// Store a reply under its murmur.
    pub async fn set_reply(&self, murmur_id: &str, reply: &Reply) -> Result<(), AppError> {
        let parent_path = self
            .get_client()?
            .parent_path(collections::MURMURS, murmur_id)
            .map_err(|e| AppError::Database(e.to_string()))?;
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::REPLIES)
            .document_id(&reply.reply_id)
            .parent(&parent_path)
            .object(reply)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Get all replies for a murmur, oldest first (thread order).
    pub async fn get_replies(&self, murmur_id: &str) -> Result<Vec<Reply>, AppError> {
        let parent_path = self
            .get_client()?
            .parent_path(collections::MURMURS, murmur_id)
            .map_err(|e| AppError::Database(e.to_string()))?;
        self.get_client()?
            .fluent()
            .select()
            .from(collections::REPLIES)
            .parent(&parent_path)
            .order_by([("created_at", firestore::FirestoreQueryDirection::Ascending)])
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}
