// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! API routes for authenticated users.

use crate::db::FeedCursor;
use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::murmur::validate_text;
use crate::models::{FeedItem, Murmur, User};
use crate::services::feed::DEFAULT_PAGE_SIZE;
use crate::services::ReplyItem;
use crate::time_utils::{format_utc_rfc3339, monotonic_now};
use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    routing::{get, post},
    Extension, Json, Router,
};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// API routes (require authentication via JWT).
/// The auth middleware is applied in routes/mod.rs for these routes.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/me", get(get_me).put(update_me))
        .route("/api/feed", get(get_feed))
        .route("/api/murmurs", post(create_murmur))
        .route(
            "/api/murmurs/{id}",
            get(get_murmur).delete(delete_murmur),
        )
        .route(
            "/api/murmurs/{id}/replies",
            get(get_replies).post(create_reply),
        )
        .route("/api/murmurs/{id}/like", post(toggle_like))
        .route("/api/users/{id}", get(get_user_profile))
        .route("/api/users/{id}/murmurs", get(get_user_murmurs))
        .route("/api/users/{id}/follow", post(toggle_follow))
}

// ─── Cursor Encoding ─────────────────────────────────────────

// The cursor is a URL-safe base64 token over "<created_at>|<murmur_id>".
// RFC3339 timestamps contain ':' so '|' is the separator; murmur IDs are
// UUIDs and can never contain it.
const CURSOR_SEPARATOR: char = '|';

fn parse_cursor(cursor: Option<&str>) -> Result<Option<FeedCursor>> {
    cursor
        .map(|raw| {
            let invalid_cursor =
                || AppError::Validation("Invalid 'cursor' parameter".to_string());

            let decoded = URL_SAFE_NO_PAD.decode(raw).map_err(|_| invalid_cursor())?;
            let decoded_str = std::str::from_utf8(&decoded).map_err(|_| invalid_cursor())?;

            let (created_at, murmur_id) = decoded_str
                .split_once(CURSOR_SEPARATOR)
                .ok_or_else(invalid_cursor)?;
            if created_at.is_empty() || murmur_id.is_empty() {
                return Err(invalid_cursor());
            }

            Ok(FeedCursor {
                created_at: created_at.to_string(),
                murmur_id: murmur_id.to_string(),
            })
        })
        .transpose()
}

fn encode_cursor(cursor: &FeedCursor) -> String {
    let payload = format!(
        "{}{}{}",
        cursor.created_at, CURSOR_SEPARATOR, cursor.murmur_id
    );
    URL_SAFE_NO_PAD.encode(payload)
}

// ─── User Profile ────────────────────────────────────────────

/// Current user response.
#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct MeResponse {
    pub user_id: String,
    pub display_name: String,
    pub email: Option<String>,
    pub photo_url: Option<String>,
    pub created_at: String,
}

/// Get current user profile.
async fn get_me(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<MeResponse>> {
    let profile = state
        .db
        .get_user(&user.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User {} not found", user.user_id)))?;

    Ok(Json(MeResponse {
        user_id: profile.user_id,
        display_name: profile.display_name,
        email: profile.email,
        photo_url: profile.photo_url,
        created_at: profile.created_at,
    }))
}

#[derive(Deserialize)]
struct UpdateMeRequest {
    display_name: String,
    photo_url: Option<String>,
    email: Option<String>,
}

/// Create or update the current user's profile.
///
/// The identity provider owns sign-up; this endpoint lets a signed-in user
/// set the editable fields (display name, avatar). Counters and creation
/// time are preserved if the profile already exists.
async fn update_me(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(body): Json<UpdateMeRequest>,
) -> Result<Json<MeResponse>> {
    let display_name = body.display_name.trim();
    if display_name.is_empty() {
        return Err(AppError::Validation(
            "Display name must not be empty".to_string(),
        ));
    }

    let existing = state.db.get_user(&user.user_id).await?;

    let profile = match existing {
        Some(mut profile) => {
            profile.display_name = display_name.to_string();
            profile.photo_url = body.photo_url;
            if body.email.is_some() {
                profile.email = body.email;
            }
            profile
        }
        None => User {
            user_id: user.user_id.clone(),
            display_name: display_name.to_string(),
            email: body.email,
            photo_url: body.photo_url,
            follower_count: 0,
            following_count: 0,
            created_at: format_utc_rfc3339(monotonic_now()),
        },
    };

    state.db.upsert_user(&profile).await?;

    Ok(Json(MeResponse {
        user_id: profile.user_id,
        display_name: profile.display_name,
        email: profile.email,
        photo_url: profile.photo_url,
        created_at: profile.created_at,
    }))
}

/// Public profile response, with authoritative edge counts.
#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct UserProfileResponse {
    pub user_id: String,
    pub display_name: String,
    pub photo_url: Option<String>,
    /// Counted server-side over follow edges, not the cached field
    pub follower_count: u32,
    pub following_count: u32,
    /// Whether the requesting user follows this profile
    pub is_following: bool,
    pub created_at: String,
}

/// Get another user's profile with follower/following counts.
async fn get_user_profile(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(profile_id): Path<String>,
) -> Result<Json<UserProfileResponse>> {
    let profile = state
        .db
        .get_user(&profile_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User {} not found", profile_id)))?;

    let (follower_count, following_count, is_following) = tokio::try_join!(
        state.db.count_followers(&profile_id),
        state.db.count_following(&profile_id),
        state.db.is_following(&user.user_id, &profile_id),
    )?;

    Ok(Json(UserProfileResponse {
        user_id: profile.user_id,
        display_name: profile.display_name,
        photo_url: profile.photo_url,
        follower_count,
        following_count,
        is_following,
        created_at: profile.created_at,
    }))
}

// ─── Feed ────────────────────────────────────────────────────

#[derive(Deserialize)]
struct FeedQuery {
    /// Cursor for forward pagination (opaque token).
    cursor: Option<String>,
    /// Pagination: items per page
    #[serde(default = "default_per_page")]
    per_page: u32,
}

fn default_per_page() -> u32 {
    DEFAULT_PAGE_SIZE
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct FeedResponse {
    pub items: Vec<FeedItem>,
    /// Absent on the terminal page
    pub next_cursor: Option<String>,
}

/// Get the reverse-chronological timeline, one page at a time.
async fn get_feed(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Query(params): Query<FeedQuery>,
) -> Result<Json<FeedResponse>> {
    if params.per_page < 1 {
        return Err(AppError::Validation(
            "per_page must be greater than 0".to_string(),
        ));
    }

    let cursor = parse_cursor(params.cursor.as_deref())?;

    tracing::debug!(
        user_id = %user.user_id,
        cursor = ?params.cursor,
        per_page = params.per_page,
        "Fetching feed page"
    );

    let page = state
        .feed_service
        .load_page(&user.user_id, cursor.as_ref(), params.per_page)
        .await?;

    Ok(Json(FeedResponse {
        items: page.items,
        next_cursor: page.next_cursor.as_ref().map(encode_cursor),
    }))
}

// ─── Murmurs ─────────────────────────────────────────────────

#[derive(Deserialize)]
struct CreateMurmurRequest {
    text: String,
}

/// Create a murmur owned by the current user.
async fn create_murmur(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(body): Json<CreateMurmurRequest>,
) -> Result<Json<Murmur>> {
    let text = validate_text(&body.text).map_err(AppError::Validation)?;

    let murmur = Murmur {
        murmur_id: uuid::Uuid::new_v4().to_string(),
        author_id: user.user_id.clone(),
        text,
        created_at: format_utc_rfc3339(monotonic_now()),
        like_count: 0,
    };
    state.db.set_murmur(&murmur).await?;

    tracing::info!(murmur_id = %murmur.murmur_id, author_id = %user.user_id, "Murmur created");

    Ok(Json(murmur))
}

/// Get a single murmur with enrichment.
async fn get_murmur(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(murmur_id): Path<String>,
) -> Result<Json<FeedItem>> {
    let item = state
        .feed_service
        .load_murmur(&user.user_id, &murmur_id)
        .await?;
    Ok(Json(item))
}

/// Response for murmur deletion.
#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct DeleteMurmurResponse {
    pub success: bool,
    /// Murmur plus purged like/reply documents
    pub deleted_documents: usize,
}

/// Delete a murmur owned by the current user.
///
/// Owner-only; a second delete of the same murmur returns `not_found`
/// rather than failing destructively. Like and reply subcollections are
/// purged with it.
async fn delete_murmur(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(murmur_id): Path<String>,
) -> Result<Json<DeleteMurmurResponse>> {
    let murmur = state
        .db
        .get_murmur(&murmur_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Murmur {} not found", murmur_id)))?;

    if murmur.author_id != user.user_id {
        return Err(AppError::Permission(
            "Only the author can delete a murmur".to_string(),
        ));
    }

    let deleted_documents = state.db.delete_murmur_cascade(&murmur_id).await?;
    state.feed_service.invalidate_like_count(&murmur_id);

    tracing::info!(murmur_id = %murmur_id, author_id = %user.user_id, "Murmur deleted");

    Ok(Json(DeleteMurmurResponse {
        success: true,
        deleted_documents,
    }))
}

/// Murmurs by one author, newest first (profile view).
#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct UserMurmursResponse {
    pub murmurs: Vec<Murmur>,
}

async fn get_user_murmurs(
    State(state): State<Arc<AppState>>,
    Path(profile_id): Path<String>,
) -> Result<Json<UserMurmursResponse>> {
    let murmurs = state.db.get_murmurs_by_author(&profile_id).await?;
    Ok(Json(UserMurmursResponse { murmurs }))
}

// ─── Replies ─────────────────────────────────────────────────

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct RepliesResponse {
    pub replies: Vec<ReplyItem>,
}

/// Get a murmur's replies in thread order (oldest first).
async fn get_replies(
    State(state): State<Arc<AppState>>,
    Path(murmur_id): Path<String>,
) -> Result<Json<RepliesResponse>> {
    let replies = state.feed_service.load_replies(&murmur_id).await?;
    Ok(Json(RepliesResponse { replies }))
}

#[derive(Deserialize)]
struct CreateReplyRequest {
    text: String,
}

/// Add a reply to a murmur.
async fn create_reply(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(murmur_id): Path<String>,
    Json(body): Json<CreateReplyRequest>,
) -> Result<Json<crate::models::Reply>> {
    let reply = state
        .engagement_service
        .add_reply(&user.user_id, &murmur_id, &body.text)
        .await?;
    Ok(Json(reply))
}

// ─── Toggles ─────────────────────────────────────────────────

/// Toggle the current user's like on a murmur.
async fn toggle_like(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(murmur_id): Path<String>,
) -> Result<Json<crate::services::LikeToggleResult>> {
    let result = state
        .engagement_service
        .toggle_like(&user.user_id, &murmur_id)
        .await?;
    Ok(Json(result))
}

/// Toggle whether the current user follows the target user.
async fn toggle_follow(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(target_id): Path<String>,
) -> Result<Json<crate::services::FollowToggleResult>> {
    let result = state
        .engagement_service
        .toggle_follow(&user.user_id, &target_id)
        .await?;
    Ok(Json(result))
}
