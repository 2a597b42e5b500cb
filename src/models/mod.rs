// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Data models for the application.

pub mod feed;
pub mod follow;
pub mod murmur;
pub mod user;

pub use feed::{AuthorSummary, FeedItem};
pub use follow::FollowEdge;
pub use murmur::{LikeEdge, Murmur, Reply};
pub use user::User;
