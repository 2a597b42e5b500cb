// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod engagement;
pub mod feed;

pub use engagement::{EngagementService, FollowToggleResult, LikeToggleResult};
pub use feed::{FeedPage, FeedService, ReplyItem};
