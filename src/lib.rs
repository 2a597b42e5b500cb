// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Murmur-Feed: backend for a short-form social feed
//!
//! This crate provides the data model and access layer behind murmurs
//! (short posts), likes, replies, follow edges, and the paginated
//! timeline assembled from them.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod time_utils;

use config::Config;
use db::FirestoreDb;
use services::{EngagementService, FeedService};

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub db: FirestoreDb,
    pub feed_service: FeedService,
    pub engagement_service: EngagementService,
}
