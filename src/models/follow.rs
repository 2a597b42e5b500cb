// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Follow edge model.

use serde::{Deserialize, Serialize};

/// Directed follow edge, stored in `follows/{follower_id}_{following_id}`.
///
/// The document ID is deterministic for the ordered pair, so at most one
/// edge can exist per pair and create/delete are idempotent by key. The
/// edge's existence IS the follow relationship.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FollowEdge {
    pub follower_id: String,
    pub following_id: String,
    pub created_at: String,
}

impl FollowEdge {
    /// Deterministic document ID for the ordered pair.
    pub fn doc_id(follower_id: &str, following_id: &str) -> String {
        format!("{}_{}", follower_id, following_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_doc_id_is_ordered() {
        // (a,b) and (b,a) are distinct edges
        assert_ne!(FollowEdge::doc_id("a", "b"), FollowEdge::doc_id("b", "a"));
        assert_eq!(FollowEdge::doc_id("a", "b"), "a_b");
    }
}
