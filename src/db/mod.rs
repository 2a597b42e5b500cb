//! Database layer (Firestore).

pub mod firestore;

pub use firestore::{FeedCursor, FirestoreDb};

/// Collection names as constants.
pub mod collections {
    pub const USERS: &str = "users";
    pub const MURMURS: &str = "murmurs";
    pub const FOLLOWS: &str = "follows";
    /// Subcollection of `murmurs`, keyed by user_id
    pub const LIKES: &str = "likes";
    /// Subcollection of `murmurs`, keyed by reply_id
    pub const REPLIES: &str = "replies";
}
