// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Feed pagination integration tests against the Firestore emulator.
//!
//! The feed collection is shared across concurrently-running tests, so
//! assertions are scoped to the murmurs each test creates: every created
//! murmur must be visited exactly once, in descending (created_at, id)
//! order, regardless of page size or concurrent inserts at the head.

use murmur_feed::models::{FeedItem, Murmur};
use murmur_feed::services::FeedService;
use murmur_feed::time_utils::{format_utc_rfc3339, monotonic_now};
use std::collections::HashSet;

mod common;
use common::{test_db, test_user, unique_user_id};

fn murmur(author_id: &str, text: &str) -> Murmur {
    Murmur {
        murmur_id: uuid::Uuid::new_v4().to_string(),
        author_id: author_id.to_string(),
        text: text.to_string(),
        created_at: format_utc_rfc3339(monotonic_now()),
        like_count: 0,
    }
}

/// Walk the whole feed from the top, returning every item in order.
async fn collect_all_pages(feed: &FeedService, viewer: &str, page_size: u32) -> Vec<FeedItem> {
    let mut items = Vec::new();
    let mut cursor = None;
    loop {
        let page = feed.load_page(viewer, cursor.as_ref(), page_size).await.unwrap();
        items.extend(page.items);
        match page.next_cursor {
            Some(next) => cursor = Some(next),
            None => return items,
        }
    }
}

#[tokio::test]
async fn test_pagination_visits_each_murmur_exactly_once() {
    require_emulator!();

    let db = test_db().await;
    let feed = FeedService::new(db.clone());
    let author = unique_user_id("author");

    let mut created = Vec::new();
    for i in 0..25 {
        let m = murmur(&author, &format!("post {}", i));
        db.set_murmur(&m).await.unwrap();
        created.push(m.murmur_id.clone());
    }
    let created_set: HashSet<_> = created.iter().cloned().collect();

    for page_size in [1u32, 7, 10, 50] {
        let all = collect_all_pages(&feed, &author, page_size).await;

        // Global order is strictly descending (created_at, id)
        for window in all.windows(2) {
            let a = (&window[0].created_at, &window[0].murmur_id);
            let b = (&window[1].created_at, &window[1].murmur_id);
            assert!(a > b, "feed must be strictly descending");
        }

        // Our murmurs each appear exactly once
        let mine: Vec<_> = all
            .iter()
            .filter(|item| created_set.contains(&item.murmur_id))
            .collect();
        assert_eq!(
            mine.len(),
            created.len(),
            "page size {}: every murmur visited exactly once",
            page_size
        );

        // And in reverse creation order
        let mine_ids: Vec<_> = mine.iter().map(|i| i.murmur_id.clone()).collect();
        let mut expected = created.clone();
        expected.reverse();
        assert_eq!(mine_ids, expected, "page size {}", page_size);
    }

    println!("✓ Pagination complete and duplicate-free for all page sizes");
}

#[tokio::test]
async fn test_head_insert_does_not_shift_later_pages() {
    require_emulator!();

    let db = test_db().await;
    let feed = FeedService::new(db.clone());
    let author = unique_user_id("author");

    for i in 0..8 {
        db.set_murmur(&murmur(&author, &format!("stable {}", i)))
            .await
            .unwrap();
    }

    // Fetch page 1, keep its cursor
    let page1 = feed.load_page(&author, None, 5).await.unwrap();
    assert_eq!(page1.items.len(), 5);
    let cursor = page1.next_cursor.clone().expect("more pages expected");
    let page1_ids: HashSet<_> = page1.items.iter().map(|i| i.murmur_id.clone()).collect();

    // A new murmur lands at the head mid-pagination
    let head_insert = murmur(&author, "breaking news");
    db.set_murmur(&head_insert).await.unwrap();

    // Page 2 resumes strictly after the cursor: no new post, no repeats
    let page2 = feed.load_page(&author, Some(&cursor), 5).await.unwrap();
    for item in &page2.items {
        assert_ne!(item.murmur_id, head_insert.murmur_id);
        assert!(!page1_ids.contains(&item.murmur_id));
        assert!(item.created_at < cursor.created_at
            || (item.created_at == cursor.created_at && item.murmur_id < cursor.murmur_id));
    }

    // A fresh load from the top does see the new post first
    let reloaded = feed.load_page(&author, None, 5).await.unwrap();
    assert_eq!(reloaded.items[0].murmur_id, head_insert.murmur_id);
}

#[tokio::test]
async fn test_terminal_page_has_no_cursor() {
    require_emulator!();

    let db = test_db().await;
    let feed = FeedService::new(db.clone());
    let viewer = unique_user_id("viewer");

    // A page larger than the whole store must be terminal
    let page = feed.load_page(&viewer, None, 50).await.unwrap();
    if page.items.len() < 50 {
        assert!(page.next_cursor.is_none());
    }
}

#[tokio::test]
async fn test_enrichment_joins_author_and_like_state() {
    require_emulator!();

    let db = test_db().await;
    let feed = FeedService::new(db.clone());
    let author = unique_user_id("author");
    let viewer = unique_user_id("viewer");

    db.upsert_user(&test_user(&author, "Casey")).await.unwrap();

    let post = murmur(&author, "enrich me");
    db.set_murmur(&post).await.unwrap();

    let engagement =
        murmur_feed::services::EngagementService::new(db.clone(), feed.clone());
    engagement.toggle_like(&viewer, &post.murmur_id).await.unwrap();

    let item = feed.load_murmur(&viewer, &post.murmur_id).await.unwrap();
    assert_eq!(item.author.display_name, "Casey");
    assert_eq!(item.like_count, 1);
    assert!(item.liked_by_me);

    // A different viewer sees the count but not a liked state
    let other = unique_user_id("other");
    let item = feed.load_murmur(&other, &post.murmur_id).await.unwrap();
    assert_eq!(item.like_count, 1);
    assert!(!item.liked_by_me);
}

#[tokio::test]
async fn test_missing_author_becomes_anonymous_placeholder() {
    require_emulator!();

    let db = test_db().await;
    let feed = FeedService::new(db.clone());
    let ghost = unique_user_id("ghost");

    let post = murmur(&ghost, "from nowhere");
    db.set_murmur(&post).await.unwrap();

    let item = feed.load_murmur(&ghost, &post.murmur_id).await.unwrap();
    assert_eq!(item.author.display_name, "Anonymous");
    assert_eq!(item.author.user_id, ghost);
}

#[tokio::test]
async fn test_author_listing_is_newest_first() {
    require_emulator!();

    let db = test_db().await;
    let author = unique_user_id("author");

    for i in 0..5 {
        db.set_murmur(&murmur(&author, &format!("mine {}", i)))
            .await
            .unwrap();
    }

    let murmurs = db.get_murmurs_by_author(&author).await.unwrap();
    assert_eq!(murmurs.len(), 5);
    assert_eq!(murmurs[0].text, "mine 4");
    assert_eq!(murmurs[4].text, "mine 0");
    assert!(murmurs.iter().all(|m| m.author_id == author));
}
