//! Follow feed behavior against the in-memory store.

use chrono::{DateTime, TimeZone, Utc};
use std::sync::Arc;
use timeline_service::domain::{normalize_window, PageWindow, User};
use timeline_service::repository::InMemorySocialStore;
use timeline_service::services::FollowFeedBuilder;

fn at(minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 1, 12, minute, 0).unwrap()
}

struct Graph {
    store: Arc<InMemorySocialStore>,
    alice: User,
    bob: User,
    carol: User,
}

/// Alice follows Bob and Carol. Bob posts at :10 :30 :50, Carol at :20 :40.
async fn seeded_graph() -> Graph {
    let store = Arc::new(InMemorySocialStore::new());
    let alice = store
        .insert_user("Alice", "Smith", "alice@example.com", at(0))
        .await
        .unwrap();
    let bob = store
        .insert_user("Bob", "Jones", "bob@example.com", at(0))
        .await
        .unwrap();
    let carol = store
        .insert_user("Carol", "White", "carol@example.com", at(0))
        .await
        .unwrap();

    store.insert_follow(alice.id, bob.id, at(1)).await.unwrap();
    store.insert_follow(alice.id, carol.id, at(2)).await.unwrap();

    for minute in [10, 30, 50] {
        store
            .insert_post(bob.id, &format!("bob at {}", minute), at(minute))
            .await
            .unwrap();
    }
    for minute in [20, 40] {
        store
            .insert_post(carol.id, &format!("carol at {}", minute), at(minute))
            .await
            .unwrap();
    }

    Graph {
        store,
        alice,
        bob,
        carol,
    }
}

#[tokio::test]
async fn test_first_page_is_newest_across_followed_authors() {
    let graph = seeded_graph().await;
    let builder = FollowFeedBuilder::new(graph.store.clone());

    let page = builder
        .build_feed(graph.alice.id, PageWindow { limit: 3, offset: 0 })
        .await
        .unwrap();

    let contents: Vec<&str> = page.data.iter().map(|p| p.content.as_str()).collect();
    assert_eq!(contents, vec!["bob at 50", "carol at 40", "bob at 30"]);
    assert_eq!(page.data[1].author.id, graph.carol.id);
    assert_eq!(page.pagination.total, 5);
    assert_eq!(page.pagination.limit, 3);
    assert_eq!(page.pagination.offset, 0);
    assert!(page.pagination.has_more);
    assert_eq!(page.pagination.next_offset, Some(3));
}

#[tokio::test]
async fn test_last_page_has_no_next_offset() {
    let graph = seeded_graph().await;
    let builder = FollowFeedBuilder::new(graph.store.clone());

    let page = builder
        .build_feed(graph.alice.id, PageWindow { limit: 3, offset: 3 })
        .await
        .unwrap();

    let contents: Vec<&str> = page.data.iter().map(|p| p.content.as_str()).collect();
    assert_eq!(contents, vec!["carol at 20", "bob at 10"]);
    assert_eq!(page.pagination.total, 5);
    assert!(!page.pagination.has_more);
    assert_eq!(page.pagination.next_offset, None);
}

#[tokio::test]
async fn test_offset_past_end_is_empty_with_full_total() {
    let graph = seeded_graph().await;
    let page = FollowFeedBuilder::new(graph.store.clone())
        .build_feed(graph.alice.id, PageWindow { limit: 10, offset: 50 })
        .await
        .unwrap();

    assert!(page.data.is_empty());
    assert_eq!(page.pagination.total, 5);
    assert!(!page.pagination.has_more);
}

#[tokio::test]
async fn test_walking_pages_visits_every_post_once() {
    let graph = seeded_graph().await;
    let builder = FollowFeedBuilder::new(graph.store.clone());

    let mut seen = Vec::new();
    let mut window = PageWindow { limit: 2, offset: 0 };
    loop {
        let page = builder.build_feed(graph.alice.id, window).await.unwrap();
        assert!(page.data.len() <= window.limit as usize);
        assert_eq!(
            page.pagination.has_more,
            window.offset + (page.data.len() as u64) < page.pagination.total
        );
        seen.extend(page.data.iter().map(|p| p.id));
        match page.pagination.next_offset {
            Some(next) => window.offset = next,
            None => break,
        }
    }

    seen.sort_unstable();
    seen.dedup();
    assert_eq!(seen.len(), 5);
}

#[tokio::test]
async fn test_feed_posts_carry_hashtags_and_like_counts() {
    let graph = seeded_graph().await;
    let tagged = graph
        .store
        .insert_post(graph.bob.id, "tagged", at(59))
        .await
        .unwrap();
    graph.store.tag_post(tagged.id, "rust", at(59)).await.unwrap();
    graph.store.tag_post(tagged.id, "async", at(59)).await.unwrap();
    graph
        .store
        .insert_like(graph.carol.id, tagged.id, at(59))
        .await
        .unwrap();

    let page = FollowFeedBuilder::new(graph.store.clone())
        .build_feed(graph.alice.id, PageWindow { limit: 1, offset: 0 })
        .await
        .unwrap();

    let top = &page.data[0];
    assert_eq!(top.id, tagged.id);
    assert_eq!(top.like_count, 1);
    let tags: Vec<&str> = top.hashtags.iter().map(|h| h.tag.as_str()).collect();
    assert_eq!(tags, vec!["async", "rust"]);
}

#[tokio::test]
async fn test_user_following_nobody_gets_empty_feed() {
    let graph = seeded_graph().await;
    let page = FollowFeedBuilder::new(graph.store.clone())
        .build_feed(graph.bob.id, normalize_window(Some("5"), Some("abc")))
        .await
        .unwrap();

    assert!(page.data.is_empty());
    assert_eq!(page.pagination.total, 0);
    assert_eq!(page.pagination.limit, 5);
    assert_eq!(page.pagination.offset, 0);
    assert!(!page.pagination.has_more);
}

#[tokio::test]
async fn test_repeated_requests_with_equal_timestamps_are_identical() {
    let graph = seeded_graph().await;
    let first = graph
        .store
        .insert_post(graph.carol.id, "carol tie", at(55))
        .await
        .unwrap();
    let second = graph
        .store
        .insert_post(graph.bob.id, "bob tie", at(55))
        .await
        .unwrap();
    let third = graph
        .store
        .insert_post(graph.carol.id, "carol tie again", at(55))
        .await
        .unwrap();
    let builder = FollowFeedBuilder::new(graph.store.clone());

    for window in [
        PageWindow { limit: 2, offset: 0 },
        PageWindow { limit: 2, offset: 1 },
        PageWindow { limit: 10, offset: 0 },
    ] {
        let once = builder.build_feed(graph.alice.id, window).await.unwrap();
        let again = builder.build_feed(graph.alice.id, window).await.unwrap();
        assert_eq!(once, again, "window {:?}", window);
    }

    // Equal timestamps fall back to id, newest id first
    let page = builder
        .build_feed(graph.alice.id, PageWindow { limit: 4, offset: 0 })
        .await
        .unwrap();
    let ids: Vec<i64> = page.data.iter().map(|p| p.id).collect();
    assert_eq!(ids[..3], [third.id, second.id, first.id]);
    assert_eq!(page.data[3].content, "bob at 50");
}
