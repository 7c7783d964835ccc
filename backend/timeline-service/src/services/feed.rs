use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

use super::{ensure_user_exists, record_outcome};
use crate::domain::{FeedPost, FollowedSet, OffsetPagination, PageWindow};
use crate::error::ServiceResult;
use crate::repository::SocialStore;

/// One page of a user's follow feed
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeedPage {
    pub data: Vec<FeedPost>,
    pub pagination: OffsetPagination,
}

/// Builds the personalized timeline: posts by every account the user follows,
/// newest first, paginated by the store.
#[derive(Clone)]
pub struct FollowFeedBuilder {
    store: Arc<dyn SocialStore>,
}

impl FollowFeedBuilder {
    pub fn new(store: Arc<dyn SocialStore>) -> Self {
        Self { store }
    }

    #[tracing::instrument(skip(self))]
    pub async fn build_feed(&self, user_id: i64, window: PageWindow) -> ServiceResult<FeedPage> {
        let started = Instant::now();
        let result = self.build(user_id, window).await;
        record_outcome("feed", &result, started);
        result
    }

    async fn build(&self, user_id: i64, window: PageWindow) -> ServiceResult<FeedPage> {
        ensure_user_exists(self.store.as_ref(), user_id).await?;

        let followed: FollowedSet = self
            .store
            .find_followed_ids(user_id)
            .await?
            .into_iter()
            .collect();

        if followed.is_empty() {
            debug!(user_id, "User follows no one, returning empty feed");
            return Ok(FeedPage {
                data: Vec::new(),
                pagination: OffsetPagination::empty(window),
            });
        }

        let (posts, total) = self
            .store
            .find_posts_by_authors(&followed.to_vec(), window)
            .await?;
        let pagination = OffsetPagination::new(window, posts.len(), total);

        info!(
            user_id,
            followed = followed.len(),
            posts = posts.len(),
            total,
            has_more = pagination.has_more,
            "Feed generated"
        );

        Ok(FeedPage {
            data: posts,
            pagination,
        })
    }
}
