use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tracing::info;

use super::{ensure_user_exists, record_outcome};
use crate::domain::{FollowerEntry, OffsetPagination, PageWindow};
use crate::error::ServiceResult;
use crate::repository::SocialStore;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FollowersPage {
    pub followers: Vec<FollowerEntry>,
    pub pagination: OffsetPagination,
}

/// Lists the accounts following a user, most recent follow first
#[derive(Clone)]
pub struct FollowerListBuilder {
    store: Arc<dyn SocialStore>,
}

impl FollowerListBuilder {
    pub fn new(store: Arc<dyn SocialStore>) -> Self {
        Self { store }
    }

    #[tracing::instrument(skip(self))]
    pub async fn list_followers(
        &self,
        user_id: i64,
        window: PageWindow,
    ) -> ServiceResult<FollowersPage> {
        let started = Instant::now();
        let result = self.build(user_id, window).await;
        record_outcome("followers", &result, started);
        result
    }

    async fn build(&self, user_id: i64, window: PageWindow) -> ServiceResult<FollowersPage> {
        ensure_user_exists(self.store.as_ref(), user_id).await?;

        let (followers, total) = self.store.find_followers(user_id, window).await?;
        let pagination = OffsetPagination::new(window, followers.len(), total);

        info!(
            user_id,
            returned = followers.len(),
            total,
            "Followers listed"
        );

        Ok(FollowersPage {
            followers,
            pagination,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ServiceError;
    use crate::repository::InMemorySocialStore;
    use chrono::{DateTime, TimeZone, Utc};

    fn ts(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    #[tokio::test]
    async fn test_followers_newest_follow_first() {
        let store = Arc::new(InMemorySocialStore::new());
        let target = store.insert_user("T", "Arget", "t@example.com", ts(0)).await.unwrap();
        let early = store.insert_user("E", "Arly", "e@example.com", ts(0)).await.unwrap();
        let late = store.insert_user("L", "Ate", "l@example.com", ts(0)).await.unwrap();
        store.insert_follow(early.id, target.id, ts(10)).await.unwrap();
        store.insert_follow(late.id, target.id, ts(20)).await.unwrap();

        let page = FollowerListBuilder::new(store)
            .list_followers(target.id, PageWindow { limit: 1, offset: 0 })
            .await
            .unwrap();

        assert_eq!(page.followers.len(), 1);
        assert_eq!(page.followers[0].id, late.id);
        assert_eq!(page.followers[0].followed_at, ts(20));
        assert_eq!(page.pagination.total, 2);
        assert!(page.pagination.has_more);
        assert_eq!(page.pagination.next_offset, Some(1));
    }

    #[tokio::test]
    async fn test_followers_of_unknown_user() {
        let err = FollowerListBuilder::new(Arc::new(InMemorySocialStore::new()))
            .list_followers(5, PageWindow::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
    }
}
