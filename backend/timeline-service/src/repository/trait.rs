use crate::domain::{
    ActivityKind, DateRange, FeedPost, FollowerEntry, OwnedRecords, PageWindow, User,
};
use crate::error::ServiceResult;

/// Read-side interface to the relational store.
///
/// Implemented by `PgSocialStore` (PostgreSQL) and `InMemorySocialStore`.
/// Every ordered query returns rows newest-first on `(created_at, id)`.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait SocialStore: Send + Sync {
    /// Look up a user by id
    async fn find_user_by_id(&self, user_id: i64) -> ServiceResult<Option<User>>;

    /// All `following_id` values for a follower, unpaginated
    async fn find_followed_ids(&self, user_id: i64) -> ServiceResult<Vec<i64>>;

    /// One page of posts written by any of `author_ids`, with author and hashtags
    /// Returns: (posts, total matching posts ignoring the window)
    async fn find_posts_by_authors(
        &self,
        author_ids: &[i64],
        window: PageWindow,
    ) -> ServiceResult<(Vec<FeedPost>, u64)>;

    /// Every row of one activity source owned by `user_id`, optionally limited
    /// to an inclusive `created_at` range. No pagination is applied.
    /// Returns: (rows, count)
    async fn find_owned_records(
        &self,
        kind: ActivityKind,
        user_id: i64,
        range: Option<DateRange>,
    ) -> ServiceResult<(OwnedRecords, u64)>;

    /// One page of the accounts following `user_id`
    /// Returns: (followers, total follower count)
    async fn find_followers(
        &self,
        user_id: i64,
        window: PageWindow,
    ) -> ServiceResult<(Vec<FollowerEntry>, u64)>;

    /// Health check (optional)
    async fn health_check(&self) -> ServiceResult<()> {
        Ok(())
    }
}
