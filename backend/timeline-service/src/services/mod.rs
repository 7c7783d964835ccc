pub mod activity;
pub mod feed;
pub mod followers;
pub mod merge;

pub use activity::{ActivityTimeline, ActivityTimelineBuilder, TimelineQuery};
pub use feed::{FeedPage, FollowFeedBuilder};
pub use followers::{FollowerListBuilder, FollowersPage};
pub use merge::{KWayMerge, MaterializeAll, MergeStrategy, MergeStrategyKind};

use std::time::Instant;

use crate::domain::User;
use crate::error::{ServiceError, ServiceResult};
use crate::metrics;
use crate::repository::SocialStore;

/// Fails with `NotFound` before any source is queried for a missing user
pub(crate) async fn ensure_user_exists(
    store: &dyn SocialStore,
    user_id: i64,
) -> ServiceResult<User> {
    store
        .find_user_by_id(user_id)
        .await?
        .ok_or_else(|| ServiceError::user_not_found(user_id))
}

pub(crate) fn record_outcome<T>(operation: &str, result: &ServiceResult<T>, started: Instant) {
    let status = match result {
        Ok(_) => "success",
        Err(err) => err.kind(),
    };
    metrics::record_build(operation, status, started.elapsed());
}
