use futures::future::try_join_all;
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

use super::merge::{MaterializeAll, MergeStrategy};
use super::{ensure_user_exists, record_outcome};
use crate::domain::{ActivityKindSet, ActivityRecord, DateRange, PagePagination, PageRequest};
use crate::error::ServiceResult;
use crate::metrics;
use crate::repository::SocialStore;

/// Filters and page for one timeline request
#[derive(Debug, Clone, Default)]
pub struct TimelineQuery {
    pub kinds: ActivityKindSet,
    pub range: Option<DateRange>,
    pub page: PageRequest,
}

/// One page of a user's merged activity
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActivityTimeline {
    pub activities: Vec<ActivityRecord>,
    pub pagination: PagePagination,
}

/// Builds a user's activity timeline from their posts, likes and follows.
///
/// Each requested source is loaded in full (concurrently), the sources are
/// merged newest-first and only then paged. `total` is the sum of the
/// per-source counts reported by the store.
#[derive(Clone)]
pub struct ActivityTimelineBuilder {
    store: Arc<dyn SocialStore>,
    strategy: Arc<dyn MergeStrategy>,
}

impl ActivityTimelineBuilder {
    pub fn new(store: Arc<dyn SocialStore>) -> Self {
        Self::with_strategy(store, Arc::new(MaterializeAll))
    }

    pub fn with_strategy(store: Arc<dyn SocialStore>, strategy: Arc<dyn MergeStrategy>) -> Self {
        Self { store, strategy }
    }

    pub fn strategy_name(&self) -> &'static str {
        self.strategy.name()
    }

    #[tracing::instrument(skip(self, query), fields(kinds = ?query.kinds, page = query.page.page))]
    pub async fn build_timeline(
        &self,
        user_id: i64,
        query: &TimelineQuery,
    ) -> ServiceResult<ActivityTimeline> {
        let started = Instant::now();
        let result = self.build(user_id, query).await;
        record_outcome("activity_timeline", &result, started);
        result
    }

    async fn build(&self, user_id: i64, query: &TimelineQuery) -> ServiceResult<ActivityTimeline> {
        ensure_user_exists(self.store.as_ref(), user_id).await?;

        let fetches = query
            .kinds
            .iter()
            .map(|kind| self.store.find_owned_records(kind, user_id, query.range));
        let results = try_join_all(fetches).await?;

        let mut total: u64 = 0;
        let mut rows_loaded: usize = 0;
        let mut sources = Vec::with_capacity(results.len());
        for (records, count) in results {
            debug!(
                kind = records.kind().as_str(),
                rows = records.len(),
                count,
                "Loaded activity source"
            );
            total = total.saturating_add(count);
            rows_loaded += records.len();
            sources.push(records.into_activities());
        }
        metrics::record_activity_rows(rows_loaded);

        let offset = usize::try_from(query.page.offset()).unwrap_or(usize::MAX);
        let limit = query.page.limit as usize;
        let activities = self.strategy.merge_page(sources, offset, limit);
        let pagination = PagePagination::new(query.page, total);

        debug!(
            user_id,
            rows_loaded,
            strategy = self.strategy.name(),
            "Merged activity sources"
        );
        info!(
            user_id,
            total,
            returned = activities.len(),
            total_pages = pagination.total_pages,
            "Activity timeline generated"
        );

        Ok(ActivityTimeline {
            activities,
            pagination,
        })
    }
}
