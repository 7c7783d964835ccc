pub mod activity;
pub mod feed;
pub mod followers;

pub use activity::get_activity;
pub use feed::get_feed;
pub use followers::get_followers;

use actix_web::{web, HttpResponse};
use serde_json::json;
use std::sync::Arc;
use tracing::warn;

use crate::error::{ServiceError, ServiceResult};
use crate::metrics;
use crate::middleware::CallerIdentity;
use crate::repository::SocialStore;
use crate::services::{
    ActivityTimelineBuilder, FollowFeedBuilder, FollowerListBuilder, MergeStrategy,
};

/// Shared handler state. Every builder holds the same store.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn SocialStore>,
    pub feed: FollowFeedBuilder,
    pub timeline: ActivityTimelineBuilder,
    pub followers: FollowerListBuilder,
}

impl AppState {
    pub fn new(store: Arc<dyn SocialStore>, strategy: Arc<dyn MergeStrategy>) -> Self {
        Self {
            feed: FollowFeedBuilder::new(store.clone()),
            timeline: ActivityTimelineBuilder::with_strategy(store.clone(), strategy),
            followers: FollowerListBuilder::new(store.clone()),
            store,
        }
    }
}

/// Registers every route. Probes stay outside the caller-identity scope.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health))
        .route("/ready", web::get().to(ready))
        .route("/metrics", web::get().to(serve_metrics))
        .service(
            web::scope("/api/v1")
                .wrap(CallerIdentity)
                .route("/feed", web::get().to(get_feed))
                .route("/users/{user_id}/activity", web::get().to(get_activity))
                .route("/users/{user_id}/followers", web::get().to(get_followers)),
        );
}

async fn health() -> HttpResponse {
    HttpResponse::Ok().json(json!({ "status": "ok" }))
}

async fn ready(state: web::Data<AppState>) -> HttpResponse {
    match state.store.health_check().await {
        Ok(()) => HttpResponse::Ok().json(json!({ "status": "ready" })),
        Err(e) => {
            warn!(error = %e, "Readiness check failed");
            HttpResponse::ServiceUnavailable().json(json!({
                "status": "unavailable",
                "error": e.to_string(),
            }))
        }
    }
}

async fn serve_metrics() -> ServiceResult<HttpResponse> {
    let (content_type, body) =
        metrics::render().map_err(|e| ServiceError::Internal(e.to_string()))?;
    Ok(HttpResponse::Ok().content_type(content_type).body(body))
}
