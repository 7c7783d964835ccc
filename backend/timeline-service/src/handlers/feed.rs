use actix_web::{web, HttpResponse};
use serde::Deserialize;
use tracing::debug;

use super::AppState;
use crate::domain::normalize_window;
use crate::error::ServiceResult;
use crate::middleware::UserId;

/// Raw offset-paging parameters. Kept as strings so malformed values fall
/// back to defaults instead of failing extraction.
#[derive(Debug, Default, Deserialize)]
pub struct WindowParams {
    pub limit: Option<String>,
    pub offset: Option<String>,
}

pub async fn get_feed(
    user: UserId,
    query: web::Query<WindowParams>,
    state: web::Data<AppState>,
) -> ServiceResult<HttpResponse> {
    let window = normalize_window(query.limit.as_deref(), query.offset.as_deref());
    debug!(
        "Feed request: user={} limit={} offset={}",
        user.0, window.limit, window.offset
    );

    let page = state.feed.build_feed(user.0, window).await?;
    Ok(HttpResponse::Ok().json(page))
}
