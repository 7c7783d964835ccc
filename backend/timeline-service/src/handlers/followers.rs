use actix_web::{web, HttpResponse};

use super::feed::WindowParams;
use super::AppState;
use crate::domain::normalize_window;
use crate::error::ServiceResult;
use crate::middleware::UserId;

pub async fn get_followers(
    _caller: UserId,
    path: web::Path<i64>,
    query: web::Query<WindowParams>,
    state: web::Data<AppState>,
) -> ServiceResult<HttpResponse> {
    let user_id = path.into_inner();
    let window = normalize_window(query.limit.as_deref(), query.offset.as_deref());

    let page = state.followers.list_followers(user_id, window).await?;
    Ok(HttpResponse::Ok().json(page))
}
