use actix_web::{web, HttpResponse};
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use tracing::debug;

use super::AppState;
use crate::domain::{normalize_page, ActivityKindSet, DateRange};
use crate::error::{ServiceError, ServiceResult};
use crate::middleware::UserId;
use crate::services::TimelineQuery;

/// Timeline query parameters. `types` may be repeated, so the query string is
/// read as raw pairs rather than a struct.
#[derive(Debug, Default)]
struct ActivityParams {
    page: Option<String>,
    limit: Option<String>,
    types: Vec<String>,
    start_date: Option<String>,
    end_date: Option<String>,
}

impl ActivityParams {
    fn from_pairs(pairs: Vec<(String, String)>) -> Self {
        let mut params = Self::default();
        for (key, value) in pairs {
            match key.as_str() {
                "page" => {
                    params.page.get_or_insert(value);
                }
                "limit" => {
                    params.limit.get_or_insert(value);
                }
                "types" | "types[]" => params.types.push(value),
                "startDate" => {
                    params.start_date.get_or_insert(value);
                }
                "endDate" => {
                    params.end_date.get_or_insert(value);
                }
                _ => {}
            }
        }
        params
    }

    fn into_query(self) -> ServiceResult<TimelineQuery> {
        let kinds = if self.types.is_empty() {
            ActivityKindSet::all()
        } else {
            ActivityKindSet::from_params(&self.types)
        };

        let start = non_empty(self.start_date);
        let end = non_empty(self.end_date);
        let range = match (start, end) {
            (Some(start), Some(end)) => Some(DateRange::new(
                parse_date_bound("startDate", &start)?,
                parse_date_bound("endDate", &end)?,
            )),
            _ => None,
        };

        Ok(TimelineQuery {
            kinds,
            range,
            page: normalize_page(self.page.as_deref(), self.limit.as_deref()),
        })
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Accepts RFC 3339 timestamps or bare `YYYY-MM-DD` dates (midnight UTC).
fn parse_date_bound(name: &str, raw: &str) -> ServiceResult<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Ok(ts.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| Utc.from_utc_datetime(&naive))
        .ok_or_else(|| ServiceError::InvalidInput(format!("{} is not a valid date: {}", name, raw)))
}

pub async fn get_activity(
    _caller: UserId,
    path: web::Path<i64>,
    query: web::Query<Vec<(String, String)>>,
    state: web::Data<AppState>,
) -> ServiceResult<HttpResponse> {
    let user_id = path.into_inner();
    let timeline_query = ActivityParams::from_pairs(query.into_inner()).into_query()?;
    debug!(
        user_id,
        kinds = ?timeline_query.kinds,
        page = timeline_query.page.page,
        limit = timeline_query.page.limit,
        "Activity request"
    );

    let timeline = state.timeline.build_timeline(user_id, &timeline_query).await?;
    Ok(HttpResponse::Ok().json(timeline))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ActivityKind;

    fn pairs(raw: &[(&str, &str)]) -> Vec<(String, String)> {
        raw.iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_defaults() {
        let query = ActivityParams::from_pairs(vec![]).into_query().unwrap();
        assert_eq!(query.kinds, ActivityKindSet::all());
        assert!(query.range.is_none());
        assert_eq!(query.page.page, 1);
        assert_eq!(query.page.limit, 10);
    }

    #[test]
    fn test_repeated_and_single_types() {
        let query = ActivityParams::from_pairs(pairs(&[("types", "like"), ("types", "post")]))
            .into_query()
            .unwrap();
        assert_eq!(
            query.kinds.iter().collect::<Vec<_>>(),
            vec![ActivityKind::Post, ActivityKind::Like]
        );

        let query = ActivityParams::from_pairs(pairs(&[("types", "follow")]))
            .into_query()
            .unwrap();
        assert_eq!(query.kinds.len(), 1);
        assert!(query.kinds.contains(ActivityKind::Follow));
    }

    #[test]
    fn test_unknown_types_give_empty_set() {
        let query = ActivityParams::from_pairs(pairs(&[("types", "comment")]))
            .into_query()
            .unwrap();
        assert!(query.kinds.is_empty());
    }

    #[test]
    fn test_range_needs_both_bounds() {
        let query = ActivityParams::from_pairs(pairs(&[("startDate", "2024-01-01")]))
            .into_query()
            .unwrap();
        assert!(query.range.is_none());

        let query = ActivityParams::from_pairs(pairs(&[
            ("startDate", "2024-01-01"),
            ("endDate", "2024-01-31T12:30:00Z"),
        ]))
        .into_query()
        .unwrap();
        let range = query.range.unwrap();
        assert_eq!(range.start, Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap());
        assert_eq!(range.end, Utc.with_ymd_and_hms(2024, 1, 31, 12, 30, 0).unwrap());
    }

    #[test]
    fn test_invalid_date_is_rejected() {
        let err = ActivityParams::from_pairs(pairs(&[
            ("startDate", "yesterday"),
            ("endDate", "2024-01-31"),
        ]))
        .into_query()
        .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidInput(_)));
    }

    #[test]
    fn test_permissive_paging() {
        let query = ActivityParams::from_pairs(pairs(&[("page", "abc"), ("limit", "-4")]))
            .into_query()
            .unwrap();
        assert_eq!(query.page.page, 1);
        assert_eq!(query.page.limit, 10);
    }
}
