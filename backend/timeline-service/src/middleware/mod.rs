/// HTTP middleware for timeline-service
///
/// Identity is asserted by the edge in front of this service: the caller's id
/// arrives in the `userId` header (or `x-user-id`) and is trusted as-is.
use actix_web::dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::{Error, FromRequest, HttpMessage, HttpRequest};
use futures::future::LocalBoxFuture;
use std::future::{ready, Ready};
use std::rc::Rc;

use crate::error::ServiceError;

const USER_ID_HEADERS: [&str; 2] = ["userid", "x-user-id"];

/// Caller identifier stored in request extensions by `CallerIdentity`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UserId(pub i64);

fn caller_id(req: &ServiceRequest) -> Result<i64, ServiceError> {
    let raw = USER_ID_HEADERS
        .iter()
        .find_map(|name| req.headers().get(*name))
        .ok_or_else(|| ServiceError::Unauthorized("Missing userId header".into()))?;

    raw.to_str()
        .ok()
        .and_then(|v| v.trim().parse::<i64>().ok())
        .filter(|id| *id > 0)
        .ok_or_else(|| ServiceError::Unauthorized("Invalid userId header".into()))
}

/// Actix middleware that resolves the caller id from request headers.
pub struct CallerIdentity;

impl<S, B> Transform<S, ServiceRequest> for CallerIdentity
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = CallerIdentityService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(CallerIdentityService {
            service: Rc::new(service),
        }))
    }
}

pub struct CallerIdentityService<S> {
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for CallerIdentityService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = self.service.clone();

        Box::pin(async move {
            let user_id = match caller_id(&req) {
                Ok(id) => id,
                Err(err) => {
                    tracing::debug!(path = %req.path(), "Rejected request without caller id");
                    return Err(err.into());
                }
            };

            req.extensions_mut().insert(UserId(user_id));

            service.call(req).await
        })
    }
}

impl FromRequest for UserId {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut actix_web::dev::Payload) -> Self::Future {
        ready(
            req.extensions()
                .get::<UserId>()
                .copied()
                .ok_or_else(|| ServiceError::Unauthorized("User ID missing".into()).into()),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::http::StatusCode;
    use actix_web::{test, web, App, HttpResponse};

    async fn whoami(user: UserId) -> HttpResponse {
        HttpResponse::Ok().body(user.0.to_string())
    }

    #[actix_web::test]
    async fn test_header_sets_caller_id() {
        let app = test::init_service(
            App::new()
                .wrap(CallerIdentity)
                .route("/whoami", web::get().to(whoami)),
        )
        .await;

        let req = test::TestRequest::get()
            .uri("/whoami")
            .insert_header(("userId", "42"))
            .to_request();
        let body = test::call_and_read_body(&app, req).await;
        assert_eq!(body, "42");

        let req = test::TestRequest::get()
            .uri("/whoami")
            .insert_header(("x-user-id", "7"))
            .to_request();
        let body = test::call_and_read_body(&app, req).await;
        assert_eq!(body, "7");
    }

    #[actix_web::test]
    async fn test_missing_or_bad_header_is_unauthorized() {
        let app = test::init_service(
            App::new()
                .wrap(CallerIdentity)
                .route("/whoami", web::get().to(whoami)),
        )
        .await;

        for header in [None, Some("abc"), Some("0"), Some("-3")] {
            let mut req = test::TestRequest::get().uri("/whoami");
            if let Some(value) = header {
                req = req.insert_header(("userId", value));
            }
            let status = match test::try_call_service(&app, req.to_request()).await {
                Ok(resp) => resp.status(),
                Err(err) => err.as_response_error().status_code(),
            };
            assert_eq!(status, StatusCode::UNAUTHORIZED, "header {:?}", header);
        }
    }

    #[actix_web::test]
    async fn test_extractor_without_middleware() {
        let app = test::init_service(App::new().route("/whoami", web::get().to(whoami))).await;
        let req = test::TestRequest::get().uri("/whoami").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }
}
