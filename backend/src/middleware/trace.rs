//! Tracing middleware attaching a request-scoped trace identifier.
//!
//! Each request runs inside [`TraceId::scope`], so domain errors and log lines
//! emitted while handling it carry the same identifier. A well-formed
//! `trace-id` request header is reused; otherwise a fresh UUID is generated.
//! The identifier is echoed in the `trace-id` response header.

use std::task::{Context, Poll};
use std::time::Instant;

use actix_web::Error;
use actix_web::dev::{Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::http::header::{HeaderName, HeaderValue};
use futures_util::future::{LocalBoxFuture, Ready, ready};
use tracing::{error, info};

use crate::domain::{TRACE_ID_HEADER, TraceId};

/// Middleware that scopes every request to a [`TraceId`].
///
/// # Examples
/// ```
/// use actix_web::App;
/// use starwars_rest::Trace;
///
/// let app = App::new().wrap(Trace);
/// ```
#[derive(Clone)]
pub struct Trace;

impl<S, B> Transform<S, ServiceRequest> for Trace
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = TraceMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(TraceMiddleware { service }))
    }
}

/// Service wrapper produced by [`Trace`].
pub struct TraceMiddleware<S> {
    service: S,
}

/// Reuse a caller-supplied identifier when it parses as a UUID.
fn incoming_trace_id(req: &ServiceRequest) -> Option<TraceId> {
    req.headers()
        .get(TRACE_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim().parse().ok())
}

impl<S, B> Service<ServiceRequest> for TraceMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.service.poll_ready(cx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let trace_id = incoming_trace_id(&req).unwrap_or_else(TraceId::generate);
        let method = req.method().clone();
        let path = req.path().to_owned();
        let started = Instant::now();
        let fut = self.service.call(req);
        Box::pin(TraceId::scope(trace_id, async move {
            let mut res = fut.await?;
            match HeaderValue::from_str(&trace_id.to_string()) {
                Ok(value) => {
                    res.response_mut()
                        .headers_mut()
                        .insert(HeaderName::from_static(TRACE_ID_HEADER), value);
                }
                Err(error) => {
                    error!(%error, %trace_id, "failed to encode trace identifier header");
                }
            }
            info!(
                %trace_id,
                %method,
                path = %path,
                status = res.status().as_u16(),
                elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
                "request completed"
            );
            Ok(res)
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Error as DomainError;
    use actix_web::{App, HttpResponse, test, web};

    async fn echo_trace_id() -> HttpResponse {
        match TraceId::current() {
            Some(id) => HttpResponse::Ok().body(id.to_string()),
            None => HttpResponse::InternalServerError().finish(),
        }
    }

    #[actix_web::test]
    async fn handler_sees_the_header_trace_id() {
        let app = test::init_service(
            App::new()
                .wrap(Trace)
                .route("/", web::get().to(echo_trace_id)),
        )
        .await;
        let res = test::call_service(&app, test::TestRequest::get().uri("/").to_request()).await;

        let header = res
            .headers()
            .get(TRACE_ID_HEADER)
            .expect("trace id header")
            .to_str()
            .expect("header is ascii")
            .to_owned();
        let body = test::read_body(res).await;
        assert_eq!(std::str::from_utf8(&body).expect("utf8 body"), header);
    }

    #[actix_web::test]
    async fn reuses_a_valid_incoming_trace_id() {
        let supplied = "3fa85f64-5717-4562-b3fc-2c963f66afa6";
        let app = test::init_service(
            App::new()
                .wrap(Trace)
                .route("/", web::get().to(echo_trace_id)),
        )
        .await;
        let req = test::TestRequest::get()
            .uri("/")
            .insert_header((TRACE_ID_HEADER, supplied))
            .to_request();

        let res = test::call_service(&app, req).await;

        assert_eq!(
            res.headers().get(TRACE_ID_HEADER).and_then(|v| v.to_str().ok()),
            Some(supplied)
        );
    }

    #[actix_web::test]
    async fn replaces_a_malformed_incoming_trace_id() {
        let app = test::init_service(
            App::new()
                .wrap(Trace)
                .route("/", web::get().to(echo_trace_id)),
        )
        .await;
        let req = test::TestRequest::get()
            .uri("/")
            .insert_header((TRACE_ID_HEADER, "not-a-uuid"))
            .to_request();

        let res = test::call_service(&app, req).await;

        let header = res
            .headers()
            .get(TRACE_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .expect("trace id header");
        assert!(header.parse::<TraceId>().is_ok());
    }

    #[actix_web::test]
    async fn error_payload_carries_the_trace_id() {
        let app = test::init_service(App::new().wrap(Trace).route(
            "/",
            web::get().to(|| async {
                Err::<HttpResponse, DomainError>(DomainError::not_found("film 9 not found"))
            }),
        ))
        .await;
        let res = test::call_service(&app, test::TestRequest::get().uri("/").to_request()).await;
        let header = res
            .headers()
            .get(TRACE_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned)
            .expect("trace id header");

        let body: serde_json::Value = test::read_body_json(res).await;

        assert_eq!(body["traceId"], serde_json::Value::String(header));
        assert_eq!(body["code"], "not_found");
    }
}
