//! Read-through cache for catalogue GET responses.
//!
//! Successful `GET` responses under the catalogue collections are stored in a
//! [`ResponseCache`] keyed by path and normalised query string. Cache failures
//! are logged and never fail the request.

use std::rc::Rc;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;

use actix_web::body::{BoxBody, MessageBody, to_bytes};
use actix_web::dev::{Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::http::header::{CONTENT_TYPE, HeaderName, HeaderValue};
use actix_web::http::{Method, StatusCode};
use actix_web::{Error, HttpResponse};
use futures_util::future::{LocalBoxFuture, Ready, ready};
use tracing::{debug, warn};

use crate::domain::ports::{CachedResponse, ResponseCache, ResponseCacheKey};

/// Header reporting whether a response was served from the cache.
pub const X_CACHE_HEADER: &str = "x-cache";

const CACHEABLE_PREFIXES: [&str; 3] = [
    "/api/v1/films",
    "/api/v1/characters",
    "/api/v1/starships",
];

/// Middleware serving repeated catalogue reads from a [`ResponseCache`].
#[derive(Clone)]
pub struct ResponseCacheLayer {
    cache: Arc<dyn ResponseCache>,
    ttl: Duration,
}

impl ResponseCacheLayer {
    pub fn new(cache: Arc<dyn ResponseCache>, ttl: Duration) -> Self {
        Self { cache, ttl }
    }
}

impl<S, B> Transform<S, ServiceRequest> for ResponseCacheLayer
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: MessageBody + 'static,
{
    type Response = ServiceResponse<BoxBody>;
    type Error = Error;
    type InitError = ();
    type Transform = ResponseCacheMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(ResponseCacheMiddleware {
            service: Rc::new(service),
            cache: Arc::clone(&self.cache),
            ttl: self.ttl,
        }))
    }
}

/// Service wrapper produced by [`ResponseCacheLayer`].
pub struct ResponseCacheMiddleware<S> {
    service: Rc<S>,
    cache: Arc<dyn ResponseCache>,
    ttl: Duration,
}

fn is_cacheable(req: &ServiceRequest) -> bool {
    if req.method() != Method::GET {
        return false;
    }
    let path = req.path();
    CACHEABLE_PREFIXES.iter().any(|prefix| {
        path.strip_prefix(prefix)
            .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
    })
}

fn with_cache_status(mut response: HttpResponse, status: &'static str) -> HttpResponse {
    response.headers_mut().insert(
        HeaderName::from_static(X_CACHE_HEADER),
        HeaderValue::from_static(status),
    );
    response
}

impl<S, B> Service<ServiceRequest> for ResponseCacheMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: MessageBody + 'static,
{
    type Response = ServiceResponse<BoxBody>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.service.poll_ready(cx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        if !is_cacheable(&req) {
            let fut = self.service.call(req);
            return Box::pin(async move { Ok(fut.await?.map_into_boxed_body()) });
        }

        let key = ResponseCacheKey::for_request(req.path(), req.query_string());
        let service = Rc::clone(&self.service);
        let cache = Arc::clone(&self.cache);
        let ttl = self.ttl;

        Box::pin(async move {
            match cache.get(&key).await {
                Ok(Some(hit)) => {
                    debug!(key = %key, "response cache hit");
                    let status = StatusCode::from_u16(hit.status).unwrap_or(StatusCode::OK);
                    let response = HttpResponse::build(status)
                        .content_type(hit.content_type)
                        .body(hit.body);
                    let (http_req, _payload) = req.into_parts();
                    return Ok(ServiceResponse::new(
                        http_req,
                        with_cache_status(response, "HIT"),
                    ));
                }
                Ok(None) => {}
                Err(error) => warn!(%error, "response cache read failed"),
            }

            let res = service.call(req).await?;
            if res.status() != StatusCode::OK {
                return Ok(res.map_into_boxed_body());
            }

            let content_type = res
                .headers()
                .get(CONTENT_TYPE)
                .and_then(|value| value.to_str().ok())
                .unwrap_or("application/json")
                .to_owned();
            let (http_req, response) = res.into_parts();
            let (head, body) = response.into_parts();
            let bytes = to_bytes(body).await.map_err(|err| {
                let err: Box<dyn std::error::Error> = err.into();
                actix_web::error::ErrorInternalServerError(err.to_string())
            })?;

            let mut stored = false;
            match std::str::from_utf8(&bytes) {
                Ok(text) => {
                    let entry = CachedResponse {
                        status: StatusCode::OK.as_u16(),
                        content_type,
                        body: text.to_owned(),
                    };
                    match cache.put(&key, &entry, ttl).await {
                        Ok(()) => stored = true,
                        Err(error) => warn!(%error, "response cache write failed"),
                    }
                }
                Err(error) => debug!(%error, "skipping non-UTF-8 response body"),
            }

            let response = head.set_body(bytes).map_into_boxed_body();
            let response = if stored {
                with_cache_status(response, "MISS")
            } else {
                response
            };
            Ok(ServiceResponse::new(http_req, response))
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::domain::ports::{MockResponseCache, ResponseCacheError};
    use crate::outbound::cache::InMemoryResponseCache;
    use actix_web::test as actix_test;
    use actix_web::{App, web};

    const TTL: Duration = Duration::from_secs(300);

    fn counting_app_routes(
        hits: Arc<AtomicUsize>,
    ) -> impl Fn(&mut web::ServiceConfig) + Clone {
        move |cfg: &mut web::ServiceConfig| {
            let films_hits = Arc::clone(&hits);
            let missing_hits = Arc::clone(&hits);
            cfg.route(
                "/api/v1/films",
                web::get().to(move || {
                    let hits = Arc::clone(&films_hits);
                    async move {
                        let n = hits.fetch_add(1, Ordering::SeqCst) + 1;
                        HttpResponse::Ok()
                            .content_type("application/json")
                            .body(format!("{{\"calls\":{n}}}"))
                    }
                }),
            )
            .route(
                "/api/v1/films/99",
                web::get().to(move || {
                    let hits = Arc::clone(&missing_hits);
                    async move {
                        hits.fetch_add(1, Ordering::SeqCst);
                        HttpResponse::NotFound().finish()
                    }
                }),
            )
            .route(
                "/health/live",
                web::get().to(|| async { HttpResponse::Ok().body("ok") }),
            );
        }
    }

    #[actix_web::test]
    async fn second_read_is_served_from_cache() {
        let hits = Arc::new(AtomicUsize::new(0));
        let cache = Arc::new(InMemoryResponseCache::default());
        let app = actix_test::init_service(
            App::new()
                .wrap(ResponseCacheLayer::new(cache.clone(), TTL))
                .configure(counting_app_routes(Arc::clone(&hits))),
        )
        .await;

        let first =
            actix_test::call_service(&app, actix_test::TestRequest::get().uri("/api/v1/films?page=1").to_request())
                .await;
        assert_eq!(first.headers().get(X_CACHE_HEADER).map(|v| v.as_bytes()), Some(&b"MISS"[..]));
        let first_body = actix_test::read_body(first).await;

        let second =
            actix_test::call_service(&app, actix_test::TestRequest::get().uri("/api/v1/films?page=1").to_request())
                .await;
        assert_eq!(second.status(), StatusCode::OK);
        assert_eq!(second.headers().get(X_CACHE_HEADER).map(|v| v.as_bytes()), Some(&b"HIT"[..]));
        assert_eq!(
            second.headers().get(CONTENT_TYPE).map(|v| v.as_bytes()),
            Some(&b"application/json"[..])
        );
        let second_body = actix_test::read_body(second).await;

        assert_eq!(first_body, second_body);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert_eq!(cache.len(), 1);
    }

    #[actix_web::test]
    async fn query_order_does_not_split_entries() {
        let hits = Arc::new(AtomicUsize::new(0));
        let cache = Arc::new(InMemoryResponseCache::default());
        let app = actix_test::init_service(
            App::new()
                .wrap(ResponseCacheLayer::new(cache, TTL))
                .configure(counting_app_routes(Arc::clone(&hits))),
        )
        .await;

        for uri in ["/api/v1/films?page=2&page_size=5", "/api/v1/films?page_size=5&page=2"] {
            let res = actix_test::call_service(&app, actix_test::TestRequest::get().uri(uri).to_request()).await;
            assert_eq!(res.status(), StatusCode::OK);
        }

        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[actix_web::test]
    async fn non_success_responses_are_not_stored() {
        let hits = Arc::new(AtomicUsize::new(0));
        let cache = Arc::new(InMemoryResponseCache::default());
        let app = actix_test::init_service(
            App::new()
                .wrap(ResponseCacheLayer::new(cache.clone(), TTL))
                .configure(counting_app_routes(Arc::clone(&hits))),
        )
        .await;

        for _ in 0..2 {
            let res =
                actix_test::call_service(&app, actix_test::TestRequest::get().uri("/api/v1/films/99").to_request())
                    .await;
            assert_eq!(res.status(), StatusCode::NOT_FOUND);
            assert!(res.headers().get(X_CACHE_HEADER).is_none());
        }

        assert_eq!(hits.load(Ordering::SeqCst), 2);
        assert!(cache.is_empty());
    }

    #[actix_web::test]
    async fn paths_outside_the_catalogue_bypass_the_cache() {
        let hits = Arc::new(AtomicUsize::new(0));
        let cache = Arc::new(InMemoryResponseCache::default());
        let app = actix_test::init_service(
            App::new()
                .wrap(ResponseCacheLayer::new(cache.clone(), TTL))
                .configure(counting_app_routes(hits)),
        )
        .await;

        let res =
            actix_test::call_service(&app, actix_test::TestRequest::get().uri("/health/live").to_request()).await;

        assert_eq!(res.status(), StatusCode::OK);
        assert!(res.headers().get(X_CACHE_HEADER).is_none());
        assert!(cache.is_empty());
    }

    #[actix_web::test]
    async fn cache_failures_fall_through_to_the_handler() {
        let mut cache = MockResponseCache::new();
        cache
            .expect_get()
            .returning(|_| Err(ResponseCacheError::backend("redis down")));
        cache
            .expect_put()
            .times(1)
            .returning(|_, _, _| Err(ResponseCacheError::backend("redis down")));
        let hits = Arc::new(AtomicUsize::new(0));
        let app = actix_test::init_service(
            App::new()
                .wrap(ResponseCacheLayer::new(Arc::new(cache), TTL))
                .configure(counting_app_routes(Arc::clone(&hits))),
        )
        .await;

        let res =
            actix_test::call_service(&app, actix_test::TestRequest::get().uri("/api/v1/films").to_request()).await;

        assert_eq!(res.status(), StatusCode::OK);
        assert!(res.headers().get(X_CACHE_HEADER).is_none());
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn only_catalogue_collections_match() {
        let cacheable = |method: Method, uri: &str| {
            is_cacheable(&actix_test::TestRequest::default().method(method).uri(uri).to_srv_request())
        };
        assert!(cacheable(Method::GET, "/api/v1/characters/search?name=luke"));
        assert!(cacheable(Method::GET, "/api/v1/starships"));
        assert!(!cacheable(Method::GET, "/api/v1/filmsx"));
        assert!(!cacheable(Method::GET, "/api/v1/sync"));
        assert!(!cacheable(Method::POST, "/api/v1/films"));
    }
}
