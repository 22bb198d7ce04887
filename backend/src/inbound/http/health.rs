//! Health endpoints: liveness & readiness probes for orchestration and load balancers.
//! Document endpoints in OpenAPI via Utoipa.
use actix_web::{HttpResponse, get, http::header, web};
use std::sync::atomic::{AtomicBool, Ordering};

/// Shared health state for readiness and liveness checks.
/// Track readiness and whether the process should report itself as alive to orchestrators.
pub struct HealthState {
    ready: AtomicBool,
    live: AtomicBool,
}

impl Default for HealthState {
    fn default() -> Self {
        Self {
            ready: AtomicBool::new(false),
            live: AtomicBool::new(true),
        }
    }
}

impl HealthState {
    /// Create a new health state starting as not ready but live.
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark the service as ready once the store, cache and catalogue client exist.
    pub fn mark_ready(&self) {
        self.ready.store(true, Ordering::Release);
    }

    /// Flag the service as unhealthy so liveness checks fail fast during shutdown.
    pub fn mark_unhealthy(&self) {
        self.live.store(false, Ordering::Release);
    }

    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::Acquire)
    }

    /// Return liveness state. When false, liveness probes emit 503 to trigger restarts.
    pub fn is_alive(&self) -> bool {
        self.live.load(Ordering::Acquire)
    }

    fn probe_response(probe_ok: bool) -> HttpResponse {
        let mut response = if probe_ok {
            HttpResponse::Ok()
        } else {
            HttpResponse::ServiceUnavailable()
        };

        response
            .insert_header((header::CACHE_CONTROL, "no-store"))
            .finish()
    }
}

/// Readiness probe. Return 200 when dependencies are initialised and the server can handle traffic; return 503 otherwise.
#[utoipa::path(
    get,
    path = "/health/ready",
    tags = ["health"],
    security([]),
    responses(
        (status = 200, description = "Server is ready to handle traffic"),
        (status = 503, description = "Server is not ready")
    )
)]
#[get("/health/ready")]
pub async fn ready(state: web::Data<HealthState>) -> HttpResponse {
    HealthState::probe_response(state.is_ready())
}

/// Liveness probe. Return 200 while the process is marked alive and 503 once draining.
#[utoipa::path(
    get,
    path = "/health/live",
    tags = ["health"],
    security([]),
    responses(
        (status = 200, description = "Server is alive"),
        (status = 503, description = "Server is shutting down")
    )
)]
#[get("/health/live")]
pub async fn live(state: web::Data<HealthState>) -> HttpResponse {
    HealthState::probe_response(state.is_alive())
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::http::StatusCode;
    use actix_web::{App, test};
    use rstest::rstest;

    async fn probe(state: web::Data<HealthState>, uri: &str) -> StatusCode {
        let app = test::init_service(
            App::new().app_data(state).service(ready).service(live),
        )
        .await;
        test::call_service(&app, test::TestRequest::get().uri(uri).to_request())
            .await
            .status()
    }

    #[rstest]
    #[actix_web::test]
    async fn readiness_follows_mark_ready() {
        let state = web::Data::new(HealthState::new());
        assert_eq!(
            probe(state.clone(), "/health/ready").await,
            StatusCode::SERVICE_UNAVAILABLE
        );

        state.mark_ready();

        assert_eq!(probe(state, "/health/ready").await, StatusCode::OK);
    }

    #[rstest]
    #[actix_web::test]
    async fn liveness_fails_once_draining() {
        let state = web::Data::new(HealthState::new());
        assert_eq!(probe(state.clone(), "/health/live").await, StatusCode::OK);

        state.mark_unhealthy();

        assert_eq!(
            probe(state, "/health/live").await,
            StatusCode::SERVICE_UNAVAILABLE
        );
    }

    #[rstest]
    #[actix_web::test]
    async fn probes_are_never_cached() {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(HealthState::new()))
                .service(live),
        )
        .await;
        let res =
            test::call_service(&app, test::TestRequest::get().uri("/health/live").to_request())
                .await;
        assert_eq!(
            res.headers().get(header::CACHE_CONTROL).map(|v| v.as_bytes()),
            Some(&b"no-store"[..])
        );
    }
}
