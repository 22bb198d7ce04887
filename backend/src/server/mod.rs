//! Server construction and middleware wiring.

mod config;
#[cfg(feature = "metrics")]
mod metrics;
mod state_builders;

pub use config::ServerConfig;

#[cfg(feature = "metrics")]
use metrics::MetricsLayer;
use state_builders::build_http_state;

use actix_web::dev::{Server, ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::{App, HttpServer, web};

use starwars_rest::Trace;
#[cfg(debug_assertions)]
use starwars_rest::doc::ApiDoc;
use starwars_rest::domain::ports::{NoOpSyncMetrics, SyncMetrics};
use starwars_rest::inbound::http::configure_api;
use starwars_rest::inbound::http::health::{HealthState, live, ready};
use starwars_rest::inbound::http::state::HttpState;
use starwars_rest::middleware::ResponseCacheLayer;
#[cfg(feature = "metrics")]
use starwars_rest::outbound::metrics::PrometheusSyncMetrics;
#[cfg(debug_assertions)]
use utoipa::OpenApi;
#[cfg(debug_assertions)]
use utoipa_swagger_ui::SwaggerUi;

use std::sync::Arc;

/// Build the sync metrics sink.
///
/// Counters are registered on the Prometheus registry when one is
/// configured; otherwise runs are not recorded.
///
/// # Errors
/// Returns [`std::io::Error`] if Prometheus metric registration fails.
#[cfg(feature = "metrics")]
fn build_sync_metrics(config: &ServerConfig) -> std::io::Result<Arc<dyn SyncMetrics>> {
    match &config.prometheus {
        Some(prom) => {
            let metrics = PrometheusSyncMetrics::new(&prom.registry).map_err(|e| {
                std::io::Error::other(format!("sync metrics registration failed: {e}"))
            })?;
            Ok(Arc::new(metrics))
        }
        None => Ok(Arc::new(NoOpSyncMetrics)),
    }
}

/// Build the sync metrics sink. Without the metrics feature runs are not
/// recorded.
#[cfg(not(feature = "metrics"))]
fn build_sync_metrics(_config: &ServerConfig) -> std::io::Result<Arc<dyn SyncMetrics>> {
    Ok(Arc::new(NoOpSyncMetrics))
}

#[derive(Clone)]
struct AppDependencies {
    health_state: web::Data<HealthState>,
    http_state: web::Data<HttpState>,
    cache: ResponseCacheLayer,
}

fn build_app(
    deps: AppDependencies,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    let AppDependencies {
        health_state,
        http_state,
        cache,
    } = deps;

    let api = web::scope("/api/v1").wrap(cache).configure(configure_api);

    let app = App::new()
        .app_data(health_state)
        .app_data(http_state)
        .wrap(Trace)
        .service(api)
        .service(ready)
        .service(live);

    #[cfg(debug_assertions)]
    let app = app.service(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()));
    #[cfg(not(debug_assertions))]
    let app = app;

    app
}

/// Construct an Actix HTTP server using the provided health state and configuration.
///
/// # Parameters
/// - `health_state`: shared readiness state updated once the server is initialised.
/// - `config`: pre-built [`ServerConfig`] containing the store, cache, catalogue and metrics settings.
///
/// # Returns
/// A spawned [`Server`] that must be awaited to drive the listener.
///
/// # Errors
/// Propagates [`std::io::Error`] when building the catalogue client, binding
/// the socket or starting the server fails.
pub fn create_server(
    health_state: web::Data<HealthState>,
    config: ServerConfig,
) -> std::io::Result<Server> {
    let server_health_state = health_state.clone();
    let sync_metrics = build_sync_metrics(&config)?;
    let http_state = build_http_state(&config, sync_metrics)?;
    let cache = ResponseCacheLayer::new(config.cache.clone(), config.cache_ttl);
    let bind_addr = config.bind_addr;

    #[cfg(feature = "metrics")]
    let metrics_layer = MetricsLayer::from_option(config.prometheus.as_ref());

    let server = HttpServer::new(move || {
        let app = build_app(AppDependencies {
            health_state: server_health_state.clone(),
            http_state: http_state.clone(),
            cache: cache.clone(),
        });

        #[cfg(feature = "metrics")]
        let app = app.wrap(metrics_layer.clone());

        app
    })
    .bind(bind_addr)?
    .run();

    health_state.mark_ready();
    Ok(server)
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::http::StatusCode;
    use actix_web::test;
    use reqwest::Url;
    use rstest::rstest;
    use starwars_rest::domain::AccessPolicy;
    use starwars_rest::middleware::X_CACHE_HEADER;

    fn deps() -> AppDependencies {
        let config = ServerConfig::new(
            "127.0.0.1:0".parse().expect("socket addr"),
            Url::parse("http://127.0.0.1:9/api").expect("url"),
            AccessPolicy::from_list("jedi"),
        );
        let health_state = web::Data::new(HealthState::new());
        health_state.mark_ready();
        AppDependencies {
            health_state,
            http_state: build_http_state(&config, Arc::new(NoOpSyncMetrics)).expect("state"),
            cache: ResponseCacheLayer::new(config.cache.clone(), config.cache_ttl),
        }
    }

    #[rstest]
    #[actix_web::test]
    async fn catalogue_reads_go_through_the_cache() {
        let app = test::init_service(build_app(deps())).await;

        let first =
            test::call_service(&app, test::TestRequest::get().uri("/api/v1/films").to_request())
                .await;
        let second =
            test::call_service(&app, test::TestRequest::get().uri("/api/v1/films").to_request())
                .await;

        assert_eq!(first.status(), StatusCode::OK);
        assert_eq!(
            first.headers().get(X_CACHE_HEADER).map(|v| v.as_bytes()),
            Some(&b"MISS"[..])
        );
        assert_eq!(
            second.headers().get(X_CACHE_HEADER).map(|v| v.as_bytes()),
            Some(&b"HIT"[..])
        );
    }

    #[rstest]
    #[actix_web::test]
    async fn health_probes_are_mounted_outside_the_api_scope() {
        let app = test::init_service(build_app(deps())).await;

        let res =
            test::call_service(&app, test::TestRequest::get().uri("/health/ready").to_request())
                .await;

        assert_eq!(res.status(), StatusCode::OK);
        assert!(res.headers().get(X_CACHE_HEADER).is_none());
    }

    #[rstest]
    #[actix_web::test]
    async fn responses_carry_a_trace_id() {
        let app = test::init_service(build_app(deps())).await;

        let res = test::call_service(
            &app,
            test::TestRequest::get().uri("/api/v1/films/999").to_request(),
        )
        .await;

        assert_eq!(res.status(), StatusCode::NOT_FOUND);
        assert!(res.headers().contains_key("trace-id"));
    }
}
