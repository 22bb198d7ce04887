//! Tests for HTTP error mapping.

use super::*;
use crate::domain::Error;
use actix_web::body::to_bytes;
use actix_web::http::StatusCode;
use actix_web::test as actix_test;
use actix_web::{App, ResponseError};
use rstest::{fixture, rstest};
use serde::Deserialize;
use serde_json::json;

const TRACE_ID: &str = "00000000-0000-0000-0000-000000000000";

#[fixture]
fn expected_trace_id() -> String {
    TRACE_ID.to_owned()
}

#[fixture]
fn internal_error_case(expected_trace_id: String) -> Error {
    Error::internal("boom")
        .with_trace_id(expected_trace_id)
        .with_details(json!({"secret": "x"}))
}

#[fixture]
fn invalid_request_case(expected_trace_id: String) -> Error {
    Error::invalid_request("bad")
        .with_trace_id(expected_trace_id)
        .with_details(json!({"field": "name"}))
}

#[rstest]
#[case::invalid(Error::invalid_request("bad"), StatusCode::BAD_REQUEST)]
#[case::unauthorized(Error::unauthorized("no auth"), StatusCode::UNAUTHORIZED)]
#[case::forbidden(Error::forbidden("denied"), StatusCode::FORBIDDEN)]
#[case::not_found(Error::not_found("missing"), StatusCode::NOT_FOUND)]
#[case::conflict(Error::conflict("taken"), StatusCode::CONFLICT)]
#[case::unavailable(Error::service_unavailable("down"), StatusCode::SERVICE_UNAVAILABLE)]
#[case::internal(Error::internal("boom"), StatusCode::INTERNAL_SERVER_ERROR)]
fn status_code_matches_error_code(#[case] err: Error, #[case] status: StatusCode) {
    assert_eq!(ResponseError::status_code(&err), status);
}

async fn assert_error_response(
    error: Error,
    expected_status: StatusCode,
    expected_trace_id: Option<&str>,
) -> Error {
    let response = ResponseError::error_response(&error);
    assert_eq!(response.status(), expected_status);

    let header = response.headers().get(TRACE_ID_HEADER);
    match expected_trace_id {
        Some(expected) => {
            let trace_id = header
                .expect("trace-id header is set by error_response")
                .to_str()
                .expect("trace-id is valid UTF-8");
            assert_eq!(trace_id, expected);
        }
        None => assert!(header.is_none(), "trace-id header should not be present"),
    }

    let bytes = to_bytes(response.into_body())
        .await
        .expect("reading response body succeeds");

    serde_json::from_slice(&bytes).expect("Error JSON deserialisation succeeds")
}

#[rstest]
#[actix_web::test]
async fn error_responses_include_trace_id_and_payloads(
    #[from(internal_error_case)] internal_error: Error,
    #[from(invalid_request_case)] invalid_request: Error,
    expected_trace_id: String,
) {
    let redacted = assert_error_response(
        internal_error,
        StatusCode::INTERNAL_SERVER_ERROR,
        Some(expected_trace_id.as_str()),
    )
    .await;
    assert_eq!(redacted.code(), ErrorCode::InternalError);
    assert_eq!(redacted.message(), "Internal server error");
    assert!(redacted.details().is_none());

    let payload = assert_error_response(
        invalid_request,
        StatusCode::BAD_REQUEST,
        Some(expected_trace_id.as_str()),
    )
    .await;
    assert_eq!(payload.code(), ErrorCode::InvalidRequest);
    assert_eq!(payload.message(), "bad");
    assert_eq!(payload.details(), Some(&json!({"field": "name"})));
}

#[rstest]
#[actix_web::test]
async fn error_without_trace_id_omits_trace_header() {
    let error = Error::conflict("name taken").with_details(json!({"field": "name"}));

    let payload = assert_error_response(error, StatusCode::CONFLICT, None).await;
    assert_eq!(payload.code(), ErrorCode::Conflict);
    assert_eq!(payload.message(), "name taken");
    assert_eq!(payload.trace_id(), None);
}

#[rstest]
fn redaction_leaves_client_errors_untouched() {
    let error = Error::not_found("film 9 not found").with_trace_id(TRACE_ID);
    assert_eq!(redact_if_internal(&error), error);
}

#[test]
fn from_actix_error_is_redacted_internal_error() {
    use actix_web::error;

    let actix_err = error::ErrorBadRequest("boom");
    let err: Error = actix_err.into();

    assert_eq!(err.code(), ErrorCode::InternalError);
    assert_eq!(err.message(), "Internal server error");
    assert_eq!(err.trace_id(), None);
    assert_eq!(err.details(), None);
}

#[derive(Debug, Deserialize)]
struct Body {
    #[expect(dead_code, reason = "only deserialised to exercise the extractor")]
    name: String,
}

#[derive(Debug, Deserialize)]
struct Params {
    #[expect(dead_code, reason = "only deserialised to exercise the extractor")]
    page: u32,
}

async fn accept_body(_body: web::Json<Body>) -> HttpResponse {
    HttpResponse::Ok().finish()
}

async fn accept_query(_params: web::Query<Params>) -> HttpResponse {
    HttpResponse::Ok().finish()
}

async fn accept_path(_id: web::Path<i64>) -> HttpResponse {
    HttpResponse::Ok().finish()
}

#[rstest]
#[case::body("/body", "body")]
#[case::query("/query?page=first", "query")]
#[case::path("/items/abc", "path")]
#[actix_web::test]
async fn extractor_failures_use_the_error_envelope(#[case] uri: &str, #[case] source: &str) {
    let app = actix_test::init_service(
        App::new()
            .app_data(json_config())
            .app_data(query_config())
            .app_data(path_config())
            .route("/body", web::post().to(accept_body))
            .route("/query", web::get().to(accept_query))
            .route("/items/{id}", web::get().to(accept_path)),
    )
    .await;

    let req = if source == "body" {
        actix_test::TestRequest::post()
            .uri(uri)
            .insert_header(("content-type", "application/json"))
            .set_payload("{\"name\":")
            .to_request()
    } else {
        actix_test::TestRequest::get().uri(uri).to_request()
    };
    let res = actix_test::call_service(&app, req).await;

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let payload: Error = actix_test::read_body_json(res).await;
    assert_eq!(payload.code(), ErrorCode::InvalidRequest);
    assert_eq!(payload.details(), Some(&json!({"source": source})));
}
