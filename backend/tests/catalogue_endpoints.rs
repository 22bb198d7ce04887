//! HTTP behaviour of the film, character and starship endpoints.

mod support;

use actix_web::http::StatusCode;
use actix_web::test;
use rstest::rstest;
use serde_json::{Value, json};
use starwars_rest::middleware::X_CACHE_HEADER;
use starwars_rest::test_support::catalogue_source::{ScriptedCatalogueSource, film, starship};

use support::{Harness, bearer};

fn cache_header(res: &actix_web::dev::ServiceResponse) -> Option<&str> {
    res.headers()
        .get(X_CACHE_HEADER)
        .and_then(|value| value.to_str().ok())
}

#[rstest]
#[actix_web::test]
async fn film_lifecycle_round_trips_through_the_api() {
    let harness = Harness::new(ScriptedCatalogueSource::new());
    let app = test::init_service(harness.app()).await;

    let created: Value = test::call_and_read_body_json(
        &app,
        test::TestRequest::post()
            .uri("/api/v1/films")
            .insert_header(bearer())
            .set_json(json!({"name": "The Holiday Special", "director": "Steve Binder"}))
            .to_request(),
    )
    .await;
    let id = created["id"].as_i64().expect("id");
    assert_eq!(created["externalId"], 0);

    let patched: Value = test::call_and_read_body_json(
        &app,
        test::TestRequest::patch()
            .uri(&format!("/api/v1/films/{id}"))
            .insert_header(bearer())
            .set_json(json!({"director": null, "releaseDate": "1978-11-17"}))
            .to_request(),
    )
    .await;
    assert_eq!(patched["director"], Value::Null);
    assert_eq!(patched["releaseDate"], "1978-11-17");

    let deleted = test::call_service(
        &app,
        test::TestRequest::delete()
            .uri(&format!("/api/v1/films/{id}"))
            .insert_header(bearer())
            .to_request(),
    )
    .await;
    assert_eq!(deleted.status(), StatusCode::NO_CONTENT);

    let missing = test::call_service(
        &app,
        test::TestRequest::get()
            .uri(&format!("/api/v1/films/{id}"))
            .to_request(),
    )
    .await;
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);
    let body: Value = test::read_body_json(missing).await;
    assert_eq!(body["code"], "not_found");
}

#[rstest]
#[case::no_token(None, StatusCode::UNAUTHORIZED)]
#[case::wrong_token(Some("Bearer sith"), StatusCode::UNAUTHORIZED)]
#[actix_web::test]
async fn writes_require_a_configured_token(
    #[case] header: Option<&'static str>,
    #[case] expected: StatusCode,
) {
    let harness = Harness::new(ScriptedCatalogueSource::new());
    let app = test::init_service(harness.app()).await;

    let mut request = test::TestRequest::post()
        .uri("/api/v1/films")
        .set_json(json!({"name": "Rogue One"}));
    if let Some(value) = header {
        request = request.insert_header(("authorization", value));
    }
    let res = test::call_service(&app, request.to_request()).await;

    assert_eq!(res.status(), expected);
}

#[rstest]
#[actix_web::test]
async fn collections_are_paginated_with_absolute_links() {
    let harness = Harness::new(ScriptedCatalogueSource::new());
    let app = test::init_service(harness.app()).await;
    for name in ["A New Hope", "The Empire Strikes Back", "Return of the Jedi"] {
        let res = test::call_service(
            &app,
            test::TestRequest::post()
                .uri("/api/v1/films")
                .insert_header(bearer())
                .set_json(json!({ "name": name }))
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::CREATED);
    }

    let page: Value = test::call_and_read_body_json(
        &app,
        test::TestRequest::get()
            .uri("/api/v1/films?page=2&page_size=2")
            .to_request(),
    )
    .await;

    assert_eq!(page["count"], 3);
    assert_eq!(page["results"].as_array().map(Vec::len), Some(1));
    assert_eq!(page["next"], Value::Null);
    let previous = page["previous"].as_str().expect("previous link");
    assert!(previous.starts_with("http://"));
    assert!(previous.contains("/api/v1/films"));
}

#[rstest]
#[actix_web::test]
async fn search_matches_names_ignoring_case() {
    let harness = Harness::new(ScriptedCatalogueSource::new());
    let app = test::init_service(harness.app()).await;
    for name in ["Luke Skywalker", "Leia Organa", "Anakin Skywalker"] {
        test::call_service(
            &app,
            test::TestRequest::post()
                .uri("/api/v1/characters")
                .insert_header(bearer())
                .set_json(json!({ "name": name }))
                .to_request(),
        )
        .await;
    }

    let page: Value = test::call_and_read_body_json(
        &app,
        test::TestRequest::get()
            .uri("/api/v1/characters/search?name=SKYWALKER")
            .to_request(),
    )
    .await;

    assert_eq!(page["count"], 2);
}

#[rstest]
#[actix_web::test]
async fn deleting_a_film_removes_it_from_character_relations() {
    let harness = Harness::new(ScriptedCatalogueSource::new());
    let app = test::init_service(harness.app()).await;
    let film: Value = test::call_and_read_body_json(
        &app,
        test::TestRequest::post()
            .uri("/api/v1/films")
            .insert_header(bearer())
            .set_json(json!({"name": "Attack of the Clones"}))
            .to_request(),
    )
    .await;
    let film_id = film["id"].as_i64().expect("film id");
    let character: Value = test::call_and_read_body_json(
        &app,
        test::TestRequest::post()
            .uri("/api/v1/characters")
            .insert_header(bearer())
            .set_json(json!({"name": "Jango Fett", "films": [film_id]}))
            .to_request(),
    )
    .await;
    assert_eq!(character["films"], json!([film_id]));
    let character_id = character["id"].as_i64().expect("character id");

    test::call_service(
        &app,
        test::TestRequest::delete()
            .uri(&format!("/api/v1/films/{film_id}"))
            .insert_header(bearer())
            .to_request(),
    )
    .await;
    let reloaded: Value = test::call_and_read_body_json(
        &app,
        test::TestRequest::get()
            .uri(&format!("/api/v1/characters/{character_id}"))
            .to_request(),
    )
    .await;

    assert_eq!(reloaded["films"], json!([]));
}

#[rstest]
#[actix_web::test]
async fn unknown_relation_ids_are_rejected() {
    let harness = Harness::new(ScriptedCatalogueSource::new());
    let app = test::init_service(harness.app()).await;

    let res = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/api/v1/characters")
            .insert_header(bearer())
            .set_json(json!({"name": "Jar Jar Binks", "films": [404]}))
            .to_request(),
    )
    .await;

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[rstest]
#[actix_web::test]
async fn catalogue_records_are_checked_against_the_catalogue() {
    let source = ScriptedCatalogueSource::new()
        .with_film_pages(vec![vec![film(1, "A New Hope")]])
        .with_starship_pages(vec![vec![starship(
            12,
            "X-wing",
            "T-65 X-wing",
            &[1],
            &[],
        )]]);
    let harness = Harness::new(source);
    let app = test::init_service(harness.app()).await;

    let accepted = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/api/v1/films")
            .insert_header(bearer())
            .set_json(json!({"externalId": 1, "name": "a new hope"}))
            .to_request(),
    )
    .await;
    let wrong_name = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/api/v1/starships")
            .insert_header(bearer())
            .set_json(json!({"externalId": 12, "name": "X-wing", "model": "T-70 X-wing"}))
            .to_request(),
    )
    .await;
    let unknown = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/api/v1/films")
            .insert_header(bearer())
            .set_json(json!({"externalId": 99, "name": "Episode X"}))
            .to_request(),
    )
    .await;

    assert_eq!(accepted.status(), StatusCode::CREATED);
    assert_eq!(wrong_name.status(), StatusCode::BAD_REQUEST);
    assert_eq!(unknown.status(), StatusCode::BAD_REQUEST);
}

#[rstest]
#[actix_web::test]
async fn local_records_are_refused_when_unofficial_records_are_disabled() {
    let harness = Harness::with_unofficial(ScriptedCatalogueSource::new(), false);
    let app = test::init_service(harness.app()).await;

    let res = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/api/v1/films")
            .insert_header(bearer())
            .set_json(json!({"name": "Fan Edit"}))
            .to_request(),
    )
    .await;

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[rstest]
#[actix_web::test]
async fn writes_invalidate_cached_reads() {
    let harness = Harness::new(ScriptedCatalogueSource::new());
    let app = test::init_service(harness.app()).await;

    let first =
        test::call_service(&app, test::TestRequest::get().uri("/api/v1/films").to_request()).await;
    let second =
        test::call_service(&app, test::TestRequest::get().uri("/api/v1/films").to_request()).await;
    assert_eq!(cache_header(&first), Some("MISS"));
    assert_eq!(cache_header(&second), Some("HIT"));
    assert!(!harness.cache.is_empty());

    test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/api/v1/films")
            .insert_header(bearer())
            .set_json(json!({"name": "Solo"}))
            .to_request(),
    )
    .await;
    let third =
        test::call_service(&app, test::TestRequest::get().uri("/api/v1/films").to_request()).await;

    assert_eq!(cache_header(&third), Some("MISS"));
    let body: Value = test::read_body_json(third).await;
    assert_eq!(body["count"], 1);
}

#[rstest]
#[actix_web::test]
async fn malformed_bodies_use_the_error_envelope() {
    let harness = Harness::new(ScriptedCatalogueSource::new());
    let app = test::init_service(harness.app()).await;

    let res = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/api/v1/films")
            .insert_header(bearer())
            .insert_header(("content-type", "application/json"))
            .set_payload("{not json")
            .to_request(),
    )
    .await;

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert!(res.headers().contains_key("trace-id"));
    let body: Value = test::read_body_json(res).await;
    assert_eq!(body["code"], "invalid_request");
}
