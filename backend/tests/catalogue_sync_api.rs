//! Triggering catalogue synchronisation over HTTP.

mod support;

use std::time::Duration;

use actix_http::Request;
use actix_web::dev::{Service, ServiceResponse};
use actix_web::http::StatusCode;
use actix_web::test;
use rstest::rstest;
use serde_json::{Value, json};
use starwars_rest::domain::catalogue_sync::{SyncState, SyncStage};
use starwars_rest::domain::ports::{SyncStatus, SyncTicket};
use starwars_rest::test_support::catalogue_source::{
    ScriptedCatalogueSource, character, film, starship,
};

use support::{Harness, bearer};

fn catalogue() -> ScriptedCatalogueSource {
    ScriptedCatalogueSource::new()
        .with_film_pages(vec![vec![film(1, "A New Hope"), film(2, "The Empire Strikes Back")]])
        .with_character_pages(vec![
            vec![character(1, "Luke Skywalker", &[1, 2])],
            vec![character(2, "Biggs Darklighter", &[1, 99])],
        ])
        .with_starship_pages(vec![vec![starship(
            12,
            "X-wing",
            "T-65 X-wing",
            &[1],
            &[1, 2],
        )]])
}

async fn trigger<S>(app: &S) -> SyncTicket
where
    S: Service<Request, Response = ServiceResponse, Error = actix_web::Error>,
{
    let res = test::call_service(
        app,
        test::TestRequest::post()
            .uri("/api/v1/sync")
            .insert_header(bearer())
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::ACCEPTED);
    test::read_body_json(res).await
}

/// Poll the status endpoint until the run identified by `ticket` finished.
async fn wait_for<S>(app: &S, ticket: &SyncTicket) -> SyncStatus
where
    S: Service<Request, Response = ServiceResponse, Error = actix_web::Error>,
{
    for _ in 0..200 {
        let status: SyncStatus = test::call_and_read_body_json(
            app,
            test::TestRequest::get().uri("/api/v1/sync").to_request(),
        )
        .await;
        let finished = status
            .last_report
            .as_ref()
            .is_some_and(|report| report.run_id == ticket.run_id);
        if finished && !status.running {
            return status;
        }
        actix_web::rt::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("sync run {} did not finish", ticket.run_id);
}

#[rstest]
#[actix_web::test]
async fn sync_populates_the_store_and_links_relations() {
    let harness = Harness::new(catalogue());
    let app = test::init_service(harness.app()).await;

    let ticket = trigger(&app).await;
    let status = wait_for(&app, &ticket).await;

    let report = status.last_report.expect("report");
    assert_eq!(report.state, SyncState::Done);
    let created: Vec<(SyncStage, usize)> = report
        .stages
        .iter()
        .map(|stage| (stage.stage, stage.created))
        .collect();
    assert_eq!(
        created,
        vec![
            (SyncStage::Films, 2),
            (SyncStage::Characters, 2),
            (SyncStage::Starships, 1),
        ]
    );

    let characters: Value = test::call_and_read_body_json(
        &app,
        test::TestRequest::get()
            .uri("/api/v1/characters/search?name=biggs")
            .to_request(),
    )
    .await;
    let biggs = &characters["results"][0];
    assert_eq!(biggs["externalId"], 2);
    assert_eq!(biggs["films"].as_array().map(Vec::len), Some(1));

    let starships: Value = test::call_and_read_body_json(
        &app,
        test::TestRequest::get().uri("/api/v1/starships").to_request(),
    )
    .await;
    let x_wing = &starships["results"][0];
    assert_eq!(x_wing["MGLT"], "75");
    assert_eq!(x_wing["pilots"].as_array().map(Vec::len), Some(2));
}

#[rstest]
#[actix_web::test]
async fn a_second_run_creates_nothing() {
    let harness = Harness::new(catalogue());
    let app = test::init_service(harness.app()).await;

    let first = trigger(&app).await;
    wait_for(&app, &first).await;
    let second = trigger(&app).await;
    let status = wait_for(&app, &second).await;

    let report = status.last_report.expect("report");
    assert!(report.stages.iter().all(|stage| stage.created == 0));
    let films: Value = test::call_and_read_body_json(
        &app,
        test::TestRequest::get().uri("/api/v1/films").to_request(),
    )
    .await;
    assert_eq!(films["count"], 2);
}

#[rstest]
#[actix_web::test]
async fn sync_invalidates_cached_collections() {
    let harness = Harness::new(catalogue());
    let app = test::init_service(harness.app()).await;
    let before: Value = test::call_and_read_body_json(
        &app,
        test::TestRequest::get().uri("/api/v1/films").to_request(),
    )
    .await;
    assert_eq!(before["count"], 0);

    let ticket = trigger(&app).await;
    wait_for(&app, &ticket).await;
    let after: Value = test::call_and_read_body_json(
        &app,
        test::TestRequest::get().uri("/api/v1/films").to_request(),
    )
    .await;

    assert_eq!(after["count"], 2);
}

#[rstest]
#[actix_web::test]
async fn records_created_by_sync_keep_their_catalogue_identity() {
    let harness = Harness::new(catalogue());
    let app = test::init_service(harness.app()).await;
    let ticket = trigger(&app).await;
    wait_for(&app, &ticket).await;

    let duplicate = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/api/v1/films")
            .insert_header(bearer())
            .set_json(json!({"externalId": 1, "name": "A New Hope"}))
            .to_request(),
    )
    .await;

    assert_eq!(duplicate.status(), StatusCode::CONFLICT);
}

#[rstest]
#[actix_web::test]
async fn sync_trigger_requires_a_token() {
    let harness = Harness::new(catalogue());
    let app = test::init_service(harness.app()).await;

    let res = test::call_service(
        &app,
        test::TestRequest::post().uri("/api/v1/sync").to_request(),
    )
    .await;

    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}
