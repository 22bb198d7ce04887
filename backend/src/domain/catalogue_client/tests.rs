//! Retry and traversal behaviour of the catalogue client.

use std::sync::Arc;
use std::time::Duration;

use rstest::rstest;

use super::*;
use crate::domain::ports::CatalogueResource;
use crate::test_support::catalogue_source::{
    ScriptedCatalogueSource, character, film, page_url,
};
use crate::test_support::retry::{MutableClock, RecordingSleeper, recording_runtime};

fn client_for(source: &Arc<ScriptedCatalogueSource>) -> (CatalogueClient, Arc<RecordingSleeper>) {
    let (runtime, sleeper) = recording_runtime();
    let client = CatalogueClient::with_runtime(
        Arc::clone(source) as Arc<dyn CatalogueSource>,
        Arc::new(MutableClock::fixed()),
        runtime,
        RetryPolicy::default(),
    );
    (client, sleeper)
}

fn films(range: std::ops::RangeInclusive<i64>) -> Vec<ExternalFilm> {
    range.map(|id| film(id, &format!("Film {id}"))).collect()
}

#[tokio::test]
async fn drains_every_page_in_order() {
    let source = Arc::new(
        ScriptedCatalogueSource::new().with_film_pages(vec![films(1..=5), films(6..=10), films(11..=12)]),
    );
    let (client, _) = client_for(&source);

    let records = client
        .fetch_all::<ExternalFilm>(None)
        .await
        .expect("traversal succeeds");

    assert_eq!(records.len(), 12);
    let titles: Vec<_> = records.iter().filter_map(|f| f.title.clone()).collect();
    assert_eq!(titles.first().map(String::as_str), Some("Film 1"));
    assert_eq!(titles.last().map(String::as_str), Some("Film 12"));
    assert_eq!(source.requests().len(), 3);
}

#[tokio::test]
async fn not_found_yields_an_empty_collection() {
    let source = Arc::new(ScriptedCatalogueSource::new());
    let (client, sleeper) = client_for(&source);

    let records = client
        .fetch_all::<ExternalCharacter>(None)
        .await
        .expect("404 is not an error");

    assert!(records.is_empty());
    assert!(sleeper.delays().is_empty());
}

#[tokio::test]
async fn not_found_mid_traversal_keeps_records_seen_so_far() {
    let source = Arc::new(ScriptedCatalogueSource::new());
    source.push_film_response(
        &page_url(CatalogueResource::Films, 1),
        Ok(Some(pagination::Page {
            count: 4,
            next: Some(page_url(CatalogueResource::Films, 7)),
            previous: None,
            results: films(1..=2),
        })),
    );
    let (client, _) = client_for(&source);

    let records = client
        .fetch_all::<ExternalFilm>(None)
        .await
        .expect("traversal succeeds");

    assert_eq!(records.len(), 2);
    assert_eq!(source.requests().len(), 2);
}

#[rstest]
#[case::timeout(CatalogueSourceError::timeout("deadline elapsed"))]
#[case::transport(CatalogueSourceError::transport("connection reset"))]
#[case::rate_limited(CatalogueSourceError::rate_limited("slow down"))]
#[case::unavailable(CatalogueSourceError::unavailable(503_u16, "maintenance"))]
#[tokio::test]
async fn retries_transient_failures(#[case] error: CatalogueSourceError) {
    let source = ScriptedCatalogueSource::new();
    let first = page_url(CatalogueResource::Films, 1);
    source.push_film_response(&first, Err(error.clone()));
    source.push_film_response(&first, Err(error));
    let source = Arc::new(source.with_film_pages(vec![films(1..=3)]));
    let (client, sleeper) = client_for(&source);

    let records = client
        .fetch_all::<ExternalFilm>(None)
        .await
        .expect("third attempt succeeds");

    assert_eq!(records.len(), 3);
    assert_eq!(
        sleeper.delays(),
        vec![Duration::from_secs(1), Duration::from_secs(2)]
    );
}

#[tokio::test]
async fn gives_up_after_the_attempt_budget() {
    let source = Arc::new(ScriptedCatalogueSource::new());
    let first = page_url(CatalogueResource::Films, 1);
    source.push_film_response(&first, Err(CatalogueSourceError::unavailable(502_u16, "gateway")));
    let (client, sleeper) = client_for(&source);

    let error = client
        .fetch_all::<ExternalFilm>(None)
        .await
        .expect_err("retries exhausted");

    assert_eq!(error, CatalogueSourceError::unavailable(502_u16, "gateway"));
    assert_eq!(source.requests().len(), 3);
    assert_eq!(sleeper.delays().len(), 2);
}

#[rstest]
#[case::bad_request(CatalogueSourceError::status(400_u16, "bad request"))]
#[case::decode(CatalogueSourceError::decode("expected value at line 1"))]
#[tokio::test]
async fn fatal_failures_are_not_retried(#[case] error: CatalogueSourceError) {
    let source = Arc::new(ScriptedCatalogueSource::new());
    let first = page_url(CatalogueResource::People, 1);
    source.push_character_response(&first, Err(error.clone()));
    let (client, sleeper) = client_for(&source);

    let returned = client
        .fetch_all::<ExternalCharacter>(None)
        .await
        .expect_err("fatal error surfaces");

    assert_eq!(returned, error);
    assert_eq!(source.requests().len(), 1);
    assert!(sleeper.delays().is_empty());
}

#[tokio::test]
async fn cyclic_next_link_ends_the_traversal() {
    let source = Arc::new(ScriptedCatalogueSource::new());
    let first = page_url(CatalogueResource::People, 1);
    let second = page_url(CatalogueResource::People, 2);
    source.push_character_response(
        &first,
        Ok(Some(pagination::Page {
            count: 2,
            next: Some(second.clone()),
            previous: None,
            results: vec![character(1, "Luke Skywalker", &[])],
        })),
    );
    source.push_character_response(
        &second,
        Ok(Some(pagination::Page {
            count: 2,
            next: Some(first.clone()),
            previous: Some(first.clone()),
            results: vec![character(2, "C-3PO", &[])],
        })),
    );
    let (client, _) = client_for(&source);

    let records = client
        .fetch_all::<ExternalCharacter>(None)
        .await
        .expect("traversal succeeds");

    assert_eq!(records.len(), 2);
    assert_eq!(source.requests(), vec![first, second]);
}

#[tokio::test]
async fn limit_stops_fetching_further_pages() {
    let source = Arc::new(
        ScriptedCatalogueSource::new().with_film_pages(vec![films(1..=5), films(6..=10), films(11..=12)]),
    );
    let (client, _) = client_for(&source);

    let records = client
        .fetch_all::<ExternalFilm>(Some(7))
        .await
        .expect("traversal succeeds");

    assert_eq!(records.len(), 7);
    assert_eq!(source.requests().len(), 2);
}

#[tokio::test]
async fn single_record_lookup_retries_then_reports_failure() {
    let source = Arc::new(ScriptedCatalogueSource::new().with_film_pages(vec![films(1..=2)]));
    source.fail_single_fetches(CatalogueSourceError::timeout("slow"));
    let (client, sleeper) = client_for(&source);

    let error = client
        .fetch_film(ExternalId::new(1))
        .await
        .expect_err("lookup fails");

    assert!(error.is_retryable());
    assert_eq!(sleeper.delays().len(), 2);
}

#[tokio::test]
async fn single_record_lookup_finds_scripted_records() {
    let source = Arc::new(ScriptedCatalogueSource::new().with_film_pages(vec![films(1..=2)]));
    let (client, _) = client_for(&source);

    let found = client
        .fetch_film(ExternalId::new(2))
        .await
        .expect("lookup succeeds");
    let missing = client
        .fetch_film(ExternalId::new(9))
        .await
        .expect("lookup succeeds");

    assert_eq!(found.and_then(|f| f.title), Some("Film 2".to_owned()));
    assert!(missing.is_none());
}
