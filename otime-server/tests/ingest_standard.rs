//! Standard-mode ingestion: merging reads into registered entries and the
//! unassigned-result bookkeeping.

mod common;

use common::*;
use otime_server::cache::ResultCache;
use otime_server::db::TransactionMode;
use otime_server::db::queries;
use otime_server::model::cardreader::store_cardreader_result;
use otime_server::model::entries::add_or_update_entry;
use otime_types::entry::EntryType;
use otime_types::result::ResultStatus;

const KEY: &str = "4712";
const CARD: &str = "4711";

struct Fixture {
    db: otime_server::Database,
    cache: ResultCache,
    event_id: i64,
    class_id: i64,
}

async fn standard_fixture() -> Fixture {
    let db = test_db().await;
    let cache = ResultCache::new();
    let event = create_event(&db, &cache, "Standard Event", KEY, false).await;
    let course_id = create_course(&db, &cache, event.id, "Bahn A", &["101", "102", "103"]).await;
    let class_id = create_class(&db, &cache, event.id, "Elite", Some(course_id)).await;
    Fixture {
        db,
        cache,
        event_id: event.id,
        class_id,
    }
}

async fn entries_of(f: &Fixture) -> Vec<EntryType> {
    let mut tx = f.db.begin(TransactionMode::Deferred).await.unwrap();
    queries::entries::get_entries(&mut tx, f.event_id).await.unwrap()
}

/// Register a competitor for the event; the entry has no punches yet.
async fn register(f: &Fixture, first: &str, last: &str, chip: &str) -> i64 {
    let (id, _) = add_or_update_entry(
        &f.db,
        &f.cache,
        entry_upsert(f.event_id, f.class_id, first, last, chip),
    )
    .await
    .unwrap();
    id
}

#[tokio::test]
async fn read_merges_into_the_sole_assigned_entry() {
    let f = standard_fixture().await;

    // The card was read before anyone registered it: the read is parked in
    // an unassigned entry.
    store_cardreader_result(&f.db, &f.cache, KEY, &card_read(CARD, clean_run()))
        .await
        .unwrap();
    let entry_id = register(&f, "Angela", "Merkel", CARD).await;
    assert_eq!(entries_of(&f).await.len(), 2);

    let (_, _, response) =
        store_cardreader_result(&f.db, &f.cache, KEY, &card_read(CARD, clean_run()))
            .await
            .unwrap();

    assert_eq!(response.first_name.as_deref(), Some("Angela"));
    assert_eq!(response.status, Some(ResultStatus::Ok));
    assert_eq!(response.time, Some(8));
    assert_eq!(response.error, None);
    assert_eq!(response.missing_controls, Some(vec![]));

    // The unassigned duplicate is gone and the registered entry carries the
    // result now.
    let entries = entries_of(&f).await;
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].id, entry_id);
    assert_eq!(entries[0].result.status, ResultStatus::Ok);
    assert_eq!(entries[0].result.time, Some(8));
}

#[tokio::test]
async fn merge_without_prior_unassigned_entry() {
    let f = standard_fixture().await;
    register(&f, "Angela", "Merkel", CARD).await;

    let (_, _, response) =
        store_cardreader_result(&f.db, &f.cache, KEY, &card_read(CARD, run_missing_102()))
            .await
            .unwrap();

    assert_eq!(response.status, Some(ResultStatus::MissingPunch));
    assert_eq!(response.missing_controls, Some(vec!["102".to_string()]));

    let entries = entries_of(&f).await;
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].result.status, ResultStatus::MissingPunch);
}

#[tokio::test]
async fn duplicate_read_of_a_stored_result_changes_nothing() {
    let f = standard_fixture().await;
    register(&f, "Angela", "Merkel", CARD).await;
    store_cardreader_result(&f.db, &f.cache, KEY, &card_read(CARD, clean_run()))
        .await
        .unwrap();
    let before = entries_of(&f).await;

    let (_, _, response) =
        store_cardreader_result(&f.db, &f.cache, KEY, &card_read(CARD, clean_run()))
            .await
            .unwrap();

    assert_eq!(response.first_name.as_deref(), Some("Angela"));
    assert_eq!(response.error, None);
    assert_eq!(response.status, Some(ResultStatus::Ok));
    assert_eq!(entries_of(&f).await, before);
}

#[tokio::test]
async fn unknown_card_is_stored_unassigned_once() {
    let f = standard_fixture().await;

    let (_, _, response) =
        store_cardreader_result(&f.db, &f.cache, KEY, &card_read("999", clean_run()))
            .await
            .unwrap();
    assert_eq!(response.error.as_deref(), Some("Control card unknown"));
    assert_eq!(entries_of(&f).await.len(), 1);

    // The identical read again: recognized, not duplicated.
    let (_, _, response) =
        store_cardreader_result(&f.db, &f.cache, KEY, &card_read("999", clean_run()))
            .await
            .unwrap();
    assert_eq!(response.error.as_deref(), Some("Control card unknown"));
    assert_eq!(entries_of(&f).await.len(), 1);
}

#[tokio::test]
async fn conflicting_read_for_an_entry_with_result_goes_unassigned() {
    let f = standard_fixture().await;
    register(&f, "Angela", "Merkel", CARD).await;
    store_cardreader_result(&f.db, &f.cache, KEY, &card_read(CARD, clean_run()))
        .await
        .unwrap();

    // A different read of the same card cannot replace the stored result.
    let (_, _, response) =
        store_cardreader_result(&f.db, &f.cache, KEY, &card_read(CARD, run_missing_102()))
            .await
            .unwrap();

    assert_eq!(
        response.error.as_deref(),
        Some("There are other results for this card")
    );
    let entries = entries_of(&f).await;
    assert_eq!(entries.len(), 2);
    let unassigned: Vec<&EntryType> = entries.iter().filter(|e| e.class_id.is_none()).collect();
    assert_eq!(unassigned.len(), 1);
}

#[tokio::test]
async fn several_registered_entries_for_one_card_are_reported() {
    let f = standard_fixture().await;
    register(&f, "Angela", "Merkel", CARD).await;
    register(&f, "Birgit", "Derkel", CARD).await;

    let (_, _, response) =
        store_cardreader_result(&f.db, &f.cache, KEY, &card_read(CARD, clean_run()))
            .await
            .unwrap();

    assert_eq!(
        response.error.as_deref(),
        Some("There are several entries for this card")
    );
    // Both registrations untouched, the read parked as unassigned.
    assert_eq!(entries_of(&f).await.len(), 3);
}

#[tokio::test]
async fn failed_ingestion_leaves_the_store_untouched() {
    let f = standard_fixture().await;
    register(&f, "Angela", "Merkel", CARD).await;
    let before = entries_of(&f).await;

    let err = store_cardreader_result(&f.db, &f.cache, "wrong", &card_read(CARD, clean_run()))
        .await
        .unwrap_err();
    assert!(matches!(err, otime_server::Error::EventNotFound(_)));

    assert_eq!(entries_of(&f).await, before);
}
