//! `add_or_update_entry`: competitor reconciliation, result transfer and
//! the constraint-error re-probing.

mod common;

use common::*;
use otime_server::cache::ResultCache;
use otime_server::db::TransactionMode;
use otime_server::db::queries;
use otime_server::model::entries::{EntryUpsert, add_or_update_entry};
use otime_server::model::{events, registry};
use otime_server::Error;
use otime_types::entry::PersonRaceStart;
use otime_types::result::{ResultStatus, SplitStatus};

struct Fixture {
    db: otime_server::Database,
    cache: ResultCache,
    event_id: i64,
    class_id: i64,
}

async fn fixture() -> Fixture {
    let db = test_db().await;
    let cache = ResultCache::new();
    let event = create_event(&db, &cache, "Event", "key-1", false).await;
    let course_id = create_course(&db, &cache, event.id, "Bahn A", &["101", "102", "103"]).await;
    let class_id = create_class(&db, &cache, event.id, "Elite", Some(course_id)).await;
    Fixture {
        db,
        cache,
        event_id: event.id,
        class_id,
    }
}

#[tokio::test]
async fn a_new_competitor_is_created_with_the_entry() {
    let f = fixture().await;

    let (id, promoted) = add_or_update_entry(
        &f.db,
        &f.cache,
        entry_upsert(f.event_id, f.class_id, "Angela", "Merkel", "4748495"),
    )
    .await
    .unwrap();
    assert!(!promoted);

    let mut tx = f.db.begin(TransactionMode::Deferred).await.unwrap();
    let competitors = queries::competitors::get_competitors(&mut tx).await.unwrap();
    assert_eq!(competitors.len(), 1);
    assert_eq!(competitors[0].last_name, "Merkel");
    assert_eq!(competitors[0].chip, "4748495");

    let entries = queries::entries::get_entries(&mut tx, f.event_id).await.unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].id, id);
    assert_eq!(entries[0].class_name.as_deref(), Some("Elite"));
    assert_eq!(entries[0].result.status, ResultStatus::Inactive);
    // A registered entry without punches shows every control missing.
    let statuses: Vec<SplitStatus> = entries[0]
        .result
        .split_times
        .iter()
        .map(|sp| sp.status)
        .collect();
    assert_eq!(
        statuses,
        vec![SplitStatus::Missing, SplitStatus::Missing, SplitStatus::Missing]
    );
}

#[tokio::test]
async fn an_existing_competitors_chip_and_club_are_kept() {
    let f = fixture().await;
    let club_id = registry::add_club(&f.db, "OL Bundestag").await.unwrap();
    let competitor_id = registry::add_competitor(
        &f.db,
        "Angela",
        "Merkel",
        Some(club_id),
        None,
        Some(1957),
        "1234567",
    )
    .await
    .unwrap();

    let mut req = entry_upsert(f.event_id, f.class_id, "Angela", "Merkel", "4748495");
    req.competitor_id = Some(competitor_id);
    add_or_update_entry(&f.db, &f.cache, req).await.unwrap();

    let mut tx = f.db.begin(TransactionMode::Deferred).await.unwrap();
    let competitor = queries::competitors::get_competitor(&mut tx, competitor_id)
        .await
        .unwrap();
    // The competitor's registered chip and club win over the submission.
    assert_eq!(competitor.chip, "1234567");
    assert_eq!(competitor.club_id, Some(club_id));

    let entries = queries::entries::get_entries(&mut tx, f.event_id).await.unwrap();
    assert_eq!(entries[0].chip, "4748495");
}

#[tokio::test]
async fn an_undefined_chip_and_club_are_filled_from_the_submission() {
    let f = fixture().await;
    let club_id = registry::add_club(&f.db, "OL Bundestag").await.unwrap();
    let competitor_id = registry::add_competitor(&f.db, "Angela", "Merkel", None, None, None, "")
        .await
        .unwrap();

    let mut req = entry_upsert(f.event_id, f.class_id, "Angela", "Merkel", "4748495");
    req.competitor_id = Some(competitor_id);
    req.club_id = Some(club_id);
    add_or_update_entry(&f.db, &f.cache, req).await.unwrap();

    let mut tx = f.db.begin(TransactionMode::Deferred).await.unwrap();
    let competitor = queries::competitors::get_competitor(&mut tx, competitor_id)
        .await
        .unwrap();
    assert_eq!(competitor.chip, "4748495");
    assert_eq!(competitor.club_id, Some(club_id));
}

#[tokio::test]
async fn a_second_registration_is_promoted_to_not_competing() {
    for (first_nc, second_nc) in [(false, false), (false, true), (true, false), (true, true)] {
        let f = fixture().await;

        let mut req = entry_upsert(f.event_id, f.class_id, "Angela", "Merkel", "4748495");
        req.not_competing = first_nc;
        let (_, promoted) = add_or_update_entry(&f.db, &f.cache, req).await.unwrap();
        assert!(!promoted);

        let mut req = entry_upsert(f.event_id, f.class_id, "Angela", "Merkel", "4748495");
        req.not_competing = second_nc;
        let (_, promoted) = add_or_update_entry(&f.db, &f.cache, req).await.unwrap();
        assert_eq!(promoted, !second_nc);

        let mut tx = f.db.begin(TransactionMode::Deferred).await.unwrap();
        let entries = queries::entries::get_entries(&mut tx, f.event_id).await.unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].not_competing, first_nc);
        assert!(entries[1].not_competing);
    }
}

/// An unassigned entry carrying a full card read, as the reader leaves it
/// behind.
async fn unassigned_read(f: &Fixture, chip: &str) -> i64 {
    let computed = otime_engine::compute_result(
        &clean_run(),
        &[],
        &otime_types::class_params::ClassParams::default(),
        None,
        None,
        None,
    );
    let mut tx = f.db.begin(TransactionMode::Immediate).await.unwrap();
    let id = queries::entries::add_entry_result(
        &mut tx,
        f.event_id,
        chip,
        &computed,
        &PersonRaceStart::default(),
    )
    .await
    .unwrap();
    tx.commit().await.unwrap();
    id
}

#[tokio::test]
async fn creating_an_entry_can_consume_an_unassigned_result() {
    let f = fixture().await;
    let result_entry = unassigned_read(&f, "4748495").await;

    let mut req = entry_upsert(f.event_id, f.class_id, "Angela", "Merkel", "4711");
    req.result_id = Some(result_entry);
    let (id, _) = add_or_update_entry(&f.db, &f.cache, req).await.unwrap();

    let mut tx = f.db.begin(TransactionMode::Deferred).await.unwrap();
    let entries = queries::entries::get_entries(&mut tx, f.event_id).await.unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].id, id);
    // Chip and result travel from the consumed entry.
    assert_eq!(entries[0].chip, "4748495");
    assert_eq!(entries[0].result.status, ResultStatus::Ok);
    assert_eq!(entries[0].result.time, Some(8));
}

#[tokio::test]
async fn clearing_a_result_stores_it_as_a_new_unassigned_entry() {
    let f = fixture().await;
    let result_entry = unassigned_read(&f, "4748495").await;
    let mut req = entry_upsert(f.event_id, f.class_id, "Angela", "Merkel", "4711");
    req.result_id = Some(result_entry);
    let (id, _) = add_or_update_entry(&f.db, &f.cache, req).await.unwrap();

    let mut req = entry_upsert(f.event_id, f.class_id, "Angela", "Merkel", "4748495");
    req.id = Some(id);
    req.status = ResultStatus::MissingPunch;
    req.result_id = Some(-1);
    add_or_update_entry(&f.db, &f.cache, req).await.unwrap();

    let mut tx = f.db.begin(TransactionMode::Deferred).await.unwrap();
    let entries = queries::entries::get_entries(&mut tx, f.event_id).await.unwrap();
    assert_eq!(entries.len(), 2);

    // The removed result lives on, restored to its raw card state.
    let unassigned = entries.iter().find(|e| e.competitor_id.is_none()).unwrap();
    assert_eq!(unassigned.result.status, ResultStatus::Finished);
    assert_eq!(unassigned.result.time, Some(8));
    assert!(unassigned
        .result
        .split_times
        .iter()
        .all(|sp| sp.status == SplitStatus::Additional));

    // The entry itself is back to an empty result; the unchanged submitted
    // status does not stick to it.
    let entry = entries.iter().find(|e| e.id == id).unwrap();
    assert_eq!(entry.result.status, ResultStatus::Inactive);
    assert!(entry.result.split_times.iter().all(|sp| sp.status == SplitStatus::Missing));
}

#[tokio::test]
async fn clearing_a_result_keeps_a_disqualification() {
    let f = fixture().await;
    let result_entry = unassigned_read(&f, "4748495").await;
    let mut req = entry_upsert(f.event_id, f.class_id, "Angela", "Merkel", "4711");
    req.result_id = Some(result_entry);
    let (id, _) = add_or_update_entry(&f.db, &f.cache, req).await.unwrap();

    let mut req = entry_upsert(f.event_id, f.class_id, "Angela", "Merkel", "4748495");
    req.id = Some(id);
    req.status = ResultStatus::Disqualified;
    req.result_id = Some(-1);
    add_or_update_entry(&f.db, &f.cache, req).await.unwrap();

    let mut tx = f.db.begin(TransactionMode::Deferred).await.unwrap();
    let entry = queries::entries::get_entry(&mut tx, id).await.unwrap();
    assert_eq!(entry.result.status, ResultStatus::Disqualified);
}

#[tokio::test]
async fn status_only_updates_mark_a_no_show() {
    let f = fixture().await;
    let (id, _) = add_or_update_entry(
        &f.db,
        &f.cache,
        entry_upsert(f.event_id, f.class_id, "Angela", "Merkel", ""),
    )
    .await
    .unwrap();

    let mut req = entry_upsert(f.event_id, f.class_id, "Angela", "Merkel", "");
    req.id = Some(id);
    req.status = ResultStatus::DidNotStart;
    add_or_update_entry(&f.db, &f.cache, req).await.unwrap();

    let mut tx = f.db.begin(TransactionMode::Deferred).await.unwrap();
    let entry = queries::entries::get_entry(&mut tx, id).await.unwrap();
    assert_eq!(entry.result.status, ResultStatus::DidNotStart);
    assert_eq!(entry.result.split_times.len(), 3);
}

#[tokio::test]
async fn a_vanished_event_is_reported() {
    let f = fixture().await;
    events::delete_event(&f.db, &f.cache, f.event_id).await.unwrap();

    let err = add_or_update_entry(
        &f.db,
        &f.cache,
        entry_upsert(f.event_id, f.class_id, "Angela", "Merkel", ""),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, Error::EventNotFound(_)));
}

#[tokio::test]
async fn a_vanished_class_is_reported() {
    let f = fixture().await;
    // Create then delete a second class; the course keeps the first alive.
    let other = create_class(&f.db, &f.cache, f.event_id, "Open", None).await;
    registry::delete_class(&f.db, &f.cache, f.event_id, other).await.unwrap();

    let err = add_or_update_entry(
        &f.db,
        &f.cache,
        entry_upsert(f.event_id, other, "Angela", "Merkel", ""),
    )
    .await
    .unwrap_err();
    assert_eq!(err.to_string(), "Class deleted");
}

#[tokio::test]
async fn a_vanished_club_is_reported() {
    let f = fixture().await;
    let club_id = registry::add_club(&f.db, "OL Bundestag").await.unwrap();
    registry::delete_club(&f.db, club_id).await.unwrap();

    let mut req = entry_upsert(f.event_id, f.class_id, "Angela", "Merkel", "");
    req.club_id = Some(club_id);
    let err = add_or_update_entry(&f.db, &f.cache, req).await.unwrap_err();
    assert_eq!(err.to_string(), "Club deleted");
}

#[tokio::test]
async fn a_vanished_competitor_is_reported() {
    let f = fixture().await;
    let competitor_id = registry::add_competitor(&f.db, "Angela", "Merkel", None, None, None, "")
        .await
        .unwrap();
    registry::delete_competitor(&f.db, competitor_id).await.unwrap();

    let mut req = entry_upsert(f.event_id, f.class_id, "Angela", "Merkel", "");
    req.competitor_id = Some(competitor_id);
    let err = add_or_update_entry(&f.db, &f.cache, req).await.unwrap_err();
    assert_eq!(err.to_string(), "Competitor deleted");
}

#[tokio::test]
async fn a_vanished_entry_is_reported() {
    let f = fixture().await;
    let (id, _) = add_or_update_entry(
        &f.db,
        &f.cache,
        entry_upsert(f.event_id, f.class_id, "Angela", "Merkel", ""),
    )
    .await
    .unwrap();
    otime_server::model::entries::delete_entry(&f.db, &f.cache, id).await.unwrap();

    let mut req = entry_upsert(f.event_id, f.class_id, "Angela", "Merkel", "");
    req.id = Some(id);
    let err = add_or_update_entry(&f.db, &f.cache, req).await.unwrap_err();
    assert_eq!(err.to_string(), "Entry deleted");
}

#[tokio::test]
async fn a_vanished_result_entry_is_reported_and_nothing_is_committed() {
    let f = fixture().await;
    let result_entry = unassigned_read(&f, "4748495").await;
    otime_server::model::entries::delete_entry(&f.db, &f.cache, result_entry)
        .await
        .unwrap();

    let mut req = entry_upsert(f.event_id, f.class_id, "Angela", "Merkel", "4711");
    req.result_id = Some(result_entry);
    let err = add_or_update_entry(&f.db, &f.cache, req).await.unwrap_err();
    assert_eq!(err.to_string(), "Result deleted");

    // The failed mutation rolled back completely: no entry, no competitor.
    let mut tx = f.db.begin(TransactionMode::Deferred).await.unwrap();
    assert!(queries::entries::get_entries(&mut tx, f.event_id).await.unwrap().is_empty());
    assert!(queries::competitors::get_competitors(&mut tx).await.unwrap().is_empty());
}

#[tokio::test]
async fn renaming_onto_an_existing_competitor_is_rejected() {
    let f = fixture().await;
    registry::add_competitor(&f.db, "Birgit", "Merkel", None, None, Some(1957), "1234567")
        .await
        .unwrap();
    let (id, _) = add_or_update_entry(
        &f.db,
        &f.cache,
        entry_upsert(f.event_id, f.class_id, "Angela", "Merkel", "4748495"),
    )
    .await
    .unwrap();

    let mut req = entry_upsert(f.event_id, f.class_id, "Birgit", "Merkel", "4748495");
    req.id = Some(id);
    let err = add_or_update_entry(&f.db, &f.cache, req).await.unwrap_err();
    assert_eq!(err.to_string(), "Competitor already exist");
}

#[tokio::test]
async fn the_store_refuses_a_second_competing_entry() {
    let f = fixture().await;
    let competitor_id = registry::add_competitor(&f.db, "Angela", "Merkel", None, None, None, "")
        .await
        .unwrap();

    let mut tx = f.db.begin(TransactionMode::Immediate).await.unwrap();
    queries::entries::add_entry(
        &mut tx,
        f.event_id,
        Some(competitor_id),
        Some(f.class_id),
        None,
        false,
        "",
        &Default::default(),
        &Default::default(),
        &Default::default(),
    )
    .await
    .unwrap();
    let err = queries::entries::add_entry(
        &mut tx,
        f.event_id,
        Some(competitor_id),
        Some(f.class_id),
        None,
        false,
        "",
        &Default::default(),
        &Default::default(),
        &Default::default(),
    )
    .await
    .unwrap_err();
    assert_eq!(err.to_string(), "Competitor already registered for this event");
}
