//! Thin orchestration around the club, competitor, course and class tables.
//! Course and class changes invalidate the owning event's cached results;
//! competitor and club renames can affect any event.

use otime_types::class_params::ClassParams;
use otime_types::competitor::{ClubType, CompetitorType, Gender};
use otime_types::event::{ClassType, CourseType};

use crate::cache::ResultCache;
use crate::db::{Database, TransactionMode, queries};
use crate::error::Result;

pub async fn get_clubs(db: &Database) -> Result<Vec<ClubType>> {
    let mut tx = db.begin(TransactionMode::Deferred).await?;
    let clubs = queries::clubs::get_clubs(&mut tx).await?;
    tx.commit().await?;
    Ok(clubs)
}

pub async fn add_club(db: &Database, name: &str) -> Result<i64> {
    let mut tx = db.begin(TransactionMode::Immediate).await?;
    let id = queries::clubs::add_club(&mut tx, name).await?;
    tx.commit().await?;
    Ok(id)
}

pub async fn update_club(db: &Database, cache: &ResultCache, id: i64, name: &str) -> Result<()> {
    let mut tx = db.begin(TransactionMode::Immediate).await?;
    queries::clubs::update_club(&mut tx, id, name).await?;
    tx.commit().await?;
    cache.clear(None);
    Ok(())
}

pub async fn delete_club(db: &Database, id: i64) -> Result<()> {
    let mut tx = db.begin(TransactionMode::Immediate).await?;
    queries::clubs::delete_club(&mut tx, id).await?;
    tx.commit().await?;
    Ok(())
}

pub async fn get_competitors(db: &Database) -> Result<Vec<CompetitorType>> {
    let mut tx = db.begin(TransactionMode::Deferred).await?;
    let competitors = queries::competitors::get_competitors(&mut tx).await?;
    tx.commit().await?;
    Ok(competitors)
}

pub async fn add_competitor(
    db: &Database,
    first_name: &str,
    last_name: &str,
    club_id: Option<i64>,
    gender: Option<Gender>,
    year: Option<i32>,
    chip: &str,
) -> Result<i64> {
    let mut tx = db.begin(TransactionMode::Immediate).await?;
    let id = queries::competitors::add_competitor(
        &mut tx, first_name, last_name, club_id, gender, year, chip,
    )
    .await?;
    tx.commit().await?;
    Ok(id)
}

#[allow(clippy::too_many_arguments)]
pub async fn update_competitor(
    db: &Database,
    cache: &ResultCache,
    id: i64,
    first_name: &str,
    last_name: &str,
    gender: Option<Gender>,
    year: Option<i32>,
    club_id: Option<i64>,
    chip: &str,
) -> Result<()> {
    let mut tx = db.begin(TransactionMode::Immediate).await?;
    queries::competitors::update_competitor(
        &mut tx, id, first_name, last_name, gender, year, club_id, chip,
    )
    .await?;
    tx.commit().await?;
    cache.clear(None);
    Ok(())
}

pub async fn delete_competitor(db: &Database, id: i64) -> Result<()> {
    let mut tx = db.begin(TransactionMode::Immediate).await?;
    queries::competitors::delete_competitor(&mut tx, id).await?;
    tx.commit().await?;
    Ok(())
}

pub async fn get_courses(db: &Database, event_id: i64) -> Result<Vec<CourseType>> {
    let mut tx = db.begin(TransactionMode::Deferred).await?;
    let courses = queries::courses::get_courses(&mut tx, event_id).await?;
    tx.commit().await?;
    Ok(courses)
}

pub async fn add_course(
    db: &Database,
    cache: &ResultCache,
    event_id: i64,
    name: &str,
    length: Option<f64>,
    climb: Option<f64>,
    controls: Vec<String>,
) -> Result<i64> {
    let mut tx = db.begin(TransactionMode::Immediate).await?;
    queries::events::get_event(&mut tx, event_id).await?;
    let id = queries::courses::add_course(&mut tx, event_id, name, length, climb, &controls).await?;
    tx.commit().await?;
    cache.clear(Some(event_id));
    Ok(id)
}

#[allow(clippy::too_many_arguments)]
pub async fn update_course(
    db: &Database,
    cache: &ResultCache,
    event_id: i64,
    id: i64,
    name: &str,
    length: Option<f64>,
    climb: Option<f64>,
    controls: Vec<String>,
) -> Result<()> {
    let mut tx = db.begin(TransactionMode::Immediate).await?;
    queries::courses::update_course(&mut tx, id, name, length, climb, &controls).await?;
    tx.commit().await?;
    cache.clear(Some(event_id));
    Ok(())
}

pub async fn delete_course(db: &Database, cache: &ResultCache, event_id: i64, id: i64) -> Result<()> {
    let mut tx = db.begin(TransactionMode::Immediate).await?;
    queries::courses::delete_course(&mut tx, id).await?;
    tx.commit().await?;
    cache.clear(Some(event_id));
    Ok(())
}

pub async fn get_classes(db: &Database, event_id: i64) -> Result<Vec<ClassType>> {
    let mut tx = db.begin(TransactionMode::Deferred).await?;
    let classes = queries::classes::get_classes(&mut tx, event_id).await?;
    tx.commit().await?;
    Ok(classes)
}

pub async fn add_class(
    db: &Database,
    cache: &ResultCache,
    event_id: i64,
    name: &str,
    short_name: Option<&str>,
    course_id: Option<i64>,
    params: ClassParams,
) -> Result<i64> {
    let mut tx = db.begin(TransactionMode::Immediate).await?;
    queries::events::get_event(&mut tx, event_id).await?;
    let id =
        queries::classes::add_class(&mut tx, event_id, name, short_name, course_id, &params).await?;
    tx.commit().await?;
    cache.clear(Some(event_id));
    Ok(id)
}

#[allow(clippy::too_many_arguments)]
pub async fn update_class(
    db: &Database,
    cache: &ResultCache,
    event_id: i64,
    id: i64,
    name: &str,
    short_name: Option<&str>,
    course_id: Option<i64>,
    params: ClassParams,
) -> Result<()> {
    let mut tx = db.begin(TransactionMode::Immediate).await?;
    queries::classes::update_class(&mut tx, id, name, short_name, course_id, &params).await?;
    tx.commit().await?;
    cache.clear(Some(event_id));
    Ok(())
}

pub async fn delete_class(db: &Database, cache: &ResultCache, event_id: i64, id: i64) -> Result<()> {
    let mut tx = db.begin(TransactionMode::Immediate).await?;
    queries::classes::delete_class(&mut tx, id).await?;
    tx.commit().await?;
    cache.clear(Some(event_id));
    Ok(())
}
