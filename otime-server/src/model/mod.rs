//! Orchestration: transactional use-cases built from store queries and the
//! pure result engine. Every mutation runs inside one IMMEDIATE transaction
//! and invalidates the result cache only after the commit.

pub mod cardreader;
pub mod entries;
pub mod events;
pub mod registry;
pub mod results;

use otime_types::class_params::ClassParams;
use sqlx::SqliteConnection;

use crate::db::queries;
use crate::error::Result;

/// Resolve the expected controls and scoring params of a class. A missing
/// class, a class without a course or a vanished course all degrade to an
/// empty course with default params, so a result can always be stored.
pub(crate) async fn class_controls(
    conn: &mut SqliteConnection,
    class_id: Option<i64>,
) -> Result<(Vec<String>, ClassParams)> {
    let Some(class_id) = class_id else {
        return Ok((Vec::new(), ClassParams::default()));
    };
    let class = match queries::classes::get_class(conn, class_id).await {
        Ok(class) => class,
        Err(e) if e.is_not_found() => return Ok((Vec::new(), ClassParams::default())),
        Err(e) => return Err(e),
    };
    let Some(course_id) = class.course_id else {
        return Ok((Vec::new(), ClassParams::default()));
    };
    match queries::courses::get_course(conn, course_id).await {
        Ok(course) => Ok((course.controls, class.params)),
        Err(e) if e.is_not_found() => Ok((Vec::new(), ClassParams::default())),
        Err(e) => Err(e),
    }
}
