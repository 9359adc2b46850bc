//! Row types as they come out of sqlite, plus conversions into the domain
//! types. Structured columns (result, start, controls, params, fields) are
//! stored as JSON text.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use otime_types::class_params::ClassParams;
use otime_types::competitor::{CompetitorType, Gender};
use otime_types::entry::{EntryType, PersonRaceStart};
use otime_types::event::{ClassType, CourseType, EventType};
use otime_types::result::PersonRaceResult;
use otime_types::series::{SeriesMode, SeriesSettings};

use crate::error::{Error, Result};

fn parse_date(raw: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|e| Error::Validation(format!("invalid date {raw:?}: {e}")))
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct EventRow {
    pub id: i64,
    pub name: String,
    pub date: String,
    pub key: Option<String>,
    pub publish: bool,
    pub series: Option<String>,
    pub fields: String,
    pub light: bool,
    pub streaming_address: Option<String>,
    pub streaming_key: Option<String>,
    pub streaming_enabled: Option<bool>,
}

impl EventRow {
    pub fn into_event(self) -> Result<EventType> {
        Ok(EventType {
            id: self.id,
            name: self.name,
            date: parse_date(&self.date)?,
            key: self.key,
            publish: self.publish,
            series: self.series,
            fields: serde_json::from_str(&self.fields)?,
            light: self.light,
            streaming_address: self.streaming_address,
            streaming_key: self.streaming_key,
            streaming_enabled: self.streaming_enabled,
        })
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CompetitorRow {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub club_id: Option<i64>,
    pub gender: String,
    pub year: Option<i64>,
    pub chip: String,
    pub club_name: Option<String>,
}

impl CompetitorRow {
    pub fn into_competitor(self) -> CompetitorType {
        CompetitorType {
            id: self.id,
            first_name: self.first_name,
            last_name: self.last_name,
            gender: Gender::from_db(&self.gender),
            year: self.year.map(|y| y as i32),
            chip: self.chip,
            club_id: self.club_id,
            club_name: self.club_name,
        }
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CourseRow {
    pub id: i64,
    pub event_id: i64,
    pub name: String,
    pub length: Option<f64>,
    pub climb: Option<f64>,
    pub controls: String,
}

impl CourseRow {
    pub fn into_course(self) -> Result<CourseType> {
        Ok(CourseType {
            id: self.id,
            event_id: self.event_id,
            name: self.name,
            length: self.length,
            climb: self.climb,
            controls: serde_json::from_str(&self.controls)?,
        })
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ClassRow {
    pub id: i64,
    pub event_id: i64,
    pub name: String,
    pub short_name: Option<String>,
    pub course_id: Option<i64>,
    pub params: String,
}

impl ClassRow {
    pub fn into_class(self) -> Result<ClassType> {
        let params: ClassParams = serde_json::from_str(&self.params)?;
        Ok(ClassType {
            id: self.id,
            event_id: self.event_id,
            name: self.name,
            short_name: self.short_name,
            course_id: self.course_id,
            params,
        })
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct EntryRow {
    pub id: i64,
    pub event_id: i64,
    pub competitor_id: Option<i64>,
    pub class_id: Option<i64>,
    pub club_id: Option<i64>,
    pub not_competing: bool,
    pub chip: String,
    pub fields: String,
    pub result: String,
    pub start: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub gender: Option<String>,
    pub year: Option<i64>,
    pub class_name: Option<String>,
    pub club_name: Option<String>,
}

impl EntryRow {
    pub fn into_entry(self) -> Result<EntryType> {
        let fields: BTreeMap<usize, String> = serde_json::from_str(&self.fields)?;
        let result: PersonRaceResult = serde_json::from_str(&self.result)?;
        let start: PersonRaceStart = serde_json::from_str(&self.start)?;
        Ok(EntryType {
            id: self.id,
            event_id: self.event_id,
            competitor_id: self.competitor_id,
            first_name: self.first_name,
            last_name: self.last_name,
            gender: self.gender.as_deref().and_then(Gender::from_db),
            year: self.year.map(|y| y as i32),
            class_id: self.class_id,
            class_name: self.class_name,
            club_id: self.club_id,
            club_name: self.club_name,
            not_competing: self.not_competing,
            chip: self.chip,
            fields,
            result,
            start,
        })
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct SeriesSettingsRow {
    pub name: String,
    pub nr_of_best_results: i64,
    pub mode: String,
    pub maximum_points: i64,
    pub decimal_places: i64,
}

impl SeriesSettingsRow {
    pub fn into_settings(self) -> Result<SeriesSettings> {
        let mode = match self.mode.as_str() {
            "Proportional 1" => SeriesMode::Proportional1,
            "Proportional 2" => SeriesMode::Proportional2,
            "Place" => SeriesMode::Place,
            other => {
                return Err(Error::Validation(format!("unknown series mode {other:?}")));
            }
        };
        Ok(SeriesSettings {
            name: self.name,
            nr_of_best_results: self.nr_of_best_results as usize,
            mode,
            maximum_points: self.maximum_points,
            decimal_places: self.decimal_places as u32,
        })
    }
}

pub fn series_mode_str(mode: SeriesMode) -> &'static str {
    match mode {
        SeriesMode::Proportional1 => "Proportional 1",
        SeriesMode::Proportional2 => "Proportional 2",
        SeriesMode::Place => "Place",
    }
}
