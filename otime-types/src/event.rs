use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::class_params::ClassParams;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventType {
    pub id: i64,
    pub name: String,
    pub date: NaiveDate,
    /// Routing key matched against incoming card-reader connections.
    /// Events without a key never receive card reads.
    pub key: Option<String>,
    pub publish: bool,
    /// Series tag; events carrying one take part in the season standing.
    pub series: Option<String>,
    /// Names of the custom entry columns of this event.
    pub fields: Vec<String>,
    /// Light events auto-register unknown cards against a uniquely matching course.
    pub light: bool,
    pub streaming_address: Option<String>,
    pub streaming_key: Option<String>,
    pub streaming_enabled: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CourseType {
    pub id: i64,
    pub event_id: i64,
    pub name: String,
    pub length: Option<f64>,
    pub climb: Option<f64>,
    /// Expected control codes in course order.
    pub controls: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassType {
    pub id: i64,
    pub event_id: i64,
    pub name: String,
    pub short_name: Option<String>,
    pub course_id: Option<i64>,
    pub params: ClassParams,
}
