use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// How per-event points are derived from race times.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SeriesMode {
    #[serde(rename = "Proportional 1")]
    Proportional1,
    #[serde(rename = "Proportional 2")]
    Proportional2,
    Place,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesSettings {
    pub name: String,
    /// Only the best n per-event scores count towards the total.
    pub nr_of_best_results: usize,
    pub mode: SeriesMode,
    pub maximum_points: i64,
    pub decimal_places: u32,
}

impl Default for SeriesSettings {
    fn default() -> Self {
        SeriesSettings {
            name: String::new(),
            nr_of_best_results: 2,
            mode: SeriesMode::Proportional1,
            maximum_points: 100,
            decimal_places: 2,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Points {
    pub points: Decimal,
}

impl Points {
    pub fn new(points: Decimal) -> Self {
        Points { points }
    }
}

/// One competitor's standing in the series ranking of a class.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonSeriesResult {
    pub first_name: String,
    pub last_name: String,
    pub year: Option<i32>,
    pub club_name: Option<String>,
    /// Per-event points keyed by the index into the series event list.
    pub races: BTreeMap<usize, Points>,
    pub total_points: Decimal,
    pub rank: Option<u32>,
}
