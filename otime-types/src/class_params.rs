use serde::{Deserialize, Serialize};

/// Pseudo control code marking the course start in voided-leg definitions.
pub const COURSE_START: &str = "S";
/// Pseudo control code marking the finish in voided-leg definitions.
pub const COURSE_FINISH: &str = "F";

/// Course topology: how punches are matched against the expected controls.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Otype {
    /// Controls must be visited in course order.
    #[default]
    Standard,
    /// Controls may be visited in any order.
    Net,
    /// Score-O: each visited control counts, deductions for misses and overtime.
    Score,
}

/// A course leg that does not count towards the total time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoidedLeg {
    pub from_control: String,
    pub to_control: String,
}

impl VoidedLeg {
    pub fn new(from_control: impl Into<String>, to_control: impl Into<String>) -> Self {
        VoidedLeg {
            from_control: from_control.into(),
            to_control: to_control.into(),
        }
    }
}

/// Scoring configuration of a class; fully determines result semantics.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClassParams {
    #[serde(default)]
    pub otype: Otype,
    #[serde(default)]
    pub voided_legs: Vec<VoidedLeg>,
    /// Score-O: points deducted per missing control.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub penalty_controls: Option<i64>,
    /// Score-O: points deducted per started minute over the time limit.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub penalty_overtime: Option<i64>,
    /// Time limit in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_limit: Option<i64>,
    /// Scale total times by the age/gender handicap factor.
    #[serde(default)]
    pub apply_handicap: bool,
}
