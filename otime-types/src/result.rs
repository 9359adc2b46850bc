use chrono::{DateTime, Timelike, Utc};
use serde::{Deserialize, Serialize};

/// Overall race status of a competitor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ResultStatus {
    /// Entry exists but the competitor has not started.
    #[default]
    Inactive,
    /// Competitor is out on the course.
    Active,
    /// Card has been read but the result is not classified yet.
    Finished,
    Ok,
    MissingPunch,
    DidNotStart,
    DidNotFinish,
    Disqualified,
    OverTime,
}

impl ResultStatus {
    /// Terminal statuses set by an operator; the engine never overrides them.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            ResultStatus::DidNotStart | ResultStatus::DidNotFinish | ResultStatus::Disqualified
        )
    }
}

/// Classification of a single split row.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SplitStatus {
    Ok,
    Missing,
    #[default]
    Additional,
    OkButUnordered,
}

/// A punch timestamp. Cards occasionally record a punch without a readable
/// clock value; that case is the distinguished `NoTime` variant, not a magic
/// timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PunchTime {
    NoTime,
    Known(DateTime<Utc>),
}

impl PunchTime {
    pub fn known(self) -> Option<DateTime<Utc>> {
        match self {
            PunchTime::Known(t) => Some(t),
            PunchTime::NoTime => None,
        }
    }
}

/// One row of the split table: a punch, a missing control, or an extra punch.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SplitTime {
    pub control_code: String,
    /// The punch used for classification; cleared when an operator removes it.
    #[serde(default)]
    pub punch_time: Option<PunchTime>,
    /// The punch as it was read from the card, never edited.
    #[serde(default)]
    pub si_punch_time: Option<PunchTime>,
    /// Seconds since the effective start, when both clocks are known.
    #[serde(default)]
    pub time: Option<i64>,
    #[serde(default)]
    pub status: SplitStatus,
    #[serde(default)]
    pub leg_voided: bool,
}

impl SplitTime {
    /// A row for an expected control without any matching punch.
    pub fn missing(control_code: impl Into<String>) -> Self {
        SplitTime {
            control_code: control_code.into(),
            status: SplitStatus::Missing,
            ..SplitTime::default()
        }
    }
}

/// Secondary result values that only exist for some scoring modes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Extensions {
    /// Raw running time in seconds when `time` carries a handicap-adjusted value.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub running_time: Option<i64>,
    /// Score-O total after deductions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub penalties_controls: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub penalties_overtime: Option<f64>,
}

/// The full computed race result of one entry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PersonRaceResult {
    #[serde(default)]
    pub status: ResultStatus,
    /// Effective start: the scheduled start when one applies, else the punched start.
    #[serde(default)]
    pub start_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub finish_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub punched_clear_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub punched_check_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub punched_start_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub punched_finish_time: Option<DateTime<Utc>>,
    /// Start/finish exactly as read from the card, never edited.
    #[serde(default)]
    pub si_punched_start_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub si_punched_finish_time: Option<DateTime<Utc>>,
    /// Total time in whole seconds, after voided legs and handicap.
    #[serde(default)]
    pub time: Option<i64>,
    #[serde(default)]
    pub split_times: Vec<SplitTime>,
    #[serde(default)]
    pub extensions: Extensions,
}

impl PersonRaceResult {
    /// True when the result carries any real punch data.
    pub fn has_punches(&self) -> bool {
        self.punched_start_time.is_some()
            || self.punched_finish_time.is_some()
            || self.split_times.iter().any(|sp| sp.punch_time.is_some())
    }

    /// Two results are SI-equivalent when the card-recorded start, finish and
    /// the multiset of `(control, si punch time)` pairs are all equal. Edits
    /// made by an operator do not change SI equivalence.
    pub fn same_si_punches(&self, other: &PersonRaceResult) -> bool {
        if self.si_punched_start_time != other.si_punched_start_time
            || self.si_punched_finish_time != other.si_punched_finish_time
        {
            return false;
        }
        fn si_pairs(result: &PersonRaceResult) -> Vec<(&str, PunchTime)> {
            let mut pairs: Vec<(&str, PunchTime)> = result
                .split_times
                .iter()
                .filter_map(|sp| sp.si_punch_time.map(|t| (sp.control_code.as_str(), t)))
                .collect();
            pairs.sort();
            pairs
        }
        si_pairs(self) == si_pairs(other)
    }

    /// Restore the result to the raw card state, discarding all operator
    /// edits and computed values. The outcome is what a fresh read of the
    /// same card would have produced.
    pub fn reset(&self) -> PersonRaceResult {
        PersonRaceResult {
            status: ResultStatus::Finished,
            start_time: None,
            finish_time: None,
            punched_clear_time: self.punched_clear_time,
            punched_check_time: self.punched_check_time,
            punched_start_time: self.si_punched_start_time,
            punched_finish_time: self.si_punched_finish_time,
            si_punched_start_time: self.si_punched_start_time,
            si_punched_finish_time: self.si_punched_finish_time,
            time: None,
            split_times: self
                .split_times
                .iter()
                .filter(|sp| sp.si_punch_time.is_some())
                .map(|sp| SplitTime {
                    control_code: sp.control_code.clone(),
                    punch_time: sp.si_punch_time,
                    si_punch_time: sp.si_punch_time,
                    ..SplitTime::default()
                })
                .collect(),
            extensions: Extensions::default(),
        }
    }
}

/// Whole seconds between two timestamps, sub-second parts truncated on both
/// sides so that split and total times line up with wall-clock punches.
pub fn seconds_between(from: DateTime<Utc>, to: DateTime<Utc>) -> i64 {
    let from = from.with_nanosecond(0).unwrap_or(from);
    let to = to.with_nanosecond(0).unwrap_or(to);
    (to - from).num_seconds()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ts(secs: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2015, 1, 1, 12, 39, secs).unwrap()
    }

    fn punched(code: &str, t: DateTime<Utc>) -> SplitTime {
        SplitTime {
            control_code: code.into(),
            punch_time: Some(PunchTime::Known(t)),
            si_punch_time: Some(PunchTime::Known(t)),
            ..SplitTime::default()
        }
    }

    #[test]
    fn si_equivalence_ignores_punch_order() {
        let a = PersonRaceResult {
            split_times: vec![punched("101", ts(1)), punched("102", ts(3))],
            ..PersonRaceResult::default()
        };
        let b = PersonRaceResult {
            split_times: vec![punched("102", ts(3)), punched("101", ts(1))],
            ..PersonRaceResult::default()
        };
        assert!(a.same_si_punches(&b));
    }

    #[test]
    fn si_equivalence_ignores_operator_edits() {
        let a = PersonRaceResult {
            split_times: vec![punched("101", ts(1))],
            ..PersonRaceResult::default()
        };
        let mut b = a.clone();
        // Operator replaced the used punch time; the card record is untouched.
        b.split_times[0].punch_time = Some(PunchTime::Known(ts(9)));
        assert!(a.same_si_punches(&b));

        // A row that only exists through an edit has no SI punch and is ignored.
        b.split_times.push(SplitTime {
            control_code: "200".into(),
            punch_time: Some(PunchTime::Known(ts(10))),
            ..SplitTime::default()
        });
        assert!(a.same_si_punches(&b));
    }

    #[test]
    fn si_equivalence_checks_start_and_finish() {
        let a = PersonRaceResult {
            si_punched_start_time: Some(ts(0)),
            ..PersonRaceResult::default()
        };
        let b = PersonRaceResult::default();
        assert!(!a.same_si_punches(&b));
    }

    #[test]
    fn reset_restores_the_card_state() {
        let result = PersonRaceResult {
            status: ResultStatus::MissingPunch,
            start_time: Some(ts(0)),
            finish_time: Some(ts(7)),
            punched_start_time: Some(ts(0)),
            punched_finish_time: Some(ts(7)),
            si_punched_start_time: Some(ts(0)),
            si_punched_finish_time: None,
            time: Some(7),
            split_times: vec![
                // Added by an operator, not on the card.
                SplitTime {
                    control_code: "101".into(),
                    punch_time: Some(PunchTime::Known(ts(1))),
                    ..SplitTime::default()
                },
                punched("103", ts(5)),
                SplitTime::missing("102"),
            ],
            ..PersonRaceResult::default()
        };

        let raw = result.reset();
        assert_eq!(raw.status, ResultStatus::Finished);
        assert_eq!(raw.punched_start_time, Some(ts(0)));
        assert_eq!(raw.punched_finish_time, None);
        assert_eq!(raw.time, None);
        assert_eq!(raw.split_times, vec![punched("103", ts(5))]);
    }

    #[test]
    fn has_punches_ignores_missing_rows() {
        let registered_only = PersonRaceResult {
            split_times: vec![SplitTime::missing("101"), SplitTime::missing("102")],
            ..PersonRaceResult::default()
        };
        assert!(!registered_only.has_punches());

        let read_out = PersonRaceResult {
            punched_finish_time: Some(ts(7)),
            ..PersonRaceResult::default()
        };
        assert!(read_out.has_punches());
    }

    #[test]
    fn seconds_between_truncates_subseconds() {
        let a = ts(0).with_nanosecond(900_000_000).unwrap();
        let b = ts(2).with_nanosecond(100_000_000).unwrap();
        assert_eq!(seconds_between(a, b), 2);
    }
}
