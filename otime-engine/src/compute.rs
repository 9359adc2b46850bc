//! Result computation: punches + expected controls + class params in, a
//! fully classified [`PersonRaceResult`] out.

use std::collections::HashSet;

use chrono::{DateTime, Datelike, Utc};
use otime_types::class_params::{COURSE_FINISH, COURSE_START, ClassParams, Otype};
use otime_types::competitor::Gender;
use otime_types::result::{
    Extensions, PersonRaceResult, PunchTime, ResultStatus, SplitStatus, SplitTime, seconds_between,
};

use crate::handicap;

/// Compute the classified result for one entry.
///
/// `result` is the prior state (punched times plus whatever labels an earlier
/// computation left behind); labels are rebuilt from scratch, so recomputation
/// is idempotent. `start_time` is the scheduled start and wins over the
/// punched start. The function has no side effects and touches no clock:
/// equal inputs always produce equal outputs.
pub fn compute_result(
    result: &PersonRaceResult,
    controls: &[String],
    params: &ClassParams,
    start_time: Option<DateTime<Utc>>,
    year: Option<i32>,
    gender: Option<Gender>,
) -> PersonRaceResult {
    let effective_start = start_time.or(result.punched_start_time);
    let effective_finish = result.punched_finish_time;

    // Rows without any punch are leftovers of a previous computation
    // (missing-control rows); drop them and relabel the rest.
    let mut rows: Vec<SplitTime> = result
        .split_times
        .iter()
        .filter(|sp| sp.punch_time.is_some() || sp.si_punch_time.is_some())
        .map(|sp| SplitTime {
            control_code: sp.control_code.clone(),
            punch_time: sp.punch_time,
            si_punch_time: sp.si_punch_time,
            ..SplitTime::default()
        })
        .collect();
    let had_punches = rows.iter().any(|sp| sp.punch_time.is_some());

    let outcome = match params.otype {
        Otype::Standard => match_ordered(&mut rows, controls),
        Otype::Net => match_free_order(&mut rows, controls),
        Otype::Score => match_score(&mut rows, controls),
    };

    for sp in &mut rows {
        sp.time = match (effective_start, sp.punch_time) {
            (Some(start), Some(PunchTime::Known(t))) => Some(seconds_between(start, t)),
            _ => None,
        };
    }

    let voided = match params.otype {
        Otype::Score => 0,
        _ => apply_voided_legs(&mut rows, params, effective_start, effective_finish),
    };

    let raw_time = match (effective_start, effective_finish) {
        (Some(start), Some(finish)) if finish >= start => {
            Some(seconds_between(start, finish) - voided)
        }
        _ => None,
    };

    let mut out = PersonRaceResult {
        status: result.status,
        start_time: effective_start,
        finish_time: effective_finish,
        punched_clear_time: result.punched_clear_time,
        punched_check_time: result.punched_check_time,
        punched_start_time: result.punched_start_time,
        punched_finish_time: result.punched_finish_time,
        si_punched_start_time: result.si_punched_start_time,
        si_punched_finish_time: result.si_punched_finish_time,
        time: raw_time,
        split_times: rows,
        extensions: Extensions::default(),
    };

    let overtime_minutes = overtime_minutes(params, raw_time);

    // Terminal statuses are operator decisions; without expected controls
    // there is no course to judge against. Both keep the incoming status.
    if !result.status.is_terminal() && !controls.is_empty() {
        out.status = if effective_finish.is_none() && !had_punches {
            result.status
        } else if finish_before_start(effective_start, effective_finish) {
            ResultStatus::DidNotFinish
        } else if effective_finish.is_none() {
            ResultStatus::DidNotFinish
        } else {
            match params.otype {
                Otype::Score => {
                    if overtime_minutes > 0 && params.penalty_overtime.is_none() {
                        ResultStatus::OverTime
                    } else {
                        ResultStatus::Ok
                    }
                }
                _ => {
                    if outcome.missing == 0 {
                        ResultStatus::Ok
                    } else {
                        ResultStatus::MissingPunch
                    }
                }
            }
        };
    }

    if params.otype == Otype::Score && effective_finish.is_some() {
        let missed = outcome.missing as i64;
        let control_penalty = params.penalty_controls.unwrap_or(0) * missed;
        let overtime_penalty = params.penalty_overtime.unwrap_or(0) * overtime_minutes;
        out.extensions.score =
            Some(outcome.matched as f64 - control_penalty as f64 - overtime_penalty as f64);
        if params.penalty_controls.is_some() {
            out.extensions.penalties_controls = Some(control_penalty as f64);
        }
        if params.penalty_overtime.is_some() {
            out.extensions.penalties_overtime = Some(overtime_penalty as f64);
        }
    }

    if params.apply_handicap {
        if let (Some(gender), Some(year), Some(raw)) = (gender, year, out.time) {
            let season = effective_finish.or(effective_start).map(|t| t.year());
            if let Some(season) = season {
                let factor = handicap::factor(gender, season - year);
                out.extensions.running_time = Some(raw);
                out.time = Some((raw as f64 * factor).round() as i64);
            }
        }
    }

    out
}

fn finish_before_start(start: Option<DateTime<Utc>>, finish: Option<DateTime<Utc>>) -> bool {
    matches!((start, finish), (Some(s), Some(f)) if f < s)
}

fn overtime_minutes(params: &ClassParams, raw_time: Option<i64>) -> i64 {
    match (params.time_limit, raw_time) {
        (Some(limit), Some(time)) if time > limit => {
            let diff = time - limit;
            (diff + 59) / 60
        }
        _ => 0,
    }
}

struct MatchOutcome {
    /// Expected controls satisfied by a punch.
    matched: usize,
    /// Expected controls without any punch (one Missing row appended each).
    missing: usize,
}

/// Standard courses: walk the expected controls in order and consume the
/// earliest punch whose code matches and whose time does not go backwards.
/// A control that is only satisfiable by an earlier punch is flagged
/// `OkButUnordered` instead of being reported missing.
fn match_ordered(rows: &mut Vec<SplitTime>, controls: &[String]) -> MatchOutcome {
    let mut consumed = vec![false; rows.len()];
    let mut last: Option<DateTime<Utc>> = None;
    let mut missing: Vec<String> = Vec::new();
    let mut matched = 0usize;

    for code in controls {
        let mut in_order: Option<usize> = None;
        for (i, sp) in rows.iter().enumerate() {
            if consumed[i] || sp.control_code != *code {
                continue;
            }
            match sp.punch_time {
                // NoTime punches match on code alone and neither constrain
                // nor violate the ordering.
                Some(PunchTime::NoTime) => {
                    in_order = Some(i);
                    break;
                }
                Some(PunchTime::Known(t)) if last.is_none_or(|l| t >= l) => {
                    in_order = Some(i);
                    break;
                }
                _ => {}
            }
        }

        if let Some(i) = in_order {
            consumed[i] = true;
            rows[i].status = SplitStatus::Ok;
            if let Some(PunchTime::Known(t)) = rows[i].punch_time {
                last = Some(t);
            }
            matched += 1;
            continue;
        }

        let unordered = (0..rows.len())
            .find(|&i| !consumed[i] && rows[i].control_code == *code && rows[i].punch_time.is_some());
        match unordered {
            Some(i) => {
                consumed[i] = true;
                rows[i].status = SplitStatus::OkButUnordered;
                matched += 1;
            }
            None => missing.push(code.clone()),
        }
    }

    let outcome = MatchOutcome {
        matched,
        missing: missing.len(),
    };
    rows.extend(missing.into_iter().map(SplitTime::missing));
    outcome
}

/// Net courses: every expected code is matched once by the earliest
/// remaining punch of that code, in any order.
fn match_free_order(rows: &mut Vec<SplitTime>, controls: &[String]) -> MatchOutcome {
    let mut consumed = vec![false; rows.len()];
    let mut missing: Vec<String> = Vec::new();
    let mut matched = 0usize;

    for code in controls {
        let found = (0..rows.len())
            .find(|&i| !consumed[i] && rows[i].control_code == *code && rows[i].punch_time.is_some());
        match found {
            Some(i) => {
                consumed[i] = true;
                rows[i].status = SplitStatus::Ok;
                matched += 1;
            }
            None => missing.push(code.clone()),
        }
    }

    let outcome = MatchOutcome {
        matched,
        missing: missing.len(),
    };
    rows.extend(missing.into_iter().map(SplitTime::missing));
    outcome
}

/// Score courses: every expected code counts once, repeats and foreign
/// codes stay additional.
fn match_score(rows: &mut Vec<SplitTime>, controls: &[String]) -> MatchOutcome {
    let expected: HashSet<&str> = controls.iter().map(String::as_str).collect();
    let mut seen: HashSet<String> = HashSet::new();

    for sp in rows.iter_mut() {
        if sp.punch_time.is_some()
            && expected.contains(sp.control_code.as_str())
            && seen.insert(sp.control_code.clone())
        {
            sp.status = SplitStatus::Ok;
        }
    }

    let missing: Vec<String> = controls
        .iter()
        .filter(|code| !seen.contains(code.as_str()))
        .cloned()
        .collect();
    let outcome = MatchOutcome {
        matched: seen.len(),
        missing: missing.len(),
    };
    rows.extend(missing.into_iter().map(SplitTime::missing));
    outcome
}

/// Flag voided legs along the matched chain start -> controls -> finish and
/// return the total voided duration in seconds.
fn apply_voided_legs(
    rows: &mut [SplitTime],
    params: &ClassParams,
    start: Option<DateTime<Utc>>,
    finish: Option<DateTime<Utc>>,
) -> i64 {
    if params.voided_legs.is_empty() {
        return 0;
    }
    let is_voided = |from: &str, to: &str| {
        params
            .voided_legs
            .iter()
            .any(|leg| leg.from_control == from && leg.to_control == to)
    };

    let mut deduction = 0i64;
    let mut prev_code = COURSE_START.to_string();
    let mut prev_time = start;

    for sp in rows.iter_mut() {
        if !matches!(sp.status, SplitStatus::Ok | SplitStatus::OkButUnordered) {
            continue;
        }
        let punch = sp.punch_time.and_then(PunchTime::known);
        if is_voided(&prev_code, &sp.control_code) {
            sp.leg_voided = true;
            if let (Some(prev), Some(punch)) = (prev_time, punch) {
                deduction += seconds_between(prev, punch);
            }
        }
        prev_code = sp.control_code.clone();
        prev_time = punch;
    }

    if is_voided(&prev_code, COURSE_FINISH) {
        if let (Some(prev), Some(finish)) = (prev_time, finish) {
            deduction += seconds_between(prev, finish);
        }
    }

    deduction.max(0)
}
