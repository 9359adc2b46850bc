//! Per-event, per-class result rankings.

use otime_types::entry::{ClassResults, EntryType, RankedEntry};
use otime_types::event::ClassType;
use otime_types::result::ResultStatus;

/// Sort order for entries outside the ranking; finished problems first,
/// then no-shows, then entries still out or never started.
fn status_order(status: ResultStatus) -> u8 {
    match status {
        ResultStatus::Ok => 0,
        ResultStatus::MissingPunch => 1,
        ResultStatus::OverTime => 2,
        ResultStatus::DidNotFinish => 3,
        ResultStatus::Disqualified => 4,
        ResultStatus::DidNotStart => 5,
        ResultStatus::Finished => 6,
        ResultStatus::Active => 7,
        ResultStatus::Inactive => 8,
    }
}

fn name_key(entry: &EntryType) -> (String, String) {
    (
        entry.last_name.clone().unwrap_or_default(),
        entry.first_name.clone().unwrap_or_default(),
    )
}

/// Build the ranked results of every class of an event. Only competing
/// entries with status Ok receive a rank; equal times share it.
pub fn build_class_results(classes: &[ClassType], entries: &[EntryType]) -> Vec<ClassResults> {
    let mut classes: Vec<ClassType> = classes.to_vec();
    classes.sort_by(|a, b| a.name.cmp(&b.name));

    classes
        .into_iter()
        .map(|class| {
            let mut members: Vec<&EntryType> = entries
                .iter()
                .filter(|e| e.class_id == Some(class.id))
                .collect();
            members.sort_by(|a, b| {
                let key = |e: &EntryType| {
                    (
                        status_order(e.result.status),
                        e.result.time.unwrap_or(i64::MAX),
                        name_key(e),
                    )
                };
                key(a).cmp(&key(b))
            });

            let winner_time = members
                .iter()
                .find(|e| e.result.status == ResultStatus::Ok && !e.not_competing)
                .and_then(|e| e.result.time);

            let mut ranked = Vec::with_capacity(members.len());
            let mut position = 0u32;
            let mut prev: Option<(i64, u32)> = None;
            for entry in members {
                if entry.result.status != ResultStatus::Ok || entry.not_competing {
                    ranked.push(RankedEntry {
                        rank: None,
                        time_behind: None,
                        entry: entry.clone(),
                    });
                    continue;
                }
                position += 1;
                let rank = match (entry.result.time, prev) {
                    (Some(time), Some((prev_time, prev_rank))) if time == prev_time => prev_rank,
                    _ => position,
                };
                if let Some(time) = entry.result.time {
                    prev = Some((time, rank));
                }
                let time_behind = match (entry.result.time, winner_time) {
                    (Some(time), Some(winner)) => Some(time - winner),
                    _ => None,
                };
                ranked.push(RankedEntry {
                    rank: Some(rank),
                    time_behind,
                    entry: entry.clone(),
                });
            }

            ClassResults {
                class,
                entries: ranked,
            }
        })
        .collect()
}
