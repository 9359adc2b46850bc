//! Season series: combine per-event class rankings into ranked totals.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use otime_types::entry::{ClassResults, EntryType};
use otime_types::series::{PersonSeriesResult, Points, SeriesMode, SeriesSettings};

/// Class names whose entries helped run the event instead of racing it.
const ORGANIZER_CLASSES: [&str; 2] = ["Organizer", "Organizers"];

/// Points by finishing place in Place mode, capped at `maximum_points`.
const PLACE_POINTS: [i64; 15] = [25, 20, 16, 13, 11, 10, 9, 8, 7, 6, 5, 4, 3, 2, 1];

#[derive(Default)]
struct PersonAcc {
    year: Option<i32>,
    club_name: Option<String>,
    races: BTreeMap<usize, Decimal>,
}

/// Combine the per-event class rankings (`list_of_results[event_index]`) into
/// the season standing. `organizers[event_index]` holds the entries that ran
/// that event's organization; they are credited the average of their own best
/// results instead of a race score.
pub fn build_series_totals(
    settings: &SeriesSettings,
    list_of_results: &[Vec<ClassResults>],
    organizers: &[Vec<EntryType>],
) -> Vec<(String, Vec<PersonSeriesResult>)> {
    let max_points = Decimal::from(settings.maximum_points);
    let mut classes: BTreeMap<String, BTreeMap<(String, String), PersonAcc>> = BTreeMap::new();

    for (event_index, class_results) in list_of_results.iter().enumerate() {
        for cr in class_results {
            if ORGANIZER_CLASSES.contains(&cr.class.name.as_str()) {
                continue;
            }
            let fastest = cr
                .entries
                .iter()
                .filter(|r| r.rank.is_some())
                .filter_map(|r| r.entry.result.time)
                .min();
            let persons = classes.entry(cr.class.name.clone()).or_default();

            for ranked in cr.entries.iter().filter(|r| r.rank.is_some()) {
                let points = match settings.mode {
                    SeriesMode::Proportional1 | SeriesMode::Proportional2 => {
                        let (Some(fastest), Some(time)) = (fastest, ranked.entry.result.time)
                        else {
                            continue;
                        };
                        if time <= 0 {
                            continue;
                        }
                        let ratio = Decimal::from(fastest) / Decimal::from(time);
                        let points = match settings.mode {
                            SeriesMode::Proportional2 => max_points * ratio * ratio,
                            _ => max_points * ratio,
                        };
                        points.round_dp(settings.decimal_places)
                    }
                    SeriesMode::Place => {
                        let place = ranked.rank.unwrap_or(0) as usize;
                        let table = place
                            .checked_sub(1)
                            .and_then(|i| PLACE_POINTS.get(i))
                            .copied()
                            .unwrap_or(0);
                        Decimal::from(table.min(settings.maximum_points))
                    }
                };

                let key = (
                    ranked.entry.last_name.clone().unwrap_or_default(),
                    ranked.entry.first_name.clone().unwrap_or_default(),
                );
                let acc = persons.entry(key).or_default();
                if acc.year.is_none() {
                    acc.year = ranked.entry.year;
                }
                if acc.club_name.is_none() {
                    acc.club_name = ranked.entry.club_name.clone();
                }
                acc.races.insert(event_index, points);
            }
        }
    }

    // Organizers: credit the event with the average of the person's own best
    // race scores, in every class they compete in.
    for (event_index, event_organizers) in organizers.iter().enumerate() {
        for organizer in event_organizers {
            let (Some(last), Some(first)) = (&organizer.last_name, &organizer.first_name) else {
                continue;
            };
            let key = (last.clone(), first.clone());
            for persons in classes.values_mut() {
                let Some(acc) = persons.get_mut(&key) else {
                    continue;
                };
                if acc.races.contains_key(&event_index) {
                    continue;
                }
                let mut race_points: Vec<Decimal> = acc.races.values().copied().collect();
                race_points.sort_by(|a, b| b.cmp(a));
                race_points.truncate(settings.nr_of_best_results);
                if race_points.is_empty() {
                    continue;
                }
                let avg = race_points.iter().copied().sum::<Decimal>()
                    / Decimal::from(race_points.len() as i64);
                acc.races
                    .insert(event_index, avg.round_dp(settings.decimal_places).min(max_points));
            }
        }
    }

    classes
        .into_iter()
        .map(|(class_name, persons)| {
            let mut results: Vec<PersonSeriesResult> = persons
                .into_iter()
                .map(|((last_name, first_name), acc)| {
                    let mut points: Vec<Decimal> = acc.races.values().copied().collect();
                    points.sort_by(|a, b| b.cmp(a));
                    points.truncate(settings.nr_of_best_results);
                    let total: Decimal = points.into_iter().sum();
                    PersonSeriesResult {
                        first_name,
                        last_name,
                        year: acc.year,
                        club_name: acc.club_name,
                        races: acc.races.into_iter().map(|(i, p)| (i, Points::new(p))).collect(),
                        total_points: total,
                        rank: None,
                    }
                })
                .collect();

            results.sort_by(|a, b| {
                b.total_points
                    .cmp(&a.total_points)
                    .then_with(|| a.last_name.cmp(&b.last_name))
                    .then_with(|| a.first_name.cmp(&b.first_name))
            });

            let mut prev: Option<(Decimal, u32)> = None;
            for (index, person) in results.iter_mut().enumerate() {
                let rank = match prev {
                    Some((total, rank)) if total == person.total_points => rank,
                    _ => index as u32 + 1,
                };
                prev = Some((person.total_points, rank));
                person.rank = Some(rank);
            }

            (class_name, results)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use otime_types::class_params::ClassParams;
    use otime_types::entry::{PersonRaceStart, RankedEntry};
    use otime_types::event::ClassType;
    use otime_types::result::{PersonRaceResult, ResultStatus};

    fn settings(mode: SeriesMode) -> SeriesSettings {
        SeriesSettings {
            name: "Series 1".into(),
            nr_of_best_results: 4,
            mode,
            maximum_points: 500,
            decimal_places: 3,
        }
    }

    fn class(id: i64, name: &str) -> ClassType {
        ClassType {
            id,
            event_id: 1,
            name: name.into(),
            short_name: None,
            course_id: None,
            params: ClassParams::default(),
        }
    }

    fn entry(first: &str, last: &str, class_id: i64, time: i64) -> EntryType {
        EntryType {
            id: 0,
            event_id: 1,
            competitor_id: None,
            first_name: Some(first.into()),
            last_name: Some(last.into()),
            gender: None,
            year: None,
            class_id: Some(class_id),
            class_name: None,
            club_id: None,
            club_name: None,
            not_competing: false,
            chip: String::new(),
            fields: Default::default(),
            result: PersonRaceResult {
                status: ResultStatus::Ok,
                time: Some(time),
                ..PersonRaceResult::default()
            },
            start: PersonRaceStart::default(),
        }
    }

    fn ranked(class: ClassType, entries: Vec<(EntryType, u32)>) -> ClassResults {
        ClassResults {
            class,
            entries: entries
                .into_iter()
                .map(|(entry, rank)| RankedEntry {
                    rank: Some(rank),
                    time_behind: None,
                    entry,
                })
                .collect(),
        }
    }

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    #[test]
    fn proportional_points_follow_the_time_ratio() {
        let event = vec![
            ranked(
                class(1, "Bahn A - Lang"),
                vec![
                    (entry("Angela", "Merkel", 1, 9876), 2),
                    (entry("Birgit", "Derkel", 1, 3333), 1),
                ],
            ),
            ranked(
                class(2, "Bahn B - Mittel"),
                vec![
                    (entry("Claudia", "Merkel", 2, 2001), 1),
                    (entry("Birgit", "Merkel", 2, 2113), 2),
                ],
            ),
        ];
        let totals = build_series_totals(
            &settings(SeriesMode::Proportional1),
            &[event, vec![]],
            &[vec![], vec![]],
        );

        assert_eq!(totals.len(), 2);
        let (class_a, results_a) = &totals[0];
        assert_eq!(class_a, "Bahn A - Lang");
        assert_eq!(results_a[0].last_name, "Derkel");
        assert_eq!(results_a[0].total_points, dec("500.000"));
        assert_eq!(results_a[0].rank, Some(1));
        assert_eq!(results_a[1].last_name, "Merkel");
        assert_eq!(results_a[1].total_points, dec("168.742"));
        assert_eq!(results_a[1].rank, Some(2));

        let (class_b, results_b) = &totals[1];
        assert_eq!(class_b, "Bahn B - Mittel");
        assert_eq!(results_b[0].first_name, "Claudia");
        assert_eq!(results_b[0].total_points, dec("500.000"));
        assert_eq!(results_b[1].first_name, "Birgit");
        assert_eq!(results_b[1].total_points, dec("473.497"));
    }

    #[test]
    fn proportional_2_squares_the_ratio() {
        let event = vec![ranked(
            class(1, "Elite"),
            vec![
                (entry("a", "A", 1, 100), 1),
                (entry("b", "B", 1, 200), 2),
            ],
        )];
        let totals = build_series_totals(
            &settings(SeriesMode::Proportional2),
            &[event],
            &[vec![]],
        );
        let results = &totals[0].1;
        assert_eq!(results[0].total_points, dec("500.000"));
        assert_eq!(results[1].total_points, dec("125.000"));
    }

    #[test]
    fn place_mode_uses_the_fixed_table() {
        let event = vec![ranked(
            class(1, "Elite"),
            vec![
                (entry("a", "A", 1, 100), 1),
                (entry("b", "B", 1, 110), 2),
                (entry("c", "C", 1, 120), 3),
            ],
        )];
        let mut cfg = settings(SeriesMode::Place);
        let totals = build_series_totals(&cfg, &[event.clone()], &[vec![]]);
        let results = &totals[0].1;
        assert_eq!(results[0].total_points, Decimal::from(25));
        assert_eq!(results[1].total_points, Decimal::from(20));
        assert_eq!(results[2].total_points, Decimal::from(16));

        // The table is capped by the series maximum.
        cfg.maximum_points = 18;
        let totals = build_series_totals(&cfg, &[event], &[vec![]]);
        assert_eq!(totals[0].1[0].total_points, Decimal::from(18));
    }

    #[test]
    fn only_the_best_results_count() {
        let make_event = |time: i64| {
            vec![ranked(
                class(1, "Elite"),
                vec![
                    (entry("a", "A", 1, 100), 1),
                    (entry("b", "B", 1, time), 2),
                ],
            )]
        };
        let mut cfg = settings(SeriesMode::Proportional1);
        cfg.nr_of_best_results = 2;
        let totals = build_series_totals(
            &cfg,
            &[make_event(200), make_event(250), make_event(400)],
            &[vec![], vec![], vec![]],
        );
        let b = &totals[0].1[1];
        assert_eq!(b.last_name, "B");
        assert_eq!(b.races.len(), 3);
        // best two of 250.000 / 200.000 / 125.000
        assert_eq!(b.total_points, dec("450.000"));
    }

    #[test]
    fn organizers_are_credited_their_average() {
        let event_0 = vec![ranked(
            class(1, "Elite"),
            vec![
                (entry("a", "A", 1, 100), 1),
                (entry("b", "B", 1, 200), 2),
            ],
        )];
        // B organizes event 1 instead of racing it.
        let event_1 = vec![ranked(
            class(1, "Elite"),
            vec![(entry("a", "A", 1, 100), 1)],
        )];
        let mut organizer = entry("b", "B", 99, 0);
        organizer.class_name = Some("Organizer".into());

        let cfg = settings(SeriesMode::Proportional1);
        let totals = build_series_totals(
            &cfg,
            &[event_0, event_1],
            &[vec![], vec![organizer]],
        );
        let b = &totals[0].1[1];
        assert_eq!(b.last_name, "B");
        assert_eq!(b.races[&0].points, dec("250.000"));
        assert_eq!(b.races[&1].points, dec("250.000"));
        assert_eq!(b.total_points, dec("500.000"));
    }

    #[test]
    fn equal_totals_share_the_rank() {
        let event = vec![ranked(
            class(1, "Elite"),
            vec![
                (entry("a", "A", 1, 100), 1),
                (entry("b", "B", 1, 100), 1),
                (entry("c", "C", 1, 200), 3),
            ],
        )];
        let totals = build_series_totals(
            &settings(SeriesMode::Proportional1),
            &[event],
            &[vec![]],
        );
        let ranks: Vec<Option<u32>> = totals[0].1.iter().map(|r| r.rank).collect();
        assert_eq!(ranks, vec![Some(1), Some(1), Some(3)]);
    }

    #[test]
    fn points_never_exceed_the_maximum() {
        let event = vec![ranked(
            class(1, "Elite"),
            vec![
                (entry("a", "A", 1, 100), 1),
                (entry("b", "B", 1, 101), 2),
                (entry("c", "C", 1, 1000), 3),
            ],
        )];
        let cfg = settings(SeriesMode::Proportional1);
        let totals = build_series_totals(&cfg, &[event.clone(), event], &[vec![], vec![]]);
        let max = Decimal::from(cfg.maximum_points);
        for (_, results) in &totals {
            for person in results {
                for points in person.races.values() {
                    assert!(points.points <= max);
                }
                assert!(
                    person.total_points <= max * Decimal::from(cfg.nr_of_best_results as i64)
                );
            }
        }
    }
}
