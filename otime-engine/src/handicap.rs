//! Age/gender handicap factors.
//!
//! Adjusted time = running time x factor. The open classes (21-34) run at
//! factor 1.0; youth and masters classes are scaled down in five-year bands,
//! women by an additional flat factor.

use otime_types::competitor::Gender;

const WOMEN_SCALE: f64 = 0.90;

/// Handicap factor for a competitor of the given age in the season the race
/// was run. Ages outside the table clamp to the nearest band.
pub fn factor(gender: Gender, age: i32) -> f64 {
    let base = match age {
        i32::MIN..=14 => 0.83,
        15..=16 => 0.88,
        17..=18 => 0.93,
        19..=20 => 0.97,
        21..=34 => 1.00,
        35..=39 => 0.97,
        40..=44 => 0.94,
        45..=49 => 0.91,
        50..=54 => 0.88,
        55..=59 => 0.85,
        60..=64 => 0.82,
        65..=69 => 0.78,
        70..=74 => 0.74,
        75..=79 => 0.70,
        80.. => 0.65,
    };
    match gender {
        Gender::Male => base,
        Gender::Female => base * WOMEN_SCALE,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_class_runs_unscaled() {
        assert_eq!(factor(Gender::Male, 21), 1.0);
        assert_eq!(factor(Gender::Male, 34), 1.0);
    }

    #[test]
    fn women_get_the_flat_scale() {
        assert_eq!(factor(Gender::Female, 30), 0.90);
    }

    #[test]
    fn bands_are_monotone_above_the_open_class() {
        let mut last = factor(Gender::Male, 34);
        for age in 35..=90 {
            let f = factor(Gender::Male, age);
            assert!(f <= last, "factor increased at age {age}");
            last = f;
        }
    }

    #[test]
    fn extreme_ages_clamp() {
        assert_eq!(factor(Gender::Male, 5), 0.83);
        assert_eq!(factor(Gender::Male, 99), 0.65);
    }
}
