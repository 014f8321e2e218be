use serde::{Deserialize, Serialize};

use crate::pace::PaceParse;
use crate::WorkoutRecord;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct BestPace {
    /// Index of the record in append order.
    pub index: usize,
    pub seconds: u32,
    /// Pace text as it was logged.
    pub text: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Summary {
    pub total_distance_km: f64,
    pub best_pace: Option<BestPace>,
    pub avg_heart_rate: Option<u32>,
    pub sessions: usize,
}

/// Aggregate all records. Records whose pace did not parse take no part in
/// the best-pace search.
pub fn summarize(records: &[WorkoutRecord]) -> Summary {
    let paces: Vec<PaceParse> = records.iter().map(|r| r.pace_seconds()).collect();
    let best_pace = best_pace_index(&paces).map(|(index, seconds)| BestPace {
        index,
        seconds,
        text: records[index].pace.clone(),
    });

    Summary {
        total_distance_km: records.iter().fold(0.0, |acc, r| acc + r.distance_km),
        best_pace,
        avg_heart_rate: average_heart_rate(records.iter().map(|r| r.heart_rate)),
        sessions: records.len(),
    }
}

/// Position and value of the fastest parsed pace. Ties go to the earliest entry.
pub fn best_pace_index(paces: &[PaceParse]) -> Option<(usize, u32)> {
    paces
        .iter()
        .enumerate()
        .filter_map(|(idx, pace)| pace.seconds().map(|s| (idx, s)))
        .filter(|&(_, s)| s > 0)
        .min_by_key(|&(idx, s)| (s, idx))
}

/// Mean heart rate, truncated toward zero.
pub fn average_heart_rate(values: impl IntoIterator<Item = u32>) -> Option<u32> {
    let (sum, count) = values
        .into_iter()
        .fold((0u64, 0u64), |(sum, count), hr| (sum + hr as u64, count + 1));
    if count == 0 {
        None
    } else {
        Some((sum / count) as u32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn record(day: u32, distance_km: f64, pace: &str, heart_rate: u32) -> WorkoutRecord {
        WorkoutRecord {
            date: NaiveDate::from_ymd_opt(2026, 10, day).unwrap(),
            distance_km,
            duration: "30:00".into(),
            pace: pace.into(),
            heart_rate,
        }
    }

    #[test]
    fn best_pace_skips_unparsed_entries() {
        let paces = [
            PaceParse::Unparsed,
            PaceParse::Parsed(306),
            PaceParse::Parsed(298),
            PaceParse::Unparsed,
            PaceParse::Parsed(310),
        ];
        assert_eq!(best_pace_index(&paces), Some((2, 298)));
        assert_eq!(best_pace_index(&[PaceParse::Unparsed]), None);
    }

    #[test]
    fn zero_second_pace_is_not_a_best() {
        let paces = [PaceParse::Parsed(0), PaceParse::Parsed(330)];
        assert_eq!(best_pace_index(&paces), Some((1, 330)));
    }

    #[test]
    fn average_heart_rate_truncates() {
        assert_eq!(average_heart_rate([160, 170, 165]), Some(165));
        assert_eq!(average_heart_rate([160, 171]), Some(165));
        assert_eq!(average_heart_rate(Vec::new()), None);
    }

    #[test]
    fn summary_over_mixed_records() {
        let records = vec![
            record(1, 5.0, "n/a", 160),
            record(2, 10.0, "5'06", 170),
            record(3, 3.5, "4:58", 171),
            record(4, 4.0, "", 150),
            record(5, 6.0, "05:10", 155),
        ];
        let summary = summarize(&records);
        assert_eq!(summary.sessions, 5);
        assert!((summary.total_distance_km - 28.5).abs() < 1e-9);
        assert_eq!(summary.avg_heart_rate, Some(161));
        let best = summary.best_pace.unwrap();
        assert_eq!((best.index, best.seconds, best.text.as_str()), (2, 298, "4:58"));
    }

    #[test]
    fn empty_summary() {
        let summary = summarize(&[]);
        assert_eq!(summary.sessions, 0);
        assert_eq!(summary.total_distance_km, 0.0);
        assert!(summary.total_distance_km.is_sign_positive());
        assert_eq!(summary.best_pace, None);
        assert_eq!(summary.avg_heart_rate, None);
    }
}
