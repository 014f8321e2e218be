use std::ops::Range;

use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct AxisTick {
    pub seconds: u32,
    pub label: String,
}

/// Vertical pace axis labelled in whole minutes, drawn so that faster paces
/// sit higher on the chart.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct PaceAxis {
    ticks: Vec<AxisTick>,
}

impl PaceAxis {
    /// Ticks run every minute from the floor of the fastest pace through one
    /// minute past the ceiling of the slowest. `None` when no pace is given.
    pub fn from_paces(paces: impl IntoIterator<Item = u32>) -> Option<Self> {
        let (min, max) = paces.into_iter().fold(None, |acc, s| match acc {
            None => Some((s, s)),
            Some((lo, hi)) => Some((lo.min(s), hi.max(s))),
        })?;
        let first = min / 60;
        let last = max.div_ceil(60) + 1;
        let ticks = (first..=last)
            .map(|minute| AxisTick {
                seconds: minute * 60,
                label: format!("{}:00", minute),
            })
            .collect();
        Some(Self { ticks })
    }

    pub fn ticks(&self) -> &[AxisTick] {
        &self.ticks
    }

    /// Plot coordinate of a pace: negated so an ascending range puts low
    /// seconds at the top.
    pub fn position(seconds: u32) -> f64 {
        -(seconds as f64)
    }

    /// Inverse of [`PaceAxis::position`].
    pub fn seconds_at(position: f64) -> f64 {
        -position
    }

    /// Ascending plot range spanning every tick.
    pub fn range(&self) -> Range<f64> {
        let fastest = self.ticks.first().map_or(0, |t| t.seconds);
        let slowest = self.ticks.last().map_or(0, |t| t.seconds);
        Self::position(slowest)..Self::position(fastest)
    }

    pub fn key_points(&self) -> Vec<f64> {
        self.ticks.iter().map(|t| Self::position(t.seconds)).collect()
    }

    /// Label for a plot coordinate, `M:00` on tick positions.
    pub fn label_at(position: f64) -> String {
        let seconds = Self::seconds_at(position).round().max(0.0) as u32;
        if seconds % 60 == 0 {
            format!("{}:00", seconds / 60)
        } else {
            crate::pace::format_pace(seconds)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ticks_cover_floor_to_one_past_ceiling() {
        let axis = PaceAxis::from_paces([306, 298, 310]).unwrap();
        let labels: Vec<&str> = axis.ticks().iter().map(|t| t.label.as_str()).collect();
        assert_eq!(labels, ["4:00", "5:00", "6:00", "7:00"]);
        assert_eq!(axis.ticks()[0].seconds, 240);
    }

    #[test]
    fn whole_minute_extremes() {
        let axis = PaceAxis::from_paces([300, 360]).unwrap();
        let seconds: Vec<u32> = axis.ticks().iter().map(|t| t.seconds).collect();
        assert_eq!(seconds, [300, 360, 420]);
    }

    #[test]
    fn faster_pace_plots_higher() {
        let axis = PaceAxis::from_paces([290, 340]).unwrap();
        assert!(PaceAxis::position(290) > PaceAxis::position(340));
        let range = axis.range();
        assert_eq!(range, -420.0..-240.0);
        assert!(range.contains(&PaceAxis::position(290)));
        assert_eq!(PaceAxis::label_at(-300.0), "5:00");
    }

    #[test]
    fn no_paces_no_axis() {
        assert_eq!(PaceAxis::from_paces(Vec::new()), None);
    }
}
