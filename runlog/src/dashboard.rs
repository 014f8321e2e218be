use tracing::debug;

use crate::axis::PaceAxis;
use crate::metrics::{summarize, Summary};
use crate::pace::PaceParse;
use crate::store::RecordStore;
use crate::{format_distance, RunlogError, WorkoutRecord};

#[derive(Clone, Debug, PartialEq)]
pub struct DashboardRow {
    pub record: WorkoutRecord,
    pub pace: PaceParse,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MetricCard {
    pub label: &'static str,
    pub value: String,
}

/// Read-only view over the whole store, rebuilt on every load.
#[derive(Clone, Debug)]
pub struct Dashboard {
    rows: Vec<DashboardRow>,
    summary: Summary,
    axis: Option<PaceAxis>,
}

impl Dashboard {
    pub fn load<S: RecordStore + ?Sized>(store: &S) -> Result<Self, RunlogError> {
        let rows = store.rows()?;
        let records = rows
            .iter()
            .enumerate()
            .skip(1)
            .map(|(idx, cells)| WorkoutRecord::from_row(cells, idx + 1))
            .collect::<Result<Vec<_>, _>>()?;
        debug!("Loaded {} records", records.len());
        Ok(Self::from_records(records))
    }

    pub fn from_records(records: Vec<WorkoutRecord>) -> Self {
        let summary = summarize(&records);
        let rows: Vec<DashboardRow> = records
            .into_iter()
            .map(|record| DashboardRow {
                pace: record.pace_seconds(),
                record,
            })
            .collect();
        let axis = PaceAxis::from_paces(rows.iter().filter_map(|r| r.pace.seconds()));
        Self {
            rows,
            summary,
            axis,
        }
    }

    /// Rows in append order.
    pub fn records(&self) -> &[DashboardRow] {
        &self.rows
    }

    pub fn summary(&self) -> &Summary {
        &self.summary
    }

    pub fn axis(&self) -> Option<&PaceAxis> {
        self.axis.as_ref()
    }

    /// Raw data table, newest date first. Same-day entries keep append order.
    pub fn raw_rows_newest_first(&self) -> Vec<&DashboardRow> {
        let mut rows: Vec<&DashboardRow> = self.rows.iter().collect();
        rows.sort_by(|a, b| b.record.date.cmp(&a.record.date));
        rows
    }

    pub fn metric_cards(&self) -> Vec<MetricCard> {
        let summary = &self.summary;
        vec![
            MetricCard {
                label: "Total distance",
                value: format!("{} KM", format_distance(summary.total_distance_km)),
            },
            MetricCard {
                label: "Personal best pace",
                value: summary
                    .best_pace
                    .as_ref()
                    .map_or_else(|| "-".to_string(), |b| b.text.clone()),
            },
            MetricCard {
                label: "Avg HR",
                value: summary
                    .avg_heart_rate
                    .map_or_else(|| "-".to_string(), |hr| format!("{} BPM", hr)),
            },
            MetricCard {
                label: "Sessions",
                value: format!("{} runs", summary.sessions),
            },
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn row(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    fn sample_store() -> MemoryStore {
        MemoryStore::with_rows(vec![
            row(&["2026-10-03", "5.0", "25:30", "05:06", "165"]),
            row(&["2026-10-01", "8.0", "42:00", "bad", "160"]),
            row(&["2026-10-05", "4.5", "22:21", "4'58", "171"]),
        ])
    }

    #[test]
    fn loads_metrics_and_axis() {
        let dashboard = Dashboard::load(&sample_store()).unwrap();
        assert_eq!(dashboard.records().len(), 3);
        assert_eq!(dashboard.records()[1].pace, PaceParse::Unparsed);

        let cards = dashboard.metric_cards();
        let values: Vec<&str> = cards.iter().map(|c| c.value.as_str()).collect();
        assert_eq!(values, ["17.5 KM", "4'58", "165 BPM", "3 runs"]);

        let axis = dashboard.axis().unwrap();
        assert_eq!(axis.ticks().first().unwrap().label, "4:00");
        assert_eq!(axis.ticks().last().unwrap().label, "7:00");
    }

    #[test]
    fn raw_rows_sorted_by_date_descending() {
        let dashboard = Dashboard::load(&sample_store()).unwrap();
        let dates: Vec<String> = dashboard
            .raw_rows_newest_first()
            .iter()
            .map(|r| r.record.date.to_string())
            .collect();
        assert_eq!(dates, ["2026-10-05", "2026-10-03", "2026-10-01"]);
    }

    #[test]
    fn empty_store_has_placeholder_cards() {
        let dashboard = Dashboard::load(&MemoryStore::new()).unwrap();
        assert!(dashboard.axis().is_none());
        let values: Vec<String> = dashboard.metric_cards().into_iter().map(|c| c.value).collect();
        assert_eq!(values, ["0.0 KM", "-", "-", "0 runs"]);
    }

    #[test]
    fn total_distance_is_not_rounded() {
        let store = MemoryStore::with_rows(vec![
            row(&["2026-10-03", "5.0", "25:30", "05:06", "165"]),
            row(&["2026-10-04", "5.25", "27:00", "05:09", "160"]),
        ]);
        let dashboard = Dashboard::load(&store).unwrap();
        assert_eq!(dashboard.metric_cards()[0].value, "10.25 KM");
    }

    #[test]
    fn malformed_row_names_its_position() {
        let store = MemoryStore::with_rows(vec![
            row(&["2026-10-03", "5.0", "25:30", "05:06", "165"]),
            row(&["yesterday", "5.0", "25:30", "05:06", "165"]),
        ]);
        match Dashboard::load(&store) {
            Err(RunlogError::InvalidRow { row, .. }) => assert_eq!(row, 3),
            other => panic!("unexpected result: {:?}", other.map(|d| d.records().len())),
        }
    }

    #[test]
    fn store_failure_propagates() {
        let mut store = MemoryStore::new();
        store.fail_with("auth expired");
        assert!(matches!(Dashboard::load(&store), Err(RunlogError::Store(_))));
    }
}
