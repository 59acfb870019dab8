//! Descriptive statistics per group (and per group × time for trends).
//!
//! `count` is the number of non-null measurements, `mean` their arithmetic
//! mean and `sem` the unbiased sample standard deviation divided by
//! `sqrt(count)`. `sem` is NaN when `count <= 1`; `mean` is NaN when
//! `count == 0`.

use serde::Serialize;

use crate::dataset::{Observation, TimePoint};

/// Summary statistics for one group, or one group at one time point
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupSummary {
    /// Group label
    pub group: String,
    /// Time point, for trend rows
    pub time: Option<TimePoint>,
    /// Number of non-null measurements
    pub count: usize,
    /// Arithmetic mean
    pub mean: f64,
    /// Standard error of the mean
    pub sem: f64,
}

/// Header used for the group column when none is set
pub const DEFAULT_GROUP_HEADER: &str = "Group";

/// Rows of [`GroupSummary`], first-seen order unless sorted
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct SummaryTable {
    rows: Vec<GroupSummary>,
    #[serde(skip)]
    group_column: String,
}

impl Default for SummaryTable {
    fn default() -> Self {
        Self::from(Vec::new())
    }
}

impl SummaryTable {
    /// Name of the source group column, used as the group header in reports
    pub fn group_column(&self) -> &str {
        &self.group_column
    }

    /// Set the group column name
    pub fn with_group_column(mut self, name: impl Into<String>) -> Self {
        self.group_column = name.into();
        self
    }

    /// All rows
    pub fn rows(&self) -> &[GroupSummary] {
        &self.rows
    }

    /// Number of rows
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// True if the table has no rows
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// First row for a group
    pub fn get(&self, group: &str) -> Option<&GroupSummary> {
        self.rows.iter().find(|r| r.group == group)
    }

    /// Sort rows by group label, then by time
    pub fn sort_by_label(&mut self) {
        self.rows
            .sort_by(|a, b| a.group.cmp(&b.group).then_with(|| a.time.cmp(&b.time)));
    }

    /// Consume the table, sorted by label
    pub fn sorted(mut self) -> Self {
        self.sort_by_label();
        self
    }
}

impl From<Vec<GroupSummary>> for SummaryTable {
    fn from(rows: Vec<GroupSummary>) -> Self {
        Self {
            rows,
            group_column: DEFAULT_GROUP_HEADER.to_string(),
        }
    }
}

/// Running sums for one bucket; Welford update keeps the variance stable
#[derive(Debug, Default)]
struct Accumulator {
    count: usize,
    mean: f64,
    m2: f64,
}

impl Accumulator {
    fn push(&mut self, value: f64) {
        self.count += 1;
        let delta = value - self.mean;
        self.mean += delta / self.count as f64;
        self.m2 += delta * (value - self.mean);
    }

    fn finish(&self, group: String, time: Option<TimePoint>) -> GroupSummary {
        let (mean, sem) = match self.count {
            0 => (f64::NAN, f64::NAN),
            1 => (self.mean, f64::NAN),
            n => {
                let variance = self.m2 / (n - 1) as f64;
                (self.mean, (variance / n as f64).sqrt())
            }
        };
        GroupSummary {
            group,
            time,
            count: self.count,
            mean,
            sem,
        }
    }
}

fn summarize<'a, I>(observations: I, by_time: bool) -> SummaryTable
where
    I: IntoIterator<Item = &'a Observation>,
{
    let mut keys: Vec<(String, Option<TimePoint>)> = Vec::new();
    let mut buckets: Vec<Accumulator> = Vec::new();

    for observation in observations {
        let Some(value) = observation.measurement else {
            continue;
        };
        let time = by_time.then_some(observation.time);
        let idx = match keys
            .iter()
            .position(|(g, t)| *g == observation.group && *t == time)
        {
            Some(idx) => idx,
            None => {
                keys.push((observation.group.clone(), time));
                buckets.push(Accumulator::default());
                keys.len() - 1
            }
        };
        buckets[idx].push(value);
    }

    let rows = keys
        .into_iter()
        .zip(buckets)
        .map(|((group, time), acc)| acc.finish(group, time))
        .collect::<Vec<_>>();
    SummaryTable::from(rows)
}

/// One row per group, in first-seen order; null measurements are ignored
pub fn summarize_groups<'a, I>(observations: I) -> SummaryTable
where
    I: IntoIterator<Item = &'a Observation>,
{
    summarize(observations, false)
}

/// One row per (group, time), in first-seen order; null measurements are ignored
pub fn summarize_trend<'a, I>(observations: I) -> SummaryTable
where
    I: IntoIterator<Item = &'a Observation>,
{
    summarize(observations, true)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn obs(group: &str, day: i32, value: Option<f64>) -> Observation {
        Observation {
            row: 0,
            group: group.to_string(),
            time: TimePoint::from(day),
            measurement: value,
        }
    }

    #[test]
    fn test_group_summary() {
        let data = vec![
            obs("G2", 0, Some(4.0)),
            obs("G1", 0, Some(1.0)),
            obs("G2", 0, Some(6.0)),
            obs("G1", 0, Some(3.0)),
            obs("G1", 0, None),
            obs("G2", 0, Some(5.0)),
        ];
        let table = summarize_groups(&data);

        assert_eq!(table.len(), 2);
        // first-seen order
        assert_eq!(table.rows()[0].group, "G2");

        let g1 = table.get("G1").unwrap();
        assert_eq!(g1.count, 2);
        assert!((g1.mean - 2.0).abs() < 1e-12);
        // stdev = sqrt(2), sem = sqrt(2)/sqrt(2) = 1
        assert!((g1.sem - 1.0).abs() < 1e-12);

        let g2 = table.get("G2").unwrap();
        assert_eq!(g2.count, 3);
        assert!((g2.mean - 5.0).abs() < 1e-12);
        assert!((g2.sem - (1.0f64 / 3.0).sqrt()).abs() < 1e-12);
    }

    #[test]
    fn test_single_observation_has_nan_sem() {
        let data = vec![obs("G1", 0, Some(7.5))];
        let table = summarize_groups(&data);
        assert_eq!(table.rows()[0].count, 1);
        assert_eq!(table.rows()[0].mean, 7.5);
        assert!(table.rows()[0].sem.is_nan());
    }

    #[test]
    fn test_all_null_group_is_absent() {
        let data = vec![obs("G1", 0, None), obs("G2", 0, Some(1.0))];
        let table = summarize_groups(&data);
        assert_eq!(table.len(), 1);
        assert!(table.get("G1").is_none());
    }

    #[test]
    fn test_empty_input() {
        let data: Vec<Observation> = Vec::new();
        assert!(summarize_groups(&data).is_empty());
        assert!(summarize_trend(&data).is_empty());
    }

    #[test]
    fn test_trend_sorted_by_label() {
        let data = vec![
            obs("G2", 7, Some(2.0)),
            obs("G1", 7, Some(1.0)),
            obs("G1", 0, Some(1.0)),
            obs("G2", 0, Some(2.0)),
        ];
        let table = summarize_trend(&data).sorted();
        let keys: Vec<(String, String)> = table
            .rows()
            .iter()
            .map(|r| (r.group.clone(), r.time.unwrap().to_string()))
            .collect();
        assert_eq!(
            keys,
            vec![
                ("G1".to_string(), "0".to_string()),
                ("G1".to_string(), "7".to_string()),
                ("G2".to_string(), "0".to_string()),
                ("G2".to_string(), "7".to_string()),
            ]
        );
    }
}
