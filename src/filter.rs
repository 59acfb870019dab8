//! Group/time filtering.
//!
//! Filters never fail: an empty result is a valid input to the summarizer,
//! which then produces an empty table.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use crate::config::AnalysisConfig;
use crate::dataset::{Dataset, Observation, TimePoint};

/// Which time points feed the statistics step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeSelection {
    /// A single exact time point
    At(TimePoint),
    /// All time points pooled together
    Pooled,
}

impl fmt::Display for TimeSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimeSelection::At(t) => write!(f, "{}", t),
            TimeSelection::Pooled => write!(f, "pooled"),
        }
    }
}

impl FromStr for TimeSelection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("pooled") || s.eq_ignore_ascii_case("all") {
            return Ok(TimeSelection::Pooled);
        }
        s.parse::<f64>()
            .ok()
            .and_then(TimePoint::new)
            .map(TimeSelection::At)
            .ok_or_else(|| format!("Invalid time point '{}': expected a number or 'pooled'", s))
    }
}

impl Serialize for TimeSelection {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            TimeSelection::At(t) => serializer.serialize_f64(t.value()),
            TimeSelection::Pooled => serializer.serialize_str("pooled"),
        }
    }
}

impl<'de> Deserialize<'de> for TimeSelection {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Integer(i64),
            Number(f64),
            Text(String),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Integer(v) => TimePoint::new(v as f64)
                .map(TimeSelection::At)
                .ok_or_else(|| serde::de::Error::custom("invalid time point")),
            Raw::Number(v) => TimePoint::new(v)
                .map(TimeSelection::At)
                .ok_or_else(|| serde::de::Error::custom("time point must not be NaN")),
            Raw::Text(s) => s.parse().map_err(serde::de::Error::custom),
        }
    }
}

/// Restricts observations by time window, exact time point and group set
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ObservationFilter {
    time_range: Option<(TimePoint, TimePoint)>,
    time_point: Option<TimePoint>,
    groups: Option<BTreeSet<String>>,
}

impl ObservationFilter {
    /// A filter that keeps everything
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep observations with `lo <= time <= hi`
    pub fn time_range(mut self, lo: TimePoint, hi: TimePoint) -> Self {
        self.time_range = Some((lo, hi));
        self
    }

    /// Keep observations at exactly this time point
    pub fn time_point(mut self, time: TimePoint) -> Self {
        self.time_point = Some(time);
        self
    }

    /// Keep observations at the selected time point, or all when pooled
    pub fn time_selection(self, selection: TimeSelection) -> Self {
        match selection {
            TimeSelection::At(t) => self.time_point(t),
            TimeSelection::Pooled => self,
        }
    }

    /// Keep observations whose group is in the set
    pub fn groups<I, S>(mut self, groups: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.groups = Some(groups.into_iter().map(Into::into).collect());
        self
    }

    /// Trend filter for a configuration: time window and group selection
    pub fn for_trend(config: &AnalysisConfig) -> Self {
        let mut filter = Self::new();
        if let Some((lo, hi)) = config.time_range {
            filter = filter.time_range(lo, hi);
        }
        if let Some(groups) = &config.selected_groups {
            filter = filter.groups(groups.iter().cloned());
        }
        filter
    }

    /// Statistics filter for a configuration: the trend filter narrowed to the
    /// statistic time point (pooled mode pools across the time window)
    pub fn for_statistics(config: &AnalysisConfig) -> Self {
        Self::for_trend(config).time_selection(config.statistic_time_point)
    }

    /// True if the observation passes every configured restriction
    pub fn matches(&self, observation: &Observation) -> bool {
        if let Some((lo, hi)) = self.time_range {
            if observation.time < lo || observation.time > hi {
                return false;
            }
        }
        if let Some(t) = self.time_point {
            if observation.time != t {
                return false;
            }
        }
        if let Some(groups) = &self.groups {
            if !groups.contains(&observation.group) {
                return false;
            }
        }
        true
    }

    /// Matching observations in source order (null measurements included)
    pub fn apply<'a>(&self, dataset: &'a Dataset) -> Vec<&'a Observation> {
        dataset
            .observations()
            .iter()
            .filter(|o| self.matches(o))
            .collect()
    }
}

/// Drop observations with a null measurement, yielding `(observation, value)`
pub fn measured<'a, I>(observations: I) -> impl Iterator<Item = (&'a Observation, f64)>
where
    I: IntoIterator<Item = &'a Observation>,
{
    observations
        .into_iter()
        .filter_map(|o| o.measurement.map(|v| (o, v)))
}
