//! Pivot of range vectors into timestamp-indexed chart rows.

use serde::ser::{Serialize, SerializeMap, Serializer};
use std::collections::{BTreeMap, HashMap};

use crate::charts::palette_color;
use crate::models::{MetricResponse, Series};

/// One x-axis position: `date` in milliseconds plus one value per series.
/// A series without a sample at this exact timestamp maps to `None`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ChartRow {
    pub date: f64,
    pub values: BTreeMap<String, Option<f64>>,
}

impl ChartRow {
    pub const DATE_KEY: &'static str = "date";

    pub fn get(&self, series: &str) -> Option<f64> {
        self.values.get(series).copied().flatten()
    }
}

impl Serialize for ChartRow {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.values.len() + 1))?;
        map.serialize_entry(Self::DATE_KEY, &self.date)?;
        for (name, value) in &self.values {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct SeriesStyle {
    pub label: String,
    pub color: String,
}

impl SeriesStyle {
    pub fn new(label: impl Into<String>, color: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            color: color.into(),
        }
    }
}

/// Series name to display style, in series enumeration order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SeriesDisplayConfig {
    entries: Vec<(String, SeriesStyle)>,
}

impl SeriesDisplayConfig {
    /// Adds `name` unless it is already configured. Returns whether it was added.
    pub fn insert(&mut self, name: impl Into<String>, style: SeriesStyle) -> bool {
        let name = name.into();
        if self.get(&name).is_some() {
            return false;
        }
        self.entries.push((name, style));
        true
    }

    pub fn get(&self, name: &str) -> Option<&SeriesStyle> {
        self.entries
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, style)| style)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &SeriesStyle)> {
        self.entries.iter().map(|(key, style)| (key.as_str(), style))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Serialize for SeriesDisplayConfig {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, style) in &self.entries {
            map.serialize_entry(name, style)?;
        }
        map.end()
    }
}

#[derive(Debug, Clone, PartialEq, Default, serde::Serialize)]
pub struct RangeChartData {
    pub rows: Vec<ChartRow>,
    pub config: SeriesDisplayConfig,
}

impl RangeChartData {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty() && self.config.is_empty()
    }
}

/// Pivots matrix `series` into rows keyed by timestamp.
///
/// Series are named by their `label_key` label (`series-<index>` when it is
/// missing, `date-<index>` when it would shadow the x-axis key); a repeated
/// name keeps the first series. With a `cutoff` (unix
/// seconds) only series holding at least one sample at or after it are kept.
/// Values are matched by exact timestamp; nothing is interpolated.
pub fn transform_range(series: &[Series], label_key: &str, cutoff: Option<f64>) -> RangeChartData {
    let mut config = SeriesDisplayConfig::default();
    let mut lookups: Vec<(String, HashMap<u64, Option<f64>>)> = Vec::new();
    let mut timestamps: Vec<f64> = Vec::new();

    for (index, s) in series.iter().enumerate() {
        let samples = s.values.as_deref().unwrap_or_default();

        if let Some(cutoff) = cutoff {
            if !samples.iter().any(|sample| sample.timestamp() >= cutoff) {
                continue;
            }
        }

        // `date` is the x-axis key of every row
        let name = match s.label(label_key) {
            Some(label) if label != ChartRow::DATE_KEY => label.to_string(),
            Some(label) => format!("{label}-{index}"),
            None => format!("series-{index}"),
        };
        let style = SeriesStyle::new(name.clone(), palette_color(config.len()));
        if !config.insert(name.clone(), style) {
            continue;
        }

        let mut by_ts = HashMap::with_capacity(samples.len());
        for sample in samples.iter().filter(|sample| sample.timestamp().is_finite()) {
            timestamps.push(sample.timestamp());
            by_ts
                .entry(sample.timestamp().to_bits())
                .or_insert_with(|| sample.value());
        }
        lookups.push((name, by_ts));
    }

    timestamps.sort_by(f64::total_cmp);
    timestamps.dedup();

    let rows = timestamps
        .into_iter()
        .map(|ts| ChartRow {
            date: ts * 1000.0,
            values: lookups
                .iter()
                .map(|(name, by_ts)| (name.clone(), by_ts.get(&ts.to_bits()).copied().flatten()))
                .collect(),
        })
        .collect();

    RangeChartData { rows, config }
}

/// [`transform_range`] over an optional payload; an absent payload yields an
/// empty chart.
pub fn transform_response(
    response: Option<&MetricResponse>,
    label_key: &str,
    cutoff: Option<f64>,
) -> RangeChartData {
    response
        .map(|r| transform_range(r.result(), label_key, cutoff))
        .unwrap_or_default()
}
