//! Chart descriptors handed to the browser renderer.
//!
//! Each chart is plain data: the renderer draws axes, tooltips and legends
//! from it. Loading placeholders are the caller's business, not the chart's.

use serde::Serialize;

use crate::models::NamedValue;
use crate::transform::{ChartRow, SeriesDisplayConfig};

/// Theme colors for per-series and per-category fills.
pub const CHART_PALETTE: [&str; 5] = [
    "var(--chart-1)",
    "var(--chart-2)",
    "var(--chart-3)",
    "var(--chart-4)",
    "var(--chart-5)",
];

/// Shades used for donut wedges that carry no fill of their own.
pub const DONUT_PALETTE: [&str; 5] = [
    "hsl(var(--primary))",
    "hsl(var(--primary) / 0.9)",
    "hsl(var(--primary) / 0.8)",
    "hsl(var(--primary) / 0.7)",
    "hsl(var(--primary) / 0.6)",
];

pub const DONUT_INNER_RADIUS: f64 = 0.6;

/// Palette entry for position `index`, wrapping around.
pub fn palette_color(index: usize) -> String {
    CHART_PALETTE[index % CHART_PALETTE.len()].to_string()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CartesianKind {
    Line,
    Area,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SeriesSpec {
    pub data_key: String,
    pub name: String,
    pub color: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stack_id: Option<String>,
}

/// Line or area chart over timestamp-keyed rows.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartesianChart {
    pub kind: CartesianKind,
    pub title: String,
    pub x_key: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y_axis_label: Option<String>,
    pub stacked: bool,
    pub series: Vec<SeriesSpec>,
    pub data: Vec<ChartRow>,
}

impl CartesianChart {
    /// Area charts stack their series.
    pub fn area(title: impl Into<String>, rows: Vec<ChartRow>, config: &SeriesDisplayConfig) -> Self {
        Self::build(CartesianKind::Area, title.into(), rows, config, true)
    }

    /// Line charts never stack.
    pub fn line(title: impl Into<String>, rows: Vec<ChartRow>, config: &SeriesDisplayConfig) -> Self {
        Self::build(CartesianKind::Line, title.into(), rows, config, false)
    }

    /// Area chart with every series drawn from the baseline.
    pub fn unstacked(mut self) -> Self {
        if self.kind == CartesianKind::Area {
            self.stacked = false;
            for s in &mut self.series {
                s.stack_id = None;
            }
        }
        self
    }

    pub fn with_y_axis_label(mut self, label: impl Into<String>) -> Self {
        self.y_axis_label = Some(label.into());
        self
    }

    fn build(
        kind: CartesianKind,
        title: String,
        rows: Vec<ChartRow>,
        config: &SeriesDisplayConfig,
        stacked: bool,
    ) -> Self {
        let series = config
            .iter()
            .map(|(key, style)| SeriesSpec {
                data_key: key.to_string(),
                name: style.label.clone(),
                color: style.color.clone(),
                stack_id: stacked.then(|| "a".to_string()),
            })
            .collect();

        Self {
            kind,
            title,
            x_key: ChartRow::DATE_KEY.to_string(),
            y_axis_label: None,
            stacked,
            series,
            data: rows,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DonutSlice {
    pub name: String,
    pub value: f64,
    pub fill: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DonutChart {
    pub title: String,
    pub inner_radius: f64,
    pub slices: Vec<DonutSlice>,
    pub total: f64,
    pub center_label: String,
    pub caption: String,
}

impl DonutChart {
    /// One wedge per row. Rows that bring their own fill keep it; the rest
    /// cycle through [`DONUT_PALETTE`] by row index.
    pub fn new(title: impl Into<String>, caption: impl Into<String>, rows: &[NamedValue]) -> Self {
        let slices: Vec<DonutSlice> = rows
            .iter()
            .enumerate()
            .map(|(index, row)| DonutSlice {
                name: row.name.clone(),
                value: row.value,
                fill: if row.fill.is_empty() {
                    DONUT_PALETTE[index % DONUT_PALETTE.len()].to_string()
                } else {
                    row.fill.clone()
                },
            })
            .collect();
        let total: f64 = slices.iter().map(|s| s.value).sum();

        Self {
            title: title.into(),
            inner_radius: DONUT_INNER_RADIUS,
            slices,
            total,
            center_label: format_total(total),
            caption: caption.into(),
        }
    }
}

/// Whole totals print with thousands separators, fractional ones with two
/// decimals.
fn format_total(total: f64) -> String {
    if total.fract() != 0.0 || !total.is_finite() {
        return format!("{total:.2}");
    }

    let digits = format!("{:.0}", total.abs());
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if total < 0.0 {
        out.push('-');
    }
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// Single-metric gauge: the used share of a limit plus its complement.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RadialGauge {
    pub metric_key: String,
    pub title: String,
    pub unit: String,
    pub color: String,
    pub used: f64,
    pub limit: f64,
    /// `limit - used`, floored at zero.
    pub remaining: f64,
    pub percentage: f64,
    pub over_limit: bool,
    pub summary: String,
    pub percentage_label: String,
}

impl RadialGauge {
    pub fn new(
        metric_key: impl Into<String>,
        title: impl Into<String>,
        unit: impl Into<String>,
        color: impl Into<String>,
        used: f64,
        limit: f64,
    ) -> Self {
        let unit = unit.into();
        let percentage = if limit > 0.0 { used / limit * 100.0 } else { 0.0 };
        let summary = format!("{used:.1} / {limit:.1} {unit}").trim_end().to_string();

        Self {
            metric_key: metric_key.into(),
            title: title.into(),
            color: color.into(),
            used,
            limit,
            remaining: (limit - used).max(0.0),
            percentage,
            over_limit: used > limit,
            summary,
            percentage_label: format!("{percentage:.1}%"),
            unit,
        }
    }
}
