use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::models::PodInfo;

/// Placeholder rows shown while the pod query is in flight.
pub const SKELETON_ROWS: usize = 5;

pub const POD_TABLE_COLUMNS: [&str; 5] = [
    "Pod Name",
    "Last Deployed",
    "Restarts",
    "CPU Usage",
    "Memory Usage",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BadgeVariant {
    Secondary,
    Destructive,
}

impl BadgeVariant {
    pub fn for_restarts(restarts: u32) -> Self {
        if restarts > 0 {
            BadgeVariant::Destructive
        } else {
            BadgeVariant::Secondary
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PodRow {
    pub pod_name: String,
    pub last_deployed: String,
    pub restarts: u32,
    pub restart_badge: BadgeVariant,
    pub cpu_usage: String,
    pub memory_usage: String,
}

impl PodRow {
    pub fn from_pod(pod: &PodInfo, now: DateTime<Utc>) -> Self {
        Self {
            pod_name: pod.pod_name.clone(),
            last_deployed: relative_time(pod.created_at, now),
            restarts: pod.restart_count,
            restart_badge: BadgeVariant::for_restarts(pod.restart_count),
            cpu_usage: format_cores(pod.cpu_cores.as_deref()),
            memory_usage: format_bytes(&pod.memory_bytes),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum TableRow {
    Data(PodRow),
    Skeleton,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PodTable {
    pub title: String,
    pub description: String,
    pub columns: Vec<String>,
    pub loading: bool,
    pub rows: Vec<TableRow>,
}

impl PodTable {
    pub fn new(pods: &[PodInfo], loading: bool, now: DateTime<Utc>) -> Self {
        let rows = if loading {
            vec![TableRow::Skeleton; SKELETON_ROWS]
        } else {
            pods.iter()
                .map(|pod| TableRow::Data(PodRow::from_pod(pod, now)))
                .collect()
        };

        Self {
            title: "Pod Status Details".to_string(),
            description: "Detailed information for individual pods running in the cluster."
                .to_string(),
            columns: POD_TABLE_COLUMNS.iter().map(|c| c.to_string()).collect(),
            loading,
            rows,
        }
    }
}

pub fn format_bytes(bytes: &str) -> String {
    match bytes.trim().parse::<f64>() {
        Ok(b) if b.is_finite() => format!("{:.2} MB", b / 1024.0 / 1024.0),
        _ => "-".to_string(),
    }
}

pub fn format_cores(cores: Option<&str>) -> String {
    match cores.map(|c| c.trim().parse::<f64>()) {
        Some(Ok(c)) if c.is_finite() => format!("{c:.2} cores"),
        _ => "-".to_string(),
    }
}

/// Human distance between `then` (unix seconds) and `now`, e.g.
/// "3 days ago" or "in about 2 hours".
pub fn relative_time(then: f64, now: DateTime<Utc>) -> String {
    let now_secs = now.timestamp_millis() as f64 / 1000.0;
    let delta = now_secs - then;
    let distance = distance_words(delta.abs());
    if delta >= 0.0 {
        format!("{distance} ago")
    } else {
        format!("in {distance}")
    }
}

const MINUTES_IN_DAY: f64 = 1440.0;
const MINUTES_IN_MONTH: f64 = 43200.0;

fn plural(n: i64, unit: &str) -> String {
    if n == 1 {
        format!("1 {unit}")
    } else {
        format!("{n} {unit}s")
    }
}

fn distance_words(seconds: f64) -> String {
    let minutes = (seconds / 60.0).round();

    if minutes < 1.0 {
        return "less than a minute".to_string();
    }
    if minutes < 45.0 {
        return plural(minutes as i64, "minute");
    }
    if minutes < 90.0 {
        return "about 1 hour".to_string();
    }
    if minutes < MINUTES_IN_DAY {
        return format!("about {}", plural((minutes / 60.0).round() as i64, "hour"));
    }
    if minutes < 2520.0 {
        return "1 day".to_string();
    }
    if minutes < MINUTES_IN_MONTH {
        return plural((minutes / MINUTES_IN_DAY).round() as i64, "day");
    }
    if minutes < 2.0 * MINUTES_IN_MONTH {
        return format!("about {}", plural((minutes / MINUTES_IN_MONTH).round() as i64, "month"));
    }

    let months = (minutes / MINUTES_IN_MONTH).floor() as i64;
    if months < 12 {
        return plural(months, "month");
    }

    let years = months / 12;
    match months % 12 {
        0..=2 => format!("about {}", plural(years, "year")),
        3..=8 => format!("over {}", plural(years, "year")),
        _ => format!("almost {}", plural(years + 1, "year")),
    }
}
