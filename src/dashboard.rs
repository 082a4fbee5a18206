//! The cluster overview page: query slots in, chart and table payloads out.

use chrono::{DateTime, Utc};
use futures::future::join_all;
use parking_lot::Mutex;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info};

use crate::{
    charts::{palette_color, CartesianChart, DonutChart, RadialGauge},
    models::MetricResponse,
    parsers::{
        parse_instant_to_named_values, parse_instant_to_scalar, parse_pod_records,
        parse_range_to_latest_scalar,
    },
    provider::{store, Clock, MetricsProvider},
    query::{FetchHandle, QueryParams, QuerySlot, QueryState},
    table::PodTable,
    time_range::TimeRange,
    transform::transform_response,
};

pub const TIME_RANGE_OPTIONS: [TimeRange; 3] = [
    TimeRange::LAST_60_MINUTES,
    TimeRange::LAST_30_MINUTES,
    TimeRange::LAST_15_MINUTES,
];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimeRangeOption {
    pub value: TimeRange,
    pub label: String,
}

impl From<TimeRange> for TimeRangeOption {
    fn from(value: TimeRange) -> Self {
        Self {
            label: format!("Last {} minutes", value.minutes()),
            value,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OverviewSection {
    pub title: String,
    pub description: String,
    pub loading: bool,
    pub pod_status: DonutChart,
    pub memory: RadialGauge,
    pub cpu: RadialGauge,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageSection {
    pub title: String,
    pub description: String,
    pub loading: bool,
    pub time_range: TimeRange,
    pub time_range_options: Vec<TimeRangeOption>,
    pub cpu: CartesianChart,
    pub memory: CartesianChart,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryError {
    pub query: String,
    pub message: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardView {
    pub generated_at: DateTime<Utc>,
    /// True while any query on the page is pending.
    pub loading: bool,
    pub overview: OverviewSection,
    pub usage: UsageSection,
    pub pods: PodTable,
    pub errors: Vec<QueryError>,
}

pub struct Dashboard {
    clock: Arc<dyn Clock>,
    time_range: Mutex<TimeRange>,
    pod_status: QuerySlot,
    cpu_limit: QuerySlot,
    cpu_usage: QuerySlot,
    memory_limit: QuerySlot,
    memory_usage: QuerySlot,
    pod_info: QuerySlot,
    pod_cpu_range: QuerySlot,
    pod_memory_range: QuerySlot,
}

impl Dashboard {
    pub fn new(
        provider: Arc<dyn MetricsProvider>,
        clock: Arc<dyn Clock>,
        project_id: u64,
        time_range: TimeRange,
    ) -> Self {
        let slot = || QuerySlot::new(provider.clone(), project_id);
        Self {
            clock,
            time_range: Mutex::new(time_range),
            pod_status: slot(),
            cpu_limit: slot(),
            cpu_usage: slot(),
            memory_limit: slot(),
            memory_usage: slot(),
            pod_info: slot(),
            pod_cpu_range: slot(),
            pod_memory_range: slot(),
        }
    }

    fn slots(&self) -> [&QuerySlot; 8] {
        [
            &self.pod_status,
            &self.cpu_limit,
            &self.cpu_usage,
            &self.memory_limit,
            &self.memory_usage,
            &self.pod_info,
            &self.pod_cpu_range,
            &self.pod_memory_range,
        ]
    }

    pub fn time_range(&self) -> TimeRange {
        *self.time_range.lock()
    }

    /// Issues every query whose parameters changed since the last load, and
    /// re-issues range queries whose data has aged out of the window.
    /// Must be called from within a tokio runtime.
    pub fn load(&self) -> Vec<FetchHandle> {
        let instant = [
            (&self.pod_status, store::POD_STATUS),
            (&self.cpu_limit, store::CPU_LIMIT),
            (&self.cpu_usage, store::CPU_USAGE),
            (&self.memory_limit, store::MEMORY_LIMIT),
            (&self.memory_usage, store::MEMORY_USAGE),
            (&self.pod_info, store::POD_INFO),
        ];

        let mut handles: Vec<FetchHandle> = instant
            .into_iter()
            .filter_map(|(slot, query)| slot.update(QueryParams::instant(query)))
            .collect();

        let range = self.time_range.lock();
        handles.extend(self.load_ranges(*range));
        handles
    }

    /// Callers hold the `time_range` lock so the issued window always matches
    /// the selected one.
    fn load_ranges(&self, range: TimeRange) -> Vec<FetchHandle> {
        let cutoff = window_start(self.clock.now(), range);
        [
            (&self.pod_cpu_range, store::POD_CPU_USAGE_RANGE),
            (&self.pod_memory_range, store::POD_MEMORY_USAGE_RANGE),
        ]
        .into_iter()
        .filter_map(|(slot, query)| {
            let params = QueryParams::range(query, range);
            if slot.params().as_ref() == Some(&params) && expired(&slot.state(), cutoff) {
                debug!(query, time_range = %range, "range data aged out, refetching");
                return Some(slot.fetch(params));
            }
            slot.update(params)
        })
        .collect()
    }

    /// Selects a new window and restarts the range queries. In-flight range
    /// fetches for the previous window are superseded. Returns `false` when
    /// the window is unchanged.
    pub fn set_time_range(&self, range: TimeRange) -> bool {
        let mut current = self.time_range.lock();
        if *current == range {
            return false;
        }
        *current = range;
        info!(time_range = %range, "time range changed");
        self.load_ranges(range);
        true
    }

    /// Re-issues every query with its current parameters.
    pub fn refresh(&self) -> Vec<FetchHandle> {
        self.slots()
            .into_iter()
            .filter_map(QuerySlot::refetch)
            .collect()
    }

    pub fn is_loading(&self) -> bool {
        self.slots().iter().any(|slot| slot.is_loading())
    }

    /// Waits for every slot to settle, then builds the view.
    pub async fn settled(&self) -> DashboardView {
        join_all(self.slots().map(QuerySlot::settled)).await;
        self.snapshot()
    }

    pub fn snapshot(&self) -> DashboardView {
        let now = self.clock.now();
        let range = self.time_range();

        let pod_status = self.pod_status.state();
        let cpu_limit = self.cpu_limit.state();
        let cpu_usage = self.cpu_usage.state();
        let memory_limit = self.memory_limit.state();
        let memory_usage = self.memory_usage.state();
        let pod_info = self.pod_info.state();
        let pod_cpu = self.pod_cpu_range.state();
        let pod_memory = self.pod_memory_range.state();

        let overview = OverviewSection {
            title: "Kubernetes Cluster Overview".to_string(),
            description: "An overview of pod statuses and resource usage.".to_string(),
            loading: any_loading(&[&pod_status, &cpu_limit, &cpu_usage, &memory_limit, &memory_usage]),
            pod_status: DonutChart::new(
                "Pod Status",
                "Pods",
                &parse_instant_to_named_values(pod_status.data.as_ref(), "phase"),
            ),
            memory: RadialGauge::new(
                "memory",
                "Memory",
                "Gi",
                palette_color(0),
                parse_range_to_latest_scalar(memory_usage.data.as_ref()),
                parse_instant_to_scalar(memory_limit.data.as_ref()),
            ),
            cpu: RadialGauge::new(
                "cpu",
                "CPU",
                "Cores",
                palette_color(1),
                parse_range_to_latest_scalar(cpu_usage.data.as_ref()),
                parse_instant_to_scalar(cpu_limit.data.as_ref()),
            ),
        };

        // series with nothing inside the selected window are left out
        let cutoff = Some(window_start(now, range));
        let cpu = transform_response(pod_cpu.data.as_ref(), "pod", cutoff);
        let memory = transform_response(pod_memory.data.as_ref(), "pod", cutoff);

        let usage = UsageSection {
            title: "Per-Pod Resource Usage".to_string(),
            description: "CPU and Memory usage for individual pods.".to_string(),
            loading: any_loading(&[&pod_cpu, &pod_memory]),
            time_range: range,
            time_range_options: TIME_RANGE_OPTIONS.into_iter().map(Into::into).collect(),
            cpu: CartesianChart::area("CPU Usage (cores)", cpu.rows, &cpu.config)
                .unstacked()
                .with_y_axis_label("cores"),
            memory: CartesianChart::area("Memory Usage (MB)", memory.rows, &memory.config)
                .unstacked()
                .with_y_axis_label("MB"),
        };

        let pods = PodTable::new(
            &parse_pod_records(pod_info.data.as_ref()),
            pod_info.loading,
            now,
        );

        let errors = self
            .slots()
            .iter()
            .zip([
                &pod_status, &cpu_limit, &cpu_usage, &memory_limit, &memory_usage, &pod_info,
                &pod_cpu, &pod_memory,
            ])
            .filter_map(|(slot, state)| {
                let error = state.error.as_ref()?;
                Some(QueryError {
                    query: slot.params().map(|p| p.query).unwrap_or_default(),
                    message: error.to_string(),
                })
            })
            .collect();

        DashboardView {
            generated_at: now,
            loading: overview.loading || usage.loading || pods.loading,
            overview,
            usage,
            pods,
            errors,
        }
    }
}

fn any_loading(states: &[&QueryState]) -> bool {
    states.iter().any(|s| s.loading)
}

/// Start of the window ending at `now`, unix seconds.
fn window_start(now: DateTime<Utc>, range: TimeRange) -> f64 {
    (now.timestamp() - range.seconds()) as f64
}

/// Settled data whose newest sample is older than `cutoff`.
fn expired(state: &QueryState, cutoff: f64) -> bool {
    if state.loading {
        return false;
    }
    state
        .data
        .as_ref()
        .and_then(MetricResponse::latest_timestamp)
        .is_some_and(|latest| latest < cutoff)
}
