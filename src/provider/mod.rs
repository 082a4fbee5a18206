//! Metrics query providers.
//!
//! The dashboard only talks to [`MetricsProvider`]; [`MockProvider`] answers
//! from canned payloads and synthesizes per-pod range data after an
//! artificial delay.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::debug;

use crate::{
    config::Config,
    models::{MetricResponse, QueryData},
    time_range::TimeRange,
    DashboardError, Result,
};

pub mod clock;
pub mod generator;
pub mod store;

pub use clock::{Clock, FixedClock, ManualClock, SystemClock};
pub use generator::{ConstantGenerator, RandomGenerator, ResourceKind, SampleGenerator};

#[async_trait]
pub trait MetricsProvider: Send + Sync {
    /// Run `query` for `project_id`. Range queries honour `time_range`,
    /// instant queries ignore it.
    async fn query(
        &self,
        project_id: u64,
        query: &str,
        time_range: Option<&TimeRange>,
    ) -> Result<MetricResponse>;
}

pub struct MockProvider {
    store: HashMap<String, QueryData>,
    generator: Arc<dyn SampleGenerator>,
    clock: Arc<dyn Clock>,
    delay: Duration,
    jitter: Duration,
}

impl MockProvider {
    pub const DEFAULT_DELAY: Duration = Duration::from_millis(500);

    pub fn new() -> Self {
        Self::with_parts(
            Arc::new(RandomGenerator::from_entropy()),
            Arc::new(SystemClock),
        )
    }

    pub fn with_parts(generator: Arc<dyn SampleGenerator>, clock: Arc<dyn Clock>) -> Self {
        Self {
            store: store::canned(clock.now()),
            generator,
            clock,
            delay: Self::DEFAULT_DELAY,
            jitter: Duration::ZERO,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        let generator: Arc<dyn SampleGenerator> = match config.mock_seed {
            Some(seed) => Arc::new(RandomGenerator::seeded(seed)),
            None => Arc::new(RandomGenerator::from_entropy()),
        };

        Self::with_parts(generator, Arc::new(SystemClock))
            .with_delay(config.mock_delay)
            .with_jitter(config.mock_jitter)
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn with_jitter(mut self, jitter: Duration) -> Self {
        self.jitter = jitter;
        self
    }

    /// Names of the queries this provider can answer.
    pub fn queries(&self) -> Vec<String> {
        let mut names: Vec<String> = self.store.keys().cloned().collect();
        names.push(store::POD_CPU_USAGE_RANGE.to_string());
        names.push(store::POD_MEMORY_USAGE_RANGE.to_string());
        names.sort();
        names
    }

    fn latency(&self) -> Duration {
        if self.jitter.is_zero() {
            return self.delay;
        }
        self.delay + self.jitter.mul_f64(self.generator.next_unit())
    }

    fn resolve(
        &self,
        project_id: u64,
        query: &str,
        time_range: Option<&TimeRange>,
    ) -> Result<MetricResponse> {
        let kind = match query {
            store::POD_CPU_USAGE_RANGE => Some(ResourceKind::Cpu),
            store::POD_MEMORY_USAGE_RANGE => Some(ResourceKind::Memory),
            _ => None,
        };

        if let Some(kind) = kind {
            let window = TimeRange::window_minutes(time_range);
            let now_ms = self.clock.now().timestamp_millis();
            let series = generator::usage_series(
                &store::POD_NAMES,
                window,
                kind,
                now_ms,
                self.generator.as_ref(),
            );
            return Ok(MetricResponse::matrix(project_id, series));
        }

        self.store
            .get(query)
            .map(|data| MetricResponse {
                project_id,
                data: data.clone(),
            })
            .ok_or_else(|| DashboardError::no_data(query))
    }
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MetricsProvider for MockProvider {
    async fn query(
        &self,
        project_id: u64,
        query: &str,
        time_range: Option<&TimeRange>,
    ) -> Result<MetricResponse> {
        let latency = self.latency();
        debug!(query, ?latency, "simulating metrics query");
        sleep(latency).await;
        self.resolve(project_id, query, time_range)
    }
}
