//! Query slots: one per chart or table on the dashboard.
//!
//! A slot runs its provider query on a background task and publishes
//! pending/success/failure state through a watch channel. Every fetch bumps
//! the slot's generation; a task whose generation is no longer current drops
//! its result instead of publishing it.

use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::{
    metrics,
    models::MetricResponse,
    provider::MetricsProvider,
    time_range::TimeRange,
    DashboardError,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryParams {
    pub query: String,
    pub time_range: Option<TimeRange>,
}

impl QueryParams {
    pub fn instant(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            time_range: None,
        }
    }

    pub fn range(query: impl Into<String>, time_range: TimeRange) -> Self {
        Self {
            query: query.into(),
            time_range: Some(time_range),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct QueryState {
    pub loading: bool,
    pub data: Option<MetricResponse>,
    pub error: Option<DashboardError>,
}

struct SlotInner {
    generation: AtomicU64,
    state: watch::Sender<QueryState>,
}

impl SlotInner {
    fn is_current(&self, generation: u64) -> bool {
        self.generation.load(Ordering::SeqCst) == generation
    }
}

/// Handle to one fetch. Dropping it leaves the fetch running.
pub struct FetchHandle {
    generation: u64,
    inner: Arc<SlotInner>,
    task: JoinHandle<()>,
}

impl FetchHandle {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Whether this fetch's result will still be published.
    pub fn is_current(&self) -> bool {
        self.inner.is_current(self.generation)
    }

    /// Invalidates the fetch and stops its task. A superseded handle is left
    /// alone so it cannot disturb the fetch that replaced it.
    pub fn cancel(&self) {
        let next = self.generation + 1;
        if self
            .inner
            .generation
            .compare_exchange(self.generation, next, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
        {
            self.task.abort();
            self.inner.state.send_modify(|s| s.loading = false);
            debug!(generation = self.generation, "fetch cancelled");
        }
    }

    /// Waits for the fetch task to end, published or discarded.
    pub async fn finished(self) {
        let _ = self.task.await;
    }
}

pub struct QuerySlot {
    project_id: u64,
    provider: Arc<dyn MetricsProvider>,
    params: Mutex<Option<QueryParams>>,
    inner: Arc<SlotInner>,
}

impl QuerySlot {
    pub fn new(provider: Arc<dyn MetricsProvider>, project_id: u64) -> Self {
        let (state, _) = watch::channel(QueryState::default());
        Self {
            project_id,
            provider,
            params: Mutex::new(None),
            inner: Arc::new(SlotInner {
                generation: AtomicU64::new(0),
                state,
            }),
        }
    }

    pub fn params(&self) -> Option<QueryParams> {
        self.params.lock().clone()
    }

    pub fn state(&self) -> QueryState {
        self.inner.state.borrow().clone()
    }

    pub fn is_loading(&self) -> bool {
        self.inner.state.borrow().loading
    }

    pub fn subscribe(&self) -> watch::Receiver<QueryState> {
        self.inner.state.subscribe()
    }

    /// Starts a fetch only when `params` differ from the last ones issued.
    pub fn update(&self, params: QueryParams) -> Option<FetchHandle> {
        if self.params.lock().as_ref() == Some(&params) {
            return None;
        }
        Some(self.fetch(params))
    }

    /// Re-issues the last query, if any.
    pub fn refetch(&self) -> Option<FetchHandle> {
        let params = self.params()?;
        Some(self.fetch(params))
    }

    /// Starts a fetch, superseding any fetch still in flight. Must be called
    /// from within a tokio runtime.
    pub fn fetch(&self, params: QueryParams) -> FetchHandle {
        let generation = self.inner.generation.fetch_add(1, Ordering::SeqCst) + 1;
        *self.params.lock() = Some(params.clone());
        self.inner.state.send_modify(|s| s.loading = true);

        let inner = self.inner.clone();
        let provider = self.provider.clone();
        let project_id = self.project_id;

        let task = tokio::spawn(async move {
            let started = Instant::now();
            let result = provider
                .query(project_id, &params.query, params.time_range.as_ref())
                .await;
            metrics::record_query(&params.query, started.elapsed(), result.is_ok());

            if let Err(e) = &result {
                warn!(query = %params.query, error = %e, "metrics query failed");
            }

            let published = inner.state.send_if_modified(|state| {
                if !inner.is_current(generation) {
                    return false;
                }
                state.loading = false;
                match result {
                    Ok(data) => {
                        state.data = Some(data);
                        state.error = None;
                    }
                    Err(e) => {
                        state.data = None;
                        state.error = Some(e);
                    }
                }
                true
            });

            if !published {
                metrics::record_stale_result(&params.query);
                debug!(query = %params.query, generation, "discarding superseded result");
            }
        });

        FetchHandle {
            generation,
            inner: self.inner.clone(),
            task,
        }
    }

    /// Resolves once the slot is no longer loading.
    pub async fn settled(&self) -> QueryState {
        let mut rx = self.subscribe();
        if let Ok(state) = rx.wait_for(|s| !s.loading).await {
            return state.clone();
        }
        self.state()
    }
}
