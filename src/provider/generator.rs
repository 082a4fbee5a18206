use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::HashMap;

use crate::models::{Sample, Series};

/// Source of uniform samples in `[0, 1)` used to jitter synthetic series.
pub trait SampleGenerator: Send + Sync {
    fn next_unit(&self) -> f64;
}

/// `StdRng`-backed generator. Seeded instances replay the same sequence.
pub struct RandomGenerator {
    rng: Mutex<StdRng>,
}

impl RandomGenerator {
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    pub fn from_entropy() -> Self {
        Self {
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }
}

impl SampleGenerator for RandomGenerator {
    fn next_unit(&self) -> f64 {
        self.rng.lock().gen::<f64>()
    }
}

/// Always yields the same fraction. Handy when exact values matter.
#[derive(Debug, Clone, Copy)]
pub struct ConstantGenerator(pub f64);

impl SampleGenerator for ConstantGenerator {
    fn next_unit(&self) -> f64 {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    /// CPU in cores, two decimals.
    Cpu,
    /// Memory in MB, whole numbers.
    Memory,
}

impl ResourceKind {
    /// Pods serving an API run lighter than workers and connectors.
    pub fn ceiling(&self, pod: &str) -> f64 {
        let api = pod.contains("api");
        match (self, api) {
            (ResourceKind::Cpu, true) => 0.5,
            (ResourceKind::Cpu, false) => 1.5,
            (ResourceKind::Memory, true) => 300.0,
            (ResourceKind::Memory, false) => 800.0,
        }
    }

    fn format(&self, value: f64) -> String {
        match self {
            ResourceKind::Cpu => format!("{value:.2}"),
            ResourceKind::Memory => format!("{value:.0}"),
        }
    }
}

/// Builds one matrix series per pod, sampled every minute from
/// `now - window_minutes` up to `now` inclusive.
pub fn usage_series(
    pods: &[&str],
    window_minutes: u32,
    kind: ResourceKind,
    now_ms: i64,
    generator: &dyn SampleGenerator,
) -> Vec<Series> {
    pods.iter()
        .map(|pod| {
            let ceiling = kind.ceiling(pod);
            let samples = (0..=i64::from(window_minutes))
                .rev()
                .map(|i| {
                    let timestamp = (now_ms - i * 60_000).div_euclid(1000);
                    let value = (generator.next_unit() * ceiling).max(0.0);
                    Sample::new(timestamp as f64, kind.format(value))
                })
                .collect();

            let metric = HashMap::from([("pod".to_string(), pod.to_string())]);
            Series::range(metric, samples)
        })
        .collect()
}
