use chrono::{DateTime, Utc};
use std::collections::HashMap;

use crate::models::{QueryData, ResultType, Sample, Series};

pub const POD_STATUS: &str = "pod_status";
pub const POD_INFO: &str = "pod_info";
pub const CPU_LIMIT: &str = "cpu_limit";
pub const CPU_USAGE: &str = "cpu_usage";
pub const MEMORY_LIMIT: &str = "memory_limit";
pub const MEMORY_USAGE: &str = "memory_usage";
pub const POD_CPU_USAGE_RANGE: &str = "pod_cpu_usage_range";
pub const POD_MEMORY_USAGE_RANGE: &str = "pod_memory_usage_range";

/// Pods that the synthetic per-pod usage series are generated for.
pub const POD_NAMES: [&str; 3] = [
    "frontend-api-6b7b8c9c-x4v2f",
    "worker-jobs-7a8c9d0e-q5r6t",
    "database-connector-f9g0h1i2-z3y4x",
];

const HOUR: i64 = 60 * 60;
const DAY: i64 = 24 * HOUR;

fn labels<const N: usize>(pairs: [(&str, &str); N]) -> HashMap<String, String> {
    pairs
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

fn vector(result: Vec<Series>) -> QueryData {
    QueryData {
        result_type: ResultType::Vector,
        result,
    }
}

fn matrix(result: Vec<Series>) -> QueryData {
    QueryData {
        result_type: ResultType::Matrix,
        result,
    }
}

fn pod(name: &str, age_secs: i64, restarts: &str, cpu: &str, memory: &str, now: i64) -> Series {
    let created = (now - age_secs).to_string();
    Series::instant(
        labels([
            ("podName", name),
            ("created", created.as_str()),
            ("restarts", restarts),
            ("cpuUsage", cpu),
            ("memoryUsage", memory),
        ]),
        Sample::new(now as f64, "1"),
    )
}

/// Canned query results, timestamped relative to `now`.
pub fn canned(now: DateTime<Utc>) -> HashMap<String, QueryData> {
    let ts = now.timestamp();
    let at = ts as f64;

    let phase = |name: &str, count: &str| {
        Series::instant(labels([("phase", name)]), Sample::new(at, count))
    };

    // usage samples one minute apart, ending a few minutes before now
    let usage = |points: [&str; 3]| {
        let start = ts - 9 * 60;
        let samples = points
            .iter()
            .enumerate()
            .map(|(i, v)| Sample::new((start + i as i64 * 60) as f64, *v))
            .collect();
        matrix(vec![Series::range(HashMap::new(), samples)])
    };

    HashMap::from([
        (
            POD_STATUS.to_string(),
            vector(vec![
                phase("Running", "125"),
                phase("Succeeded", "45"),
                phase("Pending", "12"),
                phase("Failed", "8"),
            ]),
        ),
        (
            POD_INFO.to_string(),
            vector(vec![
                pod("frontend-api-6b7b8c9c-x4v2f", 3 * DAY, "0", "0.15", "256000000", ts),
                pod("frontend-api-6b7b8c9c-a8b3d", 12 * HOUR, "2", "0.25", "288000000", ts),
                pod("worker-jobs-7a8c9d0e-q5r6t", 5 * 60, "0", "1.10", "512000000", ts),
                pod("database-connector-f9g0h1i2-z3y4x", 10 * DAY, "12", "0.05", "128000000", ts),
            ]),
        ),
        (
            CPU_LIMIT.to_string(),
            vector(vec![Series::instant(HashMap::new(), Sample::new(at, "8"))]),
        ),
        (CPU_USAGE.to_string(), usage(["1.2", "1.5", "5.8"])),
        (
            MEMORY_LIMIT.to_string(),
            vector(vec![Series::instant(HashMap::new(), Sample::new(at, "64"))]),
        ),
        (MEMORY_USAGE.to_string(), usage(["28.1", "30.5", "35.4"])),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_canned_queries_present() {
        let now = Utc.timestamp_opt(1_716_966_982, 0).unwrap();
        let store = canned(now);

        for q in [POD_STATUS, POD_INFO, CPU_LIMIT, CPU_USAGE, MEMORY_LIMIT, MEMORY_USAGE] {
            assert!(store.contains_key(q), "missing {q}");
        }
        assert!(!store.contains_key(POD_CPU_USAGE_RANGE));
        assert_eq!(store[POD_STATUS].result.len(), 4);
        assert_eq!(store[CPU_USAGE].result_type, ResultType::Matrix);
    }

    #[test]
    fn test_pod_created_relative_to_now() {
        let now = Utc.timestamp_opt(1_716_966_982, 0).unwrap();
        let store = canned(now);
        let worker = &store[POD_INFO].result[2];
        assert_eq!(worker.label("created"), Some("1716966682"));
    }
}
