//! Fail-soft readers turning raw query payloads into the values the charts
//! and the pod table need. None of these return errors: a missing or
//! malformed payload degrades to zero or an empty list.

use tracing::{debug, warn};

use crate::charts::palette_color;
use crate::models::{MetricResponse, NamedValue, PodInfo, Sample, Series};

/// Value of the first entry of an instant vector, or 0.
pub fn parse_instant_to_scalar(response: Option<&MetricResponse>) -> f64 {
    response
        .and_then(|r| r.result().first())
        .and_then(|s| s.value.as_ref())
        .and_then(Sample::value)
        .unwrap_or(0.0)
}

/// Most recent value of the first series of a range vector, or 0.
///
/// Samples are expected in ascending timestamp order; the last element is
/// taken as-is.
pub fn parse_range_to_latest_scalar(response: Option<&MetricResponse>) -> f64 {
    response
        .and_then(|r| r.result().first())
        .and_then(|s| s.values.as_ref())
        .and_then(|values| values.last())
        .and_then(Sample::value)
        .unwrap_or(0.0)
}

/// One [`NamedValue`] per vector entry, named by `label`. The fill color is
/// picked by the entry's position in the vector.
pub fn parse_instant_to_named_values(
    response: Option<&MetricResponse>,
    label: &str,
) -> Vec<NamedValue> {
    let Some(response) = response else {
        return Vec::new();
    };

    response
        .result()
        .iter()
        .enumerate()
        .filter_map(|(index, series)| {
            let name = series.label(label);
            let value = series.value.as_ref().and_then(Sample::value);
            match (name, value) {
                (Some(name), Some(value)) => Some(NamedValue {
                    name: name.to_string(),
                    value,
                    fill: palette_color(index),
                }),
                _ => {
                    debug!(index, label, "skipping vector entry without name or value");
                    None
                }
            }
        })
        .collect()
}

/// Pod records from the `pod_info` vector. A single malformed entry voids
/// the whole result.
pub fn parse_pod_records(response: Option<&MetricResponse>) -> Vec<PodInfo> {
    let Some(response) = response else {
        return Vec::new();
    };

    match response
        .result()
        .iter()
        .map(pod_from_series)
        .collect::<Result<Vec<_>, _>>()
    {
        Ok(pods) => pods,
        Err(cause) => {
            warn!(%cause, "failed to parse pod records");
            Vec::new()
        }
    }
}

fn pod_from_series(series: &Series) -> Result<PodInfo, String> {
    let required = |key: &str| {
        series
            .label(key)
            .ok_or_else(|| format!("missing label '{key}'"))
    };

    let pod_name = required("podName")?.to_string();
    let created_at = required("created")?
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| format!("pod {pod_name}: 'created' is not a timestamp"))?;
    let restart_count = required("restarts")?
        .parse::<u32>()
        .map_err(|e| format!("pod {pod_name}: 'restarts': {e}"))?;
    let memory_bytes = required("memoryUsage")?.to_string();

    Ok(PodInfo {
        pod_name,
        created_at,
        restart_count,
        cpu_cores: series.label("cpuUsage").map(str::to_string),
        memory_bytes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn labels(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn phases() -> MetricResponse {
        let entry = |phase: &str, count: &str| {
            Series::instant(labels(&[("phase", phase)]), Sample::new(1.0, count))
        };
        MetricResponse::vector(
            1,
            vec![
                entry("Running", "125"),
                entry("Succeeded", "45"),
                entry("Pending", "12"),
                entry("Failed", "8"),
            ],
        )
    }

    fn pod_entry(pairs: &[(&str, &str)]) -> Series {
        Series::instant(labels(pairs), Sample::new(1.0, "1"))
    }

    #[test]
    fn test_instant_scalar_degrades_to_zero() {
        assert_eq!(parse_instant_to_scalar(None), 0.0);
        assert_eq!(parse_instant_to_scalar(Some(&MetricResponse::vector(1, vec![]))), 0.0);

        let garbage = MetricResponse::vector(
            1,
            vec![Series::instant(HashMap::new(), Sample::new(1.0, "n/a"))],
        );
        assert_eq!(parse_instant_to_scalar(Some(&garbage)), 0.0);

        let matrix = MetricResponse::matrix(1, vec![Series::range(HashMap::new(), vec![])]);
        assert_eq!(parse_instant_to_scalar(Some(&matrix)), 0.0);
    }

    #[test]
    fn test_instant_scalar_reads_first_entry() {
        assert_eq!(parse_instant_to_scalar(Some(&phases())), 125.0);
    }

    #[test]
    fn test_latest_scalar_takes_last_sample_of_first_series() {
        let resp = MetricResponse::matrix(
            1,
            vec![
                Series::range(
                    HashMap::new(),
                    vec![
                        Sample::new(100.0, "1.2"),
                        Sample::new(160.0, "1.5"),
                        Sample::new(220.0, "5.8"),
                    ],
                ),
                Series::range(HashMap::new(), vec![Sample::new(300.0, "99")]),
            ],
        );
        assert_eq!(parse_range_to_latest_scalar(Some(&resp)), 5.8);
        assert_eq!(parse_range_to_latest_scalar(None), 0.0);

        let empty = MetricResponse::matrix(1, vec![Series::range(HashMap::new(), vec![])]);
        assert_eq!(parse_range_to_latest_scalar(Some(&empty)), 0.0);
    }

    #[test]
    fn test_named_values_for_pod_phases() {
        let values = parse_instant_to_named_values(Some(&phases()), "phase");

        assert_eq!(values.len(), 4);
        assert_eq!(values.iter().map(|v| v.value).sum::<f64>(), 190.0);

        let names: Vec<&str> = values.iter().map(|v| v.name.as_str()).collect();
        assert_eq!(names, ["Running", "Succeeded", "Pending", "Failed"]);

        // colors follow position, so parsing again gives the same mapping
        let again = parse_instant_to_named_values(Some(&phases()), "phase");
        assert_eq!(values, again);
        assert_eq!(values[0].fill, palette_color(0));
        assert_ne!(values[0].fill, values[1].fill);
    }

    #[test]
    fn test_named_values_skip_entries_without_label() {
        let values = parse_instant_to_named_values(Some(&phases()), "namespace");
        assert!(values.is_empty());
        assert!(parse_instant_to_named_values(None, "phase").is_empty());
    }

    #[test]
    fn test_pod_records() {
        let resp = MetricResponse::vector(
            1,
            vec![
                pod_entry(&[
                    ("podName", "frontend-api"),
                    ("created", "1716700000"),
                    ("restarts", "2"),
                    ("cpuUsage", "0.25"),
                    ("memoryUsage", "288000000"),
                ]),
                pod_entry(&[
                    ("podName", "worker"),
                    ("created", "1716900000.5"),
                    ("restarts", "0"),
                    ("memoryUsage", "512000000"),
                ]),
            ],
        );

        let pods = parse_pod_records(Some(&resp));
        assert_eq!(pods.len(), 2);
        assert_eq!(pods[0].pod_name, "frontend-api");
        assert_eq!(pods[0].restart_count, 2);
        assert_eq!(pods[0].cpu_cores.as_deref(), Some("0.25"));
        assert_eq!(pods[1].created_at, 1716900000.5);
        assert_eq!(pods[1].cpu_cores, None);
    }

    #[test_log::test]
    fn test_pod_records_fail_soft_on_any_bad_entry() {
        let resp = MetricResponse::vector(
            1,
            vec![
                pod_entry(&[
                    ("podName", "ok"),
                    ("created", "1716700000"),
                    ("restarts", "0"),
                    ("memoryUsage", "1"),
                ]),
                pod_entry(&[
                    ("podName", "broken"),
                    ("created", "yesterday"),
                    ("restarts", "0"),
                    ("memoryUsage", "1"),
                ]),
            ],
        );
        assert!(parse_pod_records(Some(&resp)).is_empty());

        let missing = MetricResponse::vector(1, vec![pod_entry(&[("podName", "x")])]);
        assert!(parse_pod_records(Some(&missing)).is_empty());
        assert!(parse_pod_records(None).is_empty());
    }
}
