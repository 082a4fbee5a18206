use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Result type tag of a metrics query payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResultType {
    Vector,
    Matrix,
    Scalar,
    String,
    #[serde(other)]
    Unknown,
}

/// A single `[timestamp, "value"]` pair. Timestamps are unix seconds and may
/// carry a fractional part.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sample(pub f64, pub String);

impl Sample {
    pub fn new(timestamp: f64, value: impl Into<String>) -> Self {
        Sample(timestamp, value.into())
    }

    pub fn timestamp(&self) -> f64 {
        self.0
    }

    /// Numeric value, `None` when the string is not a finite number.
    pub fn value(&self) -> Option<f64> {
        self.1.trim().parse::<f64>().ok().filter(|v| v.is_finite())
    }
}

/// One entry of a vector or matrix result. Vector entries carry `value`,
/// matrix entries carry `values`; both are optional so that a malformed
/// payload still deserializes and is rejected by the parsers instead.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Series {
    #[serde(default)]
    pub metric: HashMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Sample>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub values: Option<Vec<Sample>>,
}

impl Series {
    pub fn instant(metric: HashMap<String, String>, sample: Sample) -> Self {
        Series {
            metric,
            value: Some(sample),
            values: None,
        }
    }

    pub fn range(metric: HashMap<String, String>, samples: Vec<Sample>) -> Self {
        Series {
            metric,
            value: None,
            values: Some(samples),
        }
    }

    pub fn label(&self, key: &str) -> Option<&str> {
        self.metric.get(key).map(String::as_str)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryData {
    pub result_type: ResultType,
    #[serde(default)]
    pub result: Vec<Series>,
}

/// Envelope returned by a metrics provider for one query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricResponse {
    pub project_id: u64,
    pub data: QueryData,
}

impl MetricResponse {
    pub fn vector(project_id: u64, result: Vec<Series>) -> Self {
        MetricResponse {
            project_id,
            data: QueryData {
                result_type: ResultType::Vector,
                result,
            },
        }
    }

    pub fn matrix(project_id: u64, result: Vec<Series>) -> Self {
        MetricResponse {
            project_id,
            data: QueryData {
                result_type: ResultType::Matrix,
                result,
            },
        }
    }

    pub fn result_type(&self) -> ResultType {
        self.data.result_type
    }

    pub fn result(&self) -> &[Series] {
        &self.data.result
    }

    /// Newest sample timestamp across every series, instant or range.
    pub fn latest_timestamp(&self) -> Option<f64> {
        self.result()
            .iter()
            .flat_map(|s| s.value.iter().chain(s.values.iter().flatten()))
            .map(Sample::timestamp)
            .filter(|ts| ts.is_finite())
            .max_by(f64::total_cmp)
    }
}

/// Pod metadata joined from the `pod_info` vector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PodInfo {
    pub pod_name: String,
    /// Unix seconds.
    pub created_at: f64,
    pub restart_count: u32,
    pub cpu_cores: Option<String>,
    pub memory_bytes: String,
}

/// One category of a breakdown chart, e.g. a pod phase and its count.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamedValue {
    pub name: String,
    pub value: f64,
    pub fill: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_vector_payload() {
        let raw = r#"{
            "projectId": 1,
            "data": {
                "resultType": "vector",
                "result": [
                    { "metric": { "phase": "Running" }, "value": [1716966982.249, "125"] }
                ]
            }
        }"#;

        let resp: MetricResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(resp.result_type(), ResultType::Vector);
        assert_eq!(resp.result().len(), 1);
        assert_eq!(resp.result()[0].label("phase"), Some("Running"));

        let sample = resp.result()[0].value.as_ref().unwrap();
        assert_eq!(sample.timestamp(), 1716966982.249);
        assert_eq!(sample.value(), Some(125.0));
    }

    #[test]
    fn test_deserialize_matrix_payload() {
        let raw = r#"{
            "projectId": 1,
            "data": {
                "resultType": "matrix",
                "result": [
                    { "metric": {}, "values": [[1716966480, "1.2"], [1716966540, "1.5"]] }
                ]
            }
        }"#;

        let resp: MetricResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(resp.result_type(), ResultType::Matrix);
        let values = resp.result()[0].values.as_ref().unwrap();
        assert_eq!(values.len(), 2);
        assert_eq!(values[1].value(), Some(1.5));
    }

    #[test]
    fn test_unknown_result_type_still_parses() {
        let raw = r#"{ "projectId": 1, "data": { "resultType": "streams", "result": [] } }"#;
        let resp: MetricResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(resp.result_type(), ResultType::Unknown);
    }

    #[test]
    fn test_latest_timestamp_spans_all_series() {
        let resp = MetricResponse::matrix(
            1,
            vec![
                Series::range(HashMap::new(), vec![Sample::new(60.0, "1"), Sample::new(120.0, "1")]),
                Series::range(HashMap::new(), vec![Sample::new(180.0, "1")]),
                Series::range(HashMap::new(), vec![]),
            ],
        );
        assert_eq!(resp.latest_timestamp(), Some(180.0));
        assert_eq!(MetricResponse::matrix(1, vec![]).latest_timestamp(), None);
    }

    #[test]
    fn test_sample_value_rejects_garbage() {
        assert_eq!(Sample::new(1.0, "abc").value(), None);
        assert_eq!(Sample::new(1.0, "NaN").value(), None);
        assert_eq!(Sample::new(1.0, " 2.5 ").value(), Some(2.5));
    }

    #[test]
    fn test_serialize_uses_wire_names() {
        let resp = MetricResponse::vector(
            1,
            vec![Series::instant(HashMap::new(), Sample::new(10.0, "8"))],
        );
        let json = serde_json::to_value(&resp).unwrap();
        assert_eq!(json["projectId"], 1);
        assert_eq!(json["data"]["resultType"], "vector");
        assert_eq!(json["data"]["result"][0]["value"][1], "8");
        assert!(json["data"]["result"][0].get("values").is_none());
    }
}
