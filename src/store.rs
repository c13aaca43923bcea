use crate::model::{BenchmarkRecord, Database, DataStructure, RecordSet, Workload};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;
use thiserror::Error;

/// Terminal load failure. The session never aggregates after one of these;
/// the controller renders a static error message instead.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("transport failure talking to the results backend: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("results backend reported an error: {0}")]
    Backend(String),

    #[error("undecodable results payload: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("failed to read results file: {0}")]
    Io(#[from] std::io::Error),
}

/// Full-dataset payload: either an explicit backend error or the record list.
/// Extra fields (e.g. `metadata`) are ignored.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum DataEnvelope {
    Failure { error: String },
    Payload { data: Vec<BenchmarkRecord> },
}

/// Server-precomputed landing summary from `/overview`. Only feeds the
/// summary cards; it may round differently from the client-side reduction.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct OverviewSummary {
    pub best_performers: BTreeMap<Workload, OverviewEntry>,
}

/// One workload's precomputed winner. The backend emits nulls for a workload
/// it has no records for; such cards are skipped.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct OverviewEntry {
    pub database: Option<Database>,
    pub data_structure: Option<DataStructure>,
    pub throughput: f64,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum OverviewEnvelope {
    Failure { error: String },
    Payload { best_performers: BTreeMap<Workload, OverviewEntry> },
}

impl RecordSet {
    /// Decode a full-dataset payload. A payload carrying an `error` field is
    /// a terminal backend failure, never an empty set.
    pub fn from_json_str(body: &str) -> Result<Self, LoadError> {
        match serde_json::from_str(body)? {
            DataEnvelope::Failure { error } => Err(LoadError::Backend(error)),
            DataEnvelope::Payload { data } => Ok(RecordSet::new(data)),
        }
    }
}

/// Read the same payload shape the backend serves from a local file.
pub fn load_records_from_file(path: &Path) -> Result<RecordSet, LoadError> {
    let body = std::fs::read_to_string(path)?;
    RecordSet::from_json_str(&body)
}

fn parse_overview(body: &str) -> Result<OverviewSummary, LoadError> {
    match serde_json::from_str(body)? {
        OverviewEnvelope::Failure { error } => Err(LoadError::Backend(error)),
        OverviewEnvelope::Payload { best_performers } => Ok(OverviewSummary { best_performers }),
    }
}

/// One-shot client for the results backend. The controller fetches exactly
/// once per session; the client itself does not enforce single use.
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Fetch the full record set. The backend returns error payloads with
    /// non-2xx statuses, so the body is decoded regardless of status.
    pub async fn fetch_records(&self) -> Result<RecordSet, LoadError> {
        let body = self
            .http
            .get(format!("{}/data", self.base_url))
            .send()
            .await?
            .text()
            .await?;
        RecordSet::from_json_str(&body)
    }

    pub async fn fetch_overview(&self) -> Result<OverviewSummary, LoadError> {
        let body = self
            .http
            .get(format!("{}/overview", self.base_url))
            .send()
            .await?
            .text()
            .await?;
        parse_overview(&body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const PAYLOAD: &str = r#"{
        "metadata": {"generated": "2025-06-01"},
        "data": [
            {
                "database": "redis",
                "data_structure": "hashtable_inmemory",
                "workload": "balanced",
                "threads": 1,
                "run_throughput_ops_sec": 42000.0,
                "run_read_avg_latency_us": 21.5
            },
            {
                "database": "rocksdb",
                "data_structure": "lsm_tree",
                "workload": "range_query",
                "threads": 8,
                "run_throughput_ops_sec": 67331.0,
                "run_scan_avg_latency_us": 118.0
            }
        ]
    }"#;

    #[test]
    fn test_decodes_data_payload() {
        let records = RecordSet::from_json_str(PAYLOAD).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records.records()[0].database, Database::Redis);
        assert_eq!(records.records()[1].run_scan_avg_latency_us, 118.0);
    }

    #[test]
    fn test_error_payload_is_terminal() {
        let err = RecordSet::from_json_str(r#"{"error": "backend down"}"#).unwrap_err();
        match err {
            LoadError::Backend(message) => assert_eq!(message, "backend down"),
            other => panic!("expected Backend error, got {other:?}"),
        }
    }

    #[test]
    fn test_garbage_payload_is_decode_error() {
        assert!(matches!(
            RecordSet::from_json_str("not json"),
            Err(LoadError::Decode(_))
        ));
        // neither `error` nor `data`
        assert!(matches!(
            RecordSet::from_json_str(r#"{"metadata": {}}"#),
            Err(LoadError::Decode(_))
        ));
    }

    #[test]
    fn test_load_records_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(PAYLOAD.as_bytes()).unwrap();

        let records = load_records_from_file(file.path()).unwrap();
        assert_eq!(records.len(), 2);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = load_records_from_file(Path::new("/nonexistent/results.json")).unwrap_err();
        assert!(matches!(err, LoadError::Io(_)));
    }

    #[test]
    fn test_parse_overview_with_null_winner() {
        let summary = parse_overview(
            r#"{
                "best_performers": {
                    "balanced": {
                        "database": "redis",
                        "data_structure": "hashtable_inmemory",
                        "throughput": 103929.0
                    },
                    "range_query": {
                        "database": null,
                        "data_structure": null,
                        "throughput": 0
                    }
                },
                "metadata": {}
            }"#,
        )
        .unwrap();

        let balanced = &summary.best_performers[&Workload::Balanced];
        assert_eq!(balanced.database, Some(Database::Redis));
        assert_eq!(balanced.throughput, 103_929.0);
        assert_eq!(
            summary.best_performers[&Workload::RangeQuery].database,
            None
        );
    }

    #[test]
    fn test_overview_error_payload() {
        assert!(matches!(
            parse_overview(r#"{"error": "No data found."}"#),
            Err(LoadError::Backend(_))
        ));
    }
}
