use serde::{Deserialize, Serialize};

/// Databases covered by the benchmark sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Database {
    Redis,
    Memcached,
    Mongodb,
    Rocksdb,
}

impl Database {
    pub fn all() -> &'static [Database] {
        &[
            Database::Redis,
            Database::Memcached,
            Database::Mongodb,
            Database::Rocksdb,
        ]
    }

    /// Wire identifier as emitted by the results backend.
    pub fn name(&self) -> &'static str {
        match self {
            Database::Redis => "redis",
            Database::Memcached => "memcached",
            Database::Mongodb => "mongodb",
            Database::Rocksdb => "rocksdb",
        }
    }

    /// The storage-engine family backing this database. Fixed mapping.
    pub fn data_structure(&self) -> DataStructure {
        match self {
            Database::Redis | Database::Memcached => DataStructure::HashtableInMemory,
            Database::Mongodb => DataStructure::BTree,
            Database::Rocksdb => DataStructure::LsmTree,
        }
    }
}

/// Storage-engine families. Wire identifiers match the results backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum DataStructure {
    #[serde(rename = "hashtable_inmemory")]
    HashtableInMemory,
    #[serde(rename = "btree")]
    BTree,
    #[serde(rename = "lsm_tree")]
    LsmTree,
}

impl DataStructure {
    pub fn all() -> &'static [DataStructure] {
        &[
            DataStructure::HashtableInMemory,
            DataStructure::BTree,
            DataStructure::LsmTree,
        ]
    }

    pub fn name(&self) -> &'static str {
        match self {
            DataStructure::HashtableInMemory => "hashtable_inmemory",
            DataStructure::BTree => "btree",
            DataStructure::LsmTree => "lsm_tree",
        }
    }

    /// Display label, from the fixed lookup table.
    pub fn label(&self) -> &'static str {
        match self {
            DataStructure::HashtableInMemory => "Hashtable",
            DataStructure::BTree => "B+ Tree",
            DataStructure::LsmTree => "LSM Tree",
        }
    }
}

/// Access-pattern labels under which each database was benchmarked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Workload {
    Balanced,
    ReadHeavy,
    WriteHeavy,
    RangeQuery,
}

impl Workload {
    pub fn all() -> &'static [Workload] {
        &[
            Workload::Balanced,
            Workload::ReadHeavy,
            Workload::WriteHeavy,
            Workload::RangeQuery,
        ]
    }

    /// Wire identifier as emitted by the results backend.
    pub fn key(&self) -> &'static str {
        match self {
            Workload::Balanced => "balanced",
            Workload::ReadHeavy => "read_heavy",
            Workload::WriteHeavy => "write_heavy",
            Workload::RangeQuery => "range_query",
        }
    }

    /// camelCase prefix used to derive mount-point identifiers.
    pub fn mount_prefix(&self) -> &'static str {
        match self {
            Workload::Balanced => "balanced",
            Workload::ReadHeavy => "readHeavy",
            Workload::WriteHeavy => "writeHeavy",
            Workload::RangeQuery => "rangeQuery",
        }
    }

    /// Which latency fields apply: range queries report scan latencies,
    /// everything else reports read latencies.
    pub fn latency_op(&self) -> LatencyOp {
        match self {
            Workload::RangeQuery => LatencyOp::Scan,
            _ => LatencyOp::Read,
        }
    }
}

/// Operation whose latency distribution a record reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LatencyOp {
    Read,
    Scan,
}

/// Latency statistics reported per operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LatencyStat {
    Avg,
    P95,
    P99,
}

impl LatencyStat {
    pub fn all() -> &'static [LatencyStat] {
        &[LatencyStat::Avg, LatencyStat::P95, LatencyStat::P99]
    }

    pub fn label(&self) -> &'static str {
        match self {
            LatencyStat::Avg => "Average",
            LatencyStat::P95 => "95th Percentile",
            LatencyStat::P99 => "99th Percentile",
        }
    }
}

/// One benchmark measurement: a database running a workload at a thread count.
///
/// Latency fields default to 0 when the payload omits them; workloads that
/// never exercise an operation report 0 for its latencies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkRecord {
    pub database: Database,
    pub data_structure: DataStructure,
    pub workload: Workload,
    pub threads: u32,
    pub run_throughput_ops_sec: f64,
    #[serde(default)]
    pub run_read_avg_latency_us: f64,
    #[serde(default)]
    pub run_read_95p_latency_us: f64,
    #[serde(default)]
    pub run_read_99p_latency_us: f64,
    #[serde(default)]
    pub run_scan_avg_latency_us: f64,
    #[serde(default)]
    pub run_scan_95p_latency_us: f64,
    #[serde(default)]
    pub run_scan_99p_latency_us: f64,
}

impl BenchmarkRecord {
    /// Latency in microseconds for the given operation and statistic.
    pub fn latency_us(&self, op: LatencyOp, stat: LatencyStat) -> f64 {
        match (op, stat) {
            (LatencyOp::Read, LatencyStat::Avg) => self.run_read_avg_latency_us,
            (LatencyOp::Read, LatencyStat::P95) => self.run_read_95p_latency_us,
            (LatencyOp::Read, LatencyStat::P99) => self.run_read_99p_latency_us,
            (LatencyOp::Scan, LatencyStat::Avg) => self.run_scan_avg_latency_us,
            (LatencyOp::Scan, LatencyStat::P95) => self.run_scan_95p_latency_us,
            (LatencyOp::Scan, LatencyStat::P99) => self.run_scan_99p_latency_us,
        }
    }
}

/// The full result set, fetched once per session and read-only afterwards.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordSet {
    records: Vec<BenchmarkRecord>,
}

impl RecordSet {
    pub fn new(records: Vec<BenchmarkRecord>) -> Self {
        Self { records }
    }

    pub fn iter(&self) -> impl Iterator<Item = &BenchmarkRecord> {
        self.records.iter()
    }

    pub fn records(&self) -> &[BenchmarkRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_deserializes_with_missing_latencies() {
        let json = r#"{
            "database": "redis",
            "data_structure": "hashtable_inmemory",
            "workload": "balanced",
            "threads": 4,
            "run_throughput_ops_sec": 75000.0
        }"#;

        let record: BenchmarkRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.database, Database::Redis);
        assert_eq!(record.workload, Workload::Balanced);
        assert_eq!(record.run_read_avg_latency_us, 0.0);
        assert_eq!(record.run_scan_99p_latency_us, 0.0);
    }

    #[test]
    fn test_unknown_database_is_rejected() {
        let json = r#"{
            "database": "leveldb",
            "data_structure": "lsm_tree",
            "workload": "balanced",
            "threads": 1,
            "run_throughput_ops_sec": 1000.0
        }"#;

        assert!(serde_json::from_str::<BenchmarkRecord>(json).is_err());
    }

    #[test]
    fn test_fixed_data_structure_mapping() {
        assert_eq!(
            Database::Redis.data_structure(),
            DataStructure::HashtableInMemory
        );
        assert_eq!(
            Database::Memcached.data_structure(),
            DataStructure::HashtableInMemory
        );
        assert_eq!(Database::Mongodb.data_structure(), DataStructure::BTree);
        assert_eq!(Database::Rocksdb.data_structure(), DataStructure::LsmTree);
    }

    #[test]
    fn test_latency_field_selection() {
        let record = BenchmarkRecord {
            database: Database::Rocksdb,
            data_structure: DataStructure::LsmTree,
            workload: Workload::RangeQuery,
            threads: 8,
            run_throughput_ops_sec: 67331.0,
            run_read_avg_latency_us: 10.0,
            run_read_95p_latency_us: 20.0,
            run_read_99p_latency_us: 30.0,
            run_scan_avg_latency_us: 100.0,
            run_scan_95p_latency_us: 200.0,
            run_scan_99p_latency_us: 300.0,
        };

        assert_eq!(record.latency_us(LatencyOp::Scan, LatencyStat::Avg), 100.0);
        assert_eq!(record.latency_us(LatencyOp::Scan, LatencyStat::P99), 300.0);
        assert_eq!(record.latency_us(LatencyOp::Read, LatencyStat::P95), 20.0);
    }

    #[test]
    fn test_workload_latency_op() {
        assert_eq!(Workload::RangeQuery.latency_op(), LatencyOp::Scan);
        assert_eq!(Workload::Balanced.latency_op(), LatencyOp::Read);
        assert_eq!(Workload::ReadHeavy.latency_op(), LatencyOp::Read);
        assert_eq!(Workload::WriteHeavy.latency_op(), LatencyOp::Read);
    }

    #[test]
    fn test_wire_keys_roundtrip() {
        for &workload in Workload::all() {
            let json = serde_json::to_string(&workload).unwrap();
            assert_eq!(json, format!("\"{}\"", workload.key()));
            let back: Workload = serde_json::from_str(&json).unwrap();
            assert_eq!(back, workload);
        }
        for &db in Database::all() {
            let json = serde_json::to_string(&db).unwrap();
            assert_eq!(json, format!("\"{}\"", db.name()));
        }
    }
}
