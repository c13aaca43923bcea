use crate::model::{BenchmarkRecord, Database, LatencyStat, RecordSet, Workload};
use std::collections::BTreeMap;
use tracing::debug;

/// Thread count the latency comparison prefers when a record exists for it.
pub const PREFERRED_LATENCY_THREADS: u32 = 8;

/// One (threads, throughput) point of a per-database series.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThroughputPoint {
    pub threads: u32,
    pub throughput: f64,
}

/// A database's throughput curve for one workload, points ascending by threads.
#[derive(Debug, Clone, PartialEq)]
pub struct DatabaseSeries {
    pub database: Database,
    pub points: Vec<ThroughputPoint>,
}

/// Scaling efficiency at a thread count, as a percentage of linear scaling.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EfficiencyPoint {
    pub threads: u32,
    pub efficiency_pct: f64,
}

/// Throughput matrix keyed by (database+threads) rows and workload columns.
/// Key sets are the distinct values observed, sorted for axis display.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HeatmapMatrix {
    pub row_keys: Vec<String>,
    pub col_keys: Vec<String>,
    /// `cells[row][col]`, 0 where no record matches.
    pub cells: Vec<Vec<f64>>,
}

/// Per-database latency summary for one workload.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LatencyRow {
    pub database: Database,
    pub avg_us: f64,
    pub p95_us: f64,
    pub p99_us: f64,
}

/// Per workload, the record with the highest throughput across every
/// (database, threads) combination. Ties keep the first record in input
/// order. Workloads with no records are absent from the map.
pub fn best_performer_per_workload(
    records: &RecordSet,
) -> BTreeMap<Workload, &BenchmarkRecord> {
    let mut best: BTreeMap<Workload, &BenchmarkRecord> = BTreeMap::new();
    for record in records.iter() {
        match best.get(&record.workload) {
            Some(current) if record.run_throughput_ops_sec <= current.run_throughput_ops_sec => {}
            _ => {
                best.insert(record.workload, record);
            }
        }
    }
    best
}

/// Throughput-vs-threads series for every database measured under `workload`.
/// Databases appear in first-observed input order; a database with no points
/// for the workload is omitted.
pub fn series_per_database(records: &RecordSet, workload: Workload) -> Vec<DatabaseSeries> {
    let mut series: Vec<DatabaseSeries> = Vec::new();
    for record in records.iter().filter(|r| r.workload == workload) {
        let idx = match series.iter().position(|s| s.database == record.database) {
            Some(idx) => idx,
            None => {
                series.push(DatabaseSeries {
                    database: record.database,
                    points: Vec::new(),
                });
                series.len() - 1
            }
        };
        series[idx].points.push(ThroughputPoint {
            threads: record.threads,
            throughput: record.run_throughput_ops_sec,
        });
    }
    for entry in &mut series {
        entry.points.sort_by_key(|p| p.threads);
    }
    series
}

/// Scaling efficiency of one database under one workload: observed throughput
/// divided by threads times the single-thread throughput. Returns `None` when
/// no positive threads=1 baseline exists; the database is excluded from the
/// workload's efficiency view entirely, not zero-filled.
pub fn scaling_efficiency(
    records: &RecordSet,
    database: Database,
    workload: Workload,
) -> Option<Vec<EfficiencyPoint>> {
    let mut matching: Vec<&BenchmarkRecord> = records
        .iter()
        .filter(|r| r.database == database && r.workload == workload)
        .collect();
    matching.sort_by_key(|r| r.threads);

    let baseline = matching
        .iter()
        .find(|r| r.threads == 1)
        .map(|r| r.run_throughput_ops_sec)
        .filter(|&t| t > 0.0);
    let Some(baseline) = baseline else {
        debug!(
            database = database.name(),
            workload = workload.key(),
            "no single-thread baseline, excluding from efficiency view"
        );
        return None;
    };

    Some(
        matching
            .iter()
            .map(|r| EfficiencyPoint {
                threads: r.threads,
                efficiency_pct: r.run_throughput_ops_sec / (baseline * r.threads as f64) * 100.0,
            })
            .collect(),
    )
}

/// Full throughput matrix: one row per observed (database, threads), one
/// column per observed workload, 0 where no record matches.
pub fn heatmap_matrix(records: &RecordSet) -> HeatmapMatrix {
    let mut throughput: BTreeMap<(String, String), f64> = BTreeMap::new();
    let mut row_keys: Vec<String> = Vec::new();
    let mut col_keys: Vec<String> = Vec::new();

    for record in records.iter() {
        let row = format!("{}_{}t", record.database.name(), record.threads);
        let col = record.workload.key().to_string();
        if !row_keys.contains(&row) {
            row_keys.push(row.clone());
        }
        if !col_keys.contains(&col) {
            col_keys.push(col.clone());
        }
        throughput.insert((row, col), record.run_throughput_ops_sec);
    }

    row_keys.sort();
    col_keys.sort();

    let cells = row_keys
        .iter()
        .map(|row| {
            col_keys
                .iter()
                .map(|col| {
                    throughput
                        .get(&(row.clone(), col.clone()))
                        .copied()
                        .unwrap_or(0.0)
                })
                .collect()
        })
        .collect();

    HeatmapMatrix {
        row_keys,
        col_keys,
        cells,
    }
}

/// Per-database latency summary (avg, p95, p99) for one workload. Every
/// database observed anywhere in the record set gets a row, in first-observed
/// order. Each metric resolves independently: the record at
/// `preferred_threads` when its value is strictly positive, else the first
/// record in input order with a strictly positive value, else 0. Range-query
/// workloads read the scan latency fields, everything else the read fields.
pub fn latency_comparison(
    records: &RecordSet,
    workload: Workload,
    preferred_threads: u32,
) -> Vec<LatencyRow> {
    let op = workload.latency_op();

    let mut databases: Vec<Database> = Vec::new();
    for record in records.iter() {
        if !databases.contains(&record.database) {
            databases.push(record.database);
        }
    }

    databases
        .iter()
        .map(|&database| {
            let resolve = |stat: LatencyStat| -> f64 {
                let preferred = records.iter().find(|r| {
                    r.database == database
                        && r.workload == workload
                        && r.threads == preferred_threads
                });
                if let Some(record) = preferred {
                    let value = record.latency_us(op, stat);
                    if value > 0.0 {
                        return value;
                    }
                }
                // Fallback is defined only as "first positive value in input
                // order"; upstream gives no stronger ordering guarantee.
                records
                    .iter()
                    .filter(|r| r.database == database && r.workload == workload)
                    .map(|r| r.latency_us(op, stat))
                    .find(|&value| value > 0.0)
                    .unwrap_or(0.0)
            };
            LatencyRow {
                database,
                avg_us: resolve(LatencyStat::Avg),
                p95_us: resolve(LatencyStat::P95),
                p99_us: resolve(LatencyStat::P99),
            }
        })
        .collect()
}

/// Highest throughput a database reached under a workload across all thread
/// counts. `None` when the database never ran the workload.
pub fn peak_throughput(
    records: &RecordSet,
    database: Database,
    workload: Workload,
) -> Option<f64> {
    records
        .iter()
        .filter(|r| r.database == database && r.workload == workload)
        .map(|r| r.run_throughput_ops_sec)
        .fold(None, |peak: Option<f64>, value| {
            Some(peak.map_or(value, |p| p.max(value)))
        })
}
