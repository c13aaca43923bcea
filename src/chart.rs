use crate::aggregate::{
    peak_throughput, scaling_efficiency, DatabaseSeries, HeatmapMatrix, LatencyRow,
};
use crate::model::{Database, DataStructure, LatencyStat, RecordSet, Workload};
use serde::Serialize;
use std::collections::HashMap;
use thiserror::Error;

/// An unmapped (data structure, database) pair is a configuration error, not
/// a chart with a silently defaulted color.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ChartConfigError {
    #[error("no color mapped for ({data_structure}, {database})")]
    UnmappedColor {
        data_structure: &'static str,
        database: &'static str,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ChartKind {
    Bar,
    GroupedBar,
    Line,
    Heatmap,
}

/// One plotted series: display name, hex color, (x, y) pairs. For charts with
/// categorical x labels the x values are indices into `ChartSpec::x_labels`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesSpec {
    pub name: String,
    pub color: String,
    pub points: Vec<(f64, f64)>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub dashed: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HeatmapGrid {
    pub row_labels: Vec<String>,
    pub col_labels: Vec<String>,
    /// `values[row][col]`
    pub values: Vec<Vec<f64>>,
}

/// Declarative chart description handed to a render surface. Everything the
/// drawing engine needs, nothing about how it draws.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSpec {
    pub kind: ChartKind,
    pub title: String,
    pub x_title: String,
    pub y_title: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub x_labels: Vec<String>,
    pub series: Vec<SeriesSpec>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub heatmap: Option<HeatmapGrid>,
}

impl ChartSpec {
    fn new(kind: ChartKind, title: impl Into<String>) -> Self {
        Self {
            kind,
            title: title.into(),
            x_title: String::new(),
            y_title: String::new(),
            x_labels: Vec::new(),
            series: Vec::new(),
            heatmap: None,
        }
    }
}

/// Injectable color lookup keyed by (data structure, database). Validated at
/// session construction so an unmapped pair fails at startup, not mid-render.
#[derive(Debug, Clone, Default)]
pub struct ColorTable {
    colors: HashMap<(DataStructure, Database), String>,
}

impl ColorTable {
    /// The dashboard's fixed palette.
    pub fn defaults() -> Self {
        let mut table = Self::empty();
        table.set(DataStructure::HashtableInMemory, Database::Redis, "#8B5CF6");
        table.set(
            DataStructure::HashtableInMemory,
            Database::Memcached,
            "#A855F7",
        );
        table.set(DataStructure::BTree, Database::Mongodb, "#3B82F6");
        table.set(DataStructure::LsmTree, Database::Rocksdb, "#10B981");
        table
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn set(&mut self, data_structure: DataStructure, database: Database, color: &str) {
        self.colors
            .insert((data_structure, database), color.to_string());
    }

    /// Every declared database must map a color under its data structure.
    pub fn validate(&self) -> Result<(), ChartConfigError> {
        for &database in Database::all() {
            self.color(database.data_structure(), database)?;
        }
        Ok(())
    }

    pub fn color(
        &self,
        data_structure: DataStructure,
        database: Database,
    ) -> Result<&str, ChartConfigError> {
        self.colors
            .get(&(data_structure, database))
            .map(String::as_str)
            .ok_or(ChartConfigError::UnmappedColor {
                data_structure: data_structure.name(),
                database: database.name(),
            })
    }
}

/// Display name for a workload: separators become spaces, each word
/// title-cased ("read_heavy" -> "Read Heavy").
pub fn workload_display_name(workload: Workload) -> String {
    workload
        .key()
        .split('_')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Per-workload accent colors for the overview chart's series.
fn workload_color(workload: Workload) -> &'static str {
    match workload {
        Workload::Balanced => "#1f77b4",
        Workload::ReadHeavy => "#ff7f0e",
        Workload::WriteHeavy => "#2ca02c",
        Workload::RangeQuery => "#d62728",
    }
}

fn series_label(database: Database, data_structure: DataStructure) -> String {
    format!("{} ({})", database.name(), data_structure.label())
}

/// Format an ops/sec count with thousands separators, as shown on cards and
/// bar labels.
pub fn format_count(value: f64) -> String {
    let rounded = value.round() as i64;
    let digits = rounded.abs().to_string();
    let mut grouped = String::new();
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    if rounded < 0 {
        format!("-{grouped}")
    } else {
        grouped
    }
}

/// Overview grouped bar: per workload, each database's best throughput across
/// thread counts. Databases a workload never ran are simply absent from that
/// series.
pub fn overview_throughput_chart(records: &RecordSet) -> ChartSpec {
    let mut spec = ChartSpec::new(
        ChartKind::GroupedBar,
        "Peak Performance Comparison (Best Threading Configuration)",
    );
    spec.x_title = "Database".to_string();
    spec.y_title = "Throughput (ops/sec)".to_string();
    spec.x_labels = Database::all()
        .iter()
        .map(|db| db.name().to_uppercase())
        .collect();

    for &workload in Workload::all() {
        let points: Vec<(f64, f64)> = Database::all()
            .iter()
            .enumerate()
            .filter_map(|(idx, &database)| {
                peak_throughput(records, database, workload).map(|peak| (idx as f64, peak))
            })
            .collect();
        spec.series.push(SeriesSpec {
            name: workload_display_name(workload),
            color: workload_color(workload).to_string(),
            points,
            dashed: false,
        });
    }
    spec
}

/// Line chart of throughput vs thread count, one series per database.
pub fn thread_scaling_chart(
    series: &[DatabaseSeries],
    workload: Workload,
    colors: &ColorTable,
) -> Result<ChartSpec, ChartConfigError> {
    let mut spec = ChartSpec::new(
        ChartKind::Line,
        format!("{} Workload Thread Scaling", workload_display_name(workload)),
    );
    spec.x_title = "Thread Count".to_string();
    spec.y_title = "Throughput (ops/sec)".to_string();

    for entry in series {
        let data_structure = entry.database.data_structure();
        let color = colors.color(data_structure, entry.database)?;
        spec.series.push(SeriesSpec {
            name: series_label(entry.database, data_structure),
            color: color.to_string(),
            points: entry
                .points
                .iter()
                .map(|p| (p.threads as f64, p.throughput))
                .collect(),
            dashed: false,
        });
    }
    Ok(spec)
}

/// Bar chart of one (workload, threads) slice: one bar per database that ran
/// that configuration, in input order.
pub fn workload_slice_chart(
    records: &RecordSet,
    workload: Workload,
    threads: u32,
    colors: &ColorTable,
) -> Result<ChartSpec, ChartConfigError> {
    let mut spec = ChartSpec::new(
        ChartKind::Bar,
        format!(
            "{} Workload at {} Thread{}",
            workload_display_name(workload),
            threads,
            if threads == 1 { "" } else { "s" }
        ),
    );
    spec.y_title = "ops/sec".to_string();

    for record in records
        .iter()
        .filter(|r| r.workload == workload && r.threads == threads)
    {
        let color = colors.color(record.data_structure, record.database)?;
        let idx = spec.x_labels.len() as f64;
        spec.x_labels.push(record.database.name().to_string());
        spec.series.push(SeriesSpec {
            name: record.database.name().to_string(),
            color: color.to_string(),
            points: vec![(idx, record.run_throughput_ops_sec)],
            dashed: false,
        });
    }
    Ok(spec)
}

/// Scaling-efficiency lines per database, plus a dashed 100% reference line.
/// Databases without a single-thread baseline are excluded.
pub fn scaling_efficiency_chart(
    records: &RecordSet,
    workload: Workload,
    colors: &ColorTable,
) -> Result<ChartSpec, ChartConfigError> {
    let mut spec = ChartSpec::new(
        ChartKind::Line,
        format!("{} Scaling Efficiency", workload_display_name(workload)),
    );
    spec.x_title = "Thread Count".to_string();
    spec.y_title = "Efficiency (%)".to_string();

    let mut databases: Vec<Database> = Vec::new();
    for record in records.iter() {
        if !databases.contains(&record.database) {
            databases.push(record.database);
        }
    }

    for database in databases {
        let Some(points) = scaling_efficiency(records, database, workload) else {
            continue;
        };
        let data_structure = database.data_structure();
        let color = colors.color(data_structure, database)?;
        spec.series.push(SeriesSpec {
            name: series_label(database, data_structure),
            color: color.to_string(),
            points: points
                .iter()
                .map(|p| (p.threads as f64, p.efficiency_pct))
                .collect(),
            dashed: false,
        });
    }

    spec.series.push(SeriesSpec {
        name: "Ideal 100% Efficiency".to_string(),
        color: "#808080".to_string(),
        points: vec![(1.0, 100.0), (4.0, 100.0), (8.0, 100.0), (16.0, 100.0)],
        dashed: true,
    });
    Ok(spec)
}

/// Grouped latency bars: average/p95/p99 series across databases.
pub fn latency_chart(rows: &[LatencyRow], workload: Workload) -> ChartSpec {
    let mut spec = ChartSpec::new(
        ChartKind::GroupedBar,
        format!("{} Latency Percentiles", workload_display_name(workload)),
    );
    spec.x_title = "Database".to_string();
    spec.y_title = "Latency (μs)".to_string();
    spec.x_labels = rows.iter().map(|r| r.database.name().to_string()).collect();

    let stat_colors = ["#60A5FA", "#F59E0B", "#EF4444"];
    for (&stat, color) in LatencyStat::all().iter().zip(stat_colors) {
        let metric = |row: &LatencyRow| match stat {
            LatencyStat::Avg => row.avg_us,
            LatencyStat::P95 => row.p95_us,
            LatencyStat::P99 => row.p99_us,
        };
        spec.series.push(SeriesSpec {
            name: stat.label().to_string(),
            color: color.to_string(),
            points: rows
                .iter()
                .enumerate()
                .map(|(idx, row)| (idx as f64, metric(row)))
                .collect(),
            dashed: false,
        });
    }
    spec
}

/// Throughput heatmap over (database+threads) rows and workload columns.
pub fn heatmap_chart(matrix: &HeatmapMatrix) -> ChartSpec {
    let mut spec = ChartSpec::new(ChartKind::Heatmap, "Performance Heatmap (Throughput)");
    spec.x_title = "Workload".to_string();
    spec.y_title = "Database (Thread Count)".to_string();
    spec.heatmap = Some(HeatmapGrid {
        row_labels: matrix.row_keys.clone(),
        col_labels: matrix.col_keys.clone(),
        values: matrix.cells.clone(),
    });
    spec
}
