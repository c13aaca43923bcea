use crate::chart::{format_count, ChartKind, ChartSpec};
use anyhow::{Context, Result};
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use thiserror::Error;

// Font sizes
// NOTE: These are intentionally large because SVGs are often viewed scaled down in browsers/docs.
const TITLE_FONT_SIZE: u32 = 44;
const AXIS_LABEL_FONT_SIZE: u32 = 26;
const TICK_LABEL_FONT_SIZE: u32 = 20;
const LEGEND_FONT_SIZE: u32 = 20;
const DATA_LABEL_FONT_SIZE: u32 = 16;

// Layout tuning
// Keep enough space for x tick labels + x-axis title, but avoid excessive empty bottom whitespace.
const DEFAULT_MARGIN_BOTTOM: u32 = 55;
const DEFAULT_X_LABEL_AREA_SIZE: u32 = 60;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("unknown mount point: {0}")]
    UnknownMount(String),

    #[error("drawing backend failure: {0}")]
    Backend(#[from] anyhow::Error),
}

/// The surface charts and text blocks land on. Mount points are the page's
/// named slots; the controller swallows `UnknownMount` so sections may render
/// partially.
pub trait RenderSurface {
    fn draw_chart(&mut self, mount: &str, spec: &ChartSpec) -> Result<(), RenderError>;
    fn set_text(&mut self, mount: &str, text: &str) -> Result<(), RenderError>;
}

/// Records every call instead of drawing. With a fixed mount roster it also
/// reports unknown mounts, like a page with a missing element would.
#[derive(Debug, Default)]
pub struct MemorySurface {
    mounts: Option<BTreeSet<String>>,
    pub charts: Vec<(String, ChartSpec)>,
    pub texts: Vec<(String, String)>,
}

impl MemorySurface {
    /// Accepts every mount.
    pub fn new() -> Self {
        Self::default()
    }

    /// Accepts only the listed mounts; anything else is `UnknownMount`.
    pub fn with_mounts<I, S>(mounts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            mounts: Some(mounts.into_iter().map(Into::into).collect()),
            charts: Vec::new(),
            texts: Vec::new(),
        }
    }

    fn check(&self, mount: &str) -> Result<(), RenderError> {
        match &self.mounts {
            Some(known) if !known.contains(mount) => {
                Err(RenderError::UnknownMount(mount.to_string()))
            }
            _ => Ok(()),
        }
    }
}

impl RenderSurface for MemorySurface {
    fn draw_chart(&mut self, mount: &str, spec: &ChartSpec) -> Result<(), RenderError> {
        self.check(mount)?;
        self.charts.push((mount.to_string(), spec.clone()));
        Ok(())
    }

    fn set_text(&mut self, mount: &str, text: &str) -> Result<(), RenderError> {
        self.check(mount)?;
        self.texts.push((mount.to_string(), text.to_string()));
        Ok(())
    }
}

/// Draws each chart spec to `<output_dir>/<mount>.svg`; text mounts become
/// `<mount>.txt`.
pub struct SvgSurface {
    output_dir: PathBuf,
}

impl SvgSurface {
    pub fn new(output_dir: impl Into<PathBuf>) -> Result<Self, RenderError> {
        let output_dir = output_dir.into();
        std::fs::create_dir_all(&output_dir)
            .context("Failed to create output directory")
            .map_err(RenderError::Backend)?;
        Ok(Self { output_dir })
    }
}

impl RenderSurface for SvgSurface {
    fn draw_chart(&mut self, mount: &str, spec: &ChartSpec) -> Result<(), RenderError> {
        let path = self.output_dir.join(format!("{mount}.svg"));
        draw_spec(&path, spec).map_err(RenderError::Backend)
    }

    fn set_text(&mut self, mount: &str, text: &str) -> Result<(), RenderError> {
        let path = self.output_dir.join(format!("{mount}.txt"));
        std::fs::write(&path, text)
            .with_context(|| format!("Failed to write {}", path.display()))
            .map_err(RenderError::Backend)
    }
}

fn parse_hex_color(color: &str) -> RGBColor {
    let hex = color.trim_start_matches('#');
    if hex.len() == 6 && hex.is_ascii() {
        let channel = |range: std::ops::Range<usize>| {
            u8::from_str_radix(&hex[range], 16).unwrap_or(128)
        };
        RGBColor(channel(0..2), channel(2..4), channel(4..6))
    } else {
        RGBColor(128, 128, 128)
    }
}

fn draw_spec(path: &Path, spec: &ChartSpec) -> Result<()> {
    let root = SVGBackend::new(path, (1000, 600)).into_drawing_area();
    root.fill(&WHITE)?;

    match spec.kind {
        ChartKind::Bar => draw_bar_chart(&root, spec, false)?,
        ChartKind::GroupedBar => draw_bar_chart(&root, spec, true)?,
        ChartKind::Line => draw_line_chart(&root, spec)?,
        ChartKind::Heatmap => draw_heatmap(&root, spec)?,
    }

    root.present()?;
    Ok(())
}

fn max_y_value(spec: &ChartSpec) -> f64 {
    spec.series
        .iter()
        .flat_map(|s| s.points.iter().map(|&(_, y)| y))
        .fold(0.0_f64, |a, b| a.max(b))
}

fn draw_bar_chart(
    root: &DrawingArea<SVGBackend, Shift>,
    spec: &ChartSpec,
    grouped: bool,
) -> Result<()> {
    let num_cats = spec.x_labels.len().max(1);
    let max_y = (max_y_value(spec) * 1.25).max(1.0);

    let mut chart = ChartBuilder::on(root)
        .caption(&spec.title, ("sans-serif", TITLE_FONT_SIZE))
        .margin(20)
        .margin_bottom(DEFAULT_MARGIN_BOTTOM)
        .x_label_area_size(DEFAULT_X_LABEL_AREA_SIZE)
        .y_label_area_size(90)
        .build_cartesian_2d(-0.5..(num_cats as f64 - 0.5), 0.0..max_y)?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(num_cats)
        .x_label_formatter(&|x| {
            let idx = x.round() as usize;
            if idx < spec.x_labels.len() && (x - idx as f64).abs() < 0.3 {
                spec.x_labels[idx].clone()
            } else {
                String::new()
            }
        })
        .y_desc(spec.y_title.as_str())
        .x_desc(spec.x_title.as_str())
        .label_style(("sans-serif", TICK_LABEL_FONT_SIZE))
        .axis_desc_style(("sans-serif", AXIS_LABEL_FONT_SIZE))
        .draw()?;

    let num_series = spec.series.len().max(1);
    let bar_width = if grouped {
        0.8 / num_series as f64
    } else {
        0.6
    };

    for (series_idx, series) in spec.series.iter().enumerate() {
        let color = parse_hex_color(&series.color);

        for &(x_center, value) in &series.points {
            if value <= 0.0 {
                continue;
            }

            let x_offset = if grouped {
                (series_idx as f64 - (num_series as f64 - 1.0) / 2.0) * bar_width
            } else {
                0.0
            };
            let x_left = x_center + x_offset - bar_width / 2.0 + 0.02;
            let x_right = x_center + x_offset + bar_width / 2.0 - 0.02;

            chart.draw_series(std::iter::once(Rectangle::new(
                [(x_left, 0.0), (x_right, value)],
                color.filled(),
            )))?;

            if !grouped {
                chart.draw_series(std::iter::once(Text::new(
                    format_count(value),
                    (x_center, value + max_y * 0.02),
                    ("sans-serif", DATA_LABEL_FONT_SIZE)
                        .into_font()
                        .color(&BLACK)
                        .pos(Pos::new(HPos::Center, VPos::Bottom)),
                )))?;
            }
        }
    }

    if grouped {
        for series in &spec.series {
            let color = parse_hex_color(&series.color);
            chart
                .draw_series(std::iter::once(Circle::new(
                    (num_cats as f64 - 1.0, max_y),
                    0,
                    color.filled(),
                )))?
                .label(series.name.as_str())
                .legend(move |(x, y)| {
                    Rectangle::new([(x, y - 5), (x + 20, y + 5)], color.filled())
                });
        }

        chart
            .configure_series_labels()
            .position(SeriesLabelPosition::UpperLeft)
            .background_style(WHITE.mix(0.8))
            .border_style(BLACK)
            .label_font(("sans-serif", LEGEND_FONT_SIZE))
            .draw()?;
    }

    Ok(())
}

fn draw_line_chart(root: &DrawingArea<SVGBackend, Shift>, spec: &ChartSpec) -> Result<()> {
    let max_x = spec
        .series
        .iter()
        .flat_map(|s| s.points.iter().map(|&(x, _)| x))
        .fold(0.0_f64, |a, b| a.max(b))
        .max(1.0);
    let max_y = (max_y_value(spec) * 1.15).max(1.0);

    let mut chart = ChartBuilder::on(root)
        .caption(&spec.title, ("sans-serif", TITLE_FONT_SIZE))
        .margin(20)
        .margin_bottom(DEFAULT_MARGIN_BOTTOM)
        .x_label_area_size(DEFAULT_X_LABEL_AREA_SIZE)
        .y_label_area_size(110)
        .build_cartesian_2d(0.0..max_x * 1.05, 0.0..max_y)?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .y_desc(spec.y_title.as_str())
        .x_desc(spec.x_title.as_str())
        .label_style(("sans-serif", TICK_LABEL_FONT_SIZE))
        .axis_desc_style(("sans-serif", AXIS_LABEL_FONT_SIZE))
        .draw()?;

    for series in &spec.series {
        let color = parse_hex_color(&series.color);
        let data = series.points.clone();
        if data.is_empty() {
            continue;
        }

        if series.dashed {
            chart.draw_series(DashedLineSeries::new(data, 8, 6, color.stroke_width(2)))?;
            continue;
        }

        chart
            .draw_series(LineSeries::new(data.clone(), color.stroke_width(3)))?
            .label(series.name.as_str())
            .legend(move |(x, y)| {
                PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(3))
            });

        chart.draw_series(PointSeries::of_element(
            data,
            6,
            color.filled(),
            &|coord, size, style| EmptyElement::at(coord) + Circle::new((0, 0), size, style),
        ))?;
    }

    if spec.series.iter().any(|s| !s.dashed && !s.points.is_empty()) {
        chart
            .configure_series_labels()
            .position(SeriesLabelPosition::UpperLeft)
            .background_style(WHITE.mix(0.8))
            .border_style(BLACK)
            .label_font(("sans-serif", LEGEND_FONT_SIZE))
            .draw()?;
    }

    Ok(())
}

fn draw_heatmap(root: &DrawingArea<SVGBackend, Shift>, spec: &ChartSpec) -> Result<()> {
    let Some(grid) = &spec.heatmap else {
        return Ok(());
    };

    let num_cols = grid.col_labels.len().max(1);
    let num_rows = grid.row_labels.len().max(1);

    let mut chart = ChartBuilder::on(root)
        .caption(&spec.title, ("sans-serif", TITLE_FONT_SIZE))
        .margin(20)
        .margin_bottom(DEFAULT_MARGIN_BOTTOM)
        .x_label_area_size(DEFAULT_X_LABEL_AREA_SIZE)
        .y_label_area_size(160)
        .build_cartesian_2d(
            -0.5..(num_cols as f64 - 0.5),
            -0.5..(num_rows as f64 - 0.5),
        )?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .disable_y_mesh()
        .x_labels(num_cols)
        .x_label_formatter(&|x| {
            let idx = x.round() as usize;
            if idx < grid.col_labels.len() && (x - idx as f64).abs() < 0.3 {
                grid.col_labels[idx].clone()
            } else {
                String::new()
            }
        })
        .y_labels(num_rows)
        .y_label_formatter(&|y| {
            let idx = y.round() as usize;
            if idx < grid.row_labels.len() && (y - idx as f64).abs() < 0.3 {
                grid.row_labels[idx].clone()
            } else {
                String::new()
            }
        })
        .y_desc(spec.y_title.as_str())
        .x_desc(spec.x_title.as_str())
        .label_style(("sans-serif", TICK_LABEL_FONT_SIZE))
        .axis_desc_style(("sans-serif", AXIS_LABEL_FONT_SIZE))
        .draw()?;

    let max_value = grid
        .values
        .iter()
        .flatten()
        .fold(0.0_f64, |a, &b| a.max(b))
        .max(1.0);

    for (row_idx, row) in grid.values.iter().enumerate() {
        for (col_idx, &value) in row.iter().enumerate() {
            let color = heat_color(value / max_value);
            chart.draw_series(std::iter::once(Rectangle::new(
                [
                    (col_idx as f64 - 0.5, row_idx as f64 - 0.5),
                    (col_idx as f64 + 0.5, row_idx as f64 + 0.5),
                ],
                color.filled(),
            )))?;
        }
    }

    Ok(())
}

/// Interpolate the Viridis endpoints: dark purple for cold cells, yellow for
/// the hottest.
fn heat_color(t: f64) -> RGBColor {
    let t = t.clamp(0.0, 1.0);
    let lerp = |a: u8, b: u8| (a as f64 + (b as f64 - a as f64) * t).round() as u8;
    RGBColor(lerp(68, 253), lerp(1, 231), lerp(84, 37))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::heatmap_matrix;
    use crate::chart::{heatmap_chart, overview_throughput_chart, ColorTable};
    use crate::chart::{thread_scaling_chart, workload_slice_chart};
    use crate::model::{BenchmarkRecord, Database, RecordSet, Workload};

    fn sample_set() -> RecordSet {
        let record = |database: Database, threads: u32, throughput: f64| BenchmarkRecord {
            database,
            data_structure: database.data_structure(),
            workload: Workload::Balanced,
            threads,
            run_throughput_ops_sec: throughput,
            run_read_avg_latency_us: 10.0,
            run_read_95p_latency_us: 20.0,
            run_read_99p_latency_us: 30.0,
            run_scan_avg_latency_us: 0.0,
            run_scan_95p_latency_us: 0.0,
            run_scan_99p_latency_us: 0.0,
        };
        RecordSet::new(vec![
            record(Database::Redis, 1, 42_000.0),
            record(Database::Redis, 16, 104_000.0),
            record(Database::Rocksdb, 1, 50_000.0),
            record(Database::Rocksdb, 16, 92_000.0),
        ])
    }

    #[test]
    fn test_memory_surface_records_calls() {
        let mut surface = MemorySurface::new();
        let spec = overview_throughput_chart(&sample_set());

        surface.draw_chart("overallThroughputChart", &spec).unwrap();
        surface.set_text("balancedWinner", "redis (Hashtable)").unwrap();

        assert_eq!(surface.charts.len(), 1);
        assert_eq!(surface.charts[0].0, "overallThroughputChart");
        assert_eq!(surface.texts[0].1, "redis (Hashtable)");
    }

    #[test]
    fn test_memory_surface_rejects_unknown_mount() {
        let mut surface = MemorySurface::with_mounts(["overallThroughputChart"]);
        let spec = overview_throughput_chart(&sample_set());

        assert!(surface.draw_chart("overallThroughputChart", &spec).is_ok());
        let err = surface.draw_chart("missingChart", &spec).unwrap_err();
        assert!(matches!(err, RenderError::UnknownMount(mount) if mount == "missingChart"));
    }

    #[test]
    fn test_svg_surface_writes_chart_and_text_files() {
        let dir = tempfile::tempdir().unwrap();
        let mut surface = SvgSurface::new(dir.path()).unwrap();
        let records = sample_set();
        let colors = ColorTable::defaults();

        let specs = vec![
            overview_throughput_chart(&records),
            thread_scaling_chart(
                &crate::aggregate::series_per_database(&records, Workload::Balanced),
                Workload::Balanced,
                &colors,
            )
            .unwrap(),
            workload_slice_chart(&records, Workload::Balanced, 16, &colors).unwrap(),
            heatmap_chart(&heatmap_matrix(&records)),
        ];

        for (idx, spec) in specs.iter().enumerate() {
            surface.draw_chart(&format!("chart{idx}"), spec).unwrap();
            let path = dir.path().join(format!("chart{idx}.svg"));
            assert!(path.exists());
            assert!(std::fs::metadata(&path).unwrap().len() > 0);
        }

        surface.set_text("researchInsights", "insight text").unwrap();
        assert_eq!(
            std::fs::read_to_string(dir.path().join("researchInsights.txt")).unwrap(),
            "insight text"
        );
    }

    #[test]
    fn test_svg_surface_tolerates_empty_specs() {
        let dir = tempfile::tempdir().unwrap();
        let mut surface = SvgSurface::new(dir.path()).unwrap();
        let empty = RecordSet::default();

        let spec = overview_throughput_chart(&empty);
        surface.draw_chart("emptyChart", &spec).unwrap();
        assert!(dir.path().join("emptyChart.svg").exists());
    }

    #[test]
    fn test_parse_hex_color() {
        assert_eq!(parse_hex_color("#8B5CF6"), RGBColor(0x8B, 0x5C, 0xF6));
        assert_eq!(parse_hex_color("10B981"), RGBColor(0x10, 0xB9, 0x81));
        assert_eq!(parse_hex_color("nonsense"), RGBColor(128, 128, 128));
    }
}
