use crate::aggregate::{
    best_performer_per_workload, heatmap_matrix, latency_comparison, peak_throughput,
    series_per_database, PREFERRED_LATENCY_THREADS,
};
use crate::chart::{
    format_count, heatmap_chart, latency_chart, overview_throughput_chart,
    scaling_efficiency_chart, thread_scaling_chart, workload_display_name, workload_slice_chart,
    ChartConfigError, ChartSpec, ColorTable,
};
use crate::model::{Database, RecordSet, Workload};
use crate::render::RenderSurface;
use crate::store::OverviewSummary;
use std::collections::BTreeMap;
use tracing::{debug, error, warn};

/// Thread counts the benchmark sweep was run at.
pub const THREAD_COUNTS: [u32; 4] = [1, 4, 8, 16];

/// Dashboard sections, one navigation tab each.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Section {
    Overview,
    Comparison,
    Workloads,
    Scalability,
    Latency,
    Design,
}

impl Section {
    pub fn all() -> &'static [Section] {
        &[
            Section::Overview,
            Section::Comparison,
            Section::Workloads,
            Section::Scalability,
            Section::Latency,
            Section::Design,
        ]
    }

    pub fn name(&self) -> &'static str {
        match self {
            Section::Overview => "overview",
            Section::Comparison => "comparison",
            Section::Workloads => "workloads",
            Section::Scalability => "scalability",
            Section::Latency => "latency",
            Section::Design => "design",
        }
    }
}

/// Per-section lifecycle. `Loading` is transient within an activation; it is
/// a distinct state so a panicking build can never leave a section claiming
/// `Loaded`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectionState {
    NotLoaded,
    Loading,
    Loaded,
    Failed,
}

/// Session-scoped context: the record set, the optional server overview, and
/// the validated color table. Owned by the controller and passed by reference
/// into every aggregation and build call.
pub struct SessionContext {
    records: RecordSet,
    overview: Option<OverviewSummary>,
    colors: ColorTable,
}

impl SessionContext {
    /// Validates the color table up front so an unmapped pair fails here, at
    /// session construction, never mid-render.
    pub fn new(
        records: RecordSet,
        overview: Option<OverviewSummary>,
        colors: ColorTable,
    ) -> Result<Self, ChartConfigError> {
        colors.validate()?;
        Ok(Self {
            records,
            overview,
            colors,
        })
    }

    pub fn records(&self) -> &RecordSet {
        &self.records
    }

    pub fn overview(&self) -> Option<&OverviewSummary> {
        self.overview.as_ref()
    }

    pub fn colors(&self) -> &ColorTable {
        &self.colors
    }
}

/// Everything one section hands to the surface: chart mounts and text mounts.
#[derive(Debug, Default)]
pub struct SectionOutput {
    pub charts: Vec<(String, ChartSpec)>,
    pub texts: Vec<(String, String)>,
}

/// Mount id of one (workload, threads) slice chart, matching the page's
/// element ids ("readHeavy1Thread", "readHeavy8Threads").
pub fn slice_mount(workload: Workload, threads: u32) -> String {
    format!(
        "{}{}Thread{}",
        workload.mount_prefix(),
        threads,
        if threads == 1 { "" } else { "s" }
    )
}

/// Build one section's charts and texts. Pure apart from diagnostics; the
/// export command serializes these outputs instead of drawing them.
pub fn build_section(
    context: &SessionContext,
    section: Section,
) -> Result<SectionOutput, ChartConfigError> {
    let records = context.records();
    let colors = context.colors();
    let mut output = SectionOutput::default();

    match section {
        Section::Overview => {
            build_summary_cards(context, &mut output);
            output.charts.push((
                "overallThroughputChart".to_string(),
                overview_throughput_chart(records),
            ));
        }
        Section::Comparison => {
            for &workload in Workload::all() {
                let series = series_per_database(records, workload);
                output.charts.push((
                    format!("{}Comparison", workload.mount_prefix()),
                    thread_scaling_chart(&series, workload, colors)?,
                ));
            }
            output.charts.push((
                "performanceHeatmap".to_string(),
                heatmap_chart(&heatmap_matrix(records)),
            ));
            output
                .texts
                .push(("researchInsights".to_string(), research_insights(records)));
        }
        Section::Workloads => {
            for &workload in Workload::all() {
                for threads in THREAD_COUNTS {
                    let spec = workload_slice_chart(records, workload, threads, colors)?;
                    if spec.series.is_empty() {
                        debug!(
                            workload = workload.key(),
                            threads, "no records for slice, skipping chart"
                        );
                        continue;
                    }
                    output.charts.push((slice_mount(workload, threads), spec));
                }
            }
        }
        Section::Scalability => {
            for &workload in Workload::all() {
                output.charts.push((
                    format!("{}ScalabilityChart", workload.mount_prefix()),
                    scaling_efficiency_chart(records, workload, colors)?,
                ));
            }
        }
        Section::Latency => {
            for &workload in Workload::all() {
                let rows = latency_comparison(records, workload, PREFERRED_LATENCY_THREADS);
                output.charts.push((
                    format!("{}LatencyChart", workload.mount_prefix()),
                    latency_chart(&rows, workload),
                ));
            }
        }
        Section::Design => {
            output
                .texts
                .push(("designAnalysis".to_string(), DESIGN_ANALYSIS.to_string()));
        }
    }
    Ok(output)
}

/// Summary cards for the landing view. Prefers the server's precomputed
/// winners; falls back to the client-side reduction when the overview payload
/// never arrived. Workloads without a winner get no card.
fn build_summary_cards(context: &SessionContext, output: &mut SectionOutput) {
    let mut push_card = |workload: Workload, database: Database, structure_label: &str, throughput: f64| {
        output.texts.push((
            format!("{}Winner", workload.mount_prefix()),
            format!("{} ({})", database.name(), structure_label),
        ));
        output.texts.push((
            format!("{}Throughput", workload.mount_prefix()),
            format!("{} ops/sec", format_count(throughput)),
        ));
    };

    if let Some(summary) = context.overview() {
        for &workload in Workload::all() {
            let Some(entry) = summary.best_performers.get(&workload) else {
                continue;
            };
            let (Some(database), Some(data_structure)) = (entry.database, entry.data_structure)
            else {
                debug!(workload = workload.key(), "no precomputed winner, skipping card");
                continue;
            };
            push_card(workload, database, data_structure.label(), entry.throughput);
        }
        return;
    }

    let best = best_performer_per_workload(context.records());
    for &workload in Workload::all() {
        if let Some(record) = best.get(&workload) {
            push_card(
                workload,
                record.database,
                record.data_structure.label(),
                record.run_throughput_ops_sec,
            );
        }
    }
}

/// Derived insight text for the comparison section: per-workload winner lines
/// plus the range-query best/worst throughput gap.
fn research_insights(records: &RecordSet) -> String {
    let mut lines = vec!["Data Structure Performance Rankings".to_string()];

    let best = best_performer_per_workload(records);
    for &workload in Workload::all() {
        match best.get(&workload) {
            Some(record) => lines.push(format!(
                "- {}: {} ({}) leads at {} ops/sec with {} threads",
                workload_display_name(workload),
                record.database.name(),
                record.data_structure.label(),
                format_count(record.run_throughput_ops_sec),
                record.threads,
            )),
            None => lines.push(format!(
                "- {}: no data",
                workload_display_name(workload)
            )),
        }
    }

    if let Some((best_db, worst_db, ratio)) = range_query_gap(records) {
        lines.push(format!(
            "- Range queries expose a {:.0}x throughput gap between {} and {}",
            ratio,
            best_db.name(),
            worst_db.name(),
        ));
    }

    lines.join("\n")
}

/// Best/worst peak range-query throughput across databases, as (best, worst,
/// best/worst ratio). Needs two databases with positive peaks.
fn range_query_gap(records: &RecordSet) -> Option<(Database, Database, f64)> {
    let peaks: Vec<(Database, f64)> = Database::all()
        .iter()
        .filter_map(|&database| {
            peak_throughput(records, database, Workload::RangeQuery)
                .filter(|&peak| peak > 0.0)
                .map(|peak| (database, peak))
        })
        .collect();
    if peaks.len() < 2 {
        return None;
    }

    let mut best = peaks[0];
    let mut worst = peaks[0];
    for &entry in &peaks[1..] {
        if entry.1 > best.1 {
            best = entry;
        }
        if entry.1 < worst.1 {
            worst = entry;
        }
    }
    Some((best.0, worst.0, best.1 / worst.1))
}

/// Static architectural-tradeoff copy for the design section.
const DESIGN_ANALYSIS: &str = "\
Architectural Trade-offs
- LSM trees excel at reads when properly cached, despite their write-optimized design.
- Hashtables dominate balanced workloads but collapse on range queries.
- B+ Trees provide consistent but moderate performance across all operations.
- Memory contention becomes a significant bottleneck beyond 8 threads for most systems.";

/// Top-level controller: owns the surface, the session context, and every
/// section's state. Each section's chart construction runs at most once per
/// session.
pub struct Dashboard<S: RenderSurface> {
    surface: S,
    context: Option<SessionContext>,
    load_failure: Option<String>,
    states: BTreeMap<Section, SectionState>,
}

impl<S: RenderSurface> Dashboard<S> {
    pub fn new(surface: S) -> Self {
        let states = Section::all()
            .iter()
            .map(|&section| (section, SectionState::NotLoaded))
            .collect();
        Self {
            surface,
            context: None,
            load_failure: None,
            states,
        }
    }

    pub fn state(&self, section: Section) -> SectionState {
        self.states
            .get(&section)
            .copied()
            .unwrap_or(SectionState::NotLoaded)
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn into_surface(self) -> S {
        self.surface
    }

    /// Install the loaded context and eagerly drive the landing section,
    /// independent of navigation. Called at most once per session.
    pub fn attach_data(&mut self, context: SessionContext) -> Result<(), ChartConfigError> {
        self.context = Some(context);
        self.activate(Section::Overview)
    }

    /// Terminal load failure: a static message in the landing mount, zero
    /// chart builds for the rest of the session.
    pub fn fail_load(&mut self, message: &str) {
        error!(message, "results load failed");
        self.load_failure = Some(message.to_string());
        self.states.insert(Section::Overview, SectionState::Failed);
        if let Err(err) = self.surface.set_text("overview-section", message) {
            warn!(%err, "could not render load failure message");
        }
    }

    /// First activation builds and renders the section; once `Loaded`,
    /// re-activation is a no-op. Activating before any data resolves leaves
    /// the section `NotLoaded` so a later navigation retries.
    pub fn activate(&mut self, section: Section) -> Result<(), ChartConfigError> {
        match self.state(section) {
            SectionState::Loaded | SectionState::Failed => return Ok(()),
            SectionState::Loading | SectionState::NotLoaded => {}
        }

        if self.load_failure.is_some() {
            self.states.insert(section, SectionState::Failed);
            return Ok(());
        }
        let Some(context) = &self.context else {
            return Ok(());
        };

        self.states.insert(section, SectionState::Loading);
        let output = match build_section(context, section) {
            Ok(output) => output,
            Err(err) => {
                self.states.insert(section, SectionState::NotLoaded);
                return Err(err);
            }
        };

        for (mount, spec) in &output.charts {
            if let Err(err) = self.surface.draw_chart(mount, spec) {
                warn!(%mount, %err, "skipping chart mount");
            }
        }
        for (mount, text) in &output.texts {
            if let Err(err) = self.surface.set_text(mount, text) {
                warn!(%mount, %err, "skipping text mount");
            }
        }

        self.states.insert(section, SectionState::Loaded);
        Ok(())
    }
}
