//! Analysis entry point
//!
//! [`analyze`] runs the whole pipeline: decode, parse, simulate, then
//! derive metrics, lint findings and the 2D projection from the trace.

use serde::{Deserialize, Serialize};

use crate::error::EngineError;
use crate::lint::{self, LintFinding, Severity};
use crate::machine::{self, BoundingBox3D, IgnoredCode, Metrics, MoveCounts, Travel, Units};
use crate::parser;
use crate::projection::{self, Segment2D, Segment3D};

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Caller-supplied constraints. Every field has a default so partial TOML
/// files deserialize.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Units assumed until the program selects G20/G21
    pub default_units: Units,
    pub default_rapid_rate_mm_per_min: f64,
    /// Caps the feed used for time estimates and enables `feed-exceeds-max`
    pub max_feed_mm_per_min: Option<f64>,
    /// Enables `unsafe-rapid`
    pub safe_z_mm: Option<f64>,
    /// Enables `outside-stock`
    pub stock_bounds_mm: Option<BoundingBox3D>,
    /// Separate Z rapid rate; XY and Z legs are then timed one after the other
    pub rapid_z_rate_mm_per_min: Option<f64>,
    /// Feed used to time cuts that have none
    pub fallback_feed_mm_per_min: f64,
    /// Enables `spindle-exceeds-max`
    pub max_spindle_rpm: Option<f64>,
    /// Work offset index (1 = G54 .. 6 = G59); enables `wcs-mismatch`
    pub expected_wcs: Option<u8>,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            default_units: Units::Metric,
            default_rapid_rate_mm_per_min: 6000.0,
            max_feed_mm_per_min: None,
            safe_z_mm: None,
            stock_bounds_mm: None,
            rapid_z_rate_mm_per_min: None,
            fallback_feed_mm_per_min: 1000.0,
            max_spindle_rpm: None,
            expected_wcs: None,
        }
    }
}

/// Everything one analysis run derives from a program
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisResult {
    /// Units in effect at the end of the program
    pub units: Units,
    pub units_seen: bool,
    pub mode_seen: bool,
    /// In program coordinates; `None` without motion
    pub bbox: Option<BoundingBox3D>,
    pub bbox_mm: Option<BoundingBox3D>,
    pub move_counts: MoveCounts,
    pub travel: Travel,
    pub estimated_time_s: f64,
    pub program_end_line: Option<u32>,
    pub lints: Vec<LintFinding>,
    pub ignored: Vec<IgnoredCode>,
    /// Plan view in program coordinates
    pub projection: Vec<Segment2D>,
    /// 3D preview in millimetres, one segment per motion event
    pub segments_mm: Vec<Segment3D>,
}

impl AnalysisResult {
    pub fn has_errors(&self) -> bool {
        self.lints
            .iter()
            .any(|finding| finding.severity == Severity::Error)
    }

    pub fn count(&self, severity: Severity) -> usize {
        self.lints
            .iter()
            .filter(|finding| finding.severity == severity)
            .count()
    }
}

/// Analyze a G-code program.
///
/// Fails only on input that is not UTF-8 or that carries no command at
/// all; every content problem is reported in [`AnalysisResult::lints`].
pub fn analyze(
    input: impl AsRef<[u8]>,
    config: &AnalysisConfig,
) -> Result<AnalysisResult, EngineError> {
    let text = decode(input.as_ref())?;

    let program = parser::parse_program(text);
    if program.is_empty() {
        return Err(EngineError::EmptyProgram);
    }

    let trace = machine::simulate(&program, config.default_units);
    let metrics = Metrics::from_events(&trace.events, config);
    let lints = lint::run_rules(&trace, config);
    let projection = projection::project(&trace.events).collect();
    let segments_mm = projection::segments_mm(&trace.events).collect();

    log::debug!(
        "analyzed {} lines: {} rapid, {} cut, {} findings",
        program.len(),
        metrics.move_counts.rapid,
        metrics.move_counts.cut,
        lints.len()
    );

    Ok(AnalysisResult {
        units: trace.final_units,
        units_seen: trace.units_seen,
        mode_seen: trace.mode_seen,
        bbox: metrics.bbox,
        bbox_mm: metrics.bbox_mm,
        move_counts: metrics.move_counts,
        travel: metrics.travel,
        estimated_time_s: metrics.estimated_time_s,
        program_end_line: trace.program_end_line,
        lints,
        ignored: trace.ignored,
        projection,
        segments_mm,
    })
}

/// Decode input as UTF-8, skipping a leading byte order mark
fn decode(bytes: &[u8]) -> Result<&str, EngineError> {
    let (skipped, body) = match bytes.strip_prefix(UTF8_BOM) {
        Some(body) => (UTF8_BOM.len(), body),
        None => (0, bytes),
    };

    std::str::from_utf8(body).map_err(|err| {
        let valid = &body[..err.valid_up_to()];
        let line = valid.iter().filter(|&&b| b == b'\n').count() as u32 + 1;
        EngineError::Encoding {
            line,
            offset: skipped + err.valid_up_to(),
        }
    })
}
