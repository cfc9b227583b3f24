//! Report formatting
//!
//! Plain-text summary for terminals and the per-file JSON record. JSON is
//! the serde form of [`AnalysisResult`] as is.

use std::fmt;

use serde::Serialize;

use crate::analysis::AnalysisResult;
use crate::machine::BoundingBox3D;

/// One analyzed file in the JSON output
#[derive(Debug, Clone, Serialize)]
pub struct FileReport {
    pub file: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub machine: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub analysis: Option<AnalysisResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Human-readable summary of one file
pub struct TextReport<'a> {
    pub file: &'a str,
    pub machine: Option<&'a str>,
    pub result: &'a AnalysisResult,
}

impl fmt::Display for TextReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let result = self.result;
        let set = |seen: bool| if seen { "set" } else { "default" };

        writeln!(f, "{}", self.file)?;
        if let Some(machine) = self.machine {
            writeln!(f, "  machine:  {}", machine)?;
        }
        writeln!(
            f,
            "  units:    {} ({}), positioning {}",
            result.units.label(),
            set(result.units_seen),
            set(result.mode_seen)
        )?;
        writeln!(
            f,
            "  moves:    {} rapid, {} cut",
            result.move_counts.rapid, result.move_counts.cut
        )?;
        writeln!(
            f,
            "  travel:   {:.1} mm rapid, {:.1} mm cut",
            result.travel.rapid_mm, result.travel.cut_mm
        )?;
        writeln!(f, "  time:     {}", format_duration(result.estimated_time_s))?;
        match &result.bbox_mm {
            Some(bbox) => writeln!(f, "  bounds:   {} mm", format_bbox(bbox))?,
            None => writeln!(f, "  bounds:   no motion")?,
        }
        if !result.ignored.is_empty() {
            let mut codes: Vec<&str> = result.ignored.iter().map(|i| i.code.as_str()).collect();
            codes.sort_unstable();
            codes.dedup();
            writeln!(f, "  ignored:  {}", codes.join(", "))?;
        }

        if result.lints.is_empty() {
            return writeln!(f, "  no findings");
        }
        writeln!(f, "  findings:")?;
        for finding in &result.lints {
            let line = finding
                .source_line
                .map_or_else(|| "-".to_string(), |n| n.to_string());
            writeln!(
                f,
                "    {:>5}  {:<7}  {:<22}  {}",
                line,
                finding.severity.label(),
                finding.rule_id,
                finding.message
            )?;
        }
        Ok(())
    }
}

/// `1h 02m 03s`, `4m 05.2s` or `12.3s`
pub fn format_duration(seconds: f64) -> String {
    let seconds = seconds.max(0.0);
    let hours = (seconds / 3600.0).floor();
    let minutes = ((seconds - hours * 3600.0) / 60.0).floor();
    let rest = seconds - hours * 3600.0 - minutes * 60.0;

    if hours > 0.0 {
        format!("{}h {:02}m {:02.0}s", hours, minutes, rest.floor())
    } else if minutes > 0.0 {
        format!("{}m {:04.1}s", minutes, rest)
    } else {
        format!("{:.1}s", rest)
    }
}

fn format_bbox(bbox: &BoundingBox3D) -> String {
    bbox.axes()
        .iter()
        .map(|(axis, range)| format!("{}[{:.3}, {:.3}]", axis, range.min, range.max))
        .collect::<Vec<_>>()
        .join(" ")
}
