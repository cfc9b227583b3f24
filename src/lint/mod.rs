//! Lint Engine
//!
//! Safety and process findings over a simulated trace. Rules live in
//! [`rules`]; this module holds the finding types and the collector they
//! report into.

pub mod rules;

use serde::{Deserialize, Serialize};

pub use rules::run_rules;

/// Severity of a finding
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl Severity {
    pub fn label(self) -> &'static str {
        match self {
            Severity::Info => "info",
            Severity::Warning => "warning",
            Severity::Error => "error",
        }
    }
}

/// A single rule finding
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LintFinding {
    pub rule_id: String,
    pub severity: Severity,
    pub message: String,
    /// `None` for findings about the program as a whole
    pub source_line: Option<u32>,
}

/// Findings collected over one run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LintReport {
    pub findings: Vec<LintFinding>,
}

impl LintReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(
        &mut self,
        severity: Severity,
        rule_id: &str,
        source_line: Option<u32>,
        message: String,
    ) {
        self.findings.push(LintFinding {
            rule_id: rule_id.to_string(),
            severity,
            message,
            source_line,
        });
    }

    pub fn add_error(&mut self, rule_id: &str, source_line: Option<u32>, message: String) {
        self.add(Severity::Error, rule_id, source_line, message);
    }

    pub fn add_warning(&mut self, rule_id: &str, source_line: Option<u32>, message: String) {
        self.add(Severity::Warning, rule_id, source_line, message);
    }

    pub fn add_info(&mut self, rule_id: &str, source_line: Option<u32>, message: String) {
        self.add(Severity::Info, rule_id, source_line, message);
    }

    pub fn has_errors(&self) -> bool {
        self.findings
            .iter()
            .any(|finding| finding.severity == Severity::Error)
    }

    /// Findings ordered by source line (whole-program findings first), then
    /// rule id. Ties keep emission order.
    pub fn into_sorted(mut self) -> Vec<LintFinding> {
        self.findings.sort_by(|a, b| {
            a.source_line
                .cmp(&b.source_line)
                .then_with(|| a.rule_id.cmp(&b.rule_id))
        });
        self.findings
    }
}
