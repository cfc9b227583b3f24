//! G-code Analyzer
//!
//! Static analysis of three-axis G-code programs.
//!
//! This library provides:
//! - A tolerant G-code parser (lines, words, classified commands)
//! - A machine-state simulator emitting one motion event per segment
//! - Bounding boxes, move counts, travel and run-time estimates
//! - Safety and process lint findings
//! - A 2D projection for toolpath previews
//! - Machine profiles and configuration for the CLI and language server
//!
//! ```
//! use gcode_analyzer::{analyze, AnalysisConfig};
//!
//! let result = analyze("G21 G90 G54\nG0 X10 Y5\nM30\n", &AnalysisConfig::default()).unwrap();
//! assert_eq!(result.move_counts.rapid, 1);
//! ```

pub mod analysis;
pub mod config;
pub mod error;
pub mod lint;
pub mod lsp;
pub mod machine;
pub mod parser;
pub mod profile;
pub mod projection;
pub mod report;

// Re-exports for the public API
pub use analysis::{analyze, AnalysisConfig, AnalysisResult};
pub use config::Config;
pub use error::{EngineError, ProfileError};
pub use lint::{LintFinding, Severity};
pub use machine::{AxisRange, BoundingBox3D, IgnoredCode, MoveCounts, Travel, Units};
pub use parser::{parse_line, parse_program, Command, ParsedLine};
pub use profile::{MachineProfile, MachineRegistry};
pub use projection::{project, segments_mm, Projection, Segment2D, Segment3D};
