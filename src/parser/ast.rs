//! Command types
//!
//! Minimal semantic representation of a G-code program.
//! No simulation logic here, pure data.

use serde::Serialize;

use crate::parser::lexer::SourceLine;

/// Target axes named on a motion line. Absent axes are unspecified, not zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct PartialPosition {
    pub x: Option<f64>,
    pub y: Option<f64>,
    pub z: Option<f64>,
}

impl PartialPosition {
    pub fn is_empty(&self) -> bool {
        self.x.is_none() && self.y.is_none() && self.z.is_none()
    }

    /// Render the specified axes as G-code words, e.g. "X10 Z-1"
    pub fn to_words(&self) -> String {
        [('X', self.x), ('Y', self.y), ('Z', self.z)]
            .into_iter()
            .filter_map(|(letter, value)| value.map(|v| format!("{}{}", letter, v)))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// A classified command
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Command {
    /// G0 (rapid) or G1 (cut); `feed` is an F word on the same line
    Motion {
        rapid: bool,
        target: PartialPosition,
        feed: Option<f64>,
    },
    /// Axis words without G0/G1, continuing the active motion mode
    ModalMotion {
        target: PartialPosition,
        feed: Option<f64>,
    },
    /// G20 (imperial) / G21 (metric)
    SetUnits { metric: bool },
    /// G90 (absolute) / G91 (incremental)
    SetPositioningMode { absolute: bool },
    /// G54..G59 as index 1..6
    SelectWcs { index: u8 },
    /// F word on a line without motion
    SetFeedRate { value: f64 },
    /// S word
    SetSpindleSpeed { rpm: f64 },
    /// M3 (cw) / M4 (ccw)
    SpindleOn { cw: bool },
    /// M5
    SpindleOff,
    /// M2 / M30
    ProgramEnd,
    /// Anything else; soft-ignored
    Unknown { code: String },
}

impl Command {
    /// Whether the command changes modal state without moving the machine
    pub fn is_state_change(&self) -> bool {
        !matches!(
            self,
            Command::Motion { .. } | Command::ModalMotion { .. } | Command::Unknown { .. }
        )
    }
}

/// A command-bearing line with its classified commands in execution order
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedLine {
    pub source: SourceLine,
    pub commands: Vec<Command>,
}

impl ParsedLine {
    pub fn number(&self) -> u32 {
        self.source.number
    }
}
