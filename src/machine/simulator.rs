//! State-machine simulator
//!
//! Walks classified commands one at a time, mutating a [`MachineState`]
//! and emitting one [`MotionEvent`] per traversed segment.

use serde::Serialize;

use crate::machine::state::{
    MachineState, MotionMode, Point3, Positioning, Spindle, StateSnapshot, Units,
};
use crate::parser::{Command, ParsedLine, PartialPosition};

/// One traversed segment
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MotionEvent {
    pub from: Point3,
    pub to: Point3,
    pub rapid: bool,
    /// Feed in working units per minute, as of the segment start
    pub feed_rate: Option<f64>,
    pub source_line: u32,
    /// Modal state as of the segment start
    pub state: StateSnapshot,
}

impl MotionEvent {
    pub fn is_cut(&self) -> bool {
        !self.rapid
    }

    pub fn from_mm(&self) -> Point3 {
        self.from.to_mm(self.state.units)
    }

    pub fn to_mm(&self) -> Point3 {
        self.to.to_mm(self.state.units)
    }

    /// Straight-line length in millimetres
    pub fn length_mm(&self) -> f64 {
        let (from, to) = (self.from_mm(), self.to_mm());
        ((to.x - from.x).powi(2) + (to.y - from.y).powi(2) + (to.z - from.z).powi(2)).sqrt()
    }

    /// XY-plane length in millimetres
    pub fn xy_length_mm(&self) -> f64 {
        let (from, to) = (self.from_mm(), self.to_mm());
        ((to.x - from.x).powi(2) + (to.y - from.y).powi(2)).sqrt()
    }

    pub fn moves_in_xy(&self) -> bool {
        self.from.x != self.to.x || self.from.y != self.to.y
    }

    /// Feed converted to mm/min, if one is set
    pub fn feed_mm_per_min(&self) -> Option<f64> {
        self.feed_rate.map(|feed| self.state.units.to_mm(feed))
    }
}

/// A code the engine skipped over
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IgnoredCode {
    pub line: u32,
    pub code: String,
}

/// Everything one simulation run produced; input to metrics, lint rules
/// and projection
#[derive(Debug, Clone, PartialEq)]
pub struct Trace {
    pub events: Vec<MotionEvent>,
    pub default_units: Units,
    pub final_units: Units,
    pub units_seen: bool,
    pub mode_seen: bool,
    /// A G90/G91 executed before the first motion event
    pub mode_seen_before_motion: bool,
    pub program_end_line: Option<u32>,
    /// Commands after M2/M30 that were not simulated
    pub commands_after_end: usize,
    pub first_line_after_end: Option<u32>,
    pub ignored: Vec<IgnoredCode>,
}

/// Steps a fresh [`MachineState`] through commands
#[derive(Debug)]
pub struct Simulator {
    state: MachineState,
    trace: Trace,
}

impl Simulator {
    pub fn new(default_units: Units) -> Self {
        Self {
            state: MachineState::new(default_units),
            trace: Trace {
                events: Vec::new(),
                default_units,
                final_units: default_units,
                units_seen: false,
                mode_seen: false,
                mode_seen_before_motion: false,
                program_end_line: None,
                commands_after_end: 0,
                first_line_after_end: None,
                ignored: Vec::new(),
            },
        }
    }

    pub fn state(&self) -> &MachineState {
        &self.state
    }

    /// Apply one command from `line`
    pub fn step(&mut self, line: u32, command: &Command) {
        if self.trace.program_end_line.is_some() {
            self.trace.commands_after_end += 1;
            self.trace.first_line_after_end.get_or_insert(line);
            return;
        }

        match command {
            Command::Motion {
                rapid,
                target,
                feed,
            } => {
                let mode = if *rapid {
                    MotionMode::Rapid
                } else {
                    MotionMode::Cut
                };
                self.state.motion_mode = Some(mode);
                self.apply_feed(*feed);
                self.move_to(line, mode, target);
            }
            Command::ModalMotion { target, feed } => {
                self.apply_feed(*feed);
                match self.state.motion_mode {
                    Some(mode) => self.move_to(line, mode, target),
                    None => {
                        log::trace!("line {}: axis words without an active motion mode", line);
                        self.trace.ignored.push(IgnoredCode {
                            line,
                            code: target.to_words(),
                        });
                    }
                }
            }
            Command::SetUnits { metric } => {
                // The held position keeps its numbers in the new units
                self.state.units = if *metric {
                    Units::Metric
                } else {
                    Units::Imperial
                };
                self.state.units_seen = true;
            }
            Command::SetPositioningMode { absolute } => {
                self.state.positioning = if *absolute {
                    Positioning::Absolute
                } else {
                    Positioning::Incremental
                };
                if !self.state.has_moved {
                    self.trace.mode_seen_before_motion = true;
                }
                self.state.mode_seen = true;
            }
            Command::SelectWcs { index } => self.state.wcs = Some(*index),
            Command::SetFeedRate { value } => self.state.feed_rate = Some(*value),
            Command::SetSpindleSpeed { rpm } => self.state.spindle_speed = Some(*rpm),
            Command::SpindleOn { cw } => self.state.spindle = Spindle::On { cw: *cw },
            Command::SpindleOff => self.state.spindle = Spindle::Off,
            Command::ProgramEnd => self.trace.program_end_line = Some(line),
            Command::Unknown { code } => {
                log::trace!("line {}: ignoring {}", line, code);
                self.trace.ignored.push(IgnoredCode {
                    line,
                    code: code.clone(),
                });
            }
        }
    }

    /// Apply every command of a parsed line
    pub fn step_line(&mut self, line: &ParsedLine) {
        for command in &line.commands {
            self.step(line.number(), command);
        }
    }

    pub fn finish(mut self) -> Trace {
        self.trace.final_units = self.state.units;
        self.trace.units_seen = self.state.units_seen;
        self.trace.mode_seen = self.state.mode_seen;
        self.trace
    }

    fn apply_feed(&mut self, feed: Option<f64>) {
        if let Some(feed) = feed {
            self.state.feed_rate = Some(feed);
        }
    }

    fn move_to(&mut self, line: u32, mode: MotionMode, target: &PartialPosition) {
        // G0/G1 without axis words only changes the motion mode
        if target.is_empty() {
            return;
        }

        let from = self.state.position;
        let to = self.state.resolve(target);

        self.trace.events.push(MotionEvent {
            from,
            to,
            rapid: mode == MotionMode::Rapid,
            feed_rate: self.state.feed_rate,
            source_line: line,
            state: self.state.snapshot(),
        });

        self.state.position = to;
        self.state.has_moved = true;
    }
}

/// Simulate a parsed program from a fresh state
pub fn simulate(program: &[ParsedLine], default_units: Units) -> Trace {
    let mut simulator = Simulator::new(default_units);
    for line in program {
        simulator.step_line(line);
    }
    simulator.finish()
}
