//! Machine state
//!
//! The mutable state one simulation run threads through its commands.

use serde::{Deserialize, Serialize};

use crate::parser::PartialPosition;

pub const MM_PER_INCH: f64 = 25.4;

/// Program units
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Units {
    #[default]
    #[serde(rename = "mm", alias = "metric")]
    Metric,
    #[serde(rename = "in", alias = "imperial", alias = "inch")]
    Imperial,
}

impl Units {
    /// Convert a length (or a rate per minute) in these units to millimetres
    pub fn to_mm(self, value: f64) -> f64 {
        match self {
            Units::Metric => value,
            Units::Imperial => value * MM_PER_INCH,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Units::Metric => "mm",
            Units::Imperial => "in",
        }
    }
}

/// Distance mode
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Positioning {
    #[default]
    Absolute,
    Incremental,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase", tag = "state")]
pub enum Spindle {
    #[default]
    Off,
    On {
        cw: bool,
    },
}

/// Active motion code, kept modal for axis-only lines
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MotionMode {
    Rapid,
    Cut,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Point3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Point3 {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn to_mm(self, units: Units) -> Self {
        Self::new(units.to_mm(self.x), units.to_mm(self.y), units.to_mm(self.z))
    }

    pub fn axes(self) -> [f64; 3] {
        [self.x, self.y, self.z]
    }
}

/// The modal state captured at the start of each motion event
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct StateSnapshot {
    pub units: Units,
    pub positioning: Positioning,
    pub spindle: Spindle,
    pub spindle_speed: Option<f64>,
    pub wcs: Option<u8>,
}

/// Running machine state for one analysis
#[derive(Debug, Clone, PartialEq)]
pub struct MachineState {
    /// Always absolute, in the working units
    pub position: Point3,
    pub units: Units,
    pub positioning: Positioning,
    pub feed_rate: Option<f64>,
    pub spindle: Spindle,
    pub spindle_speed: Option<f64>,
    pub wcs: Option<u8>,
    pub motion_mode: Option<MotionMode>,
    pub has_moved: bool,
    /// A G20/G21 was executed
    pub units_seen: bool,
    /// A G90/G91 was executed
    pub mode_seen: bool,
}

impl MachineState {
    /// Fresh state at the origin; units come from configuration because
    /// files that never select them are common
    pub fn new(default_units: Units) -> Self {
        Self {
            position: Point3::default(),
            units: default_units,
            positioning: Positioning::Absolute,
            feed_rate: None,
            spindle: Spindle::Off,
            spindle_speed: None,
            wcs: None,
            motion_mode: None,
            has_moved: false,
            units_seen: false,
            mode_seen: false,
        }
    }

    pub fn snapshot(&self) -> StateSnapshot {
        StateSnapshot {
            units: self.units,
            positioning: self.positioning,
            spindle: self.spindle,
            spindle_speed: self.spindle_speed,
            wcs: self.wcs,
        }
    }

    /// Resolve a partial target against the current position and mode
    pub fn resolve(&self, target: &PartialPosition) -> Point3 {
        let current = self.position;
        let axis = |value: Option<f64>, now: f64| match (self.positioning, value) {
            (_, None) => now,
            (Positioning::Absolute, Some(v)) => v,
            (Positioning::Incremental, Some(delta)) => now + delta,
        };

        Point3::new(
            axis(target.x, current.x),
            axis(target.y, current.y),
            axis(target.z, current.z),
        )
    }
}
