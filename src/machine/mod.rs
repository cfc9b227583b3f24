//! Machine simulation
//!
//! Running state, the simulator that threads it through a program, and
//! the metrics derived from the motion events it emits.

pub mod metrics;
pub mod simulator;
pub mod state;

pub use metrics::{AxisRange, BoundingBox3D, Metrics, MoveCounts, Travel};
pub use simulator::{simulate, IgnoredCode, MotionEvent, Simulator, Trace};
pub use state::{MachineState, Point3, Positioning, Spindle, StateSnapshot, Units, MM_PER_INCH};
