//! Machine profiles
//!
//! Named machine definitions loaded from TOML and folded into an
//! [`AnalysisConfig`](crate::AnalysisConfig).

pub mod registry;
pub mod schema;

pub use registry::MachineRegistry;
pub use schema::{LoadedProfile, MachineProfile, ProfileFile, ProfilePriority};
