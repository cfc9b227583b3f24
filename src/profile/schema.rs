//! Machine Profile Schema
//!
//! TOML shape of a machine definition and how it folds into an
//! [`AnalysisConfig`].

use std::path::PathBuf;

use serde::Deserialize;

use crate::analysis::AnalysisConfig;
use crate::error::ProfileError;

/// Root profile file structure (matches TOML)
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ProfileFile {
    pub machine: MachineProfile,
}

/// Machine limits. Rates are mm/min, safe Z is mm.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct MachineProfile {
    pub name: String,
    pub description: Option<String>,
    pub max_rpm: Option<f64>,
    pub max_feed: Option<f64>,
    pub rapid_xy: Option<f64>,
    pub rapid_z: Option<f64>,
    pub safe_z: Option<f64>,
}

impl MachineProfile {
    /// Parse a profile from TOML text; `origin` names the source in errors
    pub fn from_toml(content: &str, origin: &str) -> Result<Self, ProfileError> {
        let file: ProfileFile = toml::from_str(content).map_err(|source| ProfileError::Parse {
            origin: origin.to_string(),
            source,
        })?;
        file.machine.validated(origin)
    }

    fn validated(self, origin: &str) -> Result<Self, ProfileError> {
        let invalid = |reason: String| ProfileError::Invalid {
            origin: origin.to_string(),
            reason,
        };

        if self.name.trim().is_empty() {
            return Err(invalid("name is empty".to_string()));
        }
        for (field, value) in [
            ("max_rpm", self.max_rpm),
            ("max_feed", self.max_feed),
            ("rapid_xy", self.rapid_xy),
            ("rapid_z", self.rapid_z),
        ] {
            if value.is_some_and(|v| v <= 0.0) {
                return Err(invalid(format!("{} must be positive", field)));
            }
        }

        Ok(self)
    }

    /// Fold the machine's limits into `config`; unset limits leave the
    /// config untouched
    pub fn apply(&self, config: &mut AnalysisConfig) {
        if let Some(max_rpm) = self.max_rpm {
            config.max_spindle_rpm = Some(max_rpm);
        }
        if let Some(max_feed) = self.max_feed {
            config.max_feed_mm_per_min = Some(max_feed);
        }
        if let Some(rapid_xy) = self.rapid_xy {
            config.default_rapid_rate_mm_per_min = rapid_xy;
        }
        if let Some(rapid_z) = self.rapid_z {
            config.rapid_z_rate_mm_per_min = Some(rapid_z);
        }
        if let Some(safe_z) = self.safe_z {
            config.safe_z_mm = Some(safe_z);
        }
    }
}

/// Where a profile came from; later sources override earlier ones
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ProfilePriority {
    BuiltIn = 0,
    UserGlobal = 1,
    Explicit = 2,
}

/// A profile with its source and priority
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedProfile {
    pub profile: MachineProfile,
    pub priority: ProfilePriority,
    pub source_path: Option<PathBuf>,
}
