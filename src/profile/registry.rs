//! Machine Registry
//!
//! In-memory set of machine profiles: built-ins embedded in the binary,
//! then profile directories layered on top by priority.

use std::collections::HashMap;
use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;

use super::schema::{LoadedProfile, MachineProfile, ProfilePriority};
use crate::error::ProfileError;

/// Embedded example machines as (origin, TOML)
const BUILTIN_PROFILES: &[(&str, &str)] = &[
    (
        "haas-vf2.toml",
        include_str!("../../resources/machines/haas-vf2.toml"),
    ),
    (
        "tormach-1100mx.toml",
        include_str!("../../resources/machines/tormach-1100mx.toml"),
    ),
    (
        "desktop-router.toml",
        include_str!("../../resources/machines/desktop-router.toml"),
    ),
];

/// Lines at each end of a document searched for a modeline
const MODELINE_SCAN_LINES: usize = 5;

static MODELINE_RE: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(r"gcode_machine\s*=\s*([A-Za-z0-9_-]+)")
        .inspect_err(|e| log::warn!("Invalid modeline pattern: {}", e))
        .ok()
});

#[derive(Debug, Clone, Default)]
pub struct MachineRegistry {
    profiles: HashMap<String, LoadedProfile>,
    active: Option<String>,
}

impl MachineRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding the embedded example machines
    pub fn with_builtin_profiles() -> Self {
        let mut registry = Self::new();
        registry.add_builtin_profiles();
        registry
    }

    /// Add a profile unless one of higher priority already holds its name
    pub fn add_profile(&mut self, loaded: LoadedProfile) -> bool {
        let name = loaded.profile.name.clone();
        let replace = self
            .profiles
            .get(&name)
            .is_none_or(|existing| loaded.priority >= existing.priority);

        if replace {
            log::debug!("Registered machine profile '{}' ({:?})", name, loaded.priority);
            self.profiles.insert(name, loaded);
        }
        replace
    }

    pub fn add_builtin_profiles(&mut self) {
        for (origin, content) in BUILTIN_PROFILES {
            match MachineProfile::from_toml(content, origin) {
                Ok(profile) => {
                    self.add_profile(LoadedProfile {
                        profile,
                        priority: ProfilePriority::BuiltIn,
                        source_path: None,
                    });
                }
                Err(e) => log::warn!("Failed to load built-in machine profile: {}", e),
            }
        }
    }

    /// Load every `*.toml` in `dir`, in file name order. A missing
    /// directory loads nothing; files that fail to parse are skipped.
    /// Returns how many profiles were registered.
    pub fn load_directory(
        &mut self,
        dir: &Path,
        priority: ProfilePriority,
    ) -> Result<usize, ProfileError> {
        if !dir.is_dir() {
            log::debug!("Machine directory {} does not exist", dir.display());
            return Ok(0);
        }

        let io_error = |source| ProfileError::Io {
            path: dir.to_path_buf(),
            source,
        };
        let mut paths = Vec::new();
        for entry in std::fs::read_dir(dir).map_err(io_error)? {
            let path = entry.map_err(io_error)?.path();
            if path.extension().and_then(|s| s.to_str()) == Some("toml") {
                paths.push(path);
            }
        }
        paths.sort();

        let mut loaded = 0;
        for path in paths {
            match load_profile_file(&path) {
                Ok(profile) => {
                    if self.add_profile(LoadedProfile {
                        profile,
                        priority,
                        source_path: Some(path),
                    }) {
                        loaded += 1;
                    }
                }
                Err(e) => log::warn!("Skipping machine profile: {}", e),
            }
        }

        Ok(loaded)
    }

    /// Select the default machine
    pub fn set_active(&mut self, name: &str) -> bool {
        if self.profiles.contains_key(name) {
            self.active = Some(name.to_string());
            true
        } else {
            false
        }
    }

    pub fn active(&self) -> Option<&MachineProfile> {
        self.active.as_deref().and_then(|name| self.get(name))
    }

    pub fn get(&self, name: &str) -> Option<&MachineProfile> {
        self.profiles.get(name).map(|loaded| &loaded.profile)
    }

    pub fn get_loaded(&self, name: &str) -> Option<&LoadedProfile> {
        self.profiles.get(name)
    }

    /// Profile names, sorted
    pub fn list_profiles(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.profiles.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Find a `gcode_machine=<name>` modeline in the first or last lines of
    /// `content`. Only names known to the registry are returned.
    pub fn detect_modeline_machine(&self, content: &str) -> Option<String> {
        let re = MODELINE_RE.as_ref()?;
        let lines: Vec<&str> = content.lines().collect();
        let head = lines.len().min(MODELINE_SCAN_LINES);
        let tail_start = lines.len().saturating_sub(MODELINE_SCAN_LINES).max(head);

        lines[..head]
            .iter()
            .chain(&lines[tail_start..])
            .filter_map(|line| re.captures(line))
            .filter_map(|captures| captures.get(1))
            .map(|name| name.as_str())
            .find(|name| self.profiles.contains_key(*name))
            .map(str::to_string)
    }

    /// The machine for a document: its modeline, else the active machine
    pub fn resolve_for(&self, content: &str) -> Option<&MachineProfile> {
        match self.detect_modeline_machine(content) {
            Some(name) => self.get(&name),
            None => self.active(),
        }
    }
}

fn load_profile_file(path: &Path) -> Result<MachineProfile, ProfileError> {
    let content = std::fs::read_to_string(path).map_err(|source| ProfileError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    MachineProfile::from_toml(&content, &path.display().to_string())
}
