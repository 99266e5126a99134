//! Explicit environment variable maps.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::core::platform::Platform;

/// The environment a subprocess runs with.
///
/// Every subprocess receives exactly this map; the process environment of
/// `keel` itself is captured once and never modified. On Windows keys are
/// stored upper-cased so lookups are case-insensitive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvironmentContext {
    platform: Platform,
    vars: BTreeMap<String, String>,
}

impl EnvironmentContext {
    /// An empty environment.
    pub fn empty(platform: Platform) -> Self {
        EnvironmentContext {
            platform,
            vars: BTreeMap::new(),
        }
    }

    /// Snapshot of the current process environment.
    pub fn capture() -> Self {
        let mut env = EnvironmentContext::empty(Platform::host());
        for (key, value) in std::env::vars_os() {
            env.set(key.to_string_lossy(), value.to_string_lossy());
        }
        env
    }

    /// Reinterpret the same variables for another platform.
    pub fn for_platform(&self, platform: Platform) -> Self {
        let mut env = EnvironmentContext::empty(platform);
        for (key, value) in &self.vars {
            env.set(key, value);
        }
        env
    }

    pub fn platform(&self) -> Platform {
        self.platform
    }

    fn normalize_key(&self, key: &str) -> String {
        if self.platform.is_windows() {
            key.to_ascii_uppercase()
        } else {
            key.to_string()
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars.get(&self.normalize_key(key)).map(String::as_str)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some_and(|v| !v.is_empty())
    }

    pub fn set(&mut self, key: impl AsRef<str>, value: impl Into<String>) {
        let key = self.normalize_key(key.as_ref());
        self.vars.insert(key, value.into());
    }

    /// Builder-style [`set`](Self::set).
    pub fn with(mut self, key: impl AsRef<str>, value: impl Into<String>) -> Self {
        self.set(key, value);
        self
    }

    pub fn remove(&mut self, key: &str) -> Option<String> {
        let key = self.normalize_key(key);
        self.vars.remove(&key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.vars.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    /// Entries of `PATH`, in order.
    pub fn path_entries(&self) -> Vec<PathBuf> {
        let separator = self.platform.path_separator();
        self.get("PATH")
            .map(|path| {
                path.split(separator)
                    .filter(|p| !p.is_empty())
                    .map(PathBuf::from)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Put a directory in front of `PATH`.
    pub fn prepend_path(&mut self, dir: &Path) {
        let dir = dir.display().to_string();
        let path = match self.get("PATH") {
            Some(existing) if !existing.is_empty() => {
                format!("{}{}{}", dir, self.platform.path_separator(), existing)
            }
            _ => dir,
        };
        self.set("PATH", path);
    }
}

/// Parse a `set` / `env` style dump into key/value pairs.
///
/// Lines without `=` and entries with an empty key (such as the `=C:=C:\`
/// drive entries `cmd` prints) are skipped.
pub fn parse_dump(dump: &str) -> Vec<(String, String)> {
    dump.lines()
        .map(|line| line.trim_end_matches('\r'))
        .filter_map(|line| line.split_once('='))
        .filter(|(key, _)| !key.trim().is_empty())
        .map(|(key, value)| (key.trim().to_string(), value.to_string()))
        .collect()
}

/// Overlay a dumped environment onto `base`.
///
/// Keys from the dump are added or overwritten; every other key of `base`
/// is kept as-is.
pub fn merge_environment(base: &EnvironmentContext, dump: &str) -> EnvironmentContext {
    let mut merged = base.clone();
    for (key, value) in parse_dump(dump) {
        merged.set(key, value);
    }
    merged
}
