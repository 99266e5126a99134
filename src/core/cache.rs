//! Reading the build backend's cache of a previous configuration.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};

use crate::core::configuration::{BuildType, CompilerId, GeneratorRequest};
use crate::core::workspace::CACHE_MARKER;

/// Toolchain descriptor written by the dependency manager into the workspace.
pub const TOOLCHAIN_DESCRIPTOR: &str = "conan_toolchain.cmake";

/// Key/value pairs from a previous configuration.
///
/// Only ever used as a source of defaults while reconfiguring.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CachedConfig {
    entries: BTreeMap<String, String>,
    has_toolchain_descriptor: bool,
}

impl CachedConfig {
    /// Parse the text of a `CMakeCache.txt`.
    pub fn parse(contents: &str) -> Self {
        let mut entries = BTreeMap::new();

        for line in contents.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') || line.starts_with("//") {
                continue;
            }
            let Some((key, value)) = line.split_once('=') else {
                continue;
            };
            // NAME:TYPE=VALUE
            let name = key.split_once(':').map_or(key, |(name, _)| name).trim();
            if name.is_empty() {
                continue;
            }
            entries.insert(name.to_string(), value.trim().to_string());
        }

        CachedConfig {
            entries,
            has_toolchain_descriptor: false,
        }
    }

    pub fn with_toolchain_descriptor(mut self, present: bool) -> Self {
        self.has_toolchain_descriptor = present;
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str).filter(|v| !v.is_empty())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn build_type(&self) -> Option<BuildType> {
        self.get("CMAKE_BUILD_TYPE")?.parse().ok()
    }

    pub fn compiler(&self) -> Option<CompilerId> {
        self.get("CMAKE_CXX_COMPILER")
            .and_then(CompilerId::from_driver_path)
            .or_else(|| self.get("CMAKE_C_COMPILER").and_then(CompilerId::from_driver_path))
    }

    pub fn generator(&self) -> Option<GeneratorRequest> {
        self.get("CMAKE_GENERATOR")?.parse().ok()
    }

    /// A boolean cache entry, using CMake's truthiness rules.
    pub fn flag(&self, key: &str) -> Option<bool> {
        match self.get(key)?.to_ascii_uppercase().as_str() {
            "ON" | "TRUE" | "YES" | "Y" | "1" => Some(true),
            "OFF" | "FALSE" | "NO" | "N" | "0" | "IGNORE" | "NOTFOUND" => Some(false),
            other if other.ends_with("-NOTFOUND") => Some(false),
            _ => None,
        }
    }

    /// Whether the previous configuration used the dependency manager.
    pub fn dependency_manager(&self, prefix: &str) -> Option<bool> {
        self.flag(&format!("{}_USE_CONAN", prefix))
            .or(self.has_toolchain_descriptor.then_some(true))
    }
}

/// Loads [`CachedConfig`] from workspaces.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConfigurationStore;

impl ConfigurationStore {
    /// Load the cache of a workspace. Returns `None` when it was never configured.
    pub fn load(workspace_dir: &Path) -> Result<Option<CachedConfig>> {
        let path = workspace_dir.join(CACHE_MARKER);
        if !path.is_file() {
            return Ok(None);
        }

        // Paths in the cache use the system code page, not necessarily UTF-8
        let bytes = std::fs::read(&path).with_context(|| format!("failed to read cache: {}", path.display()))?;
        let cached = CachedConfig::parse(&String::from_utf8_lossy(&bytes))
            .with_toolchain_descriptor(workspace_dir.join(TOOLCHAIN_DESCRIPTOR).is_file());

        tracing::debug!("Loaded {} cache entries from {}", cached.len(), path.display());
        Ok(Some(cached))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::configuration::{BackendKind, VsVersion};
    use tempfile::TempDir;

    const SAMPLE: &str = r#"# This is the CMakeCache file.
// Path to a program.
CMAKE_CXX_COMPILER:FILEPATH=/usr/bin/clang++
CMAKE_BUILD_TYPE:STRING=RelWithDebInfo

//No help, variable specified on the command line.
CMAKE_GENERATOR:INTERNAL=Ninja
HELIOS_BUILD_TESTS:BOOL=ON
HELIOS_BUILD_EXAMPLES:BOOL=OFF
EMPTY_VALUE:STRING=
MALFORMED LINE
"#;

    #[test]
    fn test_parse_cache_entries() {
        let cached = CachedConfig::parse(SAMPLE);
        assert_eq!(cached.get("CMAKE_GENERATOR"), Some("Ninja"));
        assert_eq!(cached.get("EMPTY_VALUE"), None);
        assert_eq!(cached.get("MALFORMED LINE"), None);
        assert_eq!(cached.build_type(), Some(BuildType::RelWithDebInfo));
        assert_eq!(cached.compiler(), Some(CompilerId::CLANG));
        assert_eq!(cached.generator().map(|g| g.kind), Some(BackendKind::Ninja));
    }

    #[test]
    fn test_flags() {
        let cached = CachedConfig::parse(SAMPLE);
        assert_eq!(cached.flag("HELIOS_BUILD_TESTS"), Some(true));
        assert_eq!(cached.flag("HELIOS_BUILD_EXAMPLES"), Some(false));
        assert_eq!(cached.flag("HELIOS_BUILD_CORE_ONLY"), None);
    }

    #[test]
    fn test_visual_studio_generator_from_cache() {
        let cached = CachedConfig::parse(
            "CMAKE_GENERATOR:INTERNAL=Visual Studio 16 2019\nCMAKE_C_COMPILER:FILEPATH=cl.exe\n",
        );
        let generator = cached.generator().unwrap();
        assert_eq!(generator.version, Some(VsVersion::Vs2019));
        assert_eq!(cached.compiler(), Some(CompilerId::MSVC));
    }

    #[test]
    fn test_dependency_manager_falls_back_to_descriptor() {
        let cached = CachedConfig::parse(SAMPLE);
        assert_eq!(cached.dependency_manager("HELIOS"), None);
        let cached = cached.with_toolchain_descriptor(true);
        assert_eq!(cached.dependency_manager("HELIOS"), Some(true));

        let explicit_off = CachedConfig::parse("HELIOS_USE_CONAN:BOOL=OFF\n").with_toolchain_descriptor(true);
        assert_eq!(explicit_off.dependency_manager("HELIOS"), Some(false));
    }

    #[test]
    fn test_store_load() {
        let tmp = TempDir::new().unwrap();
        assert!(ConfigurationStore::load(tmp.path()).unwrap().is_none());

        std::fs::write(tmp.path().join(CACHE_MARKER), SAMPLE).unwrap();
        std::fs::write(tmp.path().join(TOOLCHAIN_DESCRIPTOR), "").unwrap();
        let cached = ConfigurationStore::load(tmp.path()).unwrap().unwrap();
        assert_eq!(cached.dependency_manager("KEEL"), Some(true));
    }

    #[test]
    fn test_store_load_tolerates_non_utf8() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(
            tmp.path().join(CACHE_MARKER),
            b"CMAKE_BUILD_TYPE:STRING=Debug\nCMAKE_HOME_DIRECTORY:INTERNAL=C:/Users/J\xf6rg/helios\n",
        )
        .unwrap();

        let cached = ConfigurationStore::load(tmp.path()).unwrap().unwrap();
        assert_eq!(cached.build_type(), Some(BuildType::Debug));
    }
}
