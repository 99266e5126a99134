//! Filesystem utilities.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use walkdir::WalkDir;

/// Extensions of C and C++ sources and headers.
pub const SOURCE_EXTENSIONS: &[&str] = &[
    "c", "cc", "cpp", "cxx", "h", "hh", "hpp", "hxx", "ipp", "inl",
];

/// Remove a directory and all its contents, if it exists.
///
/// Returns whether anything was removed.
pub fn remove_dir_all_if_exists(path: &Path) -> Result<bool> {
    if !path.exists() {
        return Ok(false);
    }
    fs::remove_dir_all(path)
        .with_context(|| format!("failed to remove directory: {}", path.display()))?;
    Ok(true)
}

/// Ensure a directory exists, creating it if necessary.
pub fn ensure_dir(path: &Path) -> Result<()> {
    if !path.exists() {
        fs::create_dir_all(path)
            .with_context(|| format!("failed to create directory: {}", path.display()))?;
    }
    Ok(())
}

/// Remove empty directories from `start` up to, but not including, `stop`.
pub fn prune_empty_parents(start: &Path, stop: &Path) -> Result<()> {
    let mut current = Some(start);
    while let Some(dir) = current {
        if dir == stop || !dir.starts_with(stop) || !dir.is_dir() {
            break;
        }
        let is_empty = fs::read_dir(dir)
            .with_context(|| format!("failed to read directory: {}", dir.display()))?
            .next()
            .is_none();
        if !is_empty {
            break;
        }
        fs::remove_dir(dir)
            .with_context(|| format!("failed to remove directory: {}", dir.display()))?;
        current = dir.parent();
    }
    Ok(())
}

/// Whether the path has a C/C++ source or header extension.
pub fn is_source_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| SOURCE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
}

/// Every source file under `dirs` (relative to `root`), skipping anything
/// under `exclude` and hidden directories. Sorted.
pub fn source_files(root: &Path, dirs: &[PathBuf], exclude: &[PathBuf]) -> Vec<PathBuf> {
    let excluded: Vec<PathBuf> = exclude.iter().map(|e| root.join(e)).collect();
    let mut files = Vec::new();

    for dir in dirs {
        let dir = root.join(dir);
        if !dir.is_dir() {
            tracing::debug!("Source directory does not exist: {}", dir.display());
            continue;
        }

        let walker = WalkDir::new(&dir).into_iter().filter_entry(|entry| {
            let hidden = entry.depth() > 0 && entry.file_name().to_string_lossy().starts_with('.');
            !hidden && !excluded.iter().any(|e| entry.path().starts_with(e))
        });

        for entry in walker {
            match entry {
                Ok(entry) if entry.file_type().is_file() && is_source_file(entry.path()) => {
                    files.push(entry.into_path());
                }
                Ok(_) => {}
                Err(e) => tracing::warn!("walk error: {}", e),
            }
        }
    }

    files.sort();
    files.dedup();
    files
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_source_files_respects_excludes() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path();
        fs::create_dir_all(root.join("src/core")).unwrap();
        fs::create_dir_all(root.join("src/third_party/fmt")).unwrap();
        fs::create_dir_all(root.join("src/.cache")).unwrap();
        fs::write(root.join("src/core/engine.cpp"), "").unwrap();
        fs::write(root.join("src/core/engine.HPP"), "").unwrap();
        fs::write(root.join("src/core/notes.md"), "").unwrap();
        fs::write(root.join("src/third_party/fmt/format.cc"), "").unwrap();
        fs::write(root.join("src/.cache/stale.cpp"), "").unwrap();

        let files = source_files(
            root,
            &[PathBuf::from("src"), PathBuf::from("missing")],
            &[PathBuf::from("src/third_party")],
        );
        assert_eq!(
            files,
            vec![root.join("src/core/engine.HPP"), root.join("src/core/engine.cpp")]
        );
    }

    #[test]
    fn test_prune_empty_parents_stops_at_root() {
        let tmp = TempDir::new().unwrap();
        let build = tmp.path().join("build");
        fs::create_dir_all(build.join("debug")).unwrap();
        fs::create_dir_all(build.join("release/linux")).unwrap();

        prune_empty_parents(&build.join("debug"), &build).unwrap();
        assert!(!build.join("debug").exists());
        assert!(build.exists());

        prune_empty_parents(&build.join("release"), &build).unwrap();
        assert!(build.join("release/linux").exists());
    }

    #[test]
    fn test_remove_dir_all_if_exists() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("ws");
        assert!(!remove_dir_all_if_exists(&dir).unwrap());
        fs::create_dir_all(dir.join("CMakeFiles")).unwrap();
        assert!(remove_dir_all_if_exists(&dir).unwrap());
        assert!(!dir.exists());
    }
}
