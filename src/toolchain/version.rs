//! Compiler version banner parsing.

use std::sync::LazyLock;

use regex::Regex;
use semver::Version;

static VERSION_KEYWORD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)version\s+(\d+)\.(\d+)(?:\.(\d+))?").expect("valid regex")
});

static BARE_VERSION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+)\.(\d+)(?:\.(\d+))?").expect("valid regex"));

/// Extract a version from `--version` output or the MSVC banner.
///
/// ```text
/// gcc (Ubuntu 13.2.0-4ubuntu3) 13.2.0
/// Ubuntu clang version 18.1.3 (1ubuntu1)
/// Microsoft (R) C/C++ Optimizing Compiler Version 19.38.33133 for x64
/// ```
pub fn parse_version(banner: &str) -> Option<Version> {
    let first_line = banner.lines().find(|l| !l.trim().is_empty())?;

    let captures = VERSION_KEYWORD
        .captures(first_line)
        .or_else(|| BARE_VERSION.captures(first_line))?;

    let part = |i: usize| {
        captures
            .get(i)
            .and_then(|m| m.as_str().parse::<u64>().ok())
            .unwrap_or(0)
    };

    Some(Version::new(part(1), part(2), part(3)))
}
