//! Archive extraction into an install directory.

use std::fs;
use std::path::{Path, PathBuf};

use crate::archive::PackageArchive;
use crate::error::Result;

/// Outcome of extracting one archive
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractSummary {
    /// Files written
    pub extracted: usize,
    /// Entries refused because they would land outside the destination
    pub skipped: Vec<String>,
}

/// Extract every file of `archive` into `dest`.
///
/// `prefix` is stripped from entry names that start with it; other entries
/// keep their path. The entry named exactly `exclude` is not written. Entries
/// resolving outside `dest` are skipped with a warning.
pub fn extract_archive(
    archive: &PackageArchive,
    prefix: &str,
    exclude: Option<&str>,
    dest: &Path,
) -> Result<ExtractSummary> {
    fs::create_dir_all(dest)?;
    let root = dest.canonicalize()?;
    let mut summary = ExtractSummary::default();

    for name in archive.contents() {
        if exclude == Some(name.as_str()) {
            continue;
        }

        let relative = name.strip_prefix(prefix).unwrap_or(name);
        let target = match contained_path(&root, relative) {
            Some(target) => target,
            None => {
                log::warn!("Possible zip slip, ignoring {}", name);
                summary.skipped.push(name.clone());
                continue;
            }
        };

        log::trace!("Extracting '{}' into '{}'", name, target.display());
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&target, archive.read_entry(name)?)?;
        summary.extracted += 1;
    }

    Ok(summary)
}

/// Join `relative` onto `root`, resolving `.` and `..` lexically.
///
/// Returns `None` when the result is `root` itself or not below it.
/// Containment is checked per component, so `mods/foobar` is not inside
/// `mods/foo`.
pub fn contained_path(root: &Path, relative: &str) -> Option<PathBuf> {
    let mut out = root.to_path_buf();

    for segment in relative.split(|c: char| c == '/' || c == '\\') {
        match segment {
            "" | "." => {}
            ".." => {
                if !out.pop() || !out.starts_with(root) {
                    return None;
                }
            }
            other => out.push(other),
        }
    }

    if out == root || !out.starts_with(root) {
        return None;
    }
    Some(out)
}
