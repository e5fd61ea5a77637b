//! In-memory view over a downloaded zip archive.

use std::fmt;
use std::io::{Cursor, Read};
use std::sync::{Arc, OnceLock};

use glob::{MatchOptions, Pattern};
use thiserror::Error;
use zip::result::ZipError;
use zip::ZipArchive;

use super::kind::{classify, ArchiveType};

#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("Invalid zip archive: {0}")]
    Zip(#[from] ZipError),

    #[error("Invalid file pattern: {0}")]
    Pattern(#[from] glob::PatternError),

    #[error("File not found in archive: {pattern}")]
    FileNotFound { pattern: String },

    #[error("IO error reading archive: {0}")]
    Io(#[from] std::io::Error),
}

const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

/// A package archive downloaded from ContentDB.
///
/// The archive owns its bytes and never changes after construction, so the
/// sorted listing is computed once and reused for its whole lifetime.
pub struct PackageArchive {
    bytes: Arc<[u8]>,
    zip: ZipArchive<Cursor<Arc<[u8]>>>,
    contents: OnceLock<Vec<String>>,
}

impl PackageArchive {
    /// Decode the zip directory of `bytes`.
    pub fn new(bytes: impl Into<Vec<u8>>) -> Result<Self, ArchiveError> {
        let bytes: Arc<[u8]> = Arc::from(bytes.into());
        let zip = ZipArchive::new(Cursor::new(Arc::clone(&bytes)))?;

        Ok(Self {
            bytes,
            zip,
            contents: OnceLock::new(),
        })
    }

    /// Every file in the archive, directories excluded.
    ///
    /// Shallower paths come first, then paths are ordered lexicographically
    /// within the same depth, so the first hit of a search is the most likely
    /// package root.
    pub fn contents(&self) -> &[String] {
        self.contents.get_or_init(|| {
            let mut files: Vec<String> = self
                .zip
                .file_names()
                .filter(|name| !name.ends_with('/'))
                .map(str::to_string)
                .collect();
            files.sort_by(|a, b| depth_first(a, b));
            files
        })
    }

    /// Count files named `name` and return the directory of the first one.
    ///
    /// A path matches when it equals `name` or ends with `/name`. When `max`
    /// is greater than zero the search stops after `max` matches. The
    /// directory keeps its trailing slash and is empty for the archive root.
    pub fn find_file(&self, name: &str, max: usize) -> (usize, String) {
        let suffix = format!("/{}", name);
        let mut count = 0;
        let mut dir: Option<String> = None;

        for file in self.contents() {
            if file == name || file.ends_with(&suffix) {
                if dir.is_none() {
                    dir = Some(parent_dir(file).to_string());
                }
                count += 1;
            }
            if max > 0 && count >= max {
                break;
            }
        }

        (count, dir.unwrap_or_default())
    }

    /// Read the first file (in archive order) whose cleaned path matches the
    /// shell-style `pattern`. `*` never crosses a `/`.
    pub fn read_file(&self, pattern: &str) -> Result<Vec<u8>, ArchiveError> {
        let matcher = Pattern::new(pattern)?;
        let mut zip = self.zip.clone();

        let index = (0..zip.len()).find(|&i| {
            zip.name_for_index(i)
                .filter(|name| !name.ends_with('/'))
                .map(|name| matcher.matches_with(&clean_path(name), MATCH_OPTIONS))
                .unwrap_or(false)
        });

        match index {
            Some(i) => {
                let mut file = zip.by_index(i)?;
                let mut buf = Vec::with_capacity(file.size() as usize);
                file.read_to_end(&mut buf)?;
                Ok(buf)
            }
            None => Err(ArchiveError::FileNotFound {
                pattern: pattern.to_string(),
            }),
        }
    }

    /// Read an entry by its exact name as stored in the archive.
    pub fn read_entry(&self, name: &str) -> Result<Vec<u8>, ArchiveError> {
        let mut zip = self.zip.clone();
        let mut file = match zip.by_name(name) {
            Ok(file) => file,
            Err(ZipError::FileNotFound) => {
                return Err(ArchiveError::FileNotFound {
                    pattern: name.to_string(),
                })
            }
            Err(e) => return Err(e.into()),
        };
        let mut buf = Vec::with_capacity(file.size() as usize);
        file.read_to_end(&mut buf)?;
        Ok(buf)
    }

    /// Detect what kind of content this archive holds.
    pub fn kind(&self) -> ArchiveType {
        classify(self)
    }

    /// The bytes this archive was created from.
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl fmt::Debug for PackageArchive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PackageArchive")
            .field("bytes", &self.bytes.len())
            .field("entries", &self.zip.len())
            .finish()
    }
}

fn depth_first(a: &str, b: &str) -> std::cmp::Ordering {
    let depth_a = a.matches('/').count();
    let depth_b = b.matches('/').count();
    depth_a.cmp(&depth_b).then_with(|| a.cmp(b))
}

/// Directory part of a `/`-separated path, trailing slash included.
pub(crate) fn parent_dir(path: &str) -> &str {
    match path.rfind('/') {
        Some(pos) => &path[..=pos],
        None => "",
    }
}

/// Lexically clean a `/`-separated archive path: drop empty and `.`
/// segments and fold `..` into its parent where possible.
pub(crate) fn clean_path(path: &str) -> String {
    let absolute = path.starts_with('/');
    let mut parts: Vec<&str> = Vec::new();

    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => match parts.last() {
                Some(&last) if last != ".." => {
                    parts.pop();
                }
                _ if absolute => {}
                _ => parts.push(".."),
            },
            other => parts.push(other),
        }
    }

    let joined = parts.join("/");
    match (absolute, joined.is_empty()) {
        (true, _) => format!("/{}", joined),
        (false, true) => ".".to_string(),
        (false, false) => joined,
    }
}
