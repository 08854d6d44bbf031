//! Next-revision lookup from an `AssemblyInfo`-style source file.
//!
//! The build counter is the last dot-separated component of the first
//! `AssemblyVersion("..")` or `AssemblyFileVersion("..")` declaration that is
//! not commented out.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use anyhow::{Context, Result};
use regex::Regex;
use serde::Serialize;

use crate::comments::strip_comments;

/// The payload ends at its closing quote and never spans lines, but the
/// search itself runs over the whole text.
static VERSION_DECLARATION_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\bAssembly(?:File)?Version\("(?P<version>[^"\n]*)"\)"#)
        .expect("version declaration regex is valid")
});

/// Why a revision number could not be derived from a file's contents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RevisionError {
    EmptyContents,
    NoVersionDeclaration,
    /// The last version segment, exactly as written.
    UnparsableRevision(String),
    RevisionOverflow(i32),
}

impl fmt::Display for RevisionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RevisionError::EmptyContents => write!(f, "File contents are empty"),
            RevisionError::NoVersionDeclaration => write!(
                f,
                "Can't find any line with text 'AssemblyFileVersion' or 'AssemblyVersion'"
            ),
            RevisionError::UnparsableRevision(segment) => {
                write!(f, "Can't parse {segment} to int")
            }
            RevisionError::RevisionOverflow(n) => {
                write!(f, "Can't increment revision number {n}")
            }
        }
    }
}

impl std::error::Error for RevisionError {}

/// Outcome of one revision lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RevisionInfo {
    Found {
        revision_number: i32,
        next_revision_number: i32,
    },
    Failed(RevisionError),
}

impl RevisionInfo {
    /// Builds a successful result, or an overflow failure for `i32::MAX`.
    ///
    /// Overflow is the one failure about the number itself rather than the
    /// text: an empty file, a missing declaration and an unparsable segment
    /// are all decided by [`extract_revision_info`].
    pub fn found(revision_number: i32) -> Self {
        match revision_number.checked_add(1) {
            Some(next_revision_number) => RevisionInfo::Found {
                revision_number,
                next_revision_number,
            },
            None => RevisionInfo::Failed(RevisionError::RevisionOverflow(revision_number)),
        }
    }

    pub fn succeeded(&self) -> bool {
        matches!(self, RevisionInfo::Found { .. })
    }

    /// 0 when the lookup failed.
    pub fn revision_number(&self) -> i32 {
        match self {
            RevisionInfo::Found {
                revision_number, ..
            } => *revision_number,
            RevisionInfo::Failed(_) => 0,
        }
    }

    /// 0 when the lookup failed.
    pub fn next_revision_number(&self) -> i32 {
        match self {
            RevisionInfo::Found {
                next_revision_number,
                ..
            } => *next_revision_number,
            RevisionInfo::Failed(_) => 0,
        }
    }

    pub fn error(&self) -> Option<&RevisionError> {
        match self {
            RevisionInfo::Found { .. } => None,
            RevisionInfo::Failed(err) => Some(err),
        }
    }

    /// The failure message, if any.
    pub fn error_if_any(&self) -> Option<String> {
        self.error().map(ToString::to_string)
    }
}

impl fmt::Display for RevisionInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RevisionInfo::Found {
                revision_number,
                next_revision_number,
            } => write!(
                f,
                "RevisionNumber: {revision_number}, NextRevisionNumber: {next_revision_number}"
            ),
            RevisionInfo::Failed(err) => write!(f, "{err}"),
        }
    }
}

/// Flat view used in the JSON report.
#[derive(Debug, Serialize)]
pub(crate) struct RevisionReport {
    succeeded: bool,
    revision_number: i32,
    next_revision_number: i32,
    error: Option<String>,
}

impl From<&RevisionInfo> for RevisionReport {
    fn from(info: &RevisionInfo) -> Self {
        RevisionReport {
            succeeded: info.succeeded(),
            revision_number: info.revision_number(),
            next_revision_number: info.next_revision_number(),
            error: info.error_if_any(),
        }
    }
}

/// The version file does not exist. Fatal for the lookup, never turned into
/// a [`RevisionInfo`] failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileNotFound(pub PathBuf);

impl fmt::Display for FileNotFound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "File not found: {}", self.0.display())
    }
}

impl std::error::Error for FileNotFound {}

/// Derive the current and next revision numbers from source text.
pub fn extract_revision_info(text: &str) -> RevisionInfo {
    let contents = strip_comments(text);

    if contents.trim().is_empty() {
        return RevisionInfo::Failed(RevisionError::EmptyContents);
    }

    // First declaration wins.
    let Some(caps) = VERSION_DECLARATION_REGEX.captures(&contents) else {
        return RevisionInfo::Failed(RevisionError::NoVersionDeclaration);
    };

    let version = caps.name("version").map_or("", |m| m.as_str());
    let last_segment = version.rsplit('.').next().unwrap_or_default();

    match last_segment.trim().parse::<i32>() {
        Ok(revision_number) => RevisionInfo::found(revision_number),
        Err(_) => {
            RevisionInfo::Failed(RevisionError::UnparsableRevision(last_segment.to_string()))
        }
    }
}

/// Read a version file and derive its revision numbers.
///
/// A missing file is an error whose root cause is [`FileNotFound`]; problems
/// with the contents come back as a [`RevisionInfo::Failed`].
pub fn read_revision_info(path: &Path) -> Result<RevisionInfo> {
    if !path.is_file() {
        return Err(FileNotFound(path.to_path_buf()).into());
    }

    // Version files are a few lines long; read the whole thing.
    let bytes = fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let decoded = String::from_utf8_lossy(&bytes);
    let text = decoded.strip_prefix('\u{FEFF}').unwrap_or(&decoded);

    Ok(extract_revision_info(text))
}
