//! Working-copy revision via TortoiseSVN's `SubWCRev` helper.
//!
//! The helper is given a file containing `$WCREV$`, rewrites it in place with
//! the working copy's highest revision, and reports problems through its exit
//! code.

use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use anyhow::{Context, Result, bail};

const WCREV_KEYWORD: &str = "$WCREV$";

/// Location of the helper and the working copy to ask it about.
#[derive(Debug, Clone)]
pub struct SubWcRev {
    pub executable: PathBuf,
    pub working_copy: PathBuf,
}

impl SubWcRev {
    /// Run the helper and return the working copy revision.
    ///
    /// Revisions too big for a `u16` keep their last four digits.
    pub fn revision(&self) -> Result<u16> {
        let temp = tempfile::NamedTempFile::new()
            .context("Problem running SubWCrev.exe: could not create a temporary file")?
            .into_temp_path();

        fs::write(&temp, WCREV_KEYWORD)
            .with_context(|| format!("Problem running SubWCrev.exe: could not write {}", temp.display()))?;

        let status = Command::new(&self.executable)
            .arg(&self.working_copy)
            .arg(temp.as_os_str())
            .arg(temp.as_os_str())
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .status()
            .with_context(|| {
                format!("Problem running SubWCrev.exe at {}", self.executable.display())
            })?;

        match status.code() {
            Some(0) => {}
            code => bail!("SubWCRev.exe - {}", describe_exit_code(code)),
        }

        let raw = fs::read_to_string(&temp)
            .with_context(|| format!("Problem running SubWCrev.exe: could not read {}", temp.display()))?;

        fit_revision(&raw)
    }
}

/// Messages for the helper's documented exit codes.
fn describe_exit_code(code: Option<i32>) -> &'static str {
    match code {
        Some(1) => "Syntax error",
        Some(2) => "File/folder not found",
        Some(3) => "File open error",
        Some(4) => "Memory allocation error",
        Some(5) => "File read/write/size error",
        Some(6) => "SVN error (is the working copy path correct?)",
        Some(7) => "Local mods found (-n)",
        Some(8) => "Mixed rev WC found (-m)",
        Some(9) => "Output file already exists (-d)",
        Some(10) => "the path is not a working copy or part of one",
        _ => "unknown exit code status (sorry!)",
    }
}

/// Squeeze the helper's output into a `u16`.
fn fit_revision(raw: &str) -> Result<u16> {
    let digits = raw.trim();
    let revision: u64 = digits
        .parse()
        .with_context(|| format!("Problem running SubWCrev.exe: unexpected revision {digits:?}"))?;

    if let Ok(small) = u16::try_from(revision) {
        return Ok(small);
    }

    // Above u16::MAX, so at least five ASCII digits.
    let last_four = &digits[digits.len() - 4..];
    last_four
        .parse()
        .with_context(|| format!("Problem running SubWCrev.exe: unexpected revision {digits:?}"))
}

/// Find the helper executable.
///
/// `candidate` is used if it names an existing file. Otherwise it is taken
/// as the name of a variable to look up with `lookup`, and the value is used
/// if that names an existing file.
pub fn resolve_executable<F>(candidate: &Path, lookup: F) -> Option<PathBuf>
where
    F: Fn(&str) -> Option<OsString>,
{
    if candidate.is_file() {
        return Some(candidate.to_path_buf());
    }

    let from_var = PathBuf::from(lookup(candidate.to_str()?)?);
    from_var.is_file().then_some(from_var)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn small_revisions_are_used_as_is() {
        assert_eq!(fit_revision("1234").unwrap(), 1234);
        assert_eq!(fit_revision(" 65535\r\n").unwrap(), 65535);
    }

    #[test]
    fn large_revisions_keep_last_four_digits() {
        assert_eq!(fit_revision("65536").unwrap(), 5536);
        assert_eq!(fit_revision("1234567").unwrap(), 4567);
    }

    #[test]
    fn non_numeric_output_is_an_error() {
        assert!(fit_revision("$WCREV$").is_err());
        assert!(fit_revision("").is_err());
    }

    #[test]
    fn exit_codes_have_messages() {
        assert_eq!(describe_exit_code(Some(1)), "Syntax error");
        assert_eq!(
            describe_exit_code(Some(10)),
            "the path is not a working copy or part of one"
        );
        assert_eq!(describe_exit_code(Some(42)), "unknown exit code status (sorry!)");
        assert_eq!(describe_exit_code(None), "unknown exit code status (sorry!)");
    }

    #[test]
    fn existing_candidate_wins_over_lookup() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let resolved = resolve_executable(file.path(), |_| panic!("lookup not expected"));
        assert_eq!(resolved.as_deref(), Some(file.path()));
    }

    #[test]
    fn missing_candidate_falls_back_to_variable() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let target = file.path().as_os_str().to_owned();

        let resolved = resolve_executable(Path::new("SUBWCREV_PATH"), |name| {
            (name == "SUBWCREV_PATH").then(|| target.clone())
        });
        assert_eq!(resolved.as_deref(), Some(file.path()));
    }

    #[test]
    fn unresolvable_helper_is_none() {
        assert_eq!(resolve_executable(Path::new("NO_SUCH_HELPER"), |_| None), None);

        let resolved = resolve_executable(Path::new("BROKEN"), |_| {
            Some(OsString::from("/definitely/not/a/file"))
        });
        assert_eq!(resolved, None);
    }
}
