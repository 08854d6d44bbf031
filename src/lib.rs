use std::fmt;
use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{Datelike, NaiveDate, Utc};
use colored::Colorize;

pub mod comments;
pub mod subwcrev;
pub mod version;

use crate::subwcrev::SubWcRev;
use crate::version::{FileNotFound, RevisionInfo, RevisionReport, read_revision_info};

pub const DAY_PLACEHOLDER: &str = "{DD}";
pub const MONTH_PLACEHOLDER: &str = "{MM}";
pub const YEAR_PLACEHOLDER: &str = "{YYYY}";
pub const SVN_PLACEHOLDER: &str = "{SVN}";
pub const REVISION_PLACEHOLDER: &str = "{REV}";

/// Configuration passed from the CLI layer (main.rs) into the core logic.
#[derive(Debug)]
pub struct Config {
    pub input: PathBuf,
    pub output: PathBuf,
    /// Already resolved; `None` substitutes 0 for `{SVN}`.
    pub subwcrev: Option<SubWcRev>,
    /// Source file holding an `AssemblyVersion`; `None` substitutes 0 for `{REV}`.
    pub version_file: Option<PathBuf>,
    /// Defaults to today (UTC).
    pub date: Option<NaiveDate>,
    pub json: bool,
}

/// Fatal failure classes, each with its own process exit code.
///
/// Attached to errors as `anyhow` context so `main` can recover the code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Failure {
    WrongArguments,
    ReadingInputFile,
    WritingOutputFile,
    DoingReplacements,
    VersionFileNotFound,
}

impl Failure {
    pub fn exit_code(self) -> i32 {
        match self {
            Failure::WrongArguments => 1,
            Failure::ReadingInputFile => 2,
            Failure::WritingOutputFile => 3,
            Failure::DoingReplacements => 4,
            Failure::VersionFileNotFound => 6,
        }
    }
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Failure::WrongArguments => "Wrong number of arguments",
            Failure::ReadingInputFile => "Problem reading input file",
            Failure::WritingOutputFile => "Problem writing to output file",
            Failure::DoingReplacements => "Problem doing replacements",
            Failure::VersionFileNotFound => "Version file not found",
        };
        f.write_str(text)
    }
}

/// Values substituted for the placeholders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Replacements {
    pub date: NaiveDate,
    pub svn_revision: u16,
    pub next_revision: i32,
}

impl Replacements {
    /// Replace every placeholder occurrence. Numbers are not zero padded.
    pub fn apply(&self, template: &str) -> String {
        template
            .replace(DAY_PLACEHOLDER, &self.date.day().to_string())
            .replace(MONTH_PLACEHOLDER, &self.date.month().to_string())
            .replace(YEAR_PLACEHOLDER, &self.date.year().to_string())
            .replace(SVN_PLACEHOLDER, &self.svn_revision.to_string())
            .replace(REVISION_PLACEHOLDER, &self.next_revision.to_string())
    }
}

#[derive(serde::Serialize)]
struct Report {
    input: String,
    output: String,
    day: u32,
    month: u32,
    year: i32,
    svn_revision: u16,
    revision: Option<RevisionReport>,
}

pub fn run_with_config(cfg: Config) -> Result<()> {
    let template = fs::read_to_string(&cfg.input)
        .with_context(|| format!("Failed to read {}", cfg.input.display()))
        .context(Failure::ReadingInputFile)?;

    let svn_revision = cfg.subwcrev.as_ref().map_or(0, svn_revision_or_zero);

    let revision_info = match &cfg.version_file {
        Some(path) => Some(read_revision_info(path).map_err(|err| {
            let failure = if err.is::<FileNotFound>() {
                Failure::VersionFileNotFound
            } else {
                Failure::DoingReplacements
            };
            err.context(failure)
        })?),
        None => None,
    };

    if let Some(info) = &revision_info
        && let Some(message) = info.error_if_any()
    {
        print_error(&message);
    }

    let replacements = Replacements {
        date: cfg.date.unwrap_or_else(|| Utc::now().date_naive()),
        svn_revision,
        next_revision: revision_info
            .as_ref()
            .map_or(0, RevisionInfo::next_revision_number),
    };

    let output = replacements.apply(&template);

    fs::write(&cfg.output, output)
        .with_context(|| format!("Failed to write {}", cfg.output.display()))
        .context(Failure::WritingOutputFile)?;

    if cfg.json {
        let report = Report {
            input: cfg.input.display().to_string(),
            output: cfg.output.display().to_string(),
            day: replacements.date.day(),
            month: replacements.date.month(),
            year: replacements.date.year(),
            svn_revision,
            revision: revision_info.as_ref().map(RevisionReport::from),
        };
        println!("{}", serde_json::to_string(&report)?);
    }

    Ok(())
}

/// Helper problems are reported but never stop the run.
fn svn_revision_or_zero(helper: &SubWcRev) -> u16 {
    match helper.revision() {
        Ok(revision) => revision,
        Err(err) => {
            print_error(&format!("{err:#}"));
            0
        }
    }
}

/// Print a non-fatal problem to stderr.
pub fn print_error(message: &str) {
    eprintln!("{} {}", "Error:".bold().red(), message);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn replacements() -> Replacements {
        Replacements {
            date: NaiveDate::from_ymd_opt(2024, 3, 7).unwrap(),
            svn_revision: 812,
            next_revision: 16,
        }
    }

    #[test]
    fn apply_replaces_every_placeholder() {
        let template = "[assembly: AssemblyVersion(\"{YYYY}.{MM}.{DD}.{SVN}\")]\n\
                        [assembly: AssemblyFileVersion(\"{YYYY}.{MM}.{DD}.{REV}\")]\n";

        assert_eq!(
            replacements().apply(template),
            "[assembly: AssemblyVersion(\"2024.3.7.812\")]\n\
             [assembly: AssemblyFileVersion(\"2024.3.7.16\")]\n"
        );
    }

    #[test]
    fn apply_replaces_repeated_placeholders_and_leaves_other_text() {
        let out = replacements().apply("{DD}/{DD} {dd} $WCREV$");
        assert_eq!(out, "7/7 {dd} $WCREV$");
    }

    #[test]
    fn failure_codes_are_distinct() {
        let codes = [
            Failure::WrongArguments,
            Failure::ReadingInputFile,
            Failure::WritingOutputFile,
            Failure::DoingReplacements,
            Failure::VersionFileNotFound,
        ]
        .map(Failure::exit_code);

        assert_eq!(codes, [1, 2, 3, 4, 6]);
    }

    #[test]
    fn failure_context_survives_in_error_chain() {
        let err = anyhow::anyhow!("disk on fire").context(Failure::WritingOutputFile);
        assert_eq!(
            err.downcast_ref::<Failure>(),
            Some(&Failure::WritingOutputFile)
        );
        assert_eq!(
            format!("{err:#}"),
            "Problem writing to output file: disk on fire"
        );
    }
}
