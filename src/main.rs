use std::env;
use std::path::PathBuf;
use std::process;

use chrono::NaiveDate;
use clap::Parser;
use colored::Colorize;
use wtv::subwcrev::{SubWcRev, resolve_executable};
use wtv::{Config, Failure, print_error, run_with_config};

/// wtv - When The Version.
///
/// Automatic date-based version numbering: copies a template to an output
/// file, filling in the date, the SVN working-copy revision and the next
/// build number.
#[derive(Parser, Debug)]
#[command(
    name = "wtv",
    author,
    version,
    about = "Fill date, SVN revision and build-counter placeholders into a template",
    long_about = r#"Copy FILE_IN to FILE_OUT, replacing these placeholders:

  {DD}    - Day (UTC)
  {MM}    - Month (UTC)
  {YYYY}  - Year (UTC)
  {SVN}   - Subversion revision (needs --subwcrev and --working-copy)
  {REV}   - Next build number, read from --version-file

Typical pre-build command:
  wtv Properties/AssemblyInfo.Template.cs Properties/AssemblyInfo.cs \
      --subwcrev "C:\Program Files\TortoiseSVN\bin\SubWCRev.exe" \
      --working-copy .
"#
)]
struct Args {
    /// Template to read.
    #[arg(value_name = "FILE_IN")]
    input: PathBuf,

    /// File to write the result to (overwritten).
    #[arg(value_name = "FILE_OUT")]
    output: PathBuf,

    /// Path to SubWCRev.exe.
    ///
    /// If no file exists at this path, it is read as the name of an
    /// environment variable holding the path instead. Ignored without
    /// --working-copy.
    #[arg(
        long = "subwcrev",
        value_name = "PATH",
        env = "WTV_SUBWCREV"
    )]
    subwcrev: Option<PathBuf>,

    /// SVN working copy to ask SubWCRev about.
    #[arg(long = "working-copy", value_name = "PATH", requires = "subwcrev")]
    working_copy: Option<PathBuf>,

    /// Source file with an AssemblyVersion / AssemblyFileVersion declaration.
    ///
    /// {REV} becomes its last version component plus one.
    #[arg(long = "version-file", value_name = "PATH")]
    version_file: Option<PathBuf>,

    /// Use this date (YYYY-MM-DD) instead of today.
    #[arg(long = "date", value_name = "DATE")]
    date: Option<NaiveDate>,

    /// Print a JSON summary of the substituted values to stdout.
    #[arg(long = "json")]
    json: bool,
}

fn main() {
    let args = match Args::try_parse() {
        Ok(args) => args,
        // --help and --version
        Err(err) if !err.use_stderr() => err.exit(),
        Err(err) => {
            let _ = err.print();
            process::exit(Failure::WrongArguments.exit_code());
        }
    };

    if let Err(err) = run(args) {
        eprintln!("{} {:#}", "Error:".bold().red(), err);
        let code = err
            .downcast_ref::<Failure>()
            .map_or(1, |failure| failure.exit_code());
        process::exit(code);
    }
}

fn run(args: Args) -> anyhow::Result<()> {
    let subwcrev = match (args.subwcrev, args.working_copy) {
        (Some(candidate), Some(working_copy)) => {
            match resolve_executable(&candidate, |name| env::var_os(name)) {
                Some(executable) => Some(SubWcRev {
                    executable,
                    working_copy,
                }),
                None => {
                    print_error(&format!(
                        "SubWCrev.exe not found at: {}",
                        candidate.display()
                    ));
                    None
                }
            }
        }
        _ => None,
    };

    let cfg = Config {
        input: args.input,
        output: args.output,
        subwcrev,
        version_file: args.version_file,
        date: args.date,
        json: args.json,
    };

    run_with_config(cfg)
}
