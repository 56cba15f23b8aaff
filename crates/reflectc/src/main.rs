//! `reflectc` — the CLI driver (spec §1's "driver glue" plus the
//! out-of-scope collaborators the core names but doesn't implement: file
//! I/O and argument parsing).
//!
//! Reads the input files named on the command line, feeds their contents
//! through [`reflectc_driver::process`], writes the generated header and
//! source to disk, and maps the error-registry drain to an exit code
//! (spec §7: "A non-empty registry yields a non-zero exit code").

use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use reflectc_arena::Arena;
use reflectc_model::MAX_INPUT_FILES;

/// Scans the given input files for struct/enum/union/function declarations
/// and emits a reflection-metadata header and source pair.
#[derive(Debug, Parser)]
#[clap(name = "reflectc", version)]
struct Cli {
    /// C/C++-ish input files to scan, in order (1..=16).
    #[clap(required = true)]
    inputs: Vec<PathBuf>,

    /// Output path for the generated header.
    #[clap(short = 'o', long = "header", value_name = "PATH", default_value = "reflection.h")]
    header_out: PathBuf,

    /// Output path for the generated source.
    #[clap(short = 's', long = "source", value_name = "PATH", default_value = "reflection.cpp")]
    source_out: PathBuf,

    /// Byte budget for the arena's file-text region.
    #[clap(long = "file-capacity", value_name = "BYTES", default_value_t = reflectc_arena::DEFAULT_FILE_CAPACITY)]
    file_capacity: usize,

    /// Byte budget for the arena's permanent region (model + generated text).
    #[clap(long = "permanent-capacity", value_name = "BYTES", default_value_t = reflectc_arena::DEFAULT_PERMANENT_CAPACITY)]
    permanent_capacity: usize,

    /// Increase log verbosity (stackable: -v, -vv).
    #[clap(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress all logging except errors.
    #[clap(short = 'q', long = "quiet")]
    quiet: bool,
}

fn init_tracing(cli: &Cli) {
    let default_level = if cli.quiet {
        "error"
    } else {
        match cli.verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(&cli);

    if cli.inputs.len() > MAX_INPUT_FILES {
        eprintln!(
            "reflectc: error: too many input files (got {}, max {MAX_INPUT_FILES})",
            cli.inputs.len()
        );
        return ExitCode::FAILURE;
    }

    let arena = Arena::new(cli.file_capacity, cli.permanent_capacity);
    let mut registry = reflectc_model::ErrorRegistry::new();
    let mut file_texts: Vec<&str> = Vec::with_capacity(cli.inputs.len());

    for path in &cli.inputs {
        match fs::read_to_string(path) {
            Ok(text) => file_texts.push(arena.push_file_str(&text)),
            Err(err) => {
                tracing::warn!(path = %path.display(), error = %err, "could not read input file");
                registry.push(reflectc_model::ErrorKind::FileNotFound {
                    path: path.display().to_string(),
                });
            }
        }
    }

    let output = match reflectc_driver::process(&file_texts, &arena) {
        Ok(output) => output,
        Err(err) => {
            eprintln!("reflectc: error: {err}");
            return ExitCode::FAILURE;
        }
    };

    for entry in output.registry.iter() {
        registry.push(entry.kind.clone());
    }

    if let Err(err) = fs::write(&cli.header_out, &output.header) {
        tracing::warn!(path = %cli.header_out.display(), error = %err, "could not write header");
        registry.push(reflectc_model::ErrorKind::CouldNotWrite {
            path: cli.header_out.display().to_string(),
        });
    }
    if let Err(err) = fs::write(&cli.source_out, &output.source) {
        tracing::warn!(path = %cli.source_out.display(), error = %err, "could not write source");
        registry.push(reflectc_model::ErrorKind::CouldNotWrite {
            path: cli.source_out.display().to_string(),
        });
    }

    let had_errors = registry.drain_to_stderr();
    if had_errors {
        ExitCode::FAILURE
    } else {
        tracing::info!(
            header = %cli.header_out.display(),
            source = %cli.source_out.display(),
            "generation complete"
        );
        ExitCode::SUCCESS
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_parses_required_inputs_and_defaults() {
        let cli = Cli::parse_from(["reflectc", "a.h", "b.h"]);
        assert_eq!(cli.inputs, vec![PathBuf::from("a.h"), PathBuf::from("b.h")]);
        assert_eq!(cli.header_out, PathBuf::from("reflection.h"));
        assert_eq!(cli.source_out, PathBuf::from("reflection.cpp"));
    }

    #[test]
    fn cli_accepts_overridden_outputs() {
        let cli = Cli::parse_from(["reflectc", "-o", "out.h", "-s", "out.cpp", "in.h"]);
        assert_eq!(cli.header_out, PathBuf::from("out.h"));
        assert_eq!(cli.source_out, PathBuf::from("out.cpp"));
    }

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }
}
