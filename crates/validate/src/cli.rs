// SPDX-FileCopyrightText: 2024 Robin Vobruba <hoijui.quaero@gmail.com>
//
// SPDX-License-Identifier: AGPL-3.0-or-later

use std::path::PathBuf;

use clap::builder::PossibleValuesParser;
use clap::{command, value_parser, Arg, ArgAction, Command, ValueHint};
use const_format::formatcp;

use crate::config::{Config, OutputFormat};

pub const A_S_VERSION: char = 'V';
pub const A_L_VERSION: &str = "version";
pub const A_S_QUIET: char = 'q';
pub const A_L_QUIET: &str = "quiet";
pub const A_S_VERBOSE: char = 'v';
pub const A_L_VERBOSE: &str = "verbose";
pub const A_S_CONTEXT: char = 'c';
pub const A_L_CONTEXT: &str = "context";
pub const A_S_ONTOLOGY: char = 'o';
pub const A_L_ONTOLOGY: &str = "ontology";
pub const A_S_ASSETS: char = 'a';
pub const A_L_ASSETS: &str = "assets";
pub const A_S_FORMAT: char = 'f';
pub const A_L_FORMAT: &str = "format";
pub const A_L_DOCUMENT: &str = "document";

fn arg_version() -> Arg {
    Arg::new(A_L_VERSION)
        .help(formatcp!(
            "Print version information and exit. \
May be combined with -{A_S_QUIET},--{A_L_QUIET}, \
to really only output the version string."
        ))
        .short(A_S_VERSION)
        .long(A_L_VERSION)
        .action(ArgAction::SetTrue)
}

fn arg_quiet() -> Arg {
    Arg::new(A_L_QUIET)
        .help("Minimize or suppress output to stderr")
        .long_help("Minimize or suppress output to stderr; the reports on stdout are always printed.")
        .action(ArgAction::SetTrue)
        .short(A_S_QUIET)
        .long(A_L_QUIET)
        .conflicts_with(A_L_VERBOSE)
}

fn arg_verbose() -> Arg {
    Arg::new(A_L_VERBOSE)
        .help("more verbose output (useful for debugging)")
        .short(A_S_VERBOSE)
        .long(A_L_VERBOSE)
        .action(ArgAction::SetTrue)
}

fn arg_context() -> Arg {
    Arg::new(A_L_CONTEXT)
        .help("The JSON-LD context to validate the documents against")
        .short(A_S_CONTEXT)
        .long(A_L_CONTEXT)
        .action(ArgAction::Set)
        .value_parser(value_parser!(std::path::PathBuf))
        .value_hint(ValueHint::FilePath)
        .value_name("CONTEXT_FILE")
        .required_unless_present(A_L_VERSION)
}

fn arg_ontology() -> Arg {
    Arg::new(A_L_ONTOLOGY)
        .help("An annotated context to enhance the context with; may be given multiple times")
        .short(A_S_ONTOLOGY)
        .long(A_L_ONTOLOGY)
        .action(ArgAction::Append)
        .value_parser(value_parser!(std::path::PathBuf))
        .value_hint(ValueHint::FilePath)
        .value_name("ONTOLOGY_FILE")
}

fn arg_assets() -> Arg {
    Arg::new(A_L_ASSETS)
        .help(formatcp!(
            "The directory to look up external contexts in; \
defaults to the directory of the --{A_L_CONTEXT} file"
        ))
        .short(A_S_ASSETS)
        .long(A_L_ASSETS)
        .action(ArgAction::Set)
        .value_parser(value_parser!(std::path::PathBuf))
        .value_hint(ValueHint::DirPath)
        .value_name("ASSETS_DIR")
}

fn arg_format() -> Arg {
    Arg::new(A_L_FORMAT)
        .help("How to print the validation reports")
        .short(A_S_FORMAT)
        .long(A_L_FORMAT)
        .action(ArgAction::Set)
        .value_parser(PossibleValuesParser::new(["table", "json"]))
        .default_value("table")
        .value_name("FORMAT")
}

fn arg_document() -> Arg {
    Arg::new(A_L_DOCUMENT)
        .help("The JSON-LD document(s) to validate")
        .action(ArgAction::Set)
        .value_parser(value_parser!(std::path::PathBuf))
        .value_hint(ValueHint::FilePath)
        .value_name("DOCUMENT")
        .required_unless_present(A_L_VERSION)
        .num_args(1..)
}

#[must_use]
pub fn args_matcher() -> Command {
    command!()
        .about(clap::crate_description!())
        .bin_name("ldvalid")
        .help_expected(true)
        .disable_version_flag(true)
        .arg(arg_version())
        .arg(arg_quiet())
        .arg(arg_verbose())
        .arg(arg_context())
        .arg(arg_ontology())
        .arg(arg_assets())
        .arg(arg_format())
        .arg(arg_document())
}

#[allow(clippy::print_stdout)]
fn print_version_and_exit(quiet: bool) {
    if !quiet {
        print!("ldvalid ");
    }
    println!("{}", crate::VERSION);
    std::process::exit(0);
}

#[derive(Clone, Debug)]
pub struct Args {
    pub quiet: bool,
    pub verbose: bool,
    pub config: Config,
}

/// Parses the command line arguments,
/// including verification.
///
/// # Panics
///
/// - The context file was not supplied
/// - No document was supplied
#[must_use]
pub fn parse() -> Args {
    let args = args_matcher().get_matches();

    let quiet = args.get_flag(A_L_QUIET);
    let version = args.get_flag(A_L_VERSION);
    if version {
        print_version_and_exit(quiet);
    }

    let verbose = args.get_flag(A_L_VERBOSE);
    let context = args
        .get_one::<PathBuf>(A_L_CONTEXT)
        .cloned()
        .expect("The context file is required");
    let ontologies: Vec<PathBuf> = args
        .get_many(A_L_ONTOLOGY)
        .map(|ontologies| ontologies.cloned().collect())
        .unwrap_or_default();
    let assets = args.get_one::<PathBuf>(A_L_ASSETS).cloned();
    let format = args
        .get_one::<String>(A_L_FORMAT)
        .and_then(|format| format.parse::<OutputFormat>().ok())
        .unwrap_or_default();
    let documents: Vec<PathBuf> = args
        .get_many(A_L_DOCUMENT)
        .expect("At least one JSON-LD document is required")
        .cloned()
        .collect();

    let config = Config {
        context,
        ontologies,
        assets,
        documents,
        format,
    };

    Args {
        quiet,
        verbose,
        config,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matcher_is_consistent() {
        args_matcher().debug_assert();
    }

    #[test]
    fn ontologies_accumulate() {
        let matches = args_matcher()
            .try_get_matches_from([
                "ldvalid", "-c", "ctx.jsonld", "-o", "a.jsonld", "--ontology", "b.jsonld", "--format",
                "json", "doc1.json", "doc2.json",
            ])
            .unwrap();
        let ontologies: Vec<&PathBuf> = matches.get_many(A_L_ONTOLOGY).unwrap().collect();
        assert_eq!(ontologies.len(), 2);
        let documents: Vec<&PathBuf> = matches.get_many(A_L_DOCUMENT).unwrap().collect();
        assert_eq!(documents.len(), 2);
        assert_eq!(matches.get_one::<String>(A_L_FORMAT).map(String::as_str), Some("json"));
    }

    #[test]
    fn documents_are_required() {
        assert!(args_matcher()
            .try_get_matches_from(["ldvalid", "-c", "ctx.jsonld"])
            .is_err());
        assert!(args_matcher().try_get_matches_from(["ldvalid", "-V"]).is_ok());
    }
}
