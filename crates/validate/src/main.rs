// SPDX-FileCopyrightText: 2024 Robin Vobruba <hoijui.quaero@gmail.com>
//
// SPDX-License-Identifier: AGPL-3.0-or-later

#![allow(unused_crate_dependencies)]

mod cli;

use cli_utils::logging;
use cli_utils::BoxResult;
pub use ldvalid_validate as validate;
use tracing::metadata::LevelFilter;
pub use validate::config;
use validate::config::OutputFormat;
use validate::DocumentReport;

pub use validate::VERSION;

#[allow(clippy::print_stdout)]
fn print_reports(reports: &[DocumentReport], format: OutputFormat) -> BoxResult<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(reports)?),
        OutputFormat::Table => {
            for document in reports {
                println!("== {} ==", document.document.display());
                print!("{}", document.report);
            }
        }
    }
    Ok(())
}

fn main() -> BoxResult<()> {
    let log_reload_handle = logging::setup(clap::crate_name!())?;

    let cli_args = cli::parse();

    let log_level = if cli_args.verbose {
        LevelFilter::DEBUG
    } else if cli_args.quiet {
        LevelFilter::WARN
    } else {
        LevelFilter::INFO
    };
    logging::set_log_level_tracing(&log_reload_handle, log_level)?;

    let reports = validate::run(&cli_args.config)?;
    print_reports(&reports, cli_args.config.format)?;

    if reports.iter().any(|document| document.report.has_errors()) {
        std::process::exit(1);
    }

    Ok(())
}
