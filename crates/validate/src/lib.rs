// SPDX-FileCopyrightText: 2024 Robin Vobruba <hoijui.quaero@gmail.com>
//
// SPDX-License-Identifier: AGPL-3.0-or-later

use clap as _;
use cli_utils as _;
use const_format as _;

pub mod config;
pub mod facet;
pub mod node;
pub mod parse;
pub mod report;
pub mod validator;

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use config::Config;
use git_version::git_version;
use ldvalid_base::DirRepository;
use ldvalid_context::{Context, ContextBuilder, ContextReader, EnhanceError};
use serde::Serialize;

pub use node::{Literal, LiteralValue, Node, ObjectNode};
pub use parse::{DocumentParser, ParseError};
pub use report::{Report, Severity, ValidationMessage};
pub use validator::Validator;

// This tests rust code in the README with doc-tests.
// Though, It will not appear in the generated documentation.
#[doc = include_str!("../README.md")]
#[cfg(doctest)]
pub struct ReadmeDoctests;

pub const VERSION: &str = git_version!(cargo_prefix = "", fallback = "unknown");

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("Failed to read '{}': {from}", .path.display())]
    Io { path: PathBuf, from: io::Error },

    #[error("Failed to load the context '{}': {from}", .path.display())]
    Context {
        path: PathBuf,
        from: ldvalid_context::Error,
    },

    #[error(transparent)]
    Enhance(#[from] EnhanceError),

    #[error("Failed to parse the document '{}': {from}", .path.display())]
    Document { path: PathBuf, from: ParseError },
}

/// The validation result of one document.
#[derive(Serialize, Debug)]
pub struct DocumentReport {
    pub document: PathBuf,
    pub report: Report,
}

fn read(path: &Path) -> Result<Vec<u8>, Error> {
    fs::read(path).map_err(|from| Error::Io {
        path: path.to_path_buf(),
        from,
    })
}

fn read_context(reader: &ContextReader<'_>, path: &Path) -> Result<Context, Error> {
    reader
        .read_slice(&read(path)?)
        .map_err(|from| Error::Context {
            path: path.to_path_buf(),
            from,
        })
}

/// Reads the context and enhances it with all the ontologies of the configuration.
///
/// # Errors
///
/// - a file could not be read
/// - the context or one of the ontologies is invalid
/// - the ontologies lack facts about some namespace used in the context
pub fn load_context(config: &Config) -> Result<Context, Error> {
    let repository = DirRepository::new(config.assets_dir());
    let reader = ContextReader::new().with_repository(&repository);
    let context = read_context(&reader, &config.context)?;
    if config.ontologies.is_empty() {
        return Ok(context);
    }
    let mut ontologies = ContextBuilder::new();
    for ontology in &config.ontologies {
        tracing::debug!("Reading ontology '{}' ...", ontology.display());
        ontologies.add_closed_component(read_context(&reader, ontology)?);
    }
    Ok(context.enhance(&ontologies.build())?)
}

/// Validates all documents of the configuration.
///
/// # Errors
///
/// See [`load_context`];
/// additionally, if one of the documents can not be read or is not valid JSON.
pub fn run(config: &Config) -> Result<Vec<DocumentReport>, Error> {
    let context = load_context(config)?;
    let parser = DocumentParser::new(&context);
    let validator = Validator::new(&context);
    let mut reports = Vec::new();
    for document in &config.documents {
        tracing::info!("Validating '{}' ...", document.display());
        let node = parser
            .parse_slice(&read(document)?)
            .map_err(|from| Error::Document {
                path: document.clone(),
                from,
            })?;
        let report = validator.validate(&node);
        tracing::debug!(
            "'{}': {} error(s), {} warning(s)",
            document.display(),
            report.error_count(),
            report.warning_count()
        );
        reports.push(DocumentReport {
            document: document.clone(),
            report,
        });
    }
    Ok(reports)
}
