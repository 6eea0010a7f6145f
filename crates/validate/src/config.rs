// SPDX-FileCopyrightText: 2024 Robin Vobruba <hoijui.quaero@gmail.com>
//
// SPDX-License-Identifier: AGPL-3.0-or-later

use std::path::{Path, PathBuf};
use std::str::FromStr;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human readable table; one per document
    #[default]
    Table,
    /// A single JSON array, holding the reports of all documents
    Json,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "table" => Ok(Self::Table),
            "json" => Ok(Self::Json),
            other => Err(format!(
                "unknown output format '{other}'; expected one of: table, json"
            )),
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct Config {
    /**
     * The JSON-LD context document to validate against.
     */
    pub context: PathBuf,
    /**
     * Contexts annotated with class, property and datatype facts,
     * used to enhance `context` with.
     */
    pub ontologies: Vec<PathBuf>,
    /**
     * Where external contexts referenced by URI are looked up.
     * Defaults to the directory containing `context`.
     */
    pub assets: Option<PathBuf>,
    /**
     * The JSON-LD documents to validate.
     */
    pub documents: Vec<PathBuf>,
    pub format: OutputFormat,
}

impl Config {
    #[must_use]
    pub fn assets_dir(&self) -> PathBuf {
        self.assets.clone().unwrap_or_else(|| {
            self.context
                .parent()
                .map_or_else(|| PathBuf::from("."), Path::to_path_buf)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn assets_default_to_context_dir() {
        let config = Config {
            context: PathBuf::from("some/dir/ctx.jsonld"),
            ..Config::default()
        };
        assert_eq!(config.assets_dir(), PathBuf::from("some/dir"));
        let config = Config {
            assets: Some(PathBuf::from("assets")),
            ..config
        };
        assert_eq!(config.assets_dir(), PathBuf::from("assets"));
    }

    #[test]
    fn output_formats() {
        assert_eq!("json".parse(), Ok(OutputFormat::Json));
        assert!("xml".parse::<OutputFormat>().is_err());
    }
}
