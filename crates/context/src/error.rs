// SPDX-FileCopyrightText: 2024 Robin Vobruba <hoijui.quaero@gmail.com>
//
// SPDX-License-Identifier: AGPL-3.0-or-later

use ldvalid_base::AssetError;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("Failed to parse JSON at line {line}, column {column}: {message}")]
    Parse {
        line: usize,
        column: usize,
        message: String,
    },

    #[error("Invalid definition of term '{term}': {message}")]
    InvalidDefinition { term: String, message: String },

    #[error("Invalid pattern '{pattern}': {message}")]
    InvalidPattern { pattern: String, message: String },

    #[error("Class '{class}' already declares a restriction on property '{property}'")]
    DuplicateRestriction { class: String, property: String },

    #[error("External context '{uri}' (indirectly) references itself")]
    Cyclic { uri: String },

    #[error("External context '{uri}' is referenced, but no asset repository is available")]
    NoRepository { uri: String },

    #[error(transparent)]
    Asset(#[from] AssetError),
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        let message = err.to_string();
        // serde_json appends " at line X column Y"; we report those separately
        let message = message
            .rfind(" at line ")
            .and_then(|idx| message.get(..idx))
            .unwrap_or(&message)
            .to_owned();
        Self::Parse {
            line: err.line(),
            column: err.column(),
            message,
        }
    }
}
