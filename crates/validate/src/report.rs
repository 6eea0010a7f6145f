// SPDX-FileCopyrightText: 2024 Robin Vobruba <hoijui.quaero@gmail.com>
//
// SPDX-License-Identifier: AGPL-3.0-or-later

use std::fmt::Display;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

/// Leading error type names, like `DatatypeError: ` or `java.lang.IllegalStateException: `.
static ERROR_NAME_PREFIX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:(?:[A-Za-z_][A-Za-z0-9_]*\.)*[A-Za-z_][A-Za-z0-9_]*(?:Error|Exception):\s*)+")
        .unwrap()
});

#[derive(Serialize, Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    Error,
    Warning,
}

impl Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Error => "ERROR",
            Self::Warning => "WARNING",
        })
    }
}

#[derive(Serialize, Clone, Debug, PartialEq, Eq)]
pub struct ValidationMessage {
    pub severity: Severity,
    /// Dotted path to the offending node, e.g. `result.scores[2].value`;
    /// empty for the document root.
    pub path: String,
    pub text: String,
}

/// Strips leading error type names from a message.
#[must_use]
pub fn normalize(text: &str) -> &str {
    ERROR_NAME_PREFIX
        .find(text)
        .and_then(|prefix| text.get(prefix.end()..))
        .unwrap_or(text)
}

/// All the problems found in one validation pass, in the order they were found.
#[derive(Serialize, Clone, Debug, Default, PartialEq, Eq)]
#[serde(transparent)]
pub struct Report {
    messages: Vec<ValidationMessage>,
}

impl Report {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push<P: Into<String>, T: AsRef<str>>(&mut self, severity: Severity, path: P, text: T) {
        let message = ValidationMessage {
            severity,
            path: path.into(),
            text: normalize(text.as_ref()).to_owned(),
        };
        tracing::debug!("{} at '{}': {}", message.severity, message.path, message.text);
        self.messages.push(message);
    }

    pub fn error<P: Into<String>, T: AsRef<str>>(&mut self, path: P, text: T) {
        self.push(Severity::Error, path, text);
    }

    pub fn warning<P: Into<String>, T: AsRef<str>>(&mut self, path: P, text: T) {
        self.push(Severity::Warning, path, text);
    }

    #[must_use]
    pub fn messages(&self) -> &[ValidationMessage] {
        &self.messages
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ValidationMessage> {
        self.messages.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    fn count(&self, severity: Severity) -> usize {
        self.messages
            .iter()
            .filter(|message| message.severity == severity)
            .count()
    }

    #[must_use]
    pub fn error_count(&self) -> usize {
        self.count(Severity::Error)
    }

    #[must_use]
    pub fn warning_count(&self) -> usize {
        self.count(Severity::Warning)
    }

    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.messages
            .iter()
            .any(|message| message.severity == Severity::Error)
    }
}

impl<'a> IntoIterator for &'a Report {
    type Item = &'a ValidationMessage;
    type IntoIter = std::slice::Iter<'a, ValidationMessage>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

const HEADER_SEVERITY: &str = "SEVERITY";
const HEADER_PATH: &str = "PATH";
const HEADER_TEXT: &str = "MESSAGE";
const ROOT_PATH: &str = ".";

/// Renders a table of severity, path and text.
impl Display for Report {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.messages.is_empty() {
            return writeln!(f, "No problems found.");
        }
        let display_path = |message: &ValidationMessage| {
            if message.path.is_empty() {
                ROOT_PATH.to_owned()
            } else {
                message.path.clone()
            }
        };
        let path_width = self
            .messages
            .iter()
            .map(|message| display_path(message).chars().count())
            .chain([HEADER_PATH.len()])
            .max()
            .unwrap_or_default();
        let severity_width = HEADER_SEVERITY.len();
        writeln!(
            f,
            "{HEADER_SEVERITY:<severity_width$}  {HEADER_PATH:<path_width$}  {HEADER_TEXT}"
        )?;
        for message in &self.messages {
            writeln!(
                f,
                "{:<severity_width$}  {:<path_width$}  {}",
                message.severity.to_string(),
                display_path(message),
                message.text
            )?;
        }
        writeln!(
            f,
            "{} error(s), {} warning(s)",
            self.error_count(),
            self.warning_count()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_names_are_stripped() {
        assert_eq!(normalize("DatatypeError: Unsupported datatype"), "Unsupported datatype");
        assert_eq!(
            normalize("java.lang.IllegalStateException: ParseError: oops"),
            "oops"
        );
        assert_eq!(normalize("Expected maxLength=64"), "Expected maxLength=64");
        assert_eq!(normalize("Error: kept"), "Error: kept");
    }

    #[test]
    fn counts_and_rendering() {
        let mut report = Report::new();
        report.error("sourcedId", "Expected maxLength=64, but found length=70");
        report.warning("", "SomeException: could not check");
        assert_eq!(report.error_count(), 1);
        assert_eq!(report.warning_count(), 1);
        assert!(report.has_errors());
        assert_eq!(report.messages().get(1).map(|m| m.text.as_str()), Some("could not check"));

        let table = report.to_string();
        assert!(table.starts_with("SEVERITY"));
        assert!(table.contains("ERROR     sourcedId  Expected maxLength=64"));
        assert!(table.contains("WARNING   .          could not check"));
        assert!(table.ends_with("1 error(s), 1 warning(s)\n"));
    }

    #[test]
    fn serializes_as_list() {
        let mut report = Report::new();
        report.error("a.b", "bad");
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(
            json,
            serde_json::json!([{ "severity": "ERROR", "path": "a.b", "text": "bad" }])
        );
        assert_eq!(Report::new().to_string(), "No problems found.\n");
    }
}
