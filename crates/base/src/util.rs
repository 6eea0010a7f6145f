// SPDX-FileCopyrightText: 2024 Robin Vobruba <hoijui.quaero@gmail.com>
//
// SPDX-License-Identifier: AGPL-3.0-or-later

use once_cell::sync::Lazy;
use regex::Regex;
use std::io;
use std::path::Path as StdPath;
use url::Url;

pub static NON_BASIC_CHARS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^a-zA-Z0-9]").unwrap());
pub static MULTI_UNDERSCORES: Lazy<Regex> = Lazy::new(|| Regex::new(r"__+").unwrap());

/// Turns a URI into a string that is safe to use as a file name,
/// by replacing every non alpha-numeric char with `_`,
/// and squashing runs of underscores.
/// Trailing underscores (e.g. from a trailing `/` or `#`) are removed.
///
/// # Examples
///
/// - `http://purl.imsglobal.org/ctx/lis/v2/outcomes` -> \
///   `http_purl_imsglobal_org_ctx_lis_v2_outcomes`
#[must_use]
pub fn url2fname(url: &Url) -> String {
    str2fname(url.as_str())
}

fn str2fname(uri: &str) -> String {
    let url_cleaned = NON_BASIC_CHARS.replace_all(uri, "_");
    let url_nameified = MULTI_UNDERSCORES.replace_all(&url_cleaned, "_");
    url_nameified.trim_end_matches('_').to_owned()
}

/// Like [`url2fname`], but for URIs that might not parse as [`Url`]s.
/// Parseable URIs get normalized first
/// (e.g. `HTTP://Example.org` and `http://example.org/` map to the same name).
#[must_use]
pub fn uri2fname(uri: &str) -> String {
    Url::parse(uri).map_or_else(|_| str2fname(uri), |url| url2fname(&url))
}

fn report_err_if_not_a_file(file_path: &StdPath) -> io::Result<bool> {
    Err(io::Error::new(
        io::ErrorKind::Other,
        format!(
            "Should be a file, but is not: '{}' - possible solution: delete it",
            file_path.display()
        ),
    ))
}

/// Checks whether the given path exists and is a file.
///
/// # Errors
///
/// - If the path exists but is not a file.
/// - If there is a permission problem.
/// - If there is an IO error.
pub fn look_for_file(file_path: &StdPath) -> io::Result<bool> {
    let path_exists = StdPath::try_exists(file_path)?;
    if path_exists && !std::fs::metadata(file_path)?.is_file() {
        return report_err_if_not_a_file(file_path);
    }
    Ok(path_exists)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fname_from_uri() {
        assert_eq!(
            uri2fname("http://purl.imsglobal.org/ctx/lis/v2/outcomes"),
            "http_purl_imsglobal_org_ctx_lis_v2_outcomes"
        );
        assert_eq!(uri2fname("http://example.org/"), "http_example_org");
        assert_eq!(uri2fname("HTTP://Example.org"), "http_example_org");
    }

    #[test]
    fn not_a_file() {
        let dir = tempfile::tempdir().unwrap();
        assert!(look_for_file(dir.path()).is_err());
        assert!(!look_for_file(&dir.path().join("missing.json")).unwrap());
    }
}
