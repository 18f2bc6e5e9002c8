//! Ticker-list loading.
//!
//! Accepts either a JSON array of strings or newline-delimited text with
//! `#` comment lines. Symbols are upper-cased and deduplicated preserving
//! first-seen order.

use std::collections::HashSet;
use std::path::Path;

/// Errors loading the ticker list.
#[derive(Debug, thiserror::Error)]
pub enum TickerError {
    /// File could not be read.
    #[error("cannot read tickers file {path}: {source}")]
    Io {
        /// Configured path.
        path: String,
        /// Underlying error.
        source: std::io::Error,
    },

    /// JSON array could not be parsed.
    #[error("invalid JSON tickers file {path}: {source}")]
    Json {
        /// Configured path.
        path: String,
        /// Underlying error.
        source: serde_json::Error,
    },

    /// File parsed but contained no symbols.
    #[error("tickers file {0} contains no symbols")]
    Empty(String),

    /// Neither the configured file nor any discovery path exists.
    #[error("no tickers file found (checked {0})")]
    NotFound(String),
}

/// Fallback locations checked when no tickers file is configured.
const DISCOVERY_PATHS: &[&str] = &[
    "indices/combined.txt",
    "indices/tickers.json",
    "indices/sp500.txt",
];

/// Load tickers from the configured file, falling back to the discovery
/// paths when it is unset or missing.
///
/// # Errors
///
/// Returns a [`TickerError`] when no candidate file exists or the one
/// found cannot be parsed.
pub fn load_tickers_or_discover(configured: Option<&Path>) -> Result<Vec<String>, TickerError> {
    if let Some(path) = configured {
        if path.exists() {
            return load_tickers(path);
        }
        tracing::info!(path = %path.display(), "tickers file not found, trying discovery paths");
    }
    for candidate in DISCOVERY_PATHS {
        let path = Path::new(candidate);
        if path.exists() {
            tracing::info!(path = candidate, "found tickers file");
            return load_tickers(path);
        }
    }
    Err(TickerError::NotFound(DISCOVERY_PATHS.join(", ")))
}

/// Load tickers from `path`.
///
/// # Errors
///
/// Returns a [`TickerError`] when the file is missing, unparsable, or
/// yields no symbols.
pub fn load_tickers(path: &Path) -> Result<Vec<String>, TickerError> {
    let content = std::fs::read_to_string(path).map_err(|source| TickerError::Io {
        path: path.display().to_string(),
        source,
    })?;

    let raw: Vec<String> = if content.trim_start().starts_with('[') {
        serde_json::from_str(&content).map_err(|source| TickerError::Json {
            path: path.display().to_string(),
            source,
        })?
    } else {
        content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .map(ToString::to_string)
            .collect()
    };

    let tickers = normalize(raw);
    if tickers.is_empty() {
        return Err(TickerError::Empty(path.display().to_string()));
    }
    Ok(tickers)
}

/// Upper-case and deduplicate, preserving first-seen order.
fn normalize(raw: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut out = Vec::with_capacity(raw.len());
    for symbol in raw {
        let upper = symbol.trim().to_uppercase();
        if upper.is_empty() {
            continue;
        }
        if seen.insert(upper.clone()) {
            out.push(upper);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_file(content: &str) -> (tempfile::TempDir, std::path::PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tickers.txt");
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(content.as_bytes()).unwrap();
        (dir, path)
    }

    #[test]
    fn loads_newline_delimited_with_comments() {
        let (_dir, path) = write_file("# S&P 500\naapl\nMSFT\n\n# dupes\nAAPL\n");
        let tickers = load_tickers(&path).unwrap();
        assert_eq!(tickers, vec!["AAPL", "MSFT"]);
    }

    #[test]
    fn loads_json_array() {
        let (_dir, path) = write_file(r#"["aapl", "msft", "AAPL"]"#);
        let tickers = load_tickers(&path).unwrap();
        assert_eq!(tickers, vec!["AAPL", "MSFT"]);
    }

    #[test]
    fn empty_file_is_an_error() {
        let (_dir, path) = write_file("# only comments\n\n");
        assert!(matches!(load_tickers(&path), Err(TickerError::Empty(_))));
    }

    #[test]
    fn missing_file_is_an_error() {
        let result = load_tickers(Path::new("/nonexistent/tickers.txt"));
        assert!(matches!(result, Err(TickerError::Io { .. })));
    }
}
