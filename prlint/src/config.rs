//! Startup configuration: CLI flags, tuning settings, and the ignore list.
//!
//! Three layers, three failure policies:
//! - required identity flags (repository API base, OAuth app credentials,
//!   public URL) come from clap and are fatal when missing;
//! - tuning knobs come from an optional TOML file — absent file means
//!   defaults, but an explicitly named file that cannot be read or parsed
//!   is fatal;
//! - the ignore list is optional, but a named file that cannot be read is
//!   fatal rather than silently reviewing files the operator excluded.
//!
//! The ignore rules are a plain value constructed once here and passed by
//! reference into eligibility checks; nothing in this module is global or
//! mutable after startup.

use std::path::{Path, PathBuf};

use clap::Parser;
use serde::Deserialize;
use thiserror::Error;

use prlint_core::ReviewConfig;

/// Command-line flags for the prlint server.
#[derive(Debug, Parser)]
#[command(name = "prlint", about = "Reviews pull requests with an external analyzer")]
pub struct Args {
    /// Address to bind the web server on.
    #[arg(long, default_value = "0.0.0.0:4567")]
    pub listen: String,

    /// Repository API base, e.g. `https://api.github.com/repos/owner/repo`.
    #[arg(long)]
    pub repo_api: String,

    /// OAuth application client id.
    #[arg(long)]
    pub client_id: String,

    /// OAuth application client secret.
    #[arg(long)]
    pub client_secret: String,

    /// Publicly reachable base URL of this server; the webhook is
    /// registered against `<public-url>/payload`.
    #[arg(long)]
    pub public_url: String,

    /// File listing files/folders to skip, one entry per line.
    #[arg(long)]
    pub ignore_file: Option<PathBuf>,

    /// TOML file with tuning settings (threshold, queue capacity, analyzer).
    #[arg(long)]
    pub settings: Option<PathBuf>,

    /// Diagnostic mode: log review comments instead of posting them.
    #[arg(long)]
    pub dry_run: bool,
}

/// A configuration problem that must stop startup.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read {path}: {source}")]
    Unreadable {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("cannot parse {path}: {source}")]
    Unparsable {
        path: String,
        #[source]
        source: toml::de::Error,
    },
}

/// Tuning settings loaded from the optional TOML file.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Findings below this confidence never become comments.
    pub confidence_threshold: f64,
    /// Capacity of the shared comment queue.
    pub queue_capacity: usize,
    /// Code-file extension a file must carry to be reviewed at all.
    pub extension: String,
    /// External analyzer command.
    pub analyzer: AnalyzerSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            confidence_threshold: 0.8,
            queue_capacity: 100,
            extension: ".go".to_owned(),
            analyzer: AnalyzerSettings::default(),
        }
    }
}

/// Which command to run as the analyzer. The file under review is appended
/// as the final argument, and the tool is expected to print one JSON
/// finding (`{"line": …, "confidence": …, "message": …}`) per stdout line.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AnalyzerSettings {
    pub program: String,
    pub args: Vec<String>,
}

impl Default for AnalyzerSettings {
    fn default() -> Self {
        Self { program: "golint".to_owned(), args: Vec::new() }
    }
}

impl Settings {
    /// Loads settings from `path`, or returns defaults when no path was
    /// given.
    ///
    /// # Errors
    ///
    /// An explicitly named file that cannot be read or parsed is a
    /// [`ConfigError`] — the operator asked for specific tuning and should
    /// not silently run on defaults.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let shown = path.display().to_string();
        let raw = std::fs::read_to_string(path)
            .map_err(|source| ConfigError::Unreadable { path: shown.clone(), source })?;
        toml::from_str(&raw).map_err(|source| ConfigError::Unparsable { path: shown, source })
    }

    /// The pipeline knobs as the core crate wants them.
    pub fn review_config(&self) -> ReviewConfig {
        ReviewConfig {
            confidence_threshold: self.confidence_threshold,
            queue_capacity: self.queue_capacity,
        }
    }
}

/// One parsed ignore entry.
#[derive(Debug, Clone, PartialEq, Eq)]
enum IgnoreRule {
    /// Exact repository-relative file name.
    Exact(String),
    /// Path prefix (a directory entry in the ignore file).
    Prefix(String),
    /// Suffix pattern, from a `*`-leading entry.
    Suffix(String),
}

/// The eligibility filter: a code-file extension gate plus the ignore rules.
#[derive(Debug, Clone)]
pub struct IgnoreList {
    rules: Vec<IgnoreRule>,
    extension: String,
}

impl IgnoreList {
    /// An ignore list with no rules — only the extension gate applies.
    pub fn empty(extension: &str) -> Self {
        Self { rules: Vec::new(), extension: extension.to_owned() }
    }

    /// Parses ignore-file text. Blank lines and `//` comments are skipped.
    ///
    /// Entry classes: `*suffix` matches by suffix; an entry without the
    /// configured code extension is a directory and matches by path
    /// prefix; anything else matches the exact file name.
    pub fn parse(text: &str, extension: &str) -> Self {
        let mut rules = Vec::new();
        for line in text.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with("//") {
                continue;
            }
            let rule = if let Some(suffix) = line.strip_prefix('*') {
                if suffix.is_empty() {
                    continue;
                }
                IgnoreRule::Suffix(suffix.to_owned())
            } else if !line.ends_with(extension) {
                IgnoreRule::Prefix(line.to_owned())
            } else {
                IgnoreRule::Exact(line.to_owned())
            };
            rules.push(rule);
        }
        Self { rules, extension: extension.to_owned() }
    }

    /// Whether `name` should be analyzed at all: it must carry the code
    /// extension and match no ignore rule.
    pub fn is_eligible(&self, name: &str) -> bool {
        if !name.ends_with(&self.extension) {
            return false;
        }
        !self.rules.iter().any(|rule| match rule {
            IgnoreRule::Exact(n) => name == n,
            IgnoreRule::Prefix(p) => name.starts_with(p.as_str()),
            IgnoreRule::Suffix(s) => name.ends_with(s.as_str()),
        })
    }

    /// Number of parsed rules, for the startup log line.
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ignore_entries_classify_by_shape() {
        let list = IgnoreList::parse(
            "// generated code\n\
             \n\
             *_test.go\n\
             vendor/\n\
             cmd/main.go\n",
            ".go",
        );
        assert_eq!(list.len(), 3, "comment and blank line are skipped");
        assert!(!list.is_eligible("parser_test.go"), "suffix rule");
        assert!(!list.is_eligible("vendor/lib/util.go"), "prefix rule");
        assert!(!list.is_eligible("cmd/main.go"), "exact rule");
        assert!(list.is_eligible("cmd/serve.go"), "exact rule does not spill over");
        assert!(list.is_eligible("parser.go"));
    }

    #[test]
    fn extension_gate_applies_before_rules() {
        let list = IgnoreList::empty(".go");
        assert!(!list.is_eligible("README.md"));
        assert!(!list.is_eligible("build.sh"));
        assert!(list.is_eligible("worker/mutation.go"));
    }

    #[test]
    fn lone_star_entry_is_dropped() {
        // A bare "*" would otherwise ignore everything.
        let list = IgnoreList::parse("*\n", ".go");
        assert!(list.is_empty());
        assert!(list.is_eligible("main.go"));
    }

    #[test]
    fn settings_default_when_no_path_given() {
        let settings = Settings::load(None).unwrap();
        assert_eq!(settings.confidence_threshold, 0.8);
        assert_eq!(settings.queue_capacity, 100);
        assert_eq!(settings.extension, ".go");
    }

    #[test]
    fn settings_parse_and_partial_override() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("settings.toml");
        std::fs::write(
            &path,
            "confidence_threshold = 0.6\n\
             extension = \".rs\"\n\
             [analyzer]\n\
             program = \"mylint\"\n\
             args = [\"--json\"]\n",
        )
        .unwrap();

        let settings = Settings::load(Some(path.as_path())).unwrap();
        assert_eq!(settings.confidence_threshold, 0.6);
        assert_eq!(settings.queue_capacity, 100, "unset keys keep defaults");
        assert_eq!(settings.extension, ".rs");
        assert_eq!(settings.analyzer.program, "mylint");
        assert_eq!(settings.analyzer.args, ["--json"]);
    }

    #[test]
    fn named_but_missing_settings_file_is_fatal() {
        let err = Settings::load(Some(Path::new("/nonexistent/prlint.toml"))).unwrap_err();
        assert!(matches!(err, ConfigError::Unreadable { .. }));
    }
}
