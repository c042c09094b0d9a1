//! External analyzer adapter.
//!
//! The pipeline treats the analyzer as a black box; this adapter makes
//! that box a child process. The fetched content is written to a scratch
//! file (keeping the original extension, since many tools sniff the
//! language from it), the configured command runs with that path appended
//! as its final argument, and stdout is parsed as one JSON finding per
//! line. Any failure is scoped to the one file being analyzed.

use std::path::Path;
use std::process::ExitStatus;

use async_trait::async_trait;
use thiserror::Error;
use tokio::process::Command;

use prlint_core::{Analyzer, BoxError, Finding};

use crate::config::AnalyzerSettings;

/// Why one analyzer run produced no findings.
#[derive(Debug, Error)]
pub enum AnalyzerError {
    #[error("scratch file: {0}")]
    Io(#[from] std::io::Error),
    #[error("analyzer exited with {status}: {stderr}")]
    Failed { status: ExitStatus, stderr: String },
    #[error("unparsable finding {line:?}: {source}")]
    Parse {
        line: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Runs the configured analyzer command against one file's content.
#[derive(Debug, Clone)]
pub struct CommandAnalyzer {
    settings: AnalyzerSettings,
}

impl CommandAnalyzer {
    pub fn new(settings: AnalyzerSettings) -> Self {
        Self { settings }
    }

    async fn run(&self, name: &str, content: &[u8]) -> Result<Vec<Finding>, AnalyzerError> {
        let suffix = Path::new(name)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| format!(".{e}"))
            .unwrap_or_default();
        // The guard must outlive the child process so the path stays valid.
        let scratch = tempfile::Builder::new()
            .prefix("prlint-")
            .suffix(&suffix)
            .tempfile()?;
        std::fs::write(scratch.path(), content)?;

        let output = Command::new(&self.settings.program)
            .args(&self.settings.args)
            .arg(scratch.path())
            .output()
            .await?;
        if !output.status.success() {
            return Err(AnalyzerError::Failed {
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            });
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let mut findings = Vec::new();
        for line in stdout.lines() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let finding = serde_json::from_str(line)
                .map_err(|source| AnalyzerError::Parse { line: line.to_owned(), source })?;
            findings.push(finding);
        }
        Ok(findings)
    }
}

#[async_trait]
impl Analyzer for CommandAnalyzer {
    async fn analyze(&self, name: &str, content: &[u8]) -> Result<Vec<Finding>, BoxError> {
        Ok(self.run(name, content).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shell(script: &str) -> CommandAnalyzer {
        // `sh -c <script> <scratch-path>` — the scratch path lands in $0,
        // reachable from the script when it wants the file.
        CommandAnalyzer::new(AnalyzerSettings {
            program: "sh".to_owned(),
            args: vec!["-c".to_owned(), script.to_owned()],
        })
    }

    #[tokio::test]
    async fn parses_one_finding_per_stdout_line() {
        let analyzer = shell(
            "echo '{\"line\": 3, \"confidence\": 0.9, \"message\": \"first\"}'; \
             echo; \
             echo '{\"line\": 7, \"confidence\": 0.4, \"message\": \"second\"}'",
        );
        let findings = analyzer.run("pkg/util.go", b"package util\n").await.unwrap();
        assert_eq!(findings.len(), 2, "blank stdout lines are skipped");
        assert_eq!(findings[0].line, 3);
        assert_eq!(findings[1].message, "second");
    }

    #[tokio::test]
    async fn scratch_file_carries_content_and_extension() {
        // The script echoes a finding whose message is the scratch path.
        let analyzer = shell(
            "printf '{\"line\": 1, \"confidence\": 1.0, \"message\": \"%s:%s\"}\\n' \"$0\" \"$(cat \"$0\")\"",
        );
        let findings = analyzer.run("pkg/util.go", b"content-marker").await.unwrap();
        assert_eq!(findings.len(), 1);
        let (path, content) = findings[0].message.rsplit_once(':').unwrap();
        assert!(path.ends_with(".go"), "tool sees the original extension: {path}");
        assert_eq!(content, "content-marker");
    }

    #[tokio::test]
    async fn nonzero_exit_is_an_analyzer_error() {
        let err = shell("echo boom >&2; exit 3")
            .run("a.go", b"")
            .await
            .unwrap_err();
        match err {
            AnalyzerError::Failed { stderr, .. } => assert!(stderr.contains("boom")),
            other => panic!("expected Failed, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn garbage_stdout_is_an_analyzer_error() {
        let err = shell("echo 'not json'").run("a.go", b"").await.unwrap_err();
        assert!(matches!(err, AnalyzerError::Parse { .. }));
    }
}
