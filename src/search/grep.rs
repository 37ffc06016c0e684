//! Delegates membership to an external `grep -Fxq` process
use crate::corpus::Corpus;
use crate::error::{ProbeError, Result};
use crate::search::{LineIndex, Query, SearchStrategy};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use tempfile::NamedTempFile;

/// Runs `grep` against a private copy of the snapshot.
///
/// Grepping the snapshot instead of the live data file keeps cached mode from
/// seeing later edits and applies exactly the same case folding as every other
/// algorithm.
#[derive(Debug)]
pub struct GrepSearch {
    program: PathBuf,
}

impl GrepSearch {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

fn tool_error(program: &Path, reason: impl Into<String>) -> ProbeError {
    ProbeError::ExternalTool {
        program: program.display().to_string(),
        reason: reason.into(),
    }
}

impl Default for GrepSearch {
    fn default() -> Self {
        Self::new("grep")
    }
}

struct SnapshotFile {
    program: PathBuf,
    file: NamedTempFile,
}

impl SnapshotFile {
    fn write(corpus: &Corpus, program: &Path) -> Result<Self> {
        let file = NamedTempFile::with_prefix("lineprobe-")?;
        {
            let mut writer = BufWriter::new(file.as_file());
            for line in corpus.lines() {
                writer.write_all(line.as_bytes())?;
                writer.write_all(b"\n")?;
            }
            writer.flush()?;
        }
        Ok(Self {
            program: program.to_path_buf(),
            file,
        })
    }
}

impl LineIndex for SnapshotFile {
    fn contains(&self, _corpus: &Corpus, query: &Query) -> Result<bool> {
        let output = Command::new(&self.program)
            .env("LC_ALL", "C")
            .args(["-F", "-x", "-q", "-e"])
            .arg(query.text())
            .arg("--")
            .arg(self.file.path())
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()
            .map_err(|e| tool_error(&self.program, format!("could not start: {e}")))?;

        match output.status.code() {
            Some(0) => Ok(true),
            Some(1) => Ok(false),
            code => {
                let stderr = String::from_utf8_lossy(&output.stderr);
                Err(tool_error(
                    &self.program,
                    format!(
                        "unexpected exit status {}: {}",
                        code.map_or_else(|| "signal".to_string(), |c| c.to_string()),
                        stderr.trim()
                    ),
                ))
            }
        }
    }
}

impl SearchStrategy for GrepSearch {
    fn name(&self) -> &'static str {
        "grep"
    }

    fn prepare(&self, corpus: &Corpus) -> Result<Box<dyn LineIndex>> {
        let snapshot = SnapshotFile::write(corpus, &self.program)
            .map_err(|e| tool_error(&self.program, format!("could not write snapshot file: {e}")))?;
        Ok(Box::new(snapshot))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn grep_available() -> bool {
        Command::new("grep")
            .arg("--version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map(|s| s.success())
            .unwrap_or(false)
    }

    #[test]
    fn finds_exact_lines_only() {
        if !grep_available() {
            eprintln!("grep not installed, skipping");
            return;
        }
        let corpus = Corpus::from_lines("grep", ["alpha", "beta", "-v", "a.c"], true);
        let index = GrepSearch::default().prepare(&corpus).unwrap();
        let check = |q: &str| index.contains(&corpus, &Query::new(q, true).unwrap()).unwrap();

        assert!(check("beta"));
        assert!(!check("bet"));
        assert!(!check("Beta"));
        assert!(check("-v"));
        assert!(check("a.c"));
        assert!(!check("abc"));
    }

    #[test]
    fn missing_program_is_an_algorithm_error() {
        let corpus = Corpus::from_lines("grep", ["alpha"], true);
        let index = GrepSearch::new("/nonexistent/bin/grep")
            .prepare(&corpus)
            .unwrap();
        let err = index
            .contains(&corpus, &Query::new("alpha", true).unwrap())
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Algorithm);
        assert!(err.to_string().contains("could not start"));
        assert!(err.to_string().contains("/nonexistent/bin/grep"));
    }

    #[cfg(unix)]
    #[test]
    fn failing_exit_status_names_the_program() {
        let corpus = Corpus::from_lines("grep", ["alpha"], true);
        // sh rejects grep's -F flag with exit status 2
        let index = GrepSearch::new("/bin/sh").prepare(&corpus).unwrap();
        match index.contains(&corpus, &Query::new("alpha", true).unwrap()) {
            Err(ProbeError::ExternalTool { program, reason }) => {
                assert_eq!(program, "/bin/sh");
                assert!(reason.starts_with("unexpected exit status"), "{reason}");
            }
            other => panic!("expected an external tool error, got {other:?}"),
        }
    }
}
