//! Reading the data file into an immutable, case-folded line set
use crate::error::{ProbeError, Result};
use std::collections::hash_map::DefaultHasher;
use std::fs;
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// Applies the case policy shared by corpus lines and queries.
pub fn fold_case(text: &str, case_sensitive: bool) -> String {
    if case_sensitive {
        text.to_string()
    } else {
        text.to_lowercase()
    }
}

/// The lines of the data file at one point in time.
#[derive(Debug, Clone)]
pub struct Corpus {
    path: PathBuf,
    lines: Vec<String>,
    fingerprint: u64,
    read_at: SystemTime,
}

impl Corpus {
    /// Builds a corpus from already-split lines. Lines are folded as configured.
    pub fn from_lines<I, S>(path: impl Into<PathBuf>, lines: I, case_sensitive: bool) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let lines: Vec<String> = lines
            .into_iter()
            .map(|line| fold_case(line.as_ref(), case_sensitive))
            .collect();

        let mut hasher = DefaultHasher::new();
        lines.hash(&mut hasher);

        Self {
            path: path.into(),
            lines,
            fingerprint: hasher.finish(),
            read_at: SystemTime::now(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Hash of the folded line set; equal contents give equal fingerprints.
    pub fn fingerprint(&self) -> u64 {
        self.fingerprint
    }

    pub fn read_at(&self) -> SystemTime {
        self.read_at
    }
}

/// Hands out corpora for one data file. Holds no mutable state, so concurrent
/// reads are independent of each other.
#[derive(Debug, Clone)]
pub struct CorpusSource {
    path: PathBuf,
    case_sensitive: bool,
}

impl CorpusSource {
    pub fn new(path: impl Into<PathBuf>, case_sensitive: bool) -> Self {
        Self {
            path: path.into(),
            case_sensitive,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn case_sensitive(&self) -> bool {
        self.case_sensitive
    }

    /// Reads the file as it is right now.
    pub fn read(&self) -> Result<Corpus> {
        let content = fs::read_to_string(&self.path).map_err(|source| {
            ProbeError::CorpusUnavailable {
                path: self.path.clone(),
                source,
            }
        })?;

        // `str::lines` keeps a bare trailing '\r' on an unterminated last line
        let lines = content.lines().map(|line| line.strip_suffix('\r').unwrap_or(line));

        Ok(Corpus::from_lines(&self.path, lines, self.case_sensitive))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_corpus(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn splits_lines_and_strips_terminators() {
        let file = write_corpus("alpha\r\nbeta\ngamma\r");
        let corpus = CorpusSource::new(file.path(), true).read().unwrap();
        assert_eq!(corpus.lines(), &["alpha", "beta", "gamma"]);
    }

    #[test]
    fn trailing_newline_is_not_an_extra_line() {
        let file = write_corpus("one\ntwo\n");
        let corpus = CorpusSource::new(file.path(), true).read().unwrap();
        assert_eq!(corpus.len(), 2);
    }

    #[test]
    fn trailing_spaces_are_part_of_the_line() {
        let file = write_corpus("alpha  \nbeta\r\n");
        let corpus = CorpusSource::new(file.path(), true).read().unwrap();
        assert_eq!(corpus.lines(), &["alpha  ", "beta"]);
    }

    #[test]
    fn blank_lines_are_kept() {
        let file = write_corpus("one\n\ntwo\n");
        let corpus = CorpusSource::new(file.path(), true).read().unwrap();
        assert_eq!(corpus.lines(), &["one", "", "two"]);
    }

    #[test]
    fn folds_when_case_insensitive() {
        let file = write_corpus("Existing Line\nÉCOLE\n");
        let corpus = CorpusSource::new(file.path(), false).read().unwrap();
        assert_eq!(corpus.lines(), &["existing line", "école"]);

        let exact = CorpusSource::new(file.path(), true).read().unwrap();
        assert_eq!(exact.lines(), &["Existing Line", "ÉCOLE"]);
    }

    #[test]
    fn missing_file_is_an_error() {
        let source = CorpusSource::new("/nonexistent/lineprobe/corpus.txt", true);
        match source.read() {
            Err(ProbeError::CorpusUnavailable { path, .. }) => {
                assert_eq!(path, PathBuf::from("/nonexistent/lineprobe/corpus.txt"))
            }
            other => panic!("expected CorpusUnavailable, got {other:?}"),
        }
    }

    #[test]
    fn non_utf8_file_is_an_error() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(&[0x66, 0x6f, 0xff, 0x0a]).unwrap();
        assert!(CorpusSource::new(file.path(), true).read().is_err());
    }

    #[test]
    fn fingerprint_tracks_content() {
        let a = Corpus::from_lines("a", ["x", "y"], true);
        let b = Corpus::from_lines("b", ["x", "y"], true);
        let c = Corpus::from_lines("c", ["x", "z"], true);
        assert_eq!(a.fingerprint(), b.fingerprint());
        assert_ne!(a.fingerprint(), c.fingerprint());
    }
}
