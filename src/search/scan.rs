//! Line scanning strategies: sequential scan over the corpus, over one contiguous buffer, and regex
use crate::corpus::Corpus;
use crate::error::Result;
use crate::search::{LineIndex, Query, SearchStrategy};
use regex::{Regex, RegexBuilder};
use std::ops::Range;

/// Baseline: compare the query against each line of the shared corpus, in order.
#[derive(Debug, Default)]
pub struct SimpleSearch;

struct SequentialScan;

impl LineIndex for SequentialScan {
    fn contains(&self, corpus: &Corpus, query: &Query) -> Result<bool> {
        let needle = query.text();
        Ok(corpus.lines().iter().any(|line| line == needle))
    }
}

impl SearchStrategy for SimpleSearch {
    fn name(&self) -> &'static str {
        "simple"
    }

    fn prepare(&self, _corpus: &Corpus) -> Result<Box<dyn LineIndex>> {
        Ok(Box::new(SequentialScan))
    }
}

/// Same line-by-line compare as [`SimpleSearch`], but over one contiguous
/// buffer owned by the index, with line spans located once by `memchr`.
#[derive(Debug, Default)]
pub struct InMemorySearch;

struct ContiguousBuffer {
    text: Vec<u8>,
    spans: Vec<Range<usize>>,
}

impl ContiguousBuffer {
    fn new(lines: &[String]) -> Self {
        let text = lines.join("\n").into_bytes();
        let mut spans = Vec::with_capacity(lines.len());
        if !lines.is_empty() {
            let mut start = 0;
            for end in memchr::memchr_iter(b'\n', &text) {
                spans.push(start..end);
                start = end + 1;
            }
            spans.push(start..text.len());
        }
        Self { text, spans }
    }

    fn line(&self, span: &Range<usize>) -> &[u8] {
        &self.text[span.clone()]
    }
}

impl LineIndex for ContiguousBuffer {
    fn contains(&self, _corpus: &Corpus, query: &Query) -> Result<bool> {
        let needle = query.text().as_bytes();
        Ok(self.spans.iter().any(|span| self.line(span) == needle))
    }
}

impl SearchStrategy for InMemorySearch {
    fn name(&self) -> &'static str {
        "inmemory"
    }

    fn prepare(&self, corpus: &Corpus) -> Result<Box<dyn LineIndex>> {
        Ok(Box::new(ContiguousBuffer::new(corpus.lines())))
    }
}

/// Regex match per line. Queries are escaped literals unless pattern mode is on.
#[derive(Debug, Default)]
pub struct RegexSearch {
    patterns: bool,
    case_sensitive: bool,
}

impl RegexSearch {
    pub fn literal() -> Self {
        Self::default()
    }

    /// Treats each query as a pattern anchored to the whole line.
    pub fn patterns(case_sensitive: bool) -> Self {
        Self {
            patterns: true,
            case_sensitive,
        }
    }
}

struct RegexScan {
    patterns: bool,
    case_sensitive: bool,
}

impl RegexScan {
    fn compile(&self, query: &Query) -> Result<Regex> {
        let regex = if self.patterns {
            // Folding a pattern could change its meaning (`\D` -> `\d`), so lean on the
            // engine's own case-insensitivity; corpus lines are already folded.
            RegexBuilder::new(&format!("^(?:{})$", query.raw()))
                .case_insensitive(!self.case_sensitive)
                .build()?
        } else {
            Regex::new(&format!("^{}$", regex::escape(query.text())))?
        };
        Ok(regex)
    }
}

impl LineIndex for RegexScan {
    fn contains(&self, corpus: &Corpus, query: &Query) -> Result<bool> {
        let regex = self.compile(query)?;
        Ok(corpus.lines().iter().any(|line| regex.is_match(line)))
    }
}

impl SearchStrategy for RegexSearch {
    fn name(&self) -> &'static str {
        "regex"
    }

    fn prepare(&self, _corpus: &Corpus) -> Result<Box<dyn LineIndex>> {
        Ok(Box::new(RegexScan {
            patterns: self.patterns,
            case_sensitive: self.case_sensitive,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ErrorKind, ProbeError};

    fn lookup(strategy: &dyn SearchStrategy, corpus: &Corpus, query: &str, cs: bool) -> bool {
        let index = strategy.prepare(corpus).unwrap();
        index.contains(corpus, &Query::new(query, cs).unwrap()).unwrap()
    }

    #[test]
    fn inmemory_respects_line_boundaries() {
        let corpus = Corpus::from_lines("mem", ["alphabet", "bet", "beta", ""], true);
        assert!(lookup(&InMemorySearch, &corpus, "bet", true));
        assert!(lookup(&InMemorySearch, &corpus, "alphabet", true));
        assert!(!lookup(&InMemorySearch, &corpus, "alpha", true));
        assert!(!lookup(&InMemorySearch, &corpus, "et", true));
    }

    #[test]
    fn inmemory_spans_cover_every_line() {
        let lines: Vec<String> = ["", "a", "", "bc", ""].iter().map(|s| s.to_string()).collect();
        let buffer = ContiguousBuffer::new(&lines);
        assert_eq!(buffer.spans.len(), lines.len());
        for (span, line) in buffer.spans.iter().zip(&lines) {
            assert_eq!(buffer.line(span), line.as_bytes());
        }
        assert!(ContiguousBuffer::new(&[]).spans.is_empty());
    }

    #[test]
    fn inmemory_agrees_with_simple() {
        let corpus = Corpus::from_lines("mem", ["alpha", "", "Beta", "gamma delta"], false);
        for query in ["alpha", "beta", "gamma", "gamma delta", "delta", "alph"] {
            assert_eq!(
                lookup(&InMemorySearch, &corpus, query, false),
                lookup(&SimpleSearch, &corpus, query, false),
                "{query}"
            );
        }
    }

    #[test]
    fn inmemory_finds_later_occurrence_after_partial_hits() {
        let corpus = Corpus::from_lines("mem", ["xbeta", "betax", "beta"], true);
        assert!(lookup(&InMemorySearch, &corpus, "beta", true));
    }

    #[test]
    fn simple_is_exact() {
        let corpus = Corpus::from_lines("mem", ["one", "two "], true);
        assert!(lookup(&SimpleSearch, &corpus, "one", true));
        assert!(!lookup(&SimpleSearch, &corpus, "two", true));
        assert!(lookup(&SimpleSearch, &corpus, "two ", true));
    }

    #[test]
    fn regex_escapes_metacharacters() {
        let corpus = Corpus::from_lines("mem", ["a.c", "price $5 (net)"], true);
        let regex = RegexSearch::literal();
        assert!(lookup(&regex, &corpus, "a.c", true));
        assert!(!lookup(&regex, &corpus, "abc", true));
        assert!(!lookup(&regex, &corpus, "a*c", true));
        assert!(lookup(&regex, &corpus, "price $5 (net)", true));
        assert!(!lookup(&regex, &corpus, ".*", true));
    }

    #[test]
    fn regex_pattern_mode_anchors_to_full_line() {
        let corpus = Corpus::from_lines("mem", ["order-1234", "order-12x"], false);
        let regex = RegexSearch::patterns(false);
        assert!(lookup(&regex, &corpus, r"ORDER-\d+", false));
        assert!(!lookup(&regex, &corpus, r"order-\d", false));
    }

    #[test]
    fn regex_pattern_mode_reports_bad_patterns() {
        let corpus = Corpus::from_lines("mem", ["x"], true);
        let index = RegexSearch::patterns(true).prepare(&corpus).unwrap();
        let err = index
            .contains(&corpus, &Query::new("[unclosed", true).unwrap())
            .unwrap_err();
        assert!(matches!(err, ProbeError::Regex(_)));
        assert_eq!(err.kind(), ErrorKind::Algorithm);
    }
}
