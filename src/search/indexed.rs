//! Strategies that pay a preprocessing cost per snapshot: sorted order, hash set, bloom filter
use crate::corpus::Corpus;
use crate::error::{ProbeError, Result};
use crate::search::bloom::BloomFilter;
use crate::search::{LineIndex, Query, SearchStrategy};
use log::debug;
use rayon::prelude::*;
use std::collections::HashSet;

/// Binary search over a corpus that must already be sorted.
///
/// Sortedness is checked on the folded lines, so a case-insensitive server needs
/// the file sorted in lowercase order. An unsorted file is rejected at build time.
#[derive(Debug, Default)]
pub struct BinarySearch;

struct SortedLines;

impl LineIndex for SortedLines {
    fn contains(&self, corpus: &Corpus, query: &Query) -> Result<bool> {
        Ok(corpus
            .lines()
            .binary_search_by(|line| line.as_str().cmp(query.text()))
            .is_ok())
    }
}

impl SearchStrategy for BinarySearch {
    fn name(&self) -> &'static str {
        "binary"
    }

    fn prepare(&self, corpus: &Corpus) -> Result<Box<dyn LineIndex>> {
        let out_of_order = corpus
            .lines()
            .par_windows(2)
            .position_first(|pair| pair[0] > pair[1]);

        if let Some(position) = out_of_order {
            return Err(ProbeError::UnsortedCorpus {
                path: corpus.path().to_path_buf(),
                // second line of the pair, 1-based
                line: position + 2,
            });
        }
        Ok(Box::new(SortedLines))
    }
}

/// Hash set keyed by full line content.
#[derive(Debug, Default)]
pub struct HashSearch;

struct LineSet {
    lines: HashSet<String>,
}

impl LineIndex for LineSet {
    fn contains(&self, _corpus: &Corpus, query: &Query) -> Result<bool> {
        Ok(self.lines.contains(query.text()))
    }
}

impl SearchStrategy for HashSearch {
    fn name(&self) -> &'static str {
        "hash"
    }

    fn prepare(&self, corpus: &Corpus) -> Result<Box<dyn LineIndex>> {
        Ok(Box::new(LineSet {
            lines: corpus.lines().iter().cloned().collect(),
        }))
    }
}

/// Bloom filter over full lines.
///
/// A positive answer from the filter is final: no exact check follows, so a
/// configured rate of `p` means roughly `p` of absent queries report
/// `STRING EXISTS`. Present lines are always found.
#[derive(Debug)]
pub struct BloomSearch {
    false_positive_rate: f64,
}

impl BloomSearch {
    pub const DEFAULT_FALSE_POSITIVE_RATE: f64 = 0.001;

    pub fn new(false_positive_rate: f64) -> Self {
        Self {
            false_positive_rate,
        }
    }
}

impl Default for BloomSearch {
    fn default() -> Self {
        Self::new(Self::DEFAULT_FALSE_POSITIVE_RATE)
    }
}

struct BloomIndex {
    filter: BloomFilter,
}

impl LineIndex for BloomIndex {
    fn contains(&self, _corpus: &Corpus, query: &Query) -> Result<bool> {
        Ok(self.filter.contains(query.text()))
    }
}

impl SearchStrategy for BloomSearch {
    fn name(&self) -> &'static str {
        "bloom"
    }

    fn prepare(&self, corpus: &Corpus) -> Result<Box<dyn LineIndex>> {
        let mut filter = BloomFilter::with_rate(corpus.len(), self.false_positive_rate);
        for line in corpus.lines() {
            filter.insert(line);
        }
        debug!(
            "Bloom filter for {} lines: {} bits, {} hashes, target false-positive rate {}",
            corpus.len(),
            filter.num_bits(),
            filter.num_hashes(),
            filter.false_positive_rate()
        );
        Ok(Box::new(BloomIndex { filter }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn binary_finds_members_of_sorted_corpus() {
        let corpus = Corpus::from_lines("sorted", ["alpha", "beta", "beta", "gamma"], true);
        let index = BinarySearch.prepare(&corpus).unwrap();
        for line in ["alpha", "beta", "gamma"] {
            assert!(index.contains(&corpus, &Query::new(line, true).unwrap()).unwrap());
        }
        for absent in ["aardvark", "delta", "zeta"] {
            assert!(!index.contains(&corpus, &Query::new(absent, true).unwrap()).unwrap());
        }
    }

    #[test]
    fn binary_rejects_unsorted_corpus() {
        let corpus = Corpus::from_lines("unsorted.txt", ["alpha", "gamma", "beta"], true);
        match BinarySearch.prepare(&corpus) {
            Err(ProbeError::UnsortedCorpus { line, .. }) => assert_eq!(line, 3),
            Err(other) => panic!("unexpected error {other}"),
            Ok(_) => panic!("unsorted corpus accepted"),
        }
    }

    #[test]
    fn binary_checks_order_after_folding() {
        // "Beta" < "alpha" in byte order, but folded it is sorted
        let folded = Corpus::from_lines("mixed", ["alpha", "Beta"], false);
        assert!(BinarySearch.prepare(&folded).is_ok());

        let exact = Corpus::from_lines("mixed", ["alpha", "Beta"], true);
        assert!(BinarySearch.prepare(&exact).is_err());
    }

    #[test]
    fn hash_is_exact() {
        let corpus = Corpus::from_lines("hash", ["alpha", "beta", "gamma"], true);
        let index = HashSearch.prepare(&corpus).unwrap();
        assert!(index.contains(&corpus, &Query::new("beta", true).unwrap()).unwrap());
        assert!(!index.contains(&corpus, &Query::new("Beta", true).unwrap()).unwrap());
    }

    #[test]
    fn bloom_finds_every_member() {
        let lines: Vec<String> = (0..2_000).map(|i| format!("line number {i}")).collect();
        let corpus = Corpus::from_lines("bloom", &lines, true);
        let index = BloomSearch::default().prepare(&corpus).unwrap();
        for line in &lines {
            assert!(index.contains(&corpus, &Query::new(line.as_str(), true).unwrap()).unwrap());
        }
    }
}
