//! Substring matchers (Boyer-Moore, Knuth-Morris-Pratt, Rabin-Karp) anchored to whole lines
use crate::corpus::Corpus;
use crate::error::Result;
use crate::search::{LineIndex, Query, SearchStrategy};
use std::marker::PhantomData;

/// A single-pattern substring matcher compiled from a query.
pub trait PatternMatcher {
    fn compile(pattern: &[u8]) -> Self
    where
        Self: Sized;

    fn pattern_len(&self) -> usize;

    /// Offset of the first occurrence of the pattern in `text`.
    fn find(&self, text: &[u8]) -> Option<usize>;

    /// Exact full-line comparison: with equal lengths the only possible hit is at 0.
    fn matches_line(&self, line: &str) -> bool {
        line.len() == self.pattern_len() && self.find(line.as_bytes()) == Some(0)
    }
}

/// Boyer-Moore with the bad-character and strong good-suffix rules
pub struct BoyerMoore {
    pattern: Vec<u8>,
    last_occurrence: [isize; 256],
    good_suffix: Vec<usize>,
}

impl BoyerMoore {
    fn build_bad_char_table(pattern: &[u8]) -> [isize; 256] {
        let mut table = [-1isize; 256];
        for (i, &byte) in pattern.iter().enumerate() {
            table[byte as usize] = i as isize;
        }
        table
    }

    /// `shift[j]` is how far to move when the mismatch happens at `j - 1`.
    fn build_good_suffix_table(pattern: &[u8]) -> Vec<usize> {
        let m = pattern.len();
        let mut shift = vec![0usize; m + 1];
        let mut border = vec![0usize; m + 1];

        let mut i = m;
        let mut j = m + 1;
        border[i] = j;
        while i > 0 {
            while j <= m && pattern[i - 1] != pattern[j - 1] {
                if shift[j] == 0 {
                    shift[j] = j - i;
                }
                j = border[j];
            }
            i -= 1;
            j -= 1;
            border[i] = j;
        }

        j = border[0];
        for (i, slot) in shift.iter_mut().enumerate() {
            if *slot == 0 {
                *slot = j;
            }
            if i == j {
                j = border[j];
            }
        }
        shift
    }
}

impl PatternMatcher for BoyerMoore {
    fn compile(pattern: &[u8]) -> Self {
        Self {
            pattern: pattern.to_vec(),
            last_occurrence: Self::build_bad_char_table(pattern),
            good_suffix: Self::build_good_suffix_table(pattern),
        }
    }

    fn pattern_len(&self) -> usize {
        self.pattern.len()
    }

    fn find(&self, text: &[u8]) -> Option<usize> {
        let m = self.pattern.len();
        let n = text.len();
        if m == 0 || n < m {
            return None;
        }

        let mut s = 0;
        while s <= n - m {
            let mut j = m as isize - 1;
            while j >= 0 && self.pattern[j as usize] == text[s + j as usize] {
                j -= 1;
            }
            if j < 0 {
                return Some(s);
            }
            let bad_char = j - self.last_occurrence[text[s + j as usize] as usize];
            let good_suffix = self.good_suffix[j as usize + 1] as isize;
            s += bad_char.max(good_suffix).max(1) as usize;
        }
        None
    }
}

/// Knuth-Morris-Pratt driven by the prefix (failure) function
pub struct Kmp {
    pattern: Vec<u8>,
    failure: Vec<usize>,
}

impl Kmp {
    fn build_failure(pattern: &[u8]) -> Vec<usize> {
        let mut failure = vec![0usize; pattern.len()];
        let mut k = 0;
        for i in 1..pattern.len() {
            while k > 0 && pattern[i] != pattern[k] {
                k = failure[k - 1];
            }
            if pattern[i] == pattern[k] {
                k += 1;
            }
            failure[i] = k;
        }
        failure
    }
}

impl PatternMatcher for Kmp {
    fn compile(pattern: &[u8]) -> Self {
        Self {
            pattern: pattern.to_vec(),
            failure: Self::build_failure(pattern),
        }
    }

    fn pattern_len(&self) -> usize {
        self.pattern.len()
    }

    fn find(&self, text: &[u8]) -> Option<usize> {
        let m = self.pattern.len();
        if m == 0 || text.len() < m {
            return None;
        }

        let mut k = 0;
        for (i, &byte) in text.iter().enumerate() {
            while k > 0 && byte != self.pattern[k] {
                k = self.failure[k - 1];
            }
            if byte == self.pattern[k] {
                k += 1;
            }
            if k == m {
                return Some(i + 1 - m);
            }
        }
        None
    }
}

/// Rabin-Karp rolling hash, verified byte-for-byte on every hash hit
pub struct RabinKarp {
    pattern: Vec<u8>,
    pattern_hash: u64,
    /// BASE^(m-1) mod MODULUS, used to drop the leading byte.
    high_power: u64,
}

impl RabinKarp {
    const BASE: u64 = 256;
    const MODULUS: u64 = 1_000_000_007;

    fn hash(bytes: &[u8]) -> u64 {
        bytes
            .iter()
            .fold(0, |hash, &b| (hash * Self::BASE + b as u64) % Self::MODULUS)
    }

    fn roll(&self, hash: u64, outgoing: u8, incoming: u8) -> u64 {
        let without = (hash + Self::MODULUS - (outgoing as u64 * self.high_power) % Self::MODULUS)
            % Self::MODULUS;
        (without * Self::BASE + incoming as u64) % Self::MODULUS
    }
}

impl PatternMatcher for RabinKarp {
    fn compile(pattern: &[u8]) -> Self {
        let high_power = (1..pattern.len()).fold(1u64, |p, _| (p * Self::BASE) % Self::MODULUS);
        Self {
            pattern: pattern.to_vec(),
            pattern_hash: Self::hash(pattern),
            high_power,
        }
    }

    fn pattern_len(&self) -> usize {
        self.pattern.len()
    }

    fn find(&self, text: &[u8]) -> Option<usize> {
        let m = self.pattern.len();
        let n = text.len();
        if m == 0 || n < m {
            return None;
        }

        let mut window_hash = Self::hash(&text[..m]);
        for i in 0..=n - m {
            if window_hash == self.pattern_hash && text[i..i + m] == self.pattern[..] {
                return Some(i);
            }
            if i + m < n {
                window_hash = self.roll(window_hash, text[i], text[i + m]);
            }
        }
        None
    }
}

/// Scans every line with a matcher compiled once per query.
struct AnchoredScan<M>(PhantomData<fn() -> M>);

impl<M> AnchoredScan<M> {
    fn boxed() -> Box<dyn LineIndex>
    where
        M: PatternMatcher + 'static,
    {
        Box::new(Self(PhantomData))
    }
}

impl<M: PatternMatcher> LineIndex for AnchoredScan<M> {
    fn contains(&self, corpus: &Corpus, query: &Query) -> Result<bool> {
        let matcher = M::compile(query.text().as_bytes());
        Ok(corpus
            .lines()
            .iter()
            .any(|line| matcher.matches_line(line)))
    }
}

#[derive(Debug, Default)]
pub struct BoyerMooreSearch;

impl SearchStrategy for BoyerMooreSearch {
    fn name(&self) -> &'static str {
        "boyermoore"
    }

    fn prepare(&self, _corpus: &Corpus) -> Result<Box<dyn LineIndex>> {
        Ok(AnchoredScan::<BoyerMoore>::boxed())
    }
}

#[derive(Debug, Default)]
pub struct KmpSearch;

impl SearchStrategy for KmpSearch {
    fn name(&self) -> &'static str {
        "kmp"
    }

    fn prepare(&self, _corpus: &Corpus) -> Result<Box<dyn LineIndex>> {
        Ok(AnchoredScan::<Kmp>::boxed())
    }
}

#[derive(Debug, Default)]
pub struct RabinKarpSearch;

impl SearchStrategy for RabinKarpSearch {
    fn name(&self) -> &'static str {
        "rabinkarp"
    }

    fn prepare(&self, _corpus: &Corpus) -> Result<Box<dyn LineIndex>> {
        Ok(AnchoredScan::<RabinKarp>::boxed())
    }
}
