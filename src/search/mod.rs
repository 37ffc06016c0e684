//! Pluggable exact-line membership algorithms
pub mod algorithms;
pub mod bloom;
pub mod grep;
pub mod indexed;
pub mod registry;
pub mod scan;

use crate::corpus::{fold_case, Corpus};
use crate::error::{ProtocolError, Result};
use std::time::Instant;

pub use registry::StrategyRegistry;

/// A single query line, kept both as received and case-folded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    raw: String,
    folded: String,
}

impl Query {
    pub fn new(raw: impl Into<String>, case_sensitive: bool) -> Result<Self> {
        let raw = raw.into();
        if raw.is_empty() {
            return Err(ProtocolError::EmptyQuery.into());
        }
        // A line can never contain its own terminator.
        if raw.contains('\n') {
            return Err(ProtocolError::EmbeddedNewline.into());
        }
        let folded = fold_case(&raw, case_sensitive);
        Ok(Self { raw, folded })
    }

    /// The query exactly as the client sent it.
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// The query under the configured case policy; compare this against corpus lines.
    pub fn text(&self) -> &str {
        &self.folded
    }
}

/// One interchangeable search algorithm.
///
/// `prepare` runs once per snapshot and builds whatever auxiliary structure the
/// algorithm needs; the returned index answers membership queries against that
/// same corpus.
pub trait SearchStrategy: Send + Sync {
    fn name(&self) -> &'static str;
    fn prepare(&self, corpus: &Corpus) -> Result<Box<dyn LineIndex>>;
}

/// Per-snapshot search state produced by [`SearchStrategy::prepare`].
pub trait LineIndex: Send + Sync {
    fn contains(&self, corpus: &Corpus, query: &Query) -> Result<bool>;
}

/// An immutable corpus together with the index built for it.
pub struct Snapshot {
    corpus: Corpus,
    index: Box<dyn LineIndex>,
    algorithm: &'static str,
    build_time: std::time::Duration,
}

impl Snapshot {
    pub fn build(corpus: Corpus, strategy: &dyn SearchStrategy) -> Result<Self> {
        let started = Instant::now();
        let index = strategy.prepare(&corpus)?;
        Ok(Self {
            corpus,
            index,
            algorithm: strategy.name(),
            build_time: started.elapsed(),
        })
    }

    pub fn contains(&self, query: &Query) -> Result<bool> {
        self.index.contains(&self.corpus, query)
    }

    pub fn corpus(&self) -> &Corpus {
        &self.corpus
    }

    pub fn algorithm(&self) -> &'static str {
        self.algorithm
    }

    pub fn build_time(&self) -> std::time::Duration {
        self.build_time
    }
}

impl std::fmt::Debug for Snapshot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Snapshot")
            .field("path", &self.corpus.path())
            .field("lines", &self.corpus.len())
            .field("fingerprint", &self.corpus.fingerprint())
            .field("algorithm", &self.algorithm)
            .field("build_time", &self.build_time)
            .finish()
    }
}
