//! Answers membership queries from a cached or freshly read snapshot
use crate::config::SearchConfig;
use crate::corpus::CorpusSource;
use crate::error::{ProbeError, Result};
use crate::search::{Query, SearchStrategy, Snapshot, StrategyRegistry};
use log::{debug, info, warn};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Outcome of one lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Lookup {
    pub found: bool,
    /// Fingerprint of the snapshot the answer was computed against.
    pub fingerprint: u64,
    pub elapsed: Duration,
}

/// Owns the corpus source and the selected strategy.
///
/// In cached mode one snapshot is built up front and shared by every lookup.
/// In reread mode each lookup reads the file and builds its own snapshot, so
/// edits made while the server runs are visible to the next query.
pub struct LookupEngine {
    source: CorpusSource,
    strategy: Arc<dyn SearchStrategy>,
    cached: Option<Arc<Snapshot>>,
}

impl LookupEngine {
    pub fn from_config(config: &SearchConfig, registry: &StrategyRegistry) -> Result<Self> {
        let strategy = registry.resolve(config)?;
        let source = CorpusSource::new(&config.data_file, config.case_sensitive);
        Self::new(source, strategy, config.reread_on_query)
    }

    pub fn new(
        source: CorpusSource,
        strategy: Arc<dyn SearchStrategy>,
        reread_on_query: bool,
    ) -> Result<Self> {
        let mut engine = Self {
            source,
            strategy,
            cached: None,
        };

        if reread_on_query {
            engine.probe()?;
        } else {
            let snapshot = engine.build()?;
            info!(
                "Cached {} lines from {} ({} index built in {:?})",
                snapshot.corpus().len(),
                engine.source.path().display(),
                snapshot.algorithm(),
                snapshot.build_time()
            );
            engine.cached = Some(Arc::new(snapshot));
        }
        Ok(engine)
    }

    /// Startup check for reread mode: a missing file is tolerated, anything else
    /// the first build would reject is not.
    fn probe(&self) -> Result<()> {
        match self.build() {
            Ok(snapshot) => {
                debug!(
                    "Startup probe of {} succeeded ({} lines)",
                    self.source.path().display(),
                    snapshot.corpus().len()
                );
                Ok(())
            }
            Err(ProbeError::CorpusUnavailable { path, source }) => {
                warn!(
                    "Data file {} is not readable yet ({source}); queries will fail until it is",
                    path.display()
                );
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    fn build(&self) -> Result<Snapshot> {
        let corpus = self.source.read()?;
        Snapshot::build(corpus, self.strategy.as_ref())
    }

    pub fn algorithm(&self) -> &'static str {
        self.strategy.name()
    }

    pub fn source(&self) -> &CorpusSource {
        &self.source
    }

    pub fn is_cached(&self) -> bool {
        self.cached.is_some()
    }

    /// The snapshot the next lookup would use. In reread mode this reads the file.
    pub fn snapshot(&self) -> Result<Arc<Snapshot>> {
        match &self.cached {
            Some(snapshot) => Ok(Arc::clone(snapshot)),
            None => self.build().map(Arc::new),
        }
    }

    /// Blocking: may read the data file, build an index or spawn a process.
    pub fn lookup(&self, raw: &str) -> Result<Lookup> {
        let started = Instant::now();
        let query = Query::new(raw, self.source.case_sensitive())?;
        let snapshot = self.snapshot()?;
        let found = snapshot.contains(&query)?;
        Ok(Lookup {
            found,
            fingerprint: snapshot.corpus().fingerprint(),
            elapsed: started.elapsed(),
        })
    }
}

impl std::fmt::Debug for LookupEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LookupEngine")
            .field("source", &self.source)
            .field("algorithm", &self.strategy.name())
            .field("cached", &self.cached)
            .finish()
    }
}
