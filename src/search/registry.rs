//! Name -> strategy lookup, resolved once at startup
use crate::config::SearchConfig;
use crate::error::{ProbeError, Result};
use crate::search::algorithms::{BoyerMooreSearch, KmpSearch, RabinKarpSearch};
use crate::search::grep::GrepSearch;
use crate::search::indexed::{BinarySearch, BloomSearch, HashSearch};
use crate::search::scan::{InMemorySearch, RegexSearch, SimpleSearch};
use crate::search::SearchStrategy;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Builds a strategy from the search section of the configuration.
pub type StrategyConstructor = fn(&SearchConfig) -> Arc<dyn SearchStrategy>;

pub struct StrategyRegistry {
    constructors: BTreeMap<String, StrategyConstructor>,
}

impl StrategyRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self {
            constructors: BTreeMap::new(),
        }
    }

    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register("simple", simple);
        registry.register("inmemory", inmemory);
        registry.register("binary", binary);
        registry.register("hash", hash);
        registry.register("regex", regex);
        registry.register("bloom", bloom);
        registry.register("boyermoore", boyermoore);
        registry.register("kmp", kmp);
        registry.register("rabinkarp", rabinkarp);
        registry.register("grep", grep);
        registry
    }

    /// Registers (or replaces) a constructor. Names are stored lowercased and
    /// matched case-insensitively.
    pub fn register(&mut self, name: &str, constructor: StrategyConstructor) {
        self.constructors
            .insert(name.trim().to_ascii_lowercase(), constructor);
    }

    pub fn names(&self) -> Vec<&str> {
        self.constructors.keys().map(String::as_str).collect()
    }

    pub fn resolve(&self, config: &SearchConfig) -> Result<Arc<dyn SearchStrategy>> {
        let wanted = config.algorithm.trim().to_ascii_lowercase();
        self.constructors
            .get(&wanted)
            .map(|constructor| constructor(config))
            .ok_or_else(|| ProbeError::UnknownAlgorithm {
                name: config.algorithm.clone(),
                known: self.names().join(", "),
            })
    }
}

impl Default for StrategyRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

fn simple(_: &SearchConfig) -> Arc<dyn SearchStrategy> {
    Arc::new(SimpleSearch)
}

fn inmemory(_: &SearchConfig) -> Arc<dyn SearchStrategy> {
    Arc::new(InMemorySearch)
}

fn binary(_: &SearchConfig) -> Arc<dyn SearchStrategy> {
    Arc::new(BinarySearch)
}

fn hash(_: &SearchConfig) -> Arc<dyn SearchStrategy> {
    Arc::new(HashSearch)
}

fn regex(config: &SearchConfig) -> Arc<dyn SearchStrategy> {
    if config.regex_patterns {
        Arc::new(RegexSearch::patterns(config.case_sensitive))
    } else {
        Arc::new(RegexSearch::literal())
    }
}

fn bloom(config: &SearchConfig) -> Arc<dyn SearchStrategy> {
    Arc::new(BloomSearch::new(config.bloom_false_positive_rate))
}

fn boyermoore(_: &SearchConfig) -> Arc<dyn SearchStrategy> {
    Arc::new(BoyerMooreSearch)
}

fn kmp(_: &SearchConfig) -> Arc<dyn SearchStrategy> {
    Arc::new(KmpSearch)
}

fn rabinkarp(_: &SearchConfig) -> Arc<dyn SearchStrategy> {
    Arc::new(RabinKarpSearch)
}

fn grep(config: &SearchConfig) -> Arc<dyn SearchStrategy> {
    Arc::new(GrepSearch::new(&config.grep_program))
}
