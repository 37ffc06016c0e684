use crate::error::{ErrorKind, Result};
use prometheus::{Encoder, IntCounter, IntCounterVec, Opts, Registry, TextEncoder};
use std::sync::Arc;

#[derive(Clone)]
pub struct Metrics {
    pub connections: IntCounter,
    pub queries: IntCounter,
    pub found: IntCounter,
    pub not_found: IntCounter,
    pub errors: IntCounterVec,
    registry: Arc<Registry>,
}

impl Metrics {
    pub fn new() -> Result<Self> {
        let registry = Registry::new();
        let connections = IntCounter::with_opts(Opts::new(
            "lineprobe_connections_total",
            "Connections accepted",
        ))?;
        let queries = IntCounter::with_opts(Opts::new(
            "lineprobe_queries_total",
            "Well-formed queries received",
        ))?;
        let found =
            IntCounter::with_opts(Opts::new("lineprobe_found_total", "Queries answered EXISTS"))?;
        let not_found = IntCounter::with_opts(Opts::new(
            "lineprobe_not_found_total",
            "Queries answered NOT FOUND",
        ))?;
        let errors = IntCounterVec::new(
            Opts::new(
                "lineprobe_errors_total",
                "Connections closed without a response",
            ),
            &["kind"],
        )?;

        registry.register(Box::new(connections.clone()))?;
        registry.register(Box::new(queries.clone()))?;
        registry.register(Box::new(found.clone()))?;
        registry.register(Box::new(not_found.clone()))?;
        registry.register(Box::new(errors.clone()))?;

        Ok(Metrics {
            connections,
            queries,
            found,
            not_found,
            errors,
            registry: Arc::new(registry),
        })
    }

    pub fn record_answer(&self, found: bool) {
        if found {
            self.found.inc();
        } else {
            self.not_found.inc();
        }
    }

    pub fn record_error(&self, kind: ErrorKind) {
        self.errors.with_label_values(&[kind.as_str()]).inc();
    }

    pub fn error_count(&self, kind: ErrorKind) -> u64 {
        self.errors.with_label_values(&[kind.as_str()]).get()
    }

    pub fn gather(&self) -> Result<String> {
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        let encoder = TextEncoder::new();
        encoder.encode(&metric_families, &mut buffer)?;
        Ok(String::from_utf8_lossy(&buffer).into_owned())
    }
}
