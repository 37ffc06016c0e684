//! TCP/TLS listener with a fixed-size worker pool
mod worker;

use crate::config::Config;
use crate::engine::LookupEngine;
use crate::error::{ErrorKind, ProbeError, Result};
use crate::metrics::Metrics;
use crate::search::StrategyRegistry;
use crate::tls;
use log::{debug, info, warn};
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::{TcpListener, TcpSocket};
use tokio::sync::Semaphore;
use tokio_rustls::TlsAcceptor;
use worker::Worker;

/// Pause after a failed `accept()` so a persistent error (e.g. EMFILE) does not spin.
const ACCEPT_RETRY_DELAY: Duration = Duration::from_millis(100);

/// A validated configuration with its engine and TLS material loaded, not yet bound.
pub struct Server {
    config: Arc<Config>,
    engine: Arc<LookupEngine>,
    tls: Option<TlsAcceptor>,
    metrics: Metrics,
}

impl Server {
    pub fn new(config: Config) -> Result<Self> {
        Self::with_registry(config, &StrategyRegistry::default())
    }

    /// Everything that can fail at startup fails here, before any socket is opened.
    pub fn with_registry(config: Config, registry: &StrategyRegistry) -> Result<Self> {
        config.validate()?;
        let engine = LookupEngine::from_config(&config.search, registry)?;
        let tls = match config.ssl.tls_files() {
            Some(files) => Some(tls::server_acceptor(&files)?),
            None => None,
        };
        Ok(Self {
            config: Arc::new(config),
            engine: Arc::new(engine),
            tls,
            metrics: Metrics::new()?,
        })
    }

    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    pub async fn bind(self) -> Result<Listening> {
        let server = &self.config.server;
        let addr = tokio::net::lookup_host((server.host.as_str(), server.port))
            .await?
            .next()
            .ok_or_else(|| {
                ProbeError::Config(format!("'{}' did not resolve to an address", server.host))
            })?;

        let socket = if addr.is_ipv4() {
            TcpSocket::new_v4()?
        } else {
            TcpSocket::new_v6()?
        };
        socket.set_reuseaddr(true)?;
        socket.bind(addr)?;
        let listener = socket.listen(server.backlog)?;
        let local_addr = listener.local_addr()?;

        Ok(Listening {
            server: self,
            listener,
            local_addr,
        })
    }
}

/// A bound listener. Nothing is accepted until [`Listening::run`] is awaited.
pub struct Listening {
    server: Server,
    listener: TcpListener,
    local_addr: SocketAddr,
}

impl Listening {
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn metrics(&self) -> Metrics {
        self.server.metrics.clone()
    }

    /// Serves until the process is killed.
    pub async fn run(self) -> Result<()> {
        self.run_until(std::future::pending()).await
    }

    /// Serves until `shutdown` completes, then waits for in-flight connections.
    pub async fn run_until<F>(self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        let Listening {
            server,
            listener,
            local_addr,
        } = self;
        let config = &server.config;
        let workers = config.server.effective_workers();
        let permits = Arc::new(Semaphore::new(workers));

        let worker = Arc::new(Worker {
            engine: Arc::clone(&server.engine),
            tls: server.tls.clone(),
            metrics: server.metrics.clone(),
            max_request_bytes: config.server.max_request_bytes,
            handshake_timeout: Duration::from_secs(config.server.handshake_timeout_secs),
            read_timeout: Duration::from_secs(config.server.read_timeout_secs),
        });

        info!(
            "Listening on {local_addr} (tls: {}, algorithm: {}, workers: {workers}, reread on query: {})",
            if server.tls.is_some() { "on" } else { "off" },
            server.engine.algorithm(),
            !server.engine.is_cached()
        );

        tokio::pin!(shutdown);
        loop {
            // Take a worker slot before accepting: while every worker is busy,
            // new connections wait in the kernel backlog.
            let permit = tokio::select! {
                _ = &mut shutdown => break,
                permit = Arc::clone(&permits).acquire_owned() => permit.map_err(anyhow::Error::from)?,
            };

            let (stream, peer) = tokio::select! {
                _ = &mut shutdown => break,
                accepted = listener.accept() => match accepted {
                    Ok(pair) => pair,
                    Err(e) => {
                        warn!("Failed to accept connection: {e}");
                        server.metrics.record_error(ErrorKind::Io);
                        tokio::time::sleep(ACCEPT_RETRY_DELAY).await;
                        continue;
                    }
                },
            };

            server.metrics.connections.inc();
            debug!("Accepted connection from {peer}");
            let worker = Arc::clone(&worker);
            tokio::spawn(async move {
                worker.handle(stream, peer).await;
                drop(permit);
            });
        }

        drop(listener);
        let in_flight = workers - permits.available_permits();
        if in_flight > 0 {
            info!("Shutting down, waiting for {in_flight} connection(s) to finish");
        }
        // workers <= MAX_WORKERS, checked by Config::validate
        let _drained = permits
            .acquire_many(workers as u32)
            .await
            .map_err(anyhow::Error::from)?;

        info!(
            "Server stopped: {} connections, {} queries ({} found, {} not found)",
            server.metrics.connections.get(),
            server.metrics.queries.get(),
            server.metrics.found.get(),
            server.metrics.not_found.get()
        );
        debug!("Final metrics:\n{}", server.metrics.gather()?);
        Ok(())
    }
}
