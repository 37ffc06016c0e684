//! Lifecycle of a single connection: handshake, read, lookup, respond, close
use crate::engine::LookupEngine;
use crate::error::{ErrorKind, ProbeError, Result};
use crate::metrics::Metrics;
use crate::protocol::{read_request, write_response, Response};
use log::{debug, error, warn};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tokio_rustls::TlsAcceptor;

pub(super) struct Worker {
    pub(super) engine: Arc<LookupEngine>,
    pub(super) tls: Option<TlsAcceptor>,
    pub(super) metrics: Metrics,
    pub(super) max_request_bytes: usize,
    pub(super) handshake_timeout: Duration,
    pub(super) read_timeout: Duration,
}

impl Worker {
    /// Never fails: every error ends this connection only.
    pub(super) async fn handle(&self, stream: TcpStream, peer: SocketAddr) {
        match self.serve(stream, peer).await {
            Ok(Some(response)) => debug!("{peer}: answered {response}"),
            Ok(None) => debug!("{peer}: closed without sending a query"),
            Err(e) => self.report(peer, &e),
        }
    }

    async fn serve(&self, stream: TcpStream, peer: SocketAddr) -> Result<Option<Response>> {
        if let Err(e) = stream.set_nodelay(true) {
            debug!("{peer}: could not set TCP_NODELAY: {e}");
        }

        match &self.tls {
            Some(acceptor) => {
                let stream = timeout(self.handshake_timeout, acceptor.accept(stream))
                    .await
                    .map_err(|_| ProbeError::Timeout("waiting for the TLS handshake"))??;
                self.exchange(stream, peer).await
            }
            None => self.exchange(stream, peer).await,
        }
    }

    async fn exchange<S>(&self, stream: S, peer: SocketAddr) -> Result<Option<Response>>
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        let (read_half, mut write_half) = tokio::io::split(stream);
        let mut reader = BufReader::new(read_half);

        let request = timeout(
            self.read_timeout,
            read_request(&mut reader, self.max_request_bytes),
        )
        .await
        .map_err(|_| ProbeError::Timeout("reading the request"))??;
        let Some(query) = request else {
            return Ok(None);
        };
        self.metrics.queries.inc();

        let engine = Arc::clone(&self.engine);
        let lookup = {
            let query = query.clone();
            tokio::task::spawn_blocking(move || engine.lookup(&query)).await??
        };
        self.metrics.record_answer(lookup.found);

        let response = Response::from(lookup.found);
        debug!(
            "{peer}: {query:?} -> {response} in {:?} (snapshot {:016x})",
            lookup.elapsed, lookup.fingerprint
        );
        write_response(&mut write_half, response).await?;
        write_half.shutdown().await?;
        Ok(Some(response))
    }

    fn report(&self, peer: SocketAddr, err: &ProbeError) {
        let kind = err.kind();
        self.metrics.record_error(kind);
        match kind {
            ErrorKind::Protocol => warn!("{peer}: rejected request: {err}"),
            ErrorKind::Io => warn!("{peer}: connection dropped: {err}"),
            ErrorKind::Algorithm => error!("{peer}: search failed: {err}"),
            ErrorKind::Configuration => error!("{peer}: data file rejected: {err}"),
        }
    }
}
