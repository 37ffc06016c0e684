//! Minimal client: one connection, one query, one response
use crate::error::Result;
use crate::protocol::{read_response, write_request, Response};
use crate::tls;
use rustls::pki_types::ServerName;
use std::path::Path;
use tokio::io::{AsyncRead, AsyncWrite, BufReader};
use tokio::net::TcpStream;
use tokio_rustls::TlsConnector;

pub struct Client {
    addr: String,
    tls: Option<(TlsConnector, ServerName<'static>)>,
}

impl Client {
    /// `addr` is anything `TcpStream::connect` accepts, e.g. `"127.0.0.1:8443"`.
    pub fn plain(addr: impl Into<String>) -> Self {
        Self {
            addr: addr.into(),
            tls: None,
        }
    }

    /// Verifies the server certificate against `ca_file` under `server_name`.
    pub fn with_tls(addr: impl Into<String>, ca_file: &Path, server_name: &str) -> Result<Self> {
        Ok(Self {
            addr: addr.into(),
            tls: Some((tls::client_connector(ca_file)?, tls::server_name(server_name)?)),
        })
    }

    pub fn addr(&self) -> &str {
        &self.addr
    }

    pub async fn query(&self, text: &str) -> Result<Response> {
        let stream = TcpStream::connect(self.addr.as_str()).await?;
        stream.set_nodelay(true)?;
        match &self.tls {
            Some((connector, name)) => {
                let stream = connector.connect(name.clone(), stream).await?;
                exchange(stream, text).await
            }
            None => exchange(stream, text).await,
        }
    }
}

async fn exchange<S>(stream: S, text: &str) -> Result<Response>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let (read_half, mut write_half) = tokio::io::split(stream);
    write_request(&mut write_half, text).await?;
    let mut reader = BufReader::new(read_half);
    read_response(&mut reader).await
}
