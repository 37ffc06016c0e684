//! One request line in, one response line out
use crate::error::{ProbeError, ProtocolError, Result};
use std::fmt;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt, AsyncWrite, AsyncWriteExt};

pub const EXISTS: &str = "STRING EXISTS\n";
pub const NOT_FOUND: &str = "STRING NOT FOUND\n";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Response {
    Exists,
    NotFound,
}

impl Response {
    /// The exact bytes sent on the wire, newline included.
    pub fn as_str(self) -> &'static str {
        match self {
            Response::Exists => EXISTS,
            Response::NotFound => NOT_FOUND,
        }
    }

    pub fn found(self) -> bool {
        matches!(self, Response::Exists)
    }

    /// Accepts a response line with or without its terminator.
    pub fn parse(line: &str) -> std::result::Result<Self, ProtocolError> {
        match line.trim_end_matches(['\r', '\n']) {
            "STRING EXISTS" => Ok(Response::Exists),
            "STRING NOT FOUND" => Ok(Response::NotFound),
            other => Err(ProtocolError::UnexpectedResponse(other.to_string())),
        }
    }
}

impl From<bool> for Response {
    fn from(found: bool) -> Self {
        if found {
            Response::Exists
        } else {
            Response::NotFound
        }
    }
}

impl fmt::Display for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str().trim_end())
    }
}

/// Reads one request line of at most `limit` bytes, terminator excluded.
///
/// Returns `Ok(None)` when the peer closes without sending anything. Trailing
/// `\r` and NUL bytes are stripped before the line is decoded.
pub async fn read_request<R>(reader: &mut R, limit: usize) -> Result<Option<String>>
where
    R: AsyncBufRead + Unpin,
{
    let mut buf = Vec::with_capacity(limit.min(1024) + 2);
    // room for a full-length line plus its "\r\n"; the limit is checked after stripping
    let read = reader
        .take(limit as u64 + 2)
        .read_until(b'\n', &mut buf)
        .await?;

    if read == 0 {
        return Ok(None);
    }
    if buf.last() != Some(&b'\n') {
        let err = if buf.len() > limit {
            ProtocolError::PayloadTooLarge { limit }
        } else {
            ProtocolError::Unterminated
        };
        return Err(err.into());
    }

    buf.pop();
    while matches!(buf.last(), Some(b'\r') | Some(0)) {
        buf.pop();
    }
    if buf.len() > limit {
        return Err(ProtocolError::PayloadTooLarge { limit }.into());
    }
    if buf.is_empty() {
        return Err(ProtocolError::EmptyQuery.into());
    }

    String::from_utf8(buf)
        .map(Some)
        .map_err(|_| ProtocolError::InvalidEncoding.into())
}

pub async fn write_response<W>(writer: &mut W, response: Response) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    writer.write_all(response.as_str().as_bytes()).await?;
    writer.flush().await?;
    Ok(())
}

pub async fn write_request<W>(writer: &mut W, query: &str) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    if query.contains('\n') {
        return Err(ProtocolError::EmbeddedNewline.into());
    }
    writer.write_all(query.as_bytes()).await?;
    writer.write_all(b"\n").await?;
    writer.flush().await?;
    Ok(())
}

/// Client side: reads the single response line. EOF first means the server
/// dropped the request.
pub async fn read_response<R>(reader: &mut R) -> Result<Response>
where
    R: AsyncBufRead + Unpin,
{
    let mut line = String::new();
    let read = reader.take(64).read_line(&mut line).await?;
    if read == 0 {
        return Err(ProbeError::ConnectionClosed);
    }
    Ok(Response::parse(&line)?)
}
