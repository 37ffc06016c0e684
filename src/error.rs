use std::fmt;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProbeError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Unknown search algorithm '{name}' (known: {known})")]
    UnknownAlgorithm { name: String, known: String },

    #[error("Failed to read corpus '{path}': {source}")]
    CorpusUnavailable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Corpus '{path}' is not sorted: line {line} is out of order")]
    UnsortedCorpus { path: PathBuf, line: usize },

    #[error("Regex error: {0}")]
    Regex(#[from] regex::Error),

    #[error("External search tool '{program}' failed: {reason}")]
    ExternalTool { program: String, reason: String },

    #[error("TLS error: {0}")]
    Tls(#[from] rustls::Error),

    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    #[error("Connection closed by peer before a response was received")]
    ConnectionClosed,

    #[error("Timed out while {0}")]
    Timeout(&'static str),

    #[error("Metrics error: {0}")]
    Metrics(#[from] prometheus::Error),

    #[error("Worker task failed: {0}")]
    Worker(#[from] tokio::task::JoinError),

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}

/// Malformed requests. None of these produce a response on the wire.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("empty request")]
    EmptyQuery,

    #[error("query spans more than one line")]
    EmbeddedNewline,

    #[error("request exceeds {limit} bytes")]
    PayloadTooLarge { limit: usize },

    #[error("request is not valid UTF-8")]
    InvalidEncoding,

    #[error("connection closed before the request line was terminated")]
    Unterminated,

    #[error("unexpected response line: {0:?}")]
    UnexpectedResponse(String),
}

/// Coarse error classes, used for log wording and the `kind` metric label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Configuration,
    Io,
    Protocol,
    Algorithm,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::Configuration => "configuration",
            ErrorKind::Io => "io",
            ErrorKind::Protocol => "protocol",
            ErrorKind::Algorithm => "algorithm",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ProbeError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ProbeError::Config(_)
            | ProbeError::UnknownAlgorithm { .. }
            | ProbeError::UnsortedCorpus { .. }
            | ProbeError::Tls(_)
            | ProbeError::Metrics(_) => ErrorKind::Configuration,
            ProbeError::Regex(_) | ProbeError::ExternalTool { .. } => ErrorKind::Algorithm,
            ProbeError::Protocol(_) => ErrorKind::Protocol,
            ProbeError::Io(_)
            | ProbeError::CorpusUnavailable { .. }
            | ProbeError::ConnectionClosed
            | ProbeError::Timeout(_)
            | ProbeError::Worker(_)
            | ProbeError::Anyhow(_) => ErrorKind::Io,
        }
    }
}

pub type Result<T> = std::result::Result<T, ProbeError>;
