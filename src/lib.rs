pub mod cli;
pub mod client;
pub mod config;
pub mod corpus;
pub mod engine;
pub mod error;
pub mod metrics;
pub mod protocol;
pub mod search;
pub mod server;
pub mod tls;

pub use crate::client::Client;
pub use crate::config::Config;
pub use crate::engine::{Lookup, LookupEngine};
pub use crate::error::{ErrorKind, ProbeError, Result};
pub use crate::protocol::Response;
pub use crate::search::{Query, SearchStrategy, Snapshot, StrategyRegistry};
pub use crate::server::{Listening, Server};
pub use clap::Parser;
