use crate::config::Config;
use crate::error::Result;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[clap(author, version, about = "Answers whether a line exists in a text file, over TCP or TLS", long_about = None)]
pub struct Cli {
    #[clap(long, value_parser, default_value_t = false, global = true)]
    pub verbose: bool,

    /// Write logs to this file instead of stderr
    #[clap(long, value_parser, global = true)]
    pub log: Option<PathBuf>,

    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the server
    Serve {
        #[clap(flatten)]
        config: ConfigArgs,
    },
    /// Send one query to a running server and print the answer
    Query {
        text: String,

        #[clap(long, value_parser, default_value = "127.0.0.1")]
        host: String,

        #[clap(short, long, value_parser, default_value_t = 8443)]
        port: u16,

        /// CA or self-signed certificate to trust; enables TLS
        #[clap(long, value_parser)]
        tls_ca: Option<PathBuf>,

        /// Name to verify the server certificate against (defaults to --host)
        #[clap(long, value_parser)]
        server_name: Option<String>,
    },
    /// Validate the configuration and build one snapshot without serving
    Check {
        #[clap(flatten)]
        config: ConfigArgs,
    },
}

/// Configuration file plus command-line overrides.
#[derive(Args, Debug, Default)]
pub struct ConfigArgs {
    #[clap(short, long, value_parser)]
    pub config: Option<PathBuf>,

    #[clap(long, value_parser)]
    pub data_file: Option<PathBuf>,

    #[clap(short, long, value_parser)]
    pub algorithm: Option<String>,

    #[clap(long, value_parser)]
    pub host: Option<String>,

    #[clap(short, long, value_parser)]
    pub port: Option<u16>,

    #[clap(short, long, value_parser)]
    pub workers: Option<usize>,

    #[clap(long, value_parser, default_value_t = false)]
    pub case_sensitive: bool,

    #[clap(long, value_parser, default_value_t = false)]
    pub reread_on_query: bool,
}

impl ConfigArgs {
    /// Reads the configuration file, or starts from defaults when none exists and
    /// `--data-file` was given, then applies the overrides.
    pub fn load(&self) -> Result<Config> {
        let mut config = match (&self.config, &self.data_file) {
            (Some(path), _) => Config::load(Some(path))?,
            (None, Some(_)) => match Config::find_config_path() {
                Some(path) => Config::from_file(&path)?,
                None => Config::default(),
            },
            (None, None) => Config::load(None)?,
        };
        self.apply(&mut config);
        Ok(config)
    }

    pub fn apply(&self, config: &mut Config) {
        if let Some(data_file) = &self.data_file {
            config.search.data_file = data_file.clone();
        }
        if let Some(algorithm) = &self.algorithm {
            config.search.algorithm = algorithm.clone();
        }
        if let Some(host) = &self.host {
            config.server.host = host.clone();
        }
        if let Some(port) = self.port {
            config.server.port = port;
        }
        if let Some(workers) = self.workers {
            config.server.workers = workers;
        }
        if self.case_sensitive {
            config.search.case_sensitive = true;
        }
        if self.reread_on_query {
            config.search.reread_on_query = true;
        }
    }
}
