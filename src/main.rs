use colored::*;
use env_logger::{Builder, Env, Target};
use lineprobe::cli::{Cli, Commands, ConfigArgs};
use lineprobe::config::LoggingConfig;
use lineprobe::error::{ProbeError, Result};
use lineprobe::{Client, LookupEngine, Parser, Server, StrategyRegistry};
use log::{error, info};
use std::fs;
use std::path::Path;
use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            error!("{e}");
            eprintln!("{} {e}", "error:".red().bold());
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<ExitCode> {
    match &cli.command {
        Commands::Serve { config } => serve(&cli, config).await,
        Commands::Check { config } => check(&cli, config),
        Commands::Query {
            text,
            host,
            port,
            tls_ca,
            server_name,
        } => {
            setup_logging(&cli, &LoggingConfig::default())?;
            let addr = format!("{host}:{port}");
            let client = match tls_ca {
                Some(ca) => {
                    let name = server_name.as_deref().unwrap_or(host.as_str());
                    Client::with_tls(addr, ca, name)?
                }
                None => Client::plain(addr),
            };
            let response = client.query(text).await?;
            if response.found() {
                println!("{}", response.to_string().green());
            } else {
                println!("{}", response.to_string().yellow());
            }
            Ok(ExitCode::SUCCESS)
        }
    }
}

async fn serve(cli: &Cli, args: &ConfigArgs) -> Result<ExitCode> {
    let config = args.load()?;
    setup_logging(cli, &config.logging)?;
    info!("Starting lineprobe {}", env!("CARGO_PKG_VERSION"));

    let listening = Server::new(config)?.bind().await?;
    println!(
        "{} {}",
        "Listening on".green(),
        listening.local_addr().to_string().bold()
    );

    listening
        .run_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!("Failed to listen for Ctrl-C: {e}");
                std::future::pending::<()>().await;
            }
            info!("Received Ctrl-C");
        })
        .await?;
    Ok(ExitCode::SUCCESS)
}

fn check(cli: &Cli, args: &ConfigArgs) -> Result<ExitCode> {
    let config = args.load()?;
    setup_logging(cli, &config.logging)?;
    config.validate()?;

    let engine = LookupEngine::from_config(&config.search, &StrategyRegistry::default())?;
    let snapshot = engine.snapshot()?;
    println!("{}", "Configuration OK".green().bold());
    println!("  data file:  {}", config.search.data_file.display());
    println!("  lines:      {}", snapshot.corpus().len());
    println!("  algorithm:  {}", snapshot.algorithm());
    println!("  index time: {:?}", snapshot.build_time());
    println!(
        "  mode:       {}",
        if config.search.reread_on_query {
            "reread on query"
        } else {
            "cached"
        }
    );
    if let Some(tls) = config.ssl.tls_files() {
        lineprobe::tls::server_acceptor(&tls)?;
        println!("  tls:        {}", tls.cert_file.display());
    }
    Ok(ExitCode::SUCCESS)
}

fn setup_logging(cli: &Cli, logging: &LoggingConfig) -> Result<()> {
    let default_level = if cli.verbose {
        "debug"
    } else {
        logging.level.as_str()
    };
    let mut builder = Builder::from_env(Env::default().default_filter_or(default_level));
    if cli.verbose {
        builder.filter_level(log::LevelFilter::Debug);
    }

    builder.format(|buf, record| {
        use std::io::Write;
        writeln!(
            buf,
            "{} [{}] [{}] {}",
            chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
            record.level(),
            record.module_path().unwrap_or("unknown"),
            record.args()
        )
    });

    let log_path = cli.log.as_deref().or(logging.file.as_deref());
    if let Some(log_path) = log_path {
        create_parent_dir(log_path)?;
        let log_file = fs::File::create(log_path)?;
        builder.target(Target::Pipe(Box::new(log_file)));
    } else {
        builder.target(Target::Stderr);
    }

    builder
        .try_init()
        .map_err(|e| ProbeError::Config(format!("cannot initialise logging: {e}")))?;
    Ok(())
}

fn create_parent_dir(path: &Path) -> Result<()> {
    if let Some(parent_dir) = path.parent() {
        if !parent_dir.as_os_str().is_empty() && !parent_dir.exists() {
            fs::create_dir_all(parent_dir)?;
        }
    }
    Ok(())
}
