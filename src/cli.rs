//! Command-line interface for site-sentry.
//!
//! `run` (the default) hands control back to `main` to start the host. The
//! other subcommands are one-shot operations on the configured store and
//! exit when done.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use site_sentry_config::{Config, LogLevel};
use site_sentry_core::{FileStore, KeyValueStore, PatternMapping, find_match, is_web_url, keys};
use site_sentry_sync::{HttpListSource, ListSynchronizer, SyncOutcome, SyncRecord};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// site-sentry - Warns when a visited page matches a restricted-site list
#[derive(Parser)]
#[command(name = "site-sentry")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Use this config file instead of ~/.config/site-sentry/config.yaml
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Set debug log level (overrides config and RUST_LOG)
    #[arg(long, global = true, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevelArg>,

    /// Override the list source URL from the config file
    #[arg(long, global = true, value_name = "URL")]
    pub source: Option<String>,
}

/// Log level argument for CLI
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum LogLevelArg {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevelArg> for LogLevel {
    fn from(arg: LogLevelArg) -> Self {
        match arg {
            LogLevelArg::Off => LogLevel::Off,
            LogLevelArg::Error => LogLevel::Error,
            LogLevelArg::Warn => LogLevel::Warn,
            LogLevelArg::Info => LogLevel::Info,
            LogLevelArg::Debug => LogLevel::Debug,
            LogLevelArg::Trace => LogLevel::Trace,
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the host: keep the list synchronized and watch navigations on stdin
    Run,

    /// Run one synchronization cycle and exit
    Sync,

    /// Report which stored pattern (if any) matches a URL
    Check {
        /// URL to test
        url: String,
    },

    /// Print the stored pattern list in match order
    List,

    /// Parse a local list file and print what it contains
    Parse {
        /// File in PATTERN:MESSAGE format
        file: PathBuf,
    },

    /// Show when the list was last synchronized
    Status,
}

/// Runtime options passed from CLI to the host
#[derive(Clone, Debug, Default)]
pub struct RuntimeOptions {
    /// Config file override
    pub config_path: Option<PathBuf>,
    /// Log level override from CLI
    pub log_level: Option<LogLevel>,
    /// List source override
    pub source: Option<String>,
}

impl RuntimeOptions {
    /// Load the config file these options point at and apply the overrides.
    ///
    /// Returns the config and the directory it was loaded from.
    pub fn load_config(&self) -> Result<(Config, PathBuf)> {
        let path = self.config_path.clone().unwrap_or_else(Config::config_path);
        let mut config = Config::load_from(&path)
            .with_context(|| format!("failed to load config from {}", path.display()))?;
        if let Some(source) = &self.source {
            config.sync.list_source_url = source.clone();
            config.validate()?;
        }
        crate::debug::apply_config_level(config.log_level);

        let dir = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        Ok((config, dir))
    }
}

/// Result of CLI processing
pub enum CliResult {
    /// Continue with normal host startup
    Continue(RuntimeOptions),
    /// Exit with the given code (subcommand completed)
    Exit(i32),
}

/// Process CLI arguments and handle subcommands
pub fn process_cli() -> CliResult {
    let cli = Cli::parse();
    let options = RuntimeOptions {
        config_path: cli.config,
        log_level: cli.log_level.map(Into::into),
        source: cli.source,
    };

    let result = match cli.command {
        None | Some(Commands::Run) => return CliResult::Continue(options),
        Some(Commands::Parse { file }) => parse_cli(&file),
        Some(Commands::Sync) => with_logging(&options, sync_cli),
        Some(Commands::Check { url }) => with_logging(&options, |o| check_cli(o, &url)),
        Some(Commands::List) => with_logging(&options, list_cli),
        Some(Commands::Status) => with_logging(&options, status_cli),
    };

    match result {
        Ok(code) => CliResult::Exit(code),
        Err(e) => {
            eprintln!("site-sentry: error: {e:#}");
            CliResult::Exit(1)
        }
    }
}

/// Subcommands that touch the store log to the debug file like the host does
fn with_logging<F>(options: &RuntimeOptions, command: F) -> Result<i32>
where
    F: FnOnce(&RuntimeOptions) -> Result<i32>,
{
    crate::debug::init_log_bridge(options.log_level);
    command(options)
}

fn open_store(config: &Config, config_dir: &Path) -> Result<Arc<FileStore>> {
    let path = config.resolved_store_path(config_dir);
    let store = FileStore::open(&path)
        .with_context(|| format!("failed to open store at {}", path.display()))?;
    Ok(Arc::new(store))
}

fn load_mapping(store: &dyn KeyValueStore) -> Result<PatternMapping> {
    let mapping = store
        .get_as::<PatternMapping>(keys::RESTRICTED_WEBSITES)
        .context("stored pattern list is unreadable")?;
    Ok(mapping.unwrap_or_default())
}

/// One synchronization cycle; exit code 1 when nothing was stored
fn sync_cli(options: &RuntimeOptions) -> Result<i32> {
    let (config, dir) = options.load_config()?;
    let store = open_store(&config, &dir)?;
    let source = HttpListSource::from_config(&config.sync);
    println!("Fetching {}", source.url());

    let synchronizer = ListSynchronizer::new(Box::new(source), store);
    match synchronizer.synchronize() {
        SyncOutcome::Updated(stats) => {
            println!(
                "Stored {} patterns ({} lines, {} malformed, {} duplicates)",
                stats.entries, stats.total_lines, stats.malformed_lines, stats.duplicate_patterns
            );
            Ok(0)
        }
        SyncOutcome::Skipped => {
            println!("A synchronization is already running");
            Ok(0)
        }
        SyncOutcome::Failed(e) => {
            eprintln!("Synchronization failed: {e}");
            println!("The previously stored list was kept.");
            Ok(1)
        }
    }
}

fn check_cli(options: &RuntimeOptions, url: &str) -> Result<i32> {
    if !is_web_url(url) {
        println!("{url} is not an http(s) URL and is never checked");
        return Ok(0);
    }
    let (config, dir) = options.load_config()?;
    let store = open_store(&config, &dir)?;
    let mapping = load_mapping(store.as_ref())?;

    match find_match(&mapping, url) {
        Some(entry) => {
            println!("MATCH  {}", entry.pattern);
            println!("       {}", entry.message);
        }
        None => println!("No pattern matches {url} ({} patterns checked)", mapping.len()),
    }
    Ok(0)
}

fn list_cli(options: &RuntimeOptions) -> Result<i32> {
    let (config, dir) = options.load_config()?;
    let store = open_store(&config, &dir)?;
    let mapping = load_mapping(store.as_ref())?;

    if mapping.is_empty() {
        println!("No patterns stored. Run `site-sentry sync` first.");
        return Ok(0);
    }
    let width = mapping.len().to_string().len();
    for (i, entry) in mapping.iter().enumerate() {
        println!("{:>width$}. {}: {}", i + 1, entry.pattern, entry.message);
    }
    Ok(0)
}

fn parse_cli(file: &Path) -> Result<i32> {
    let text = std::fs::read_to_string(file)
        .with_context(|| format!("failed to read {}", file.display()))?;
    let parsed = site_sentry_core::parse_list(&text);
    let stats = parsed.stats;

    for entry in &parsed.mapping {
        println!("{}: {}", entry.pattern, entry.message);
    }
    println!();
    println!("Lines:      {}", stats.total_lines);
    println!("Patterns:   {}", stats.entries);
    println!("Comments:   {}", stats.comment_lines);
    println!("Blank:      {}", stats.blank_lines);
    println!("Malformed:  {}", stats.malformed_lines);
    println!("Duplicates: {}", stats.duplicate_patterns);
    Ok(0)
}

fn status_cli(options: &RuntimeOptions) -> Result<i32> {
    let (config, dir) = options.load_config()?;
    let store = open_store(&config, &dir)?;

    println!("Store:          {}", store.path().display());
    println!("Source:         {}", config.sync.list_source_url);
    println!("Refresh every:  {} min", config.sync.refresh_period_minutes);
    match SyncRecord::load(store.as_ref()) {
        Some(record) => {
            println!("Last sync:      {}", record.display_time());
            println!("Synced from:    {}", record.source);
        }
        None => println!("Last sync:      never"),
    }
    let mapping = load_mapping(store.as_ref())?;
    println!("Patterns:       {}", mapping.len());
    Ok(0)
}
