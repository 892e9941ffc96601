use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use lockguard::{
    cache::Cache,
    config::Config,
    diagnostics::TracingSink,
    error::Error,
    logging,
    output::{write_report, OutputFormat},
    rules::{FileRuleSource, HttpRuleSource, RuleSource},
    scanner::{self, LockfileFinder, ScanOptions, ScanOutcome},
};
use std::path::PathBuf;
use std::process::ExitCode;
use std::str::FromStr;
use std::time::Duration;

/// Exit codes for CI integration
mod exit_codes {
    pub const SUCCESS: u8 = 0;
    pub const ERROR: u8 = 1;
    pub const COMPROMISED: u8 = 2;
}

#[derive(Parser)]
#[command(name = "lockguard")]
#[command(
    author,
    version,
    about = "Detect known-compromised package versions in npm lockfiles"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan lockfiles against a rule feed
    Scan {
        /// Lockfiles or directories to scan
        #[arg(default_value = ".")]
        paths: Vec<PathBuf>,

        /// URL of the JSON rule feed
        #[arg(long)]
        rules_url: Option<String>,

        /// Local JSON rule feed (takes precedence over --rules-url)
        #[arg(long)]
        rules_file: Option<PathBuf>,

        /// Output format (table, json, sarif, github)
        #[arg(short, long)]
        format: Option<String>,

        /// Write output to file
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Exit 0 even when compromised packages are found
        #[arg(long)]
        no_fail: bool,

        /// Clear cache before scanning
        #[arg(long)]
        clear_cache: bool,

        /// Read lockfiles one at a time
        #[arg(long)]
        no_parallel: bool,

        /// Log filter (overridden by RUST_LOG)
        #[arg(long)]
        log_level: Option<String>,

        /// Log format (pretty, compact, json)
        #[arg(long)]
        log_format: Option<String>,
    },

    /// Show or create config file
    Config {
        /// Generate default config file
        #[arg(long)]
        init: bool,

        /// Show config file path
        #[arg(long)]
        path: bool,
    },

    /// Clear the cache
    ClearCache,
}

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::from(exit_codes::ERROR)
        }
    }
}

async fn run() -> Result<u8> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Scan {
            paths,
            rules_url,
            rules_file,
            format,
            output,
            no_fail,
            clear_cache,
            no_parallel,
            log_level,
            log_format,
        } => {
            let config = Config::load()?;
            logging::init_tracing(
                log_level.as_deref().unwrap_or(&config.log_level),
                log_format.as_deref().unwrap_or(&config.log_format),
            )?;

            let cache = Cache::with_ttl_hours(config.cache_ttl_hours);
            if clear_cache {
                clear_before_scan(&cache);
            }

            let rule_source = build_rule_source(
                rules_file.or_else(|| config.rules_file.clone()),
                rules_url.or_else(|| config.rules_url.clone()),
                &config,
                cache,
            )?;

            let format_str = format.unwrap_or_else(|| config.default_format.clone());
            let format = OutputFormat::from_str(&format_str).map_err(|e| anyhow::anyhow!(e))?;

            let files = LockfileFinder::new(paths)
                .with_lockfile_names(config.lockfile_names.clone())
                .with_exclude_dirs(config.exclude_dirs.clone());
            let options = ScanOptions {
                parallel: !no_parallel && config.parallel,
                ignore: config.ignore.clone(),
            };

            run_scan(rule_source.as_ref(), &files, options, format, output, no_fail).await
        }
        Commands::Config { init, path } => {
            handle_config(init, path)?;
            Ok(exit_codes::SUCCESS)
        }
        Commands::ClearCache => {
            let cache = Cache::new();
            cache.clear()?;
            println!("Cache cleared: {}", cache.dir().display());
            Ok(exit_codes::SUCCESS)
        }
    }
}

/// Clears the cache ahead of a scan. Failures are logged, not returned.
fn clear_before_scan(cache: &Cache) -> bool {
    match cache.clear() {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!(dir = %cache.dir().display(), error = %e, "failed to clear cache");
            false
        }
    }
}

fn build_rule_source(
    rules_file: Option<PathBuf>,
    rules_url: Option<String>,
    config: &Config,
    cache: Cache,
) -> Result<Box<dyn RuleSource>> {
    if let Some(path) = rules_file {
        return Ok(Box::new(FileRuleSource::new(path)));
    }

    let Some(url) = rules_url else {
        return Err(Error::Config(
            "no rule feed configured; pass --rules-url or --rules-file, or set rules_url in the config file"
                .to_string(),
        )
        .into());
    };

    let source =
        HttpRuleSource::with_timeout(url, Duration::from_secs(config.request_timeout_secs))?;
    if config.cache_ttl_hours == 0 {
        Ok(Box::new(source))
    } else {
        Ok(Box::new(source.with_cache(cache)))
    }
}

async fn run_scan(
    rule_source: &dyn RuleSource,
    files: &LockfileFinder,
    options: ScanOptions,
    format: OutputFormat,
    output_file: Option<PathBuf>,
    no_fail: bool,
) -> Result<u8> {
    let is_interactive = format == OutputFormat::Table;

    let progress = if is_interactive {
        let pb = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
            pb.set_style(style);
        }
        pb.enable_steady_tick(Duration::from_millis(100));
        pb.set_message(format!("Scanning lockfiles with rules from {}...", rule_source.describe()));
        Some(pb)
    } else {
        None
    };

    let outcome = scanner::run(rule_source, files, options, &TracingSink).await;

    if let Some(pb) = progress {
        pb.finish_and_clear();
    }

    let report = match outcome? {
        ScanOutcome::NothingToCheck => {
            if is_interactive {
                println!("Rule feed is empty, nothing to check.");
            }
            return Ok(exit_codes::SUCCESS);
        }
        ScanOutcome::Completed(report) => report,
    };

    tracing::info!(
        files = report.files_scanned.len(),
        skipped = report.files_skipped.len(),
        suppressed = report.suppressed,
        findings = report.count(),
        "scan complete"
    );

    if let Some(path) = output_file {
        let file = std::fs::File::create(&path)
            .with_context(|| format!("failed to create {}", path.display()))?;
        write_report(&report, format, std::io::BufWriter::new(file))?;
        if is_interactive {
            println!("Results written to: {}", path.display());
        }
    } else {
        write_report(&report, format, std::io::stdout().lock())?;
    }

    Ok(determine_exit_code(report.is_compromised(), no_fail))
}

/// Determine the exit code from the scan result and --no-fail
fn determine_exit_code(compromised: bool, no_fail: bool) -> u8 {
    if compromised && !no_fail {
        exit_codes::COMPROMISED
    } else {
        exit_codes::SUCCESS
    }
}

fn handle_config(init: bool, path: bool) -> Result<()> {
    let config_path = Config::config_path();

    if path {
        println!("{}", config_path.display());
        return Ok(());
    }

    if init {
        if config_path.exists() {
            println!("Config file already exists at: {}", config_path.display());
        } else {
            Config::default().save()?;
            println!("Created config file at: {}", config_path.display());
        }
        return Ok(());
    }

    if config_path.exists() {
        let content = std::fs::read_to_string(&config_path)
            .with_context(|| format!("failed to read {}", config_path.display()))?;
        println!("# Config file: {}", config_path.display());
        println!();
        println!("{}", content);
    } else {
        println!("# No config file found. Default configuration:");
        println!("# Create with: lockguard config --init");
        println!();
        println!("{}", Config::generate_default_config());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes() {
        assert_eq!(determine_exit_code(false, false), exit_codes::SUCCESS);
        assert_eq!(determine_exit_code(true, false), exit_codes::COMPROMISED);
        assert_eq!(determine_exit_code(true, true), exit_codes::SUCCESS);
    }

    #[test]
    fn test_missing_rule_feed_is_config_error() {
        let Err(err) = build_rule_source(None, None, &Config::default(), Cache::new()) else {
            panic!("expected a config error");
        };
        assert!(err.to_string().contains("no rule feed configured"));
    }

    #[test]
    fn test_clear_failure_does_not_abort_scan() {
        let dir = tempfile::TempDir::new().unwrap();
        let blocker = dir.path().join("cache");
        std::fs::write(&blocker, "not a directory").unwrap();
        let cache = Cache::in_dir(&blocker, Duration::from_secs(3600));

        assert!(!clear_before_scan(&cache));
        assert!(clear_before_scan(&Cache::in_dir(
            dir.path().join("fresh"),
            Duration::from_secs(3600)
        )));
    }

    #[test]
    fn test_rules_file_wins_over_url() {
        let source = build_rule_source(
            Some(PathBuf::from("rules.json")),
            Some("https://example.com/feed.json".to_string()),
            &Config::default(),
            Cache::new(),
        )
        .unwrap();
        assert_eq!(source.describe(), "rules.json");
    }

    #[test]
    fn test_cli_parses_scan_flags() {
        let cli = Cli::try_parse_from([
            "lockguard",
            "scan",
            "app",
            "--rules-file",
            "rules.json",
            "--format",
            "github",
            "--no-fail",
        ])
        .unwrap();

        match cli.command {
            Commands::Scan {
                paths,
                rules_file,
                format,
                no_fail,
                ..
            } => {
                assert_eq!(paths, vec![PathBuf::from("app")]);
                assert_eq!(rules_file, Some(PathBuf::from("rules.json")));
                assert_eq!(format.as_deref(), Some("github"));
                assert!(no_fail);
            }
            _ => panic!("expected scan command"),
        }
    }
}
