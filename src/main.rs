// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * sanko - S3 Bucket Discovery Scanner
 * Standalone CLI: name generation, adaptive probing, deep inspection
 *
 * (c) 2026 Bountyy Oy
 */

use anyhow::{bail, Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use sanko::ai::{new_suggester, SuggesterConfig};
use sanko::config::{find_wordlist, load_wordlist, AppConfig};
use sanko::permutation::{extract_subdomain_words, NameGenerator};
use sanko::recon::{clean_domain, CtClient};
use sanko::reporting::{
    MultiWriter, RealtimeWriter, ReportFormat, ReportWriter, ResultWriter,
};
use sanko::scanner::{Scanner, ScannerConfig};
use validator::Validate;

/// sanko - S3 bucket discovery scanner
#[derive(Parser)]
#[command(name = "sanko")]
#[command(author = "Bountyy Oy <info@bountyy.fi>")]
#[command(version = "1.0.0")]
#[command(about = "Discovers S3 buckets via name permutations, CT logs and AI suggestions", long_about = None)]
struct Cli {
    /// Target keyword for bucket name generation
    #[arg(short, long)]
    seed: Option<String>,

    /// Path to a wordlist file (entries are probed verbatim)
    #[arg(short, long)]
    wordlist: Option<PathBuf>,

    /// Target domain for CT log subdomain discovery
    #[arg(short, long)]
    domain: Option<String>,

    /// Maximum subdomains to fetch from CT logs
    #[arg(long, default_value = "100")]
    ct_limit: usize,

    /// Number of concurrent probe workers
    #[arg(short = 't', long = "threads", default_value = "50")]
    threads: usize,

    /// Number of deep-inspection workers
    #[arg(long, default_value = "10")]
    inspect_workers: usize,

    /// Maximum requests per second (adaptive ceiling)
    #[arg(long, default_value = "150")]
    rps: f64,

    /// Request timeout in seconds
    #[arg(long, default_value = "15")]
    timeout: u64,

    /// Perform deep inspection on found buckets
    #[arg(long, default_value = "true")]
    deep: bool,

    /// Enable AI-powered name generation
    #[arg(long)]
    ai: bool,

    /// AI provider (openai, anthropic, gemini, ollama)
    #[arg(long, default_value = "openai")]
    ai_provider: String,

    /// AI model name (defaults to the provider's standard model)
    #[arg(long)]
    ai_model: Option<String>,

    /// AI provider API key (or env: OPENAI_API_KEY, ANTHROPIC_API_KEY, GEMINI_API_KEY)
    #[arg(long)]
    ai_key: Option<String>,

    /// AI provider base URL (custom endpoints or proxies)
    #[arg(long)]
    ai_url: Option<String>,

    /// Number of AI-generated names
    #[arg(long, default_value = "50")]
    ai_count: usize,

    /// Output file path
    #[arg(short, long, default_value = "results.json")]
    output: PathBuf,

    /// Output format (json, txt)
    #[arg(short, long, default_value = "json")]
    format: String,

    /// Disable colored output
    #[arg(long)]
    no_color: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn into_config(self) -> AppConfig {
        AppConfig {
            workers: self.threads,
            inspect_workers: self.inspect_workers,
            max_rps: self.rps,
            timeout_secs: self.timeout,
            deep_inspect: self.deep,
            seed: self.seed,
            wordlist: self.wordlist,
            domain: self.domain,
            ct_limit: self.ct_limit,
            ai_enabled: self.ai,
            ai_provider: self.ai_provider,
            ai_model: self.ai_model.unwrap_or_default(),
            ai_key: self.ai_key,
            ai_base_url: self.ai_url,
            ai_count: self.ai_count,
            output_file: self.output,
            output_format: self.format,
            no_color: self.no_color,
            verbose: self.verbose,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = cli.into_config();

    let default_level = if config.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(default_level.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    config
        .validate()
        .map_err(|err| anyhow::anyhow!("invalid configuration: {err}"))?;

    if !config.has_input_source() {
        bail!("at least one input source is required: --seed, --wordlist, --domain, or --ai");
    }

    let format: ReportFormat = config.output_format.parse()?;

    print_banner(config.no_color);

    // Ctrl-C cancels the whole pipeline
    let cancel = CancellationToken::new();
    let signal_cancel = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!("\nInterrupted. Shutting down...");
            signal_cancel.cancel();
        }
    });

    let names = generate_names(&config).await?;
    if names.is_empty() {
        bail!("no bucket names generated");
    }
    info!("generated {} unique bucket names to scan", names.len());

    let scanner = std::sync::Arc::new(Scanner::new(&ScannerConfig {
        workers: config.workers,
        inspect_workers: config.inspect_workers,
        max_rps: config.max_rps,
        timeout: Duration::from_secs(config.timeout_secs),
        deep_inspect: config.deep_inspect,
    })?);

    let mut writer = MultiWriter::new(vec![
        Box::new(RealtimeWriter::new(!config.no_color, config.verbose)),
        Box::new(ReportWriter::new(&config.output_file, format)),
    ]);

    let started = Instant::now();
    let mut results = scanner.scan(names, cancel.clone())?;

    // Periodic progress while the scan runs
    let progress_done = CancellationToken::new();
    let progress_scanner = scanner.clone();
    let progress_guard = progress_done.clone();
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(Duration::from_secs(5));
        ticker.tick().await;
        loop {
            tokio::select! {
                _ = progress_guard.cancelled() => return,
                _ = ticker.tick() => {
                    let stats = progress_scanner.stats();
                    info!(
                        "progress: {}/{} scanned, {} found, {:.0} rps (limit {:.0})",
                        stats.scanned,
                        stats.total,
                        stats.found,
                        stats.scan_rate(),
                        progress_scanner.current_rps()
                    );
                }
            }
        }
    });

    while let Some(result) = results.recv().await {
        if let Err(err) = writer.write_result(&result) {
            warn!("failed to record result: {err}");
        }
    }
    progress_done.cancel();

    writer.flush().context("failed to write report")?;

    let stats = scanner.stats();
    println!("\n────────────────────────────────────────");
    println!("Scan completed in {}s", started.elapsed().as_secs());
    println!(
        "Scanned: {} | Found: {} | Public: {} | Private: {} | Errors: {} | Not Found: {}",
        stats.scanned, stats.found, stats.public, stats.private, stats.errors, stats.not_found
    );
    println!("Results saved to: {}", config.output_file.display());

    Ok(())
}

/// Assembles the candidate list: CT-discovered subdomains first, then
/// seed permutations, then the raw wordlist, then AI suggestions. All
/// sources share one dedup set, first insertion wins.
async fn generate_names(config: &AppConfig) -> Result<Vec<String>> {
    let mut generator = NameGenerator::new();
    let mut context_words = Vec::new();

    if let Some(domain) = &config.domain {
        let domain = clean_domain(domain);
        info!("fetching subdomains from CT logs for {domain}");

        let ct = CtClient::new(Duration::from_secs(30), config.ct_limit)?;
        match ct.fetch_subdomains(&domain).await {
            Ok(subdomains) => {
                context_words = extract_subdomain_words(&subdomains, &domain);
                generator.add_subdomains(&subdomains, &domain);
            }
            Err(err) => warn!("CT log fetch failed: {err}"),
        }
    }

    if let Some(seed) = &config.seed {
        generator.add_seed(seed);
        info!("permutation engine: {} candidates so far", generator.len());
    }

    // Explicit --wordlist wins; otherwise the bundled list is picked up
    // next to the executable or in the working directory
    match find_wordlist(config.wordlist.as_deref()) {
        Some(path) => {
            let words = load_wordlist(&path)?;
            if config.wordlist.is_none() {
                info!("using bundled wordlist {}", path.display());
            }
            info!("wordlist: {} entries loaded", words.len());
            generator.add_wordlist(&words);
        }
        None => debug!("no wordlist found, skipping wordlist source"),
    }

    if config.ai_enabled {
        let seed = config.seed.clone().unwrap_or_default();
        if seed.is_empty() && context_words.is_empty() {
            warn!("AI generation needs a seed or discovered context; skipping");
        } else {
            let suggester = new_suggester(&SuggesterConfig {
                provider: config.ai_provider.clone(),
                model: config.ai_model.clone(),
                api_key: resolve_ai_key(config),
                base_url: config.ai_base_url.clone(),
                ..Default::default()
            })?;

            info!(
                "requesting {} suggestions from {} ({})",
                config.ai_count,
                suggester.name(),
                suggester.model()
            );
            match suggester.suggest(&seed, &context_words, config.ai_count).await {
                Ok(names) => {
                    info!("AI ({}) produced {} names", suggester.name(), names.len());
                    generator.add_external(&names);
                }
                Err(err) => warn!("AI generation failed: {err}"),
            }
        }
    }

    Ok(generator.into_names())
}

/// Flag value first, then the provider's conventional environment
/// variable.
fn resolve_ai_key(config: &AppConfig) -> String {
    if let Some(key) = &config.ai_key {
        return key.clone();
    }

    let env_var = match config.ai_provider.as_str() {
        "openai" => "OPENAI_API_KEY",
        "anthropic" => "ANTHROPIC_API_KEY",
        "gemini" => "GEMINI_API_KEY",
        _ => return String::new(),
    };
    std::env::var(env_var).unwrap_or_default()
}

fn print_banner(no_color: bool) {
    let lines = [
        r"                     _         ",
        r"   ___  __ _ _ __  | | _____  ",
        r"  / __|/ _` | '_ \ | |/ / _ \ ",
        r"  \__ \ (_| | | | ||   < (_) |",
        r"  |___/\__,_|_| |_||_|\_\___/ ",
        r"                              ",
        r"  S3 Bucket Discovery Scanner ",
        r"  v1.0 - (c) 2026 Bountyy Oy  ",
    ];

    eprintln!();
    for (i, line) in lines.iter().enumerate() {
        if no_color {
            eprintln!("{line}");
        } else if i < 5 {
            eprintln!("\x1b[92m{line}\x1b[0m");
        } else {
            eprintln!("\x1b[1m\x1b[97m{line}\x1b[0m");
        }
    }
    eprintln!();
}
