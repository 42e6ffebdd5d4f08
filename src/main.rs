//! rsclearurls 命令行：净化参数或标准输入中的URL，每行输出一个结果

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use rsclearurls::{CleanOutcome, ClearUrls, ConfigManager, GlobalConfig, UrlCleaner};

#[derive(Parser)]
#[command(name = "rsclearurls")]
#[command(about = "Strip tracking parameters from URLs using the ClearURLs rule database")]
#[command(version)]
struct Cli {
    /// URLs to clean (read from stdin, one per line, when omitted)
    urls: Vec<String>,

    /// Rule cache directory
    #[arg(long)]
    cache_dir: Option<PathBuf>,

    /// Maximum number of distinct URLs visited while following redirects
    #[arg(short, long, default_value_t = rsclearurls::config::DEFAULT_MAX_REDIRECTS)]
    max_redirects: usize,

    /// HTTP timeout in seconds
    #[arg(short, long, default_value_t = 30)]
    timeout: u64,

    /// Only resolve rule-declared redirects, never probe the network
    #[arg(long)]
    no_follow: bool,

    /// Also strip referral marketing parameters
    #[arg(long)]
    strip_referral: bool,

    /// Print `BLOCKED <url> <provider>` for URLs matching a blocking provider
    #[arg(long)]
    report_blocked: bool,

    /// Refresh the rule cache before cleaning
    #[arg(long)]
    refresh: bool,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut builder = ConfigManager::custom()
        .max_redirects(cli.max_redirects)
        .http_timeout(cli.timeout)
        .follow_http_redirects(!cli.no_follow)
        .strip_referral_marketing(cli.strip_referral)
        .verbose(cli.verbose);
    if let Some(dir) = cli.cache_dir.clone() {
        builder = builder.rule_cache_dir(dir);
    }
    let config = builder.build();
    init_tracing(&config);

    let service = ClearUrls::new(&config).context("创建净化服务失败")?;
    if cli.refresh {
        let rules = service.rule_provider().force_refresh().await.context("刷新规则失败")?;
        info!("规则已刷新，站点规则数：{}", rules.providers.len());
    }
    let cleaner = service.cleaner().await.context("加载规则失败")?;
    debug!("已加载 {} 条站点规则", cleaner.rules().len());

    if !cli.urls.is_empty() {
        for url in &cli.urls {
            print_outcome(&cleaner, url, cli.report_blocked).await;
        }
        return Ok(());
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await.context("读取标准输入失败")? {
        let url = line.trim();
        if url.is_empty() {
            continue;
        }
        print_outcome(&cleaner, url, cli.report_blocked).await;
    }

    Ok(())
}

async fn print_outcome(cleaner: &UrlCleaner, url: &str, report_blocked: bool) {
    match cleaner.clean(url).await {
        CleanOutcome::Blocked { url: final_url, provider } if report_blocked => {
            println!("BLOCKED {} {}", final_url, provider);
        }
        outcome => println!("{}", outcome.into_url_or(url)),
    }
}

fn init_tracing(config: &GlobalConfig) {
    let default_level = if config.verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
