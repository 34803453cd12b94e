use anyhow::Result;
use clap::{Parser, Subcommand};
use proxy_scout::proxy::{
    builtin_sources, CheckStatus, ProxyChecker, ProxyFinder, ProxyParser, ProxyScheme,
};
use std::path::{Path, PathBuf};

/// File the finder writes its candidate set to
const FINDER_OUTPUT_FILE: &str = "proxies.txt";

/// File the checker writes the alive subset to
const ALIVE_OUTPUT_FILE: &str = "working_proxies.txt";

/// Finds public proxies from list sites and checks which ones are alive
#[derive(Parser)]
#[command(name = "proxy-scout")]
#[command(about = "Finds public proxies from list sites and checks which ones are alive")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch proxy candidates from the built-in sources
    Find,
    /// Check which proxies from a list are alive
    Check {
        /// Proxy list file, one host:port per line
        input: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Find => find().await,
        Commands::Check { input } => check(&input).await,
    }
}

async fn find() -> Result<()> {
    let finder = ProxyFinder::new()?;
    let sources = builtin_sources();

    println!("Fetching proxy lists from {} sources...", sources.len());
    let (proxies, outcomes) = finder.run(&sources).await?;

    for outcome in &outcomes {
        match &outcome.error {
            None => println!("✓ {}: found {} proxies", outcome.source, outcome.proxies.len()),
            Some(error) => eprintln!("✗ {}: {}", outcome.source, error),
        }
    }

    ProxyParser::save_to_file(&proxies, FINDER_OUTPUT_FILE)?;
    println!(
        "\nCollected {} unique proxies, saved to {}",
        proxies.len(),
        FINDER_OUTPUT_FILE
    );

    Ok(())
}

async fn check(input: &Path) -> Result<()> {
    let proxies = ProxyParser::parse_file(input, ProxyScheme::Http)?;
    eprintln!("Loaded {} proxies from {:?}", proxies.len(), input);

    let checker = ProxyChecker::new();
    let results = checker.check_all(proxies).await;

    for result in &results {
        match &result.status {
            CheckStatus::Alive => {
                let latency = result.latency_ms.unwrap_or(0);
                match &result.exit_ip {
                    Some(ip) => eprintln!(
                        "✓ {} - {}ms - exit IP: {}",
                        result.proxy.endpoint(),
                        latency,
                        ip
                    ),
                    None => eprintln!("✓ {} - {}ms", result.proxy.endpoint(), latency),
                }
            }
            CheckStatus::Dead(reason) => eprintln!("✗ {} - {}", result.proxy.endpoint(), reason),
            CheckStatus::Timeout => eprintln!("✗ {} - timed out", result.proxy.endpoint()),
        }
    }

    let alive = ProxyChecker::alive(results.clone());
    eprintln!("\nSummary: {}/{} proxies are alive", alive.len(), results.len());

    // stdout carries exactly the alive list, in input order
    for result in &alive {
        println!("{}", result.proxy.endpoint());
    }

    let alive_proxies: Vec<_> = alive.iter().map(|r| r.proxy.clone()).collect();
    ProxyParser::save_to_file(&alive_proxies, ALIVE_OUTPUT_FILE)?;
    eprintln!("Saved {} alive proxies to {}", alive_proxies.len(), ALIVE_OUTPUT_FILE);

    let report_path = results_report_path(input);
    std::fs::write(&report_path, serde_json::to_string_pretty(&results)?)?;
    eprintln!("Saved full results to {:?}", report_path);

    Ok(())
}

/// Report lands next to the input as `<stem>_results.json`
fn results_report_path(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "proxies".to_string());
    input.with_file_name(format!("{}_results.json", stem))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_results_report_path() {
        assert_eq!(
            results_report_path(Path::new("proxies.txt")),
            PathBuf::from("proxies_results.json")
        );
        assert_eq!(
            results_report_path(Path::new("/tmp/list.txt")),
            PathBuf::from("/tmp/list_results.json")
        );
    }
}
