//! catalog-browse - drive a listing over a JSON catalog from the terminal.
//!
//! # Usage
//!
//! ```bash
//! # Page through a catalog as a free-tier caller
//! catalog-browse --items problems.json next next prev page:5
//!
//! # Premium caller, filtered, with debug logs on stderr
//! RUST_LOG=catalog_listing=debug catalog-browse --items problems.json \
//!     --tier premium --level hard page:7
//! ```
//!
//! Every resulting snapshot is printed to stdout as one JSON line.

use std::io::{self, Write};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};
use catalog_core::{AccessPolicy, AccessTier, FilterPredicate};
use catalog_listing::{
    ListingConfig, ListingController, ListingError, ListingSnapshot, MemoryCatalogStore,
    Navigation,
};
use clap::Parser;
use serde::Serialize;
use tracing::{info, warn};
use tracing_subscriber::{fmt, EnvFilter};

/// Browse a catalog with forward-only cursor pagination and tiered access.
#[derive(Parser, Debug)]
#[command(name = "catalog-browse")]
#[command(version)]
struct Cli {
    /// JSON file holding an array of catalog items.
    #[arg(long, env = "CATALOG_ITEMS")]
    items: PathBuf,

    /// Caller tier: free or premium.
    #[arg(long, env = "CATALOG_TIER", default_value = "free", value_parser = AccessTier::from_str)]
    tier: AccessTier,

    /// Items per page.
    #[arg(long, env = "CATALOG_PAGE_SIZE", default_value_t = 20)]
    page_size: usize,

    /// Pages open to free-tier callers.
    #[arg(long, env = "CATALOG_FREE_PAGES", default_value_t = 3)]
    free_page_limit: u32,

    /// Rows (by global index) open to free-tier callers.
    #[arg(long, env = "CATALOG_FREE_ROWS", default_value_t = 50)]
    free_row_limit: u64,

    /// Fetched pages kept per filter version.
    #[arg(long, env = "CATALOG_WINDOW_CACHE", default_value_t = 32)]
    window_cache: usize,

    /// Store call timeout in milliseconds; 0 disables it.
    #[arg(long, env = "CATALOG_TIMEOUT_MS", default_value_t = 10_000)]
    timeout_ms: u64,

    /// Case-insensitive search over titles and tags.
    #[arg(long)]
    search: Option<String>,

    /// Exact category match.
    #[arg(long)]
    category: Option<String>,

    /// Exact level match.
    #[arg(long)]
    level: Option<String>,

    /// Log level when RUST_LOG is unset.
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Emit logs as JSON lines.
    #[arg(long, env = "JSON_LOGS")]
    json_logs: bool,

    /// Navigation commands applied after mounting: next, prev, page:N.
    #[arg(value_parser = parse_command)]
    commands: Vec<Command>,
}

impl Cli {
    fn config(&self) -> ListingConfig {
        ListingConfig {
            page_size: self.page_size,
            access: AccessPolicy {
                free_page_limit: self.free_page_limit,
                free_row_limit: self.free_row_limit,
            },
            window_cache_pages: self.window_cache,
            store_timeout: (self.timeout_ms > 0).then(|| Duration::from_millis(self.timeout_ms)),
        }
    }

    fn filter(&self) -> FilterPredicate {
        FilterPredicate {
            search: self.search.clone(),
            category: self.category.clone(),
            level: self.level.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Next,
    Prev,
    Page(u32),
}

fn parse_command(s: &str) -> Result<Command, String> {
    match s.to_ascii_lowercase().as_str() {
        "next" | "n" => Ok(Command::Next),
        "prev" | "previous" | "p" => Ok(Command::Prev),
        other => other
            .strip_prefix("page:")
            .and_then(|page| page.parse().ok())
            .map(Command::Page)
            .ok_or_else(|| format!("invalid command '{s}'. Use next, prev or page:N.")),
    }
}

/// One line of output.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Report<'a> {
    command: String,
    navigation: Option<Navigation>,
    error: Option<String>,
    snapshot: &'a ListingSnapshot,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli.log_level, cli.json_logs);

    let store = MemoryCatalogStore::from_json_file(&cli.items)?;
    info!(items = store.len(), path = %cli.items.display(), "catalog loaded");

    let controller = ListingController::new(cli.config(), store, cli.tier)
        .context("invalid listing configuration")?;

    let filter = cli.filter();
    let first = if filter == FilterPredicate::all() {
        controller.mount().await
    } else {
        controller.set_filter(filter).await
    };
    report(&controller, "mount", first)?;

    for command in &cli.commands {
        let (label, result) = match *command {
            Command::Next => ("next".to_string(), controller.go_next().await),
            Command::Prev => ("prev".to_string(), controller.go_previous().await),
            Command::Page(page) => (format!("page:{page}"), controller.go_to_page(page).await),
        };
        report(&controller, &label, result)?;
    }
    Ok(())
}

fn report(
    controller: &ListingController,
    command: &str,
    result: Result<Navigation, ListingError>,
) -> Result<()> {
    let (navigation, error) = match result {
        Ok(navigation) => (Some(navigation), None),
        Err(err) => {
            warn!(command, error = %err, "navigation failed");
            (None, Some(err.to_string()))
        }
    };
    let snapshot = controller.state();
    let line = serde_json::to_string(&Report {
        command: command.to_string(),
        navigation,
        error,
        snapshot: &snapshot,
    })?;

    let mut stdout = io::stdout().lock();
    writeln!(stdout, "{line}")?;
    Ok(())
}

/// Logs go to stderr so stdout stays machine-readable.
fn init_tracing(level: &str, json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let builder = fmt().with_env_filter(filter).with_writer(io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.with_target(false).init();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_navigation_commands() {
        assert_eq!(parse_command("next"), Ok(Command::Next));
        assert_eq!(parse_command("PREV"), Ok(Command::Prev));
        assert_eq!(parse_command("page:12"), Ok(Command::Page(12)));
        assert!(parse_command("page:x").is_err());
        assert!(parse_command("jump").is_err());
    }

    #[test]
    fn cli_maps_onto_listing_config() {
        let cli = Cli::parse_from([
            "catalog-browse",
            "--items",
            "items.json",
            "--tier",
            "premium",
            "--page-size",
            "10",
            "--timeout-ms",
            "0",
            "--level",
            "hard",
            "next",
            "page:4",
        ]);
        assert_eq!(cli.tier, AccessTier::Premium);
        assert!(!cli.json_logs);
        assert_eq!(cli.commands, vec![Command::Next, Command::Page(4)]);

        let config = cli.config();
        assert_eq!(config.page_size, 10);
        assert_eq!(config.store_timeout, None);
        assert_eq!(config.access, AccessPolicy::default());
        assert_eq!(cli.filter(), FilterPredicate::all().with_level("hard"));
    }

    #[test]
    fn json_logs_flag_is_opt_in() {
        let cli = Cli::parse_from(["catalog-browse", "--items", "items.json", "--json-logs"]);
        assert!(cli.json_logs);
        assert_eq!(cli.log_level, "info");
    }
}
