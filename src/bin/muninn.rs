//! muninn — PromQL typeahead CLI
//!
//! Inspect Prometheus metadata and drive typeahead classification from
//! the command line.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing::debug;

use muninn::config::Config;
use muninn::{MetadataFetcher, Muninn, PrometheusFetcher};

/// Muninn CLI
#[derive(Parser)]
#[command(name = "muninn")]
#[command(version = muninn::PKG_VERSION)]
#[command(about = "PromQL typeahead engine")]
struct Args {
    /// Prometheus server URL (overrides the config file)
    #[arg(short, long, env = "PROMETHEUS_URL")]
    url: Option<String>,

    /// Config file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List all metric names
    Metrics,

    /// Show label keys and values for a metric
    Labels {
        /// Metric name
        metric: String,
    },

    /// List values for a label key
    Values {
        /// Label key
        key: String,
    },

    /// Suggest completions for a partial query
    Suggest {
        /// Query text
        query: String,
        /// Cursor position in bytes (default: end of query)
        #[arg(long)]
        cursor: Option<usize>,
        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialise tracing (default: warn for CLI; override with RUST_LOG).
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let args = Args::parse();
    let config = Config::load(args.config.as_deref())?;
    let url = args.url.unwrap_or(config.prometheus.url);
    debug!(version = muninn::version_string(), %url, "muninn starting");
    let fetcher = PrometheusFetcher::new(url).timeout_secs(config.prometheus.timeout_secs);

    match args.command {
        Command::Metrics => {
            let names = fetcher.fetch_metric_names().await?;
            for name in names {
                println!("{name}");
            }
        }

        Command::Labels { metric } => {
            let labels = fetcher.fetch_metric_labels(&metric).await?;
            if labels.keys.is_empty() {
                println!("no series found for {metric}");
            }
            for key in &labels.keys {
                let values = labels
                    .values_by_key
                    .get(key)
                    .map(Vec::as_slice)
                    .unwrap_or_default();
                println!("{key}: {}", values.join(", "));
            }
        }

        Command::Values { key } => {
            let values = fetcher.fetch_label_values(&key).await?;
            for value in values {
                println!("{value}");
            }
        }

        Command::Suggest {
            query,
            cursor,
            json,
        } => {
            let session = Muninn::builder()
                .fetcher(Arc::new(fetcher))
                .seed_metric_names(config.typeahead.seed_metrics)
                .on_error(|e| eprintln!("fetch error: {e}"))
                .build()?;
            session.refresh_metric_names().await;

            let cursor = cursor.unwrap_or(query.len());
            let mut result = session.typeahead(&query, cursor);
            // A failed fetch leaves the bucket absent and the re-ask hands
            // back another refresher; stop after two attempts.
            for _ in 0..2 {
                match result.refresher.take() {
                    Some(refresher) => {
                        refresher.await;
                        result = session.typeahead(&query, cursor);
                    }
                    None => break,
                }
            }

            if json {
                let payload = serde_json::json!({
                    "context": result.context,
                    "prefix": result.prefix,
                    "suggestions": result.suggestions,
                });
                println!("{}", serde_json::to_string_pretty(&payload)?);
            } else {
                match &result.context {
                    Some(context) => println!("context: {}", context.tag()),
                    None => println!("context: none"),
                }
                if !result.prefix.is_empty() {
                    println!("prefix: {}", result.prefix);
                }
                for group in &result.suggestions {
                    println!("{}:", group.label);
                    for item in &group.items {
                        println!("  {}", item.text);
                    }
                }
            }
        }
    }

    Ok(())
}
