// ABOUTME: CLI for the spouts source plugins.
// ABOUTME: Lists source types, prints schemas, fetches full-text items and runs batch ingestion.

use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use clap::{Args as ClapArgs, Parser, Subcommand};
use serde_json::json;
use spouts_extract::extract_with_rule;
use spouts_sources::{
    builtin_registry, ingest, ingest_batch, HttpFetcher, Params, SourcesFile,
    DEFAULT_CONCURRENCY,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "spouts")]
#[command(about = "Fetch feeds with full article text", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List the available source types
    Types,

    /// Print the configuration schema of a source type as JSON
    Schema {
        #[arg(value_name = "TYPE")]
        type_id: String,
    },

    /// Fetch one source and print its items with full content as JSON
    Fetch {
        #[arg(value_name = "TYPE")]
        type_id: String,

        /// Source parameter as key=value; repeatable
        #[arg(short = 'p', long = "param", value_parser = parse_param)]
        params: Vec<(String, String)>,

        /// Permalink fetches in flight at once
        #[arg(long, default_value_t = DEFAULT_CONCURRENCY)]
        concurrency: usize,

        #[command(flatten)]
        http: HttpArgs,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Run a source type's content rules against a saved article page
    Extract {
        #[arg(value_name = "TYPE")]
        type_id: String,

        /// HTML file to extract from
        #[arg(long)]
        html: PathBuf,
    },

    /// Ingest every source listed in a TOML sources file
    Batch {
        file: PathBuf,

        #[command(flatten)]
        http: HttpArgs,

        #[command(flatten)]
        output: OutputArgs,
    },
}

#[derive(ClapArgs, Debug)]
struct HttpArgs {
    /// Allow fetching from private/local networks
    #[arg(long = "allow-private-networks")]
    allow_private_networks: bool,

    /// Request timeout in seconds
    #[arg(long, default_value_t = 30)]
    timeout: u64,
}

#[derive(ClapArgs, Debug)]
struct OutputArgs {
    /// Output compact JSON instead of pretty.
    #[arg(long, default_value_t = false)]
    compact: bool,
}

fn parse_param(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_string(), value.to_string()))
        }
        _ => Err(format!("expected key=value, got `{raw}`")),
    }
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn build_fetcher(http: &HttpArgs) -> Result<HttpFetcher> {
    HttpFetcher::builder()
        .timeout(Duration::from_secs(http.timeout))
        .allow_private_networks(http.allow_private_networks)
        .build()
        .map_err(anyhow::Error::new)
}

fn print_json(value: &impl serde::Serialize, compact: bool) -> Result<()> {
    let out = if compact {
        serde_json::to_string(value)?
    } else {
        serde_json::to_string_pretty(value)?
    };
    println!("{out}");
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    init_logging();
    let cli = Cli::parse();

    match run(cli.command).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(1),
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::from(1)
        }
    }
}

/// Runs one command; `Ok(false)` means it finished but something failed.
async fn run(command: Command) -> Result<bool> {
    let registry = builtin_registry();

    match command {
        Command::Types => {
            for type_id in registry.type_ids() {
                let source = registry.plugin(type_id)?;
                println!("{type_id}\t{}\t{}", source.name(), source.description());
            }
            Ok(true)
        }

        Command::Schema { type_id } => {
            let source = registry.plugin(&type_id)?;
            print_json(&source.params(), false)?;
            Ok(true)
        }

        Command::Fetch {
            type_id,
            params,
            concurrency,
            http,
            output,
        } => {
            let params: Params = params.into_iter().collect();
            let source = registry.create(&type_id, &params)?;
            let fetcher = build_fetcher(&http)?;
            let items = ingest(&source, &fetcher, concurrency).await?;
            print_json(
                &json!({
                    "type": type_id,
                    "feed_url": source.feed_url(),
                    "items": items,
                }),
                output.compact,
            )?;
            Ok(true)
        }

        Command::Extract { type_id, html } => {
            let source = registry.plugin(&type_id)?;
            let rules = source
                .content_rules()
                .ok_or_else(|| anyhow!("source `{type_id}` has no content rules"))?;
            let page = fs::read_to_string(&html)
                .with_context(|| format!("reading {}", html.display()))?;

            match extract_with_rule(rules.rules, &page, &rules.policy) {
                Some(found) => {
                    eprintln!("matched rule {}: {}", found.rule_index, rules.rules[found.rule_index]);
                    println!("{}", found.content);
                    Ok(true)
                }
                None => bail!("no content rule of `{type_id}` matched {}", html.display()),
            }
        }

        Command::Batch { file, http, output } => {
            let sources = SourcesFile::load(&file)?;
            let fetcher = build_fetcher(&http)?;
            let reports = ingest_batch(&registry, &sources, &fetcher).await;
            print_json(&reports, output.compact)?;
            Ok(reports.iter().all(|r| r.is_ok()))
        }
    }
}
