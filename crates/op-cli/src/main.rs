//! # opq — operational panels query tool
//!
//! - `opq compose --query <ppl>` — splice date range, filter and fields into a query.
//! - `opq explain --query <ppl>` — list the stages the recognizers find.
//! - `opq index --query <ppl>` — print the index a query reads from.
//! - `opq check-filter --filter <ppl>` — check a panel filter.
//! - `opq panel --panel <file> --saved <file>` — requests for every visualization on a panel.

mod config;
mod output;

use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use op_panels::{panel_requests, Panel, PplRequest, SavedVisualization};
use op_query::{compose_final_query, extract_index, validate_panel_filter, TimeRange, TimeWindow};

use crate::output::{print_rows, request_rows, ClauseRow};

/// Compose and inspect PPL queries for operational panels.
#[derive(Parser)]
#[command(name = "opq", version, about, long_about = None)]
struct Cli {
    /// Path to config file
    #[arg(long, global = true, default_value = "opq.toml")]
    config: PathBuf,

    /// Print JSON instead of text.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Add a time range, filter and field projection to a query.
    Compose {
        #[arg(long)]
        query: String,

        /// Range start, e.g. `now-15m` or `2021-07-01 00:00:00`.
        #[arg(long)]
        from: Option<String>,

        /// Range end, e.g. `now`.
        #[arg(long)]
        to: Option<String>,

        #[arg(long)]
        time_field: Option<String>,

        /// PPL stage(s) to layer after the time range, e.g. `where a = 1`.
        #[arg(long, default_value = "")]
        filter: String,

        /// Comma-separated fields to project.
        #[arg(long, value_delimiter = ',')]
        fields: Vec<String>,
    },

    /// Show the index, time range and fields stages of a query.
    Explain {
        #[arg(long)]
        query: String,
    },

    /// Print the index a query reads from.
    Index {
        #[arg(long)]
        query: String,
    },

    /// Check that a panel filter has no index, time range or fields stage.
    CheckFilter {
        #[arg(long)]
        filter: String,
    },

    /// Build the request for every visualization on a panel.
    Panel {
        /// Panel JSON file.
        #[arg(long)]
        panel: PathBuf,

        /// JSON array of saved visualizations.
        #[arg(long)]
        saved: PathBuf,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "opq=info,op_query=info,op_panels=info".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config = config::load(&cli.config)?;

    match cli.command {
        Commands::Compose {
            query,
            from,
            to,
            time_field,
            filter,
            fields,
        } => {
            let range = TimeRange::new(
                from.unwrap_or_else(|| config.query.default_from.clone()),
                to.unwrap_or_else(|| config.query.default_to.clone()),
            );
            let field = time_field.unwrap_or_else(|| config.query.default_time_field.clone());
            let window = TimeWindow::resolve(&range, &field, chrono::Utc::now())
                .context("resolving time range")?;
            let composed = compose_final_query(&query, &window, &filter, &fields)
                .context("composing query")?;
            tracing::info!(from = %window.start, to = %window.end, "composed query");

            if cli.json {
                let request = PplRequest::new(composed, config.query.format.clone());
                println!("{}", serde_json::to_string_pretty(&request)?);
            } else {
                println!("{}", composed);
            }
        }

        Commands::Explain { query } => {
            let rows: Vec<ClauseRow> = op_query::recognize(&query)
                .into_iter()
                .map(ClauseRow::from)
                .collect();
            print_rows(&rows, cli.json)?;
        }

        Commands::Index { query } => {
            let decl = extract_index(&query)?;
            if cli.json {
                let out = serde_json::json!({
                    "index": decl.index(),
                    "keyword": decl.keyword,
                    "search": decl.search,
                    "end": decl.end(),
                });
                println!("{}", serde_json::to_string_pretty(&out)?);
            } else {
                println!("{}", decl.index());
            }
        }

        Commands::CheckFilter { filter } => {
            validate_panel_filter(&filter)?;
            println!("ok");
        }

        Commands::Panel { panel, saved } => {
            let panel: Panel = read_json(&panel)?;
            let saved: Vec<SavedVisualization> = read_json(&saved)?;
            let requests = panel_requests(&panel, &saved, chrono::Utc::now());
            let failed = requests.values().filter(|r| r.is_err()).count();
            tracing::info!(panel = %panel.id, total = requests.len(), failed, "built panel requests");

            print_rows(&request_rows(&requests), cli.json)?;
            if failed > 0 {
                bail!("{} of {} visualizations failed", failed, requests.len());
            }
        }
    }

    Ok(())
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> anyhow::Result<T> {
    let content =
        std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("parsing {}", path.display()))
}
