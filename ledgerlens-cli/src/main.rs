use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use ledgerlens_core::{Concurrency, Model};
use ledgerlens_finance::{Analyzer, Summary};
use ledgerlens_ingest::{load_annotated, load_statement, save_annotated};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

mod chat;
mod config;
mod llm;
mod logging;
mod state;

use crate::chat::{run_repl, ChatLog};
use crate::config::{init_config, load_config, Config};

const LONG_VERSION: &str = concat!(env!("CARGO_PKG_VERSION"), " (", env!("LEDGERLENS_BUILD_SHA"), ")");

#[derive(Parser, Debug)]
#[command(
    name = "ledgerlens",
    version,
    long_version = LONG_VERSION,
    about = "Annotate bank statements with an LLM and chat about your spending"
)]
struct Cli {
    /// Config file (default: ~/.ledgerlens/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Clean remarks, categorise every row, write the annotated CSV and summarise
    Analyze {
        /// Statement exported from the bank (CSV, or XLSX/XLS/ODS workbook)
        input: PathBuf,

        /// Output CSV (default: <input>_annotated.csv next to the input)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Parallel model calls (overrides config and MAX_CONCURRENT_WORKERS)
        #[arg(long)]
        workers: Option<usize>,

        /// Skip the chat session after the summary
        #[arg(long)]
        no_chat: bool,
    },

    /// Print the summary of an annotated CSV
    Summary {
        /// CSV written by `ledgerlens analyze`
        file: PathBuf,
    },

    /// Chat about an annotated CSV
    Chat {
        /// CSV written by `ledgerlens analyze`
        file: PathBuf,
    },

    /// Write a default config file if none exists
    InitConfig,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init_logger(cli.verbose);

    match cli.command {
        Command::Analyze {
            input,
            output,
            workers,
            no_chat,
        } => {
            let mut cfg = load_config(cli.config.as_deref())?;
            if let Some(w) = workers {
                cfg.processing.max_concurrent_workers = w;
            }
            cfg.validate()?;
            let output = output.unwrap_or_else(|| state::default_output_path(&input));
            analyze(&cfg, &input, &output, no_chat).await?;
        }

        Command::Summary { file } => {
            let statement = load_annotated(&file).with_context(|| format!("reading {}", file.display()))?;
            println!("{}", Summary::from_statement(&statement).render());
        }

        Command::Chat { file } => {
            let cfg = load_config(cli.config.as_deref())?;
            cfg.validate()?;
            let statement = load_annotated(&file).with_context(|| format!("reading {}", file.display()))?;
            let model = llm::build_model(&cfg.llm)?;
            chat_session(&cfg, model.as_ref(), &Summary::from_statement(&statement)).await?;
        }

        Command::InitConfig => {
            init_config(cli.config.as_deref())?;
        }
    }

    Ok(())
}

async fn analyze(cfg: &Config, input: &Path, output: &Path, no_chat: bool) -> Result<()> {
    let concurrency: Concurrency = cfg.concurrency()?;
    let statement = load_statement(input).with_context(|| format!("reading {}", input.display()))?;
    println!("Loaded {} transactions from {}", statement.len(), input.display());

    let model: Arc<dyn Model> = llm::build_model(&cfg.llm)?;
    tracing::info!(
        model = %cfg.llm.model,
        workers = concurrency.get(),
        rows = statement.len(),
        "starting analysis"
    );

    let started = Instant::now();
    let analyzer = Analyzer::new(model.clone(), concurrency)
        .report_every(cfg.processing.progress_every)
        .on_progress(|stage, n, total| println!("  [{stage}] processed {n}/{total}"));
    let annotated = analyzer.analyze(statement).await?;
    tracing::info!(elapsed_ms = started.elapsed().as_millis() as u64, "analysis complete");

    save_annotated(&annotated, output).with_context(|| format!("writing {}", output.display()))?;
    println!("Saved annotated statement to {}", output.display());

    let summary = Summary::from_statement(&annotated);
    println!("{}", summary.render());

    if !no_chat {
        chat_session(cfg, model.as_ref(), &summary).await?;
    }
    Ok(())
}

async fn chat_session(cfg: &Config, model: &dyn Model, summary: &Summary) -> Result<()> {
    let log = if cfg.chat.log_history {
        match state::ensure_home().and_then(|home| ChatLog::open_today(&home)) {
            Ok(log) => Some(log),
            Err(e) => {
                tracing::warn!(error = %e, "chat history disabled");
                None
            }
        }
    } else {
        None
    };

    let stdin = std::io::stdin();
    run_repl(model, summary, stdin.lock(), std::io::stdout(), log).await
}
