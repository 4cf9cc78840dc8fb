use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use lead_cli::{AppConfig, Script, app, logging};
use lead_core::LeadStatus;
use tracing::debug;

// ─── CLI definition ──────────────────────────────────────────────────────────

/// Home-installation configurator: replays wizard sessions, prices them and
/// manages the resulting leads.
#[derive(Debug, Parser)]
#[command(name = "lead-configurator", version, about, long_about = None)]
struct Cli {
    /// TOML file with `[database]`, `[retry]` and `[pricing]` sections.
    #[arg(long, env = "LEAD_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Storage backend (`json` or `memory`), overriding the config file.
    #[arg(long, env = "LEAD_DB_BACKEND", global = true)]
    backend: Option<String>,

    /// Lead store location; for `json` the lead file.
    #[arg(long, env = "LEAD_DB", global = true)]
    db: Option<PathBuf>,

    /// Raise log verbosity (-v info, -vv debug, -vvv trace). `RUST_LOG` wins.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Also append log records to this file.
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print the steps active once every answer in the script is applied.
    Steps {
        #[arg(long)]
        answers: PathBuf,
    },
    /// Replay a scripted wizard session.
    Run {
        #[arg(long)]
        answers: PathBuf,
        /// Save the finished lead through the configured backend.
        #[arg(long)]
        submit: bool,
    },
    /// Price the merged answers of a script.
    Estimate {
        #[arg(long)]
        answers: PathBuf,
        /// Print the estimate as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Lead tracker.
    #[command(subcommand)]
    Leads(LeadsCommand),
}

#[derive(Debug, Subcommand)]
enum LeadsCommand {
    List {
        #[arg(long, value_parser = parse_status)]
        status: Option<LeadStatus>,
    },
    Move {
        id: i64,
        #[arg(value_parser = parse_status)]
        status: LeadStatus,
    },
    Show {
        id: i64,
    },
}

fn parse_status(s: &str) -> Result<LeadStatus, String> {
    LeadStatus::parse(s).ok_or_else(|| {
        let known: Vec<_> = LeadStatus::ALL.iter().map(|status| status.as_str()).collect();
        format!("unknown status '{s}', expected one of: {}", known.join(", "))
    })
}

// ─── entry point ─────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose, cli.log_file.as_deref())?;

    let mut config = AppConfig::load(cli.config.as_deref()).context("failed to load config")?;
    config.override_database(cli.backend, cli.db);
    debug!(backend = %config.database.backend, "configuration ready");

    let output = match cli.command {
        Command::Steps { answers } => app::steps(&Script::load(&answers)?)?,
        Command::Run { answers, submit } => {
            app::run(&config, &Script::load(&answers)?, submit).await?
        }
        Command::Estimate { answers, json } => {
            app::estimate(&config, &Script::load(&answers)?, json)?
        }
        Command::Leads(LeadsCommand::List { status }) => app::list_leads(&config, status).await?,
        Command::Leads(LeadsCommand::Move { id, status }) => {
            app::move_lead(&config, id, status).await?
        }
        Command::Leads(LeadsCommand::Show { id }) => app::show_lead(&config, id).await?,
    };
    print!("{output}");
    Ok(())
}
