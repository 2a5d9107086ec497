use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{ArgGroup, Args, Parser, Subcommand};
use tracing::Instrument;

mod eligibility;
mod errors;
mod ledger;
mod models;
mod policy;
mod report;
mod request;
mod source;

use errors::EligibilityError;
use models::{GroupListing, ParticipationLedger};

#[derive(Parser)]
#[command(name = "teammate-finder")]
#[command(about = "Finds classmates a student may still team up with", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
#[command(group(
    ArgGroup::new("history")
        .args(["contributions", "groups_csv"])
        .required(true)
        .multiple(false)
))]
struct HistoryArgs {
    /// Student list, one handle or email per line
    #[arg(long)]
    roster: PathBuf,
    /// Root of the contributions tree (`<root>/<category>/<group>`)
    #[arg(long)]
    contributions: Option<PathBuf>,
    /// CSV export with `category,group` columns
    #[arg(long)]
    groups_csv: Option<PathBuf>,
    #[arg(long, default_value_t = source::DEFAULT_MAX_IN_FLIGHT)]
    max_in_flight: usize,
    /// JSON policy overrides (falls back to TEAMMATE_POLICY)
    #[arg(long)]
    policy: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Answer a teammate request issue
    Check {
        /// Issue title, e.g. "Teammate request: alice@kth.se"
        #[arg(long)]
        title: String,
        #[command(flatten)]
        history: HistoryArgs,
        /// Write the report here instead of stdout
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Print the participation ledger as JSON
    Ledger {
        #[command(flatten)]
        history: HistoryArgs,
    },
}

async fn load_ledger(
    history: &HistoryArgs,
    policy: &policy::EligibilityPolicy,
) -> anyhow::Result<ParticipationLedger> {
    let roster = source::load_roster(&history.roster).await?;
    let listing: GroupListing = match (&history.contributions, &history.groups_csv) {
        (Some(root), _) => source::scan_contributions(root, history.max_in_flight)
            .await
            .with_context(|| format!("failed to scan {}", root.display()))?,
        (None, Some(csv)) => source::load_groups_csv(csv)?,
        (None, None) => anyhow::bail!("either --contributions or --groups-csv is required"),
    };
    Ok(ledger::build_from_listing(
        &roster,
        &listing,
        &policy.group_delimiter,
    ))
}

fn emit(text: &str, out: Option<&Path>) -> anyhow::Result<()> {
    match out {
        Some(path) => {
            std::fs::write(path, text)
                .with_context(|| format!("failed to write {}", path.display()))?;
            tracing::info!(path = %path.display(), "report written");
        }
        None => print!("{text}"),
    }
    Ok(())
}

async fn check(title: &str, history: &HistoryArgs, out: Option<&Path>) -> anyhow::Result<()> {
    let Some(requester) = request::parse_title(title) else {
        tracing::info!(title, "issue is not a teammate request, nothing to do");
        return Ok(());
    };
    tracing::info!(%requester, "teammate request received");

    let policy = policy::load(history.policy.as_deref())?;
    let ledger = load_ledger(history, &policy).await?;

    match eligibility::evaluate(&ledger, &requester, &policy) {
        Ok(result) => {
            let today = chrono::Utc::now().date_naive();
            emit(&report::build_report(&result, &policy.domain, today), out)
        }
        Err(error @ EligibilityError::UnknownRequester { .. }) => {
            tracing::warn!(%error, "request could not be matched to a student");
            emit(&report::unknown_requester_notice(&requester, &policy.domain), out)
        }
        Err(error) => Err(error.into()),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Check {
            title,
            history,
            out,
        } => {
            let span = tracing::info_span!("check", run_id = %uuid::Uuid::new_v4());
            check(&title, &history, out.as_deref()).instrument(span).await?;
        }
        Commands::Ledger { history } => {
            let policy = policy::load(history.policy.as_deref())?;
            let ledger = load_ledger(&history, &policy).await?;
            let json = serde_json::to_string_pretty(&ledger)
                .context("failed to serialize ledger")?;
            println!("{json}");
        }
    }

    Ok(())
}
