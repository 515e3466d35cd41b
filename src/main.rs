use analytics::{
    AnalyticsError, SortDirection, SortKey, TransactionQuery, agent_highlights,
    derive_agent_performance, derive_agent_profile, derive_market_summary, derive_sector_metrics,
    final_day_leaderboard, group_news_by_day, sector_price_traces,
};
use api_client::error::ApiError;
use api_client::{HttpSimulationClient, ResultRepository, SimulationApi};
use clap::{Args, Parser, Subcommand};
use configuration::{ConfigError, RunConfig, Settings};
use core_types::{ErrorShape, RunPhase};
use indicatif::{ProgressBar, ProgressStyle};
use lifecycle::{ControllerOptions, LifecycleError, RunController, RunStore, SubmissionMode};
use rust_decimal::Decimal;
use std::fmt;
use std::process::ExitCode;
use std::sync::Arc;

mod views;

/// The main entry point for the Marketview dashboard.
#[tokio::main]
async fn main() -> ExitCode {
    // A .env file is optional; it only supplies MARKETVIEW__* overrides.
    dotenvy::dotenv().ok();

    // Parse command-line arguments
    let cli = Cli::parse();

    let settings = match configuration::load_settings() {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("{}\n  {}", e.shape().headline(), e);
            return ExitCode::FAILURE;
        }
    };

    // Held until exit so buffered file logs are flushed.
    let _log_guard = match configuration::init_tracing(&settings.logging) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("{e}");
            return ExitCode::FAILURE;
        }
    };

    // Execute the appropriate command
    match dispatch(cli.command, settings).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = ?e, "Command failed");
            eprintln!("{}\n  {}", shape_of(&e).headline(), e);
            ExitCode::FAILURE
        }
    }
}

// ==============================================================================
// CLI Structure
// ==============================================================================

/// Terminal dashboard for multi-agent market simulation runs.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Submit a simulation run, follow it to completion and show the results.
    Run(RunArgs),
    /// Show what the backend is doing right now.
    Status,
    /// Per-agent performance with the headline cards.
    Agents,
    /// Detail view of a single agent.
    Agent(AgentArgs),
    /// Agents ranked by total value on the final day.
    Leaderboard,
    /// Market-wide summary and per-sector price paths.
    Market,
    /// Per-sector volatility and net trading pressure.
    Sectors,
    /// Generated news, grouped by day.
    News,
}

#[derive(Args)]
struct RunArgs {
    /// Number of days to simulate (1-365).
    #[arg(long)]
    days: Option<u32>,

    /// Agent strategy to include. Repeat to select several; replaces the configured set.
    #[arg(long = "agent")]
    agents: Vec<String>,

    /// Opening price override as SECTOR=PRICE. Repeatable.
    #[arg(long = "price")]
    prices: Vec<String>,

    /// Price shock multiplier (0-5).
    #[arg(long)]
    volatility: Option<Decimal>,

    /// Skip news generation for this run.
    #[arg(long)]
    no_news: bool,
}

impl RunArgs {
    /// Layers the command-line overrides on top of the configured defaults.
    fn apply(&self, config: &mut RunConfig) -> Result<(), ConfigError> {
        if let Some(days) = self.days {
            config.num_days = days;
        }
        if !self.agents.is_empty() {
            config.agents = self.agents.clone();
        }
        for pair in &self.prices {
            config.set_price(pair)?;
        }
        if let Some(volatility) = self.volatility {
            config.volatility = volatility;
        }
        if self.no_news {
            config.news_enabled = false;
        }
        Ok(())
    }
}

#[derive(Args)]
struct AgentArgs {
    /// Agent name as it appears in the snapshots, e.g. MomentumAgent.
    name: String,

    /// Only show trades whose sector or action contains this text.
    #[arg(long)]
    filter: Option<String>,

    /// Sort trades by day, sector, action, price or qty.
    #[arg(long, default_value = "day")]
    sort: SortKey,

    /// Sort ascending instead of newest/largest first.
    #[arg(long)]
    asc: bool,
}

// ==============================================================================
// Command Logic
// ==============================================================================

async fn dispatch(command: Commands, settings: Settings) -> anyhow::Result<()> {
    let client = Arc::new(HttpSimulationClient::new(&settings.api)?);

    match command {
        Commands::Run(args) => handle_run(args, &settings, client).await,
        Commands::Status => {
            let status = client.status().await?;
            views::print_status(&status);
            Ok(())
        }
        Commands::Agents => handle_agents(client.as_ref()).await,
        Commands::Agent(args) => handle_agent(args, client.as_ref()).await,
        Commands::Leaderboard => {
            let snapshots = client.fetch_snapshots().await?;
            println!("{}", views::leaderboard_table(&final_day_leaderboard(&snapshots)?));
            Ok(())
        }
        Commands::Market => handle_market(client.as_ref()).await,
        Commands::Sectors => {
            let (history, transactions) =
                futures::try_join!(client.fetch_price_history(), client.fetch_transactions())?;
            println!("{}", views::sector_table(&derive_sector_metrics(&history, &transactions)?));
            Ok(())
        }
        Commands::News => {
            let news = client.fetch_news().await?;
            views::print_news(&group_news_by_day(&news));
            Ok(())
        }
    }
}

/// Submits a run and follows it on a progress bar until the backend settles.
async fn handle_run(
    args: RunArgs,
    settings: &Settings,
    client: Arc<HttpSimulationClient>,
) -> anyhow::Result<()> {
    let mut config = settings.run.clone();
    args.apply(&mut config)?;

    let controller = RunController::new(
        client.clone(),
        RunStore::new(),
        ControllerOptions::from(&settings.polling),
    );
    let mut updates = controller.subscribe();

    controller.start(&config).await?;
    if controller.state().submission == SubmissionMode::LocalFallback {
        println!("Backend did not accept the job; continuing in local fallback mode.");
    }

    // Set up the progress bar
    let progress_bar = ProgressBar::new(u64::from(config.num_days));
    progress_bar.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} days {msg}")?
            .progress_chars("#>-"),
    );
    progress_bar.enable_steady_tick(std::time::Duration::from_millis(120));

    let state = loop {
        let state = updates.borrow_and_update().clone();
        progress_bar.set_position(u64::from(state.last_known_day));
        progress_bar.set_message(state.progress_label.clone().unwrap_or_default());
        if state.phase != RunPhase::Running || updates.changed().await.is_err() {
            break state;
        }
    };

    match state.phase {
        RunPhase::Complete => {
            progress_bar.finish_with_message("Simulation complete!");
            handle_agents(client.as_ref()).await?;
            handle_market(client.as_ref()).await
        }
        _ => {
            progress_bar.abandon_with_message("Simulation failed.");
            let message = state.error.unwrap_or_else(|| "run ended unexpectedly".to_string());
            Err(RunFailed(message).into())
        }
    }
}

async fn handle_agents(repo: &dyn ResultRepository) -> anyhow::Result<()> {
    let snapshots = repo.fetch_snapshots().await?;
    let performances = derive_agent_performance(&snapshots)?;
    if let Some(highlights) = agent_highlights(&performances) {
        views::print_highlights(&highlights);
    }
    println!("{}", views::performance_table(&performances));
    Ok(())
}

async fn handle_agent(args: AgentArgs, repo: &dyn ResultRepository) -> anyhow::Result<()> {
    let (snapshots, transactions, params) = futures::try_join!(
        repo.fetch_snapshots(),
        repo.fetch_transactions(),
        repo.fetch_agent_params(),
    )?;
    let profile = derive_agent_profile(&snapshots, &transactions, &args.name)?;

    let query = TransactionQuery {
        search: args.filter,
        sort_by: args.sort,
        direction: if args.asc {
            SortDirection::Ascending
        } else {
            SortDirection::Descending
        },
    };
    views::print_profile(&profile, params.get(&profile.name), &query.apply(&profile.trades));
    Ok(())
}

async fn handle_market(repo: &dyn ResultRepository) -> anyhow::Result<()> {
    let history = repo.fetch_price_history().await?;
    let summary = derive_market_summary(&history)?;
    let traces = sector_price_traces(&history)?;
    views::print_market(&summary, &traces);
    Ok(())
}

// ==============================================================================
// Error Presentation
// ==============================================================================

/// A run that ended in FAILED, carrying the message the lifecycle recorded.
#[derive(Debug)]
struct RunFailed(String);

impl fmt::Display for RunFailed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for RunFailed {}

fn shape_of(error: &anyhow::Error) -> ErrorShape {
    if let Some(e) = error.downcast_ref::<ApiError>() {
        e.shape()
    } else if let Some(e) = error.downcast_ref::<AnalyticsError>() {
        e.shape()
    } else if let Some(e) = error.downcast_ref::<LifecycleError>() {
        e.shape()
    } else if let Some(e) = error.downcast_ref::<ConfigError>() {
        e.shape()
    } else if error.downcast_ref::<core_types::CoreError>().is_some() {
        ErrorShape::MalformedInput
    } else {
        ErrorShape::RunFailed
    }
}
