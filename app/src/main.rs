// In app/src/main.rs

use anyhow::{Context, Result};
use api_client::ApiClient;
use app_config::Settings;
use clap::{Parser, Subcommand};
use core_types::{Side, Timeframe};
use engine::{CycleDriver, TradingTask};
use execution::{Gateway, LiveGateway, MarketFeed, SimulatedGateway};
use std::sync::Arc;
use tracing_subscriber::prelude::*;

mod render;

// --- Command-Line Interface Definition ---

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about,
    long_about = "A SuperTrend trading assistant for Binance futures."
)]
struct Cli {
    /// Overrides `trading.symbol` (e.g., "BTCUSDT").
    #[arg(short, long, global = true)]
    symbol: Option<String>,

    /// Overrides `trading.timeframe` (M1, M5, M15, M30, H1, H4, D1).
    #[arg(short, long, global = true)]
    timeframe: Option<Timeframe>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Evaluates the symbol at the configured cadence until interrupted.
    Run,

    /// Runs a single cycle and prints the rows and the decided orders.
    Evaluate {
        /// Submit the decided orders instead of only printing them.
        #[arg(long)]
        execute: bool,
    },

    /// Opens a long position at the current price, if none is open.
    Buy,

    /// Opens a short position at the current price, if none is open.
    Sell,

    /// Closes every open position on the symbol.
    CloseAll,

    /// Prints the account balance and floating profit.
    Account,
}

// --- Main Application Entry Point ---

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from a .env file, if it exists.
    dotenvy::dotenv().ok();

    // Parse command-line arguments.
    let cli = Cli::parse();

    let mut settings = app_config::load_settings().context("Failed to load settings")?;
    if let Some(symbol) = cli.symbol {
        settings.trading.symbol = symbol;
    }
    if let Some(timeframe) = cli.timeframe {
        settings.trading.timeframe = timeframe;
    }
    settings.validate()?;

    init_tracing(&settings)?;
    tracing::info!(
        environment = %settings.app.environment,
        symbol = %settings.trading.symbol,
        timeframe = %settings.trading.timeframe,
        "Starting SuperTrend assistant"
    );

    // Match on the parsed command and call the appropriate handler.
    match cli.command {
        Commands::Run => run_app(settings).await?,
        Commands::Evaluate { execute } => handle_evaluate(settings, execute).await?,
        Commands::Buy => handle_manual_entry(settings, Side::Long).await?,
        Commands::Sell => handle_manual_entry(settings, Side::Short).await?,
        Commands::CloseAll => handle_close_all(settings).await?,
        Commands::Account => handle_account(settings).await?,
    }

    Ok(())
}

fn init_tracing(settings: &Settings) -> Result<()> {
    let level: tracing::Level = settings
        .app
        .log_level
        .parse()
        .with_context(|| format!("Invalid app.log_level '{}'", settings.app.log_level))?;

    let fmt_layer = tracing_subscriber::fmt::layer().with_filter(
        tracing_subscriber::filter::Targets::new()
            .with_target("hyper", tracing::Level::WARN) // HTTP client internals are noise
            .with_target("reqwest", tracing::Level::WARN)
            .with_default(level),
    );
    tracing_subscriber::registry().with(fmt_layer).init();
    Ok(())
}

/// Builds the market feed and picks the gateway from `broker.live_trading_enabled`.
fn connect(settings: &Settings) -> Result<(Arc<dyn MarketFeed>, Arc<dyn Gateway>)> {
    let api_client = ApiClient::new(&settings.broker)?;

    let gateway: Arc<dyn Gateway> = if settings.broker.live_trading_enabled {
        tracing::warn!("LIVE TRADING IS ENABLED. REAL ORDERS WILL BE PLACED.");
        Arc::new(LiveGateway::new(api_client.clone()))
    } else {
        tracing::info!(
            balance = settings.simulation.initial_balance,
            "Paper trading: orders go to the simulated account."
        );
        Arc::new(SimulatedGateway::new(&settings.simulation)?)
    };

    let feed: Arc<dyn MarketFeed> = Arc::new(api_client);
    Ok((feed, gateway))
}

fn build_driver(settings: &Settings) -> Result<CycleDriver> {
    let (feed, gateway) = connect(settings)?;
    Ok(CycleDriver::from_settings(settings, feed, gateway)?)
}

// --- "Run" Subcommand Logic ---

/// Starts the cadence loop and, if enabled, the console renderer.
/// Runs until Ctrl-C.
async fn run_app(settings: Settings) -> Result<()> {
    let driver = build_driver(&settings)?;
    let gateway = Arc::clone(driver.gateway());
    let task = TradingTask::new(
        driver,
        settings.trading.cadence(),
        settings.trading.max_consecutive_failures,
    );

    let render_handle = settings.app.render.then(|| {
        tokio::spawn(render::run(
            task.subscribe_snapshots(),
            task.subscribe_events(),
            gateway,
        ))
    });

    let mut engine_handle = tokio::spawn(task.run());

    tokio::select! {
        engine_result = &mut engine_handle => {
            tracing::error!(?engine_result, "Trading task has terminated unexpectedly.");
            anyhow::bail!("The trading task terminated. Shutting down.");
        }
        signal = tokio::signal::ctrl_c() => {
            signal.context("Failed to listen for Ctrl-C")?;
            tracing::info!("Shutdown requested.");
        }
    }

    engine_handle.abort();
    if let Some(handle) = render_handle {
        handle.abort();
    }
    Ok(())
}

// --- One-shot Subcommands ---

async fn handle_evaluate(settings: Settings, execute: bool) -> Result<()> {
    let driver = build_driver(&settings)?;
    let mut snapshot = driver.evaluate().await?;

    if execute {
        driver.submit(&mut snapshot).await;
    } else if !snapshot.intents.is_empty() {
        tracing::info!(
            intents = snapshot.intents.len(),
            "Dry run: pass --execute to submit."
        );
    }

    print!("{}", render::format_snapshot(&snapshot, render::ROWS_SHOWN));
    println!("{}", render::format_account(&driver.gateway().account().await?));
    Ok(())
}

async fn handle_manual_entry(settings: Settings, side: Side) -> Result<()> {
    let driver = build_driver(&settings)?;
    let fill = driver.manual_entry(side).await?;
    println!("Placed: {}", render::format_fill(&fill));
    Ok(())
}

async fn handle_close_all(settings: Settings) -> Result<()> {
    let driver = build_driver(&settings)?;
    let fills = driver.close_all().await?;
    if fills.is_empty() {
        println!("No open positions to close.");
    }
    for fill in &fills {
        println!("Closed: {}", render::format_fill(fill));
    }
    Ok(())
}

async fn handle_account(settings: Settings) -> Result<()> {
    let (_, gateway) = connect(&settings)?;
    let account = gateway.account().await?;
    println!("--- Account ({}) ---", gateway.name());
    println!("{}", render::format_account(&account));
    Ok(())
}
