//! crashscope command line.
//!
//! Every analysis reads its settings from the environment (and `.env`), then
//! applies the overrides given on the command line. Rows go to `--output`
//! (CSV, or JSON for a `.json` path) or to stdout as CSV. Logs go to stderr.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use crashscope::application::analysis::{
    BasisSurvey, CandleInspection, CatalogListing, DailyVolatilityProfile, IntradayDropScan,
    NotionalVolumeSurvey, VolatilityBaselineStudy,
};
use crashscope::application::catalog::InstrumentFilter;
use crashscope::config::{AnalysisConfig, parse_day};
use crashscope::domain::market::TableIdentifier;
use crashscope::domain::ports::StoreConnector;
use crashscope::infrastructure::export;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{Level, info};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;

#[derive(Parser)]
#[command(author, version, about = "Flash-crash candle analysis over per-exchange stores", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Reference exchange (overrides REFERENCE_EXCHANGE)
    #[arg(long, global = true)]
    reference: Option<String>,

    /// Comma-separated exchanges to survey (overrides EXCHANGES)
    #[arg(long, global = true)]
    exchanges: Option<String>,

    /// Window start, e.g. "2025-10-10 21:09:00"; empty opens the window
    #[arg(long, global = true)]
    start: Option<String>,

    /// Window end; empty opens the window
    #[arg(long, global = true)]
    end: Option<String>,

    /// Target day (YYYY-MM-DD)
    #[arg(long, global = true)]
    target_day: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Rank reference spot markets by intraday drop on the target day
    Drops {
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Sum USD notional volume per market across exchanges in the event window
    Volume {
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Per-exchange totals
        #[arg(long)]
        summary: Option<PathBuf>,

        /// Exchanges surveyed at once
        #[arg(long)]
        concurrency: Option<usize>,
    },
    /// Z-score the target day's median candle move against prior history
    Baseline {
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Median candle range per UTC day over the full history
    Volatility {
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Derivative basis against reference spot in the event window
    Basis {
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Median basis per exchange and timestamp
        #[arg(long)]
        summary: Option<PathBuf>,
    },
    /// Dump one table's candles and report gaps
    Inspect {
        /// Full table name, e.g. binance_render_usdt_1m
        #[arg(short, long)]
        table: String,

        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Gap report
        #[arg(long)]
        gaps: Option<PathBuf>,
    },
    /// List the classified markets of one exchange
    Catalog {
        #[arg(short, long)]
        exchange: String,

        #[arg(long, value_enum, default_value_t = FilterArg::All)]
        filter: FilterArg,

        /// List day-level tables instead of event-window tables
        #[arg(long)]
        daily: bool,

        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum FilterArg {
    All,
    Spot,
    Derivative,
}

impl From<FilterArg> for InstrumentFilter {
    fn from(arg: FilterArg) -> Self {
        match arg {
            FilterArg::All => InstrumentFilter::All,
            FilterArg::Spot => InstrumentFilter::Spot,
            FilterArg::Derivative => InstrumentFilter::Derivative,
        }
    }
}

impl Cli {
    fn apply(&self, config: &mut AnalysisConfig) -> Result<()> {
        if let Some(reference) = &self.reference {
            config.market.reference_exchange = reference.trim().to_lowercase();
        }
        if let Some(exchanges) = &self.exchanges {
            config.market.exchanges = exchanges
                .split(',')
                .map(|s| s.trim().to_lowercase())
                .filter(|s| !s.is_empty())
                .collect();
        }
        if let Some(start) = &self.start {
            config.window.start = Some(start.trim().to_string()).filter(|s| !s.is_empty());
        }
        if let Some(end) = &self.end {
            config.window.end = Some(end.trim().to_string()).filter(|s| !s.is_empty());
        }
        if let Some(day) = &self.target_day {
            config.window.target_day = parse_day(day).context("Invalid --target-day")?;
        }
        config.event_window()?;
        Ok(())
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr);
    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive(Level::INFO.into()))
        .with(fmt_layer)
        .init();

    let cli = Cli::parse();
    let mut config = AnalysisConfig::from_env()?;
    cli.apply(&mut config)?;

    info!("crashscope v{} starting...", env!("CARGO_PKG_VERSION"));
    let connector: Arc<dyn StoreConnector> = Arc::new(config.connector());

    match cli.command {
        Commands::Drops { output } => {
            let rows = IntradayDropScan::from_config(connector, &config).run().await?;
            export::emit(output.as_deref(), &rows)?;
        }
        Commands::Volume {
            output,
            summary,
            concurrency,
        } => {
            let mut survey = NotionalVolumeSurvey::from_config(connector, &config)?;
            if let Some(n) = concurrency {
                survey = survey.with_concurrency(n);
            }
            let report = survey.run().await?;
            info!(
                "Total USD volume: spot {:.2}, derivatives {:.2}, all {:.2}",
                report.totals.spot,
                report.totals.derivative,
                report.totals.total()
            );
            export::emit(output.as_deref(), &report.rows)?;
            if let Some(path) = summary {
                export::write_rows(&path, &report.exchanges)?;
            }
        }
        Commands::Baseline { output } => {
            let rows = VolatilityBaselineStudy::from_config(connector, &config)
                .run()
                .await?;
            export::emit(output.as_deref(), &rows)?;
        }
        Commands::Volatility { output } => {
            let report = DailyVolatilityProfile::from_config(connector, &config)
                .run()
                .await?;
            export::emit(output.as_deref(), &report.rows)?;
        }
        Commands::Basis { output, summary } => {
            let report = BasisSurvey::from_config(connector, &config)?.run().await?;
            export::emit(output.as_deref(), &report.records)?;
            if let Some(path) = summary {
                export::write_rows(&path, &report.summary)?;
            }
        }
        Commands::Inspect {
            table,
            output,
            gaps,
        } => {
            let table = TableIdentifier::new(table)?;
            let report = CandleInspection::new(connector, table, config.event_window()?)?
                .run()
                .await?;
            export::emit(output.as_deref(), &report.candles)?;
            if let Some(path) = gaps {
                export::write_rows(&path, &report.gaps)?;
            }
        }
        Commands::Catalog {
            exchange,
            filter,
            daily,
            output,
        } => {
            let catalog = if daily {
                config.daily_catalog()
            } else {
                config.window_catalog()
            };
            let rows = CatalogListing::new(connector, catalog)
                .run(&exchange.to_lowercase(), filter.into())
                .await?;
            export::emit(output.as_deref(), &rows)?;
        }
    }

    Ok(())
}
