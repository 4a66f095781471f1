use std::error::Error;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use log::{debug, info, warn};

use macro_strategist::{
    DeepSeekClient,
    GlobalMacroLoader,
    MacroConfig,
    MacroStrategist,
    Report,
    YahooFinanceClient,
};

/// Rows of raw prices shown to the model.
const RECENT_ROWS: usize = 5;

#[derive(Parser, Debug)]
#[command(author, version, about = "Global macro strategy report from market proxies", long_about = None)]
struct Cli {
    /// Debug logging for this crate
    #[arg(long, default_value_t = false)]
    verbose: bool,

    /// Env file to load instead of ./.env
    #[arg(long)]
    config_file: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Load environment variables
    let env_loaded = match &cli.config_file {
        Some(path) => dotenv::from_path(path).map_err(|e| format!("{}: {}", path.display(), e)),
        None => dotenv::dotenv().map(|_| ()).map_err(|e| e.to_string()),
    };

    init_logging(cli.verbose);
    if let (Err(e), Some(_)) = (&env_loaded, &cli.config_file) {
        warn!("Could not load config file {}", e);
    }

    println!("🚀 Starting global macro analysis...");

    match run().await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("❌ Run failed: {}", e);
            let mut source = e.source();
            while let Some(cause) = source {
                eprintln!("  caused by: {}", cause);
                source = cause.source();
            }
            ExitCode::FAILURE
        }
    }
}

fn init_logging(verbose: bool) {
    let default_filter = if verbose {
        "info,macro_strategist=debug"
    } else {
        "info"
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter)).init();
}

async fn run() -> Result<ExitCode, Box<dyn Error>> {
    let config = MacroConfig::from_env()?;
    println!("✅ Configuration loaded: {}", config.describe());

    let loader = GlobalMacroLoader::new(config.clone(), YahooFinanceClient::new());
    let Some(market_data) = loader.fetch_combined_data().await else {
        println!("❌ Unable to fetch market data");
        return Ok(ExitCode::FAILURE);
    };

    let summary = loader.get_market_summary(Some(&market_data));
    println!("📊 Market summary: {}", summary);

    let metrics = loader.calculate_metrics(&market_data);
    if metrics.is_empty() {
        warn!("No metrics available, continuing with an empty metrics set");
    }
    debug!("Metrics: {}", serde_json::to_string(&metrics.named_values())?);

    let strategist = MacroStrategist::new(config.clone(), DeepSeekClient::new(&config));
    let recent = market_data.tail(RECENT_ROWS);

    match strategist.generate_strategy_report(&metrics, &recent).await {
        Some(raw_report) => {
            let report = Report::new(raw_report, metrics);
            let rule = "=".repeat(80);
            println!("\n{}\n{}\n{}\n", rule, report.display(), rule);
        }
        None => println!("❌ Strategy report generation failed"),
    }

    info!("Run complete");
    Ok(ExitCode::SUCCESS)
}
