mod config;
mod error;
mod models;
mod quote;
mod ranking;
mod scoring;
mod validation;
mod valuation;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use config::AppConfig;
use models::{ComparisonRequest, ComparisonResponse, ComparisonResult, OfferInput, PreferenceWeights};
use quote::{LayeredPriceProvider, PriceProvider, PriceResolution, StaticPriceProvider, YahooFinanceProvider};
use std::io::Read;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "offers")]
#[command(about = "Compare job offers - value compensation packages and rank them by what matters to you")]
struct Cli {
    /// Extra TOML config file, applied over user and project config
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Never fetch prices from the network; only --price overrides resolve
    #[arg(long, global = true)]
    offline: bool,

    /// Fixed unit price for a symbol (repeatable), e.g. --price GOOGL=171.5
    #[arg(long = "price", value_name = "SYMBOL=PRICE", global = true, value_parser = quote::parse_price_override)]
    prices: Vec<(String, f64)>,

    /// Show debug logging
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,

    /// Only log errors
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Rank a batch of offers from a JSON comparison request
    Compare {
        /// Path to the request JSON, or '-' for stdin
        input: String,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,

        /// Number of offers to show (table output only)
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Value a single offer given on the command line
    Breakdown {
        /// Company name
        #[arg(long, default_value = "Offer")]
        company: String,

        /// Stock ticker for the equity grant
        #[arg(long, default_value = "")]
        symbol: String,

        /// Annual base salary (local currency)
        #[arg(long)]
        salary: f64,

        /// Target bonus as a percentage of base salary
        #[arg(long, default_value = "0")]
        bonus_percent: f64,

        /// One-time signing bonus (local currency)
        #[arg(long, default_value = "0")]
        signing_bonus: f64,

        /// Total equity grant over four years (foreign currency)
        #[arg(long, default_value = "0")]
        equity_grant: f64,

        /// Importance of year-1 cash (1-10)
        #[arg(long, default_value = "5")]
        year_1_cash: u8,

        /// Importance of four-year value (1-10)
        #[arg(long, default_value = "5")]
        four_year_value: u8,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,
    },

    /// Look up the current unit price for a ticker
    Quote {
        /// Ticker symbol, e.g. GOOGL or INFY.NS
        symbol: String,
    },

    /// Show the effective configuration
    Config,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Table,
    Json,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.quiet, cli.verbose)?;

    let config = AppConfig::load(cli.config.as_deref()).context("Failed to load configuration")?;

    match cli.command {
        Commands::Compare {
            input,
            format,
            limit,
        } => {
            let request = read_request(&input)?;
            let provider = build_provider(cli.offline, &cli.prices, &config)?;
            let response = ranking::compare_offers(&request, &provider, &config.valuation)?;

            match format {
                OutputFormat::Json => print_json(&response)?,
                OutputFormat::Table => {
                    let shown = limit.unwrap_or(response.results.len());
                    print_ranking(&response.results[..shown.min(response.results.len())]);
                    if shown < response.results.len() {
                        println!("({} more not shown)", response.results.len() - shown);
                    }
                    print_warnings(&response.warnings);
                }
            }
        }

        Commands::Breakdown {
            company,
            symbol,
            salary,
            bonus_percent,
            signing_bonus,
            equity_grant,
            year_1_cash,
            four_year_value,
            format,
        } => {
            let request = ComparisonRequest {
                offers: vec![OfferInput {
                    company_name: company,
                    equity_symbol: symbol,
                    base_salary: salary,
                    bonus_percent,
                    signing_bonus,
                    equity_grant_value: equity_grant,
                }],
                preferences: PreferenceWeights {
                    year_1_cash,
                    four_year_value,
                    ..PreferenceWeights::default()
                },
            };
            let provider = build_provider(cli.offline, &cli.prices, &config)?;
            let response = ranking::compare_offers(&request, &provider, &config.valuation)?;

            match format {
                OutputFormat::Json => print_json(&response)?,
                OutputFormat::Table => {
                    for result in &response.results {
                        print_breakdown(result);
                    }
                    print_warnings(&response.warnings);
                }
            }
        }

        Commands::Quote { symbol } => {
            let provider = build_provider(cli.offline, &cli.prices, &config)?;
            match quote::resolve_unit_price(&provider, &symbol) {
                PriceResolution::Resolved(unit) => {
                    println!("{}: {:.2} ({})", symbol.trim().to_uppercase(), unit.price, unit.source);
                }
                PriceResolution::Unknown(reason) => {
                    println!(
                        "No price found for '{}' ({}). Equity tied to it would be counted as zero.",
                        symbol, reason
                    );
                }
            }
        }

        Commands::Config => {
            if let Some(path) = AppConfig::user_config_path() {
                println!("# User config: {}", path.display());
            }
            let rendered = toml::to_string_pretty(&config).context("Failed to render configuration")?;
            print!("{}", rendered);
        }
    }

    Ok(())
}

fn init_tracing(quiet: bool, verbose: bool) -> Result<()> {
    let level = if quiet {
        "error"
    } else if verbose {
        "debug"
    } else {
        "warn"
    };

    let filter = tracing_subscriber::EnvFilter::try_from_env("OFFERS_LOG")
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|error| anyhow::anyhow!("Failed to initialize logging: {error}"))?;

    Ok(())
}

fn build_provider(
    offline: bool,
    overrides: &[(String, f64)],
    config: &AppConfig,
) -> Result<LayeredPriceProvider> {
    let fixed = overrides
        .iter()
        .fold(StaticPriceProvider::new(), |fixed, (symbol, price)| fixed.with_price(symbol, *price));

    let fallback: Option<Box<dyn PriceProvider>> = if offline {
        None
    } else {
        Some(Box::new(YahooFinanceProvider::new(&config.quotes)?))
    };

    Ok(LayeredPriceProvider::new(fixed, fallback))
}

fn read_request(input: &str) -> Result<ComparisonRequest> {
    let raw = if input == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("Failed to read request from stdin")?;
        buf
    } else {
        std::fs::read_to_string(input)
            .with_context(|| format!("Failed to read request file: {}", input))?
    };
    parse_request(&raw).with_context(|| format!("Invalid comparison request in {}", input))
}

fn parse_request(raw: &str) -> Result<ComparisonRequest> {
    Ok(serde_json::from_str(raw)?)
}

fn print_json(response: &ComparisonResponse) -> Result<()> {
    let json = serde_json::to_string_pretty(response).context("Failed to serialize results")?;
    println!("{}", json);
    Ok(())
}

fn print_ranking(results: &[ComparisonResult]) {
    println!(
        "{:<5} {:<20} {:<9} {:>12} {:>14} {:>14} {:>14} {:>9}",
        "RANK", "COMPANY", "SYMBOL", "MONTHLY", "YEAR 1", "4Y AVERAGE", "EQUITY", "SCORE"
    );
    println!("{}", "-".repeat(104));
    for (i, result) in results.iter().enumerate() {
        let offer = &result.input_offer;
        let f = &result.financials;
        println!(
            "{:<5} {:<20} {:<9} {:>12} {:>14} {:>14} {:>14} {:>9.2}",
            i + 1,
            truncate(&offer.company_name, 18),
            truncate(&offer.equity_symbol, 9),
            format_amount(f.monthly_take_home),
            format_amount(f.year_1_total_comp),
            format_amount(f.four_year_average_comp),
            format_amount(f.total_equity_value_local),
            result.alignment_score
        );
    }
}

fn print_breakdown(result: &ComparisonResult) {
    let offer = &result.input_offer;
    let f = &result.financials;
    println!("Offer: {}", offer.company_name);
    if !offer.equity_symbol.is_empty() {
        if result.equity_unit_price > 0.0 {
            println!("Equity symbol: {} @ {:.2}", offer.equity_symbol, result.equity_unit_price);
        } else {
            println!("Equity symbol: {} (price unknown)", offer.equity_symbol);
        }
    }
    println!("Monthly take-home:      {:>14}", format_amount(f.monthly_take_home));
    println!("Year 1 total comp:      {:>14}", format_amount(f.year_1_total_comp));
    println!("4-year average comp:    {:>14}", format_amount(f.four_year_average_comp));
    println!("Total equity (local):   {:>14}", format_amount(f.total_equity_value_local));
    println!("Alignment score:        {:>14.2}", result.alignment_score);
}

fn print_warnings(warnings: &[String]) {
    for warning in warnings {
        eprintln!("Warning: {}", warning);
    }
}

/// Whole amount with thousands separators, e.g. `-1,234,567`.
fn format_amount(value: f64) -> String {
    let whole = value.round_ties_even() as i64;
    let digits = whole.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    if whole < 0 {
        format!("-{}", grouped)
    } else {
        grouped
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
