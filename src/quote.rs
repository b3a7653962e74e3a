use anyhow::{Context, Result, anyhow};
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;

use crate::config::QuoteConfig;

// --- Provider trait ---

/// A unit price together with the provider layer that answered.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UnitPrice {
    pub price: f64,
    pub source: &'static str,
}

pub trait PriceProvider {
    /// Latest unit price for `symbol` in its native currency, `None` if the provider has no data.
    fn unit_price(&self, symbol: &str) -> Result<Option<UnitPrice>>;
    fn source_name(&self) -> &'static str;
}

#[derive(Debug, Clone, PartialEq)]
pub enum PriceResolution {
    Resolved(UnitPrice),
    Unknown(String), // why no usable price was found
}

impl PriceResolution {
    /// The resolved price, or the `0.0` "unknown" sentinel.
    pub fn price(&self) -> f64 {
        match self {
            PriceResolution::Resolved(quote) => quote.price,
            PriceResolution::Unknown(_) => 0.0,
        }
    }
}

/// Resolves a unit price, collapsing every failure into `PriceResolution::Unknown`.
///
/// A bad ticker must never abort a comparison. Failures are only logged at debug
/// level here; callers surface the reason to the user once.
pub fn resolve_unit_price(provider: &dyn PriceProvider, symbol: &str) -> PriceResolution {
    let symbol = symbol.trim();
    if symbol.is_empty() {
        tracing::debug!("no equity symbol given, skipping price lookup");
        return PriceResolution::Unknown("no equity symbol given".to_string());
    }

    let resolution = match provider.unit_price(symbol) {
        Ok(Some(quote)) if quote.price.is_finite() && quote.price > 0.0 => PriceResolution::Resolved(quote),
        Ok(Some(quote)) => {
            PriceResolution::Unknown(format!("{} returned an unusable price {}", quote.source, quote.price))
        }
        Ok(None) => PriceResolution::Unknown(format!("no price data from {}", provider.source_name())),
        Err(error) => PriceResolution::Unknown(format!("{} lookup failed: {error:#}", provider.source_name())),
    };

    match &resolution {
        PriceResolution::Resolved(quote) => {
            tracing::debug!(symbol, price = quote.price, source = quote.source, "resolved unit price");
        }
        PriceResolution::Unknown(reason) => {
            tracing::debug!(symbol, reason = reason.as_str(), "unit price unresolved");
        }
    }
    resolution
}

// --- Yahoo Finance provider ---

#[derive(Debug, Deserialize)]
struct ChartEnvelope {
    chart: Chart,
}

#[derive(Debug, Deserialize)]
struct Chart {
    result: Option<Vec<ChartResult>>,
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    meta: ChartMeta,
    #[serde(default)]
    indicators: Option<Indicators>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChartMeta {
    regular_market_price: Option<f64>,
    current_price: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    #[serde(default)]
    quote: Vec<QuoteSeries>,
}

#[derive(Debug, Deserialize)]
struct QuoteSeries {
    #[serde(default)]
    close: Vec<Option<f64>>,
}

/// Picks the regular-market price, falling back to the most recent daily close.
/// Non-positive prices count as missing at every step.
fn price_from_chart(envelope: ChartEnvelope) -> Result<Option<f64>> {
    if let Some(err) = envelope.chart.error {
        return Err(anyhow!("{}: {}", err.code, err.description));
    }

    let Some(result) = envelope.chart.result.and_then(|r| r.into_iter().next()) else {
        return Ok(None);
    };

    // Yahoo reports 0.0 for some halted or illiquid symbols
    let meta_price = result
        .meta
        .regular_market_price
        .filter(|p| *p > 0.0)
        .or(result.meta.current_price.filter(|p| *p > 0.0));
    if let Some(price) = meta_price {
        return Ok(Some(price));
    }

    let last_close = result
        .indicators
        .and_then(|ind| ind.quote.into_iter().next())
        .and_then(|series| series.close.into_iter().rev().flatten().find(|p| *p > 0.0));
    Ok(last_close)
}

#[derive(Debug)]
pub struct YahooFinanceProvider {
    base_url: String,
    client: reqwest::blocking::Client,
}

impl YahooFinanceProvider {
    pub fn new(config: &QuoteConfig) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(config.user_agent.clone())
            .build()
            .context("Failed to build HTTP client for quotes")?;
        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    fn chart_url(&self, symbol: &str) -> String {
        format!("{}/v8/finance/chart/{}", self.base_url, symbol)
    }
}

impl PriceProvider for YahooFinanceProvider {
    fn unit_price(&self, symbol: &str) -> Result<Option<UnitPrice>> {
        let response = self
            .client
            .get(self.chart_url(symbol))
            .query(&[("range", "5d"), ("interval", "1d")])
            .send()
            .with_context(|| format!("Failed to send quote request for {}", symbol))?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            let error_text = response.text().unwrap_or_default();
            return Err(anyhow!(
                "Quote request for {} failed with status {}: {}",
                symbol,
                status,
                error_text
            ));
        }

        let envelope: ChartEnvelope = response
            .json()
            .with_context(|| format!("Failed to parse quote response for {}", symbol))?;
        Ok(price_from_chart(envelope)?.map(|price| UnitPrice {
            price,
            source: self.source_name(),
        }))
    }

    fn source_name(&self) -> &'static str {
        "yahoo-finance"
    }
}

// --- Static provider (offline runs, overrides, tests) ---

#[derive(Debug, Clone, Default)]
pub struct StaticPriceProvider {
    prices: HashMap<String, f64>,
}

impl StaticPriceProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_price(mut self, symbol: &str, price: f64) -> Self {
        self.insert(symbol, price);
        self
    }

    pub fn insert(&mut self, symbol: &str, price: f64) {
        self.prices.insert(symbol.trim().to_uppercase(), price);
    }

    pub fn get(&self, symbol: &str) -> Option<f64> {
        self.prices.get(&symbol.trim().to_uppercase()).copied()
    }
}

impl PriceProvider for StaticPriceProvider {
    fn unit_price(&self, symbol: &str) -> Result<Option<UnitPrice>> {
        Ok(self.get(symbol).map(|price| UnitPrice {
            price,
            source: self.source_name(),
        }))
    }

    fn source_name(&self) -> &'static str {
        "static"
    }
}

/// Consults fixed overrides first, then the fallback provider if there is one.
///
/// Each answer carries the source of the layer that produced it; `source_name`
/// names the last layer consulted.
pub struct LayeredPriceProvider {
    overrides: StaticPriceProvider,
    fallback: Option<Box<dyn PriceProvider>>,
}

impl LayeredPriceProvider {
    pub fn new(overrides: StaticPriceProvider, fallback: Option<Box<dyn PriceProvider>>) -> Self {
        Self { overrides, fallback }
    }
}

impl PriceProvider for LayeredPriceProvider {
    fn unit_price(&self, symbol: &str) -> Result<Option<UnitPrice>> {
        if let Some(quote) = self.overrides.unit_price(symbol)? {
            return Ok(Some(quote));
        }
        match &self.fallback {
            Some(provider) => provider.unit_price(symbol),
            None => Ok(None),
        }
    }

    fn source_name(&self) -> &'static str {
        match &self.fallback {
            Some(provider) => provider.source_name(),
            None => "static",
        }
    }
}

/// Parses a `SYMBOL=PRICE` override as given on the command line.
pub fn parse_price_override(raw: &str) -> Result<(String, f64)> {
    let (symbol, price) = raw
        .rsplit_once('=')
        .ok_or_else(|| anyhow!("Expected SYMBOL=PRICE, got '{}'", raw))?;
    let symbol = symbol.trim();
    if symbol.is_empty() {
        return Err(anyhow!("Missing symbol in price override '{}'", raw));
    }
    let price: f64 = price
        .trim()
        .parse()
        .with_context(|| format!("Invalid price in override '{}'", raw))?;
    if !price.is_finite() || price < 0.0 {
        return Err(anyhow!("Price in override '{}' must be a non-negative number", raw));
    }
    Ok((symbol.to_string(), price))
}
