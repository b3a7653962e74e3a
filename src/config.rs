//! Layered configuration for the valuation constants and the quote provider.
//!
//! Sources, highest priority last:
//! 1. Built-in defaults
//! 2. User config `<config dir>/offers/config.toml`
//! 3. Project config `./offers.toml`
//! 4. An explicit `--config` file
//! 5. `OFFERS_*` environment variables, `__` between section and key
//!    (`OFFERS_VALUATION__FX_RATE=84`)

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::ConfigError;

const PROJECT_CONFIG_FILE: &str = "offers.toml";

/// Constants of the valuation and scoring formulas. Fixed for a run, never per request.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ValuationConfig {
    /// Single flat rate approximating a high-income bracket.
    pub flat_tax_rate: f64,
    /// Subtracted from base salary before tax. Not floored at zero.
    pub standard_deduction: f64,
    /// Foreign currency (equity grant) to local currency.
    pub fx_rate: f64,
    /// Scales compensation down before it is multiplied by a 1-10 weight.
    pub score_divisor: f64,
}

impl Default for ValuationConfig {
    fn default() -> Self {
        Self {
            flat_tax_rate: 0.30,
            standard_deduction: 50_000.0,
            fx_rate: 83.0,
            score_divisor: 100_000.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct QuoteConfig {
    pub base_url: String,
    pub timeout_secs: u64,
    pub user_agent: String,
}

impl Default for QuoteConfig {
    fn default() -> Self {
        Self {
            base_url: "https://query1.finance.yahoo.com".to_string(),
            timeout_secs: 10,
            user_agent: format!("offers/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct AppConfig {
    #[serde(default)]
    pub valuation: ValuationConfig,
    #[serde(default)]
    pub quotes: QuoteConfig,
}

impl AppConfig {
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        Self::load_layered(Self::user_config_path().as_deref(), explicit)
    }

    /// Like [`AppConfig::load`], with the user config file given instead of looked up.
    pub fn load_layered(user: Option<&Path>, explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let config: Self = Self::figment(user, explicit)?.extract()?;
        config.validate()?;
        Ok(config)
    }

    fn figment(user: Option<&Path>, explicit: Option<&Path>) -> Result<Figment, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Some(user_path) = user.filter(|path| path.exists()) {
            figment = figment.merge(Toml::file(user_path));
        }

        let project_path = PathBuf::from(PROJECT_CONFIG_FILE);
        if project_path.exists() {
            figment = figment.merge(Toml::file(project_path));
        }

        if let Some(path) = explicit {
            if !path.exists() {
                return Err(ConfigError::InvalidValue {
                    field: "--config".to_string(),
                    reason: format!("file not found: {}", path.display()),
                });
            }
            figment = figment.merge(Toml::file(path));
        }

        Ok(figment.merge(Env::prefixed("OFFERS_").split("__")))
    }

    pub fn user_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "offers")
            .map(|dirs| dirs.config_dir().join("config.toml"))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |field: &str, reason: &str| ConfigError::InvalidValue {
            field: field.to_string(),
            reason: reason.to_string(),
        };
        let v = &self.valuation;

        if !(0.0..=1.0).contains(&v.flat_tax_rate) {
            return Err(invalid("valuation.flat_tax_rate", "must be between 0 and 1"));
        }
        if !v.standard_deduction.is_finite() || v.standard_deduction < 0.0 {
            return Err(invalid("valuation.standard_deduction", "must be a non-negative number"));
        }
        if !v.fx_rate.is_finite() || v.fx_rate <= 0.0 {
            return Err(invalid("valuation.fx_rate", "must be greater than 0"));
        }
        if !v.score_divisor.is_finite() || v.score_divisor <= 0.0 {
            return Err(invalid("valuation.score_divisor", "must be greater than 0"));
        }
        if self.quotes.base_url.trim().is_empty() {
            return Err(invalid("quotes.base_url", "must not be empty"));
        }
        if self.quotes.timeout_secs == 0 {
            return Err(invalid("quotes.timeout_secs", "must be at least 1"));
        }
        Ok(())
    }
}
