use serde::{Deserialize, Serialize};

const fn default_weight() -> u8 {
    5
}

/// Every amount is required; a missing or misspelled key must not silently become zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OfferInput {
    pub company_name: String,
    #[serde(default, alias = "stock_ticker")]
    pub equity_symbol: String, // empty for private companies
    pub base_salary: f64,      // annual, local currency
    pub bonus_percent: f64,    // e.g. 15.0 for 15%
    #[serde(alias = "joining_bonus")]
    pub signing_bonus: f64, // one-time, local currency
    #[serde(alias = "rsu_grant_usd")]
    pub equity_grant_value: f64, // foreign currency, vests over four years
}

/// How much each decision criterion matters to the user, on a 1-10 scale.
///
/// Only `year_1_cash` and `four_year_value` feed the alignment score today;
/// the other two are validated and carried through untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreferenceWeights {
    #[serde(default = "default_weight")]
    pub year_1_cash: u8,
    #[serde(default = "default_weight")]
    pub four_year_value: u8,
    #[serde(default = "default_weight")]
    pub work_life_balance: u8,
    #[serde(default = "default_weight")]
    pub career_growth: u8,
}

impl Default for PreferenceWeights {
    fn default() -> Self {
        Self {
            year_1_cash: default_weight(),
            four_year_value: default_weight(),
            work_life_balance: default_weight(),
            career_growth: default_weight(),
        }
    }
}

impl PreferenceWeights {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 10;

    pub fn fields(&self) -> [(&'static str, u8); 4] {
        [
            ("year_1_cash", self.year_1_cash),
            ("four_year_value", self.four_year_value),
            ("work_life_balance", self.work_life_balance),
            ("career_growth", self.career_growth),
        ]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FinancialBreakdown {
    pub monthly_take_home: f64,
    pub year_1_total_comp: f64,
    pub four_year_average_comp: f64,
    pub total_equity_value_local: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonResult {
    pub input_offer: OfferInput,
    pub financials: FinancialBreakdown,
    pub alignment_score: f64,
    pub equity_unit_price: f64, // 0 when the price could not be resolved
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonRequest {
    pub offers: Vec<OfferInput>,
    #[serde(default)]
    pub preferences: PreferenceWeights,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComparisonResponse {
    pub results: Vec<ComparisonResult>,
    #[serde(default)]
    pub warnings: Vec<String>,
    pub generated_at: String,
}
