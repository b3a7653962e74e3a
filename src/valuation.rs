//! Offer valuation: equity conversion, flat-rate tax, multi-year aggregation.
//!
//! Salary and bonus are assumed flat across the horizon. The signing bonus and
//! the equity grant are each counted once.

use crate::config::ValuationConfig;
use crate::models::{FinancialBreakdown, OfferInput};

/// Equity grants vest evenly over this many years; also the compensation horizon.
pub const VESTING_YEARS: f64 = 4.0;

const MONTHS_PER_YEAR: f64 = 12.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EquityValue {
    pub total_local: f64,
    pub yearly_local: f64,
}

/// Converts a grant to local currency. An unresolved price (`0.0`) zeroes the
/// grant; any resolved price leaves it untouched since grants are quoted as a
/// total value, not a share count.
pub fn equity_value(grant_value: f64, unit_price: f64, config: &ValuationConfig) -> EquityValue {
    if unit_price <= 0.0 {
        return EquityValue {
            total_local: 0.0,
            yearly_local: 0.0,
        };
    }
    let total_local = grant_value * config.fx_rate;
    EquityValue {
        total_local,
        yearly_local: total_local / VESTING_YEARS,
    }
}

/// Salary after the flat tax. Taxable income is not floored at zero, so
/// salaries below the standard deduction come out above gross.
pub fn yearly_take_home(base_salary: f64, config: &ValuationConfig) -> f64 {
    let taxable_income = base_salary - config.standard_deduction;
    let total_tax = taxable_income * config.flat_tax_rate;
    base_salary - total_tax
}

pub fn calculate_financial_breakdown(
    offer: &OfferInput,
    unit_price: f64,
    config: &ValuationConfig,
) -> FinancialBreakdown {
    let equity = equity_value(offer.equity_grant_value, unit_price, config);
    let take_home = yearly_take_home(offer.base_salary, config);
    let year_1_bonus = offer.base_salary * (offer.bonus_percent / 100.0);

    let year_1_total_comp = take_home + offer.signing_bonus + year_1_bonus + equity.yearly_local;
    let four_year_total_comp = take_home * VESTING_YEARS
        + offer.signing_bonus
        + year_1_bonus * VESTING_YEARS
        + equity.total_local;

    FinancialBreakdown {
        monthly_take_home: round_whole(take_home / MONTHS_PER_YEAR),
        year_1_total_comp: round_whole(year_1_total_comp),
        four_year_average_comp: round_whole(four_year_total_comp / VESTING_YEARS),
        total_equity_value_local: round_whole(equity.total_local),
    }
}

/// Rounds to whole currency units, halves to even.
pub fn round_whole(value: f64) -> f64 {
    value.round_ties_even()
}
