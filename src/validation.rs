use regex::Regex;
use std::sync::LazyLock;

use crate::error::CompareError;
use crate::models::{ComparisonRequest, OfferInput, PreferenceWeights};

// Covers plain tickers plus exchange suffixes and index/FX forms: INFY.NS, BRK-B, ^GSPC, USDINR=X
static SYMBOL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9.\-\^=]{1,15}$").expect("valid symbol pattern"));

pub fn validate_request(request: &ComparisonRequest) -> Result<(), CompareError> {
    if request.offers.is_empty() {
        return Err(CompareError::EmptyBatch);
    }
    for (index, offer) in request.offers.iter().enumerate() {
        validate_offer(index, offer)?;
    }
    validate_preferences(&request.preferences)
}

pub fn validate_offer(index: usize, offer: &OfferInput) -> Result<(), CompareError> {
    let invalid = |field: &'static str, reason: &str| CompareError::Validation {
        offer: Some(index),
        field,
        reason: reason.to_string(),
    };

    let amounts = [
        ("base_salary", offer.base_salary),
        ("bonus_percent", offer.bonus_percent),
        ("signing_bonus", offer.signing_bonus),
        ("equity_grant_value", offer.equity_grant_value),
    ];
    for (field, value) in amounts {
        if !value.is_finite() {
            return Err(invalid(field, "must be a finite number"));
        }
    }

    if offer.base_salary <= 0.0 {
        return Err(invalid("base_salary", "must be greater than 0"));
    }
    for (field, value) in &amounts[1..] {
        if *value < 0.0 {
            return Err(invalid(*field, "must not be negative"));
        }
    }

    let symbol = offer.equity_symbol.trim();
    if !symbol.is_empty() && !SYMBOL_RE.is_match(symbol) {
        return Err(invalid(
            "equity_symbol",
            "must be 1-15 characters of letters, digits, '.', '-', '^' or '='",
        ));
    }

    Ok(())
}

pub fn validate_preferences(prefs: &PreferenceWeights) -> Result<(), CompareError> {
    let range = PreferenceWeights::MIN..=PreferenceWeights::MAX;
    for (field, value) in prefs.fields() {
        if !range.contains(&value) {
            return Err(CompareError::Validation {
                offer: None,
                field,
                reason: format!(
                    "must be between {} and {}, got {}",
                    PreferenceWeights::MIN,
                    PreferenceWeights::MAX,
                    value
                ),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn offer() -> OfferInput {
        OfferInput {
            company_name: "Initech".to_string(),
            equity_symbol: "INTC".to_string(),
            base_salary: 3_000_000.0,
            bonus_percent: 10.0,
            signing_bonus: 100_000.0,
            equity_grant_value: 20_000.0,
        }
    }

    fn field_of(err: CompareError) -> (&'static str, Option<usize>) {
        match err {
            CompareError::Validation { field, offer, .. } => (field, offer),
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_valid_request_passes() {
        let request = ComparisonRequest {
            offers: vec![offer(), offer()],
            preferences: PreferenceWeights::default(),
        };
        assert!(validate_request(&request).is_ok());
    }

    #[test]
    fn test_empty_batch_rejected() {
        let request = ComparisonRequest {
            offers: vec![],
            preferences: PreferenceWeights::default(),
        };
        assert_eq!(validate_request(&request), Err(CompareError::EmptyBatch));
    }

    #[test]
    fn test_zero_salary_rejected() {
        let mut bad = offer();
        bad.base_salary = 0.0;
        let err = validate_offer(3, &bad).unwrap_err();
        assert_eq!(field_of(err), ("base_salary", Some(3)));
    }

    #[test]
    fn test_negative_amounts_rejected() {
        let mut bad = offer();
        bad.bonus_percent = -1.0;
        assert_eq!(field_of(validate_offer(0, &bad).unwrap_err()).0, "bonus_percent");

        let mut bad = offer();
        bad.signing_bonus = -0.01;
        assert_eq!(field_of(validate_offer(0, &bad).unwrap_err()).0, "signing_bonus");

        let mut bad = offer();
        bad.equity_grant_value = -5.0;
        assert_eq!(field_of(validate_offer(0, &bad).unwrap_err()).0, "equity_grant_value");
    }

    #[test]
    fn test_zero_optional_amounts_allowed() {
        let mut ok = offer();
        ok.bonus_percent = 0.0;
        ok.signing_bonus = 0.0;
        ok.equity_grant_value = 0.0;
        assert!(validate_offer(0, &ok).is_ok());
    }

    #[test]
    fn test_non_finite_rejected() {
        let mut bad = offer();
        bad.base_salary = f64::INFINITY;
        assert_eq!(field_of(validate_offer(0, &bad).unwrap_err()).0, "base_salary");

        let mut bad = offer();
        bad.signing_bonus = f64::NAN;
        assert_eq!(field_of(validate_offer(0, &bad).unwrap_err()).0, "signing_bonus");
    }

    #[test]
    fn test_symbol_formats() {
        for symbol in ["", "GOOGL", "INFY.NS", "BRK-B", "^GSPC", "USDINR=X"] {
            let mut ok = offer();
            ok.equity_symbol = symbol.to_string();
            assert!(validate_offer(0, &ok).is_ok(), "symbol {:?} should be accepted", symbol);
        }
        for symbol in ["GOO GL", "ACME/CORP", "ABCDEFGHIJKLMNOP"] {
            let mut bad = offer();
            bad.equity_symbol = symbol.to_string();
            assert_eq!(field_of(validate_offer(0, &bad).unwrap_err()).0, "equity_symbol");
        }
    }

    #[test]
    fn test_preference_bounds() {
        let mut prefs = PreferenceWeights::default();
        prefs.work_life_balance = 0;
        assert_eq!(field_of(validate_preferences(&prefs).unwrap_err()), ("work_life_balance", None));

        let mut prefs = PreferenceWeights::default();
        prefs.year_1_cash = 11;
        assert_eq!(field_of(validate_preferences(&prefs).unwrap_err()).0, "year_1_cash");

        let prefs = PreferenceWeights {
            year_1_cash: 1,
            four_year_value: 10,
            work_life_balance: 1,
            career_growth: 10,
        };
        assert!(validate_preferences(&prefs).is_ok());
    }

    #[test]
    fn test_first_invalid_offer_reported() {
        let mut bad = offer();
        bad.base_salary = -1.0;
        let request = ComparisonRequest {
            offers: vec![offer(), bad],
            preferences: PreferenceWeights::default(),
        };
        assert_eq!(field_of(validate_request(&request).unwrap_err()), ("base_salary", Some(1)));
    }
}
