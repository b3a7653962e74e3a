use crate::config::ValuationConfig;
use crate::error::CompareError;
use crate::models::{ComparisonRequest, ComparisonResponse, ComparisonResult, OfferInput, PreferenceWeights};
use crate::quote::{PriceProvider, PriceResolution, resolve_unit_price};
use crate::scoring::calculate_alignment_score;
use crate::validation::validate_request;
use crate::valuation::calculate_financial_breakdown;

/// Values a single offer. Price lookup is skipped when there is no grant to value.
pub fn evaluate_offer(
    offer: &OfferInput,
    preferences: &PreferenceWeights,
    provider: &dyn PriceProvider,
    config: &ValuationConfig,
) -> (ComparisonResult, Option<String>) {
    let (unit_price, warning) = if offer.equity_grant_value > 0.0 {
        match resolve_unit_price(provider, &offer.equity_symbol) {
            PriceResolution::Resolved(quote) => (quote.price, None),
            PriceResolution::Unknown(reason) => (0.0, Some(unresolved_equity_warning(offer, &reason))),
        }
    } else {
        (0.0, None)
    };

    let financials = calculate_financial_breakdown(offer, unit_price, config);
    let alignment_score = calculate_alignment_score(&financials, preferences, config);

    let result = ComparisonResult {
        input_offer: offer.clone(),
        financials,
        alignment_score,
        equity_unit_price: unit_price,
    };
    (result, warning)
}

/// The one user-facing report of an unresolved price; the lookup itself only logs at debug.
fn unresolved_equity_warning(offer: &OfferInput, reason: &str) -> String {
    let symbol = offer.equity_symbol.trim();
    if symbol.is_empty() {
        format!(
            "{}: no equity symbol given, equity grant counted as zero",
            offer.company_name
        )
    } else {
        format!(
            "{}: could not resolve a price for '{}' ({}), equity grant counted as zero",
            offer.company_name, symbol, reason
        )
    }
}

/// Values every offer independently, then ranks them by alignment score, highest first.
///
/// Ties keep their input order. Unresolved equity prices degrade to zero equity
/// for that offer and are reported in `warnings`; they never shorten the list.
pub fn compare_offers(
    request: &ComparisonRequest,
    provider: &dyn PriceProvider,
    config: &ValuationConfig,
) -> Result<ComparisonResponse, CompareError> {
    validate_request(request)?;

    let (mut results, warnings): (Vec<_>, Vec<_>) = request
        .offers
        .iter()
        .map(|offer| evaluate_offer(offer, &request.preferences, provider, config))
        .unzip();

    // sort_by is stable
    results.sort_by(|a, b| b.alignment_score.total_cmp(&a.alignment_score));

    let warnings: Vec<String> = warnings.into_iter().flatten().collect();
    tracing::info!(
        offers = results.len(),
        warnings = warnings.len(),
        "ranked offers"
    );

    Ok(ComparisonResponse {
        results,
        warnings,
        generated_at: chrono::Utc::now().to_rfc3339(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quote::{StaticPriceProvider, UnitPrice};
    use anyhow::Result;
    use std::cell::RefCell;

    struct CountingProvider {
        inner: StaticPriceProvider,
        calls: RefCell<Vec<String>>,
    }

    impl PriceProvider for CountingProvider {
        fn unit_price(&self, symbol: &str) -> Result<Option<UnitPrice>> {
            self.calls.borrow_mut().push(symbol.to_string());
            self.inner.unit_price(symbol)
        }

        fn source_name(&self) -> &'static str {
            "counting"
        }
    }

    fn offer(company: &str, symbol: &str, base_salary: f64, signing_bonus: f64, grant: f64) -> OfferInput {
        OfferInput {
            company_name: company.to_string(),
            equity_symbol: symbol.to_string(),
            base_salary,
            bonus_percent: 10.0,
            signing_bonus,
            equity_grant_value: grant,
        }
    }

    fn prices() -> StaticPriceProvider {
        StaticPriceProvider::new()
            .with_price("GOOGL", 170.0)
            .with_price("MSFT", 420.0)
            .with_price("AMZN", 180.0)
    }

    fn request(offers: Vec<OfferInput>) -> ComparisonRequest {
        ComparisonRequest {
            offers,
            preferences: PreferenceWeights::default(),
        }
    }

    fn companies(response: &ComparisonResponse) -> Vec<&str> {
        response
            .results
            .iter()
            .map(|r| r.input_offer.company_name.as_str())
            .collect()
    }

    #[test]
    fn test_empty_batch_rejected() {
        let provider = CountingProvider {
            inner: prices(),
            calls: RefCell::new(Vec::new()),
        };
        let err = compare_offers(&request(vec![]), &provider, &ValuationConfig::default()).unwrap_err();
        assert_eq!(err, CompareError::EmptyBatch);
        assert!(provider.calls.borrow().is_empty());
    }

    #[test]
    fn test_invalid_offer_rejects_whole_request() {
        let provider = CountingProvider {
            inner: prices(),
            calls: RefCell::new(Vec::new()),
        };
        let req = request(vec![
            offer("Google", "GOOGL", 4_000_000.0, 0.0, 50_000.0),
            offer("Broken", "MSFT", 0.0, 0.0, 0.0),
        ]);
        let err = compare_offers(&req, &provider, &ValuationConfig::default()).unwrap_err();
        assert!(matches!(err, CompareError::Validation { offer: Some(1), .. }));
        assert!(provider.calls.borrow().is_empty());
    }

    #[test]
    fn test_ranks_by_score_descending() {
        let req = request(vec![
            offer("Small", "AMZN", 2_000_000.0, 0.0, 10_000.0),
            offer("Large", "GOOGL", 5_000_000.0, 500_000.0, 80_000.0),
            offer("Medium", "MSFT", 3_500_000.0, 200_000.0, 40_000.0),
        ]);
        let response = compare_offers(&req, &prices(), &ValuationConfig::default()).unwrap();

        assert_eq!(response.results.len(), 3);
        assert_eq!(companies(&response), vec!["Large", "Medium", "Small"]);
        assert!(
            response
                .results
                .windows(2)
                .all(|w| w[0].alignment_score >= w[1].alignment_score)
        );
        assert!(response.warnings.is_empty());
    }

    #[test]
    fn test_ties_keep_input_order() {
        let req = request(vec![
            offer("First", "GOOGL", 3_000_000.0, 0.0, 0.0),
            offer("Better", "GOOGL", 3_500_000.0, 0.0, 0.0),
            offer("Second", "MSFT", 3_000_000.0, 0.0, 0.0),
            offer("Third", "", 3_000_000.0, 0.0, 0.0),
        ]);
        let response = compare_offers(&req, &prices(), &ValuationConfig::default()).unwrap();
        assert_eq!(companies(&response), vec!["Better", "First", "Second", "Third"]);
    }

    #[test]
    fn test_unresolved_price_degrades_to_zero_equity() {
        let req = request(vec![
            offer("Listed", "GOOGL", 3_000_000.0, 0.0, 50_000.0),
            offer("Delisted", "ZZZZ", 3_000_000.0, 0.0, 50_000.0),
        ]);
        let response = compare_offers(&req, &prices(), &ValuationConfig::default()).unwrap();

        assert_eq!(response.results.len(), 2);
        let delisted = response
            .results
            .iter()
            .find(|r| r.input_offer.company_name == "Delisted")
            .unwrap();
        assert_eq!(delisted.equity_unit_price, 0.0);
        assert_eq!(delisted.financials.total_equity_value_local, 0.0);
        assert_eq!(companies(&response), vec!["Listed", "Delisted"]);

        assert_eq!(response.warnings.len(), 1);
        assert!(response.warnings[0].contains("Delisted"));
        assert!(response.warnings[0].contains("ZZZZ"));
    }

    #[test]
    fn test_unresolved_warning_carries_reason() {
        let req = request(vec![offer("Delisted", "ZZZZ", 3_000_000.0, 0.0, 50_000.0)]);
        let response = compare_offers(&req, &prices(), &ValuationConfig::default()).unwrap();

        assert_eq!(
            response.warnings,
            vec![
                "Delisted: could not resolve a price for 'ZZZZ' (no price data from static), \
                 equity grant counted as zero"
                    .to_string()
            ]
        );
    }

    #[test]
    fn test_no_lookup_without_grant() {
        let provider = CountingProvider {
            inner: prices(),
            calls: RefCell::new(Vec::new()),
        };
        let req = request(vec![
            offer("Cash Only", "GOOGL", 3_000_000.0, 100_000.0, 0.0),
            offer("Startup", "", 2_500_000.0, 0.0, 20_000.0),
            offer("Mixed", "MSFT", 3_000_000.0, 0.0, 10_000.0),
        ]);
        let response = compare_offers(&req, &provider, &ValuationConfig::default()).unwrap();

        assert_eq!(*provider.calls.borrow(), vec!["MSFT".to_string()]);
        assert_eq!(response.warnings.len(), 1);
        assert!(response.warnings[0].contains("Startup"));
        assert!(response.warnings[0].contains("no equity symbol"));
    }

    #[test]
    fn test_weights_can_reorder_offers() {
        // Cash-heavy: big signing bonus, no equity. Equity-heavy: large grant.
        let offers = vec![
            offer("CashCo", "", 3_000_000.0, 2_000_000.0, 0.0),
            offer("EquityCo", "GOOGL", 3_000_000.0, 0.0, 60_000.0),
        ];
        let cash_first = ComparisonRequest {
            offers: offers.clone(),
            preferences: PreferenceWeights {
                year_1_cash: 10,
                four_year_value: 1,
                ..PreferenceWeights::default()
            },
        };
        let long_term = ComparisonRequest {
            offers,
            preferences: PreferenceWeights {
                year_1_cash: 1,
                four_year_value: 10,
                ..PreferenceWeights::default()
            },
        };
        let config = ValuationConfig::default();

        let a = compare_offers(&cash_first, &prices(), &config).unwrap();
        let b = compare_offers(&long_term, &prices(), &config).unwrap();
        assert_eq!(companies(&a), vec!["CashCo", "EquityCo"]);
        assert_eq!(companies(&b), vec!["EquityCo", "CashCo"]);
    }

    #[test]
    fn test_offers_are_independent() {
        let config = ValuationConfig::default();
        let prefs = PreferenceWeights::default();
        let solo = offer("Solo", "AMZN", 2_800_000.0, 50_000.0, 30_000.0);
        let (alone, _) = evaluate_offer(&solo, &prefs, &prices(), &config);

        let req = request(vec![
            offer("Other", "GOOGL", 9_000_000.0, 0.0, 90_000.0),
            solo.clone(),
        ]);
        let response = compare_offers(&req, &prices(), &config).unwrap();
        let batched = response
            .results
            .iter()
            .find(|r| r.input_offer == solo)
            .unwrap();
        assert_eq!(*batched, alone);
    }
}
