use thiserror::Error;

/// Errors that reject a comparison request before any offer is valued.
#[derive(Debug, Error, PartialEq)]
pub enum CompareError {
    #[error("No offers to compare. Provide at least one offer.")]
    EmptyBatch,

    /// `offer` is the zero-based index in the request, `None` for preference fields.
    #[error("Invalid value for '{field}'{}: {reason}", offer_suffix(.offer))]
    Validation {
        offer: Option<usize>,
        field: &'static str,
        reason: String,
    },
}

fn offer_suffix(offer: &Option<usize>) -> String {
    match offer {
        Some(index) => format!(" in offer #{}", index + 1),
        None => String::new(),
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration error: {0}")]
    Figment(#[from] figment::Error),

    #[error("Invalid configuration value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },
}
