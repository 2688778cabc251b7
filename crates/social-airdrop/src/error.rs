//! Errors callers branch on
//!
//! Everything else flows through `anyhow` with context.

use std::path::PathBuf;
use thiserror::Error;

/// A stage cannot start; nothing has been read from or written to the network
#[derive(Debug, Error)]
pub enum PreconditionError {
    #[error("{0} environment variable is not set")]
    MissingCredential(&'static str),

    #[error("File not found: {}", .0.display())]
    MissingFile(PathBuf),

    #[error("No data rows in {}", .0.display())]
    EmptyFile(PathBuf),

    #[error("No valid wallet addresses to airdrop to")]
    NoValidHolders,

    #[error("Invalid amount {0:?}: expected a non-negative decimal number")]
    InvalidAmount(String),
}

/// Unwrap a credential read from the environment; blank counts as absent
pub fn require_credential(value: Option<&str>, name: &'static str) -> Result<String, PreconditionError> {
    match value.map(str::trim) {
        Some(value) if !value.is_empty() => Ok(value.to_string()),
        _ => Err(PreconditionError::MissingCredential(name)),
    }
}

/// Accepts `420`, `0.5`, `1.25`; rejects signs, exponents and empty parts
pub fn validate_amount(amount: &str) -> Result<(), PreconditionError> {
    let invalid = || PreconditionError::InvalidAmount(amount.to_string());

    let (whole, fraction) = match amount.split_once('.') {
        Some((whole, fraction)) => (whole, Some(fraction)),
        None => (amount, None),
    };

    if whole.is_empty() || !whole.chars().all(|c| c.is_ascii_digit()) {
        return Err(invalid());
    }
    if let Some(fraction) = fraction
        && (fraction.is_empty() || !fraction.chars().all(|c| c.is_ascii_digit()))
    {
        return Err(invalid());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_amount() {
        for ok in ["420", "0", "0.5", "1.000000000000000001", "007"] {
            assert!(validate_amount(ok).is_ok(), "{} should be valid", ok);
        }
        for bad in ["", "-1", "+1", "1e18", ".5", "5.", "1.2.3", "abc", " 1"] {
            assert!(validate_amount(bad).is_err(), "{} should be invalid", bad);
        }
    }

    #[test]
    fn test_require_credential() {
        assert_eq!(require_credential(Some(" abc "), "NEYNAR_API_KEY").unwrap(), "abc");
        assert!(matches!(
            require_credential(Some("  "), "NEYNAR_API_KEY"),
            Err(PreconditionError::MissingCredential("NEYNAR_API_KEY"))
        ));
        assert!(require_credential(None, "PRIVATE_KEY").is_err());
    }

    #[test]
    fn test_messages() {
        let err = PreconditionError::MissingCredential("PRIVATE_KEY");
        assert_eq!(err.to_string(), "PRIVATE_KEY environment variable is not set");

        let err = PreconditionError::MissingFile(PathBuf::from("airdrop.csv"));
        assert_eq!(err.to_string(), "File not found: airdrop.csv");
    }
}
