//! Helpers shared by the SQLite storage models.

use log::error;
use rust_decimal::Decimal;
use std::str::FromStr;

/// Parses a decimal string written by this crate back into a `Decimal`.
///
/// The ledger only ever stores canonical `Decimal::to_string` output, so a
/// parse failure means the row was tampered with outside the ledger. The
/// failure is logged loudly and ZERO returned so reads keep working; the
/// `verify_balances` consistency check will flag the affected account.
pub fn parse_stored_decimal(value_str: &str, field_name: &str) -> Decimal {
    match Decimal::from_str(value_str) {
        Ok(d) => d,
        Err(e) => {
            error!(
                "Failed to parse stored {} '{}' as Decimal: {}. Falling back to ZERO.",
                field_name, value_str, e
            );
            Decimal::ZERO
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_stored_decimal_round_trip() {
        let d = Decimal::new(120055, 2); // 1200.55
        assert_eq!(parse_stored_decimal(&d.to_string(), "balance"), d);
    }

    #[test]
    fn test_parse_stored_decimal_garbage_falls_back_to_zero() {
        assert_eq!(parse_stored_decimal("not a number", "balance"), Decimal::ZERO);
    }
}
