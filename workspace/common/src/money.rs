//! Display formatting for monetary amounts.

use rust_decimal::Decimal;
use rusty_money::{Money, iso};
use tracing::warn;

/// Formats an amount in the given ISO 4217 currency, e.g. `-$1,234.56`.
///
/// Unknown currency codes fall back to USD so a bad code never breaks a
/// rendering path.
pub fn format_amount(amount: Decimal, currency_code: &str) -> String {
    let currency = iso::find(currency_code).unwrap_or_else(|| {
        warn!("unknown currency code '{currency_code}', falling back to USD");
        iso::USD
    });
    Money::from_decimal(amount, currency).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_groups_thousands() {
        let amount = Decimal::from_str("1234.56").unwrap();
        assert_eq!(format_amount(amount, "USD"), "$1,234.56");
    }

    #[test]
    fn test_negative_amounts_keep_sign() {
        let amount = Decimal::from_str("-50").unwrap();
        assert_eq!(format_amount(amount, "USD"), "-$50.00");
    }

    #[test]
    fn test_unknown_code_falls_back_to_usd() {
        let amount = Decimal::from_str("1").unwrap();
        assert_eq!(format_amount(amount, "???"), "$1.00");
    }
}
