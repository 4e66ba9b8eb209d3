//! Price rendering for cart summaries.

use rust_decimal::Decimal;

/// Format a decimal amount as a dollar string with two decimals.
///
/// ```
/// use rocketshoes_core::format_price;
/// use rust_decimal::Decimal;
///
/// assert_eq!(format_price(Decimal::new(1799, 1)), "$179.90");
/// ```
#[must_use]
pub fn format_price(amount: Decimal) -> String {
    let mut rounded = amount.round_dp(2);
    rounded.rescale(2);
    format!("${rounded}")
}
