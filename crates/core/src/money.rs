use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// Currency applied when a form leaves it blank.
pub const DEFAULT_CURRENCY: &str = "USD";

/// Largest amount a `NUMERIC(10, 2)` column holds: 99,999,999.99.
pub const MAX_AMOUNT: Decimal = Decimal::from_parts(0x540B_E3FF, 0x2, 0, false, 2);

/// Round to cents, halves away from zero.
pub fn round_cents(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// An amount in a given currency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Money {
    pub amount: Decimal,
    pub currency: String,
}

impl Money {
    pub fn new(amount: Decimal, currency: impl Into<String>) -> Self {
        Self {
            amount,
            currency: currency.into(),
        }
    }

    /// Human-readable form, e.g. `USD 1,500.00`.
    pub fn display(&self) -> String {
        format_price(self.amount, &self.currency)
    }
}

/// Format an amount with its currency code: `USD 1,500.00`.
pub fn format_price(amount: Decimal, currency: &str) -> String {
    format!("{currency} {}", format_amount(amount))
}

/// Two decimals with thousands separators: `1,500.00`.
pub fn format_amount(amount: Decimal) -> String {
    let fixed = fixed2(amount);
    let (sign, digits) = match fixed.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", fixed.as_str()),
    };
    let (int_part, frac_part) = digits.split_once('.').unwrap_or((digits, "00"));

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    format!("{sign}{grouped}.{frac_part}")
}

/// Render a decimal with exactly two fractional digits, no grouping.
pub fn fixed2(amount: Decimal) -> String {
    let mut rounded = round_cents(amount);
    rounded.rescale(2);
    if rounded.is_zero() {
        // -0.00 is not a price anyone wants to read
        rounded = rounded.abs();
    }
    rounded.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn groups_thousands() {
        assert_eq!(format_price(Decimal::new(150000, 2), "USD"), "USD 1,500.00");
        assert_eq!(format_amount(Decimal::new(123456789, 2)), "1,234,567.89");
        assert_eq!(format_amount(Decimal::new(99, 0)), "99.00");
    }

    #[test]
    fn pads_and_rounds_to_two_places() {
        assert_eq!(fixed2(Decimal::new(30, 0)), "30.00");
        assert_eq!(fixed2(Decimal::new(12345, 3)), "12.35");
        assert_eq!(format_amount(Decimal::new(-250000, 2)), "-2,500.00");
    }

    #[test]
    fn halves_round_away_from_zero() {
        assert_eq!(round_cents(Decimal::new(12345, 3)), Decimal::new(1235, 2));
        assert_eq!(round_cents(Decimal::new(-12345, 3)), Decimal::new(-1235, 2));
        assert_eq!(fixed2(Decimal::new(5, 3)), "0.01");
    }

    #[test]
    fn max_amount_fills_the_column() {
        assert_eq!(MAX_AMOUNT, Decimal::new(9_999_999_999, 2));
        assert_eq!(format_amount(MAX_AMOUNT), "99,999,999.99");
    }

    #[test]
    fn money_display_uses_currency_code() {
        let money = Money::new(Decimal::new(4999, 2), "EUR");
        assert_eq!(money.display(), "EUR 49.99");
    }
}
