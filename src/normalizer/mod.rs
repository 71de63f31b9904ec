//! Text-to-number normalization for scraped price and quantity strings.
//!
//! These functions are pure and never fail: an unparseable price is the
//! "unknown price" sentinel 0.0, an unparseable quantity is `None` and the
//! caller falls back to its default. They are the most unit-testable seam in
//! the system and everything numeric funnels through them.

/// Convert a raw price string ("$1,234.56", "12,50 €") to an amount.
///
/// Everything but digits, commas and periods is stripped. When both
/// separators appear the commas are thousands separators; when only commas
/// appear the comma is the decimal point. Returns 0.0 on empty or
/// unparseable input.
pub fn normalize_price(raw: &str) -> f64 {
    let cleaned: String = raw
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == ',' || *c == '.')
        .collect();

    let cleaned = if cleaned.contains(',') && cleaned.contains('.') {
        cleaned.replace(',', "")
    } else if cleaned.contains(',') {
        cleaned.replace(',', ".")
    } else {
        cleaned
    };

    cleaned.parse::<f64>().unwrap_or(0.0)
}

/// Extract a positive quantity from a raw string ("2", "Qty: 3").
///
/// Non-digits are stripped before parsing; zero and unparseable input yield
/// `None` so callers apply their own default of 1.
pub fn normalize_quantity(raw: &str) -> Option<u32> {
    let digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();
    match digits.parse::<u32>() {
        Ok(qty) if qty > 0 => Some(qty),
        _ => None,
    }
}
