//! Display helpers for won amounts. Presentation only; the ledger works in
//! integer minor units and never formats.

pub const WON_SYMBOL: char = '₩';

/// Formats an amount the way `ko-KR` currency formatting renders KRW: `₩50,000`, `-₩2,000`.
pub fn format_won(amount: i64) -> String {
    let digits = amount.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3 + 2);
    for (idx, ch) in digits.chars().enumerate() {
        if idx > 0 && (digits.len() - idx) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    if amount < 0 {
        format!("-{WON_SYMBOL}{grouped}")
    } else {
        format!("{WON_SYMBOL}{grouped}")
    }
}

/// Parses user input such as `50,000`, `₩2,000` or `-500` into a raw amount.
///
/// Range and integrality are left to the ledger's own validation.
pub fn parse_amount(input: &str) -> Option<f64> {
    let cleaned: String = input
        .trim()
        .chars()
        .filter(|ch| *ch != ',' && *ch != WON_SYMBOL && *ch != '_')
        .collect();
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse::<f64>().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn groups_thousands() {
        assert_eq!(format_won(0), "₩0");
        assert_eq!(format_won(999), "₩999");
        assert_eq!(format_won(50_000), "₩50,000");
        assert_eq!(format_won(1_234_567), "₩1,234,567");
        assert_eq!(format_won(-2_000), "-₩2,000");
    }

    #[test]
    fn formats_extreme_values() {
        assert_eq!(format_won(i64::MIN), "-₩9,223,372,036,854,775,808");
    }

    #[test]
    fn parses_grouped_and_symbol_prefixed_input() {
        assert_eq!(parse_amount("50,000"), Some(50_000.0));
        assert_eq!(parse_amount("₩2,000"), Some(2_000.0));
        assert_eq!(parse_amount(" -500 "), Some(-500.0));
        assert_eq!(parse_amount("12.5"), Some(12.5));
        assert_eq!(parse_amount("abc"), None);
        assert_eq!(parse_amount(""), None);
    }
}
