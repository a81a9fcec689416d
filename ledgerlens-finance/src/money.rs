//! Rupee formatting for prompts and reports.

/// `1234567.5` → `"1,234,567.50"`
pub fn group_thousands(amount: f64) -> String {
    let fixed = format!("{:.2}", amount.abs());
    let (int, frac) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let mut out = String::with_capacity(fixed.len() + int.len() / 3 + 1);
    if amount < 0.0 && fixed != "0.00" {
        out.push('-');
    }
    for (i, ch) in int.chars().enumerate() {
        if i > 0 && (int.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out.push('.');
    out.push_str(frac);
    out
}

/// `800.0` → `"₹800.00"`
pub fn format_inr(amount: f64) -> String {
    format!("₹{}", group_thousands(amount))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_group_thousands() {
        assert_eq!(group_thousands(0.0), "0.00");
        assert_eq!(group_thousands(800.0), "800.00");
        assert_eq!(group_thousands(16500.0), "16,500.00");
        assert_eq!(group_thousands(1234567.5), "1,234,567.50");
        assert_eq!(group_thousands(-3700.0), "-3,700.00");
    }

    #[test]
    fn test_format_inr() {
        assert_eq!(format_inr(1000.0), "₹1,000.00");
    }
}
