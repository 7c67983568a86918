pub fn env_var_nonempty(names: &[&str]) -> Option<String> {
    for name in names {
        if let Ok(value) = std::env::var(name) {
            let trimmed = value.trim();
            if !trimmed.is_empty() {
                return Some(trimmed.to_string());
            }
        }
    }
    None
}

/// Formats a dollar amount with two decimals, e.g. `$1234.50` or `$-0.25`.
pub fn format_usd(value: f64) -> String {
    let amount = format!("{value:.2}");
    if amount == "-0.00" {
        return "$0.00".to_string();
    }
    format!("${amount}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_currency_with_two_decimals() {
        assert_eq!(format_usd(101823.8892761993), "$101823.89");
        assert_eq!(format_usd(0.0), "$0.00");
        assert_eq!(format_usd(-0.25), "$-0.25");
        assert_eq!(format_usd(-5.0), "$-5.00");
        assert_eq!(format_usd(-0.0), "$0.00");
        assert_eq!(format_usd(-0.001), "$0.00");
        assert_eq!(format_usd(12.5), "$12.50");
    }
}
