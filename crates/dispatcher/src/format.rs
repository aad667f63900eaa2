//! Number rendering for the delimited artifacts

/// At most `decimals` fractional digits, trailing zeros trimmed, no `-0`
pub fn format_number(value: f64, decimals: usize) -> String {
    let mut s = format!("{value:.decimals$}");
    if s.contains('.') {
        let trimmed = s.trim_end_matches('0').trim_end_matches('.').len();
        s.truncate(trimmed);
    }
    if s == "-0" {
        s = "0".to_string();
    }
    s
}

/// Counter fields render without a fractional part
pub fn format_counter(value: u64) -> String {
    value.to_string()
}
