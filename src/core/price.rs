/// Parse a localized price display string ("R$ 1.200,50") into a number.
///
/// Keeps only digits and the decimal comma, so currency symbols and
/// grouping dots drop out, then normalizes the comma to a period and parses.
/// Malformed input yields 0.0 — a bad price string must never block the
/// running total.
pub fn parse_price(display: Option<&str>) -> f64 {
    let Some(raw) = display else {
        return 0.0;
    };
    let kept: String = raw
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == ',')
        .collect();
    kept.replace(',', ".").parse().unwrap_or(0.0)
}
