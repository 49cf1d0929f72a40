//! Ad hoc numeric extraction from free-text fields.

/// Distance assumed for listings with no usable distance text, in miles
pub const FAR_DISTANCE_MILES: f64 = 10.0;

/// Keep only digits and dots, then parse the leading number.
///
/// "0.3 miles" -> 0.3, "$1,200/mo" -> 1200. Mirrors a `parseFloat` over the
/// stripped text: trailing garbage after the first number is ignored.
pub fn extract_number(text: &str) -> Option<f64> {
    let stripped: String = text
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect();

    let mut end = 0;
    let mut seen_dot = false;
    for (i, c) in stripped.char_indices() {
        if c == '.' {
            if seen_dot {
                break;
            }
            seen_dot = true;
        }
        end = i + 1;
    }

    stripped[..end].parse::<f64>().ok().filter(|n| n.is_finite())
}

/// Distance from campus in miles; missing or malformed text counts as far
pub fn distance_miles(text: Option<&str>) -> f64 {
    text.and_then(extract_number).unwrap_or(FAR_DISTANCE_MILES)
}

/// A price bound typed by the user; blank or malformed input means "no bound"
pub fn price_bound(text: &str) -> Option<f64> {
    if text.trim().is_empty() {
        return None;
    }
    extract_number(text)
}
