//! Free-text numeric extraction for research prose.
//!
//! Every extractor is total: text that carries no usable figure yields `0.0`.
//! Nothing in here knows which record field the text came from.

use once_cell::sync::Lazy;
use regex::Regex;

static INCOME_TOKEN_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(\d{1,3}(?:,\d{3})+|\d+(?:\.\d+)?)\s*([kK]\b)?").expect("valid income token regex")
});
static TRAFFIC_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(\d{1,3}(?:,\d{3})+|\d+(?:\.\d+)?)\s*(k)?\s*vehicles")
        .expect("valid traffic regex")
});
static PRICE_TOKEN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\$?(\d{1,3}(?:,\d{3})+|\d+)").expect("valid price token regex"));

const THOUSAND: f64 = 1000.0;

/// Midpoint of a currency figure or range, e.g. `"$25-$30/sqft"` -> `27.5`.
///
/// Commas are dropped, any other character outside digits, `.`, `-`, `–`,
/// `k` and `K` ends a segment, and segments are further split on dashes.
/// A trailing `k` multiplies a segment by 1000. The mean of every segment
/// that parses is returned, which also averages figures with different units
/// when one sentence holds both (`"$30/sqft or ~$48k per month"` -> `24015`).
pub fn extract_currency_midpoint(text: &str) -> f64 {
    let cleaned: String = text.chars().filter(|c| *c != ',').collect();
    let values: Vec<f64> = cleaned
        .split(|c: char| !is_currency_char(c))
        .flat_map(|chunk| chunk.split(['-', '–']))
        .filter_map(parse_currency_segment)
        .collect();

    mean(&values)
}

/// Household income estimate. Ranges collapse to the mean of their figures.
///
/// A `k` marker anywhere in the text scales every figure below 1000, so a
/// shared suffix such as `"$150–$200K"` reads as 150000 and 200000.
pub fn extract_income_value(text: &str) -> f64 {
    let mut has_k_marker = false;
    let mut raw = Vec::new();

    for caps in INCOME_TOKEN_RE.captures_iter(text) {
        let Some(value) = caps.get(1).and_then(|m| parse_grouped(m.as_str())) else {
            continue;
        };
        has_k_marker |= caps.get(2).is_some();
        raw.push(value);
    }

    let values: Vec<f64> = raw
        .into_iter()
        .map(|value| {
            if has_k_marker && value < THOUSAND {
                value * THOUSAND
            } else {
                value
            }
        })
        .collect();

    mean(&values)
}

/// Daily vehicle count from the first figure directly followed by "vehicles".
pub fn extract_traffic_value(text: &str) -> f64 {
    let Some(caps) = TRAFFIC_RE.captures(text) else {
        return 0.0;
    };
    let Some(value) = caps.get(1).and_then(|m| parse_grouped(m.as_str())) else {
        return 0.0;
    };

    if caps.get(2).is_some() && value < THOUSAND {
        value * THOUSAND
    } else {
        value
    }
}

/// Largest whole-dollar figure in the text, e.g. `"$120 to $180"` -> `180`.
pub fn extract_max_price(text: &str) -> f64 {
    PRICE_TOKEN_RE
        .captures_iter(text)
        .filter_map(|caps| caps.get(1))
        .filter_map(|m| m.as_str().replace(',', "").parse::<u64>().ok())
        .max()
        .map_or(0.0, |value| value as f64)
}

fn is_currency_char(c: char) -> bool {
    c.is_ascii_digit() || matches!(c, '.' | '-' | '–' | 'k' | 'K')
}

fn parse_currency_segment(segment: &str) -> Option<f64> {
    let (digits, multiplier) = match segment.strip_suffix(['k', 'K']) {
        Some(rest) => (rest, THOUSAND),
        None => (segment, 1.0),
    };

    let value = digits.parse::<f64>().ok()?;
    value.is_finite().then_some(value * multiplier)
}

fn parse_grouped(token: &str) -> Option<f64> {
    let value = token.replace(',', "").parse::<f64>().ok()?;
    value.is_finite().then_some(value)
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}
