//! Durations spoken in free text: "10 seconds", "two minutes",
//! "one minute and 30 seconds", "half an hour".

use std::time::Duration;

use once_cell::sync::Lazy;
use regex::Regex;

static TOKEN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\d+(?:\.\d+)?|[a-z]+").expect("valid token regex"));

fn unit_seconds(token: &str) -> Option<f64> {
    match token {
        "s" | "sec" | "secs" | "second" | "seconds" => Some(1.0),
        "m" | "min" | "mins" | "minute" | "minutes" => Some(60.0),
        "h" | "hr" | "hrs" | "hour" | "hours" => Some(3600.0),
        _ => None,
    }
}

fn small_number(token: &str) -> Option<f64> {
    let value = match token {
        "zero" => 0,
        "one" => 1,
        "two" => 2,
        "three" => 3,
        "four" => 4,
        "five" => 5,
        "six" => 6,
        "seven" => 7,
        "eight" => 8,
        "nine" => 9,
        "ten" => 10,
        "eleven" => 11,
        "twelve" => 12,
        "thirteen" => 13,
        "fourteen" => 14,
        "fifteen" => 15,
        "sixteen" => 16,
        "seventeen" => 17,
        "eighteen" => 18,
        "nineteen" => 19,
        _ => return None,
    };
    Some(value as f64)
}

fn tens(token: &str) -> Option<f64> {
    let value = match token {
        "twenty" => 20,
        "thirty" => 30,
        "forty" => 40,
        "fifty" => 50,
        "sixty" => 60,
        "seventy" => 70,
        "eighty" => 80,
        "ninety" => 90,
        _ => return None,
    };
    Some(value as f64)
}

/// Reads an amount at the start of `tokens`, returning it with the number of
/// tokens consumed.
fn parse_amount(tokens: &[&str]) -> Option<(f64, usize)> {
    let first = *tokens.first()?;
    let next = tokens.get(1).copied();

    if first.starts_with(|c: char| c.is_ascii_digit()) {
        return first.parse::<f64>().ok().map(|v| (v, 1));
    }

    match first {
        "half" => match next {
            Some("a" | "an") => Some((0.5, 2)),
            _ => Some((0.5, 1)),
        },
        "a" | "an" => Some((1.0, 1)),
        _ => {
            if let Some(t) = tens(first) {
                match next.and_then(small_number) {
                    Some(u) if u > 0.0 && u < 10.0 => Some((t + u, 2)),
                    _ => Some((t, 1)),
                }
            } else {
                small_number(first).map(|v| (v, 1))
            }
        }
    }
}

/// Sums every `<amount> <unit>` pair found in `text`.
///
/// Returns `None` when the text holds no such pair, or when the total is
/// too large to be a [`Duration`].
pub fn extract_duration(text: &str) -> Option<Duration> {
    let lower = text.to_lowercase();
    let tokens: Vec<&str> = TOKEN_RE.find_iter(&lower).map(|m| m.as_str()).collect();

    let mut total = 0.0;
    let mut found = false;
    let mut i = 0;

    while i < tokens.len() {
        if let Some((amount, used)) = parse_amount(&tokens[i..]) {
            if let Some(unit) = tokens.get(i + used).copied().and_then(unit_seconds) {
                total += amount * unit;
                found = true;
                i += used + 1;
                continue;
            }
        }
        i += 1;
    }

    if !found {
        return None;
    }
    // Amounts are unbounded: a total no `Duration` can hold reads as none.
    Duration::try_from_secs_f64(total).ok()
}
