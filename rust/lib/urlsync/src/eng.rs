//! Engineering notation: `1234.5` -> `("1.23", "k")`.
//!
//! Digits are truncated, never rounded. Orders of magnitude within
//! yocto..yotta use metric prefixes; anything beyond uses `e<exp>`.

const PREFIXES: [&str; 17] = [
    "y", "z", "a", "f", "p", "n", "u", "m", "", "k", "M", "G", "T", "P", "E", "Z", "Y",
];

/// Split `n` into signed digits and a magnitude suffix.
///
/// Without `fixed`, three significant digits are kept: `1.00`, `10.0`, `100`.
/// With `fixed`, one fractional digit is kept: `1.0`, `10.0`, `100.0`.
/// `n` must be finite.
pub fn eng_notation(n: f64, fixed: bool) -> (String, String) {
    let sign = if n < 0.0 { "-" } else { "" };
    let (digits, exp) = significant_digits(n.abs());

    let order = exp.div_euclid(3);
    let suffix = if (-8..=8).contains(&order) {
        PREFIXES[(order + 8) as usize].to_string()
    } else {
        format!("e{}", order * 3)
    };

    let d = |i: usize| digits.as_bytes().get(i).map_or('0', |b| *b as char);
    let (d0, d1, d2, d3) = (d(0), d(1), d(2), d(3));
    let whole = exp.rem_euclid(3) + 1;
    let prefix = match (whole, fixed) {
        (1, false) => format!("{d0}.{d1}{d2}"),
        (2, false) => format!("{d0}{d1}.{d2}"),
        (_, false) => format!("{d0}{d1}{d2}"),
        (1, true) => format!("{d0}.{d1}"),
        (2, true) => format!("{d0}{d1}.{d2}"),
        (_, true) => format!("{d0}{d1}{d2}.{d3}"),
    };
    (format!("{sign}{prefix}"), suffix)
}

/// `eng_notation` joined into one string; `""` for NaN and infinities.
pub fn format_eng(n: f64, fixed: bool) -> String {
    if !n.is_finite() {
        return String::new();
    }
    let (digits, suffix) = eng_notation(n, fixed);
    digits + &suffix
}

/// Like `format_eng`, for numbers held as text. `""` when unparseable.
pub fn format_eng_str(s: &str, fixed: bool) -> String {
    match s.trim().parse::<f64>() {
        Ok(n) => format_eng(n, fixed),
        Err(_) => String::new(),
    }
}

/// Shortest round-trip digits of a non-negative `n`, without leading zeros,
/// and the decimal exponent of the first digit.
fn significant_digits(n: f64) -> (String, i32) {
    // `{:e}` prints the shortest representation that round-trips, e.g. `1.2345e3`.
    let formatted = format!("{n:e}");
    let (mantissa, exp) = formatted.split_once('e').unwrap_or((formatted.as_str(), "0"));
    let digits: String = mantissa.chars().filter(char::is_ascii_digit).collect();
    (digits, exp.parse().unwrap_or(0))
}
