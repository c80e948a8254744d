//! # models::numeric
//!
//! Lenient numeric coercion for values typed into the basket form.
//!
//! The pricing service was built against a browser client, so the canonical
//! request must carry exactly the numbers that client would have produced:
//! `Number(value)` for parsing and `Number(x.toFixed(2))` for notional
//! rounding. Both are reproduced here bit-for-bit.

use serde::{Deserialize, Serialize};

// ─── NumericInput ─────────────────────────────────────────────────────────────

/// A numeric field as it arrives from the draft: a real number, or whatever
/// the user typed into the cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NumericInput {
    Number(f64),
    Text(String),
    Flag(bool),
    /// JSON `null`: coerces to `0`.
    Null(()),
}

impl NumericInput {
    /// Coerce with `Number(value)` semantics. Garbage becomes `NaN`.
    pub fn value(&self) -> f64 {
        match self {
            NumericInput::Number(n) => *n,
            NumericInput::Text(s) => js_number(s),
            NumericInput::Flag(true) => 1.0,
            NumericInput::Flag(false) | NumericInput::Null(()) => 0.0,
        }
    }

    /// The grid editor's coercion: anything that is not a finite number is 0.
    pub fn number_or_zero(&self) -> f64 {
        let v = self.value();
        if v.is_finite() { v } else { 0.0 }
    }
}

impl Default for NumericInput {
    fn default() -> Self {
        NumericInput::Number(0.0)
    }
}

impl From<f64> for NumericInput {
    fn from(value: f64) -> Self {
        NumericInput::Number(value)
    }
}

impl From<&str> for NumericInput {
    fn from(value: &str) -> Self {
        NumericInput::Text(value.to_string())
    }
}

impl From<String> for NumericInput {
    fn from(value: String) -> Self {
        NumericInput::Text(value)
    }
}

// ─── String → Number ──────────────────────────────────────────────────────────

/// Parse text the way `Number(text)` does.
///
/// * surrounding whitespace is ignored, blank text is `0`
/// * decimal literals with optional sign, fraction and exponent
/// * unsigned `0x` / `0o` / `0b` integer literals
/// * `Infinity` with optional sign
/// * everything else (`"abc"`, `"1,5"`, `"inf"`, `"NaN"`) is `NaN`
pub fn js_number(text: &str) -> f64 {
    let s = text.trim_matches(is_js_whitespace);
    if s.is_empty() {
        return 0.0;
    }

    match s {
        "Infinity" | "+Infinity" => return f64::INFINITY,
        "-Infinity" => return f64::NEG_INFINITY,
        _ => {}
    }

    if let Some(v) = parse_radix_literal(s) {
        return v;
    }

    if is_decimal_literal(s) {
        // Rust's float grammar is a superset of the literal we just checked
        s.parse::<f64>().unwrap_or(f64::NAN)
    } else {
        f64::NAN
    }
}

fn is_js_whitespace(c: char) -> bool {
    c.is_whitespace() || c == '\u{feff}'
}

fn parse_radix_literal(s: &str) -> Option<f64> {
    let bytes = s.as_bytes();
    if bytes.len() < 2 || bytes[0] != b'0' {
        return None;
    }

    let radix = match bytes[1] {
        b'x' | b'X' => 16,
        b'o' | b'O' => 8,
        b'b' | b'B' => 2,
        _ => return None,
    };

    let digits = &s[2..];
    if digits.is_empty() {
        return Some(f64::NAN);
    }

    digits
        .chars()
        .try_fold(0.0_f64, |acc, c| c.to_digit(radix).map(|d| acc * radix as f64 + d as f64))
        .or(Some(f64::NAN))
}

fn is_decimal_literal(s: &str) -> bool {
    let body = s.strip_prefix(['+', '-']).unwrap_or(s);

    let (mantissa, exponent) = match body.find(['e', 'E']) {
        Some(idx) => (&body[..idx], Some(&body[idx + 1..])),
        None => (body, None),
    };

    let (int_part, frac_part) = match mantissa.split_once('.') {
        Some((i, f)) => (i, f),
        None => (mantissa, ""),
    };

    let all_digits = |p: &str| p.bytes().all(|b| b.is_ascii_digit());
    if !all_digits(int_part) || !all_digits(frac_part) {
        return false;
    }
    if int_part.is_empty() && frac_part.is_empty() {
        return false;
    }

    match exponent {
        None => true,
        Some(exp) => {
            let exp = exp.strip_prefix(['+', '-']).unwrap_or(exp);
            !exp.is_empty() && all_digits(exp)
        }
    }
}

// ─── Fixed-point rounding ─────────────────────────────────────────────────────

/// `Number(value.toFixed(2))`.
///
/// Rounds the *exact* binary value to two decimals, so `1.005` stays `1.00`
/// (its double sits just below the half-cent) while `1000000.005` becomes
/// `1000000.01`. Exact half-cent ties round away from zero. Non-finite
/// values and magnitudes `>= 1e21` pass through unchanged.
pub fn round_to_cents(value: f64) -> f64 {
    if !value.is_finite() || value.abs() >= 1e21 {
        return value;
    }

    let magnitude = value.abs();

    // `{:.2}` rounds exact ties to even; toFixed picks the larger candidate.
    let fixed = if is_half_cent_tie(magnitude) {
        let whole = magnitude.trunc() as u64;
        let cents = (magnitude.fract() * 100.0).ceil() as u64;
        format!("{whole}.{cents:02}")
    } else {
        format!("{magnitude:.2}")
    };

    let rounded = fixed.parse::<f64>().unwrap_or(magnitude);
    if value < 0.0 { -rounded } else { rounded }
}

/// A double can only sit exactly on a half cent when its fractional part is
/// an odd multiple of 1/8 (0.125, 0.375, 0.625, 0.875).
fn is_half_cent_tie(magnitude: f64) -> bool {
    let eighths = magnitude.fract() * 8.0;
    eighths.fract() == 0.0 && (eighths as u8) % 2 == 1
}

// ─── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_js_number_blank_is_zero() {
        assert_eq!(js_number(""), 0.0);
        assert_eq!(js_number("   "), 0.0);
        assert_eq!(js_number("\n7\t"), 7.0);
    }

    #[test]
    fn test_js_number_decimal_forms() {
        assert_eq!(js_number(" 12.5 "), 12.5);
        assert_eq!(js_number(".5"), 0.5);
        assert_eq!(js_number("5."), 5.0);
        assert_eq!(js_number("1e3"), 1000.0);
        assert_eq!(js_number("+.5e1"), 5.0);
        assert_eq!(js_number("-2.25"), -2.25);
    }

    #[test]
    fn test_js_number_radix_literals() {
        assert_eq!(js_number("0x1A"), 26.0);
        assert_eq!(js_number("0b101"), 5.0);
        assert_eq!(js_number("0o17"), 15.0);
        assert!(js_number("-0x10").is_nan());
        assert!(js_number("0x").is_nan());
        assert!(js_number("0xZZ").is_nan());
    }

    #[test]
    fn test_js_number_infinity_spelling() {
        assert_eq!(js_number("Infinity"), f64::INFINITY);
        assert_eq!(js_number("-Infinity"), f64::NEG_INFINITY);
        assert!(js_number("inf").is_nan());
        assert!(js_number("infinity").is_nan());
        assert!(js_number("NaN").is_nan());
    }

    #[test]
    fn test_js_number_garbage_is_nan() {
        for s in ["abc", "1,5", ".", "1e", "1_000", "12abc", "--1"] {
            assert!(js_number(s).is_nan(), "{s:?} should be NaN");
        }
    }

    #[test]
    fn test_round_to_cents_matches_to_fixed() {
        assert_eq!(round_to_cents(1000000.005), 1000000.01);
        assert_eq!(round_to_cents(1.005), 1.0);
        assert_eq!(round_to_cents(2.675), 2.67);
        assert_eq!(round_to_cents(1.255), 1.25);
        assert_eq!(round_to_cents(10.235), 10.23);
        assert_eq!(round_to_cents(1234.5678), 1234.57);
        assert_eq!(round_to_cents(1.0), 1.0);
    }

    #[test]
    fn test_round_to_cents_exact_ties_go_away_from_zero() {
        assert_eq!(round_to_cents(0.125), 0.13);
        assert_eq!(round_to_cents(0.375), 0.38);
        assert_eq!(round_to_cents(-0.125), -0.13);
        assert_eq!(round_to_cents(2.625), 2.63);
    }

    #[test]
    fn test_round_to_cents_passthrough() {
        assert!(round_to_cents(f64::NAN).is_nan());
        assert_eq!(round_to_cents(f64::INFINITY), f64::INFINITY);
        assert_eq!(round_to_cents(1e21), 1e21);
        assert_eq!(round_to_cents(-0.0), 0.0);
        assert!(round_to_cents(-0.0).is_sign_positive());
    }

    #[test]
    fn test_numeric_input_coercion() {
        assert_eq!(NumericInput::from(1.5).value(), 1.5);
        assert_eq!(NumericInput::from("0.25").value(), 0.25);
        assert!(NumericInput::from("abc").value().is_nan());
        assert_eq!(NumericInput::Null(()).value(), 0.0);
        assert_eq!(NumericInput::Flag(true).value(), 1.0);
        assert_eq!(NumericInput::from("abc").number_or_zero(), 0.0);
    }

    #[test]
    fn test_numeric_input_deserializes_any_json_scalar() {
        let parsed: Vec<NumericInput> =
            serde_json::from_str(r#"[1.5, "2", true, null]"#).unwrap();
        assert_eq!(
            parsed,
            vec![
                NumericInput::Number(1.5),
                NumericInput::Text("2".into()),
                NumericInput::Flag(true),
                NumericInput::Null(()),
            ]
        );
    }
}
