//! Cell value formatting
//!
//! Numbers are shown with exactly two fraction digits in a fixed regional
//! convention (Turkish by default: `1.234,50`). Rounding follows ICU number
//! formatting: the shortest round-trip decimal form of the double is rounded
//! half away from zero, so `1.005` becomes `1,01` and not `1,00`.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::record::{raw_text, Record};

/// Regional number convention
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum NumberLocale {
    #[default]
    #[serde(rename = "tr-TR")]
    Turkish,
    #[serde(rename = "de-DE")]
    German,
    #[serde(rename = "en-US")]
    English,
}

impl NumberLocale {
    pub fn tag(&self) -> &'static str {
        match self {
            NumberLocale::Turkish => "tr-TR",
            NumberLocale::German => "de-DE",
            NumberLocale::English => "en-US",
        }
    }

    pub fn grouping_separator(&self) -> char {
        match self {
            NumberLocale::Turkish | NumberLocale::German => '.',
            NumberLocale::English => ',',
        }
    }

    pub fn decimal_separator(&self) -> char {
        match self {
            NumberLocale::Turkish | NumberLocale::German => ',',
            NumberLocale::English => '.',
        }
    }

    /// Parse a BCP 47 tag, falling back to the default convention
    pub fn from_tag(tag: &str) -> Self {
        match tag.to_ascii_lowercase().as_str() {
            "de-de" | "de" => NumberLocale::German,
            "en-us" | "en" => NumberLocale::English,
            _ => NumberLocale::Turkish,
        }
    }
}

/// Sign class of a cell, used for row coloring only
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueSign {
    Positive,
    Negative,
    Zero,
    NotNumeric,
}

/// Coerce text the way `Number(text)` does, rejecting blank input.
///
/// Accepts decimal literals with optional sign, fraction and exponent,
/// `Infinity`, and unsigned `0x`/`0o`/`0b` integer literals.
pub fn coerce_number(text: &str) -> Option<f64> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Some(value) = parse_radix_literal(trimmed) {
        return Some(value);
    }

    let (sign, body) = match trimmed.as_bytes()[0] {
        b'+' => (1.0, &trimmed[1..]),
        b'-' => (-1.0, &trimmed[1..]),
        _ => (1.0, trimmed),
    };

    if body == "Infinity" {
        return Some(sign * f64::INFINITY);
    }

    if !is_decimal_literal(body) {
        return None;
    }

    body.parse::<f64>().ok().map(|v| sign * v)
}

fn parse_radix_literal(text: &str) -> Option<f64> {
    let bytes = text.as_bytes();
    if bytes.len() < 3 || bytes[0] != b'0' {
        return None;
    }
    let radix = match bytes[1] {
        b'x' | b'X' => 16,
        b'o' | b'O' => 8,
        b'b' | b'B' => 2,
        _ => return None,
    };

    text[2..].chars().try_fold(0.0_f64, |acc, c| {
        c.to_digit(radix).map(|d| acc * radix as f64 + d as f64)
    })
}

fn is_decimal_literal(body: &str) -> bool {
    let (mantissa, exponent) = match body.find(['e', 'E']) {
        Some(idx) => (&body[..idx], Some(&body[idx + 1..])),
        None => (body, None),
    };

    let mut digits = 0;
    let mut dots = 0;
    for c in mantissa.chars() {
        match c {
            '0'..='9' => digits += 1,
            '.' => dots += 1,
            _ => return false,
        }
    }
    if digits == 0 || dots > 1 {
        return false;
    }

    match exponent {
        None => true,
        Some(exp) => {
            let exp = exp.strip_prefix(['+', '-']).unwrap_or(exp);
            !exp.is_empty() && exp.chars().all(|c| c.is_ascii_digit())
        }
    }
}

/// Numeric value of a cell for display purposes.
///
/// Broader than column inference: numeric-looking strings qualify too.
pub fn numeric_for_display(value: Option<&Value>) -> Option<f64> {
    match value? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => coerce_number(s),
        _ => None,
    }
}

/// Format a number with two fraction digits in the given convention
pub fn format_number(value: f64, locale: NumberLocale) -> String {
    if value.is_nan() {
        return "NaN".to_string();
    }

    let sign = if value.is_sign_negative() { "-" } else { "" };
    if value.is_infinite() {
        return format!("{}∞", sign);
    }

    // Display for f64 is the shortest round-trip form and never uses an exponent
    let shortest = value.abs().to_string();
    let (int_part, frac_part) = shortest.split_once('.').unwrap_or((&shortest, ""));

    let mut int_digits: Vec<u8> = int_part.bytes().collect();
    let mut frac_digits: Vec<u8> = frac_part.bytes().take(2).collect();
    frac_digits.resize(2, b'0');

    let round_up = frac_part.as_bytes().get(2).is_some_and(|d| *d >= b'5');
    if round_up && increment(&mut frac_digits) && increment(&mut int_digits) {
        int_digits.insert(0, b'1');
    }

    let mut out = String::with_capacity(int_digits.len() + int_digits.len() / 3 + 4);
    out.push_str(sign);
    for (idx, digit) in int_digits.iter().enumerate() {
        if idx > 0 && (int_digits.len() - idx) % 3 == 0 {
            out.push(locale.grouping_separator());
        }
        out.push(*digit as char);
    }
    out.push(locale.decimal_separator());
    out.extend(frac_digits.iter().map(|d| *d as char));
    out
}

/// Add one unit in the last place; returns true when a carry falls out
fn increment(digits: &mut [u8]) -> bool {
    for digit in digits.iter_mut().rev() {
        if *digit == b'9' {
            *digit = b'0';
        } else {
            *digit += 1;
            return false;
        }
    }
    true
}

/// Render one cell as display text
pub fn format_value(value: Option<&Value>, unit: Option<&str>, locale: NumberLocale) -> String {
    match numeric_for_display(value) {
        Some(number) => {
            let mut text = format_number(number, locale);
            if let Some(unit) = unit.filter(|u| !u.is_empty()) {
                text.push(' ');
                text.push_str(unit);
            }
            text
        }
        None => raw_text(value),
    }
}

/// Sign classification of a cell
pub fn value_sign(value: Option<&Value>) -> ValueSign {
    match numeric_for_display(value) {
        Some(n) if n > 0.0 => ValueSign::Positive,
        Some(n) if n < 0.0 => ValueSign::Negative,
        Some(_) => ValueSign::Zero,
        None => ValueSign::NotNumeric,
    }
}

/// Probe `aliases` in order on the first record and return the first unit
/// whose value is truthy (not null, false, zero or empty).
pub fn detect_unit(first: Option<&Record>, aliases: &[String]) -> Option<String> {
    let record = first?;
    aliases.iter().find_map(|alias| {
        let value = record.get(alias)?;
        let truthy = match value {
            Value::Null => false,
            Value::Bool(b) => *b,
            Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
            Value::String(s) => !s.is_empty(),
            Value::Array(_) | Value::Object(_) => true,
        };
        truthy.then(|| raw_text(Some(value)))
    })
}

/// Formatter bound to one locale and unit, shared by table and chart
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ValueFormatter {
    pub locale: NumberLocale,
    pub unit: Option<String>,
}

impl ValueFormatter {
    pub fn new(locale: NumberLocale, unit: Option<String>) -> Self {
        Self { locale, unit }
    }

    pub fn format(&self, value: Option<&Value>) -> String {
        format_value(value, self.unit.as_deref(), self.locale)
    }

    pub fn format_number(&self, value: f64) -> String {
        let mut text = format_number(value, self.locale);
        if let Some(unit) = self.unit.as_deref().filter(|u| !u.is_empty()) {
            text.push(' ');
            text.push_str(unit);
        }
        text
    }
}
