// Cell value classification for typed cell writes.
//
// Order matters: formula, then number, then boolean, then string. A text
// such as "true" is always a boolean; callers wanting the literal text must
// escape it themselves (e.g. with a leading apostrophe).

use serde::Serialize;
use serde_json::Value;

/// A cell value as sent to the Sheets API in an `ExtendedValue`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum CellValue {
    #[serde(rename = "formulaValue")]
    Formula(String),
    #[serde(rename = "numberValue")]
    Number(f64),
    #[serde(rename = "boolValue")]
    Boolean(bool),
    #[serde(rename = "stringValue")]
    String(String),
}

impl CellValue {
    /// Classifies raw cell text.
    pub fn classify(text: &str) -> Self {
        if text.starts_with('=') {
            return CellValue::Formula(text.to_string());
        }
        if let Some(number) = parse_invariant_number(text) {
            return CellValue::Number(number);
        }
        if let Some(flag) = parse_bool(text) {
            return CellValue::Boolean(flag);
        }
        CellValue::String(text.to_string())
    }

    /// Classifies a JSON cell coming from the host.
    pub fn from_json(value: &Value) -> Self {
        Self::classify(&cell_text(value))
    }
}

/// Textual form of a JSON cell, the same text a row search matches against.
pub fn cell_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn parse_bool(text: &str) -> Option<bool> {
    let trimmed = text.trim();
    if trimmed.eq_ignore_ascii_case("true") {
        Some(true)
    } else if trimmed.eq_ignore_ascii_case("false") {
        Some(false)
    } else {
        None
    }
}

/// Parses a number the way an invariant-culture "any style" parse does.
///
/// Accepts surrounding whitespace, a leading or trailing sign directly
/// attached to the digits, parentheses for negatives (without a second
/// sign), `,` group separators before the decimal point, an exponent and the
/// generic currency sign. Non-finite values are rejected.
pub fn parse_invariant_number(text: &str) -> Option<f64> {
    let mut s = text.trim();
    if s.is_empty() {
        return None;
    }

    let mut negative = false;
    let mut parenthesized = false;

    if let Some(inner) = s.strip_prefix('(').and_then(|rest| rest.strip_suffix(')')) {
        negative = true;
        parenthesized = true;
        s = inner;
    }

    s = s.trim_start_matches('¤').trim_end_matches('¤');

    // Parentheses already carry the sign.
    if !parenthesized {
        if let Some(rest) = s.strip_prefix('-') {
            negative = true;
            s = rest;
        } else if let Some(rest) = s.strip_prefix('+') {
            s = rest;
        } else if let Some(rest) = s.strip_suffix('-') {
            negative = true;
            s = rest;
        } else if let Some(rest) = s.strip_suffix('+') {
            s = rest;
        }
        s = s.trim_start_matches('¤').trim_end_matches('¤');
    }

    // Only digits, separators and an exponent are left to validate.
    if s.is_empty() || !s.starts_with(|c: char| c.is_ascii_digit() || c == '.') {
        return None;
    }

    let (mantissa, exponent) = match s.find(['e', 'E']) {
        Some(idx) => (&s[..idx], Some(&s[idx + 1..])),
        None => (s, None),
    };

    let (integral, fraction) = match mantissa.find('.') {
        Some(idx) => (&mantissa[..idx], Some(&mantissa[idx + 1..])),
        None => (mantissa, None),
    };

    if !integral.chars().all(|c| c.is_ascii_digit() || c == ',') {
        return None;
    }
    let integral: String = integral.chars().filter(|c| *c != ',').collect();

    if let Some(fraction) = fraction {
        if !fraction.chars().all(|c| c.is_ascii_digit()) {
            return None;
        }
    }
    if integral.is_empty() && fraction.map_or(true, str::is_empty) {
        return None;
    }

    let mut normalized = if integral.is_empty() {
        "0".to_string()
    } else {
        integral
    };
    if let Some(fraction) = fraction {
        if !fraction.is_empty() {
            normalized.push('.');
            normalized.push_str(fraction);
        }
    }

    if let Some(exponent) = exponent {
        let digits = exponent
            .strip_prefix(['+', '-'])
            .unwrap_or(exponent);
        if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
            return None;
        }
        normalized.push('e');
        normalized.push_str(exponent);
    }

    let value: f64 = normalized.parse().ok()?;
    if !value.is_finite() {
        return None;
    }

    Some(if negative { -value } else { value })
}
