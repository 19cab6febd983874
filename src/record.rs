// src/record.rs

//! Schemaless records and value normalization.
//!
//! A `Record` is an ordered map from field name to JSON value. Records from
//! the source extracts and rows loaded from the target store share this
//! representation so both sides go through the same normalization before
//! they are compared.

use rusqlite::types::{Value as SqlValue, ValueRef};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};
use std::collections::BTreeMap;

/// Largest decimal exponent expanded into plain digits
const MAX_EXPONENT: u32 = 400;

/// A single record: field name -> value
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record {
    fields: BTreeMap<String, Value>,
}

impl Record {
    /// Create an empty record
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a record from a JSON object
    pub fn from_object(object: Map<String, Value>) -> Self {
        Self {
            fields: object.into_iter().collect(),
        }
    }

    /// Build a record from a JSON value, if it is an object
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(object) => Some(Self::from_object(object)),
            _ => None,
        }
    }

    /// Get a field value
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    /// Get a field, treating an absent field as null
    pub fn get_or_null(&self, field: &str) -> &Value {
        self.fields.get(field).unwrap_or(&Value::Null)
    }

    /// Set a field value
    pub fn insert(&mut self, field: impl Into<String>, value: Value) {
        self.fields.insert(field.into(), value);
    }

    /// Check if a field is present
    pub fn contains(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    /// Number of fields
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Iterate fields in name order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// The string-coerced key stored in `field`, if it is a usable key
    pub fn key(&self, field: &str) -> Option<String> {
        self.get(field).and_then(key_string)
    }
}

impl<K: Into<String>> FromIterator<(K, Value)> for Record {
    fn from_iter<I: IntoIterator<Item = (K, Value)>>(iter: I) -> Self {
        Self {
            fields: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

/// A value reduced to its comparable form
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Normalized {
    Null,
    /// Canonical decimal text: no exponent, no leading or trailing zeros
    Number(String),
    Text(String),
}

/// Normalize a value for comparison
///
/// Null and blank strings collapse to `Null` and booleans become `1`/`0`.
/// Numbers and plain decimal strings become canonical decimal text, so
/// `100.50` and `100.5` agree while two 19-digit ids never do. Strings with
/// a leading `+`, a leading zero (`0150`) or an exponent stay text. Nested
/// structures become canonical JSON text and every other string is trimmed.
pub fn normalize(value: &Value) -> Normalized {
    match value {
        Value::Null => Normalized::Null,
        Value::Bool(b) => Normalized::Number(if *b { "1" } else { "0" }.to_string()),
        Value::Number(n) => {
            let text = n.to_string();
            canonical_decimal(&text, true)
                .map(Normalized::Number)
                .unwrap_or(Normalized::Text(text))
        }
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                Normalized::Null
            } else if let Some(number) = canonical_decimal(trimmed, false) {
                Normalized::Number(number)
            } else {
                Normalized::Text(trimmed.to_string())
            }
        }
        Value::Array(_) | Value::Object(_) => Normalized::Text(value.to_string()),
    }
}

/// Rewrite `-?digits(.digits)?(e[+-]?digits)?` as plain canonical decimal text
fn canonical_decimal(s: &str, allow_exponent: bool) -> Option<String> {
    let (negative, body) = match s.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, s),
    };

    let (mantissa, exponent) = match body.find(['e', 'E']) {
        Some(_) if !allow_exponent => return None,
        Some(pos) => (&body[..pos], body[pos + 1..].parse::<i64>().ok()?),
        None => (body, 0),
    };
    if exponent.unsigned_abs() > u64::from(MAX_EXPONENT) {
        return None;
    }

    let (int_part, frac_part) = match mantissa.split_once('.') {
        Some((_, "")) => return None,
        Some((int_part, frac_part)) => (int_part, frac_part),
        None => (mantissa, ""),
    };
    let all_digits = |part: &str| part.bytes().all(|b| b.is_ascii_digit());
    if int_part.is_empty() || !all_digits(int_part) || !all_digits(frac_part) {
        return None;
    }
    if int_part.len() > 1 && int_part.starts_with('0') {
        return None;
    }

    let digits = format!("{int_part}{frac_part}");
    let point = int_part.len() as i64 + exponent;
    let (whole, fraction) = if point <= 0 {
        ("0".to_string(), format!("{}{digits}", "0".repeat(point.unsigned_abs() as usize)))
    } else if point as usize >= digits.len() {
        let padding = "0".repeat(point as usize - digits.len());
        (format!("{digits}{padding}"), String::new())
    } else {
        let (whole, fraction) = digits.split_at(point as usize);
        (whole.to_string(), fraction.to_string())
    };

    let whole = match whole.trim_start_matches('0') {
        "" => "0",
        trimmed => trimmed,
    };
    let fraction = fraction.trim_end_matches('0');

    let mut canonical = String::new();
    if negative && (whole != "0" || !fraction.is_empty()) {
        canonical.push('-');
    }
    canonical.push_str(whole);
    if !fraction.is_empty() {
        canonical.push('.');
        canonical.push_str(fraction);
    }
    Some(canonical)
}

/// Compare two values after normalization
pub fn values_equal(left: &Value, right: &Value) -> bool {
    normalize(left) == normalize(right)
}

/// Coerce a primary-key value to its string form
///
/// Returns `None` for values that cannot identify a record: null, blank
/// strings and nested structures.
pub fn key_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        Value::Number(n) => Some(number_key(n)),
        Value::Bool(b) => Some(if *b { "1" } else { "0" }.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

/// Integral floats render without a fractional part so `1.0` and `1` agree
fn number_key(n: &Number) -> String {
    if let Some(i) = n.as_i64() {
        return i.to_string();
    }
    if let Some(u) = n.as_u64() {
        return u.to_string();
    }
    match n.as_f64() {
        Some(f) if f.fract() == 0.0 && f.abs() < i64::MAX as f64 => (f as i64).to_string(),
        _ => n.to_string(),
    }
}

/// Convert a SQLite value to a JSON value
pub fn from_sql(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => Value::from(i),
        ValueRef::Real(f) => Number::from_f64(f).map(Value::Number).unwrap_or(Value::Null),
        ValueRef::Text(bytes) => Value::String(String::from_utf8_lossy(bytes).into_owned()),
        ValueRef::Blob(bytes) => Value::String(String::from_utf8_lossy(bytes).into_owned()),
    }
}

/// Convert a JSON value to a SQLite value for writing
pub fn to_sql(value: &Value) -> SqlValue {
    match value {
        Value::Null => SqlValue::Null,
        Value::Bool(b) => SqlValue::Integer(i64::from(*b)),
        Value::Number(n) => match n.as_i64() {
            Some(i) => SqlValue::Integer(i),
            None => n
                .as_f64()
                .map(SqlValue::Real)
                .unwrap_or_else(|| SqlValue::Text(n.to_string())),
        },
        Value::String(s) => SqlValue::Text(s.clone()),
        Value::Array(_) | Value::Object(_) => SqlValue::Text(value.to_string()),
    }
}
