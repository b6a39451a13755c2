//! Typed documents exchanged with document stores.
//!
//! A [`Document`] is a string-keyed map whose values are restricted to the
//! kinds in [`Value`]. Entities are converted into documents before they are
//! stored, and stored documents come back as the same type, so nothing
//! untyped crosses the store boundary.
//!
//! Decimals are kept as [`Decimal`] and written to JSON as exact numbers;
//! `42.50` leaves the process as `42.50`, never as a binary float.

use std::collections::BTreeMap;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Serialize, Serializer};

/// Errors that can occur when converting JSON into a [`Document`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum DocumentError {
    /// A number cannot be represented as an `i64` or a `Decimal`.
    #[error("number {0} is outside the supported range")]
    UnsupportedNumber(String),
    /// The top-level JSON value is not an object.
    #[error("expected a JSON object, found {0}")]
    NotAnObject(&'static str),
}

/// A single value inside a [`Document`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Null,
    Bool(bool),
    Integer(i64),
    Decimal(Decimal),
    Text(String),
    List(Vec<Value>),
    Document(Document),
}

impl Value {
    /// Compare two values the way store filters do.
    ///
    /// Identical to `==` except that integers and decimals compare by
    /// numeric value, so `Integer(5)` is equivalent to `Decimal(5.0)`.
    #[must_use]
    pub fn equivalent(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Integer(a), Self::Decimal(b)) | (Self::Decimal(b), Self::Integer(a)) => {
                Decimal::from(*a) == *b
            }
            (Self::List(a), Self::List(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.equivalent(y))
            }
            _ => self == other,
        }
    }

    /// Returns the decimal if this is a numeric value.
    #[must_use]
    pub fn as_decimal(&self) -> Option<Decimal> {
        match self {
            Self::Decimal(d) => Some(*d),
            Self::Integer(i) => Some(Decimal::from(*i)),
            _ => None,
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<Decimal> for Value {
    fn from(value: Decimal) -> Self {
        Self::Decimal(value)
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

impl From<Document> for Value {
    fn from(value: Document) -> Self {
        Self::Document(value)
    }
}

impl<T: Into<Self>> From<Vec<T>> for Value {
    fn from(values: Vec<T>) -> Self {
        Self::List(values.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Self>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

impl TryFrom<serde_json::Value> for Value {
    type Error = DocumentError;

    fn try_from(json: serde_json::Value) -> Result<Self, Self::Error> {
        Ok(match json {
            serde_json::Value::Null => Self::Null,
            serde_json::Value::Bool(b) => Self::Bool(b),
            serde_json::Value::Number(n) => number_to_value(&n)?,
            serde_json::Value::String(s) => Self::Text(s),
            serde_json::Value::Array(items) => Self::List(
                items
                    .into_iter()
                    .map(Self::try_from)
                    .collect::<Result<_, _>>()?,
            ),
            serde_json::Value::Object(map) => Self::Document(Document::try_from(map)?),
        })
    }
}

impl From<Value> for serde_json::Value {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => Self::Null,
            Value::Bool(b) => Self::Bool(b),
            Value::Integer(i) => Self::Number(i.into()),
            Value::Decimal(d) => decimal_to_json(d),
            Value::Text(s) => Self::String(s),
            Value::List(items) => Self::Array(items.into_iter().map(Into::into).collect()),
            Value::Document(doc) => Self::Object(doc.into()),
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Null => serializer.serialize_unit(),
            Self::Bool(b) => serializer.serialize_bool(*b),
            Self::Integer(i) => serializer.serialize_i64(*i),
            Self::Decimal(d) => decimal_to_json(*d).serialize(serializer),
            Self::Text(s) => serializer.serialize_str(s),
            Self::List(items) => items.serialize(serializer),
            Self::Document(doc) => doc.serialize(serializer),
        }
    }
}

/// A typed key-value document.
///
/// Keys are kept sorted, which gives documents a stable JSON rendering.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Document(BTreeMap<String, Value>);

impl Document {
    /// Create an empty document.
    #[must_use]
    pub const fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// Builder-style insert.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    /// Insert a value, returning the previous value for the key.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.0.insert(key.into(), value.into())
    }

    /// Get the value for a key.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Remove a key, returning its value.
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.0.remove(key)
    }

    /// Returns `true` if the document has a value for the key.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate over fields in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    /// Convert into a JSON value.
    #[must_use]
    pub fn into_json(self) -> serde_json::Value {
        serde_json::Value::Object(self.into())
    }
}

impl FromIterator<(String, Value)> for Document {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl IntoIterator for Document {
    type Item = (String, Value);
    type IntoIter = std::collections::btree_map::IntoIter<String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl TryFrom<serde_json::Map<String, serde_json::Value>> for Document {
    type Error = DocumentError;

    fn try_from(map: serde_json::Map<String, serde_json::Value>) -> Result<Self, Self::Error> {
        map.into_iter()
            .map(|(key, json)| Value::try_from(json).map(|value| (key, value)))
            .collect()
    }
}

impl TryFrom<serde_json::Value> for Document {
    type Error = DocumentError;

    fn try_from(json: serde_json::Value) -> Result<Self, Self::Error> {
        match json {
            serde_json::Value::Object(map) => Self::try_from(map),
            other => Err(DocumentError::NotAnObject(json_kind(&other))),
        }
    }
}

impl From<Document> for serde_json::Map<String, serde_json::Value> {
    fn from(doc: Document) -> Self {
        doc.0.into_iter().map(|(k, v)| (k, v.into())).collect()
    }
}

impl From<Document> for serde_json::Value {
    fn from(doc: Document) -> Self {
        doc.into_json()
    }
}

/// Short name of a JSON value's kind.
pub(crate) const fn json_kind(json: &serde_json::Value) -> &'static str {
    match json {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "bool",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}

/// Largest scale a [`Decimal`] can carry.
const MAX_DECIMAL_SCALE: i64 = 28;

/// Why text could not be read as an exact [`Decimal`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum DecimalParseError {
    /// The text is not a number literal at all.
    NotANumber,
    /// A number literal whose value a `Decimal` cannot hold without rounding.
    OutOfRange,
}

/// Parse decimal text, accepting plain (`42.50`) and scientific (`4.25e1`) forms.
///
/// Never rounds: a literal with more significant digits than a `Decimal`
/// holds, or a magnitude beyond its range, is [`DecimalParseError::OutOfRange`].
pub(crate) fn parse_decimal(text: &str) -> Result<Decimal, DecimalParseError> {
    if !is_number_literal(text) {
        return Err(DecimalParseError::NotANumber);
    }
    match text.split_once(['e', 'E']) {
        None => parse_plain_decimal(text),
        Some((mantissa, exponent)) => {
            let mantissa = parse_plain_decimal(mantissa)?;
            let exponent: i64 = exponent
                .parse()
                .map_err(|_| DecimalParseError::OutOfRange)?;
            shift_decimal(mantissa, exponent)
        }
    }
}

/// Optional sign, digits with an optional fraction, optional exponent.
fn is_number_literal(text: &str) -> bool {
    let all_digits = |s: &str| s.bytes().all(|b| b.is_ascii_digit());
    let (mantissa, exponent) = match text.split_once(['e', 'E']) {
        Some((mantissa, exponent)) => (mantissa, Some(exponent)),
        None => (text, None),
    };

    let unsigned = mantissa.strip_prefix(['+', '-']).unwrap_or(mantissa);
    let (int, frac) = unsigned.split_once('.').unwrap_or((unsigned, ""));
    let mantissa_ok = !(int.is_empty() && frac.is_empty()) && all_digits(int) && all_digits(frac);

    let exponent_ok = exponent.is_none_or(|e| {
        let digits = e.strip_prefix(['+', '-']).unwrap_or(e);
        !digits.is_empty() && all_digits(digits)
    });

    mantissa_ok && exponent_ok
}

fn parse_plain_decimal(text: &str) -> Result<Decimal, DecimalParseError> {
    if let Ok(d) = Decimal::from_str_exact(text) {
        return Ok(d);
    }
    // Trailing fractional zeros add scale but no value.
    let Some((int, frac)) = text.split_once('.') else {
        return Err(DecimalParseError::OutOfRange);
    };
    let frac = frac.trim_end_matches('0');
    let trimmed = match (int.trim_start_matches(['+', '-']).is_empty(), frac.is_empty()) {
        (true, true) => format!("{int}0"),
        (false, true) => int.to_owned(),
        (true, false) => format!("{int}0.{frac}"),
        (false, false) => format!("{int}.{frac}"),
    };
    Decimal::from_str_exact(&trimmed).map_err(|_| DecimalParseError::OutOfRange)
}

/// `mantissa * 10^exponent`, exactly.
fn shift_decimal(mantissa: Decimal, exponent: i64) -> Result<Decimal, DecimalParseError> {
    let value = mantissa.normalize();
    if value.is_zero() {
        return Ok(Decimal::ZERO);
    }

    let scale = i64::from(value.scale()).saturating_sub(exponent);
    if scale > MAX_DECIMAL_SCALE {
        return Err(DecimalParseError::OutOfRange);
    }

    let mut digits = value.mantissa();
    let mut remaining = (-scale).max(0);
    while remaining > 0 {
        digits = digits
            .checked_mul(10)
            .ok_or(DecimalParseError::OutOfRange)?;
        remaining -= 1;
    }

    let scale = u32::try_from(scale.max(0)).map_err(|_| DecimalParseError::OutOfRange)?;
    Decimal::try_from_i128_with_scale(digits, scale).map_err(|_| DecimalParseError::OutOfRange)
}

fn number_to_value(n: &serde_json::Number) -> Result<Value, DocumentError> {
    if let Some(i) = n.as_i64() {
        return Ok(Value::Integer(i));
    }
    let text = n.to_string();
    parse_decimal(&text)
        .map(Value::Decimal)
        .map_err(|_| DocumentError::UnsupportedNumber(text))
}

fn decimal_to_json(d: Decimal) -> serde_json::Value {
    let text = d.to_string();
    match serde_json::Number::from_str(&text) {
        Ok(n) => serde_json::Value::Number(n),
        Err(_) => serde_json::Value::String(text),
    }
}
