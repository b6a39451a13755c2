//! Field-level validation errors and the reader that collects them.
//!
//! Validation never stops at the first problem: [`FieldReader`] records an
//! error for every field it reads and keeps going, so callers get the full
//! list in one [`ValidationErrors`].

use core::fmt;
use std::num::IntErrorKind;

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde_json::{Map, Value as Json};

use crate::document::{DecimalParseError, json_kind, parse_decimal};

/// Field path used for errors about the input as a whole.
pub const BODY_FIELD: &str = "body";

/// Why a field failed validation.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum FieldErrorKind {
    /// A required field is absent.
    #[error("field required")]
    Missing,
    /// The field has the wrong JSON type.
    #[error("expected {expected}, found {found}")]
    WrongType {
        expected: &'static str,
        found: &'static str,
    },
    /// Text that must contain something is empty or whitespace.
    #[error("must not be empty")]
    Empty,
    /// A number is below its lower bound.
    #[error("must be greater than or equal to {min}")]
    BelowMinimum { min: String },
    /// A number is above its upper bound.
    #[error("must be less than or equal to {max}")]
    AboveMaximum { max: String },
    /// A list has fewer items than required.
    #[error("must contain at least {min} item(s)")]
    TooFewItems { min: usize },
    /// A number that cannot be held exactly, either too large or too precise.
    #[error("number is out of range or too precise")]
    OutOfRange,
}

impl FieldErrorKind {
    /// Stable machine-readable code for this kind.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Missing => "missing",
            Self::WrongType { .. } => "wrong_type",
            Self::Empty => "empty",
            Self::BelowMinimum { .. } => "below_minimum",
            Self::AboveMaximum { .. } => "above_maximum",
            Self::TooFewItems { .. } => "too_few_items",
            Self::OutOfRange => "out_of_range",
        }
    }
}

/// A single violated field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    /// Dotted path to the field, e.g. `items.0.quantity`.
    pub field: String,
    pub kind: FieldErrorKind,
}

impl FieldError {
    #[must_use]
    pub fn new(field: impl Into<String>, kind: FieldErrorKind) -> Self {
        Self {
            field: field.into(),
            kind,
        }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.kind)
    }
}

/// Every field that failed validation, in the order the fields were read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationErrors(Vec<FieldError>);

impl ValidationErrors {
    /// Wrap a list of field errors.
    #[must_use]
    pub const fn new(errors: Vec<FieldError>) -> Self {
        Self(errors)
    }

    /// A single error about the input as a whole.
    #[must_use]
    pub fn body(kind: FieldErrorKind) -> Self {
        Self(vec![FieldError::new(BODY_FIELD, kind)])
    }

    #[must_use]
    pub fn errors(&self) -> &[FieldError] {
        &self.0
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the error recorded for `field`, if any.
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&FieldErrorKind> {
        self.0.iter().find(|e| e.field == field).map(|e| &e.kind)
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} validation error(s)", self.0.len())?;
        for (i, error) in self.0.iter().enumerate() {
            f.write_str(if i == 0 { ": " } else { "; " })?;
            write!(f, "{error}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

impl IntoIterator for ValidationErrors {
    type Item = FieldError;
    type IntoIter = std::vec::IntoIter<FieldError>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

/// Reads typed fields out of a JSON object, recording every failure.
///
/// Each getter returns `None` exactly when it has recorded an error (or,
/// for optional fields, when the field is absent or `null`). Unknown fields
/// are ignored.
pub struct FieldReader<'a> {
    input: &'a Map<String, Json>,
    prefix: String,
    errors: Vec<FieldError>,
}

impl<'a> FieldReader<'a> {
    /// Create a reader over a top-level object.
    #[must_use]
    pub const fn new(input: &'a Map<String, Json>) -> Self {
        Self {
            input,
            prefix: String::new(),
            errors: Vec::new(),
        }
    }

    fn nested(input: &'a Map<String, Json>, prefix: String) -> Self {
        Self {
            input,
            prefix,
            errors: Vec::new(),
        }
    }

    fn path(&self, name: &str) -> String {
        if self.prefix.is_empty() {
            name.to_owned()
        } else {
            format!("{}.{name}", self.prefix)
        }
    }

    fn fail(&mut self, name: &str, kind: FieldErrorKind) {
        let field = self.path(name);
        self.errors.push(FieldError::new(field, kind));
    }

    fn wrong_type(&mut self, name: &str, expected: &'static str, found: &Json) {
        self.fail(
            name,
            FieldErrorKind::WrongType {
                expected,
                found: json_kind(found),
            },
        );
    }

    /// Present, non-null field value; records `Missing` when absent and a type
    /// error when `null`.
    fn required(&mut self, name: &str, expected: &'static str) -> Option<&'a Json> {
        let input = self.input;
        match input.get(name) {
            None => {
                self.fail(name, FieldErrorKind::Missing);
                None
            }
            Some(Json::Null) => {
                self.wrong_type(name, expected, &Json::Null);
                None
            }
            Some(value) => Some(value),
        }
    }

    /// Present, non-null field value, or `None` without an error.
    fn optional(&self, name: &str) -> Option<&'a Json> {
        let input = self.input;
        input.get(name).filter(|v| !v.is_null())
    }

    fn text_value(&mut self, name: &str, value: &Json) -> Option<String> {
        if let Json::String(s) = value {
            Some(s.clone())
        } else {
            self.wrong_type(name, "string", value);
            None
        }
    }

    /// Required text; empty strings are allowed.
    pub fn required_text(&mut self, name: &str) -> Option<String> {
        let value = self.required(name, "string")?;
        self.text_value(name, value)
    }

    /// Required text that must contain a non-whitespace character.
    pub fn non_empty_text(&mut self, name: &str) -> Option<String> {
        let text = self.required_text(name)?;
        if text.trim().is_empty() {
            self.fail(name, FieldErrorKind::Empty);
            return None;
        }
        Some(text)
    }

    /// Optional text; absent and `null` both read as `None`.
    pub fn optional_text(&mut self, name: &str) -> Option<String> {
        let value = self.optional(name)?;
        self.text_value(name, value)
    }

    /// Boolean with a default for when the field is absent.
    pub fn bool_or(&mut self, name: &str, default: bool) -> Option<bool> {
        let input = self.input;
        match input.get(name) {
            None => Some(default),
            Some(Json::Bool(b)) => Some(*b),
            Some(other) => {
                self.wrong_type(name, "bool", other);
                None
            }
        }
    }

    /// Text with a default for when the field is absent.
    pub fn text_or(&mut self, name: &str, default: &str) -> Option<String> {
        let input = self.input;
        match input.get(name) {
            None => Some(default.to_owned()),
            Some(value) => self.text_value(name, value),
        }
    }

    /// Records the error for a number that failed to parse.
    fn number_failed(
        &mut self,
        name: &str,
        expected: &'static str,
        value: &Json,
        error: DecimalParseError,
    ) {
        match error {
            DecimalParseError::OutOfRange => self.fail(name, FieldErrorKind::OutOfRange),
            DecimalParseError::NotANumber => self.wrong_type(name, expected, value),
        }
    }

    /// Exact decimal from a JSON number or numeric string. Values that would
    /// need rounding are rejected, never rounded.
    fn decimal_value(&mut self, name: &str, value: &Json) -> Option<Decimal> {
        let parsed = match value {
            Json::Number(n) => parse_decimal(&n.to_string()),
            Json::String(s) => parse_decimal(s.trim()),
            _ => Err(DecimalParseError::NotANumber),
        };
        match parsed {
            Ok(number) => Some(number),
            Err(e) => {
                self.number_failed(name, "decimal", value, e);
                None
            }
        }
    }

    /// Required decimal that must be at least `min`.
    pub fn decimal_at_least(&mut self, name: &str, min: Decimal) -> Option<Decimal> {
        let value = self.required(name, "decimal")?;
        let decimal = self.decimal_value(name, value)?;
        if decimal < min {
            self.fail(
                name,
                FieldErrorKind::BelowMinimum {
                    min: min.to_string(),
                },
            );
            return None;
        }
        Some(decimal)
    }

    fn integer_value(&mut self, name: &str, value: &Json) -> Option<i64> {
        let parsed = match value {
            Json::Number(n) => n.as_i64().map_or_else(
                || match parse_decimal(&n.to_string()) {
                    Ok(d) if d.fract().is_zero() => {
                        d.to_i64().ok_or(DecimalParseError::OutOfRange)
                    }
                    Ok(_) => Err(DecimalParseError::NotANumber),
                    Err(e) => Err(e),
                },
                Ok,
            ),
            Json::String(s) => s.trim().parse::<i64>().map_err(|e| match e.kind() {
                IntErrorKind::PosOverflow | IntErrorKind::NegOverflow => {
                    DecimalParseError::OutOfRange
                }
                _ => DecimalParseError::NotANumber,
            }),
            _ => Err(DecimalParseError::NotANumber),
        };
        match parsed {
            Ok(number) => Some(number),
            Err(e) => {
                self.number_failed(name, "integer", value, e);
                None
            }
        }
    }

    fn check_bounds(&mut self, name: &str, value: i64, min: i64, max: Option<i64>) -> Option<i64> {
        if value < min {
            self.fail(
                name,
                FieldErrorKind::BelowMinimum {
                    min: min.to_string(),
                },
            );
            return None;
        }
        if let Some(max) = max.filter(|max| value > *max) {
            self.fail(
                name,
                FieldErrorKind::AboveMaximum {
                    max: max.to_string(),
                },
            );
            return None;
        }
        Some(value)
    }

    /// Required integer that must be at least `min`.
    pub fn integer_at_least(&mut self, name: &str, min: i64) -> Option<i64> {
        let value = self.required(name, "integer")?;
        let integer = self.integer_value(name, value)?;
        self.check_bounds(name, integer, min, None)
    }

    /// Optional integer within `[min, max]`.
    pub fn optional_integer_between(&mut self, name: &str, min: i64, max: i64) -> Option<i64> {
        let value = self.optional(name)?;
        let integer = self.integer_value(name, value)?;
        self.check_bounds(name, integer, min, Some(max))
    }

    /// List of text labels, empty when absent.
    pub fn text_list_or_empty(&mut self, name: &str) -> Option<Vec<String>> {
        let input = self.input;
        let items = match input.get(name) {
            None => return Some(Vec::new()),
            Some(Json::Array(items)) => items,
            Some(other) => {
                self.wrong_type(name, "array", other);
                return None;
            }
        };

        let before = self.errors.len();
        let texts: Vec<String> = items
            .iter()
            .enumerate()
            .filter_map(|(i, item)| self.text_value(&format!("{name}.{i}"), item))
            .collect();
        (self.errors.len() == before).then_some(texts)
    }

    /// Required list of objects with at least `min_items` entries, each read
    /// by `read_item` with its own nested reader.
    pub fn object_list<T>(
        &mut self,
        name: &str,
        min_items: usize,
        read_item: impl Fn(&mut FieldReader<'a>) -> Option<T>,
    ) -> Option<Vec<T>> {
        let value = self.required(name, "array")?;
        let Json::Array(items) = value else {
            self.wrong_type(name, "array", value);
            return None;
        };

        if items.len() < min_items {
            self.fail(name, FieldErrorKind::TooFewItems { min: min_items });
            return None;
        }

        let before = self.errors.len();
        let mut parsed = Vec::with_capacity(items.len());
        for (i, item) in items.iter().enumerate() {
            let item_name = format!("{name}.{i}");
            let Json::Object(fields) = item else {
                self.wrong_type(&item_name, "object", item);
                continue;
            };
            let mut reader = FieldReader::nested(fields, self.path(&item_name));
            let result = read_item(&mut reader);
            self.errors.append(&mut reader.errors);
            parsed.extend(result);
        }
        (self.errors.len() == before).then_some(parsed)
    }

    /// Finish reading: the collected errors, or the value built by `build`.
    ///
    /// `build` is only called when every field read cleanly, so it can use
    /// `?` on the getters' results.
    ///
    /// # Errors
    ///
    /// Returns every recorded field error.
    pub fn finish<T>(self, build: impl FnOnce() -> Option<T>) -> Result<T, ValidationErrors> {
        if !self.errors.is_empty() {
            return Err(ValidationErrors(self.errors));
        }
        build().ok_or_else(|| ValidationErrors::body(FieldErrorKind::Missing))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    fn object(value: Json) -> Map<String, Json> {
        match value {
            Json::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn test_collects_every_error() {
        let input = object(json!({"title": "", "price": "abc", "flag": 3}));
        let mut reader = FieldReader::new(&input);
        assert!(reader.non_empty_text("title").is_none());
        assert!(reader.decimal_at_least("price", Decimal::ZERO).is_none());
        assert!(reader.bool_or("flag", false).is_none());
        assert!(reader.required_text("missing").is_none());

        let errors = reader.finish(|| Some(())).unwrap_err();
        assert_eq!(errors.len(), 4);
        assert_eq!(errors.get("title"), Some(&FieldErrorKind::Empty));
        assert_eq!(
            errors.get("price"),
            Some(&FieldErrorKind::WrongType {
                expected: "decimal",
                found: "string"
            })
        );
        assert_eq!(errors.get("missing"), Some(&FieldErrorKind::Missing));
    }

    #[test]
    fn test_null_optional_reads_as_absent() {
        let input = object(json!({"description": null}));
        let mut reader = FieldReader::new(&input);
        assert_eq!(reader.optional_text("description"), None);
        assert!(reader.errors.is_empty());
    }

    #[test]
    fn test_null_required_is_wrong_type() {
        let input = object(json!({"title": null}));
        let mut reader = FieldReader::new(&input);
        assert_eq!(reader.required_text("title"), None);
        let errors = reader.errors;
        assert_eq!(
            errors[0].kind,
            FieldErrorKind::WrongType {
                expected: "string",
                found: "null"
            }
        );
    }

    #[test]
    fn test_decimal_accepts_numeric_string() {
        let input = object(json!({"price": " 19.90 "}));
        let mut reader = FieldReader::new(&input);
        assert_eq!(
            reader.decimal_at_least("price", Decimal::ZERO),
            Some(Decimal::new(1990, 2))
        );
    }

    #[test]
    fn test_decimal_never_rounds_tiny_negative() {
        let input = object(
            serde_json::from_str(
                r#"{
                    "price": -0.00000000000000000000000000000001,
                    "total": "-0.00000000000000000000000000000001"
                }"#,
            )
            .unwrap(),
        );
        let mut reader = FieldReader::new(&input);
        assert_eq!(reader.decimal_at_least("price", Decimal::ZERO), None);
        assert_eq!(reader.decimal_at_least("total", Decimal::ZERO), None);
        assert_eq!(reader.errors[0].kind, FieldErrorKind::OutOfRange);
        assert_eq!(reader.errors[1].kind, FieldErrorKind::OutOfRange);
    }

    #[test]
    fn test_decimal_out_of_range_is_not_wrong_type() {
        let input = object(
            serde_json::from_str(
                r#"{"big": 79228162514264337593543950336, "huge": "1e400", "word": "cheap"}"#,
            )
            .unwrap(),
        );
        let mut reader = FieldReader::new(&input);
        assert_eq!(reader.decimal_at_least("big", Decimal::ZERO), None);
        assert_eq!(reader.decimal_at_least("huge", Decimal::ZERO), None);
        assert_eq!(reader.decimal_at_least("word", Decimal::ZERO), None);

        let codes: Vec<_> = reader.errors.iter().map(|e| e.kind.code()).collect();
        assert_eq!(codes, vec!["out_of_range", "out_of_range", "wrong_type"]);
    }

    #[test]
    fn test_decimal_accepts_exponent_and_padded_zeros() {
        let input = object(json!({
            "a": "4.25e1",
            "b": "1.50000000000000000000000000000000",
            "c": "0e999999"
        }));
        let mut reader = FieldReader::new(&input);
        assert_eq!(reader.decimal_at_least("a", Decimal::ZERO), Some(Decimal::new(425, 1)));
        assert_eq!(reader.decimal_at_least("b", Decimal::ZERO), Some(Decimal::new(15, 1)));
        assert_eq!(reader.decimal_at_least("c", Decimal::ZERO), Some(Decimal::ZERO));
        assert!(reader.errors.is_empty());
    }

    #[test]
    fn test_integer_overflow_is_out_of_range() {
        let input = object(json!({"a": "99999999999999999999", "b": 1e30, "c": "many"}));
        let mut reader = FieldReader::new(&input);
        assert_eq!(reader.integer_at_least("a", 1), None);
        assert_eq!(reader.integer_at_least("b", 1), None);
        assert_eq!(reader.integer_at_least("c", 1), None);

        let codes: Vec<_> = reader.errors.iter().map(|e| e.kind.code()).collect();
        assert_eq!(codes, vec!["out_of_range", "out_of_range", "wrong_type"]);
    }

    #[test]
    fn test_integer_accepts_integral_number() {
        let input = object(json!({"a": 3, "b": 3.0, "c": 3.5}));
        let mut reader = FieldReader::new(&input);
        assert_eq!(reader.integer_at_least("a", 1), Some(3));
        assert_eq!(reader.integer_at_least("b", 1), Some(3));
        assert_eq!(reader.integer_at_least("c", 1), None);
    }

    #[test]
    fn test_integer_bounds() {
        let input = object(json!({"low": -1, "high": 121, "ok": 40}));
        let mut reader = FieldReader::new(&input);
        assert_eq!(reader.optional_integer_between("low", 0, 120), None);
        assert_eq!(reader.optional_integer_between("high", 0, 120), None);
        assert_eq!(reader.optional_integer_between("ok", 0, 120), Some(40));
        let errors = reader.errors;
        assert_eq!(errors[0].kind, FieldErrorKind::BelowMinimum { min: "0".into() });
        assert_eq!(errors[1].kind, FieldErrorKind::AboveMaximum { max: "120".into() });
    }

    #[test]
    fn test_text_list_reports_element_paths() {
        let input = object(json!({"tags": ["vegan", 7, "sour", false]}));
        let mut reader = FieldReader::new(&input);
        assert_eq!(reader.text_list_or_empty("tags"), None);
        let fields: Vec<_> = reader.errors.into_iter().map(|e| e.field).collect();
        assert_eq!(fields, vec!["tags.1", "tags.3"]);
    }

    #[test]
    fn test_object_list_nests_paths() {
        let input = object(json!({"items": [{"n": 1}, {"n": 0}, "x"]}));
        let mut reader = FieldReader::new(&input);
        let result = reader.object_list("items", 1, |item| item.integer_at_least("n", 1));
        assert!(result.is_none());
        let fields: Vec<_> = reader.errors.into_iter().map(|e| e.field).collect();
        assert_eq!(fields, vec!["items.1.n", "items.2"]);
    }

    #[test]
    fn test_object_list_min_items() {
        let input = object(json!({"items": []}));
        let mut reader = FieldReader::new(&input);
        let result = reader.object_list("items", 1, |item| item.integer_at_least("n", 1));
        assert!(result.is_none());
        assert_eq!(
            reader.errors[0].kind,
            FieldErrorKind::TooFewItems { min: 1 }
        );
    }

    #[test]
    fn test_display_lists_fields() {
        let errors = ValidationErrors::new(vec![
            FieldError::new("title", FieldErrorKind::Empty),
            FieldError::new("price", FieldErrorKind::Missing),
        ]);
        assert_eq!(
            errors.to_string(),
            "2 validation error(s): title: must not be empty; price: field required"
        );
    }
}
