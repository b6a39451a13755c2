//! User schema.
//!
//! Defined for completeness; no endpoint creates or lists users.

use serde_json::{Map, Value as Json};

use super::{FieldReader, Schema, ValidationErrors};
use crate::document::Document;

/// Youngest allowed age.
pub const MIN_AGE: i64 = 0;
/// Oldest allowed age.
pub const MAX_AGE: i64 = 120;

/// A registered user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    /// Full name.
    pub name: String,
    pub email: String,
    pub address: String,
    /// Age in years, within `[0, 120]` when given.
    pub age: Option<i64>,
    /// Defaults to `true`.
    pub is_active: bool,
}

impl Schema for User {
    const NAME: &'static str = "User";

    fn validate_fields(input: &Map<String, Json>) -> Result<Self, ValidationErrors> {
        let mut fields = FieldReader::new(input);
        let name = fields.required_text("name");
        let email = fields.required_text("email");
        let address = fields.required_text("address");
        let age = fields.optional_integer_between("age", MIN_AGE, MAX_AGE);
        let is_active = fields.bool_or("is_active", true);

        fields.finish(|| {
            Some(Self {
                name: name?,
                email: email?,
                address: address?,
                age,
                is_active: is_active?,
            })
        })
    }

    fn to_document(&self) -> Document {
        Document::new()
            .with("name", self.name.as_str())
            .with("email", self.email.as_str())
            .with("address", self.address.as_str())
            .with("age", self.age)
            .with("is_active", self.is_active)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::schema::FieldErrorKind;

    #[test]
    fn test_defaults() {
        let user = User::validate(&json!({
            "name": "Astrid Lindgren",
            "email": "astrid@example.se",
            "address": "Dalagatan 46, Stockholm"
        }))
        .unwrap();
        assert!(user.is_active);
        assert_eq!(user.age, None);
    }

    #[test]
    fn test_age_bounds_are_inclusive() {
        let base = json!({"name": "A", "email": "a@b.c", "address": "x"});
        for age in [0, 120] {
            let mut input = base.clone();
            input["age"] = json!(age);
            assert_eq!(User::validate(&input).unwrap().age, Some(age));
        }
    }

    #[test]
    fn test_age_out_of_range() {
        let errors = User::validate(&json!({
            "name": "A", "email": "a@b.c", "address": "x", "age": 121
        }))
        .unwrap_err();
        assert_eq!(
            errors.get("age"),
            Some(&FieldErrorKind::AboveMaximum { max: "120".into() })
        );
    }
}
