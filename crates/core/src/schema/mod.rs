//! Entity schemas and their validation contracts.
//!
//! Each entity declares its fields, defaults and constraints by implementing
//! [`Schema`]. Validation is pure: raw JSON goes in, and either a typed
//! entity or the complete list of field errors comes out.
//!
//! | Entity | Collection | Endpoint |
//! |---|---|---|
//! | [`CandyBox`] | `candybox` | `/api/boxes` |
//! | [`Order`] | `order` | `/api/orders` |
//! | [`User`] | `user` | none |

pub mod candy_box;
pub mod order;
pub mod user;
pub mod validate;

use serde_json::{Map, Value as Json};

use crate::document::{Document, json_kind};
use crate::types::CollectionName;

pub use candy_box::CandyBox;
pub use order::{DEFAULT_ORDER_STATUS, KNOWN_ORDER_STATUSES, Order, OrderItem};
pub use user::User;
pub use validate::{FieldError, FieldErrorKind, FieldReader, ValidationErrors};

/// A persistable entity with a validation contract.
pub trait Schema: Sized {
    /// Entity name; the collection name is its lowercase form.
    const NAME: &'static str;

    /// Collection this entity is stored in.
    #[must_use]
    fn collection() -> CollectionName {
        CollectionName::from_entity_name(Self::NAME)
    }

    /// Validate the fields of a JSON object.
    ///
    /// # Errors
    ///
    /// Returns every field that is missing or violates a constraint.
    fn validate_fields(input: &Map<String, Json>) -> Result<Self, ValidationErrors>;

    /// Validate raw JSON input, which must be an object.
    ///
    /// # Errors
    ///
    /// Returns a single body-level error when the input is not an object,
    /// otherwise every violated field.
    fn validate(input: &Json) -> Result<Self, ValidationErrors> {
        match input {
            Json::Object(fields) => Self::validate_fields(fields),
            other => Err(ValidationErrors::body(FieldErrorKind::WrongType {
                expected: "object",
                found: json_kind(other),
            })),
        }
    }

    /// Serialize the validated entity into a document.
    fn to_document(&self) -> Document;
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_collection_names_are_lowercased_entity_names() {
        assert_eq!(CandyBox::collection().as_str(), "candybox");
        assert_eq!(Order::collection().as_str(), "order");
        assert_eq!(User::collection().as_str(), "user");
    }

    #[test]
    fn test_collection_names_pass_parsing() {
        for name in [CandyBox::collection(), Order::collection(), User::collection()] {
            assert!(CollectionName::parse(name.as_str()).is_ok());
        }
    }

    #[test]
    fn test_validate_rejects_non_object() {
        let errors = CandyBox::validate(&json!(["not", "an", "object"])).unwrap_err();
        assert_eq!(
            errors.get(validate::BODY_FIELD),
            Some(&FieldErrorKind::WrongType {
                expected: "object",
                found: "array"
            })
        );
    }
}
