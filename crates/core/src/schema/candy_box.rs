//! Candy box schema.

use rust_decimal::Decimal;
use serde_json::{Map, Value as Json};

use super::{FieldReader, Schema, ValidationErrors};
use crate::document::Document;

/// A purchasable bundle of sweets.
///
/// ## Fields
///
/// | Field | Type | Rule |
/// |---|---|---|
/// | `title` | text | required, not blank |
/// | `description` | text | optional |
/// | `price` | decimal | required, `>= 0` |
/// | `is_limited` | bool | default `false` |
/// | `tags` | list of text | default empty; used for filtering |
/// | `image` | text | optional cover image URL |
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandyBox {
    pub title: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub is_limited: bool,
    pub tags: Vec<String>,
    pub image: Option<String>,
}

impl Schema for CandyBox {
    const NAME: &'static str = "CandyBox";

    fn validate_fields(input: &Map<String, Json>) -> Result<Self, ValidationErrors> {
        let mut fields = FieldReader::new(input);
        let title = fields.non_empty_text("title");
        let description = fields.optional_text("description");
        let price = fields.decimal_at_least("price", Decimal::ZERO);
        let is_limited = fields.bool_or("is_limited", false);
        let tags = fields.text_list_or_empty("tags");
        let image = fields.optional_text("image");

        fields.finish(|| {
            Some(Self {
                title: title?,
                description,
                price: price?,
                is_limited: is_limited?,
                tags: tags?,
                image,
            })
        })
    }

    fn to_document(&self) -> Document {
        Document::new()
            .with("title", self.title.as_str())
            .with("description", self.description.clone())
            .with("price", self.price)
            .with("is_limited", self.is_limited)
            .with("tags", self.tags.clone())
            .with("image", self.image.clone())
    }
}
