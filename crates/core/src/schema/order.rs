//! Order schema.

use rust_decimal::Decimal;
use serde_json::{Map, Value as Json};

use super::{FieldReader, Schema, ValidationErrors};
use crate::document::Document;

/// Status given to orders that do not specify one.
pub const DEFAULT_ORDER_STATUS: &str = "pending";

/// Statuses the storefront uses. Not enforced: any text is accepted.
pub const KNOWN_ORDER_STATUSES: [&str; 4] = ["pending", "confirmed", "shipped", "delivered"];

/// One line of an order: a candy box reference and how many of it.
///
/// `box_id` is not checked against the `candybox` collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderItem {
    pub box_id: String,
    /// At least 1.
    pub quantity: i64,
}

impl OrderItem {
    fn read(fields: &mut FieldReader<'_>) -> Option<Self> {
        let box_id = fields.required_text("box_id");
        let quantity = fields.integer_at_least("quantity", 1);
        Some(Self {
            box_id: box_id?,
            quantity: quantity?,
        })
    }

    fn to_document(&self) -> Document {
        Document::new()
            .with("box_id", self.box_id.as_str())
            .with("quantity", self.quantity)
    }
}

/// A customer purchase request.
///
/// `total` is supplied by the client and stored as given; it is not
/// recomputed from `items`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    pub customer_name: String,
    pub email: String,
    /// Shipping address.
    pub address: String,
    /// At least one item.
    pub items: Vec<OrderItem>,
    /// Gift note or delivery instructions.
    pub notes: Option<String>,
    pub total: Decimal,
    pub status: String,
}

impl Schema for Order {
    const NAME: &'static str = "Order";

    fn validate_fields(input: &Map<String, Json>) -> Result<Self, ValidationErrors> {
        let mut fields = FieldReader::new(input);
        let customer_name = fields.required_text("customer_name");
        let email = fields.required_text("email");
        let address = fields.required_text("address");
        let items = fields.object_list("items", 1, OrderItem::read);
        let notes = fields.optional_text("notes");
        let total = fields.decimal_at_least("total", Decimal::ZERO);
        let status = fields.text_or("status", DEFAULT_ORDER_STATUS);

        fields.finish(|| {
            Some(Self {
                customer_name: customer_name?,
                email: email?,
                address: address?,
                items: items?,
                notes,
                total: total?,
                status: status?,
            })
        })
    }

    fn to_document(&self) -> Document {
        let items: Vec<Document> = self.items.iter().map(OrderItem::to_document).collect();
        Document::new()
            .with("customer_name", self.customer_name.as_str())
            .with("email", self.email.as_str())
            .with("address", self.address.as_str())
            .with("items", items)
            .with("notes", self.notes.clone())
            .with("total", self.total)
            .with("status", self.status.as_str())
    }
}
