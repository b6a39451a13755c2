//! Candy Boxes Core - Schemas, validation and the document model.
//!
//! This crate provides the types shared by the API server and the CLI:
//! - `schema` - Entity definitions (`CandyBox`, `Order`, `User`) and their validation rules
//! - `document` - Typed key-value documents handed to the document store
//! - `filter` - Query criteria understood by every document store
//! - `types` - Newtypes for store identities and collection names
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no database
//! access, no HTTP. Validation happens here, before anything reaches a store.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod document;
pub mod filter;
pub mod schema;
pub mod types;

pub use document::{Document, DocumentError, Value};
pub use filter::{Criterion, Filter};
pub use schema::{
    CandyBox, FieldError, FieldErrorKind, Order, OrderItem, Schema, User, ValidationErrors,
};
pub use types::*;
