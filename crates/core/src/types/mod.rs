//! Core types for the candy boxes API.
//!
//! This module provides type-safe wrappers for store identities and
//! collection names.

pub mod collection;
pub mod id;

pub use collection::{CollectionName, CollectionNameError};
pub use id::DocumentId;
