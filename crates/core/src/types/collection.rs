//! Collection name type.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`CollectionName`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CollectionNameError {
    /// The input string is empty.
    #[error("collection name cannot be empty")]
    Empty,
    /// The input string is too long.
    #[error("collection name must be at most {max} characters")]
    TooLong {
        /// Maximum allowed length.
        max: usize,
    },
    /// The input contains a character outside `[a-z0-9_]`.
    #[error("collection name contains invalid character {0:?}")]
    InvalidCharacter(char),
}

/// Name of a document collection.
///
/// ## Constraints
///
/// - Length: 1-64 characters
/// - Only lowercase ASCII letters, digits and underscores
///
/// Entity collections are derived from the entity name by lowercasing it
/// (`CandyBox` -> `candybox`).
///
/// ## Examples
///
/// ```
/// use candy_boxes_core::CollectionName;
///
/// assert!(CollectionName::parse("candybox").is_ok());
/// assert!(CollectionName::parse("").is_err());
/// assert!(CollectionName::parse("Candy Box").is_err());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(try_from = "String", into = "String")]
pub struct CollectionName(String);

impl CollectionName {
    /// Maximum length of a collection name.
    pub const MAX_LENGTH: usize = 64;

    /// Parse a `CollectionName` from a string.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is empty, longer than 64 characters, or
    /// contains anything other than lowercase letters, digits and underscores.
    pub fn parse(s: &str) -> Result<Self, CollectionNameError> {
        if s.is_empty() {
            return Err(CollectionNameError::Empty);
        }

        if s.len() > Self::MAX_LENGTH {
            return Err(CollectionNameError::TooLong {
                max: Self::MAX_LENGTH,
            });
        }

        if let Some(c) = s
            .chars()
            .find(|c| !(c.is_ascii_lowercase() || c.is_ascii_digit() || *c == '_'))
        {
            return Err(CollectionNameError::InvalidCharacter(c));
        }

        Ok(Self(s.to_owned()))
    }

    /// Collection name for an entity type declared in this crate.
    ///
    /// Entity names are ASCII identifiers, so lowercasing them always yields a
    /// valid name; the schema tests check every entity against [`Self::parse`].
    pub(crate) fn from_entity_name(entity: &'static str) -> Self {
        Self(entity.to_ascii_lowercase())
    }

    /// Returns the collection name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CollectionName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for CollectionName {
    type Err = CollectionNameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for CollectionName {
    type Error = CollectionNameError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<CollectionName> for String {
    fn from(name: CollectionName) -> Self {
        name.0
    }
}

impl AsRef<str> for CollectionName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
