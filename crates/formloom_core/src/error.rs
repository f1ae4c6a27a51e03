//! Form error types

use thiserror::Error;

use crate::path::Path;

/// Errors raised while compiling or mutating a form
#[derive(Error, Debug)]
pub enum FormError {
    /// No handler registered for a node kind (or field type)
    #[error("Expected a handler for {0} to be registered")]
    MissingHandler(String),

    /// A node whose kind tag or shape does not match the schema
    #[error("Malformed node at [{path}]: {reason}")]
    MalformedNode { path: Path, reason: String },

    /// An attribute node with an unknown tag or a broken shape
    #[error("Malformed attribute node: {0}")]
    MalformedAttribute(String),

    /// An attribute object declaring the same key twice
    #[error("Duplicate attribute key `{0}`")]
    DuplicateAttributeKey(String),

    /// A path that does not resolve against the current tree
    #[error("No node at path [{0}]")]
    PathNotFound(Path),

    /// A reorder sequence that is not a permutation of the current items
    #[error("Invalid order {order:?} for {len} items")]
    InvalidOrder { order: Vec<usize>, len: usize },

    /// A name path registered for a different kind of entry
    #[error("`{name}` is not a {expected}")]
    WrongEntry { name: String, expected: &'static str },

    /// A name path missing from the last render's path mapping
    #[error("No field or container named `{0}`")]
    UnknownName(String),

    /// A child form template that was never registered
    #[error("No child form template named `{0}`")]
    UnknownTemplate(String),

    /// A dispatch attempted while another one is being delivered
    #[error("Dispatch rejected: another dispatch is in progress")]
    ReentrantDispatch,

    /// Settings file could not be parsed
    #[error("Invalid settings: {0}")]
    Settings(#[from] toml::de::Error),

    /// Settings file could not be read
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Result type for form operations
pub type Result<T> = std::result::Result<T, FormError>;
