//! Error types for the Ingot framework.

use thiserror::Error;

use ingot_core::EventCategory;

/// Errors raised while compiling declarative attributes into middleware.
///
/// These are configuration errors: they surface synchronously at
/// registration time and reject the whole registration.
#[derive(Debug, Clone, Error)]
pub enum StockError {
    /// No factory is registered for the attribute under this category.
    #[error(
        "attribute `{attribute}` is not registered for {category} handlers \
         (available: {available:?})"
    )]
    UnknownAttribute {
        /// The category the registration targeted.
        category: EventCategory,
        /// The unrecognized attribute name.
        attribute: String,
        /// Attribute names that are registered for the category.
        available: Vec<String>,
    },

    /// The factory exists but does not accept the given value type.
    #[error("attribute `{attribute}` does not accept {kind} values")]
    UnsupportedValue {
        /// The attribute name.
        attribute: String,
        /// Human-readable name of the rejected value type.
        kind: &'static str,
    },
}

/// Result type for attribute compilation.
pub type StockResult<T> = Result<T, StockError>;
