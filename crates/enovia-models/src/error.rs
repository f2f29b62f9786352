//! Error types for the `enovia-models` crate.
//!
//! All fallible constructors in this crate return variants of [`ModelError`].

/// Errors produced when constructing or validating model types.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ModelError {
    /// An identifier cannot be used as a URL path segment.
    #[error("invalid {kind} \"{value}\": {reason}")]
    InvalidIdentifier {
        /// Which identifier was rejected (`document id`, `file id`).
        kind: &'static str,
        /// The value that failed validation.
        value: String,
        /// Human-readable explanation.
        reason: String,
    },

    /// A required field was missing or empty in a server payload.
    #[error("missing required field: {field}")]
    MissingField {
        /// Dotted path of the missing field.
        field: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_identifier() {
        let err = ModelError::InvalidIdentifier {
            kind: "document id",
            value: "a/b".into(),
            reason: "must not contain '/'".into(),
        };
        assert_eq!(
            err.to_string(),
            "invalid document id \"a/b\": must not contain '/'"
        );
    }

    #[test]
    fn error_display_missing_field() {
        let err = ModelError::MissingField {
            field: "preferredcredentials.role.name".into(),
        };
        assert_eq!(
            err.to_string(),
            "missing required field: preferredcredentials.role.name"
        );
    }
}
