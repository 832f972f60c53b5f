//! Domain errors for the routing engine.

use std::fmt;

/// Domain-level errors that can occur in business logic.
///
/// These errors are independent of infrastructure concerns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Invalid value for a field.
    InvalidValue {
        /// Field name.
        field: String,
        /// Error message.
        message: String,
    },

    /// Entity not found.
    NotFound {
        /// Entity type.
        entity_type: String,
        /// Entity identifier.
        id: String,
    },

    /// Invalid state transition attempted.
    InvalidStateTransition {
        /// Entity type (e.g., "Trade").
        entity: String,
        /// Current state.
        from: String,
        /// Attempted state.
        to: String,
    },
}

impl fmt::Display for DomainError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidValue { field, message } => {
                write!(f, "Invalid value for '{field}': {message}")
            }
            Self::NotFound { entity_type, id } => {
                write!(f, "{entity_type} not found: {id}")
            }
            Self::InvalidStateTransition { entity, from, to } => {
                write!(f, "Invalid state transition for {entity}: {from} -> {to}")
            }
        }
    }
}

impl std::error::Error for DomainError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_value_display() {
        let err = DomainError::InvalidValue {
            field: "quantity".to_string(),
            message: "must be positive".to_string(),
        };
        let msg = format!("{err}");
        assert!(msg.contains("quantity"));
        assert!(msg.contains("positive"));
    }

    #[test]
    fn not_found_display() {
        let err = DomainError::NotFound {
            entity_type: "Trade".to_string(),
            id: "trade-123".to_string(),
        };
        assert!(format!("{err}").contains("trade-123"));
    }

    #[test]
    fn invalid_transition_display() {
        let err = DomainError::InvalidStateTransition {
            entity: "Trade".to_string(),
            from: "Filled".to_string(),
            to: "Pending".to_string(),
        };
        assert!(format!("{err}").contains("Filled -> Pending"));
    }
}
