//! Errors for values checked once at startup, before they reach SQL

use thiserror::Error;

/// A configured value that cannot be used as given
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{field} cannot be empty")]
    Empty { field: &'static str },

    #[error("{field} is longer than {max} bytes")]
    TooLong { field: &'static str, max: usize },

    #[error("{field} {reason}")]
    InvalidFormat {
        field: &'static str,
        reason: &'static str,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_field() {
        let too_long = ValidationError::TooLong {
            field: "table name",
            max: 63,
        };
        assert_eq!(too_long.to_string(), "table name is longer than 63 bytes");

        let bad = ValidationError::InvalidFormat {
            field: "table name",
            reason: "must start with a letter or underscore",
        };
        assert_eq!(bad.to_string(), "table name must start with a letter or underscore");
    }
}
