//! Error types for the seed-search core.
//!
//! Every recoverable failure in the crate maps to a distinct variant here.
//! Degenerate inputs (an empty or fully masked query) are not errors; they
//! produce empty-but-valid results instead.

use thiserror::Error;

/// Errors reported by filter construction, lookup table building and the
/// HSP stream.
#[derive(Error, Debug)]
pub enum SeedError {
    /// An option or filter parameter failed validation.
    #[error("invalid {component} parameter `{param}`: {reason}")]
    InvalidParameter {
        component: &'static str,
        param: &'static str,
        reason: String,
    },

    /// Requested word size cannot be packed into the table's word type.
    #[error("word size {word_size} exceeds the maximum of {max} for this table variant")]
    WordTooWide { word_size: usize, max: usize },

    /// A write was attempted on a stream that is no longer open.
    #[error("write to a closed HSP stream")]
    StreamClosed,

    /// The lookup table could not be sized for the requested configuration.
    #[error("lookup table allocation failed: {0}")]
    Resource(String),
}

impl SeedError {
    pub(crate) fn invalid(
        component: &'static str,
        param: &'static str,
        reason: impl Into<String>,
    ) -> Self {
        SeedError::InvalidParameter {
            component,
            param,
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, SeedError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let e = SeedError::invalid("dust", "window", "must be between 8 and 64, got 0");
        let msg = format!("{e}");
        assert!(msg.contains("dust"));
        assert!(msg.contains("window"));

        let e = SeedError::WordTooWide {
            word_size: 40,
            max: 31,
        };
        assert!(format!("{e}").contains("40"));
    }
}
