//! Error kinds for reference extraction.

use thiserror::Error;

/// Local, non-fatal errors raised while extracting references from formula
/// text.
///
/// None of these abort processing: the offending token or range is dropped,
/// a diagnostic goes to the log facade, and the rest of the formula (or the
/// rest of a batch) continues.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RefError {
    /// Address text failed the resolver grammar.
    #[error("malformed cell address `{0}`")]
    MalformedAddress(String),

    /// An endpoint of a range failed to resolve. The whole range is dropped,
    /// never partially applied.
    #[error("malformed range `{0}:{1}`")]
    MalformedRange(String, String),

    /// A second `:` appeared before the pending range closed.
    #[error("stray `:` before range closed")]
    AmbiguousRangeMarker,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(
            RefError::MalformedAddress("1A".to_string()).to_string(),
            "malformed cell address `1A`"
        );
        assert_eq!(
            RefError::MalformedRange("A1".to_string(), "xx".to_string()).to_string(),
            "malformed range `A1:xx`"
        );
        assert_eq!(
            RefError::AmbiguousRangeMarker.to_string(),
            "stray `:` before range closed"
        );
    }
}
