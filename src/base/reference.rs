//! Source references attached to statements and diagnostics.

use std::fmt;
use std::sync::Arc;

use super::span::{LineCol, TextRange};

/// Where a statement was declared: the symbolic source name plus its
/// position inside that source.
///
/// Cheap to clone; the source name is shared.
#[derive(Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct StatementRef {
    /// Symbolic name of the source (usually a file name).
    pub source: Arc<str>,
    /// Byte range of the statement keyword through its terminator.
    pub range: TextRange,
    /// Start position of the statement.
    pub position: LineCol,
}

impl StatementRef {
    pub fn new(source: Arc<str>, range: TextRange, position: LineCol) -> Self {
        Self {
            source,
            range,
            position,
        }
    }
}

impl fmt::Display for StatementRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.source, self.position)
    }
}

impl fmt::Debug for StatementRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "StatementRef({self})")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::base::TextSize;

    #[test]
    fn test_statement_ref_display() {
        let reference = StatementRef::new(
            Arc::from("foo.yang"),
            TextRange::new(TextSize::from(10), TextSize::from(20)),
            LineCol::new(2, 4),
        );
        assert_eq!(reference.to_string(), "foo.yang:3:5");
    }
}
