//! Foundation types for the reactor.
//!
//! - [`TextRange`], [`TextSize`] - byte positions inside a source text
//! - [`LineCol`], [`LineIndex`] - line/column conversion
//! - [`StatementRef`] - where a statement was declared
//!
//! This module has NO dependencies on other crate modules.

mod reference;
mod span;

pub use reference::StatementRef;
pub use span::{LineCol, LineIndex, TextRange, TextSize};
