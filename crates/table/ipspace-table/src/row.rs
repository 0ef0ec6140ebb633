//! Row - a borrowed view of one fixed-size row record.

use crate::arena::{Arena, Span, StringRef};
use crate::property::Property;
use ipspace_error::{Result, TableError, ValueError};

/// A row of a table.
///
/// The table's arena owns the bytes; a row only borrows them. Columns are
/// decoded through the concrete property's accessors, which locate their bytes
/// with [`Row::span_for`].
#[derive(Debug, Clone, Copy)]
pub struct Row<'t> {
    arena: &'t Arena,
    span: Span,
}

impl<'t> Row<'t> {
    /// Creates a view of `span` in `arena`.
    pub fn new(arena: &'t Arena, span: Span) -> Self {
        Self { arena, span }
    }

    /// Location of the row within the arena.
    pub fn span(&self) -> Span {
        self.span
    }

    /// Raw row bytes.
    pub fn bytes(&self) -> &'t [u8] {
        self.arena.get(self.span).unwrap_or_default()
    }

    /// Returns the row size in bytes.
    pub fn len(&self) -> usize {
        self.bytes().len()
    }

    /// Returns true if the row holds no columns.
    pub fn is_empty(&self) -> bool {
        self.bytes().is_empty()
    }

    /// Returns the bytes of `prop`'s column.
    pub fn span_for(&self, prop: &dyn Property) -> Result<&'t [u8]> {
        let offset = prop.offset()?;
        let bytes = self.bytes();
        bytes
            .get(offset..offset + prop.size())
            .ok_or_else(|| TableError::ShortRow {
                name: prop.name().to_string(),
                row_size: bytes.len(),
            })
    }

    /// Resolves a persisted string stored in this row's arena.
    pub fn resolve(&self, reference: StringRef) -> std::result::Result<&'t str, ValueError> {
        self.arena
            .get_str(reference.span())
            .ok_or(ValueError::CorruptString)
    }
}

impl PartialEq for Row<'_> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.arena, other.arena) && self.span == other.span
    }
}

impl Eq for Row<'_> {}
