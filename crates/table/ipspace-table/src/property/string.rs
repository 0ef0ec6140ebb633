//! StringProperty - free text persisted in table storage.

use super::{Property, PropertyBase, Token};
use crate::arena::StringRef;
use crate::row::Row;
use ipspace_error::{Result, ValueError};
use std::any::Any;

/// Column holding arbitrary text.
///
/// The row stores a [`StringRef`] into the table's arena. The input line does
/// not outlive the parse, so the column asks the table to persist each token
/// first.
#[derive(Debug, Clone)]
pub struct StringProperty {
    base: PropertyBase,
}

impl StringProperty {
    /// Bytes per row.
    pub const SIZE: usize = StringRef::SIZE;

    /// Creates a string column.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            base: PropertyBase::new(name),
        }
    }

    /// Text stored for `row`. Borrows from the table, not from the column.
    pub fn value<'t>(&self, row: &Row<'t>) -> Result<&'t str> {
        let bytes = row.span_for(self)?;
        let reference = StringRef::decode(bytes).ok_or(ValueError::CorruptString)?;
        Ok(row.resolve(reference)?)
    }
}

impl Property for StringProperty {
    fn base(&self) -> &PropertyBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut PropertyBase {
        &mut self.base
    }

    fn kind(&self) -> &'static str {
        "string"
    }

    fn size(&self) -> usize {
        Self::SIZE
    }

    fn needs_persisted_token(&self) -> bool {
        true
    }

    fn parse(&mut self, token: Token<'_>, dest: &mut [u8]) -> std::result::Result<(), ValueError> {
        let stored = token.stored().ok_or(ValueError::NotPersisted)?;
        StringRef::try_from(stored)?.encode(dest);
        Ok(())
    }

    fn render(&self, row: &Row<'_>) -> Result<String> {
        self.value(row).map(str::to_string)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
