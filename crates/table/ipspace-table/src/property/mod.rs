//! Column properties.
//!
//! A property describes one column of a table: its byte footprint inside a
//! row, how a text token is encoded into those bytes, and how to read them
//! back. The table is an ordered list of properties.
//!
//! Variants:
//! - [`TagProperty`] - growing case-insensitive vocabulary, one byte per row
//! - [`FlagGroupProperty`] - fixed vocabulary stored as a bitmask
//! - [`FlagProperty`] - single boolean
//! - [`StringProperty`] - free text persisted in table storage

mod flag;
mod flag_group;
mod string;
mod tag;

pub use flag::FlagProperty;
pub use flag_group::FlagGroupProperty;
pub use string::StringProperty;
pub use tag::TagProperty;

use crate::arena::Span;
use crate::row::Row;
use ipspace_error::{Result, TableError, ValueError};
use std::any::Any;
use std::fmt;

/// Position of a property within a table, assigned once by the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Slot {
    /// Zero-based column index.
    pub index: usize,
    /// Byte offset of the column within a row.
    pub offset: usize,
}

/// State shared by every property variant.
#[derive(Debug, Clone)]
pub struct PropertyBase {
    name: String,
    slot: Option<Slot>,
}

impl PropertyBase {
    /// Creates an unbound base with `name`.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            slot: None,
        }
    }

    /// Property name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Table position, if bound.
    pub fn slot(&self) -> Option<Slot> {
        self.slot
    }

    /// Records the table position. A property can only be bound once.
    pub fn bind(&mut self, slot: Slot) -> Result<()> {
        if self.slot.is_some() {
            return Err(TableError::AlreadyBound(self.name.clone()));
        }
        self.slot = Some(slot);
        Ok(())
    }
}

/// A token handed to [`Property::parse`].
///
/// `stored` is set when the table copied the text into its own storage
/// because the property asked for it via [`Property::needs_persisted_token`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token<'a> {
    text: &'a str,
    stored: Option<Span>,
}

impl<'a> Token<'a> {
    /// Token borrowed from the input line.
    pub fn new(text: &'a str) -> Self {
        Self { text, stored: None }
    }

    /// Token whose text was also copied into table storage at `stored`.
    pub fn persisted(text: &'a str, stored: Span) -> Self {
        Self {
            text,
            stored: Some(stored),
        }
    }

    /// Token text.
    pub fn text(&self) -> &'a str {
        self.text
    }

    /// Location of the persisted copy, if any.
    pub fn stored(&self) -> Option<Span> {
        self.stored
    }
}

/// Description of one table column.
///
/// `size` is fixed at construction. `parse` receives a zeroed destination of
/// exactly `size` bytes and may leave partial writes behind when it fails.
pub trait Property: Any + fmt::Debug + 'static {
    /// Shared state.
    fn base(&self) -> &PropertyBase;

    /// Mutable shared state.
    fn base_mut(&mut self) -> &mut PropertyBase;

    /// Short type name used in diagnostics and schema dumps.
    fn kind(&self) -> &'static str;

    /// Bytes contributed to every row.
    fn size(&self) -> usize;

    /// Whether the token must be copied into table storage before `parse`.
    fn needs_persisted_token(&self) -> bool {
        false
    }

    /// Encodes `token` into `dest`.
    fn parse(&mut self, token: Token<'_>, dest: &mut [u8]) -> std::result::Result<(), ValueError>;

    /// Decodes this column of `row` for display.
    fn render(&self, row: &Row<'_>) -> Result<String>;

    /// Upcast for recovering the concrete variant.
    fn as_any(&self) -> &dyn Any;

    /// Property name.
    fn name(&self) -> &str {
        self.base().name()
    }

    /// Table position.
    fn slot(&self) -> Result<Slot> {
        self.base()
            .slot()
            .ok_or_else(|| TableError::Unbound(self.name().to_string()))
    }

    /// Column index.
    fn index(&self) -> Result<usize> {
        self.slot().map(|s| s.index)
    }

    /// Row data offset in bytes.
    fn offset(&self) -> Result<usize> {
        self.slot().map(|s| s.offset)
    }
}

/// Handle to a boxed property.
pub type PropertyHandle = Box<dyn Property>;

impl dyn Property {
    /// Returns the concrete property if it is a `P`.
    pub fn downcast_ref<P: Property>(&self) -> Option<&P> {
        self.as_any().downcast_ref::<P>()
    }
}

/// Case-insensitive lookup used by the tag vocabularies.
pub(crate) fn position_of(vocabulary: &[String], name: &str) -> Option<usize> {
    vocabulary.iter().position(|v| v.eq_ignore_ascii_case(name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bind_once() {
        let mut base = PropertyBase::new("owner");
        assert!(base.slot().is_none());

        base.bind(Slot {
            index: 0,
            offset: 0,
        })
        .unwrap();
        let again = base.bind(Slot {
            index: 1,
            offset: 1,
        });

        assert!(matches!(again, Err(TableError::AlreadyBound(name)) if name == "owner"));
        assert_eq!(base.slot().unwrap().index, 0);
    }

    #[test]
    fn test_unbound_property_reports() {
        let tag = TagProperty::new("owner");
        assert!(matches!(tag.offset(), Err(TableError::Unbound(_))));
        assert!(matches!(tag.index(), Err(TableError::Unbound(_))));
    }

    #[test]
    fn test_downcast() {
        let handle: PropertyHandle = Box::new(FlagProperty::new("active"));
        assert!(handle.downcast_ref::<FlagProperty>().is_some());
        assert!(handle.downcast_ref::<TagProperty>().is_none());
        assert_eq!(handle.kind(), "flag");
    }

    #[test]
    fn test_position_of_ignores_case() {
        let vocabulary = vec!["prod".to_string(), "DMZ".to_string()];
        assert_eq!(position_of(&vocabulary, "dmz"), Some(1));
        assert_eq!(position_of(&vocabulary, "PROD"), Some(0));
        assert_eq!(position_of(&vocabulary, "lab"), None);
    }
}
