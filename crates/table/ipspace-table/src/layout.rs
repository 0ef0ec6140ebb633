//! Row layout - the ordered columns of a table and their byte offsets.

use crate::property::{Property, PropertyHandle, Slot};
use ipspace_error::Result;

/// Ordered column list.
///
/// Column order is both the offset order within a row and the field order
/// within an input line.
#[derive(Debug, Default)]
pub struct Layout {
    columns: Vec<PropertyHandle>,
    row_size: usize,
}

impl Layout {
    /// Creates an empty layout.
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds `column` to the next index and offset and appends it.
    pub fn push(&mut self, mut column: PropertyHandle) -> Result<Slot> {
        let slot = Slot {
            index: self.columns.len(),
            offset: self.row_size,
        };
        column.base_mut().bind(slot)?;
        self.row_size += column.size();
        self.columns.push(column);
        Ok(slot)
    }

    /// Sum of all column sizes.
    pub fn row_size(&self) -> usize {
        self.row_size
    }

    /// Number of columns.
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// Returns true if there are no columns.
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Column at `index`.
    pub fn get(&self, index: usize) -> Option<&dyn Property> {
        self.columns.get(index).map(|c| c.as_ref())
    }

    /// First column called `name`.
    pub fn position(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name() == name)
    }

    /// Columns in order.
    pub fn iter(&self) -> impl Iterator<Item = &dyn Property> {
        self.columns.iter().map(|c| c.as_ref())
    }

    pub(crate) fn columns_mut(&mut self) -> &mut [PropertyHandle] {
        &mut self.columns
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::property::{FlagGroupProperty, FlagProperty, StringProperty, TagProperty};
    use ipspace_error::TableError;

    #[test]
    fn test_offsets_are_cumulative() {
        let mut layout = Layout::new();
        let owner = layout.push(Box::new(TagProperty::new("owner"))).unwrap();
        let desc = layout.push(Box::new(StringProperty::new("desc"))).unwrap();
        let flags = layout
            .push(Box::new(FlagGroupProperty::new("flags", ["a", "b"])))
            .unwrap();
        let active = layout.push(Box::new(FlagProperty::new("active"))).unwrap();

        assert_eq!(owner, Slot { index: 0, offset: 0 });
        assert_eq!(desc, Slot { index: 1, offset: 1 });
        assert_eq!(flags, Slot { index: 2, offset: 9 });
        assert_eq!(active, Slot { index: 3, offset: 10 });
        assert_eq!(layout.row_size(), 11);

        let total: usize = layout.iter().map(|c| c.size()).sum();
        assert_eq!(total, layout.row_size());
        for column in layout.iter() {
            let before: usize = layout
                .iter()
                .take(column.index().unwrap())
                .map(|c| c.size())
                .sum();
            assert_eq!(column.offset().unwrap(), before);
        }
    }

    #[test]
    fn test_duplicate_names_allowed() {
        let mut layout = Layout::new();
        layout.push(Box::new(TagProperty::new("owner"))).unwrap();
        layout.push(Box::new(TagProperty::new("owner"))).unwrap();

        assert_eq!(layout.len(), 2);
        assert_eq!(layout.position("owner"), Some(0));
    }

    #[test]
    fn test_rebinding_rejected() {
        let mut column = TagProperty::new("owner");
        column
            .base_mut()
            .bind(Slot {
                index: 4,
                offset: 4,
            })
            .unwrap();

        let mut layout = Layout::new();
        let result = layout.push(Box::new(column));

        assert!(matches!(result, Err(TableError::AlreadyBound(_))));
        assert!(layout.is_empty());
        assert_eq!(layout.row_size(), 0);
    }
}
