//! FlagGroupProperty - a fixed set of named flags stored as a bitmask.

use super::{position_of, Property, PropertyBase, Token};
use crate::row::Row;
use ipspace_error::{Result, ValueError};
use std::any::Any;

/// Token meaning "no flags set".
pub const NO_FLAGS: &str = "-";

/// Separator between flags in a token.
pub const FLAG_SEPARATOR: char = ';';

/// Column holding any subset of a fixed, case-insensitive vocabulary.
///
/// Each vocabulary entry owns one bit; the row footprint is
/// `max(1, ceil(flags / 8))` bytes. Tokens are `;` separated flag names, or
/// `-` for none.
#[derive(Debug, Clone)]
pub struct FlagGroupProperty {
    base: PropertyBase,
    tags: Vec<String>,
    size: usize,
}

impl FlagGroupProperty {
    /// Creates a flag group with the vocabulary `tags`, in bit order.
    pub fn new<I, S>(name: impl Into<String>, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let tags: Vec<String> = tags.into_iter().map(Into::into).collect();
        let size = tags.len().div_ceil(8).max(1);
        Self {
            base: PropertyBase::new(name),
            tags,
            size,
        }
    }

    /// The vocabulary, in bit order.
    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    /// Bit index of the flag `name`.
    pub fn position(&self, name: &str) -> Option<usize> {
        position_of(&self.tags, name)
    }

    /// Returns true if flag `idx` is set in `row`.
    pub fn is_set(&self, idx: usize, row: &Row<'_>) -> Result<bool> {
        if idx >= self.tags.len() {
            return Err(ValueError::FlagOutOfRange {
                index: idx,
                count: self.tags.len(),
            }
            .into());
        }
        let bytes = row.span_for(self)?;
        Ok((bytes[idx / 8] >> (idx % 8)) & 1 != 0)
    }

    /// Names of the flags set in `row`, in bit order.
    pub fn flags<'a>(&'a self, row: &Row<'_>) -> Result<Vec<&'a str>> {
        let bytes = row.span_for(self)?;
        Ok(self
            .tags
            .iter()
            .enumerate()
            .filter(|(j, _)| (bytes[j / 8] >> (j % 8)) & 1 != 0)
            .map(|(_, tag)| tag.as_str())
            .collect())
    }
}

impl Property for FlagGroupProperty {
    fn base(&self) -> &PropertyBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut PropertyBase {
        &mut self.base
    }

    fn kind(&self) -> &'static str {
        "flag_group"
    }

    fn size(&self) -> usize {
        self.size
    }

    /// Sets one bit per listed flag.
    ///
    /// Stops at the first unknown flag; bits set before it stay set.
    fn parse(&mut self, token: Token<'_>, dest: &mut [u8]) -> std::result::Result<(), ValueError> {
        let text = token.text();
        if text == NO_FLAGS || text.is_empty() {
            return Ok(());
        }

        for tag in text.split(FLAG_SEPARATOR).map(str::trim) {
            let j = self
                .position(tag)
                .ok_or_else(|| ValueError::UnknownFlag(tag.to_string()))?;
            dest[j / 8] |= 1 << (j % 8);
        }
        Ok(())
    }

    fn render(&self, row: &Row<'_>) -> Result<String> {
        let flags = self.flags(row)?;
        if flags.is_empty() {
            Ok(NO_FLAGS.to_string())
        } else {
            Ok(flags.join(";"))
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
