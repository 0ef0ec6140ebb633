//! TagProperty - one value from a vocabulary that grows as rows are parsed.

use super::{position_of, Property, PropertyBase, Token};
use crate::row::Row;
use ipspace_error::{Result, ValueError};
use std::any::Any;
use tracing::trace;

/// Column holding one of a growing set of case-insensitive strings.
///
/// The first occurrence of a string appends it to the vocabulary; the row
/// stores the vocabulary position as a single byte.
#[derive(Debug, Clone)]
pub struct TagProperty {
    base: PropertyBase,
    tags: Vec<String>,
}

impl TagProperty {
    /// Bytes per row.
    pub const SIZE: usize = std::mem::size_of::<u8>();

    /// Maximum number of distinct values.
    pub const MAX_TAGS: usize = u8::MAX as usize + 1;

    /// Creates a tag column with an empty vocabulary.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            base: PropertyBase::new(name),
            tags: Vec::new(),
        }
    }

    /// The vocabulary in first-seen order.
    pub fn vocabulary(&self) -> &[String] {
        &self.tags
    }

    /// Stored value of `name`, if it has been seen.
    pub fn position(&self, name: &str) -> Option<u8> {
        position_of(&self.tags, name).map(|p| p as u8)
    }

    /// Raw stored value in `row`.
    pub fn code(&self, row: &Row<'_>) -> Result<u8> {
        Ok(row.span_for(self)?[0])
    }

    /// Tag string for `row`.
    ///
    /// A row whose token was rejected for overflowing the vocabulary keeps a
    /// zero byte and decodes as the first vocabulary entry. The rejection is
    /// reported as a column diagnostic by [`Table::parse`](crate::Table::parse).
    pub fn value<'a>(&'a self, row: &Row<'_>) -> Result<&'a str> {
        let code = self.code(row)?;
        self.tags
            .get(code as usize)
            .map(String::as_str)
            .ok_or_else(|| ValueError::UnknownTag(code).into())
    }
}

impl Property for TagProperty {
    fn base(&self) -> &PropertyBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut PropertyBase {
        &mut self.base
    }

    fn kind(&self) -> &'static str {
        "tag"
    }

    fn size(&self) -> usize {
        Self::SIZE
    }

    fn parse(&mut self, token: Token<'_>, dest: &mut [u8]) -> std::result::Result<(), ValueError> {
        let text = token.text();
        let position = match position_of(&self.tags, text) {
            Some(p) => p,
            None => {
                if self.tags.len() >= Self::MAX_TAGS {
                    return Err(ValueError::VocabularyOverflow {
                        limit: Self::MAX_TAGS,
                    });
                }
                trace!(column = %self.base.name(), tag = %text, "New tag value");
                self.tags.push(text.to_string());
                self.tags.len() - 1
            }
        };
        dest[0] = position as u8;
        Ok(())
    }

    fn render(&self, row: &Row<'_>) -> Result<String> {
        self.value(row).map(str::to_string)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(tag: &mut TagProperty, text: &str) -> std::result::Result<u8, ValueError> {
        let mut dest = [0u8; TagProperty::SIZE];
        tag.parse(Token::new(text), &mut dest).map(|_| dest[0])
    }

    #[test]
    fn test_same_string_same_value() {
        let mut tag = TagProperty::new("colo");
        let first = parse(&mut tag, "cmi").unwrap();
        let again = parse(&mut tag, "CMI").unwrap();
        assert_eq!(first, again);
        assert_eq!(tag.vocabulary(), &["cmi".to_string()]);
    }

    #[test]
    fn test_first_seen_order() {
        let mut tag = TagProperty::new("colo");
        assert_eq!(parse(&mut tag, "cmi"), Ok(0));
        assert_eq!(parse(&mut tag, "ind"), Ok(1));
        assert_eq!(parse(&mut tag, "abq"), Ok(2));
        assert_eq!(parse(&mut tag, "ind"), Ok(1));
        assert_eq!(tag.vocabulary(), &["cmi", "ind", "abq"]);
        assert_eq!(tag.position("ABQ"), Some(2));
    }

    #[test]
    fn test_empty_token_is_a_value() {
        let mut tag = TagProperty::new("owner");
        assert_eq!(parse(&mut tag, ""), Ok(0));
        assert_eq!(parse(&mut tag, "asf"), Ok(1));
    }

    #[test]
    fn test_vocabulary_overflow() {
        let mut tag = TagProperty::new("wide");
        for i in 0..TagProperty::MAX_TAGS {
            assert_eq!(parse(&mut tag, &format!("t{i}")), Ok(i as u8));
        }

        assert_eq!(
            parse(&mut tag, "one-too-many"),
            Err(ValueError::VocabularyOverflow { limit: 256 })
        );
        assert_eq!(tag.vocabulary().len(), 256);
        assert_eq!(parse(&mut tag, "T255"), Ok(255));
    }
}
