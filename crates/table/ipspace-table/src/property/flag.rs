//! FlagProperty - a single boolean column.

use super::{Property, PropertyBase, Token};
use crate::row::Row;
use ipspace_error::{Result, ValueError};
use std::any::Any;

/// Boolean column stored as one byte (0 or 1).
#[derive(Debug, Clone)]
pub struct FlagProperty {
    base: PropertyBase,
}

impl FlagProperty {
    /// Bytes per row.
    pub const SIZE: usize = std::mem::size_of::<bool>();

    /// Creates a flag column.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            base: PropertyBase::new(name),
        }
    }

    /// Reads the flag from `row`.
    pub fn value(&self, row: &Row<'_>) -> Result<bool> {
        Ok(row.span_for(self)?[0] != 0)
    }
}

fn parse_bool(text: &str) -> Option<bool> {
    const TRUE: [&str; 6] = ["true", "yes", "on", "t", "y", "1"];
    const FALSE: [&str; 6] = ["false", "no", "off", "f", "n", "0"];

    if TRUE.iter().any(|t| t.eq_ignore_ascii_case(text)) {
        Some(true)
    } else if FALSE.iter().any(|f| f.eq_ignore_ascii_case(text)) {
        Some(false)
    } else {
        None
    }
}

impl Property for FlagProperty {
    fn base(&self) -> &PropertyBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut PropertyBase {
        &mut self.base
    }

    fn kind(&self) -> &'static str {
        "flag"
    }

    fn size(&self) -> usize {
        Self::SIZE
    }

    fn parse(&mut self, token: Token<'_>, dest: &mut [u8]) -> std::result::Result<(), ValueError> {
        let value = parse_bool(token.text())
            .ok_or_else(|| ValueError::InvalidFlag(token.text().to_string()))?;
        dest[0] = u8::from(value);
        Ok(())
    }

    fn render(&self, row: &Row<'_>) -> Result<String> {
        self.value(row).map(|v| v.to_string())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str) -> (std::result::Result<(), ValueError>, u8) {
        let mut flag = FlagProperty::new("active");
        let mut dest = [0u8; FlagProperty::SIZE];
        let result = flag.parse(Token::new(text), &mut dest);
        (result, dest[0])
    }

    #[test]
    fn test_true_values() {
        for text in ["true", "TRUE", "Yes", "on", "1", "y", "T"] {
            assert_eq!(parse(text), (Ok(()), 1), "{text}");
        }
    }

    #[test]
    fn test_false_values() {
        for text in ["false", "No", "OFF", "0", "n", "f"] {
            assert_eq!(parse(text), (Ok(()), 0), "{text}");
        }
    }

    #[test]
    fn test_invalid_values() {
        let (result, byte) = parse("maybe");
        assert_eq!(result, Err(ValueError::InvalidFlag("maybe".to_string())));
        assert_eq!(byte, 0);

        let (result, _) = parse("");
        assert!(result.is_err());
    }
}
