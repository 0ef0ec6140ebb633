//! Quote-aware field scanner for delimited lines.

/// Quote character that protects delimiters inside a field.
pub const QUOTE: char = '"';

/// Extracts the next field from `line` and advances `line` past it and its delimiter.
///
/// A quote toggles the in-quote state without ending the field. The delimiter
/// ends the field only outside quotes. If no unquoted delimiter is found the rest
/// of the line is the field. The returned field is trimmed of whitespace, then
/// of one leading and one trailing quote.
///
/// Unbalanced quotes are not an error: everything after the stray quote is
/// treated as quoted content.
pub fn next_token<'a>(line: &mut &'a str, delimiter: char) -> &'a str {
    let text: &'a str = *line;
    let (field, rest) = split_field(text, delimiter);
    *line = rest.unwrap_or(&text[text.len()..]);
    field
}

/// Splits the first field off `text`. The remainder is None when no unquoted
/// delimiter ends the field.
fn split_field(text: &str, delimiter: char) -> (&str, Option<&str>) {
    let mut in_quote = false;
    let mut end = None;

    for (idx, c) in text.char_indices() {
        if c == QUOTE {
            in_quote = !in_quote;
        } else if c == delimiter && !in_quote {
            end = Some(idx);
            break;
        }
    }

    let (field, rest) = match end {
        Some(idx) => (&text[..idx], Some(&text[idx + delimiter.len_utf8()..])),
        None => (text, None),
    };

    (strip_quotes(field.trim()), rest)
}

/// Removes one leading and one trailing quote, if present.
fn strip_quotes(field: &str) -> &str {
    let field = field.strip_prefix(QUOTE).unwrap_or(field);
    field.strip_suffix(QUOTE).unwrap_or(field)
}

/// Iterator over the fields of one line.
///
/// Yields one field per delimiter plus one, so empty fields are kept
/// wherever they occur, including after a trailing delimiter. The table
/// itself calls [`next_token`] directly, which keeps returning empty fields
/// for missing trailing columns.
#[derive(Debug, Clone)]
pub struct Tokens<'a> {
    rest: Option<&'a str>,
    delimiter: char,
}

impl<'a> Tokens<'a> {
    /// Creates an iterator over the fields of `line`.
    pub fn new(line: &'a str, delimiter: char) -> Self {
        Self {
            rest: Some(line),
            delimiter,
        }
    }

    /// Returns the unconsumed remainder of the line.
    pub fn remainder(&self) -> &'a str {
        self.rest.unwrap_or_default()
    }
}

impl<'a> Iterator for Tokens<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<Self::Item> {
        let (field, rest) = split_field(self.rest?, self.delimiter);
        self.rest = rest;
        Some(field)
    }
}
