//! Source loading utilities for tables.

use crate::arena::Span;
use crate::config::SchemaConfig;
use crate::index::RangeIndex;
use crate::table::{ParseReport, Table};
use ipspace_error::{ErrorCategory, Result, TableError};
use std::path::Path;
use tracing::info;

/// Reads a UTF-8 source file.
pub fn read_source(path: impl AsRef<Path>) -> Result<String> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(TableError::NotFound(path.display().to_string()));
    }

    std::fs::read_to_string(path)
        .map_err(|e| TableError::Io(format!("Failed to read {}: {}", path.display(), e)))
}

/// Parses the file at `path` into `table`.
///
/// Fails only when the file cannot be read; line and column problems are
/// returned in the report.
pub fn load_table<I: RangeIndex<Span>>(
    table: &mut Table<I>,
    path: impl AsRef<Path>,
) -> Result<ParseReport> {
    let path = path.as_ref();
    let content = read_source(path)?;
    let report = table.parse(&content);

    info!(
        source = %path.display(),
        lines = report.lines,
        rows = report.rows,
        ranges = table.len(),
        skipped_lines = report.count(ErrorCategory::Line),
        column_errors = report.count(ErrorCategory::Column),
        "Loaded table"
    );

    Ok(report)
}

/// Builds a table from `schema` and loads the file at `path` into it.
pub fn load_with_schema(
    schema: &SchemaConfig,
    path: impl AsRef<Path>,
) -> Result<(Table, ParseReport)> {
    let mut table = schema.build()?;
    let report = load_table(&mut table, path)?;
    Ok((table, report))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ColumnKind;
    use crate::property::TagProperty;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_test_source(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_load_table() {
        let file = create_test_source("10.0.0.0/8,PRIVATE\n8.8.8.0/24,US\n1.1.1.1,AU\n");
        let mut table = Table::new();
        table.add_column(TagProperty::new("country")).unwrap();

        let report = load_table(&mut table, file.path()).unwrap();

        assert!(report.is_clean());
        assert_eq!(table.len(), 3);
        let country = table.column_as::<TagProperty>(0).unwrap();
        let row = table.find_str("8.8.8.8").unwrap();
        assert_eq!(country.value(&row).unwrap(), "US");
    }

    #[test]
    fn test_load_with_schema() {
        let file = create_test_source("10.0.0.0/8,lab,yes\nbogus,x,no\n");
        let schema = SchemaConfig::new()
            .with_column("site", ColumnKind::Tag)
            .with_column("managed", ColumnKind::Flag);

        let (table, report) = load_with_schema(&schema, file.path()).unwrap();

        assert_eq!(report.rows, 1);
        assert_eq!(report.count(ErrorCategory::Line), 1);
        assert!(table.find_str("10.20.30.40").is_some());
    }

    #[test]
    fn test_load_file_not_found() {
        let mut table = Table::new();
        let result = load_table(&mut table, "/nonexistent/ranges.csv");
        assert!(matches!(result, Err(TableError::NotFound(_))));
    }
}
