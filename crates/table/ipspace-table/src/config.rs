//! Configuration types for tables and their schemas.

use crate::property::{
    FlagGroupProperty, FlagProperty, PropertyHandle, StringProperty, TagProperty,
};
use crate::scanner::QUOTE;
use crate::table::Table;
use ipspace_error::{Result, TableError};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default field delimiter.
pub const DEFAULT_DELIMITER: char = ',';

/// Configuration for a table's input format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TableConfig {
    /// Field delimiter for input lines.
    pub delimiter: char,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            delimiter: DEFAULT_DELIMITER,
        }
    }
}

impl TableConfig {
    /// Create a new table configuration with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the field delimiter.
    pub fn with_delimiter(mut self, delimiter: char) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.delimiter == QUOTE {
            return Err(TableError::Config(
                "delimiter cannot be the quote character".to_string(),
            ));
        }
        if self.delimiter == '\n' || self.delimiter == '\r' {
            return Err(TableError::Config(
                "delimiter cannot be a line terminator".to_string(),
            ));
        }
        Ok(())
    }
}

/// Column type and its type-specific settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ColumnKind {
    /// Growing vocabulary, one byte per row.
    Tag,
    /// Fixed vocabulary stored as a bitmask.
    FlagGroup {
        /// Flag names in bit order.
        flags: Vec<String>,
    },
    /// Single boolean.
    Flag,
    /// Free text.
    String,
}

/// Configuration for one column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnConfig {
    /// Column name.
    pub name: String,

    /// Column type.
    #[serde(flatten)]
    pub kind: ColumnKind,
}

impl ColumnConfig {
    /// Create a column configuration.
    pub fn new(name: impl Into<String>, kind: ColumnKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }

    /// Build the property this column describes.
    pub fn build(&self) -> PropertyHandle {
        match &self.kind {
            ColumnKind::Tag => Box::new(TagProperty::new(&self.name)),
            ColumnKind::FlagGroup { flags } => {
                Box::new(FlagGroupProperty::new(&self.name, flags.iter().cloned()))
            }
            ColumnKind::Flag => Box::new(FlagProperty::new(&self.name)),
            ColumnKind::String => Box::new(StringProperty::new(&self.name)),
        }
    }
}

/// A complete table description: input format plus ordered columns.
///
/// ```json
/// {
///   "table": { "delimiter": "," },
///   "columns": [
///     { "name": "owner", "type": "tag" },
///     { "name": "flags", "type": "flag_group", "flags": ["prod", "dmz", "internal"] },
///     { "name": "Description", "type": "string" }
///   ]
/// }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaConfig {
    /// Input format.
    #[serde(default)]
    pub table: TableConfig,

    /// Columns in order.
    pub columns: Vec<ColumnConfig>,
}

impl SchemaConfig {
    /// Create an empty schema with default table settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a column.
    pub fn with_column(mut self, name: impl Into<String>, kind: ColumnKind) -> Self {
        self.columns.push(ColumnConfig::new(name, kind));
        self
    }

    /// Set the table settings.
    pub fn with_table(mut self, table: TableConfig) -> Self {
        self.table = table;
        self
    }

    /// Parse a schema from JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| TableError::Config(format!("Invalid schema JSON: {e}")))
    }

    /// Load a schema from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(TableError::NotFound(path.display().to_string()));
        }
        let json = std::fs::read_to_string(path)
            .map_err(|e| TableError::Io(format!("Failed to read {}: {}", path.display(), e)))?;
        Self::from_json(&json)
    }

    /// Serialize the schema to pretty JSON.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| TableError::Config(format!("Failed to serialize schema: {e}")))
    }

    /// Validate the schema.
    pub fn validate(&self) -> Result<()> {
        self.table.validate()?;
        for column in &self.columns {
            if let ColumnKind::FlagGroup { flags } = &column.kind {
                if flags.iter().any(|f| f.is_empty() || f.contains(';')) {
                    return Err(TableError::Config(format!(
                        "flag group '{}' has an empty flag or a flag containing ';'",
                        column.name
                    )));
                }
            }
        }
        Ok(())
    }

    /// Build an empty table with these columns.
    pub fn build(&self) -> Result<Table> {
        self.validate()?;
        let mut table = Table::with_config(self.table.clone())?;
        for column in &self.columns {
            table.add_boxed_column(column.build())?;
        }
        Ok(table)
    }
}
