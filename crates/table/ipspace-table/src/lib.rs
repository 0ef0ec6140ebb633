//! Columnar property tables keyed by IP address ranges.
//!
//! A table is built once from delimited text, one row per line, where the
//! first field of each line is an address range and the remaining fields are
//! column values. Lookups answer "what properties apply to this address?".
//!
//! This crate provides:
//! - [`Table`] - schema construction, parsing and point lookup
//! - [`Property`] and its variants [`TagProperty`], [`FlagGroupProperty`],
//!   [`FlagProperty`] and [`StringProperty`]
//! - [`RangeIndex`] / [`NetworkIndex`] - range to row association
//! - [`SchemaConfig`] - serde-describable schemas
//!
//! # Example
//!
//! ```rust
//! use ipspace_table::{FlagGroupProperty, StringProperty, Table, TagProperty};
//!
//! let mut table = Table::new();
//! table
//!     .add_column(TagProperty::new("owner"))?
//!     .add_column(FlagGroupProperty::new("flags", ["prod", "dmz", "internal"]))?
//!     .add_column(StringProperty::new("Description"))?;
//!
//! let report = table.parse("10.1.1.0/24,asf,prod;internal,\"ASF core net\"\n");
//! assert!(report.is_clean());
//!
//! let row = table.find_str("10.1.1.56").expect("covered address");
//! let flags = table.column_as::<FlagGroupProperty>(1).expect("flag group column");
//! assert!(flags.is_set(0, &row)?);
//! assert!(!flags.is_set(1, &row)?);
//! # Ok::<(), ipspace_table::TableError>(())
//! ```

mod arena;
mod config;
mod index;
mod layout;
mod loader;
mod property;
mod range;
mod row;
mod scanner;
mod table;

pub use arena::{Arena, Span, StringRef};
pub use config::{ColumnConfig, ColumnKind, SchemaConfig, TableConfig, DEFAULT_DELIMITER};
pub use index::{NetworkIndex, RangeIndex};
pub use ipspace_error::{classify_error, ErrorCategory, Result, TableError, ValueError};
pub use layout::Layout;
pub use loader::{load_table, load_with_schema, read_source};
pub use property::{
    FlagGroupProperty, FlagProperty, Property, PropertyBase, PropertyHandle, Slot,
    StringProperty, TagProperty, Token,
};
pub use range::AddrRange;
pub use row::Row;
pub use scanner::{next_token, Tokens, QUOTE};
pub use table::{ParseReport, Table};
