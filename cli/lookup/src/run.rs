//! Main execution logic for ipspace-lookup.

use anyhow::{Context, Result};
use ipspace_table::{
    classify_error, load_with_schema, ErrorCategory, Property, SchemaConfig, Table, TableError,
};
use serde::Serialize;
use std::io::Write;
use std::net::IpAddr;
use tracing::{debug, warn};

use crate::args::{Cli, OutputFormat};

/// Outcome of a single address lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Lookup {
    /// Address is covered; decoded columns in schema order.
    Found {
        address: String,
        columns: Vec<ColumnValue>,
    },
    /// Address parsed but no range covers it.
    NotFound { address: String },
    /// Input was not an address.
    Invalid { address: String },
}

/// One decoded column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnValue {
    pub name: String,
    pub value: String,
}

/// Statistics from a run.
#[derive(Debug, Default)]
pub struct LookupStats {
    pub lines: usize,
    pub rows: usize,
    pub ranges: usize,
    pub arena_bytes: usize,
    pub found: usize,
    pub not_found: usize,
    pub invalid: usize,
    pub diagnostics: Vec<TableError>,
}

impl LookupStats {
    /// Whether the source produced any diagnostics.
    pub fn has_diagnostics(&self) -> bool {
        !self.diagnostics.is_empty()
    }

    /// Number of diagnostics in `category`.
    pub fn count(&self, category: ErrorCategory) -> usize {
        self.diagnostics
            .iter()
            .filter(|e| classify_error(e) == category)
            .count()
    }
}

/// Execute the lookup with the provided arguments.
pub fn execute(args: Cli) -> Result<LookupStats> {
    let mut schema = SchemaConfig::load(&args.schema)
        .with_context(|| format!("Failed to load schema {}", args.schema.display()))?;
    if let Some(delimiter) = args.delimiter {
        schema.table = schema.table.with_delimiter(delimiter);
    }

    let (table, report) = load_with_schema(&schema, &args.source)
        .with_context(|| format!("Failed to load source {}", args.source.display()))?;

    let mut stats = LookupStats {
        lines: report.lines,
        rows: report.rows,
        ranges: table.len(),
        arena_bytes: table.arena_bytes(),
        diagnostics: report.diagnostics,
        ..Default::default()
    };

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    for address in &args.addresses {
        let result = lookup(&table, address)?;
        match &result {
            Lookup::Found { .. } => stats.found += 1,
            Lookup::NotFound { .. } => stats.not_found += 1,
            Lookup::Invalid { .. } => stats.invalid += 1,
        }
        write_result(&mut out, &result, args.output_format)?;
    }
    out.flush()?;

    Ok(stats)
}

/// Look up one address and decode every column of the covering row.
pub fn lookup(table: &Table, address: &str) -> Result<Lookup> {
    let address = address.trim();
    let addr: IpAddr = match address.parse() {
        Ok(addr) => addr,
        Err(e) => {
            warn!(address, error = %e, "Invalid address");
            return Ok(Lookup::Invalid {
                address: address.to_string(),
            });
        }
    };

    let Some(row) = table.find(addr) else {
        debug!(address, "No covering range");
        return Ok(Lookup::NotFound {
            address: address.to_string(),
        });
    };

    let columns = table
        .columns()
        .map(|column| {
            Ok(ColumnValue {
                name: column.name().to_string(),
                value: column.render(&row)?,
            })
        })
        .collect::<ipspace_table::Result<Vec<_>>>()?;

    Ok(Lookup::Found {
        address: address.to_string(),
        columns,
    })
}

/// Write one lookup result in the requested format.
fn write_result(out: &mut impl Write, result: &Lookup, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Jsonl => {
            serde_json::to_writer(&mut *out, result)?;
            writeln!(out)?;
        }
        OutputFormat::Text => match result {
            Lookup::Found { address, columns } => {
                write!(out, "{address}")?;
                for column in columns {
                    write!(out, "\t{}={}", column.name, column.value)?;
                }
                writeln!(out)?;
            }
            Lookup::NotFound { address } => writeln!(out, "{address}\tnot found")?,
            Lookup::Invalid { address } => writeln!(out, "{address}\tinvalid address")?,
        },
    }
    Ok(())
}
