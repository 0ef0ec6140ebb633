//! CLI argument definitions for ipspace-lookup.

use clap::{Parser, ValueEnum};
use ipspace_cli_common::LogLevel;
use std::path::PathBuf;

/// Address lookups against an ipspace property table.
///
/// Builds a table from a delimited source file and a JSON schema, then
/// prints the column values that apply to each address.
///
/// ## Examples
///
/// Basic usage:
///   ipspace-lookup --source ranges.csv --schema schema.json 10.1.1.56
///
/// Tab separated input, JSON output:
///   ipspace-lookup --source ranges.tsv --schema schema.json --delimiter '\t' \
///       --output-format json 192.168.28.7 2001:db8::1
///
/// Fail on any malformed line:
///   ipspace-lookup --source ranges.csv --schema schema.json --strict 10.0.0.1
#[derive(Parser, Debug)]
#[command(name = "ipspace-lookup")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Delimited source file, one range per line
    #[arg(short, long, env = "IPSPACE_SOURCE")]
    pub source: PathBuf,

    /// JSON schema describing the columns
    #[arg(long, env = "IPSPACE_SCHEMA")]
    pub schema: PathBuf,

    /// Field delimiter, overriding the schema ('\t' for tab)
    #[arg(short, long, value_parser = parse_delimiter)]
    pub delimiter: Option<char>,

    /// Exit with status 4 when the source produced any diagnostics
    #[arg(long)]
    pub strict: bool,

    /// Output format
    #[arg(long, value_enum, default_value = "text")]
    pub output_format: OutputFormat,

    /// Log level
    #[arg(short = 'l', long, value_enum, default_value = "info")]
    pub log_level: LogLevel,

    /// Addresses to look up
    #[arg(required = true)]
    pub addresses: Vec<String>,
}

/// Output format argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// One tab separated line per address
    Text,
    /// JSON Lines (one JSON object per address)
    Jsonl,
}

/// Parse a single-character delimiter, accepting `\t` for tab.
fn parse_delimiter(s: &str) -> Result<char, String> {
    if s == "\\t" {
        return Ok('\t');
    }
    let mut chars = s.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Ok(c),
        _ => Err(format!("'{}' is not a single character", s)),
    }
}
