//! ipspace-lookup CLI
//!
//! Address lookups against an ipspace property table.

use clap::Parser;
use ipspace_cli_common::{format_bytes, format_count, init_logging};
use ipspace_table::ErrorCategory;

mod args;
mod run;

use args::Cli;

/// Diagnostics echoed in the summary before truncating.
const MAX_REPORTED_DIAGNOSTICS: usize = 10;

fn main() -> anyhow::Result<()> {
    let args = Cli::parse();

    init_logging(args.log_level)?;

    let strict = args.strict;
    let stats = run::execute(args)?;

    // Report results to stderr
    eprintln!();
    eprintln!("Lookup completed:");
    eprintln!("  Source lines:     {}", format_count(stats.lines));
    eprintln!("  Rows:             {}", format_count(stats.rows));
    eprintln!("  Ranges indexed:   {}", format_count(stats.ranges));
    eprintln!("  Table storage:    {}", format_bytes(stats.arena_bytes));
    eprintln!("  Found:            {}", stats.found);
    eprintln!("  Not found:        {}", stats.not_found);
    eprintln!("  Invalid:          {}", stats.invalid);
    eprintln!(
        "  Diagnostics:      {} ({} skipped lines, {} column errors)",
        stats.diagnostics.len(),
        stats.count(ErrorCategory::Line),
        stats.count(ErrorCategory::Column)
    );

    if stats.has_diagnostics() {
        for error in stats.diagnostics.iter().take(MAX_REPORTED_DIAGNOSTICS) {
            eprintln!("  Error: {}", error);
        }
        if stats.diagnostics.len() > MAX_REPORTED_DIAGNOSTICS {
            eprintln!(
                "  ... {} more",
                stats.diagnostics.len() - MAX_REPORTED_DIAGNOSTICS
            );
        }
        if strict {
            std::process::exit(4);
        }
    }

    Ok(())
}
