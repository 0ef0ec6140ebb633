//! Table - rows of column properties keyed by address range.

use crate::arena::{Arena, Span};
use crate::config::TableConfig;
use crate::index::{NetworkIndex, RangeIndex};
use crate::layout::Layout;
use crate::property::{Property, PropertyHandle, Token};
use crate::range::AddrRange;
use crate::row::Row;
use crate::scanner::next_token;
use ipspace_error::{classify_error, ErrorCategory, Result, TableError};
use std::net::IpAddr;
use tracing::{debug, warn};

/// A table of property columns whose rows are labeled by address ranges.
///
/// Columns are added first, then one or more sources are parsed, then the
/// table answers point lookups. Adding columns after parsing has started is
/// rejected.
pub struct Table<I = NetworkIndex<Span>> {
    config: TableConfig,
    layout: Layout,
    arena: Arena,
    index: I,
    frozen: bool,
}

impl<I> std::fmt::Debug for Table<I> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Table")
            .field("config", &self.config)
            .field("layout", &self.layout)
            .field("arena_bytes", &self.arena.len())
            .field("frozen", &self.frozen)
            .finish_non_exhaustive()
    }
}

impl Table {
    /// Creates an empty table with the default configuration.
    pub fn new() -> Self {
        Self::build(TableConfig::default(), NetworkIndex::new())
    }

    /// Creates an empty table with `config`.
    ///
    /// Fails if the configuration does not validate.
    pub fn with_config(config: TableConfig) -> Result<Self> {
        Self::with_index(config, NetworkIndex::new())
    }
}

impl Default for Table {
    fn default() -> Self {
        Self::new()
    }
}

impl<I: RangeIndex<Span>> Table<I> {
    /// Creates an empty table backed by a caller-supplied range index.
    ///
    /// Fails if the configuration does not validate.
    pub fn with_index(config: TableConfig, index: I) -> Result<Self> {
        config.validate()?;
        Ok(Self::build(config, index))
    }

    fn build(config: TableConfig, index: I) -> Self {
        Self {
            config,
            layout: Layout::new(),
            arena: Arena::new(),
            index,
            frozen: false,
        }
    }

    /// Adds a property column.
    pub fn add_column<P: Property>(&mut self, column: P) -> Result<&mut Self> {
        self.add_boxed_column(Box::new(column))
    }

    /// Adds an already boxed property column.
    pub fn add_boxed_column(&mut self, column: PropertyHandle) -> Result<&mut Self> {
        if self.frozen {
            return Err(TableError::SchemaFrozen(column.name().to_string()));
        }
        let slot = self.layout.push(column)?;
        debug!(
            index = slot.index,
            offset = slot.offset,
            row_size = self.layout.row_size(),
            "Added column"
        );
        Ok(self)
    }

    /// Parses `src`, one row per line.
    ///
    /// Bad lines and bad column values are reported in the returned
    /// [`ParseReport`] and logged; they never stop the parse. A line with an
    /// invalid range is skipped. A row with invalid column values is kept with
    /// whatever those columns managed to write.
    pub fn parse(&mut self, src: &str) -> ParseReport {
        self.frozen = true;
        let delimiter = self.config.delimiter;
        let row_size = self.layout.row_size();
        let mut report = ParseReport::default();

        for (line_idx, line) in src.lines().enumerate() {
            let line_no = line_idx + 1;
            report.lines += 1;

            let (range_token, mut rest) = line.split_once(delimiter).unwrap_or((line, ""));
            let range_token = range_token.trim();
            let range = match range_token.parse::<AddrRange>() {
                Ok(range) => range,
                Err(reason) => {
                    warn!(
                        line = line_no,
                        reason = %reason,
                        "{} is not a valid range specification",
                        range_token
                    );
                    report.skipped += 1;
                    report.diagnostics.push(TableError::RangeParse {
                        line: line_no,
                        token: range_token.to_string(),
                        reason,
                    });
                    continue;
                }
            };

            let span = self.arena.allocate(row_size);
            let mut offset = 0;
            for column in self.layout.columns_mut() {
                let text = next_token(&mut rest, delimiter);
                let token = if column.needs_persisted_token() {
                    Token::persisted(text, self.arena.persist(text))
                } else {
                    Token::new(text)
                };

                let size = column.size();
                let dest = &mut self.arena.slice_mut(span)[offset..offset + size];
                if let Err(source) = column.parse(token, dest) {
                    let index = column.index().unwrap_or_default();
                    warn!(
                        line = line_no,
                        column = index,
                        name = %column.name(),
                        error = %source,
                        "Value \"{}\" at index {} on line {} is invalid",
                        text,
                        index,
                        line_no
                    );
                    report.diagnostics.push(TableError::ColumnParse {
                        line: line_no,
                        column: index,
                        name: column.name().to_string(),
                        value: text.to_string(),
                        source,
                    });
                }
                offset += size;
            }

            self.index.mark(&range, span);
            report.rows += 1;
        }

        debug!(
            lines = report.lines,
            rows = report.rows,
            skipped = report.skipped,
            diagnostics = report.diagnostics.len(),
            ranges = self.index.count(),
            arena_bytes = self.arena.len(),
            "Parsed table source"
        );

        report
    }

    /// Looks up the row for `addr`.
    pub fn find(&self, addr: IpAddr) -> Option<Row<'_>> {
        self.index
            .find(addr)
            .map(|span| Row::new(&self.arena, *span))
    }

    /// Parses `addr` and looks up its row.
    pub fn find_str(&self, addr: &str) -> Option<Row<'_>> {
        match addr.trim().parse::<IpAddr>() {
            Ok(addr) => self.find(addr),
            Err(_) => {
                warn!(addr = %addr, "Failed to parse IP address for table lookup");
                None
            }
        }
    }

    /// Returns the number of ranges in the index.
    pub fn len(&self) -> usize {
        self.index.count()
    }

    /// Returns true if no range has been stored.
    pub fn is_empty(&self) -> bool {
        self.index.count() == 0
    }

    /// Property for column `index`.
    pub fn column(&self, index: usize) -> Option<&dyn Property> {
        self.layout.get(index)
    }

    /// Property for column `index` as its concrete type.
    pub fn column_as<P: Property>(&self, index: usize) -> Option<&P> {
        self.column(index)
            .and_then(|c| c.as_any().downcast_ref::<P>())
    }

    /// First property called `name`.
    pub fn column_named(&self, name: &str) -> Option<&dyn Property> {
        self.layout.position(name).and_then(|i| self.layout.get(i))
    }

    /// Columns in order.
    pub fn columns(&self) -> impl Iterator<Item = &dyn Property> {
        self.layout.iter()
    }

    /// Number of columns.
    pub fn column_count(&self) -> usize {
        self.layout.len()
    }

    /// Size of one row in bytes.
    pub fn row_size(&self) -> usize {
        self.layout.row_size()
    }

    /// Bytes held by the arena, rows and persisted strings together.
    pub fn arena_bytes(&self) -> usize {
        self.arena.len()
    }

    /// The table configuration.
    pub fn config(&self) -> &TableConfig {
        &self.config
    }

    /// The range index.
    pub fn index(&self) -> &I {
        &self.index
    }
}

/// Outcome of parsing one source.
#[derive(Debug, Default)]
pub struct ParseReport {
    /// Lines read.
    pub lines: usize,

    /// Rows committed to the index.
    pub rows: usize,

    /// Lines skipped for an invalid range.
    pub skipped: usize,

    /// Everything that was reported, in input order.
    pub diagnostics: Vec<TableError>,
}

impl ParseReport {
    /// Returns true if nothing was reported.
    pub fn is_clean(&self) -> bool {
        self.diagnostics.is_empty()
    }

    /// Number of diagnostics in `category`.
    pub fn count(&self, category: ErrorCategory) -> usize {
        self.diagnostics
            .iter()
            .filter(|e| classify_error(e) == category)
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::property::{FlagGroupProperty, FlagProperty, StringProperty, TagProperty};
    use ipspace_error::ValueError;

    const SOURCE: &str = r#"10.1.1.0/24,asf,cmi,prod;internal,"ASF core net"
192.168.28.0/25,asf,ind,prod,"Indy Net"
192.168.28.128/25,asf,abq,dmz;internal,"Albuquerque zone"
"#;

    fn create_test_table() -> Table {
        let mut table = Table::new();
        table
            .add_column(TagProperty::new("owner"))
            .and_then(|t| t.add_column(TagProperty::new("colo")))
            .and_then(|t| {
                t.add_column(FlagGroupProperty::new("flags", ["prod", "dmz", "internal"]))
            })
            .and_then(|t| t.add_column(StringProperty::new("Description")))
            .unwrap();
        table
    }

    fn flags(table: &Table) -> &FlagGroupProperty {
        table.column_as::<FlagGroupProperty>(2).unwrap()
    }

    #[test]
    fn test_schema() {
        let table = create_test_table();
        assert_eq!(table.column_count(), 4);
        assert_eq!(table.row_size(), 1 + 1 + 1 + 8);
        assert_eq!(table.column(3).unwrap().offset().unwrap(), 3);
        assert_eq!(table.column_named("colo").unwrap().index().unwrap(), 1);
        assert!(table.is_empty());
    }

    #[test]
    fn test_parse_and_find() {
        let mut table = create_test_table();
        let report = table.parse(SOURCE);

        assert!(report.is_clean());
        assert_eq!(report.lines, 3);
        assert_eq!(report.rows, 3);
        assert_eq!(table.len(), 3);

        let row = table.find_str("10.1.1.56").unwrap();
        let flags = flags(&table);
        assert!(flags.is_set(0, &row).unwrap());
        assert!(!flags.is_set(1, &row).unwrap());
        assert!(flags.is_set(2, &row).unwrap());

        let desc = table.column_as::<StringProperty>(3).unwrap();
        assert_eq!(desc.value(&row).unwrap(), "ASF core net");

        let colo = table.column_as::<TagProperty>(1).unwrap();
        assert_eq!(colo.value(&row).unwrap(), "cmi");
        assert_eq!(colo.vocabulary(), &["cmi", "ind", "abq"]);
    }

    #[test]
    fn test_find_each_range() {
        let mut table = create_test_table();
        table.parse(SOURCE);
        let colo = table.column_as::<TagProperty>(1).unwrap();

        let ind = table.find_str("192.168.28.1").unwrap();
        let abq = table.find_str("192.168.28.200").unwrap();
        assert_eq!(colo.value(&ind).unwrap(), "ind");
        assert_eq!(colo.value(&abq).unwrap(), "abq");
        assert_ne!(ind, abq);

        assert!(table.find_str("192.168.29.1").is_none());
        assert!(table.find_str("not-an-ip").is_none());
    }

    #[test]
    fn test_bad_range_skips_line() {
        let mut table = create_test_table();
        let report = table.parse("10.1.1,asf,cmi,prod,x\n\n8.8.8.0/24,goog,mtv,-,dns\n");

        assert_eq!(report.lines, 3);
        assert_eq!(report.skipped, 2);
        assert_eq!(report.rows, 1);
        assert_eq!(report.count(ErrorCategory::Line), 2);
        assert!(matches!(
            &report.diagnostics[0],
            TableError::RangeParse { line: 1, token, .. } if token == "10.1.1"
        ));
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_bad_column_keeps_row_and_partial_bits() {
        let mut table = create_test_table();
        let report = table.parse("10.0.0.0/8,asf,cmi,prod;bogus,\"net ten\"\n");

        assert_eq!(report.rows, 1);
        assert_eq!(report.count(ErrorCategory::Column), 1);
        assert!(matches!(
            &report.diagnostics[0],
            TableError::ColumnParse { line: 1, column: 2, value, .. } if value == "prod;bogus"
        ));

        let row = table.find_str("10.9.9.9").unwrap();
        let flags = flags(&table);
        assert!(flags.is_set(0, &row).unwrap());
        assert!(!flags.is_set(1, &row).unwrap());

        let desc = table.column_as::<StringProperty>(3).unwrap();
        assert_eq!(desc.value(&row).unwrap(), "net ten");
    }

    #[test]
    fn test_missing_trailing_columns_are_empty_tokens() {
        let mut table = Table::new();
        table
            .add_column(TagProperty::new("owner"))
            .and_then(|t| t.add_column(FlagProperty::new("active")))
            .and_then(|t| t.add_column(StringProperty::new("desc")))
            .unwrap();

        let report = table.parse("1.2.3.4,asf\n");

        assert_eq!(report.rows, 1);
        assert_eq!(report.count(ErrorCategory::Column), 1);

        let row = table.find_str("1.2.3.4").unwrap();
        let active = table.column_as::<FlagProperty>(1).unwrap();
        let desc = table.column_as::<StringProperty>(2).unwrap();
        assert!(!active.value(&row).unwrap());
        assert_eq!(desc.value(&row).unwrap(), "");
    }

    #[test]
    fn test_add_column_after_parse_rejected() {
        let mut table = create_test_table();
        table.parse(SOURCE);

        let result = table.add_column(FlagProperty::new("late"));
        assert!(matches!(result, Err(TableError::SchemaFrozen(name)) if name == "late"));
        assert_eq!(table.column_count(), 4);
    }

    #[test]
    fn test_later_source_shadows_earlier() {
        let mut table = create_test_table();
        table.parse(SOURCE);
        table.parse("10.1.1.0/25,apache,lab,dmz,\"Lab slice\"\n");

        let desc = table.column_as::<StringProperty>(3).unwrap();
        let low = table.find_str("10.1.1.5").unwrap();
        let high = table.find_str("10.1.1.200").unwrap();
        assert_eq!(desc.value(&low).unwrap(), "Lab slice");
        assert_eq!(desc.value(&high).unwrap(), "ASF core net");
        assert_eq!(table.len(), 4);
    }

    #[test]
    fn test_dash_range_is_one_range() {
        let mut table = Table::new();
        table.add_column(TagProperty::new("site")).unwrap();

        let report = table.parse("10.0.0.1-10.0.0.6,lab\n");

        assert_eq!(report.rows, 1);
        assert_eq!(table.len(), 1);
        assert_eq!(table.index().network_count(), 4);
    }

    #[test]
    fn test_cidr_host_bits_are_masked() {
        let mut table = Table::new();
        table.add_column(TagProperty::new("site")).unwrap();

        let report = table.parse("10.1.1.5/24,lab\n");

        assert!(report.is_clean());
        assert!(table.find_str("10.1.1.0").is_some());
        assert!(table.find_str("10.1.1.255").is_some());
        assert!(table.find_str("10.1.2.0").is_none());
    }

    #[test]
    fn test_bulk_load() {
        let mut table = Table::new();
        table.add_column(TagProperty::new("group")).unwrap();

        let mut src = String::new();
        for i in 0..40_000u32 {
            let base = std::net::Ipv4Addr::from(0x0A00_0000 + i * 4);
            src.push_str(&format!("{base}/30,t{}\n", i % 200));
        }
        let report = table.parse(&src);

        assert!(report.is_clean());
        assert_eq!(report.rows, 40_000);
        assert_eq!(table.len(), 40_000);

        let group = table.column_as::<TagProperty>(0).unwrap();
        let row = table.find_str("10.2.112.254").unwrap();
        assert_eq!(group.value(&row).unwrap(), "t199");
    }

    #[test]
    fn test_tag_overflow_reported() {
        let mut table = Table::new();
        table.add_column(TagProperty::new("owner")).unwrap();

        let mut src = String::new();
        for i in 0..=TagProperty::MAX_TAGS {
            src.push_str(&format!("10.0.{}.{},owner{i}\n", i / 256, i % 256));
        }
        let report = table.parse(&src);

        assert_eq!(report.rows, TagProperty::MAX_TAGS + 1);
        assert_eq!(report.count(ErrorCategory::Column), 1);
        assert!(matches!(
            &report.diagnostics[0],
            TableError::ColumnParse {
                line: 257,
                source: ValueError::VocabularyOverflow { limit: 256 },
                ..
            }
        ));

        let owner = table.column_as::<TagProperty>(0).unwrap();
        assert_eq!(owner.vocabulary().len(), TagProperty::MAX_TAGS);
        let last = table.find_str("10.0.1.0").unwrap();
        assert_eq!(owner.value(&last).unwrap(), "owner0");
        let full = table.find_str("10.0.0.255").unwrap();
        assert_eq!(owner.value(&full).unwrap(), "owner255");
    }

    #[test]
    fn test_invalid_config_rejected() {
        assert!(matches!(
            Table::with_config(TableConfig::new().with_delimiter('"')),
            Err(TableError::Config(_))
        ));
        assert!(matches!(
            Table::with_index(TableConfig::new().with_delimiter('\n'), NetworkIndex::<Span>::new()),
            Err(TableError::Config(_))
        ));
    }

    #[test]
    fn test_alternate_delimiter() {
        let mut table = Table::with_config(TableConfig::new().with_delimiter('|')).unwrap();
        table
            .add_column(TagProperty::new("owner"))
            .and_then(|t| t.add_column(StringProperty::new("desc")))
            .unwrap();

        let report = table.parse("10.0.0.1-10.0.0.9|asf|\"a|b\"\n");
        assert!(report.is_clean());

        let row = table.find_str("10.0.0.5").unwrap();
        let desc = table.column_as::<StringProperty>(1).unwrap();
        assert_eq!(desc.value(&row).unwrap(), "a|b");
    }

    #[test]
    fn test_crlf_lines() {
        let mut table = create_test_table();
        let report = table.parse("10.1.1.0/24,asf,cmi,prod,\"core\"\r\n");

        assert!(report.is_clean());
        let row = table.find_str("10.1.1.1").unwrap();
        let desc = table.column_as::<StringProperty>(3).unwrap();
        assert_eq!(desc.value(&row).unwrap(), "core");
    }
}
