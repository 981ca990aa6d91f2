//! Tabular input and the working table
//!
//! Inputs are headered CSV files. The working table is the inner join of the
//! company-attributes table and the price-performance table, one [`Row`] per
//! matched company, enriched in place with a sector label.

use crate::models::SectorLabel;
use crate::Result;
use std::fs;
use std::io::Read;
use std::path::Path;

pub mod merge;
pub use merge::{merge, resolve_name_column, NameColumn, NAME_COLUMN_CANDIDATES};

/// Column added to the enriched output
pub const SECTOR_COLUMN: &str = "Sector";

/// A headered CSV table held as text cells
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    pub headers: Vec<String>,
    pub records: Vec<Vec<String>>,
}

impl Table {
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let file = fs::File::open(path.as_ref())?;
        Self::from_reader(file)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .from_reader(reader);

        let headers = reader.headers()?.iter().map(str::to_string).collect();

        let mut records = Vec::new();
        for record in reader.records() {
            let record = record?;
            records.push(record.iter().map(str::to_string).collect());
        }

        Ok(Self { headers, records })
    }

    /// Index of a column by exact header name
    pub fn column(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// One merged company record
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    pub symbol: String,
    /// Display name used in prompts
    pub name: String,
    pub ytd: f64,
    /// Cells for every working-table column, in header order
    pub cells: Vec<String>,
    /// Assigned once by the runner
    pub sector: Option<SectorLabel>,
}

/// Ordered rows produced by the merge step
#[derive(Debug, Clone, PartialEq)]
pub struct WorkingTable {
    headers: Vec<String>,
    name_column: String,
    rows: Vec<Row>,
}

impl WorkingTable {
    pub fn new(headers: Vec<String>, name_column: String, rows: Vec<Row>) -> Self {
        Self {
            headers,
            name_column,
            rows,
        }
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// Header of the column holding the display name
    pub fn name_column(&self) -> &str {
        &self.name_column
    }

    /// Source text of `row` under `column`, if the working table has it
    pub fn cell<'r>(&self, row: &'r Row, column: &str) -> Option<&'r str> {
        let index = self.headers.iter().position(|h| h == column)?;
        row.cells.get(index).map(String::as_str)
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn rows_mut(&mut self) -> impl Iterator<Item = &mut Row> {
        self.rows.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Headers of the enriched output: every working column plus `Sector`
    pub fn enriched_headers(&self) -> Vec<&str> {
        self.headers
            .iter()
            .map(String::as_str)
            .chain(std::iter::once(SECTOR_COLUMN))
            .collect()
    }

    /// Render the enriched table as CSV text
    pub fn to_csv(&self) -> Result<String> {
        let mut writer = csv::Writer::from_writer(vec![]);
        writer.write_record(self.enriched_headers())?;

        for row in &self.rows {
            let sector = row.sector.map(SectorLabel::as_str).unwrap_or_default();
            let cells = row.cells.iter().map(String::as_str);
            writer.write_record(cells.chain(std::iter::once(sector)))?;
        }

        let bytes = writer
            .into_inner()
            .map_err(|e| crate::error::EnrichError::IoError(e.into_error()))?;
        String::from_utf8(bytes).map_err(|e| {
            crate::error::EnrichError::IoError(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                e,
            ))
        })
    }

    /// Write the enriched table, creating parent directories as needed
    pub fn write_csv(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, self.to_csv()?)?;
        Ok(())
    }
}
