//! Inner join of the company-attributes and price-performance tables

use super::{Row, Table, WorkingTable, SECTOR_COLUMN};
use crate::error::EnrichError;
use crate::Result;
use std::collections::HashMap;
use tracing::{debug, warn};

pub const SYMBOL_COLUMN: &str = "symbol";
pub const YTD_COLUMN: &str = "ytd";

/// Display-name columns, most preferred first
pub const NAME_COLUMN_CANDIDATES: &[&str] = &["name", "company"];

/// Column synthesized from `symbol` when no candidate name column exists
pub const SYNTHETIC_NAME_COLUMN: &str = "name_for_prompt";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameColumn {
    /// Index of an existing column
    Existing(usize),
    /// No candidate present; use the symbol
    Synthesized,
}

/// First candidate header present in `headers`
pub fn resolve_name_column(headers: &[String], candidates: &[&str]) -> NameColumn {
    candidates
        .iter()
        .find_map(|candidate| headers.iter().position(|h| h == candidate))
        .map(NameColumn::Existing)
        .unwrap_or(NameColumn::Synthesized)
}

fn require_column(table: &Table, column: &str, table_name: &str) -> Result<usize> {
    table.column(column).ok_or_else(|| {
        EnrichError::SchemaError(format!(
            "{} table must have a '{}' column",
            table_name, column
        ))
    })
}

/// Join `attributes` with the `ytd` column of `prices` on `symbol`.
///
/// Rows whose symbol is missing from either side are dropped silently.
pub fn merge(attributes: &Table, prices: &Table) -> Result<WorkingTable> {
    let attr_symbol = require_column(attributes, SYMBOL_COLUMN, "attributes")?;
    let price_symbol = require_column(prices, SYMBOL_COLUMN, "price-change")?;
    let price_ytd = require_column(prices, YTD_COLUMN, "price-change")?;

    // The price table is authoritative for ytd, and the sector is always reassigned
    let shadowed_ytd = attributes.column(YTD_COLUMN);
    if shadowed_ytd.is_some() {
        warn!("attributes table has its own 'ytd' column; using the price-change value");
    }
    let stale_sector = attributes.column(SECTOR_COLUMN);
    if stale_sector.is_some() {
        warn!("attributes table has its own 'Sector' column; it will be replaced");
    }
    let dropped: Vec<usize> = [shadowed_ytd, stale_sector].into_iter().flatten().collect();

    let name_column = resolve_name_column(&attributes.headers, NAME_COLUMN_CANDIDATES);

    let mut headers: Vec<String> = attributes
        .headers
        .iter()
        .enumerate()
        .filter(|(i, _)| !dropped.contains(i))
        .map(|(_, h)| h.clone())
        .collect();
    headers.push(YTD_COLUMN.to_string());

    let name_header = match name_column {
        NameColumn::Existing(i) => attributes.headers[i].clone(),
        NameColumn::Synthesized => {
            headers.push(SYNTHETIC_NAME_COLUMN.to_string());
            SYNTHETIC_NAME_COLUMN.to_string()
        }
    };

    let mut ytd_by_symbol: HashMap<&str, Vec<(&str, f64)>> = HashMap::new();
    for record in &prices.records {
        let symbol = record[price_symbol].as_str();
        let raw = record[price_ytd].as_str();
        if symbol.is_empty() || raw.trim().is_empty() {
            continue;
        }
        match raw.trim().parse::<f64>() {
            Ok(ytd) if ytd.is_finite() => {
                ytd_by_symbol.entry(symbol).or_default().push((raw, ytd))
            }
            Ok(_) => warn!(symbol = %symbol, ytd = %raw, "Skipping non-finite ytd"),
            Err(_) => warn!(symbol = %symbol, ytd = %raw, "Skipping non-numeric ytd"),
        }
    }

    let mut rows = Vec::new();
    for record in &attributes.records {
        let symbol = record[attr_symbol].as_str();
        let Some(matches) = ytd_by_symbol.get(symbol) else {
            continue;
        };

        let name = match name_column {
            NameColumn::Existing(i) if !record[i].trim().is_empty() => record[i].clone(),
            _ => symbol.to_string(),
        };

        for (raw, ytd) in matches {
            let mut cells: Vec<String> = record
                .iter()
                .enumerate()
                .filter(|(i, _)| !dropped.contains(i))
                .map(|(_, cell)| cell.clone())
                .collect();
            cells.push(raw.to_string());
            if name_column == NameColumn::Synthesized {
                cells.push(symbol.to_string());
            }

            rows.push(Row {
                symbol: symbol.to_string(),
                name: name.clone(),
                ytd: *ytd,
                cells,
                sector: None,
            });
        }
    }

    debug!(
        attributes = attributes.len(),
        prices = prices.len(),
        merged = rows.len(),
        "Merged input tables"
    );

    Ok(WorkingTable::new(headers, name_header, rows))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SectorLabel;

    fn table(csv: &str) -> Table {
        Table::from_reader(csv.as_bytes()).unwrap()
    }

    #[test]
    fn test_single_match_example() {
        let attributes = table("symbol,name\nAAPL,Apple Inc\n");
        let prices = table("symbol,ytd\nAAPL,12.5\nMSFT,3.1\n");

        let merged = merge(&attributes, &prices).unwrap();

        assert_eq!(merged.len(), 1);
        let row = &merged.rows()[0];
        assert_eq!(row.symbol, "AAPL");
        assert_eq!(row.name, "Apple Inc");
        assert_eq!(row.ytd, 12.5);
        assert_eq!(row.cells, vec!["AAPL", "Apple Inc", "12.5"]);
        assert_eq!(merged.headers(), ["symbol", "name", "ytd"]);
        assert_eq!(merged.name_column(), "name");
    }

    #[test]
    fn test_inner_join_drops_unmatched_rows() {
        let attributes =
            table("symbol,name\nAAPL,Apple\nNVDA,Nvidia\nINTC,Intel\nXYZ,Unknown Co\n");
        let prices = table("symbol,ytd\nINTC,-4.2\nAAPL,12.5\nMSFT,3.1\nNVDA,80\n");

        let merged = merge(&attributes, &prices).unwrap();

        let symbols: Vec<&str> = merged.rows().iter().map(|r| r.symbol.as_str()).collect();
        assert_eq!(symbols, vec!["AAPL", "NVDA", "INTC"]);
    }

    #[test]
    fn test_price_table_extra_columns_ignored() {
        let attributes = table("symbol,name,city\nAAPL,Apple,Cupertino\n");
        let prices = table("symbol,ytd,last\nAAPL,12.5,190.1\n");

        let merged = merge(&attributes, &prices).unwrap();

        assert_eq!(merged.headers(), ["symbol", "name", "city", "ytd"]);
        assert_eq!(merged.rows()[0].cells, vec!["AAPL", "Apple", "Cupertino", "12.5"]);
    }

    #[test]
    fn test_missing_symbol_is_schema_error() {
        let attributes = table("ticker,name\nAAPL,Apple\n");
        let prices = table("symbol,ytd\nAAPL,12.5\n");

        let err = merge(&attributes, &prices).unwrap_err();
        assert!(matches!(err, EnrichError::SchemaError(_)));

        let attributes = table("symbol,name\nAAPL,Apple\n");
        let prices = table("ticker,ytd\nAAPL,12.5\n");
        let err = merge(&attributes, &prices).unwrap_err();
        assert!(matches!(err, EnrichError::SchemaError(_)));
    }

    #[test]
    fn test_missing_ytd_is_schema_error() {
        let attributes = table("symbol,name\nAAPL,Apple\n");
        let prices = table("symbol,change\nAAPL,12.5\n");

        let err = merge(&attributes, &prices).unwrap_err();
        assert!(err.to_string().contains("'ytd'"));
    }

    #[test]
    fn test_name_column_priority() {
        let headers = |cols: &[&str]| cols.iter().map(|c| c.to_string()).collect::<Vec<_>>();

        assert_eq!(
            resolve_name_column(&headers(&["company", "symbol", "name"]), NAME_COLUMN_CANDIDATES),
            NameColumn::Existing(2)
        );
        assert_eq!(
            resolve_name_column(&headers(&["symbol", "company"]), NAME_COLUMN_CANDIDATES),
            NameColumn::Existing(1)
        );
        assert_eq!(
            resolve_name_column(&headers(&["symbol", "Name"]), NAME_COLUMN_CANDIDATES),
            NameColumn::Synthesized
        );
    }

    #[test]
    fn test_company_column_used_for_names() {
        let attributes = table("symbol,company\nAMD,Advanced Micro Devices\n");
        let prices = table("symbol,ytd\nAMD,20\n");

        let merged = merge(&attributes, &prices).unwrap();

        assert_eq!(merged.name_column(), "company");
        assert_eq!(merged.rows()[0].name, "Advanced Micro Devices");
    }

    #[test]
    fn test_synthesized_name_column() {
        let attributes = table("symbol,city\nAAPL,Cupertino\n");
        let prices = table("symbol,ytd\nAAPL,12.5\n");

        let merged = merge(&attributes, &prices).unwrap();

        assert_eq!(merged.name_column(), SYNTHETIC_NAME_COLUMN);
        assert_eq!(merged.headers(), ["symbol", "city", "ytd", "name_for_prompt"]);
        assert_eq!(merged.rows()[0].name, "AAPL");
        assert_eq!(merged.rows()[0].cells, vec!["AAPL", "Cupertino", "12.5", "AAPL"]);
    }

    #[test]
    fn test_blank_name_uses_symbol() {
        let attributes = table("symbol,name\nAAPL,\n");
        let prices = table("symbol,ytd\nAAPL,12.5\n");

        let merged = merge(&attributes, &prices).unwrap();
        assert_eq!(merged.rows()[0].name, "AAPL");
    }

    #[test]
    fn test_null_and_non_numeric_ytd_never_join() {
        let attributes = table("symbol,name\nAAPL,Apple\nMSFT,Microsoft\nGOOG,Alphabet\n");
        let prices = table("symbol,ytd\nAAPL,\nMSFT,n/a\nGOOG,7\n");

        let merged = merge(&attributes, &prices).unwrap();

        assert_eq!(merged.len(), 1);
        assert_eq!(merged.rows()[0].symbol, "GOOG");
    }

    #[test]
    fn test_non_finite_ytd_never_joins() {
        let attributes =
            table("symbol,name\nAAPL,Apple\nMSFT,Microsoft\nGOOG,Alphabet\nAMD,AMD\n");
        let prices = table("symbol,ytd\nAAPL,NaN\nMSFT,n/a\nGOOG,inf\nAMD,-infinity\n");

        let merged = merge(&attributes, &prices).unwrap();
        assert!(merged.is_empty());

        let prices = table("symbol,ytd\nAAPL,nan\nAAPL,4.5\n");
        let merged = merge(&attributes, &prices).unwrap();
        assert_eq!(merged.len(), 1);
        assert_eq!(merged.rows()[0].ytd, 4.5);
    }

    #[test]
    fn test_blank_symbols_never_join() {
        let attributes = table("symbol,name\n,Ghost\nAAPL,Apple\n");
        let prices = table("symbol,ytd\n,1.0\nAAPL,2.0\n");

        let merged = merge(&attributes, &prices).unwrap();
        assert_eq!(merged.len(), 1);
    }

    #[test]
    fn test_symbols_are_matched_exactly() {
        let attributes = table("symbol,name\naapl,Apple\n");
        let prices = table("symbol,ytd\nAAPL,12.5\n");

        assert!(merge(&attributes, &prices).unwrap().is_empty());
    }

    #[test]
    fn test_duplicate_symbols_produce_each_pair() {
        let attributes = table("symbol,name\nGOOG,Alphabet A\nGOOG,Alphabet C\n");
        let prices = table("symbol,ytd\nGOOG,7\nGOOG,8\n");

        let merged = merge(&attributes, &prices).unwrap();

        let pairs: Vec<(&str, f64)> = merged
            .rows()
            .iter()
            .map(|r| (r.name.as_str(), r.ytd))
            .collect();
        assert_eq!(
            pairs,
            vec![
                ("Alphabet A", 7.0),
                ("Alphabet A", 8.0),
                ("Alphabet C", 7.0),
                ("Alphabet C", 8.0),
            ]
        );
    }

    #[test]
    fn test_price_ytd_replaces_attribute_ytd() {
        let attributes = table("symbol,ytd,name\nAAPL,999,Apple\n");
        let prices = table("symbol,ytd\nAAPL,12.5\n");

        let merged = merge(&attributes, &prices).unwrap();

        assert_eq!(merged.headers(), ["symbol", "name", "ytd"]);
        assert_eq!(merged.rows()[0].cells, vec!["AAPL", "Apple", "12.5"]);
        assert_eq!(merged.rows()[0].ytd, 12.5);
    }

    #[test]
    fn test_existing_sector_column_is_replaced() {
        let attributes = table("symbol,name,Sector\nAAPL,Apple,Tech\n");
        let prices = table("symbol,ytd\nAAPL,1.0\n");

        let mut merged = merge(&attributes, &prices).unwrap();
        assert_eq!(merged.headers(), ["symbol", "name", "ytd"]);
        assert_eq!(merged.rows()[0].cells, vec!["AAPL", "Apple", "1.0"]);

        for row in merged.rows_mut() {
            row.sector = Some(SectorLabel::Technology);
        }
        let written = Table::from_reader(merged.to_csv().unwrap().as_bytes()).unwrap();
        assert_eq!(written.headers, vec!["symbol", "name", "ytd", "Sector"]);
        assert_eq!(written.records[0], vec!["AAPL", "Apple", "1.0", "Technology"]);
    }
}
