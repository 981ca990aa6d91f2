//! Investment summary generation
//!
//! Sends a capped, four-column CSV view of the enriched table to the model
//! and returns its free-text summary verbatim.

use crate::error::EnrichError;
use crate::llm::{ChatModel, ChatRequest, RetryPolicy};
use crate::models::SectorLabel;
use crate::table::merge::YTD_COLUMN;
use crate::table::WorkingTable;
use crate::Result;
use tracing::info;

/// Most rows ever included in the summary prompt
pub const SUMMARY_ROW_LIMIT: usize = 101;

pub const DEFAULT_UNIVERSE: &str = "California-based Nasdaq-100 companies";

pub fn summary_system_prompt(universe: &str) -> String {
    format!(
        "You are an equity strategy assistant. Using the provided table, \
         summarize YTD performance for {}. \
         Recommend the two best sectors and two or more companies per sector. \
         Be concise and factual.",
        universe
    )
}

/// First `limit` rows as CSV with columns symbol, name column, ytd, Sector
pub fn render_summary_table(table: &WorkingTable, limit: usize) -> Result<String> {
    let mut writer = csv::Writer::from_writer(vec![]);
    writer.write_record(["symbol", table.name_column(), "ytd", "Sector"])?;

    for row in table.rows().iter().take(limit) {
        let ytd_cell = match table.cell(row, YTD_COLUMN) {
            Some(text) => text.to_string(),
            None => row.ytd.to_string(),
        };
        writer.write_record([
            row.symbol.as_str(),
            row.name.as_str(),
            ytd_cell.as_str(),
            row.sector.map(SectorLabel::as_str).unwrap_or_default(),
        ])?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| EnrichError::IoError(e.into_error()))?;
    String::from_utf8(bytes).map_err(|e| {
        EnrichError::IoError(std::io::Error::new(std::io::ErrorKind::InvalidData, e))
    })
}

pub fn summary_prompt(table: &WorkingTable, limit: usize) -> Result<String> {
    Ok(format!(
        "Here is a CSV table with columns symbol,{},ytd,Sector:\n\n{}\n",
        table.name_column(),
        render_summary_table(table, limit)?
    ))
}

pub struct SummaryGenerator<'a> {
    model: &'a dyn ChatModel,
    retry: RetryPolicy,
    universe: String,
    row_limit: usize,
    temperature: f32,
}

impl<'a> SummaryGenerator<'a> {
    pub fn new(model: &'a dyn ChatModel, retry: RetryPolicy) -> Self {
        Self {
            model,
            retry,
            universe: DEFAULT_UNIVERSE.to_string(),
            row_limit: SUMMARY_ROW_LIMIT,
            temperature: 0.0,
        }
    }

    pub fn with_universe(mut self, universe: impl Into<String>) -> Self {
        self.universe = universe.into();
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub async fn summarize(&self, table: &WorkingTable) -> Result<String> {
        let request = ChatRequest::new(
            summary_system_prompt(&self.universe),
            summary_prompt(table, self.row_limit)?,
            self.temperature,
        );

        info!(
            rows = table.len().min(self.row_limit),
            model = %self.model.model_name(),
            "Requesting investment summary"
        );

        let model = self.model;
        let request = &request;
        Ok(self.retry.run(move || model.complete(request)).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::MockChatModel;
    use crate::table::{merge, Row, Table};

    fn enriched_table(rows: usize) -> WorkingTable {
        let rows = (0..rows)
            .map(|i| {
                let ytd = i as f64 / 2.0;
                Row {
                    symbol: format!("SYM{}", i),
                    name: format!("Company {}", i),
                    ytd,
                    cells: vec![
                        format!("SYM{}", i),
                        format!("Company {}", i),
                        "x".into(),
                        format!("{:.1}", ytd),
                    ],
                    sector: Some(SectorLabel::ALL[i % 10]),
                }
            })
            .collect();

        WorkingTable::new(
            vec!["symbol".into(), "name".into(), "city".into(), "ytd".into()],
            "name".into(),
            rows,
        )
    }

    #[test]
    fn test_prompt_caps_rows() {
        let prompt = summary_prompt(&enriched_table(200), SUMMARY_ROW_LIMIT).unwrap();

        let data_rows = prompt.lines().filter(|l| l.starts_with("SYM")).count();
        assert_eq!(data_rows, 101);
        assert!(prompt.contains("SYM100,"));
        assert!(!prompt.contains("SYM101,"));
    }

    #[test]
    fn test_table_has_four_columns() {
        let rendered = render_summary_table(&enriched_table(2), SUMMARY_ROW_LIMIT).unwrap();
        let lines: Vec<&str> = rendered.lines().collect();

        assert_eq!(lines[0], "symbol,name,ytd,Sector");
        assert_eq!(lines[1], "SYM0,Company 0,0.0,Technology");
        assert_eq!(lines[2], "SYM1,Company 1,0.5,Consumer Cyclical");
        assert!(!rendered.contains("city"));
    }

    #[test]
    fn test_ytd_rendered_as_source_text() {
        let attributes = Table::from_reader("symbol,name\nAMGN,Amgen\n".as_bytes()).unwrap();
        let prices = Table::from_reader("symbol,ytd\nAMGN,-3.0\n".as_bytes()).unwrap();
        let merged = merge(&attributes, &prices).unwrap();

        let rendered = render_summary_table(&merged, SUMMARY_ROW_LIMIT).unwrap();
        assert_eq!(rendered.lines().nth(1), Some("AMGN,Amgen,-3.0,"));
    }

    #[test]
    fn test_prompt_header_names_columns() {
        let prompt = summary_prompt(&enriched_table(1), SUMMARY_ROW_LIMIT).unwrap();
        assert!(prompt.starts_with("Here is a CSV table with columns symbol,name,ytd,Sector:\n\n"));
    }

    #[test]
    fn test_system_prompt_instructions() {
        let system = summary_system_prompt("semiconductor companies");
        assert!(system.contains("summarize YTD performance for semiconductor companies"));
        assert!(system.contains("two best sectors"));
        assert!(system.contains("two or more companies per sector"));
    }

    #[tokio::test]
    async fn test_summary_returned_verbatim() {
        let model = MockChatModel::replying("Tech led; favour Technology and Healthcare.");
        let table = enriched_table(3);

        let summary = SummaryGenerator::new(&model, RetryPolicy::immediate(5))
            .with_universe("test companies")
            .summarize(&table)
            .await
            .unwrap();

        assert_eq!(summary, "Tech led; favour Technology and Healthcare.");
        let request = &model.requests()[0];
        assert!(request.system.contains("test companies"));
        assert!(request.user.contains("SYM2,Company 2,1.0,Industrials"));
    }
}
