//! Spreadsheet layout of extraction results
//!
//! Sheets are plain rows of strings plus column widths (in characters);
//! styling is left to whatever writes the workbook. [`write_csv`] covers
//! the common case of one CSV file per sheet.

use crate::assembler::ExtractionResult;
use crate::projection::PageGrid;
use crate::SirfError;
use std::io::Write;

/// Title of the main sheet's first row
pub const SIRF_TITLE: &str = "Stock Issue Request Form (SIRF)";

/// Placeholder written when no table headers were found
pub const NO_TABLE_MESSAGE: &str = "No table detected - please check PDF structure";

const MIN_TABLE_WIDTH: usize = 8;
const MAX_WIDTH: usize = 50;
const GRID_DEFAULT_WIDTH: usize = 10;
const GRID_SAMPLE_ROWS: usize = 50;

/// A named grid of cells
#[derive(Debug, Clone, PartialEq)]
pub struct Sheet {
    pub name: String,
    pub rows: Vec<Vec<String>>,
    /// Character widths per column; empty means "writer default"
    pub col_widths: Vec<usize>,
}

fn cells(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

fn meta<'a>(result: &'a ExtractionResult, key: &str) -> &'a str {
    result.metadata.get(key).map(String::as_str).unwrap_or("")
}

/// Main sheet: title, header block, spacer, then the item table
pub fn sirf_sheet(result: &ExtractionResult) -> Sheet {
    let mut rows = vec![
        cells(&[SIRF_TITLE]),
        cells(&[
            "Request Date",
            meta(result, "Request Date"),
            "",
            "Need by Date",
            meta(result, "Need by Date"),
            "",
            "Req. No.",
            meta(result, "Req. No"),
        ]),
        cells(&[
            "Project Code",
            meta(result, "Project Code"),
            "",
            "Project Name:",
            meta(result, "Project Name"),
        ]),
        cells(&[
            "Site ID",
            meta(result, "Site ID"),
            "",
            "Site Name:",
            meta(result, "Site Name"),
        ]),
        cells(&[
            "Requesting Dept.",
            meta(result, "Requesting Dept"),
            "",
            "REG:",
            meta(result, "REG"),
            "",
            "Project Mgr.",
            meta(result, "Project Mgr"),
        ]),
        Vec::new(),
        Vec::new(),
    ];

    if !result.has_table() {
        rows.push(cells(&[NO_TABLE_MESSAGE]));
        return Sheet {
            name: "SIRF".to_string(),
            rows,
            col_widths: Vec::new(),
        };
    }

    rows.push(result.headers.clone());
    for row in &result.rows {
        rows.push(
            result
                .headers
                .iter()
                .map(|h| row.get(h).cloned().unwrap_or_default())
                .collect(),
        );
    }

    let col_widths = result
        .headers
        .iter()
        .map(|h| {
            let longest = result
                .rows
                .iter()
                .filter_map(|r| r.get(h))
                .map(|v| v.chars().count())
                .fold(h.chars().count(), usize::max);
            (longest + 2).clamp(MIN_TABLE_WIDTH, MAX_WIDTH)
        })
        .collect();

    Sheet {
        name: "SIRF".to_string(),
        rows,
        col_widths,
    }
}

/// Auxiliary sheet for one page's projection grid
pub fn grid_sheet(grid: &PageGrid) -> Sheet {
    let columns = grid.cells.first().map(Vec::len).unwrap_or(0);
    let mut col_widths = vec![GRID_DEFAULT_WIDTH; columns];

    for row in grid.cells.iter().take(GRID_SAMPLE_ROWS) {
        for (width, cell) in col_widths.iter_mut().zip(row) {
            let len = cell.chars().count();
            if len > *width {
                *width = (len + 2).min(MAX_WIDTH);
            }
        }
    }

    Sheet {
        name: grid.name.clone(),
        rows: grid.cells.clone(),
        col_widths,
    }
}

/// Main sheet followed by one sheet per page grid
pub fn workbook(result: &ExtractionResult) -> Vec<Sheet> {
    std::iter::once(sirf_sheet(result))
        .chain(result.page_grids.iter().map(grid_sheet))
        .collect()
}

/// Write a sheet as CSV; ragged rows are padded to the widest row
pub fn write_csv<W: Write>(sheet: &Sheet, writer: W) -> Result<(), SirfError> {
    let width = sheet.rows.iter().map(Vec::len).max().unwrap_or(0);
    let mut csv = csv::WriterBuilder::new().flexible(false).from_writer(writer);

    for row in &sheet.rows {
        let padded = row
            .iter()
            .map(String::as_str)
            .chain(std::iter::repeat("").take(width - row.len()));
        csv.write_record(padded)?;
    }

    csv.flush()?;
    Ok(())
}
