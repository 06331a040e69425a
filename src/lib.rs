//! Table reconstruction for Stock Issue Request Form PDFs
//!
//! This crate provides:
//! - Normalization of extractor output (pdf2json JSON, lopdf content streams)
//!   into positioned text fragments
//! - Label-anchored metadata lookup
//! - Fixed-schema and dynamic-header column mapping
//! - Projection-profile column segmentation as a label-free backup view
//! - Spreadsheet layout of the result

pub mod assembler;
pub mod config;
pub mod extractor;
pub mod fragment;
pub mod header;
pub mod labels;
pub mod pdf2json;
pub mod projection;
pub mod rows;
pub mod schema;
pub mod sheet;
pub mod tables;

pub use assembler::{extract, extract_with, ExtractionResult};
pub use config::{CandidateOrder, ExtractionConfig};
pub use fragment::{Page, RawFragment, TextFragment};
pub use header::DynamicHeader;
pub use labels::{find_value, LabelPattern, MetadataField, SearchMode, SIRF_FIELDS};
pub use projection::{ColumnSpan, PageGrid};
pub use schema::{sirf_columns, ColumnDefinition, FixedSchema};
pub use tables::{Row, TableStrategy};

use std::path::Path;

/// Kind of document a path holds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    /// A PDF, read with the lopdf extractor
    Pdf,
    /// pdf2json output
    Pdf2Json,
}

impl InputKind {
    /// `.json` files are pdf2json output; everything else is treated as PDF
    pub fn from_path<P: AsRef<Path>>(path: P) -> Self {
        let is_json = path
            .as_ref()
            .extension()
            .map(|ext| ext.eq_ignore_ascii_case("json"))
            .unwrap_or(false);
        if is_json {
            InputKind::Pdf2Json
        } else {
            InputKind::Pdf
        }
    }
}

/// Read the pages of a PDF or pdf2json file
pub fn load_pages<P: AsRef<Path>>(
    path: P,
    config: &ExtractionConfig,
) -> Result<Vec<Page>, SirfError> {
    match InputKind::from_path(&path) {
        InputKind::Pdf => extractor::extract_pages(path, config),
        InputKind::Pdf2Json => pdf2json::load_pdf2json(path, config.width_per_char),
    }
}

/// Load a document and extract it.
///
/// `schema` selects the fixed-schema strategy; `None` detects headers.
pub fn process_file<P: AsRef<Path>>(
    path: P,
    schema: Option<&[ColumnDefinition]>,
    config: &ExtractionConfig,
) -> Result<ExtractionResult, SirfError> {
    let pages = load_pages(&path, config)?;
    extract(&pages, schema, config)
}

/// Extract a PDF held in memory
pub fn process_pdf_mem(
    buffer: &[u8],
    schema: Option<&[ColumnDefinition]>,
    config: &ExtractionConfig,
) -> Result<ExtractionResult, SirfError> {
    let pages = extractor::extract_pages_mem(buffer, config)?;
    extract(&pages, schema, config)
}

#[derive(Debug, thiserror::Error)]
pub enum SirfError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("PDF parsing error: {0}")]
    Parse(String),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl From<lopdf::Error> for SirfError {
    fn from(e: lopdf::Error) -> Self {
        SirfError::Parse(e.to_string())
    }
}
