//! Putting the pieces together
//!
//! Metadata is looked up once over all pages, the table body comes from one
//! [`TableStrategy`], and every page also gets a projection grid.

use crate::config::ExtractionConfig;
use crate::fragment::{Page, TextFragment};
use crate::header::DynamicHeader;
use crate::labels::{extract_metadata, MetadataField, SIRF_FIELDS};
use crate::projection::{project_page, PageGrid};
use crate::schema::{ColumnDefinition, FixedSchema};
use crate::tables::{Row, TableStrategy};
use crate::SirfError;
use indexmap::IndexMap;
use serde::Serialize;

/// Everything recovered from one document
#[derive(Debug, Clone, Default, Serialize)]
pub struct ExtractionResult {
    /// Field name -> value, in field order; missing values are empty strings
    pub metadata: IndexMap<String, String>,
    pub rows: Vec<Row>,
    /// Column names of `rows`, in x order
    pub headers: Vec<String>,
    /// Label-free grid of every non-empty page
    pub page_grids: Vec<PageGrid>,
}

impl ExtractionResult {
    /// Whether a table body was recognised
    pub fn has_table(&self) -> bool {
        !self.headers.is_empty()
    }
}

/// Extract a SIRF document.
///
/// Uses the fixed schema when `schema` is given, header detection otherwise.
pub fn extract(
    pages: &[Page],
    schema: Option<&[ColumnDefinition]>,
    config: &ExtractionConfig,
) -> Result<ExtractionResult, SirfError> {
    match schema {
        Some(columns) => {
            let strategy = FixedSchema::new(columns.to_vec());
            extract_with(pages, &strategy, &SIRF_FIELDS, config)
        }
        None => extract_with(pages, &DynamicHeader, &SIRF_FIELDS, config),
    }
}

/// Extract with an explicit table strategy and metadata field set
pub fn extract_with(
    pages: &[Page],
    strategy: &dyn TableStrategy,
    fields: &[MetadataField],
    config: &ExtractionConfig,
) -> Result<ExtractionResult, SirfError> {
    for frag in pages.iter().flat_map(|p| &p.fragments) {
        frag.validate()?;
    }

    let fragment_count: usize = pages.iter().map(|p| p.fragments.len()).sum();
    log::info!(
        "extracting {} page(s), {} fragment(s) with {} strategy",
        pages.len(),
        fragment_count,
        strategy.name()
    );

    let pooled: Vec<&TextFragment> = pages.iter().flat_map(|p| &p.fragments).collect();
    let metadata = extract_metadata(&pooled, fields, config);

    let table = strategy.extract(pages, config);

    let page_grids = pages
        .iter()
        .enumerate()
        .filter_map(|(idx, page)| project_page(page, idx, config))
        .collect();

    Ok(ExtractionResult {
        metadata,
        rows: table.rows,
        headers: table.headers,
        page_grids,
    })
}
