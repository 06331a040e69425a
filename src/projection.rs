//! Projection-profile column segmentation
//!
//! Label-free fallback: every fragment's horizontal span is projected onto
//! the x axis, and whitespace runs wider than the gap threshold split the
//! page into columns. Runs independently on every page.

use crate::config::ExtractionConfig;
use crate::fragment::{Page, TextFragment};
use crate::rows::cluster_rows;
use serde::Serialize;

/// A column interval in form units, `[start, end)`
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ColumnSpan {
    pub start: f32,
    pub end: f32,
}

impl ColumnSpan {
    /// Length of the intersection with `[start, end)`
    pub fn overlap(&self, start: f32, end: f32) -> f32 {
        (end.min(self.end) - start.max(self.start)).max(0.0)
    }
}

/// One page laid out on its projection columns
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageGrid {
    /// Sheet-style name, `Original Page N`
    pub name: String,
    pub columns: Vec<ColumnSpan>,
    /// One entry per visual row; `columns.len()` cells each (one cell when
    /// there are no columns)
    pub cells: Vec<Vec<String>>,
}

/// Column intervals separated by whitespace runs longer than the gap threshold.
///
/// The occupancy profile is held as sorted, merged sample runs; memory is
/// bounded by the fragment count, not by the page's x extent.
pub fn segment_columns(fragments: &[TextFragment], config: &ExtractionConfig) -> Vec<ColumnSpan> {
    let resolution = config.projection_resolution as f32;
    let gap_threshold = config.projection_gap_samples() as i64;

    let mut spans: Vec<(i64, i64)> = fragments
        .iter()
        .map(|f| {
            let start = (f.x * resolution).floor().max(0.0) as i64;
            let end = (f.right() * resolution).floor().max(0.0) as i64;
            (start, end)
        })
        .filter(|(start, end)| start < end)
        .collect();
    spans.sort_unstable();

    let mut columns: Vec<(i64, i64)> = Vec::new();
    for (start, end) in spans {
        match columns.last_mut() {
            Some(col) if start - col.1 <= gap_threshold => col.1 = col.1.max(end),
            _ => columns.push((start, end)),
        }
    }

    columns
        .into_iter()
        .map(|(start, end)| ColumnSpan {
            start: start as f32 / resolution,
            end: end as f32 / resolution,
        })
        .collect()
}

/// Column with the largest overlap, else the one starting closest to `frag.x`
fn best_column(columns: &[ColumnSpan], frag: &TextFragment) -> Option<usize> {
    let mut best = None;
    let mut max_overlap = 0.0f32;
    for (idx, col) in columns.iter().enumerate() {
        let overlap = col.overlap(frag.x, frag.right());
        if overlap > max_overlap {
            max_overlap = overlap;
            best = Some(idx);
        }
    }

    best.or_else(|| {
        columns
            .iter()
            .enumerate()
            .min_by(|(_, a), (_, b)| {
                (a.start - frag.x)
                    .abs()
                    .partial_cmp(&(b.start - frag.x).abs())
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
            .map(|(idx, _)| idx)
    })
}

/// Lay one page out on its own projection columns; `None` for an empty page
pub fn project_page(page: &Page, page_index: usize, config: &ExtractionConfig) -> Option<PageGrid> {
    if page.is_empty() {
        return None;
    }

    let columns = segment_columns(&page.fragments, config);
    let rows = cluster_rows(&page.fragments, config.row_threshold);

    let cells: Vec<Vec<String>> = rows
        .iter()
        .map(|row| {
            if columns.is_empty() {
                return vec![row.text()];
            }
            let mut cells = vec![String::new(); columns.len()];
            for frag in &row.fragments {
                if let Some(idx) = best_column(&columns, frag) {
                    let cell = &mut cells[idx];
                    if !cell.is_empty() {
                        cell.push(' ');
                    }
                    cell.push_str(&frag.text);
                }
            }
            cells
        })
        .collect();

    log::debug!(
        "page {}: {} projection column(s), {} row(s)",
        page_index + 1,
        columns.len(),
        cells.len()
    );

    Some(PageGrid {
        name: format!("Original Page {}", page_index + 1),
        columns,
        cells,
    })
}
