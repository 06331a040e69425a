//! Dynamic header detection
//!
//! For forms without a known template: the first first-page row that has
//! enough fragments and mentions enough header keywords becomes the header.
//! Every fragment of that row becomes a column.

use crate::config::ExtractionConfig;
use crate::fragment::{Page, TextFragment};
use crate::rows::{bucket_rows, RowGroup};
use crate::tables::{ColumnAnchor, RowFilter, TableLayout, TableStrategy, Unassigned};

/// Table strategy that discovers header labels heuristically
#[derive(Debug, Clone, Copy, Default)]
pub struct DynamicHeader;

/// Number of configured keywords contained in the lower-cased row text
pub fn keyword_hits(row_text: &str, keywords: &[String]) -> usize {
    let lowered = row_text.to_lowercase();
    keywords
        .iter()
        .filter(|kw| lowered.contains(kw.as_str()))
        .count()
}

/// Find the header row among the first page's rows.
///
/// Returns the row's bucketed y and its fragments sorted by x.
pub fn find_header_row<'a>(
    fragments: &'a [TextFragment],
    config: &ExtractionConfig,
) -> Option<(f32, Vec<&'a TextFragment>)> {
    for RowGroup { y, mut fragments } in bucket_rows(fragments, config.bucket_resolution) {
        if fragments.len() < config.min_header_fragments {
            continue;
        }
        fragments.sort_by(|a, b| a.x.partial_cmp(&b.x).unwrap_or(std::cmp::Ordering::Equal));

        let row_text = fragments
            .iter()
            .map(|f| f.text.as_str())
            .collect::<Vec<_>>()
            .join(" ");
        let hits = keyword_hits(&row_text, &config.header_keywords);
        log::debug!("row y={:.1}: {} keyword hit(s) in {:?}", y, hits, row_text);

        if hits >= config.min_header_keywords {
            return Some((y, fragments));
        }
    }
    None
}

impl TableStrategy for DynamicHeader {
    fn name(&self) -> &'static str {
        "dynamic-header"
    }

    fn detect(&self, pages: &[Page], config: &ExtractionConfig) -> Option<TableLayout> {
        let first_page = pages.first()?;
        let Some((header_y, header)) = find_header_row(&first_page.fragments, config) else {
            log::warn!("no header row found on the first page");
            return None;
        };

        let columns = header
            .iter()
            .map(|f| ColumnAnchor {
                name: f.text.clone(),
                x: f.x,
            })
            .collect();

        Some(TableLayout::new(
            columns,
            Some(header_y),
            Unassigned::Nearest,
            RowFilter::AnyCell,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_fragment(text: &str, x: f32, y: f32) -> TextFragment {
        TextFragment::new(x, y, text.len() as f32 * 0.4, text)
    }

    #[test]
    fn test_keyword_hits() {
        let keywords = ExtractionConfig::default().header_keywords;
        assert_eq!(keyword_hits("Code Description Qty", &keywords), 3);
        // Substrings count: "Item Number" hits item and number
        assert_eq!(keyword_hits("ITEM NUMBER", &keywords), 2);
        assert_eq!(keyword_hits("Signature Date", &keywords), 0);
    }

    #[test]
    fn test_header_row_creates_columns() {
        let config = ExtractionConfig::default();
        let page = Page::new(vec![
            make_fragment("Qty", 30.0, 8.0),
            make_fragment("Code", 5.0, 8.0),
            make_fragment("Description", 12.0, 8.1),
        ]);
        let layout = DynamicHeader.detect(&[page], &config).unwrap();
        assert_eq!(layout.headers(), vec!["Code", "Description", "Qty"]);
        let xs: Vec<f32> = layout.columns().iter().map(|c| c.x).collect();
        assert_eq!(xs, vec![5.0, 12.0, 30.0]);
        assert_eq!(layout.header_y, Some(8.0));
    }

    #[test]
    fn test_repeated_header_text_keeps_columns_apart() {
        let config = ExtractionConfig::default();
        let page = Page::new(vec![
            make_fragment("Code", 5.0, 8.0),
            make_fragment("Qty", 20.0, 8.0),
            make_fragment("Qty", 30.0, 8.0),
            make_fragment("A-1", 5.0, 11.0),
            make_fragment("4", 20.0, 11.0),
            make_fragment("3", 30.0, 11.0),
        ]);
        let table = DynamicHeader.extract(&[page], &config);
        assert_eq!(table.headers, vec!["Code", "Qty", "Qty (2)"]);
        assert_eq!(table.rows.len(), 1);
        assert_eq!(table.rows[0]["Qty"], "4");
        assert_eq!(table.rows[0]["Qty (2)"], "3");
    }

    #[test]
    fn test_needs_three_fragments_and_two_keywords() {
        let config = ExtractionConfig::default();
        let two_fragments = Page::new(vec![
            make_fragment("Code", 5.0, 8.0),
            make_fragment("Description", 12.0, 8.0),
        ]);
        assert!(DynamicHeader.detect(&[two_fragments], &config).is_none());

        let one_keyword = Page::new(vec![
            make_fragment("Code", 5.0, 8.0),
            make_fragment("Signed", 12.0, 8.0),
            make_fragment("Approved", 20.0, 8.0),
        ]);
        assert!(DynamicHeader.detect(&[one_keyword], &config).is_none());
    }

    #[test]
    fn test_first_row_in_encounter_order_wins() {
        let config = ExtractionConfig::default();
        let page = Page::new(vec![
            make_fragment("Item", 5.0, 30.0),
            make_fragment("Name", 12.0, 30.0),
            make_fragment("Type", 20.0, 30.0),
            make_fragment("Code", 5.0, 8.0),
            make_fragment("Description", 12.0, 8.0),
            make_fragment("Qty", 20.0, 8.0),
        ]);
        let layout = DynamicHeader.detect(&[page], &config).unwrap();
        assert_eq!(layout.header_y, Some(30.0));
        assert_eq!(layout.headers(), vec!["Item", "Name", "Type"]);
    }

    #[test]
    fn test_rows_never_drop_fragments() {
        let config = ExtractionConfig::default();
        let page = Page::new(vec![
            make_fragment("Code", 5.0, 8.0),
            make_fragment("Description", 12.0, 8.0),
            make_fragment("Qty", 30.0, 8.0),
            make_fragment("A-1", 5.0, 11.0),
            make_fragment("Bolt", 12.0, 11.0),
            make_fragment("far", 1500.0, 11.0),
            make_fragment("left", 1.0, 12.0),
        ]);
        let table = DynamicHeader.extract(&[page], &config);
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[0]["Qty"], "far");
        assert_eq!(table.rows[1]["Code"], "left");
    }

    #[test]
    fn test_no_header_no_table() {
        let config = ExtractionConfig::default();
        let page = Page::new(vec![make_fragment("Just text", 5.0, 8.0)]);
        let table = DynamicHeader.extract(&[page], &config);
        assert!(table.headers.is_empty());
        assert!(table.rows.is_empty());
    }
}
