//! Table body extraction shared by the column strategies
//!
//! A [`TableStrategy`] only decides where the columns are (a
//! [`TableLayout`]). Row clustering, cell assignment and row filtering are
//! the same for every strategy and live here.

use crate::config::ExtractionConfig;
use crate::fragment::{Page, TextFragment};
use crate::rows::cluster_rows;
use indexmap::IndexMap;

/// One table row: column name -> accumulated cell text
pub type Row = IndexMap<String, String>;

/// A named column anchored at the x of its header fragment
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnAnchor {
    pub name: String,
    pub x: f32,
}

/// What happens to a fragment that falls in no column interval
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unassigned {
    Drop,
    /// Assign to the column whose anchor is closest
    Nearest,
}

/// Which rows survive
#[derive(Debug, Clone, PartialEq)]
pub enum RowFilter {
    /// At least one cell has non-blank text
    AnyCell,
    /// At least one of the named columns has non-blank text
    Anchors(Vec<String>),
}

/// Resolved column geometry for one document
#[derive(Debug, Clone)]
pub struct TableLayout {
    /// Columns sorted by x ascending; frozen once built
    columns: Vec<ColumnAnchor>,
    /// y of the header row on the first page, if known
    pub header_y: Option<f32>,
    pub unassigned: Unassigned,
    pub keep: RowFilter,
}

/// A table body with its column names
#[derive(Debug, Clone, Default)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<Row>,
}

/// A way of finding the columns of a document's table
pub trait TableStrategy {
    /// Short name for logging
    fn name(&self) -> &'static str;

    /// Resolve the column layout, or `None` when no table is recognised
    fn detect(&self, pages: &[Page], config: &ExtractionConfig) -> Option<TableLayout>;

    /// Detect the layout and pull every page's rows through it
    fn extract(&self, pages: &[Page], config: &ExtractionConfig) -> Table {
        match self.detect(pages, config) {
            Some(layout) => {
                let table = layout.extract(pages, config);
                log::info!(
                    "{} strategy: {} columns, {} rows",
                    self.name(),
                    table.headers.len(),
                    table.rows.len()
                );
                table
            }
            None => {
                log::info!("{} strategy found no table", self.name());
                Table::default()
            }
        }
    }
}

impl TableLayout {
    pub fn new(
        mut columns: Vec<ColumnAnchor>,
        header_y: Option<f32>,
        unassigned: Unassigned,
        keep: RowFilter,
    ) -> Self {
        columns.sort_by(|a, b| a.x.partial_cmp(&b.x).unwrap_or(std::cmp::Ordering::Equal));

        // Repeated names become "Qty", "Qty (2)", ... so every column keeps its own cells
        let mut seen: IndexMap<String, usize> = IndexMap::new();
        for col in &mut columns {
            let count = seen.entry(col.name.clone()).or_insert(0);
            *count += 1;
            if *count > 1 {
                col.name = format!("{} ({})", col.name, count);
            }
        }

        Self {
            columns,
            header_y,
            unassigned,
            keep,
        }
    }

    pub fn columns(&self) -> &[ColumnAnchor] {
        &self.columns
    }

    /// Column names in x order
    pub fn headers(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }

    /// Index of the column whose interval `[x_i - margin, x_{i+1} - margin)` holds `x`
    pub fn column_for(&self, x: f32, config: &ExtractionConfig) -> Option<usize> {
        let hit = self.columns.iter().enumerate().position(|(i, col)| {
            let start = col.x - config.column_margin;
            let end = self
                .columns
                .get(i + 1)
                .map(|next| next.x - config.column_margin)
                .unwrap_or(config.column_sentinel);
            x >= start && x < end
        });

        match (hit, self.unassigned) {
            (Some(idx), _) => Some(idx),
            (None, Unassigned::Drop) => None,
            (None, Unassigned::Nearest) => self
                .columns
                .iter()
                .enumerate()
                .min_by(|(_, a), (_, b)| {
                    (x - a.x)
                        .abs()
                        .partial_cmp(&(x - b.x).abs())
                        .unwrap_or(std::cmp::Ordering::Equal)
                })
                .map(|(idx, _)| idx),
        }
    }

    /// Data rows start below the header on pages that repeat it, else at the top
    fn start_y(&self, page: &Page, config: &ExtractionConfig) -> f32 {
        match self.header_y {
            Some(header_y)
                if page
                    .fragments
                    .iter()
                    .any(|f| (f.y - header_y).abs() < config.header_proximity) =>
            {
                header_y + config.header_skip
            }
            _ => 0.0,
        }
    }

    /// Build one row from the fragments of a visual line
    pub fn assign_row(&self, fragments: &[&TextFragment], config: &ExtractionConfig) -> Row {
        let mut row: Row = self
            .columns
            .iter()
            .map(|c| (c.name.clone(), String::new()))
            .collect();

        for frag in fragments {
            let Some(idx) = self.column_for(frag.x, config) else {
                log::debug!("dropping {:?} at x={:.2}: outside every column", frag.text, frag.x);
                continue;
            };
            let cell = row.entry(self.columns[idx].name.clone()).or_default();
            if !cell.is_empty() {
                cell.push(' ');
            }
            cell.push_str(&frag.text);
        }

        row
    }

    fn keeps(&self, row: &Row) -> bool {
        match &self.keep {
            RowFilter::AnyCell => row.values().any(|v| !v.trim().is_empty()),
            RowFilter::Anchors(names) => names.iter().any(|name| {
                row.get(name)
                    .map(|v| !v.trim().is_empty())
                    .unwrap_or(false)
            }),
        }
    }

    /// Rows of every page, in page order then sweep order
    pub fn extract(&self, pages: &[Page], config: &ExtractionConfig) -> Table {
        let mut rows = Vec::new();

        for (page_idx, page) in pages.iter().enumerate() {
            let start_y = self.start_y(page, config);
            let groups = cluster_rows(
                page.fragments.iter().filter(|f| f.y > start_y),
                config.row_threshold,
            );
            let before = rows.len();

            for group in &groups {
                let row = self.assign_row(&group.fragments, config);
                if self.keeps(&row) {
                    rows.push(row);
                }
            }

            log::debug!(
                "page {}: start_y={:.2}, {} line(s), {} row(s) kept",
                page_idx + 1,
                start_y,
                groups.len(),
                rows.len() - before
            );
        }

        Table {
            headers: self.headers(),
            rows,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_fragment(text: &str, x: f32, y: f32) -> TextFragment {
        TextFragment::new(x, y, text.len() as f32 * 0.4, text)
    }

    fn layout(unassigned: Unassigned, keep: RowFilter) -> TableLayout {
        TableLayout::new(
            vec![
                ColumnAnchor {
                    name: "Qty".into(),
                    x: 30.0,
                },
                ColumnAnchor {
                    name: "Code".into(),
                    x: 5.0,
                },
                ColumnAnchor {
                    name: "Description".into(),
                    x: 12.0,
                },
            ],
            Some(10.0),
            unassigned,
            keep,
        )
    }

    #[test]
    fn test_columns_sorted_by_x() {
        let l = layout(Unassigned::Drop, RowFilter::AnyCell);
        assert_eq!(l.headers(), vec!["Code", "Description", "Qty"]);
    }

    #[test]
    fn test_repeated_names_get_suffix() {
        let config = ExtractionConfig::default();
        let l = TableLayout::new(
            vec![
                ColumnAnchor {
                    name: "Qty".into(),
                    x: 30.0,
                },
                ColumnAnchor {
                    name: "Code".into(),
                    x: 5.0,
                },
                ColumnAnchor {
                    name: "Qty".into(),
                    x: 20.0,
                },
            ],
            Some(10.0),
            Unassigned::Nearest,
            RowFilter::AnyCell,
        );
        assert_eq!(l.headers(), vec!["Code", "Qty", "Qty (2)"]);

        let frags = [make_fragment("5", 20.0, 12.0), make_fragment("7", 30.0, 12.0)];
        let refs: Vec<&TextFragment> = frags.iter().collect();
        let row = l.assign_row(&refs, &config);
        assert_eq!(row["Qty"], "5");
        assert_eq!(row["Qty (2)"], "7");
    }

    #[test]
    fn test_interval_assignment() {
        let config = ExtractionConfig::default();
        let l = layout(Unassigned::Drop, RowFilter::AnyCell);
        assert_eq!(l.column_for(3.0, &config), Some(0));
        assert_eq!(l.column_for(9.9, &config), Some(0));
        assert_eq!(l.column_for(10.0, &config), Some(1));
        assert_eq!(l.column_for(28.0, &config), Some(2));
        assert_eq!(l.column_for(999.0, &config), Some(2));
    }

    #[test]
    fn test_strict_drops_and_nearest_keeps() {
        let config = ExtractionConfig::default();
        let strict = layout(Unassigned::Drop, RowFilter::AnyCell);
        let nearest = layout(Unassigned::Nearest, RowFilter::AnyCell);
        // Beyond the last column's right edge
        assert_eq!(strict.column_for(1200.0, &config), None);
        assert_eq!(nearest.column_for(1200.0, &config), Some(2));
        // Left of the first column
        assert_eq!(strict.column_for(1.0, &config), None);
        assert_eq!(nearest.column_for(1.0, &config), Some(0));
    }

    #[test]
    fn test_same_cell_joined_with_space() {
        let config = ExtractionConfig::default();
        let l = layout(Unassigned::Drop, RowFilter::AnyCell);
        let frags = vec![
            make_fragment("Copper", 12.0, 20.0),
            make_fragment("A-1", 5.0, 20.0),
            make_fragment("cable", 16.0, 20.1),
        ];
        let refs: Vec<&TextFragment> = frags.iter().collect();
        let row = l.assign_row(&refs, &config);
        assert_eq!(row["Description"], "Copper cable");
        assert_eq!(row["Code"], "A-1");
        assert_eq!(row["Qty"], "");
    }

    #[test]
    fn test_anchor_filter_and_header_skip() {
        let config = ExtractionConfig::default();
        let l = layout(
            Unassigned::Drop,
            RowFilter::Anchors(vec!["Code".into(), "Description".into()]),
        );
        let page = Page::new(vec![
            make_fragment("Code", 5.0, 10.0),
            make_fragment("Description", 12.0, 10.0),
            make_fragment("Qty", 30.0, 10.0),
            make_fragment("A-1", 5.0, 13.0),
            make_fragment("Bolt", 12.0, 13.0),
            make_fragment("4", 30.0, 13.0),
            // Qty only: no anchor cell
            make_fragment("9", 30.0, 15.0),
        ]);
        let table = l.extract(&[page], &config);
        assert_eq!(table.rows.len(), 1);
        assert_eq!(table.rows[0]["Description"], "Bolt");
        assert_eq!(table.rows[0]["Qty"], "4");
    }

    #[test]
    fn test_page_without_header_starts_at_top() {
        let config = ExtractionConfig::default();
        let l = layout(Unassigned::Nearest, RowFilter::AnyCell);
        let page = Page::new(vec![make_fragment("B-2", 5.0, 3.0)]);
        let table = l.extract(&[page], &config);
        assert_eq!(table.rows.len(), 1);
        assert_eq!(table.rows[0]["Code"], "B-2");
    }
}
