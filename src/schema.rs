//! Fixed-schema column mapping
//!
//! A known form prints a known set of column headers. Each column is
//! anchored at the x of the first first-page fragment matching its label;
//! fragments outside every column interval are dropped.

use crate::config::ExtractionConfig;
use crate::fragment::Page;
use crate::labels::LabelPattern;
use crate::tables::{ColumnAnchor, RowFilter, TableLayout, TableStrategy, Unassigned};

/// A named column and the header label that anchors it
#[derive(Debug, Clone)]
pub struct ColumnDefinition {
    pub id: String,
    pub pattern: LabelPattern,
    /// Missing optional columns are not worth a warning
    pub optional: bool,
    /// The header of this column marks where the table starts
    pub table_start: bool,
    /// Rows with this column blank are discarded (unless another anchor is filled)
    pub row_anchor: bool,
}

impl ColumnDefinition {
    pub fn new(id: &str, pattern: LabelPattern) -> Self {
        Self {
            id: id.to_string(),
            pattern,
            optional: false,
            table_start: false,
            row_anchor: false,
        }
    }

    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    pub fn table_start(mut self) -> Self {
        self.table_start = true;
        self
    }

    pub fn row_anchor(mut self) -> Self {
        self.row_anchor = true;
        self
    }
}

fn column(id: &str, pattern: &str) -> ColumnDefinition {
    // Patterns below are literals
    ColumnDefinition::new(id, LabelPattern::new(pattern).unwrap())
}

/// Column template of the Stock Issue Request Form item table
pub fn sirf_columns() -> Vec<ColumnDefinition> {
    vec![
        column("S.No", r"S\.?\s*No").optional(),
        column("Item Code", r"Item\s*Code|Material\s*Code")
            .table_start()
            .row_anchor(),
        column("Description", r"Description").row_anchor(),
        column("UOM", r"\bUOM\b|\bUnit\b").optional(),
        column("Qty Requested", r"Qty\.?\s*Req|Requested\s*Qty|Quantity"),
        column("Qty Issued", r"Qty\.?\s*Issued|Issued\s*Qty").optional(),
        column("Remarks", r"Remarks").optional(),
    ]
}

/// Table strategy driven by a predefined column template
#[derive(Debug, Clone)]
pub struct FixedSchema {
    columns: Vec<ColumnDefinition>,
}

impl FixedSchema {
    pub fn new(columns: Vec<ColumnDefinition>) -> Self {
        Self { columns }
    }

    pub fn sirf() -> Self {
        Self::new(sirf_columns())
    }

    pub fn columns(&self) -> &[ColumnDefinition] {
        &self.columns
    }
}

impl TableStrategy for FixedSchema {
    fn name(&self) -> &'static str {
        "fixed-schema"
    }

    fn detect(&self, pages: &[Page], config: &ExtractionConfig) -> Option<TableLayout> {
        let first_page = pages.first()?;

        // Anchor state is per call; the template itself is never touched
        let mut anchors: Vec<Option<(f32, f32)>> = vec![None; self.columns.len()];
        let mut header_y = None;

        for frag in &first_page.fragments {
            let hit = self
                .columns
                .iter()
                .enumerate()
                .find(|(i, def)| anchors[*i].is_none() && def.pattern.is_match(&frag.text));
            if let Some((idx, def)) = hit {
                anchors[idx] = Some((frag.x, frag.y));
                if def.table_start {
                    header_y = Some(frag.y);
                }
            }
        }

        for (def, anchor) in self.columns.iter().zip(&anchors) {
            if anchor.is_none() && !def.optional {
                log::warn!(
                    "required column {:?} (/{}/) not found on the first page",
                    def.id,
                    def.pattern.as_str()
                );
            }
        }

        let resolved: Vec<(&ColumnDefinition, f32, f32)> = self
            .columns
            .iter()
            .zip(&anchors)
            .filter_map(|(def, anchor)| anchor.map(|(x, y)| (def, x, y)))
            .collect();

        if resolved.len() < config.min_fixed_columns {
            log::warn!(
                "only {} of {} schema columns found (need {})",
                resolved.len(),
                self.columns.len(),
                config.min_fixed_columns
            );
            return None;
        }

        let header_y = header_y.or_else(|| {
            resolved
                .iter()
                .map(|(_, _, y)| *y)
                .min_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal))
        });

        let anchor_ids: Vec<String> = resolved
            .iter()
            .filter(|(def, _, _)| def.row_anchor)
            .map(|(def, _, _)| def.id.clone())
            .collect();
        let keep = if anchor_ids.is_empty() {
            RowFilter::AnyCell
        } else {
            RowFilter::Anchors(anchor_ids)
        };

        let columns = resolved
            .iter()
            .map(|(def, x, _)| ColumnAnchor {
                name: def.id.clone(),
                x: *x,
            })
            .collect();

        Some(TableLayout::new(columns, header_y, Unassigned::Drop, keep))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fragment::TextFragment;

    fn make_fragment(text: &str, x: f32, y: f32) -> TextFragment {
        TextFragment::new(x, y, text.len() as f32 * 0.4, text)
    }

    fn sirf_page() -> Page {
        Page::new(vec![
            make_fragment("Request Date", 2.0, 4.0),
            make_fragment("S.No", 2.0, 10.0),
            make_fragment("Item Code", 5.0, 10.0),
            make_fragment("Description", 12.0, 10.0),
            make_fragment("UOM", 28.0, 10.0),
            make_fragment("Qty Requested", 33.0, 10.0),
            make_fragment("1", 2.5, 12.5),
            make_fragment("CBL-01", 5.0, 12.5),
            make_fragment("Copper cable", 12.0, 12.5),
            make_fragment("m", 28.0, 12.5),
            make_fragment("40", 33.0, 12.5),
            make_fragment("2", 2.5, 13.5),
            make_fragment("Lugs 16mm", 12.0, 13.5),
            make_fragment("20", 33.0, 13.5),
            make_fragment("Signature", 40.0, 20.0),
        ])
    }

    #[test]
    fn test_sirf_layout_resolved() {
        let config = ExtractionConfig::default();
        let layout = FixedSchema::sirf().detect(&[sirf_page()], &config).unwrap();
        assert_eq!(
            layout.headers(),
            vec!["S.No", "Item Code", "Description", "UOM", "Qty Requested"]
        );
        assert_eq!(layout.header_y, Some(10.0));
        assert_eq!(layout.unassigned, Unassigned::Drop);
    }

    #[test]
    fn test_sirf_rows() {
        let config = ExtractionConfig::default();
        let table = FixedSchema::sirf().extract(&[sirf_page()], &config);
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[0]["Item Code"], "CBL-01");
        assert_eq!(table.rows[0]["Description"], "Copper cable");
        assert_eq!(table.rows[1]["Item Code"], "");
        assert_eq!(table.rows[1]["Description"], "Lugs 16mm");
        assert_eq!(table.rows[1]["Qty Requested"], "20");
    }

    #[test]
    fn test_row_without_anchor_dropped() {
        let config = ExtractionConfig::default();
        let mut page = sirf_page();
        page.fragments.push(make_fragment("Total", 33.0, 16.0));
        let table = FixedSchema::sirf().extract(&[page], &config);
        assert!(table.rows.iter().all(|r| r["Qty Requested"] != "Total"));
    }

    #[test]
    fn test_too_few_columns_gives_empty_table() {
        let config = ExtractionConfig::default();
        let page = Page::new(vec![
            make_fragment("Item Code", 5.0, 10.0),
            make_fragment("Description", 12.0, 10.0),
            make_fragment("CBL-01", 5.0, 12.0),
        ]);
        let schema = FixedSchema::sirf();
        assert!(schema.detect(&[page.clone()], &config).is_none());
        let table = schema.extract(&[page], &config);
        assert!(table.headers.is_empty());
        assert!(table.rows.is_empty());
    }

    #[test]
    fn test_anchor_x_frozen_across_pages() {
        let config = ExtractionConfig::default();
        let second = Page::new(vec![
            // A repeated header further right must not move the columns
            make_fragment("Item Code", 9.0, 3.0),
            make_fragment("CBL-02", 5.0, 6.0),
            make_fragment("Conduit", 12.0, 6.0),
        ]);
        let schema = FixedSchema::sirf();
        let pages = vec![sirf_page(), second];
        let layout = schema.detect(&pages, &config).unwrap();
        let code_x = layout.columns().iter().find(|c| c.name == "Item Code").unwrap().x;
        assert_eq!(code_x, 5.0);

        let table = schema.extract(&pages, &config);
        let last = table.rows.last().unwrap();
        assert_eq!(last["Item Code"], "CBL-02");
        assert_eq!(last["Description"], "Conduit");
    }

    #[test]
    fn test_fragment_beyond_last_column_dropped() {
        let config = ExtractionConfig::default();
        let mut page = sirf_page();
        page.fragments.push(make_fragment("stray", 1500.0, 12.5));
        let table = FixedSchema::sirf().extract(&[page], &config);
        assert!(table.rows[0].values().all(|v| !v.contains("stray")));
    }

    #[test]
    fn test_template_reusable() {
        let config = ExtractionConfig::default();
        let schema = FixedSchema::sirf();
        let before: Vec<(String, String)> = schema
            .columns()
            .iter()
            .map(|c| (c.id.clone(), c.pattern.as_str().to_string()))
            .collect();

        let first = schema.detect(&[sirf_page()], &config).unwrap();
        let empty = schema.detect(&[Page::default()], &config);
        let again = schema.detect(&[sirf_page()], &config).unwrap();
        assert!(empty.is_none());
        assert_eq!(first.columns(), again.columns());

        let after: Vec<(String, String)> = schema
            .columns()
            .iter()
            .map(|c| (c.id.clone(), c.pattern.as_str().to_string()))
            .collect();
        assert_eq!(before.len(), 7);
        assert_eq!(before, after);
    }
}
