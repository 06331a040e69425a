//! Row grouping by vertical position
//!
//! Two groupings are used:
//! - a single sweep over y-sorted fragments, where a row stays open while
//!   fragments are within `threshold` of the fragment that opened it
//! - a coarser bucketing by rounded y, used to look for header rows

use crate::fragment::{sort_by_y, TextFragment};
use indexmap::IndexMap;

/// Fragments that share a visual line
#[derive(Debug, Clone)]
pub struct RowGroup<'a> {
    /// y of the fragment that opened the row
    pub y: f32,
    pub fragments: Vec<&'a TextFragment>,
}

impl RowGroup<'_> {
    /// Texts joined with single spaces, in row order
    pub fn text(&self) -> String {
        self.fragments
            .iter()
            .map(|f| f.text.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Sweep fragments that are already sorted by y into rows.
///
/// Order dependent: a fragment joins the open row when
/// `|y - row.y| <= threshold`, otherwise it opens a new row.
pub fn cluster_sorted<'a>(sorted: &[&'a TextFragment], threshold: f32) -> Vec<RowGroup<'a>> {
    let mut rows: Vec<RowGroup<'a>> = Vec::new();

    for &frag in sorted {
        match rows.last_mut() {
            Some(row) if (frag.y - row.y).abs() <= threshold => row.fragments.push(frag),
            _ => rows.push(RowGroup {
                y: frag.y,
                fragments: vec![frag],
            }),
        }
    }

    rows
}

/// Sort fragments by y and sweep them into rows
pub fn cluster_rows<'a, I>(fragments: I, threshold: f32) -> Vec<RowGroup<'a>>
where
    I: IntoIterator<Item = &'a TextFragment>,
{
    let mut sorted: Vec<&TextFragment> = fragments.into_iter().collect();
    sort_by_y(&mut sorted);
    cluster_sorted(&sorted, threshold)
}

/// Group fragments by y rounded to the nearest `resolution`.
///
/// Buckets come back in first-seen order; fragments inside a bucket keep
/// extractor order.
pub fn bucket_rows(fragments: &[TextFragment], resolution: f32) -> Vec<RowGroup<'_>> {
    let mut buckets: IndexMap<i64, Vec<&TextFragment>> = IndexMap::new();
    for frag in fragments {
        let key = (frag.y / resolution).round() as i64;
        buckets.entry(key).or_default().push(frag);
    }

    buckets
        .into_iter()
        .map(|(key, fragments)| RowGroup {
            y: key as f32 * resolution,
            fragments,
        })
        .collect()
}
