//! Tunable geometry thresholds
//!
//! All distances are in form units (pdf2json page units, 1 unit = 16pt).
//! The defaults are tuned for the SIRF layout.

use crate::SirfError;
use serde::Deserialize;
use std::path::Path;

/// How `find_value` chooses between several candidates next to a label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CandidateOrder {
    /// First candidate in extractor order
    #[default]
    Enumeration,
    /// Candidate closest to the label
    Nearest,
}

/// Configuration for a single extraction call
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Max |dy| from a row's anchor fragment for the sweep clustering
    pub row_threshold: f32,
    /// Bucket size used when grouping rows for header detection
    pub bucket_resolution: f32,
    /// Max |dy| between a label and a value on the same line
    pub same_line_tolerance: f32,
    /// Min dx a same-line value must be to the right of its label
    pub right_offset: f32,
    /// Max dy for a value found below its label
    pub below_max_dy: f32,
    /// Max |dx| for a value found below its label
    pub below_max_dx: f32,
    /// Column intervals start this far left of the header x
    pub column_margin: f32,
    /// Right edge of the last column's interval
    pub column_sentinel: f32,
    /// Max |dy| for a fragment to count as the header on a page
    pub header_proximity: f32,
    /// Data rows start this far below the header
    pub header_skip: f32,
    /// Fixed-schema columns needed before a table is built
    pub min_fixed_columns: usize,
    /// Fragments needed in a row before it is tested as a header
    pub min_header_fragments: usize,
    /// Keyword hits needed for a row to be accepted as the header
    pub min_header_keywords: usize,
    /// Keywords counted (as substrings) when detecting a header row
    pub header_keywords: Vec<String>,
    /// Occupancy samples per form unit
    pub projection_resolution: u32,
    /// Whitespace run (in units) that separates two projection columns
    pub projection_gap: f32,
    /// Estimated width of one character when an extractor reports none
    pub width_per_char: f32,
    /// PDF points per form unit, used by the lopdf source
    pub points_per_unit: f32,
    /// Label value candidate selection
    pub candidate_order: CandidateOrder,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            row_threshold: 0.6,
            bucket_resolution: 0.5,
            same_line_tolerance: 1.0,
            right_offset: 1.0,
            below_max_dy: 4.0,
            below_max_dx: 10.0,
            column_margin: 2.0,
            column_sentinel: 1000.0,
            header_proximity: 2.0,
            header_skip: 2.0,
            min_fixed_columns: 3,
            min_header_fragments: 3,
            min_header_keywords: 2,
            header_keywords: [
                "code",
                "description",
                "qty",
                "quantity",
                "item",
                "number",
                "uom",
                "type",
                "requested",
                "name",
                "s.no",
                "sno",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            projection_resolution: 10,
            projection_gap: 2.0,
            width_per_char: 0.4,
            points_per_unit: 16.0,
            candidate_order: CandidateOrder::Enumeration,
        }
    }
}

impl ExtractionConfig {
    /// Parse a (possibly partial) JSON config; missing fields keep their defaults
    pub fn from_json(json: &str) -> Result<Self, SirfError> {
        let config: Self = serde_json::from_str(json)?;
        config.check()?;
        Ok(config)
    }

    /// Load a JSON config file
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, SirfError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Reject values that would make the geometry meaningless
    pub fn check(&self) -> Result<(), SirfError> {
        if self.projection_resolution == 0 {
            return Err(SirfError::Config(
                "projection_resolution must be at least 1".into(),
            ));
        }
        if self.bucket_resolution <= 0.0 {
            return Err(SirfError::Config("bucket_resolution must be positive".into()));
        }
        if self.points_per_unit <= 0.0 {
            return Err(SirfError::Config("points_per_unit must be positive".into()));
        }
        let thresholds = [
            ("row_threshold", self.row_threshold),
            ("projection_gap", self.projection_gap),
            ("width_per_char", self.width_per_char),
        ];
        for (name, value) in thresholds {
            if !value.is_finite() || value < 0.0 {
                return Err(SirfError::Config(format!("{} must be >= 0, got {}", name, value)));
            }
        }
        Ok(())
    }

    /// Whitespace run, in occupancy samples, that closes a projection column
    pub(crate) fn projection_gap_samples(&self) -> usize {
        (self.projection_gap * self.projection_resolution as f32).round() as usize
    }
}
