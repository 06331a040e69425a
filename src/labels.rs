//! Label-anchored field lookup
//!
//! Form metadata is printed as `Label   value`, or with the value on the line
//! below the label. A field is found by locating the label fragment and
//! then searching its neighbourhood.

use crate::config::{CandidateOrder, ExtractionConfig};
use crate::fragment::TextFragment;
use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::{Regex, RegexBuilder};

/// Where to look for a value relative to its label
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchMode {
    /// Same line only
    RightOnly,
    /// Same line first, then the lines just below
    RightOrBelow,
}

/// Case-insensitive pattern identifying a label fragment
#[derive(Debug, Clone)]
pub struct LabelPattern {
    regex: Regex,
}

impl LabelPattern {
    /// Compile a case-insensitive pattern
    pub fn new(pattern: &str) -> Result<Self, regex::Error> {
        let regex = RegexBuilder::new(pattern).case_insensitive(true).build()?;
        Ok(Self { regex })
    }

    pub fn is_match(&self, text: &str) -> bool {
        self.regex.is_match(text)
    }

    pub fn as_str(&self) -> &str {
        self.regex.as_str()
    }
}

/// A named metadata field and the labels that announce it
#[derive(Debug, Clone)]
pub struct MetadataField {
    pub name: String,
    pub patterns: Vec<LabelPattern>,
    pub mode: SearchMode,
}

impl MetadataField {
    pub fn new(name: &str, patterns: Vec<LabelPattern>, mode: SearchMode) -> Self {
        Self {
            name: name.to_string(),
            patterns,
            mode,
        }
    }
}

fn right_only(name: &str, pattern: &str) -> MetadataField {
    // Patterns below are literals
    let pattern = LabelPattern::new(pattern).unwrap();
    MetadataField::new(name, vec![pattern], SearchMode::RightOnly)
}

/// Header block fields of the Stock Issue Request Form
pub static SIRF_FIELDS: Lazy<Vec<MetadataField>> = Lazy::new(|| {
    vec![
        right_only("Request Date", r"Request\s*Date"),
        right_only("Need by Date", r"Need\s*by\s*Date"),
        right_only("Req. No", r"Req\.\s*No"),
        right_only("Project Code", r"Project\s*Code"),
        right_only("Project Name", r"Project\s*Name"),
        right_only("Site ID", r"Site\s*ID"),
        right_only("Site Name", r"Site\s*Name"),
        right_only("Requesting Dept", r"Requesting\s*Dept"),
        right_only("REG", r"REG:"),
        right_only("Project Mgr", r"Project\s*Mgr"),
    ]
});

/// Find the value printed next to the first fragment matching any pattern.
///
/// The label is the first match in `fragments` order. The value is searched
/// on the same line strictly to the right, then (unless `mode` is
/// [`SearchMode::RightOnly`]) just below the label. Returns an empty string
/// when no label or no value is found.
pub fn find_value(
    fragments: &[&TextFragment],
    patterns: &[LabelPattern],
    mode: SearchMode,
    config: &ExtractionConfig,
) -> String {
    let label = match fragments
        .iter()
        .find(|f| patterns.iter().any(|p| p.is_match(&f.text)))
    {
        Some(label) => *label,
        None => return String::new(),
    };

    let same_line = |c: &TextFragment| {
        (c.y - label.y).abs() < config.same_line_tolerance && c.x > label.x + config.right_offset
    };
    let below = |c: &TextFragment| {
        c.y > label.y
            && c.y < label.y + config.below_max_dy
            && (c.x - label.x).abs() < config.below_max_dx
    };

    let mut candidate = pick(fragments, label, same_line, config.candidate_order);
    if candidate.is_none() && mode == SearchMode::RightOrBelow {
        candidate = pick(fragments, label, below, config.candidate_order);
    }

    match candidate {
        Some(c) => c.text.clone(),
        None => {
            log::debug!("label {:?} found but no value next to it", label.text);
            String::new()
        }
    }
}

fn pick<'a, F>(
    fragments: &[&'a TextFragment],
    label: &TextFragment,
    accept: F,
    order: CandidateOrder,
) -> Option<&'a TextFragment>
where
    F: Fn(&TextFragment) -> bool,
{
    let mut candidates = fragments.iter().copied().filter(|c| accept(c));
    match order {
        CandidateOrder::Enumeration => candidates.next(),
        CandidateOrder::Nearest => candidates.min_by(|a, b| {
            distance(a, label)
                .partial_cmp(&distance(b, label))
                .unwrap_or(std::cmp::Ordering::Equal)
        }),
    }
}

fn distance(a: &TextFragment, b: &TextFragment) -> f32 {
    ((a.x - b.x).powi(2) + (a.y - b.y).powi(2)).sqrt()
}

/// Look up every field against the pooled fragments of all pages
pub fn extract_metadata(
    fragments: &[&TextFragment],
    fields: &[MetadataField],
    config: &ExtractionConfig,
) -> IndexMap<String, String> {
    fields
        .iter()
        .map(|field| {
            let value = find_value(fragments, &field.patterns, field.mode, config);
            (field.name.clone(), value)
        })
        .collect()
}
