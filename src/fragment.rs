//! Positioned text fragments
//!
//! Every extractor (pdf2json output, the lopdf content-stream walker) is
//! normalized into [`TextFragment`]s before any table logic runs.

use crate::SirfError;
use serde::Serialize;

/// One piece of extracted text with its position on the page
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextFragment {
    /// Left edge, in form units
    pub x: f32,
    /// Vertical position, in form units (grows downward)
    pub y: f32,
    /// Rendered width, estimated from the character count when the source has none
    pub width: f32,
    /// Decoded text
    pub text: String,
}

/// Fragments belonging to one physical page, in extractor order
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Page {
    pub fragments: Vec<TextFragment>,
}

/// An extractor-native fragment that can be normalized into a [`TextFragment`]
pub trait RawFragment {
    fn x(&self) -> Option<f32>;
    fn y(&self) -> Option<f32>;
    /// Rendered width, if the extractor reports one
    fn width(&self) -> Option<f32>;
    /// Fully decoded text
    fn text(&self) -> String;
}

impl TextFragment {
    /// Build a fragment with an explicit width
    pub fn new(x: f32, y: f32, width: f32, text: impl Into<String>) -> Self {
        Self {
            x,
            y,
            width,
            text: text.into(),
        }
    }

    /// Build a fragment whose width is estimated from its character count
    pub fn estimated(x: f32, y: f32, text: impl Into<String>, width_per_char: f32) -> Self {
        let text = text.into();
        let width = estimate_width(&text, width_per_char);
        Self { x, y, width, text }
    }

    /// Convert an extractor-native fragment, rejecting missing coordinates
    pub fn normalize<R: RawFragment + ?Sized>(
        raw: &R,
        width_per_char: f32,
    ) -> Result<Self, SirfError> {
        let text = raw.text();
        let x = require_coordinate(raw.x(), "x", &text)?;
        let y = require_coordinate(raw.y(), "y", &text)?;
        let width = match raw.width() {
            Some(w) if w.is_finite() && w > 0.0 => w,
            _ => estimate_width(&text, width_per_char),
        };
        Ok(Self { x, y, width, text })
    }

    /// Right edge of the rendered span
    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    /// Ensure both coordinates are usable numbers
    pub fn validate(&self) -> Result<(), SirfError> {
        require_coordinate(Some(self.x), "x", &self.text)?;
        require_coordinate(Some(self.y), "y", &self.text)?;
        if !self.width.is_finite() || self.width < 0.0 {
            return Err(SirfError::InvalidInput(format!(
                "fragment {:?} has invalid width {}",
                self.text, self.width
            )));
        }
        Ok(())
    }
}

impl Page {
    pub fn new(fragments: Vec<TextFragment>) -> Self {
        Self { fragments }
    }

    /// Normalize a page worth of extractor-native fragments
    pub fn normalize<'a, R, I>(raw: I, width_per_char: f32) -> Result<Self, SirfError>
    where
        R: RawFragment + 'a,
        I: IntoIterator<Item = &'a R>,
    {
        let fragments = raw
            .into_iter()
            .map(|r| TextFragment::normalize(r, width_per_char))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { fragments })
    }

    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }
}

impl From<Vec<TextFragment>> for Page {
    fn from(fragments: Vec<TextFragment>) -> Self {
        Self { fragments }
    }
}

fn estimate_width(text: &str, width_per_char: f32) -> f32 {
    text.chars().count() as f32 * width_per_char
}

fn require_coordinate(value: Option<f32>, axis: &str, text: &str) -> Result<f32, SirfError> {
    match value {
        Some(v) if v.is_finite() => Ok(v),
        Some(v) => Err(SirfError::InvalidInput(format!(
            "fragment {:?} has non-finite {} coordinate {}",
            text, axis, v
        ))),
        None => Err(SirfError::InvalidInput(format!(
            "fragment {:?} is missing its {} coordinate",
            text, axis
        ))),
    }
}

/// Sort fragments by y ascending, keeping extractor order for equal y
pub(crate) fn sort_by_y(fragments: &mut [&TextFragment]) {
    fragments.sort_by(|a, b| a.y.partial_cmp(&b.y).unwrap_or(std::cmp::Ordering::Equal));
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Raw {
        x: Option<f32>,
        y: Option<f32>,
        w: Option<f32>,
        t: &'static str,
    }

    impl RawFragment for Raw {
        fn x(&self) -> Option<f32> {
            self.x
        }
        fn y(&self) -> Option<f32> {
            self.y
        }
        fn width(&self) -> Option<f32> {
            self.w
        }
        fn text(&self) -> String {
            self.t.to_string()
        }
    }

    #[test]
    fn test_width_estimated_when_missing() {
        let raw = Raw {
            x: Some(3.0),
            y: Some(4.0),
            w: None,
            t: "ABCDE",
        };
        let frag = TextFragment::normalize(&raw, 0.4).unwrap();
        assert!((frag.width - 2.0).abs() < 1e-6);
        assert!((frag.right() - 5.0).abs() < 1e-6);
    }

    #[test]
    fn test_reported_width_kept() {
        let raw = Raw {
            x: Some(3.0),
            y: Some(4.0),
            w: Some(7.5),
            t: "AB",
        };
        let frag = TextFragment::normalize(&raw, 0.4).unwrap();
        assert_eq!(frag.width, 7.5);
    }

    #[test]
    fn test_missing_coordinate_is_invalid_input() {
        let raw = Raw {
            x: Some(1.0),
            y: None,
            w: None,
            t: "orphan",
        };
        let err = TextFragment::normalize(&raw, 0.4).unwrap_err();
        assert!(matches!(err, SirfError::InvalidInput(_)));
    }

    #[test]
    fn test_nan_coordinate_is_invalid_input() {
        let frag = TextFragment::new(f32::NAN, 1.0, 1.0, "bad");
        assert!(matches!(frag.validate(), Err(SirfError::InvalidInput(_))));
    }

    #[test]
    fn test_page_normalize() {
        let raws = vec![
            Raw {
                x: Some(1.0),
                y: Some(1.0),
                w: None,
                t: "a",
            },
            Raw {
                x: Some(2.0),
                y: Some(1.0),
                w: None,
                t: "b",
            },
        ];
        let page = Page::normalize(&raws, 0.4).unwrap();
        assert_eq!(page.fragments.len(), 2);
        assert_eq!(page.fragments[1].text, "b");
    }
}
