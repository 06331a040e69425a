//! pdf2json-shaped input
//!
//! pdf2json reports each text fragment as `{ x, y, w, R: [ { T } ] }` where
//! `T` is percent-encoded. Coordinates are already in form units.

use crate::fragment::{Page, RawFragment};
use crate::SirfError;
use serde::Deserialize;
use std::path::Path;

/// Top-level pdf2json document (either flat or wrapped in `formImage`)
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Pdf2JsonDocument {
    #[serde(rename = "Pages", default)]
    pub pages: Vec<Pdf2JsonPage>,
    #[serde(rename = "formImage", default)]
    pub form_image: Option<Box<Pdf2JsonDocument>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Pdf2JsonPage {
    #[serde(rename = "Texts", default)]
    pub texts: Vec<Pdf2JsonText>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Pdf2JsonText {
    #[serde(default)]
    pub x: Option<f32>,
    #[serde(default)]
    pub y: Option<f32>,
    #[serde(default)]
    pub w: Option<f32>,
    #[serde(rename = "R", default)]
    pub runs: Vec<Pdf2JsonRun>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Pdf2JsonRun {
    #[serde(rename = "T", default)]
    pub text: String,
}

/// Percent-decode a pdf2json run; malformed UTF-8 is replaced, never fatal
pub fn decode_run(encoded: &str) -> String {
    match urlencoding::decode(encoded) {
        Ok(text) => text.into_owned(),
        Err(_) => String::from_utf8_lossy(&urlencoding::decode_binary(encoded.as_bytes()))
            .into_owned(),
    }
}

impl RawFragment for Pdf2JsonText {
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
        self.runs.iter().map(|r| decode_run(&r.text)).collect()
    }
}

impl Pdf2JsonDocument {
    /// Pages of the document, looking inside `formImage` when present
    pub fn pdf_pages(&self) -> &[Pdf2JsonPage] {
        match &self.form_image {
            Some(inner) if self.pages.is_empty() => inner.pdf_pages(),
            _ => &self.pages,
        }
    }

    /// Normalize every page into [`Page`]s
    pub fn to_pages(&self, width_per_char: f32) -> Result<Vec<Page>, SirfError> {
        self.pdf_pages()
            .iter()
            .map(|p| Page::normalize(&p.texts, width_per_char))
            .collect()
    }
}

/// Parse pdf2json JSON text into pages
pub fn parse_pdf2json(json: &str, width_per_char: f32) -> Result<Vec<Page>, SirfError> {
    let doc: Pdf2JsonDocument = serde_json::from_str(json)?;
    doc.to_pages(width_per_char)
}

/// Read a pdf2json JSON file into pages
pub fn load_pdf2json<P: AsRef<Path>>(path: P, width_per_char: f32) -> Result<Vec<Page>, SirfError> {
    let json = std::fs::read_to_string(path)?;
    parse_pdf2json(&json, width_per_char)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_run() {
        assert_eq!(decode_run("Request%20Date"), "Request Date");
        assert_eq!(decode_run("Qty%20(Req.)"), "Qty (Req.)");
        assert_eq!(decode_run("plain"), "plain");
        // Lone high byte is not valid UTF-8
        assert_eq!(decode_run("a%FFb"), "a\u{FFFD}b");
    }

    #[test]
    fn test_parse_flat_document() {
        let json = r#"{"Pages":[{"Texts":[
            {"x":5,"y":10,"w":4.2,"R":[{"T":"Request%20Date"}]},
            {"x":15,"y":10,"R":[{"T":"2024-01-01"}]}
        ]}]}"#;
        let pages = parse_pdf2json(json, 0.4).unwrap();
        assert_eq!(pages.len(), 1);
        let frags = &pages[0].fragments;
        assert_eq!(frags[0].text, "Request Date");
        assert_eq!(frags[0].width, 4.2);
        assert!((frags[1].width - 4.0).abs() < 1e-5);
    }

    #[test]
    fn test_parse_form_image_wrapper() {
        let json = r#"{"formImage":{"Pages":[{"Texts":[]},{"Texts":[{"x":1,"y":2,"R":[{"T":"A"},{"T":"B"}]}]}]}}"#;
        let pages = parse_pdf2json(json, 0.4).unwrap();
        assert_eq!(pages.len(), 2);
        assert!(pages[0].is_empty());
        assert_eq!(pages[1].fragments[0].text, "AB");
    }

    #[test]
    fn test_missing_coordinate_rejected() {
        let json = r#"{"Pages":[{"Texts":[{"x":1,"R":[{"T":"A"}]}]}]}"#;
        let err = parse_pdf2json(json, 0.4).unwrap_err();
        assert!(matches!(err, SirfError::InvalidInput(_)));
    }

    #[test]
    fn test_malformed_json() {
        let err = parse_pdf2json("{not json", 0.4).unwrap_err();
        assert!(matches!(err, SirfError::Json(_)));
    }
}
