//! Positioned text extraction from PDF using lopdf
//!
//! Walks each page's content stream, tracks the text and transformation
//! matrices, and emits one fragment per shown string. Positions are
//! converted to form units: PDF points divided by `points_per_unit`, with y
//! flipped so it grows down the page.

use crate::config::ExtractionConfig;
use crate::fragment::{Page, RawFragment};
use crate::SirfError;
use lopdf::{Document, Object, ObjectId};
use std::collections::BTreeMap;
use std::path::Path;

/// US Letter height, used when a page has no usable MediaBox
const DEFAULT_PAGE_HEIGHT: f32 = 792.0;

/// A shown string in form units
#[derive(Debug, Clone)]
struct PdfTextRun {
    x: f32,
    y: f32,
    text: String,
}

impl RawFragment for PdfTextRun {
    fn x(&self) -> Option<f32> {
        Some(self.x)
    }

    fn y(&self) -> Option<f32> {
        Some(self.y)
    }

    fn width(&self) -> Option<f32> {
        // Would need glyph widths
        None
    }

    fn text(&self) -> String {
        self.text.clone()
    }
}

/// Extract positioned fragments from a PDF file, one [`Page`] per page
pub fn extract_pages<P: AsRef<Path>>(
    path: P,
    config: &ExtractionConfig,
) -> Result<Vec<Page>, SirfError> {
    let doc = Document::load(path)?;
    pages_from_doc(&doc, config)
}

/// Extract positioned fragments from a PDF held in memory
pub fn extract_pages_mem(buffer: &[u8], config: &ExtractionConfig) -> Result<Vec<Page>, SirfError> {
    let doc = Document::load_mem(buffer)?;
    pages_from_doc(&doc, config)
}

fn pages_from_doc(doc: &Document, config: &ExtractionConfig) -> Result<Vec<Page>, SirfError> {
    let mut pages = Vec::new();

    for (page_num, &page_id) in doc.get_pages().iter() {
        let height = page_height(doc, page_id).unwrap_or(DEFAULT_PAGE_HEIGHT);
        let runs = page_text_runs(doc, page_id, height, config.points_per_unit)?;
        log::debug!("page {}: {} text run(s), height {:.0}pt", page_num, runs.len(), height);
        pages.push(Page::normalize(&runs, config.width_per_char)?);
    }

    Ok(pages)
}

/// Height of the page's MediaBox, following inherited attributes
fn page_height(doc: &Document, page_id: ObjectId) -> Option<f32> {
    let mut current = Some(page_id);
    let mut depth = 0;

    while let Some(id) = current {
        let dict = doc.get_dictionary(id).ok()?;
        if let Ok(media_box) = dict.get(b"MediaBox") {
            let media_box = match media_box {
                Object::Reference(r) => doc.get_object(*r).ok()?,
                other => other,
            };
            let coords = media_box.as_array().ok()?;
            if coords.len() != 4 {
                return None;
            }
            let y0 = get_number(&coords[1])?;
            let y1 = get_number(&coords[3])?;
            return Some((y1 - y0).abs());
        }

        depth += 1;
        if depth > 32 {
            return None;
        }
        current = dict.get(b"Parent").and_then(Object::as_reference).ok();
    }

    None
}

/// PDF user space (origin bottom-left, points) to form units (origin top-left)
fn to_form_units(x: f32, y_top: f32, page_height: f32, points_per_unit: f32) -> (f32, f32) {
    (x / points_per_unit, (page_height - y_top) / points_per_unit)
}

/// Multiply two 2D transformation matrices
/// Matrix format: [a, b, c, d, e, f] representing:
/// | a  b  0 |
/// | c  d  0 |
/// | e  f  1 |
fn multiply_matrices(m1: &[f32; 6], m2: &[f32; 6]) -> [f32; 6] {
    [
        m1[0] * m2[0] + m1[1] * m2[2],
        m1[0] * m2[1] + m1[1] * m2[3],
        m1[2] * m2[0] + m1[3] * m2[2],
        m1[2] * m2[1] + m1[3] * m2[3],
        m1[4] * m2[0] + m1[5] * m2[2] + m2[4],
        m1[4] * m2[1] + m1[5] * m2[3] + m2[5],
    ]
}

/// Text and graphics state needed to place shown strings
struct TextState {
    ctm: [f32; 6],
    ctm_stack: Vec<[f32; 6]>,
    font: String,
    font_size: f32,
    text_matrix: [f32; 6],
    line_matrix: [f32; 6],
    in_text_block: bool,
}

impl TextState {
    const IDENTITY: [f32; 6] = [1.0, 0.0, 0.0, 1.0, 0.0, 0.0];

    fn new() -> Self {
        Self {
            ctm: Self::IDENTITY,
            ctm_stack: Vec::new(),
            font: String::new(),
            font_size: 12.0,
            text_matrix: Self::IDENTITY,
            line_matrix: Self::IDENTITY,
            in_text_block: false,
        }
    }

    fn next_line(&mut self) {
        // Approximate leading
        self.line_matrix[5] -= self.font_size * 1.2;
        self.text_matrix = self.line_matrix;
    }

    /// Top-left of the string about to be shown, in user space
    fn origin(&self) -> (f32, f32) {
        let combined = multiply_matrices(&self.text_matrix, &self.ctm);
        let rendered = effective_font_size(self.font_size, &self.text_matrix);
        (combined[4], combined[5] + rendered)
    }
}

/// Collect the shown strings of one page
fn page_text_runs(
    doc: &Document,
    page_id: ObjectId,
    page_height: f32,
    points_per_unit: f32,
) -> Result<Vec<PdfTextRun>, SirfError> {
    use lopdf::content::Content;

    let fonts = doc.get_page_fonts(page_id).unwrap_or_default();
    let content_data = doc
        .get_page_content(page_id)
        .map_err(|e| SirfError::Parse(e.to_string()))?;
    let content = Content::decode(&content_data).map_err(|e| SirfError::Parse(e.to_string()))?;

    let mut runs = Vec::new();
    let mut state = TextState::new();

    let mut emit = |state: &TextState, text: String| {
        if text.trim().is_empty() {
            return;
        }
        let (x_pt, y_pt) = state.origin();
        let (x, y) = to_form_units(x_pt, y_pt, page_height, points_per_unit);
        runs.push(PdfTextRun { x, y, text });
    };

    for op in &content.operations {
        match op.operator.as_str() {
            "q" => state.ctm_stack.push(state.ctm),
            "Q" => {
                if let Some(saved) = state.ctm_stack.pop() {
                    state.ctm = saved;
                }
            }
            "cm" => {
                if op.operands.len() >= 6 {
                    let mut m = TextState::IDENTITY;
                    for (i, operand) in op.operands.iter().take(6).enumerate() {
                        m[i] = get_number(operand).unwrap_or(TextState::IDENTITY[i]);
                    }
                    state.ctm = multiply_matrices(&m, &state.ctm);
                }
            }
            "BT" => {
                state.in_text_block = true;
                state.text_matrix = TextState::IDENTITY;
                state.line_matrix = TextState::IDENTITY;
            }
            "ET" => state.in_text_block = false,
            "Tf" => {
                if op.operands.len() >= 2 {
                    if let Ok(name) = op.operands[0].as_name() {
                        state.font = String::from_utf8_lossy(name).to_string();
                    }
                    if let Some(size) = get_number(&op.operands[1]) {
                        state.font_size = size;
                    }
                }
            }
            "Td" | "TD" => {
                if op.operands.len() >= 2 {
                    state.line_matrix[4] += get_number(&op.operands[0]).unwrap_or(0.0);
                    state.line_matrix[5] += get_number(&op.operands[1]).unwrap_or(0.0);
                    state.text_matrix = state.line_matrix;
                }
            }
            "Tm" => {
                if op.operands.len() >= 6 {
                    for (i, operand) in op.operands.iter().take(6).enumerate() {
                        state.text_matrix[i] =
                            get_number(operand).unwrap_or(TextState::IDENTITY[i]);
                    }
                    state.line_matrix = state.text_matrix;
                }
            }
            "T*" => state.next_line(),
            "Tj" => {
                if state.in_text_block && !op.operands.is_empty() {
                    if let Some(text) = decode_operand(&op.operands[0], doc, &fonts, &state.font) {
                        emit(&state, text);
                    }
                }
            }
            "TJ" => {
                if state.in_text_block && !op.operands.is_empty() {
                    if let Ok(array) = op.operands[0].as_array() {
                        let text: String = array
                            .iter()
                            .filter_map(|item| decode_operand(item, doc, &fonts, &state.font))
                            .collect();
                        emit(&state, text);
                    }
                }
            }
            "'" => {
                state.next_line();
                if !op.operands.is_empty() {
                    if let Some(text) = decode_operand(&op.operands[0], doc, &fonts, &state.font) {
                        emit(&state, text);
                    }
                }
            }
            _ => {}
        }
    }

    Ok(runs)
}

/// Helper to get f32 from Object
fn get_number(obj: &Object) -> Option<f32> {
    match obj {
        Object::Integer(i) => Some(*i as f32),
        Object::Real(r) => Some(*r),
        _ => None,
    }
}

/// Font size after the text matrix scale
fn effective_font_size(base_size: f32, text_matrix: &[f32; 6]) -> f32 {
    let scale_x = (text_matrix[0].powi(2) + text_matrix[1].powi(2)).sqrt();
    let scale_y = (text_matrix[2].powi(2) + text_matrix[3].powi(2)).sqrt();
    base_size * scale_x.max(scale_y)
}

/// Decode a string operand with the current font's encoding
fn decode_operand(
    obj: &Object,
    doc: &Document,
    fonts: &BTreeMap<Vec<u8>, &lopdf::Dictionary>,
    current_font: &str,
) -> Option<String> {
    let Object::String(bytes, _) = obj else {
        return None;
    };

    if let Some(font_dict) = fonts.get(current_font.as_bytes()) {
        if let Ok(encoding) = font_dict.get_font_encoding(doc) {
            if let Ok(text) = Document::decode_text(&encoding, bytes) {
                return Some(text);
            }
        }
    }

    // UTF-16BE with BOM, else Latin-1
    if bytes.len() >= 2 && bytes[0] == 0xFE && bytes[1] == 0xFF {
        let utf16: Vec<u16> = bytes[2..]
            .chunks_exact(2)
            .map(|chunk| u16::from_be_bytes([chunk[0], chunk[1]]))
            .collect();
        return Some(String::from_utf16_lossy(&utf16));
    }
    Some(bytes.iter().map(|&b| b as char).collect())
}
