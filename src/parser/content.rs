//! Content stream interpretation.
//!
//! Walks a page's content operators with enough graphics and text state to
//! place every shown string on the page: one [`ShownText`] per text-showing
//! operator, carrying the marked-content id it was drawn under.

use std::collections::BTreeMap;

use lopdf::{Dictionary, Document as LopdfDocument, Object, ObjectId};

use crate::error::{Error, Result};
use crate::model::{is_spaceless_script_char, RawFragment};

use super::backend::decode_text_simple;

/// Affine matrix `[a, b, c, d, e, f]`.
pub(crate) type Matrix = [f32; 6];

const IDENTITY: Matrix = [1.0, 0.0, 0.0, 1.0, 0.0, 0.0];

/// Default glyph width (1/1000 em) when a font has no width table.
const DEFAULT_GLYPH_WIDTH: f32 = 500.0;

/// A `TJ` adjustment beyond this (1/1000 em) reads as a word space.
const TJ_SPACE_THRESHOLD: f32 = 200.0;

/// One shown string with its marked-content id.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ShownText {
    pub fragment: RawFragment,
    pub mcid: Option<i64>,
}

/// Interpret the content of one page.
pub(crate) fn interpret_page(doc: &LopdfDocument, page_id: ObjectId) -> Result<Vec<ShownText>> {
    let content = page_content(doc, page_id)?;
    let fonts = doc.get_page_fonts(page_id)?;
    let properties = page_properties(doc, page_id);

    let mut interpreter = Interpreter::new(doc, fonts, properties);
    interpreter.run(&content)?;
    Ok(interpreter.output)
}

/// Concatenated, decompressed content stream of a page.
fn page_content(doc: &LopdfDocument, page_id: ObjectId) -> Result<Vec<u8>> {
    let page_dict = doc.get_dictionary(page_id)?;

    let contents = match page_dict.get(b"Contents") {
        Ok(contents) => contents,
        // A page without content is blank, not broken
        Err(_) => return Ok(Vec::new()),
    };

    match contents {
        Object::Reference(r) => match doc.get_object(*r)? {
            Object::Stream(s) => Ok(s.decompressed_content().unwrap_or_else(|_| s.content.clone())),
            Object::Array(arr) => Ok(concat_streams(doc, arr)),
            _ => Err(Error::PdfParse("Invalid content stream".to_string())),
        },
        Object::Array(arr) => Ok(concat_streams(doc, arr)),
        Object::Stream(s) => Ok(s.decompressed_content().unwrap_or_else(|_| s.content.clone())),
        _ => Err(Error::PdfParse("Invalid content stream".to_string())),
    }
}

fn concat_streams(doc: &LopdfDocument, parts: &[Object]) -> Vec<u8> {
    let mut content = Vec::new();
    for obj in parts {
        if let Object::Reference(r) = obj {
            if let Ok(Object::Stream(s)) = doc.get_object(*r) {
                match s.decompressed_content() {
                    Ok(data) => content.extend_from_slice(&data),
                    Err(_) => content.extend_from_slice(&s.content),
                }
                content.push(b' ');
            }
        }
    }
    content
}

/// Resolve a possibly indirect object.
pub(crate) fn resolve<'a>(doc: &'a LopdfDocument, obj: &'a Object) -> Option<&'a Object> {
    match obj {
        Object::Reference(id) => doc.get_object(*id).ok(),
        other => Some(other),
    }
}

/// Resolve a possibly indirect dictionary.
pub(crate) fn resolve_dict<'a>(doc: &'a LopdfDocument, obj: &'a Object) -> Option<&'a Dictionary> {
    resolve(doc, obj).and_then(|o| o.as_dict().ok())
}

/// `/Properties` of a page's resources, following `/Parent` inheritance.
fn page_properties(doc: &LopdfDocument, page_id: ObjectId) -> Option<&Dictionary> {
    let mut node = doc.get_dictionary(page_id).ok();
    // Bounded walk up the page tree
    for _ in 0..32 {
        let dict = node?;
        if let Some(props) = dict
            .get(b"Resources")
            .ok()
            .and_then(|r| resolve_dict(doc, r))
            .and_then(|res| res.get(b"Properties").ok())
            .and_then(|p| resolve_dict(doc, p))
        {
            return Some(props);
        }
        node = dict.get(b"Parent").ok().and_then(|p| resolve_dict(doc, p));
    }
    None
}

fn get_number(obj: &Object) -> Option<f32> {
    match obj {
        Object::Integer(i) => Some(*i as f32),
        Object::Real(r) => Some(*r),
        _ => None,
    }
}

/// `m1 × m2` for row-vector affine matrices.
pub(crate) fn multiply(m1: &Matrix, m2: &Matrix) -> Matrix {
    [
        m1[0] * m2[0] + m1[1] * m2[2],
        m1[0] * m2[1] + m1[1] * m2[3],
        m1[2] * m2[0] + m1[3] * m2[2],
        m1[2] * m2[1] + m1[3] * m2[3],
        m1[4] * m2[0] + m1[5] * m2[2] + m2[4],
        m1[4] * m2[1] + m1[5] * m2[3] + m2[5],
    ]
}

fn translation(tx: f32, ty: f32) -> Matrix {
    [1.0, 0.0, 0.0, 1.0, tx, ty]
}

/// Glyph widths of a font in 1/1000 em.
#[derive(Debug, Clone)]
enum GlyphWidths {
    /// `/FirstChar` + `/Widths`
    Simple { first_char: u32, widths: Vec<f32> },
    /// `/DW` + `/W` of a composite font's descendant
    Composite {
        default: f32,
        widths: BTreeMap<u32, f32>,
    },
    /// No width information
    Unknown,
}

impl GlyphWidths {
    fn width(&self, code: u32) -> f32 {
        match self {
            GlyphWidths::Simple { first_char, widths } => code
                .checked_sub(*first_char)
                .and_then(|i| widths.get(i as usize))
                .copied()
                .unwrap_or(DEFAULT_GLYPH_WIDTH),
            GlyphWidths::Composite { default, widths } => {
                widths.get(&code).copied().unwrap_or(*default)
            }
            GlyphWidths::Unknown => DEFAULT_GLYPH_WIDTH,
        }
    }
}

/// What the interpreter needs to know about a font.
#[derive(Debug, Clone)]
struct FontMetrics {
    base_font: String,
    widths: GlyphWidths,
    /// Two-byte character codes
    composite: bool,
}

impl FontMetrics {
    fn from_dict(doc: &LopdfDocument, font: &Dictionary) -> Self {
        let base_font = font
            .get(b"BaseFont")
            .ok()
            .and_then(|o| o.as_name().ok())
            .map(|n| String::from_utf8_lossy(n).to_string())
            .unwrap_or_default();

        let composite = matches!(
            font.get(b"Subtype").ok().and_then(|o| o.as_name().ok()),
            Some(b"Type0")
        );

        let widths = if composite {
            composite_widths(doc, font)
        } else {
            simple_widths(doc, font)
        };

        Self {
            base_font,
            widths,
            composite,
        }
    }

    fn codes(&self, bytes: &[u8]) -> Vec<u32> {
        if self.composite {
            bytes
                .chunks(2)
                .map(|c| match c {
                    [hi, lo] => (u32::from(*hi) << 8) | u32::from(*lo),
                    [single] => u32::from(*single),
                    _ => 0,
                })
                .collect()
        } else {
            bytes.iter().map(|&b| u32::from(b)).collect()
        }
    }
}

fn simple_widths(doc: &LopdfDocument, font: &Dictionary) -> GlyphWidths {
    let first_char = font
        .get(b"FirstChar")
        .ok()
        .and_then(|o| resolve(doc, o))
        .and_then(|o| o.as_i64().ok());
    let widths = font
        .get(b"Widths")
        .ok()
        .and_then(|o| resolve(doc, o))
        .and_then(|o| o.as_array().ok());

    match (first_char, widths) {
        (Some(first), Some(widths)) if first >= 0 => GlyphWidths::Simple {
            first_char: first as u32,
            widths: widths
                .iter()
                .map(|w| {
                    resolve(doc, w)
                        .and_then(get_number)
                        .unwrap_or(DEFAULT_GLYPH_WIDTH)
                })
                .collect(),
        },
        _ => GlyphWidths::Unknown,
    }
}

fn composite_widths(doc: &LopdfDocument, font: &Dictionary) -> GlyphWidths {
    let descendant = font
        .get(b"DescendantFonts")
        .ok()
        .and_then(|o| resolve(doc, o))
        .and_then(|o| o.as_array().ok())
        .and_then(|arr| arr.first())
        .and_then(|o| resolve_dict(doc, o));

    let Some(descendant) = descendant else {
        return GlyphWidths::Unknown;
    };

    let default = descendant
        .get(b"DW")
        .ok()
        .and_then(get_number)
        .unwrap_or(1000.0);

    let mut widths = BTreeMap::new();
    if let Some(w) = descendant
        .get(b"W")
        .ok()
        .and_then(|o| resolve(doc, o))
        .and_then(|o| o.as_array().ok())
    {
        // Entries are `c [w1 w2 ...]` or `c_first c_last w`
        let mut i = 0;
        while i < w.len() {
            let Some(start) = get_number(&w[i]).map(|n| n as u32) else {
                break;
            };
            match w.get(i + 1).and_then(|o| resolve(doc, o)) {
                Some(Object::Array(list)) => {
                    for (offset, width) in list.iter().enumerate() {
                        if let Some(width) = get_number(width) {
                            widths.insert(start + offset as u32, width);
                        }
                    }
                    i += 2;
                }
                Some(end) => {
                    let end = get_number(end).map(|n| n as u32).unwrap_or(start);
                    let width = w.get(i + 2).and_then(get_number).unwrap_or(default);
                    // Guard against absurd ranges in broken files
                    for code in start..=end.min(start.saturating_add(0xFFFF)) {
                        widths.insert(code, width);
                    }
                    i += 3;
                }
                None => break,
            }
        }
    }

    GlyphWidths::Composite { default, widths }
}

/// Text state parameters.
#[derive(Debug, Clone)]
struct TextState {
    font: Vec<u8>,
    font_size: f32,
    char_spacing: f32,
    word_spacing: f32,
    /// `Tz / 100`
    h_scale: f32,
    leading: f32,
    rise: f32,
}

impl Default for TextState {
    fn default() -> Self {
        Self {
            font: Vec::new(),
            font_size: 12.0,
            char_spacing: 0.0,
            word_spacing: 0.0,
            h_scale: 1.0,
            leading: 0.0,
            rise: 0.0,
        }
    }
}

#[derive(Debug, Clone)]
struct GraphicsState {
    ctm: Matrix,
    text: TextState,
}

impl Default for GraphicsState {
    fn default() -> Self {
        Self {
            ctm: IDENTITY,
            text: TextState::default(),
        }
    }
}

struct Interpreter<'a> {
    doc: &'a LopdfDocument,
    fonts: BTreeMap<Vec<u8>, &'a Dictionary>,
    metrics: BTreeMap<Vec<u8>, FontMetrics>,
    properties: Option<&'a Dictionary>,
    state: GraphicsState,
    saved: Vec<GraphicsState>,
    text_matrix: Matrix,
    line_matrix: Matrix,
    marked: Vec<Option<i64>>,
    output: Vec<ShownText>,
}

impl<'a> Interpreter<'a> {
    fn new(
        doc: &'a LopdfDocument,
        fonts: BTreeMap<Vec<u8>, &'a Dictionary>,
        properties: Option<&'a Dictionary>,
    ) -> Self {
        let metrics = fonts
            .iter()
            .map(|(name, dict)| (name.clone(), FontMetrics::from_dict(doc, dict)))
            .collect();
        Self {
            doc,
            fonts,
            metrics,
            properties,
            state: GraphicsState::default(),
            saved: Vec::new(),
            text_matrix: IDENTITY,
            line_matrix: IDENTITY,
            marked: Vec::new(),
            output: Vec::new(),
        }
    }

    fn run(&mut self, content: &[u8]) -> Result<()> {
        if content.iter().all(u8::is_ascii_whitespace) {
            return Ok(());
        }
        let content = lopdf::content::Content::decode(content)?;

        for op in &content.operations {
            let operands = &op.operands;
            let num = |i: usize| operands.get(i).and_then(get_number);

            match op.operator.as_str() {
                "q" => self.saved.push(self.state.clone()),
                "Q" => {
                    if let Some(state) = self.saved.pop() {
                        self.state = state;
                    }
                }
                "cm" => {
                    if let Some(m) = matrix_operands(operands) {
                        self.state.ctm = multiply(&m, &self.state.ctm);
                    }
                }
                "BT" => {
                    self.text_matrix = IDENTITY;
                    self.line_matrix = IDENTITY;
                }
                "ET" => {}
                "Tf" => {
                    if let Some(Object::Name(name)) = operands.first() {
                        self.state.text.font = name.clone();
                    }
                    if let Some(size) = num(1) {
                        self.state.text.font_size = size;
                    }
                }
                "Tc" => {
                    if let Some(v) = num(0) {
                        self.state.text.char_spacing = v;
                    }
                }
                "Tw" => {
                    if let Some(v) = num(0) {
                        self.state.text.word_spacing = v;
                    }
                }
                "Tz" => {
                    if let Some(v) = num(0) {
                        self.state.text.h_scale = v / 100.0;
                    }
                }
                "TL" => {
                    if let Some(v) = num(0) {
                        self.state.text.leading = v;
                    }
                }
                "Ts" => {
                    if let Some(v) = num(0) {
                        self.state.text.rise = v;
                    }
                }
                "Td" => {
                    if let (Some(tx), Some(ty)) = (num(0), num(1)) {
                        self.move_line(tx, ty);
                    }
                }
                "TD" => {
                    if let (Some(tx), Some(ty)) = (num(0), num(1)) {
                        self.state.text.leading = -ty;
                        self.move_line(tx, ty);
                    }
                }
                "Tm" => {
                    if let Some(m) = matrix_operands(operands) {
                        self.text_matrix = m;
                        self.line_matrix = m;
                    }
                }
                "T*" => self.next_line(),
                "Tj" => {
                    if let Some(s @ Object::String(..)) = operands.first() {
                        self.show(std::slice::from_ref(s));
                    }
                }
                "TJ" => {
                    if let Some(Object::Array(arr)) = operands.first() {
                        self.show(arr);
                    }
                }
                "'" => {
                    self.next_line();
                    if let Some(s @ Object::String(..)) = operands.first() {
                        self.show(std::slice::from_ref(s));
                    }
                }
                "\"" => {
                    if let (Some(aw), Some(ac)) = (num(0), num(1)) {
                        self.state.text.word_spacing = aw;
                        self.state.text.char_spacing = ac;
                    }
                    self.next_line();
                    if let Some(s @ Object::String(..)) = operands.get(2) {
                        self.show(std::slice::from_ref(s));
                    }
                }
                "BMC" => self.marked.push(None),
                "BDC" => {
                    let mcid = operands.get(1).and_then(|p| self.marked_content_id(p));
                    self.marked.push(mcid);
                }
                "EMC" => {
                    self.marked.pop();
                }
                _ => {}
            }
        }

        Ok(())
    }

    fn move_line(&mut self, tx: f32, ty: f32) {
        self.line_matrix = multiply(&translation(tx, ty), &self.line_matrix);
        self.text_matrix = self.line_matrix;
    }

    fn next_line(&mut self) {
        let leading = self.state.text.leading;
        self.move_line(0.0, -leading);
    }

    /// MCID of a `BDC` property list, inline or named in `/Properties`.
    fn marked_content_id(&self, props: &Object) -> Option<i64> {
        let dict = match props {
            Object::Dictionary(d) => Some(d),
            Object::Name(name) => self
                .properties
                .and_then(|p| p.get(name).ok())
                .and_then(|o| resolve_dict(self.doc, o)),
            _ => None,
        }?;
        dict.get(b"MCID").ok().and_then(|o| o.as_i64().ok())
    }

    fn current_mcid(&self) -> Option<i64> {
        self.marked.iter().rev().find_map(|m| *m)
    }

    /// Show the strings of a `TJ` array (or a single `Tj` string).
    fn show(&mut self, parts: &[Object]) {
        let text_state = self.state.text.clone();
        let metrics = self.metrics.get(&text_state.font);
        let font_dict = self.fonts.get(&text_state.font).copied();

        let start = self.rendering_matrix();
        let mut text = String::new();
        let mut advance = 0.0;

        for part in parts {
            match part {
                Object::String(bytes, _) => {
                    text.push_str(&decode_bytes(self.doc, font_dict, bytes));
                    advance += string_advance(metrics, &text_state, bytes);
                }
                Object::Integer(_) | Object::Real(_) => {
                    let adjustment = get_number(part).unwrap_or(0.0);
                    advance -= adjustment / 1000.0 * text_state.font_size * text_state.h_scale;
                    if -adjustment > TJ_SPACE_THRESHOLD {
                        push_word_space(&mut text);
                    }
                }
                _ => {}
            }
        }

        self.text_matrix = multiply(&translation(advance, 0.0), &self.text_matrix);

        if text.is_empty() {
            return;
        }

        let end = self.rendering_matrix();
        let width = ((end[4] - start[4]).powi(2) + (end[5] - start[5]).powi(2)).sqrt();
        let font_name = metrics
            .map(|m| m.base_font.clone())
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| String::from_utf8_lossy(&text_state.font).to_string());

        let mcid = self.current_mcid();
        self.output.push(ShownText {
            fragment: RawFragment {
                text,
                transform: start,
                font_name,
                width,
                height: 0.0,
            },
            mcid,
        });
    }

    /// Glyph space to page space at the current text position.
    fn rendering_matrix(&self) -> Matrix {
        let ts = &self.state.text;
        let text_space = [
            ts.font_size * ts.h_scale,
            0.0,
            0.0,
            ts.font_size,
            0.0,
            ts.rise,
        ];
        multiply(&text_space, &multiply(&self.text_matrix, &self.state.ctm))
    }
}

fn matrix_operands(operands: &[Object]) -> Option<Matrix> {
    if operands.len() < 6 {
        return None;
    }
    let mut m = IDENTITY;
    for (slot, obj) in m.iter_mut().zip(operands) {
        *slot = get_number(obj)?;
    }
    Some(m)
}

/// Horizontal displacement of a string in text space.
fn string_advance(metrics: Option<&FontMetrics>, ts: &TextState, bytes: &[u8]) -> f32 {
    let (codes, composite) = match metrics {
        Some(m) => (m.codes(bytes), m.composite),
        None => (bytes.iter().map(|&b| u32::from(b)).collect(), false),
    };

    codes
        .into_iter()
        .map(|code| {
            let w = metrics.map(|m| m.widths.width(code)).unwrap_or(DEFAULT_GLYPH_WIDTH);
            let word_spacing = if !composite && code == 32 {
                ts.word_spacing
            } else {
                0.0
            };
            (w / 1000.0 * ts.font_size + ts.char_spacing + word_spacing) * ts.h_scale
        })
        .sum()
}

fn decode_bytes(doc: &LopdfDocument, font: Option<&Dictionary>, bytes: &[u8]) -> String {
    if let Some(font) = font {
        if let Ok(enc) = font.get_font_encoding(doc) {
            if let Ok(text) = LopdfDocument::decode_text(&enc, bytes) {
                return text;
            }
        }
    }
    decode_text_simple(bytes)
}

fn push_word_space(text: &mut String) {
    match text.chars().last() {
        Some(c) if !c.is_whitespace() && c != '\u{00A0}' && !is_spaceless_script_char(c) => {
            text.push(' ')
        }
        _ => {}
    }
}
