//! Folio overlay generation and page merge
//!
//! An overlay is a short content-stream fragment holding one folio numeral,
//! positioned against a page corner and appended on top of the page's
//! existing content. Each overlay is sized from its own page's media box, so
//! documents with mixed page dimensions place every folio correctly.

use std::fmt;
use std::str::FromStr;

use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object, ObjectId, Stream};

use crate::error::Result;

/// Points per centimetre at PDF resolution (72 dpi).
pub const POINTS_PER_CM: f64 = 72.0 / 2.54;

/// Advance width of every Courier glyph, in em units.
const COURIER_ADVANCE: f64 = 0.6;

/// Resource name the folio font is registered under on stamped pages.
const FONT_RESOURCE: &str = "FoCourB";

const BASE_FONT: &str = "Courier-Bold";

/// Fallback when no MediaBox can be resolved: US Letter.
const LETTER: [f64; 4] = [0.0, 0.0, 612.0, 792.0];

/// How far up the page tree MediaBox inheritance is followed.
const INHERIT_DEPTH: usize = 10;

/// Page corner a folio is anchored to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Corner {
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

impl Corner {
    pub fn is_right(self) -> bool {
        matches!(self, Corner::TopRight | Corner::BottomRight)
    }

    pub fn is_bottom(self) -> bool {
        matches!(self, Corner::BottomLeft | Corner::BottomRight)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Corner::TopLeft => "top-left",
            Corner::TopRight => "top-right",
            Corner::BottomLeft => "bottom-left",
            Corner::BottomRight => "bottom-right",
        }
    }
}

impl fmt::Display for Corner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Corner {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim() {
            "top-left" => Ok(Corner::TopLeft),
            "top-right" => Ok(Corner::TopRight),
            "bottom-left" => Ok(Corner::BottomLeft),
            "bottom-right" => Ok(Corner::BottomRight),
            other => Err(format!(
                "unknown corner '{other}' (expected top-left, top-right, bottom-left or bottom-right)"
            )),
        }
    }
}

/// Reading direction of the folio text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    /// Left to right along the page edge.
    Horizontal,
    /// Rotated 90° counter-clockwise; reads bottom to top.
    Vertical,
}

impl Orientation {
    pub fn as_str(self) -> &'static str {
        match self {
            Orientation::Horizontal => "horizontal",
            Orientation::Vertical => "vertical",
        }
    }
}

impl fmt::Display for Orientation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Orientation {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim() {
            "horizontal" => Ok(Orientation::Horizontal),
            "vertical" => Ok(Orientation::Vertical),
            other => Err(format!(
                "unknown orientation '{other}' (expected horizontal or vertical)"
            )),
        }
    }
}

/// Format a folio value as a zero-padded numeral.
///
/// Values past 9999 widen the field; the counter is never truncated.
pub fn folio_text(folio: u32) -> String {
    format!("{folio:04}")
}

/// Width of `text` rendered in Courier at `font_size`.
pub(crate) fn string_width(text: &str, font_size: f64) -> f64 {
    text.chars().count() as f64 * COURIER_ADVANCE * font_size
}

/// Register the folio font once per document; stamped pages reference it.
pub(crate) fn register_folio_font(doc: &mut Document) -> ObjectId {
    doc.add_object(Dictionary::from_iter([
        ("Type", Object::Name(b"Font".to_vec())),
        ("Subtype", Object::Name(b"Type1".to_vec())),
        ("BaseFont", Object::Name(BASE_FONT.as_bytes().to_vec())),
    ]))
}

/// Build the overlay operations for one folio on a page of the given size.
pub(crate) fn overlay_operations(
    page_width: f64,
    page_height: f64,
    text: &str,
    font_size: f64,
    offset_cm: f64,
    corner: Corner,
    orientation: Orientation,
) -> Vec<Operation> {
    let margin = offset_cm * POINTS_PER_CM;

    let anchor_x = if corner.is_right() {
        page_width - margin
    } else {
        margin
    };
    let anchor_y = if corner.is_bottom() {
        margin
    } else {
        page_height - margin - font_size
    };

    let mut ops = vec![Operation::new("q", vec![])];
    match orientation {
        Orientation::Vertical => {
            // Rotate the frame 90° CCW about the anchor and draw from the
            // local origin; alignment is ignored in this mode.
            ops.push(Operation::new(
                "cm",
                vec![
                    0.0.into(),
                    1.0.into(),
                    (-1.0).into(),
                    0.0.into(),
                    anchor_x.into(),
                    anchor_y.into(),
                ],
            ));
            ops.extend(text_operations(0.0, 0.0, text, font_size));
        }
        Orientation::Horizontal => {
            let x = if corner.is_right() {
                anchor_x - string_width(text, font_size)
            } else {
                anchor_x
            };
            ops.extend(text_operations(x, anchor_y, text, font_size));
        }
    }
    ops.push(Operation::new("Q", vec![]));
    ops
}

fn text_operations(x: f64, y: f64, text: &str, font_size: f64) -> Vec<Operation> {
    vec![
        Operation::new("BT", vec![]),
        Operation::new("Tf", vec![FONT_RESOURCE.into(), font_size.into()]),
        Operation::new("Td", vec![x.into(), y.into()]),
        Operation::new("Tj", vec![Object::string_literal(text)]),
        Operation::new("ET", vec![]),
    ]
}

/// Merge one folio overlay onto `page_id`, sized to that page's media box.
///
/// The overlay becomes an extra content stream appended after the page's
/// existing content, so original streams stay byte-identical.
pub(crate) fn stamp_page(
    doc: &mut Document,
    page_id: ObjectId,
    font_id: ObjectId,
    text: &str,
    font_size: f64,
    offset_cm: f64,
    corner: Corner,
    orientation: Orientation,
) -> Result<()> {
    let (width, height) = page_size(doc, page_id)?;
    let ops = overlay_operations(width, height, text, font_size, offset_cm, corner, orientation);
    let encoded = Content { operations: ops }.encode()?;
    let overlay_id = doc.add_object(Stream::new(Dictionary::new(), encoded));

    attach_folio_font(doc, page_id, font_id)?;
    append_page_content(doc, page_id, overlay_id)?;
    Ok(())
}

/// Effective page dimensions from the (possibly inherited) MediaBox.
pub(crate) fn page_size(doc: &Document, page_id: ObjectId) -> Result<(f64, f64)> {
    let media_box = inherited_media_box(doc, doc.get_object(page_id)?, INHERIT_DEPTH);
    Ok((media_box[2] - media_box[0], media_box[3] - media_box[1]))
}

fn inherited_media_box(doc: &Document, obj: &Object, depth: usize) -> [f64; 4] {
    if depth == 0 {
        return LETTER;
    }

    if let Object::Dictionary(dict) = obj {
        if let Ok(media_box) = dict.get(b"MediaBox") {
            let array = match media_box {
                Object::Array(array) => Some(array),
                Object::Reference(id) => doc
                    .get_object(*id)
                    .ok()
                    .and_then(|target| target.as_array().ok()),
                _ => None,
            };
            if let Some(array) = array {
                if array.len() == 4 {
                    let values: Vec<f64> = array.iter().filter_map(as_number).collect();
                    if values.len() == 4 {
                        return [values[0], values[1], values[2], values[3]];
                    }
                }
            }
        }

        if let Ok(Object::Reference(parent_id)) = dict.get(b"Parent") {
            if let Ok(parent) = doc.get_object(*parent_id) {
                return inherited_media_box(doc, parent, depth - 1);
            }
        }
    }

    LETTER
}

fn as_number(obj: &Object) -> Option<f64> {
    match obj {
        Object::Integer(value) => Some(*value as f64),
        Object::Real(value) => Some(f64::from(*value)),
        _ => None,
    }
}

/// Make the folio font reachable from the page's Resources.
///
/// The page's effective resources (inline, referenced, or inherited) are
/// cloned onto the page with the folio font added, so shared resource
/// dictionaries on other pages are never mutated.
fn attach_folio_font(doc: &mut Document, page_id: ObjectId, font_id: ObjectId) -> Result<()> {
    let mut resources = effective_resources(doc, page_id)?;

    let mut fonts = match resources.get(b"Font") {
        Ok(Object::Dictionary(dict)) => dict.clone(),
        Ok(Object::Reference(id)) => match doc.get_object(*id) {
            Ok(Object::Dictionary(dict)) => dict.clone(),
            _ => Dictionary::new(),
        },
        _ => Dictionary::new(),
    };
    fonts.set(FONT_RESOURCE, Object::Reference(font_id));
    resources.set("Font", Object::Dictionary(fonts));

    let page = doc.get_object_mut(page_id)?.as_dict_mut()?;
    page.set("Resources", Object::Dictionary(resources));
    Ok(())
}

fn effective_resources(doc: &Document, page_id: ObjectId) -> Result<Dictionary> {
    let mut current = doc.get_object(page_id)?;
    for _ in 0..INHERIT_DEPTH {
        let Object::Dictionary(dict) = current else {
            break;
        };
        match dict.get(b"Resources") {
            Ok(Object::Dictionary(resources)) => return Ok(resources.clone()),
            Ok(Object::Reference(id)) => {
                if let Ok(Object::Dictionary(resources)) = doc.get_object(*id) {
                    return Ok(resources.clone());
                }
                break;
            }
            _ => {}
        }
        match dict.get(b"Parent") {
            Ok(Object::Reference(parent_id)) => current = doc.get_object(*parent_id)?,
            _ => break,
        }
    }
    Ok(Dictionary::new())
}

/// Append the overlay stream to the page's Contents entry.
fn append_page_content(doc: &mut Document, page_id: ObjectId, overlay_id: ObjectId) -> Result<()> {
    let page = doc.get_object_mut(page_id)?.as_dict_mut()?;

    let existing = page.get(b"Contents").ok().cloned();
    match existing {
        Some(Object::Reference(content_id)) => {
            page.set(
                "Contents",
                Object::Array(vec![
                    Object::Reference(content_id),
                    Object::Reference(overlay_id),
                ]),
            );
        }
        Some(Object::Array(mut contents)) => {
            contents.push(Object::Reference(overlay_id));
            page.set("Contents", Object::Array(contents));
        }
        _ => {
            page.set("Contents", Object::Reference(overlay_id));
        }
    }
    Ok(())
}
