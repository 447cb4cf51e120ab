//! Per-slice overlay SVG parsing and path-data handling.
//!
//! Overlay documents are plain SVG files whose `<path>` elements carry
//! an `id` equal to a region abbreviation (optionally suffixed `_L`/`_R`
//! for side) plus one `id="background"` sentinel path. Only the path
//! geometry matters here; everything else in the document is ignored.

use quick_xml::{Reader, Writer};
use quick_xml::events::{BytesEnd, BytesStart, Event};

use crate::error::ViewerError;

/// One `<path>` element extracted from an overlay document.
#[derive(Debug, Clone)]
pub struct ParsedPath {
    /// Raw `id` attribute.
    pub id: String,
    /// Raw `d` (path data) attribute.
    pub d: String,
}

/// Axis-aligned bounding box in image coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// Extract every identified `<path>` element from an overlay document.
///
/// Paths without an `id` or without path data are skipped with a log
/// line; a document with no usable path at all is an error since the
/// slice would render empty for no visible reason.
pub fn parse_overlay_paths(svg: &str) -> Result<Vec<ParsedPath>, ViewerError> {
    let mut reader = Reader::from_str(svg);
    reader.trim_text(true);
    let mut paths = Vec::new();
    loop {
        match reader.read_event()? {
            Event::Start(element) | Event::Empty(element) => {
                if element.name().as_ref() != b"path" {
                    continue;
                }
                let mut id = None;
                let mut d = None;
                for attr in element.attributes().flatten() {
                    match attr.key.as_ref() {
                        b"id" => id = attr.unescape_value().ok().map(|v| v.into_owned()),
                        b"d" => d = attr.unescape_value().ok().map(|v| v.into_owned()),
                        _ => {}
                    }
                }
                match (id, d) {
                    (Some(id), Some(d)) => paths.push(ParsedPath { id, d }),
                    (id, _) => log::debug!("skipping path without id/d (id={:?})", id),
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }
    if paths.is_empty() {
        return Err(ViewerError::invalid_overlay("document contains no usable path"));
    }
    Ok(paths)
}

/// Serialize identified paths back into an overlay SVG document.
///
/// Used to export a slice's overlay after region edits; only the id and
/// path data survive, which is all the viewer reads back.
pub fn write_overlay_document(paths: &[ParsedPath]) -> Result<String, ViewerError> {
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
    let mut svg = BytesStart::new("svg");
    svg.push_attribute(("xmlns", "http://www.w3.org/2000/svg"));
    writer
        .write_event(Event::Start(svg))
        .map_err(|e| ViewerError::Svg(e.into()))?;
    for path in paths {
        let mut elem = BytesStart::new("path");
        elem.push_attribute(("id", path.id.as_str()));
        elem.push_attribute(("d", path.d.as_str()));
        writer
            .write_event(Event::Empty(elem))
            .map_err(|e| ViewerError::Svg(e.into()))?;
    }
    writer
        .write_event(Event::End(BytesEnd::new("svg")))
        .map_err(|e| ViewerError::Svg(e.into()))?;
    String::from_utf8(writer.into_inner())
        .map_err(|_| ViewerError::invalid_overlay("invalid UTF-8 in document"))
}

/// Parse SVG path data into polygon rings (one per subpath).
///
/// Curve commands are flattened to their endpoints; region outlines in
/// the overlay documents are polygonal, so this loses nothing in
/// practice. Malformed trailing tokens are dropped.
pub fn parse_path_data(d: &str) -> Vec<Vec<(f64, f64)>> {
    let tokens = tokenize(d);
    let mut rings: Vec<Vec<(f64, f64)>> = Vec::new();
    let mut ring: Vec<(f64, f64)> = Vec::new();
    let mut cursor = (0.0, 0.0);
    let mut command = 'M';
    let mut i = 0;

    let mut close_ring = |ring: &mut Vec<(f64, f64)>, rings: &mut Vec<Vec<(f64, f64)>>| {
        if ring.len() >= 3 {
            rings.push(std::mem::take(ring));
        } else {
            ring.clear();
        }
    };

    while i < tokens.len() {
        if let Token::Command(c) = tokens[i] {
            command = c;
            i += 1;
            if command == 'Z' || command == 'z' {
                close_ring(&mut ring, &mut rings);
                continue;
            }
        }
        let relative = command.is_ascii_lowercase();
        let upper = command.to_ascii_uppercase();
        let needed = match upper {
            'M' | 'L' | 'T' => 2,
            'H' | 'V' => 1,
            'C' => 6,
            'S' | 'Q' => 4,
            'A' => 7,
            _ => {
                // Unknown command: skip its token and resynchronize.
                i += 1;
                continue;
            }
        };
        let Some(args) = take_numbers(&tokens, i, needed) else {
            break;
        };
        i += needed;
        let target = match upper {
            'H' => {
                let x = if relative { cursor.0 + args[0] } else { args[0] };
                (x, cursor.1)
            }
            'V' => {
                let y = if relative { cursor.1 + args[0] } else { args[0] };
                (cursor.0, y)
            }
            _ => {
                let (x, y) = (args[needed - 2], args[needed - 1]);
                if relative {
                    (cursor.0 + x, cursor.1 + y)
                } else {
                    (x, y)
                }
            }
        };
        if upper == 'M' {
            close_ring(&mut ring, &mut rings);
            // Pairs following a moveto are implicit linetos.
            command = if relative { 'l' } else { 'L' };
        }
        ring.push(target);
        cursor = target;
    }
    close_ring(&mut ring, &mut rings);
    rings
}

/// Serialize polygon rings back into SVG path data.
pub fn path_data_from_rings(rings: &[Vec<(f64, f64)>]) -> String {
    let mut out = String::new();
    for ring in rings {
        let mut points = ring.iter();
        let Some((x, y)) = points.next() else {
            continue;
        };
        if !out.is_empty() {
            out.push(' ');
        }
        out.push_str(&format!("M {} {}", x, y));
        for (x, y) in points {
            out.push_str(&format!(" L {} {}", x, y));
        }
        out.push_str(" Z");
    }
    out
}

/// Bounding box of a point set; `None` when empty.
pub fn bounding_box(rings: &[Vec<(f64, f64)>]) -> Option<Bounds> {
    let mut points = rings.iter().flatten();
    let first = *points.next()?;
    let (mut min_x, mut min_y, mut max_x, mut max_y) = (first.0, first.1, first.0, first.1);
    for (x, y) in points {
        min_x = min_x.min(*x);
        min_y = min_y.min(*y);
        max_x = max_x.max(*x);
        max_y = max_y.max(*y);
    }
    Some(Bounds {
        x: min_x,
        y: min_y,
        width: max_x - min_x,
        height: max_y - min_y,
    })
}

#[derive(Debug, Clone, Copy)]
enum Token {
    Command(char),
    Number(f64),
}

fn tokenize(d: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut number = String::new();
    let mut flush = |number: &mut String, tokens: &mut Vec<Token>| {
        if !number.is_empty() {
            if let Ok(value) = number.parse() {
                tokens.push(Token::Number(value));
            }
            number.clear();
        }
    };
    for c in d.chars() {
        match c {
            '0'..='9' | '.' | 'e' | 'E' => number.push(c),
            '-' | '+' => {
                // Sign starts a new number unless it follows an exponent.
                if number.ends_with(['e', 'E']) {
                    number.push(c);
                } else {
                    flush(&mut number, &mut tokens);
                    number.push(c);
                }
            }
            ' ' | ',' | '\t' | '\n' | '\r' => flush(&mut number, &mut tokens),
            c if c.is_ascii_alphabetic() => {
                flush(&mut number, &mut tokens);
                tokens.push(Token::Command(c));
            }
            _ => flush(&mut number, &mut tokens),
        }
    }
    flush(&mut number, &mut tokens);
    tokens
}

fn take_numbers(tokens: &[Token], start: usize, count: usize) -> Option<Vec<f64>> {
    let mut out = Vec::with_capacity(count);
    for token in tokens.get(start..start + count)? {
        match token {
            Token::Number(value) => out.push(*value),
            Token::Command(_) => return None,
        }
    }
    Some(out)
}
