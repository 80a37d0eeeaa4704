use crate::error::ExtractionError;
use lopdf::content::Content;
use lopdf::{Document, Encoding, Object, ObjectId};
use std::collections::BTreeMap;
use std::path::Path;

/// Extract the text of each page, in page order, for at most `max_pages` pages.
///
/// Returns `(page_index, text)` pairs with zero-based indices. Each text line of
/// a page ends up on its own line. A page that can't be read fails the whole
/// document.
pub fn extract_pdf_pages(
    path: &Path,
    max_pages: usize,
) -> Result<Vec<(u32, String)>, ExtractionError> {
    let doc = Document::load(path).map_err(|e| ExtractionError::Pdf {
        file: path.display().to_string(),
        reason: e.to_string(),
    })?;

    let pages = doc.get_pages();
    if pages.len() > max_pages {
        tracing::debug!(
            "{:?} has {} pages, reading the first {}",
            path,
            pages.len(),
            max_pages
        );
    }

    let mut out = Vec::with_capacity(pages.len().min(max_pages));
    for (index, (page_number, page_id)) in pages.iter().take(max_pages).enumerate() {
        let text = page_text(&doc, *page_id).map_err(|e| ExtractionError::Pdf {
            file: path.display().to_string(),
            reason: format!("page {}: {}", page_number, e),
        })?;
        out.push((index as u32, text));
    }

    Ok(out)
}

/// Text shown on one page, with a line break at every move to a new text line
fn page_text(doc: &Document, page_id: ObjectId) -> lopdf::Result<String> {
    let encodings = doc
        .get_page_fonts(page_id)?
        .into_iter()
        .map(|(name, font)| font.get_font_encoding(doc).map(|encoding| (name, encoding)))
        .collect::<lopdf::Result<BTreeMap<Vec<u8>, Encoding>>>()?;
    let content = Content::decode(&doc.get_page_content(page_id)?)?;

    let mut text = String::new();
    let mut encoding = None;
    let mut line_y: Option<f32> = None;

    for op in &content.operations {
        match op.operator.as_str() {
            "Tf" => {
                let font = op
                    .operands
                    .first()
                    .ok_or_else(|| lopdf::Error::Syntax("Tf without a font".to_string()))?
                    .as_name()?;
                encoding = encodings.get(font);
            }
            "Td" | "TD" => {
                // A purely horizontal move stays on the same line
                if op.operands.get(1).and_then(|ty| ty.as_float().ok()) != Some(0.0) {
                    new_line(&mut text);
                }
            }
            "Tm" => {
                let y = op.operands.get(5).and_then(|f| f.as_float().ok());
                if y != line_y {
                    new_line(&mut text);
                    line_y = y;
                }
            }
            "T*" | "ET" => new_line(&mut text),
            "Tj" | "TJ" => show_text(&mut text, encoding, &op.operands)?,
            "'" => {
                new_line(&mut text);
                show_text(&mut text, encoding, &op.operands)?;
            }
            "\"" => {
                new_line(&mut text);
                show_text(&mut text, encoding, op.operands.get(2..).unwrap_or_default())?;
            }
            _ => {}
        }
    }

    Ok(text)
}

fn new_line(text: &mut String) {
    if !text.is_empty() && !text.ends_with('\n') {
        text.push('\n');
    }
}

fn show_text(
    text: &mut String,
    encoding: Option<&Encoding>,
    operands: &[Object],
) -> lopdf::Result<()> {
    let Some(encoding) = encoding else {
        tracing::debug!("Text shown before any font was selected");
        return Ok(());
    };
    for operand in operands {
        match operand {
            Object::String(bytes, _) => text.push_str(&Document::decode_text(encoding, bytes)?),
            Object::Array(items) => show_text(text, Some(encoding), items)?,
            // Large negative kerning in a TJ array separates words
            Object::Integer(i) if *i < -100 => text.push(' '),
            Object::Real(r) if *r < -100.0 => text.push(' '),
            _ => {}
        }
    }
    Ok(())
}
