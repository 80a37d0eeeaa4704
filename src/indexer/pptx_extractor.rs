use super::ooxml::{DRAWING_NS, PRESENTATION_NS, malformed, open_archive, read_entry};
use crate::error::ExtractionError;
use quick_xml::events::{BytesStart, Event};
use quick_xml::name::{Namespace, QName, ResolveResult};
use quick_xml::{NsReader, Reader};
use std::collections::HashMap;
use std::fs::File;
use std::path::Path;
use zip::ZipArchive;

const SLIDE_PREFIX: &str = "ppt/slides/slide";
const PRESENTATION_ENTRY: &str = "ppt/presentation.xml";
const PRESENTATION_RELS_ENTRY: &str = "ppt/_rels/presentation.xml.rels";

/// Extract the text of every text-bearing shape across all slides.
///
/// Slides are read in presentation order. Each top-level shape contributes one
/// entry: its paragraphs joined with newlines. Entries are joined with newlines.
pub fn extract_pptx_text(path: &Path) -> Result<String, ExtractionError> {
    let mut archive = open_archive(path)?;

    let mut shapes = Vec::new();
    for entry in slide_entries(&mut archive, path)? {
        let xml = read_entry(&mut archive, path, &entry)?;
        let slide_shapes = collect_shape_texts(&xml).map_err(|e| malformed(path, &entry, e))?;
        shapes.extend(slide_shapes);
    }

    Ok(shapes.join("\n"))
}

/// Slide entries in the order of `p:sldIdLst`.
///
/// Decks without a slide list (or without its relationships part) fall back to
/// the numeric order of the `slideN.xml` entries.
fn slide_entries(
    archive: &mut ZipArchive<File>,
    path: &Path,
) -> Result<Vec<String>, ExtractionError> {
    if archive.index_for_name(PRESENTATION_ENTRY).is_some()
        && archive.index_for_name(PRESENTATION_RELS_ENTRY).is_some()
    {
        let xml = read_entry(archive, path, PRESENTATION_ENTRY)?;
        let ids =
            slide_relationship_ids(&xml).map_err(|e| malformed(path, PRESENTATION_ENTRY, e))?;

        if !ids.is_empty() {
            let rels = read_entry(archive, path, PRESENTATION_RELS_ENTRY)?;
            let targets = relationship_targets(&rels)
                .map_err(|e| malformed(path, PRESENTATION_RELS_ENTRY, e))?;

            return ids
                .iter()
                .map(|id| {
                    targets
                        .get(id)
                        .map(|target| resolve_part("ppt", target))
                        .ok_or_else(|| ExtractionError::MissingEntry {
                            file: path.display().to_string(),
                            entry: format!("{} ({})", PRESENTATION_RELS_ENTRY, id),
                        })
                })
                .collect();
        }
    }

    let mut slides: Vec<(u32, String)> = archive
        .file_names()
        .filter_map(|name| slide_number(name).map(|n| (n, name.to_string())))
        .collect();
    slides.sort();
    Ok(slides.into_iter().map(|(_, name)| name).collect())
}

/// `r:id` of each `p:sldId`, in list order
fn slide_relationship_ids(xml: &str) -> Result<Vec<String>, quick_xml::Error> {
    let mut reader = NsReader::from_str(xml);
    let mut ids = Vec::new();

    loop {
        match reader.read_resolved_event()? {
            (ns, Event::Start(e)) | (ns, Event::Empty(e))
                if is(&ns, PRESENTATION_NS, e.local_name().as_ref(), b"sldId") =>
            {
                // The bare `id` is numeric; the prefixed one names the relationship
                let relationship_id = attribute(&e, |key| {
                    key.local_name().as_ref() == b"id" && key.prefix().is_some()
                })?;
                if let Some(id) = relationship_id {
                    ids.push(id);
                }
            }
            (_, Event::Eof) => break,
            _ => {}
        }
    }

    Ok(ids)
}

/// Relationship id -> target, from a `.rels` part
fn relationship_targets(xml: &str) -> Result<HashMap<String, String>, quick_xml::Error> {
    let mut reader = Reader::from_str(xml);
    let mut targets = HashMap::new();

    loop {
        match reader.read_event()? {
            Event::Start(e) | Event::Empty(e) if e.local_name().as_ref() == b"Relationship" => {
                let id = attribute(&e, |key| key.as_ref() == b"Id")?;
                let target = attribute(&e, |key| key.as_ref() == b"Target")?;
                if let (Some(id), Some(target)) = (id, target) {
                    targets.insert(id, target);
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(targets)
}

fn attribute(
    element: &BytesStart<'_>,
    matches: impl Fn(QName<'_>) -> bool,
) -> Result<Option<String>, quick_xml::Error> {
    for attr in element.attributes() {
        let attr = attr?;
        if matches(attr.key) {
            return Ok(Some(attr.unescape_value()?.into_owned()));
        }
    }
    Ok(None)
}

/// Resolve a relationship target against the directory of its source part.
///
/// `("ppt", "slides/slide1.xml")` -> `ppt/slides/slide1.xml`
fn resolve_part(base_dir: &str, target: &str) -> String {
    let mut segments: Vec<&str> = match target.strip_prefix('/') {
        Some(_) => Vec::new(),
        None => base_dir.split('/').filter(|s| !s.is_empty()).collect(),
    };
    for segment in target.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }
    segments.join("/")
}

/// `ppt/slides/slide12.xml` -> 12
fn slide_number(entry: &str) -> Option<u32> {
    entry
        .strip_prefix(SLIDE_PREFIX)?
        .strip_suffix(".xml")?
        .parse()
        .ok()
}

fn is(ns: &ResolveResult, expected_ns: &[u8], local_name: &[u8], expected: &[u8]) -> bool {
    local_name == expected
        && matches!(ns, ResolveResult::Bound(Namespace(uri)) if *uri == expected_ns)
}

/// State for the shape currently being read
#[derive(Default)]
struct ShapeText {
    paragraphs: Vec<String>,
    paragraph: Option<String>,
    in_run_text: bool,
}

impl ShapeText {
    fn finish(self) -> String {
        self.paragraphs.join("\n")
    }
}

/// Text of each top-level `p:sp` shape on one slide that has any.
///
/// Shapes inside a `p:grpSp` group are skipped.
fn collect_shape_texts(xml: &str) -> Result<Vec<String>, quick_xml::Error> {
    let mut reader = NsReader::from_str(xml);
    let mut shapes = Vec::new();
    let mut shape: Option<ShapeText> = None;
    let mut group_depth = 0usize;

    loop {
        match reader.read_resolved_event()? {
            (ns, Event::Start(e)) => {
                let name = e.local_name();
                let name = name.as_ref();
                if is(&ns, PRESENTATION_NS, name, b"grpSp") {
                    group_depth += 1;
                } else if is(&ns, PRESENTATION_NS, name, b"sp") {
                    if group_depth == 0 {
                        shape = Some(ShapeText::default());
                    }
                } else if let Some(s) = shape.as_mut() {
                    if is(&ns, DRAWING_NS, name, b"p") {
                        s.paragraph = Some(String::new());
                    } else if is(&ns, DRAWING_NS, name, b"t") {
                        s.in_run_text = true;
                    }
                }
            }
            (ns, Event::Empty(e)) => {
                if let Some(s) = shape.as_mut() {
                    let name = e.local_name();
                    let name = name.as_ref();
                    if is(&ns, DRAWING_NS, name, b"br") {
                        if let Some(p) = s.paragraph.as_mut() {
                            p.push('\n');
                        }
                    } else if is(&ns, DRAWING_NS, name, b"p") {
                        s.paragraphs.push(String::new());
                    }
                }
            }
            (_, Event::Text(e)) => {
                if let Some(s) = shape.as_mut()
                    && s.in_run_text
                    && let Some(p) = s.paragraph.as_mut()
                {
                    p.push_str(&e.unescape()?);
                }
            }
            (ns, Event::End(e)) => {
                let name = e.local_name();
                let name = name.as_ref();
                if is(&ns, PRESENTATION_NS, name, b"grpSp") {
                    group_depth = group_depth.saturating_sub(1);
                } else if is(&ns, PRESENTATION_NS, name, b"sp") {
                    if let Some(s) = shape.take() {
                        let text = s.finish();
                        if !text.trim().is_empty() {
                            shapes.push(text);
                        }
                    }
                } else if let Some(s) = shape.as_mut() {
                    if is(&ns, DRAWING_NS, name, b"t") {
                        s.in_run_text = false;
                    } else if is(&ns, DRAWING_NS, name, b"p")
                        && let Some(p) = s.paragraph.take()
                    {
                        s.paragraphs.push(p);
                    }
                }
            }
            (_, Event::Eof) => break,
            _ => {}
        }
    }

    Ok(shapes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;
    use zip::write::SimpleFileOptions;

    fn slide(shapes: &str) -> String {
        format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<p:sld xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main"
       xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main">
  <p:cSld><p:spTree>{}</p:spTree></p:cSld>
</p:sld>"#,
            shapes
        )
    }

    fn text_shape(paragraphs: &[&str]) -> String {
        let body: String = paragraphs
            .iter()
            .map(|p| format!("<a:p><a:r><a:rPr lang=\"en-US\"/><a:t>{}</a:t></a:r></a:p>", p))
            .collect();
        format!(
            "<p:sp><p:nvSpPr><p:cNvPr id=\"2\" name=\"Title\"/></p:nvSpPr><p:txBody><a:bodyPr/>{}</p:txBody></p:sp>",
            body
        )
    }

    fn write_pptx(dir: &Path, slides: &[(&str, String)]) -> std::path::PathBuf {
        let path = dir.join("deck.pptx");
        let file = std::fs::File::create(&path).unwrap();
        let mut zip = zip::ZipWriter::new(file);
        let options = SimpleFileOptions::default();
        zip.start_file("ppt/presentation.xml", options).unwrap();
        zip.write_all(b"<p:presentation/>").unwrap();
        for (name, xml) in slides {
            zip.start_file(*name, options).unwrap();
            zip.write_all(xml.as_bytes()).unwrap();
        }
        zip.finish().unwrap();
        path
    }

    #[test]
    fn test_slide_number() {
        assert_eq!(slide_number("ppt/slides/slide1.xml"), Some(1));
        assert_eq!(slide_number("ppt/slides/slide12.xml"), Some(12));
        assert_eq!(slide_number("ppt/slides/_rels/slide1.xml.rels"), None);
        assert_eq!(slide_number("ppt/slideLayouts/slideLayout1.xml"), None);
    }

    #[test]
    fn test_collect_shape_texts() {
        let xml = slide(&format!(
            "{}{}<p:pic><p:nvPicPr><p:cNvPr id=\"4\" name=\"Picture\"/></p:nvPicPr></p:pic>{}",
            text_shape(&["Crane Signals", "Hand signals &amp; radios"]),
            "<p:sp><p:nvSpPr><p:cNvPr id=\"3\" name=\"Box\"/></p:nvSpPr><p:spPr/></p:sp>",
            text_shape(&["Stop"]),
        ));
        let shapes = collect_shape_texts(&xml).unwrap();
        assert_eq!(
            shapes,
            vec!["Crane Signals\nHand signals & radios".to_string(), "Stop".to_string()]
        );
    }

    #[test]
    fn test_line_break_and_multiple_runs() {
        let xml = slide(
            "<p:sp><p:txBody><a:p><a:r><a:t>Load</a:t></a:r><a:r><a:t> chart</a:t></a:r><a:br/><a:r><a:t>limits</a:t></a:r></a:p></p:txBody></p:sp>",
        );
        assert_eq!(collect_shape_texts(&xml).unwrap(), vec!["Load chart\nlimits"]);
    }

    #[test]
    fn test_table_text_is_not_a_shape() {
        let xml = slide(
            "<p:graphicFrame><a:graphic><a:graphicData><a:tbl><a:tr><a:tc><a:txBody><a:p><a:r><a:t>cell</a:t></a:r></a:p></a:txBody></a:tc></a:tr></a:tbl></a:graphicData></a:graphic></p:graphicFrame>",
        );
        assert!(collect_shape_texts(&xml).unwrap().is_empty());
    }

    /// `presentation.xml` plus its relationships, listing slides in `order`
    fn presentation_parts(order: &[&str]) -> Vec<(&'static str, String)> {
        let ids: String = order
            .iter()
            .enumerate()
            .map(|(i, rid)| format!("<p:sldId id=\"{}\" r:id=\"{}\"/>", 256 + i, rid))
            .collect();
        let presentation = format!(
            r#"<p:presentation xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><p:sldIdLst>{}</p:sldIdLst></p:presentation>"#,
            ids
        );
        let rels = r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
  <Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/slideMaster" Target="slideMasters/slideMaster1.xml"/>
  <Relationship Id="rId2" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/slide" Target="slides/slide1.xml"/>
  <Relationship Id="rId3" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/slide" Target="slides/slide2.xml"/>
  <Relationship Id="rId4" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/slide" Target="/ppt/slides/slide3.xml"/>
</Relationships>"#;
        vec![
            ("ppt/presentation.xml", presentation),
            ("ppt/_rels/presentation.xml.rels", rels.to_string()),
        ]
    }

    fn write_deck(dir: &Path, entries: Vec<(&str, String)>) -> std::path::PathBuf {
        let path = dir.join("ordered.pptx");
        let mut zip = zip::ZipWriter::new(std::fs::File::create(&path).unwrap());
        for (name, xml) in entries {
            zip.start_file(name, SimpleFileOptions::default()).unwrap();
            zip.write_all(xml.as_bytes()).unwrap();
        }
        zip.finish().unwrap();
        path
    }

    #[test]
    fn test_resolve_part() {
        assert_eq!(resolve_part("ppt", "slides/slide1.xml"), "ppt/slides/slide1.xml");
        assert_eq!(resolve_part("ppt", "/ppt/slides/slide3.xml"), "ppt/slides/slide3.xml");
        assert_eq!(resolve_part("ppt/slides", "../media/image1.png"), "ppt/media/image1.png");
    }

    #[test]
    fn test_slides_follow_presentation_order() {
        let temp_dir = TempDir::new().unwrap();
        let mut entries = presentation_parts(&["rId4", "rId2", "rId3"]);
        entries.push(("ppt/slides/slide1.xml", slide(&text_shape(&["Hazards"]))));
        entries.push(("ppt/slides/slide2.xml", slide(&text_shape(&["Controls"]))));
        entries.push(("ppt/slides/slide3.xml", slide(&text_shape(&["Agenda"]))));
        let path = write_deck(temp_dir.path(), entries);

        assert_eq!(extract_pptx_text(&path).unwrap(), "Agenda\nHazards\nControls");
    }

    #[test]
    fn test_slides_missing_from_list_are_not_read() {
        let temp_dir = TempDir::new().unwrap();
        let mut entries = presentation_parts(&["rId3"]);
        entries.push(("ppt/slides/slide1.xml", slide(&text_shape(&["Removed"]))));
        entries.push(("ppt/slides/slide2.xml", slide(&text_shape(&["Kept"]))));
        let path = write_deck(temp_dir.path(), entries);

        assert_eq!(extract_pptx_text(&path).unwrap(), "Kept");
    }

    #[test]
    fn test_unknown_slide_relationship_is_error() {
        let temp_dir = TempDir::new().unwrap();
        let mut entries = presentation_parts(&["rId9"]);
        entries.push(("ppt/slides/slide1.xml", slide(&text_shape(&["One"]))));
        let path = write_deck(temp_dir.path(), entries);

        assert!(matches!(
            extract_pptx_text(&path),
            Err(ExtractionError::MissingEntry { .. })
        ));
    }

    #[test]
    fn test_grouped_shapes_are_skipped() {
        let xml = slide(&format!(
            "{}<p:grpSp><p:nvGrpSpPr><p:cNvPr id=\"5\" name=\"Group\"/></p:nvGrpSpPr>{}</p:grpSp>{}",
            text_shape(&["Before"]),
            text_shape(&["Inside group"]),
            text_shape(&["After"]),
        ));
        assert_eq!(collect_shape_texts(&xml).unwrap(), vec!["Before", "After"]);
    }

    #[test]
    fn test_without_slide_list_orders_slides_numerically() {
        let temp_dir = TempDir::new().unwrap();
        let path = write_pptx(
            temp_dir.path(),
            &[
                ("ppt/slides/slide10.xml", slide(&text_shape(&["Ten"]))),
                ("ppt/slides/slide2.xml", slide(&text_shape(&["Two"]))),
                ("ppt/slides/slide1.xml", slide(&text_shape(&["One", "Uno"]))),
            ],
        );
        let text = extract_pptx_text(&path).unwrap();
        assert_eq!(text, "One\nUno\nTwo\nTen");
    }

    #[test]
    fn test_presentation_without_slides() {
        let temp_dir = TempDir::new().unwrap();
        let path = write_pptx(temp_dir.path(), &[]);
        assert_eq!(extract_pptx_text(&path).unwrap(), "");
    }
}
