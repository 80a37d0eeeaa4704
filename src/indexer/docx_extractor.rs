use super::cleaner::normalize_whitespace;
use super::ooxml::{WORDPROCESSING_NS, malformed, open_archive, read_entry};
use crate::error::ExtractionError;
use quick_xml::NsReader;
use quick_xml::events::Event;
use quick_xml::name::{Namespace, ResolveResult};
use std::path::Path;

const DOCUMENT_ENTRY: &str = "word/document.xml";

/// Extract the body text of a Word document.
///
/// Every `w:t` run in `word/document.xml` is collected, the runs are joined with
/// spaces and all whitespace is collapsed.
pub fn extract_docx_text(path: &Path) -> Result<String, ExtractionError> {
    let mut archive = open_archive(path)?;
    let xml = read_entry(&mut archive, path, DOCUMENT_ENTRY)?;
    let runs = collect_text_runs(&xml).map_err(|e| malformed(path, DOCUMENT_ENTRY, e))?;
    Ok(normalize_whitespace(&runs.join(" ")))
}

fn is_text_run(ns: &ResolveResult, local_name: &[u8]) -> bool {
    local_name == b"t" && matches!(ns, ResolveResult::Bound(Namespace(uri)) if *uri == WORDPROCESSING_NS)
}

/// Text of each non-empty `w:t` element, in document order
fn collect_text_runs(xml: &str) -> Result<Vec<String>, quick_xml::Error> {
    let mut reader = NsReader::from_str(xml);
    let mut runs = Vec::new();
    let mut current: Option<String> = None;

    loop {
        match reader.read_resolved_event()? {
            (ns, Event::Start(e)) if is_text_run(&ns, e.local_name().as_ref()) => {
                current = Some(String::new());
            }
            (_, Event::Text(e)) => {
                if let Some(buf) = current.as_mut() {
                    buf.push_str(&e.unescape()?);
                }
            }
            (_, Event::CData(e)) => {
                if let Some(buf) = current.as_mut() {
                    buf.push_str(&String::from_utf8_lossy(&e));
                }
            }
            (ns, Event::End(e)) if is_text_run(&ns, e.local_name().as_ref()) => {
                if let Some(text) = current.take()
                    && !text.is_empty()
                {
                    runs.push(text);
                }
            }
            (_, Event::Eof) => break,
            _ => {}
        }
    }

    Ok(runs)
}
