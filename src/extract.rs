//! Per-document text extraction for uploaded binary documents.
//!
//! Turns one uploaded byte stream into plain UTF-8 text. PDF bytes go
//! through `pdf-extract`; DOCX is unzipped and its `w:t` runs pulled out
//! with `quick-xml`; plain text and Markdown pass through as UTF-8.
//!
//! Extraction never panics on malformed input: any failure becomes
//! [`PipelineError::UnreadableDocument`] naming the offending document,
//! and the ingestion pipeline skips that document while the rest of the
//! batch continues.

use std::io::Read;
use std::path::Path;

use crate::error::PipelineError;

/// Maximum decompressed bytes read from a single ZIP entry (zip-bomb bound).
const MAX_XML_ENTRY_BYTES: u64 = 50 * 1024 * 1024;

/// One uploaded document: a display name plus raw byte content.
///
/// Ephemeral: owned by a single ingestion call and dropped afterwards.
#[derive(Debug, Clone)]
pub struct DocumentInput {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl DocumentInput {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            bytes,
        }
    }

    /// Read a document from disk, mapping I/O failures to
    /// [`PipelineError::UnreadableDocument`].
    pub fn from_path(path: &Path) -> Result<Self, PipelineError> {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        let bytes = std::fs::read(path).map_err(|e| PipelineError::UnreadableDocument {
            name: name.clone(),
            reason: e.to_string(),
        })?;
        Ok(Self { name, bytes })
    }
}

/// Capability that turns a document's bytes into plain text.
///
/// Modeled as a trait so the pipeline can run against deterministic fakes
/// in tests instead of real parsers.
pub trait TextExtractor: Send + Sync {
    fn extract(&self, doc: &DocumentInput) -> Result<String, PipelineError>;
}

/// Production extractor dispatching on the document's file extension.
pub struct FormatExtractor;

impl TextExtractor for FormatExtractor {
    fn extract(&self, doc: &DocumentInput) -> Result<String, PipelineError> {
        let unreadable = |reason: String| PipelineError::UnreadableDocument {
            name: doc.name.clone(),
            reason,
        };

        match extension_of(&doc.name).as_deref() {
            Some("pdf") => {
                pdf_extract::extract_text_from_mem(&doc.bytes).map_err(|e| unreadable(e.to_string()))
            }
            Some("docx") => extract_docx(&doc.bytes).map_err(unreadable),
            Some("txt") | Some("md") => String::from_utf8(doc.bytes.clone())
                .map_err(|e| unreadable(format!("not valid UTF-8: {}", e))),
            other => Err(unreadable(format!(
                "unsupported document type: {}",
                other.unwrap_or("<no extension>")
            ))),
        }
    }
}

fn extension_of(name: &str) -> Option<String> {
    Path::new(name)
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
}

fn extract_docx(bytes: &[u8]) -> Result<String, String> {
    let mut archive =
        zip::ZipArchive::new(std::io::Cursor::new(bytes)).map_err(|e| e.to_string())?;

    let mut doc_xml = Vec::new();
    {
        let entry = archive
            .by_name("word/document.xml")
            .map_err(|_| "word/document.xml not found".to_string())?;
        entry
            .take(MAX_XML_ENTRY_BYTES)
            .read_to_end(&mut doc_xml)
            .map_err(|e| e.to_string())?;
        if doc_xml.len() as u64 >= MAX_XML_ENTRY_BYTES {
            return Err("word/document.xml exceeds size limit".to_string());
        }
    }

    extract_w_t_elements(&doc_xml)
}

/// Collect the text of all `w:t` runs, joining paragraphs with newlines.
fn extract_w_t_elements(xml: &[u8]) -> Result<String, String> {
    let mut out = String::new();
    let mut reader = quick_xml::Reader::from_reader(xml);
    reader.config_mut().trim_text(true);
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(quick_xml::events::Event::Start(e)) => {
                if e.local_name().as_ref() == b"t" {
                    if let Ok(quick_xml::events::Event::Text(te)) = reader.read_event_into(&mut buf)
                    {
                        out.push_str(te.unescape().unwrap_or_default().as_ref());
                    }
                }
            }
            Ok(quick_xml::events::Event::End(e)) => {
                if e.local_name().as_ref() == b"p" && !out.is_empty() && !out.ends_with('\n') {
                    out.push('\n');
                }
            }
            Ok(quick_xml::events::Event::Eof) => break,
            Err(e) => return Err(e.to_string()),
            _ => {}
        }
        buf.clear();
    }
    Ok(out)
}
