use quick_xml::events::Event;
use std::fs::File;
use std::io::{self, BufRead, BufReader, Read};
use std::path::Path;
use thiserror::Error;
use tracing::trace;

pub const MAX_PDF_PAGES: usize = 3;
pub const MAX_DOC_PARAGRAPHS: usize = 10;
pub const MAX_TEXT_LINES: usize = 10;

/// Upper bound on raw bytes read from a plain-text file, so a single huge
/// line cannot make sampling unbounded.
pub const MAX_TEXT_BYTES: u64 = 64 * 1024;

#[derive(Debug, Error)]
pub enum InspectError {
    #[error("failed to read file: {0}")]
    Io(#[from] io::Error),
    #[error("failed to parse PDF: {0}")]
    Pdf(String),
    #[error("failed to parse DOCX: {0}")]
    Docx(String),
    #[error("content is not valid UTF-8")]
    Decode,
}

/// Text pulled from the head of a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextSample {
    text: String,
    units: usize,
}

impl TextSample {
    pub fn new(text: impl Into<String>, units: usize) -> Self {
        Self {
            text: text.into(),
            units,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Pages, paragraphs or lines actually read.
    pub fn units(&self) -> usize {
        self.units
    }

    pub fn is_empty(&self) -> bool {
        self.text.trim().is_empty()
    }

    /// First of `keywords` found as a case-insensitive substring.
    pub fn first_match<'k>(&self, keywords: &[&'k str]) -> Option<&'k str> {
        let haystack = self.text.to_lowercase();
        keywords
            .iter()
            .copied()
            .find(|k| haystack.contains(k.to_lowercase().as_str()))
    }

    pub fn contains_any(&self, keywords: &[&str]) -> bool {
        self.first_match(keywords).is_some()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleKind {
    Pdf,
    Docx,
    PlainText,
}

impl SampleKind {
    /// `ext` is expected lowercase with its leading dot.
    pub fn for_extension(ext: &str) -> Option<Self> {
        match ext {
            ".pdf" => Some(Self::Pdf),
            ".docx" => Some(Self::Docx),
            ".txt" => Some(Self::PlainText),
            _ => None,
        }
    }

    pub fn sample(self, path: &Path) -> Result<TextSample, InspectError> {
        match self {
            Self::Pdf => sample_pdf(path, MAX_PDF_PAGES),
            Self::Docx => sample_docx(path, MAX_DOC_PARAGRAPHS),
            Self::PlainText => sample_text(path, MAX_TEXT_LINES),
        }
    }
}

pub fn sample_pdf(path: &Path, max_pages: usize) -> Result<TextSample, InspectError> {
    let doc = lopdf::Document::load(path).map_err(|e| InspectError::Pdf(e.to_string()))?;

    let pages: Vec<u32> = doc.get_pages().keys().copied().take(max_pages).collect();
    if pages.is_empty() {
        return Err(InspectError::Pdf("document has no pages".to_string()));
    }

    let text = doc
        .extract_text(&pages)
        .map_err(|e| InspectError::Pdf(e.to_string()))?;

    trace!(path = %path.display(), pages = pages.len(), "sampled pdf");
    Ok(TextSample::new(text, pages.len()))
}

pub fn sample_docx(path: &Path, max_paragraphs: usize) -> Result<TextSample, InspectError> {
    let file = File::open(path)?;
    let mut archive = zip::ZipArchive::new(BufReader::new(file))
        .map_err(|e| InspectError::Docx(e.to_string()))?;

    let document = archive
        .by_name("word/document.xml")
        .map_err(|e| InspectError::Docx(e.to_string()))?;

    let paragraphs = read_paragraphs(BufReader::new(document), max_paragraphs)?;

    trace!(path = %path.display(), paragraphs = paragraphs.len(), "sampled docx");
    Ok(TextSample::new(paragraphs.join("\n"), paragraphs.len()))
}

/// Collects the text of the first `max` paragraphs directly under
/// `w:body`. Paragraphs nested in tables, text boxes and other containers are
/// skipped. Runs inside a paragraph are concatenated; empty paragraphs count
/// toward the limit.
fn read_paragraphs<R: BufRead>(reader: R, max: usize) -> Result<Vec<String>, InspectError> {
    let mut xml = quick_xml::Reader::from_reader(reader);
    let mut buf = Vec::new();
    let mut paragraphs = Vec::new();
    let mut depth = 0usize;
    let mut body_depth: Option<usize> = None;
    let mut current: Option<String> = None;
    // Paragraphs open inside the current body paragraph, e.g. in a text box.
    let mut nested = 0usize;
    let mut in_text = false;

    while paragraphs.len() < max {
        match xml
            .read_event_into(&mut buf)
            .map_err(|e| InspectError::Docx(e.to_string()))?
        {
            Event::Start(e) => {
                depth += 1;
                match e.local_name().as_ref() {
                    b"body" if body_depth.is_none() => body_depth = Some(depth),
                    b"p" if current.is_some() => nested += 1,
                    b"p" if body_depth == Some(depth - 1) => current = Some(String::new()),
                    b"t" => in_text = true,
                    _ => {}
                }
            }
            Event::Empty(e) => match e.local_name().as_ref() {
                b"p" if current.is_none() && body_depth == Some(depth) => {
                    paragraphs.push(String::new())
                }
                b"tab" if nested == 0 => {
                    if let Some(p) = current.as_mut() {
                        p.push('\t');
                    }
                }
                _ => {}
            },
            Event::Text(t) if in_text && nested == 0 => {
                let text = t
                    .unescape()
                    .map_err(|e| InspectError::Docx(e.to_string()))?;
                if let Some(p) = current.as_mut() {
                    p.push_str(&text);
                }
            }
            Event::End(e) => {
                match e.local_name().as_ref() {
                    b"t" => in_text = false,
                    b"p" if nested > 0 => nested -= 1,
                    b"p" => {
                        if let Some(p) = current.take() {
                            paragraphs.push(p);
                        }
                    }
                    b"body" => body_depth = None,
                    _ => {}
                }
                depth = depth.saturating_sub(1);
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(paragraphs)
}

/// Reads up to `max_lines` UTF-8 lines. A shorter file is not an error.
///
/// At most [`MAX_TEXT_BYTES`] are read. A character cut in half by that cap
/// is dropped.
pub fn sample_text(path: &Path, max_lines: usize) -> Result<TextSample, InspectError> {
    let file = File::open(path)?;
    let mut reader = BufReader::new(file.take(MAX_TEXT_BYTES));
    let mut lines = Vec::new();
    let mut buf = Vec::new();

    while lines.len() < max_lines {
        buf.clear();
        if reader.read_until(b'\n', &mut buf)? == 0 {
            break;
        }

        let terminated = buf.last() == Some(&b'\n');
        if terminated {
            buf.pop();
            if buf.last() == Some(&b'\r') {
                buf.pop();
            }
        }

        let capped = !terminated && reader.get_ref().limit() == 0;
        match std::str::from_utf8(&buf) {
            Ok(line) => lines.push(line.to_string()),
            Err(e) if capped && e.error_len().is_none() => {
                let valid = &buf[..e.valid_up_to()];
                lines.push(String::from_utf8_lossy(valid).into_owned());
                break;
            }
            Err(_) => return Err(InspectError::Decode),
        }
    }

    Ok(TextSample::new(lines.join("\n"), lines.len()))
}
