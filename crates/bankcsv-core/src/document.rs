//! Statement document ingestion
//!
//! A statement arrives as one of:
//! - a text-layer JSON export (`{"pages":[{"items":[{"text","x","y"}]}]}`)
//! - plain text, with form feeds separating pages
//! - a PDF, whose text is extracted with `pdf-extract` (feature `pdf`)

use serde::Deserialize;
use sha2::{Digest, Sha256};
use std::path::Path;
use tracing::debug;

use crate::error::{Error, Result};
use crate::layout::{flatten_page, reconstruct_pages};
use crate::models::TextPage;

/// Default size limit for statement documents (10 MiB)
pub const DEFAULT_MAX_DOCUMENT_BYTES: usize = 10 * 1024 * 1024;

/// Input format of a statement document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    TextLayer,
    PlainText,
    Pdf,
}

impl DocumentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TextLayer => "text_layer",
            Self::PlainText => "plain_text",
            Self::Pdf => "pdf",
        }
    }

    /// Kind implied by a file extension
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "pdf" => Some(Self::Pdf),
            "json" => Some(Self::TextLayer),
            "txt" | "text" => Some(Self::PlainText),
            _ => None,
        }
    }

    /// Kind implied by the leading bytes
    pub fn sniff(bytes: &[u8]) -> Option<Self> {
        if bytes.starts_with(b"%PDF-") {
            return Some(Self::Pdf);
        }
        let text = std::str::from_utf8(bytes).ok()?;
        if text.contains('\0') {
            return None;
        }
        if text.trim_start().starts_with('{') {
            Some(Self::TextLayer)
        } else {
            Some(Self::PlainText)
        }
    }

    /// Detect from the file name first, then from content
    pub fn detect(filename: Option<&str>, bytes: &[u8]) -> Option<Self> {
        filename
            .and_then(|name| Path::new(name).extension())
            .and_then(|ext| ext.to_str())
            .and_then(Self::from_extension)
            .or_else(|| Self::sniff(bytes))
    }
}

impl std::fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum TextLayerInput {
    Document { pages: Vec<TextPage> },
    Pages(Vec<TextPage>),
}

/// A statement ready for transaction extraction
#[derive(Debug, Clone)]
pub enum StatementDocument {
    /// Positioned fragments per page
    TextLayer { pages: Vec<TextPage> },
    /// Already-flattened text per page
    Text { pages: Vec<String> },
}

/// Check size and format before any parsing
pub fn validate(filename: Option<&str>, bytes: &[u8], max_bytes: usize) -> Result<DocumentKind> {
    if bytes.len() > max_bytes {
        return Err(Error::FileTooLarge {
            size: bytes.len(),
            max: max_bytes,
        });
    }
    if bytes.iter().all(|b| b.is_ascii_whitespace()) {
        return Err(Error::EmptyDocument);
    }
    DocumentKind::detect(filename, bytes)
        .ok_or_else(|| Error::UnsupportedFormat(filename.unwrap_or("upload").to_string()))
}

/// Content-addressed id for an uploaded statement: the first 16 hex
/// characters of its SHA-256
pub fn content_id(bytes: &[u8]) -> String {
    let digest = Sha256::digest(bytes);
    hex::encode(&digest[..8])
}

impl StatementDocument {
    /// Plain text; form feeds split pages
    pub fn from_text(text: &str) -> Self {
        let pages = text.split('\u{000C}').map(|p| p.to_string()).collect();
        Self::Text { pages }
    }

    /// Text-layer JSON export
    pub fn from_text_layer_json(bytes: &[u8]) -> Result<Self> {
        let input: TextLayerInput = serde_json::from_slice(bytes)?;
        let mut pages = match input {
            TextLayerInput::Document { pages } => pages,
            TextLayerInput::Pages(pages) => pages,
        };
        for (index, page) in pages.iter_mut().enumerate() {
            if page.number == 0 {
                page.number = index as u32 + 1;
            }
        }
        Ok(Self::TextLayer { pages })
    }

    /// Text extracted from a PDF
    #[cfg(feature = "pdf")]
    pub fn from_pdf_bytes(bytes: &[u8]) -> Result<Self> {
        let text =
            pdf_extract::extract_text_from_mem(bytes).map_err(|e| Error::Pdf(e.to_string()))?;
        debug!("Extracted {} characters of PDF text", text.len());
        Ok(Self::from_text(&text))
    }

    #[cfg(not(feature = "pdf"))]
    pub fn from_pdf_bytes(_bytes: &[u8]) -> Result<Self> {
        Err(Error::UnsupportedFormat(
            "PDF input (built without the `pdf` feature)".into(),
        ))
    }

    /// Validate and parse raw upload bytes
    pub fn from_bytes(bytes: &[u8], filename: Option<&str>, max_bytes: usize) -> Result<Self> {
        let kind = validate(filename, bytes, max_bytes)?;
        debug!("Reading {} bytes as {}", bytes.len(), kind);

        match kind {
            DocumentKind::TextLayer => Self::from_text_layer_json(bytes),
            DocumentKind::Pdf => Self::from_pdf_bytes(bytes),
            DocumentKind::PlainText => {
                let text = std::str::from_utf8(bytes)
                    .map_err(|_| Error::UnsupportedFormat("text is not valid UTF-8".into()))?;
                Ok(Self::from_text(text))
            }
        }
    }

    /// Read a statement file from disk
    pub fn load(path: &Path, max_bytes: usize) -> Result<Self> {
        let bytes = std::fs::read(path)?;
        let name = path.file_name().and_then(|n| n.to_str());
        Self::from_bytes(&bytes, name, max_bytes)
    }

    pub fn page_count(&self) -> usize {
        match self {
            Self::TextLayer { pages } => pages.len(),
            Self::Text { pages } => pages.len(),
        }
    }

    /// True when no page carries any non-whitespace text
    pub fn is_blank(&self) -> bool {
        match self {
            Self::TextLayer { pages } => pages
                .iter()
                .all(|p| p.fragments.iter().all(|f| f.text.trim().is_empty())),
            Self::Text { pages } => pages.iter().all(|p| p.trim().is_empty()),
        }
    }

    /// Text of the first page, used for bank detection
    pub fn first_page_text(&self) -> String {
        match self {
            Self::TextLayer { pages } => pages.first().map(flatten_page).unwrap_or_default(),
            Self::Text { pages } => pages.first().cloned().unwrap_or_default(),
        }
    }

    /// Logical lines in reading order across all pages
    ///
    /// Positioned fragments go through line reconstruction; flattened text
    /// keeps its own line breaks.
    pub fn lines(&self, tolerance: f64) -> Vec<String> {
        match self {
            Self::TextLayer { pages } => reconstruct_pages(pages, tolerance),
            Self::Text { pages } => pages
                .iter()
                .flat_map(|page| page.lines())
                .map(|line| line.trim())
                .filter(|line| !line.is_empty())
                .map(|line| line.to_string())
                .collect(),
        }
    }

    /// All text as one whitespace-collapsed string, pages in order
    pub fn flattened_text(&self) -> String {
        let joined = match self {
            Self::TextLayer { pages } => pages
                .iter()
                .map(flatten_page)
                .collect::<Vec<_>>()
                .join(" "),
            Self::Text { pages } => pages.join(" "),
        };
        joined.split_whitespace().collect::<Vec<_>>().join(" ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_kind() {
        assert_eq!(DocumentKind::detect(Some("s.PDF"), b""), Some(DocumentKind::Pdf));
        assert_eq!(DocumentKind::detect(Some("s.json"), b"x"), Some(DocumentKind::TextLayer));
        assert_eq!(DocumentKind::detect(None, b"%PDF-1.7 ..."), Some(DocumentKind::Pdf));
        assert_eq!(
            DocumentKind::detect(None, b"  {\"pages\": []}"),
            Some(DocumentKind::TextLayer)
        );
        assert_eq!(
            DocumentKind::detect(Some("statement.dat"), b"15-01-2024 Jumbo -3,00"),
            Some(DocumentKind::PlainText)
        );
        assert_eq!(DocumentKind::detect(Some("photo.png"), &[0x89, 0x50, 0x00, 0xff]), None);
    }

    #[test]
    fn test_validate_size_and_format() {
        let err = validate(Some("big.txt"), &[b'a'; 32], 16).unwrap_err();
        assert!(matches!(err, Error::FileTooLarge { size: 32, max: 16 }));

        let err = validate(Some("x.bin"), &[0x00, 0xff, 0xfe], 1024).unwrap_err();
        assert!(matches!(err, Error::UnsupportedFormat(_)));

        let err = validate(Some("blank.txt"), b"  \n ", 1024).unwrap_err();
        assert!(matches!(err, Error::EmptyDocument));
    }

    #[test]
    fn test_text_layer_json() {
        let json = br#"{"pages":[{"items":[
            {"text":"-45,32","x":400,"y":700},
            {"text":"15-01-2024","x":50,"y":700},
            {"text":"Albert Heijn","x":150,"y":701}
        ]}]}"#;

        let doc = StatementDocument::from_bytes(json, Some("statement.json"), 1024).unwrap();
        assert_eq!(doc.page_count(), 1);
        assert_eq!(doc.lines(5.0), vec!["15-01-2024 Albert Heijn -45,32"]);
        assert_eq!(doc.first_page_text(), "-45,32 15-01-2024 Albert Heijn");
        match doc {
            StatementDocument::TextLayer { pages } => assert_eq!(pages[0].number, 1),
            other => panic!("unexpected document: {:?}", other),
        }
    }

    #[test]
    fn test_bare_page_array() {
        let json = br#"[{"number":3,"fragments":[{"text":"a","x":0,"y":0}]}]"#;
        let doc = StatementDocument::from_text_layer_json(json).unwrap();
        assert_eq!(doc.flattened_text(), "a");
    }

    #[test]
    fn test_plain_text_pages_and_lines() {
        let doc = StatementDocument::from_text("ING Bank\n\n15-01-2024 Jumbo\u{000C}Page 2\n  last line  ");
        assert_eq!(doc.page_count(), 2);
        assert_eq!(doc.first_page_text(), "ING Bank\n\n15-01-2024 Jumbo");
        assert_eq!(
            doc.lines(5.0),
            vec!["ING Bank", "15-01-2024 Jumbo", "Page 2", "last line"]
        );
        assert_eq!(doc.flattened_text(), "ING Bank 15-01-2024 Jumbo Page 2 last line");
    }

    #[test]
    fn test_is_blank() {
        assert!(StatementDocument::from_text(" \n\u{000C} ").is_blank());
        assert!(!StatementDocument::from_text("x").is_blank());
    }

    #[test]
    fn test_content_id() {
        let id = content_id(b"statement");
        assert_eq!(id.len(), 16);
        assert!(id.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(id, content_id(b"statement"));
        assert_ne!(id, content_id(b"statement 2"));
    }

    #[test]
    fn test_load_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("statement.txt");
        std::fs::write(&path, "15-01-2024 Albert Heijn -45,32\n").unwrap();

        let doc = StatementDocument::load(&path, DEFAULT_MAX_DOCUMENT_BYTES).unwrap();
        assert_eq!(doc.lines(5.0), vec!["15-01-2024 Albert Heijn -45,32"]);
    }
}
