//! PDF metadata management.
//!
//! This module handles the output document's Info dictionary:
//! - Title, Author, Subject, Keywords
//! - Creator, Producer
//! - Creation and modification dates

use chrono::{DateTime, Utc};
use lopdf::{Dictionary, Document, Object, StringFormat};

use crate::config::Metadata;

/// Name written as Creator and Producer.
pub const PRODUCER: &str = "pdfcombine";

/// Manager for PDF metadata.
#[derive(Debug, Clone, Default)]
pub struct MetadataManager;

impl MetadataManager {
    /// Create a new metadata manager.
    pub fn new() -> Self {
        Self
    }

    /// Write a fresh Info dictionary to `doc`.
    ///
    /// Producer, Creator and the dates are always set; the descriptive
    /// fields only when present in `metadata`.
    ///
    /// # Examples
    ///
    /// ```
    /// # use pdfcombine::merge::metadata::MetadataManager;
    /// # use pdfcombine::config::Metadata;
    /// # use lopdf::Document;
    /// let mut doc = Document::with_version("1.5");
    /// let manager = MetadataManager::new();
    /// let metadata = Metadata::new(Some("Site pack".to_string()), None, None, None);
    /// manager.set_metadata(&mut doc, &metadata);
    ///
    /// assert_eq!(manager.get_metadata(&doc).title.as_deref(), Some("Site pack"));
    /// ```
    pub fn set_metadata(&self, doc: &mut Document, metadata: &Metadata) {
        self.set_metadata_at(doc, metadata, Utc::now());
    }

    fn set_metadata_at(&self, doc: &mut Document, metadata: &Metadata, now: DateTime<Utc>) {
        let mut info = Dictionary::new();

        let fields = [
            ("Title", &metadata.title),
            ("Author", &metadata.author),
            ("Subject", &metadata.subject),
            ("Keywords", &metadata.keywords),
        ];
        for (key, value) in fields {
            if let Some(value) = value {
                info.set(key, text_string(value));
            }
        }

        info.set("Creator", text_string(PRODUCER));
        info.set("Producer", text_string(PRODUCER));

        let date = format_pdf_date(now);
        info.set("CreationDate", text_string(&date));
        info.set("ModDate", text_string(&date));

        let info_id = doc.add_object(info);
        doc.trailer.set("Info", info_id);
    }

    /// Read the descriptive fields back from a document.
    pub fn get_metadata(&self, doc: &Document) -> Metadata {
        let Some(info) = info_dictionary(doc) else {
            return Metadata::default();
        };

        Metadata::new(
            read_text(info, b"Title"),
            read_text(info, b"Author"),
            read_text(info, b"Subject"),
            read_text(info, b"Keywords"),
        )
    }

    /// Read the Producer entry, if any.
    pub fn get_producer(&self, doc: &Document) -> Option<String> {
        info_dictionary(doc).and_then(|info| read_text(info, b"Producer"))
    }
}

fn info_dictionary(doc: &Document) -> Option<&Dictionary> {
    match doc.trailer.get(b"Info").ok()? {
        Object::Reference(id) => doc.get_dictionary(*id).ok(),
        Object::Dictionary(dict) => Some(dict),
        _ => None,
    }
}

/// Encode a text string: literal for ASCII, UTF-16BE with BOM otherwise.
fn text_string(value: &str) -> Object {
    if value.is_ascii() {
        Object::String(value.as_bytes().to_vec(), StringFormat::Literal)
    } else {
        let mut bytes = vec![0xFE, 0xFF];
        bytes.extend(value.encode_utf16().flat_map(u16::to_be_bytes));
        Object::String(bytes, StringFormat::Hexadecimal)
    }
}

fn read_text(dict: &Dictionary, key: &[u8]) -> Option<String> {
    let Ok(Object::String(bytes, _)) = dict.get(key) else {
        return None;
    };

    match bytes.strip_prefix(&[0xFE, 0xFF]) {
        Some(utf16) => {
            let units: Vec<u16> = utf16
                .chunks_exact(2)
                .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
                .collect();
            String::from_utf16(&units).ok()
        }
        None => String::from_utf8(bytes.clone()).ok(),
    }
}

/// Format a timestamp as a PDF date string (`D:YYYYMMDDHHmmSSZ`).
fn format_pdf_date(time: DateTime<Utc>) -> String {
    time.format("D:%Y%m%d%H%M%SZ").to_string()
}
