//! Page-ordered PDF text extraction
//!
//! Extraction keeps the (page number, text) pairing the semantic chunker
//! needs for metadata. An unreadable document is fatal; a page that yields
//! no text is logged and skipped.

use crate::error::{RadchunkError, Result};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;
use unicode_normalization::UnicodeNormalization;

/// One page of extracted text
#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    /// 1-based page number
    pub number: u32,
    /// Extracted text, NFC-normalized
    pub text: String,
}

/// Extract text from every page of a PDF, in page order.
pub fn extract_pages<P: AsRef<Path>>(path: P) -> Result<Vec<Page>> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(RadchunkError::Pdf(format!(
            "PDF file not found: {}",
            path.display()
        )));
    }

    let document = lopdf::Document::load(path)?;
    let page_numbers: Vec<u32> = document.get_pages().keys().copied().collect();

    let progress = ProgressBar::new(page_numbers.len() as u64);
    progress.set_style(
        ProgressStyle::with_template("   extracting pages [{bar:30}] {pos}/{len}")
            .unwrap_or_else(|_| ProgressStyle::default_bar()),
    );

    let mut pages = Vec::with_capacity(page_numbers.len());
    for number in page_numbers {
        progress.inc(1);

        let text = match document.extract_text(&[number]) {
            Ok(text) => text,
            Err(e) => {
                log::warn!("Skipping page {} of {}: {}", number, path.display(), e);
                continue;
            }
        };

        let text = normalize_page_text(&text);
        if text.trim().is_empty() {
            log::warn!("Page {} of {} yielded no text", number, path.display());
            continue;
        }

        pages.push(Page { number, text });
    }
    progress.finish_and_clear();

    if pages.is_empty() {
        return Err(RadchunkError::Pdf(format!(
            "no extractable text in {}",
            path.display()
        )));
    }

    log::info!("Extracted {} pages from {}", pages.len(), path.display());
    Ok(pages)
}

/// NFC-normalize and strip carriage returns from raw extracted text
fn normalize_page_text(text: &str) -> String {
    text.nfc().collect::<String>().replace('\r', "")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_pdf_is_fatal() {
        let result = extract_pages("/nonexistent/guidelines.pdf");
        assert!(matches!(result, Err(RadchunkError::Pdf(_))));
    }

    #[test]
    fn test_unreadable_pdf_is_fatal() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("corrupt.pdf");
        std::fs::write(&path, b"not a pdf at all").unwrap();

        let result = extract_pages(&path);
        assert!(result.is_err());
    }

    #[test]
    fn test_normalize_page_text() {
        assert_eq!(normalize_page_text("line one\r\nline two"), "line one\nline two");
        // NFC: combining acute accent folds into the precomposed character
        assert_eq!(normalize_page_text("e\u{0301}"), "\u{00e9}");
    }
}
