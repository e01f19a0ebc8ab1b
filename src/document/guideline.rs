//! Guideline PDF processing (RECIST-style documents)
//!
//! Headers in response-evaluation guidelines come in three shapes: numbered
//! sections ("3.1 Target Lesions"), short ALL-CAPS lines, and a fixed set of
//! well-known section keywords. Everything else is body text.

use crate::chunk::{Chunk, Metadata, SourceType};
use crate::config::ChunkingConfig;
use crate::document::chunker::{HeaderClassifier, HeaderMatch, LeadingText, SemanticChunker};
use crate::document::pdf::{extract_pages, Page};
use crate::error::{RadchunkError, Result};
use regex::Regex;
use std::path::{Path, PathBuf};

/// Section keywords that are headers even as single words
const SECTION_KEYWORDS: &[&str] = &[
    "INTRODUCTION",
    "BACKGROUND",
    "METHODS",
    "ASSESSMENT",
    "MEASUREMENT",
    "TARGET LESIONS",
    "NON-TARGET LESIONS",
    "RESPONSE CRITERIA",
    "COMPLETE RESPONSE",
    "PARTIAL RESPONSE",
    "PROGRESSIVE DISEASE",
    "STABLE DISEASE",
];

/// Header rules for guideline documents
pub struct GuidelineHeaderClassifier {
    numbered: Regex,
}

impl GuidelineHeaderClassifier {
    pub fn new() -> Result<Self> {
        let numbered = Regex::new(r"^(\d+(?:\.\d+)*)\.?\s+[A-Z][A-Za-z]")
            .map_err(|e| RadchunkError::Chunking(format!("bad header regex: {}", e)))?;
        Ok(Self { numbered })
    }

    /// Level of a numbered heading: "3" is level 1, "3.1" level 2, capped at 3
    fn numbered_level(&self, line: &str) -> Option<u8> {
        let captures = self.numbered.captures(line)?;
        if line.ends_with('.') && line.len() >= 80 {
            return None;
        }
        let components = captures[1].split('.').count();
        Some(components.min(3) as u8)
    }
}

impl HeaderClassifier for GuidelineHeaderClassifier {
    fn classify(&self, line: &str) -> Option<HeaderMatch> {
        if let Some(level) = self.numbered_level(line) {
            return Some(HeaderMatch { level });
        }

        if is_all_caps_header(line) {
            return Some(HeaderMatch { level: 1 });
        }

        let upper = line.to_uppercase();
        if SECTION_KEYWORDS.contains(&upper.as_str()) {
            return Some(HeaderMatch { level: 1 });
        }

        None
    }
}

/// Short ALL-CAPS multi-word lines that read as headers
pub(crate) fn is_all_caps_header(line: &str) -> bool {
    let words = line.split_whitespace().count();
    line.chars().any(|c| c.is_alphabetic())
        && !line.chars().any(|c| c.is_lowercase())
        && (2..=8).contains(&words)
        && line.len() < 80
        && !line.ends_with('.')
}

/// Processes a guideline PDF into section chunks
pub struct GuidelineProcessor {
    pdf_path: PathBuf,
    chunking: ChunkingConfig,
}

impl GuidelineProcessor {
    pub fn new<P: AsRef<Path>>(pdf_path: P, chunking: &ChunkingConfig) -> Self {
        Self {
            pdf_path: pdf_path.as_ref().to_path_buf(),
            chunking: chunking.clone(),
        }
    }

    /// Extract pages and chunk them. Unreadable PDF is fatal.
    pub fn process(&self) -> Result<Vec<Chunk>> {
        let pages = extract_pages(&self.pdf_path)?;
        self.chunks_from_pages(&pages)
    }

    /// Chunk already-extracted pages. Exposed for tests and callers with
    /// their own extraction layer.
    pub fn chunks_from_pages(&self, pages: &[Page]) -> Result<Vec<Chunk>> {
        let chunker = SemanticChunker::new(
            GuidelineHeaderClassifier::new()?,
            &self.chunking,
            LeadingText::Emit,
        );
        let sections = chunker.chunk_pages(pages);
        log::info!("Created {} guideline section chunks", sections.len());

        let source_file = self
            .pdf_path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();

        let mut chunks = Vec::with_capacity(sections.len());
        for (index, section) in sections.into_iter().enumerate() {
            let mut metadata = Metadata::new();
            metadata.insert("page".to_string(), section.page.into());
            metadata.insert("section".to_string(), section.section.clone().into());
            metadata.insert(
                "subsection".to_string(),
                section.subsection.clone().into(),
            );
            metadata.insert("chunk_method".to_string(), "semantic".into());

            chunks.push(Chunk::new(
                format!("recist_chunk_{}", index),
                section.text,
                SourceType::Recist,
                &source_file,
                metadata,
            )?);
        }

        Ok(chunks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunk::MetaValue;

    fn classifier() -> GuidelineHeaderClassifier {
        GuidelineHeaderClassifier::new().unwrap()
    }

    #[test]
    fn test_numbered_headers() {
        let c = classifier();
        assert_eq!(c.classify("1. Introduction"), Some(HeaderMatch { level: 1 }));
        assert_eq!(
            c.classify("3.1 Target Lesions"),
            Some(HeaderMatch { level: 2 })
        );
        assert_eq!(
            c.classify("4.2.1 Special considerations"),
            Some(HeaderMatch { level: 3 })
        );
        assert_eq!(c.classify("Plain body sentence."), None);
        // Numbered data lines are body, not headers
        assert_eq!(c.classify("10 mm is the minimum size."), None);
    }

    #[test]
    fn test_all_caps_and_keyword_headers() {
        let c = classifier();
        assert_eq!(
            c.classify("RESPONSE EVALUATION CRITERIA"),
            Some(HeaderMatch { level: 1 })
        );
        assert_eq!(c.classify("INTRODUCTION"), Some(HeaderMatch { level: 1 }));
        assert_eq!(c.classify("Target Lesions"), Some(HeaderMatch { level: 1 }));
        // Sentences ending in a period are not headers
        assert_eq!(c.classify("ALL LESIONS WERE MEASURED."), None);
    }

    #[test]
    fn test_processor_metadata() {
        let processor = GuidelineProcessor::new(
            "recist_guidelines.pdf",
            &ChunkingConfig::default(),
        );
        let pages = [Page {
            number: 2,
            text: "3.1 Target Lesions\nLesions up to a maximum of five total.\n\nMeasurable lesions only."
                .to_string(),
        }];

        let chunks = processor.chunks_from_pages(&pages).unwrap();
        assert_eq!(chunks.len(), 1);

        let chunk = &chunks[0];
        assert_eq!(chunk.id, "recist_chunk_0");
        assert_eq!(chunk.source_type, SourceType::Recist);
        assert!(chunk.text.starts_with("3.1 Target Lesions"));
        assert_eq!(chunk.metadata.get("page"), Some(&MetaValue::Integer(2)));
        assert_eq!(
            chunk.metadata.get("section"),
            Some(&MetaValue::String("3.1 Target Lesions".to_string()))
        );
        assert_eq!(chunk.metadata.get("subsection"), Some(&MetaValue::Null));
        assert_eq!(
            chunk.metadata.get("chunk_method"),
            Some(&MetaValue::String("semantic".to_string()))
        );
    }

    #[test]
    fn test_missing_pdf_is_fatal() {
        let processor = GuidelineProcessor::new(
            "/nonexistent/recist.pdf",
            &ChunkingConfig::default(),
        );
        assert!(processor.process().is_err());
    }
}
