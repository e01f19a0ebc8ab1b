//! Staging-protocol PDF processing (TNM-style documents)
//!
//! Staging protocols organize content by cancer type and staging component
//! (T, N, M classifications and stage groupings). The header rules here
//! recognize cancer-type section titles, numbered sections, appendices and
//! ALL-CAPS headers, and each emitted chunk is tagged with the staging
//! category its section describes.

use crate::chunk::{Chunk, Metadata, SourceType};
use crate::config::ChunkingConfig;
use crate::document::chunker::{HeaderClassifier, HeaderMatch, LeadingText, SemanticChunker};
use crate::document::guideline::is_all_caps_header;
use crate::document::pdf::{extract_pages, Page};
use crate::error::{RadchunkError, Result};
use regex::Regex;
use std::path::{Path, PathBuf};

/// Cancer types recognized in section titles
const CANCER_KEYWORDS: &[&str] = &[
    "lung",
    "thyroid",
    "breast",
    "colon",
    "prostate",
    "liver",
    "kidney",
    "bladder",
    "stomach",
    "esophagus",
    "pancreas",
    "melanoma",
    "lymphoma",
    "leukemia",
    "ovarian",
    "cervical",
    "testicular",
    "brain",
    "thymic",
];

/// Header rules for staging-protocol documents
pub struct StagingHeaderClassifier {
    tnm_section: Regex,
    cancer_type: Regex,
    numbered: Regex,
    appendix: Regex,
}

impl StagingHeaderClassifier {
    pub fn new() -> Result<Self> {
        let compile = |pattern: &str| {
            Regex::new(pattern)
                .map_err(|e| RadchunkError::Chunking(format!("bad header regex: {}", e)))
        };

        Ok(Self {
            tnm_section: compile(
                r"(?i)^[A-Z][a-zA-Z\s]+(?:Cancer|Tumors?|Mesothelioma|Carcinoma)\s+(?:T|N|M|TNM)\s+(?:Classification|Definitions?|Stages?)",
            )?,
            cancer_type: compile(r"^[A-Z][a-zA-Z\s]+(?:Cancer|Tumors?|Mesothelioma|Carcinoma)")?,
            numbered: compile(r"^(\d+(?:\.\d+)*)\.?\s+[A-Z][A-Za-z]")?,
            appendix: compile(r"(?i)^Appendix\s+[IVX]+")?,
        })
    }
}

impl HeaderClassifier for StagingHeaderClassifier {
    fn classify(&self, line: &str) -> Option<HeaderMatch> {
        // Running organization headers are noise, never sections
        if line.contains("INTERNATIONAL ASSOCIATION") || line.starts_with("E U R O P E A N") {
            return None;
        }

        if self.tnm_section.is_match(line) {
            return Some(HeaderMatch { level: 1 });
        }

        if self.cancer_type.is_match(line)
            && (line.contains("9th Edition")
                || line.contains("Classification")
                || line.split_whitespace().count() <= 6)
        {
            return Some(HeaderMatch { level: 1 });
        }

        if let Some(captures) = self.numbered.captures(line) {
            if !line.ends_with('.') || line.len() < 80 {
                let level = captures[1].split('.').count().min(3) as u8;
                return Some(HeaderMatch { level });
            }
        }

        if self.appendix.is_match(line) {
            return Some(HeaderMatch { level: 1 });
        }

        if is_all_caps_header(line) {
            return Some(HeaderMatch { level: 1 });
        }

        None
    }
}

/// Identify which staging component a section header describes
pub fn classify_category(section: Option<&str>) -> &'static str {
    let Some(section) = section else {
        return "Unknown";
    };
    let upper = section.to_uppercase();

    if upper.contains("T CLASSIFICATION") || upper.contains("T STAGE") {
        "T-staging"
    } else if upper.contains("N CLASSIFICATION") || upper.contains("N STAGE") {
        "N-staging"
    } else if upper.contains("M CLASSIFICATION") || upper.contains("M STAGE") {
        "M-staging"
    } else if upper.contains("TNM") || upper.contains("STAGE GROUP") {
        "TNM-staging"
    } else {
        "Unknown"
    }
}

/// Pull a cancer type out of a section title, when one is named
pub fn detect_cancer_type(section: Option<&str>) -> Option<String> {
    let section = section?.to_lowercase();
    CANCER_KEYWORDS
        .iter()
        .find(|keyword| section.contains(*keyword))
        .map(|keyword| {
            let mut chars = keyword.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
}

/// Processes a staging-protocol PDF into section chunks
pub struct StagingProcessor {
    pdf_path: PathBuf,
    chunking: ChunkingConfig,
    cancer_type: String,
}

impl StagingProcessor {
    /// `cancer_type` is the document-level default, used when a section
    /// title doesn't name one itself
    pub fn new<P: AsRef<Path>>(pdf_path: P, chunking: &ChunkingConfig, cancer_type: &str) -> Self {
        Self {
            pdf_path: pdf_path.as_ref().to_path_buf(),
            chunking: chunking.clone(),
            cancer_type: cancer_type.to_string(),
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
            StagingHeaderClassifier::new()?,
            &self.chunking,
            LeadingText::Emit,
        );
        let sections = chunker.chunk_pages(pages);
        log::info!("Created {} staging section chunks", sections.len());

        let source_file = self
            .pdf_path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        let id_prefix = format!("tnm_{}", self.cancer_type.to_lowercase());

        let mut chunks = Vec::with_capacity(sections.len());
        for (index, section) in sections.into_iter().enumerate() {
            let category = classify_category(section.section.as_deref());
            let cancer_type = detect_cancer_type(section.section.as_deref())
                .unwrap_or_else(|| self.cancer_type.clone());

            let mut metadata = Metadata::new();
            metadata.insert("page".to_string(), section.page.into());
            metadata.insert("cancer_type".to_string(), cancer_type.into());
            metadata.insert("category".to_string(), category.into());
            metadata.insert("section".to_string(), section.section.clone().into());
            metadata.insert(
                "subsection".to_string(),
                section.subsection.clone().into(),
            );
            metadata.insert("tnm_edition".to_string(), "9th".into());
            metadata.insert(
                "protocol_type".to_string(),
                "staging_documentation".into(),
            );
            metadata.insert("chunk_method".to_string(), "semantic".into());

            chunks.push(Chunk::new(
                format!("{}_chunk_{}", id_prefix, index),
                section.text,
                SourceType::TnmLungProtocol,
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

    fn classifier() -> StagingHeaderClassifier {
        StagingHeaderClassifier::new().unwrap()
    }

    #[test]
    fn test_tnm_section_headers() {
        let c = classifier();
        assert_eq!(
            c.classify("Lung Cancer T Classification"),
            Some(HeaderMatch { level: 1 })
        );
        assert_eq!(
            c.classify("Pleural Mesothelioma TNM Stages"),
            Some(HeaderMatch { level: 1 })
        );
    }

    #[test]
    fn test_cancer_type_headers() {
        let c = classifier();
        assert_eq!(
            c.classify("Lung Cancer \u{2013} 9th Edition"),
            Some(HeaderMatch { level: 1 })
        );
        assert_eq!(c.classify("Thymic Tumors"), Some(HeaderMatch { level: 1 }));
        // Long prose mentioning a cancer type is body text
        assert_eq!(
            c.classify("Lung Carcinoma cases were reviewed across multiple centers and institutions over time"),
            None
        );
    }

    #[test]
    fn test_numbered_appendix_and_noise() {
        let c = classifier();
        assert_eq!(
            c.classify("2.1 Regional Lymph Nodes"),
            Some(HeaderMatch { level: 2 })
        );
        assert_eq!(c.classify("Appendix II"), Some(HeaderMatch { level: 1 }));
        assert_eq!(
            c.classify("INTERNATIONAL ASSOCIATION FOR THE STUDY OF LUNG CANCER"),
            None
        );
    }

    #[test]
    fn test_classify_category() {
        assert_eq!(
            classify_category(Some("Lung Cancer T Classification")),
            "T-staging"
        );
        assert_eq!(
            classify_category(Some("N Classification Rules")),
            "N-staging"
        );
        assert_eq!(classify_category(Some("M Stage Definitions")), "M-staging");
        assert_eq!(
            classify_category(Some("TNM Stage Groupings")),
            "TNM-staging"
        );
        assert_eq!(classify_category(Some("General Rules")), "Unknown");
        assert_eq!(classify_category(None), "Unknown");
    }

    #[test]
    fn test_detect_cancer_type() {
        assert_eq!(
            detect_cancer_type(Some("Lung Cancer T Classification")),
            Some("Lung".to_string())
        );
        assert_eq!(detect_cancer_type(Some("General Rules")), None);
        assert_eq!(detect_cancer_type(None), None);
    }

    #[test]
    fn test_processor_metadata() {
        let processor = StagingProcessor::new(
            "lung_staging_protocol.pdf",
            &ChunkingConfig::default(),
            "Lung",
        );
        let pages = [Page {
            number: 5,
            text: "Lung Cancer T Classification\nT1: tumor 3 cm or less in greatest dimension."
                .to_string(),
        }];

        let chunks = processor.chunks_from_pages(&pages).unwrap();
        assert_eq!(chunks.len(), 1);

        let chunk = &chunks[0];
        assert_eq!(chunk.id, "tnm_lung_chunk_0");
        assert_eq!(chunk.source_type, SourceType::TnmLungProtocol);
        assert_eq!(
            chunk.metadata.get("category"),
            Some(&MetaValue::String("T-staging".to_string()))
        );
        assert_eq!(
            chunk.metadata.get("cancer_type"),
            Some(&MetaValue::String("Lung".to_string()))
        );
        assert_eq!(
            chunk.metadata.get("tnm_edition"),
            Some(&MetaValue::String("9th".to_string()))
        );
        assert_eq!(chunk.metadata.get("page"), Some(&MetaValue::Integer(5)));
    }
}
