//! Ontology processing: one term = one chunk
//!
//! Each chunk carries the term id, preferred label, definition, synonyms and
//! parent concepts, rendered through a fixed template so re-processing the
//! same file yields identical text. Hierarchy is preserved only as metadata
//! counts and id lists; the term graph is never walked.

pub mod owl;

pub use owl::{OntologyTerm, ParsedOntology};

use crate::chunk::{Chunk, Metadata, SourceType};
use crate::error::{RadchunkError, Result};
use std::path::{Path, PathBuf};

/// Expected ontology file name inside the data directory
pub const ONTOLOGY_FILE_NAME: &str = "RadLex.owl";

/// Processes a RadLex-shaped OWL ontology into chunks
pub struct OntologyProcessor {
    owl_file: PathBuf,
    skipped: usize,
}

impl OntologyProcessor {
    /// Create a processor for `<ontology_dir>/RadLex.owl`
    pub fn new<P: AsRef<Path>>(ontology_dir: P) -> Self {
        Self::from_file(ontology_dir.as_ref().join(ONTOLOGY_FILE_NAME))
    }

    /// Create a processor for an explicit OWL file path
    pub fn from_file<P: AsRef<Path>>(owl_file: P) -> Self {
        Self {
            owl_file: owl_file.as_ref().to_path_buf(),
            skipped: 0,
        }
    }

    /// Parse the ontology and build one chunk per labeled term.
    ///
    /// A missing or unparsable file is fatal to this processor; malformed
    /// individual terms are skipped and counted.
    pub fn process(&mut self) -> Result<Vec<Chunk>> {
        if !self.owl_file.exists() {
            return Err(RadchunkError::Ontology(format!(
                "ontology file not found: {}",
                self.owl_file.display()
            )));
        }

        log::info!("Loading ontology from {}", self.owl_file.display());
        let xml = std::fs::read_to_string(&self.owl_file)?;

        let parsed = owl::parse_owl(&xml)?;
        self.skipped = parsed.skipped;
        log::info!(
            "Parsed {} ontology terms ({} skipped)",
            parsed.terms.len(),
            parsed.skipped
        );

        let source_file = self
            .owl_file
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| ONTOLOGY_FILE_NAME.to_string());

        let mut chunks = Vec::with_capacity(parsed.terms.len());
        for term in &parsed.terms {
            chunks.push(self.chunk_for_term(term, &source_file)?);
        }

        log::info!("Created {} ontology chunks", chunks.len());
        Ok(chunks)
    }

    /// Number of nodes skipped during the last `process()` call
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    fn chunk_for_term(&self, term: &OntologyTerm, source_file: &str) -> Result<Chunk> {
        let mut text_parts = vec![
            format!("RadLex ID: {}", term.rid),
            format!("Term: {}", term.label),
        ];

        if !term.definition.is_empty() {
            text_parts.push(format!("Definition: {}", term.definition));
        }
        if !term.synonyms.is_empty() {
            text_parts.push(format!("Synonyms: {}", term.synonyms.join(", ")));
        }
        if !term.parents.is_empty() {
            text_parts.push(format!("Parent terms: {}", term.parents.join(", ")));
        }

        let mut metadata = Metadata::new();
        metadata.insert("term_id".to_string(), term.rid.as_str().into());
        metadata.insert("label".to_string(), term.label.as_str().into());
        metadata.insert(
            "has_definition".to_string(),
            (!term.definition.is_empty()).into(),
        );
        metadata.insert("synonym_count".to_string(), term.synonyms.len().into());
        metadata.insert("parent_count".to_string(), term.parents.len().into());
        metadata.insert("category".to_string(), "terminology".into());

        Chunk::new(
            format!("radlex_{}", term.rid),
            text_parts.join("\n"),
            SourceType::Radlex,
            source_file,
            metadata,
        )
    }
}
