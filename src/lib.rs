//! # radchunk
//!
//! Converts medical reference sources (the RadLex ontology, the LOINC/RSNA
//! radiology playbook, and clinical staging/guideline PDFs) into uniformly
//! shaped text chunks with metadata, persisted as newline-delimited JSON for
//! downstream retrieval pipelines.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use radchunk::{save_chunks, OntologyProcessor};
//!
//! fn main() -> radchunk::Result<()> {
//!     // Parse the ontology into one chunk per term
//!     let mut processor = OntologyProcessor::new("data/radlex/extracted");
//!     let chunks = processor.process()?;
//!
//!     // Persist as newline-delimited JSON
//!     save_chunks("output/radlex_chunks.jsonl", &chunks)?;
//!     println!("Created {} chunks ({} terms skipped)", chunks.len(), processor.skipped());
//!
//!     Ok(())
//! }
//! ```

// Core modules
pub mod chunk;
pub mod config;
pub mod document;
pub mod error;
pub mod ontology;
pub mod pipeline;
pub mod tabular;
pub mod utils;

// Re-export main API types
pub use chunk::{load_chunks, save_chunks, Chunk, MetaValue, Metadata, SourceType};
pub use config::{ChunkingConfig, Config};
pub use document::{GuidelineProcessor, StagingProcessor};
pub use error::{RadchunkError, Result};
pub use ontology::OntologyProcessor;
pub use pipeline::{Pipeline, ProcessingSummary};
pub use tabular::TabularProcessor;
