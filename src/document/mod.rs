//! Document processing: semantic chunking of clinical PDFs
//!
//! A single chunking algorithm (header detection, section grouping,
//! paragraph-boundary splitting) is shared by the guideline and
//! staging-protocol processors. The two differ only in their header
//! classification rules and in the metadata they attach, injected as
//! strategies rather than inherited hooks.

pub mod chunker;
pub mod guideline;
pub mod pdf;
pub mod staging;

// Re-export main types and functions
pub use chunker::{HeaderClassifier, HeaderMatch, LeadingText, SectionChunk, SemanticChunker};
pub use guideline::GuidelineProcessor;
pub use pdf::{extract_pages, Page};
pub use staging::StagingProcessor;
