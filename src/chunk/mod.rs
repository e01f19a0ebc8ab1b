//! Common chunk representation for all sources
//!
//! Every processor, regardless of input format, produces the same record
//! shape: an id, the text to be embedded, a source-type tag, and an open
//! metadata map. This module provides that record plus the streaming JSONL
//! persistence used by the pipeline.

pub mod model;
pub mod store;

// Re-export main types and functions
pub use model::{Chunk, MetaValue, Metadata, SourceType};
pub use store::{load_chunks, save_chunks};
