//! Configuration for radchunk
//!
//! Default values mirror the layout the fetch layer produces: a `data/`
//! directory holding the raw sources and an output directory receiving one
//! JSONL file per source plus the processing summary.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Top-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Semantic chunking parameters
    pub chunking: ChunkingConfig,

    /// Directory containing raw source data
    pub data_dir: PathBuf,

    /// Directory receiving chunk JSONL files and the summary
    pub output_dir: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            chunking: ChunkingConfig::default(),
            data_dir: PathBuf::from("data"),
            output_dir: PathBuf::from("output/processed_chunks"),
        }
    }
}

/// Semantic chunking parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkingConfig {
    /// Maximum chunk size in characters (header included). Sections longer
    /// than this are split at paragraph boundaries.
    pub max_chunk_size: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            max_chunk_size: 3000,
        }
    }
}
