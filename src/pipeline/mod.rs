//! Processing pipeline: runs registered source jobs and writes their output
//!
//! Each source is a named job returning chunks. Jobs run one after another,
//! each inside its own failure boundary, so a broken source file marks that
//! source as failed without aborting the rest of the run. Per-source chunks
//! are persisted as JSONL, and a single consolidated summary records counts
//! and status for every source.

use crate::chunk::{save_chunks, Chunk, MetaValue};
use crate::error::Result;
use crate::utils::ensure_directory;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

/// What a source job produced
pub enum JobOutput {
    /// Chunks ready to persist
    Chunks(Vec<Chunk>),
    /// Source intentionally not processed (e.g. input not present), with reason
    Skipped(String),
}

type Job = Box<dyn FnOnce() -> Result<JobOutput>>;

/// Per-source outcome recorded in the summary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceStatus {
    Success,
    Failed,
    Skipped,
}

/// Character-count statistics over one source's chunks
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChunkSizeStats {
    pub min: usize,
    pub max: usize,
    pub mean: f64,
    pub total_chars: usize,
}

/// Extra per-source detail, recorded for sources registered with details
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SourceDetails {
    pub chunk_sizes: ChunkSizeStats,
    /// Distribution of the `category` metadata value
    pub categories: BTreeMap<String, usize>,
    /// Number of distinct section titles seen
    pub section_count: usize,
}

/// Consolidated result of one pipeline run
#[derive(Debug, Serialize, Deserialize)]
pub struct ProcessingSummary {
    pub total_chunks: usize,
    pub by_source: BTreeMap<String, usize>,
    pub status: BTreeMap<String, SourceStatus>,
    /// Failure messages, keyed by source name
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub errors: BTreeMap<String, String>,
    pub output_files: Vec<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub details: BTreeMap<String, SourceDetails>,
}

/// Explicit registry of source jobs, built at startup
pub struct Pipeline {
    jobs: Vec<(String, Job, bool)>,
    output_dir: PathBuf,
}

impl Pipeline {
    pub fn new<P: AsRef<Path>>(output_dir: P) -> Self {
        Self {
            jobs: Vec::new(),
            output_dir: output_dir.as_ref().to_path_buf(),
        }
    }

    /// Register a named source job. Jobs run in registration order.
    pub fn register<F>(&mut self, name: &str, job: F)
    where
        F: FnOnce() -> Result<JobOutput> + 'static,
    {
        self.jobs.push((name.to_string(), Box::new(job), false));
    }

    /// Register a job whose output also gets size/category details in the
    /// summary
    pub fn register_with_details<F>(&mut self, name: &str, job: F)
    where
        F: FnOnce() -> Result<JobOutput> + 'static,
    {
        self.jobs.push((name.to_string(), Box::new(job), true));
    }

    /// Run every registered job and persist its chunks.
    ///
    /// One job's failure never aborts the others; it is recorded in the
    /// summary and the run continues.
    pub fn run(self) -> Result<ProcessingSummary> {
        ensure_directory(&self.output_dir)?;

        let mut summary = ProcessingSummary {
            total_chunks: 0,
            by_source: BTreeMap::new(),
            status: BTreeMap::new(),
            errors: BTreeMap::new(),
            output_files: Vec::new(),
            details: BTreeMap::new(),
        };

        for (name, job, detailed) in self.jobs {
            log::info!("Processing source: {}", name);

            match job() {
                Ok(JobOutput::Chunks(chunks)) => {
                    // Persisting is part of the source's failure boundary:
                    // a source with no valid output file is a failed source,
                    // never an aborted run
                    let output_path = self.output_dir.join(format!("{}_chunks.jsonl", name));
                    match save_chunks(&output_path, &chunks) {
                        Ok(()) => {
                            log::info!(
                                "{}: {} chunks -> {}",
                                name,
                                chunks.len(),
                                output_path.display()
                            );
                            if detailed {
                                summary
                                    .details
                                    .insert(name.clone(), source_details(&chunks));
                            }
                            summary.total_chunks += chunks.len();
                            summary.by_source.insert(name.clone(), chunks.len());
                            summary.status.insert(name, SourceStatus::Success);
                            summary
                                .output_files
                                .push(output_path.to_string_lossy().into_owned());
                        }
                        Err(e) => {
                            log::error!("{}: failed to persist chunks: {}", name, e);
                            summary.by_source.insert(name.clone(), 0);
                            summary.errors.insert(name.clone(), e.to_string());
                            summary.status.insert(name, SourceStatus::Failed);
                        }
                    }
                }
                Ok(JobOutput::Skipped(reason)) => {
                    log::warn!("{}: skipped ({})", name, reason);
                    summary.by_source.insert(name.clone(), 0);
                    summary.status.insert(name, SourceStatus::Skipped);
                }
                Err(e) => {
                    log::error!("{}: failed: {}", name, e);
                    summary.by_source.insert(name.clone(), 0);
                    summary.errors.insert(name.clone(), e.to_string());
                    summary.status.insert(name, SourceStatus::Failed);
                }
            }
        }

        Ok(summary)
    }
}

/// Write the summary as pretty-printed JSON.
pub fn save_summary<P: AsRef<Path>>(summary: &ProcessingSummary, path: P) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        ensure_directory(parent)?;
    }
    let writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(writer, summary)?;
    Ok(())
}

fn source_details(chunks: &[Chunk]) -> SourceDetails {
    let sizes: Vec<usize> = chunks.iter().map(|c| c.char_count()).collect();
    let total_chars: usize = sizes.iter().sum();
    let chunk_sizes = ChunkSizeStats {
        min: sizes.iter().copied().min().unwrap_or(0),
        max: sizes.iter().copied().max().unwrap_or(0),
        mean: if sizes.is_empty() {
            0.0
        } else {
            total_chars as f64 / sizes.len() as f64
        },
        total_chars,
    };

    let mut categories = BTreeMap::new();
    let mut sections = std::collections::BTreeSet::new();
    for chunk in chunks {
        if let Some(MetaValue::String(category)) = chunk.metadata.get("category") {
            *categories.entry(category.clone()).or_insert(0) += 1;
        }
        if let Some(MetaValue::String(section)) = chunk.metadata.get("section") {
            sections.insert(section.clone());
        }
    }

    SourceDetails {
        chunk_sizes,
        categories,
        section_count: sections.len(),
    }
}
