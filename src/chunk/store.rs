//! Newline-delimited JSON persistence for chunks
//!
//! One self-contained JSON object per line, streamed through a buffered
//! writer so large chunk sets never have to be serialized in memory at once.
//! Output files are truncate-and-write; rerunning a processor fully
//! regenerates its file.

use crate::chunk::Chunk;
use crate::error::Result;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

/// Save chunks to a JSONL file, one chunk per line
pub fn save_chunks<P: AsRef<Path>>(path: P, chunks: &[Chunk]) -> Result<()> {
    let path = path.as_ref();

    if let Some(parent) = path.parent() {
        crate::utils::ensure_directory(parent)?;
    }

    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);

    for chunk in chunks {
        serde_json::to_writer(&mut writer, chunk)?;
        writer.write_all(b"\n")?;
    }

    writer.flush()?;
    log::info!("Saved {} chunks to {}", chunks.len(), path.display());

    Ok(())
}

/// Load chunks back from a JSONL file. Blank lines are ignored.
pub fn load_chunks<P: AsRef<Path>>(path: P) -> Result<Vec<Chunk>> {
    let file = File::open(path.as_ref())?;
    let reader = BufReader::new(file);
    let mut chunks = Vec::new();

    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        chunks.push(serde_json::from_str(&line)?);
    }

    Ok(chunks)
}
