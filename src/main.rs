//! radchunk CLI application
//!
//! Command-line interface for the radchunk library.

use clap::{Parser, Subcommand};
use radchunk::pipeline::{save_summary, JobOutput, Pipeline, SourceStatus};
use radchunk::utils::format_file_size;
use radchunk::{
    load_chunks, ChunkingConfig, Config, GuidelineProcessor, OntologyProcessor, StagingProcessor,
    TabularProcessor,
};
use std::path::{Path, PathBuf};

const TNM_PDF_NAME: &str = "Lung_ Protocol for Cancer Staging Documentation.pdf";
const SOURCE_NAMES: &[&str] = &["radlex", "loinc", "tnm", "recist"];

#[derive(Parser)]
#[command(name = "radchunk")]
#[command(about = "Converts medical reference data into retrieval-ready text chunks")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the chunk-production pipeline over the raw data directory
    Process {
        /// Directory containing raw source data
        #[arg(short, long, default_value = "data")]
        data_dir: PathBuf,

        /// Directory receiving chunk JSONL files and the summary
        #[arg(short, long, default_value = "output/processed_chunks")]
        output_dir: PathBuf,

        /// Maximum chunk size in characters for document chunking
        #[arg(long, default_value = "3000")]
        max_chunk_size: usize,

        /// Process only the named sources (radlex, loinc, tnm, recist);
        /// repeat for more than one. Default: all.
        #[arg(short, long = "source")]
        sources: Vec<String>,
    },

    /// Inspect previously produced chunk files
    Inspect {
        /// Directory holding the chunk JSONL files
        #[arg(short, long, default_value = "output/processed_chunks")]
        output_dir: PathBuf,
    },
}

fn main() -> anyhow::Result<()> {
    // Initialize logging
    env_logger::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Process {
            data_dir,
            output_dir,
            max_chunk_size,
            sources,
        } => {
            for name in &sources {
                if !SOURCE_NAMES.contains(&name.as_str()) {
                    anyhow::bail!(
                        "unknown source '{}' (expected one of: {})",
                        name,
                        SOURCE_NAMES.join(", ")
                    );
                }
            }
            let config = Config {
                chunking: ChunkingConfig { max_chunk_size },
                data_dir,
                output_dir,
            };
            process_command(&config, &sources)?;
        }
        Commands::Inspect { output_dir } => {
            inspect_command(&output_dir)?;
        }
    }

    Ok(())
}

fn process_command(config: &Config, sources: &[String]) -> anyhow::Result<()> {
    println!("🏥 Medical reference chunk pipeline");
    println!("   📂 Data: {}", config.data_dir.display());
    println!("   📂 Output: {}", config.output_dir.display());

    let selected = |name: &str| sources.is_empty() || sources.iter().any(|s| s == name);
    let mut pipeline = Pipeline::new(&config.output_dir);

    if selected("radlex") {
        let radlex_dir = config.data_dir.join("radlex").join("extracted");
        pipeline.register("radlex", move || {
            if !radlex_dir.exists() {
                return Ok(JobOutput::Skipped(format!(
                    "extracted directory not found: {}",
                    radlex_dir.display()
                )));
            }
            let mut processor = OntologyProcessor::new(&radlex_dir);
            Ok(JobOutput::Chunks(processor.process()?))
        });
    }

    if selected("loinc") {
        let loinc_dir = config.data_dir.join("loinc");
        pipeline.register("loinc", move || {
            let playbook = find_playbook(&loinc_dir)
                .unwrap_or_else(|| loinc_dir.join("LoincRsnaRadiologyPlaybook.csv"));
            let mut processor = TabularProcessor::new(playbook);
            Ok(JobOutput::Chunks(processor.process()?))
        });
    }

    if selected("tnm") {
        let tnm_pdf = config.data_dir.join("tnm9ed").join(TNM_PDF_NAME);
        let chunking = config.chunking.clone();
        pipeline.register_with_details("tnm", move || {
            if !tnm_pdf.exists() {
                return Ok(JobOutput::Skipped(format!(
                    "staging protocol PDF not found: {}",
                    tnm_pdf.display()
                )));
            }
            let processor = StagingProcessor::new(&tnm_pdf, &chunking, "Lung");
            Ok(JobOutput::Chunks(processor.process()?))
        });
    }

    if selected("recist") {
        let guidelines_dir = config.data_dir.join("guidelines");
        let chunking = config.chunking.clone();
        pipeline.register("recist", move || {
            let Some(recist_pdf) = find_recist_pdf(&guidelines_dir) else {
                return Ok(JobOutput::Skipped(format!(
                    "no RECIST PDF found in: {}",
                    guidelines_dir.display()
                )));
            };
            let processor = GuidelineProcessor::new(&recist_pdf, &chunking);
            Ok(JobOutput::Chunks(processor.process()?))
        });
    }

    let summary = pipeline.run()?;

    println!();
    println!("📋 Results by source:");
    for (name, status) in &summary.status {
        let icon = match status {
            SourceStatus::Success => "✅",
            SourceStatus::Failed => "❌",
            SourceStatus::Skipped => "⚠️ ",
        };
        let count = summary.by_source.get(name).copied().unwrap_or(0);
        println!("   {} {}: {} chunks", icon, name, count);
        if let Some(error) = summary.errors.get(name) {
            println!("      Error: {}", error);
        }
    }

    let summary_path = config.output_dir.join("processing_summary.json");
    save_summary(&summary, &summary_path)?;

    println!();
    println!("✅ Processing complete!");
    println!("   📊 Total chunks: {}", summary.total_chunks);
    println!("   📋 Summary: {}", summary_path.display());

    Ok(())
}

/// The playbook CSV carries a release-stamped name, so match by substring.
fn find_playbook(loinc_dir: &Path) -> Option<PathBuf> {
    find_file(loinc_dir, |name| {
        name.contains("RadiologyPlaybook") && name.ends_with(".csv")
    })
}

fn find_recist_pdf(guidelines_dir: &Path) -> Option<PathBuf> {
    find_file(guidelines_dir, |name| {
        name.starts_with("RECIST") && name.ends_with(".pdf")
    })
}

fn find_file<F: Fn(&str) -> bool>(dir: &Path, matches: F) -> Option<PathBuf> {
    let entries = std::fs::read_dir(dir).ok()?;
    let mut found: Vec<PathBuf> = entries
        .flatten()
        .map(|entry| entry.path())
        .filter(|path| {
            path.file_name()
                .and_then(|name| name.to_str())
                .is_some_and(&matches)
        })
        .collect();
    found.sort();
    found.into_iter().next()
}

fn inspect_command(output_dir: &Path) -> anyhow::Result<()> {
    println!("🔍 Inspecting chunks in {}", output_dir.display());

    let mut found_any = false;
    for name in SOURCE_NAMES {
        let path = output_dir.join(format!("{}_chunks.jsonl", name));
        if !path.exists() {
            continue;
        }
        found_any = true;

        let chunks = load_chunks(&path)?;
        let file_size = std::fs::metadata(&path)?.len();

        println!();
        println!("📄 {} ({})", path.display(), format_file_size(file_size));
        println!("   Chunks: {}", chunks.len());

        if chunks.is_empty() {
            continue;
        }

        let sizes: Vec<usize> = chunks.iter().map(|c| c.char_count()).collect();
        let total: usize = sizes.iter().sum();
        println!(
            "   Text length: min {} / mean {:.1} / max {} chars",
            sizes.iter().min().unwrap_or(&0),
            total as f64 / sizes.len() as f64,
            sizes.iter().max().unwrap_or(&0)
        );

        let mut keys: Vec<&str> = chunks
            .iter()
            .flat_map(|c| c.metadata.keys().map(String::as_str))
            .collect();
        keys.sort();
        keys.dedup();
        println!("   Metadata fields: {}", keys.join(", "));
    }

    if !found_any {
        println!("⚠️  No chunk files found — run `radchunk process` first");
    }

    Ok(())
}
