//! Tabular procedure processing: one procedure code = one chunk
//!
//! The radiology playbook CSV is a flat table where a single LOINC code
//! appears on several rows, each contributing one anatomical part, part type
//! or RadLex cross-reference. A single grouping pass aggregates those rows
//! into one chunk per code, preserving first-seen order of both codes and
//! aggregated values.

use crate::chunk::{Chunk, Metadata, SourceType};
use crate::error::{RadchunkError, Result};
use crate::utils::push_unique;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Grouping key column; absence is fatal
pub const KEY_COLUMN: &str = "LoincNumber";

const NAME_COLUMN: &str = "LongCommonName";
const SHORT_NAME_COLUMN: &str = "ShortName";
const PART_COLUMN: &str = "PartName";
const RADLEX_COLUMN: &str = "RID";
const PART_TYPE_COLUMN: &str = "PartTypeName";
const PROPERTY_COLUMN: &str = "Property";

/// One raw playbook row, already reduced to the columns we aggregate
#[derive(Debug, Clone, Default)]
pub struct ProcedureRow {
    pub code: String,
    pub name: String,
    pub short_name: String,
    pub part_name: String,
    pub radlex_id: String,
    pub part_type: String,
    pub property: String,
}

/// All rows sharing one procedure code, merged
#[derive(Debug, Default)]
struct ProcedureGroup {
    name: String,
    short_name: String,
    property: String,
    parts: Vec<String>,
    radlex_ids: Vec<String>,
    part_types: Vec<String>,
    row_count: usize,
}

impl ProcedureGroup {
    fn absorb(&mut self, row: &ProcedureRow) {
        self.row_count += 1;
        // Canonical name/short name/property: first non-empty value wins
        if self.name.is_empty() && !row.name.trim().is_empty() {
            self.name = row.name.trim().to_string();
        }
        if self.short_name.is_empty() && !row.short_name.trim().is_empty() {
            self.short_name = row.short_name.trim().to_string();
        }
        if self.property.is_empty() && !row.property.trim().is_empty() {
            self.property = row.property.trim().to_string();
        }
        push_unique(&mut self.parts, &row.part_name);
        push_unique(&mut self.radlex_ids, &row.radlex_id);
        push_unique(&mut self.part_types, &row.part_type);
    }
}

/// Processes the radiology playbook CSV into chunks
pub struct TabularProcessor {
    playbook_file: PathBuf,
    skipped: usize,
}

impl TabularProcessor {
    pub fn new<P: AsRef<Path>>(playbook_file: P) -> Self {
        Self {
            playbook_file: playbook_file.as_ref().to_path_buf(),
            skipped: 0,
        }
    }

    /// Load the CSV, group rows by code and build one chunk per code.
    ///
    /// Missing file or missing key column is fatal; rows without a code are
    /// skipped and counted.
    pub fn process(&mut self) -> Result<Vec<Chunk>> {
        if !self.playbook_file.exists() {
            return Err(RadchunkError::Tabular(format!(
                "playbook file not found: {}",
                self.playbook_file.display()
            )));
        }

        log::info!("Loading playbook from {}", self.playbook_file.display());
        let rows = self.load_rows()?;
        log::info!(
            "Loaded {} playbook rows ({} skipped)",
            rows.len(),
            self.skipped
        );

        let source_file = self
            .playbook_file
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();

        self.chunks_from_rows(&rows, &source_file)
    }

    /// Number of rows skipped during the last `process()` call
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    fn load_rows(&mut self) -> Result<Vec<ProcedureRow>> {
        let mut reader = csv::Reader::from_path(&self.playbook_file)?;
        let headers = reader.headers()?.clone();

        let key_index = column_index(&headers, KEY_COLUMN).ok_or_else(|| {
            RadchunkError::Tabular(format!(
                "required column {} missing from {}",
                KEY_COLUMN,
                self.playbook_file.display()
            ))
        })?;

        let name_index = column_index(&headers, NAME_COLUMN);
        let short_name_index = column_index(&headers, SHORT_NAME_COLUMN);
        let part_index = column_index(&headers, PART_COLUMN);
        let radlex_index = column_index(&headers, RADLEX_COLUMN);
        let part_type_index = column_index(&headers, PART_TYPE_COLUMN);
        let property_index = column_index(&headers, PROPERTY_COLUMN);

        self.skipped = 0;
        let mut rows = Vec::new();

        for (line, record) in reader.records().enumerate() {
            let record = record?;
            let code = record.get(key_index).unwrap_or("").trim();
            if code.is_empty() {
                log::warn!("Skipping playbook row {} with empty {}", line + 2, KEY_COLUMN);
                self.skipped += 1;
                continue;
            }

            let field = |index: Option<usize>| {
                index
                    .and_then(|i| record.get(i))
                    .unwrap_or("")
                    .to_string()
            };

            rows.push(ProcedureRow {
                code: code.to_string(),
                name: field(name_index),
                short_name: field(short_name_index),
                part_name: field(part_index),
                radlex_id: field(radlex_index),
                part_type: field(part_type_index),
                property: field(property_index),
            });
        }

        Ok(rows)
    }

    /// Group already-loaded rows into chunks. Exposed for tests and callers
    /// that source records elsewhere.
    pub fn chunks_from_rows(
        &self,
        rows: &[ProcedureRow],
        source_file: &str,
    ) -> Result<Vec<Chunk>> {
        let mut order: Vec<&str> = Vec::new();
        let mut groups: HashMap<&str, ProcedureGroup> = HashMap::new();

        for row in rows {
            let group = groups.entry(row.code.as_str()).or_insert_with(|| {
                order.push(row.code.as_str());
                ProcedureGroup::default()
            });
            group.absorb(row);
        }

        log::info!("Grouped into {} unique procedure codes", order.len());

        let mut chunks = Vec::with_capacity(order.len());
        for code in order {
            let group = &groups[code];
            chunks.push(self.chunk_for_group(code, group, source_file)?);
        }

        Ok(chunks)
    }

    fn chunk_for_group(
        &self,
        code: &str,
        group: &ProcedureGroup,
        source_file: &str,
    ) -> Result<Chunk> {
        let mut text_parts = vec![format!("LOINC: {}", code)];

        if !group.name.is_empty() {
            text_parts.push(format!("Name: {}", group.name));
        }
        if !group.short_name.is_empty() {
            text_parts.push(format!("Short Name: {}", group.short_name));
        }
        if !group.parts.is_empty() {
            text_parts.push(format!("Component: {}", group.parts.join(", ")));
        }
        if !group.radlex_ids.is_empty() {
            text_parts.push(format!("RadLex IDs: {}", group.radlex_ids.join(", ")));
        }
        if !group.part_types.is_empty() {
            let cleaned: Vec<String> = group
                .part_types
                .iter()
                .map(|part_type| clean_part_type(part_type))
                .collect();
            text_parts.push(format!("System: {}", cleaned.join(", ")));
        }
        if !group.property.is_empty() {
            text_parts.push(format!("Property: {}", group.property));
        }

        let mut metadata = Metadata::new();
        metadata.insert("code".to_string(), code.into());
        metadata.insert("procedure_name".to_string(), group.name.as_str().into());
        metadata.insert("anatomical_parts".to_string(), group.parts.clone().into());
        metadata.insert("radlex_ids".to_string(), group.radlex_ids.clone().into());
        metadata.insert("part_count".to_string(), group.parts.len().into());
        metadata.insert("category".to_string(), "lab_terminology".into());

        Chunk::new(
            format!("loinc_{}", code.replace('-', "_")),
            text_parts.join("\n"),
            SourceType::Loinc,
            source_file,
            metadata,
        )
    }
}

/// Strip the playbook's `Rad.` prefix and dotted notation from a part type
fn clean_part_type(part_type: &str) -> String {
    part_type
        .replace("Rad.", "")
        .replace('.', " ")
        .trim()
        .to_string()
}

fn column_index(headers: &csv::StringRecord, name: &str) -> Option<usize> {
    headers.iter().position(|header| header == name)
}
