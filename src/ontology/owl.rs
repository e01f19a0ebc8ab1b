//! OWL/RDF term-graph parsing
//!
//! Pulls terms out of a RadLex-shaped OWL file: one `owl:Class` per term,
//! with a preferred name, optional definition, synonyms/acronym, and
//! `rdfs:subClassOf` parent references. Parent links are recorded as opaque
//! id strings and never traversed, so cyclic hierarchies cannot hang the
//! parser.

use crate::error::{RadchunkError, Result};
use crate::utils::push_unique;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::collections::HashSet;

/// URI prefixes of OWL/RDF scaffolding classes that are not ontology terms
const SYSTEM_NAMESPACES: &[&str] = &["http://www.w3.org", "http://purl.org/dc"];

/// A single ontology term as read from the OWL file
#[derive(Debug, Clone, PartialEq)]
pub struct OntologyTerm {
    /// Short identifier (e.g. `RID56`), the tail of the term URI
    pub rid: String,
    /// Preferred label; falls back to the RID when the source has none
    pub label: String,
    /// Free-text definition, empty when absent
    pub definition: String,
    /// Synonyms and acronym, deduplicated in source order
    pub synonyms: Vec<String>,
    /// Parent term ids. Opaque cross-references only, never resolved.
    pub parents: Vec<String>,
}

/// Parse result: terms in input order plus the skipped-node count
#[derive(Debug, Default)]
pub struct ParsedOntology {
    pub terms: Vec<OntologyTerm>,
    pub skipped: usize,
}

/// Which child element of the current class is being read
#[derive(Debug, Clone, Copy, PartialEq)]
enum Field {
    PreferredName,
    PrefLabel,
    Definition,
    Synonym,
    Acronym,
}

#[derive(Debug, Default)]
struct TermBuilder {
    uri: String,
    preferred_name: String,
    pref_label: String,
    definition: String,
    synonyms: Vec<String>,
    acronym: String,
    parents: Vec<String>,
}

/// Parse an OWL document into ontology terms.
///
/// Malformed XML is fatal. Individual classes without a usable identifier
/// or label are skipped and counted, never fatal.
pub fn parse_owl(xml: &str) -> Result<ParsedOntology> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut parsed = ParsedOntology::default();
    let mut seen_rids: HashSet<String> = HashSet::new();
    let mut current: Option<TermBuilder> = None;
    // Element nesting depth inside the current class, so nested anonymous
    // classes (axiom restrictions) don't end the term early
    let mut depth = 0usize;
    let mut field: Option<Field> = None;

    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                let local = e.local_name();
                if current.is_none() {
                    if local.as_ref() == b"Class" {
                        current = Some(begin_term(&e)?);
                        depth = 1;
                        field = None;
                    }
                } else {
                    depth += 1;
                    field = match local.as_ref() {
                        b"subClassOf" => {
                            if let Some(builder) = current.as_mut() {
                                record_parent(builder, &e)?;
                            }
                            None
                        }
                        b"Preferred_name" => Some(Field::PreferredName),
                        b"prefLabel" => Some(Field::PrefLabel),
                        b"Definition" | b"definition" => Some(Field::Definition),
                        b"Synonym" => Some(Field::Synonym),
                        b"Acronym" => Some(Field::Acronym),
                        _ => None,
                    };
                }
            }
            Event::Empty(e) => {
                let local = e.local_name();
                if let Some(builder) = current.as_mut() {
                    if local.as_ref() == b"subClassOf" {
                        record_parent(builder, &e)?;
                    }
                } else if local.as_ref() == b"Class" {
                    // Childless class: still a candidate term (usually skipped
                    // for having no label)
                    let builder = begin_term(&e)?;
                    finish_term(builder, &mut parsed, &mut seen_rids);
                }
            }
            Event::Text(t) => {
                if let (Some(builder), Some(f)) = (current.as_mut(), field) {
                    let text = t.unescape()?;
                    append_field(builder, f, text.trim());
                }
            }
            Event::End(_) => {
                if current.is_some() {
                    field = None;
                    depth -= 1;
                    if depth == 0 {
                        let builder = current.take().unwrap_or_default();
                        finish_term(builder, &mut parsed, &mut seen_rids);
                    }
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(parsed)
}

fn begin_term(element: &BytesStart<'_>) -> Result<TermBuilder> {
    let mut builder = TermBuilder::default();
    for attr in element.attributes() {
        let attr = attr.map_err(|e| RadchunkError::Ontology(format!("bad attribute: {}", e)))?;
        if attr.key.local_name().as_ref() == b"about" {
            builder.uri = attr
                .unescape_value()
                .map_err(RadchunkError::Xml)?
                .into_owned();
        }
    }
    Ok(builder)
}

fn record_parent(builder: &mut TermBuilder, element: &BytesStart<'_>) -> Result<()> {
    for attr in element.attributes() {
        let attr = attr.map_err(|e| RadchunkError::Ontology(format!("bad attribute: {}", e)))?;
        if attr.key.local_name().as_ref() == b"resource" {
            let uri = attr.unescape_value().map_err(RadchunkError::Xml)?;
            if is_system_uri(&uri) {
                continue;
            }
            push_unique(&mut builder.parents, uri_tail(&uri));
        }
    }
    Ok(())
}

fn append_field(builder: &mut TermBuilder, field: Field, text: &str) {
    if text.is_empty() {
        return;
    }
    match field {
        Field::PreferredName => builder.preferred_name.push_str(text),
        Field::PrefLabel => builder.pref_label.push_str(text),
        Field::Definition => {
            if builder.definition.is_empty() {
                builder.definition.push_str(text);
            }
        }
        Field::Synonym => push_unique(&mut builder.synonyms, text),
        Field::Acronym => builder.acronym.push_str(text),
    }
}

fn finish_term(builder: TermBuilder, parsed: &mut ParsedOntology, seen_rids: &mut HashSet<String>) {
    if builder.uri.is_empty() {
        log::warn!("Skipping ontology class with no identifier");
        parsed.skipped += 1;
        return;
    }
    if is_system_uri(&builder.uri) {
        log::debug!("Filtering system class {}", builder.uri);
        return;
    }

    let rid = uri_tail(&builder.uri).to_string();
    if !seen_rids.insert(rid.clone()) {
        log::warn!("Skipping duplicate ontology class {}", rid);
        parsed.skipped += 1;
        return;
    }
    let mut label = if !builder.preferred_name.is_empty() {
        builder.preferred_name
    } else {
        builder.pref_label
    };

    if label.is_empty() {
        if rid.starts_with("RID") {
            label = rid.clone();
        } else {
            log::warn!("Skipping ontology class {} with no usable label", rid);
            parsed.skipped += 1;
            return;
        }
    }

    let mut synonyms = builder.synonyms;
    if !builder.acronym.is_empty() && builder.acronym != label {
        push_unique(&mut synonyms, &builder.acronym);
    }

    parsed.terms.push(OntologyTerm {
        rid,
        label,
        definition: builder.definition,
        synonyms,
        parents: builder.parents,
    });
}

fn is_system_uri(uri: &str) -> bool {
    SYSTEM_NAMESPACES.iter().any(|ns| uri.starts_with(ns))
}

/// Last path/fragment segment of a term URI
fn uri_tail(uri: &str) -> &str {
    let tail = uri.rsplit('/').next().unwrap_or(uri);
    tail.rsplit('#').next().unwrap_or(tail)
}
