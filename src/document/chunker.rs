//! Shared semantic chunking algorithm
//!
//! Groups page text into sections under detected headers, then emits one
//! chunk per section, splitting oversized sections at paragraph boundaries
//! with the header re-prefixed onto every piece. Header detection is
//! injected by the caller, so the same algorithm serves documents with very
//! different header conventions.

use crate::config::ChunkingConfig;
use crate::document::Page;

/// A positive header classification
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeaderMatch {
    /// Nesting level, 1 = top-level section
    pub level: u8,
}

/// Distinguishes section headers from body text.
///
/// This predicate is the only thing that differs between document kinds;
/// everything downstream of it is shared.
pub trait HeaderClassifier {
    fn classify(&self, line: &str) -> Option<HeaderMatch>;
}

/// Policy for body text appearing before the first detected header
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LeadingText {
    /// Drop it silently
    Drop,
    /// Emit it as a headerless chunk
    Emit,
}

/// One emitted section chunk, before source-specific metadata is attached
#[derive(Debug, Clone, PartialEq)]
pub struct SectionChunk {
    /// Chunk text; begins with the section header when one was detected
    pub text: String,
    /// Page the section started on
    pub page: u32,
    /// Detected section header, if any
    pub section: Option<String>,
    /// Last sub-header seen inside the section, if any
    pub subsection: Option<String>,
}

/// Structural element produced by the detection pass
#[derive(Debug)]
enum Element {
    Header { text: String, level: u8, page: u32 },
    Content { text: String, page: u32 },
}

/// Header-aware document chunker
pub struct SemanticChunker<C: HeaderClassifier> {
    classifier: C,
    max_chunk_size: usize,
    leading_text: LeadingText,
}

impl<C: HeaderClassifier> SemanticChunker<C> {
    pub fn new(classifier: C, config: &ChunkingConfig, leading_text: LeadingText) -> Self {
        Self {
            classifier,
            max_chunk_size: config.max_chunk_size,
            leading_text,
        }
    }

    /// Chunk page-ordered text into section chunks, in document order.
    pub fn chunk_pages(&self, pages: &[Page]) -> Vec<SectionChunk> {
        let elements = self.detect_structure(pages);
        self.group_sections(&elements)
    }

    /// Pass 1: classify every line as header or body, accumulating body
    /// lines into content elements. Blank lines become paragraph breaks.
    fn detect_structure(&self, pages: &[Page]) -> Vec<Element> {
        let mut elements = Vec::new();

        for page in pages {
            let mut buffer: Vec<&str> = Vec::new();

            for line in page.text.lines() {
                let line = line.trim();

                if line.is_empty() {
                    // Collapse runs of blank lines into one paragraph break
                    if buffer.last().is_some_and(|last| !last.is_empty()) {
                        buffer.push("");
                    }
                    continue;
                }

                if let Some(header) = self.classifier.classify(line) {
                    flush_buffer(&mut buffer, page.number, &mut elements);
                    elements.push(Element::Header {
                        text: line.to_string(),
                        level: header.level,
                        page: page.number,
                    });
                } else {
                    buffer.push(line);
                }
            }

            flush_buffer(&mut buffer, page.number, &mut elements);
        }

        elements
    }

    /// Pass 2: group content under each header until the next header of the
    /// same or higher level. Sub-headers one level down are recorded as the
    /// section's subsection; their content folds into the parent section.
    fn group_sections(&self, elements: &[Element]) -> Vec<SectionChunk> {
        let mut chunks = Vec::new();
        let mut i = 0;

        while i < elements.len() {
            match &elements[i] {
                Element::Header { text, level, page } => {
                    let header = text.as_str();
                    let header_level = *level;
                    let start_page = *page;
                    let mut content: Vec<&str> = Vec::new();
                    let mut subsection: Option<String> = None;
                    i += 1;

                    while i < elements.len() {
                        match &elements[i] {
                            Element::Header {
                                text: next_text,
                                level: next_level,
                                ..
                            } => {
                                if *next_level <= header_level {
                                    break;
                                }
                                if *next_level == header_level + 1 {
                                    subsection = Some(next_text.clone());
                                }
                            }
                            Element::Content { text, .. } => content.push(text),
                        }
                        i += 1;
                    }

                    // Header with no body text is dropped, never emitted
                    if !content.is_empty() {
                        self.emit_section(header, start_page, &content, &subsection, &mut chunks);
                    }
                }
                Element::Content { text, page } => {
                    if self.leading_text == LeadingText::Emit {
                        self.emit_leading(text, *page, &mut chunks);
                    }
                    i += 1;
                }
            }
        }

        chunks
    }

    /// Emit one section, splitting at paragraph boundaries when the combined
    /// header + body exceeds the maximum. Every piece re-carries the header.
    fn emit_section(
        &self,
        header: &str,
        page: u32,
        content: &[&str],
        subsection: &Option<String>,
        out: &mut Vec<SectionChunk>,
    ) {
        let make_chunk = |text: String| SectionChunk {
            text,
            page,
            section: Some(header.to_string()),
            subsection: subsection.clone(),
        };

        let body = content.join("\n\n");
        let full = format!("{}\n\n{}", header, body);

        if char_len(&full) <= self.max_chunk_size {
            out.push(make_chunk(full));
            return;
        }

        let header_len = char_len(header);
        let mut current: Vec<&str> = vec![header];
        let mut current_len = header_len + 2;

        for paragraph in body.split("\n\n") {
            if paragraph.trim().is_empty() {
                continue;
            }
            let paragraph_len = char_len(paragraph);

            if paragraph_len > self.max_chunk_size {
                // The one documented exception: a single paragraph larger
                // than the maximum is hard-split at character boundaries.
                if current.len() > 1 {
                    out.push(make_chunk(current.join("\n\n")));
                }
                current = vec![header];
                current_len = header_len + 2;

                let piece_size = self
                    .max_chunk_size
                    .saturating_sub(header_len + 2)
                    .max(1);
                for piece in split_at_chars(paragraph, piece_size) {
                    out.push(make_chunk(format!("{}\n\n{}", header, piece)));
                }
                continue;
            }

            if current_len + paragraph_len + 2 > self.max_chunk_size {
                if current.len() > 1 {
                    out.push(make_chunk(current.join("\n\n")));
                }
                current = vec![header, paragraph];
                current_len = header_len + paragraph_len + 4;
            } else {
                current.push(paragraph);
                current_len += paragraph_len + 2;
            }
        }

        if current.len() > 1 {
            out.push(make_chunk(current.join("\n\n")));
        }
    }

    /// Emit headerless leading text, honoring the same size bound as
    /// headered sections.
    fn emit_leading(&self, text: &str, page: u32, out: &mut Vec<SectionChunk>) {
        let make_chunk = |text: String| SectionChunk {
            text,
            page,
            section: None,
            subsection: None,
        };

        if char_len(text) <= self.max_chunk_size {
            out.push(make_chunk(text.to_string()));
            return;
        }

        let mut current: Vec<&str> = Vec::new();
        let mut current_len = 0;

        for paragraph in text.split("\n\n") {
            if paragraph.trim().is_empty() {
                continue;
            }
            let paragraph_len = char_len(paragraph);

            if paragraph_len > self.max_chunk_size {
                if !current.is_empty() {
                    out.push(make_chunk(current.join("\n\n")));
                    current = Vec::new();
                    current_len = 0;
                }
                for piece in split_at_chars(paragraph, self.max_chunk_size) {
                    out.push(make_chunk(piece.to_string()));
                }
                continue;
            }

            if current.is_empty() {
                current.push(paragraph);
                current_len = paragraph_len;
            } else if current_len + paragraph_len + 2 > self.max_chunk_size {
                out.push(make_chunk(current.join("\n\n")));
                current = vec![paragraph];
                current_len = paragraph_len;
            } else {
                current.push(paragraph);
                current_len += paragraph_len + 2;
            }
        }

        if !current.is_empty() {
            out.push(make_chunk(current.join("\n\n")));
        }
    }
}

fn flush_buffer(buffer: &mut Vec<&str>, page: u32, elements: &mut Vec<Element>) {
    while buffer.last().is_some_and(|last| last.is_empty()) {
        buffer.pop();
    }
    if !buffer.is_empty() {
        elements.push(Element::Content {
            text: buffer.join("\n"),
            page,
        });
    }
    buffer.clear();
}

fn char_len(text: &str) -> usize {
    text.chars().count()
}

/// Split text into pieces of at most `piece_size` characters, respecting
/// char boundaries
fn split_at_chars(text: &str, piece_size: usize) -> Vec<&str> {
    let mut pieces = Vec::new();
    let mut start = 0;
    let mut count = 0;

    for (offset, _) in text.char_indices() {
        if count == piece_size {
            pieces.push(&text[start..offset]);
            start = offset;
            count = 0;
        }
        count += 1;
    }
    if start < text.len() {
        pieces.push(&text[start..]);
    }

    pieces
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Markdown-ish markers, for structural tests
    struct MarkerClassifier;

    impl HeaderClassifier for MarkerClassifier {
        fn classify(&self, line: &str) -> Option<HeaderMatch> {
            if line.starts_with("## ") {
                Some(HeaderMatch { level: 2 })
            } else if line.starts_with("# ") {
                Some(HeaderMatch { level: 1 })
            } else {
                None
            }
        }
    }

    /// Numbered section headers ("3.1 Target Lesions"), for size tests
    struct NumberedClassifier;

    impl HeaderClassifier for NumberedClassifier {
        fn classify(&self, line: &str) -> Option<HeaderMatch> {
            if line.starts_with(|c: char| c.is_ascii_digit()) {
                Some(HeaderMatch { level: 1 })
            } else {
                None
            }
        }
    }

    fn page(number: u32, text: &str) -> Page {
        Page {
            number,
            text: text.to_string(),
        }
    }

    fn chunker<C: HeaderClassifier>(
        classifier: C,
        max: usize,
        leading: LeadingText,
    ) -> SemanticChunker<C> {
        SemanticChunker::new(classifier, &ChunkingConfig { max_chunk_size: max }, leading)
    }

    #[test]
    fn test_section_grouping() {
        let pages = [page(
            1,
            "# Introduction\nFirst paragraph.\n\nSecond paragraph.\n# Methods\nHow it was done.",
        )];
        let chunks =
            chunker(MarkerClassifier, 3000, LeadingText::Emit).chunk_pages(&pages);

        assert_eq!(chunks.len(), 2);
        assert_eq!(
            chunks[0].text,
            "# Introduction\n\nFirst paragraph.\n\nSecond paragraph."
        );
        assert_eq!(chunks[0].section.as_deref(), Some("# Introduction"));
        assert_eq!(chunks[1].text, "# Methods\n\nHow it was done.");
    }

    #[test]
    fn test_header_reprefixed_on_split() {
        // 6000-character body with two paragraph breaks, max 3000
        let body = format!(
            "{}\n\n{}\n\n{}",
            "a".repeat(2000),
            "b".repeat(2000),
            "c".repeat(2000)
        );
        let pages = [page(1, &format!("3.1 Target Lesions\n{}", body))];

        let chunks =
            chunker(NumberedClassifier, 3000, LeadingText::Drop).chunk_pages(&pages);

        assert!(chunks.len() >= 2);
        for chunk in &chunks {
            assert!(chunk.text.starts_with("3.1 Target Lesions"));
            assert!(chunk.text.chars().count() <= 3000);
        }
    }

    #[test]
    fn test_oversized_paragraph_hard_split() {
        let body = "x".repeat(7000);
        let pages = [page(1, &format!("1. Oversized\n{}", body))];

        let chunks =
            chunker(NumberedClassifier, 3000, LeadingText::Drop).chunk_pages(&pages);

        assert!(chunks.len() >= 3);
        let mut rejoined = String::new();
        for chunk in &chunks {
            assert!(chunk.text.starts_with("1. Oversized\n\n"));
            assert!(chunk.text.chars().count() <= 3000);
            rejoined.push_str(chunk.text.trim_start_matches("1. Oversized\n\n"));
        }
        // No characters lost to the hard split
        assert_eq!(rejoined, body);
    }

    #[test]
    fn test_leading_text_policy() {
        let pages = [page(1, "Preamble before any header.\n# Section\nBody text.")];

        let emitted =
            chunker(MarkerClassifier, 3000, LeadingText::Emit).chunk_pages(&pages);
        assert_eq!(emitted.len(), 2);
        assert_eq!(emitted[0].text, "Preamble before any header.");
        assert_eq!(emitted[0].section, None);

        let dropped =
            chunker(MarkerClassifier, 3000, LeadingText::Drop).chunk_pages(&pages);
        assert_eq!(dropped.len(), 1);
        assert_eq!(dropped[0].section.as_deref(), Some("# Section"));
    }

    #[test]
    fn test_leading_text_honors_size_bound() {
        // Header-free content larger than the bound, with paragraph breaks
        let text = format!(
            "{}\n\n{}\n\n{}",
            "a".repeat(60),
            "b".repeat(60),
            "c".repeat(60)
        );
        let pages = [page(1, &text)];

        let chunks = chunker(MarkerClassifier, 100, LeadingText::Emit).chunk_pages(&pages);

        assert!(chunks.len() >= 2);
        let mut rejoined = String::new();
        for chunk in &chunks {
            assert!(chunk.text.chars().count() <= 100);
            assert_eq!(chunk.section, None);
            rejoined.push_str(&chunk.text.replace('\n', ""));
        }
        assert_eq!(rejoined, text.replace('\n', ""));
    }

    #[test]
    fn test_oversized_leading_paragraph_hard_split() {
        // One headerless paragraph with no break at all
        let text = "y".repeat(250);
        let pages = [page(1, &text)];

        let chunks = chunker(MarkerClassifier, 100, LeadingText::Emit).chunk_pages(&pages);

        assert_eq!(chunks.len(), 3);
        let rejoined: String = chunks.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(rejoined, text);
        for chunk in &chunks {
            assert!(chunk.text.chars().count() <= 100);
        }
    }

    #[test]
    fn test_subsection_content_folds_into_section() {
        let pages = [page(
            1,
            "# Response Criteria\nOverview text.\n## Complete Response\nDisappearance of all lesions.",
        )];
        let chunks =
            chunker(MarkerClassifier, 3000, LeadingText::Drop).chunk_pages(&pages);

        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].section.as_deref(), Some("# Response Criteria"));
        assert_eq!(
            chunks[0].subsection.as_deref(),
            Some("## Complete Response")
        );
        assert!(chunks[0].text.contains("Disappearance of all lesions."));
    }

    #[test]
    fn test_empty_section_dropped() {
        let pages = [page(1, "# Empty Section\n# Filled Section\nContent here.")];
        let chunks =
            chunker(MarkerClassifier, 3000, LeadingText::Drop).chunk_pages(&pages);

        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].section.as_deref(), Some("# Filled Section"));
    }

    #[test]
    fn test_section_spans_pages() {
        let pages = [
            page(3, "# Assessment\nStarted on page three."),
            page(4, "Continued on page four."),
        ];
        let chunks =
            chunker(MarkerClassifier, 3000, LeadingText::Drop).chunk_pages(&pages);

        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].page, 3);
        assert!(chunks[0].text.contains("Continued on page four."));
    }

    #[test]
    fn test_exact_boundary_not_split() {
        // header (10) + separator (2) + body: sized to land exactly on max
        let header = "1. abcdefg";
        let body = "z".repeat(88);
        let pages = [page(1, &format!("{}\n{}", header, body))];

        let chunks = chunker(NumberedClassifier, 100, LeadingText::Drop).chunk_pages(&pages);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].text.chars().count(), 100);
    }

    #[test]
    fn test_split_at_chars_multibyte() {
        let text = "ééééé";
        let pieces = split_at_chars(text, 2);
        assert_eq!(pieces, vec!["éé", "éé", "é"]);
    }
}
