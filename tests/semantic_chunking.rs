//! Semantic chunking behavior through the document processors

use radchunk::document::Page;
use radchunk::{ChunkingConfig, GuidelineProcessor, MetaValue, StagingProcessor};
use std::collections::HashSet;

fn paragraph(sentence: &str, repeats: usize) -> String {
    sentence.repeat(repeats).trim_end().to_string()
}

#[test]
fn test_oversized_section_splits_with_header_reprefix() {
    let header = "3.1 Target Lesions";
    let body = [
        paragraph("lesions are measured in the axial plane using calipers. ", 40),
        paragraph("a maximum of two lesions per organ may be selected. ", 40),
        paragraph("the sum of diameters is recorded at baseline. ", 40),
    ]
    .join("\n\n");

    let pages = [Page {
        number: 1,
        text: format!("{}\n{}", header, body),
    }];

    let processor = GuidelineProcessor::new(
        "recist_guidelines.pdf",
        &ChunkingConfig { max_chunk_size: 3000 },
    );
    let chunks = processor.chunks_from_pages(&pages).unwrap();

    assert!(chunks.len() >= 2);
    for chunk in &chunks {
        assert!(chunk.text.starts_with(header));
        assert!(chunk.text.chars().count() <= 3000);
        assert!(!chunk.text.trim().is_empty());
        assert_eq!(
            chunk.metadata.get("section"),
            Some(&MetaValue::String(header.to_string()))
        );
    }

    // Sequential, pairwise-distinct ids in document order
    let ids: HashSet<&str> = chunks.iter().map(|c| c.id.as_str()).collect();
    assert_eq!(ids.len(), chunks.len());
    assert_eq!(chunks[0].id, "recist_chunk_0");
}

#[test]
fn test_section_within_bound_stays_whole() {
    let pages = [Page {
        number: 1,
        text: "3.2 Non-Target Lesions\nAll other lesions are recorded qualitatively.".to_string(),
    }];

    let processor = GuidelineProcessor::new(
        "recist_guidelines.pdf",
        &ChunkingConfig { max_chunk_size: 3000 },
    );
    let chunks = processor.chunks_from_pages(&pages).unwrap();

    assert_eq!(chunks.len(), 1);
    assert_eq!(
        chunks[0].text,
        "3.2 Non-Target Lesions\n\nAll other lesions are recorded qualitatively."
    );
}

#[test]
fn test_staging_sections_carry_categories() {
    let pages = [
        Page {
            number: 3,
            text: "Lung Cancer T Classification\nT1 tumor of 3 cm or less surrounded by lung or visceral pleura."
                .to_string(),
        },
        Page {
            number: 4,
            text: "Lung Cancer N Classification\nN1 metastasis in ipsilateral peribronchial nodes."
                .to_string(),
        },
    ];

    let processor = StagingProcessor::new(
        "lung_staging_protocol.pdf",
        &ChunkingConfig { max_chunk_size: 3000 },
        "Lung",
    );
    let chunks = processor.chunks_from_pages(&pages).unwrap();

    assert_eq!(chunks.len(), 2);
    assert_eq!(chunks[0].id, "tnm_lung_chunk_0");
    assert_eq!(chunks[1].id, "tnm_lung_chunk_1");

    assert_eq!(
        chunks[0].metadata.get("category"),
        Some(&MetaValue::String("T-staging".to_string()))
    );
    assert_eq!(
        chunks[1].metadata.get("category"),
        Some(&MetaValue::String("N-staging".to_string()))
    );
    assert_eq!(chunks[0].metadata.get("page"), Some(&MetaValue::Integer(3)));
    assert_eq!(chunks[1].metadata.get("page"), Some(&MetaValue::Integer(4)));
    assert_eq!(
        chunks[0].metadata.get("cancer_type"),
        Some(&MetaValue::String("Lung".to_string()))
    );
}

#[test]
fn test_single_oversized_paragraph_hard_split_keeps_text() {
    let header = "2. Measurement Methods";
    // One paragraph, no blank lines, well over the bound
    let body = paragraph("all measurements use the same assessment technique. ", 90);

    let pages = [Page {
        number: 1,
        text: format!("{}\n{}", header, body),
    }];

    let processor = GuidelineProcessor::new(
        "recist_guidelines.pdf",
        &ChunkingConfig { max_chunk_size: 1000 },
    );
    let chunks = processor.chunks_from_pages(&pages).unwrap();

    assert!(chunks.len() > 1);
    for chunk in &chunks {
        assert!(chunk.text.starts_with(header));
        assert!(chunk.text.chars().count() <= 1000);
    }

    // No characters of the body are lost across the split
    let mut recovered = String::new();
    for chunk in &chunks {
        recovered.push_str(
            chunk
                .text
                .strip_prefix(header)
                .unwrap()
                .trim_start_matches('\n'),
        );
    }
    assert_eq!(recovered.replace('\n', ""), body.replace('\n', ""));
}
