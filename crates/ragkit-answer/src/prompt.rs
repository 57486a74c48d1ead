use ragkit_core::{Citation, ScoredDocument};

/// Answer returned when retrieval found nothing; the generator is not called.
pub const NO_CONTEXT_ANSWER: &str = "Sorry, no relevant material was found for this question.";

const GROUNDED_INSTRUCTIONS: &str = "Answer the question using the reference material below. \
Prefer the material over your own knowledge and cite the markers you rely on, for example [source 1]. \
If the material does not contain enough information to answer, say so explicitly instead of guessing.";

/// Builds the grounded prompt. Marker `k` (1-based) refers to `retrieved[k - 1]`.
pub fn grounded_prompt(question: &str, retrieved: &[ScoredDocument]) -> (String, Vec<Citation>) {
    let mut citations = Vec::with_capacity(retrieved.len());
    let mut blocks = Vec::with_capacity(retrieved.len());
    for (i, hit) in retrieved.iter().enumerate() {
        let marker = i + 1;
        let meta = &hit.document.metadata;
        blocks.push(format!("[source {marker}] ({}, chunk {}): {}", meta.source, meta.chunk_id, hit.document.content));
        citations.push(Citation { marker, source: meta.source.clone(), chunk_id: meta.chunk_id, score: hit.score });
    }
    let prompt = format!(
        "{GROUNDED_INSTRUCTIONS}\n\nReference material:\n{}\n\nQuestion: {}\n\nAnswer:",
        blocks.join("\n\n"),
        question.trim()
    );
    (prompt, citations)
}

pub fn extraction_prompt(instruction: &str, text: &str) -> String {
    format!(
        "{}\n\nRespond with a single valid JSON value and nothing else.\n\nText:\n{}\n\nJSON:",
        instruction.trim(),
        text.trim()
    )
}
