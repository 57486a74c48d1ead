use ragkit_core::Document;

pub const DEMO_SOURCE: &str = "demo";

const DEMO_SENTENCES: [&str; 4] = [
    "Multi-agent debate is a technique where several AI agents discuss a question from different viewpoints before settling on an answer.",
    "Through debate, agents can correct one another's mistakes, which leads to more accurate answers.",
    "RAG (retrieval-augmented generation) combines retrieval of relevant documents with text generation by a language model.",
    "FAISS is a library developed by Facebook for efficient similarity search over dense vectors.",
];

/// Small built-in corpus used when no source text yields a chunk.
///
/// Each sentence is one document; the chunker is bypassed.
pub fn demo_corpus() -> Vec<Document> {
    DEMO_SENTENCES
        .iter()
        .enumerate()
        .map(|(i, text)| Document::new(*text, DEMO_SOURCE, i, 0))
        .collect()
}
