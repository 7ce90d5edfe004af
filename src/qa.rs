//! Question answering over accumulated reviews.
//!
//! A thin retrieval-augmented pass-through: embed the question, fetch the
//! nearest reviews from the index, hand their file/summary pairs to the
//! generation model as context, and return its answer verbatim. No
//! deduplication, ranking, or filtering happens here — that is the
//! retrieval layer's ordering and the model's synthesis.

use anyhow::{bail, Result};

use crate::embedding::Embedder;
use crate::index::ReviewIndex;
use crate::llm::TextGenerator;
use crate::models::ScopeKey;

/// Default number of reviews retrieved as context.
pub const DEFAULT_TOP_K: usize = 5;

/// Answer a free-text question using the scope's indexed reviews.
pub async fn answer_question(
    scope: &ScopeKey,
    question: &str,
    top_k: usize,
    generator: &dyn TextGenerator,
    embedder: &dyn Embedder,
    index: &ReviewIndex,
) -> Result<String> {
    if question.trim().is_empty() {
        bail!("question must not be empty");
    }

    let query_vec = embedder.embed(question).await?;
    let hits = index.query(&scope.collection(), &query_vec, top_k).await?;

    if hits.is_empty() {
        bail!("no indexed reviews for this scope; run a review first");
    }

    let prompt = build_context_prompt(question, &hits);
    generator.generate(&prompt).await
}

fn build_context_prompt(question: &str, hits: &[crate::models::QueryHit]) -> String {
    let mut prompt = String::from(
        "You are answering questions about code review findings. \
         Use only the review excerpts below.\n\n",
    );
    for hit in hits {
        prompt.push_str(&format!("File: {}\nReview: {}\n\n", hit.file, hit.summary));
    }
    prompt.push_str(&format!("Question: {}\nAnswer:", question));
    prompt
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::QueryHit;

    fn hit(file: &str, summary: &str) -> QueryHit {
        QueryHit {
            sequence_id: 1,
            file: file.to_string(),
            summary: summary.to_string(),
            score: 0.9,
        }
    }

    #[test]
    fn context_prompt_includes_hits_and_question() {
        let hits = vec![hit("a.py", "unused import"), hit("b.py", "long function")];
        let prompt = build_context_prompt("what should I fix first?", &hits);

        assert!(prompt.contains("File: a.py"));
        assert!(prompt.contains("unused import"));
        assert!(prompt.contains("File: b.py"));
        assert!(prompt.contains("Question: what should I fix first?"));
    }
}
