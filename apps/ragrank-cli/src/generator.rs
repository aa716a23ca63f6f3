use std::collections::BTreeSet;

use ragrank_core::traits::Generator;
use ragrank_core::types::RankedResult;

/// Offline generator: quotes the best passage and lists where the rest came
/// from. Stands in for the external LLM.
pub struct SourceListGenerator;

impl Generator for SourceListGenerator {
    fn generate(&self, question: &str, chunks: &[RankedResult]) -> anyhow::Result<String> {
        let Some(best) = chunks.first() else {
            anyhow::bail!("no passages to answer from");
        };
        let sources: BTreeSet<&str> = chunks.iter().map(RankedResult::source).collect();
        let sources: Vec<&str> = sources.into_iter().collect();
        Ok(format!(
            "❓ {question}\n\n{}\n\n({} passages from: {})",
            best.text().trim(),
            chunks.len(),
            sources.join(", ")
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ragrank_core::types::{Candidate, Metadata};

    fn ranked(source: &str, text: &str, score: f32) -> RankedResult {
        let candidate = Candidate {
            id: format!("{source}-{score}"),
            text: text.to_string(),
            source: source.to_string(),
            order: 0,
            metadata: Metadata::new(),
            distance: 0.2,
        };
        RankedResult { candidate, rerank_score: score }
    }

    #[test]
    fn quotes_best_passage_and_dedups_sources() {
        let chunks = vec![ranked("b.md", " top passage ", 3.0), ranked("a.md", "x", 2.0), ranked("b.md", "y", 1.0)];
        let text = SourceListGenerator.generate("q?", &chunks).unwrap();
        assert!(text.contains("top passage\n"));
        assert!(text.ends_with("(3 passages from: a.md, b.md)"));
    }

    #[test]
    fn refuses_empty_input() {
        assert!(SourceListGenerator.generate("q?", &[]).is_err());
    }
}
