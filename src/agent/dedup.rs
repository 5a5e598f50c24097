// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// DEDUPLICAÇÃO DE QUERIES E PERGUNTAS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//
// Duas estratégias, nessa ordem de preferência:
// 1. Semântica: embeddings via `LlmProvider::embed_batch` + cosine similarity
//    SIMD (`performance::simd::dedup_queries`).
// 2. Textual: normalização (lowercase, remove pontuação, colapsa espaços) e
//    comparação por conjunto, usada quando embeddings falham.
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

use crate::generator::LlmProvider;
use crate::performance::simd;
use std::collections::HashSet;

/// Threshold de similaridade acima do qual duas queries são consideradas duplicatas.
pub const SIMILARITY_THRESHOLD: f32 = 0.86;

/// Normaliza texto para comparação: lowercase, remove pontuação, colapsa espaços.
pub fn normalize(text: &str) -> String {
    text.to_lowercase()
        .chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace())
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Deduplicação textual pura, sem chamadas externas: remove itens cuja forma
/// normalizada já apareceu em `seen` ou já foi vista neste mesmo batch.
pub fn dedup_text_fallback(items: Vec<String>, seen: &HashSet<String>) -> Vec<String> {
    let mut batch_seen = HashSet::new();
    items
        .into_iter()
        .filter(|item| {
            let key = normalize(item);
            if key.is_empty() || seen.contains(&key) || batch_seen.contains(&key) {
                false
            } else {
                batch_seen.insert(key);
                true
            }
        })
        .collect()
}

/// Deduplicação semântica de itens contra embeddings já executados.
///
/// Se `provider.embed_batch` falhar, cai para [`dedup_text_fallback`].
pub async fn dedup_with_embeddings(
    items: Vec<String>,
    existing_embeddings: &[Vec<f32>],
    seen_text: &HashSet<String>,
    provider: &dyn LlmProvider,
) -> (Vec<String>, Vec<Vec<f32>>) {
    if items.is_empty() {
        return (Vec::new(), Vec::new());
    }

    // Primeiro descarta duplicatas textuais óbvias -- barato e evita embeddings desperdiçados.
    let text_unique = dedup_text_fallback(items, seen_text);
    if text_unique.is_empty() {
        return (Vec::new(), Vec::new());
    }

    match provider.embed_batch(&text_unique).await {
        Ok(results) => {
            let embeddings: Vec<Vec<f32>> = results.into_iter().map(|r| r.vector).collect();
            let unique_indices = simd::dedup_queries(&embeddings, existing_embeddings, SIMILARITY_THRESHOLD);
            let unique_items: Vec<String> = unique_indices
                .iter()
                .map(|&i| text_unique[i].clone())
                .collect();
            let unique_embeddings: Vec<Vec<f32>> = unique_indices
                .into_iter()
                .map(|i| embeddings[i].clone())
                .collect();
            (unique_items, unique_embeddings)
        }
        Err(e) => {
            log::warn!("dedup: embed_batch falhou ({e}), mantendo apenas dedup textual");
            (text_unique, Vec::new())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::MockLlmProvider;

    #[test]
    fn test_normalize() {
        assert_eq!(normalize("What is  Rust?!"), "what is rust");
    }

    #[test]
    fn test_dedup_text_fallback_removes_exact_and_batch_dupes() {
        let seen: HashSet<String> = ["already seen".to_string()].into_iter().collect();
        let items = vec![
            "Already Seen!".to_string(),
            "New question".to_string(),
            "new question.".to_string(),
        ];
        let unique = dedup_text_fallback(items, &seen);
        assert_eq!(unique, vec!["New question".to_string()]);
    }

    #[tokio::test]
    async fn test_dedup_with_embeddings_uses_provider() {
        let provider = MockLlmProvider::new();
        let items = vec!["a".to_string(), "b".to_string()];
        let (unique, embeddings) =
            dedup_with_embeddings(items, &[], &HashSet::new(), &provider).await;
        assert_eq!(unique.len(), 2);
        assert_eq!(embeddings.len(), 2);
    }

    #[tokio::test]
    async fn test_dedup_with_embeddings_empty_input() {
        let provider = MockLlmProvider::new();
        let (unique, embeddings) =
            dedup_with_embeddings(vec![], &[], &HashSet::new(), &provider).await;
        assert!(unique.is_empty());
        assert!(embeddings.is_empty());
    }
}
