// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// CLASSIFICADOR DE AVALIAÇÕES NECESSÁRIAS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//
// Decide quais dimensões de avaliação (além de Attribution, sempre presente
// quando há referências) uma pergunta exige. Tenta um LLM primeiro; se a
// chamada falhar ou a saída não puder ser recuperada, cai para a heurística
// pura de `evaluation::determiner`.
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

use crate::evaluation::{determiner, EvaluationType};
use crate::generator::{generate_object, GenerateRequest, LlmProvider, ModelTag};
use serde::Deserialize;
use serde_json::json;

#[derive(Debug, Deserialize)]
struct ClassificationResponse {
    needs_definitive: bool,
    needs_freshness: bool,
    needs_plurality: bool,
    needs_completeness: bool,
}

fn classification_schema() -> serde_json::Value {
    json!({
        "type": "object",
        "properties": {
            "needs_definitive": { "type": "boolean" },
            "needs_freshness": { "type": "boolean" },
            "needs_plurality": { "type": "boolean" },
            "needs_completeness": { "type": "boolean" }
        },
        "required": ["needs_definitive", "needs_freshness", "needs_plurality", "needs_completeness"]
    })
}

const SYSTEM_PROMPT: &str = r#"Analyze the question and determine which evaluation dimensions are needed:
- definitive: does this question have a clear factual answer that should be stated confidently?
- freshness: is time-sensitive or recent information relevant?
- plurality: does it ask for multiple items/examples?
- completeness: does it have multiple sub-questions or aspects?"#;

/// Classifica quais tipos de avaliação (fora Attribution) uma pergunta exige.
///
/// Chama o provedor de LLM com `ModelTag::Evaluator`; em caso de falha de
/// geração ou de parsing recuperado, cai para a heurística determinística.
pub async fn classify_question(question: &str, provider: &dyn LlmProvider) -> Vec<EvaluationType> {
    let request = GenerateRequest::new(ModelTag::Evaluator, classification_schema(), SYSTEM_PROMPT, question)
        .with_retries(1);

    match generate_object(provider, provider, request).await {
        Ok((value, _usage)) => match serde_json::from_value::<ClassificationResponse>(value) {
            Ok(resp) => resp.into_types(),
            Err(e) => {
                log::warn!("classifier: resposta não pôde ser decodificada ({e}), usando heurística");
                determiner::determine_required_evaluations(question)
            }
        },
        Err(e) => {
            log::warn!("classifier: chamada ao LLM falhou ({e}), usando heurística");
            determiner::determine_required_evaluations(question)
        }
    }
}

impl ClassificationResponse {
    /// Nenhuma flag marcada é um resultado legítimo (saudação, trivia,
    /// paradoxo) e deve produzir zero critérios, não `Definitive` por padrão.
    fn into_types(self) -> Vec<EvaluationType> {
        let mut types = Vec::new();
        if self.needs_completeness {
            types.push(EvaluationType::Completeness);
        }
        if self.needs_plurality {
            types.push(EvaluationType::Plurality);
        }
        if self.needs_definitive {
            types.push(EvaluationType::Definitive);
        }
        if self.needs_freshness {
            types.push(EvaluationType::Freshness);
        }
        types
    }
}
