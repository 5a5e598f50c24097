// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// PIPELINE DE AVALIAÇÃO
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//
// Executa as avaliações habilitadas em uma ORDEM FIXA -- attribution,
// definitive, freshness, plurality, completeness -- com falha rápida: a
// primeira reprovação interrompe o pipeline sem gastar tokens nas demais.
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

use super::{EvalError, EvaluationContext, EvaluationResult, EvaluationType, PromptPair};
use crate::generator::{generate_object, GenerateRequest, LlmProvider, ModelTag};
use crate::types::Reference;
use crate::utils::TokenTracker;
use serde::Deserialize;
use serde_json::json;

/// Estimativa de pior caso para uma chamada de avaliação, usada como guarda
/// prévia de budget -- mesmo valor do `max_tokens` padrão de `ModelTag::Evaluator`.
const EVALUATOR_TOKEN_ESTIMATE: u64 = 1000;

/// Ordem fixa em que as avaliações habilitadas são executadas.
pub const FIXED_ORDER: [EvaluationType; 5] = [
    EvaluationType::Attribution,
    EvaluationType::Definitive,
    EvaluationType::Freshness,
    EvaluationType::Plurality,
    EvaluationType::Completeness,
];

/// Resultado do pipeline de avaliação
#[derive(Debug)]
pub struct EvaluationPipelineResult {
    /// Se todas as avaliações passaram
    pub overall_passed: bool,
    /// Resultados individuais de cada avaliação
    pub results: Vec<EvaluationResult>,
    /// Tipo de avaliação onde falhou (se aplicável)
    pub failed_at: Option<EvaluationType>,
}

impl EvaluationPipelineResult {
    /// Cria um resultado de sucesso
    pub fn success(results: Vec<EvaluationResult>) -> Self {
        Self { overall_passed: true, results, failed_at: None }
    }

    /// Cria um resultado de falha
    pub fn failure(results: Vec<EvaluationResult>, failed_at: EvaluationType) -> Self {
        Self { overall_passed: false, results, failed_at: Some(failed_at) }
    }

    /// Retorna o motivo da falha formatado
    pub fn failure_reason(&self) -> Option<String> {
        self.results.last().filter(|r| !r.passed).map(|r| format!("{}: {}", r.eval_type, r.reasoning))
    }

    /// Retorna sugestões de melhoria
    pub fn all_suggestions(&self) -> Vec<String> {
        self.results.iter().flat_map(|r| r.suggestions.clone()).collect()
    }
}

#[derive(Debug, Deserialize)]
struct EvalResponse {
    passed: bool,
    confidence: f32,
    reasoning: String,
    #[serde(default)]
    suggestions: Vec<String>,
}

fn eval_schema() -> serde_json::Value {
    json!({
        "type": "object",
        "properties": {
            "passed": { "type": "boolean" },
            "confidence": { "type": "number" },
            "reasoning": { "type": "string" },
            "suggestions": { "type": "array", "items": { "type": "string" } }
        },
        "required": ["passed", "confidence", "reasoning"]
    })
}

/// Pipeline de avaliação multidimensional.
///
/// Executa as avaliações habilitadas na `FIXED_ORDER`, com falha rápida: se
/// uma avaliação falha, as próximas não são executadas.
pub struct EvaluationPipeline<'a> {
    provider: &'a dyn LlmProvider,
}

impl<'a> EvaluationPipeline<'a> {
    /// Cria um novo pipeline com o provedor de LLM fornecido.
    pub fn new(provider: &'a dyn LlmProvider) -> Self {
        Self { provider }
    }

    /// Executa, na `FIXED_ORDER`, apenas os tipos presentes em
    /// `enabled_types` -- FALHA RÁPIDA no primeiro que reprovar. Cada chamada
    /// é guardada por `tracker.has_budget_for` antes de sair para o provedor;
    /// estourar o budget conta como reprovação imediata daquele tipo.
    pub async fn evaluate_sequential(
        &self,
        question: &str,
        answer: &str,
        references: &[Reference],
        context: &EvaluationContext,
        enabled_types: &[EvaluationType],
        tracker: &mut TokenTracker,
        step: usize,
    ) -> EvaluationPipelineResult {
        let mut results = Vec::new();

        for &eval_type in FIXED_ORDER.iter().filter(|t| enabled_types.contains(t)) {
            if !tracker.has_budget_for(EVALUATOR_TOKEN_ESTIMATE) {
                results.push(EvaluationResult::failure(
                    eval_type,
                    "token budget would be exceeded before this evaluation call".into(),
                    vec![],
                    0.0,
                ));
                return EvaluationPipelineResult::failure(results, eval_type);
            }

            let result = self.evaluate_single(eval_type, question, answer, references, context, tracker, step).await;

            match result {
                Ok(eval_result) => {
                    let passed = eval_result.passed;
                    results.push(eval_result);
                    if !passed {
                        return EvaluationPipelineResult::failure(results, eval_type);
                    }
                }
                Err(_) => {
                    results.push(EvaluationResult::failure(
                        eval_type,
                        "Evaluation error".into(),
                        vec!["Retry evaluation".into()],
                        0.0,
                    ));
                    return EvaluationPipelineResult::failure(results, eval_type);
                }
            }
        }

        EvaluationPipelineResult::success(results)
    }

    /// Executa uma única avaliação e registra o uso de tokens no tracker.
    async fn evaluate_single(
        &self,
        eval_type: EvaluationType,
        question: &str,
        answer: &str,
        references: &[Reference],
        context: &EvaluationContext,
        tracker: &mut TokenTracker,
        step: usize,
    ) -> Result<EvaluationResult, EvalError> {
        let start = std::time::Instant::now();
        let prompt = self.generate_prompt(eval_type, question, answer, references, context);

        let request = GenerateRequest::new(ModelTag::Evaluator, eval_schema(), &prompt.system, &prompt.user);
        let (value, usage) = generate_object(self.provider, self.provider, request)
            .await
            .map_err(|e| EvalError::LlmError(e.to_string()))?;
        tracker.track(step, eval_type.as_str(), usage.prompt_tokens, usage.completion_tokens);
        let response: EvalResponse =
            serde_json::from_value(value).map_err(|e| EvalError::ParseError(e.to_string()))?;

        Ok(EvaluationResult {
            eval_type,
            passed: response.passed,
            confidence: response.confidence,
            reasoning: response.reasoning,
            suggestions: response.suggestions,
            duration: start.elapsed(),
        })
    }

    /// Gera o prompt para um tipo específico de avaliação.
    fn generate_prompt(
        &self,
        eval_type: EvaluationType,
        question: &str,
        answer: &str,
        references: &[Reference],
        context: &EvaluationContext,
    ) -> PromptPair {
        match eval_type {
            EvaluationType::Definitive => self.definitive_prompt(question, answer),
            EvaluationType::Freshness => self.freshness_prompt(question, answer, context),
            EvaluationType::Plurality => self.plurality_prompt(question, answer),
            EvaluationType::Completeness => self.completeness_prompt(question, answer),
            EvaluationType::Attribution => self.attribution_prompt(question, answer, references),
        }
    }

    fn definitive_prompt(&self, question: &str, answer: &str) -> PromptPair {
        PromptPair {
            system: r#"
You are an evaluator checking if an answer is DEFINITIVE.
A definitive answer:
- States facts confidently without excessive hedging
- Does not use phrases like "I think", "maybe", "probably", "might be"
- Provides concrete information rather than vague generalities
- Acknowledges uncertainty only when genuinely uncertain, not as a habit

Respond with: passed (boolean), confidence (0-1), reasoning (string), suggestions (array, if failed).
"#.into(),
            user: format!("Question: {}\n\nAnswer to evaluate:\n{}", question, answer),
        }
    }

    fn freshness_prompt(&self, question: &str, answer: &str, context: &EvaluationContext) -> PromptPair {
        let threshold = EvaluationType::Freshness.freshness_threshold(&context.topic);
        let days = threshold.as_secs() / 86400;

        PromptPair {
            system: format!(
                r#"
You are evaluating if an answer contains sufficiently RECENT information.
Topic category: {:?}
Required freshness: information should not be older than {} days

Respond with: passed (boolean), confidence (0-1), reasoning (string), suggestions (array, if failed).
"#,
                context.topic, days
            ),
            user: format!("Question: {}\n\nAnswer to evaluate:\n{}", question, answer),
        }
    }

    fn plurality_prompt(&self, question: &str, answer: &str) -> PromptPair {
        PromptPair {
            system: r#"
Count the number of distinct items/examples in the answer.
If the question asks for a specific number (e.g., "5 examples", "top 10"),
verify the answer provides at least that many.

Respond with: passed (boolean), confidence (0-1), reasoning (string), suggestions (array, if failed).
"#.into(),
            user: format!("Question: {}\n\nAnswer to evaluate:\n{}", question, answer),
        }
    }

    fn completeness_prompt(&self, question: &str, answer: &str) -> PromptPair {
        PromptPair {
            system: r#"
Evaluate if the answer addresses ALL aspects of the question.
First, identify the aspects/sub-questions in the question.
Then check if each aspect is adequately addressed (pass if >= 80% coverage).

Respond with: passed (boolean), confidence (0-1), reasoning (string), suggestions (array, if failed).
"#.into(),
            user: format!("Question: {}\n\nAnswer to evaluate:\n{}", question, answer),
        }
    }

    fn attribution_prompt(&self, question: &str, answer: &str, references: &[Reference]) -> PromptPair {
        let reference_list = references
            .iter()
            .enumerate()
            .map(|(i, r)| {
                format!(
                    "[{}] {} -- \"{}\"",
                    i + 1,
                    r.url,
                    r.exact_quote.as_deref().unwrap_or("")
                )
            })
            .collect::<Vec<_>>()
            .join("\n");

        PromptPair {
            system: r#"
You are a STRICT evaluator checking ATTRIBUTION.
Every factual claim in the answer must be traceable to one of the cited
references below. An answer fails if it:
- States facts with no matching reference
- Cites a reference that does not actually support the claim
- Contains an unsupported number, date, or quote

Respond with: passed (boolean), confidence (0-1), reasoning (string), suggestions (array, if failed).
"#.into(),
            user: format!(
                "Question: {}\n\nAnswer to evaluate:\n{}\n\nCited references:\n{}",
                question, answer, reference_list
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::MockLlmProvider;
    use crate::types::TopicCategory;

    fn context() -> EvaluationContext {
        EvaluationContext { topic: TopicCategory::General, knowledge_items: vec![] }
    }

    #[test]
    fn test_pipeline_result_success() {
        let results = vec![
            EvaluationResult::success(EvaluationType::Attribution, "Good".into(), 0.9),
            EvaluationResult::success(EvaluationType::Completeness, "Complete".into(), 0.85),
        ];

        let pipeline_result = EvaluationPipelineResult::success(results);
        assert!(pipeline_result.overall_passed);
        assert!(pipeline_result.failed_at.is_none());
        assert!(pipeline_result.failure_reason().is_none());
    }

    #[test]
    fn test_pipeline_result_failure() {
        let results = vec![
            EvaluationResult::success(EvaluationType::Attribution, "Good".into(), 0.9),
            EvaluationResult::failure(EvaluationType::Freshness, "Outdated info".into(), vec!["Update data".into()], 0.3),
        ];

        let pipeline_result = EvaluationPipelineResult::failure(results, EvaluationType::Freshness);
        assert!(!pipeline_result.overall_passed);
        assert_eq!(pipeline_result.failed_at, Some(EvaluationType::Freshness));
        assert!(pipeline_result.failure_reason().is_some());
    }

    #[test]
    fn test_all_suggestions() {
        let results = vec![
            EvaluationResult::failure(EvaluationType::Definitive, "Hedging".into(), vec!["Be more confident".into()], 0.4),
            EvaluationResult::failure(
                EvaluationType::Completeness,
                "Missing aspects".into(),
                vec!["Address X".into(), "Address Y".into()],
                0.5,
            ),
        ];

        let pipeline_result = EvaluationPipelineResult::failure(results, EvaluationType::Definitive);
        let suggestions = pipeline_result.all_suggestions();

        assert_eq!(suggestions.len(), 3);
        assert!(suggestions.contains(&"Be more confident".to_string()));
    }

    #[tokio::test]
    async fn test_evaluate_sequential_fails_fast_at_attribution() {
        let provider = MockLlmProvider::with_response(
            r#"{"passed":false,"confidence":0.2,"reasoning":"no matching reference","suggestions":[]}"#,
        );
        let pipeline = EvaluationPipeline::new(&provider);
        let mut tracker = TokenTracker::new(Some(10_000));
        let result = pipeline
            .evaluate_sequential(
                "What is Rust?",
                "Rust is a systems language.",
                &[],
                &context(),
                &[EvaluationType::Attribution, EvaluationType::Definitive],
                &mut tracker,
                1,
            )
            .await;

        assert!(!result.overall_passed);
        assert_eq!(result.failed_at, Some(EvaluationType::Attribution));
        assert_eq!(result.results.len(), 1, "definitive must not run after attribution fails");
    }

    #[tokio::test]
    async fn test_evaluate_sequential_runs_in_fixed_order() {
        let provider = MockLlmProvider::with_response(
            r#"{"passed":true,"confidence":0.9,"reasoning":"ok","suggestions":[]}"#,
        );
        let pipeline = EvaluationPipeline::new(&provider);
        let mut tracker = TokenTracker::new(Some(10_000));
        let result = pipeline
            .evaluate_sequential(
                "q",
                "a",
                &[],
                &context(),
                &[EvaluationType::Completeness, EvaluationType::Attribution, EvaluationType::Definitive],
                &mut tracker,
                1,
            )
            .await;

        assert!(result.overall_passed);
        let order: Vec<_> = result.results.iter().map(|r| r.eval_type).collect();
        assert_eq!(
            order,
            vec![EvaluationType::Attribution, EvaluationType::Definitive, EvaluationType::Completeness]
        );
        assert!(tracker.total_tokens() > 0, "tokens from evaluator calls must be tracked");
    }

    #[tokio::test]
    async fn test_evaluate_sequential_fails_fast_on_exhausted_budget() {
        let provider = MockLlmProvider::with_response(
            r#"{"passed":true,"confidence":0.9,"reasoning":"ok","suggestions":[]}"#,
        );
        let pipeline = EvaluationPipeline::new(&provider);
        let mut tracker = TokenTracker::new(Some(10));
        let result = pipeline
            .evaluate_sequential("q", "a", &[], &context(), &[EvaluationType::Definitive], &mut tracker, 1)
            .await;

        assert!(!result.overall_passed);
        assert_eq!(tracker.total_tokens(), 0, "no call should have gone out once budget was exhausted");
    }
}
