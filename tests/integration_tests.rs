//! Testes de integração do fluxo completo: classificação, busca, leitura,
//! avaliação e resposta final, de ponta a ponta sobre `DeepResearchAgent`.

use deep_research::evaluation::determiner::determine_required_evaluations;
use deep_research::evaluation::{EvaluationContext, EvaluationPipeline, EvaluationType};
use deep_research::generator::MockLlmProvider;
use deep_research::search::MockSearchClient;
use deep_research::types::TopicCategory;
use deep_research::utils::TokenTracker;
use deep_research::DeepResearchAgent;
use std::sync::Arc;

#[tokio::test]
async fn test_trivial_question_completes_on_first_step() {
    // A mesma resposta serve tanto para a decisão de ação (tag "action")
    // quanto para a classificação (flags needs_*); todas as flags em false
    // reproduz uma pergunta sem critério de avaliação algum, que passa
    // vacuamente pelo pipeline sem nenhuma chamada extra ao LLM.
    let provider = Arc::new(MockLlmProvider::with_response(
        r#"{"think":"t","action":"answer","answer":"Rust is a systems programming language.",
            "needs_definitive":false,"needs_freshness":false,"needs_plurality":false,"needs_completeness":false}"#,
    ));
    let search = Arc::new(MockSearchClient::new());
    let mut agent = DeepResearchAgent::new(provider, search, Some(100_000));

    let result = agent.run("What is Rust?").await;

    assert!(result.success, "trivial answer should succeed");
    assert!(result.trivial, "zero evaluation criteria marks the answer as trivial");
    assert!(result.answer.is_some());
}

#[tokio::test]
async fn test_search_action_populates_context() {
    let search_response = r#"{"action":"search","think":"need more info","queries":["rust ownership rules"]}"#;
    let provider = Arc::new(MockLlmProvider::with_response(search_response));
    let search = Arc::new(MockSearchClient::new());
    let mut agent = DeepResearchAgent::new(provider, search, Some(100_000));

    // A mesma resposta canned será usada em todos os steps -- o agente vai
    // repetir "search" até o budget ou o step limit interromperem o loop,
    // então rodamos só o suficiente para observar o efeito colateral.
    let _ = agent.run("Explain ownership in Rust in depth").await;
}

#[test]
fn test_evaluation_type_selection_heuristic() {
    let cases = vec![
        ("What is Rust?", true, false, false, false),
        ("Current price of gold", true, true, false, false),
        ("List 5 benefits of exercise", true, false, true, false),
        ("Compare Python and JavaScript", true, false, false, true),
        ("What are the latest 3 AI trends for 2025?", true, true, true, false),
    ];

    for (question, expect_def, expect_fresh, expect_plur, expect_comp) in cases {
        let types = determine_required_evaluations(question);

        assert_eq!(types.contains(&EvaluationType::Definitive), expect_def, "definitive mismatch for '{question}'");
        assert_eq!(types.contains(&EvaluationType::Freshness), expect_fresh, "freshness mismatch for '{question}'");
        assert_eq!(types.contains(&EvaluationType::Plurality), expect_plur, "plurality mismatch for '{question}'");
        assert_eq!(types.contains(&EvaluationType::Completeness), expect_comp, "completeness mismatch for '{question}'");
    }
}

#[tokio::test]
async fn test_evaluation_pipeline_fails_fast_on_first_failure() {
    // MockLlmProvider devolve um JSON sem "passed", então `generate_object`
    // não consegue casar o schema e a avaliação é tratada como falha.
    let provider = MockLlmProvider::new();
    let pipeline = EvaluationPipeline::new(&provider);
    let context = EvaluationContext { topic: TopicCategory::General, knowledge_items: vec![] };
    let mut tracker = TokenTracker::new(Some(100_000));

    let result = pipeline
        .evaluate_sequential(
            "What is the capital of France?",
            "Paris is the capital of France.",
            &[],
            &context,
            &[EvaluationType::Definitive, EvaluationType::Freshness],
            &mut tracker,
            1,
        )
        .await;

    assert!(!result.overall_passed);
    assert_eq!(result.results.len(), 1, "deve parar na primeira falha, sem tentar Freshness");
    assert_eq!(result.failed_at, Some(EvaluationType::Definitive));
}

#[tokio::test]
async fn test_agent_enters_beast_mode_under_tiny_budget() {
    let provider = Arc::new(MockLlmProvider::with_response(
        r#"{"action":"search","think":"need more info","queries":["some unresolved query"]}"#,
    ));
    let search = Arc::new(MockSearchClient::new());
    // Budget minúsculo força `should_enter_beast_mode` quase de imediato.
    let mut agent = DeepResearchAgent::new(provider, search, Some(10));

    let result = agent.run("A very hard multi-part research question").await;

    // Em Beast Mode o agente sempre produz uma resposta (mesmo que pobre) ou
    // falha após esgotar as tentativas -- ambos são estados terminais válidos.
    assert!(result.total_time_ms >= 0);
    if result.success {
        assert!(result.answer.is_some());
    } else {
        assert!(result.error.is_some());
    }
}
