//! Propriedade: para todo step, `tokens_before + estimated <= budget`; caso
//! contrário a chamada ao LLM não deve ocorrer e o agente deve sinalizar
//! esgotamento de budget em vez de seguir em frente silenciosamente.

use deep_research::generator::MockLlmProvider;
use deep_research::search::MockSearchClient;
use deep_research::utils::TokenTracker;
use deep_research::DeepResearchAgent;
use std::sync::Arc;

#[test]
fn test_has_budget_for_respects_the_exact_boundary() {
    let mut tracker = TokenTracker::new(Some(1000));
    tracker.track(1, "op", 400, 400);

    // Exatamente no limite ainda cabe; um token a mais não cabe.
    assert!(tracker.has_budget_for(200));
    assert!(!tracker.has_budget_for(201));
}

#[tokio::test]
async fn test_agent_run_never_exceeds_budget_by_more_than_one_calls_worth() {
    // Budget minúsculo: a primeira chamada de decide_action já estoura o
    // teto do model tag "agent" (2000 tokens), então o guard prévio deve
    // impedi-la -- nenhum token real deve ser gasto.
    let provider = Arc::new(MockLlmProvider::with_response(
        r#"{"think":"t","action":"search","queries":["q"]}"#,
    ));
    let search = Arc::new(MockSearchClient::new());
    let mut agent = DeepResearchAgent::new(provider, search, Some(10));

    let result = agent.run("A question that needs real research").await;

    // O guard disparou antes de qualquer chamada real ao provedor: nenhum
    // token foi registrado.
    assert_eq!(result.token_usage.total_tokens, 0, "no LLM call should have gone out once budget was exhausted");
    assert!(!result.success);
}

#[tokio::test]
async fn test_agent_reports_failure_instead_of_silently_overrunning_budget() {
    let provider = Arc::new(MockLlmProvider::new());
    let search = Arc::new(MockSearchClient::new());
    let mut agent = DeepResearchAgent::new(provider, search, Some(1));

    let result = agent.run("q").await;

    assert!(!result.success);
    assert!(result.error.is_some(), "budget exhaustion must surface as an explicit error, not a silent stop");
}
