// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// DEEP RESEARCH - IMPLEMENTAÇÃO RUST
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//
// Este crate implementa um agente de pesquisa iterativo:
//
// 1. Máquina de estados para o raciocínio do agente
//    - Estados: Processing, BeastMode, Completed, Failed
//    - Ações: Search, Read, Reflect, Answer
//    - Transições explícitas e type-safe
//
// 2. Avaliação multidimensional
//    - 5 tipos: Attribution, Definitive, Freshness, Plurality, Completeness
//    - Pipeline de ordem fixa com falha rápida
//
// 3. Gerador de saída estruturada seguro
//    - Contrato genérico generate_object com schema + fallback
//    - Recuperação em estágios: parse estrito -> lenient -> retry -> modelo de fallback
//
// 4. Performance
//    - SIMD (AVX2) para similaridade cosseno usada por dedup e referências
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

pub mod agent;
pub mod config;
pub mod evaluation;
pub mod generator;
pub mod performance;
pub mod search;
pub mod types;
pub mod utils;

// Re-exports principais
pub use agent::DeepResearchAgent;
pub use evaluation::{EvaluationPipeline, EvaluationType};
pub use generator::LlmProvider;
pub use performance::simd::cosine_similarity;
pub use types::*;

/// Versão da biblioteca
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude com imports comuns
pub mod prelude {
    pub use crate::agent::{
        ActionPermissions, AgentAction, AgentContext, AgentState, DeepResearchAgent,
    };
    pub use crate::evaluation::{EvaluationContext, EvaluationPipeline, EvaluationResult, EvaluationType};
    pub use crate::generator::{GenerateRequest, GenerateResponse, LlmProvider, ModelTag};
    pub use crate::performance::simd::{cosine_similarity, dedup_queries, find_similar};
    pub use crate::types::*;
}
