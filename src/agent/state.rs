// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// MÁQUINA DE ESTADOS DO AGENTE
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

use crate::types::{KnowledgeItem, Reference};

/// Estado atual do agente de pesquisa.
#[derive(Debug, Clone)]
pub enum AgentState {
    /// Executando o loop principal.
    Processing {
        /// Step atual dentro da cadeia de bad attempts corrente.
        step: u32,
        /// Step total desde o início da sessão.
        total_step: u32,
        /// Pergunta sendo processada neste step (gap ou original).
        current_question: String,
        /// Fração do budget de tokens já consumida.
        budget_used: f64,
    },
    /// Modo forçado de resposta, acionado por budget ou por excesso de
    /// tentativas ruins na pergunta original.
    BeastMode {
        /// Quantas tentativas foram feitas antes de entrar em Beast Mode.
        attempts: u32,
        /// Motivo da última falha que levou ao Beast Mode.
        last_failure: String,
    },
    /// Sessão concluída com sucesso.
    Completed {
        /// Resposta final.
        answer: String,
        /// Referências associadas.
        references: Vec<Reference>,
        /// Se a pergunta foi trivial (resposta direta, sem pesquisa).
        trivial: bool,
    },
    /// Sessão encerrada sem uma resposta satisfatória.
    Failed {
        /// Motivo da falha.
        reason: String,
        /// Conhecimento parcial acumulado até a falha.
        partial_knowledge: Vec<KnowledgeItem>,
    },
}

impl AgentState {
    /// Estado é terminal (Completed ou Failed).
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed { .. } | Self::Failed { .. })
    }

    /// Estado está processando normalmente.
    pub fn is_processing(&self) -> bool {
        matches!(self, Self::Processing { .. })
    }

    /// Estado está em Beast Mode.
    pub fn is_beast_mode(&self) -> bool {
        matches!(self, Self::BeastMode { .. })
    }

    /// Verifica se a transição para `target` é válida.
    pub fn can_transition_to(&self, target: &AgentState) -> bool {
        match (self, target) {
            (Self::Processing { .. }, Self::Processing { .. }) => true,
            (Self::Processing { .. }, Self::BeastMode { .. }) => true,
            (Self::Processing { .. }, Self::Completed { .. }) => true,
            (Self::Processing { .. }, Self::Failed { .. }) => true,
            (Self::BeastMode { .. }, Self::Completed { .. }) => true,
            (Self::BeastMode { .. }, Self::Failed { .. }) => true,
            _ => false,
        }
    }

    /// Fração de budget usada, se em Processing; 1.0 em Beast Mode.
    pub fn budget_used(&self) -> f64 {
        match self {
            Self::Processing { budget_used, .. } => *budget_used,
            Self::BeastMode { .. } => 1.0,
            _ => 0.0,
        }
    }

    /// Step total, se disponível.
    pub fn total_step(&self) -> u32 {
        match self {
            Self::Processing { total_step, .. } => *total_step,
            _ => 0,
        }
    }
}

/// Resultado de um único step de execução.
#[derive(Debug, Clone)]
pub enum StepResult {
    /// Continuar o loop.
    Continue,
    /// Sessão concluída nesse step.
    Completed(AnswerResult),
    /// Erro fatal nesse step.
    Error(String),
}

/// Resposta produzida por um executor de resposta.
#[derive(Debug, Clone)]
pub struct AnswerResult {
    /// Texto da resposta.
    pub answer: String,
    /// Referências citadas.
    pub references: Vec<Reference>,
    /// Se a pergunta era trivial.
    pub trivial: bool,
}

/// Uso de tokens agregado de uma sessão.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokenUsage {
    /// Tokens de prompt.
    pub prompt_tokens: u64,
    /// Tokens de completion.
    pub completion_tokens: u64,
    /// Total.
    pub total_tokens: u64,
}

/// Resultado completo de uma sessão de pesquisa.
#[derive(Debug, Clone)]
pub struct ResearchResult {
    /// Se a sessão terminou com sucesso.
    pub success: bool,
    /// Resposta final, se houver.
    pub answer: Option<String>,
    /// Referências citadas na resposta final.
    pub references: Vec<Reference>,
    /// Se a resposta foi trivial.
    pub trivial: bool,
    /// Uso de tokens.
    pub token_usage: TokenUsage,
    /// URLs visitadas durante a sessão.
    pub visited_urls: Vec<String>,
    /// Mensagem de erro, se a sessão falhou.
    pub error: Option<String>,
    /// Tempo total em milissegundos.
    pub total_time_ms: u128,
    /// Tempo total gasto em buscas.
    pub search_time_ms: u128,
    /// Tempo total gasto lendo URLs.
    pub read_time_ms: u128,
    /// Tempo total gasto em chamadas de LLM.
    pub llm_time_ms: u128,
}

/// Erros do agente.
#[derive(Debug, thiserror::Error)]
pub enum AgentError {
    /// Erro do provedor de LLM.
    #[error("LLM error: {0}")]
    LlmError(String),
    /// Erro do provedor de busca/leitura.
    #[error("search error: {0}")]
    SearchError(String),
    /// Timeout de uma chamada externa.
    #[error("timeout")]
    TimeoutError,
    /// Budget de tokens esgotado.
    #[error("token budget would be exceeded")]
    BudgetExhausted,
    /// Saída estruturada não pôde ser recuperada pelo gerador seguro.
    #[error("structured output generation failed: {0}")]
    GeneratorError(String),
}

impl From<crate::generator::GeneratorError> for AgentError {
    fn from(e: crate::generator::GeneratorError) -> Self {
        match e {
            crate::generator::GeneratorError::BudgetExceeded { .. } => Self::BudgetExhausted,
            other => Self::GeneratorError(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn processing() -> AgentState {
        AgentState::Processing {
            step: 1,
            total_step: 1,
            current_question: "q".into(),
            budget_used: 0.1,
        }
    }

    #[test]
    fn test_state_transitions() {
        let p = processing();
        assert!(p.can_transition_to(&processing()));
        assert!(p.can_transition_to(&AgentState::BeastMode { attempts: 1, last_failure: "x".into() }));
        assert!(p.can_transition_to(&AgentState::Completed { answer: "a".into(), references: vec![], trivial: false }));
        assert!(p.can_transition_to(&AgentState::Failed { reason: "x".into(), partial_knowledge: vec![] }));

        let completed = AgentState::Completed { answer: "a".into(), references: vec![], trivial: false };
        assert!(!completed.can_transition_to(&processing()));
    }

    #[test]
    fn test_is_terminal() {
        assert!(AgentState::Completed { answer: "a".into(), references: vec![], trivial: false }.is_terminal());
        assert!(AgentState::Failed { reason: "x".into(), partial_knowledge: vec![] }.is_terminal());
        assert!(!processing().is_terminal());
        assert!(!AgentState::BeastMode { attempts: 1, last_failure: "x".into() }.is_terminal());
    }
}
