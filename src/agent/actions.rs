// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// AÇÕES DO AGENTE
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

use crate::evaluation::EvaluationType;
use crate::types::{Reference, SerpQuery, Url};

/// Uma ação que o agente pode tomar em um step.
#[derive(Debug, Clone)]
pub enum AgentAction {
    /// Buscar na web por uma ou mais queries.
    Search {
        /// Queries a executar.
        queries: Vec<SerpQuery>,
        /// Raciocínio que levou a esta ação.
        think: String,
    },
    /// Ler o conteúdo de uma ou mais URLs.
    Read {
        /// URLs a ler.
        urls: Vec<Url>,
        /// Raciocínio que levou a esta ação.
        think: String,
    },
    /// Dividir a pergunta em sub-perguntas (gaps).
    Reflect {
        /// Novas perguntas-lacuna propostas.
        gap_questions: Vec<String>,
        /// Raciocínio que levou a esta ação.
        think: String,
    },
    /// Responder à pergunta corrente.
    Answer {
        /// Texto da resposta.
        answer: String,
        /// Referências citadas.
        references: Vec<Reference>,
        /// Raciocínio que levou a esta ação.
        think: String,
    },
}

impl AgentAction {
    /// Nome estável da ação.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Search { .. } => "search",
            Self::Read { .. } => "read",
            Self::Reflect { .. } => "reflect",
            Self::Answer { .. } => "answer",
        }
    }

    /// Raciocínio associado à ação.
    pub fn think(&self) -> &str {
        match self {
            Self::Search { think, .. }
            | Self::Read { think, .. }
            | Self::Reflect { think, .. }
            | Self::Answer { think, .. } => think,
        }
    }

    /// Se a ação é `search`.
    pub fn is_search(&self) -> bool {
        matches!(self, Self::Search { .. })
    }

    /// Se a ação é `answer`.
    pub fn is_answer(&self) -> bool {
        matches!(self, Self::Answer { .. })
    }

    /// Se a ação é `reflect`.
    pub fn is_reflect(&self) -> bool {
        matches!(self, Self::Reflect { .. })
    }
}

/// Uma entrada do diário de ações, usada tanto para compor prompts quanto
/// para alimentar o error-analyzer.
#[derive(Debug, Clone)]
pub enum DiaryEntry {
    /// Uma busca foi executada.
    Search {
        /// Queries que foram executadas (já deduplicadas).
        queries: Vec<SerpQuery>,
        /// Raciocínio da ação.
        think: String,
        /// Quantas URLs novas foram encontradas.
        urls_found: usize,
    },
    /// URLs foram lidas.
    Read {
        /// URLs lidas.
        urls: Vec<Url>,
        /// Raciocínio da ação.
        think: String,
    },
    /// Uma reflexão gerou (ou não) novas perguntas-lacuna.
    Reflect {
        /// Perguntas propostas.
        questions: Vec<String>,
        /// Raciocínio da ação.
        think: String,
    },
    /// Uma resposta foi rejeitada pelo avaliador.
    FailedAnswer {
        /// Resposta que falhou.
        answer: String,
        /// Critério de avaliação que reprovou a resposta.
        eval_type: EvaluationType,
        /// Motivo da reprovação.
        reason: String,
    },
}

impl DiaryEntry {
    /// Formata a entrada como texto legível para prompts.
    pub fn format(&self) -> String {
        match self {
            Self::Search { queries, think, urls_found } => {
                let keywords: Vec<&str> = queries.iter().map(|q| q.q.as_str()).collect();
                format!(
                    "[SEARCH] {} queries -> {} URLs found\nKeywords: {}\nThink: {}",
                    queries.len(),
                    urls_found,
                    keywords.join(", "),
                    think
                )
            }
            Self::Read { urls, think } => {
                format!("[READ] {} URLs\n{}\nThink: {}", urls.len(), urls.join("\n"), think)
            }
            Self::Reflect { questions, think } => {
                format!(
                    "[REFLECT] {} gap questions\n{}\nThink: {}",
                    questions.len(),
                    questions.join("\n"),
                    think
                )
            }
            Self::FailedAnswer { eval_type, reason, .. } => {
                format!("[FAILED] {:?} evaluation failed\nReason: {}", eval_type, reason)
            }
        }
    }
}

/// Pacote de prompt passado ao gerador de saída estruturada para decidir a
/// próxima ação.
#[derive(Debug, Clone)]
pub struct AgentPrompt {
    /// Instrução de sistema.
    pub system: String,
    /// Conteúdo do usuário (pergunta, conhecimento acumulado, etc.).
    pub user: String,
    /// Diário de ações já tomadas nesta sessão.
    pub diary: Vec<DiaryEntry>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_names() {
        let search = AgentAction::Search { queries: vec![], think: "t".into() };
        assert_eq!(search.name(), "search");
        let answer = AgentAction::Answer { answer: "a".into(), references: vec![], think: "t".into() };
        assert_eq!(answer.name(), "answer");
    }

    #[test]
    fn test_action_think() {
        let action = AgentAction::Reflect { gap_questions: vec![], think: "because".into() };
        assert_eq!(action.think(), "because");
    }

    #[test]
    fn test_action_type_checks() {
        let action = AgentAction::Search { queries: vec![], think: "t".into() };
        assert!(action.is_search());
        assert!(!action.is_answer());
        assert!(!action.is_reflect());
    }

    #[test]
    fn test_diary_entry_format() {
        let entry = DiaryEntry::FailedAnswer {
            answer: "bad".into(),
            eval_type: EvaluationType::Definitive,
            reason: "not definitive".into(),
        };
        let formatted = entry.format();
        assert!(formatted.contains("FAILED"));
        assert!(formatted.contains("not definitive"));
    }
}
