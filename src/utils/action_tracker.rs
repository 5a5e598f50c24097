// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// ACTION TRACKER
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//
// Conta quantas vezes cada tipo de ação foi executado ao longo de uma
// sessão, de forma paralela ao `TokenTracker` (que conta tokens) e ao
// `TimingStats` (que conta latência).
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Contagem acumulada de ações tomadas por uma sessão.
#[derive(Debug, Clone, Default)]
pub struct ActionTracker {
    search_count: u32,
    read_count: u32,
    reflect_count: u32,
    answer_count: u32,
    bad_attempt_count: u32,
}

impl ActionTracker {
    /// Cria um tracker zerado.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registra uma ação `search`.
    pub fn record_search(&mut self) {
        self.search_count += 1;
    }

    /// Registra uma ação `read`.
    pub fn record_read(&mut self) {
        self.read_count += 1;
    }

    /// Registra uma ação `reflect`.
    pub fn record_reflect(&mut self) {
        self.reflect_count += 1;
    }

    /// Registra uma ação `answer` (aceita ou rejeitada).
    pub fn record_answer(&mut self) {
        self.answer_count += 1;
    }

    /// Registra uma tentativa ruim na pergunta original.
    pub fn record_bad_attempt(&mut self) {
        self.bad_attempt_count += 1;
    }

    /// Total de ações registradas, de qualquer tipo.
    pub fn total_actions(&self) -> u32 {
        self.search_count + self.read_count + self.reflect_count + self.answer_count
    }

    /// Estatísticas em formato simples para exibição/logging.
    pub fn stats(&self) -> ActionStats {
        ActionStats {
            search_count: self.search_count,
            read_count: self.read_count,
            reflect_count: self.reflect_count,
            answer_count: self.answer_count,
            bad_attempt_count: self.bad_attempt_count,
            total_actions: self.total_actions(),
        }
    }
}

/// Snapshot imutável das contagens de um `ActionTracker`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ActionStats {
    /// Quantas vezes `search` foi executado.
    pub search_count: u32,
    /// Quantas vezes `read` foi executado.
    pub read_count: u32,
    /// Quantas vezes `reflect` foi executado.
    pub reflect_count: u32,
    /// Quantas vezes `answer` foi executado (aceito ou não).
    pub answer_count: u32,
    /// Quantas tentativas ruins ocorreram na pergunta original.
    pub bad_attempt_count: u32,
    /// Soma de todas as ações.
    pub total_actions: u32,
}
