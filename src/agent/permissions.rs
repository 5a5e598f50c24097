// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// PERMISSÕES DE AÇÕES
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

use super::AgentContext;

/// Máximo de gaps na fila para ainda permitir uma nova reflexão.
pub const MAX_GAPS_FOR_REFLECT: usize = 1;
/// Máximo de URLs coletadas antes de desabilitar busca.
pub const MAX_URLS_BEFORE_DISABLE_SEARCH: usize = 20;

/// Estado das permissões - imutável, criado a cada iteração.
///
/// Este struct determina quais ações o agente pode tomar no passo atual.
/// As permissões são recalculadas a cada step a partir do contexto.
#[derive(Debug, Clone, Copy)]
pub struct ActionPermissions {
    /// Pode executar busca na web.
    pub search: bool,
    /// Pode ler URLs.
    pub read: bool,
    /// Pode gerar perguntas de reflexão.
    pub reflect: bool,
    /// Pode fornecer resposta.
    pub answer: bool,
}

impl ActionPermissions {
    /// Cria permissões a partir do contexto atual.
    ///
    /// # Regras
    /// - `search`: desabilitada se `search_disabled` ou já há 20+ URLs coletadas.
    /// - `read`: desabilitada se `read_disabled` ou não há URL disponível.
    /// - `reflect`: desabilitada se `reflect_disabled` ou a fila de gaps já
    ///   tem mais de uma pergunta pendente.
    /// - `answer`: desabilitada apenas no step seguinte a uma resposta
    ///   original rejeitada.
    pub fn from_context(ctx: &AgentContext) -> Self {
        Self {
            search: !ctx.search_disabled && ctx.all_urls.len() < MAX_URLS_BEFORE_DISABLE_SEARCH,
            read: !ctx.read_disabled && !ctx.available_urls().is_empty(),
            reflect: !ctx.reflect_disabled && ctx.gaps.len() <= MAX_GAPS_FOR_REFLECT,
            answer: !ctx.answer_disabled_next_step,
        }
    }

    /// Cria permissões com tudo habilitado.
    pub fn all_enabled() -> Self {
        Self { search: true, read: true, reflect: true, answer: true }
    }

    /// Cria permissões com tudo desabilitado.
    pub fn all_disabled() -> Self {
        Self { search: false, read: false, reflect: false, answer: false }
    }

    /// Cria permissões para Beast Mode (apenas answer).
    pub fn beast_mode() -> Self {
        Self { search: false, read: false, reflect: false, answer: true }
    }

    /// Lista de ações permitidas (para logging/debug).
    pub fn allowed_actions(&self) -> Vec<&'static str> {
        let mut actions = Vec::with_capacity(4);
        if self.search {
            actions.push("search");
        }
        if self.read {
            actions.push("read");
        }
        if self.reflect {
            actions.push("reflect");
        }
        if self.answer {
            actions.push("answer");
        }
        actions
    }

    /// Conta quantas ações estão permitidas.
    pub fn count_allowed(&self) -> usize {
        [self.search, self.read, self.reflect, self.answer]
            .iter()
            .filter(|&&x| x)
            .count()
    }

    /// Verifica se pelo menos uma ação está permitida.
    pub fn has_any_allowed(&self) -> bool {
        self.search || self.read || self.reflect || self.answer
    }

    /// Verifica se uma ação específica está permitida.
    pub fn is_allowed(&self, action_name: &str) -> bool {
        match action_name {
            "search" => self.search,
            "read" => self.read,
            "reflect" => self.reflect,
            "answer" => self.answer,
            _ => false,
        }
    }

    /// Cria uma cópia com search desabilitado.
    pub fn without_search(mut self) -> Self {
        self.search = false;
        self
    }

    /// Cria uma cópia com read desabilitado.
    pub fn without_read(mut self) -> Self {
        self.read = false;
        self
    }

    /// Cria uma cópia com reflect desabilitado.
    pub fn without_reflect(mut self) -> Self {
        self.reflect = false;
        self
    }

    /// Cria uma cópia com answer desabilitado.
    pub fn without_answer(mut self) -> Self {
        self.answer = false;
        self
    }
}

impl Default for ActionPermissions {
    fn default() -> Self {
        Self::all_enabled()
    }
}

impl std::fmt::Display for ActionPermissions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Permissions: [{}]", self.allowed_actions().join(", "))
    }
}
