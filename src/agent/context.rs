// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// CONTEXTO DO AGENTE
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//
// Estado de sessão acumulado ao longo do loop do agente. `gaps` é uma fila
// FIFO real (diferente de um índice rotativo): a pergunta original é
// reenfileirada no final sempre que `gaps` não está vazia, garantindo que
// ela continua sendo revisitada entre as sub-perguntas abertas.
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

use super::agent_analyzer::AgentAnalysis;
use super::actions::DiaryEntry;
use crate::types::{BoostedSearchSnippet, KnowledgeItem, KnowledgeType, Url};
use std::collections::{HashSet, VecDeque};

/// Uma entrada do rastro estruturado da sessão (`context.allContext`).
#[derive(Debug, Clone)]
pub struct TraceEntry {
    /// Step em que a entrada foi registrada.
    pub step: usize,
    /// Rótulo da operação (ex: "search", "read", "evaluate:definitive").
    pub label: String,
    /// Detalhe textual da entrada.
    pub detail: String,
}

/// Contexto acumulado de uma sessão de pesquisa.
#[derive(Debug, Clone)]
pub struct AgentContext {
    /// Pergunta original do usuário.
    pub original_question: String,
    /// Fila FIFO de perguntas-lacuna (gaps) ainda não respondidas.
    pub gaps: VecDeque<String>,
    /// Todas as perguntas já vistas (original + gaps históricos), para dedup.
    pub all_questions: HashSet<String>,
    /// Todas as palavras-chave de busca já executadas, para dedup.
    pub all_keywords: HashSet<String>,
    /// Conhecimento acumulado.
    pub knowledge: Vec<KnowledgeItem>,
    /// URLs coletadas (ainda não necessariamente visitadas).
    pub all_urls: Vec<BoostedSearchSnippet>,
    /// URLs já visitadas.
    pub visited_urls: Vec<String>,
    /// URLs que falharam ao ser lidas.
    pub bad_urls: Vec<String>,
    /// Snippets de busca acumulados.
    pub snippets: Vec<String>,
    /// Diário de ações (para prompts e para o error-analyzer).
    pub diary: Vec<DiaryEntry>,
    /// Análises de erro acumuladas (badContext), uma por tentativa ruim na
    /// pergunta original.
    pub bad_context: Vec<AgentAnalysis>,
    /// Rastro estruturado de toda a sessão.
    pub trace: Vec<TraceEntry>,
    /// Step total desde o início da sessão (nunca reseta).
    pub total_step: usize,
    /// Step desde o início da tentativa atual na pergunta original; volta a
    /// 0 em cada `reset_for_bad_attempt`.
    pub step: usize,
    /// Número de tentativas ruins na pergunta original.
    pub bad_attempts: u32,
    /// Embeddings das queries de busca já executadas (para dedup semântico).
    pub executed_query_embeddings: Vec<Vec<f32>>,
    /// Texto das queries de busca já executadas.
    pub executed_queries: Vec<String>,
    /// `search` desabilitada para o próximo step (um no-op de dedup total
    /// a desligou); recomeça habilitada no step seguinte.
    pub search_disabled: bool,
    /// `read` desabilitada para o próximo step (nenhuma URL disponível a
    /// desligou); recomeça habilitada no step seguinte.
    pub read_disabled: bool,
    /// `reflect` desabilitada para o próximo step; recomeça habilitada no
    /// step seguinte.
    pub reflect_disabled: bool,
    /// `answer` está desabilitada apenas no próximo step (pós-rejeição da
    /// pergunta original).
    pub answer_disabled_next_step: bool,
}

impl AgentContext {
    /// Cria um contexto vazio para a pergunta dada.
    pub fn new(original_question: String) -> Self {
        let mut all_questions = HashSet::new();
        all_questions.insert(normalize(&original_question));
        Self {
            original_question,
            gaps: VecDeque::new(),
            all_questions,
            all_keywords: HashSet::new(),
            knowledge: Vec::new(),
            all_urls: Vec::new(),
            visited_urls: Vec::new(),
            bad_urls: Vec::new(),
            snippets: Vec::new(),
            diary: Vec::new(),
            bad_context: Vec::new(),
            trace: Vec::new(),
            total_step: 0,
            step: 0,
            bad_attempts: 0,
            executed_query_embeddings: Vec::new(),
            executed_queries: Vec::new(),
            search_disabled: false,
            read_disabled: false,
            reflect_disabled: false,
            answer_disabled_next_step: false,
        }
    }

    /// Pergunta a ser processada neste step: a cabeça da fila de gaps, se
    /// não vazia, senão a pergunta original.
    pub fn current_question(&self) -> &str {
        self.gaps.front().map(|s| s.as_str()).unwrap_or(&self.original_question)
    }

    /// Verdadeiro se o step corrente está processando a pergunta original
    /// (fila de gaps vazia).
    pub fn is_processing_original(&self) -> bool {
        self.gaps.is_empty()
    }

    /// Remove a pergunta corrente da cabeça da fila, se ela for um gap (a
    /// pergunta original nunca é removida da fila pois não está nela).
    pub fn pop_current_gap(&mut self) -> Option<String> {
        self.gaps.pop_front()
    }

    /// Aplica os sobreviventes da deduplicação de um `reflect`: cada
    /// sobrevivente é colocado na FRENTE da fila (processado antes da
    /// pergunta original), e a pergunta original é reenfileirada no FINAL
    /// sempre que a fila não ficar vazia.
    pub fn apply_reflect_survivors(&mut self, survivors: Vec<String>) {
        for q in survivors.into_iter().rev() {
            self.all_questions.insert(normalize(&q));
            self.gaps.push_front(q);
        }
        if !self.gaps.is_empty() {
            self.gaps.push_back(self.original_question.clone());
        }
    }

    /// Adiciona URLs coletadas, deduplicando por URL exata.
    pub fn add_urls(&mut self, urls: Vec<BoostedSearchSnippet>) -> usize {
        let mut added = 0;
        for url in urls {
            if !self.all_urls.iter().any(|u| u.url == url.url) {
                self.all_urls.push(url);
                added += 1;
            }
        }
        added
    }

    /// URLs disponíveis para leitura: coletadas, não visitadas, não ruins.
    pub fn available_urls(&self) -> Vec<&BoostedSearchSnippet> {
        self.all_urls
            .iter()
            .filter(|u| !self.is_url_visited(&u.url) && !self.is_url_bad(&u.url))
            .collect()
    }

    /// Se a URL já foi visitada.
    pub fn is_url_visited(&self, url: &str) -> bool {
        self.visited_urls.iter().any(|u| u == url)
    }

    /// Se a URL já falhou anteriormente.
    pub fn is_url_bad(&self, url: &str) -> bool {
        self.bad_urls.iter().any(|u| u == url)
    }

    /// Adiciona um item de conhecimento, deduplicando por (question, answer).
    pub fn add_knowledge(&mut self, item: KnowledgeItem) {
        let exists = self
            .knowledge
            .iter()
            .any(|k| k.question == item.question && k.answer == item.answer);
        if !exists {
            self.knowledge.push(item);
        }
    }

    /// Atalho para adicionar conhecimento de URL lida.
    pub fn add_url_knowledge(&mut self, url: &Url, answer: String) {
        self.add_knowledge(KnowledgeItem {
            question: format!("What is in {}?", url),
            answer,
            item_type: KnowledgeType::Url,
            references: vec![],
        });
    }

    /// Formata o conhecimento acumulado para um prompt.
    pub fn format_knowledge(&self) -> String {
        self.knowledge
            .iter()
            .enumerate()
            .map(|(i, k)| format!("[{}] Q: {}\nA: {}", i + 1, k.question, k.answer))
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    /// Formata o diário acumulado para um prompt.
    pub fn format_diary(&self) -> String {
        self.diary
            .iter()
            .enumerate()
            .map(|(i, d)| format!("Step {}: {}", i + 1, d.format()))
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    /// Registra uma entrada no rastro estruturado da sessão.
    pub fn trace(&mut self, label: &str, detail: String) {
        self.trace.push(TraceEntry { step: self.total_step, label: label.to_string(), detail });
    }

    /// Reseta o diário e o contador de step de uma tentativa ruim, sem
    /// limpar `gaps`, `knowledge` ou `all_urls` — a pesquisa acumulada
    /// continua disponível para a próxima tentativa.
    pub fn reset_for_bad_attempt(&mut self) {
        self.diary.clear();
        self.step = 0;
        self.answer_disabled_next_step = true;
    }

    /// Reabilita as quatro flags de ação no início de um novo step. Um no-op
    /// do step anterior (dedup total, sem URL disponível, etc.) desabilita
    /// uma ação por exatamente um step; chamar isto no começo do step
    /// seguinte devolve a ação ao estado habilitado por padrão.
    pub fn reset_disabled_flags(&mut self) {
        self.search_disabled = false;
        self.read_disabled = false;
        self.reflect_disabled = false;
        self.answer_disabled_next_step = false;
    }
}

fn normalize(question: &str) -> String {
    question
        .to_lowercase()
        .chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace())
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}
