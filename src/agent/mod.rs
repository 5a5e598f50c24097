// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// DEEP RESEARCH AGENT - MÁQUINA DE ESTADOS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

mod actions;
/// Análise de erros em background após tentativas ruins na pergunta original.
pub mod agent_analyzer;
/// Classificador de quais tipos de avaliação uma pergunta exige.
pub mod classifier;
mod context;
/// Deduplicação semântica e textual de queries e perguntas-lacuna.
pub mod dedup;
mod permissions;
mod state;

pub use actions::*;
pub use agent_analyzer::AgentAnalysis;
pub use context::*;
pub use permissions::*;
pub use state::*;

use crate::config::AgentConfig;
use crate::evaluation::{EvaluationContext, EvaluationPipeline};
use crate::generator::{generate_object, GenerateRequest, GeneratorError, LlmProvider, ModelTag};
use crate::search::SearchClient;
use crate::types::*;
use crate::utils::{ActionTracker, ReferenceBuilder, TimingStats, TokenTracker};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::mpsc;

/// Máximo de URLs a ler em um único step.
const MAX_URLS_PER_STEP: usize = 5;
/// Máximo de novas perguntas-lacuna aceitas por `reflect`.
const MAX_REFLECT_PER_STEP: usize = 3;
/// Número de análises de erro em background permitidas por sessão.
const MAX_ANALYSES_PER_SESSION: usize = 3;
/// Tentativas em Beast Mode antes de desistir e marcar a sessão como falha.
const MAX_BEAST_MODE_ATTEMPTS: u32 = 3;

/// Evento de progresso do agente para callbacks em tempo real.
#[derive(Debug, Clone)]
pub enum AgentProgress {
    /// Log informativo.
    Info(String),
    /// Log de sucesso.
    Success(String),
    /// Log de aviso.
    Warning(String),
    /// Log de erro.
    Error(String),
    /// Atualiza step atual.
    Step(usize),
    /// Atualiza ação atual.
    Action(String),
    /// Atualiza raciocínio atual.
    Think(String),
    /// Atualiza contagem de URLs (total, visitadas).
    Urls(usize, usize),
    /// Atualiza tokens usados.
    Tokens(u64),
    /// URL visitada com sucesso.
    VisitedUrl(String),
    /// Início de avaliação de uma resposta candidata.
    ValidationStart,
    /// Resultado de uma dimensão individual de avaliação.
    ValidationStep {
        /// Tipo de avaliação executado.
        eval_type: String,
        /// Se a dimensão passou.
        passed: bool,
    },
    /// Fim da avaliação de uma resposta candidata.
    ValidationEnd(bool),
    /// Análise de erro em background foi disparada.
    AgentAnalysisStarted,
    /// Análise de erro em background concluiu.
    AgentAnalysisCompleted(AgentAnalysis),
}

/// Callback de progresso do agente.
pub type ProgressCallback = Arc<dyn Fn(AgentProgress) + Send + Sync>;

/// Ação decidida pelo LLM, na forma bruta antes de virar `AgentAction`.
#[derive(Debug, Deserialize)]
#[serde(tag = "action", rename_all = "lowercase")]
enum ActionResponse {
    Search { think: String, queries: Vec<String> },
    Read { think: String, urls: Vec<String> },
    Reflect { think: String, questions: Vec<String> },
    Answer { think: String, answer: String },
}

fn decide_action_schema() -> serde_json::Value {
    json!({
        "type": "object",
        "properties": {
            "action": { "type": "string", "enum": ["search", "read", "reflect", "answer"] },
            "think": { "type": "string", "description": "reasoning behind the chosen action" },
            "queries": { "type": "array", "items": { "type": "string" } },
            "urls": { "type": "array", "items": { "type": "string" } },
            "questions": { "type": "array", "items": { "type": "string" } },
            "answer": { "type": "string" }
        },
        "required": ["action", "think"]
    })
}

/// Agente de pesquisa iterativo.
///
/// Orquestra o loop Search/Read/Reflect/Answer sobre um `LlmProvider` e um
/// `SearchClient`, acumulando conhecimento em `AgentContext` até produzir uma
/// resposta que passe no `EvaluationPipeline`, ou até esgotar o budget de
/// tokens e cair em Beast Mode.
pub struct DeepResearchAgent {
    llm_provider: Arc<dyn LlmProvider>,
    search_client: Arc<dyn SearchClient>,
    config: AgentConfig,
    state: AgentState,
    context: AgentContext,
    token_tracker: TokenTracker,
    action_tracker: ActionTracker,
    timing_stats: TimingStats,
    response_language: Language,
    progress_callback: Option<ProgressCallback>,
    analyses_spawned: usize,
    analysis_rx: Option<mpsc::Receiver<AgentAnalysis>>,
}

impl DeepResearchAgent {
    /// Cria um novo agente.
    ///
    /// O idioma de resposta é lido de `RESPONSE_LANGUAGE`; na ausência da
    /// variável, o padrão é Português.
    pub fn new(
        llm_provider: Arc<dyn LlmProvider>,
        search_client: Arc<dyn SearchClient>,
        token_budget: Option<u64>,
    ) -> Self {
        let response_language = std::env::var("RESPONSE_LANGUAGE")
            .ok()
            .map(|s| Language::from_str(&s))
            .unwrap_or(Language::Portuguese);

        let config = AgentConfig::new();
        let budget = token_budget.unwrap_or(config.default_token_budget);

        Self {
            llm_provider,
            search_client,
            config,
            state: AgentState::Processing {
                step: 0,
                total_step: 0,
                current_question: String::new(),
                budget_used: 0.0,
            },
            context: AgentContext::new(String::new()),
            token_tracker: TokenTracker::new(Some(budget)),
            action_tracker: ActionTracker::new(),
            timing_stats: TimingStats::default(),
            response_language,
            progress_callback: None,
            analyses_spawned: 0,
            analysis_rx: None,
        }
    }

    /// Sobrescreve o idioma de resposta detectado do ambiente.
    pub fn with_response_language(mut self, language: Language) -> Self {
        self.response_language = language;
        self
    }

    /// Registra um callback de progresso.
    pub fn with_progress_callback(mut self, callback: ProgressCallback) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    fn emit(&self, event: AgentProgress) {
        if let Some(cb) = &self.progress_callback {
            cb(event);
        }
    }

    /// Guarda prévia de budget: checa, usando o `max_tokens` configurado para
    /// a tag do modelo como estimativa de pior caso, se a chamada ainda
    /// caberia no budget antes de efetivamente fazê-la.
    fn check_budget(&self, tag: ModelTag) -> Result<(), AgentError> {
        let estimate = self.config.model_tag_config(tag).max_tokens as u64;
        if self.token_tracker.has_budget_for(estimate) {
            Ok(())
        } else {
            Err(AgentError::from(GeneratorError::BudgetExceeded {
                used: self.token_tracker.total_tokens(),
                estimated: estimate,
                budget: self.token_tracker.budget(),
            }))
        }
    }

    /// Executa o loop de pesquisa completo até um estado terminal.
    pub async fn run(&mut self, question: &str) -> ResearchResult {
        let start = Instant::now();
        self.context = AgentContext::new(question.to_string());
        self.state = AgentState::Processing {
            step: 0,
            total_step: 0,
            current_question: question.to_string(),
            budget_used: 0.0,
        };

        self.emit(AgentProgress::Info(format!(
            "Iniciando pesquisa em {}: {}",
            self.response_language.display_name(),
            question
        )));
        self.emit(AgentProgress::Step(0));
        self.emit(AgentProgress::Action("Inicializando...".into()));

        loop {
            self.drain_analysis_channel();

            match self.state.clone() {
                AgentState::Processing { .. } => {
                    self.state = AgentState::Processing {
                        step: self.context.step as u32,
                        total_step: self.context.total_step as u32,
                        current_question: self.context.current_question().to_string(),
                        budget_used: self.token_tracker.budget_used_percentage(),
                    };

                    if self.token_tracker.should_enter_beast_mode() {
                        self.emit(AgentProgress::Warning("Budget próximo do limite, entrando em Beast Mode".into()));
                        self.state = AgentState::BeastMode { attempts: 0, last_failure: "budget".into() };
                        continue;
                    }

                    if self.context.total_step >= self.config.max_steps as usize {
                        self.emit(AgentProgress::Warning("Limite de steps atingido, forçando Beast Mode".into()));
                        self.state = AgentState::BeastMode { attempts: 0, last_failure: "max_steps".into() };
                        continue;
                    }

                    match self.execute_step().await {
                        StepResult::Continue => continue,
                        StepResult::Completed(result) => {
                            self.state = AgentState::Completed {
                                answer: result.answer,
                                references: result.references,
                                trivial: result.trivial,
                            };
                        }
                        StepResult::Error(reason) => {
                            self.emit(AgentProgress::Error(reason.clone()));
                            self.state = AgentState::Failed { reason, partial_knowledge: self.context.knowledge.clone() };
                        }
                    }
                }
                AgentState::BeastMode { attempts, last_failure } => {
                    if attempts >= MAX_BEAST_MODE_ATTEMPTS {
                        self.state = AgentState::Failed {
                            reason: format!("Beast Mode esgotado após {attempts} tentativas: {last_failure}"),
                            partial_knowledge: self.context.knowledge.clone(),
                        };
                        continue;
                    }
                    match self.force_answer().await {
                        Ok(result) => {
                            self.state = AgentState::Completed {
                                answer: result.answer,
                                references: result.references,
                                trivial: result.trivial,
                            };
                        }
                        Err(e) => {
                            self.state = AgentState::BeastMode { attempts: attempts + 1, last_failure: e.to_string() };
                        }
                    }
                }
                AgentState::Completed { .. } | AgentState::Failed { .. } => break,
            }
        }

        self.build_result(start.elapsed().as_millis())
    }

    fn drain_analysis_channel(&mut self) {
        let Some(rx) = self.analysis_rx.as_mut() else { return };
        match rx.try_recv() {
            Ok(analysis) => {
                self.emit(AgentProgress::AgentAnalysisCompleted(analysis.clone()));
                self.context.bad_context.push(analysis);
            }
            Err(mpsc::error::TryRecvError::Disconnected) => {
                self.analysis_rx = None;
            }
            Err(mpsc::error::TryRecvError::Empty) => {}
        }
    }

    async fn execute_step(&mut self) -> StepResult {
        let permissions = ActionPermissions::from_context(&self.context);
        // Os quatro flags valeram para exatamente este step; a partir daqui
        // qualquer ação executada abaixo pode desabilitar a sua de novo, mas
        // apenas para o step seguinte.
        self.context.reset_disabled_flags();
        let question = self.context.current_question().to_string();

        self.context.total_step += 1;
        self.context.step += 1;
        self.emit(AgentProgress::Step(self.context.total_step));

        let action = match self.decide_action(&question, &permissions).await {
            Ok(action) => action,
            Err(e) => return StepResult::Error(format!("Falha ao decidir ação: {e}")),
        };

        self.emit(AgentProgress::Action(action.name().to_string()));
        self.emit(AgentProgress::Think(action.think().to_string()));

        match action {
            AgentAction::Search { queries, think } => {
                self.action_tracker.record_search();
                self.execute_search(queries, think).await;
                StepResult::Continue
            }
            AgentAction::Read { urls, think } => {
                self.action_tracker.record_read();
                self.execute_read(urls, think).await;
                StepResult::Continue
            }
            AgentAction::Reflect { gap_questions, think } => {
                self.action_tracker.record_reflect();
                self.execute_reflect(gap_questions, think);
                StepResult::Continue
            }
            AgentAction::Answer { answer, references, think } => {
                self.action_tracker.record_answer();
                self.execute_answer(&question, answer, references, think).await
            }
        }
    }

    async fn decide_action(
        &mut self,
        question: &str,
        permissions: &ActionPermissions,
    ) -> Result<AgentAction, AgentError> {
        let system = format!(
            "You are an iterative research agent. Respond in {}. Allowed actions: {}.\n\
            Original question: {}\n\nAccumulated knowledge:\n{}\n\nDiary:\n{}",
            self.response_language.display_name(),
            permissions.allowed_actions().join(", "),
            self.context.original_question,
            self.context.format_knowledge(),
            self.context.format_diary(),
        );

        self.check_budget(ModelTag::Agent)?;
        let request = GenerateRequest::new(ModelTag::Agent, decide_action_schema(), &system, question).with_retries(1);
        let start = Instant::now();
        let (value, usage) = generate_object(&*self.llm_provider, &*self.llm_provider, request).await?;
        self.timing_stats.add_llm_time(start.elapsed().as_millis());
        self.token_tracker.track(self.context.total_step, ModelTag::Agent.as_str(), usage.prompt_tokens, usage.completion_tokens);
        self.emit(AgentProgress::Tokens(self.token_tracker.total_tokens()));

        let response: ActionResponse = serde_json::from_value(value)
            .map_err(|e| AgentError::GeneratorError(e.to_string()))?;

        Ok(self.resolve_action(response, permissions))
    }

    fn resolve_action(&self, response: ActionResponse, permissions: &ActionPermissions) -> AgentAction {
        match response {
            ActionResponse::Search { think, queries } if permissions.search => AgentAction::Search {
                queries: queries.into_iter().map(|q| SerpQuery { q, ..Default::default() }).collect(),
                think,
            },
            ActionResponse::Read { think, urls } if permissions.read => AgentAction::Read { urls, think },
            ActionResponse::Reflect { think, questions } if permissions.reflect => {
                AgentAction::Reflect { gap_questions: questions, think }
            }
            ActionResponse::Answer { think, answer } => {
                AgentAction::Answer { answer, references: Vec::new(), think }
            }
            other => {
                // Ação escolhida não está permitida neste step -- cai para reflect
                // se disponível, senão força uma tentativa de resposta.
                let think = format!("{} not permitted this step, falling back", other_name(&other));
                if permissions.reflect {
                    AgentAction::Reflect { gap_questions: Vec::new(), think }
                } else {
                    AgentAction::Answer { answer: String::new(), references: Vec::new(), think }
                }
            }
        }
    }

    async fn execute_search(&mut self, queries: Vec<SerpQuery>, think: String) {
        let start = Instant::now();
        let query_texts: Vec<String> = queries.iter().map(|q| q.q.clone()).collect();

        let (unique_texts, embeddings) = dedup::dedup_with_embeddings(
            query_texts,
            &self.context.executed_query_embeddings,
            &self.context.all_keywords,
            &*self.llm_provider,
        )
        .await;

        if unique_texts.is_empty() {
            self.emit(AgentProgress::Warning("Todas as queries já foram executadas, desabilitando search".into()));
            self.context.search_disabled = true;
            self.context.diary.push(DiaryEntry::Search { queries, think, urls_found: 0 });
            return;
        }

        let unique_queries: Vec<SerpQuery> =
            unique_texts.iter().map(|q| SerpQuery { q: q.clone(), ..Default::default() }).collect();

        let results = self.search_client.search_batch(&unique_queries).await;
        let mut urls_found = 0;

        for result in results.into_iter().flatten() {
            urls_found += self.context.add_urls(result.urls);
            self.context.snippets.extend(result.snippets);
        }

        for text in &unique_texts {
            self.context.all_keywords.insert(dedup::normalize(text));
            self.context.executed_queries.push(text.clone());
        }
        self.context.executed_query_embeddings.extend(embeddings);

        self.timing_stats.add_search_time(start.elapsed().as_millis());
        self.emit(AgentProgress::Urls(self.context.all_urls.len(), self.context.visited_urls.len()));
        self.context.diary.push(DiaryEntry::Search { queries, think, urls_found });
    }

    async fn execute_read(&mut self, urls: Vec<Url>, think: String) {
        let start = Instant::now();

        let direct: Vec<Url> = urls
            .into_iter()
            .filter(|u| !self.context.is_url_visited(u) && !self.context.is_url_bad(u))
            .take(MAX_URLS_PER_STEP)
            .collect();

        let selected = if !direct.is_empty() {
            direct
        } else {
            let available = self.context.available_urls();
            if available.is_empty() {
                self.emit(AgentProgress::Warning("Nenhuma URL disponível para leitura".into()));
                self.context.diary.push(DiaryEntry::Read { urls: Vec::new(), think });
                return;
            }
            let reranked = self
                .search_client
                .rerank(&self.context.current_question().to_string(), &available.into_iter().cloned().collect::<Vec<_>>())
                .await;
            let top: Vec<Url> = reranked.into_iter().map(|s| s.url).take(MAX_URLS_PER_STEP).collect();
            if top.is_empty() {
                self.context
                    .available_urls()
                    .into_iter()
                    .map(|s| s.url.clone())
                    .take(MAX_URLS_PER_STEP)
                    .collect()
            } else {
                top
            }
        };

        let contents = self.search_client.read_urls_batch(&selected).await;

        for (url, content) in selected.iter().zip(contents.into_iter()) {
            self.context.visited_urls.push(url.clone());
            match content {
                Ok(page) => {
                    self.emit(AgentProgress::VisitedUrl(url.clone()));
                    self.context.add_url_knowledge(url, page.text);
                }
                Err(e) => {
                    log::warn!("read_url falhou para {url}: {e}");
                    self.context.bad_urls.push(url.clone());
                }
            }
        }

        self.timing_stats.add_read_time(start.elapsed().as_millis());
        self.emit(AgentProgress::Urls(self.context.all_urls.len(), self.context.visited_urls.len()));
        self.context.diary.push(DiaryEntry::Read { urls: selected, think });
    }

    fn execute_reflect(&mut self, gap_questions: Vec<String>, think: String) {
        let accepted = dedup::dedup_text_fallback(gap_questions.clone(), &self.context.all_questions);
        let survivors: Vec<String> = accepted.into_iter().take(MAX_REFLECT_PER_STEP).collect();

        self.context.diary.push(DiaryEntry::Reflect { questions: survivors.clone(), think });
        self.context.apply_reflect_survivors(survivors);
    }

    async fn execute_answer(
        &mut self,
        question: &str,
        answer: String,
        references: Vec<Reference>,
        think: String,
    ) -> StepResult {
        let is_original = self.context.is_processing_original();

        let built = match self.build_semantic_references(&answer).await {
            Ok(result) => result,
            Err(e) => {
                log::warn!("build_semantic_references falhou: {e}");
                crate::utils::build_ref::ReferenceResult { answer: answer.clone(), references }
            }
        };

        self.emit(AgentProgress::ValidationStart);
        let required = classifier::classify_question(question, &*self.llm_provider).await;
        let mut enabled_types = required;
        if !built.references.is_empty() && !enabled_types.contains(&crate::evaluation::EvaluationType::Attribution) {
            enabled_types.push(crate::evaluation::EvaluationType::Attribution);
        }

        let eval_context = EvaluationContext {
            topic: TopicCategory::General,
            knowledge_items: self.context.knowledge.clone(),
        };

        let pipeline = EvaluationPipeline::new(&*self.llm_provider);
        let result = pipeline
            .evaluate_sequential(
                question,
                &built.answer,
                &built.references,
                &eval_context,
                &enabled_types,
                &mut self.token_tracker,
                self.context.total_step,
            )
            .await;

        for r in &result.results {
            self.emit(AgentProgress::ValidationStep { eval_type: r.eval_type.as_str().to_string(), passed: r.passed });
        }
        self.emit(AgentProgress::ValidationEnd(result.overall_passed));
        self.emit(AgentProgress::Tokens(self.token_tracker.total_tokens()));

        if result.overall_passed {
            // enabled_types vazio significa que o pipeline passou vacuamente
            // (pergunta trivial: saudação, aritmética, paradoxo) sem gastar
            // nenhuma chamada de avaliação.
            let trivial = enabled_types.is_empty();
            return StepResult::Completed(AnswerResult { answer: built.answer, references: built.references, trivial });
        }

        let reason = result.failure_reason().unwrap_or_else(|| "unknown".into());
        let failed_type = result.failed_at.unwrap_or(crate::evaluation::EvaluationType::Definitive);
        self.context
            .diary
            .push(DiaryEntry::FailedAnswer { answer: built.answer.clone(), eval_type: failed_type, reason: reason.clone() });
        self.context.add_knowledge(KnowledgeItem {
            question: question.to_string(),
            answer: format!("Rejected answer: {}. Reason: {}", built.answer, reason),
            item_type: KnowledgeType::SideInfo,
            references: Vec::new(),
        });

        if is_original {
            self.context.bad_attempts += 1;
            self.action_tracker.record_bad_attempt();
            self.context.reset_for_bad_attempt();

            if self.context.bad_attempts >= self.config.max_bad_attempts
                && self.analyses_spawned < MAX_ANALYSES_PER_SESSION
                && self.analysis_rx.is_none()
            {
                self.spawn_background_analysis(question, &built.answer, &reason);
            }
        }

        StepResult::Continue
    }

    fn spawn_background_analysis(&mut self, question: &str, failed_answer: &str, failure_reason: &str) {
        self.analyses_spawned += 1;
        self.emit(AgentProgress::AgentAnalysisStarted);

        let diary = self.context.diary.clone();
        let question = question.to_string();
        let failed_answer = failed_answer.to_string();
        let failure_reason = failure_reason.to_string();
        let provider = self.llm_provider.clone();
        let (tx, rx) = mpsc::channel(1);
        self.analysis_rx = Some(rx);

        tokio::spawn(async move {
            let analysis = tokio::time::timeout(
                std::time::Duration::from_secs(30),
                agent_analyzer::analyze_steps(&diary, &question, &failed_answer, &failure_reason, &*provider),
            )
            .await;

            match analysis {
                Ok(Ok(result)) => {
                    let _ = tx.send(result).await;
                }
                Ok(Err(e)) => log::warn!("AgentAnalyzer falhou: {e}"),
                Err(_) => log::warn!("AgentAnalyzer: timeout após 30s"),
            }
        });
    }

    async fn build_semantic_references(
        &self,
        answer: &str,
    ) -> Result<crate::utils::build_ref::ReferenceResult, crate::utils::build_ref::ReferenceError> {
        let builder = ReferenceBuilder::with_defaults(self.llm_provider.clone());
        builder.build_references(answer, &self.context.knowledge).await
    }

    async fn force_answer(&mut self) -> Result<AnswerResult, AgentError> {
        let system = format!(
            "You are in BEAST MODE: you must produce a final answer NOW from the knowledge accumulated so far, \
            even if incomplete. Respond in {}.\n\nOriginal question: {}\n\nAccumulated knowledge:\n{}",
            self.response_language.display_name(),
            self.context.original_question,
            self.context.format_knowledge(),
        );

        let schema = json!({
            "type": "object",
            "properties": {
                "answer": { "type": "string" },
                "think": { "type": "string" }
            },
            "required": ["answer", "think"]
        });

        self.check_budget(ModelTag::AgentBeastMode)?;
        let request =
            GenerateRequest::new(ModelTag::AgentBeastMode, schema, &system, &self.context.original_question).with_retries(1);
        let (value, usage) = generate_object(&*self.llm_provider, &*self.llm_provider, request).await?;
        self.token_tracker.track(self.context.total_step, ModelTag::AgentBeastMode.as_str(), usage.prompt_tokens, usage.completion_tokens);

        #[derive(Deserialize)]
        struct BeastModeAnswer {
            answer: String,
        }
        let parsed: BeastModeAnswer =
            serde_json::from_value(value).map_err(|e| AgentError::GeneratorError(e.to_string()))?;

        let built = self.build_semantic_references(&parsed.answer).await;
        let (answer, references) = match built {
            Ok(result) => (result.answer, result.references),
            Err(_) => (parsed.answer, Vec::new()),
        };

        Ok(AnswerResult { answer, references, trivial: false })
    }

    fn build_result(&self, total_time_ms: u128) -> ResearchResult {
        let usage = self.token_tracker.get_total_usage();

        match &self.state {
            AgentState::Completed { answer, references, trivial } => ResearchResult {
                success: true,
                answer: Some(answer.clone()),
                references: references.clone(),
                trivial: *trivial,
                token_usage: usage,
                visited_urls: self.context.visited_urls.clone(),
                error: None,
                total_time_ms,
                search_time_ms: self.timing_stats.search_times.iter().sum(),
                read_time_ms: self.timing_stats.read_times.iter().sum(),
                llm_time_ms: self.timing_stats.llm_times.iter().sum(),
            },
            AgentState::Failed { reason, .. } => ResearchResult {
                success: false,
                answer: None,
                references: Vec::new(),
                trivial: false,
                token_usage: usage,
                visited_urls: self.context.visited_urls.clone(),
                error: Some(reason.clone()),
                total_time_ms,
                search_time_ms: self.timing_stats.search_times.iter().sum(),
                read_time_ms: self.timing_stats.read_times.iter().sum(),
                llm_time_ms: self.timing_stats.llm_times.iter().sum(),
            },
            _ => ResearchResult {
                success: false,
                answer: None,
                references: Vec::new(),
                trivial: false,
                token_usage: usage,
                visited_urls: self.context.visited_urls.clone(),
                error: Some("sessão encerrada em estado não-terminal".into()),
                total_time_ms,
                search_time_ms: self.timing_stats.search_times.iter().sum(),
                read_time_ms: self.timing_stats.read_times.iter().sum(),
                llm_time_ms: self.timing_stats.llm_times.iter().sum(),
            },
        }
    }
}

fn other_name(response: &ActionResponse) -> &'static str {
    match response {
        ActionResponse::Search { .. } => "search",
        ActionResponse::Read { .. } => "read",
        ActionResponse::Reflect { .. } => "reflect",
        ActionResponse::Answer { .. } => "answer",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::MockLlmProvider;
    use crate::search::MockSearchClient;

    fn agent() -> DeepResearchAgent {
        DeepResearchAgent::new(Arc::new(MockLlmProvider::new()), Arc::new(MockSearchClient::new()), Some(10_000))
    }

    #[tokio::test]
    async fn test_decide_action_raises_budget_exhausted_before_calling_provider() {
        let mut agent = DeepResearchAgent::new(
            Arc::new(MockLlmProvider::new()),
            Arc::new(MockSearchClient::new()),
            Some(1),
        );
        agent.context = AgentContext::new("q".into());
        let permissions = ActionPermissions::all_enabled();

        let err = agent.decide_action("q", &permissions).await.unwrap_err();
        assert!(matches!(err, AgentError::BudgetExhausted));
        assert_eq!(agent.token_tracker.total_tokens(), 0, "the guard must fire before any provider call");
    }

    #[test]
    fn test_new_defaults_to_portuguese_without_env() {
        std::env::remove_var("RESPONSE_LANGUAGE");
        let agent = agent();
        assert_eq!(agent.response_language, Language::Portuguese);
    }

    #[test]
    fn test_with_response_language_overrides() {
        let agent = agent().with_response_language(Language::English);
        assert_eq!(agent.response_language, Language::English);
    }

    #[tokio::test]
    async fn test_run_reaches_terminal_state() {
        let mut agent = agent();
        let result = agent.run("What is Rust?").await;
        assert!(agent.state.is_terminal());
    }

    #[tokio::test]
    async fn test_run_completes_trivial_question_through_real_evaluation() {
        // A mesma resposta canned serve tanto para decide_action (tag=action)
        // quanto para classify_question (needs_* flags) -- todas as flags em
        // false reproduz uma saudação/trivia sem critério algum, então
        // evaluate_sequential passa vacuamente e não chega a ser chamado de
        // novo para avaliação (sem isso o teste encobriria o bypass removido).
        let provider = MockLlmProvider::with_response(
            r#"{"think":"t","action":"answer","answer":"4","needs_definitive":false,"needs_freshness":false,"needs_plurality":false,"needs_completeness":false}"#,
        );
        let mut agent =
            DeepResearchAgent::new(Arc::new(provider), Arc::new(MockSearchClient::new()), Some(10_000));
        let result = agent.run("What is 2+2?").await;

        assert!(result.success);
        assert!(result.trivial, "zero evaluation criteria must mark the answer as trivial");
    }

    #[test]
    fn test_resolve_action_falls_back_when_not_permitted() {
        let agent = agent();
        let perms = ActionPermissions::all_disabled().without_answer();
        let response = ActionResponse::Search { think: "t".into(), queries: vec!["q".into()] };
        let action = agent.resolve_action(response, &perms);
        assert!(action.is_answer(), "search not permitted and reflect disabled should fall back to answer");
    }

    #[test]
    fn test_resolve_action_search_allowed() {
        let agent = agent();
        let perms = ActionPermissions::all_enabled();
        let response = ActionResponse::Search { think: "t".into(), queries: vec!["q".into()] };
        let action = agent.resolve_action(response, &perms);
        assert!(action.is_search());
    }

    #[test]
    fn test_execute_reflect_dedups_and_caps() {
        let mut agent = agent();
        agent.context = AgentContext::new("original".into());
        agent.execute_reflect(
            vec!["Gap A".into(), "gap a".into(), "Gap B".into(), "Gap C".into(), "Gap D".into()],
            "think".into(),
        );
        // "gap a" é duplicata normalizada de "Gap A"; cap de MAX_REFLECT_PER_STEP=3.
        assert_eq!(agent.context.gaps.len().min(MAX_REFLECT_PER_STEP + 1), agent.context.gaps.len());
        assert!(agent.context.gaps.len() <= MAX_REFLECT_PER_STEP + 1);
    }

    #[tokio::test]
    async fn test_execute_search_disables_on_all_duplicate_queries() {
        let mut agent = agent();
        agent.context = AgentContext::new("q".into());
        agent.context.all_keywords.insert(dedup::normalize("rust programming"));
        agent
            .execute_search(vec![SerpQuery { q: "Rust Programming".into(), ..Default::default() }], "t".into())
            .await;
        assert!(agent.context.search_disabled);
    }
}
