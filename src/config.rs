// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// CONFIGURAÇÃO DO RUNTIME E WEBREADER
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//
// Configurações para o runtime Tokio e escolha do WebReader.
// Todas as configurações podem ser definidas via .env
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

use std::fmt;

/// Preferência de método para leitura de URLs.
///
/// Define qual backend usar para extrair conteúdo de páginas web:
/// - `JinaOnly`: Apenas Jina Reader API (sem fallback)
/// - `RustOnly`: Apenas Rust local + Readability (sem fallback)
/// - `Compare`: Tenta Rust primeiro, Jina como fallback (padrão)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WebReaderPreference {
    /// Usar apenas Jina Reader API.
    /// Mais confiável para sites complexos, mas depende de API externa.
    JinaOnly,

    /// Usar apenas Rust local + Readability.
    /// Mais rápido e sem dependência externa, mas pode falhar em sites complexos.
    RustOnly,

    /// Tentar Rust primeiro, Jina como fallback (comportamento padrão).
    /// Melhor dos dois mundos: velocidade quando possível, confiabilidade quando necessário.
    #[default]
    Compare,
}

impl WebReaderPreference {
    /// Converte string do .env para WebReaderPreference.
    ///
    /// Case-insensitive:
    /// - "jina" → JinaOnly
    /// - "rust" → RustOnly
    /// - "compare" ou qualquer outro valor → Compare
    pub fn from_env(value: &str) -> Self {
        match value.to_lowercase().trim() {
            "jina" => Self::JinaOnly,
            "rust" => Self::RustOnly,
            _ => Self::Compare,
        }
    }

    /// Retorna nome legível para logs.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::JinaOnly => "Jina Only",
            Self::RustOnly => "Rust Only",
            Self::Compare => "Compare (Rust → Jina)",
        }
    }
}

impl fmt::Display for WebReaderPreference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// Configuração do runtime Tokio.
///
/// Controla número de threads e comportamento do async runtime.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    /// Número de worker threads do Tokio.
    /// Se None, usa cálculo dinâmico: min(cpu_cores, max_threads).
    pub worker_threads: Option<usize>,

    /// Número máximo de threads (limite superior para cálculo dinâmico).
    /// Padrão: 16
    pub max_threads: usize,

    /// Número máximo de blocking threads.
    /// Padrão: 512 (padrão do Tokio)
    pub max_blocking_threads: usize,

    /// Nome da thread principal.
    pub thread_name: String,

    /// Preferência de WebReader.
    pub webreader: WebReaderPreference,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            worker_threads: None, // Dinâmico
            max_threads: 16,
            max_blocking_threads: 512,
            thread_name: "deep-research".to_string(),
            webreader: WebReaderPreference::default(),
        }
    }
}

impl RuntimeConfig {
    /// Cria configuração padrão.
    pub fn new() -> Self {
        Self::default()
    }

    /// Calcula número efetivo de worker threads.
    ///
    /// Se `worker_threads` está definido, usa esse valor.
    /// Senão, calcula: min(cpu_cores, max_threads)
    pub fn effective_worker_threads(&self) -> usize {
        if let Some(threads) = self.worker_threads {
            threads
        } else {
            let cpu_cores = num_cpus::get();
            std::cmp::min(cpu_cores, self.max_threads)
        }
    }
}

/// Carrega configuração do runtime a partir das variáveis de ambiente.
///
/// Variáveis suportadas:
/// - `TOKIO_THREADS`: Número fixo de threads (opcional)
/// - `TOKIO_MAX_THREADS`: Máximo de threads para cálculo dinâmico (padrão: 16)
/// - `TOKIO_MAX_BLOCKING`: Máximo de blocking threads (padrão: 512)
/// - `WEBREADER`: Preferência de reader ("jina", "rust", "compare")
///
/// # Exemplo
///
/// ```rust,ignore
/// // .env
/// TOKIO_THREADS=4
/// WEBREADER=rust
///
/// // código
/// let config = load_runtime_config();
/// assert_eq!(config.worker_threads, Some(4));
/// assert_eq!(config.webreader, WebReaderPreference::RustOnly);
/// ```
pub fn load_runtime_config() -> RuntimeConfig {
    let mut config = RuntimeConfig::default();

    // TOKIO_THREADS: número fixo de threads
    if let Ok(threads_str) = std::env::var("TOKIO_THREADS") {
        if let Ok(threads) = threads_str.parse::<usize>() {
            if threads > 0 {
                config.worker_threads = Some(threads);
                log::info!("📦 TOKIO_THREADS={} (fixo)", threads);
            }
        }
    }

    // TOKIO_MAX_THREADS: limite superior para cálculo dinâmico
    if let Ok(max_str) = std::env::var("TOKIO_MAX_THREADS") {
        if let Ok(max) = max_str.parse::<usize>() {
            if max > 0 {
                config.max_threads = max;
                log::info!("📦 TOKIO_MAX_THREADS={}", max);
            }
        }
    }

    // TOKIO_MAX_BLOCKING: máximo de blocking threads
    if let Ok(blocking_str) = std::env::var("TOKIO_MAX_BLOCKING") {
        if let Ok(blocking) = blocking_str.parse::<usize>() {
            if blocking > 0 {
                config.max_blocking_threads = blocking;
                log::info!("📦 TOKIO_MAX_BLOCKING={}", blocking);
            }
        }
    }

    // WEBREADER: preferência de método de leitura
    if let Ok(webreader_str) = std::env::var("WEBREADER") {
        config.webreader = WebReaderPreference::from_env(&webreader_str);
        log::info!("📦 WEBREADER={}", config.webreader);
    }

    // Log da configuração efetiva
    let effective_threads = config.effective_worker_threads();
    let cpu_cores = num_cpus::get();

    if config.worker_threads.is_none() {
        log::info!(
            "🔧 Tokio: {} threads (dinâmico: min({} cores, {} max))",
            effective_threads,
            cpu_cores,
            config.max_threads
        );
    }

    config
}

/// Instala panic hook customizado que não envenena outras threads.
///
/// O panic hook padrão do Rust pode causar "poison" em Mutex/RwLock
/// quando uma thread entra em panic enquanto segura um lock.
///
/// Este hook customizado:
/// 1. Loga o panic com informações da thread
/// 2. NÃO propaga o panic para outras threads
/// 3. Permite que o runtime Tokio continue funcionando
///
/// # Uso
///
/// ```rust,ignore
/// install_panic_hook();
/// // Agora panics em threads individuais não afetam outras threads
/// ```
pub fn install_panic_hook() {
    let original_hook = std::panic::take_hook();

    std::panic::set_hook(Box::new(move |panic_info| {
        let thread = std::thread::current();
        let thread_id = format!("{:?}", thread.id());
        let thread_name = thread.name().unwrap_or("unnamed");

        // Extrair localização do panic
        let location = panic_info.location().map(|loc| {
            format!("{}:{}:{}", loc.file(), loc.line(), loc.column())
        }).unwrap_or_else(|| "unknown location".to_string());

        // Extrair mensagem do panic
        let message = if let Some(s) = panic_info.payload().downcast_ref::<&str>() {
            s.to_string()
        } else if let Some(s) = panic_info.payload().downcast_ref::<String>() {
            s.clone()
        } else {
            "Unknown panic payload".to_string()
        };

        // Log estruturado do panic (não usa eprintln para não corromper TUI)
        log::error!(
            "[PANIC] Thread {} ({}) at {}: {}",
            thread_id,
            thread_name,
            location,
            message
        );

        // Chamar hook original para manter comportamento padrão de logging
        // mas NÃO abortar o processo inteiro
        // O Tokio vai capturar o JoinError e permitir que outras tasks continuem

        // Nota: não chamamos original_hook aqui para evitar abort em release mode
        // Em vez disso, deixamos o Tokio lidar com o panic da task
        let _ = &original_hook; // Evita warning de unused
    }));
}

/// Cria o runtime Tokio com configuração customizada.
///
/// Esta função deve ser chamada no início do programa, antes de qualquer
/// código async. Configura:
/// - Número de worker threads (dinâmico ou fixo)
/// - Número máximo de blocking threads
/// - Panic hook isolado
///
/// # Exemplo
///
/// ```rust,ignore
/// fn main() {
///     let config = load_runtime_config();
///     let runtime = create_tokio_runtime(&config).expect("Failed to create runtime");
///
///     runtime.block_on(async {
///         // código async aqui
///     });
/// }
/// ```
pub fn create_tokio_runtime(config: &RuntimeConfig) -> std::io::Result<tokio::runtime::Runtime> {
    let worker_threads = config.effective_worker_threads();

    log::info!(
        "🚀 Criando runtime Tokio: {} workers, {} blocking max",
        worker_threads,
        config.max_blocking_threads
    );

    tokio::runtime::Builder::new_multi_thread()
        .worker_threads(worker_threads)
        .max_blocking_threads(config.max_blocking_threads)
        .thread_name(&config.thread_name)
        .enable_all()
        .build()
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// CONFIGURAÇÃO DO AGENTE
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//
// Ajustes ambientais do agente: budget de tokens, cool-down entre steps,
// timeouts de provedor e overrides de temperatura/max-tokens por model tag.
// Não carrega min_steps_before_answer/allow_direct_answer: esses campos não
// tinham nenhuma base nos invariantes do agente, então as permissões de ação
// (`agent::permissions`) derivam diretamente do estado da sessão.
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

use crate::generator::ModelTag;
use std::collections::HashMap;
use std::time::Duration;

/// Overrides de geração por model tag.
#[derive(Debug, Clone, Copy)]
pub struct ModelTagConfig {
    /// Temperatura usada nas chamadas desse tag.
    pub temperature: f32,
    /// Limite de tokens de saída.
    pub max_tokens: u32,
}

/// Configuração ambiental do agente de pesquisa.
#[derive(Debug, Clone)]
pub struct AgentConfig {
    /// Budget padrão de tokens quando nenhum é fornecido explicitamente.
    pub default_token_budget: u64,
    /// Fração do budget (0.0-1.0) a partir da qual o Beast Mode é forçado.
    pub beast_mode_threshold: f64,
    /// Número máximo de tentativas ruins na pergunta original antes do Beast Mode.
    pub max_bad_attempts: u32,
    /// Válvula de segurança para o Open Question #1 (loop sem resposta): força
    /// Beast Mode ao atingir este número de steps, sem alterar a semântica da
    /// resposta produzida.
    pub max_steps: u32,
    /// Cool-down entre steps.
    pub step_sleep: Duration,
    /// Timeout do URL reader.
    pub reader_timeout: Duration,
    /// Timeout de busca e embeddings.
    pub search_embedding_timeout: Duration,
    /// Overrides de temperatura/max-tokens por model tag.
    pub model_tags: HashMap<ModelTag, ModelTagConfig>,
}

impl Default for AgentConfig {
    fn default() -> Self {
        let mut model_tags = HashMap::new();
        model_tags.insert(ModelTag::Agent, ModelTagConfig { temperature: 0.7, max_tokens: 2000 });
        model_tags.insert(ModelTag::AgentBeastMode, ModelTagConfig { temperature: 0.9, max_tokens: 4000 });
        model_tags.insert(ModelTag::Evaluator, ModelTagConfig { temperature: 0.0, max_tokens: 1000 });
        model_tags.insert(ModelTag::Coder, ModelTagConfig { temperature: 0.2, max_tokens: 2000 });
        model_tags.insert(ModelTag::Dedup, ModelTagConfig { temperature: 0.0, max_tokens: 500 });
        model_tags.insert(ModelTag::QueryRewriter, ModelTagConfig { temperature: 0.3, max_tokens: 500 });
        model_tags.insert(ModelTag::ErrorAnalyzer, ModelTagConfig { temperature: 0.3, max_tokens: 1500 });
        model_tags.insert(ModelTag::Fallback, ModelTagConfig { temperature: 0.0, max_tokens: 1000 });

        Self {
            default_token_budget: crate::utils::token_tracker::DEFAULT_TOKEN_BUDGET,
            beast_mode_threshold: crate::utils::token_tracker::BEAST_MODE_THRESHOLD,
            max_bad_attempts: 2,
            max_steps: 40,
            step_sleep: Duration::from_millis(0),
            reader_timeout: Duration::from_secs(60),
            search_embedding_timeout: Duration::from_secs(10),
            model_tags,
        }
    }
}

impl AgentConfig {
    /// Cria a configuração padrão.
    pub fn new() -> Self {
        Self::default()
    }

    /// Retorna o override de model tag, caindo para um padrão razoável se ausente.
    pub fn model_tag_config(&self, tag: ModelTag) -> ModelTagConfig {
        self.model_tags
            .get(&tag)
            .copied()
            .unwrap_or(ModelTagConfig { temperature: 0.5, max_tokens: 1000 })
    }
}
