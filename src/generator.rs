// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// GERADOR DE SAÍDA ESTRUTURADA SEGURO
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//
// Contrato genérico para chamadas de LLM que devem retornar um objeto
// conforme um JSON Schema. Generaliza os métodos estreitos que o cliente
// LLM original expunha (decide_action/generate_answer/evaluate/...) em um
// único `generate_object`, com recuperação em estágios quando o modelo não
// respeita o schema.
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

use async_trait::async_trait;
use serde_json::Value;

/// Identifica o propósito de uma chamada de geração, usado para mapear
/// overrides de temperatura/max-tokens e para o tracking de tokens por
/// operação.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModelTag {
    /// Decisão da próxima ação do agente.
    Agent,
    /// Decisão de ação durante o Beast Mode.
    AgentBeastMode,
    /// Avaliação de uma resposta candidata.
    Evaluator,
    /// Geração/análise de código (reservado; não exposto por nenhuma ação).
    Coder,
    /// Deduplicação semântica de queries/perguntas.
    Dedup,
    /// Reescrita de queries de busca.
    QueryRewriter,
    /// Análise de erro após tentativas malsucedidas.
    ErrorAnalyzer,
    /// Modelo de fallback usado na recuperação do schema distilado.
    Fallback,
}

impl ModelTag {
    /// Nome estável usado como `operation` no `TokenTracker`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Agent => "agent",
            Self::AgentBeastMode => "agentBeastMode",
            Self::Evaluator => "evaluator",
            Self::Coder => "coder",
            Self::Dedup => "dedup",
            Self::QueryRewriter => "queryRewriter",
            Self::ErrorAnalyzer => "errorAnalyzer",
            Self::Fallback => "fallback",
        }
    }
}

/// Uma mensagem de chat (alternativa a `prompt` para conversas multi-turno).
#[derive(Debug, Clone)]
pub struct ChatMessage {
    /// Papel: "system", "user" ou "assistant".
    pub role: String,
    /// Conteúdo da mensagem.
    pub content: String,
}

/// Requisição de geração de objeto estruturado.
#[derive(Debug, Clone)]
pub struct GenerateRequest {
    /// Tag do modelo/propósito desta chamada.
    pub model_tag: ModelTag,
    /// JSON Schema que a saída deve respeitar.
    pub schema: Value,
    /// Instrução de sistema, se houver.
    pub system: Option<String>,
    /// Prompt de usuário de turno único.
    pub prompt: Option<String>,
    /// Histórico de mensagens, alternativa a `prompt`.
    pub messages: Option<Vec<ChatMessage>>,
    /// Quantas vezes tentar novamente o mesmo modelo antes de cair para o fallback.
    pub num_retries: u8,
}

impl GenerateRequest {
    /// Cria uma requisição de turno único com prompt/sistema.
    pub fn new(model_tag: ModelTag, schema: Value, system: &str, prompt: &str) -> Self {
        Self {
            model_tag,
            schema,
            system: Some(system.to_string()),
            prompt: Some(prompt.to_string()),
            messages: None,
            num_retries: 0,
        }
    }

    /// Define o número de retentativas antes do fallback.
    pub fn with_retries(mut self, retries: u8) -> Self {
        self.num_retries = retries;
        self
    }
}

/// Uso de tokens de uma chamada de geração.
#[derive(Debug, Clone, Copy, Default)]
pub struct GenerationUsage {
    /// Tokens de prompt.
    pub prompt_tokens: u64,
    /// Tokens de completion.
    pub completion_tokens: u64,
}

/// Resposta de uma chamada de geração bem-sucedida.
#[derive(Debug, Clone)]
pub struct GenerateResponse {
    /// Texto bruto retornado pelo provedor (antes do parsing do schema).
    pub raw_text: String,
    /// Uso de tokens reportado pelo provedor.
    pub usage: GenerationUsage,
}

/// Resultado de embedding de um provedor.
#[derive(Debug, Clone)]
pub struct EmbeddingResult {
    /// Vetor de embedding.
    pub vector: Vec<f32>,
    /// Tokens consumidos.
    pub tokens_used: u64,
}

/// Erros do gerador e dos provedores subjacentes.
#[derive(Debug, thiserror::Error)]
pub enum GeneratorError {
    /// Erro de rede/API ao chamar o provedor.
    #[error("provider error: {0}")]
    ProviderError(String),
    /// Limite de taxa excedido.
    #[error("rate limit exceeded")]
    RateLimitError,
    /// Saída não pôde ser interpretada como o schema pedido, mesmo após
    /// recuperação em estágios.
    #[error("could not parse structured output after recovery: {0}")]
    UnparsableOutput(String),
    /// Budget de tokens seria excedido por esta chamada.
    #[error("token budget would be exceeded: used {used} + estimated {estimated} > budget {budget}")]
    BudgetExceeded { used: u64, estimated: u64, budget: u64 },
}

/// Contrato de um provedor de LLM capaz de gerar objetos estruturados e
/// embeddings. Implementações concretas (OpenAI, Anthropic, ...) ficam fora
/// de escopo desta crate e permanecem como placeholders `todo!()`.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Executa uma única chamada ao modelo e retorna o texto bruto.
    async fn generate(&self, request: &GenerateRequest) -> Result<GenerateResponse, GeneratorError>;

    /// Gera o embedding de um texto.
    async fn embed(&self, text: &str) -> Result<EmbeddingResult, GeneratorError>;

    /// Gera embeddings em lote, preservando a ordem da entrada. Índices que
    /// falharem individualmente devem ser preenchidos com vetor zero em vez
    /// de abortar o lote inteiro.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<EmbeddingResult>, GeneratorError>;
}

/// Remove recursivamente os campos `description` de um JSON Schema,
/// produzindo a versão "distilada" usada na última etapa de recuperação.
pub fn distill_schema(schema: &Value) -> Value {
    match schema {
        Value::Object(map) => {
            let mut out = serde_json::Map::new();
            for (k, v) in map {
                if k == "description" {
                    continue;
                }
                out.insert(k.clone(), distill_schema(v));
            }
            Value::Object(out)
        }
        Value::Array(items) => Value::Array(items.iter().map(distill_schema).collect()),
        other => other.clone(),
    }
}

/// Tenta extrair um objeto JSON bem-formado de uma string de resposta que
/// pode vir envolta em cercas de markdown ou com texto extra ao redor.
///
/// Estágios: (1) parse estrito direto; (2) remove cercas ```json/``` e
/// tenta de novo; (3) procura o primeiro `{`...`}` balanceado no texto.
pub fn lenient_parse(text: &str) -> Option<Value> {
    if let Ok(v) = serde_json::from_str::<Value>(text.trim()) {
        return Some(v);
    }

    let stripped = if text.contains("```json") {
        text.split("```json").nth(1).and_then(|s| s.split("```").next())
    } else if text.contains("```") {
        text.split("```").nth(1)
    } else {
        None
    };
    if let Some(candidate) = stripped {
        if let Ok(v) = serde_json::from_str::<Value>(candidate.trim()) {
            return Some(v);
        }
    }

    find_first_balanced_object(text).and_then(|s| serde_json::from_str::<Value>(&s).ok())
}

fn find_first_balanced_object(text: &str) -> Option<String> {
    let bytes = text.as_bytes();
    let start = text.find('{')?;
    let mut depth = 0i32;
    let mut in_string = false;
    let mut escaped = false;
    for (offset, &byte) in bytes[start..].iter().enumerate() {
        let ch = byte as char;
        if in_string {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == '"' {
                in_string = false;
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    let end = start + offset + 1;
                    return Some(text[start..end].to_string());
                }
            }
            _ => {}
        }
    }
    None
}

/// Marcador usado para localizar onde truncar uma saída malformada antes de
/// pedir ao modelo de fallback que extraia o objeto dela.
const FALLBACK_TRUNCATION_MARKER: &str = "\"url\":";
/// Tamanho máximo, em caracteres, do texto falho repassado ao fallback.
const FALLBACK_MAX_CHARS: usize = 8000;

/// Trunca uma saída malformada na última ocorrência do marcador de
/// truncamento, e então limita o resultado a `FALLBACK_MAX_CHARS`
/// caracteres. Sem ocorrência do marcador, apenas aplica o limite.
fn truncate_failed_output(raw: &str) -> String {
    let cut = match raw.rfind(FALLBACK_TRUNCATION_MARKER) {
        Some(idx) => &raw[..idx + FALLBACK_TRUNCATION_MARKER.len()],
        None => raw,
    };
    if cut.chars().count() > FALLBACK_MAX_CHARS {
        cut.chars().take(FALLBACK_MAX_CHARS).collect()
    } else {
        cut.to_string()
    }
}

/// Executa o contrato `generate_object` completo: chamada conforme o
/// schema, parse estrito, parse lenient, retentativas no mesmo modelo e,
/// por fim, uma chamada contra o provedor de fallback com schema distilado,
/// pedindo para extrair o objeto da última saída malformada (truncada por
/// `truncate_failed_output`); se a última falha não teve saída bruta (ex:
/// erro de rede), recai para o prompt original truncado.
pub async fn generate_object(
    provider: &dyn LlmProvider,
    fallback_provider: &dyn LlmProvider,
    request: GenerateRequest,
) -> Result<(Value, GenerationUsage), GeneratorError> {
    let mut attempt = 0u8;
    let mut last_error: Option<GeneratorError> = None;

    loop {
        match provider.generate(&request).await {
            Ok(response) => {
                if let Some(value) = lenient_parse(&response.raw_text) {
                    return Ok((value, response.usage));
                }
                last_error = Some(GeneratorError::UnparsableOutput(response.raw_text));
            }
            Err(e) => last_error = Some(e),
        }

        if attempt >= request.num_retries {
            break;
        }
        attempt += 1;
        log::warn!(
            "generate_object: retrying {} attempt {}/{}",
            request.model_tag.as_str(),
            attempt,
            request.num_retries
        );
    }

    log::warn!(
        "generate_object: {} falling back to distilled schema + fallback model after {}",
        request.model_tag.as_str(),
        last_error.as_ref().map(|e| e.to_string()).unwrap_or_default()
    );

    let distilled = distill_schema(&request.schema);
    let recovery_prompt = match &last_error {
        Some(GeneratorError::UnparsableOutput(raw)) => format!(
            "The previous model call produced output that does not conform to the schema. \
            Extract the object described by the schema from this raw output:\n\n{}",
            truncate_failed_output(raw)
        ),
        _ => request.prompt.clone().unwrap_or_default(),
    };
    let fallback_request = GenerateRequest {
        model_tag: ModelTag::Fallback,
        schema: distilled,
        system: request.system.clone(),
        prompt: Some(recovery_prompt),
        messages: request.messages.clone(),
        num_retries: 0,
    };

    match fallback_provider.generate(&fallback_request).await {
        Ok(response) => match lenient_parse(&response.raw_text) {
            Some(value) => Ok((value, response.usage)),
            None => Err(GeneratorError::UnparsableOutput(response.raw_text)),
        },
        Err(e) => Err(e),
    }
}

/// Provedor mock para testes unitários e para o CLI antes de provedores
/// concretos existirem.
#[derive(Debug, Default)]
pub struct MockLlmProvider {
    /// Texto fixo retornado por `generate`, se definido.
    pub canned_response: Option<String>,
}

impl MockLlmProvider {
    /// Cria um mock que devolve um JSON de propósito geral.
    pub fn new() -> Self {
        Self::default()
    }

    /// Cria um mock que sempre devolve o texto fornecido.
    pub fn with_response(text: &str) -> Self {
        Self { canned_response: Some(text.to_string()) }
    }
}

#[async_trait]
impl LlmProvider for MockLlmProvider {
    async fn generate(&self, request: &GenerateRequest) -> Result<GenerateResponse, GeneratorError> {
        let raw_text = self
            .canned_response
            .clone()
            .unwrap_or_else(|| r#"{"think":"mock","action":"answer"}"#.to_string());
        let _ = request;
        Ok(GenerateResponse {
            raw_text,
            usage: GenerationUsage { prompt_tokens: 50, completion_tokens: 20 },
        })
    }

    async fn embed(&self, _text: &str) -> Result<EmbeddingResult, GeneratorError> {
        Ok(EmbeddingResult { vector: vec![0.0; 1536], tokens_used: 10 })
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<EmbeddingResult>, GeneratorError> {
        Ok(texts
            .iter()
            .map(|_| EmbeddingResult { vector: vec![0.0; 1536], tokens_used: 10 })
            .collect())
    }
}
