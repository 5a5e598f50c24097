// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// AGENT ANALYZER - Análise de Erros em Background
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//
// Analisa padrões de falha do agente após tentativas ruins na pergunta
// original. Roda via tokio::spawn para não bloquear a pipeline principal.
// Gera hints de melhoria que são injetados no próximo prompt do LLM.
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

use super::DiaryEntry;
use crate::generator::{generate_object, GenerateRequest, GeneratorError, LlmProvider, ModelTag};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::time::Instant;

/// Resultado da análise de erros do agente.
///
/// Contém um resumo cronológico (recap), identificação do problema (blame),
/// e sugestões acionáveis de melhoria (improvement).
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AgentAnalysis {
    /// Resumo cronológico das ações tomadas.
    ///
    /// Destaca padrões, repetições e onde o processo começou a dar errado.
    pub recap: String,

    /// Identificação específica do que deu errado.
    ///
    /// Aponta para passos ou padrões que levaram à resposta inadequada.
    pub blame: String,

    /// Sugestões acionáveis de melhoria.
    ///
    /// Fornece orientações concretas que poderiam levar a um melhor resultado.
    pub improvement: String,

    /// Tempo de execução da análise em milissegundos.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u128>,
}

fn analysis_schema() -> serde_json::Value {
    json!({
        "type": "object",
        "properties": {
            "recap": { "type": "string", "description": "chronological summary of actions taken" },
            "blame": { "type": "string", "description": "specific steps or patterns that caused the failure" },
            "improvement": { "type": "string", "description": "actionable suggestions for a better outcome" }
        },
        "required": ["recap", "blame", "improvement"]
    })
}

/// Formata o diário do agente para análise.
///
/// Converte as entradas do diário em um formato textual legível
/// que será enviado ao LLM para análise.
fn format_diary_for_analysis(diary: &[DiaryEntry], original_question: &str) -> String {
    let mut output = String::new();
    output.push_str("<steps>\n\n");

    for (i, entry) in diary.iter().enumerate() {
        let step_num = i + 1;
        match entry {
            DiaryEntry::Search { queries, think, urls_found } => {
                let keywords: Vec<_> = queries.iter().map(|q| q.q.as_str()).collect();
                output.push_str(&format!(
                    "At step {}, you took the **search** action and look for external information for the question: \"{}\".\n\
                    In particular, you tried to search for the following keywords: {}.\n\
                    You found {} URLs and add them to your URL list and **visit** them later when needed.\n\
                    Think: {}\n\n",
                    step_num,
                    original_question,
                    keywords.join(", "),
                    urls_found,
                    think
                ));
            }
            DiaryEntry::Read { urls, think } => {
                let url_list: Vec<_> = urls.iter().take(3).collect();
                output.push_str(&format!(
                    "At step {}, you took the **visit** action and deep dive into the following URLs:\n\
                    {}\n\
                    You found some useful information on the web and add them to your knowledge for future reference.\n\
                    Think: {}\n\n",
                    step_num,
                    url_list.iter().map(|u| u.as_str()).collect::<Vec<_>>().join("\n"),
                    think
                ));
            }
            DiaryEntry::Reflect { questions, think } => {
                output.push_str(&format!(
                    "At step {}, you took the **reflect** action and identified {} gap questions:\n\
                    {}\n\
                    Think: {}\n\n",
                    step_num,
                    questions.len(),
                    questions.iter().take(3).map(|q| format!("- {}", q)).collect::<Vec<_>>().join("\n"),
                    think
                ));
            }
            DiaryEntry::FailedAnswer { answer, eval_type, reason } => {
                output.push_str(&format!(
                    "At step {}, you took **answer** action but evaluator thinks it is not a good answer:\n\
                    Answer (truncated): {}...\n\
                    Failed evaluation: {:?}\n\
                    Reason: {}\n\n",
                    step_num,
                    answer.chars().take(200).collect::<String>(),
                    eval_type,
                    reason
                ));
            }
        }
    }

    output.push_str("</steps>");
    output
}

/// Constrói o prompt do sistema para análise de erros.
fn build_system_prompt() -> String {
    r#"You are an expert at analyzing search and reasoning processes. Your task is to analyze the given sequence of steps and identify what went wrong in the search process.

<rules>
1. The sequence of actions taken
2. The effectiveness of each step
3. The logic between consecutive steps
4. Alternative approaches that could have been taken
5. Signs of getting stuck in repetitive patterns
6. Whether the final answer matches the accumulated information

Analyze the steps and provide detailed feedback following these guidelines:
- In the recap: Summarize key actions chronologically, highlight patterns, and identify where the process started to go wrong
- In the blame: Point to specific steps or patterns that led to the inadequate answer
- In the improvement: Provide actionable suggestions that could have led to a better outcome
</rules>

<example>
<input>
<steps>

At step 1, you took the **search** action and look for external information for the question: "how old is jina ai ceo?".
In particular, you tried to search for the following keywords: "jina ai ceo age".
You found quite some information and add them to your URL list and **visit** them later when needed.


At step 2, you took the **visit** action and deep dive into the following URLs:
https://www.linkedin.com/in/hxiao87
https://www.crunchbase.com/person/han-xiao
You found some useful information on the web and add them to your knowledge for future reference.


At step 3, you took the **search** action and look for external information for the question: "how old is jina ai ceo?".
In particular, you tried to search for the following keywords: "Han Xiao birthdate, Jina AI founder birthdate".
You found quite some information and add them to your URL list and **visit** them later when needed.


At step 4, you took the **search** action and look for external information for the question: "how old is jina ai ceo?".
In particular, you tried to search for the following keywords: han xiao birthday.
But then you realized you have already searched for these keywords before.
You decided to think out of the box or cut from a completely different angle.


At step 5, you took **answer** action but evaluator thinks it is not a good answer:

</steps>

Original question:
how old is jina ai ceo?

Your answer:
The age of the Jina AI CEO cannot be definitively determined from the provided information.

The evaluator thinks your answer is bad because:
The answer is not definitive and fails to provide the requested information.
</input>


<output>
{
  "recap": "The search process consisted of 5 steps with search and visit actions focused on biographical sources, then repeated an identical search in step 4.",
  "blame": "The process got stuck repeating the same search instead of trying indirect signals like education history or career milestones.",
  "improvement": "1. Track previously searched terms to avoid repeats. 2. Try indirect approaches such as graduation years or founding dates. 3. Favor business sources over entertainment sites."
}
</output>
</example>

IMPORTANT: You MUST respond ONLY with valid JSON in the exact format shown above. No markdown, no explanations, just the JSON object with "recap", "blame", and "improvement" fields."#.to_string()
}

/// Constrói o prompt do usuário para análise.
fn build_user_prompt(
    diary_text: &str,
    original_question: &str,
    failed_answer: &str,
    failure_reason: &str,
) -> String {
    format!(
        "{}\n\nOriginal question:\n{}\n\nYour answer:\n{}\n\nThe evaluator thinks your answer is bad because:\n{}",
        diary_text, original_question, failed_answer, failure_reason
    )
}

/// Faz o parsing do JSON retornado pelo LLM, já na forma de `serde_json::Value`.
fn parse_analysis_response(value: serde_json::Value) -> Result<AgentAnalysis, GeneratorError> {
    serde_json::from_value(value.clone())
        .map_err(|e| GeneratorError::UnparsableOutput(format!("{e}: {value}")))
}

/// Analisa os passos do agente para identificar padrões de erro.
///
/// Esta função é projetada para rodar em `tokio::spawn` de forma assíncrona,
/// sem bloquear a pipeline principal do agente.
pub async fn analyze_steps(
    diary: &[DiaryEntry],
    original_question: &str,
    failed_answer: &str,
    failure_reason: &str,
    provider: &dyn LlmProvider,
) -> Result<AgentAnalysis, GeneratorError> {
    let start = Instant::now();

    log::info!("AgentAnalyzer: iniciando análise de {} entradas do diário", diary.len());

    let diary_text = format_diary_for_analysis(diary, original_question);
    let system_prompt = build_system_prompt();
    let user_prompt = build_user_prompt(&diary_text, original_question, failed_answer, failure_reason);

    let request = GenerateRequest::new(ModelTag::ErrorAnalyzer, analysis_schema(), &system_prompt, &user_prompt)
        .with_retries(1);

    let (value, _usage) = generate_object(provider, provider, request).await?;
    let mut analysis = parse_analysis_response(value)?;
    analysis.duration_ms = Some(start.elapsed().as_millis());

    log::info!("AgentAnalyzer: análise concluída em {}ms", analysis.duration_ms.unwrap_or(0));
    log::debug!("recap: {}", analysis.recap.chars().take(100).collect::<String>());
    log::debug!("blame: {}", analysis.blame.chars().take(100).collect::<String>());

    Ok(analysis)
}
