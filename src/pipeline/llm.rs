//! Generator interaction: one call per chunk, with timeout and retry.
//!
//! [`CardGenerator`] is the seam between the pipeline and whatever writes the
//! flashcards. [`LlmCardGenerator`] backs it with an `edgequake_llm`
//! provider; tests and embedders can plug in their own implementation through
//! [`crate::config::GenerationConfig::generator`].
//!
//! ## Retry Strategy
//!
//! Each attempt is bounded by `api_timeout_secs`. Failed or timed-out
//! attempts are retried with exponential backoff
//! (`retry_backoff_ms * 2^(attempt-1)`, capped at [`MAX_BACKOFF_MS`]), up to
//! `max_retries` times. When all
//! attempts fail, the chunk contributes no cards and carries a
//! [`ChunkError`]; the rest of the document is unaffected.

use crate::config::GenerationConfig;
use crate::error::{ChunkError, GeneratorError};
use crate::output::ChunkResult;
use crate::pipeline::chunk::Chunk;
use crate::pipeline::parse::FlashcardParser;
use crate::prompts::{chunk_request, DEFAULT_SYSTEM_PROMPT};
use async_trait::async_trait;
use edgequake_llm::{ChatMessage, CompletionOptions, LLMProvider};
use std::sync::Arc;
use std::time::Instant;
use tokio::time::{sleep, timeout, Duration};
use tracing::{debug, warn};

/// Upper bound on a single retry delay.
pub const MAX_BACKOFF_MS: u64 = 60_000;

/// What the pipeline sends for one chunk.
#[derive(Debug, Clone)]
pub struct GenerationRequest<'a> {
    /// 1-indexed chunk number.
    pub chunk_num: usize,
    /// Cards asked for in this chunk.
    pub count: usize,
    pub system_prompt: &'a str,
    /// User message embedding the count and the chunk text.
    pub user_prompt: String,
}

/// Raw text returned for one chunk.
#[derive(Debug, Clone, Default)]
pub struct Completion {
    pub content: String,
    pub input_tokens: usize,
    pub output_tokens: usize,
}

/// Produces free-form flashcard text for one chunk.
#[async_trait]
pub trait CardGenerator: Send + Sync {
    async fn generate(&self, request: &GenerationRequest<'_>) -> Result<Completion, GeneratorError>;
}

/// [`CardGenerator`] backed by an `edgequake_llm` chat provider.
pub struct LlmCardGenerator {
    provider: Arc<dyn LLMProvider>,
    options: CompletionOptions,
}

impl LlmCardGenerator {
    pub fn new(provider: Arc<dyn LLMProvider>, config: &GenerationConfig) -> Self {
        Self {
            provider,
            options: build_options(config),
        }
    }
}

#[async_trait]
impl CardGenerator for LlmCardGenerator {
    async fn generate(&self, request: &GenerationRequest<'_>) -> Result<Completion, GeneratorError> {
        let messages = vec![
            ChatMessage::system(request.system_prompt),
            ChatMessage::user(&request.user_prompt),
        ];
        let response = self
            .provider
            .chat(&messages, Some(&self.options))
            .await
            .map_err(|e| GeneratorError::Api(e.to_string()))?;

        Ok(Completion {
            content: response.content,
            input_tokens: response.prompt_tokens as usize,
            output_tokens: response.completion_tokens as usize,
        })
    }
}

/// Build `CompletionOptions` from the generation config.
fn build_options(config: &GenerationConfig) -> CompletionOptions {
    CompletionOptions {
        temperature: Some(config.temperature),
        max_tokens: Some(config.max_tokens),
        ..Default::default()
    }
}

/// Delay before retry number `attempt` (1-based); saturates instead of overflowing.
fn backoff_ms(base_ms: u64, attempt: u32) -> u64 {
    2u64.checked_pow(attempt.saturating_sub(1))
        .map_or(u64::MAX, |factor| base_ms.saturating_mul(factor))
        .min(MAX_BACKOFF_MS)
}

/// Generate and parse the cards for one chunk.
///
/// Always returns a `ChunkResult`; failures land in `result.error` so one bad
/// chunk never aborts the document.
pub async fn process_chunk(
    generator: &Arc<dyn CardGenerator>,
    chunk: &Chunk,
    target: usize,
    config: &GenerationConfig,
) -> ChunkResult {
    let chunk_num = chunk.index + 1;
    let mut result = ChunkResult::empty(chunk_num, chunk.start_page, chunk.end_page, target);
    let start = Instant::now();

    let request = GenerationRequest {
        chunk_num,
        count: target,
        system_prompt: config
            .system_prompt
            .as_deref()
            .unwrap_or(DEFAULT_SYSTEM_PROMPT),
        user_prompt: chunk_request(target, &chunk.text),
    };
    let call_timeout = Duration::from_secs(config.api_timeout_secs);

    let mut last_err: Option<GeneratorError> = None;

    for attempt in 0..=config.max_retries {
        if attempt > 0 {
            let backoff = backoff_ms(config.retry_backoff_ms, attempt);
            warn!(
                "Chunk {}: retry {}/{} after {}ms",
                chunk_num, attempt, config.max_retries, backoff
            );
            sleep(Duration::from_millis(backoff)).await;
        }

        let outcome = match timeout(call_timeout, generator.generate(&request)).await {
            Ok(r) => r,
            Err(_) => Err(GeneratorError::Timeout {
                secs: config.api_timeout_secs,
            }),
        };

        match outcome {
            Ok(completion) => {
                let parsed = FlashcardParser::new(config.min_question_words).parse(&completion.content);
                debug!(
                    "Chunk {}: {} input tokens, {} output tokens, {}/{} blocks accepted (target {})",
                    chunk_num,
                    completion.input_tokens,
                    completion.output_tokens,
                    parsed.cards.len(),
                    parsed.blocks_found,
                    target
                );
                result.cards = parsed.cards;
                result.blocks_found = parsed.blocks_found;
                result.blocks_skipped = parsed.blocks_skipped;
                result.input_tokens = completion.input_tokens;
                result.output_tokens = completion.output_tokens;
                result.retries = attempt;
                result.duration_ms = start.elapsed().as_millis() as u64;
                return result;
            }
            Err(e) => {
                warn!("Chunk {}: attempt {} failed — {}", chunk_num, attempt + 1, e);
                last_err = Some(e);
            }
        }
    }

    result.retries = config.max_retries;
    result.duration_ms = start.elapsed().as_millis() as u64;
    result.error = Some(match last_err {
        Some(GeneratorError::Timeout { secs }) => ChunkError::Timeout {
            chunk: chunk_num,
            secs,
        },
        Some(e) => ChunkError::GenerationFailed {
            chunk: chunk_num,
            retries: config.max_retries,
            detail: e.to_string(),
        },
        None => ChunkError::GenerationFailed {
            chunk: chunk_num,
            retries: config.max_retries,
            detail: "Unknown error".to_string(),
        },
    });
    result
}
