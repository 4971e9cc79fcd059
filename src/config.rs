//! Configuration types for flashcard generation.
//!
//! All generation behaviour is controlled through [`GenerationConfig`], built
//! via its [`GenerationConfigBuilder`]. Keeping every knob in one struct makes
//! it trivial to share configs across tasks, log them, and diff two runs.
//!
//! `build()` rejects windows that would never advance (`overlap >= chunk_size`)
//! so the chunker can never loop forever.

use crate::error::Pdf2CardsError;
use crate::output::DEFAULT_MIN_QUESTION_WORDS;
use crate::pipeline::llm::CardGenerator;
use crate::progress::ProgressCallback;
use edgequake_llm::LLMProvider;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Configuration for a flashcard generation run.
///
/// # Example
/// ```rust
/// use edgequake_pdf2cards::GenerationConfig;
///
/// let config = GenerationConfig::builder()
///     .num_cards(10)
///     .chunk_size(3)
///     .overlap(1)
///     .build()
///     .unwrap();
/// assert_eq!(config.num_cards, 10);
/// ```
#[derive(Clone)]
pub struct GenerationConfig {
    /// Total number of cards requested for the whole document. Default: 5.
    pub num_cards: usize,

    /// Pages per chunk. Default: 3.
    pub chunk_size: usize,

    /// Pages shared between consecutive chunks. Must be < `chunk_size`. Default: 1.
    ///
    /// Overlap lets a concept that straddles a page break appear whole in at
    /// least one chunk.
    pub overlap: usize,

    /// Maximum generator calls in flight. Default: 4.
    ///
    /// `1` reproduces strictly sequential generation. Results are always
    /// reassembled in chunk order, whatever the completion order.
    pub concurrency: usize,

    /// LLM model identifier, e.g. "gpt-4.1-nano". If None, uses provider default.
    pub model: Option<String>,

    /// LLM provider name (e.g. "openai", "anthropic", "ollama").
    pub provider_name: Option<String>,

    /// Pre-constructed LLM provider. Takes precedence over `provider_name`.
    pub provider: Option<Arc<dyn LLMProvider>>,

    /// Pre-constructed card generator. Takes precedence over every provider setting.
    pub generator: Option<Arc<dyn CardGenerator>>,

    /// Sampling temperature. Default: 0.5.
    ///
    /// Question writing benefits from some variety, unlike transcription.
    pub temperature: f32,

    /// Maximum tokens the LLM may generate per chunk. Default: 2048.
    pub max_tokens: usize,

    /// Maximum retry attempts on a failed generator call. Default: 3.
    pub max_retries: u32,

    /// Initial retry delay in milliseconds; doubles after each attempt. Default: 500.
    pub retry_backoff_ms: u64,

    /// Per-generator-call timeout in seconds. Default: 60.
    pub api_timeout_secs: u64,

    /// Download timeout for URL inputs in seconds. Default: 120.
    pub download_timeout_secs: u64,

    /// PDF user password for encrypted documents.
    pub password: Option<String>,

    /// Custom system prompt. If None, uses the built-in one.
    pub system_prompt: Option<String>,

    /// Minimum whitespace-separated tokens for an accepted question. Default: 5.
    pub min_question_words: usize,

    /// Page selection. Default: All pages.
    pub pages: PageSelection,

    /// Optional per-chunk progress events.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            num_cards: 5,
            chunk_size: 3,
            overlap: 1,
            concurrency: 4,
            model: None,
            provider_name: None,
            provider: None,
            generator: None,
            temperature: 0.5,
            max_tokens: 2048,
            max_retries: 3,
            retry_backoff_ms: 500,
            api_timeout_secs: 60,
            download_timeout_secs: 120,
            password: None,
            system_prompt: None,
            min_question_words: DEFAULT_MIN_QUESTION_WORDS,
            pages: PageSelection::default(),
            progress_callback: None,
        }
    }
}

impl fmt::Debug for GenerationConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GenerationConfig")
            .field("num_cards", &self.num_cards)
            .field("chunk_size", &self.chunk_size)
            .field("overlap", &self.overlap)
            .field("concurrency", &self.concurrency)
            .field("model", &self.model)
            .field("provider_name", &self.provider_name)
            .field("provider", &self.provider.as_ref().map(|_| "<dyn LLMProvider>"))
            .field("generator", &self.generator.as_ref().map(|_| "<dyn CardGenerator>"))
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("max_retries", &self.max_retries)
            .field("api_timeout_secs", &self.api_timeout_secs)
            .field("min_question_words", &self.min_question_words)
            .field("pages", &self.pages)
            .finish()
    }
}

impl GenerationConfig {
    /// Create a new builder for `GenerationConfig`.
    pub fn builder() -> GenerationConfigBuilder {
        GenerationConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`GenerationConfig`].
pub struct GenerationConfigBuilder {
    config: GenerationConfig,
}

impl fmt::Debug for GenerationConfigBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GenerationConfigBuilder")
            .field("config", &self.config)
            .finish()
    }
}

impl GenerationConfigBuilder {
    pub fn num_cards(mut self, n: usize) -> Self {
        self.config.num_cards = n;
        self
    }

    pub fn chunk_size(mut self, pages: usize) -> Self {
        self.config.chunk_size = pages;
        self
    }

    pub fn overlap(mut self, pages: usize) -> Self {
        self.config.overlap = pages;
        self
    }

    pub fn concurrency(mut self, n: usize) -> Self {
        self.config.concurrency = n.max(1);
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = Some(model.into());
        self
    }

    pub fn provider_name(mut self, name: impl Into<String>) -> Self {
        self.config.provider_name = Some(name.into());
        self
    }

    pub fn provider(mut self, provider: Arc<dyn LLMProvider>) -> Self {
        self.config.provider = Some(provider);
        self
    }

    pub fn generator(mut self, generator: Arc<dyn CardGenerator>) -> Self {
        self.config.generator = Some(generator);
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.config.temperature = t.clamp(0.0, 2.0);
        self
    }

    pub fn max_tokens(mut self, n: usize) -> Self {
        self.config.max_tokens = n;
        self
    }

    pub fn max_retries(mut self, n: u32) -> Self {
        self.config.max_retries = n;
        self
    }

    pub fn retry_backoff_ms(mut self, ms: u64) -> Self {
        self.config.retry_backoff_ms = ms;
        self
    }

    pub fn api_timeout_secs(mut self, secs: u64) -> Self {
        self.config.api_timeout_secs = secs;
        self
    }

    pub fn download_timeout_secs(mut self, secs: u64) -> Self {
        self.config.download_timeout_secs = secs;
        self
    }

    pub fn password(mut self, pwd: impl Into<String>) -> Self {
        self.config.password = Some(pwd.into());
        self
    }

    pub fn system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.config.system_prompt = Some(prompt.into());
        self
    }

    pub fn min_question_words(mut self, n: usize) -> Self {
        self.config.min_question_words = n;
        self
    }

    pub fn pages(mut self, selection: PageSelection) -> Self {
        self.config.pages = selection;
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<GenerationConfig, Pdf2CardsError> {
        let c = &self.config;
        if c.chunk_size == 0 {
            return Err(Pdf2CardsError::InvalidConfig(
                "chunk_size must be ≥ 1".into(),
            ));
        }
        if c.overlap >= c.chunk_size {
            return Err(Pdf2CardsError::InvalidConfig(format!(
                "overlap ({}) must be smaller than chunk_size ({}); the chunk window would never advance",
                c.overlap, c.chunk_size
            )));
        }
        if c.concurrency == 0 {
            return Err(Pdf2CardsError::InvalidConfig(
                "Concurrency must be ≥ 1".into(),
            ));
        }
        Ok(self.config)
    }
}

// ── Enums ────────────────────────────────────────────────────────────────

/// Specifies which pages of the PDF feed the chunker.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PageSelection {
    /// Use all pages (default).
    #[default]
    All,
    /// A single page (1-indexed).
    Single(usize),
    /// A contiguous range of pages (1-indexed, inclusive).
    Range(usize, usize),
    /// Specific pages (1-indexed, deduplicated).
    Set(Vec<usize>),
}

impl PageSelection {
    /// Expand the selection into a sorted, deduplicated list of 0-indexed page numbers.
    pub fn to_indices(&self, total_pages: usize) -> Vec<usize> {
        let mut indices: Vec<usize> = match self {
            PageSelection::All => (0..total_pages).collect(),
            PageSelection::Single(p) => {
                if *p >= 1 && *p <= total_pages {
                    vec![p - 1]
                } else {
                    vec![]
                }
            }
            PageSelection::Range(start, end) => {
                let s = (*start).max(1) - 1;
                let e = (*end).min(total_pages);
                (s..e).collect()
            }
            PageSelection::Set(pages) => pages
                .iter()
                .filter(|&&p| p >= 1 && p <= total_pages)
                .map(|p| p - 1)
                .collect(),
        };
        indices.sort_unstable();
        indices.dedup();
        indices
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let c = GenerationConfig::default();
        assert_eq!(c.num_cards, 5);
        assert_eq!((c.chunk_size, c.overlap), (3, 1));
        assert_eq!(c.min_question_words, 5);
        assert!((c.temperature - 0.5).abs() < f32::EPSILON);
    }

    #[test]
    fn rejects_non_advancing_window() {
        let err = GenerationConfig::builder()
            .chunk_size(2)
            .overlap(2)
            .build()
            .unwrap_err();
        assert!(matches!(err, Pdf2CardsError::InvalidConfig(_)));

        assert!(GenerationConfig::builder().chunk_size(0).overlap(0).build().is_err());
    }

    #[test]
    fn concurrency_is_at_least_one() {
        let c = GenerationConfig::builder().concurrency(0).build().unwrap();
        assert_eq!(c.concurrency, 1);
    }

    #[test]
    fn temperature_is_clamped() {
        let c = GenerationConfig::builder().temperature(9.0).build().unwrap();
        assert!((c.temperature - 2.0).abs() < f32::EPSILON);
    }

    #[test]
    fn page_selection_to_indices() {
        assert_eq!(PageSelection::All.to_indices(3), vec![0, 1, 2]);
        assert_eq!(PageSelection::Single(6).to_indices(5), Vec::<usize>::new());
        assert_eq!(PageSelection::Range(2, 9).to_indices(5), vec![1, 2, 3, 4]);
        assert_eq!(PageSelection::Set(vec![3, 1, 3]).to_indices(5), vec![0, 2]);
    }
}
