//! # edgequake-pdf2cards
//!
//! Generate multiple-choice flashcards from PDF documents using LLMs.
//!
//! ## Pipeline Overview
//!
//! ```text
//! PDF
//!  │
//!  ├─ 1. Input       resolve local file or download from URL
//!  ├─ 2. Extract     per-page text via pdfium (spawn_blocking)
//!  ├─ 3. Chunk       overlapping windows of pages (default 3 pages, overlap 1)
//!  ├─ 4. Distribute  spread the requested card count over the chunks
//!  ├─ 5. Generate    one LLM call per chunk, with timeout + retry
//!  ├─ 6. Parse       Q:/Options:/Answer: blocks → validated FlashcardRecords
//!  └─ 7. Aggregate   chunk order, truncated to the requested count
//! ```
//!
//! The model's reply is treated as untrusted prose: malformed blocks are
//! dropped, and a run can return fewer cards than requested. That shortfall
//! is reported in [`GenerationStats`], never hidden.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use edgequake_pdf2cards::{generate, GenerationConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Provider auto-detected from OPENAI_API_KEY / ANTHROPIC_API_KEY / GEMINI_API_KEY
//!     let config = GenerationConfig::builder().num_cards(10).build()?;
//!     let output = generate("lecture.pdf", &config).await?;
//!     for card in &output.cards {
//!         println!("{card}\n");
//!     }
//!     eprintln!(
//!         "{} of {} cards",
//!         output.stats.produced_cards, output.stats.requested_cards
//!     );
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `pdf2cards` binary (clap + anyhow + tracing-subscriber + indicatif) |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod error;
pub mod generate;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod prompts;
pub mod quiz;
pub mod stream;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{GenerationConfig, GenerationConfigBuilder, PageSelection};
pub use error::{ChunkError, GeneratorError, Pdf2CardsError};
pub use generate::{
    generate, generate_from_bytes, generate_from_pages, generate_sync, generate_to_file, inspect,
    write_deck,
};
pub use output::{
    CardOptions, ChunkResult, DocumentMetadata, FlashcardRecord, GenerationOutput, GenerationStats,
};
pub use pipeline::aggregate::aggregate;
pub use pipeline::chunk::{Chunk, Chunker, PageText};
pub use pipeline::distribute::distribute;
pub use pipeline::llm::{CardGenerator, Completion, GenerationRequest, LlmCardGenerator};
pub use pipeline::parse::{extract_flashcards, FlashcardParser, ParseOutcome};
pub use progress::{GenerationProgressCallback, NoopProgressCallback, ProgressCallback};
pub use quiz::{Feedback, Grade, QuizError, QuizSession};
pub use stream::{generate_stream, generate_stream_from_pages, ChunkStream};
