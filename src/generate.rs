//! Eager (whole-document) generation entry points.
//!
//! These functions wait for every chunk, aggregate, and return one
//! [`GenerationOutput`]. Use [`crate::stream::generate_stream`] to receive
//! chunk results as they complete instead.

use crate::config::GenerationConfig;
use crate::error::Pdf2CardsError;
use crate::output::{ChunkResult, DocumentMetadata, GenerationOutput, GenerationStats};
use crate::pipeline::aggregate::aggregate;
use crate::pipeline::chunk::{Chunk, Chunker, PageText};
use crate::pipeline::distribute::distribute;
use crate::pipeline::llm::{self, CardGenerator, LlmCardGenerator};
use crate::pipeline::{extract, input};
use edgequake_llm::{LLMProvider, ProviderFactory};
use futures::stream::{self, StreamExt};
use serde::Serialize;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Generate flashcards from a PDF file or URL.
///
/// # Returns
/// `Ok(GenerationOutput)` even when fewer cards than requested were produced
/// (check [`GenerationOutput::is_shortfall`] or call
/// [`GenerationOutput::into_result`] for strict behaviour).
///
/// # Errors
/// Only fatal errors: unreadable input, invalid chunk window, no provider, or
/// no extractable text. Failed chunks, even all of them, only shorten the deck.
pub async fn generate(
    input_str: impl AsRef<str>,
    config: &GenerationConfig,
) -> Result<GenerationOutput, Pdf2CardsError> {
    let total_start = Instant::now();
    let input_str = input_str.as_ref();
    info!("Starting flashcard generation: {}", input_str);

    // ── Step 1: Resolve input ────────────────────────────────────────────
    let resolved = input::resolve_input(input_str, config.download_timeout_secs).await?;
    let pdf_path = resolved.path().to_path_buf();

    // ── Step 2: Get/create generator ─────────────────────────────────────
    let generator = resolve_generator(config)?;

    // ── Step 3: Metadata and page selection ──────────────────────────────
    let metadata = extract::extract_metadata(&pdf_path, config.password.as_deref()).await?;
    let page_indices = config.pages.to_indices(metadata.page_count);
    check_selection(&page_indices, metadata.page_count)?;
    info!(
        "PDF has {} pages, {} selected",
        metadata.page_count,
        page_indices.len()
    );

    // ── Step 4: Extract page text ────────────────────────────────────────
    let extract_start = Instant::now();
    let pages = extract::extract_pages(&pdf_path, config.password.as_deref(), &page_indices).await?;
    let extract_duration_ms = extract_start.elapsed().as_millis() as u64;

    // ── Step 5: Chunk, generate, aggregate ───────────────────────────────
    let chunks = chunk(&pages, config)?;
    let mut output = run(&generator, chunks, pages.len(), config, total_start).await?;
    output.metadata = Some(metadata);
    output.stats.extract_duration_ms = extract_duration_ms;
    Ok(output)
}

/// Generate flashcards from page texts already in memory.
///
/// Needs no pdfium; useful when the text comes from another extractor.
pub async fn generate_from_pages<P: PageText>(
    pages: &[P],
    config: &GenerationConfig,
) -> Result<GenerationOutput, Pdf2CardsError> {
    let total_start = Instant::now();
    let chunks = chunk(pages, config)?;
    let generator = resolve_generator(config)?;
    run(&generator, chunks, pages.len(), config, total_start).await
}

/// Generate flashcards from PDF bytes in memory.
///
/// The bytes go to a managed temp file that is removed on return.
pub async fn generate_from_bytes(
    bytes: &[u8],
    config: &GenerationConfig,
) -> Result<GenerationOutput, Pdf2CardsError> {
    let mut tmp = tempfile::NamedTempFile::new()
        .map_err(|e| Pdf2CardsError::Internal(format!("tempfile: {e}")))?;
    tmp.write_all(bytes)
        .map_err(|e| Pdf2CardsError::Internal(format!("tempfile write: {e}")))?;
    let path = tmp.path().to_string_lossy().to_string();
    generate(&path, config).await
}

/// Generate flashcards and write the deck to a file.
///
/// `.json` paths get the card list as JSON; anything else gets the
/// `Q:`/`Options:`/`Answer:` block format. Uses an atomic temp-file + rename.
pub async fn generate_to_file(
    input_str: impl AsRef<str>,
    output_path: impl AsRef<Path>,
    config: &GenerationConfig,
) -> Result<GenerationOutput, Pdf2CardsError> {
    let output = generate(input_str, config).await?;
    write_deck(&output, output_path.as_ref()).await?;
    Ok(output)
}

/// Write a deck file atomically; format chosen by extension.
pub async fn write_deck(output: &GenerationOutput, path: &Path) -> Result<(), Pdf2CardsError> {
    let write_err = |source: std::io::Error| Pdf2CardsError::OutputWriteFailed {
        path: path.to_path_buf(),
        source,
    };

    let is_json = path
        .extension()
        .is_some_and(|e| e.eq_ignore_ascii_case("json"));
    let body = if is_json {
        to_json(&output.cards)?
    } else {
        format!("{}\n", output.to_text())
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await.map_err(write_err)?;
    }

    let mut tmp_name = path.as_os_str().to_owned();
    tmp_name.push(".tmp");
    tokio::fs::write(&tmp_name, body).await.map_err(write_err)?;
    if let Err(e) = tokio::fs::rename(&tmp_name, path).await {
        let _ = tokio::fs::remove_file(&tmp_name).await;
        return Err(write_err(e));
    }
    Ok(())
}

fn to_json<T: Serialize>(value: &T) -> Result<String, Pdf2CardsError> {
    serde_json::to_string_pretty(value)
        .map_err(|e| Pdf2CardsError::Internal(format!("JSON serialisation failed: {e}")))
}

/// Synchronous wrapper around [`generate`].
///
/// Creates a temporary tokio runtime internally.
pub fn generate_sync(
    input_str: impl AsRef<str>,
    config: &GenerationConfig,
) -> Result<GenerationOutput, Pdf2CardsError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| Pdf2CardsError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(generate(input_str, config))
}

/// Read PDF metadata without generating anything. Needs no API key.
pub async fn inspect(input_str: impl AsRef<str>) -> Result<DocumentMetadata, Pdf2CardsError> {
    let resolved = input::resolve_input(input_str.as_ref(), 120).await?;
    extract::extract_metadata(resolved.path(), None).await
}

// ── Internal helpers ─────────────────────────────────────────────────────

/// A selection that misses every page of a non-empty document is an error.
/// An empty document passes through, so chunking reports `NoContent` (or an
/// empty deck when no cards were requested).
pub(crate) fn check_selection(indices: &[usize], page_count: usize) -> Result<(), Pdf2CardsError> {
    if indices.is_empty() && page_count > 0 {
        return Err(Pdf2CardsError::PageOutOfRange {
            page: 0,
            total: page_count,
        });
    }
    Ok(())
}

pub(crate) fn chunk<P: PageText>(
    pages: &[P],
    config: &GenerationConfig,
) -> Result<Vec<Chunk>, Pdf2CardsError> {
    let chunks = Chunker::new(config.chunk_size, config.overlap)?.chunk_pages(pages);
    debug!(
        "{} pages → {} chunks (size {}, overlap {})",
        pages.len(),
        chunks.len(),
        config.chunk_size,
        config.overlap
    );
    Ok(chunks)
}

/// Distribute, generate per chunk, aggregate.
async fn run(
    generator: &Arc<dyn CardGenerator>,
    chunks: Vec<Chunk>,
    total_pages: usize,
    config: &GenerationConfig,
    total_start: Instant,
) -> Result<GenerationOutput, Pdf2CardsError> {
    let requested = config.num_cards;
    let mut stats = GenerationStats {
        requested_cards: requested,
        total_pages,
        total_chunks: chunks.len(),
        ..Default::default()
    };

    if requested == 0 {
        info!("Zero cards requested; nothing to generate");
        stats.total_duration_ms = total_start.elapsed().as_millis() as u64;
        return Ok(GenerationOutput {
            cards: Vec::new(),
            chunks: Vec::new(),
            metadata: None,
            stats,
        });
    }

    let targets = distribute(requested, chunks.len())?;
    debug!("Card targets per chunk: {:?}", targets);

    if let Some(ref cb) = config.progress_callback {
        cb.on_generation_start(chunks.len());
    }

    let llm_start = Instant::now();
    let total = chunks.len();
    let mut results: Vec<ChunkResult> = stream::iter(chunks.iter().zip(targets))
        .map(|(chunk, target)| run_chunk(generator, chunk, target, total, config))
        .buffer_unordered(config.concurrency)
        .collect()
        .await;
    results.sort_by_key(|r| r.chunk_num);
    stats.llm_duration_ms = llm_start.elapsed().as_millis() as u64;

    let attempted = results.iter().filter(|r| r.target_cards > 0).count();
    if attempted > 0 && results.iter().filter(|r| r.error.is_some()).count() == attempted {
        warn!("All {} attempted chunks failed; the deck is empty", attempted);
    }

    let cards = aggregate(&results, requested);

    stats.produced_cards = cards.len();
    stats.failed_chunks = results.iter().filter(|r| r.error.is_some()).count();
    stats.skipped_blocks = results.iter().map(|r| r.blocks_skipped).sum();
    stats.total_input_tokens = results.iter().map(|r| r.input_tokens as u64).sum();
    stats.total_output_tokens = results.iter().map(|r| r.output_tokens as u64).sum();
    stats.total_duration_ms = total_start.elapsed().as_millis() as u64;

    if stats.shortfall() > 0 {
        warn!(
            "Produced {} of {} requested flashcards ({} blocks skipped, {} chunks failed)",
            stats.produced_cards, requested, stats.skipped_blocks, stats.failed_chunks
        );
    }
    info!(
        "Generation complete: {}/{} cards from {} chunks, {}ms total",
        stats.produced_cards, requested, stats.total_chunks, stats.total_duration_ms
    );

    if let Some(ref cb) = config.progress_callback {
        cb.on_generation_complete(stats.produced_cards, requested);
    }

    Ok(GenerationOutput {
        cards,
        chunks: results,
        metadata: None,
        stats,
    })
}

/// Run one chunk with progress events. Chunks with a zero target are not
/// sent to the generator.
pub(crate) async fn run_chunk(
    generator: &Arc<dyn CardGenerator>,
    chunk: &Chunk,
    target: usize,
    total_chunks: usize,
    config: &GenerationConfig,
) -> ChunkResult {
    let chunk_num = chunk.index + 1;
    if target == 0 {
        debug!("Chunk {}: no cards assigned, skipping", chunk_num);
        return ChunkResult::empty(chunk_num, chunk.start_page, chunk.end_page, 0);
    }

    if let Some(ref cb) = config.progress_callback {
        cb.on_chunk_start(chunk_num, total_chunks);
    }
    let result = llm::process_chunk(generator, chunk, target, config).await;
    if let Some(ref cb) = config.progress_callback {
        match &result.error {
            None => cb.on_chunk_complete(chunk_num, total_chunks, result.cards.len()),
            Some(e) => cb.on_chunk_error(chunk_num, total_chunks, &e.to_string()),
        }
    }
    result
}

/// Resolve the card generator, from most-specific to least-specific:
///
/// 1. `config.generator`, used as-is
/// 2. `config.provider`, wrapped in an [`LlmCardGenerator`]
/// 3. `config.provider_name` + `config.model`
/// 4. `EDGEQUAKE_LLM_PROVIDER` + `EDGEQUAKE_MODEL`, when both are set
/// 5. OpenAI when `OPENAI_API_KEY` is set
/// 6. `ProviderFactory::from_env()` auto-detection
pub(crate) fn resolve_generator(
    config: &GenerationConfig,
) -> Result<Arc<dyn CardGenerator>, Pdf2CardsError> {
    if let Some(ref generator) = config.generator {
        return Ok(Arc::clone(generator));
    }
    let provider = resolve_provider(config)?;
    Ok(Arc::new(LlmCardGenerator::new(provider, config)))
}

fn resolve_provider(config: &GenerationConfig) -> Result<Arc<dyn LLMProvider>, Pdf2CardsError> {
    if let Some(ref provider) = config.provider {
        return Ok(Arc::clone(provider));
    }

    if let Some(ref name) = config.provider_name {
        let model = config.model.as_deref().unwrap_or("gpt-4.1-nano");
        return create_provider(name, model);
    }

    if let (Ok(prov), Ok(model)) = (
        std::env::var("EDGEQUAKE_LLM_PROVIDER"),
        std::env::var("EDGEQUAKE_MODEL"),
    ) {
        if !prov.is_empty() && !model.is_empty() {
            return create_provider(&prov, &model);
        }
    }

    if std::env::var("OPENAI_API_KEY").is_ok_and(|k| !k.is_empty()) {
        let model = config.model.as_deref().unwrap_or("gpt-4.1-nano");
        return create_provider("openai", model);
    }

    let (llm_provider, _embedding) =
        ProviderFactory::from_env().map_err(|e| Pdf2CardsError::ProviderNotConfigured {
            provider: "auto".to_string(),
            hint: format!(
                "No LLM provider could be auto-detected from environment.\n\
                Set OPENAI_API_KEY, ANTHROPIC_API_KEY, or configure a provider.\n\
                Error: {}",
                e
            ),
        })?;

    Ok(llm_provider)
}

fn create_provider(provider_name: &str, model: &str) -> Result<Arc<dyn LLMProvider>, Pdf2CardsError> {
    ProviderFactory::create_llm_provider(provider_name, model).map_err(|e| {
        Pdf2CardsError::ProviderNotConfigured {
            provider: provider_name.to_string(),
            hint: format!("{e}"),
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_passes_page_selection() {
        assert!(check_selection(&[], 0).is_ok());
        assert!(check_selection(&[0, 1], 2).is_ok());
        assert!(matches!(
            check_selection(&[], 4),
            Err(Pdf2CardsError::PageOutOfRange { page: 0, total: 4 })
        ));
    }

    #[tokio::test]
    async fn failed_rename_leaves_no_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        // A non-empty directory at the target path makes the rename fail.
        let target = dir.path().join("deck.txt");
        std::fs::create_dir(&target).unwrap();
        std::fs::write(target.join("keep"), "x").unwrap();

        let output = GenerationOutput {
            cards: Vec::new(),
            chunks: Vec::new(),
            metadata: None,
            stats: GenerationStats::default(),
        };
        let err = write_deck(&output, &target).await.unwrap_err();

        assert!(matches!(err, Pdf2CardsError::OutputWriteFailed { .. }));
        assert!(!dir.path().join("deck.txt.tmp").exists());
        assert!(target.join("keep").exists());
    }
}
