//! Streaming generation API: emit chunk results as they complete.
//!
//! Large documents mean many generator calls. [`generate_stream`] yields each
//! [`ChunkResult`] as soon as its call finishes, so callers can show cards
//! early or drive their own progress UI. Results arrive in completion order;
//! pass the collected results to [`crate::pipeline::aggregate::aggregate`] to
//! get the chunk-ordered, truncated deck.

use crate::config::GenerationConfig;
use crate::error::Pdf2CardsError;
use crate::generate::{check_selection, chunk, resolve_generator, run_chunk};
use crate::output::ChunkResult;
use crate::pipeline::chunk::PageText;
use crate::pipeline::distribute::distribute;
use crate::pipeline::{extract, input};
use futures::stream::{self, StreamExt};
use std::pin::Pin;
use std::sync::Arc;
use tokio_stream::Stream;
use tracing::info;

/// A boxed stream of chunk results.
pub type ChunkStream = Pin<Box<dyn Stream<Item = ChunkResult> + Send>>;

/// Generate flashcards from a PDF, streaming chunk results as they are ready.
///
/// Fatal errors (bad input, invalid window, no content) are returned before
/// the stream starts. Failed chunks are items with `error` set.
pub async fn generate_stream(
    input_str: impl AsRef<str>,
    config: &GenerationConfig,
) -> Result<ChunkStream, Pdf2CardsError> {
    let input_str = input_str.as_ref();
    info!("Starting streaming generation: {}", input_str);

    let resolved = input::resolve_input(input_str, config.download_timeout_secs).await?;
    let pdf_path = resolved.path().to_path_buf();

    let metadata = extract::extract_metadata(&pdf_path, config.password.as_deref()).await?;
    let page_indices = config.pages.to_indices(metadata.page_count);
    check_selection(&page_indices, metadata.page_count)?;

    // Text is fully extracted before returning, so the downloaded file may be
    // dropped with `resolved`.
    let pages = extract::extract_pages(&pdf_path, config.password.as_deref(), &page_indices).await?;
    generate_stream_from_pages(&pages, config)
}

/// Streaming counterpart of [`crate::generate::generate_from_pages`].
pub fn generate_stream_from_pages<P: PageText>(
    pages: &[P],
    config: &GenerationConfig,
) -> Result<ChunkStream, Pdf2CardsError> {
    let chunks = chunk(pages, config)?;
    if config.num_cards == 0 {
        return Ok(Box::pin(stream::empty()));
    }
    let targets = distribute(config.num_cards, chunks.len())?;
    let generator = resolve_generator(config)?;

    let total = chunks.len();
    if let Some(ref cb) = config.progress_callback {
        cb.on_generation_start(total);
    }

    let concurrency = config.concurrency;
    let config = config.clone();
    let s = stream::iter(chunks.into_iter().zip(targets))
        .map(move |(chunk, target)| {
            let generator = Arc::clone(&generator);
            let cfg = config.clone();
            async move { run_chunk(&generator, &chunk, target, total, &cfg).await }
        })
        .buffer_unordered(concurrency);

    Ok(Box::pin(s))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GeneratorError;
    use crate::pipeline::aggregate::aggregate;
    use crate::pipeline::llm::{CardGenerator, Completion, GenerationRequest};
    use async_trait::async_trait;

    struct OnePerChunk;

    #[async_trait]
    impl CardGenerator for OnePerChunk {
        async fn generate(&self, req: &GenerationRequest<'_>) -> Result<Completion, GeneratorError> {
            Ok(Completion {
                content: format!(
                    "Q: Which number identifies chunk {} here?\nOptions:\nA. {}\nB. 0\nAnswer: A",
                    req.chunk_num, req.chunk_num
                ),
                ..Default::default()
            })
        }
    }

    #[tokio::test]
    async fn stream_yields_every_chunk() {
        let config = GenerationConfig::builder()
            .num_cards(3)
            .chunk_size(1)
            .overlap(0)
            .generator(Arc::new(OnePerChunk))
            .build()
            .unwrap();
        let pages = vec!["one", "two", "three"];

        let results: Vec<ChunkResult> = generate_stream_from_pages(&pages, &config)
            .unwrap()
            .collect()
            .await;
        assert_eq!(results.len(), 3);

        let deck = aggregate(&results, config.num_cards);
        let answers: Vec<_> = deck.iter().map(|c| c.answer_text().to_string()).collect();
        assert_eq!(answers, vec!["1", "2", "3"]);
    }

    #[test]
    fn empty_document_fails_before_streaming() {
        let config = GenerationConfig::builder()
            .generator(Arc::new(OnePerChunk))
            .build()
            .unwrap();
        let pages: Vec<String> = vec![" ".into()];
        assert!(matches!(
            generate_stream_from_pages(&pages, &config).err(),
            Some(Pdf2CardsError::NoContent { .. })
        ));
    }
}
