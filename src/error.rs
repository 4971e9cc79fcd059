//! Error types for the edgequake-pdf2cards library.
//!
//! Three error types reflect three distinct failure modes:
//!
//! * [`Pdf2CardsError`] — **Fatal**: generation cannot proceed at all
//!   (bad input file, invalid chunk window, provider not configured, nothing
//!   to generate from). Returned as `Err(Pdf2CardsError)` from the top-level
//!   `generate*` functions.
//!
//! * [`ChunkError`] — **Non-fatal**: a single chunk's generator call failed
//!   after all retries. Stored inside [`crate::output::ChunkResult`]; that
//!   chunk simply contributes no cards.
//!
//! * [`GeneratorError`] — one failed call to a [`crate::pipeline::llm::CardGenerator`].
//!   The retry loop turns the last of these into a [`ChunkError`].
//!
//! Malformed flashcard blocks are not errors at all: the extractor returns
//! `None` for them and they only show up as a shortfall in the final count.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the edgequake-pdf2cards library.
#[derive(Debug, Error)]
pub enum Pdf2CardsError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("PDF file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The input string is not a valid file path or URL.
    #[error("Invalid input '{input}': not a file path or a valid HTTP/HTTPS URL")]
    InvalidInput { input: String },

    /// HTTP URL was syntactically valid but download failed.
    #[error("Failed to download '{url}': {reason}\nCheck your internet connection.")]
    DownloadFailed { url: String, reason: String },

    /// Download exceeded the configured timeout.
    #[error("Download timed out after {secs}s for '{url}'\nIncrease --download-timeout.")]
    DownloadTimeout { url: String, secs: u64 },

    /// The file exists and was read, but is not a PDF.
    #[error("File is not a valid PDF: '{path}'\nFirst bytes: {magic:?}")]
    NotAPdf { path: PathBuf, magic: [u8; 4] },

    // ── PDF errors ────────────────────────────────────────────────────────
    /// PDF header/trailer/xref is corrupt and cannot be parsed.
    #[error("PDF '{path}' is corrupt: {detail}")]
    CorruptPdf { path: PathBuf, detail: String },

    /// PDF requires a password but none was provided.
    #[error("PDF '{path}' is encrypted and requires a password.\nProvide it with --password <PASSWORD>.")]
    PasswordRequired { path: PathBuf },

    /// A password was provided but it is wrong.
    #[error("Wrong password for PDF '{path}'")]
    WrongPassword { path: PathBuf },

    /// The page selection matched no page of the document.
    #[error("Page {page} is out of range (document has {total} pages)")]
    PageOutOfRange { page: usize, total: usize },

    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\
Install pdfium system-wide or set PDFIUM_LIB_PATH=/path/to/libpdfium."
    )]
    PdfiumBindingFailed(String),

    // ── Generation errors ─────────────────────────────────────────────────
    /// The configured provider is not initialised (missing API key etc.).
    #[error("LLM provider '{provider}' is not configured.\n{hint}")]
    ProviderNotConfigured { provider: String, hint: String },

    /// The document produced no non-blank chunk but cards were requested.
    #[error("No content to generate from: the document has no extractable text ({requested} cards requested)")]
    NoContent { requested: usize },

    /// Fewer cards were produced than requested.
    ///
    /// Returned by [`crate::output::GenerationOutput::into_result`] when the
    /// caller wants to treat a short deck as an error.
    #[error("Produced {produced} of {requested} requested flashcards")]
    Shortfall { produced: usize, requested: usize },

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create or write the output deck file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder or chunker validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A non-fatal error for a single chunk.
///
/// The chunk's contribution to the deck is empty; every other chunk proceeds.
#[derive(Debug, Clone, Error, serde::Serialize, serde::Deserialize)]
pub enum ChunkError {
    /// Generator call failed after retries.
    #[error("Chunk {chunk}: generation failed after {retries} retries: {detail}")]
    GenerationFailed {
        chunk: usize,
        retries: u32,
        detail: String,
    },

    /// Every attempt timed out.
    #[error("Chunk {chunk}: generator call timed out after {secs}s")]
    Timeout { chunk: usize, secs: u64 },
}

/// A single failed generator call.
#[derive(Debug, Clone, Error)]
pub enum GeneratorError {
    /// The backing service returned an error.
    #[error("generator API error: {0}")]
    Api(String),

    /// The call did not finish within the configured timeout.
    #[error("generator call timed out after {secs}s")]
    Timeout { secs: u64 },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_content_display() {
        let e = Pdf2CardsError::NoContent { requested: 5 };
        let msg = e.to_string();
        assert!(msg.contains("No content to generate from"), "got: {msg}");
        assert!(msg.contains('5'));
    }

    #[test]
    fn shortfall_display() {
        let e = Pdf2CardsError::Shortfall {
            produced: 3,
            requested: 5,
        };
        assert!(e.to_string().contains("3 of 5"));
    }

    #[test]
    fn chunk_timeout_display() {
        let e = ChunkError::Timeout { chunk: 2, secs: 60 };
        assert!(e.to_string().contains("Chunk 2"));
        assert!(e.to_string().contains("60s"));
    }

    #[test]
    fn chunk_error_serialises() {
        let e = ChunkError::GenerationFailed {
            chunk: 1,
            retries: 3,
            detail: "503".into(),
        };
        let json = serde_json::to_string(&e).unwrap();
        assert!(json.contains("GenerationFailed"));
        let back: ChunkError = serde_json::from_str(&json).unwrap();
        assert!(back.to_string().contains("503"));
    }
}
