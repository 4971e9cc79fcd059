//! Pipeline stages for PDF-to-flashcard generation.
//!
//! Each submodule implements exactly one step, so each is testable alone and
//! the pure stages (`chunk`, `distribute`, `parse`, `aggregate`) can be used
//! without pdfium or a network.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ extract ──▶ chunk ──▶ distribute ──▶ llm ──▶ parse ──▶ aggregate
//! (URL/path) (pdfium)   (windows)  (targets)     (LLM)   (cards)   (deck)
//! ```
//!
//! 1. [`input`]      — canonicalise the user-supplied path or URL to a local file
//! 2. [`extract`]    — per-page text; runs in `spawn_blocking` because pdfium
//!    is not async-safe
//! 3. [`chunk`]      — overlapping page windows, blank windows dropped
//! 4. [`distribute`] — per-chunk card targets summing to the request
//! 5. [`llm`]        — one generator call per chunk with timeout and retry;
//!    the only stage with network I/O
//! 6. [`parse`]      — best-effort extraction of validated flashcards
//! 7. [`aggregate`]  — chunk-ordered concatenation capped at the request

pub mod aggregate;
pub mod chunk;
pub mod distribute;
pub mod extract;
pub mod input;
pub mod llm;
pub mod parse;
