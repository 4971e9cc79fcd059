//! Flashcard extraction from free-form generator output.
//!
//! The generator is asked for blocks like
//!
//! ```text
//! Q: What is the capital of France?
//! Options:
//! A. Paris
//! B. Berlin
//! Answer: A
//! ```
//!
//! but it is a language model, so anything may come back. Extraction is
//! best-effort and never fails: the response is split on the `Q:` marker,
//! each block is parsed into `Option<FlashcardRecord>`, and `None` blocks are
//! skipped. Accepted records keep response order.
//!
//! Per block:
//! 1. question: everything before the first `\nOptions:` line, trimmed
//! 2. options: every `X. text` line fragment with `X` in `A`–`D`; a repeated
//!    letter replaces the earlier entry
//! 3. answer: the first `A`–`D` after `Answer:`
//!
//! All three must be present, and the resulting record must pass
//! [`FlashcardRecord::new`] (question length, answer among the options).

use crate::output::{CardOptions, FlashcardRecord, DEFAULT_MIN_QUESTION_WORDS};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

static RE_QUESTION_MARKER: Lazy<Regex> = Lazy::new(|| Regex::new(r"Q:\s*").unwrap());

static RE_QUESTION: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)^(.*?)\nOptions:").unwrap());

static RE_OPTION: Lazy<Regex> = Lazy::new(|| Regex::new(r"([A-D])\.\s*(.+)").unwrap());

static RE_ANSWER: Lazy<Regex> = Lazy::new(|| Regex::new(r"Answer:\s*([A-D])").unwrap());

static RE_OUTER_FENCES: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)^```[a-zA-Z]*\n(.*)\n```\s*$").unwrap());

/// Records accepted from one response plus block counts.
#[derive(Debug, Clone, Default)]
pub struct ParseOutcome {
    pub cards: Vec<FlashcardRecord>,
    /// Segments that followed a `Q:` marker.
    pub blocks_found: usize,
    /// Segments that did not yield a record.
    pub blocks_skipped: usize,
}

/// Parser for the `Q:` / `Options:` / `Answer:` block format.
#[derive(Debug, Clone, Copy)]
pub struct FlashcardParser {
    min_question_words: usize,
}

impl Default for FlashcardParser {
    fn default() -> Self {
        Self::new(DEFAULT_MIN_QUESTION_WORDS)
    }
}

impl FlashcardParser {
    pub fn new(min_question_words: usize) -> Self {
        Self { min_question_words }
    }

    /// Parse every block of a raw response.
    pub fn parse(&self, raw: &str) -> ParseOutcome {
        let cleaned = clean_response(raw);
        let mut outcome = ParseOutcome::default();

        // The segment before the first marker is preamble.
        for (i, block) in RE_QUESTION_MARKER.split(&cleaned).skip(1).enumerate() {
            outcome.blocks_found += 1;
            match self.parse_block(block) {
                Some(card) => outcome.cards.push(card),
                None => {
                    outcome.blocks_skipped += 1;
                    debug!("Skipping malformed flashcard block {}", i + 1);
                }
            }
        }
        outcome
    }

    /// Parse the text following one `Q:` marker.
    pub fn parse_block(&self, block: &str) -> Option<FlashcardRecord> {
        let question = RE_QUESTION.captures(block)?.get(1)?.as_str();

        let mut options = CardOptions::new();
        for caps in RE_OPTION.captures_iter(block) {
            let letter = caps[1].chars().next()?;
            options.insert(letter, caps[2].trim().to_string());
        }
        if options.is_empty() {
            return None;
        }

        let answer = RE_ANSWER.captures(block)?[1].chars().next()?;

        FlashcardRecord::new(question, options, answer, self.min_question_words)
    }
}

/// Extract flashcards with the default question-length filter.
pub fn extract_flashcards(raw: &str) -> Vec<FlashcardRecord> {
    FlashcardParser::default().parse(raw).cards
}

/// Normalise transport quirks before splitting: CRLF line endings, an outer
/// code fence, and invisible Unicode the models like to emit.
fn clean_response(raw: &str) -> String {
    let s = raw.replace("\r\n", "\n").replace('\r', "\n");
    let s = match RE_OUTER_FENCES.captures(s.trim()) {
        Some(caps) => caps[1].to_string(),
        None => s,
    };
    s.replace(['\u{200B}', '\u{FEFF}', '\u{200C}', '\u{200D}', '\u{2060}'], "")
}
