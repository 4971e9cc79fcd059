//! Output types: validated flashcards, per-chunk results, and run statistics.
//!
//! A [`FlashcardRecord`] can only be obtained through [`FlashcardRecord::new`]
//! (or deserialisation, which goes through the same structural checks), so
//! every record a caller sees satisfies the card invariants. There is no
//! partially filled record anywhere in the crate.

use crate::error::{ChunkError, Pdf2CardsError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Minimum number of whitespace-separated tokens a question must have.
pub const DEFAULT_MIN_QUESTION_WORDS: usize = 5;

/// Option letters a card may use, in display order.
pub const OPTION_LETTERS: [char; 4] = ['A', 'B', 'C', 'D'];

/// Option letter → option text.
pub type CardOptions = BTreeMap<char, String>;

/// A validated multiple-choice flashcard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawRecord")]
pub struct FlashcardRecord {
    question: String,
    options: CardOptions,
    answer: char,
}

/// Unvalidated wire shape used only for deserialisation.
#[derive(Deserialize)]
struct RawRecord {
    question: String,
    options: CardOptions,
    answer: char,
}

impl TryFrom<RawRecord> for FlashcardRecord {
    type Error = String;

    /// Structural checks only; the question-length filter is the extractor's.
    fn try_from(raw: RawRecord) -> Result<Self, Self::Error> {
        FlashcardRecord::new(raw.question, raw.options, raw.answer, 0)
            .ok_or_else(|| "flashcard violates question/options/answer invariants".to_string())
    }
}

impl FlashcardRecord {
    /// Build a record, or `None` if any invariant fails:
    ///
    /// * the trimmed question has at least `min_question_words` tokens
    /// * there is at least one option and every key is one of `A`–`D`
    /// * `answer` is one of the option keys
    pub fn new(
        question: impl Into<String>,
        options: CardOptions,
        answer: char,
        min_question_words: usize,
    ) -> Option<Self> {
        let question = question.into().trim().to_string();
        if question.is_empty() || question.split_whitespace().count() < min_question_words {
            return None;
        }
        if options.is_empty() || options.keys().any(|k| !OPTION_LETTERS.contains(k)) {
            return None;
        }
        if !options.contains_key(&answer) {
            return None;
        }
        Some(Self {
            question,
            options,
            answer,
        })
    }

    pub fn question(&self) -> &str {
        &self.question
    }

    pub fn options(&self) -> &CardOptions {
        &self.options
    }

    pub fn answer(&self) -> char {
        self.answer
    }

    /// Text of the correct option.
    pub fn answer_text(&self) -> &str {
        // `new` guarantees the key exists.
        self.options.get(&self.answer).map(String::as_str).unwrap_or("")
    }

    pub fn is_correct(&self, letter: char) -> bool {
        letter.to_ascii_uppercase() == self.answer
    }
}

/// Prints the card in the same block format the extractor reads.
impl fmt::Display for FlashcardRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Q: {}", self.question)?;
        writeln!(f, "Options:")?;
        for (letter, text) in &self.options {
            writeln!(f, "{letter}. {text}")?;
        }
        write!(f, "Answer: {}", self.answer)
    }
}

/// Result of generating cards from one chunk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkResult {
    /// 1-indexed chunk number, in document order.
    pub chunk_num: usize,
    /// 0-indexed offset of the chunk's first page within the selected pages.
    pub start_page: usize,
    /// Exclusive end offset of the chunk within the selected pages.
    pub end_page: usize,
    /// Number of cards the distributor assigned to this chunk.
    pub target_cards: usize,
    /// Cards accepted by the extractor, in response order.
    pub cards: Vec<FlashcardRecord>,
    /// Candidate blocks found in the response.
    pub blocks_found: usize,
    /// Candidate blocks dropped as malformed.
    pub blocks_skipped: usize,
    pub input_tokens: usize,
    pub output_tokens: usize,
    pub duration_ms: u64,
    pub retries: u32,
    /// Set when the generator failed; `cards` is then empty.
    pub error: Option<ChunkError>,
}

impl ChunkResult {
    pub(crate) fn empty(chunk_num: usize, start_page: usize, end_page: usize, target: usize) -> Self {
        Self {
            chunk_num,
            start_page,
            end_page,
            target_cards: target,
            cards: Vec::new(),
            blocks_found: 0,
            blocks_skipped: 0,
            input_tokens: 0,
            output_tokens: 0,
            duration_ms: 0,
            retries: 0,
            error: None,
        }
    }
}

/// Metadata read from the PDF document information dictionary.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DocumentMetadata {
    pub title: Option<String>,
    pub author: Option<String>,
    pub subject: Option<String>,
    pub creator: Option<String>,
    pub producer: Option<String>,
    pub page_count: usize,
    pub pdf_version: String,
}

/// Run-level counters.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GenerationStats {
    pub requested_cards: usize,
    pub produced_cards: usize,
    /// Pages that went into chunking (after page selection).
    pub total_pages: usize,
    pub total_chunks: usize,
    pub failed_chunks: usize,
    pub skipped_blocks: usize,
    pub total_input_tokens: u64,
    pub total_output_tokens: u64,
    pub total_duration_ms: u64,
    pub extract_duration_ms: u64,
    pub llm_duration_ms: u64,
}

impl GenerationStats {
    /// How many requested cards are missing from the deck.
    pub fn shortfall(&self) -> usize {
        self.requested_cards.saturating_sub(self.produced_cards)
    }
}

/// Everything a generation run produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationOutput {
    /// Final deck: chunk order, truncated to the requested count.
    pub cards: Vec<FlashcardRecord>,
    /// Per-chunk detail, sorted by `chunk_num`.
    pub chunks: Vec<ChunkResult>,
    /// `None` when generating from in-memory page text.
    pub metadata: Option<DocumentMetadata>,
    pub stats: GenerationStats,
}

impl GenerationOutput {
    pub fn is_shortfall(&self) -> bool {
        self.stats.shortfall() > 0
    }

    /// Treat a short deck as an error.
    pub fn into_result(self) -> Result<Self, Pdf2CardsError> {
        if self.is_shortfall() {
            return Err(Pdf2CardsError::Shortfall {
                produced: self.stats.produced_cards,
                requested: self.stats.requested_cards,
            });
        }
        Ok(self)
    }

    /// The deck in block format, one blank line between cards.
    pub fn to_text(&self) -> String {
        self.cards
            .iter()
            .map(|c| c.to_string())
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn opts(pairs: &[(char, &str)]) -> CardOptions {
        pairs.iter().map(|(k, v)| (*k, v.to_string())).collect()
    }

    #[test]
    fn rejects_short_question() {
        let card = FlashcardRecord::new("Capital?", opts(&[('A', "Paris")]), 'A', 5);
        assert!(card.is_none());
    }

    #[test]
    fn rejects_answer_outside_options() {
        let card = FlashcardRecord::new(
            "Which of these is a prime number?",
            opts(&[('A', "4"), ('B', "6")]),
            'C',
            5,
        );
        assert!(card.is_none());
    }

    #[test]
    fn rejects_unknown_letter() {
        let card = FlashcardRecord::new(
            "Which of these is a prime number?",
            opts(&[('A', "4"), ('E', "7")]),
            'A',
            5,
        );
        assert!(card.is_none());
    }

    #[test]
    fn display_uses_block_format() {
        let card = FlashcardRecord::new(
            "  What is the capital of France? ",
            opts(&[('A', "Paris"), ('B', "Berlin")]),
            'A',
            5,
        )
        .unwrap();
        assert_eq!(
            card.to_string(),
            "Q: What is the capital of France?\nOptions:\nA. Paris\nB. Berlin\nAnswer: A"
        );
        assert_eq!(card.answer_text(), "Paris");
        assert!(card.is_correct('a'));
        assert!(!card.is_correct('B'));
    }

    #[test]
    fn deserialisation_validates() {
        let ok = r#"{"question":"What is the capital of France?","options":{"A":"Paris"},"answer":"A"}"#;
        let card: FlashcardRecord = serde_json::from_str(ok).unwrap();
        assert_eq!(card.answer(), 'A');

        let no_answer = r#"{"question":"Capital of France?","options":{"A":"Paris"},"answer":"B"}"#;
        assert!(serde_json::from_str::<FlashcardRecord>(no_answer).is_err());

        let blank = r#"{"question":"  ","options":{"A":"Paris"},"answer":"A"}"#;
        assert!(serde_json::from_str::<FlashcardRecord>(blank).is_err());

        let bad_letter = r#"{"question":"Capital of France?","options":{"E":"Paris"},"answer":"E"}"#;
        assert!(serde_json::from_str::<FlashcardRecord>(bad_letter).is_err());
    }

    #[test]
    fn short_question_survives_json_round_trip() {
        let card = FlashcardRecord::new("Capital of France?", opts(&[('A', "Paris")]), 'A', 2)
            .expect("valid with a two-word minimum");
        let json = serde_json::to_string(&card).unwrap();
        let back: FlashcardRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back, card);
    }

    #[test]
    fn into_result_reports_shortfall() {
        let output = GenerationOutput {
            cards: vec![],
            chunks: vec![],
            metadata: None,
            stats: GenerationStats {
                requested_cards: 4,
                produced_cards: 1,
                ..Default::default()
            },
        };
        assert_eq!(output.stats.shortfall(), 3);
        match output.into_result() {
            Err(Pdf2CardsError::Shortfall { produced, requested }) => {
                assert_eq!((produced, requested), (1, 4));
            }
            other => panic!("expected shortfall, got {other:?}"),
        }
    }
}
