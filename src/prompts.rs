//! Prompts for LLM-based flashcard generation.
//!
//! The block format described in [`DEFAULT_SYSTEM_PROMPT`] is exactly what
//! [`crate::pipeline::parse`] understands. Change one, change the other.
//!
//! Callers can override the system prompt via
//! [`crate::config::GenerationConfig::system_prompt`]; the per-chunk request
//! built by [`chunk_request`] is always used.

/// Default system prompt describing the task and the required output format.
pub const DEFAULT_SYSTEM_PROMPT: &str = r#"You are a helpful assistant that writes high-quality educational flashcards in multiple-choice format.

Follow these rules precisely:

1. CONTENT
   - Each question must be clear, useful, educational, and relevant to the text
   - Do not ask about irrelevant or trivial details
   - Each question must be fully self-contained: never refer to "the article",
     "the text", "the blog" or any other object the reader cannot see

2. STRUCTURE
   Each flashcard has:
   - a clear, educational question
   - 3 to 4 realistic answer options
   - exactly one correct answer

3. OUTPUT FORMAT
   Use this format exactly, one flashcard after another:

Q: [Question]
Options:
A. option 1
B. option 2
C. option 3
D. option 4 (if applicable)
Answer: [Correct letter]

   - Only return flashcards
   - Do NOT add commentary, numbering, or markdown"#;

/// Build the user message for one chunk.
pub fn chunk_request(count: usize, text: &str) -> String {
    let noun = if count == 1 { "flashcard" } else { "flashcards" };
    format!("Generate {count} {noun} based on the following text.\n\nText:\n{text}")
}
