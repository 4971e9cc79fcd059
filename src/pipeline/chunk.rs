//! Chunking: overlapping windows of whole pages.
//!
//! A window of `chunk_size` pages starts at offset 0 and advances by
//! `chunk_size - overlap` until it passes the last page. The last windows are
//! clipped at the end of the sequence, so with an overlap the tail pages can
//! appear in more than one chunk. Each window's page texts are joined with
//! `\n`; a window that is blank after trimming is dropped.
//!
//! ```text
//! pages:   0 1 2 3 4      chunk_size = 3, overlap = 1, step = 2
//! chunk 1: 0 1 2
//! chunk 2:     2 3 4
//! chunk 3:         4
//! ```

use crate::error::Pdf2CardsError;
use serde::{Deserialize, Serialize};

/// Anything that can supply the text of one page.
///
/// `None` means the page has no extractable text (scanned image, extraction
/// failure); such pages contribute an empty string to their chunk.
pub trait PageText {
    fn extract_text(&self) -> Option<String>;
}

impl PageText for String {
    fn extract_text(&self) -> Option<String> {
        Some(self.clone())
    }
}

impl PageText for &str {
    fn extract_text(&self) -> Option<String> {
        Some((*self).to_string())
    }
}

impl PageText for Option<String> {
    fn extract_text(&self) -> Option<String> {
        self.clone()
    }
}

/// One window of concatenated page text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    /// 0-indexed position among the emitted (non-blank) chunks.
    pub index: usize,
    /// Offset of the first page in the input sequence.
    pub start_page: usize,
    /// Exclusive end offset, clipped to the sequence length.
    pub end_page: usize,
    pub text: String,
}

/// Splits a page sequence into overlapping chunks.
#[derive(Debug, Clone, Copy)]
pub struct Chunker {
    chunk_size: usize,
    overlap: usize,
}

impl Chunker {
    /// Fails when the window would not advance (`overlap >= chunk_size`).
    pub fn new(chunk_size: usize, overlap: usize) -> Result<Self, Pdf2CardsError> {
        if chunk_size == 0 || overlap >= chunk_size {
            return Err(Pdf2CardsError::InvalidConfig(format!(
                "chunk window does not advance: chunk_size={chunk_size}, overlap={overlap}"
            )));
        }
        Ok(Self {
            chunk_size,
            overlap,
        })
    }

    /// Pages the window moves forward between chunks; always ≥ 1.
    pub fn step(&self) -> usize {
        self.chunk_size - self.overlap
    }

    pub fn chunk_pages<P: PageText>(&self, pages: &[P]) -> Vec<Chunk> {
        let mut chunks = Vec::new();
        for start in (0..pages.len()).step_by(self.step()) {
            let end = (start + self.chunk_size).min(pages.len());
            let text = pages[start..end]
                .iter()
                .map(|p| p.extract_text().unwrap_or_default())
                .collect::<Vec<_>>()
                .join("\n");
            if text.trim().is_empty() {
                continue;
            }
            chunks.push(Chunk {
                index: chunks.len(),
                start_page: start,
                end_page: end,
                text,
            });
        }
        chunks
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pages(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("page {i}")).collect()
    }

    #[test]
    fn rejects_non_advancing_window() {
        assert!(Chunker::new(2, 2).is_err());
        assert!(Chunker::new(2, 3).is_err());
        assert!(Chunker::new(0, 0).is_err());
        assert!(Chunker::new(1, 0).is_ok());
    }

    #[test]
    fn overlapping_windows_clip_at_end() {
        let chunks = Chunker::new(3, 1).unwrap().chunk_pages(&pages(5));
        let spans: Vec<_> = chunks.iter().map(|c| (c.start_page, c.end_page)).collect();
        assert_eq!(spans, vec![(0, 3), (2, 5), (4, 5)]);
        assert_eq!(chunks[0].text, "page 0\npage 1\npage 2");
        assert_eq!(chunks[2].text, "page 4");
    }

    #[test]
    fn windows_advance_and_cover_every_page() {
        for chunk_size in 1..6 {
            for overlap in 0..chunk_size {
                for n in 0..12 {
                    let chunks = Chunker::new(chunk_size, overlap).unwrap().chunk_pages(&pages(n));
                    let mut covered = vec![false; n];
                    let mut last_start = None;
                    for c in &chunks {
                        if let Some(prev) = last_start {
                            assert!(c.start_page > prev);
                        }
                        last_start = Some(c.start_page);
                        covered[c.start_page..c.end_page].iter_mut().for_each(|p| *p = true);
                    }
                    assert!(covered.iter().all(|&p| p), "size={chunk_size} overlap={overlap} n={n}");
                }
            }
        }
    }

    #[test]
    fn failed_pages_contribute_empty_text() {
        let input = vec![Some("alpha".to_string()), None, Some("gamma".to_string())];
        let chunks = Chunker::new(3, 0).unwrap().chunk_pages(&input);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].text, "alpha\n\ngamma");
    }

    #[test]
    fn blank_chunks_are_dropped_and_indices_stay_dense() {
        let input = vec!["  ", "\n", "text", "", ""];
        let chunks = Chunker::new(2, 0).unwrap().chunk_pages(&input);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].index, 0);
        assert_eq!(chunks[0].start_page, 2);
    }

    #[test]
    fn empty_document_has_no_chunks() {
        let chunks = Chunker::new(3, 1).unwrap().chunk_pages::<String>(&[]);
        assert!(chunks.is_empty());
    }
}
