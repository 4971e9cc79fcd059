//! Aggregation: concatenate per-chunk cards and cap at the requested total.
//!
//! Cards are taken in chunk order, then response order within a chunk.
//! Surplus beyond `requested` is discarded; a deficit is not backfilled and
//! shows up as [`crate::output::GenerationStats::shortfall`].

use crate::output::{ChunkResult, FlashcardRecord};

/// Build the final deck from chunk results.
///
/// `chunks` may arrive in any order; they are read by `chunk_num`.
pub fn aggregate(chunks: &[ChunkResult], requested: usize) -> Vec<FlashcardRecord> {
    let mut ordered: Vec<&ChunkResult> = chunks.iter().collect();
    ordered.sort_by_key(|c| c.chunk_num);
    ordered
        .into_iter()
        .flat_map(|c| c.cards.iter().cloned())
        .take(requested)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::CardOptions;

    fn card(tag: &str) -> FlashcardRecord {
        let options: CardOptions = [('A', "yes".to_string()), ('B', "no".to_string())]
            .into_iter()
            .collect();
        FlashcardRecord::new(format!("Is statement {tag} true or false?"), options, 'A', 5).unwrap()
    }

    fn chunk(num: usize, tags: &[&str]) -> ChunkResult {
        let mut r = ChunkResult::empty(num, 0, 1, tags.len());
        r.cards = tags.iter().map(|t| card(t)).collect();
        r
    }

    fn questions(cards: &[FlashcardRecord]) -> Vec<&str> {
        cards.iter().map(|c| c.question()).collect()
    }

    #[test]
    fn truncates_in_chunk_order() {
        let deck = aggregate(&[chunk(1, &["a1", "a2", "a3"]), chunk(2, &["b1", "b2"])], 4);
        assert_eq!(
            questions(&deck),
            vec![
                "Is statement a1 true or false?",
                "Is statement a2 true or false?",
                "Is statement a3 true or false?",
                "Is statement b1 true or false?",
            ]
        );
    }

    #[test]
    fn completion_order_does_not_matter() {
        let deck = aggregate(&[chunk(2, &["b1"]), chunk(1, &["a1"])], 5);
        assert_eq!(
            questions(&deck),
            vec!["Is statement a1 true or false?", "Is statement b1 true or false?"]
        );
    }

    #[test]
    fn shortfall_is_not_backfilled() {
        let deck = aggregate(&[chunk(1, &["a1"]), chunk(2, &[])], 3);
        assert_eq!(deck.len(), 1);
    }
}
