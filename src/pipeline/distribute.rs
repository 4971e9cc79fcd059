//! Spread the requested card count over the chunks.
//!
//! Every chunk gets `total / chunks`; the first `total % chunks` chunks get
//! one more. Earlier chunks therefore win ties. The bias is deterministic and
//! part of the contract: the same request always maps to the same targets.

use crate::error::Pdf2CardsError;

/// Per-chunk card targets, in chunk order.
///
/// The result has `chunks` entries that sum to `total` and differ by at
/// most one. Zero chunks is [`Pdf2CardsError::NoContent`].
pub fn distribute(total: usize, chunks: usize) -> Result<Vec<usize>, Pdf2CardsError> {
    if chunks == 0 {
        return Err(Pdf2CardsError::NoContent { requested: total });
    }
    let base = total / chunks;
    let remainder = total % chunks;
    Ok((0..chunks)
        .map(|i| if i < remainder { base + 1 } else { base })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remainder_goes_to_earlier_chunks() {
        assert_eq!(distribute(5, 3).unwrap(), vec![2, 2, 1]);
        assert_eq!(distribute(2, 4).unwrap(), vec![1, 1, 0, 0]);
        assert_eq!(distribute(6, 3).unwrap(), vec![2, 2, 2]);
    }

    #[test]
    fn zero_chunks_is_no_content() {
        assert!(matches!(
            distribute(5, 0),
            Err(Pdf2CardsError::NoContent { requested: 5 })
        ));
    }

    #[test]
    fn sums_exactly_and_stays_even() {
        for total in 0..40 {
            for chunks in 1..12 {
                let d = distribute(total, chunks).unwrap();
                assert_eq!(d.len(), chunks);
                assert_eq!(d.iter().sum::<usize>(), total);
                let min = d.iter().min().unwrap();
                let max = d.iter().max().unwrap();
                assert!(max - min <= 1, "total={total} chunks={chunks}: {d:?}");
            }
        }
    }
}
