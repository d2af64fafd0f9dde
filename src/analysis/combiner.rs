use crate::models::snapshot::EditionRanks;

/// Reduces a country's two edition positions to one comparable rank: the
/// mean when both chart, the charting one otherwise.
pub fn combine_ranks(standard: Option<u32>, deluxe: Option<u32>) -> Option<f64> {
    match (standard, deluxe) {
        (Some(standard), Some(deluxe)) => Some((f64::from(standard) + f64::from(deluxe)) / 2.0),
        (Some(rank), None) | (None, Some(rank)) => Some(f64::from(rank)),
        (None, None) => None,
    }
}

pub fn combined_rank(ranks: &EditionRanks) -> Option<f64> {
    combine_ranks(ranks.standard, ranks.deluxe)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn both_editions_average_without_rounding() {
        assert_eq!(combine_ranks(Some(3), Some(4)), Some(3.5));
        assert_eq!(combine_ranks(Some(4), Some(6)), Some(5.0));
    }

    #[test]
    fn combination_is_symmetric() {
        for a in 1..=25 {
            for b in 1..=25 {
                assert_eq!(combine_ranks(Some(a), Some(b)), combine_ranks(Some(b), Some(a)));
                assert_eq!(
                    combine_ranks(Some(a), Some(b)),
                    Some((f64::from(a) + f64::from(b)) / 2.0)
                );
            }
        }
    }

    #[test]
    fn single_edition_passes_through() {
        assert_eq!(combine_ranks(Some(7), None), Some(7.0));
        assert_eq!(combine_ranks(None, Some(12)), Some(12.0));
    }

    #[test]
    fn no_edition_means_no_rank() {
        assert_eq!(combine_ranks(None, None), None);
        assert_eq!(combined_rank(&EditionRanks::new(Some(0), None)), None);
    }
}
