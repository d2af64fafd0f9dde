use crate::models::ranking::CountryRankEntry;
use std::collections::HashMap;

/// Weight of a country with no configured market weight.
pub const DEFAULT_MARKET_WEIGHT: f64 = 1.0;

/// Market-weighted mean combined rank of the charting entries.
pub fn weighted_average_rank<'a, I>(entries: I, weights: &HashMap<String, f64>) -> Option<f64>
where
    I: IntoIterator<Item = &'a CountryRankEntry>,
{
    let (total, total_weight) = entries
        .into_iter()
        .filter_map(|entry| {
            let rank = entry.combined_rank?;
            let weight = weights
                .get(&entry.country)
                .copied()
                .unwrap_or(DEFAULT_MARKET_WEIGHT);
            Some((rank, weight))
        })
        .fold((0.0, 0.0), |(total, total_weight), (rank, weight)| {
            (total + rank * weight, total_weight + weight)
        });

    (total_weight > f64::EPSILON).then(|| total / total_weight)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ranking::Trend;

    fn entry(country: &str, combined_rank: Option<f64>) -> CountryRankEntry {
        CountryRankEntry {
            country: country.to_string(),
            standard_rank: None,
            deluxe_rank: None,
            combined_rank,
            previous_combined_rank: None,
            trend: Trend::unknown(),
            standard_trend: Trend::unknown(),
            deluxe_trend: Trend::unknown(),
        }
    }

    #[test]
    fn heavier_markets_pull_the_average() {
        let entries = vec![entry("US", Some(2.0)), entry("NL", Some(12.0))];
        let weights = HashMap::from([("US".to_string(), 4.0)]);

        assert_eq!(weighted_average_rank(&entries, &weights), Some(4.0));
    }

    #[test]
    fn without_weights_it_is_the_plain_mean() {
        let entries = vec![entry("US", Some(2.0)), entry("NL", Some(5.0)), entry("CN", None)];
        assert_eq!(weighted_average_rank(&entries, &HashMap::new()), Some(3.5));
    }

    #[test]
    fn zero_total_weight_has_no_average() {
        let entries = vec![entry("US", Some(2.0))];
        let weights = HashMap::from([("US".to_string(), 0.0)]);

        assert_eq!(weighted_average_rank(&entries, &weights), None);
        assert_eq!(weighted_average_rank(&[], &weights), None);
    }
}
