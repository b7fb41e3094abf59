//! Elo rating updates applied when a match completes.

use crate::config::RatingConfig;

/// Probability that a player rated `rating` beats one rated `opponent`.
pub fn expected_score(rating: i32, opponent: i32) -> f64 {
    1.0 / (1.0 + 10.0_f64.powf(f64::from(opponent - rating) / 400.0))
}

/// New ratings for a finished match, truncated toward zero.
///
/// Returns `(new_winner_rating, new_loser_rating)`.
pub fn rate(winner: i32, loser: i32, config: &RatingConfig) -> (i32, i32) {
    let expected_winner = expected_score(winner, loser);
    let expected_loser = 1.0 - expected_winner;

    let new_winner = f64::from(winner) + config.k_factor * (1.0 - expected_winner);
    let new_loser = f64::from(loser) + config.k_factor * (0.0 - expected_loser);

    (new_winner.trunc() as i32, new_loser.trunc() as i32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equal_ratings_move_by_half_k() {
        assert_eq!(rate(1000, 1000, &RatingConfig::default()), (1016, 984));
    }

    #[test]
    fn underdog_gains_more_and_results_truncate() {
        assert_eq!(rate(1000, 1100, &RatingConfig::default()), (1020, 1079));
    }

    #[test]
    fn favourite_gains_less() {
        let (winner, loser) = rate(1100, 1000, &RatingConfig::default());
        assert_eq!(winner, 1111);
        assert_eq!(loser, 988);
    }

    #[test]
    fn expected_scores_are_complementary() {
        let a = expected_score(1200, 1000);
        let b = expected_score(1000, 1200);
        assert!((a + b - 1.0).abs() < 1e-12);
        assert!(a > 0.75 && a < 0.77);
    }

    #[test]
    fn k_factor_is_configurable() {
        let config = RatingConfig {
            k_factor: 16.0,
            initial_rating: 1000,
        };
        assert_eq!(rate(1000, 1000, &config), (1008, 992));
    }
}
