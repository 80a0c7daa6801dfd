use crate::model::RoundState;

/// Highest score wins; equal scores go to the later round.
///
/// This is the reverse of the leaderboard read order, where the earliest row wins a tie.
pub fn select_best_round(rounds: &[RoundState]) -> Option<&RoundState> {
    rounds.iter().max_by(|a, b| {
        a.evaluation_score
            .total_cmp(&b.evaluation_score)
            .then(a.round_number.cmp(&b.round_number))
    })
}
