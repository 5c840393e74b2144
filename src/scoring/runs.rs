//! Run bookkeeping for the per-inning line score and the aggregates.

use crate::scoring::{
    ScoringError,
    game::{GameState, InningHalf, Side},
};

/// Credit `runs` to the team batting in `half` during the current inning.
///
/// Zero is accepted and still materialises the inning cell, so "no runs this
/// half" shows up in the line score. There is no upper bound.
pub fn apply_runs(state: &GameState, runs: i32, half: InningHalf) -> Result<GameState, ScoringError> {
    let runs = u32::try_from(runs).map_err(|_| ScoringError::OutOfRangeValue {
        field: "runs",
        value: i64::from(runs),
    })?;

    let mut next = state.clone();
    let index = next.current_inning.saturating_sub(1) as usize;
    let (total, cells) = match half.batting_team() {
        Side::Home => (&mut next.home_score, &mut next.home_inning_scores),
        Side::Away => (&mut next.away_score, &mut next.away_inning_scores),
    };

    if cells.len() <= index {
        cells.resize(index + 1, 0);
    }
    cells[index] = cells[index].saturating_add(runs);
    *total = total.saturating_add(runs);

    Ok(next)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::game::GameStatus;

    fn live() -> GameState {
        GameState {
            status: GameStatus::InProgress,
            ..Default::default()
        }
    }

    fn assert_totals_match(state: &GameState) {
        assert_eq!(state.home_score, state.home_inning_scores.iter().sum::<u32>());
        assert_eq!(state.away_score, state.away_inning_scores.iter().sum::<u32>());
    }

    #[test]
    fn top_half_credits_away_team() {
        let next = apply_runs(&live(), 3, InningHalf::Top).unwrap();
        assert_eq!(next.away_score, 3);
        assert_eq!(next.away_inning_scores, vec![3]);
        assert_eq!(next.home_score, 0);
        assert!(next.home_inning_scores.is_empty());
    }

    #[test]
    fn bottom_half_credits_home_team() {
        let next = apply_runs(&live(), 1, InningHalf::Bottom).unwrap();
        assert_eq!(next.home_score, 1);
        assert_eq!(next.home_inning_scores, vec![1]);
        assert_eq!(next.away_score, 0);
    }

    #[test]
    fn zero_extends_missing_innings() {
        let mut state = live();
        state.current_inning = 4;
        let next = apply_runs(&state, 2, InningHalf::Top).unwrap();
        assert_eq!(next.away_inning_scores, vec![0, 0, 0, 2]);
        assert_eq!(next.away_score, 2);
    }

    #[test]
    fn zero_runs_still_records_the_cell() {
        let mut state = live();
        state.current_inning = 2;
        let next = apply_runs(&state, 0, InningHalf::Bottom).unwrap();
        assert_eq!(next.home_inning_scores, vec![0, 0]);
        assert_eq!(next.home_score, 0);
    }

    #[test]
    fn accumulates_within_the_same_inning() {
        let first = apply_runs(&live(), 2, InningHalf::Top).unwrap();
        let second = apply_runs(&first, 3, InningHalf::Top).unwrap();
        assert_eq!(second.away_inning_scores, vec![5]);
        assert_eq!(second.away_score, 5);
    }

    #[test]
    fn large_values_are_not_capped() {
        let next = apply_runs(&live(), 150, InningHalf::Top).unwrap();
        assert_eq!(next.away_score, 150);
    }

    #[test]
    fn negative_runs_are_rejected_without_change() {
        let state = live();
        let err = apply_runs(&state, -1, InningHalf::Top).unwrap_err();
        assert!(matches!(
            err,
            ScoringError::OutOfRangeValue {
                field: "runs",
                value: -1
            }
        ));
    }

    #[test]
    fn totals_track_inning_sums_over_a_sequence() {
        let mut state = live();
        let script = [
            (1, InningHalf::Top, 2),
            (1, InningHalf::Bottom, 0),
            (2, InningHalf::Top, 1),
            (3, InningHalf::Bottom, 4),
            (3, InningHalf::Bottom, 1),
            (7, InningHalf::Top, 0),
            (9, InningHalf::Bottom, 6),
        ];

        for (inning, half, runs) in script {
            state.current_inning = inning;
            state = apply_runs(&state, runs, half).unwrap();
            assert_totals_match(&state);
        }

        assert_eq!(state.away_score, 3);
        assert_eq!(state.home_score, 11);
    }
}
