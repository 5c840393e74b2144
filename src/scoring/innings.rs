//! Out counting and half-inning advancement.

use tracing::trace;

use crate::scoring::{ScoringError, game::InningHalf};

/// Outs that end a half-inning.
pub const MAX_OUTS: u8 = 3;

/// Result of changing the out count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutsChange {
    /// New out count.
    pub outs: u8,
    /// Set when the half-inning is complete and the operator should be
    /// prompted to advance.
    pub ready_to_advance: bool,
}

/// Position reached after advancing a half-inning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HalfInningAdvance {
    /// Inning number after the advance.
    pub inning: u32,
    /// Half after the advance.
    pub half: InningHalf,
    /// Always zero: outs never carry over into the next half.
    pub outs: u8,
}

/// Move the out counter to `target`.
///
/// Any value in `0..=3` is accepted from any current count: filling the next
/// out, jumping ahead, or dropping back to correct a mis-tap (which drops the
/// outs above the new value). Reaching three never advances the inning.
pub fn set_outs(current: u8, target: i32) -> Result<OutsChange, ScoringError> {
    let outs = u8::try_from(target)
        .ok()
        .filter(|outs| *outs <= MAX_OUTS)
        .ok_or(ScoringError::OutOfRangeValue {
            field: "outs",
            value: i64::from(target),
        })?;

    if outs == current {
        trace!(outs, "out count unchanged");
    }

    Ok(OutsChange {
        outs,
        ready_to_advance: outs == MAX_OUTS,
    })
}

/// Next half-inning after `(inning, half)`, with the outs reset.
pub fn advance_half_inning(inning: u32, half: InningHalf) -> HalfInningAdvance {
    let (inning, half) = match half {
        InningHalf::Top => (inning, InningHalf::Bottom),
        InningHalf::Bottom => (inning.saturating_add(1), InningHalf::Top),
    };

    HalfInningAdvance {
        inning,
        half,
        outs: 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn increments_one_out_at_a_time() {
        assert_eq!(
            set_outs(0, 1).unwrap(),
            OutsChange {
                outs: 1,
                ready_to_advance: false
            }
        );
        assert_eq!(set_outs(1, 2).unwrap().outs, 2);
    }

    #[test]
    fn third_out_signals_ready_to_advance() {
        let change = set_outs(2, 3).unwrap();
        assert_eq!(change.outs, 3);
        assert!(change.ready_to_advance);

        // Jumping straight to three from an empty count is a valid correction.
        assert!(set_outs(0, 3).unwrap().ready_to_advance);
    }

    #[test]
    fn lowering_corrects_a_mis_tap() {
        let change = set_outs(3, 1).unwrap();
        assert_eq!(change.outs, 1);
        assert!(!change.ready_to_advance);
        assert_eq!(set_outs(2, 0).unwrap().outs, 0);
    }

    #[test]
    fn out_of_range_targets_are_rejected() {
        for target in [-1, 4, 100, i32::MIN, i32::MAX] {
            match set_outs(1, target) {
                Err(ScoringError::OutOfRangeValue { field, value }) => {
                    assert_eq!(field, "outs");
                    assert_eq!(value, i64::from(target));
                }
                other => panic!("expected out of range for {target}, got {other:?}"),
            }
        }
    }

    #[test]
    fn never_leaves_the_valid_range() {
        for current in 0..=MAX_OUTS {
            for target in -5..10 {
                if let Ok(change) = set_outs(current, target) {
                    assert!(change.outs <= MAX_OUTS);
                }
            }
        }
    }

    #[test]
    fn top_advances_to_bottom_of_same_inning() {
        assert_eq!(
            advance_half_inning(3, InningHalf::Top),
            HalfInningAdvance {
                inning: 3,
                half: InningHalf::Bottom,
                outs: 0
            }
        );
    }

    #[test]
    fn bottom_advances_to_top_of_next_inning() {
        assert_eq!(
            advance_half_inning(3, InningHalf::Bottom),
            HalfInningAdvance {
                inning: 4,
                half: InningHalf::Top,
                outs: 0
            }
        );
    }

    #[test]
    fn inning_number_saturates() {
        assert_eq!(advance_half_inning(u32::MAX, InningHalf::Bottom).inning, u32::MAX);
    }
}
