use std::{fmt, time::SystemTime};

use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;
use utoipa::ToSchema;

/// Which side of an inning is being played.
///
/// The top half always has the away team batting and the bottom half the home
/// team.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum InningHalf {
    /// Away team at bat.
    #[default]
    Top,
    /// Home team at bat.
    Bottom,
}

impl InningHalf {
    /// Team batting during this half.
    pub fn batting_team(self) -> Side {
        match self {
            InningHalf::Top => Side::Away,
            InningHalf::Bottom => Side::Home,
        }
    }
}

impl fmt::Display for InningHalf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InningHalf::Top => f.write_str("top"),
            InningHalf::Bottom => f.write_str("bottom"),
        }
    }
}

/// One of the two teams of a game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    /// Home team.
    Home,
    /// Visiting team.
    Away,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Home => f.write_str("home"),
            Side::Away => f.write_str("away"),
        }
    }
}

/// Lifecycle status of a game row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum GameStatus {
    /// Game is on the schedule but has not begun.
    #[default]
    Scheduled,
    /// Teams are warming up.
    Warmup,
    /// Game is live and accepts scoring.
    InProgress,
    /// Game was stopped before completion.
    Suspended,
    /// Game is over; terminal.
    Final,
}

/// Working copy of a game's scoreboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameState {
    /// Aggregate home runs, equal to the sum of `home_inning_scores`.
    pub home_score: u32,
    /// Aggregate away runs, equal to the sum of `away_inning_scores`.
    pub away_score: u32,
    /// 1-based inning number.
    pub current_inning: u32,
    /// Half of the current inning.
    pub current_inning_half: InningHalf,
    /// Outs recorded in the current half, 0 to 3.
    pub outs: u8,
    /// Runs scored by the home team, one cell per inning.
    pub home_inning_scores: Vec<u32>,
    /// Runs scored by the away team, one cell per inning.
    pub away_inning_scores: Vec<u32>,
    /// Lifecycle status.
    pub status: GameStatus,
    /// When the game was started.
    #[serde(default)]
    pub started_at: Option<SystemTime>,
    /// When the game was ended.
    #[serde(default)]
    pub ended_at: Option<SystemTime>,
}

impl Default for GameState {
    fn default() -> Self {
        Self {
            home_score: 0,
            away_score: 0,
            current_inning: 1,
            current_inning_half: InningHalf::Top,
            outs: 0,
            home_inning_scores: Vec::new(),
            away_inning_scores: Vec::new(),
            status: GameStatus::Scheduled,
            started_at: None,
            ended_at: None,
        }
    }
}

impl GameState {
    /// Aggregate score of `side`.
    pub fn score(&self, side: Side) -> u32 {
        match side {
            Side::Home => self.home_score,
            Side::Away => self.away_score,
        }
    }

    /// Per-inning runs of `side`.
    pub fn inning_scores(&self, side: Side) -> &[u32] {
        match side {
            Side::Home => &self.home_inning_scores,
            Side::Away => &self.away_inning_scores,
        }
    }

    /// Overwrite every field present in `patch`.
    pub fn apply_patch(&mut self, patch: &GameStatePatch) {
        if let Some(value) = patch.home_score {
            self.home_score = value;
        }
        if let Some(value) = patch.away_score {
            self.away_score = value;
        }
        if let Some(value) = patch.current_inning {
            self.current_inning = value;
        }
        if let Some(value) = patch.current_inning_half {
            self.current_inning_half = value;
        }
        if let Some(value) = patch.outs {
            self.outs = value;
        }
        if let Some(value) = &patch.home_inning_scores {
            self.home_inning_scores = value.clone();
        }
        if let Some(value) = &patch.away_inning_scores {
            self.away_inning_scores = value.clone();
        }
        if let Some(value) = patch.status {
            self.status = value;
        }
        if let Some(value) = patch.started_at {
            self.started_at = value;
        }
        if let Some(value) = patch.ended_at {
            self.ended_at = value;
        }
    }
}

/// Names of the [`GameState`] fields a patch can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatchField {
    /// [`GameState::home_score`].
    HomeScore,
    /// [`GameState::away_score`].
    AwayScore,
    /// [`GameState::current_inning`].
    CurrentInning,
    /// [`GameState::current_inning_half`].
    CurrentInningHalf,
    /// [`GameState::outs`].
    Outs,
    /// [`GameState::home_inning_scores`].
    HomeInningScores,
    /// [`GameState::away_inning_scores`].
    AwayInningScores,
    /// [`GameState::status`].
    Status,
    /// [`GameState::started_at`].
    StartedAt,
    /// [`GameState::ended_at`].
    EndedAt,
}

/// Partial [`GameState`].
///
/// Used both as the delta sent to the store and as the prior fragment kept in
/// the undo log. Absent fields are untouched; the nullable timestamps use a
/// double option so that clearing them is expressible.
#[skip_serializing_none]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameStatePatch {
    /// New home aggregate.
    pub home_score: Option<u32>,
    /// New away aggregate.
    pub away_score: Option<u32>,
    /// New inning number.
    pub current_inning: Option<u32>,
    /// New inning half.
    pub current_inning_half: Option<InningHalf>,
    /// New out count.
    pub outs: Option<u8>,
    /// New home per-inning runs.
    pub home_inning_scores: Option<Vec<u32>>,
    /// New away per-inning runs.
    pub away_inning_scores: Option<Vec<u32>>,
    /// New lifecycle status.
    pub status: Option<GameStatus>,
    /// New start timestamp (`Some(None)` clears it).
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "::serde_with::rust::double_option"
    )]
    pub started_at: Option<Option<SystemTime>>,
    /// New end timestamp (`Some(None)` clears it).
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "::serde_with::rust::double_option"
    )]
    pub ended_at: Option<Option<SystemTime>>,
}

impl GameStatePatch {
    /// Copy the listed fields out of `state`.
    pub fn select(state: &GameState, fields: &[PatchField]) -> Self {
        let mut patch = Self::default();
        for field in fields {
            match field {
                PatchField::HomeScore => patch.home_score = Some(state.home_score),
                PatchField::AwayScore => patch.away_score = Some(state.away_score),
                PatchField::CurrentInning => patch.current_inning = Some(state.current_inning),
                PatchField::CurrentInningHalf => {
                    patch.current_inning_half = Some(state.current_inning_half)
                }
                PatchField::Outs => patch.outs = Some(state.outs),
                PatchField::HomeInningScores => {
                    patch.home_inning_scores = Some(state.home_inning_scores.clone())
                }
                PatchField::AwayInningScores => {
                    patch.away_inning_scores = Some(state.away_inning_scores.clone())
                }
                PatchField::Status => patch.status = Some(state.status),
                PatchField::StartedAt => patch.started_at = Some(state.started_at),
                PatchField::EndedAt => patch.ended_at = Some(state.ended_at),
            }
        }
        patch
    }

    /// Fields carried by this patch.
    pub fn fields(&self) -> Vec<PatchField> {
        let mut fields = Vec::new();
        if self.home_score.is_some() {
            fields.push(PatchField::HomeScore);
        }
        if self.away_score.is_some() {
            fields.push(PatchField::AwayScore);
        }
        if self.current_inning.is_some() {
            fields.push(PatchField::CurrentInning);
        }
        if self.current_inning_half.is_some() {
            fields.push(PatchField::CurrentInningHalf);
        }
        if self.outs.is_some() {
            fields.push(PatchField::Outs);
        }
        if self.home_inning_scores.is_some() {
            fields.push(PatchField::HomeInningScores);
        }
        if self.away_inning_scores.is_some() {
            fields.push(PatchField::AwayInningScores);
        }
        if self.status.is_some() {
            fields.push(PatchField::Status);
        }
        if self.started_at.is_some() {
            fields.push(PatchField::StartedAt);
        }
        if self.ended_at.is_some() {
            fields.push(PatchField::EndedAt);
        }
        fields
    }

    /// True when no field is present.
    pub fn is_empty(&self) -> bool {
        self.fields().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_state() -> GameState {
        GameState {
            home_score: 2,
            away_score: 5,
            current_inning: 3,
            current_inning_half: InningHalf::Bottom,
            outs: 1,
            home_inning_scores: vec![0, 2],
            away_inning_scores: vec![1, 4, 0],
            status: GameStatus::InProgress,
            started_at: Some(SystemTime::UNIX_EPOCH),
            ended_at: None,
        }
    }

    #[test]
    fn select_then_apply_restores_selected_fields() {
        let original = sample_state();
        let prior = GameStatePatch::select(
            &original,
            &[PatchField::Outs, PatchField::CurrentInningHalf],
        );

        let mut changed = original.clone();
        changed.outs = 3;
        changed.current_inning_half = InningHalf::Top;
        changed.home_score = 9;

        changed.apply_patch(&prior);
        assert_eq!(changed.outs, 1);
        assert_eq!(changed.current_inning_half, InningHalf::Bottom);
        assert_eq!(changed.home_score, 9);
    }

    #[test]
    fn fields_lists_present_entries() {
        let patch = GameStatePatch::select(
            &sample_state(),
            &[PatchField::Status, PatchField::EndedAt],
        );
        assert_eq!(patch.fields(), vec![PatchField::Status, PatchField::EndedAt]);
        assert!(GameStatePatch::default().is_empty());
    }

    #[test]
    fn cleared_timestamp_survives_json() {
        let patch = GameStatePatch {
            ended_at: Some(None),
            ..Default::default()
        };
        let json = serde_json::to_value(&patch).unwrap();
        assert_eq!(json, serde_json::json!({ "ended_at": null }));

        let decoded: GameStatePatch = serde_json::from_value(json).unwrap();
        assert_eq!(decoded.ended_at, Some(None));
        assert_eq!(decoded.started_at, None);
    }

    #[test]
    fn half_maps_to_batting_team() {
        assert_eq!(InningHalf::Top.batting_team(), Side::Away);
        assert_eq!(InningHalf::Bottom.batting_team(), Side::Home);
    }
}
