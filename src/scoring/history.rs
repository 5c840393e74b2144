use std::{collections::VecDeque, time::SystemTime};

use uuid::Uuid;

use crate::scoring::{game::GameStatePatch, lifecycle::ActionKind};

/// Number of actions kept undoable.
pub const HISTORY_CAPACITY: usize = 10;

/// Identifier of a recorded action.
pub type EntryId = Uuid;

/// An applied action together with the state needed to revert it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionHistoryEntry {
    /// Unique identifier, used to discard the entry on rollback.
    pub id: EntryId,
    /// What kind of action was applied.
    pub kind: ActionKind,
    /// Human readable summary shown to the operator.
    pub description: String,
    /// When the action was applied locally.
    pub timestamp: SystemTime,
    /// Values of the touched fields before the action.
    pub prior: GameStatePatch,
}

/// Bounded undo log. Pops are LIFO, evictions FIFO.
#[derive(Debug, Clone, Default)]
pub struct ActionHistory {
    entries: VecDeque<ActionHistoryEntry>,
}

impl ActionHistory {
    /// Create an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry, evicting the oldest once the log is full.
    ///
    /// Returns the new entry's id and the evicted entry, if any, so a rolled
    /// back action can hand it to [`ActionHistory::reinstate_oldest`].
    pub fn record(
        &mut self,
        kind: ActionKind,
        description: impl Into<String>,
        prior: GameStatePatch,
    ) -> (EntryId, Option<ActionHistoryEntry>) {
        let entry = ActionHistoryEntry {
            id: Uuid::new_v4(),
            kind,
            description: description.into(),
            timestamp: SystemTime::now(),
            prior,
        };
        let id = entry.id;
        let evicted = self.push(entry);
        (id, evicted)
    }

    /// Pop the most recent entry; `None` when there is nothing to undo.
    pub fn undo_last(&mut self) -> Option<ActionHistoryEntry> {
        self.entries.pop_back()
    }

    /// Remove the entry with `id`, wherever it sits.
    pub fn discard(&mut self, id: EntryId) -> Option<ActionHistoryEntry> {
        let position = self.entries.iter().position(|entry| entry.id == id)?;
        self.entries.remove(position)
    }

    /// Put a previously popped entry back on top of the log.
    pub fn restore(&mut self, entry: ActionHistoryEntry) {
        self.push(entry);
    }

    /// Put an evicted entry back as the oldest one. Ignored when the log is
    /// already full.
    pub fn reinstate_oldest(&mut self, entry: ActionHistoryEntry) {
        if self.entries.len() < HISTORY_CAPACITY {
            self.entries.push_front(entry);
        }
    }

    /// Number of undoable entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when undo has nothing to revert.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries from most recent to oldest.
    pub fn iter_recent(&self) -> impl Iterator<Item = &ActionHistoryEntry> {
        self.entries.iter().rev()
    }

    /// Drop every entry.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    fn push(&mut self, entry: ActionHistoryEntry) -> Option<ActionHistoryEntry> {
        let evicted = if self.entries.len() >= HISTORY_CAPACITY {
            self.entries.pop_front()
        } else {
            None
        };
        self.entries.push_back(entry);
        evicted
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outs_patch(outs: u8) -> GameStatePatch {
        GameStatePatch {
            outs: Some(outs),
            ..Default::default()
        }
    }

    #[test]
    fn undo_on_empty_log_is_a_no_op() {
        let mut history = ActionHistory::new();
        assert!(history.undo_last().is_none());
        assert!(history.is_empty());
    }

    #[test]
    fn pops_most_recent_first() {
        let mut history = ActionHistory::new();
        history.record(ActionKind::ChangeOuts, "first", outs_patch(0));
        history.record(ActionKind::ChangeOuts, "second", outs_patch(1));

        let entry = history.undo_last().unwrap();
        assert_eq!(entry.description, "second");
        assert_eq!(entry.prior, outs_patch(1));
        assert_eq!(history.undo_last().unwrap().description, "first");
        assert!(history.undo_last().is_none());
    }

    #[test]
    fn keeps_only_the_latest_ten() {
        let mut history = ActionHistory::new();
        for i in 0..12u8 {
            history.record(ActionKind::RecordRuns, format!("action {i}"), outs_patch(i));
        }
        assert_eq!(history.len(), HISTORY_CAPACITY);

        let popped: Vec<String> = std::iter::from_fn(|| history.undo_last())
            .map(|entry| entry.description)
            .collect();
        let expected: Vec<String> = (2..12).rev().map(|i| format!("action {i}")).collect();
        assert_eq!(popped, expected);
    }

    #[test]
    fn discard_removes_by_id() {
        let mut history = ActionHistory::new();
        let (keep, _) = history.record(ActionKind::ChangeOuts, "keep", outs_patch(0));
        let (drop, _) = history.record(ActionKind::ChangeOuts, "drop", outs_patch(1));

        let removed = history.discard(drop).unwrap();
        assert_eq!(removed.description, "drop");
        assert!(history.discard(drop).is_none());
        assert_eq!(history.len(), 1);
        assert_eq!(history.iter_recent().next().map(|e| e.id), Some(keep));
    }

    #[test]
    fn evicted_entry_can_be_reinstated() {
        let mut history = ActionHistory::new();
        for i in 0..10u8 {
            let (_, evicted) =
                history.record(ActionKind::ChangeOuts, format!("action {i}"), outs_patch(i));
            assert!(evicted.is_none());
        }
        let before: Vec<ActionHistoryEntry> = history.iter_recent().cloned().collect();

        let (id, evicted) = history.record(ActionKind::ChangeOuts, "overflow", outs_patch(3));
        let evicted = evicted.unwrap();
        assert_eq!(evicted.description, "action 0");

        history.discard(id);
        history.reinstate_oldest(evicted);
        let after: Vec<ActionHistoryEntry> = history.iter_recent().cloned().collect();
        assert_eq!(after, before);
    }

    #[test]
    fn restore_puts_entry_back_on_top() {
        let mut history = ActionHistory::new();
        history.record(ActionKind::ChangeOuts, "older", outs_patch(0));
        history.record(ActionKind::AdvanceInning, "newer", outs_patch(3));

        let popped = history.undo_last().unwrap();
        history.restore(popped.clone());
        assert_eq!(history.undo_last(), Some(popped));
    }
}
