//! Kill-count missions and the global win latch.
//!
//! A mission tracks how many enemies of one kind remain to be killed.
//! Every enemy death reports through [`MissionBoard::record_kill`]; when
//! every mission reaches zero the win condition latches true and stays
//! true.

use serde::{Deserialize, Serialize};

use crate::components::ai::EnemyKind;
use crate::entity::EntityId;

/// Emitted when an entity with health dies; consumed by the mission
/// observer and by VFX/audio dispatch.
#[derive(Debug, Clone)]
pub struct DeathEvent {
    pub entity: EntityId,
    pub tag: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Mission {
    pub kind: EnemyKind,
    pub remaining: i32,
    pub total: i32,
}

impl Mission {
    pub fn new(kind: EnemyKind, count: i32) -> Self {
        Self {
            kind,
            remaining: count,
            total: count,
        }
    }

    pub fn completed(&self) -> bool {
        self.remaining <= 0
    }
}

/// The flat mission list plus the win latch.
#[derive(Debug, Clone, Default)]
pub struct MissionBoard {
    missions: Vec<Mission>,
    win: bool,
}

impl MissionBoard {
    pub fn add(&mut self, kind: EnemyKind, count: i32) {
        self.missions.push(Mission::new(kind, count));
    }

    pub fn missions(&self) -> &[Mission] {
        &self.missions
    }

    pub fn is_empty(&self) -> bool {
        self.missions.is_empty()
    }

    pub fn clear(&mut self) {
        self.missions.clear();
        self.win = false;
    }

    /// Decrement the first matching incomplete mission. Latches the win
    /// condition when the last mission completes; returns true exactly on
    /// that kill.
    pub fn record_kill(&mut self, kind: EnemyKind) -> bool {
        if self.win {
            return false;
        }
        if let Some(mission) = self
            .missions
            .iter_mut()
            .find(|m| m.kind == kind && !m.completed())
        {
            mission.remaining -= 1;
        }
        if !self.missions.is_empty() && self.missions.iter().all(Mission::completed) {
            self.win = true;
            return true;
        }
        false
    }

    /// True once all missions have completed; never resets on its own.
    pub fn is_win(&self) -> bool {
        self.win
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn win_latches_on_last_kill_only() {
        let mut board = MissionBoard::default();
        board.add(EnemyKind::Heavy, 2);
        assert!(!board.record_kill(EnemyKind::Heavy));
        assert!(!board.is_win());
        assert!(board.record_kill(EnemyKind::Heavy));
        assert!(board.is_win());
        // Further kills change nothing.
        assert!(!board.record_kill(EnemyKind::Heavy));
        assert!(board.is_win());
    }

    #[test]
    fn unrelated_kills_do_not_decrement() {
        let mut board = MissionBoard::default();
        board.add(EnemyKind::Heavy, 1);
        board.record_kill(EnemyKind::Light);
        assert_eq!(board.missions()[0].remaining, 1);
        assert!(!board.is_win());
    }

    #[test]
    fn multiple_missions_must_all_complete() {
        let mut board = MissionBoard::default();
        board.add(EnemyKind::Light, 1);
        board.add(EnemyKind::Bomb, 1);
        board.record_kill(EnemyKind::Light);
        assert!(!board.is_win());
        board.record_kill(EnemyKind::Bomb);
        assert!(board.is_win());
    }

    #[test]
    fn empty_board_never_wins() {
        let mut board = MissionBoard::default();
        assert!(!board.record_kill(EnemyKind::Light));
        assert!(!board.is_win());
    }
}
