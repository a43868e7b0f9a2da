use serde::{Deserialize, Serialize};

/// One of the two parties at the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, derive_more::Display)]
pub enum Actor {
    #[display("human")]
    Human,
    #[display("computer")]
    Computer,
}

impl Actor {
    /// The party that moves after this one.
    pub fn other(self) -> Self {
        match self {
            Actor::Human => Actor::Computer,
            Actor::Computer => Actor::Human,
        }
    }
}

/// A single applied move. Never changed once it is in the history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveRecord {
    pub actor: Actor,
    pub amount: u32,
}

/// Outcome of a finished game from the human player's perspective.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameOutcome {
    Win,
    Loss,
}

impl GameOutcome {
    pub fn for_winner(winner: Actor) -> Self {
        match winner {
            Actor::Human => GameOutcome::Win,
            Actor::Computer => GameOutcome::Loss,
        }
    }
}

/// Result of an applied move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveResult {
    /// Bricks remain; `next` is to move.
    Continue { next: Actor },
    /// The pile is empty and the mover took the last brick.
    GameOver { winner: Actor },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn other_alternates() {
        assert_eq!(Actor::Human.other(), Actor::Computer);
        assert_eq!(Actor::Computer.other(), Actor::Human);
    }

    #[test]
    fn outcome_is_from_human_side() {
        assert_eq!(GameOutcome::for_winner(Actor::Human), GameOutcome::Win);
        assert_eq!(GameOutcome::for_winner(Actor::Computer), GameOutcome::Loss);
    }
}
