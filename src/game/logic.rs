use rand::Rng;
use tracing::debug;

use super::config::{ConfigError, GameConfig};
use super::types::{Actor, MoveRecord, MoveResult};

/// Central game state holding everything needed for one round.
///
/// The only way to change it is [`GameState::apply_move`]; a rejected move
/// leaves every field as it was.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameState {
    config: GameConfig,
    pile: u32,
    turn: Actor,
    active: bool,
    history: Vec<MoveRecord>,
}

impl GameState {
    /// Start a round with a pile drawn from the thread-local generator.
    pub fn new_game(config: GameConfig) -> Result<Self, ConfigError> {
        Self::new_game_with_rng(config, &mut rand::thread_rng())
    }

    /// Start a round, drawing the pile uniformly from `min_pile..=max_pile`.
    pub fn new_game_with_rng<R: Rng + ?Sized>(
        config: GameConfig,
        rng: &mut R,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let pile = rng.gen_range(config.min_pile..=config.max_pile);
        debug!(pile, "new game");
        Ok(Self::fresh(config, pile))
    }

    /// Start a round with a fixed pile, ignoring the configured pile range.
    ///
    /// The take bounds are still validated. A zero pile is rejected since the
    /// round would be over before anyone moved.
    pub fn with_pile(config: GameConfig, pile: u32) -> Result<Self, ConfigError> {
        config.validate()?;
        if pile == 0 {
            return Err(ConfigError::NonPositiveBound);
        }
        Ok(Self::fresh(config, pile))
    }

    fn fresh(config: GameConfig, pile: u32) -> Self {
        Self {
            config,
            pile,
            turn: Actor::Human,
            active: true,
            history: Vec::new(),
        }
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    /// Bricks remaining.
    pub fn pile(&self) -> u32 {
        self.pile
    }

    pub fn turn(&self) -> Actor {
        self.turn
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Every applied move, oldest first.
    pub fn history(&self) -> &[MoveRecord] {
        &self.history
    }

    /// The party that took the last brick, once the round is over.
    pub fn winner(&self) -> Option<Actor> {
        if self.active {
            return None;
        }
        self.history.last().map(|m| m.actor)
    }

    /// Check a move without applying it. Checks run in a fixed order and the
    /// first failure is reported.
    pub fn check_move(&self, actor: Actor, amount: u32) -> Result<(), MoveError> {
        if !self.active {
            return Err(MoveError::GameInactive);
        }
        if actor != self.turn {
            return Err(MoveError::OutOfTurn {
                expected: self.turn,
                actual: actor,
            });
        }
        if amount < self.config.min_take || amount > self.config.max_take {
            return Err(MoveError::IllegalAmount {
                amount,
                min: self.config.min_take,
                max: self.config.max_take,
            });
        }
        if amount > self.pile {
            return Err(MoveError::InsufficientPile {
                amount,
                remaining: self.pile,
            });
        }
        Ok(())
    }

    /// Remove `amount` bricks on behalf of `actor`.
    ///
    /// Does NOT trigger the computer's reply; the caller drives the turn order.
    pub fn apply_move(&mut self, actor: Actor, amount: u32) -> Result<MoveResult, MoveError> {
        self.check_move(actor, amount)?;

        self.pile -= amount;
        self.history.push(MoveRecord { actor, amount });
        debug!(%actor, amount, pile = self.pile, "move applied");

        if self.pile == 0 {
            self.active = false;
            return Ok(MoveResult::GameOver { winner: actor });
        }

        self.turn = actor.other();
        Ok(MoveResult::Continue { next: self.turn })
    }
}

/// A rejected move. The state it was applied to is unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display)]
pub enum MoveError {
    #[display("the game is not running")]
    GameInactive,

    #[display("it is the {expected}'s turn, not the {actual}'s")]
    OutOfTurn { expected: Actor, actual: Actor },

    #[display("{amount} is outside the allowed range {min}..={max}")]
    IllegalAmount { amount: u32, min: u32, max: u32 },

    #[display("cannot take {amount}, only {remaining} left")]
    InsufficientPile { amount: u32, remaining: u32 },
}

impl std::error::Error for MoveError {}

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;

    fn game(pile: u32) -> GameState {
        GameState::with_pile(GameConfig::default(), pile).unwrap()
    }

    #[test]
    fn new_game_starts_with_human() {
        let mut rng = StdRng::seed_from_u64(7);
        let state = GameState::new_game_with_rng(GameConfig::default(), &mut rng).unwrap();
        assert!((12..=20).contains(&state.pile()));
        assert_eq!(state.turn(), Actor::Human);
        assert!(state.is_active());
        assert!(state.history().is_empty());
        assert_eq!(state.winner(), None);
    }

    #[test]
    fn new_game_uses_thread_rng() {
        let state = GameState::new_game(GameConfig::new(4, 6, 1, 2).unwrap()).unwrap();
        assert!((4..=6).contains(&state.pile()));
    }

    #[test]
    fn new_game_rejects_bad_config() {
        let config = GameConfig {
            min_pile: 20,
            max_pile: 12,
            min_take: 1,
            max_take: 3,
        };
        assert_eq!(
            GameState::new_game(config),
            Err(ConfigError::EmptyPileRange { min: 20, max: 12 })
        );
    }

    #[test]
    fn with_pile_rejects_empty_pile() {
        assert_eq!(
            GameState::with_pile(GameConfig::default(), 0),
            Err(ConfigError::NonPositiveBound)
        );
    }

    #[test]
    fn move_flips_turn() {
        let mut state = game(5);
        let result = state.apply_move(Actor::Human, 1).unwrap();
        assert_eq!(result, MoveResult::Continue { next: Actor::Computer });
        assert_eq!(state.pile(), 4);
        assert_eq!(state.turn(), Actor::Computer);
        assert_eq!(
            state.history(),
            &[MoveRecord {
                actor: Actor::Human,
                amount: 1
            }]
        );
    }

    #[test]
    fn taking_last_brick_wins() {
        let mut state = game(2);
        let result = state.apply_move(Actor::Human, 2).unwrap();
        assert_eq!(result, MoveResult::GameOver { winner: Actor::Human });
        assert!(!state.is_active());
        assert_eq!(state.pile(), 0);
        assert_eq!(state.winner(), Some(Actor::Human));
        // turn is left on the winner; nobody can move anyway
        assert_eq!(state.turn(), Actor::Human);
    }

    #[test]
    fn finished_game_rejects_moves() {
        let mut state = game(1);
        state.apply_move(Actor::Human, 1).unwrap();
        assert_eq!(state.apply_move(Actor::Computer, 1), Err(MoveError::GameInactive));
        assert_eq!(state.apply_move(Actor::Human, 1), Err(MoveError::GameInactive));
    }

    #[test]
    fn validation_order() {
        // out of turn wins over an illegal amount
        let state = game(3);
        assert_eq!(
            state.check_move(Actor::Computer, 9),
            Err(MoveError::OutOfTurn {
                expected: Actor::Human,
                actual: Actor::Computer
            })
        );
        // illegal amount wins over insufficient pile
        let state = game(2);
        assert_eq!(
            state.check_move(Actor::Human, 4),
            Err(MoveError::IllegalAmount {
                amount: 4,
                min: 1,
                max: 3
            })
        );
        assert_eq!(
            state.check_move(Actor::Human, 0),
            Err(MoveError::IllegalAmount {
                amount: 0,
                min: 1,
                max: 3
            })
        );
        assert_eq!(
            state.check_move(Actor::Human, 3),
            Err(MoveError::InsufficientPile {
                amount: 3,
                remaining: 2
            })
        );
    }

    #[test]
    fn rejected_move_leaves_state_alone() {
        let mut state = game(3);
        state.apply_move(Actor::Human, 1).unwrap();
        let before = state.clone();
        assert!(state.apply_move(Actor::Human, 1).is_err());
        assert!(state.apply_move(Actor::Computer, 3).is_err());
        assert_eq!(state, before);
    }
}
