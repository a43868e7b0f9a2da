//! One player's sequence of games against the computer.
//!
//! [`GameSession`] drives the turn order around a [`GameState`], tells the
//! presentation layer what happened through [`GameEvents`], and keeps every
//! finished game's outcome until a [`StatsRecorder`] has durably stored it.

use std::collections::VecDeque;

use rand::rngs::ThreadRng;
use rand::Rng;
use tracing::{debug, info, instrument, warn};

use super::config::{ConfigError, GameConfig};
use super::logic::{GameState, MoveError};
use super::types::{Actor, GameOutcome, MoveRecord, MoveResult};
use crate::ai::{self, PolicyError};
use crate::auth::Session;
use crate::stats::StatsRecorder;
use crate::storage::PersistenceError;

/// Notifications for the presentation layer. All methods default to no-ops.
pub trait GameEvents {
    fn on_new_game(&mut self, _state: &GameState) {}

    /// Fired after every applied move with the record just appended.
    fn on_state_changed(&mut self, _state: &GameState, _last: MoveRecord) {}

    /// Fired once per game, when the last brick is taken.
    fn on_game_finished(&mut self, _winner: Actor) {}
}

impl GameEvents for () {}

/// Where a session stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    NotStarted,
    HumanTurn,
    ComputerTurn,
    Finished { winner: Actor },
}

/// A finished game's outcome that has not been stored yet, tied to the
/// player who played it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingOutcome {
    pub login: String,
    pub outcome: GameOutcome,
}

struct Round {
    state: GameState,
    player: Session,
}

pub struct GameSession<E = (), R = ThreadRng> {
    config: GameConfig,
    round: Option<Round>,
    events: E,
    rng: R,
    unrecorded: VecDeque<PendingOutcome>,
}

impl<E: GameEvents> GameSession<E, ThreadRng> {
    pub fn new(config: GameConfig, events: E) -> Result<Self, ConfigError> {
        Self::with_rng(config, events, rand::thread_rng())
    }
}

impl<E: GameEvents, R: Rng> GameSession<E, R> {
    pub fn with_rng(config: GameConfig, events: E, rng: R) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config,
            round: None,
            events,
            rng,
            unrecorded: VecDeque::new(),
        })
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn state(&self) -> Option<&GameState> {
        self.round.as_ref().map(|r| &r.state)
    }

    /// The player of the current or most recent game.
    pub fn player(&self) -> Option<&Session> {
        self.round.as_ref().map(|r| &r.player)
    }

    pub fn events(&self) -> &E {
        &self.events
    }

    pub fn events_mut(&mut self) -> &mut E {
        &mut self.events
    }

    pub fn phase(&self) -> Phase {
        match self.state() {
            None => Phase::NotStarted,
            Some(state) => match state.winner() {
                Some(winner) => Phase::Finished { winner },
                None if state.turn() == Actor::Human => Phase::HumanTurn,
                None => Phase::ComputerTurn,
            },
        }
    }

    /// Begin a fresh game for `player`, discarding any game in progress.
    ///
    /// Outcomes of earlier games that have not been recorded yet are kept,
    /// each still credited to whoever played it.
    pub fn start(&mut self, player: &Session) -> Result<&GameState, ConfigError> {
        let state = GameState::new_game_with_rng(self.config, &mut self.rng)?;
        Ok(self.install(state, player))
    }

    /// Begin a game for `player` with a fixed starting pile.
    pub fn start_with_pile(&mut self, player: &Session, pile: u32) -> Result<&GameState, ConfigError> {
        let state = GameState::with_pile(self.config, pile)?;
        Ok(self.install(state, player))
    }

    fn install(&mut self, state: GameState, player: &Session) -> &GameState {
        if self.state().is_some_and(GameState::is_active) {
            info!("game abandoned");
        }
        info!(pile = state.pile(), user = player.login(), "game started");
        self.events.on_new_game(&state);
        let round = self.round.insert(Round {
            state,
            player: player.clone(),
        });
        &round.state
    }

    /// Take `amount` bricks for the human player.
    pub fn human_move(&mut self, amount: u32) -> Result<MoveResult, MoveError> {
        self.apply(Actor::Human, amount)
    }

    /// Let the policy pick the computer's move and apply it.
    ///
    /// Returns the amount taken together with the move result.
    pub fn computer_move(&mut self) -> Result<(u32, MoveResult), SessionError> {
        let state = self.round.as_ref().map(|r| &r.state).ok_or(MoveError::GameInactive)?;
        if !state.is_active() || state.turn() != Actor::Computer {
            // reports GameInactive or OutOfTurn without consulting the policy
            state.check_move(Actor::Computer, self.config.min_take)?;
        }
        let amount = ai::choose_move(
            state.pile(),
            self.config.min_take,
            self.config.max_take,
            &mut self.rng,
        )?;
        let result = self.apply(Actor::Computer, amount)?;
        Ok((amount, result))
    }

    fn apply(&mut self, actor: Actor, amount: u32) -> Result<MoveResult, MoveError> {
        let round = self.round.as_mut().ok_or(MoveError::GameInactive)?;
        let result = round.state.apply_move(actor, amount)?;
        self.events.on_state_changed(&round.state, MoveRecord { actor, amount });

        if let MoveResult::GameOver { winner } = result {
            let outcome = GameOutcome::for_winner(winner);
            info!(%winner, ?outcome, user = round.player.login(), "game finished");
            self.unrecorded.push_back(PendingOutcome {
                login: round.player.login().to_string(),
                outcome,
            });
            self.events.on_game_finished(winner);
        }
        Ok(result)
    }

    /// Outcomes of finished games not yet stored, oldest first.
    pub fn unrecorded(&self) -> impl Iterator<Item = &PendingOutcome> + '_ {
        self.unrecorded.iter()
    }

    /// Store every pending outcome under the login of the player who played
    /// that game.
    ///
    /// Outcomes are removed only once the recorder accepted them, so a
    /// failed call can simply be repeated. Returns how many were stored.
    #[instrument(skip_all)]
    pub fn record_outcomes(&mut self, recorder: &dyn StatsRecorder) -> Result<usize, PersistenceError> {
        let mut recorded = 0;
        while let Some(pending) = self.unrecorded.front() {
            if let Err(e) = recorder.record_outcome(&pending.login, pending.outcome) {
                warn!(error = %e, pending = self.unrecorded.len(), "could not record outcome");
                return Err(e);
            }
            self.unrecorded.pop_front();
            recorded += 1;
        }
        debug!(recorded, "outcomes flushed");
        Ok(recorded)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display)]
pub enum SessionError {
    #[display("{_0}")]
    Move(MoveError),

    #[display("{_0}")]
    Policy(PolicyError),
}

impl std::error::Error for SessionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SessionError::Move(e) => Some(e),
            SessionError::Policy(e) => Some(e),
        }
    }
}

impl From<MoveError> for SessionError {
    fn from(err: MoveError) -> Self {
        SessionError::Move(err)
    }
}

impl From<PolicyError> for SessionError {
    fn from(err: PolicyError) -> Self {
        SessionError::Policy(err)
    }
}
