pub mod config;
pub mod logic;
pub mod session;
pub mod types;

pub use config::{ConfigError, GameConfig};
pub use logic::{GameState, MoveError};
pub use session::{GameEvents, GameSession, PendingOutcome, Phase, SessionError};
pub use types::{Actor, GameOutcome, MoveRecord, MoveResult};
