use rand::Rng;
use tracing::trace;

use crate::game::config::{validate_take, ConfigError};

/// Pick the computer's move against a pile of `pile` bricks.
///
/// When the whole pile fits in one move the computer takes all of it.
/// Otherwise it takes a uniformly random amount in `min_take..=max_take`.
/// This is deliberately not the modulo `max_take + 1` strategy.
pub fn choose_move<R: Rng + ?Sized>(
    pile: u32,
    min_take: u32,
    max_take: u32,
    rng: &mut R,
) -> Result<u32, PolicyError> {
    validate_take(min_take, max_take)?;
    if pile < min_take {
        return Err(PolicyError::NoLegalMove { pile, min_take });
    }

    let amount = if pile <= max_take {
        pile
    } else {
        rng.gen_range(min_take..=max_take)
    };
    trace!(pile, amount, "computer move chosen");
    Ok(amount)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display)]
pub enum PolicyError {
    #[display("{_0}")]
    Config(ConfigError),

    /// Fewer bricks remain than the smallest legal move.
    #[display("no legal move: {pile} left, at least {min_take} must be taken")]
    NoLegalMove { pile: u32, min_take: u32 },
}

impl std::error::Error for PolicyError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PolicyError::Config(e) => Some(e),
            PolicyError::NoLegalMove { .. } => None,
        }
    }
}

impl From<ConfigError> for PolicyError {
    fn from(err: ConfigError) -> Self {
        PolicyError::Config(err)
    }
}
