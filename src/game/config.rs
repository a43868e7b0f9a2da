use serde::{Deserialize, Serialize};

/// Bounds for one game of bricks.
///
/// The starting pile is drawn uniformly from `min_pile..=max_pile`; a single
/// move removes between `min_take` and `max_take` bricks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameConfig {
    pub min_pile: u32,
    pub max_pile: u32,
    pub min_take: u32,
    pub max_take: u32,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            min_pile: 12,
            max_pile: 20,
            min_take: 1,
            max_take: 3,
        }
    }
}

impl GameConfig {
    pub fn new(min_pile: u32, max_pile: u32, min_take: u32, max_take: u32) -> Result<Self, ConfigError> {
        let config = Self {
            min_pile,
            max_pile,
            min_take,
            max_take,
        };
        config.validate()?;
        Ok(config)
    }

    /// Check the bounds. Every bound must be positive and each range non-empty.
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_take(self.min_take, self.max_take)?;
        if self.min_pile == 0 || self.max_pile == 0 {
            return Err(ConfigError::NonPositiveBound);
        }
        if self.min_pile > self.max_pile {
            return Err(ConfigError::EmptyPileRange {
                min: self.min_pile,
                max: self.max_pile,
            });
        }
        Ok(())
    }

    /// Largest legal move against a pile of `pile` bricks.
    pub fn take_ceiling(&self, pile: u32) -> u32 {
        self.max_take.min(pile)
    }
}

/// Validation shared by the engine and the opponent policy, which only sees the
/// take bounds.
pub(crate) fn validate_take(min_take: u32, max_take: u32) -> Result<(), ConfigError> {
    if min_take == 0 || max_take == 0 {
        return Err(ConfigError::NonPositiveBound);
    }
    if min_take > max_take {
        return Err(ConfigError::EmptyTakeRange {
            min: min_take,
            max: max_take,
        });
    }
    Ok(())
}

/// Invalid engine or policy bounds. Not retryable without a different config.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display)]
pub enum ConfigError {
    #[display("all pile and take bounds must be positive")]
    NonPositiveBound,

    #[display("pile range {min}..={max} is empty")]
    EmptyPileRange { min: u32, max: u32 },

    #[display("take range {min}..={max} is empty")]
    EmptyTakeRange { min: u32, max: u32 },
}

impl std::error::Error for ConfigError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_matches_classic_rules() {
        let config = GameConfig::default();
        assert_eq!(config, GameConfig::new(12, 20, 1, 3).unwrap());
    }

    #[test]
    fn rejects_zero_bounds() {
        assert_eq!(GameConfig::new(0, 20, 1, 3), Err(ConfigError::NonPositiveBound));
        assert_eq!(GameConfig::new(12, 20, 0, 3), Err(ConfigError::NonPositiveBound));
        assert_eq!(GameConfig::new(12, 20, 1, 0), Err(ConfigError::NonPositiveBound));
    }

    #[test]
    fn rejects_inverted_ranges() {
        assert_eq!(
            GameConfig::new(20, 12, 1, 3),
            Err(ConfigError::EmptyPileRange { min: 20, max: 12 })
        );
        assert_eq!(
            GameConfig::new(12, 20, 3, 1),
            Err(ConfigError::EmptyTakeRange { min: 3, max: 1 })
        );
    }

    #[test]
    fn single_value_ranges_are_fine() {
        assert!(GameConfig::new(5, 5, 2, 2).is_ok());
    }

    #[test]
    fn take_ceiling_is_capped_by_pile() {
        let config = GameConfig::default();
        assert_eq!(config.take_ceiling(10), 3);
        assert_eq!(config.take_ceiling(2), 2);
        assert_eq!(config.take_ceiling(0), 0);
    }
}
