//! Adaptive playout budget.
//!
//! After every finished game the sample count moves toward the human's
//! strength by a step that halves each game, until it bottoms out at the
//! configured minimum step.
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::board::{Board, GameResult, Player};
use crate::error::GameError;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DifficultyConfig {
    pub initial_samples: u32,
    pub initial_step: f64,
    pub min_step: f64,
    pub min_samples: u32,
    pub max_samples: u32,
}

impl Default for DifficultyConfig {
    fn default() -> Self {
        Self {
            initial_samples: 35,
            initial_step: 30.0,
            min_step: 2.0,
            min_samples: 0,
            max_samples: 1000,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Difficulty {
    #[serde(skip)]
    config: DifficultyConfig,
    samples: u32,
    step: f64,
}

impl DifficultyConfig {
    pub fn validate(&self) -> Result<(), GameError> {
        if self.min_samples > self.max_samples {
            return Err(GameError::InvalidDifficulty(format!(
                "min_samples {} exceeds max_samples {}",
                self.min_samples, self.max_samples
            )));
        }
        if !(self.min_step.is_finite() && self.min_step >= 0.0) {
            return Err(GameError::InvalidDifficulty(
                "min_step must be a non-negative number".to_string(),
            ));
        }
        if !(self.initial_step.is_finite() && self.initial_step >= 0.0) {
            return Err(GameError::InvalidDifficulty(
                "initial_step must be a non-negative number".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for Difficulty {
    fn default() -> Self {
        Self::from_valid(DifficultyConfig::default())
    }
}

impl Difficulty {
    pub fn new(config: DifficultyConfig) -> Result<Self, GameError> {
        config.validate()?;
        Ok(Self::from_valid(config))
    }

    fn from_valid(config: DifficultyConfig) -> Self {
        let samples = config
            .initial_samples
            .clamp(config.min_samples, config.max_samples);
        Self {
            samples,
            step: config.initial_step,
            config,
        }
    }

    pub fn samples(&self) -> u32 {
        self.samples
    }

    pub fn step(&self) -> f64 {
        self.step
    }

    /// Sample count to hand the search; never zero.
    pub fn search_samples(&self) -> u32 {
        self.samples.max(1)
    }

    /// Manual override of the current sample count. The step is untouched.
    pub fn set_samples(&mut self, samples: u32) -> u32 {
        self.samples = samples.clamp(self.config.min_samples, self.config.max_samples);
        self.samples
    }

    /// Next sample count after a game ending in `result`, starting from
    /// `current`. Halves the step whatever the result.
    pub fn adjust_difficulty(&mut self, result: GameResult, current: u32) -> u32 {
        let current = f64::from(current);
        let next = match result {
            GameResult::Drawn => current,
            GameResult::Won(Player::One) => {
                (current + self.step).min(f64::from(self.config.max_samples))
            }
            GameResult::Won(Player::Two) => {
                (current - self.step).max(f64::from(self.config.min_samples))
            }
        };
        self.step = (self.step / 2.0).max(self.config.min_step);
        next.floor() as u32
    }

    /// Applies a finished game to the controller's own sample count.
    pub fn record(&mut self, board: &Board) -> Result<u32, GameError> {
        let result = board.result().ok_or(GameError::GameInProgress)?;
        let previous = self.samples;
        self.samples = self.adjust_difficulty(result, previous);
        info!(
            ?result,
            previous,
            samples = self.samples,
            step = self.step,
            "adjusted difficulty"
        );
        Ok(self.samples)
    }
}
