mod diff_drive;

use crate::error::Result;

pub use diff_drive::{
    DiffDriveConfig,
    DiffDriveEnv,
};


/// What the environment hands back after one action.
#[derive(Debug, Clone, PartialEq)]
pub struct Step {
    pub observation: Vec<f64>,
    pub reward: f64,
    pub done: bool,
}

/// The robot (or its simulator) as seen by the episode loop.
///
/// Both calls block until the environment answers.
pub trait Environment {
    /// Start a new episode and return its first observation.
    fn reset(&mut self) -> Result<Vec<f64>>;

    /// Apply `action` and report the outcome. `previous_action` is the action
    /// applied on the step before (zeros at the very start).
    fn step(
        &mut self,
        action: &[f64],
        previous_action: &[f64],
    ) -> Result<Step>;

    fn observation_size(&self) -> usize;

    fn action_size(&self) -> usize {
        2
    }
}
