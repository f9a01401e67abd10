use {
    super::{
        ensure,
        DdpgConfig,
    },
    crate::{
        error::Result,
        RunMode,
    },
    serde::{
        Deserialize,
        Serialize,
    },
    std::path::PathBuf,
};


/// Ornstein-Uhlenbeck parameters for the optional action-space noise.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OuConfig {
    pub mu: f64,
    pub theta: f64,
    pub max_sigma: f64,
    pub min_sigma: f64,
    pub decay_period: usize,
}
impl Default for OuConfig {
    fn default() -> Self {
        Self {
            mu: 0.0,
            theta: 0.15,
            max_sigma: 0.3,
            min_sigma: 0.2,
            decay_period: 10_000_000,
        }
    }
}


#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainConfig {
    // The total number of episodes.
    pub max_episodes: usize,
    // The maximum number of environment steps in one episode.
    pub max_steps: usize,
    // Transitions that must be in the buffer before any optimizer step.
    pub warmup_transitions: usize,
    // Every n-th episode (past warm-up) is an evaluation episode.
    pub eval_interval: usize,
    // Every n-th episode the target networks are saved.
    pub checkpoint_interval: usize,
    // The reward the environment hands out when the goal is reached.
    pub max_reward: f64,
    // How often a transition carrying `max_reward` is stored.
    pub max_reward_repeats: usize,
    // Checkpoints are grouped by this world identifier.
    pub world: String,
    // Root directory of the checkpoint store.
    pub checkpoint_dir: PathBuf,
    // Load the checkpoint of this episode before the first episode.
    pub resume_episode: Option<usize>,
    // Training or pure evaluation.
    pub run_mode: RunMode,
    // Optional Ornstein-Uhlenbeck action noise on top of the noisy layers.
    pub ou_noise: Option<OuConfig>,
    // Seed for replay sampling and exploration noise.
    pub seed: Option<u64>,
}
impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            max_episodes: 10_001,
            max_steps: 500,
            warmup_transitions: 500,
            eval_interval: 10,
            checkpoint_interval: 20,
            max_reward: 500.0,
            max_reward_repeats: 3,
            world: "stage_1".into(),
            checkpoint_dir: PathBuf::from("models"),
            resume_episode: None,
            run_mode: RunMode::Train,
            ou_noise: None,
            seed: None,
        }
    }
}
impl TrainConfig {
    /// Validate against the learner configuration it will drive.
    pub fn validate(
        &self,
        alg_config: &DdpgConfig,
    ) -> Result<()> {
        ensure(self.max_steps > 0, || "max_steps must be positive".into())?;
        ensure(self.eval_interval > 0, || "eval_interval must be positive".into())?;
        ensure(self.checkpoint_interval > 0, || "checkpoint_interval must be positive".into())?;
        ensure(self.max_reward_repeats > 0, || "max_reward_repeats must be positive".into())?;
        ensure(!self.world.is_empty(), || "world must not be empty".into())?;
        ensure(
            self.warmup_transitions >= alg_config.training_batch_size,
            || format!(
                "warmup_transitions ({}) must hold at least one batch ({})",
                self.warmup_transitions,
                alg_config.training_batch_size,
            ),
        )?;
        ensure(
            self.warmup_transitions <= alg_config.replay_buffer_capacity,
            || format!(
                "warmup_transitions ({}) can never be reached with capacity {}",
                self.warmup_transitions,
                alg_config.replay_buffer_capacity,
            ),
        )?;
        if let Some(ou) = &self.ou_noise {
            ensure(
                ou.min_sigma >= 0.0 && ou.min_sigma <= ou.max_sigma,
                || format!("OU sigma range [{}, {}] is invalid", ou.min_sigma, ou.max_sigma),
            )?;
            ensure(ou.decay_period > 0, || "OU decay_period must be positive".into())?;
        }
        Ok(())
    }
}
