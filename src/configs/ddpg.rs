use {
    super::{
        ensure,
        ensure_unit_interval,
    },
    crate::error::Result,
    serde::{
        Deserialize,
        Serialize,
    },
};


#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DdpgConfig {
    // The length of an observation vector.
    pub observation_size: usize,
    // The length of an action vector: (linear velocity, angular velocity).
    pub action_size: usize,
    // Linear velocity is bounded to [0, max_linear_velocity] (m/s).
    pub max_linear_velocity: f64,
    // Angular velocity is bounded to [-max_angular_velocity, max_angular_velocity] (rad/s).
    pub max_angular_velocity: f64,
    // Width of both hidden layers of the Actor.
    pub actor_hidden_size: usize,
    // Width of each of the two input towers of the Critic. The joint layer is twice this.
    pub critic_hidden_size: usize,
    // Initial value of every noise scale in the Actor's noisy layers.
    pub sigma_init: f64,
    // Output layers are initialized uniformly in [-output_init, output_init].
    pub output_init: f64,
    // The impact of the q value of the next state on the current state's q value.
    pub gamma: f64,
    // The weight for updating the target networks.
    pub tau: f64,
    // The learning rates for the Actor and Critic networks.
    pub actor_learning_rate: f64,
    pub critic_learning_rate: f64,
    // The training batch size for each optimizer step.
    pub training_batch_size: usize,
    // The capacity of the replay buffer used for sampling training data.
    pub replay_buffer_capacity: usize,
}
impl Default for DdpgConfig {
    fn default() -> Self {
        Self {
            observation_size: 40,
            action_size: 2,
            max_linear_velocity: 0.22,
            max_angular_velocity: 2.0,
            actor_hidden_size: 500,
            critic_hidden_size: 250,
            sigma_init: 0.017,
            output_init: 0.003,
            gamma: 0.99,
            tau: 0.001,
            actor_learning_rate: 0.001,
            critic_learning_rate: 0.001,
            training_batch_size: 128,
            replay_buffer_capacity: 50_000,
        }
    }
}
impl DdpgConfig {
    /// The default configuration with different input/output sizes.
    pub fn with_sizes(
        observation_size: usize,
        action_size: usize,
    ) -> Self {
        Self {
            observation_size,
            action_size,
            ..Default::default()
        }
    }

    pub fn validate(&self) -> Result<()> {
        ensure(self.observation_size > 0, || "observation_size must be positive".into())?;
        ensure(
            self.action_size == 2,
            || format!("action_size must be 2 (linear, angular), got {}", self.action_size),
        )?;
        ensure(
            self.max_linear_velocity > 0.0 && self.max_linear_velocity.is_finite(),
            || format!("max_linear_velocity must be positive, got {}", self.max_linear_velocity),
        )?;
        ensure(
            self.max_angular_velocity > 0.0 && self.max_angular_velocity.is_finite(),
            || format!("max_angular_velocity must be positive, got {}", self.max_angular_velocity),
        )?;
        ensure(self.actor_hidden_size > 0, || "actor_hidden_size must be positive".into())?;
        ensure(self.critic_hidden_size > 0, || "critic_hidden_size must be positive".into())?;
        ensure(
            self.sigma_init >= 0.0 && self.sigma_init.is_finite(),
            || format!("sigma_init must be non-negative, got {}", self.sigma_init),
        )?;
        ensure(
            self.output_init > 0.0 && self.output_init.is_finite(),
            || format!("output_init must be positive, got {}", self.output_init),
        )?;
        ensure_unit_interval("gamma", self.gamma)?;
        ensure_unit_interval("tau", self.tau)?;
        ensure(
            self.actor_learning_rate > 0.0,
            || format!("actor_learning_rate must be positive, got {}", self.actor_learning_rate),
        )?;
        ensure(
            self.critic_learning_rate > 0.0,
            || format!("critic_learning_rate must be positive, got {}", self.critic_learning_rate),
        )?;
        ensure(self.training_batch_size > 0, || "training_batch_size must be positive".into())?;
        ensure(self.replay_buffer_capacity > 0, || "replay_buffer_capacity must be positive".into())?;
        ensure(
            self.training_batch_size <= self.replay_buffer_capacity,
            || format!(
                "training_batch_size ({}) exceeds replay_buffer_capacity ({})",
                self.training_batch_size,
                self.replay_buffer_capacity,
            ),
        )
    }
}
