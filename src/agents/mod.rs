//! # Agents
//!
//! The [`DDPG`] trainer owns an [`Actor`], a [`Critic`] and their target
//! copies. The actor explores through the noise in its
//! [`NoisyLinear`](crate::components::NoisyLinear) layers.

mod actor;
mod critic;
mod ddpg;
mod loss;

pub use actor::Actor;
pub use critic::Critic;
pub use ddpg::{
    StepStats,
    DDPG,
};
pub use loss::smooth_l1_loss;
