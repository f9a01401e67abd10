//! # Components
//!
//! This module contains the components that the agent is built from.
//!
//! ## Noisy Linear
//!
//! The [`NoisyLinear`] layer perturbs its own weights with learned-magnitude
//! gaussian noise on every forward pass. It is the exploration mechanism of
//! the [`crate::agents::Actor`].
//!
//! ## Noise
//!
//! The [`OuNoise`] struct implements the Ornstein-Uhlenbeck process. It is
//! an optional, disabled-by-default alternative to parameter noise that is
//! added to the actions instead.
//!
//! ## Replay Buffer
//!
//! The [`ReplayBuffer`] struct implements a bounded FIFO store of
//! transitions with uniform sampling without replacement.
//!
//! ## Sync
//!
//! [`hard_update`] and [`soft_update`] copy and track parameters from a live
//! network into its target network.

mod noisy_linear;
mod ou_noise;
mod replay_buffer;
mod sync;

pub use noisy_linear::{
    fan_in_uniform,
    NoisyLinear,
};
pub use ou_noise::OuNoise;
pub use replay_buffer::{
    Batch,
    ReplayBuffer,
    Transition,
};
pub use sync::{
    hard_update,
    named_vars,
    soft_update,
};
