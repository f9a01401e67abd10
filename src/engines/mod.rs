//! # Engines
//!
//! The [`EpisodeController`] runs episodes against an
//! [`Environment`](crate::envs::Environment), fills the replay buffer and
//! steps the trainer. Scalars go to a [`MetricSink`], parameters to a
//! [`CheckpointStore`].

mod checkpoint;
mod episode;
mod metrics;

pub use checkpoint::{
    CheckpointStore,
    FileCheckpointStore,
};
pub use episode::{
    EpisodeController,
    EpisodeSummary,
    Phase,
};
pub use metrics::{
    MetricSink,
    ParquetSink,
    RecordingSink,
    Scalar,
    TracingSink,
};
