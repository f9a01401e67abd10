//! # Configs
//!
//! [`DdpgConfig`] describes the learner (networks, optimizer, replay) and
//! [`TrainConfig`] describes the episode loop driving it. Both are plain
//! serde structs so they can be read from and written to RON files with
//! [`crate::util::read_config`] and [`crate::util::write_config`].

mod ddpg;
mod train;

pub use ddpg::DdpgConfig;
pub use train::{
    OuConfig,
    TrainConfig,
};

use crate::error::{
    DdpgError,
    Result,
};


pub(crate) fn ensure(
    condition: bool,
    message: impl FnOnce() -> String,
) -> Result<()> {
    if condition {
        Ok(())
    } else {
        Err(DdpgError::Config(message()))
    }
}

pub(crate) fn ensure_unit_interval(
    name: &str,
    value: f64,
) -> Result<()> {
    ensure(
        (0.0..=1.0).contains(&value),
        || format!("{name} must lie in [0, 1], got {value}"),
    )
}
