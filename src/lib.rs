pub mod logging;
pub mod error;
pub mod util;

pub mod envs;
pub mod components;
pub mod agents;
pub mod configs;
pub mod engines;

pub mod cli;

use {
    serde::{
        Deserialize,
        Serialize,
    },
    strum::Display,
};


#[derive(Debug, Display, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunMode {
    #[default]
    Train,
    Test,
}
