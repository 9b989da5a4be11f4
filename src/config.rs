use std::{fs, path::Path};

use serde::Deserialize;

use crate::{compare::Sweep, error::SimError, sim::SimParams};

#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct SweepConfig {
    pub ways: Vec<usize>,
    pub sets: Vec<usize>,
}

impl Default for SweepConfig {
    fn default() -> Self {
        SweepConfig {
            ways: vec![1, 2, 4, 8],
            sets: vec![8, 16, 32, 64, 128],
        }
    }
}

/// Simulation parameters plus sweep lists. Any field may be omitted.
#[derive(Deserialize, Debug, Clone, Default, PartialEq)]
pub struct Config {
    #[serde(flatten)]
    pub params: SimParams,
    #[serde(default)]
    pub sweep: SweepConfig,
}

impl Config {
    pub fn from_json(json: &str) -> Result<Config, SimError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_file(path: &Path) -> Result<Config, SimError> {
        let json = fs::read_to_string(path)?;
        log::debug!("loading config from {}", path.display());
        Config::from_json(&json)
    }

    /// Ways sweep at the configured sets, then sets sweep at the configured ways.
    pub fn sweeps(&self) -> [Sweep; 2] {
        [
            Sweep::ways(self.sweep.ways.clone()),
            Sweep::sets(self.sweep.sets.clone()),
        ]
    }
}
