//! Run configuration
//! Defaults match the reference run: damping 0.8, two partitions, links
//! scanned inside the `<text>` section only. A JSON file can provide any
//! subset of the fields; command-line flags are applied on top of it.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use crate::error::{RankError, Result};
use crate::link_state::parse::LinkScope;

pub const DAMPING_FACTOR: f64 = 0.8;
pub const PARTITIONS: usize = 2;
pub const LOG_EVERY: usize = 10;    // how often to log iteration stats at `info`

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RankConfig {
    pub damping: f64,
    /// partitions of the graph and of every rank table
    pub partitions: usize,
    /// chunks the input file is split into for parsing
    pub input_partitions: usize,
    /// worker threads; 0 lets the pool pick one per cpu
    pub threads: usize,
    pub scope: LinkScope,
    /// stop early once no rank moves by more than this
    pub epsilon: Option<f64>,
    pub log_every: usize,
    pub top: usize,
}

impl Default for RankConfig {
    fn default() -> Self {
        RankConfig {
            damping:          DAMPING_FACTOR,
            partitions:       PARTITIONS,
            input_partitions: PARTITIONS,
            threads:          0,
            scope:            LinkScope::Text,
            epsilon:          None,
            log_every:        LOG_EVERY,
            top:              0,
        }
    }
}

impl RankConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        let f = File::open(path).map_err(RankError::io(path))?;
        let config: RankConfig = serde_json::from_reader(BufReader::new(f))?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !self.damping.is_finite() || self.damping < 0.0 || self.damping > 1.0 {
            return Err(RankError::Usage(
                format!("damping factor must lie in [0, 1], got {}", self.damping)));
        }
        if self.partitions == 0 {
            return Err(RankError::Usage("partition count must be at least 1".into()));
        }
        if self.input_partitions == 0 {
            return Err(RankError::Usage("input partition count must be at least 1".into()));
        }
        if let Some(e) = self.epsilon {
            if !e.is_finite() || e <= 0.0 {
                return Err(RankError::Usage(
                    format!("convergence threshold must be positive, got {}", e)));
            }
        }
        Ok(())
    }
}
