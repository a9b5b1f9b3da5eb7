use std::fmt;

use super::{LinkState, LinkData, ProcData, RankTable, PartitionedGraph};
use crate::error::Result;

mod pagerank;
pub use self::pagerank::{IterationStats, contributions, aggregate, normalize};

/// Where a run is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Initializing,
    Iterating(usize),
    /// rank changes fell below the configured threshold after this many rounds
    Converged(usize),
    /// ran the requested number of rounds
    Stopped(usize),
}

impl RunState {
    pub fn iterations(&self) -> usize {
        match *self {
            RunState::Initializing => 0,
            RunState::Iterating(t) | RunState::Converged(t) | RunState::Stopped(t) => t,
        }
    }
    pub fn converged(&self) -> bool {
        match *self {
            RunState::Converged(_) => true,
            _ => false,
        }
    }
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            RunState::Initializing => write!(f, "initializing"),
            RunState::Iterating(t) => write!(f, "iterating ({})", t),
            RunState::Converged(t) => write!(f, "converged after {} iterations", t),
            RunState::Stopped(t) => write!(f, "stopped after {} iterations", t),
        }
    }
}

impl From<LinkState<LinkData>> for LinkState<ProcData> {
    fn from(old: LinkState<LinkData>) -> LinkState<ProcData> {
        // start every page at 1/N
        old.advance(|data| {
            let ranks = RankTable::uniform(&data.graph);
            ProcData {
                graph: data.graph,
                ranks,
                run:   RunState::Initializing,
                last:  None,
            }
        })
    }
}

impl LinkState<ProcData> {
    /// Run one round; the old rank table is dropped once the new one exists
    pub fn iterate(&mut self) -> Result<IterationStats> {
        let t = self.state.run.iterations() + 1;
        let (next, stats) = pagerank::iterate(
            &self.state.graph, &self.state.ranks, self.config.damping, t, &self.pool)?;
        self.state.ranks = next;
        self.state.run = RunState::Iterating(t);
        self.state.last = Some(stats);
        Ok(stats)
    }

    /// Run up to `iterations` rounds
    /// Stops early only when a convergence threshold is configured and the
    /// largest rank change of a round falls below it.
    pub fn run(&mut self, iterations: usize) -> Result<RunState> {
        let pr_log = self.log.new(o!(
                "damping" => self.config.damping,
                "partitions" => self.config.partitions,
                "threads" => self.threads));
        info!(pr_log, "Computing pageranks";
              "nodes" => self.size,
              "iterations" => iterations,
              "epsilon" => format!("{:?}", self.config.epsilon));
        let every = self.config.log_every.max(1);

        let start = self.state.run.iterations();
        let mut state = RunState::Stopped(start);
        for _ in 0..iterations {
            let s = self.iterate()?;
            debug!(pr_log, "Iteration {}", s.iteration;
                   "sum" => s.rank_sum,
                   "max_change" => s.max_change,
                   "dangling" => s.dangling_mass,
                   "dropped" => s.dropped_mass);
            if s.iteration % every == 0 {
                info!(pr_log, "{:03}: max change {}, sum {}", s.iteration, s.max_change, s.rank_sum);
            }
            if self.config.epsilon.map_or(false, |e| s.max_change < e) {
                state = RunState::Converged(s.iteration);
                break;
            }
            state = RunState::Stopped(s.iteration);
        }
        self.state.run = state;

        match self.state.last {
            Some(s) => info!(pr_log, "Finished: {}", state;
                             "sum" => s.rank_sum,
                             "max_change" => s.max_change),
            None => info!(pr_log, "Finished: {}", state),
        }
        Ok(state)
    }

    pub fn ranks(&self) -> &RankTable {
        &self.state.ranks
    }
    pub fn graph(&self) -> &PartitionedGraph {
        &self.state.graph
    }
    pub fn run_state(&self) -> RunState {
        self.state.run
    }
    pub fn last_stats(&self) -> Option<IterationStats> {
        self.state.last
    }
}
