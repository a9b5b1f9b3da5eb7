// https://hoverbear.org/2016/10/12/rust-state-machine-pattern/

use rayon::{ThreadPool, ThreadPoolBuilder};
use slog::{Drain, Level, Logger};

use std::io;

use crate::config::RankConfig;
use crate::error::Result;

pub mod parse;
pub mod partition;
pub mod link_data;
pub mod rank_table;
pub mod proc_data;
pub mod rank_data;

pub use self::link_data::PartitionedGraph;
pub use self::rank_table::RankTable;
pub use self::proc_data::{IterationStats, RunState};
pub use self::rank_data::sink::{RankSink, CsvSink, RankManifest};


//  ------STATE--MACHINE------


pub trait State { }
impl State for LinkData { }
impl State for ProcData { }
impl State for RankData { }

/// One run, from loaded graph to sorted ranks
/// This is the whole execution context: every worker borrows the pool, the
/// logger and the configuration from here, nothing is process-global.
pub struct LinkState<S: State> {
    threads: usize,         // number of workers in `pool`
    size:    usize,         // number of distinct nodes
    log:     Logger,        // root logger that will be split off for components
    pool:    ThreadPool,
    config:  RankConfig,
    state:   S,             // 1 of 3 values that represent progress of the run
}

pub fn new_logger() -> Logger {
    new_logger_at(Level::Info)
}

pub fn new_logger_at(level: Level) -> Logger {
    let decorator = slog_term::PlainSyncDecorator::new(io::stderr());
    let drain = slog_term::FullFormat::new(decorator).build()
        .filter_level(level)
        .fuse();
    Logger::root(drain, o!())
}

fn build_pool(threads: usize) -> Result<ThreadPool> {
    // 0 lets rayon choose one thread per cpu
    let pool = ThreadPoolBuilder::new()
        .num_threads(threads)
        .thread_name(|i| format!("wikirank-{}", i))
        .build()?;
    Ok(pool)
}

impl<S: State> LinkState<S> {
    pub fn size(&self) -> usize {
        self.size
    }
    pub fn threads(&self) -> usize {
        self.threads
    }
    pub fn config(&self) -> &RankConfig {
        &self.config
    }
    pub fn log(&self) -> &Logger {
        &self.log
    }
    /// Carry the context over into the next state
    fn advance<T: State, F: FnOnce(S) -> T>(self, f: F) -> LinkState<T> {
        LinkState {
            threads: self.threads,
            size:    self.size,
            log:     self.log,
            pool:    self.pool,
            config:  self.config,
            state:   f(self.state),
        }
    }
}


//  ----------STATES----------


pub struct LinkData {
    /// The parsed corpus, partitioned by title and never touched again
    graph: PartitionedGraph,
    stats: parse::LoadStats,
}

pub struct ProcData {
    /// The graph plus the rank table of the current iteration
    /// The table is replaced, never edited, at the end of every iteration
    graph: PartitionedGraph,
    ranks: RankTable,
    run:   RunState,
    last:  Option<IterationStats>,
}

pub struct RankData {
    /// Final ranks, best first
    ranked: Vec<(crate::article::NodeId, f64)>,
    run:    RunState,
    last:   Option<IterationStats>,
}
