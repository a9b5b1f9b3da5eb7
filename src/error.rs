use std::io;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RankError {
    #[error("usage: {0}")]
    Usage(String),

    #[error("I/O error: {source} (path: {})", .path.display())]
    Io {
        source: io::Error,
        path: PathBuf,
    },

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("rank table has {table} partitions but the graph has {graph}")]
    Partitioning { graph: usize, table: usize },

    #[error("could not build worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

pub type Result<T> = std::result::Result<T, RankError>;

impl RankError {
    pub fn io<P: Into<PathBuf>>(path: P) -> impl FnOnce(io::Error) -> RankError {
        let path = path.into();
        move |source| RankError::Io { source, path }
    }
}
