use chrono::{DateTime, Utc};

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::article::NodeId;
use crate::error::{RankError, Result};
use crate::link_state::parse::LinkScope;

pub const RANKS_FILE: &str = "ranks.csv";
pub const MANIFEST_FILE: &str = "manifest.json";

/// Describes the run that produced a rank dump
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankManifest {
    pub nodes:      usize,
    pub iterations: usize,
    pub converged:  bool,
    pub damping:    f64,
    pub partitions: usize,
    pub scope:      LinkScope,
    pub rank_sum:   f64,
    pub created:    DateTime<Utc>,
}

/// Where sorted ranks end up
pub trait RankSink {
    fn write_ranks(&mut self, ranks: &[(NodeId, f64)], manifest: &RankManifest) -> Result<()>;
}

/// Writes `ranks.csv` and `manifest.json` into a directory
/// Each csv record is `title,rank`, best first; titles are quoted whenever
/// they contain commas, quotes or newlines, so they always read back intact.
pub struct CsvSink {
    dir: PathBuf,
}

impl CsvSink {
    pub fn new<P: Into<PathBuf>>(dir: P) -> Self {
        CsvSink { dir: dir.into() }
    }
    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl RankSink for CsvSink {
    fn write_ranks(&mut self, ranks: &[(NodeId, f64)], manifest: &RankManifest) -> Result<()> {
        fs::create_dir_all(&self.dir).map_err(RankError::io(&self.dir))?;

        let ranks_path = self.dir.join(RANKS_FILE);
        let mut csv_w = csv::WriterBuilder::new()
            .has_headers(false)
            .from_path(&ranks_path)?;
        for &(ref id, rank) in ranks {
            csv_w.serialize((&**id, rank))?;
        }
        csv_w.flush().map_err(RankError::io(&ranks_path))?;

        let manifest_path = self.dir.join(MANIFEST_FILE);
        let f = File::create(&manifest_path).map_err(RankError::io(&manifest_path))?;
        let mut w = BufWriter::new(f);
        serde_json::to_writer_pretty(&mut w, manifest)?;
        w.flush().map_err(RankError::io(&manifest_path))?;
        Ok(())
    }
}

/// Keeps everything in memory; handy for tests and for callers that want
/// the ranks without touching the disk
impl RankSink for Vec<(String, f64)> {
    fn write_ranks(&mut self, ranks: &[(NodeId, f64)], _: &RankManifest) -> Result<()> {
        self.extend(ranks.iter().map(|&(ref id, r)| (id.to_string(), r)));
        Ok(())
    }
}

/// Read back the `ranks.csv` written by a `CsvSink`
pub fn read_ranks(dir: &Path) -> Result<Vec<(String, f64)>> {
    let mut csv_r = csv::ReaderBuilder::new()
        .has_headers(false)
        .from_path(dir.join(RANKS_FILE))?;
    let mut ranks = Vec::new();
    for record in csv_r.deserialize() {
        let (id, rank): (String, f64) = record?;
        ranks.push((id, rank));
    }
    Ok(ranks)
}

pub fn read_manifest(dir: &Path) -> Result<RankManifest> {
    let path = dir.join(MANIFEST_FILE);
    let f = File::open(&path).map_err(RankError::io(&path))?;
    Ok(serde_json::from_reader(BufReader::new(f))?)
}
