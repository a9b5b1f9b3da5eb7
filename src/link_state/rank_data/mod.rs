use chrono::Utc;
use rayon::prelude::*;

use std::cmp::Ordering;

use super::{LinkState, ProcData, RankData, RunState, IterationStats};
use crate::article::NodeId;
use crate::error::Result;

pub mod sink;
use self::sink::{RankManifest, RankSink};

/// Greatest-to-least; floats aren't `Ord`, and a NaN rank sorts last
fn descending(a: f64, b: f64) -> Ordering {
    match (a.is_nan(), b.is_nan()) {
        (true, true)   => Ordering::Equal,
        (true, false)  => Ordering::Greater,
        (false, true)  => Ordering::Less,
        (false, false) => b.partial_cmp(&a).unwrap_or(Ordering::Equal),
    }
}

/// Sort `(node, rank)` pairs best first; ties come out in no particular order
pub fn sort_ranks(ranks: &mut [(NodeId, f64)]) {
    ranks.par_sort_unstable_by(|&(_, a), &(_, b)| descending(a, b));
}

impl From<LinkState<ProcData>> for LinkState<RankData> {
    fn from(old: LinkState<ProcData>) -> LinkState<RankData> {
        let mut ranked = old.state.ranks.into_vec();
        old.pool.install(|| sort_ranks(&mut ranked));
        let (run, last) = (old.state.run, old.state.last);
        LinkState {
            threads: old.threads,
            size:    old.size,
            log:     old.log,
            pool:    old.pool,
            config:  old.config,
            state:   RankData { ranked, run, last },
        }
    }
}

impl LinkState<RankData> {
    pub fn ranked(&self) -> &[(NodeId, f64)] {
        &self.state.ranked
    }
    pub fn top(&self, k: usize) -> &[(NodeId, f64)] {
        &self.state.ranked[..k.min(self.state.ranked.len())]
    }
    pub fn run_state(&self) -> RunState {
        self.state.run
    }
    pub fn last_stats(&self) -> Option<IterationStats> {
        self.state.last
    }
    pub fn rank_sum(&self) -> f64 {
        self.state.ranked.iter().map(|&(_, r)| r).sum()
    }

    pub fn manifest(&self) -> RankManifest {
        RankManifest {
            nodes:      self.state.ranked.len(),
            iterations: self.state.run.iterations(),
            converged:  self.state.run.converged(),
            damping:    self.config.damping,
            partitions: self.config.partitions,
            scope:      self.config.scope,
            rank_sum:   self.rank_sum(),
            created:    Utc::now(),
        }
    }

    /// Hand the sorted ranks to `sink`; nothing changes after this
    pub fn save<S: RankSink>(&self, sink: &mut S) -> Result<()> {
        let manifest = self.manifest();
        sink.write_ranks(&self.state.ranked, &manifest)?;
        info!(self.log, "Saved {} ranks", manifest.nodes;
              "iterations" => manifest.iterations,
              "sum" => manifest.rank_sum);
        Ok(())
    }

    pub fn data(&self) {
        info!(self.log, "State of RankData:");
        info!(self.log, "Number of ranks:    {}", self.state.ranked.len());
        info!(self.log, "Sum of all ranks:   {}", self.rank_sum());
        info!(self.log, "Run:                {}", self.state.run);
        if let Some(s) = self.state.last {
            info!(self.log, "Dangling mass:      {}", s.dangling_mass);
            info!(self.log, "Dropped mass:       {}", s.dropped_mass);
        }
        for (i, &(ref id, rank)) in self.top(self.config.top).iter().enumerate() {
            info!(self.log, "{:>4}. {}", i + 1, id; "rank" => rank);
        }
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::article::Page;
    use crate::config::RankConfig;
    use crate::link_state::LinkData;
    use slog::Logger;
    use std::sync::Arc;

    fn ranked(ids: &[(&str, f64)]) -> Vec<(NodeId, f64)> {
        let mut v: Vec<(NodeId, f64)> = ids.iter().map(|&(id, r)| (Arc::from(id), r)).collect();
        sort_ranks(&mut v);
        v
    }

    fn order(v: &[(NodeId, f64)]) -> Vec<&str> {
        v.iter().map(|&(ref id, _)| &**id).collect()
    }

    #[test]
    fn best_first() {
        let v = ranked(&[("A", 0.1), ("B", 0.5), ("C", 0.3)]);
        assert_eq!(order(&v), vec!["B", "C", "A"]);
    }

    #[test]
    fn nan_sorts_last() {
        let v = ranked(&[("N", f64::NAN), ("A", 0.1), ("B", 0.2)]);
        assert_eq!(order(&v), vec!["B", "A", "N"]);
    }

    #[test]
    fn ties_keep_both() {
        let v = ranked(&[("A", 0.2), ("B", 0.2), ("C", 0.6)]);
        assert_eq!(v[0].1, 0.6);
        let mut tied = order(&v)[1..].to_vec();
        tied.sort();
        assert_eq!(tied, vec!["A", "B"]);
    }

    #[test]
    fn saves_sorted_ranks() {
        let pages = vec![
            Page::new("Hub", vec![]),
            Page::new("A", vec!["Hub".into()]),
            Page::new("B", vec!["Hub".into(), "A".into()]),
        ];
        let mut config = RankConfig::default();
        config.top = 2;
        let log = Logger::root(slog::Discard, o!());
        let mut ls: LinkState<ProcData> =
            LinkState::<LinkData>::from_pages(pages, config, log).unwrap().into();
        ls.run(3).unwrap();
        let ls: LinkState<RankData> = ls.into();
        ls.data();

        let mut out: Vec<(String, f64)> = vec![];
        ls.save(&mut out).unwrap();
        assert_eq!(out.len(), 3);
        assert_eq!(out[0].0, "Hub");
        assert!(out.windows(2).all(|w| w[0].1 >= w[1].1));
        assert_eq!(ls.top(10).len(), 3);

        let m = ls.manifest();
        assert_eq!(m.iterations, 3);
        assert!(!m.converged);
        assert_eq!(m.nodes, 3);
        assert!(m.rank_sum < 1.0);
    }
}
