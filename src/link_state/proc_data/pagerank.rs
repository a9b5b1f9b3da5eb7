/*
 * One round of rank propagation over the partitioned graph
 *
 *   join       graph partition i  ⋈  rank partition i        (no movement)
 *   emit       (self, 0) and (target, rank/out_degree) per link
 *   filter     targets outside the graph are dropped
 *   combine    sum per target inside the source partition
 *   shuffle    bucket for partition j goes to partition j
 *   aggregate  sum the buckets that arrived
 *   normalize  (1 - d)/N + d * sum
 *
 * Dangling pages only emit their zero self pair. Their rank is not spread
 * over the graph, so the table sum shrinks by d * (dangling mass) per round.
 */

use fnv::FnvHashMap;
use rayon::prelude::*;
use rayon::ThreadPool;

use std::iter;

use super::super::link_data::{JoinedPartition, PartitionedGraph};
use super::super::partition;
use super::super::rank_table::RankTable;
use crate::article::NodeId;
use crate::error::Result;

type Bucket = FnvHashMap<NodeId, f64>;

/// What one source partition hands to the shuffle
struct MapOutput {
    buckets:  Vec<Bucket>,  // one per destination partition
    dangling: f64,          // rank held by pages without links
    dropped:  f64,          // mass sent to pages outside the graph
}

/// Statistics about a single round
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IterationStats {
    pub iteration: usize,
    pub rank_sum: f64,
    pub dangling_mass: f64,
    pub dropped_mass: f64,
    pub max_change: f64,
}

/// The pairs a single page emits, before filtering
/// Always starts with the zero self pair so that a page nobody links to
/// still shows up in the next table.
pub fn contributions<'a>(id: &'a str, links: &'a [String], rank: f64)
    -> impl Iterator<Item=(&'a str, f64)> + 'a
{
    let mass = if links.is_empty() { 0.0 } else { rank / links.len() as f64 };
    iter::once((id, 0.0)).chain(links.iter().map(move |l| (l.as_str(), mass)))
}

/// Sum masses by target; order of the input does not matter beyond rounding
pub fn aggregate<I>(pairs: I) -> Bucket
    where I: IntoIterator<Item=(NodeId, f64)>
{
    let mut summed = Bucket::default();
    for (id, mass) in pairs {
        *summed.entry(id).or_insert(0.0) += mass;
    }
    summed
}

#[inline]
pub fn normalize(summed: f64, damping: f64, nodes: usize) -> f64 {
    (1.0 - damping) / nodes as f64 + damping * summed
}

fn map_partition(part: &JoinedPartition, graph: &PartitionedGraph) -> MapOutput {
    let mut out = MapOutput {
        buckets:  graph.partitioner().buckets(),
        dangling: 0.0,
        dropped:  0.0,
    };
    for (id, links, rank) in part.iter() {
        if links.is_empty() {
            out.dangling += rank;
        }
        for (target, mass) in contributions(id, links, rank) {
            match graph.locate(target) {
                Some((p, key)) => *out.buckets[p].entry(key.clone()).or_insert(0.0) += mass,
                None => out.dropped += mass,
            }
        }
    }
    out
}

fn reduce_partition(incoming: Vec<Bucket>, damping: f64, nodes: usize) -> Bucket {
    let mut summed = aggregate(incoming.into_iter().flat_map(|b| b.into_iter()));
    for rank in summed.values_mut() {
        *rank = normalize(*rank, damping, nodes);
    }
    summed
}

/// Compute RankTable(t+1) from RankTable(t)
/// `iteration` is the number of the round being computed, starting at 1.
pub fn iterate(graph: &PartitionedGraph,
               ranks: &RankTable,
               damping: f64,
               iteration: usize,
               pool: &ThreadPool) -> Result<(RankTable, IterationStats)>
{
    let joined = graph.join(ranks)?;
    let nodes = graph.node_count();
    let n = graph.partitioner().partitions();

    let mapped: Vec<MapOutput> = pool.install(|| {
        joined.par_iter().map(|part| map_partition(part, graph)).collect()
    });

    let mut dangling = 0f64;
    let mut dropped = 0f64;
    let mut outgoing = Vec::with_capacity(mapped.len());
    for m in mapped {
        dangling += m.dangling;
        dropped += m.dropped;
        outgoing.push(m.buckets);
    }
    let incoming = partition::shuffle(outgoing, n);

    let parts: Vec<Bucket> = pool.install(|| {
        incoming.into_par_iter().map(|b| reduce_partition(b, damping, nodes)).collect()
    });
    let next = RankTable::from_parts(graph.partitioner(), parts);
    debug_assert_eq!(next.len(), nodes, "Rank table lost or gained nodes");

    let stats = IterationStats {
        iteration,
        rank_sum:      next.sum(),
        dangling_mass: dangling,
        dropped_mass:  dropped,
        max_change:    ranks.max_change(&next),
    };
    Ok((next, stats))
}
