use fnv::FnvHashMap;
use rayon::prelude::*;
use rayon::ThreadPool;
use slog::Logger;

use std::path::Path;
use std::sync::Arc;

use super::parse::{self, LoadStats};
use super::partition::{self, Partitioner};
use super::rank_table::RankTable;
use super::{LinkState, LinkData, build_pool};
use crate::article::{NodeId, Page};
use crate::config::RankConfig;
use crate::error::{RankError, Result};

type Partition = FnvHashMap<NodeId, Vec<String>>;

/// The link graph, split by title hash
/// Built once per run and only ever read afterwards, so any number of
/// workers can borrow it at the same time. The set of keys is the universe
/// of nodes that get ranks.
pub struct PartitionedGraph {
    partitioner: Partitioner,
    parts: Vec<Partition>,
    size: usize,
}

/// One graph partition joined with the matching rank table partition
pub struct JoinedPartition<'a> {
    links: &'a Partition,
    ranks: &'a FnvHashMap<NodeId, f64>,
}

impl<'a> JoinedPartition<'a> {
    /// `(node, outgoing links, rank)` for every node present on both sides
    pub fn iter(&self) -> impl Iterator<Item=(&'a NodeId, &'a [String], f64)> + 'a {
        let (links, ranks) = (self.links, self.ranks);
        links.iter().filter_map(move |(id, links)| {
            ranks.get(id).map(|&r| (id, links.as_slice(), r))
        })
    }
    pub fn len(&self) -> usize {
        self.links.len()
    }
    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }
}

impl PartitionedGraph {
    /// Shuffle parsed chunks into partitions
    /// The first record with a given title wins, where "first" follows chunk
    /// order and then record order. Returns the graph and the number of
    /// records dropped as duplicates.
    pub fn build(chunks: Vec<Vec<Page>>, partitioner: Partitioner, pool: &ThreadPool)
        -> (Self, usize)
    {
        let n = partitioner.partitions();
        let outgoing: Vec<Vec<Vec<Page>>> = pool.install(|| {
            chunks.into_par_iter().map(|chunk| {
                let mut buckets: Vec<Vec<Page>> = partitioner.buckets();
                for page in chunk {
                    buckets[partitioner.partition_of(&page.title)].push(page);
                }
                buckets
            }).collect()
        });
        let incoming = partition::shuffle(outgoing, n);

        let built: Vec<(Partition, usize)> = pool.install(|| {
            incoming.into_par_iter().map(|buckets| {
                let mut part = Partition::default();
                let mut duplicates = 0usize;
                for page in buckets.into_iter().flatten() {
                    if part.contains_key(page.title.as_str()) {
                        duplicates += 1;
                    } else {
                        part.insert(Arc::from(page.title), page.links);
                    }
                }
                (part, duplicates)
            }).collect()
        });

        let duplicates = built.iter().map(|&(_, d)| d).sum();
        let parts: Vec<Partition> = built.into_iter().map(|(p, _)| p).collect();
        let size = parts.iter().map(|p| p.len()).sum();
        (PartitionedGraph { partitioner, parts, size }, duplicates)
    }

    pub fn node_count(&self) -> usize {
        self.size
    }
    pub fn is_empty(&self) -> bool {
        self.size == 0
    }
    pub fn partitioner(&self) -> Partitioner {
        self.partitioner
    }
    pub fn partitions(&self) -> &[Partition] {
        &self.parts
    }
    /// Every node in the graph, partition by partition
    pub fn node_ids(&self) -> impl Iterator<Item=&NodeId> {
        self.parts.iter().flat_map(|p| p.keys())
    }
    pub fn contains(&self, id: &str) -> bool {
        self.resolve(id).is_some()
    }
    /// The canonical id for `id`, if it belongs to the graph
    pub fn resolve(&self, id: &str) -> Option<&NodeId> {
        self.locate(id).map(|(_, k)| k)
    }
    /// Partition index and canonical id of `id`, if it belongs to the graph
    pub fn locate(&self, id: &str) -> Option<(usize, &NodeId)> {
        let p = self.partitioner.partition_of(id);
        self.parts[p].get_key_value(id).map(|(k, _)| (p, k))
    }
    pub fn links(&self, id: &str) -> Option<&[String]> {
        let p = self.partitioner.partition_of(id);
        self.parts[p].get(id).map(|l| l.as_slice())
    }
    pub fn total_links(&self) -> usize {
        self.parts.iter().flat_map(|p| p.values()).map(|l| l.len()).sum()
    }

    /// Pair every graph partition with the same partition of `ranks`
    /// Only valid when both were split by the same partitioner; no record
    /// crosses a partition boundary.
    pub fn join<'a>(&'a self, ranks: &'a RankTable) -> Result<Vec<JoinedPartition<'a>>> {
        if ranks.partitioner() != self.partitioner {
            return Err(RankError::Partitioning {
                graph: self.partitioner.partitions(),
                table: ranks.partitioner().partitions(),
            });
        }
        Ok(self.parts.iter()
           .zip(ranks.partitions())
           .map(|(links, ranks)| JoinedPartition { links, ranks })
           .collect())
    }
}


impl LinkState<LinkData> {
    /// Parse `input` and build the partitioned graph
    pub fn load(input: &Path, config: RankConfig, log: Logger) -> Result<Self> {
        config.validate()?;
        let pool = build_pool(config.threads)?;
        let load_log = log.new(o!(
                "input" => format!("{}", input.display()),
                "scope" => config.scope.to_string(),
                "chunks" => config.input_partitions));
        let (chunks, stats) = parse::load_pages(
            input, config.scope, config.input_partitions, &pool, &load_log)?;
        Ok(Self::assemble(chunks, stats, config, pool, log))
    }

    /// Build straight from pages that are already in memory
    pub fn from_pages(pages: Vec<Page>, config: RankConfig, log: Logger) -> Result<Self> {
        config.validate()?;
        let pool = build_pool(config.threads)?;
        let stats = LoadStats {
            records: pages.len(),
            links: pages.iter().map(|p| p.links.len()).sum(),
            ..LoadStats::default()
        };
        Ok(Self::assemble(vec![pages], stats, config, pool, log))
    }

    fn assemble(chunks: Vec<Vec<Page>>,
                mut stats: LoadStats,
                config: RankConfig,
                pool: ThreadPool,
                log: Logger) -> Self
    {
        let partitioner = Partitioner::new(config.partitions);
        let (graph, duplicates) = PartitionedGraph::build(chunks, partitioner, &pool);
        stats.duplicates = duplicates;
        if duplicates > 0 {
            warn!(log, "Dropped {} records whose title was already taken", duplicates);
        }
        info!(log, "Built link graph";
              "nodes" => graph.node_count(),
              "links" => graph.total_links(),
              "partitions" => partitioner.partitions());
        LinkState {
            threads: pool.current_num_threads(),
            size:    graph.node_count(),
            log:     log,
            pool:    pool,
            config:  config,
            state:   LinkData { graph, stats },
        }
    }

    pub fn graph(&self) -> &PartitionedGraph {
        &self.state.graph
    }
    pub fn load_stats(&self) -> LoadStats {
        self.state.stats
    }
    pub fn into_graph(self) -> PartitionedGraph {
        self.state.graph
    }
}
