use fnv::FnvHashMap;

use super::link_data::PartitionedGraph;
use super::partition::Partitioner;
use crate::article::NodeId;

/// Node → rank for one iteration, split exactly like the graph it came from
pub struct RankTable {
    partitioner: Partitioner,
    parts: Vec<FnvHashMap<NodeId, f64>>,
}

impl RankTable {
    /// Every node starts at 1/N
    pub fn uniform(graph: &PartitionedGraph) -> Self {
        let guess = (graph.node_count() as f64).recip();
        let parts = graph.partitions().iter().map(|p| {
            p.keys().map(|id| (id.clone(), guess)).collect::<FnvHashMap<NodeId, f64>>()
        }).collect();
        RankTable { partitioner: graph.partitioner(), parts }
    }

    pub fn from_parts(partitioner: Partitioner, parts: Vec<FnvHashMap<NodeId, f64>>) -> Self {
        assert_eq!(partitioner.partitions(), parts.len(), "Rank table has the wrong number of partitions");
        RankTable { partitioner, parts }
    }

    pub fn partitioner(&self) -> Partitioner {
        self.partitioner
    }
    pub fn partitions(&self) -> &[FnvHashMap<NodeId, f64>] {
        &self.parts
    }
    pub fn len(&self) -> usize {
        self.parts.iter().map(|p| p.len()).sum()
    }
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
    pub fn get(&self, id: &str) -> Option<f64> {
        self.parts[self.partitioner.partition_of(id)].get(id).cloned()
    }
    pub fn iter(&self) -> impl Iterator<Item=(&NodeId, f64)> {
        self.parts.iter().flat_map(|p| p.iter().map(|(id, &r)| (id, r)))
    }
    pub fn sum(&self) -> f64 {
        self.iter().map(|(_, r)| r).sum()
    }

    /// Greatest absolute change of any node between `self` and `next`
    /// Nodes missing from `next` count as having dropped to zero.
    pub fn max_change(&self, next: &RankTable) -> f64 {
        self.iter().fold(0f64, |max_change, (id, rank)| {
            max_change.max((rank - next.get(id).unwrap_or(0.0)).abs())
        })
    }

    pub fn into_vec(self) -> Vec<(NodeId, f64)> {
        self.parts.into_iter().flat_map(|p| p.into_iter()).collect()
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::article::Page;

    fn graph(titles: &[&str]) -> PartitionedGraph {
        let pool = rayon::ThreadPoolBuilder::new().num_threads(1).build().unwrap();
        let pages: Vec<Page> = titles.iter().map(|t| Page::new(*t, vec![])).collect();
        PartitionedGraph::build(vec![pages], Partitioner::new(3), &pool).0
    }

    #[test]
    fn uniform_covers_graph() {
        let g = graph(&["A", "B", "C", "D"]);
        let t = RankTable::uniform(&g);
        assert_eq!(t.len(), 4);
        assert!((t.sum() - 1.0).abs() < 1e-12);
        for id in g.node_ids() {
            assert_eq!(t.get(id), Some(0.25));
        }
        assert_eq!(t.get("E"), None);
        assert_eq!(t.partitioner(), g.partitioner());
    }

    #[test]
    fn empty_graph_has_empty_table() {
        let t = RankTable::uniform(&graph(&[]));
        assert!(t.is_empty());
        assert_eq!(t.sum(), 0.0);
    }

    #[test]
    fn max_change_between_tables() {
        let g = graph(&["A", "B"]);
        let a = RankTable::uniform(&g);
        let p = g.partitioner();
        let mut parts: Vec<FnvHashMap<NodeId, f64>> = p.buckets();
        for (id, r) in a.iter() {
            let r = if &**id == "A" { r + 0.25 } else { r - 0.125 };
            parts[p.partition_of(id)].insert(id.clone(), r);
        }
        let b = RankTable::from_parts(p, parts);
        assert!((a.max_change(&b) - 0.25).abs() < 1e-12);
        assert_eq!(a.max_change(&a), 0.0);
    }
}
