//! Reachability of tables from the fact table.

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::Bfs;
use std::collections::{BTreeMap, BTreeSet};

/// Table names not reachable from `fact` along `from → to` edges.
/// Edges naming unknown tables are ignored.
pub fn unreachable_tables<'a>(
    tables: impl IntoIterator<Item = &'a str>,
    edges: impl IntoIterator<Item = (String, String)>,
    fact: &str,
) -> BTreeSet<String> {
    let mut graph: DiGraph<String, ()> = DiGraph::new();
    let mut index: BTreeMap<String, NodeIndex> = BTreeMap::new();
    for table in tables {
        index
            .entry(table.to_string())
            .or_insert_with(|| graph.add_node(table.to_string()));
    }
    for (from, to) in edges {
        if let (Some(&a), Some(&b)) = (index.get(&from), index.get(&to)) {
            graph.add_edge(a, b, ());
        }
    }

    let Some(&start) = index.get(fact) else {
        return BTreeSet::new();
    };
    let mut reached = BTreeSet::new();
    let mut bfs = Bfs::new(&graph, start);
    while let Some(node) = bfs.next(&graph) {
        reached.insert(node);
    }
    index
        .into_iter()
        .filter(|(_, node)| !reached.contains(node))
        .map(|(name, _)| name)
        .collect()
}
