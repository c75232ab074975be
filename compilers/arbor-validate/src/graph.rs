use std::collections::{HashMap, HashSet};

use arbor_graph::{Sentence, TokenRef};
use petgraph::algo::tarjan_scc;
use petgraph::graph::{Graph, NodeIndex};
use petgraph::visit::{Dfs, EdgeRef};
use petgraph::Directed;

/// Basic (primary) dependency tree of a sentence, edges pointing head -> dependent.
pub struct DependencyGraph {
    graph: Graph<TokenRef, Option<String>, Directed>,
    index_map: HashMap<TokenRef, NodeIndex>,
    root: NodeIndex,
}

impl DependencyGraph {
    pub fn from_sentence(sentence: &Sentence) -> Self {
        let mut graph = Graph::new();
        let mut index_map = HashMap::new();

        let root = graph.add_node(sentence.root());
        index_map.insert(sentence.root(), root);
        for token in sentence.tokens() {
            index_map.entry(token).or_insert_with(|| graph.add_node(token));
        }

        for token in sentence.tokens() {
            let Some(head) = sentence.primary_head(token) else {
                continue;
            };
            let (Some(&from), Some(&to)) = (index_map.get(&head.token), index_map.get(&token)) else {
                continue;
            };
            graph.add_edge(from, to, head.deprel);
        }

        Self { graph, index_map, root }
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Groups of tokens that head each other in a loop.
    pub fn cycles(&self) -> Vec<Vec<TokenRef>> {
        tarjan_scc(&self.graph)
            .into_iter()
            .filter(|component| component.len() > 1)
            .map(|component| component.into_iter().map(|idx| self.graph[idx]).collect())
            .collect()
    }

    /// `(dependent, head)` pairs of every edge lying on a cycle.
    pub fn cycle_edges(&self) -> HashSet<(TokenRef, TokenRef)> {
        let mut edges = HashSet::new();
        for component in tarjan_scc(&self.graph) {
            if component.len() < 2 {
                continue;
            }
            for &idx in &component {
                for edge in self.graph.edges(idx) {
                    if component.contains(&edge.target()) {
                        edges.insert((self.graph[edge.target()], self.graph[idx]));
                    }
                }
            }
        }
        edges
    }

    /// Whether `token` hangs off the root through primary heads.
    pub fn reaches_root(&self, token: TokenRef) -> bool {
        let Some(&target) = self.index_map.get(&token) else {
            return false;
        };
        let mut dfs = Dfs::new(&self.graph, self.root);
        while let Some(idx) = dfs.next(&self.graph) {
            if idx == target {
                return true;
            }
        }
        false
    }
}
