//! Dependency DAG over variants.
//!
//! Provides cycle detection and the bottom-up waves the mutation engine
//! processes: every variant in a wave has all of its dependencies in earlier
//! waves, so variants within one wave can be handled in parallel.

use std::collections::{HashMap, HashSet};

use petgraph::Direction;
use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};

use super::types::GraphError;
use super::variant::{VariantGraph, VariantId};

/// A DAG with one node per variant and an edge from each dependency to its
/// dependent.
pub struct ModuleDag {
  graph: DiGraph<VariantId, ()>,
  nodes: HashMap<VariantId, NodeIndex>,
}

impl ModuleDag {
  /// Build the DAG for a variant graph.
  ///
  /// # Errors
  ///
  /// Returns [`GraphError::Cycle`] naming a module on the cycle.
  pub fn from_variants(variants: &VariantGraph) -> Result<Self, GraphError> {
    let mut graph = DiGraph::with_capacity(variants.len(), 0);
    let mut nodes = HashMap::with_capacity(variants.len());

    for variant in variants.variants() {
      nodes.insert(variant.id, graph.add_node(variant.id));
    }

    for variant in variants.variants() {
      let dependent = nodes[&variant.id];
      for dep in &variant.deps {
        if let Some(&dependency) = nodes.get(&dep.target) {
          graph.add_edge(dependency, dependent, ());
        }
      }
    }

    let dag = Self { graph, nodes };
    dag.verify_acyclic(variants)?;
    Ok(dag)
  }

  fn verify_acyclic(&self, variants: &VariantGraph) -> Result<(), GraphError> {
    toposort(&self.graph, None).map_err(|cycle| GraphError::Cycle {
      module: variants[self.graph[cycle.node_id()]].module.clone(),
    })?;
    Ok(())
  }

  /// Variants grouped into dependency levels.
  ///
  /// Wave `n` holds the variants whose longest dependency chain has length
  /// `n`. Each wave is sorted by id, which follows declaration order.
  pub fn waves(&self) -> Vec<Vec<VariantId>> {
    let mut in_degree: HashMap<NodeIndex, usize> = self
      .graph
      .node_indices()
      .map(|idx| (idx, self.graph.neighbors_directed(idx, Direction::Incoming).count()))
      .collect();

    let mut remaining: HashSet<NodeIndex> = self.graph.node_indices().collect();
    let mut waves = Vec::new();

    while !remaining.is_empty() {
      let ready: Vec<NodeIndex> = remaining.iter().filter(|&&idx| in_degree[&idx] == 0).copied().collect();

      // Unreachable after verify_acyclic; bail out rather than spin.
      if ready.is_empty() {
        break;
      }

      for &idx in &ready {
        remaining.remove(&idx);
        for dependent in self.graph.neighbors_directed(idx, Direction::Outgoing) {
          if let Some(deg) = in_degree.get_mut(&dependent) {
            *deg = deg.saturating_sub(1);
          }
        }
      }

      let mut wave: Vec<VariantId> = ready.into_iter().map(|idx| self.graph[idx]).collect();
      wave.sort();
      waves.push(wave);
    }

    waves
  }

  /// All variants, dependencies before dependents.
  pub fn topological(&self) -> Vec<VariantId> {
    self.waves().into_iter().flatten().collect()
  }

  /// Direct dependencies of a variant, sorted.
  pub fn dependencies(&self, id: VariantId) -> Vec<VariantId> {
    let Some(&idx) = self.nodes.get(&id) else {
      return Vec::new();
    };

    let mut deps: Vec<VariantId> = self
      .graph
      .neighbors_directed(idx, Direction::Incoming)
      .map(|dep| self.graph[dep])
      .collect();
    deps.sort();
    deps.dedup();
    deps
  }

  pub fn len(&self) -> usize {
    self.graph.node_count()
  }

  pub fn is_empty(&self) -> bool {
    self.graph.node_count() == 0
  }
}
