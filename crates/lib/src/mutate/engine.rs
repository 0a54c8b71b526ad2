use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};
use tracing::{debug, error, info, trace, warn};

use crate::graph::{GraphError, ModuleDag, Variant, VariantGraph, VariantId, Variation};

use super::policy::{PatchContext, PolicyContext, VariationPolicy};
use super::types::{DefaultVariation, MutateConfig, MutateError, MutationStats};

/// Policies registered for one axis, keyed by module kind.
struct Axis {
  name: String,
  policies: HashMap<String, Arc<dyn VariationPolicy>>,
}

enum Outcome {
  Split,
  Passthrough,
  Untouched,
}

/// The clones produced for one variant of the input graph.
///
/// `picks[i][j]` is the clone index chosen for edge `j` of clone `i`; edge
/// targets still hold input-graph ids until renumbering.
struct Mutated {
  outcome: Outcome,
  clones: Vec<Variant>,
  picks: Vec<Vec<usize>>,
  fallbacks: Vec<Fallback>,
}

/// An edge whose depender wanted a value the target does not have.
///
/// Recorded on the worker and logged by the pass so that warnings come out
/// in declaration order.
struct Fallback {
  from: String,
  to: String,
  wanted: String,
  chosen: String,
}

/// Runs one mutation pass per registered axis.
///
/// Passes run in the order their axes were first registered. Each pass
/// consumes a graph and produces a new one; nothing outside the engine ever
/// sees a half-mutated graph.
pub struct MutationEngine {
  config: MutateConfig,
  axes: Vec<Axis>,
}

impl MutationEngine {
  pub fn new(config: MutateConfig) -> Self {
    Self {
      config,
      axes: Vec::new(),
    }
  }

  /// Register `policy` for modules of `kind` on `axis`.
  pub fn register(&mut self, axis: &str, kind: &str, policy: impl VariationPolicy + 'static) -> &mut Self {
    self.register_shared(axis, kind, Arc::new(policy))
  }

  /// Register one policy instance for several kinds.
  pub fn register_shared(&mut self, axis: &str, kind: &str, policy: Arc<dyn VariationPolicy>) -> &mut Self {
    let idx = self.axis_index(axis);
    if self.axes[idx].policies.insert(kind.to_string(), policy).is_some() {
      debug!(axis, kind, "replaced mutation policy");
    }
    self
  }

  /// Fix the pass position of `axis` before any policy is registered on it.
  pub fn declare_axis(&mut self, axis: &str) -> &mut Self {
    self.axis_index(axis);
    self
  }

  fn axis_index(&mut self, axis: &str) -> usize {
    match self.axes.iter().position(|a| a.name == axis) {
      Some(idx) => idx,
      None => {
        self.axes.push(Axis {
          name: axis.to_string(),
          policies: HashMap::new(),
        });
        self.axes.len() - 1
      }
    }
  }

  /// Axis names in pass order.
  pub fn axes(&self) -> impl Iterator<Item = &str> {
    self.axes.iter().map(|a| a.name.as_str())
  }

  /// Run every pass over `graph`.
  ///
  /// # Errors
  ///
  /// Returns the first failure in declaration order of the first wave that
  /// fails. No partial graph is returned.
  pub fn run(&self, graph: VariantGraph) -> Result<(VariantGraph, Vec<MutationStats>), MutateError> {
    let pool = ThreadPoolBuilder::new()
      .num_threads(self.config.parallelism)
      .thread_name(|idx| format!("modgraph-mutate-{}", idx))
      .build()?;

    let mut graph = graph;
    let mut stats = Vec::with_capacity(self.axes.len());

    for axis in &self.axes {
      let (next, pass) = self.run_axis(&pool, axis, graph)?;
      info!(
        axis = %axis.name,
        split = pass.split,
        passthrough = pass.passthrough,
        untouched = pass.untouched,
        variants = next.len(),
        "mutation pass complete"
      );
      graph = next;
      stats.push(pass);
    }

    Ok((graph, stats))
  }

  fn run_axis(
    &self,
    pool: &ThreadPool,
    axis: &Axis,
    graph: VariantGraph,
  ) -> Result<(VariantGraph, MutationStats), MutateError> {
    let dag = ModuleDag::from_variants(&graph)?;
    let waves = dag.waves();

    let mut finished: Vec<Option<Vec<Variant>>> = vec![None; graph.len()];
    let mut picks: Vec<Vec<Vec<usize>>> = vec![Vec::new(); graph.len()];
    let mut stats = MutationStats {
      axis: axis.name.clone(),
      ..Default::default()
    };

    for (wave_idx, wave) in waves.iter().enumerate() {
      debug!(axis = %axis.name, wave = wave_idx, variants = wave.len(), "mutating wave");

      // Lowest failed position in the wave; later positions are skipped.
      let failed = AtomicUsize::new(usize::MAX);
      let results: Vec<Option<Result<Mutated, MutateError>>> = pool.install(|| {
        wave
          .par_iter()
          .enumerate()
          .map(|(pos, &id)| {
            if failed.load(Ordering::Acquire) < pos {
              return None;
            }
            let result = self.mutate_variant(axis, &graph, &finished, id);
            if result.is_err() {
              failed.fetch_min(pos, Ordering::AcqRel);
            }
            Some(result)
          })
          .collect()
      });

      for (&id, result) in wave.iter().zip(results) {
        match result {
          Some(Ok(mutated)) => {
            for fallback in &mutated.fallbacks {
              warn!(
                axis = %axis.name,
                from = %fallback.from,
                to = %fallback.to,
                wanted = %fallback.wanted,
                chosen = %fallback.chosen,
                "no matching variant, falling back to default"
              );
            }
            match mutated.outcome {
              Outcome::Split => stats.split += 1,
              Outcome::Passthrough => stats.passthrough += 1,
              Outcome::Untouched => stats.untouched += 1,
            }
            finished[id.0] = Some(mutated.clones);
            picks[id.0] = mutated.picks;
          }
          Some(Err(e)) => {
            error!(axis = %axis.name, module = %graph[id].module, error = %e, "mutation wave aborted");
            return Err(e);
          }
          None => {}
        }
      }
    }

    Ok((renumber(finished, picks), stats))
  }

  fn mutate_variant(
    &self,
    axis: &Axis,
    graph: &VariantGraph,
    finished: &[Option<Vec<Variant>>],
    id: VariantId,
  ) -> Result<Mutated, MutateError> {
    let variant = &graph[id];

    let mut fallbacks = Vec::new();

    let Some(policy) = axis.policies.get(&variant.kind) else {
      let picks = self.resolve_edges(axis, graph, finished, variant, None, &mut fallbacks)?;
      return Ok(Mutated {
        outcome: Outcome::Untouched,
        clones: vec![variant.clone()],
        picks: vec![picks],
        fallbacks,
      });
    };

    let ctx = PolicyContext {
      axis: &axis.name,
      variant,
      dependencies: variant
        .deps
        .iter()
        .map(|dep| (&dep.tag, finished[dep.target.0].as_deref().unwrap_or(&[])))
        .collect(),
    };
    let variations = policy.variations(&ctx);
    validate(&axis.name, &variant.module, &variations)?;

    let mut clones = Vec::with_capacity(variations.len());
    let mut picks = Vec::with_capacity(variations.len());
    for value in &variations {
      let mut clone = variant.clone();
      clone.variations.push(Variation {
        axis: axis.name.clone(),
        value: value.clone(),
      });
      policy.patch(
        &PatchContext {
          axis: &axis.name,
          variation: value,
          variations: &variations,
        },
        &mut clone,
      );
      picks.push(self.resolve_edges(axis, graph, finished, &clone, Some(value), &mut fallbacks)?);
      clones.push(clone);
    }

    trace!(axis = %axis.name, module = %variant.module, ?variations, "variant mutated");

    Ok(Mutated {
      outcome: if clones.len() > 1 {
        Outcome::Split
      } else {
        Outcome::Passthrough
      },
      clones,
      picks,
      fallbacks,
    })
  }

  fn resolve_edges(
    &self,
    axis: &Axis,
    graph: &VariantGraph,
    finished: &[Option<Vec<Variant>>],
    depender: &Variant,
    wanted: Option<&str>,
    fallbacks: &mut Vec<Fallback>,
  ) -> Result<Vec<usize>, MutateError> {
    depender
      .deps
      .iter()
      .map(|dep| {
        let candidates = finished[dep.target.0].as_deref().unwrap_or(&[]);
        self.pick(axis, &graph[dep.target], candidates, depender, wanted, fallbacks)
      })
      .collect()
  }

  /// Choose the clone of `target` an edge from `depender` resolves to.
  fn pick(
    &self,
    axis: &Axis,
    target: &Variant,
    candidates: &[Variant],
    depender: &Variant,
    wanted: Option<&str>,
    fallbacks: &mut Vec<Fallback>,
  ) -> Result<usize, MutateError> {
    if let Some(wanted) = wanted
      && let Some(idx) = candidates.iter().position(|c| c.variation(&axis.name) == Some(wanted))
    {
      return Ok(idx);
    }

    // Targets without a policy on this axis keep their single variant.
    if candidates.iter().all(|c| c.variation(&axis.name).is_none()) {
      return Ok(0);
    }

    let default = self
      .config
      .default_variation
      .clone()
      .or_else(|| axis.policies.get(&target.kind).map(|p| p.default_variation()))
      .unwrap_or_default();

    let idx = match &default {
      DefaultVariation::First => Some(0),
      DefaultVariation::Named(name) => candidates
        .iter()
        .position(|c| c.variation(&axis.name) == Some(name.as_str())),
      DefaultVariation::Strict => None,
    };

    match idx {
      Some(idx) => {
        let chosen = candidates[idx].variation(&axis.name).unwrap_or_default();
        match wanted {
          Some(wanted) => fallbacks.push(Fallback {
            from: depender.label(),
            to: target.module.clone(),
            wanted: wanted.to_string(),
            chosen: chosen.to_string(),
          }),
          None => trace!(axis = %axis.name, from = %depender.label(), to = %target.module, chosen, "default variant"),
        }
        Ok(idx)
      }
      None => Err(
        GraphError::NoMatchingVariant {
          from: depender.label(),
          to: target.module.clone(),
          axis: axis.name.clone(),
          wanted: wanted.map(str::to_string),
        }
        .into(),
      ),
    }
  }
}

fn validate(axis: &str, module: &str, variations: &[String]) -> Result<(), MutateError> {
  if variations.is_empty() {
    return Err(MutateError::EmptyVariations {
      axis: axis.to_string(),
      module: module.to_string(),
    });
  }

  for (idx, value) in variations.iter().enumerate() {
    if variations[..idx].contains(value) {
      return Err(MutateError::DuplicateVariation {
        axis: axis.to_string(),
        module: module.to_string(),
        variation: value.clone(),
      });
    }
  }

  Ok(())
}

/// Assign final ids in input order and map every edge to its chosen clone.
fn renumber(finished: Vec<Option<Vec<Variant>>>, picks: Vec<Vec<Vec<usize>>>) -> VariantGraph {
  let mut offsets = Vec::with_capacity(finished.len());
  let mut next = 0;
  for clones in &finished {
    offsets.push(next);
    next += clones.as_ref().map_or(0, Vec::len);
  }

  let mut variants = Vec::with_capacity(next);
  for (clones, picks) in finished.into_iter().zip(picks) {
    for (mut variant, picks) in clones.into_iter().flatten().zip(picks) {
      variant.id = VariantId(variants.len());
      for (dep, pick) in variant.deps.iter_mut().zip(picks) {
        dep.target = VariantId(offsets[dep.target.0] + pick);
      }
      variants.push(variant);
    }
  }

  VariantGraph::from_variants(variants)
}
