use modgraph_lib::graph::{Dependency, GraphError, ModuleDef, ModuleDefs, VariantGraph};
use modgraph_lib::mutate::{DefaultVariation, FnPolicy, MutateConfig, MutateError, MutationEngine};
use proptest::prelude::*;

use super::common::graph_of;

const AXIS: &str = "image";

/// Variation lists by kind; kinds past the end have no policy.
const LISTS: [&[&str]; 4] = [&["core"], &["core", "recovery"], &["recovery"], &["a", "b", "c"]];

fn engine(default_variation: Option<DefaultVariation>) -> MutationEngine {
  let mut engine = MutationEngine::new(MutateConfig {
    parallelism: 3,
    default_variation,
  });
  for (kind, list) in LISTS.iter().enumerate() {
    let list: &'static [&'static str] = *list;
    engine.register(
      AXIS,
      &format!("k{}", kind),
      FnPolicy::new(
        move |_ctx| list.iter().map(|v| v.to_string()).collect(),
        |ctx, variant| variant.mutated.in_recovery = ctx.variation() == "recovery",
      ),
    );
  }
  engine
}

/// Random DAGs: module `i` may only depend on modules declared before it.
fn dag_strategy() -> impl Strategy<Value = Vec<(usize, Vec<usize>)>> {
  (1usize..9).prop_flat_map(|n| {
    prop::collection::vec((0..LISTS.len() + 1, prop::collection::vec(any::<prop::sample::Index>(), 0..3)), n).prop_map(
      |modules| {
        modules
          .into_iter()
          .enumerate()
          .map(|(i, (kind, deps))| {
            let mut deps: Vec<usize> = if i == 0 { Vec::new() } else { deps.iter().map(|d| d.index(i)).collect() };
            deps.sort();
            deps.dedup();
            (kind, deps)
          })
          .collect()
      },
    )
  })
}

fn defs(modules: &[(usize, Vec<usize>)]) -> ModuleDefs {
  ModuleDefs::new(
    modules
      .iter()
      .enumerate()
      .map(|(i, (kind, deps))| {
        ModuleDef::new(format!("m{}", i), format!("k{}", kind))
          .with_deps(deps.iter().map(|d| Dependency::new(format!("m{}", d))))
      })
      .collect(),
  )
}

proptest! {
  #[test]
  fn every_module_gets_one_variant_per_variation(modules in dag_strategy()) {
    let defs = defs(&modules);
    let (graph, stats) = engine(None).run(VariantGraph::from_defs(&defs).unwrap()).unwrap();

    prop_assert_eq!(stats[0].total(), modules.len());

    for (i, (kind, deps)) in modules.iter().enumerate() {
      let name = format!("m{}", i);
      let expected = LISTS.get(*kind).map_or(1, |list| list.len());
      let variants = graph.variants_of(&name);
      prop_assert_eq!(variants.len(), expected);

      for &id in variants {
        let variant = &graph[id];
        // Every original edge resolves to exactly one variant of its target.
        prop_assert_eq!(variant.deps.len(), deps.len());
        for (dep, &target) in variant.deps.iter().zip(deps) {
          let resolved = graph.get(dep.target);
          prop_assert!(resolved.is_some());
          let resolved = &graph[dep.target];
          prop_assert_eq!(&resolved.module, &format!("m{}", target));

          // An exact match wins whenever the target has one.
          if let Some(wanted) = variant.variation(AXIS)
            && graph.variant(&resolved.module, wanted).is_some()
          {
            prop_assert_eq!(resolved.variation(AXIS), Some(wanted));
          }
        }
      }
    }
  }
}

#[test]
fn two_variant_split() {
  let graph = VariantGraph::from_defs(&ModuleDefs::new(vec![
    ModuleDef::new("lib", "k1"),
    ModuleDef::new("app", "k2").with_deps([Dependency::new("lib")]),
  ]))
  .unwrap();
  let (graph, _) = engine(None).run(graph).unwrap();

  assert_eq!(graph.variants_of("lib").len(), 2);
  let app = graph.variant("app", "recovery").unwrap();
  let lib = &graph[app.deps[0].target];
  assert_eq!(lib.name(), "recovery");
  assert_ne!(lib.name(), "core");
}

#[test]
fn single_variant_passthrough() {
  let graph = graph_of("k0", &[("a", &[]), ("b", &["a"])]);
  let before = graph.len();
  let (graph, stats) = engine(None).run(graph).unwrap();

  assert_eq!(graph.len(), before);
  assert_eq!(stats[0].passthrough, 2);
  assert_eq!(stats[0].split, 0);
  assert_eq!(graph.variant("b", "core").unwrap().deps[0].target, graph.variants_of("a")[0]);
}

#[test]
fn strict_mode_names_the_edge() {
  let graph = VariantGraph::from_defs(&ModuleDefs::new(vec![
    ModuleDef::new("lib", "k3"),
    ModuleDef::new("app", "k1").with_deps([Dependency::new("lib")]),
  ]))
  .unwrap();

  let err = engine(Some(DefaultVariation::Strict)).run(graph).unwrap_err();
  match err {
    MutateError::Graph(GraphError::NoMatchingVariant { from, to, .. }) => {
      assert_eq!(from, "app:core");
      assert_eq!(to, "lib");
    }
    other => panic!("expected NoMatchingVariant, got {}", other),
  }
}

#[test]
fn missing_dependency_is_a_graph_error() {
  let defs = ModuleDefs::new(vec![ModuleDef::new("app", "k0").with_deps([Dependency::new("nope")])]);
  assert!(matches!(
    VariantGraph::from_defs(&defs),
    Err(GraphError::MissingDependency { dependency, .. }) if dependency == "nope"
  ));
}
