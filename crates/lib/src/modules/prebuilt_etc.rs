//! `prebuilt_etc`: copies a configuration file from the source tree and
//! installs it under `etc/` of the system or recovery image.

use std::sync::Arc;

use crate::consts::IMAGE_AXIS;
use crate::executor::Executor;
use crate::mutate::VariationPolicy;
use crate::mutate::image::ImagePlacementPolicy;
use crate::plan::PlanConfig;
use crate::rule::RuleBuilder;

use super::{ActionGenerator, ModuleContext, ModuleError};

const SYSTEM_PARTITION: &str = "system";
const RECOVERY_PARTITION: &str = "recovery/root/system";

#[derive(Debug, Clone, Copy, Default)]
pub struct PrebuiltEtc;

impl PrebuiltEtc {
  /// Installed file name: `filename`, else the base name of `src` when
  /// `filename_from_src`, else the module name.
  fn filename(ctx: &ModuleContext<'_>, src_base: &str) -> Result<String, ModuleError> {
    let props = &ctx.variant.props;
    match props.filename.as_deref().filter(|f| !f.is_empty()) {
      Some(_) if props.filename_from_src => Err(ModuleError::ConflictingProperties {
        module: ctx.module().to_string(),
        property: "filename_from_src",
        conflicts_with: "filename",
      }),
      Some(filename) => Ok(filename.to_string()),
      None if props.filename_from_src => Ok(src_base.to_string()),
      None => Ok(ctx.module().to_string()),
    }
  }

  fn install_path(ctx: &ModuleContext<'_>, filename: &str) -> String {
    let partition = if ctx.variant.mutated.in_recovery {
      RECOVERY_PARTITION
    } else {
      SYSTEM_PARTITION
    };
    match ctx.variant.props.sub_dir.as_deref().filter(|d| !d.is_empty()) {
      Some(sub_dir) => format!("{}/etc/{}/{}", partition, sub_dir, filename),
      None => format!("{}/etc/{}", partition, filename),
    }
  }
}

impl ActionGenerator for PrebuiltEtc {
  fn policies(&self, _config: &PlanConfig) -> Vec<(&'static str, Arc<dyn VariationPolicy>)> {
    let policy: Arc<dyn VariationPolicy> = Arc::new(ImagePlacementPolicy);
    vec![(IMAGE_AXIS, policy)]
  }

  fn generate(&self, ctx: &ModuleContext<'_>, executor: &mut dyn Executor) -> Result<(), ModuleError> {
    let src = ctx
      .variant
      .props
      .src
      .as_deref()
      .ok_or_else(|| ModuleError::MissingProperty {
        module: ctx.module().to_string(),
        property: "src",
      })?;
    let src = ctx.source(src)?;
    let filename = Self::filename(ctx, src.base())?;
    let out = ctx.module_out(&filename)?;

    let mut rule = RuleBuilder::new();
    rule.command().text("cp -f").input(&src).output(&out);

    if ctx.variant.installable() {
      let dest = ctx.install(&Self::install_path(ctx, &filename))?;
      rule.install(&out, &dest);
    }

    let label = ctx.variant.label();
    rule
      .build(&label, &format!("prebuilt_etc {}", label), executor)
      .map_err(|e| ctx.rule_error(e))?;
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::executor::BuildNode;
  use crate::graph::{ModuleDef, ModuleDefs, ModuleProps, VariantGraph};
  use crate::path::PathContext;

  fn generate(props: ModuleProps, tweak: impl FnOnce(&mut crate::graph::Variant)) -> Result<Vec<BuildNode>, ModuleError> {
    let defs = ModuleDefs::new(vec![ModuleDef::new("foo.conf", "prebuilt_etc").in_dir("vendor/foo").with_props(props)]);
    let graph = VariantGraph::from_defs(&defs).unwrap();
    let mut variant = graph.variants()[0].clone();
    tweak(&mut variant);

    let paths = PathContext::default();
    let ctx = ModuleContext {
      variant: &variant,
      graph: &graph,
      paths: &paths,
    };
    let mut staged: Vec<BuildNode> = Vec::new();
    PrebuiltEtc.generate(&ctx, &mut staged)?;
    Ok(staged)
  }

  fn src(src: &str) -> ModuleProps {
    ModuleProps {
      src: Some(src.to_string()),
      ..Default::default()
    }
  }

  #[test]
  fn copies_and_installs_to_system() {
    let nodes = generate(src("foo.conf"), |_| {}).unwrap();

    assert_eq!(nodes.len(), 1);
    let node = &nodes[0];
    assert_eq!(node.command, "cp -f vendor/foo/foo.conf out/.intermediates/foo.conf/foo.conf");
    assert_eq!(node.inputs, vec!["vendor/foo/foo.conf"]);
    assert_eq!(node.outputs, vec!["out/.intermediates/foo.conf/foo.conf"]);
    assert_eq!(
      node.installs.to_string(),
      "out/.intermediates/foo.conf/foo.conf:/system/etc/foo.conf"
    );
  }

  #[test]
  fn recovery_variant_installs_to_recovery_root() {
    let nodes = generate(
      ModuleProps {
        sub_dir: Some("init".to_string()),
        ..src("foo.conf")
      },
      |v| v.mutated.in_recovery = true,
    )
    .unwrap();

    let pairs: Vec<String> = nodes[0].installs.iter().map(|p| p.to.to_string()).collect();
    assert_eq!(pairs, vec!["/recovery/root/system/etc/init/foo.conf"]);
  }

  #[test]
  fn filename_overrides_module_name() {
    let nodes = generate(
      ModuleProps {
        filename: Some("bar.xml".to_string()),
        ..src("foo.conf")
      },
      |_| {},
    )
    .unwrap();
    assert_eq!(nodes[0].outputs, vec!["out/.intermediates/foo.conf/bar.xml"]);
  }

  #[test]
  fn filename_from_src_uses_source_base() {
    let nodes = generate(
      ModuleProps {
        filename_from_src: true,
        ..src("data/real.conf")
      },
      |_| {},
    )
    .unwrap();
    assert_eq!(nodes[0].outputs, vec!["out/.intermediates/foo.conf/real.conf"]);
  }

  #[test]
  fn filename_and_filename_from_src_conflict() {
    let result = generate(
      ModuleProps {
        filename: Some("bar".to_string()),
        filename_from_src: true,
        ..src("foo.conf")
      },
      |_| {},
    );
    assert!(matches!(
      result,
      Err(ModuleError::ConflictingProperties {
        property: "filename_from_src",
        ..
      })
    ));
  }

  #[test]
  fn missing_src_is_an_error() {
    let result = generate(ModuleProps::default(), |_| {});
    assert!(matches!(result, Err(ModuleError::MissingProperty { property: "src", .. })));
  }

  #[test]
  fn not_installable_has_no_installs() {
    let nodes = generate(
      ModuleProps {
        installable: Some(false),
        ..src("foo.conf")
      },
      |_| {},
    )
    .unwrap();
    assert!(nodes[0].installs.is_empty());

    let nodes = generate(src("foo.conf"), |v| v.mutated.prevent_install = true).unwrap();
    assert!(nodes[0].installs.is_empty());
  }

  #[test]
  fn variant_key_is_part_of_output_path() {
    let nodes = generate(src("foo.conf"), |v| {
      v.variations.push(crate::graph::Variation {
        axis: "image".to_string(),
        value: "recovery".to_string(),
      })
    })
    .unwrap();
    assert_eq!(nodes[0].name, "foo.conf:recovery");
    assert_eq!(nodes[0].outputs, vec!["out/.intermediates/foo.conf/recovery/foo.conf"]);
  }
}
