//! Crate-wide constants.

/// Length of the truncated hex digest used to identify build nodes.
pub const OBJ_HASH_PREFIX_LEN: usize = 20;

/// Default build-output root, relative to the top of the tree.
pub const DEFAULT_OUT_DIR: &str = "out";

/// Directory under the output root holding per-module intermediates.
pub const INTERMEDIATES_DIR: &str = ".intermediates";

/// Separator placed between commands of one rule when they are joined into a
/// single shell invocation.
pub const COMMAND_SEPARATOR: &str = " && ";

/// Axis name of the image-placement mutation pass.
pub const IMAGE_AXIS: &str = "image";

/// Axis name of the instrumentation mutation pass.
pub const COVERAGE_AXIS: &str = "coverage";

/// Variation for modules installed to the normal system image.
pub const CORE_VARIATION: &str = "core";

/// Variation for modules installed to the restricted recovery image.
pub const RECOVERY_VARIATION: &str = "recovery";

/// Variation of the instrumented clone produced by the coverage pass.
pub const COVERAGE_VARIATION: &str = "cov";

/// Lowest numeric platform version that supports native coverage.
pub const MIN_COVERAGE_SDK_VERSION: i64 = 23;

/// Environment variable overriding the build-output root.
pub const ENV_OUT_DIR: &str = "MODGRAPH_OUT_DIR";

/// Environment variable overriding the worker-pool size.
pub const ENV_PARALLELISM: &str = "MODGRAPH_PARALLELISM";

/// Environment variable enabling native coverage (`1`/`true`, `0`/`false`).
pub const ENV_NATIVE_COVERAGE: &str = "MODGRAPH_NATIVE_COVERAGE";

/// Environment variable listing coverage path prefixes, comma separated.
pub const ENV_COVERAGE_PATHS: &str = "MODGRAPH_COVERAGE_PATHS";
