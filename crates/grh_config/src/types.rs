//! Configuration types deserialized from `grh.toml`.

use serde::Deserialize;

/// The top-level project configuration parsed from `grh.toml`.
///
/// A convenience for repeated invocations: everything it expresses can also
/// be supplied as CLI flags, and flags always take precedence over the file.
#[derive(Debug, Deserialize)]
pub struct ProjectConfig {
    /// Core project metadata (name, top module).
    pub project: ProjectMeta,
    /// Pass pipeline configuration.
    #[serde(default)]
    pub passes: PassConfig,
    /// Output settings.
    #[serde(default)]
    pub output: OutputConfig,
}

/// Core project metadata required in every `grh.toml`.
#[derive(Debug, Deserialize)]
pub struct ProjectMeta {
    /// The project name.
    pub name: String,
    /// Path to the top-level SystemVerilog module's source file.
    pub top: String,
    /// A brief description of the project.
    #[serde(default)]
    pub description: String,
}

/// Configures which passes run and in what order.
///
/// `order` lists pass ids to run, in sequence; an empty list means "use the
/// built-in default order" (§4.8). `stop_on_error` controls whether the
/// `PassManager` halts at the first pass that fails or emits an
/// `Error`-severity diagnostic.
#[derive(Debug, Default, Deserialize)]
pub struct PassConfig {
    /// Explicit pass ids to run, in order. Empty means the built-in default.
    #[serde(default)]
    pub order: Vec<String>,
    /// Pass ids to skip even if present in `order` or the default pipeline.
    #[serde(default)]
    pub skip: Vec<String>,
    /// Whether to stop the pipeline at the first failing/erroring pass.
    #[serde(default = "default_stop_on_error")]
    pub stop_on_error: bool,
}

fn default_stop_on_error() -> bool {
    true
}

/// Output settings for the emitted SystemVerilog.
#[derive(Debug, Default, Deserialize)]
pub struct OutputConfig {
    /// Output directory for emitted `.sv` files; defaults to the working directory.
    #[serde(default)]
    pub dir: Option<String>,
    /// Whether to also write the JSON debug artifact (§6 attribute schema) alongside.
    #[serde(default)]
    pub dump_ast: bool,
}
