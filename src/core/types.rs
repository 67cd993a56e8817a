//! Recipe file schema and resolved-step types.
//!
//! Defines the YAML schema for settings, profiles, recipes, parameters, and
//! prerequisites, plus the types produced by resolution. Schema types derive
//! Serialize/Deserialize for YAML roundtripping and JsonSchema for `ladle schema`.

use indexmap::IndexMap;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

// ============================================================================
// Top-level ladle.yaml
// ============================================================================

/// Root of a recipe file.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct LadleFile {
    /// Schema version (must be "1.0")
    pub version: String,

    /// Project name
    pub name: String,

    /// Optional description
    #[serde(default)]
    pub description: Option<String>,

    /// Execution settings
    #[serde(default)]
    pub settings: Settings,

    /// Build profiles: profile name -> template variables
    #[serde(default)]
    pub profiles: IndexMap<String, IndexMap<String, String>>,

    /// Recipe declarations (order-preserving)
    pub recipes: IndexMap<String, Recipe>,
}

// ============================================================================
// Settings
// ============================================================================

/// How commands are run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Settings {
    /// Shell program and leading arguments; each command is appended last
    #[serde(default = "default_shell")]
    pub shell: Vec<String>,

    /// Echo each command to stderr before it runs
    #[serde(default = "default_true")]
    pub echo: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            shell: default_shell(),
            echo: true,
        }
    }
}

fn default_shell() -> Vec<String> {
    vec!["sh".to_string(), "-cu".to_string()]
}

fn default_true() -> bool {
    true
}

// ============================================================================
// Recipes
// ============================================================================

/// A named, parameterized sequence of commands with prerequisites.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct Recipe {
    /// One-line description shown by `ladle list`
    #[serde(default)]
    pub description: Option<String>,

    /// Parameters in declaration order (positional binding follows it)
    #[serde(default)]
    pub params: IndexMap<String, ParamDecl>,

    /// Recipes that must run before this recipe's body
    #[serde(default)]
    pub depends_on: Vec<Dependency>,

    /// Working directory, relative to the recipe file's directory
    #[serde(default)]
    pub working_dir: Option<String>,

    /// Body lines, executed in order
    #[serde(default)]
    pub run: Vec<BodyLine>,
}

impl Recipe {
    /// Name of the `profile`-typed parameter, if the recipe declares one.
    pub fn profile_param(&self) -> Option<&str> {
        self.params
            .iter()
            .find(|(_, decl)| decl.param_type == ParamType::Profile)
            .map(|(name, _)| name.as_str())
    }

    /// Render the parameter signature, e.g. `colours=''` or `target`.
    pub fn signature(&self) -> String {
        self.params
            .iter()
            .map(|(name, decl)| match decl.default_string() {
                Some(d) => format!("{}='{}'", name, d),
                None => name.clone(),
            })
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// A parameter declaration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct ParamDecl {
    #[serde(rename = "type", default)]
    pub param_type: ParamType,

    #[serde(default)]
    pub description: Option<String>,

    /// Default value; absent means the parameter is required
    #[serde(default)]
    #[schemars(with = "Option<serde_json::Value>")]
    pub default: Option<serde_yaml_ng::Value>,

    /// Allowed values for `enum` parameters
    #[serde(default)]
    pub choices: Vec<String>,
}

impl ParamDecl {
    /// The default rendered as a string.
    pub fn default_string(&self) -> Option<String> {
        self.default.as_ref().map(yaml_value_to_string)
    }
}

/// Parameter type.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ParamType {
    #[default]
    String,
    Enum,
    Profile,
}

impl fmt::Display for ParamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String => write!(f, "string"),
            Self::Enum => write!(f, "enum"),
            Self::Profile => write!(f, "profile"),
        }
    }
}

/// A prerequisite: bare recipe name, or a call with argument templates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum Dependency {
    Name(String),
    Call {
        recipe: String,
        #[serde(default)]
        with: IndexMap<String, String>,
    },
}

impl Dependency {
    pub fn recipe(&self) -> &str {
        match self {
            Self::Name(name) => name,
            Self::Call { recipe, .. } => recipe,
        }
    }

    /// Argument templates passed to the prerequisite.
    pub fn args(&self) -> Option<&IndexMap<String, String>> {
        match self {
            Self::Name(_) => None,
            Self::Call { with, .. } => Some(with),
        }
    }
}

/// One body line: a shell command template or a symlink step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum BodyLine {
    Command(String),
    Link { link: LinkSpec },
}

impl BodyLine {
    /// All template strings carried by this line.
    pub fn templates(&self) -> Vec<&str> {
        match self {
            Self::Command(cmd) => vec![cmd.as_str()],
            Self::Link { link } => vec![link.path.as_str(), link.target.as_str()],
        }
    }
}

/// Create or refresh `path` as a symlink pointing at `target`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct LinkSpec {
    pub path: String,
    pub target: String,
}

// ============================================================================
// Resolution output
// ============================================================================

/// A fully expanded step, ready to execute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedStep {
    /// Recipe the step belongs to
    pub recipe: String,

    pub action: StepAction,

    /// Directory the step runs in
    pub working_dir: PathBuf,
}

/// What a resolved step does.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StepAction {
    Shell(String),
    Link { path: String, target: String },
}

impl fmt::Display for StepAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Shell(cmd) => write!(f, "{}", cmd),
            Self::Link { path, target } => write!(f, "link {} -> {}", path, target),
        }
    }
}

/// Outcome of a successful run.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub steps_run: usize,
    pub duration: Duration,
}

/// Convert a YAML scalar to the string bound into templates.
pub fn yaml_value_to_string(val: &serde_yaml_ng::Value) -> String {
    match val {
        serde_yaml_ng::Value::String(s) => s.clone(),
        serde_yaml_ng::Value::Number(n) => n.to_string(),
        serde_yaml_ng::Value::Bool(b) => b.to_string(),
        serde_yaml_ng::Value::Null => String::new(),
        other => format!("{:?}", other),
    }
}

// ============================================================================
// Tests
// ============================================================================
