//! Invocation resolution: argument binding and prerequisite expansion.
//!
//! Turns a recipe name plus parameter overrides into the ordered list of
//! steps to execute. Prerequisites are expanded depth-first, left to right as
//! declared; a recipe already resolved with the same bindings in this
//! invocation is skipped. Every error surfaces here, before any step runs.

use super::graph::RecipeGraph;
use super::template::{self, Scope};
use super::types::*;
use crate::error::{Error, Result};
use indexmap::IndexMap;
use std::collections::HashSet;
use std::path::PathBuf;
use tracing::debug;

/// Parameter overrides for one invocation, keyed by parameter name.
pub type Overrides = IndexMap<String, String>;

/// Final parameter values for one recipe, plus its selected profile.
#[derive(Debug, Clone)]
pub struct Bindings<'a> {
    pub params: IndexMap<String, String>,
    pub profile: Option<&'a IndexMap<String, String>>,
}

impl<'a> Bindings<'a> {
    fn scope(&self) -> Scope<'_> {
        Scope {
            params: &self.params,
            profile: self.profile,
        }
    }
}

/// Map command-line arguments onto a recipe's parameters.
///
/// `name=value` binds by name when `name` is a declared parameter. Any other
/// argument (including `--color=always`) binds positionally to the next
/// parameter, in declaration order, that was not named explicitly.
pub fn parse_args(recipe_name: &str, recipe: &Recipe, args: &[String]) -> Result<Overrides> {
    let mut named = Overrides::new();
    let mut positional = Vec::new();

    for arg in args {
        match arg.split_once('=') {
            Some((key, value)) if recipe.params.contains_key(key) => {
                named.insert(key.to_string(), value.to_string());
            }
            _ => positional.push(arg.clone()),
        }
    }

    let free: Vec<&String> = recipe
        .params
        .keys()
        .filter(|name| !named.contains_key(*name))
        .collect();
    if positional.len() > free.len() {
        return Err(Error::TooManyArguments {
            recipe: recipe_name.to_string(),
            max: recipe.params.len(),
            given: args.len(),
        });
    }

    let mut overrides = Overrides::new();
    for name in recipe.params.keys() {
        if let Some(value) = named.shift_remove(name) {
            overrides.insert(name.clone(), value);
        }
    }
    for (name, value) in free.into_iter().zip(positional) {
        overrides.insert(name.clone(), value);
    }
    Ok(overrides)
}

/// Bind overrides and defaults for a recipe, validating enum choices and
/// profile names.
pub fn bind<'a>(
    file: &'a LadleFile,
    recipe_name: &str,
    recipe: &Recipe,
    overrides: &Overrides,
) -> Result<Bindings<'a>> {
    if let Some(unknown) = overrides.keys().find(|k| !recipe.params.contains_key(*k)) {
        return Err(Error::UnknownParameter {
            recipe: recipe_name.to_string(),
            param: unknown.clone(),
        });
    }

    let mut params = IndexMap::new();
    let mut profile = None;

    for (name, decl) in &recipe.params {
        let value = overrides
            .get(name)
            .cloned()
            .or_else(|| decl.default_string())
            .ok_or_else(|| Error::UnboundParameter {
                recipe: recipe_name.to_string(),
                param: name.clone(),
            })?;

        match decl.param_type {
            ParamType::String => {}
            ParamType::Enum => {
                if !decl.choices.contains(&value) {
                    return Err(Error::InvalidChoice {
                        recipe: recipe_name.to_string(),
                        param: name.clone(),
                        value,
                        choices: decl.choices.clone(),
                    });
                }
            }
            ParamType::Profile => {
                let vars = file.profiles.get(&value).ok_or_else(|| Error::UnknownProfile {
                    profile: value.clone(),
                    available: file.profiles.keys().cloned().collect(),
                })?;
                profile = Some(vars);
            }
        }

        params.insert(name.clone(), value);
    }

    Ok(Bindings { params, profile })
}

/// Identity of a recipe instance for deduplication.
fn instance_key(name: &str, params: &IndexMap<String, String>) -> String {
    let mut key = name.to_string();
    for (k, v) in params {
        key.push('\0');
        key.push_str(k);
        key.push('=');
        key.push_str(v);
    }
    key
}

/// Resolves invocations against one recipe graph.
pub struct Resolver<'a> {
    graph: &'a RecipeGraph<'a>,
    base_dir: PathBuf,
}

impl<'a> Resolver<'a> {
    /// `base_dir` is the directory recipe working directories are relative to.
    pub fn new(graph: &'a RecipeGraph<'a>, base_dir: impl Into<PathBuf>) -> Self {
        Self {
            graph,
            base_dir: base_dir.into(),
        }
    }

    /// Resolve an invocation into its ordered steps.
    pub fn resolve(&self, name: &str, overrides: &Overrides) -> Result<Vec<ResolvedStep>> {
        let mut seen = HashSet::new();
        let mut steps = Vec::new();
        self.resolve_into(name, overrides, &mut seen, &mut steps)?;
        debug!(recipe = name, steps = steps.len(), "resolved invocation");
        Ok(steps)
    }

    /// Resolve with raw command-line arguments for the top-level recipe.
    pub fn resolve_args(&self, name: &str, args: &[String]) -> Result<Vec<ResolvedStep>> {
        let recipe = self.graph.require(name)?;
        let overrides = parse_args(name, recipe, args)?;
        self.resolve(name, &overrides)
    }

    fn resolve_into(
        &self,
        name: &str,
        overrides: &Overrides,
        seen: &mut HashSet<String>,
        steps: &mut Vec<ResolvedStep>,
    ) -> Result<()> {
        let recipe = self.graph.require(name)?;
        let bindings = bind(self.graph.file(), name, recipe, overrides)?;

        if !seen.insert(instance_key(name, &bindings.params)) {
            debug!(recipe = name, "already resolved, skipping");
            return Ok(());
        }

        let scope = bindings.scope();
        for dep in self.graph.prerequisites(name) {
            let mut dep_overrides = Overrides::new();
            for (arg, tpl) in dep.args().into_iter().flatten() {
                dep_overrides.insert(arg.clone(), template::expand(tpl, &scope)?);
            }
            self.resolve_into(dep.recipe(), &dep_overrides, seen, steps)?;
        }

        let working_dir = match &recipe.working_dir {
            Some(dir) => self.base_dir.join(dir),
            None => self.base_dir.clone(),
        };

        for line in &recipe.run {
            let action = match line {
                BodyLine::Command(cmd) => StepAction::Shell(template::expand(cmd, &scope)?),
                BodyLine::Link { link } => StepAction::Link {
                    path: template::expand(&link.path, &scope)?,
                    target: template::expand(&link.target, &scope)?,
                },
            };
            steps.push(ResolvedStep {
                recipe: name.to_string(),
                action,
                working_dir: working_dir.clone(),
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::parser;
    use proptest::prelude::*;

    const YAML: &str = r#"
version: "1.0"
name: petalo
profiles:
  default:
    cargo_flags: ""
    target_dir: debug
  release:
    cargo_flags: --release
    target_dir: release
recipes:
  test:
    depends_on: [test-rust-pure, test-rust-c, test-python-bindings, test-julia]
  test-rust:
    params:
      colours: { default: "" }
    depends_on:
      - recipe: test-rust-pure
        with: { colours: "{{params.colours}}" }
      - recipe: test-rust-c
        with: { colours: "{{params.colours}}" }
  test-rust-pure:
    params:
      colours: { default: "" }
    run:
      - cargo test {{params.colours}} -p petalo
  test-rust-c:
    params:
      colours: { default: "" }
    run:
      - cargo test {{params.colours}} -p petalo-c
  test-python-bindings:
    params:
      colours: { default: "" }
    depends_on: [python-build-bindings]
    run:
      - pytest {{params.colours}} bindings
  test-julia:
    params:
      colours: { default: "" }
    working_dir: julia
    run:
      - julia src/testme.jl
  python-build-bindings:
    params:
      profile:
        type: profile
        default: default
    run:
      - cargo build {{profile.cargo_flags}} -p bindings
      - link:
          path: fulano.so
          target: target/{{profile.target_dir}}/libfulano.so
  deploy:
    params:
      target: {}
      mode:
        type: enum
        choices: [fast, safe]
        default: safe
    run:
      - deploy {{params.target}} --{{params.mode}}
"#;

    fn with_resolver<T>(f: impl FnOnce(&Resolver) -> T) -> T {
        let file = parser::parse(YAML).unwrap();
        assert!(parser::validate(&file).is_empty());
        let graph = RecipeGraph::build(&file).unwrap();
        let resolver = Resolver::new(&graph, "/work");
        f(&resolver)
    }

    fn overrides(pairs: &[(&str, &str)]) -> Overrides {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn commands(steps: &[ResolvedStep]) -> Vec<String> {
        steps.iter().map(|s| s.action.to_string()).collect()
    }

    #[test]
    fn test_resolve_forwards_colours_to_both_steps() {
        let steps = with_resolver(|r| {
            r.resolve("test-rust", &overrides(&[("colours", "--color=always")]))
                .unwrap()
        });
        assert_eq!(
            commands(&steps),
            vec![
                "cargo test --color=always -p petalo",
                "cargo test --color=always -p petalo-c",
            ]
        );
    }

    #[test]
    fn test_resolve_full_test_order() {
        let steps = with_resolver(|r| r.resolve("test", &Overrides::new()).unwrap());
        let recipes: Vec<&str> = steps.iter().map(|s| s.recipe.as_str()).collect();
        assert_eq!(
            recipes,
            vec![
                "test-rust-pure",
                "test-rust-c",
                "python-build-bindings",
                "python-build-bindings",
                "test-python-bindings",
                "test-julia",
            ]
        );
        assert_eq!(steps[0].action.to_string(), "cargo test  -p petalo");
        assert_eq!(
            steps[3].action,
            StepAction::Link {
                path: "fulano.so".into(),
                target: "target/debug/libfulano.so".into(),
            }
        );
    }

    #[test]
    fn test_resolve_working_dir() {
        let steps = with_resolver(|r| r.resolve("test-julia", &Overrides::new()).unwrap());
        assert_eq!(steps[0].working_dir, PathBuf::from("/work/julia"));
        let steps = with_resolver(|r| r.resolve("test-rust-pure", &Overrides::new()).unwrap());
        assert_eq!(steps[0].working_dir, PathBuf::from("/work"));
    }

    #[test]
    fn test_resolve_release_profile() {
        let steps = with_resolver(|r| {
            r.resolve("python-build-bindings", &overrides(&[("profile", "release")]))
                .unwrap()
        });
        assert_eq!(
            commands(&steps),
            vec![
                "cargo build --release -p bindings",
                "link fulano.so -> target/release/libfulano.so",
            ]
        );
    }

    #[test]
    fn test_resolve_unknown_profile() {
        let err = with_resolver(|r| {
            r.resolve("python-build-bindings", &overrides(&[("profile", "debug")]))
                .unwrap_err()
        });
        match err {
            Error::UnknownProfile { profile, available } => {
                assert_eq!(profile, "debug");
                assert_eq!(available, vec!["default", "release"]);
            }
            other => panic!("expected UnknownProfile, got {:?}", other),
        }
    }

    #[test]
    fn test_resolve_unknown_recipe() {
        let err = with_resolver(|r| r.resolve("tests", &Overrides::new()).unwrap_err());
        match err {
            Error::UnknownRecipe { name, suggestion } => {
                assert_eq!(name, "tests");
                assert_eq!(suggestion.as_deref(), Some("test"));
            }
            other => panic!("expected UnknownRecipe, got {:?}", other),
        }
    }

    #[test]
    fn test_resolve_unbound_parameter() {
        let err = with_resolver(|r| r.resolve("deploy", &Overrides::new()).unwrap_err());
        assert!(matches!(
            err,
            Error::UnboundParameter { ref recipe, ref param } if recipe == "deploy" && param == "target"
        ));
    }

    #[test]
    fn test_resolve_unknown_parameter() {
        let err = with_resolver(|r| {
            r.resolve("test-julia", &overrides(&[("colour", "x")]))
                .unwrap_err()
        });
        assert!(matches!(err, Error::UnknownParameter { .. }));
    }

    #[test]
    fn test_resolve_invalid_choice() {
        let err = with_resolver(|r| {
            r.resolve("deploy", &overrides(&[("target", "prod"), ("mode", "yolo")]))
                .unwrap_err()
        });
        assert!(err.to_string().contains("must be one of: fast, safe"));
    }

    #[test]
    fn test_parse_args_named_and_positional() {
        with_resolver(|r| {
            let steps = r
                .resolve_args("deploy", &["mode=fast".to_string(), "prod".to_string()])
                .unwrap();
            assert_eq!(commands(&steps), vec!["deploy prod --fast"]);

            let steps = r
                .resolve_args("deploy", &["prod".to_string(), "fast".to_string()])
                .unwrap();
            assert_eq!(commands(&steps), vec!["deploy prod --fast"]);
        });
    }

    #[test]
    fn test_parse_args_positional_flag_with_equals() {
        let steps = with_resolver(|r| {
            r.resolve_args("test-rust", &["--color=always".to_string()])
                .unwrap()
        });
        assert_eq!(
            commands(&steps),
            vec![
                "cargo test --color=always -p petalo",
                "cargo test --color=always -p petalo-c",
            ]
        );
    }

    #[test]
    fn test_parse_args_too_many() {
        let err = with_resolver(|r| {
            r.resolve_args("test-julia", &["a".to_string(), "b".to_string()])
                .unwrap_err()
        });
        assert!(matches!(
            err,
            Error::TooManyArguments { max: 1, given: 2, .. }
        ));
    }

    #[test]
    fn test_dedup_by_bindings() {
        let yaml = r#"
version: "1.0"
name: dedup
recipes:
  top:
    depends_on:
      - left
      - right
      - recipe: base
        with: { flag: "-x" }
  left:
    depends_on: [base]
    run: [echo left]
  right:
    depends_on: [base]
    run: [echo right]
  base:
    params:
      flag: { default: "" }
    run: ["echo base {{params.flag}}"]
"#;
        let file = parser::parse(yaml).unwrap();
        let graph = RecipeGraph::build(&file).unwrap();
        let resolver = Resolver::new(&graph, ".");
        let steps = resolver.resolve("top", &Overrides::new()).unwrap();
        assert_eq!(
            commands(&steps),
            vec!["echo base ", "echo left", "echo right", "echo base -x"]
        );
    }

    proptest! {
        /// Every prerequisite's steps appear exactly once and before the
        /// dependent's own body, whatever the chain length.
        #[test]
        fn prop_chain_runs_each_recipe_once_in_order(n in 1usize..12) {
            let mut yaml = String::from("version: \"1.0\"\nname: chain\nrecipes:\n");
            for i in 0..n {
                yaml.push_str(&format!("  r{}:\n", i));
                if i > 0 {
                    // Depend on every earlier recipe: many paths reach r0.
                    let deps: Vec<String> = (0..i).map(|j| format!("r{}", j)).collect();
                    yaml.push_str(&format!("    depends_on: [{}]\n", deps.join(", ")));
                }
                yaml.push_str(&format!("    run: [echo {}]\n", i));
            }
            let file = parser::parse(&yaml).unwrap();
            let graph = RecipeGraph::build(&file).unwrap();
            let resolver = Resolver::new(&graph, ".");
            let steps = resolver.resolve(&format!("r{}", n - 1), &Overrides::new()).unwrap();
            let expected: Vec<String> = (0..n).map(|i| format!("echo {}", i)).collect();
            prop_assert_eq!(commands(&steps), expected);
        }
    }
}
