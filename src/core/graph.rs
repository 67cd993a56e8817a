//! Recipe dependency graph.
//!
//! Nodes are recipes, edges are `depends_on` entries in declaration order.
//! The graph is built once per file and rejects unknown prerequisites and
//! cycles up front, so resolution can walk it without re-checking.

use super::types::{Dependency, LadleFile, Recipe};
use crate::error::{Error, Result};
use indexmap::IndexMap;

/// DFS colouring for cycle detection.
#[derive(Clone, Copy, PartialEq, Eq)]
enum Mark {
    Unvisited,
    InProgress,
    Done,
}

/// Immutable graph over the recipes of one file.
#[derive(Debug)]
pub struct RecipeGraph<'a> {
    file: &'a LadleFile,
    /// Prerequisite entries per recipe, in declared order
    edges: IndexMap<&'a str, Vec<&'a Dependency>>,
}

impl<'a> RecipeGraph<'a> {
    /// Build the graph, failing on unknown prerequisites or cycles.
    pub fn build(file: &'a LadleFile) -> Result<Self> {
        let mut edges = IndexMap::new();
        for (id, recipe) in &file.recipes {
            let mut deps = Vec::with_capacity(recipe.depends_on.len());
            for dep in &recipe.depends_on {
                let target = dep.recipe();
                if !file.recipes.contains_key(target) {
                    return Err(Error::Validation(vec![format!(
                        "recipe '{}' depends on unknown recipe '{}'",
                        id, target
                    )]));
                }
                deps.push(dep);
            }
            edges.insert(id.as_str(), deps);
        }

        let graph = Self { file, edges };
        graph.check_acyclic()?;
        Ok(graph)
    }

    pub fn file(&self) -> &'a LadleFile {
        self.file
    }

    pub fn recipe(&self, name: &str) -> Option<&'a Recipe> {
        self.file.recipes.get(name)
    }

    /// Direct prerequisites of a recipe, in declared order.
    pub fn prerequisites(&self, name: &str) -> &[&'a Dependency] {
        self.edges.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Closest recipe name for an unknown one: a shared prefix of at least
    /// two characters in either direction.
    pub fn suggest(&self, unknown: &str) -> Option<String> {
        if unknown.len() < 2 {
            return None;
        }
        self.edges
            .keys()
            .find(|name| name.starts_with(unknown) || unknown.starts_with(**name))
            .map(|name| name.to_string())
    }

    /// Look up a recipe, or fail with `UnknownRecipe`.
    pub fn require(&self, name: &str) -> Result<&'a Recipe> {
        self.recipe(name).ok_or_else(|| Error::UnknownRecipe {
            name: name.to_string(),
            suggestion: self.suggest(name),
        })
    }

    fn check_acyclic(&self) -> Result<()> {
        let mut marks: IndexMap<&str, Mark> =
            self.edges.keys().map(|k| (*k, Mark::Unvisited)).collect();
        let mut path = Vec::new();
        for start in self.edges.keys().copied() {
            self.visit(start, &mut marks, &mut path)?;
        }
        Ok(())
    }

    fn visit(
        &self,
        node: &'a str,
        marks: &mut IndexMap<&'a str, Mark>,
        path: &mut Vec<&'a str>,
    ) -> Result<()> {
        match marks.get(node).copied().unwrap_or(Mark::Done) {
            Mark::Done => return Ok(()),
            Mark::InProgress => {
                let from = path.iter().position(|n| *n == node).unwrap_or(0);
                let mut cycle: Vec<String> = path[from..].iter().map(|n| n.to_string()).collect();
                cycle.push(node.to_string());
                return Err(Error::DependencyCycle(cycle));
            }
            Mark::Unvisited => {}
        }

        marks.insert(node, Mark::InProgress);
        path.push(node);
        for &dep in self.prerequisites(node) {
            self.visit(dep.recipe(), marks, path)?;
        }
        path.pop();
        marks.insert(node, Mark::Done);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::parser;

    fn file(yaml: &str) -> LadleFile {
        parser::parse(yaml).unwrap()
    }

    #[test]
    fn test_prerequisites_keep_declared_order() {
        let f = file(
            r#"
version: "1.0"
name: test
recipes:
  test:
    depends_on: [zeta, alpha, mid]
  zeta: {}
  alpha: {}
  mid: {}
"#,
        );
        let graph = RecipeGraph::build(&f).unwrap();
        let names: Vec<&str> = graph
            .prerequisites("test")
            .iter()
            .map(|dep| dep.recipe())
            .collect();
        assert_eq!(names, vec!["zeta", "alpha", "mid"]);
        assert!(graph.prerequisites("alpha").is_empty());
        assert!(graph.prerequisites("missing").is_empty());
    }

    #[test]
    fn test_unknown_prerequisite() {
        let f = file(
            r#"
version: "1.0"
name: test
recipes:
  test:
    depends_on: [ghost]
"#,
        );
        let err = RecipeGraph::build(&f).unwrap_err();
        assert!(err.to_string().contains("unknown recipe 'ghost'"));
    }

    #[test]
    fn test_cycle_reports_path() {
        let f = file(
            r#"
version: "1.0"
name: test
recipes:
  a:
    depends_on: [b]
  b:
    depends_on: [c]
  c:
    depends_on: [a]
"#,
        );
        match RecipeGraph::build(&f) {
            Err(Error::DependencyCycle(cycle)) => {
                assert_eq!(cycle, vec!["a", "b", "c", "a"]);
            }
            other => panic!("expected cycle, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_diamond_is_not_a_cycle() {
        let f = file(
            r#"
version: "1.0"
name: test
recipes:
  top:
    depends_on: [left, right]
  left:
    depends_on: [base]
  right:
    depends_on: [base]
  base: {}
"#,
        );
        assert!(RecipeGraph::build(&f).is_ok());
    }

    #[test]
    fn test_require_suggests() {
        let f = file(
            r#"
version: "1.0"
name: test
recipes:
  test-rust: {}
  test-julia: {}
"#,
        );
        let graph = RecipeGraph::build(&f).unwrap();
        assert!(graph.require("test-rust").is_ok());
        match graph.require("test-ru") {
            Err(Error::UnknownRecipe { suggestion, .. }) => {
                assert_eq!(suggestion.as_deref(), Some("test-rust"));
            }
            other => panic!("expected unknown recipe, got {:?}", other.map(|_| ())),
        }
        assert_eq!(graph.suggest("x"), None);
        assert_eq!(graph.suggest("build"), None);
    }
}
