//! Recipe file loading, discovery, and validation.
//!
//! Parses ladle.yaml and validates structural constraints:
//! - Version must be "1.0"
//! - Recipe, parameter, and profile names must be identifiers
//! - depends_on references must exist and may only pass declared parameters
//! - Every template placeholder must be bound by a declared parameter or
//!   by a variable that every profile defines

use super::template::{self, Placeholder};
use super::types::*;
use crate::error::{Error, Result};
use std::path::{Path, PathBuf};

/// Default recipe file name.
pub const FILE_NAME: &str = "ladle.yaml";

/// Validation error.
#[derive(Debug, Clone)]
pub struct ValidationError {
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

/// Parse a ladle.yaml file from disk.
pub fn parse_file(path: &Path) -> Result<LadleFile> {
    let content = std::fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
    parse(&content)
}

/// Parse a ladle.yaml from a string.
pub fn parse(yaml: &str) -> Result<LadleFile> {
    Ok(serde_yaml_ng::from_str(yaml)?)
}

/// Search `start` and its ancestors for a ladle.yaml.
pub fn find_file(start: &Path) -> Result<PathBuf> {
    start
        .ancestors()
        .map(|dir| dir.join(FILE_NAME))
        .find(|candidate| candidate.is_file())
        .ok_or_else(|| Error::FileNotFound {
            start: start.to_path_buf(),
        })
}

/// Validate a parsed file. Returns a list of errors (empty = valid).
pub fn validate(file: &LadleFile) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    let mut push = |message: String| errors.push(ValidationError { message });

    if file.version != "1.0" {
        push(format!("version must be \"1.0\", got \"{}\"", file.version));
    }
    if file.name.is_empty() {
        push("name must not be empty".to_string());
    }
    if file.settings.shell.is_empty() {
        push("settings.shell must name a program".to_string());
    }

    for (profile, vars) in &file.profiles {
        if !template::name_pattern().is_match(profile) {
            push(format!("invalid profile name '{}'", profile));
        }
        for var in vars.keys() {
            if !template::name_pattern().is_match(var) {
                push(format!("profile '{}' has invalid variable name '{}'", profile, var));
            }
        }
    }

    for (id, recipe) in &file.recipes {
        if !template::name_pattern().is_match(id) {
            push(format!("invalid recipe name '{}'", id));
        }
        validate_params(file, id, recipe, &mut push);
        validate_dependencies(file, id, recipe, &mut push);

        for line in &recipe.run {
            for tpl in line.templates() {
                validate_template(file, id, recipe, tpl, &mut push);
            }
        }
    }

    errors
}

fn validate_params(file: &LadleFile, id: &str, recipe: &Recipe, push: &mut impl FnMut(String)) {
    let profile_params = recipe
        .params
        .values()
        .filter(|d| d.param_type == ParamType::Profile)
        .count();
    if profile_params > 1 {
        push(format!("recipe '{}' declares more than one profile parameter", id));
    }

    for (name, decl) in &recipe.params {
        if !template::name_pattern().is_match(name) {
            push(format!("recipe '{}' has invalid parameter name '{}'", id, name));
        }
        let default = decl.default_string();
        match decl.param_type {
            ParamType::String => {}
            ParamType::Enum => {
                if decl.choices.is_empty() {
                    push(format!("recipe '{}' parameter '{}' (enum) has no choices", id, name));
                }
                if let Some(d) = default.filter(|d| !decl.choices.contains(d)) {
                    push(format!(
                        "recipe '{}' parameter '{}' default '{}' is not one of its choices",
                        id, name, d
                    ));
                }
            }
            ParamType::Profile => {
                if file.profiles.is_empty() {
                    push(format!(
                        "recipe '{}' parameter '{}' is a profile but no profiles are declared",
                        id, name
                    ));
                }
                if let Some(d) = default.filter(|d| !file.profiles.contains_key(d)) {
                    push(format!(
                        "recipe '{}' parameter '{}' defaults to unknown profile '{}'",
                        id, name, d
                    ));
                }
            }
        }
    }
}

fn validate_dependencies(
    file: &LadleFile,
    id: &str,
    recipe: &Recipe,
    push: &mut impl FnMut(String),
) {
    for dep in &recipe.depends_on {
        let target = dep.recipe();
        if target == id {
            push(format!("recipe '{}' depends on itself", id));
            continue;
        }
        let Some(dep_recipe) = file.recipes.get(target) else {
            push(format!("recipe '{}' depends on unknown recipe '{}'", id, target));
            continue;
        };
        for (arg, tpl) in dep.args().into_iter().flatten() {
            if !dep_recipe.params.contains_key(arg) {
                push(format!(
                    "recipe '{}' passes unknown parameter '{}' to '{}'",
                    id, arg, target
                ));
            }
            validate_template(file, id, recipe, tpl, push);
        }
        let passed = dep.args();
        for (param, decl) in &dep_recipe.params {
            let bound = passed.is_some_and(|args| args.contains_key(param));
            if decl.default_string().is_none() && !bound {
                push(format!(
                    "recipe '{}' depends on '{}' without binding its required parameter '{}'",
                    id, target, param
                ));
            }
        }
    }
}

/// Check that every placeholder in `tpl` is bound in the scope of `recipe`.
fn validate_template(
    file: &LadleFile,
    id: &str,
    recipe: &Recipe,
    tpl: &str,
    push: &mut impl FnMut(String),
) {
    let found = match template::placeholders(tpl) {
        Ok(found) => found,
        Err(e) => {
            push(format!("recipe '{}': {}", id, e));
            return;
        }
    };
    for placeholder in found {
        match placeholder {
            Placeholder::Param(name) => {
                if !recipe.params.contains_key(&name) {
                    push(format!(
                        "recipe '{}' references undeclared parameter '{}'",
                        id, name
                    ));
                }
            }
            Placeholder::Profile(var) => {
                if recipe.profile_param().is_none() {
                    push(format!(
                        "recipe '{}' references profile.{} but has no profile parameter",
                        id, var
                    ));
                }
                for (profile, vars) in &file.profiles {
                    if !vars.contains_key(&var) {
                        push(format!(
                            "recipe '{}' references profile.{} which profile '{}' does not define",
                            id, var, profile
                        ));
                    }
                }
            }
        }
    }
}

/// Parse a file and fail with every validation message if it is invalid.
pub fn load_validated(path: &Path) -> Result<LadleFile> {
    let file = parse_file(path)?;
    let errors = validate(&file);
    if errors.is_empty() {
        return Ok(file);
    }
    Err(Error::Validation(
        errors.into_iter().map(|e| e.message).collect(),
    ))
}
