//! Constrained `{{...}}` template expansion.
//!
//! Two namespaces are recognized: `params.<name>` (a bound parameter) and
//! `profile.<var>` (a variable of the selected profile). Anything else,
//! including an unclosed `{{`, is an error and never reaches a subprocess.

use crate::error::{Error, Result};
use indexmap::IndexMap;
use regex::Regex;
use std::sync::LazyLock;

/// A placeholder reference found in a template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Placeholder {
    Param(String),
    Profile(String),
}

/// Values available to a template.
#[derive(Debug, Clone, Copy)]
pub struct Scope<'a> {
    pub params: &'a IndexMap<String, String>,
    pub profile: Option<&'a IndexMap<String, String>>,
}

static NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_-]*$").expect("valid regex"));

/// Valid recipe, parameter, and profile variable names.
pub fn name_pattern() -> &'static Regex {
    &NAME_RE
}

/// Parse a placeholder key such as `params.colours`.
fn parse_key(template: &str, key: &str) -> Result<Placeholder> {
    let (namespace, name) = key
        .split_once('.')
        .ok_or_else(|| Error::template(template, format!("unknown template variable: {}", key)))?;
    if !name_pattern().is_match(name) {
        return Err(Error::template(
            template,
            format!("invalid name in template variable: {}", key),
        ));
    }
    match namespace {
        "params" => Ok(Placeholder::Param(name.to_string())),
        "profile" => Ok(Placeholder::Profile(name.to_string())),
        _ => Err(Error::template(
            template,
            format!("unknown template variable: {}", key),
        )),
    }
}

/// Walk the placeholders in a template, calling `visit` with each one and
/// replacing it with the returned value.
fn expand_with<F>(template: &str, mut visit: F) -> Result<String>
where
    F: FnMut(&Placeholder) -> Result<String>,
{
    let mut result = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find("{{") {
        result.push_str(&rest[..open]);
        let after = &rest[open + 2..];
        let close = after.find("}}").ok_or_else(|| {
            Error::template(
                template,
                format!("unclosed template at position {}", template.len() - rest.len() + open),
            )
        })?;
        let placeholder = parse_key(template, after[..close].trim())?;
        result.push_str(&visit(&placeholder)?);
        rest = &after[close + 2..];
    }
    result.push_str(rest);

    Ok(result)
}

/// List every placeholder a template references, in order.
pub fn placeholders(template: &str) -> Result<Vec<Placeholder>> {
    let mut found = Vec::new();
    expand_with(template, |p| {
        found.push(p.clone());
        Ok(String::new())
    })?;
    Ok(found)
}

/// Expand a template against a scope.
pub fn expand(template: &str, scope: &Scope) -> Result<String> {
    expand_with(template, |p| match p {
        Placeholder::Param(name) => scope.params.get(name).cloned().ok_or_else(|| {
            Error::template(template, format!("unknown param: {}", name))
        }),
        Placeholder::Profile(var) => scope
            .profile
            .ok_or_else(|| Error::template(template, "no profile selected"))?
            .get(var)
            .cloned()
            .ok_or_else(|| Error::template(template, format!("unknown profile variable: {}", var))),
    })
}
