//! Core recipe logic: types, parsing, templates, graph, resolution, execution.

pub mod executor;
pub mod graph;
pub mod parser;
pub mod resolver;
pub mod template;
pub mod types;
