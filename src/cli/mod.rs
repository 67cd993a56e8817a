//! CLI subcommands: run, list, show, validate, init, schema, completions.

use crate::core::executor::{self, ExecConfig};
use crate::core::graph::RecipeGraph;
use crate::core::parser;
use crate::core::resolver::Resolver;
use crate::core::types::LadleFile;
use crate::error::{Error, Result};
use clap::{ArgAction, CommandFactory, Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::info;

/// Recipe file written by `ladle init`.
pub const TEMPLATE: &str = include_str!("template.yaml");

#[derive(Parser, Debug)]
#[command(
    name = "ladle",
    version,
    about = "Recipe runner for polyglot build-then-test pipelines"
)]
pub struct Cli {
    /// Path to ladle.yaml (default: search upward from the current directory)
    #[arg(short, long, global = true, env = "LADLE_FILE")]
    pub file: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Do not echo commands before running them
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run a recipe and its prerequisites
    Run {
        /// Recipe to run
        recipe: String,

        /// Arguments: `name=value`, or positional values in parameter order
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,

        /// Print the steps without running them
        #[arg(short = 'n', long)]
        dry_run: bool,
    },

    /// List recipes with their parameters
    List,

    /// Show the resolved steps of an invocation
    Show {
        /// Recipe to resolve
        recipe: String,

        /// Arguments, as for `run`
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,

        /// Emit JSON
        #[arg(long)]
        json: bool,
    },

    /// Validate ladle.yaml without running anything
    Validate,

    /// Write a starter ladle.yaml
    Init {
        /// Directory to initialize (default: current)
        #[arg(default_value = ".")]
        path: PathBuf,
    },

    /// Print the JSON Schema of the recipe file format
    Schema,

    /// Generate shell completions
    Completions {
        /// Target shell
        shell: clap_complete::Shell,
    },
}

/// Dispatch a parsed command line.
pub fn dispatch(cli: Cli) -> Result<()> {
    let file = cli.file.as_deref();
    match cli.command {
        Commands::Run {
            recipe,
            args,
            dry_run,
        } => cmd_run(&locate(file)?, &recipe, &args, dry_run, cli.quiet),
        Commands::List => cmd_list(&locate(file)?),
        Commands::Show { recipe, args, json } => cmd_show(&locate(file)?, &recipe, &args, json),
        Commands::Validate => cmd_validate(&locate(file)?),
        Commands::Init { path } => cmd_init(&path),
        Commands::Schema => cmd_schema(),
        Commands::Completions { shell } => {
            clap_complete::generate(shell, &mut Cli::command(), "ladle", &mut std::io::stdout());
            Ok(())
        }
    }
}

/// Use the explicit file, or search upward from the current directory.
fn locate(file: Option<&Path>) -> Result<PathBuf> {
    match file {
        Some(path) if path.is_file() => Ok(path.to_path_buf()),
        Some(path) => Err(Error::MissingFile {
            path: path.to_path_buf(),
        }),
        None => {
            let cwd = std::env::current_dir().map_err(|e| Error::io(".", e))?;
            parser::find_file(&cwd)
        }
    }
}

/// Directory recipes run relative to: the recipe file's own directory.
fn base_dir(path: &Path) -> PathBuf {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

/// Parse and validate a recipe file, including its dependency graph.
fn load(path: &Path) -> Result<LadleFile> {
    let file = parser::load_validated(path)?;
    RecipeGraph::build(&file)?;
    Ok(file)
}

fn cmd_run(path: &Path, recipe: &str, args: &[String], dry_run: bool, quiet: bool) -> Result<()> {
    let file = parser::load_validated(path)?;
    let graph = RecipeGraph::build(&file)?;
    let steps = Resolver::new(&graph, base_dir(path)).resolve_args(recipe, args)?;

    info!(recipe, steps = steps.len(), file = %path.display(), "running");
    executor::execute(
        &steps,
        &ExecConfig {
            settings: &file.settings,
            dry_run,
            quiet,
        },
    )?;
    Ok(())
}

fn cmd_list(path: &Path) -> Result<()> {
    let file = load(path)?;
    let lines: Vec<(String, Option<&String>)> = file
        .recipes
        .iter()
        .map(|(name, recipe)| {
            let sig = recipe.signature();
            let head = if sig.is_empty() {
                name.clone()
            } else {
                format!("{} {}", name, sig)
            };
            (head, recipe.description.as_ref())
        })
        .collect();
    let width = lines.iter().map(|(head, _)| head.len()).max().unwrap_or(0);

    println!("Available recipes:");
    for (head, description) in &lines {
        match description {
            Some(d) => println!("    {:<width$} # {}", head, d, width = width),
            None => println!("    {}", head),
        }
    }
    Ok(())
}

fn cmd_show(path: &Path, recipe: &str, args: &[String], json: bool) -> Result<()> {
    let file = parser::load_validated(path)?;
    let graph = RecipeGraph::build(&file)?;
    let steps = Resolver::new(&graph, base_dir(path)).resolve_args(recipe, args)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&steps)?);
        return Ok(());
    }

    println!("{} ({} steps)", recipe, steps.len());
    for (i, step) in steps.iter().enumerate() {
        println!(
            "  {:>2}. [{}] {} (in {})",
            i + 1,
            step.recipe,
            step.action,
            step.working_dir.display()
        );
    }
    Ok(())
}

fn cmd_validate(path: &Path) -> Result<()> {
    let file = load(path)?;
    println!(
        "OK: {} ({} recipes, {} profiles)",
        file.name,
        file.recipes.len(),
        file.profiles.len()
    );
    Ok(())
}

fn cmd_init(path: &Path) -> Result<()> {
    let file_path = path.join(parser::FILE_NAME);
    if file_path.exists() {
        return Err(Error::io(
            &file_path,
            std::io::Error::new(std::io::ErrorKind::AlreadyExists, "already exists"),
        ));
    }
    std::fs::create_dir_all(path).map_err(|e| Error::io(path, e))?;
    std::fs::write(&file_path, TEMPLATE).map_err(|e| Error::io(&file_path, e))?;

    println!("Initialized ladle project at {}", path.display());
    println!("  Created: {}", file_path.display());
    Ok(())
}

fn cmd_schema() -> Result<()> {
    let schema = schemars::schema_for!(LadleFile);
    println!("{}", serde_json::to_string_pretty(&schema)?);
    Ok(())
}
