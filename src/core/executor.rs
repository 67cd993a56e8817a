//! Executor: fail-fast sequential step runner.
//!
//! Runs resolved steps one at a time in order:
//! resolve → for each step: echo → spawn (inherited stdio) → check exit code
//!
//! The first non-zero exit stops the run; its code becomes the run's code.

use super::types::*;
use crate::error::{Error, Result};
use crate::transport::local;
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info};

/// Configuration for one execution.
#[derive(Debug, Clone, Copy)]
pub struct ExecConfig<'a> {
    pub settings: &'a Settings,
    /// Print steps instead of running them
    pub dry_run: bool,
    /// Suppress command echo
    pub quiet: bool,
}

/// Execute steps in order, stopping at the first failure.
pub fn execute(steps: &[ResolvedStep], cfg: &ExecConfig) -> Result<RunSummary> {
    let start = Instant::now();
    let mut steps_run = 0;

    for step in steps {
        if cfg.dry_run {
            println!("{}", step.action);
            continue;
        }
        if cfg.settings.echo && !cfg.quiet {
            eprintln!("{}", step.action);
        }

        let step_start = Instant::now();
        run_step(step, cfg.settings)?;
        steps_run += 1;
        debug!(
            recipe = %step.recipe,
            seconds = step_start.elapsed().as_secs_f64(),
            "step finished"
        );
    }

    let summary = RunSummary {
        steps_run,
        duration: start.elapsed(),
    };
    info!(
        steps = summary.steps_run,
        seconds = summary.duration.as_secs_f64(),
        "run complete"
    );
    Ok(summary)
}

fn run_step(step: &ResolvedStep, settings: &Settings) -> Result<()> {
    match &step.action {
        StepAction::Shell(command) => {
            let code = local::exec_inherited(&settings.shell, command, &step.working_dir)?;
            if code != 0 {
                return Err(Error::SubprocessFailure {
                    recipe: step.recipe.clone(),
                    code,
                });
            }
        }
        StepAction::Link { path, target } => {
            local::refresh_symlink(&step.working_dir.join(path), Path::new(target))?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn shell(recipe: &str, cmd: &str, dir: &Path) -> ResolvedStep {
        ResolvedStep {
            recipe: recipe.to_string(),
            action: StepAction::Shell(cmd.to_string()),
            working_dir: dir.to_path_buf(),
        }
    }

    fn cfg(settings: &Settings) -> ExecConfig<'_> {
        ExecConfig {
            settings,
            dry_run: false,
            quiet: true,
        }
    }

    fn log(dir: &Path) -> String {
        std::fs::read_to_string(dir.join("log")).unwrap_or_default()
    }

    #[test]
    fn test_execute_all_steps_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings::default();
        let steps = vec![
            shell("a", "echo one >> log", dir.path()),
            shell("b", "echo two >> log", dir.path()),
            shell("c", "echo three >> log", dir.path()),
        ];
        let summary = execute(&steps, &cfg(&settings)).unwrap();
        assert_eq!(summary.steps_run, 3);
        assert_eq!(log(dir.path()), "one\ntwo\nthree\n");
    }

    #[test]
    fn test_execute_stops_on_first_failure() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings::default();
        let steps = vec![
            shell("a", "echo one >> log", dir.path()),
            shell("b", "exit 3", dir.path()),
            shell("c", "echo three >> log", dir.path()),
        ];
        let err = execute(&steps, &cfg(&settings)).unwrap_err();
        match err {
            Error::SubprocessFailure { ref recipe, code } => {
                assert_eq!(recipe, "b");
                assert_eq!(code, 3);
            }
            ref other => panic!("expected SubprocessFailure, got {:?}", other),
        }
        assert_eq!(err.exit_code(), 3);
        assert_eq!(log(dir.path()), "one\n");
    }

    #[test]
    fn test_execute_dry_run_spawns_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings::default();
        let steps = vec![shell("a", "echo one >> log", dir.path())];
        let summary = execute(
            &steps,
            &ExecConfig {
                settings: &settings,
                dry_run: true,
                quiet: false,
            },
        )
        .unwrap();
        assert_eq!(summary.steps_run, 0);
        assert!(!dir.path().join("log").exists());
    }

    #[test]
    fn test_execute_uses_working_dir() {
        let dir = tempfile::tempdir().unwrap();
        let sub = dir.path().join("julia");
        std::fs::create_dir(&sub).unwrap();
        let settings = Settings::default();
        let steps = vec![shell("test-julia", "pwd > ../log", &sub)];
        execute(&steps, &cfg(&settings)).unwrap();
        let recorded = PathBuf::from(log(dir.path()).trim());
        assert_eq!(
            recorded.canonicalize().unwrap(),
            sub.canonicalize().unwrap()
        );
    }

    #[test]
    fn test_execute_custom_shell() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings {
            shell: vec!["sh".into(), "-c".into()],
            echo: false,
        };
        let steps = vec![shell("a", "echo $LADLE_SURELY_UNSET_VAR done >> log", dir.path())];
        execute(&steps, &cfg(&settings)).unwrap();
        assert_eq!(log(dir.path()), "done\n");
    }

    #[cfg(unix)]
    #[test]
    fn test_execute_link_step() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings::default();
        let steps = vec![ResolvedStep {
            recipe: "python-build-bindings".into(),
            action: StepAction::Link {
                path: "fulano.so".into(),
                target: "target/release/libfulano.so".into(),
            },
            working_dir: dir.path().to_path_buf(),
        }];
        execute(&steps, &cfg(&settings)).unwrap();
        assert_eq!(
            std::fs::read_link(dir.path().join("fulano.so")).unwrap(),
            PathBuf::from("target/release/libfulano.so")
        );
    }
}
