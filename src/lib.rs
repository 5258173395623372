// src/lib.rs

pub mod cli;
pub mod config;
pub mod engine;
pub mod errors;
pub mod logging;
pub mod watch;

use std::fmt;
use std::path::Path;
use std::process::Command;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use tracing::{debug, error, info, warn};

use crate::cli::CliArgs;
use crate::config::loader::{config_base_dir, default_config_path, load_and_validate};
use crate::engine::{QUIESCENCE_WINDOW, ReloadCallback, Watcher, WatcherOptions};
use crate::watch::{NotifyBackend, WatchSpec};

/// Everything `run` needs once config and CLI have been merged.
#[derive(Debug)]
pub struct RunPlan {
    pub specs: Vec<WatchSpec>,
    pub quiescence: Duration,
    pub reload_cmd: Option<ReloadCommand>,
}

/// The command run once per reload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReloadCommand {
    /// `[reload].cmd`, run through `sh -c`.
    Shell(String),
    /// Trailing CLI arguments, spawned directly so argument boundaries
    /// survive.
    Argv { program: String, args: Vec<String> },
}

impl ReloadCommand {
    /// Build from trailing CLI arguments. `None` when `argv` is empty.
    pub fn from_argv(argv: &[String]) -> Option<Self> {
        let (program, args) = argv.split_first()?;
        Some(ReloadCommand::Argv {
            program: program.clone(),
            args: args.to_vec(),
        })
    }

    fn command(&self) -> Command {
        match self {
            ReloadCommand::Shell(cmd) => {
                let mut c = Command::new("sh");
                c.arg("-c").arg(cmd);
                c
            }
            ReloadCommand::Argv { program, args } => {
                let mut c = Command::new(program);
                c.args(args);
                c
            }
        }
    }
}

impl fmt::Display for ReloadCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReloadCommand::Shell(cmd) => write!(f, "sh -c {cmd:?}"),
            ReloadCommand::Argv { program, args } => {
                write!(f, "{program}")?;
                for arg in args {
                    write!(f, " {arg:?}")?;
                }
                Ok(())
            }
        }
    }
}

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading and pattern compilation
/// - the watcher (notify backend, debounce scheduler)
/// - the reload command
/// - Ctrl-C handling
pub async fn run(args: CliArgs) -> Result<()> {
    let cwd = std::env::current_dir().context("resolving working directory")?;
    let plan = build_plan(&args, &cwd)?;

    if args.dry_run {
        print_dry_run(&plan);
        return Ok(());
    }

    let callback = reload_callback(plan.reload_cmd.clone());
    let options = WatcherOptions {
        quiescence: plan.quiescence,
    };

    let mut watcher = Watcher::with_options(Arc::new(NotifyBackend), options);
    watcher.start_specs(plan.specs, callback)?;

    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "failed to listen for Ctrl+C; shutting down");
    } else {
        info!("Ctrl+C received; shutting down");
    }

    watcher.drain().await;
    Ok(())
}

/// Merge the config file and CLI flags into a [`RunPlan`].
///
/// - `--config PATH` (relative to `cwd`) must exist.
/// - Without `--config`, `Reloadwatch.toml` is used if present; it may be
///   absent only when patterns are given on the command line.
/// - Config patterns resolve against the config file's directory, CLI
///   patterns against `cwd`.
/// - A trailing CLI command overrides `[reload].cmd`.
pub fn build_plan(args: &CliArgs, cwd: &Path) -> Result<RunPlan> {
    let config_path = match &args.config {
        Some(path) => Some(cwd.join(path)),
        None => {
            let default = cwd.join(default_config_path());
            default.is_file().then_some(default)
        }
    };

    let mut specs = Vec::new();
    let mut quiescence = QUIESCENCE_WINDOW;
    let mut reload_cmd = None;

    if let Some(path) = config_path {
        let cfg = load_and_validate(&path)
            .with_context(|| format!("loading config {}", path.display()))?;
        let base = config_base_dir(&path, cwd);
        debug!(config = %path.display(), base = %base.display(), "config loaded");

        for pattern in cfg.patterns() {
            specs.push(WatchSpec::compile_with_base(pattern, &base)?);
        }
        quiescence = cfg.debounce();
        reload_cmd = cfg
            .reload_cmd()
            .map(|cmd| ReloadCommand::Shell(cmd.to_string()));
    }

    for pattern in &args.patterns {
        specs.push(WatchSpec::compile_with_base(pattern, cwd)?);
    }

    if specs.is_empty() {
        bail!(
            "nothing to watch: no config file at {} and no --pattern given",
            default_config_path().display()
        );
    }

    if let Some(cmd) = ReloadCommand::from_argv(&args.cmd) {
        reload_cmd = Some(cmd);
    }

    Ok(RunPlan {
        specs,
        quiescence,
        reload_cmd,
    })
}

/// Build the callback run once per settled burst of changes.
///
/// The command is waited for, so reloads never overlap. Its exit status is
/// logged and otherwise ignored.
pub fn reload_callback(cmd: Option<ReloadCommand>) -> ReloadCallback {
    match cmd {
        Some(cmd) => Arc::new(move || run_reload_cmd(&cmd)),
        None => Arc::new(|| info!("reload requested (no [reload].cmd configured)")),
    }
}

fn run_reload_cmd(cmd: &ReloadCommand) {
    debug!(%cmd, "running reload command");
    match cmd.command().status() {
        Ok(status) if status.success() => debug!(%cmd, "reload command succeeded"),
        Ok(status) => warn!(%cmd, code = ?status.code(), "reload command failed"),
        Err(e) => error!(%cmd, error = %e, "failed to spawn reload command"),
    }
}

/// Simple dry-run output: print compiled patterns and the reload command.
fn print_dry_run(plan: &RunPlan) {
    println!("reloadwatch dry-run");
    println!("  debounce = {}ms", plan.quiescence.as_millis());
    match &plan.reload_cmd {
        Some(cmd) => println!("  reload.cmd = {cmd}"),
        None => println!("  reload.cmd = (none)"),
    }
    println!();

    println!("patterns ({}):", plan.specs.len());
    for spec in &plan.specs {
        println!("  - {}", spec.pattern());
        println!("      root: {}", spec.root_dir());
        println!("      segments: {:?}", spec.segments());
    }

    debug!("dry-run complete (nothing watched)");
}
