//! Command-line hooks for the share extension integration.
//!
//! The host build tool runs `shareext copy` and `shareext add` after the
//! plugin is installed, and `shareext remove` before it is uninstalled.
//! It may forward its own argv; `NAME=value` arguments among them become
//! preference overrides and everything else is ignored.

use clap::{Parser, Subcommand};
use shareext::constants::PLUGIN_ID;
use shareext::{hooks, HookContext, Overrides};
use std::io::IsTerminal;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "shareext")]
#[command(about = "Share extension hooks for Cordova iOS projects")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Cordova project root
    #[arg(long, global = true, default_value = ".")]
    project_root: PathBuf,

    /// iOS platform folder (default: <project-root>/platforms/ios)
    #[arg(long, global = true)]
    platform_root: Option<PathBuf>,

    /// Installed plugin folder (default: <project-root>/plugins/<plugin id>)
    #[arg(long, global = true)]
    plugin_root: Option<PathBuf>,

    /// Preference override, NAME=value (repeatable)
    #[arg(long = "set", value_name = "NAME=VALUE", global = true)]
    set: Vec<String>,

    /// Debug output
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,

    /// Warnings and errors only
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Add the extension target, group and files to the Xcode project
    Add {
        /// Forwarded host arguments; NAME=value pairs are overrides
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
    },
    /// Detach the extension group and files from the Xcode project
    Remove {
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
    },
    /// Copy the extension sources into the platform folder
    Copy {
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
    },
}

fn init_logging(cli: &Cli) {
    let level = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "warn"
    } else {
        "info"
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .format_target(false)
        .init();
}

fn print_error(msg: &str) {
    if std::io::stderr().is_terminal() {
        eprintln!("\x1b[1m\x1b[31m\"{PLUGIN_ID}\": {msg}\x1b[0m");
    } else {
        eprintln!("\"{PLUGIN_ID}\": {msg}");
    }
}

fn context(cli: &Cli, overrides: Overrides) -> HookContext {
    let mut ctx = HookContext::new(&cli.project_root).overrides(overrides);
    if let Some(ref platform_root) = cli.platform_root {
        ctx = ctx.platform_root(platform_root);
    }
    if let Some(ref plugin_root) = cli.plugin_root {
        ctx = ctx.plugin_root(plugin_root);
    }
    ctx
}

fn run(cli: &Cli) -> shareext::Result<()> {
    let forwarded = match &cli.command {
        Command::Add { args } | Command::Remove { args } | Command::Copy { args } => args,
    };
    let overrides = Overrides::parse_args(cli.set.iter().chain(forwarded))?;
    let ctx = context(cli, overrides);

    match cli.command {
        Command::Add { .. } => {
            let report = hooks::add_target(ctx)?;
            log::debug!(
                "{} files attached, {} files templated, {} configurations signed",
                report.files_attached,
                report.rewritten_files,
                report.signed_configurations
            );
        }
        Command::Remove { .. } => {
            let report = hooks::remove_target(ctx)?;
            log::debug!("{} files detached", report.files_detached);
        }
        Command::Copy { .. } => {
            hooks::copy_extension(&ctx)?;
        }
    }

    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(&cli);

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            print_error(&e.to_string());
            ExitCode::FAILURE
        }
    }
}
