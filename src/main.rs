use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use valrip_release::cli::{self, ReleaseOptions};
use valrip_release::config::{self, Config};
use valrip_release::git::Git2Repository;
use valrip_release::version::{BumpKind, Version};
use valrip_release::boundary::BoundaryWarning;
use valrip_release::{logging, ui, ReleaseError};

#[derive(Parser)]
#[command(
    name = "valrip-release",
    version,
    about = "Publish a valrip release: copy packaging files, bump the version tag, commit and push"
)]
struct Args {
    #[arg(short, long, global = true, help = "Custom configuration file path")]
    config: Option<PathBuf>,

    #[arg(short, long, global = true, action = clap::ArgAction::Count, help = "Increase log verbosity (-v, -vv)")]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Cut a new release from the latest tag
    Bump {
        #[arg(value_enum, help = "Version component to increment")]
        kind: BumpKind,

        #[arg(long, help = "Preview what would happen without making changes")]
        dry_run: bool,

        #[arg(short, long, help = "Skip confirmation prompts")]
        yes: bool,

        #[arg(long, help = "Commit and tag locally but do not push")]
        no_push: bool,

        #[arg(long, help = "Proceed even if tracked files have uncommitted changes")]
        allow_dirty: bool,

        #[arg(long, value_name = "X.Y.Z", value_parser = parse_version, help = "Version to bump from when no release tag exists yet")]
        initial: Option<Version>,
    },

    /// Show the latest release tag and the next candidates
    Current,

    /// Print the effective configuration
    Config,
}

fn parse_version(input: &str) -> std::result::Result<Version, String> {
    Version::parse(input).map_err(|e| e.to_string())
}

fn main() -> ExitCode {
    let args = Args::parse();
    logging::init(args.verbose);

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            ui::display_error(&format!("{:#}", e));
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> Result<()> {
    let (config, config_path) = config::load_config(args.config.as_deref())?;
    tracing::info!(path = %config_path.display(), "loaded configuration");

    match args.command {
        Command::Bump {
            kind,
            dry_run,
            yes,
            no_push,
            allow_dirty,
            initial,
        } => {
            let options = ReleaseOptions {
                push: !no_push,
                allow_dirty,
            };
            bump(&config, kind, initial, options, dry_run, yes)
        }
        Command::Current => {
            let repo = Git2Repository::open(".")?;
            let current = cli::current_release(&repo, &config)?;
            ui::display_current_release(current.as_ref());
            Ok(())
        }
        Command::Config => {
            println!("# {}", config_path.display());
            print!("{}", config.to_toml()?);
            Ok(())
        }
    }
}

fn bump(
    config: &Config,
    kind: BumpKind,
    initial: Option<Version>,
    options: ReleaseOptions,
    dry_run: bool,
    yes: bool,
) -> Result<()> {
    let repo = Git2Repository::open(".")?;

    let mut warnings = cli::preflight(&repo, config, options.allow_dirty)?;
    let plan = cli::plan_release(&repo, config, kind, initial)?;
    warnings.extend(plan.warnings.iter().cloned());

    for warning in &warnings {
        ui::display_boundary_warning(warning);
    }
    ui::display_release_plan(&plan);

    if dry_run {
        ui::display_dry_run(&plan, &config.source.url, &config.source.artifacts);
        return Ok(());
    }

    if !yes && !ui::confirm_action(&format!("Create release {}?", plan.tag))? {
        println!("Release cancelled by user.");
        return Ok(());
    }

    let checkout = tempfile::Builder::new()
        .prefix("valrip-release-")
        .tempdir()
        .context("Cannot create a temporary directory for the source clone")?;

    ui::display_status(&format!(
        "Cloning {} ({})",
        config.source.url, config.source.branch
    ));
    Git2Repository::clone_into(&config.source.url, &config.source.branch, checkout.path())?;
    ui::display_success("Cloned source repository");

    // The clone is removed when `checkout` drops, whether or not the release succeeds
    let outcome = match cli::run_release(&repo, checkout.path(), config, &plan, options) {
        Ok(outcome) => outcome,
        Err(e) => {
            if let ReleaseError::Unpublished {
                tag,
                branch,
                remote,
                ..
            } = &e
            {
                ui::display_boundary_warning(&BoundaryWarning::NotPushed {
                    tag: tag.clone(),
                    remote: remote.clone(),
                });
                ui::display_manual_push_instruction(branch, tag, remote);
            }
            return Err(e.into());
        }
    };

    let checkout_path = checkout.path().to_path_buf();
    checkout
        .close()
        .with_context(|| format!("Cannot remove {}", checkout_path.display()))?;
    tracing::debug!(path = %checkout_path.display(), "removed source clone");

    for warning in &outcome.warnings {
        ui::display_boundary_warning(warning);
    }
    ui::display_outcome(&outcome);

    if !outcome.pushed {
        ui::display_manual_push_instruction(&plan.branch, &plan.tag, &plan.remote);
    }

    Ok(())
}
