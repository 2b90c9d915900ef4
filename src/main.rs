use anyhow::{Context, Result};
use chrono::Local;
use clap::Parser;
use std::path::{Path, PathBuf};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use cldr::cli::{self, BuildArgs, NewBulletArgs};
use cldr::config;
use cldr::domain::{Kind, RenderContext, VersionBump};
use cldr::editor;
use cldr::git::Git2Repository;
use cldr::release::ReleaseVersion;
use cldr::ui;

#[derive(clap::Parser)]
#[command(
    name = "cldr",
    version,
    about = "Manage a CHANGELOG.md using per-developer changelog bullet files"
)]
struct Args {
    #[arg(
        short,
        long,
        global = true,
        env = "CLDR_CONFIG",
        help = "Custom configuration file path"
    )]
    config: Option<PathBuf>,

    #[arg(
        long,
        global = true,
        default_value = "changelog",
        help = "Directory where unreleased changelog bullet files are stored"
    )]
    changelog_dir: PathBuf,

    #[arg(
        short,
        long,
        global = true,
        action = clap::ArgAction::Count,
        help = "Increase log verbosity (-v for info, -vv for debug)"
    )]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Subcommand)]
enum Command {
    #[command(about = "Fold the changelog bullets into a new release section")]
    Build {
        #[arg(long, default_value = "CHANGELOG.md", help = "Path to the changelog file")]
        changelog: PathBuf,

        #[arg(
            short = 'V',
            long,
            required_unless_present = "bump",
            conflicts_with = "bump",
            help = "Version of the new release"
        )]
        new_version: Option<String>,

        #[arg(long, help = "Bump the previous release version (major, minor or patch)")]
        bump: Option<VersionBump>,

        #[arg(
            short,
            long,
            help = "Rewrite the changelog in place instead of printing it to stdout"
        )]
        in_place: bool,
    },

    #[command(about = "Print parsed bullets and configuration as JSON")]
    Info,

    #[command(about = "Add a new bullet of the given kind")]
    New {
        #[arg(help = "Bullet kind (add, chg, dep, fix, misc, rm or sec)")]
        kind: Kind,

        #[arg(short, long, help = "Bullet body; opens your editor when omitted")]
        body: Option<String>,

        #[command(flatten)]
        options: BulletOptions,
    },

    #[command(about = "Add a bullet to the 'Added' section of the next release")]
    Add(KindArgs),

    #[command(about = "Add a bullet to the 'Changed' section of the next release")]
    Chg(KindArgs),

    #[command(about = "Add a bullet to the 'Deprecated' section of the next release")]
    Dep(KindArgs),

    #[command(about = "Add a bullet to the 'Fixed' section of the next release")]
    Fix(KindArgs),

    #[command(about = "Add a bullet to the 'Miscellaneous' section of the next release")]
    Misc(KindArgs),

    #[command(about = "Add a bullet to the 'Removed' section of the next release")]
    Rm(KindArgs),

    #[command(about = "Add a bullet to the 'Security' section of the next release")]
    Sec(KindArgs),
}

#[derive(clap::Args)]
struct KindArgs {
    #[arg(help = "Bullet body; opens your editor when omitted")]
    body: Option<String>,

    #[command(flatten)]
    options: BulletOptions,
}

#[derive(clap::Args)]
struct BulletOptions {
    #[arg(
        short,
        long,
        value_delimiter = ',',
        help = "Comma-separated tags (e.g. a Jira issue) to apply to the bullet"
    )]
    tags: Vec<String>,

    #[arg(
        short = 'B',
        long,
        help = "Bullet file name (without .md); defaults to USER@BRANCH"
    )]
    bullet_file_name: Option<String>,

    #[arg(short, long, help = "Do not commit the new bullet using git")]
    no_commit: bool,
}

fn main() {
    let args = Args::parse();
    init_tracing(args.verbose);

    if let Err(e) = run(args) {
        ui::display_error(&ui::error_report(&*e));
        std::process::exit(1);
    }
}

fn init_tracing(verbosity: u8) {
    let default_level = match verbosity {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run(args: Args) -> Result<()> {
    let Args {
        config: config_path,
        changelog_dir,
        command,
        ..
    } = args;

    let config = config::load_config(config_path.as_deref())
        .context("Unable to load the cldr configuration")?;

    let repo = match Git2Repository::open(".") {
        Ok(repo) => Some(repo),
        Err(e) => {
            debug!("Not using git history: {}", e);
            None
        }
    };
    let mut ctx = RenderContext::new(&config);
    if let Some(repo) = &repo {
        ctx = ctx.with_history(repo);
    }

    match command {
        Command::Build {
            changelog,
            new_version,
            bump,
            in_place,
        } => {
            let version = match (new_version, bump) {
                (Some(version), _) => ReleaseVersion::Explicit(version),
                (None, Some(bump)) => ReleaseVersion::Bump(bump),
                (None, None) => anyhow::bail!("Either --new-version or --bump is required"),
            };
            let build_args = BuildArgs {
                changelog,
                changelog_dir,
                version,
                in_place,
                date: Local::now().date_naive(),
            };
            build(&build_args, &ctx)
        }
        Command::Info => info(&changelog_dir, &ctx),
        Command::New {
            kind,
            body,
            options,
        } => new_bullet(kind, body, options, changelog_dir, &ctx),
        Command::Add(args) => new_bullet(Kind::Add, args.body, args.options, changelog_dir, &ctx),
        Command::Chg(args) => new_bullet(Kind::Chg, args.body, args.options, changelog_dir, &ctx),
        Command::Dep(args) => new_bullet(Kind::Dep, args.body, args.options, changelog_dir, &ctx),
        Command::Fix(args) => new_bullet(Kind::Fix, args.body, args.options, changelog_dir, &ctx),
        Command::Misc(args) => new_bullet(Kind::Misc, args.body, args.options, changelog_dir, &ctx),
        Command::Rm(args) => new_bullet(Kind::Rm, args.body, args.options, changelog_dir, &ctx),
        Command::Sec(args) => new_bullet(Kind::Sec, args.body, args.options, changelog_dir, &ctx),
    }
}

fn build(args: &BuildArgs, ctx: &RenderContext) -> Result<()> {
    let outcome = cli::run_build(args, ctx)?;
    for warning in &outcome.warnings {
        ui::display_warning(warning);
    }

    if args.in_place {
        ui::display_success(&format!(
            "Released version {} in {} ({} bullet file(s) consumed)",
            outcome.version,
            args.changelog.display(),
            outcome.removed_files.len()
        ));
    } else {
        print!("{}", outcome.contents);
    }
    Ok(())
}

fn info(changelog_dir: &Path, ctx: &RenderContext) -> Result<()> {
    let (report, warnings) = cli::collect_info(changelog_dir, ctx.config)?;
    for warning in &warnings {
        ui::display_warning(warning);
    }
    println!("{}", report.to_json()?);
    Ok(())
}

fn new_bullet(
    kind: Kind,
    body: Option<String>,
    options: BulletOptions,
    changelog_dir: PathBuf,
    ctx: &RenderContext,
) -> Result<()> {
    let args = NewBulletArgs {
        kind,
        body,
        tags: options.tags,
        bullet_file_name: options.bullet_file_name,
        commit: !options.no_commit,
        changelog_dir,
    };

    let outcome = cli::run_new(&args, ctx, editor::open_editor)?;
    for warning in &outcome.warnings {
        ui::display_warning(warning);
    }
    ui::display_bullet_preview(&outcome.preview);

    if outcome.committed {
        ui::display_success(&format!(
            "Committed new bullet(s) in {}",
            outcome.bullet_file.display()
        ));
    } else {
        ui::display_status(&format!(
            "Bullet file updated: {}",
            outcome.bullet_file.display()
        ));
    }
    Ok(())
}
