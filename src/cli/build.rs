use chrono::NaiveDate;
use std::fs;
use std::path::PathBuf;
use tracing::info;

use crate::changelog_dir::{read_bullets, remove_bullet_files};
use crate::domain::{parse_version, RenderContext};
use crate::error::Result;
use crate::release::{build_changelog, resolve_version, BuildRequest, ReleaseVersion};
use crate::warning::CldrWarning;

/// Arguments for the build workflow
///
/// Decoupled from the clap definitions so the workflow can be driven
/// programmatically.
#[derive(Debug, Clone, PartialEq)]
pub struct BuildArgs {
    /// Path to the changelog document
    pub changelog: PathBuf,

    /// Directory holding the bullet files
    pub changelog_dir: PathBuf,

    /// Version of the new release
    pub version: ReleaseVersion,

    /// Rewrite the changelog and delete the consumed bullet files
    pub in_place: bool,

    /// Release date written into the version header
    pub date: NaiveDate,
}

/// Result of a successful build
#[derive(Debug, Clone, PartialEq)]
pub struct BuildOutcome {
    /// The version that was released
    pub version: String,

    /// The new changelog document
    pub contents: String,

    /// Bullet files deleted after an in-place build
    pub removed_files: Vec<PathBuf>,

    pub warnings: Vec<CldrWarning>,
}

/// Builds the next release section of the changelog.
///
/// Nothing is written unless every bullet parsed and rendered. With
/// `in_place` the changelog is rewritten first and the bullet files are
/// deleted afterwards.
pub fn run_build(args: &BuildArgs, ctx: &RenderContext) -> Result<BuildOutcome> {
    let bullets = read_bullets(&args.changelog_dir)?;
    let existing = fs::read_to_string(&args.changelog)?;

    let version = resolve_version(&existing, &args.version)?;
    let mut warnings = Vec::new();
    if let ReleaseVersion::Explicit(raw) = &args.version {
        if let Err(e) = parse_version(raw) {
            warnings.push(CldrWarning::NonSemverVersion {
                version: raw.clone(),
                reason: e.to_string(),
            });
        }
    }

    let changelog_dir_name = args
        .changelog_dir
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| args.changelog_dir.display().to_string());

    let request = BuildRequest {
        new_version: &version,
        changelog_dir_name: &changelog_dir_name,
        date: args.date,
    };
    let contents = build_changelog(&existing, &bullets, &request, ctx)?;

    let mut removed_files = Vec::new();
    if args.in_place {
        info!("Writing release {} to {}", version, args.changelog.display());
        fs::write(&args.changelog, &contents)?;
        removed_files = remove_bullet_files(&args.changelog_dir)?;
    }

    Ok(BuildOutcome {
        version,
        contents,
        removed_files,
        warnings,
    })
}
