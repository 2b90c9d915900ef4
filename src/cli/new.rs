use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::changelog_dir::ensure_readme;
use crate::domain::{Bullet, Kind, RenderContext};
use crate::error::{CldrError, Result};
use crate::git::Repository;
use crate::warning::CldrWarning;

/// Arguments for adding a new bullet
#[derive(Debug, Clone, PartialEq)]
pub struct NewBulletArgs {
    pub kind: Kind,

    /// Bullet body; the editor is opened when absent
    pub body: Option<String>,

    pub tags: Vec<String>,

    /// Bullet file name without the `.md` extension; defaults to `USER@BRANCH`
    pub bullet_file_name: Option<String>,

    /// Commit the changed files with git
    pub commit: bool,

    pub changelog_dir: PathBuf,
}

/// Result of adding a bullet
#[derive(Debug, Clone, PartialEq)]
pub struct NewBulletOutcome {
    pub bullet_file: PathBuf,
    pub committed: bool,
    /// Rendered form of every bullet that was added
    pub preview: Vec<String>,
    pub warnings: Vec<CldrWarning>,
}

/// `* KIND(TAGS): ` or `* KIND: `
pub fn bullet_line_prefix(kind: Kind, tags: &[String]) -> String {
    if tags.is_empty() {
        format!("* {}: ", kind)
    } else {
        format!("* {}({}): ", kind, tags.join(","))
    }
}

pub fn commit_message(bullet_file: &Path) -> String {
    let name = bullet_file
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    format!("cldr: Add new changelog bullet(s) to the {} bullet file.", name)
}

/// `USER@BRANCH`, where USER is the local part of the git user e-mail.
pub fn default_bullet_file_stem(
    repo: &dyn Repository,
    warnings: &mut Vec<CldrWarning>,
) -> Result<String> {
    let user = match repo.user_email() {
        Some(email) => email.split('@').next().unwrap_or_default().to_string(),
        None => {
            let fallback = std::env::var("USER").map_err(|_| {
                CldrError::usage(
                    "Unable to determine a user name from git or $USER; pass --bullet-file-name",
                )
            })?;
            warnings.push(CldrWarning::UserEmailUnavailable {
                fallback: fallback.clone(),
            });
            fallback
        }
    };

    Ok(format!("{}@{}", user, repo.current_branch()?))
}

/// Appends a new bullet to the user's bullet file.
///
/// A given body is validated before anything touches the disk. Without one,
/// the bare line prefix is appended and `edit` is called with the file and
/// the cursor position just past the prefix.
pub fn run_new<F>(args: &NewBulletArgs, ctx: &RenderContext, edit: F) -> Result<NewBulletOutcome>
where
    F: FnOnce(&Path, usize, usize) -> Result<()>,
{
    let repo = ctx.history;
    if args.commit && repo.is_none() {
        return Err(CldrError::usage(
            "Not inside a git repository; pass --no-commit to add the bullet without committing",
        ));
    }

    let prefix = bullet_line_prefix(args.kind, &args.tags);
    if let Some(body) = &args.body {
        Bullet::parse(&format!("{}{}", prefix, body), &args.changelog_dir)?;
    }

    let mut warnings = Vec::new();
    let stem = match &args.bullet_file_name {
        Some(name) => name.strip_suffix(".md").unwrap_or(name).to_string(),
        None => {
            let repo = repo.ok_or_else(|| {
                CldrError::usage(
                    "Not inside a git repository; pass --bullet-file-name to name the bullet file",
                )
            })?;
            default_bullet_file_stem(repo, &mut warnings)?
        }
    };

    let mut git_paths = Vec::new();
    if let Some(readme) = ensure_readme(&args.changelog_dir)? {
        git_paths.push(readme);
    }

    let bullet_file = args.changelog_dir.join(format!("{}.md", stem));
    info!("Adding new '{}' bullet to the {} file.", args.kind, bullet_file.display());

    let old_contents = if bullet_file.exists() {
        fs::read_to_string(&bullet_file)?
    } else {
        String::new()
    };

    let mut appended = String::new();
    if !old_contents.is_empty() && !old_contents.ends_with('\n') {
        appended.push('\n');
    }
    appended.push_str(&prefix);
    if let Some(body) = &args.body {
        appended.push_str(body);
        appended.push('\n');
    }

    OpenOptions::new()
        .create(true)
        .append(true)
        .open(&bullet_file)?
        .write_all(appended.as_bytes())?;

    if args.body.is_none() {
        let line = old_contents.lines().count() + 1;
        let column = prefix.chars().count() + 1;
        edit(&bullet_file, line, column)?;
    }

    let new_contents = fs::read_to_string(&bullet_file)?;

    let mut committed = false;
    if let (true, Some(repo)) = (args.commit, repo) {
        if new_contents != old_contents {
            git_paths.push(bullet_file.clone());
            info!("Committing the following files using git: {:?}", git_paths);
            repo.commit_files(&git_paths, &commit_message(&bullet_file))?;
            committed = true;
        } else {
            warnings.push(CldrWarning::NothingToCommit {
                file: bullet_file.clone(),
            });
        }
    }

    let preview = preview_new_bullets(&old_contents, &new_contents, &args.changelog_dir, ctx, &mut warnings);

    Ok(NewBulletOutcome {
        bullet_file,
        committed,
        preview,
        warnings,
    })
}

/// Renders the lines added after `old`; failures become warnings.
fn preview_new_bullets(
    old: &str,
    new: &str,
    changelog_dir: &Path,
    ctx: &RenderContext,
    warnings: &mut Vec<CldrWarning>,
) -> Vec<String> {
    let mut preview = Vec::new();
    let added = new
        .lines()
        .skip(old.lines().count())
        .map(str::trim)
        .filter(|line| !line.is_empty());

    for line in added {
        match Bullet::parse(line, changelog_dir).and_then(|bullet| bullet.render(ctx)) {
            Ok(rendered) => preview.push(rendered),
            Err(e) => warnings.push(CldrWarning::PreviewUnavailable {
                line: line.to_string(),
                reason: e.to_string(),
            }),
        }
    }
    preview
}
