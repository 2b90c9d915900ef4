//! The changelog directory: per-developer bullet files plus a README.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::domain::{Bullet, Kind, BULLET_EXPLANATION};
use crate::error::{CldrError, Result};

/// Reserved file in the changelog directory that never holds bullets.
pub const README_FILE_NAME: &str = "README.md";

/// Project home, linked from generated documentation.
pub const CLDR_URL: &str = "https://github.com/bbugyi200/cldr";

/// Parsed bullets grouped by kind, in file then line order within each kind.
pub type BulletMap = BTreeMap<Kind, Vec<Bullet>>;

/// Expected contents of the changelog directory's README.md.
pub fn readme_contents() -> String {
    format!(
        "# Changelog Bullet Files\n\
         \n\
         This directory should contain markdown files of the form `USER@BRANCH.md`. Each\n\
         of these files should contain one or more bullets of the form described below.\n\
         These bullets will be consumed by [cldr] when a new version of this project is\n\
         released.\n\
         \n\
         {}\n\
         [cldr]: {}\n",
        BULLET_EXPLANATION, CLDR_URL
    )
}

/// Markdown bullet files in `dir`, excluding README.md, sorted by path.
pub fn bullet_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        let is_markdown = path.extension().is_some_and(|ext| ext == "md");
        let is_readme = path
            .file_name()
            .is_some_and(|name| name == README_FILE_NAME);
        if is_markdown && !is_readme && path.is_file() {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Reads and parses every bullet in `dir`.
///
/// Stops at the first line that fails to parse; the error carries that line.
pub fn read_bullets(dir: &Path) -> Result<BulletMap> {
    if !dir.is_dir() {
        return Err(CldrError::DirectoryNotFound(dir.to_path_buf()));
    }

    let files = bullet_files(dir)?;
    if files.is_empty() {
        return Err(CldrError::NoBulletsFound(dir.to_path_buf()));
    }

    let mut bullets = BulletMap::new();
    for path in &files {
        info!("Consuming bullets from the {} file...", path.display());
        let contents = fs::read_to_string(path)?;

        for line in contents.lines().map(str::trim).filter(|l| !l.is_empty()) {
            let bullet = Bullet::parse(line, dir).map_err(|e| CldrError::invalid_bullet(line, e))?;
            bullets.entry(bullet.kind()).or_default().push(bullet);
        }
    }

    Ok(bullets)
}

/// Finds the bullet file and zero-based line index holding `line`.
///
/// Lines are compared after trimming; the first match in file order wins.
pub fn locate_line(dir: &Path, line: &str) -> Result<(PathBuf, usize)> {
    for path in bullet_files(dir)? {
        let contents = fs::read_to_string(&path)?;
        if let Some(index) = contents.lines().position(|l| l.trim() == line) {
            return Ok((path, index));
        }
    }

    Err(CldrError::commit_lookup(format!(
        "Unable to find the bullet line {:?} in any bullet file in {}",
        line,
        dir.display()
    )))
}

/// Creates `dir` if needed and (re)writes its README.md when absent or stale.
///
/// Returns the README path when it was written.
pub fn ensure_readme(dir: &Path) -> Result<Option<PathBuf>> {
    if !dir.exists() {
        info!("Creating {} directory...", dir.display());
        fs::create_dir_all(dir)?;
    }

    let readme = dir.join(README_FILE_NAME);
    let expected = readme_contents();
    match fs::read_to_string(&readme) {
        Ok(current) if current == expected => return Ok(None),
        Ok(_) => info!("Updating the {} file's contents...", readme.display()),
        Err(_) => info!("Initializing {} contents...", readme.display()),
    }

    fs::write(&readme, expected)?;
    Ok(Some(readme))
}

/// Deletes every bullet file in `dir`, returning the deleted paths.
pub fn remove_bullet_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let files = bullet_files(dir)?;
    for path in &files {
        info!("Removing consumed bullet file {}", path.display());
        fs::remove_file(path)?;
    }
    Ok(files)
}
