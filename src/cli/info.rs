use serde::Serialize;
use std::path::Path;

use crate::changelog_dir::{bullet_files, read_bullets};
use crate::config::Config;
use crate::domain::{Bullet, Kind};
use crate::error::Result;
use crate::warning::CldrWarning;

// Field order is alphabetical so the serialized keys come out sorted.

/// Snapshot of cldr's state, printed by `cldr info`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InfoReport {
    pub bullets: Vec<BulletInfo>,
    pub config: ConfigInfo,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BulletInfo {
    pub body: String,
    pub kind: Kind,
    pub tags: Vec<String>,
}

impl From<&Bullet> for BulletInfo {
    fn from(bullet: &Bullet) -> Self {
        BulletInfo {
            body: bullet.body().to_string(),
            kind: bullet.kind(),
            tags: bullet.tags().iter().map(|tag| tag.raw().to_string()).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConfigInfo {
    pub changelog_dir: String,
    pub github_repo: Option<String>,
    pub jira_base_url: Option<String>,
    pub jira_org: Option<String>,
}

impl InfoReport {
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Collects every parsed bullet (ordered by kind) along with the active configuration.
///
/// A missing or empty changelog directory is reported as a warning, not an error.
pub fn collect_info(changelog_dir: &Path, config: &Config) -> Result<(InfoReport, Vec<CldrWarning>)> {
    let mut warnings = Vec::new();

    let has_bullet_files = changelog_dir.is_dir() && !bullet_files(changelog_dir)?.is_empty();
    let bullets = if has_bullet_files {
        read_bullets(changelog_dir)?
            .values()
            .flatten()
            .map(BulletInfo::from)
            .collect()
    } else {
        warnings.push(CldrWarning::NoBulletFiles {
            dir: changelog_dir.to_path_buf(),
        });
        Vec::new()
    };

    let config = ConfigInfo {
        changelog_dir: changelog_dir.display().to_string(),
        github_repo: config.github_repo.as_ref().map(|repo| repo.url()),
        jira_base_url: config.jira_base_url.clone(),
        jira_org: config.jira_org.clone(),
    };

    Ok((InfoReport { bullets, config }, warnings))
}
