//! Folds changelog bullets into a new release section of CHANGELOG.md.
//!
//! The document is treated as three zones: everything before the unreleased
//! header, the unreleased section itself (replaced on every build), and
//! everything from the next header onward (kept verbatim).

use chrono::NaiveDate;
use regex::Regex;
use std::sync::LazyLock;

use crate::changelog_dir::{BulletMap, CLDR_URL};
use crate::domain::{next_version, Kind, RenderContext, VersionBump};
use crate::error::{CldrError, Result};

/// Header that opens the unreleased section.
pub const UNRELEASED_TITLE: &str = "## [Unreleased]";

static VERSION_HEADER_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^##[ ]*\[(?P<version>[^\]]+)\]").expect("Invalid regex"));

/// Line indices bounding the unreleased section.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnreleasedSection {
    /// Index of the unreleased header line
    pub start: usize,
    /// Index of the first header after it, if any
    pub end: Option<usize>,
}

#[derive(Debug, Clone, Copy)]
enum ScanState {
    BeforeUnreleased,
    InUnreleased { start: usize },
}

fn is_unreleased_header(line: &str) -> bool {
    let bare_title: String = UNRELEASED_TITLE
        .chars()
        .filter(|c| !matches!(c, '[' | ']'))
        .collect();
    line.starts_with(UNRELEASED_TITLE) || line.starts_with(&bare_title)
}

/// Finds the unreleased section within `lines`.
///
/// Returns `None` when no unreleased header exists. A section that runs to the
/// end of the document has no `end`.
pub fn locate_unreleased_section(lines: &[&str]) -> Option<UnreleasedSection> {
    let mut state = ScanState::BeforeUnreleased;

    for (i, line) in lines.iter().enumerate() {
        let line = line.trim();
        state = match state {
            ScanState::BeforeUnreleased if is_unreleased_header(line) => {
                ScanState::InUnreleased { start: i }
            }
            ScanState::InUnreleased { start } if line.starts_with('#') => {
                return Some(UnreleasedSection {
                    start,
                    end: Some(i),
                });
            }
            unchanged => unchanged,
        };
    }

    match state {
        ScanState::InUnreleased { start } => Some(UnreleasedSection { start, end: None }),
        ScanState::BeforeUnreleased => None,
    }
}

/// Extracts `X.Y.Z` from a `## [X.Y.Z](...)` release header.
pub fn previous_version(header: &str) -> Result<String> {
    VERSION_HEADER_REGEX
        .captures(header.trim())
        .map(|captures| captures["version"].to_string())
        .ok_or_else(|| {
            CldrError::document(format!(
                "Unable to parse a version from the following changelog header. \
                 Expected a line matching {:?}: {:?}",
                VERSION_HEADER_REGEX.as_str(),
                header
            ))
        })
}

/// Boilerplate kept at the top of the unreleased section.
pub fn unreleased_blurb(changelog_dir_name: &str, repo_url: &str) -> String {
    format!(
        "The unreleased section is unique in that we do not add content to it directly.\n\
         Instead, developers of this project add specially formatted bullets to files of\n\
         the form `{dir}/USER@BRANCH.md`. Refer to the [{dir}/README.md] file or the\n\
         [cldr] script (which consumes these bullets when a new version of this project\n\
         is released) for more information.\n\
         \n\
         [{dir}/README.md]: {repo}/tree/master/{dir}\n\
         [cldr]: {cldr}\n",
        dir = changelog_dir_name,
        repo = repo_url,
        cldr = CLDR_URL
    )
}

/// How the new release's version is chosen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReleaseVersion {
    Explicit(String),
    /// Bump the most recent release found below the unreleased section.
    Bump(VersionBump),
}

/// Resolves the version the next release will carry.
pub fn resolve_version(existing: &str, version: &ReleaseVersion) -> Result<String> {
    let bump = match version {
        ReleaseVersion::Explicit(version) => return Ok(version.clone()),
        ReleaseVersion::Bump(bump) => *bump,
    };

    let lines: Vec<&str> = existing.split('\n').collect();
    let end = locate_unreleased_section(&lines)
        .and_then(|section| section.end)
        .ok_or_else(|| {
            CldrError::document(format!(
                "Unable to bump the {} version: no released version follows the unreleased section",
                bump
            ))
        })?;

    next_version(&previous_version(lines[end])?, bump)
}

/// Inputs for a single release build besides the document and bullets.
#[derive(Debug, Clone)]
pub struct BuildRequest<'a> {
    pub new_version: &'a str,
    /// Directory name shown in the unreleased boilerplate (e.g. `changelog`)
    pub changelog_dir_name: &'a str,
    pub date: NaiveDate,
}

/// Produces the new changelog text.
///
/// Every bullet is rendered before anything is returned, so a failing tag
/// leaves the caller with nothing to write.
pub fn build_changelog(
    existing: &str,
    bullets: &BulletMap,
    request: &BuildRequest,
    ctx: &RenderContext,
) -> Result<String> {
    let repo_url = ctx.config.github_repo()?.url();
    let lines: Vec<&str> = existing.split('\n').collect();

    let section = locate_unreleased_section(&lines).ok_or_else(|| {
        CldrError::document(format!(
            "No unreleased section found. The unreleased section should have the \
             following form: '{}({}/compare/X.Y.Z...HEAD)'",
            UNRELEASED_TITLE, repo_url
        ))
    })?;

    let new_version_url = match section.end {
        Some(end) => format!(
            "{}/compare/{}...{}",
            repo_url,
            previous_version(lines[end])?,
            request.new_version
        ),
        None => format!("{}/releases/tag/{}", repo_url, request.new_version),
    };

    let mut contents = String::new();
    for line in &lines[..section.start] {
        contents.push_str(line);
        contents.push('\n');
    }

    contents.push_str(&format!(
        "{}({}/compare/{}...HEAD)\n",
        UNRELEASED_TITLE, repo_url, request.new_version
    ));
    contents.push_str(&format!(
        "\n{}\n\n",
        unreleased_blurb(request.changelog_dir_name, &repo_url)
    ));
    contents.push_str(&format!(
        "## [{}]({}) - {}\n\n",
        request.new_version,
        new_version_url,
        request.date.format("%Y-%m-%d")
    ));

    let mut first_subsection = true;
    for kind in Kind::in_section_order() {
        let Some(group) = bullets.get(&kind) else {
            continue;
        };

        if !first_subsection {
            contents.push('\n');
        }
        first_subsection = false;

        contents.push_str(&format!("### {}\n\n", kind.section_title()));
        for bullet in group {
            contents.push_str(&bullet.render(ctx)?);
            contents.push('\n');
        }
    }

    if let Some(end) = section.end {
        contents.push_str("\n\n");
        contents.push_str(&lines[end..].join("\n"));
    }

    Ok(contents)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Config, GithubRepo};
    use crate::domain::Bullet;

    const CONTENTS1: &str = "\
# ChangeLog

All notable changes to this project will be documented in this file.


## [Unreleased](https://github.com/bbugyi200/cldr/compare/0.9.9...HEAD)

This section's contents will just be overwritten by cldr anyway.

## [0.9.9](https://github.com/bbugyi200/cldr/compare/0.9.8...0.9.9) - 2021-08-08

### Fixed

* Fixed some bug.
";

    const CONTENTS2: &str = "\
# ChangeLog

All notable changes to this project will be documented in this file.


## Unreleased
";

    const PREAMBLE: &str = "\
# ChangeLog

All notable changes to this project will be documented in this file.


";

    fn config() -> Config {
        Config {
            github_repo: Some(GithubRepo::parse("https://github.com/bbugyi200/cldr").unwrap()),
            jira_base_url: Some("https://jira.prod.company.com".to_string()),
            jira_org: None,
        }
    }

    fn bullets(lines: &[&str]) -> BulletMap {
        let mut map = BulletMap::new();
        for line in lines {
            let bullet = Bullet::parse(line, "changelog").unwrap();
            map.entry(bullet.kind()).or_default().push(bullet);
        }
        map
    }

    fn request() -> BuildRequest<'static> {
        BuildRequest {
            new_version: "1.0.0",
            changelog_dir_name: "changelog",
            date: NaiveDate::from_ymd_opt(2021, 9, 1).unwrap(),
        }
    }

    fn unreleased_part() -> String {
        format!(
            "## [Unreleased](https://github.com/bbugyi200/cldr/compare/1.0.0...HEAD)\n\n{}\n\n",
            unreleased_blurb("changelog", "https://github.com/bbugyi200/cldr")
        )
    }

    #[test]
    fn test_locate_unreleased_section() {
        let lines: Vec<&str> = CONTENTS1.split('\n').collect();
        assert_eq!(
            locate_unreleased_section(&lines),
            Some(UnreleasedSection {
                start: 5,
                end: Some(9)
            })
        );

        let lines: Vec<&str> = CONTENTS2.split('\n').collect();
        assert_eq!(
            locate_unreleased_section(&lines),
            Some(UnreleasedSection { start: 5, end: None })
        );

        assert_eq!(locate_unreleased_section(&["# ChangeLog", "", "## [1.0.0]"]), None);
    }

    #[test]
    fn test_previous_version() {
        assert_eq!(
            previous_version("## [0.9.9](https://x/compare/0.9.8...0.9.9) - 2021-08-08").unwrap(),
            "0.9.9"
        );
        assert_eq!(previous_version("##[1.2.3]").unwrap(), "1.2.3");

        let err = previous_version("### Fixed").unwrap_err();
        assert!(matches!(err, CldrError::DocumentStructure(_)));
        assert!(err.to_string().contains("### Fixed"));
    }

    #[test]
    fn test_build_with_previous_release() {
        let config = config();
        let ctx = RenderContext::new(&config);
        let bullets = bullets(&["* add: Adding some feature."]);

        let output = build_changelog(CONTENTS1, &bullets, &request(), &ctx).unwrap();

        let expected = format!(
            "{}{}## [1.0.0](https://github.com/bbugyi200/cldr/compare/0.9.9...1.0.0) - 2021-09-01\n\
             \n\
             ### Added\n\
             \n\
             * Adding some feature.\n\
             \n\
             \n\
             ## [0.9.9](https://github.com/bbugyi200/cldr/compare/0.9.8...0.9.9) - 2021-08-08\n\
             \n\
             ### Fixed\n\
             \n\
             * Fixed some bug.\n",
            PREAMBLE,
            unreleased_part()
        );
        assert_eq!(output, expected);
    }

    #[test]
    fn test_build_without_previous_release() {
        let config = config();
        let ctx = RenderContext::new(&config);
        let bullets = bullets(&["- rm(foo-103): Removing some feature."]);

        let output = build_changelog(CONTENTS2, &bullets, &request(), &ctx).unwrap();

        let expected = format!(
            "{}{}## [1.0.0](https://github.com/bbugyi200/cldr/releases/tag/1.0.0) - 2021-09-01\n\
             \n\
             ### Removed\n\
             \n\
             * Removing some feature. ([FOO-103](https://jira.prod.company.com/browse/FOO-103))\n",
            PREAMBLE,
            unreleased_part()
        );
        assert_eq!(output, expected);
    }

    #[test]
    fn test_subsections_follow_section_title_order() {
        let config = config();
        let ctx = RenderContext::new(&config);
        let bullets = bullets(&[
            "* sec: Patched a hole.",
            "* misc: Tidied up.",
            "* add: Added a thing.",
            "* add: Added another thing.",
            "* chg: Changed a thing.",
        ]);

        let output = build_changelog(CONTENTS2, &bullets, &request(), &ctx).unwrap();
        let release = output.split("- 2021-09-01\n\n").nth(1).unwrap();

        assert_eq!(
            release,
            "### Added\n\n* Added a thing.\n* Added another thing.\n\n\
             ### Changed\n\n* Changed a thing.\n\n\
             ### Miscellaneous\n\n* Tidied up.\n\n\
             ### Security\n\n* Patched a hole.\n"
        );
    }

    #[test]
    fn test_build_preserves_trailing_history_verbatim() {
        let config = config();
        let ctx = RenderContext::new(&config);
        let bullets = bullets(&["* fix: Fixed.", "* fix: Fixed again."]);

        let output = build_changelog(CONTENTS1, &bullets, &request(), &ctx).unwrap();
        let tail_start = CONTENTS1.find("## [0.9.9]").unwrap();
        assert!(output.ends_with(&CONTENTS1[tail_start..]));
        assert!(output.starts_with(PREAMBLE));
    }

    #[test]
    fn test_header_on_first_line() {
        let config = config();
        let ctx = RenderContext::new(&config);
        let bullets = bullets(&["* add: Added."]);

        let output = build_changelog("## [Unreleased]\n", &bullets, &request(), &ctx).unwrap();
        assert!(output.starts_with("## [Unreleased](https://github.com/bbugyi200/cldr/compare/1.0.0...HEAD)\n"));
    }

    #[test]
    fn test_missing_unreleased_header() {
        let config = config();
        let ctx = RenderContext::new(&config);
        let bullets = bullets(&["* add: Added."]);

        let err = build_changelog("# ChangeLog\n\n## [1.0.0]\n", &bullets, &request(), &ctx)
            .unwrap_err();
        assert!(matches!(err, CldrError::DocumentStructure(_)));
        assert!(err
            .to_string()
            .contains("## [Unreleased](https://github.com/bbugyi200/cldr/compare/X.Y.Z...HEAD)"));
    }

    #[test]
    fn test_malformed_previous_header() {
        let config = config();
        let ctx = RenderContext::new(&config);
        let bullets = bullets(&["* add: Added."]);

        let err = build_changelog("## [Unreleased]\n\n## Next\n", &bullets, &request(), &ctx)
            .unwrap_err();
        assert!(matches!(err, CldrError::DocumentStructure(_)));
        assert!(err.to_string().contains("## Next"));
    }

    #[test]
    fn test_render_failure_aborts_build() {
        let mut config = config();
        config.jira_base_url = None;
        let ctx = RenderContext::new(&config);
        let bullets = bullets(&["* add(abc-1): Added."]);

        let err = build_changelog(CONTENTS1, &bullets, &request(), &ctx).unwrap_err();
        assert!(matches!(err, CldrError::Config(_)));
    }

    #[test]
    fn test_resolve_version() {
        assert_eq!(
            resolve_version(CONTENTS1, &ReleaseVersion::Explicit("2.0.0".to_string())).unwrap(),
            "2.0.0"
        );
        assert_eq!(
            resolve_version(CONTENTS1, &ReleaseVersion::Bump(VersionBump::Minor)).unwrap(),
            "0.10.0"
        );
        assert_eq!(
            resolve_version(CONTENTS1, &ReleaseVersion::Bump(VersionBump::Patch)).unwrap(),
            "0.9.10"
        );

        let err = resolve_version(CONTENTS2, &ReleaseVersion::Bump(VersionBump::Major)).unwrap_err();
        assert!(matches!(err, CldrError::DocumentStructure(_)));
    }
}
