use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use crate::config::Config;
use crate::domain::kind::Kind;
use crate::domain::tag::{self, Tag, TagRegistry};
use crate::error::{CldrError, Result};
use crate::git::Repository;

/// `("*"|"-") KIND ["(" TAGS ")"] ":" BODY`
///
/// The tag group is captured loosely; each comma-separated token is matched
/// against the tag registry afterwards so errors can name the exact token.
static BULLET_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^[*-][ ]*(?P<kind>[A-Za-z]+)[ ]*(?:\((?P<tags>[^)]+)\))?[ ]*:[ ]*(?P<body>.*)$",
    )
    .expect("Invalid regex")
});

/// Human-readable description of the bullet grammar.
pub const BULLET_EXPLANATION: &str = "\
Every bullet line must look like `* KIND(TAG_LIST): BODY` or `* KIND: BODY`.

* `KIND` is one of `add`, `chg`, `dep`, `fix`, `misc`, `rm` or `sec`.
* `BODY` is a sentence or two describing the change.
* `TAG_LIST` is one or more comma-separated `TAG`s, where a `TAG` is `bc` (marks
  a breaking change on `chg` and `rm` bullets), `GITHUB_ISSUE`, `GITHUB_PR`,
  `JIRA_ISSUE` or `RELATIVE_COMMIT`:
  * `GITHUB_ISSUE` has the form `#N`, `REPO#N` or `ORG/REPO#N`.
  * `GITHUB_PR` has the form `!N`, `REPO!N` or `ORG/REPO!N`.
  * `JIRA_ISSUE` has the form `ORG-N`, or just `N` when the 'jira_org' option is
    configured.
  * `RELATIVE_COMMIT` has the form `cN` and references the commit N commits
    before the one that added the bullet (`c0` is that commit itself). If the
    bullet's `BODY` is `...`, the referenced commit's subject is used instead.

For example, this bullet references the CSRE-103 Jira issue:
`* add(csre-103): Added the cldr script.`
";

/// Everything a bullet needs to render itself.
#[derive(Clone, Copy)]
pub struct RenderContext<'a> {
    pub config: &'a Config,
    /// Git history, consulted by relative commit tags only.
    pub history: Option<&'a dyn Repository>,
}

impl<'a> RenderContext<'a> {
    pub fn new(config: &'a Config) -> Self {
        RenderContext {
            config,
            history: None,
        }
    }

    pub fn with_history(mut self, history: &'a dyn Repository) -> Self {
        self.history = Some(history);
        self
    }
}

/// One parsed changelog entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bullet {
    line: String,
    changelog_dir: PathBuf,
    kind: Kind,
    tags: Vec<Tag>,
    body: String,
}

impl Bullet {
    /// Parses a single (non-blank) bullet line using the standard tag registry.
    pub fn parse(line: &str, changelog_dir: impl Into<PathBuf>) -> Result<Self> {
        Self::parse_with(TagRegistry::standard(), line, changelog_dir)
    }

    pub fn parse_with(
        registry: &TagRegistry,
        line: &str,
        changelog_dir: impl Into<PathBuf>,
    ) -> Result<Self> {
        let captures = BULLET_REGEX.captures(line).ok_or_else(|| {
            CldrError::parse(format!(
                "{}\nThe following line does not match the required form: {:?}",
                BULLET_EXPLANATION, line
            ))
        })?;

        let raw_kind = &captures["kind"];
        let kind: Kind = raw_kind.parse().map_err(|_| {
            CldrError::parse(format!(
                "An invalid bullet kind ({:?}) was detected in the following line:\n\n{:?}\n\n\
                 Use one of the following supported bullet kinds instead: {:?}",
                raw_kind.to_lowercase(),
                line,
                Kind::valid_names()
            ))
        })?;

        let tags = match captures.name("tags") {
            Some(group) => group
                .as_str()
                .split(',')
                .map(str::trim)
                .map(|raw| {
                    registry.match_tag(raw).ok_or_else(|| {
                        CldrError::parse(format!(
                            "The following tag does not match any known tag types: {:?}",
                            raw
                        ))
                    })
                })
                .collect::<Result<Vec<Tag>>>()?,
            None => Vec::new(),
        };

        if tags.iter().any(|t| matches!(t, Tag::BreakingChange(_))) {
            tag::check_breaking_change(kind, line)?;
        }

        Ok(Bullet {
            line: line.to_string(),
            changelog_dir: changelog_dir.into(),
            kind,
            tags,
            body: captures["body"].trim().to_string(),
        })
    }

    /// Renders the bullet as a markdown list item, without a trailing newline.
    ///
    /// Tags are applied left to right, each rewriting the previous output.
    pub fn render(&self, ctx: &RenderContext) -> Result<String> {
        self.tags
            .iter()
            .try_fold(format!("* {}", self.body), |line, tag| {
                tag.transform(self, &line, ctx)
            })
    }

    /// The raw line this bullet was parsed from.
    pub fn line(&self) -> &str {
        &self.line
    }

    pub fn changelog_dir(&self) -> &Path {
        &self.changelog_dir
    }

    pub fn kind(&self) -> Kind {
        self.kind
    }

    pub fn tags(&self) -> &[Tag] {
        &self.tags
    }

    pub fn body(&self) -> &str {
        &self.body
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GithubRepo;
    use crate::domain::tag::TagType;

    fn config() -> Config {
        Config {
            github_repo: Some(GithubRepo::parse("https://github.com/bbugyi200/cldr").unwrap()),
            jira_base_url: Some("https://jira.example.com".to_string()),
            jira_org: None,
        }
    }

    #[test]
    fn test_parse_simple_bullet() {
        let bullet = Bullet::parse("* add: Adding some feature.", "changelog").unwrap();
        assert_eq!(bullet.kind(), Kind::Add);
        assert!(bullet.tags().is_empty());
        assert_eq!(bullet.body(), "Adding some feature.");
        assert_eq!(bullet.line(), "* add: Adding some feature.");
        assert_eq!(bullet.changelog_dir(), Path::new("changelog"));

        let config = config();
        assert_eq!(
            bullet.render(&RenderContext::new(&config)).unwrap(),
            "* Adding some feature."
        );
    }

    #[test]
    fn test_parse_bullet_with_tags() {
        let line = "* chg (foo-103,!123,python-libs#456): Changing some feature.";
        let bullet = Bullet::parse(line, "changelog").unwrap();

        let types: Vec<TagType> = bullet.tags().iter().map(Tag::tag_type).collect();
        assert_eq!(
            types,
            vec![
                TagType::JiraIssue,
                TagType::GithubPullRequest,
                TagType::GithubIssue
            ]
        );

        let config = config();
        assert_eq!(
            bullet.render(&RenderContext::new(&config)).unwrap(),
            "* Changing some feature. (\
             [FOO-103](https://jira.example.com/browse/FOO-103), \
             [PR:#123](https://github.com/bbugyi200/cldr/pull/123), \
             [python-libs#456](https://github.com/bbugyi200/python-libs/issues/456))"
        );
    }

    #[test]
    fn test_render_is_stable() {
        let config = config();
        let ctx = RenderContext::new(&config);
        let bullet = Bullet::parse("- fix(#1, abc-2): Fixed.", "changelog").unwrap();
        assert_eq!(bullet.render(&ctx).unwrap(), bullet.render(&ctx).unwrap());
    }

    #[test]
    fn test_dash_marker_and_spacing() {
        let bullet = Bullet::parse("-   FIX  :   Fixed a bug.  ", "changelog").unwrap();
        assert_eq!(bullet.kind(), Kind::Fix);
        assert_eq!(bullet.body(), "Fixed a bug.");
    }

    #[test]
    fn test_breaking_change_rendering() {
        let config = config();
        let bullet = Bullet::parse("* chg(bc,#9): Changed the API.", "changelog").unwrap();
        assert_eq!(
            bullet.render(&RenderContext::new(&config)).unwrap(),
            "* *BREAKING CHANGE*: Changed the API. \
             ([#9](https://github.com/bbugyi200/cldr/issues/9))"
        );

        let bullet = Bullet::parse("* rm(bc): Removed the old API.", "changelog").unwrap();
        assert_eq!(
            bullet.render(&RenderContext::new(&config)).unwrap(),
            "* *BREAKING CHANGE*: Removed the old API."
        );
    }

    #[test]
    fn test_breaking_change_on_add_fails() {
        let err = Bullet::parse("* add(bc): Added something.", "changelog").unwrap_err();
        assert!(matches!(err, CldrError::Usage(_)));
        assert!(err.to_string().contains("breaking change"));
    }

    #[test]
    fn test_unknown_kind_error() {
        let err = Bullet::parse("* addd: Typo.", "changelog").unwrap_err();
        let msg = err.to_string();
        assert!(matches!(err, CldrError::Parse(_)));
        assert!(msg.contains("\"addd\""));
        for name in Kind::valid_names() {
            assert!(msg.contains(name));
        }
    }

    #[test]
    fn test_unknown_tag_error_names_token() {
        let err = Bullet::parse("* add(#1, ak7k2): Added.", "changelog").unwrap_err();
        assert!(err.to_string().contains("\"ak7k2\""));
    }

    #[test]
    fn test_malformed_line_includes_grammar() {
        let err = Bullet::parse("Just some text", "changelog").unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("* KIND(TAG_LIST): BODY"));
        assert!(msg.contains("\"Just some text\""));

        assert!(Bullet::parse("* add(): Empty tags.", "changelog").is_err());
        assert!(Bullet::parse("* add Missing colon.", "changelog").is_err());
    }
}
