//! Changelog bullet tags.
//!
//! A bullet may carry a comma-separated list of tags (`* chg(bc,#12): ...`).
//! Each tag is recognised by one registered grammar and knows how to rewrite
//! the bullet's rendered markdown line.

use regex::Regex;
use std::fmt;
use std::sync::LazyLock;

use crate::changelog_dir;
use crate::config::GithubRepo;
use crate::domain::bullet::{Bullet, RenderContext};
use crate::domain::kind::Kind;
use crate::error::{CldrError, Result};

/// Kinds that may be marked as a breaking change.
pub const BREAKING_CHANGE_KINDS: [Kind; 2] = [Kind::Chg, Kind::Rm];

/// Body placeholder replaced by the referenced commit's subject.
pub const COMMIT_SUBJECT_PLACEHOLDER: &str = "...";

static STANDARD_REGISTRY: LazyLock<TagRegistry> = LazyLock::new(|| {
    TagRegistry::from_types(&[
        TagType::BreakingChange,
        TagType::GithubIssue,
        TagType::GithubPullRequest,
        TagType::JiraIssue,
        TagType::RelativeCommit,
    ])
    .expect("Invalid tag regex")
});

/// The grammars a raw tag can match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagType {
    BreakingChange,
    GithubIssue,
    GithubPullRequest,
    JiraIssue,
    RelativeCommit,
}

impl TagType {
    /// Regular expression fragment matching this tag's textual form.
    pub fn pattern(&self) -> String {
        match self {
            TagType::BreakingChange => "bc".to_string(),
            TagType::GithubIssue => github_pattern(ISSUE.sigil),
            TagType::GithubPullRequest => github_pattern(PULL_REQUEST.sigil),
            TagType::JiraIssue => "(?:[A-Za-z]+-)?[1-9][0-9]*".to_string(),
            TagType::RelativeCommit => "c(?:0|[1-9][0-9]*)".to_string(),
        }
    }
}

/// `#N`, `REPO#N` or `ORG/REPO#N` (with `sigil` in place of `#`).
fn github_pattern(sigil: char) -> String {
    let name = format!(r"[^/{}(),\s]+", sigil);
    format!(
        "{s}{n}|{name}{s}{n}|{name}/{name}{s}{n}",
        s = sigil,
        n = "[1-9][0-9]*",
        name = name
    )
}

/// One registered tag grammar.
#[derive(Debug, Clone)]
pub struct TagDescriptor {
    tag_type: TagType,
    pattern: String,
}

impl TagDescriptor {
    pub fn tag_type(&self) -> TagType {
        self.tag_type
    }
}

/// Ordered collection of tag grammars.
///
/// All grammars are compiled into one anchored alternation; when a raw tag
/// could match more than one grammar the first registered one wins.
#[derive(Debug)]
pub struct TagRegistry {
    descriptors: Vec<TagDescriptor>,
    matcher: Regex,
}

impl TagRegistry {
    /// The registry used for all bullet parsing.
    pub fn standard() -> &'static TagRegistry {
        &STANDARD_REGISTRY
    }

    /// Builds a registry whose match precedence follows the order of `types`.
    pub fn from_types(types: &[TagType]) -> Result<Self> {
        let descriptors: Vec<TagDescriptor> = types
            .iter()
            .map(|tag_type| TagDescriptor {
                tag_type: *tag_type,
                pattern: tag_type.pattern(),
            })
            .collect();

        let alternatives: Vec<String> = descriptors
            .iter()
            .enumerate()
            .map(|(i, d)| format!("(?P<t{}>{})", i, d.pattern))
            .collect();
        let matcher = Regex::new(&format!("^(?:{})$", alternatives.join("|")))
            .map_err(|e| CldrError::parse(format!("Invalid tag grammar: {}", e)))?;

        Ok(TagRegistry {
            descriptors,
            matcher,
        })
    }

    pub fn descriptors(&self) -> &[TagDescriptor] {
        &self.descriptors
    }

    /// Instantiates the first registered tag type whose grammar matches `raw` in full.
    pub fn match_tag(&self, raw: &str) -> Option<Tag> {
        let captures = self.matcher.captures(raw)?;
        self.descriptors
            .iter()
            .enumerate()
            .find(|(i, _)| captures.name(&format!("t{}", i)).is_some())
            .map(|(_, descriptor)| Tag::new(descriptor.tag_type, raw))
    }
}

/// A parsed tag, carrying the raw text it was written as.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Tag {
    BreakingChange(String),
    GithubIssue(String),
    GithubPullRequest(String),
    JiraIssue(String),
    RelativeCommit(String),
}

impl Tag {
    pub fn new(tag_type: TagType, raw: impl Into<String>) -> Self {
        let raw = raw.into();
        match tag_type {
            TagType::BreakingChange => Tag::BreakingChange(raw),
            TagType::GithubIssue => Tag::GithubIssue(raw),
            TagType::GithubPullRequest => Tag::GithubPullRequest(raw),
            TagType::JiraIssue => Tag::JiraIssue(raw),
            TagType::RelativeCommit => Tag::RelativeCommit(raw),
        }
    }

    pub fn tag_type(&self) -> TagType {
        match self {
            Tag::BreakingChange(_) => TagType::BreakingChange,
            Tag::GithubIssue(_) => TagType::GithubIssue,
            Tag::GithubPullRequest(_) => TagType::GithubPullRequest,
            Tag::JiraIssue(_) => TagType::JiraIssue,
            Tag::RelativeCommit(_) => TagType::RelativeCommit,
        }
    }

    /// The tag exactly as written in the bullet line.
    pub fn raw(&self) -> &str {
        match self {
            Tag::BreakingChange(raw)
            | Tag::GithubIssue(raw)
            | Tag::GithubPullRequest(raw)
            | Tag::JiraIssue(raw)
            | Tag::RelativeCommit(raw) => raw,
        }
    }

    /// Rewrites `line` (the bullet rendered so far) for this tag.
    ///
    /// `RelativeCommit` consults git history at call time, so its output
    /// follows the repository state; every other tag is a pure function of
    /// the bullet and configuration.
    pub fn transform(&self, bullet: &Bullet, line: &str, ctx: &RenderContext) -> Result<String> {
        match self {
            Tag::BreakingChange(_) => {
                check_breaking_change(bullet.kind(), bullet.line())?;
                let rest = line.strip_prefix("* ").unwrap_or(line);
                Ok(format!("* *BREAKING CHANGE*: {}", rest))
            }
            Tag::GithubIssue(raw) => github_link(ctx.config.github_repo()?, &ISSUE, raw, line),
            Tag::GithubPullRequest(raw) => {
                github_link(ctx.config.github_repo()?, &PULL_REQUEST, raw, line)
            }
            Tag::JiraIssue(raw) => jira_link(ctx, raw, line),
            Tag::RelativeCommit(raw) => relative_commit_link(bullet, raw, line, ctx),
        }
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.raw())
    }
}

/// Fails unless `kind` may carry the breaking-change tag.
pub fn check_breaking_change(kind: Kind, line: &str) -> Result<()> {
    if BREAKING_CHANGE_KINDS.contains(&kind) {
        return Ok(());
    }

    let allowed: Vec<&str> = BREAKING_CHANGE_KINDS.iter().map(Kind::as_str).collect();
    Err(CldrError::usage(format!(
        "Bullets of this kind cannot be marked as a \"breaking change\" (i.e. {:?} not in {:?}): {:?}",
        kind.as_str(),
        allowed,
        line
    )))
}

struct GithubRef {
    sigil: char,
    url_node: &'static str,
    label_prefix: &'static str,
}

const ISSUE: GithubRef = GithubRef {
    sigil: '#',
    url_node: "issues",
    label_prefix: "",
};

const PULL_REQUEST: GithubRef = GithubRef {
    sigil: '!',
    url_node: "pull",
    label_prefix: "PR:",
};

/// Resolves an issue or pull request tag against the configured repository.
fn github_url(repo: &GithubRepo, kind: &GithubRef, raw: &str) -> Result<String> {
    let (target, number) = raw.split_once(kind.sigil).ok_or_else(|| {
        CldrError::parse(format!("Tag {:?} is missing the {:?} sigil", raw, kind.sigil))
    })?;

    let base = if target.is_empty() {
        repo.url()
    } else if target.contains('/') {
        format!("{}/{}", repo.host_url(), target)
    } else {
        format!("{}/{}", repo.org_url(), target)
    };

    Ok(format!("{}/{}/{}", base, kind.url_node, number))
}

fn github_link(repo: &GithubRepo, kind: &GithubRef, raw: &str, line: &str) -> Result<String> {
    let url = github_url(repo, kind, raw)?;
    let label = format!("{}{}", kind.label_prefix, raw.replace(kind.sigil, "#"));
    Ok(add_to_paren_group(line, &format!("[{}]({})", label, url)))
}

fn jira_link(ctx: &RenderContext, raw: &str, line: &str) -> Result<String> {
    let base_url = ctx.config.jira_base_url()?;

    let key = if raw.starts_with(|c: char| c.is_ascii_digit()) {
        let org = ctx.config.jira_org().ok_or_else(|| {
            CldrError::config(format!(
                "The tag {:?} appears to reference a Jira issue by number only, but the \
                 'jira_org' option is not set.",
                raw
            ))
        })?;
        format!("{}-{}", org, raw)
    } else {
        raw.to_uppercase()
    };

    let link = format!("[{}]({}/browse/{})", key, base_url, key);
    Ok(add_to_paren_group(line, &link))
}

fn relative_commit_link(bullet: &Bullet, raw: &str, line: &str, ctx: &RenderContext) -> Result<String> {
    let repo = ctx.config.github_repo()?;
    let history = ctx.history.ok_or_else(|| {
        CldrError::commit_lookup(format!(
            "The {:?} tag can only be resolved inside a git repository",
            raw
        ))
    })?;
    let offset: usize = raw[1..]
        .parse()
        .map_err(|_| CldrError::parse(format!("Invalid relative commit tag: {:?}", raw)))?;

    let (bullet_file, line_index) = changelog_dir::locate_line(bullet.changelog_dir(), bullet.line())?;
    let introduced_by = history.blame_line(&bullet_file, line_index)?;
    let commit = history.commit_back(&introduced_by, offset)?;

    let line = if bullet.body() == COMMIT_SUBJECT_PLACEHOLDER {
        line.replacen(COMMIT_SUBJECT_PLACEHOLDER, &punctuate(&commit.subject), 1)
    } else {
        line.to_string()
    };

    let link = format!("[{}]({}/commit/{})", commit.short_hash, repo.url(), commit.hash);
    Ok(add_to_paren_group(&line, &link))
}

/// Terminates a commit subject with a period unless it already ends in `.`, `!` or `?`.
fn punctuate(subject: &str) -> String {
    let subject = subject.trim_end();
    if subject.ends_with(['.', '!', '?']) {
        subject.to_string()
    } else {
        format!("{}.", subject)
    }
}

/// Appends `link` to the parenthesized group ending the line, creating it if absent.
pub fn add_to_paren_group(line: &str, link: &str) -> String {
    match line.strip_suffix(')') {
        Some(head) if head.contains('(') => format!("{}, {})", head, link),
        _ => format!("{} ({})", line, link),
    }
}
