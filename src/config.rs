use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use url::Url;

use crate::error::{CldrError, Result};

/// Project-local configuration file name.
pub const CONFIG_FILE_NAME: &str = "cldr.toml";

/// Python project file whose `[tool.cldr]` table is also honoured.
pub const PYPROJECT_FILE_NAME: &str = "pyproject.toml";

/// Environment variables that override values read from a config file.
pub const ENV_GITHUB_REPO: &str = "CLDR_GITHUB_REPO";
pub const ENV_JIRA_BASE_URL: &str = "CLDR_JIRA_BASE_URL";
pub const ENV_JIRA_ORG: &str = "CLDR_JIRA_ORG";

/// A GitHub repository URL of the canonical form `https://HOST/ORG/REPO`.
///
/// Issue, pull request and commit links are resolved against this value, so
/// anything that does not have exactly that shape is rejected up front.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct GithubRepo {
    host_url: String,
    org: String,
    repo: String,
}

impl GithubRepo {
    /// Parses and validates a repository URL.
    pub fn parse(raw: &str) -> Result<Self> {
        let invalid = |reason: &str| {
            CldrError::config(format!(
                "Invalid 'github_repo' value {:?}: {}. Expected a URL of the form \
                 https://HOST/ORG/REPO",
                raw, reason
            ))
        };

        let url = Url::parse(raw).map_err(|e| invalid(&e.to_string()))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(invalid("the scheme must be http or https"));
        }
        if url.query().is_some() || url.fragment().is_some() {
            return Err(invalid("query strings and fragments are not allowed"));
        }

        let host = url.host_str().ok_or_else(|| invalid("the URL has no host"))?;
        let host_url = match url.port() {
            Some(port) => format!("{}://{}:{}", url.scheme(), host, port),
            None => format!("{}://{}", url.scheme(), host),
        };

        let segments: Vec<&str> = url.path_segments().map(|s| s.collect()).unwrap_or_default();
        match segments.as_slice() {
            [org, repo] if !org.is_empty() && !repo.is_empty() => Ok(GithubRepo {
                host_url,
                org: org.to_string(),
                repo: repo.to_string(),
            }),
            _ => Err(invalid("the path must be exactly /ORG/REPO")),
        }
    }

    /// `https://HOST`
    pub fn host_url(&self) -> &str {
        &self.host_url
    }

    /// `https://HOST/ORG`
    pub fn org_url(&self) -> String {
        format!("{}/{}", self.host_url, self.org)
    }

    /// `https://HOST/ORG/REPO`
    pub fn url(&self) -> String {
        format!("{}/{}/{}", self.host_url, self.org, self.repo)
    }

    pub fn org(&self) -> &str {
        &self.org
    }

    pub fn repo(&self) -> &str {
        &self.repo
    }
}

impl fmt::Display for GithubRepo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.url())
    }
}

impl TryFrom<String> for GithubRepo {
    type Error = CldrError;

    fn try_from(value: String) -> Result<Self> {
        GithubRepo::parse(&value)
    }
}

impl From<GithubRepo> for String {
    fn from(value: GithubRepo) -> Self {
        value.url()
    }
}

/// Represents the complete configuration for cldr.
///
/// Every field is optional on disk; the accessors report a configuration
/// error naming the missing setting when an operation actually needs it.
#[derive(Debug, Default, Deserialize, Serialize, Clone, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub github_repo: Option<GithubRepo>,

    #[serde(default)]
    pub jira_base_url: Option<String>,

    #[serde(default)]
    pub jira_org: Option<String>,
}

impl Config {
    /// Returns the configured GitHub repository.
    pub fn github_repo(&self) -> Result<&GithubRepo> {
        self.github_repo.as_ref().ok_or_else(|| {
            CldrError::config(
                "The 'github_repo' configuration option MUST be set (for example \
                 github_repo = \"https://github.com/ORG/REPO\" in cldr.toml or in the \
                 [tool.cldr] section of pyproject.toml).",
            )
        })
    }

    /// Returns the Jira base URL without a trailing slash.
    pub fn jira_base_url(&self) -> Result<&str> {
        self.jira_base_url
            .as_deref()
            .map(|url| url.trim_end_matches('/'))
            .ok_or_else(|| {
                CldrError::config(
                    "The 'jira_base_url' configuration option MUST be set in order to use \
                     Jira issue tags.",
                )
            })
    }

    /// Returns the Jira organization prefix, upper-cased.
    pub fn jira_org(&self) -> Option<String> {
        self.jira_org.as_ref().map(|org| org.to_uppercase())
    }

    /// Applies overrides from a variable lookup (normally the process environment).
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(repo) = lookup(ENV_GITHUB_REPO) {
            self.github_repo = Some(GithubRepo::parse(&repo)?);
        }
        if let Some(url) = lookup(ENV_JIRA_BASE_URL) {
            self.jira_base_url = Some(url);
        }
        if let Some(org) = lookup(ENV_JIRA_ORG) {
            self.jira_org = Some(org);
        }
        self.validate()
    }

    fn validate(&self) -> Result<()> {
        if let Some(jira_base_url) = &self.jira_base_url {
            Url::parse(jira_base_url).map_err(|e| {
                CldrError::config(format!(
                    "Invalid 'jira_base_url' value {:?}: {}",
                    jira_base_url, e
                ))
            })?;
        }
        Ok(())
    }
}

/// Loads configuration relative to the current directory.
///
/// See [`load_config_in`] for the lookup order.
pub fn load_config(config_path: Option<&Path>) -> Result<Config> {
    load_config_in(Path::new("."), config_path)
}

/// Loads configuration from file or returns defaults.
///
/// Attempts to load configuration in the following order:
/// 1. Custom path provided as parameter
/// 2. `cldr.toml` in `base_dir`
/// 3. The `[tool.cldr]` table of `pyproject.toml` in `base_dir`
/// 4. `cldr/config.toml` in the user config directory
/// 5. Default (empty) configuration if no file found
///
/// `CLDR_*` environment variables are applied on top of whichever source won.
pub fn load_config_in(base_dir: &Path, config_path: Option<&Path>) -> Result<Config> {
    let local_config = base_dir.join(CONFIG_FILE_NAME);

    let mut config = if let Some(path) = config_path {
        parse_config_file(path)?
    } else if local_config.exists() {
        parse_config_file(&local_config)?
    } else if let Some(config) = load_pyproject(&base_dir.join(PYPROJECT_FILE_NAME))? {
        config
    } else if let Some(path) = user_config_path().filter(|p| p.exists()) {
        parse_config_file(&path)?
    } else {
        Config::default()
    };

    config.apply_overrides(|key| std::env::var(key).ok())?;
    Ok(config)
}

/// Parses a standalone cldr TOML file.
pub fn parse_config_file(path: &Path) -> Result<Config> {
    let contents = fs::read_to_string(path).map_err(|e| {
        CldrError::config(format!("Unable to read {}: {}", path.display(), e))
    })?;
    toml::from_str(&contents)
        .map_err(|e| CldrError::config(format!("Unable to parse {}: {}", path.display(), e)))
}

/// Reads the `[tool.cldr]` table of a pyproject.toml file, if both exist.
pub fn load_pyproject(path: &Path) -> Result<Option<Config>> {
    if !path.exists() {
        return Ok(None);
    }

    let contents = fs::read_to_string(path)?;
    let document: toml::Table = toml::from_str(&contents)
        .map_err(|e| CldrError::config(format!("Unable to parse {}: {}", path.display(), e)))?;

    let section = document
        .get("tool")
        .and_then(|tool| tool.get("cldr"))
        .cloned();

    match section {
        Some(section) => section.try_into::<Config>().map(Some).map_err(|e| {
            CldrError::config(format!(
                "Invalid [tool.cldr] section in {}: {}",
                path.display(),
                e
            ))
        }),
        None => Ok(None),
    }
}

fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("cldr").join("config.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_github_repo_parse() {
        let repo = GithubRepo::parse("https://github.com/bbugyi200/cldr").unwrap();
        assert_eq!(repo.host_url(), "https://github.com");
        assert_eq!(repo.org_url(), "https://github.com/bbugyi200");
        assert_eq!(repo.url(), "https://github.com/bbugyi200/cldr");
        assert_eq!(repo.org(), "bbugyi200");
        assert_eq!(repo.repo(), "cldr");
    }

    #[test]
    fn test_github_repo_keeps_port() {
        let repo = GithubRepo::parse("http://git.internal:8080/team/tool").unwrap();
        assert_eq!(repo.host_url(), "http://git.internal:8080");
        assert_eq!(repo.url(), "http://git.internal:8080/team/tool");
    }

    #[test]
    fn test_github_repo_rejects_non_canonical_shapes() {
        let bad = [
            "https://github.com/bbugyi200/cldr/",
            "https://github.com/bbugyi200",
            "https://github.com/a/b/c",
            "https://github.com",
            "ftp://github.com/a/b",
            "github.com/a/b",
            "https://github.com/a/b?tab=issues",
        ];

        for raw in bad {
            let err = GithubRepo::parse(raw).unwrap_err();
            assert!(
                err.to_string().contains("github_repo"),
                "expected error for {:?}, got {}",
                raw,
                err
            );
        }
    }

    #[test]
    fn test_missing_github_repo_names_setting() {
        let config = Config::default();
        let err = config.github_repo().unwrap_err();
        assert!(err.to_string().contains("'github_repo'"));
    }

    #[test]
    fn test_jira_accessors() {
        let config = Config {
            github_repo: None,
            jira_base_url: Some("https://jira.example.com/".to_string()),
            jira_org: Some("csre".to_string()),
        };
        assert_eq!(config.jira_base_url().unwrap(), "https://jira.example.com");
        assert_eq!(config.jira_org(), Some("CSRE".to_string()));

        let err = Config::default().jira_base_url().unwrap_err();
        assert!(err.to_string().contains("'jira_base_url'"));
    }

    #[test]
    fn test_deserialize_validates_github_repo() {
        let config: Config = toml::from_str(
            r#"
github_repo = "https://github.com/org/repo"
jira_org = "abc"
"#,
        )
        .unwrap();
        assert_eq!(config.github_repo().unwrap().url(), "https://github.com/org/repo");

        let result: std::result::Result<Config, _> =
            toml::from_str(r#"github_repo = "https://github.com/org""#);
        assert!(result.is_err());
    }

    #[test]
    fn test_apply_overrides() {
        let mut config = Config::default();
        let vars: HashMap<&str, &str> = [
            (ENV_GITHUB_REPO, "https://github.com/org/repo"),
            (ENV_JIRA_ORG, "xyz"),
        ]
        .into_iter()
        .collect();

        config
            .apply_overrides(|key| vars.get(key).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(config.github_repo().unwrap().repo(), "repo");
        assert_eq!(config.jira_org(), Some("XYZ".to_string()));
        assert!(config.jira_base_url.is_none());
    }

    #[test]
    fn test_apply_overrides_rejects_bad_jira_url() {
        let mut config = Config::default();
        let result = config.apply_overrides(|key| {
            (key == ENV_JIRA_BASE_URL).then(|| "not a url".to_string())
        });
        assert!(result.is_err());
    }
}
