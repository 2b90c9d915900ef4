use std::fmt;
use std::path::PathBuf;

/// Non-fatal conditions reported to the user while the command carries on.
#[derive(Debug, Clone, PartialEq)]
pub enum CldrWarning {
    /// The changelog directory holds no bullet files
    NoBulletFiles { dir: PathBuf },
    /// The requested release version is not a semantic version
    NonSemverVersion { version: String, reason: String },
    /// `user.email` could not be read, so `$USER` names the bullet file
    UserEmailUnavailable { fallback: String },
    /// A freshly added bullet could not be rendered for display
    PreviewUnavailable { line: String, reason: String },
    /// The bullet file did not change, so there is nothing to commit
    NothingToCommit { file: PathBuf },
}

impl fmt::Display for CldrWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CldrWarning::NoBulletFiles { dir } => {
                write!(f, "No bullet files found in {}", dir.display())
            }
            CldrWarning::NonSemverVersion { version, reason } => {
                write!(
                    f,
                    "Version '{}' is not a valid semantic version: {}",
                    version, reason
                )
            }
            CldrWarning::UserEmailUnavailable { fallback } => {
                write!(
                    f,
                    "Unable to read the git user.email setting; naming the bullet file after '{}'",
                    fallback
                )
            }
            CldrWarning::PreviewUnavailable { line, reason } => {
                write!(f, "Unable to preview bullet {:?}: {}", line, reason)
            }
            CldrWarning::NothingToCommit { file } => {
                write!(
                    f,
                    "Not committing since {} was not changed",
                    file.display()
                )
            }
        }
    }
}
