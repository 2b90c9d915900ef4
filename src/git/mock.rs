use crate::error::{CldrError, Result};
use crate::git::{CommitInfo, Repository};
use std::cell::RefCell;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// A commit recorded by [`MockRepository::commit_files`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedCommit {
    pub paths: Vec<PathBuf>,
    pub message: String,
}

/// Mock repository for testing without actual git operations
///
/// History is linear: commits are stored newest first.
pub struct MockRepository {
    history: Vec<CommitInfo>,
    blamed_lines: HashMap<(PathBuf, usize), String>,
    user_email: Option<String>,
    branch: String,
    recorded: RefCell<Vec<RecordedCommit>>,
}

impl MockRepository {
    /// Create a new empty mock repository on branch `main`
    pub fn new() -> Self {
        MockRepository {
            history: Vec::new(),
            blamed_lines: HashMap::new(),
            user_email: None,
            branch: "main".to_string(),
            recorded: RefCell::new(Vec::new()),
        }
    }

    /// Add a commit on top of the existing history
    pub fn push_commit(&mut self, hash: impl Into<String>, subject: impl Into<String>) {
        let hash = hash.into();
        let short_hash = hash.chars().take(7).collect();
        self.history.insert(
            0,
            CommitInfo {
                short_hash,
                hash,
                subject: subject.into(),
            },
        );
    }

    /// Attribute line `line_index` of `path` to commit `hash`
    pub fn set_blame(&mut self, path: impl Into<PathBuf>, line_index: usize, hash: impl Into<String>) {
        self.blamed_lines.insert((path.into(), line_index), hash.into());
    }

    pub fn set_user_email(&mut self, email: impl Into<String>) {
        self.user_email = Some(email.into());
    }

    pub fn set_branch(&mut self, branch: impl Into<String>) {
        self.branch = branch.into();
    }

    /// Commits made through [`Repository::commit_files`], oldest first
    pub fn recorded_commits(&self) -> Vec<RecordedCommit> {
        self.recorded.borrow().clone()
    }
}

impl Default for MockRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl Repository for MockRepository {
    fn blame_line(&self, path: &Path, line_index: usize) -> Result<String> {
        self.blamed_lines
            .get(&(path.to_path_buf(), line_index))
            .cloned()
            .ok_or_else(|| {
                CldrError::commit_lookup(format!(
                    "Line {} of {} has not been committed yet",
                    line_index + 1,
                    path.display()
                ))
            })
    }

    fn commit_back(&self, hash: &str, offset: usize) -> Result<CommitInfo> {
        let start = self
            .history
            .iter()
            .position(|commit| commit.hash == hash)
            .ok_or_else(|| CldrError::commit_lookup(format!("Unknown commit: {}", hash)))?;

        self.history.get(start + offset).cloned().ok_or_else(|| {
            CldrError::commit_lookup(format!(
                "Commit {} does not have {} ancestor commit(s)",
                hash, offset
            ))
        })
    }

    fn user_email(&self) -> Option<String> {
        self.user_email.clone()
    }

    fn current_branch(&self) -> Result<String> {
        Ok(self.branch.clone())
    }

    fn commit_files(&self, paths: &[PathBuf], message: &str) -> Result<()> {
        self.recorded.borrow_mut().push(RecordedCommit {
            paths: paths.to_vec(),
            message: message.to_string(),
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_repository_walk_back() {
        let mut repo = MockRepository::new();
        repo.push_commit("1111111aaaa", "First");
        repo.push_commit("2222222bbbb", "Second");
        repo.push_commit("3333333cccc", "Third");

        let info = repo.commit_back("3333333cccc", 0).unwrap();
        assert_eq!(info.subject, "Third");
        assert_eq!(info.short_hash, "3333333");

        assert_eq!(repo.commit_back("3333333cccc", 2).unwrap().subject, "First");
        assert!(repo.commit_back("3333333cccc", 3).is_err());
        assert!(repo.commit_back("deadbeef", 0).is_err());
    }

    #[test]
    fn test_mock_repository_blame() {
        let mut repo = MockRepository::new();
        repo.set_blame("changelog/a.md", 0, "abc");

        assert_eq!(repo.blame_line(Path::new("changelog/a.md"), 0).unwrap(), "abc");
        assert!(repo.blame_line(Path::new("changelog/a.md"), 1).is_err());
    }

    #[test]
    fn test_mock_repository_records_commits() {
        let repo = MockRepository::new();
        repo.commit_files(&[PathBuf::from("a.md")], "msg").unwrap();

        let commits = repo.recorded_commits();
        assert_eq!(commits.len(), 1);
        assert_eq!(commits[0].message, "msg");
    }

    #[test]
    fn test_mock_repository_default() {
        let repo = MockRepository::default();
        assert_eq!(repo.current_branch().unwrap(), "main");
        assert_eq!(repo.user_email(), None);
    }
}
