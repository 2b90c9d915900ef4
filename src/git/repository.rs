use crate::error::{CldrError, Result};
use crate::git::CommitInfo;
use git2::{Commit, ErrorCode, Oid, Repository as Git2Repo, Sort};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Wrapper around git2::Repository with our trait interface
pub struct Git2Repository {
    repo: Git2Repo,
}

impl Git2Repository {
    /// Open or discover a git repository
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let repo = Git2Repo::discover(path)?;

        Ok(Git2Repository { repo })
    }

    /// Create from existing git2::Repository
    pub fn from_git2(repo: Git2Repo) -> Self {
        Git2Repository { repo }
    }

    /// Path of `path` relative to the repository's working directory.
    fn relative_path(&self, path: &Path) -> Result<PathBuf> {
        let workdir = self
            .repo
            .workdir()
            .ok_or_else(|| CldrError::commit_lookup("The git repository has no working directory"))?
            .canonicalize()?;
        let absolute = path.canonicalize()?;

        absolute
            .strip_prefix(&workdir)
            .map(Path::to_path_buf)
            .map_err(|_| {
                CldrError::commit_lookup(format!(
                    "{} is not inside the git repository at {}",
                    path.display(),
                    workdir.display()
                ))
            })
    }

    fn head_commit(&self) -> Result<Option<Commit<'_>>> {
        match self.repo.head() {
            Ok(head) => Ok(Some(head.peel_to_commit()?)),
            Err(e) if matches!(e.code(), ErrorCode::UnbornBranch | ErrorCode::NotFound) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

impl super::Repository for Git2Repository {
    fn blame_line(&self, path: &Path, line_index: usize) -> Result<String> {
        let relative = self.relative_path(path)?;

        let committed = self.repo.blame_file(&relative, None).map_err(|e| {
            CldrError::commit_lookup(format!(
                "Unable to blame {}: {}",
                relative.display(),
                e.message()
            ))
        })?;

        // Blame the working tree contents so uncommitted edits are not
        // attributed to whichever commit last touched that line number.
        let contents = fs::read(path)?;
        let blame = committed.blame_buffer(&contents)?;

        let hunk = blame.get_line(line_index + 1).ok_or_else(|| {
            CldrError::commit_lookup(format!(
                "Line {} of {} does not exist",
                line_index + 1,
                relative.display()
            ))
        })?;

        let oid = hunk.final_commit_id();
        if oid.is_zero() {
            return Err(CldrError::commit_lookup(format!(
                "Line {} of {} has not been committed yet",
                line_index + 1,
                relative.display()
            )));
        }

        debug!(file = %relative.display(), line = line_index + 1, commit = %oid, "Blamed bullet line");
        Ok(oid.to_string())
    }

    fn commit_back(&self, hash: &str, offset: usize) -> Result<CommitInfo> {
        let start = Oid::from_str(hash)?;

        let mut revwalk = self.repo.revwalk()?;
        revwalk.set_sorting(Sort::TIME)?;
        revwalk.push(start)?;

        let target = revwalk.nth(offset).transpose()?.ok_or_else(|| {
            CldrError::commit_lookup(format!(
                "Commit {} does not have {} ancestor commit(s)",
                hash, offset
            ))
        })?;

        let commit = self.repo.find_commit(target)?;
        let short_id = commit.as_object().short_id()?;

        Ok(CommitInfo {
            short_hash: short_id.as_str().unwrap_or_default().to_string(),
            hash: target.to_string(),
            subject: commit.summary().unwrap_or_default().to_string(),
        })
    }

    fn user_email(&self) -> Option<String> {
        self.repo.config().ok()?.get_string("user.email").ok()
    }

    fn current_branch(&self) -> Result<String> {
        match self.repo.head() {
            Ok(head) => head
                .shorthand()
                .map(str::to_string)
                .ok_or_else(|| CldrError::usage("The current branch name is not valid UTF-8")),
            // A fresh repository has no commits yet but HEAD still names a branch.
            Err(e) if e.code() == ErrorCode::UnbornBranch => {
                let head = self.repo.find_reference("HEAD")?;
                head.symbolic_target()
                    .and_then(|target| target.strip_prefix("refs/heads/"))
                    .map(str::to_string)
                    .ok_or_else(|| CldrError::usage("Unable to determine the current branch"))
            }
            Err(e) => Err(e.into()),
        }
    }

    fn commit_files(&self, paths: &[PathBuf], message: &str) -> Result<()> {
        let mut index = self.repo.index()?;
        for path in paths {
            index.add_path(&self.relative_path(path)?)?;
        }
        index.write()?;

        let tree = self.repo.find_tree(index.write_tree()?)?;
        let signature = self.repo.signature()?;
        let parent = self.head_commit()?;
        let parents: Vec<&Commit> = parent.iter().collect();

        let oid = self
            .repo
            .commit(Some("HEAD"), &signature, &signature, message, &tree, &parents)?;
        debug!(commit = %oid, "Committed changelog files");

        Ok(())
    }
}
