use crate::error::{GitsumError, Result};
use gix::Repository;
use std::path::{Path, PathBuf};
use std::sync::atomic::AtomicBool;
use tempfile::TempDir;
use tracing::{debug, info};

/// Where a repository comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RepoSource {
    Local(PathBuf),
    Remote(String),
}

impl RepoSource {
    /// Classify `source`: existing paths are local, http/https/git/ssh URLs
    /// (including scp-like `user@host:path`) are remote.
    pub fn classify(source: &str) -> Result<Self> {
        let path = Path::new(source);
        if path.exists() {
            return Ok(RepoSource::Local(path.to_path_buf()));
        }

        match gix::url::parse(source.into()) {
            Ok(url) => match url.scheme {
                gix::url::Scheme::Http
                | gix::url::Scheme::Https
                | gix::url::Scheme::Git
                | gix::url::Scheme::Ssh => Ok(RepoSource::Remote(source.to_string())),
                _ => Err(GitsumError::access(source, "path does not exist")),
            },
            Err(_) => Err(GitsumError::access(source, "path does not exist")),
        }
    }
}

/// An open repository, possibly backed by a scratch clone that is removed on drop.
pub struct GitRepo {
    repo: Repository,
    path: PathBuf,
    source: String,
    _scratch: Option<TempDir>,
}

impl GitRepo {
    /// Open a local repository or clone a remote one.
    ///
    /// Remote clones go into `clone_into/<repo-name>` when a directory is
    /// given (kept for archival, reopened if already present), otherwise into
    /// a temporary directory owned by the returned handle.
    pub fn open_or_clone(source: &str, clone_into: Option<&Path>) -> Result<Self> {
        match RepoSource::classify(source)? {
            RepoSource::Local(path) => Self::open(&path, source),
            RepoSource::Remote(url) => match clone_into {
                Some(dir) => {
                    let target = dir.join(repo_name_from_url(&url));
                    if target.join(".git").is_dir() {
                        info!("Reusing existing clone at {}", target.display());
                        return Self::open(&target, source);
                    }
                    std::fs::create_dir_all(dir)
                        .map_err(|e| GitsumError::access(source, e))?;
                    let repo = clone(&url, &target)?;
                    Ok(Self::from_repo(repo, source, None))
                }
                None => {
                    let scratch =
                        TempDir::new().map_err(|e| GitsumError::access(source, e))?;
                    let repo = clone(&url, scratch.path())?;
                    Ok(Self::from_repo(repo, source, Some(scratch)))
                }
            },
        }
    }

    /// Open the repository rooted exactly at `path`.
    pub fn open(path: &Path, source: &str) -> Result<Self> {
        let repo = gix::open(path).map_err(|e| GitsumError::access(source, e))?;
        debug!("Opened repository at {}", path.display());
        Ok(Self::from_repo(repo, source, None))
    }

    fn from_repo(repo: Repository, source: &str, scratch: Option<TempDir>) -> Self {
        let path = repo.workdir().unwrap_or_else(|| repo.path()).to_path_buf();
        Self {
            repo,
            path,
            source: source.to_string(),
            _scratch: scratch,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn is_scratch(&self) -> bool {
        self._scratch.is_some()
    }

    pub(crate) fn inner(&self) -> &Repository {
        &self.repo
    }
}

fn clone(url: &str, target: &Path) -> Result<Repository> {
    info!("Cloning {} to {}", url, target.display());
    let interrupt = AtomicBool::new(false);

    let mut prepare =
        gix::prepare_clone(url, target).map_err(|e| GitsumError::access(url, e))?;
    let (mut checkout, _) = prepare
        .fetch_then_checkout(gix::progress::Discard, &interrupt)
        .map_err(|e| GitsumError::access(url, e))?;
    let (repo, _) = checkout
        .main_worktree(gix::progress::Discard, &interrupt)
        .map_err(|e| GitsumError::access(url, e))?;
    Ok(repo)
}

/// Directory name a clone of `url` gets: the last path segment without `.git`.
pub fn repo_name_from_url(url: &str) -> String {
    let trimmed = url.trim_end_matches('/');
    let last = trimmed
        .rsplit(['/', ':'])
        .next()
        .unwrap_or(trimmed);
    let name = last.strip_suffix(".git").unwrap_or(last);
    if name.is_empty() {
        "repo".to_string()
    } else {
        name.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repo_names() {
        assert_eq!(repo_name_from_url("https://github.com/jonnyhuck/gitsum"), "gitsum");
        assert_eq!(repo_name_from_url("https://github.com/a/b.git/"), "b");
        assert_eq!(repo_name_from_url("git@github.com:student/assessment.git"), "assessment");
        assert_eq!(repo_name_from_url("git@host:repo.git"), "repo");
    }

    #[test]
    fn classify_remote_urls() {
        assert_eq!(
            RepoSource::classify("https://github.com/a/b").unwrap(),
            RepoSource::Remote("https://github.com/a/b".into())
        );
        assert_eq!(
            RepoSource::classify("git@github.com:a/b.git").unwrap(),
            RepoSource::Remote("git@github.com:a/b.git".into())
        );
        assert_eq!(
            RepoSource::classify("ssh://git@github.com/a/b.git").unwrap(),
            RepoSource::Remote("ssh://git@github.com/a/b.git".into())
        );
    }

    #[test]
    fn classify_missing_local_path_fails() {
        let err = RepoSource::classify("/definitely/not/here/repo").unwrap_err();
        assert!(matches!(err, GitsumError::Access { .. }));
    }

    #[test]
    fn classify_existing_path_is_local() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().to_string_lossy().to_string();
        assert_eq!(
            RepoSource::classify(&source).unwrap(),
            RepoSource::Local(dir.path().to_path_buf())
        );
    }

    #[test]
    fn opening_a_plain_directory_is_an_access_error() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().to_string_lossy().to_string();
        let err = match GitRepo::open_or_clone(&source, None) {
            Ok(_) => panic!("plain directory opened as a repository"),
            Err(e) => e,
        };
        assert!(err.is_fatal_for_repo());
    }
}
