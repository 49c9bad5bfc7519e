use super::api::repo_name_from_url;
use crate::error::GitHubError;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::TempDir;
use tokio::process::Command;
use tracing::{debug, info};

const CLONE_DEPTH: &str = "100";
/// Checkout directory inside the temporary clone root
const CHECKOUT_DIR: &str = "repo";

/// A working copy of the repository under analysis.
/// Temporary clones are removed on drop unless persisted.
#[derive(Debug)]
pub struct ClonedRepo {
    path: PathBuf,
    temp: Option<TempDir>,
}

impl ClonedRepo {
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether this is a fresh clone rather than a local checkout
    pub fn is_temporary(&self) -> bool {
        self.temp.is_some()
    }

    /// Keep the clone on disk after the run and return the checkout path
    pub fn persist(mut self) -> PathBuf {
        if let Some(temp) = self.temp.take() {
            return temp.keep().join(CHECKOUT_DIR);
        }
        self.path.clone()
    }
}

/// Resolve `repo_url` to a working copy.
///
/// `file://` URLs and existing directories are used in place; anything else
/// is shallow-cloned into a temporary directory under `tmp_dir`.
pub async fn clone_repository(
    repo_url: &str,
    tmp_dir: &Path,
    timeout: Duration,
) -> Result<ClonedRepo, GitHubError> {
    if let Some(local) = local_path(repo_url) {
        if !local.is_dir() {
            return Err(GitHubError::MissingLocalPath(local));
        }
        debug!("Using local repository at {}", local.display());
        return Ok(ClonedRepo {
            path: local,
            temp: None,
        });
    }

    std::fs::create_dir_all(tmp_dir)?;
    let temp = tempfile::Builder::new()
        .prefix(&format!("{}-", repo_name_from_url(repo_url)))
        .tempdir_in(tmp_dir)?;
    let dest = temp.path().join(CHECKOUT_DIR);

    info!("Cloning {} into {}", repo_url, dest.display());
    let mut cmd = Command::new("git");
    cmd.arg("clone")
        .arg("--depth")
        .arg(CLONE_DEPTH)
        .arg("--quiet")
        .arg(repo_url)
        .arg(&dest)
        .env("GIT_TERMINAL_PROMPT", "0")
        .kill_on_drop(true);

    let output = tokio::time::timeout(timeout, cmd.output())
        .await
        .map_err(|_| GitHubError::CloneTimeout(timeout))??;

    if !output.status.success() {
        return Err(GitHubError::Clone(
            String::from_utf8_lossy(&output.stderr).trim().to_string(),
        ));
    }

    Ok(ClonedRepo {
        path: dest,
        temp: Some(temp),
    })
}

fn local_path(repo_url: &str) -> Option<PathBuf> {
    if let Some(rest) = repo_url.strip_prefix("file://") {
        return Some(PathBuf::from(rest));
    }
    let candidate = Path::new(repo_url);
    candidate.is_dir().then(|| candidate.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_file_url_used_in_place() {
        let dir = tempfile::tempdir().unwrap();
        let url = format!("file://{}", dir.path().display());
        let repo = clone_repository(&url, Path::new("unused"), Duration::from_secs(1))
            .await
            .unwrap();
        assert_eq!(repo.path(), dir.path());
        assert!(!repo.is_temporary());
    }

    #[tokio::test]
    async fn test_plain_directory_used_in_place() {
        let dir = tempfile::tempdir().unwrap();
        let repo = clone_repository(
            dir.path().to_str().unwrap(),
            Path::new("unused"),
            Duration::from_secs(1),
        )
        .await
        .unwrap();
        assert_eq!(repo.persist(), dir.path().to_path_buf());
    }

    #[test]
    fn test_persisted_clone_points_at_checkout() {
        let temp = tempfile::tempdir().unwrap();
        let checkout = temp.path().join(CHECKOUT_DIR);
        std::fs::create_dir_all(&checkout).unwrap();
        std::fs::write(checkout.join("README.md"), "# tool").unwrap();
        let repo = ClonedRepo {
            path: checkout.clone(),
            temp: Some(temp),
        };

        let kept = repo.persist();
        assert_eq!(kept, checkout);
        assert!(kept.join("README.md").exists());

        std::fs::remove_dir_all(kept.parent().unwrap()).unwrap();
    }

    #[tokio::test]
    async fn test_missing_file_url_rejected() {
        let err = clone_repository(
            "file:///definitely/not/here",
            Path::new("unused"),
            Duration::from_secs(1),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, GitHubError::MissingLocalPath(_)));
    }
}
