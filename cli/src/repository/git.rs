//! Repository backed by a git remote, synchronized through a private clone.
use std::path::{Path, PathBuf};

use anyhow::{Context as _, Result, bail};
use git2::build::CheckoutBuilder;
use git2::{
    Cred, CredentialType, FetchOptions, IndexAddOption, Oid, PushOptions, RemoteCallbacks,
    Repository, Signature,
};

use super::{Backend, Direction};
use crate::error::RepositoryError;
use crate::logging::Log;

/// Remote name used inside the clone.
const REMOTE: &str = "origin";

/// Give up after this many credential prompts from libgit2.
const MAX_CREDENTIAL_ATTEMPTS: u32 = 3;

/// A git remote mirrored into a working directory under the cache.
#[derive(Debug, Clone)]
pub struct GitBackend {
    url: String,
    branch: String,
    worktree: PathBuf,
}

impl GitBackend {
    /// Create a backend for `url`, keeping its clone in `worktree`.
    #[must_use]
    pub const fn new(url: String, branch: String, worktree: PathBuf) -> Self {
        Self {
            url,
            branch,
            worktree,
        }
    }

    fn local_ref(&self) -> String {
        format!("refs/heads/{}", self.branch)
    }

    fn remote_ref(&self) -> String {
        format!("refs/remotes/{REMOTE}/{}", self.branch)
    }

    /// Open the clone, initializing it (empty, with `origin` configured) on
    /// first use.
    fn open_or_init(&self, log: &dyn Log) -> Result<Repository> {
        if self.worktree.join(".git").exists() {
            return Ok(Repository::open(&self.worktree).map_err(RepositoryError::git("open"))?);
        }
        std::fs::create_dir_all(&self.worktree)
            .with_context(|| format!("create clone directory {}", self.worktree.display()))?;
        log.debug(&format!(
            "initializing clone of {} in {}",
            self.url,
            self.worktree.display()
        ));
        let repo = Repository::init(&self.worktree).map_err(RepositoryError::git("init"))?;
        repo.set_head(&self.local_ref())
            .map_err(RepositoryError::git("init"))?;
        repo.remote(REMOTE, &self.url)
            .map_err(RepositoryError::git("init"))?;
        Ok(repo)
    }

    fn fetch(&self, repo: &Repository, log: &dyn Log) -> Result<(), RepositoryError> {
        log.debug(&format!("fetching {}", self.url));
        let mut remote = repo
            .find_remote(REMOTE)
            .map_err(RepositoryError::git("fetch"))?;
        let mut options = FetchOptions::new();
        options.remote_callbacks(remote_callbacks());
        remote
            .fetch(&[] as &[&str], Some(&mut options), None)
            .map_err(RepositoryError::git("fetch"))
    }

    /// Make the worktree match `target`, then point the branch at it.
    ///
    /// The tree is checked out while HEAD still names the old commit so that
    /// files deleted upstream are removed from the worktree.
    fn checkout(&self, repo: &Repository, target: Oid, reason: &str) -> Result<(), RepositoryError> {
        let commit = repo
            .find_object(target, None)
            .map_err(RepositoryError::git("checkout"))?;
        repo.checkout_tree(&commit, Some(CheckoutBuilder::new().force()))
            .map_err(RepositoryError::git("checkout"))?;
        let local_ref = self.local_ref();
        repo.reference(&local_ref, target, true, reason)
            .map_err(RepositoryError::git("checkout"))?;
        repo.set_head(&local_ref)
            .map_err(RepositoryError::git("checkout"))
    }

    /// Stage every change in the worktree and commit it when the tree moved.
    ///
    /// Returns `true` if a commit was created.
    fn commit_all(&self, repo: &Repository, message: &str, log: &dyn Log) -> Result<bool> {
        let mut index = repo.index().map_err(RepositoryError::git("stage"))?;
        index
            .add_all(["*"].iter(), IndexAddOption::DEFAULT, None)
            .map_err(RepositoryError::git("stage"))?;
        index
            .update_all(["*"].iter(), None)
            .map_err(RepositoryError::git("stage"))?;
        index.write().map_err(RepositoryError::git("stage"))?;
        let tree_id = index.write_tree().map_err(RepositoryError::git("stage"))?;

        let parent = match repo.refname_to_id(&self.local_ref()) {
            Ok(oid) => Some(
                repo.find_commit(oid)
                    .map_err(RepositoryError::git("commit"))?,
            ),
            Err(_) => None,
        };
        let unchanged = parent
            .as_ref()
            .map_or_else(|| index.is_empty(), |p| p.tree_id() == tree_id);
        if unchanged {
            log.debug("repository tree unchanged; nothing to commit");
            return Ok(false);
        }

        let tree = repo
            .find_tree(tree_id)
            .map_err(RepositoryError::git("commit"))?;
        let signature = repo
            .signature()
            .or_else(|_| Signature::now("dotdex", "dotdex@localhost"))
            .map_err(RepositoryError::git("commit"))?;
        let parents: Vec<&git2::Commit<'_>> = parent.iter().collect();
        let oid = repo
            .commit(
                Some(&self.local_ref()),
                &signature,
                &signature,
                message,
                &tree,
                &parents,
            )
            .map_err(RepositoryError::git("commit"))?;
        log.info(&format!("committed {}", short(oid)));
        Ok(true)
    }

    /// Push the branch to `origin` unless the remote already has it.
    ///
    /// Returns `true` if anything was pushed.
    fn push(&self, repo: &Repository, log: &dyn Log) -> Result<bool> {
        let local_ref = self.local_ref();
        let Ok(local) = repo.refname_to_id(&local_ref) else {
            log.debug("branch has no commits; nothing to push");
            return Ok(false);
        };
        if repo.refname_to_id(&self.remote_ref()).ok() == Some(local) {
            log.debug(&format!("{REMOTE}/{} already up to date", self.branch));
            return Ok(false);
        }

        let mut remote = repo
            .find_remote(REMOTE)
            .map_err(RepositoryError::git("push"))?;
        let mut rejection: Option<String> = None;
        {
            let mut callbacks = remote_callbacks();
            callbacks.push_update_reference(|refname, status| {
                if let Some(message) = status {
                    rejection = Some(format!("{refname}: {message}"));
                }
                Ok(())
            });
            let mut options = PushOptions::new();
            options.remote_callbacks(callbacks);
            let refspec = format!("{local_ref}:{local_ref}");
            remote
                .push(&[refspec.as_str()], Some(&mut options))
                .map_err(RepositoryError::git("push"))?;
        }
        if let Some(reason) = rejection {
            bail!("push to {} rejected: {reason}", self.url);
        }
        log.info(&format!("pushed {} to {}", self.branch, self.url));
        Ok(true)
    }
}

impl Backend for GitBackend {
    fn describe(&self) -> String {
        format!("{} ({})", self.url, self.branch)
    }

    fn worktree(&self) -> &Path {
        &self.worktree
    }

    fn is_remote(&self) -> bool {
        true
    }

    fn prepare(&self, direction: Direction, _dry_run: bool, log: &dyn Log) -> Result<()> {
        let repo = self.open_or_init(log)?;
        self.fetch(&repo, log)?;

        let Ok(remote) = repo.refname_to_id(&self.remote_ref()) else {
            match direction {
                Direction::Push => log.info(&format!(
                    "{} has no branch '{}' yet; it will be created",
                    self.url, self.branch
                )),
                Direction::Pull => log.warn(&format!(
                    "{} has no branch '{}'; nothing to pull",
                    self.url, self.branch
                )),
            }
            return Ok(());
        };

        let Ok(local) = repo.refname_to_id(&self.local_ref()) else {
            log.debug(&format!("checking out {} at {}", self.branch, short(remote)));
            self.checkout(&repo, remote, "dotdex: initial checkout")?;
            return Ok(());
        };
        if local == remote {
            log.debug(&format!("{} up to date at {}", self.branch, short(local)));
            return Ok(());
        }

        let (ahead, behind) = repo
            .graph_ahead_behind(local, remote)
            .map_err(RepositoryError::git("compare"))?;
        match (ahead, behind) {
            (0, _) => {
                log.info(&format!(
                    "fast-forwarding {} to {} ({behind} new commit(s))",
                    self.branch,
                    short(remote)
                ));
                self.checkout(&repo, remote, "dotdex: fast-forward")?;
            }
            (_, 0) => log.debug(&format!(
                "{ahead} local commit(s) not yet pushed to {REMOTE}"
            )),
            _ => {
                return Err(RepositoryError::Diverged {
                    branch: self.branch.clone(),
                    path: self.worktree.display().to_string(),
                }
                .into());
            }
        }
        Ok(())
    }

    fn publish(&self, message: &str, log: &dyn Log) -> Result<bool> {
        let repo = Repository::open(&self.worktree).map_err(RepositoryError::git("open"))?;
        let committed = self.commit_all(&repo, message, log)?;
        let pushed = self.push(&repo, log)?;
        Ok(committed || pushed)
    }
}

/// Abbreviated object id for log output.
fn short(oid: Oid) -> String {
    let mut s = oid.to_string();
    s.truncate(7);
    s
}

/// Callbacks answering libgit2's credential requests from the ssh agent or
/// the configured git credential helper.
fn remote_callbacks<'a>() -> RemoteCallbacks<'a> {
    let mut attempts = 0;
    let mut callbacks = RemoteCallbacks::new();
    callbacks.credentials(move |url, username, allowed| {
        attempts += 1;
        if attempts > MAX_CREDENTIAL_ATTEMPTS {
            return Err(git2::Error::from_str("authentication failed"));
        }
        if allowed.contains(CredentialType::SSH_KEY)
            && let Some(user) = username
        {
            return Cred::ssh_key_from_agent(user);
        }
        if allowed.contains(CredentialType::USER_PASS_PLAINTEXT) {
            let config = git2::Config::open_default()?;
            return Cred::credential_helper(&config, url, username);
        }
        if allowed.contains(CredentialType::DEFAULT) {
            return Cred::default();
        }
        Err(git2::Error::from_str("no supported credential type"))
    });
    callbacks
}
