use anyhow::{anyhow, bail, Context, Result};
use git2::{
    build::{CheckoutBuilder, RepoBuilder},
    Cred, FetchOptions, Oid, RemoteCallbacks, Repository,
};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use url::Url;

const REMOTE: &str = "origin";

const FETCH_REFSPECS: [&str; 2] = [
    "+refs/heads/*:refs/remotes/origin/*",
    "+refs/tags/*:refs/tags/*",
];

/// A working copy pinned to a release tag.
#[derive(Clone, Debug)]
pub struct Checkout {
    pub path: PathBuf,
    pub tag: String,
    pub commit: Oid,
}

/// Checks that `repository` is something we know how to clone: a URL with a
/// supported scheme or an existing local path.
pub fn validate_repository(repository: &str) -> Result<()> {
    if Path::new(repository).exists() {
        return Ok(());
    }

    let url = Url::parse(repository)
        .with_context(|| format!("invalid repository url: {}", repository))?;

    match url.scheme() {
        "file" | "git" | "http" | "https" | "ssh" => Ok(()),
        scheme => bail!("unsupported repository scheme: {}", scheme),
    }
}

fn fetch_options<'a>(repository: &str) -> FetchOptions<'a> {
    let mut fetch_options = FetchOptions::new();

    if repository.starts_with("git://") || repository.starts_with("ssh://") {
        let mut callbacks = RemoteCallbacks::new();

        callbacks.credentials(|_url, username_from_url, _allowed_types| {
            Cred::ssh_key_from_agent(username_from_url.unwrap_or("git"))
        });

        fetch_options.remote_callbacks(callbacks);
    }

    fetch_options
}

fn open_or_clone(repository: &str, path: &Path) -> Result<Repository> {
    if path.join(".git").exists() {
        let repo = Repository::open(path)
            .with_context(|| format!("failed to open repository: {}", path.display()))?;

        info!("checkout exists, fetching: {}", path.display());

        let remote_url = repo
            .find_remote(REMOTE)
            .with_context(|| format!("remote '{}' missing in {}", REMOTE, path.display()))?
            .url()
            .map(str::to_string);

        if remote_url.as_deref() != Some(repository) {
            warn!(
                "checkout origin changed: {} -> {}",
                remote_url.as_deref().unwrap_or("<invalid>"),
                repository
            );

            repo.remote_set_url(REMOTE, repository)
                .with_context(|| format!("failed to point '{}' at {}", REMOTE, repository))?;
        }

        let mut remote = repo.find_remote(REMOTE)?;

        remote
            .fetch(&FETCH_REFSPECS, Some(&mut fetch_options(repository)), None)
            .with_context(|| format!("failed to fetch {}", repository))?;

        drop(remote);

        return Ok(repo);
    }

    info!("cloning: {} -> {}", repository, path.display());

    let mut builder = RepoBuilder::new();

    builder.fetch_options(fetch_options(repository));

    builder
        .clone(repository, path)
        .with_context(|| format!("failed to clone {}", repository))
}

/// Clones `repository` into `path` (or reuses an existing clone there) and
/// force-checks out `tag` with a detached HEAD.
///
/// Running this twice with the same tag leaves the working copy with the
/// same content: tracked files modified in between are restored.
pub fn checkout(repository: &str, tag: &str, path: &Path) -> Result<Checkout> {
    if tag.is_empty() {
        bail!("release tag is empty");
    }

    validate_repository(repository)?;

    let repo = open_or_clone(repository, path)?;

    let object = repo
        .revparse_single(&format!("refs/tags/{}", tag))
        .map_err(|err| anyhow!("tag '{}' not found in {}: {}", tag, repository, err))?;

    let commit = object
        .peel_to_commit()
        .with_context(|| format!("tag '{}' does not point at a commit", tag))?;

    debug!("tag {} resolves to {}", tag, commit.id());

    let mut checkout_builder = CheckoutBuilder::new();

    checkout_builder.force();

    repo.checkout_tree(commit.as_object(), Some(&mut checkout_builder))
        .with_context(|| format!("failed to checkout tag '{}'", tag))?;

    repo.set_head_detached(commit.id())
        .with_context(|| format!("failed to move HEAD to tag '{}'", tag))?;

    info!("checked out {} at {}", tag, commit.id());

    Ok(Checkout {
        path: path.to_path_buf(),
        tag: tag.to_string(),
        commit: commit.id(),
    })
}
