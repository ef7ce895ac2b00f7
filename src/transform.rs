//! Mapping of HTTP-style repository URLs onto the `git@host:owner/repo.git`
//! form used for SSH clones.

use url::Url;

use crate::error::HookError;

/// Derive the SSH clone URI for a repository URL.
///
/// `https://github.com/org/repo` becomes `git@github.com:org/repo.git`.
/// Ports and credentials in the input are dropped. Inputs that are already SSH
/// URIs (`git@host:path` or `ssh://...`) are returned unchanged.
pub fn http_url_to_ssh_uri(repo_url: &str) -> Result<String, HookError> {
    let repo_url = repo_url.trim();
    if is_ssh_uri(repo_url) {
        return Ok(repo_url.to_owned());
    }

    let parsed =
        Url::parse(repo_url).map_err(|e| HookError::invalid_repo_url(repo_url, e.to_string()))?;

    match parsed.scheme() {
        "http" | "https" | "git" => {}
        other => {
            return Err(HookError::invalid_repo_url(
                repo_url,
                format!("unsupported scheme `{other}`"),
            ));
        }
    }

    let host = parsed
        .host_str()
        .filter(|h| !h.is_empty())
        .ok_or_else(|| HookError::invalid_repo_url(repo_url, "missing host"))?;

    let path = parsed.path().trim_matches('/');
    let path = path.strip_suffix(".git").unwrap_or(path).trim_end_matches('/');
    if path.is_empty() {
        return Err(HookError::invalid_repo_url(
            repo_url,
            "missing repository path",
        ));
    }

    Ok(format!("git@{host}:{path}.git"))
}

fn is_ssh_uri(uri: &str) -> bool {
    if uri.starts_with("ssh://") {
        return true;
    }
    if uri.contains("://") {
        return false;
    }

    // scp-like syntax: user@host:path
    match uri.split_once(':') {
        Some((authority, path)) => {
            authority.contains('@') && !authority.contains('/') && !path.is_empty()
        }
        None => false,
    }
}
