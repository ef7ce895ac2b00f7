//! Resolve the repository behind a GitHub webhook delivery.
//!
//! GitHub posts push info either as a JSON body or as JSON inside the
//! `payload` field of a url-encoded form. The hooks in [`hooks`] read either
//! shape and hand back the repository's SSH clone URI; the form hook can also
//! rewrite `repository.ssh_url` to point at a different host.

pub mod error;
pub mod hooks;
pub mod payload;
pub mod server;
pub mod transform;

pub use error::HookError;
pub use hooks::{GitHook, GitHubFormHook, GitHubJsonHook};
pub use transform::http_url_to_ssh_uri;
