//! GitHub webhook payload handling.
//!
//! Two views of the same document live here: a fixed-shape [`WebhookPayload`]
//! for read-only extraction of `repository.url`, and an untyped
//! [`serde_json::Value`] tree for rewriting `repository.ssh_url` while keeping
//! every other field.

use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info};

use crate::error::HookError;
use crate::transform::http_url_to_ssh_uri;

/// Prefix of the SSH clone URLs GitHub puts in `repository.ssh_url`.
pub const GITHUB_SSH_PREFIX: &str = "git@github.com:";

/// The parts of the GitHub webhook JSON structure that we are interested in.
#[derive(Debug, Default, Deserialize)]
pub struct WebhookPayload {
    #[serde(default)]
    pub repository: Repository,
}

#[derive(Debug, Default, Deserialize)]
pub struct Repository {
    #[serde(default)]
    pub url: String,
}

impl WebhookPayload {
    /// `repository.url`, or `None` when it is absent or empty.
    pub fn repository_url(&self) -> Option<&str> {
        let url = self.repository.url.as_str();
        (!url.is_empty()).then_some(url)
    }
}

/// Best-effort decode of a webhook body.
///
/// Malformed JSON is not an error here: it produces an empty payload, which
/// callers then report as a missing URL. Repeated keys keep their last value.
pub fn decode(raw: &[u8]) -> WebhookPayload {
    serde_json::from_slice::<Value>(raw)
        .and_then(serde_json::from_value)
        .unwrap_or_else(|e| {
            debug!(error = %e, "ignoring undecodable webhook payload");
            WebhookPayload::default()
        })
}

/// Decode `raw` and turn its `repository.url` into an SSH clone URI.
pub fn repo_uri_from_json(raw: &[u8]) -> Result<String, HookError> {
    let payload = decode(raw);
    let repo_url = payload.repository_url().ok_or(HookError::MissingUrl)?;
    http_url_to_ssh_uri(repo_url)
}

/// Replace every `git@github.com:` in `repository.ssh_url` with `url_prefix`
/// and re-encode the whole document.
///
/// A missing or non-string `ssh_url` counts as empty. If `repository` is not
/// an object nothing is written back.
pub fn rewrite_ssh_url(raw: &[u8], url_prefix: &str) -> Result<String, HookError> {
    let mut doc: Value = serde_json::from_slice(raw).map_err(HookError::JsonParse)?;

    let original = doc
        .pointer("/repository/ssh_url")
        .and_then(Value::as_str)
        .unwrap_or_default();
    let replaced = original.replace(GITHUB_SSH_PREFIX, url_prefix);

    info!(ssh_url = %replaced, "replaced ssh url");
    if let Some(repository) = doc.get_mut("repository").and_then(Value::as_object_mut) {
        repository.insert("ssh_url".to_owned(), Value::String(replaced));
    }

    serde_json::to_string(&doc).map_err(HookError::JsonEncode)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    #[test]
    fn decodes_repository_url() {
        let payload = decode(br#"{"repository": {"url": "https://github.com/org/repo"}}"#);
        assert_eq!(
            payload.repository_url(),
            Some("https://github.com/org/repo")
        );
    }

    #[rstest]
    #[case::malformed(b"{not json".as_slice())]
    #[case::empty_body(b"".as_slice())]
    #[case::no_repository(br#"{"zen": "Keep it logically awesome."}"#.as_slice())]
    #[case::no_url(br#"{"repository": {"name": "repo"}}"#.as_slice())]
    #[case::empty_url(br#"{"repository": {"url": ""}}"#.as_slice())]
    #[case::null_repository(br#"{"repository": null}"#.as_slice())]
    fn missing_url_cases(#[case] raw: &[u8]) {
        assert_eq!(decode(raw).repository_url(), None);
        assert!(matches!(
            repo_uri_from_json(raw),
            Err(HookError::MissingUrl)
        ));
    }

    #[test]
    fn resolves_uri_from_json() {
        let raw = br#"{"ref": "refs/heads/main", "repository": {"url": "https://github.com/org/repo", "name": "repo"}}"#;
        assert_eq!(
            repo_uri_from_json(raw).unwrap(),
            "git@github.com:org/repo.git"
        );
    }

    #[test]
    fn repeated_repository_keeps_last_value() {
        let raw = br#"{"repository":{"url":"https://github.com/a/b"},"repository":{"url":"https://github.com/c/d"}}"#;
        assert_eq!(repo_uri_from_json(raw).unwrap(), "git@github.com:c/d.git");
    }

    #[test]
    fn propagates_transform_errors() {
        let raw = br#"{"repository": {"url": "ftp://example.com/repo"}}"#;
        assert!(matches!(
            repo_uri_from_json(raw),
            Err(HookError::InvalidRepoUrl { .. })
        ));
    }

    #[test]
    fn rewrites_ssh_url() {
        let raw = br#"{"repository":{"ssh_url":"git@github.com:org/repo.git"}}"#;
        let out = rewrite_ssh_url(raw, "https://git.example.com/").unwrap();
        let doc: Value = serde_json::from_str(&out).unwrap();
        assert_eq!(
            doc["repository"]["ssh_url"],
            "https://git.example.com/org/repo.git"
        );
    }

    #[test]
    fn rewrite_keeps_other_fields() {
        let original = json!({
            "ref": "refs/heads/main",
            "after": "0d1a26e67d8f5eaf1f6ba5c57fc3c7d91ac0fd1c",
            "repository": {
                "name": "repo",
                "full_name": "org/repo",
                "private": false,
                "ssh_url": "git@github.com:org/repo.git",
                "owner": {"login": "org", "id": 42}
            },
            "commits": [{"id": "abc", "distinct": true}],
            "sender": null
        });
        let raw = serde_json::to_vec(&original).unwrap();

        let out = rewrite_ssh_url(&raw, "ssh://git@mirror.local/").unwrap();
        let rewritten: Value = serde_json::from_str(&out).unwrap();

        let mut expected = original.clone();
        expected["repository"]["ssh_url"] = json!("ssh://git@mirror.local/org/repo.git");
        assert_eq!(rewritten, expected);
    }

    #[test]
    fn rewrite_keeps_number_literals_exact() {
        let raw = br#"{"repository":{"ssh_url":"git@github.com:o/r.git","id":123456789012345678901234567890},"ratio":1.10,"score":0.30000000000000000000000001}"#;
        let out = rewrite_ssh_url(raw, "X/").unwrap();
        assert!(out.contains(r#""id":123456789012345678901234567890"#), "{out}");
        assert!(out.contains(r#""ratio":1.10"#), "{out}");
        assert!(out.contains(r#""score":0.30000000000000000000000001"#), "{out}");

        let doc: Value = serde_json::from_str(&out).unwrap();
        assert_eq!(doc["repository"]["ssh_url"], "X/o/r.git");
    }

    #[test]
    fn rewrite_replaces_every_occurrence() {
        let raw = br#"{"repository":{"ssh_url":"git@github.com:a/git@github.com:b"}}"#;
        let out = rewrite_ssh_url(raw, "X/").unwrap();
        let doc: Value = serde_json::from_str(&out).unwrap();
        assert_eq!(doc["repository"]["ssh_url"], "X/a/X/b");
    }

    #[test]
    fn rewrite_treats_missing_ssh_url_as_empty() {
        let raw = br#"{"repository":{"name":"repo"}}"#;
        let out = rewrite_ssh_url(raw, "https://git.example.com/").unwrap();
        let doc: Value = serde_json::from_str(&out).unwrap();
        assert_eq!(doc["repository"]["ssh_url"], "");
        assert_eq!(doc["repository"]["name"], "repo");
    }

    #[test]
    fn rewrite_leaves_document_without_repository_alone() {
        let raw = br#"{"zen":"Design for failure."}"#;
        let out = rewrite_ssh_url(raw, "https://git.example.com/").unwrap();
        let doc: Value = serde_json::from_str(&out).unwrap();
        assert_eq!(doc, json!({"zen": "Design for failure."}));
    }

    #[rstest]
    #[case::malformed(b"{\"repository\":".as_slice())]
    #[case::empty(b"".as_slice())]
    fn rewrite_rejects_malformed_json(#[case] raw: &[u8]) {
        assert!(matches!(
            rewrite_ssh_url(raw, "https://git.example.com/"),
            Err(HookError::JsonParse(_))
        ));
    }
}
