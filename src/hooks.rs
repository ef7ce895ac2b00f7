//! Request-shape adapters for GitHub webhooks.
//!
//! GitHub delivers the same payload either as a raw JSON body
//! ([`GitHubJsonHook`]) or as the `payload` field of an
//! `x-www-form-urlencoded` body ([`GitHubFormHook`]).

use std::future::Future;

use axum::body::Bytes;
use axum::extract::Request;
use axum::http::{HeaderMap, header};

use crate::error::HookError;
use crate::payload::{repo_uri_from_json, rewrite_ssh_url};

/// Upper bound on how much of a request body the hooks will buffer.
pub const DEFAULT_MAX_BODY_BYTES: usize = 2 * 1024 * 1024;

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";
const PAYLOAD_FIELD: &str = "payload";

/// A way of finding the repository a webhook request is about.
pub trait GitHook {
    /// Resolve the SSH clone URI of the repository named by `req`.
    fn git_repo_uri(&self, req: Request)
    -> impl Future<Output = Result<String, HookError>> + Send;
}

/// Hook whose push info is the JSON request body itself.
#[derive(Debug, Clone, Copy)]
pub struct GitHubJsonHook {
    max_body_bytes: usize,
}

impl GitHubJsonHook {
    pub fn new(max_body_bytes: usize) -> Self {
        Self { max_body_bytes }
    }
}

impl Default for GitHubJsonHook {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_BODY_BYTES)
    }
}

impl GitHook for GitHubJsonHook {
    async fn git_repo_uri(&self, req: Request) -> Result<String, HookError> {
        let body = read_body(req, self.max_body_bytes).await?;
        repo_uri_from_json(&body)
    }
}

/// Hook whose push info is JSON inside the `payload` field of a form body.
#[derive(Debug, Clone, Copy)]
pub struct GitHubFormHook {
    max_body_bytes: usize,
}

impl GitHubFormHook {
    pub fn new(max_body_bytes: usize) -> Self {
        Self { max_body_bytes }
    }

    /// Rewrite `repository.ssh_url` of the form payload so that
    /// `git@github.com:` becomes `url_prefix`, returning the re-encoded JSON.
    pub async fn replace_ssh_uri(
        &self,
        req: Request,
        url_prefix: &str,
    ) -> Result<String, HookError> {
        let payload = self.form_payload(req).await?;
        rewrite_ssh_url(payload.as_bytes(), url_prefix)
    }

    async fn form_payload(&self, req: Request) -> Result<String, HookError> {
        let (parts, body) = req.into_parts();
        check_form_content_type(&parts.headers)?;

        let body = axum::body::to_bytes(body, self.max_body_bytes)
            .await
            .map_err(HookError::BodyRead)?;

        let mut fields = parse_form(&body)?;
        if let Some(query) = parts.uri.query() {
            fields.extend(parse_form(query.as_bytes())?);
        }

        Ok(fields
            .into_iter()
            .find(|(key, _)| key == PAYLOAD_FIELD)
            .map(|(_, value)| value)
            .unwrap_or_default())
    }
}

impl Default for GitHubFormHook {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_BODY_BYTES)
    }
}

impl GitHook for GitHubFormHook {
    async fn git_repo_uri(&self, req: Request) -> Result<String, HookError> {
        let payload = self.form_payload(req).await?;
        repo_uri_from_json(payload.as_bytes())
    }
}

async fn read_body(req: Request, limit: usize) -> Result<Bytes, HookError> {
    axum::body::to_bytes(req.into_body(), limit)
        .await
        .map_err(HookError::BodyRead)
}

/// An absent content type is accepted; anything else must be a url-encoded form.
fn check_form_content_type(headers: &HeaderMap) -> Result<(), HookError> {
    let Some(value) = headers.get(header::CONTENT_TYPE) else {
        return Ok(());
    };
    let content_type = value
        .to_str()
        .map_err(|_| HookError::form_parse("content type is not valid ASCII"))?;
    let mime = content_type.split(';').next().unwrap_or_default().trim();
    if mime.eq_ignore_ascii_case(FORM_CONTENT_TYPE) {
        Ok(())
    } else {
        Err(HookError::form_parse(format!(
            "expected {FORM_CONTENT_TYPE}, got {content_type}"
        )))
    }
}

/// Parse url-encoded `key=value` pairs in order, keeping duplicates.
fn parse_form(raw: &[u8]) -> Result<Vec<(String, String)>, HookError> {
    check_escapes(raw)?;
    Ok(serde_urlencoded::from_bytes(raw)?)
}

/// Reject `%` not followed by two hex digits.
fn check_escapes(raw: &[u8]) -> Result<(), HookError> {
    let mut i = 0;
    while i < raw.len() {
        if raw[i] == b'%' {
            let escape = raw.get(i + 1..i + 3);
            if !escape.is_some_and(|hex| hex.iter().all(u8::is_ascii_hexdigit)) {
                return Err(HookError::form_parse(format!(
                    "invalid URL escape at byte {i}"
                )));
            }
            i += 3;
        } else {
            i += 1;
        }
    }
    Ok(())
}
