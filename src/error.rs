use thiserror::Error;

/// Everything that can go wrong while pulling a repository URI out of a hook
/// request. None of these are fatal; the HTTP layer picks the response.
#[derive(Error, Debug)]
pub enum HookError {
    #[error("failed to read request body: {0}")]
    BodyRead(#[source] axum::Error),

    #[error("malformed form body: {reason}")]
    FormParse { reason: String },

    #[error("malformed JSON payload: {0}")]
    JsonParse(#[source] serde_json::Error),

    #[error("No URL found in webhook payload")]
    MissingUrl,

    #[error("failed to encode JSON payload: {0}")]
    JsonEncode(#[source] serde_json::Error),

    #[error("cannot derive an SSH URI from {url:?}: {reason}")]
    InvalidRepoUrl { url: String, reason: String },
}

impl HookError {
    pub(crate) fn form_parse(reason: impl Into<String>) -> Self {
        Self::FormParse {
            reason: reason.into(),
        }
    }

    pub(crate) fn invalid_repo_url(url: &str, reason: impl Into<String>) -> Self {
        Self::InvalidRepoUrl {
            url: url.to_owned(),
            reason: reason.into(),
        }
    }
}

impl From<serde_urlencoded::de::Error> for HookError {
    fn from(e: serde_urlencoded::de::Error) -> Self {
        Self::form_parse(e.to_string())
    }
}
