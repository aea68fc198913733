use thiserror::Error;

/// Failure of a single resolution call.
///
/// Every variant is terminal for the call that produced it. Callers branch on
/// the variant to decide what to show: `NoProviderMatched` means the site is
/// unsupported, `ExtractorFailure` means another source might work.
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("unsupported site: no provider claims host `{host}`")]
    NoProviderMatched { host: String },

    #[error("extraction failed for host `{host}`, the site format may have changed")]
    PatternNotFound { host: String },

    #[error("provider `{provider}` failed to resolve the media URL: {source}")]
    ExtractorFailure {
        provider: String,
        #[source]
        source: ExtractError,
    },

    #[error("provider `{provider}` recognizes this site but is currently locked")]
    ProviderLocked {
        provider: String,
        notice: Option<String>,
    },
}

/// Failure inside an extractor's resolution procedure.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("match group {index} is missing ({available} captured)")]
    MissingGroup { index: usize, available: usize },

    #[error("page path has no code segment")]
    MissingCode,

    #[error("failed to decode captured token: {0}")]
    Decode(String),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("request to {url} returned HTTP {status}")]
    HttpStatus { url: String, status: u16 },

    #[error("response has no field `{path}`")]
    MissingField { path: String },

    #[error("response field `{path}` is not a string")]
    NotAString { path: String },
}

/// Failure reported by the network collaborator.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("response from {url} is not valid JSON: {source}")]
    InvalidJson {
        url: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Invalid provider definition, caught while building a registry.
#[derive(Debug, Error)]
pub enum DefinitionError {
    #[error("invalid capture pattern: {0}")]
    Pattern(#[from] regex::Error),

    #[error("invalid template `{template}`: {reason}")]
    Template { template: String, reason: String },

    #[error("invalid field path `{path}`: {reason}")]
    FieldPath { path: String, reason: String },

    #[error("duplicate provider id `{0}`")]
    DuplicateId(String),

    #[error("provider `{0}` declares no domains")]
    NoDomains(String),
}
