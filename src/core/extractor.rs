use crate::core::error::ExtractError;
use crate::core::fetch::Fetch;
use crate::core::provider::MatchGroups;
use crate::utils::{last_path_segment, normalize_host};
use async_trait::async_trait;
use serde::Serialize;
use std::fmt;
use url::Url;

/// Location of the embed page being resolved.
///
/// Passed explicitly into every resolution so extractors never read ambient
/// state to build request paths or referrers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageLocation {
    host: String,
    path: String,
}

impl PageLocation {
    pub fn new(host: &str, path: &str) -> Self {
        Self {
            host: normalize_host(host),
            path: path.to_string(),
        }
    }

    pub fn from_url(url: &Url) -> Self {
        Self::new(url.host_str().unwrap_or_default(), url.path())
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// The path-derived media code, i.e. the last path segment.
    pub fn code(&self) -> Option<&str> {
        last_path_segment(&self.path)
    }
}

/// Inputs an extractor may use besides its match groups.
pub struct ResolveContext<'a> {
    pub page: &'a PageLocation,
    pub fetch: &'a dyn Fetch,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExtractorShape {
    Passthrough,
    PureTransform,
    ApiResolution,
}

impl fmt::Display for ExtractorShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(match self {
            ExtractorShape::Passthrough => "passthrough",
            ExtractorShape::PureTransform => "transform",
            ExtractorShape::ApiResolution => "api",
        })
    }
}

/// Turns the match groups of one provider's capture pattern into a direct
/// media URL.
///
/// Given the same groups, page location and network responses the output
/// must be the same.
#[async_trait]
pub trait Extractor: Send + Sync {
    fn shape(&self) -> ExtractorShape;
    async fn resolve(
        &self,
        groups: &MatchGroups,
        ctx: &ResolveContext<'_>,
    ) -> Result<String, ExtractError>;
}
