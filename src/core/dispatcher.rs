use crate::core::error::ResolveError;
use crate::core::extractor::{PageLocation, ResolveContext};
use crate::core::fetch::Fetch;
use crate::core::provider::{MatchGroups, ProviderDescriptor};
use crate::core::registry::Registry;
use crate::utils::normalize_host;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// The provider picked for one resolution call and the tokens its pattern
/// captured.
#[derive(Debug)]
pub struct Selection<'r> {
    pub provider: &'r ProviderDescriptor,
    pub groups: MatchGroups,
}

/// A successfully resolved media URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Resolved {
    pub url: String,
    pub provider: String,
    pub notice: Option<String>,
}

/// Selects exactly one provider for a page and runs its extractor.
pub struct Dispatcher<'r> {
    registry: &'r Registry,
    fetch: Arc<dyn Fetch>,
}

impl<'r> Dispatcher<'r> {
    pub fn new(registry: &'r Registry, fetch: Arc<dyn Fetch>) -> Self {
        Self { registry, fetch }
    }

    /// Picks the provider for `host` whose pattern matches `content`.
    ///
    /// Wildcard providers only count when no regex-pattern candidate matched.
    /// Among several matches the highest reliability wins, then registry order.
    pub fn select(&self, host: &str, content: &str) -> Result<Selection<'r>, ResolveError> {
        let host = normalize_host(host);
        let candidates = self.registry.find_by_host(&host);
        if candidates.is_empty() {
            return Err(ResolveError::NoProviderMatched { host });
        }

        let mut matched = Vec::new();
        let mut fallbacks = Vec::new();
        for provider in candidates {
            if provider.pattern().is_wildcard() {
                fallbacks.push(provider);
                continue;
            }
            match provider.pattern().captures(content) {
                Some(groups) => {
                    debug!("Provider {} matched {} groups", provider.id(), groups.len());
                    matched.push(Selection { provider, groups });
                }
                None => debug!("Provider {} pattern not found", provider.id()),
            }
        }

        if matched.is_empty() {
            matched = fallbacks
                .into_iter()
                .map(|provider| Selection {
                    provider,
                    groups: MatchGroups::default(),
                })
                .collect();
        }

        // Strictly greater keeps the earliest registered provider on ties.
        matched
            .into_iter()
            .reduce(|best, next| {
                if next.provider.reliability() > best.provider.reliability() {
                    next
                } else {
                    best
                }
            })
            .ok_or(ResolveError::PatternNotFound { host })
    }

    /// Resolves the direct media URL for an embed page.
    ///
    /// An extractor failure is returned as is; the next-best candidate is never
    /// tried.
    pub async fn resolve(
        &self,
        page: &PageLocation,
        content: &str,
    ) -> Result<Resolved, ResolveError> {
        let Selection { provider, groups } = self.select(page.host(), content)?;
        info!("Using provider {} for {}", provider.id(), page.host());
        let notice = provider.notice();

        let ctx = ResolveContext {
            page,
            fetch: self.fetch.as_ref(),
        };

        match provider.extractor().resolve(&groups, &ctx).await {
            Ok(url) => {
                info!("Resolved media URL: {}", url);
                Ok(Resolved {
                    url,
                    provider: provider.id().to_string(),
                    notice,
                })
            }
            Err(source) => {
                warn!("Provider {} failed: {}", provider.id(), source);
                Err(ResolveError::ExtractorFailure {
                    provider: provider.id().to_string(),
                    source,
                })
            }
        }
    }
}
