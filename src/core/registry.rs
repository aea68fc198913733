use crate::config::ProviderOverride;
use crate::core::error::{DefinitionError, ResolveError};
use crate::core::provider::{ProviderDescriptor, ProviderStatus};
use crate::providers::builtin_providers;
use crate::utils::normalize_host;
use once_cell::sync::Lazy;
use std::collections::{HashMap, HashSet};

static BUILTIN: Lazy<Registry> = Lazy::new(|| {
    builtin_providers()
        .and_then(Registry::new)
        .expect("built-in provider table is valid")
});

/// Ordered, read-only collection of provider descriptors.
///
/// Insertion order is significant: it is the final tie-break during dispatch.
/// The only mutation is the per-provider status swap in [`Registry::set_status`].
#[derive(Debug)]
pub struct Registry {
    providers: Vec<ProviderDescriptor>,
}

impl Registry {
    pub fn new(providers: Vec<ProviderDescriptor>) -> Result<Self, DefinitionError> {
        let mut seen = HashSet::new();
        for provider in &providers {
            if !seen.insert(provider.id()) {
                return Err(DefinitionError::DuplicateId(provider.id().to_string()));
            }
            if provider.domains().is_empty() {
                return Err(DefinitionError::NoDomains(provider.id().to_string()));
            }
        }

        Ok(Self { providers })
    }

    /// The process-wide registry of built-in providers, built on first use.
    pub fn builtin() -> &'static Registry {
        &BUILTIN
    }

    pub fn providers(&self) -> &[ProviderDescriptor] {
        &self.providers
    }

    /// Every provider claiming `host`, locked ones included.
    pub fn claimants<'a>(
        &'a self,
        host: &str,
    ) -> impl Iterator<Item = &'a ProviderDescriptor> + 'a {
        let host = normalize_host(host);
        self.providers.iter().filter(move |p| p.claims(&host))
    }

    /// Non-locked providers claiming `host`, in registry order.
    pub fn find_by_host(&self, host: &str) -> Vec<&ProviderDescriptor> {
        self.claimants(host).filter(|p| !p.is_locked()).collect()
    }

    pub fn find_by_id(&self, id: &str) -> Option<&ProviderDescriptor> {
        self.providers.iter().find(|p| p.id() == id)
    }

    /// Replaces a provider's lock flag and notice. Returns `false` for unknown ids.
    pub fn set_status(&self, id: &str, status: ProviderStatus) -> bool {
        match self.find_by_id(id) {
            Some(provider) => {
                tracing::debug!("Provider {} status: {:?}", id, status);
                provider.set_status(status);
                true
            }
            None => false,
        }
    }

    /// Applies configured overrides and returns the ids that matched no provider.
    pub fn apply_overrides(&self, overrides: &HashMap<String, ProviderOverride>) -> Vec<String> {
        let mut unknown = Vec::new();

        for (id, patch) in overrides {
            let Some(provider) = self.find_by_id(id) else {
                tracing::warn!("Ignoring override for unknown provider: {}", id);
                unknown.push(id.clone());
                continue;
            };

            let current = provider.status();
            self.set_status(
                id,
                ProviderStatus {
                    locked: patch.locked.unwrap_or(current.locked),
                    notice: patch.notice.clone().or(current.notice),
                },
            );
        }

        unknown.sort();
        unknown
    }

    /// Explains why no provider was selected for `host`: `ProviderLocked` if a
    /// locked provider claims it, `NoProviderMatched` otherwise.
    pub fn explain_miss(&self, host: &str) -> ResolveError {
        match self.claimants(host).find(|p| p.is_locked()) {
            Some(provider) => ResolveError::ProviderLocked {
                provider: provider.id().to_string(),
                notice: provider.notice(),
            },
            None => ResolveError::NoProviderMatched {
                host: normalize_host(host),
            },
        }
    }
}
