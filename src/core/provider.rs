use crate::core::error::{DefinitionError, ExtractError};
use crate::core::extractor::Extractor;
use crate::utils::{domain_matches, normalize_host};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

/// Tie-break weight between providers whose patterns all match.
///
/// Ordered so that `High` compares greatest. Never used to filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Reliability {
    Low,
    Normal,
    High,
}

impl fmt::Display for Reliability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(match self {
            Reliability::Low => "low",
            Reliability::Normal => "normal",
            Reliability::High => "high",
        })
    }
}

/// Tokens captured from page content, in document order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MatchGroups(Vec<String>);

impl MatchGroups {
    pub fn get(&self, index: usize) -> Result<&str, ExtractError> {
        self.0
            .get(index)
            .map(String::as_str)
            .ok_or(ExtractError::MissingGroup {
                index,
                available: self.0.len(),
            })
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }
}

impl From<Vec<String>> for MatchGroups {
    fn from(groups: Vec<String>) -> Self {
        Self(groups)
    }
}

impl From<Vec<&str>> for MatchGroups {
    fn from(groups: Vec<&str>) -> Self {
        Self(groups.into_iter().map(str::to_string).collect())
    }
}

/// How a provider locates its tokens in page content.
#[derive(Debug, Clone)]
pub enum CapturePattern {
    /// Matches any content with no captured tokens. Only selected when no
    /// regex-pattern candidate for the same host matched.
    Wildcard,
    /// Applied globally. Each match yields capture group 1 when the pattern
    /// declares one, otherwise the whole match.
    Regex(Regex),
}

impl CapturePattern {
    pub fn regex(pattern: &str) -> Result<Self, DefinitionError> {
        Ok(CapturePattern::Regex(Regex::new(pattern)?))
    }

    pub fn is_wildcard(&self) -> bool {
        matches!(self, CapturePattern::Wildcard)
    }

    /// Applies the pattern, returning `None` when it does not match at all.
    pub fn captures(&self, content: &str) -> Option<MatchGroups> {
        match self {
            CapturePattern::Wildcard => Some(MatchGroups::default()),
            CapturePattern::Regex(re) => {
                let group = usize::from(re.captures_len() > 1);
                let groups: Vec<String> = re
                    .captures_iter(content)
                    .filter_map(|caps| caps.get(group))
                    .map(|m| m.as_str().to_string())
                    .collect();

                if groups.is_empty() {
                    None
                } else {
                    Some(MatchGroups(groups))
                }
            }
        }
    }
}

impl fmt::Display for CapturePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CapturePattern::Wildcard => f.write_str("*"),
            CapturePattern::Regex(re) => f.write_str(re.as_str()),
        }
    }
}

/// The only mutable part of a provider, swapped as a whole.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProviderStatus {
    pub locked: bool,
    pub notice: Option<String>,
}

/// Static definition of one hosting provider.
pub struct ProviderDescriptor {
    id: String,
    name: String,
    reliability: Reliability,
    domains: Vec<String>,
    pattern: CapturePattern,
    extractor: Arc<dyn Extractor>,
    status: RwLock<ProviderStatus>,
}

impl ProviderDescriptor {
    pub fn new(
        id: &str,
        name: &str,
        reliability: Reliability,
        domains: &[&str],
        pattern: CapturePattern,
        extractor: impl Extractor + 'static,
    ) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            reliability,
            domains: domains.iter().map(|d| normalize_host(d)).collect(),
            pattern,
            extractor: Arc::new(extractor),
            status: RwLock::new(ProviderStatus::default()),
        }
    }

    pub fn with_notice(self, notice: &str) -> Self {
        self.set_status(ProviderStatus {
            notice: Some(notice.to_string()),
            ..self.status()
        });
        self
    }

    pub fn locked(self) -> Self {
        self.set_status(ProviderStatus {
            locked: true,
            ..self.status()
        });
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn reliability(&self) -> Reliability {
        self.reliability
    }

    pub fn domains(&self) -> &[String] {
        &self.domains
    }

    pub fn pattern(&self) -> &CapturePattern {
        &self.pattern
    }

    pub fn extractor(&self) -> &dyn Extractor {
        self.extractor.as_ref()
    }

    /// Whether any of this provider's domains claims `host` (already normalized).
    pub fn claims(&self, host: &str) -> bool {
        self.domains.iter().any(|domain| domain_matches(host, domain))
    }

    pub fn status(&self) -> ProviderStatus {
        self.status
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn is_locked(&self) -> bool {
        self.status
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .locked
    }

    pub fn notice(&self) -> Option<String> {
        self.status().notice
    }

    pub(crate) fn set_status(&self, status: ProviderStatus) {
        *self.status.write().unwrap_or_else(PoisonError::into_inner) = status;
    }
}

impl fmt::Debug for ProviderDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderDescriptor")
            .field("id", &self.id)
            .field("reliability", &self.reliability)
            .field("domains", &self.domains)
            .field("pattern", &self.pattern.to_string())
            .field("shape", &self.extractor.shape())
            .field("status", &self.status())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extractors::Passthrough;

    #[test]
    fn test_reliability_ordering() {
        assert!(Reliability::High > Reliability::Normal);
        assert!(Reliability::Normal > Reliability::Low);
    }

    #[test]
    fn test_regex_pattern_prefers_first_group() {
        let pattern = CapturePattern::regex(r"'(\w+)';").unwrap();
        let groups = pattern.captures("var a = 'abc123'; var b = 'def';").unwrap();
        assert_eq!(groups.as_slice(), &["abc123", "def"]);
    }

    #[test]
    fn test_regex_pattern_whole_match_without_group() {
        let pattern = CapturePattern::regex(r"https?://get\.streamz\.tw/getlink-\w+\.dll").unwrap();
        let groups = pattern
            .captures(r#"src="https://get.streamz.tw/getlink-a1b2.dll""#)
            .unwrap();
        assert_eq!(groups.get(0).unwrap(), "https://get.streamz.tw/getlink-a1b2.dll");
    }

    #[test]
    fn test_regex_pattern_no_match() {
        let pattern = CapturePattern::regex(r"\|(\w{2,})").unwrap();
        assert!(pattern.captures("nothing to see here").is_none());
    }

    #[test]
    fn test_wildcard_matches_empty() {
        let groups = CapturePattern::Wildcard.captures("").unwrap();
        assert!(groups.is_empty());
    }

    #[test]
    fn test_missing_group() {
        let groups = MatchGroups::from(vec!["a", "b"]);
        assert!(matches!(
            groups.get(5),
            Err(ExtractError::MissingGroup { index: 5, available: 2 })
        ));
    }

    #[test]
    fn test_descriptor_claims_subdomains() {
        let descriptor = ProviderDescriptor::new(
            "voe",
            "Voe",
            Reliability::High,
            &["voe.sx", "VOEUNBLK.com"],
            CapturePattern::Wildcard,
            Passthrough::new(0),
        );
        assert!(descriptor.claims("voe.sx"));
        assert!(descriptor.claims("www.voeunblk.com"));
        assert!(!descriptor.claims("notvoe.sx"));
    }

    #[test]
    fn test_status_builders() {
        let descriptor = ProviderDescriptor::new(
            "vivo",
            "Vivo",
            Reliability::High,
            &["vivo.sx"],
            CapturePattern::Wildcard,
            Passthrough::new(0),
        )
        .with_notice("slow CDN")
        .locked();

        assert!(descriptor.is_locked());
        assert_eq!(descriptor.notice().as_deref(), Some("slow CDN"));
    }
}
