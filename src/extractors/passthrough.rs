use crate::core::{ExtractError, Extractor, ExtractorShape, MatchGroups, ResolveContext};
use async_trait::async_trait;

/// The capture pattern already isolates the final URL.
#[derive(Debug, Clone, Copy)]
pub struct Passthrough {
    group: usize,
}

impl Passthrough {
    pub fn new(group: usize) -> Self {
        Self { group }
    }
}

#[async_trait]
impl Extractor for Passthrough {
    fn shape(&self) -> ExtractorShape {
        ExtractorShape::Passthrough
    }

    async fn resolve(
        &self,
        groups: &MatchGroups,
        _ctx: &ResolveContext<'_>,
    ) -> Result<String, ExtractError> {
        Ok(groups.get(self.group)?.to_string())
    }
}
