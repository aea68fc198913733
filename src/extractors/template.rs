use crate::core::{
    DefinitionError, ExtractError, Extractor, ExtractorShape, MatchGroups, PageLocation,
    ResolveContext,
};
use async_trait::async_trait;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Group(usize),
    Code,
    Host,
}

/// A URL with `{N}`, `{code}` and `{host}` placeholders, parsed once when the
/// provider table is built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlTemplate {
    source: String,
    segments: Vec<Segment>,
}

impl UrlTemplate {
    pub fn parse(template: &str) -> Result<Self, DefinitionError> {
        let invalid = |reason: &str| DefinitionError::Template {
            template: template.to_string(),
            reason: reason.to_string(),
        };

        let mut segments = Vec::new();
        let mut rest = template;
        while let Some(open) = rest.find(['{', '}']) {
            if rest[open..].starts_with('}') {
                return Err(invalid("unmatched `}`"));
            }
            if open > 0 {
                segments.push(Segment::Literal(rest[..open].to_string()));
            }
            let after = &rest[open + 1..];
            let close = after.find('}').ok_or_else(|| invalid("unclosed `{`"))?;
            let key = &after[..close];
            segments.push(match key {
                "code" => Segment::Code,
                "host" => Segment::Host,
                _ => Segment::Group(
                    key.parse()
                        .map_err(|_| invalid(&format!("unknown placeholder `{{{}}}`", key)))?,
                ),
            });
            rest = &after[close + 1..];
        }
        if !rest.is_empty() {
            segments.push(Segment::Literal(rest.to_string()));
        }

        Ok(Self {
            source: template.to_string(),
            segments,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    pub fn render(
        &self,
        groups: &MatchGroups,
        page: &PageLocation,
    ) -> Result<String, ExtractError> {
        let mut out = String::with_capacity(self.source.len());
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Group(index) => out.push_str(groups.get(*index)?),
                Segment::Code => out.push_str(page.code().ok_or(ExtractError::MissingCode)?),
                Segment::Host => out.push_str(page.host()),
            }
        }
        Ok(out)
    }
}

/// Pure transform: formats the final URL from captured tokens.
#[derive(Debug, Clone)]
pub struct Template {
    template: UrlTemplate,
}

impl Template {
    pub fn new(template: &str) -> Result<Self, DefinitionError> {
        Ok(Self {
            template: UrlTemplate::parse(template)?,
        })
    }
}

#[async_trait]
impl Extractor for Template {
    fn shape(&self) -> ExtractorShape {
        ExtractorShape::PureTransform
    }

    async fn resolve(
        &self,
        groups: &MatchGroups,
        ctx: &ResolveContext<'_>,
    ) -> Result<String, ExtractError> {
        self.template.render(groups, ctx.page)
    }
}
