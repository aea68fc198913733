use crate::core::{
    DefinitionError, ExtractError, Extractor, ExtractorShape, FetchRequest, MatchGroups, Method,
    ResolveContext,
};
use crate::extractors::template::UrlTemplate;
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Step {
    Key(String),
    Index(usize),
    /// First member of an object, in document order.
    First,
}

/// Location of the media URL inside a JSON response, written like
/// `media.sources[0].file`. A `*` key selects an object's first member.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldPath {
    source: String,
    steps: Vec<Step>,
}

impl FieldPath {
    pub fn parse(path: &str) -> Result<Self, DefinitionError> {
        let invalid = |reason: &str| DefinitionError::FieldPath {
            path: path.to_string(),
            reason: reason.to_string(),
        };

        let mut steps = Vec::new();
        for part in path.split('.') {
            let (key, mut indices) = match part.find('[') {
                Some(at) => (&part[..at], &part[at..]),
                None => (part, ""),
            };
            match key {
                "" => return Err(invalid("empty key")),
                "*" => steps.push(Step::First),
                _ => steps.push(Step::Key(key.to_string())),
            }
            while !indices.is_empty() {
                let close = indices.find(']').ok_or_else(|| invalid("unclosed `[`"))?;
                let index = indices[1..close]
                    .parse()
                    .map_err(|_| invalid("index is not a number"))?;
                steps.push(Step::Index(index));
                indices = &indices[close + 1..];
                if !indices.is_empty() && !indices.starts_with('[') {
                    return Err(invalid("unexpected text after `]`"));
                }
            }
        }

        Ok(Self {
            source: path.to_string(),
            steps,
        })
    }

    pub fn lookup<'v>(&self, value: &'v Value) -> Option<&'v Value> {
        self.steps.iter().try_fold(value, |current, step| match step {
            Step::Key(key) => current.get(key.as_str()),
            Step::Index(index) => current.get(*index),
            Step::First => current.as_object().and_then(|object| object.values().next()),
        })
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

/// Single-hop API resolution: one request to a provider endpoint, then one
/// string field of the JSON response.
#[derive(Debug, Clone)]
pub struct JsonApi {
    method: Method,
    url: UrlTemplate,
    headers: Vec<(String, String)>,
    referrer: Option<UrlTemplate>,
    body: Vec<(String, UrlTemplate)>,
    field: FieldPath,
    decode_uri: bool,
}

impl JsonApi {
    pub fn new(method: Method, url: &str, field: &str) -> Result<Self, DefinitionError> {
        Ok(Self {
            method,
            url: UrlTemplate::parse(url)?,
            headers: Vec::new(),
            referrer: None,
            body: Vec::new(),
            field: FieldPath::parse(field)?,
            decode_uri: false,
        })
    }

    pub fn get(url: &str, field: &str) -> Result<Self, DefinitionError> {
        Self::new(Method::Get, url, field)
    }

    pub fn post(url: &str, field: &str) -> Result<Self, DefinitionError> {
        Self::new(Method::Post, url, field)
    }

    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    pub fn referrer(mut self, template: &str) -> Result<Self, DefinitionError> {
        self.referrer = Some(UrlTemplate::parse(template)?);
        Ok(self)
    }

    /// Adds a string member to the JSON request body.
    pub fn body_field(mut self, name: &str, template: &str) -> Result<Self, DefinitionError> {
        self.body.push((name.to_string(), UrlTemplate::parse(template)?));
        Ok(self)
    }

    /// Percent-decode the extracted field before returning it.
    pub fn decode_uri(mut self) -> Self {
        self.decode_uri = true;
        self
    }

    fn build_request(
        &self,
        groups: &MatchGroups,
        ctx: &ResolveContext<'_>,
    ) -> Result<FetchRequest, ExtractError> {
        let body = if self.body.is_empty() {
            None
        } else {
            let mut object = Map::new();
            for (name, template) in &self.body {
                object.insert(name.clone(), Value::String(template.render(groups, ctx.page)?));
            }
            Some(Value::Object(object))
        };

        Ok(FetchRequest {
            url: self.url.render(groups, ctx.page)?,
            method: self.method,
            headers: self.headers.clone(),
            body,
            referrer: self
                .referrer
                .as_ref()
                .map(|template| template.render(groups, ctx.page))
                .transpose()?,
        })
    }
}

#[async_trait]
impl Extractor for JsonApi {
    fn shape(&self) -> ExtractorShape {
        ExtractorShape::ApiResolution
    }

    async fn resolve(
        &self,
        groups: &MatchGroups,
        ctx: &ResolveContext<'_>,
    ) -> Result<String, ExtractError> {
        let request = self.build_request(groups, ctx)?;
        let url = request.url.clone();
        let response = ctx.fetch.request(request).await?;

        if !(200..300).contains(&response.status) {
            return Err(ExtractError::HttpStatus {
                url,
                status: response.status,
            });
        }

        let field = self
            .field
            .lookup(&response.body)
            .ok_or_else(|| ExtractError::MissingField {
                path: self.field.to_string(),
            })?;
        let media = field.as_str().ok_or_else(|| ExtractError::NotAString {
            path: self.field.to_string(),
        })?;

        if self.decode_uri {
            decode_uri(media)
        } else {
            Ok(media.to_string())
        }
    }
}

/// Escapes `decode_uri` leaves encoded, as they would change how the URL splits.
const RESERVED: &[u8] = b";/?:@&=+$,#";

/// Percent-decodes a whole URL, keeping escapes of reserved characters.
///
/// Malformed escapes and escapes that do not form UTF-8 are errors.
pub fn decode_uri(input: &str) -> Result<String, ExtractError> {
    let bytes = input.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] != b'%' {
            out.push(bytes[i]);
            i += 1;
            continue;
        }

        let hex = |at: usize| bytes.get(at).and_then(|b| char::from(*b).to_digit(16));
        let (Some(high), Some(low)) = (hex(i + 1), hex(i + 2)) else {
            return Err(ExtractError::Decode(format!("malformed escape at offset {}", i)));
        };
        let byte = (high * 16 + low) as u8;
        if RESERVED.contains(&byte) {
            out.extend_from_slice(&bytes[i..i + 3]);
        } else {
            out.push(byte);
        }
        i += 3;
    }

    String::from_utf8(out).map_err(|e| ExtractError::Decode(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extractors::test_support::{context, StaticResponse};
    use serde_json::json;

    fn mcloud() -> JsonApi {
        JsonApi::get("https://mcloud.to/info/{code}?skey={0}", "media.sources[0].file")
            .unwrap()
            .header("Content-Type", "application/json")
            .referrer("https://mcloud.to/embed/{code}")
            .unwrap()
    }

    #[test]
    fn test_field_path_lookup() {
        let value = json!({"media": {"sources": [{"file": "https://x/y.m3u8"}]}});
        let path = FieldPath::parse("media.sources[0].file").unwrap();
        assert_eq!(path.lookup(&value), Some(&json!("https://x/y.m3u8")));

        let value = json!({"sources": {"720p": [{"src": "a"}], "360p": [{"src": "b"}]}});
        let path = FieldPath::parse("sources.*[0].src").unwrap();
        assert_eq!(path.lookup(&value), Some(&json!("a")));

        let path = FieldPath::parse("grid[1][0]").unwrap();
        assert_eq!(path.lookup(&json!({"grid": [[1], [2, 3]]})), Some(&json!(2)));
    }

    #[test]
    fn test_invalid_field_paths() {
        assert!(FieldPath::parse("media..file").is_err());
        assert!(FieldPath::parse("sources[x]").is_err());
        assert!(FieldPath::parse("sources[0").is_err());
        assert!(FieldPath::parse("sources[0]x").is_err());
    }

    #[tokio::test]
    async fn test_resolves_nested_field() {
        let fetch = StaticResponse::new(
            200,
            json!({"media": {"sources": [{"file": "https://x/y.m3u8"}]}}),
        );
        let page = context("mcloud.to", "/embed/abc");
        let ctx = ResolveContext {
            page: &page,
            fetch: &fetch,
        };

        let url = mcloud().resolve(&MatchGroups::from(vec!["key1"]), &ctx).await.unwrap();
        assert_eq!(url, "https://x/y.m3u8");

        let requests = fetch.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].url, "https://mcloud.to/info/abc?skey=key1");
        assert_eq!(requests[0].method, Method::Get);
        assert_eq!(requests[0].referrer.as_deref(), Some("https://mcloud.to/embed/abc"));
        assert!(requests[0].body.is_none());
    }

    #[tokio::test]
    async fn test_post_body_from_page_code() {
        let fetch = StaticResponse::new(200, json!({"stream": {"src": "https://cdn/e.mp4"}}));
        let page = context("evoload.io", "/e/K0de");
        let ctx = ResolveContext {
            page: &page,
            fetch: &fetch,
        };
        let api = JsonApi::post("https://evoload.io/SecurePlayer", "stream.src")
            .unwrap()
            .body_field("code", "{code}")
            .unwrap();

        let url = api.resolve(&MatchGroups::default(), &ctx).await.unwrap();
        assert_eq!(url, "https://cdn/e.mp4");
        assert_eq!(fetch.requests()[0].body, Some(json!({"code": "K0de"})));
    }

    #[tokio::test]
    async fn test_decode_uri() {
        let fetch = StaticResponse::new(
            200,
            json!({"sources": {"1080p": [{"src": "https://ng/a%20b.mp4"}]}}),
        );
        let page = context("www.newgrounds.com", "/portal/view/123");
        let ctx = ResolveContext {
            page: &page,
            fetch: &fetch,
        };
        let api = JsonApi::get("https://www.newgrounds.com/portal/video/{code}", "sources.*[0].src")
            .unwrap()
            .decode_uri();

        let url = api.resolve(&MatchGroups::default(), &ctx).await.unwrap();
        assert_eq!(url, "https://ng/a b.mp4");
    }

    #[test]
    fn test_decode_uri_keeps_reserved_escapes() {
        assert_eq!(
            decode_uri("https://ng/a%20b.mp4?sig=x%26y%3Dz").unwrap(),
            "https://ng/a b.mp4?sig=x%26y%3Dz"
        );
        assert_eq!(decode_uri("%2F%3f%23%2c%E2%82%AC").unwrap(), "%2F%3f%23%2c\u{20ac}");
        assert_eq!(decode_uri("no escapes").unwrap(), "no escapes");
        assert!(decode_uri("bad%2").is_err());
        assert!(decode_uri("bad%zz").is_err());
        assert!(decode_uri("%FF").is_err());
    }

    #[tokio::test]
    async fn test_decode_uri_keeps_signed_query() {
        let fetch = StaticResponse::new(
            200,
            json!({"sources": {"720p": [{"src": "https://ng/a%20b.mp4?sig=x%26y%3Dz"}]}}),
        );
        let page = context("www.newgrounds.com", "/portal/view/123");
        let ctx = ResolveContext {
            page: &page,
            fetch: &fetch,
        };
        let api = JsonApi::get("https://www.newgrounds.com/portal/video/{code}", "sources.*[0].src")
            .unwrap()
            .decode_uri();

        let url = api.resolve(&MatchGroups::default(), &ctx).await.unwrap();
        assert_eq!(url, "https://ng/a b.mp4?sig=x%26y%3Dz");
    }

    #[tokio::test]
    async fn test_missing_field() {
        let fetch = StaticResponse::new(200, json!({"media": {"sources": []}}));
        let page = context("mcloud.to", "/embed/abc");
        let ctx = ResolveContext {
            page: &page,
            fetch: &fetch,
        };

        let err = mcloud().resolve(&MatchGroups::from(vec!["k"]), &ctx).await.unwrap_err();
        assert!(matches!(
            err,
            ExtractError::MissingField { path } if path == "media.sources[0].file"
        ));
    }

    #[tokio::test]
    async fn test_non_string_field() {
        let fetch = StaticResponse::new(200, json!({"media": {"sources": [{"file": 42}]}}));
        let page = context("mcloud.to", "/embed/abc");
        let ctx = ResolveContext {
            page: &page,
            fetch: &fetch,
        };

        let err = mcloud().resolve(&MatchGroups::from(vec!["k"]), &ctx).await.unwrap_err();
        assert!(matches!(err, ExtractError::NotAString { .. }));
    }

    #[tokio::test]
    async fn test_http_error_status() {
        let fetch = StaticResponse::new(404, json!({"error": "not found"}));
        let page = context("mcloud.to", "/embed/abc");
        let ctx = ResolveContext {
            page: &page,
            fetch: &fetch,
        };

        let err = mcloud().resolve(&MatchGroups::from(vec!["k"]), &ctx).await.unwrap_err();
        assert!(matches!(err, ExtractError::HttpStatus { status: 404, .. }));
    }

    #[tokio::test]
    async fn test_missing_capture_skips_request() {
        let fetch = StaticResponse::new(200, json!({}));
        let page = context("mcloud.to", "/embed/abc");
        let ctx = ResolveContext {
            page: &page,
            fetch: &fetch,
        };

        let err = mcloud().resolve(&MatchGroups::default(), &ctx).await.unwrap_err();
        assert!(matches!(err, ExtractError::MissingGroup { .. }));
        assert!(fetch.requests().is_empty());
    }
}
