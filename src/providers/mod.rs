//! The built-in provider table.
//!
//! Entries are data: a domain list, a capture pattern and one of the shared
//! extraction strategies. Order matters, it is the last tie-break when more
//! than one provider matches a page.

use crate::core::{CapturePattern, DefinitionError, ProviderDescriptor, Reliability};
use crate::extractors::{JsonApi, Passthrough, Rot47, Template};

/// Pipe-delimited tokens of a packed player script.
const PACKED_TOKENS: &str = r"\|(\w{2,})";
/// Session key assigned as a quoted string literal, e.g. `'abc123';`.
const SESSION_KEY: &str = r"'(\w+)';";

pub fn builtin_providers() -> Result<Vec<ProviderDescriptor>, DefinitionError> {
    Ok(vec![
        ProviderDescriptor::new(
            "evoload",
            "Evoload",
            Reliability::Normal,
            &["evoload.io"],
            CapturePattern::Wildcard,
            JsonApi::post("https://evoload.io/SecurePlayer", "stream.src")?
                .header("Content-Type", "application/json")
                .body_field("code", "{code}")?,
        ),
        ProviderDescriptor::new(
            "mcloud",
            "MCloud",
            Reliability::High,
            &["mcloud.to"],
            CapturePattern::regex(SESSION_KEY)?,
            JsonApi::get("https://mcloud.to/info/{code}?skey={0}", "media.sources[0].file")?
                .header("Content-Type", "application/json")
                .referrer("https://mcloud.to/embed/{code}")?,
        ),
        ProviderDescriptor::new(
            "mixdrop",
            "Mixdrop",
            Reliability::High,
            &["mixdrop.co"],
            CapturePattern::regex(PACKED_TOKENS)?,
            Template::new("https://a-{1}.{4}.{5}/v/{2}.{6}?s={12}&e={13}")?,
        ),
        ProviderDescriptor::new(
            "newgrounds",
            "Newgrounds",
            Reliability::High,
            &["newgrounds.com"],
            CapturePattern::Wildcard,
            JsonApi::get("https://www.newgrounds.com/portal/video/{code}", "sources.*[0].src")?
                .header("X-Requested-With", "XMLHttpRequest")
                .decode_uri(),
        ),
        ProviderDescriptor::new(
            "streamtape",
            "Streamtape",
            Reliability::Normal,
            &["streamtape.com"],
            CapturePattern::regex(r"(id=\S*)'")?,
            Template::new("https://streamtape.com/get_video?{0}")?,
        ),
        ProviderDescriptor::new(
            "streamzz",
            "Streamzz",
            Reliability::Normal,
            &["streamzz.to"],
            CapturePattern::regex(r"https?://get\.streamz\.tw/getlink-\w+\.dll")?,
            Passthrough::new(0),
        ),
        ProviderDescriptor::new(
            "thevideome",
            "TheVideoMe",
            Reliability::Normal,
            &["thevideome.com"],
            CapturePattern::regex(PACKED_TOKENS)?,
            Template::new("https://thevideome.com/{5}.mp4")?,
        ),
        ProviderDescriptor::new(
            "upstream",
            "Upstream",
            Reliability::Normal,
            &["upstream.to"],
            CapturePattern::regex(PACKED_TOKENS)?,
            Template::new("https://{49}.upstreamcdn.co/hls/{148}/master.m3u8")?,
        ),
        ProviderDescriptor::new(
            "vidlox",
            "Vidlox",
            Reliability::Normal,
            &["vidlox.me"],
            CapturePattern::regex(r#"\["(\S+?)""#)?,
            Passthrough::new(0),
        ),
        ProviderDescriptor::new(
            "vidstream",
            "Vidstream",
            Reliability::Low,
            &["vidstream.pro"],
            CapturePattern::regex(SESSION_KEY)?,
            JsonApi::get("https://vidstream.pro/info/{code}?skey={0}", "media.sources[0].file")?
                .header("Content-Type", "application/json")
                .referrer("https://vidstream.pro/embed/{code}")?,
        )
        .with_notice("disabled: player no longer serves session keys")
        .locked(),
        ProviderDescriptor::new(
            "vidoza",
            "Vidoza",
            Reliability::Normal,
            &["vidoza.net"],
            CapturePattern::regex(r#"src:\s*"(\S*)""#)?,
            Passthrough::new(0),
        ),
        ProviderDescriptor::new(
            "vivo",
            "Vivo",
            Reliability::High,
            &["vivo.st", "vivo.sx"],
            CapturePattern::regex(r"source:\s'(\S+)'")?,
            Rot47::new(0),
        ),
        ProviderDescriptor::new(
            "voe",
            "Voe",
            Reliability::High,
            &["voe.sx", "voeunblk.com"],
            CapturePattern::regex(r#"(https?://\S*m3u8)""#)?,
            Passthrough::new(0),
        ),
        ProviderDescriptor::new(
            "vupload",
            "Vupload",
            Reliability::High,
            &["vupload.com"],
            CapturePattern::regex(r#"src:\s?"(.+?)""#)?,
            Passthrough::new(0),
        ),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{ExtractorShape, MatchGroups, Registry, ResolveContext};
    use crate::extractors::rot47;
    use crate::extractors::test_support::{context, NoNetwork};

    fn capture(id: &str, content: &str) -> Option<MatchGroups> {
        Registry::builtin().find_by_id(id).unwrap().pattern().captures(content)
    }

    fn run(id: &str, host: &str, path: &str, content: &str) -> String {
        let provider = Registry::builtin().find_by_id(id).unwrap();
        let groups = provider.pattern().captures(content).unwrap();
        let (page, fetch) = (context(host, path), NoNetwork);
        let ctx = ResolveContext {
            page: &page,
            fetch: &fetch,
        };
        tokio_test::block_on(provider.extractor().resolve(&groups, &ctx)).unwrap()
    }

    #[test]
    fn test_shapes() {
        let registry = Registry::builtin();
        let shape = |id: &str| registry.find_by_id(id).unwrap().extractor().shape();
        assert_eq!(shape("mcloud"), ExtractorShape::ApiResolution);
        assert_eq!(shape("mixdrop"), ExtractorShape::PureTransform);
        assert_eq!(shape("vivo"), ExtractorShape::PureTransform);
        assert_eq!(shape("voe"), ExtractorShape::Passthrough);
    }

    #[test]
    fn test_session_key_pattern() {
        let groups = capture("mcloud", "window.skey = 'abc123';").unwrap();
        assert_eq!(groups.as_slice(), &["abc123"]);
    }

    #[test]
    fn test_streamtape() {
        let content = concat!(
            r#"document.getElementById('link').innerHTML = "#,
            r#""//streamtape.com/get_video?" + 'id=xyz&expires=1&token=t';"#,
        );
        assert_eq!(
            run("streamtape", "streamtape.com", "/e/xyz", content),
            "https://streamtape.com/get_video?id=xyz&expires=1&token=t"
        );
    }

    #[test]
    fn test_thevideome_packed_tokens() {
        let content =
            "eval(function(p,a,c,k,e,d){}('0 1',3,3,'|ab|cd|ef|gh|ij|video123|x'.split('|')))";
        assert_eq!(
            run("thevideome", "thevideome.com", "/e/1", content),
            "https://thevideome.com/video123.mp4"
        );
    }

    #[test]
    fn test_passthrough_patterns() {
        assert_eq!(
            run(
                "vidlox",
                "vidlox.me",
                "/e/1",
                r#"sources: ["https://v.vidlox.me/hls/a.m3u8","b"]"#,
            ),
            "https://v.vidlox.me/hls/a.m3u8"
        );
        assert_eq!(
            run(
                "vidoza",
                "vidoza.net",
                "/e/1",
                r#"{ src: "https://str.vidoza.net/v.mp4", type: "video/mp4" }"#,
            ),
            "https://str.vidoza.net/v.mp4"
        );
        assert_eq!(
            run("vupload", "vupload.com", "/e/1", r#"src:"https://cdn.vupload.com/a b.mp4""#),
            "https://cdn.vupload.com/a b.mp4"
        );
        assert_eq!(
            run("voe", "voe.sx", "/e/1", r#"'hls': "https://cdn.example/video.m3u8","#),
            "https://cdn.example/video.m3u8"
        );
    }

    #[test]
    fn test_vivo_rot47() {
        let token = urlencoding::encode(&rot47("https://node.vivo.sx/get/abc")).into_owned();
        let content = format!("InitializeStream({{ source: '{}', }});", token);
        assert_eq!(
            run("vivo", "vivo.sx", "/abc", &content),
            "https://node.vivo.sx/get/abc"
        );
    }

    #[test]
    fn test_upstream_needs_many_tokens() {
        let provider = Registry::builtin().find_by_id("upstream").unwrap();
        let groups = provider.pattern().captures("|aa|bb|cc").unwrap();
        let (page, fetch) = (context("upstream.to", "/e/1"), NoNetwork);
        let ctx = ResolveContext {
            page: &page,
            fetch: &fetch,
        };

        let result = tokio_test::block_on(provider.extractor().resolve(&groups, &ctx));
        assert!(result.is_err());
    }
}
