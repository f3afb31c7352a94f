use super::error::ResolutionError;
use super::fetch::HtmlDocument;
use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;
use url::Url;

/// `"file": "<value>"` anywhere in the page; the player config is sometimes
/// pretty-printed so the match has to cross line breaks.
static FILE_FIELD: Lazy<Result<Regex, regex::Error>> =
    Lazy::new(|| Regex::new(r#"(?s)"file":\s*"(.*?)""#));

const BUMPER_MARKER: &str = "bumper";

/// Playable stream URL, query already stripped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedStream {
    url: Url,
}

impl ResolvedStream {
    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn as_str(&self) -> &str {
        self.url.as_str()
    }
}

impl fmt::Display for ResolvedStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.url.as_str())
    }
}

/// First `"file"` candidate that is not a bumper and parses as a URL.
pub fn extract(document: &HtmlDocument) -> Result<ResolvedStream, ResolutionError> {
    let re = FILE_FIELD
        .as_ref()
        .map_err(|e| ResolutionError::Regex(e.clone()))?;

    for caps in re.captures_iter(document.text()) {
        let Some(raw) = caps.get(1) else { continue };
        let candidate = normalize_candidate(raw.as_str());

        if is_bumper(&candidate) {
            tracing::debug!(%candidate, "skipping bumper");
            continue;
        }

        match parse_candidate(&candidate) {
            Ok(url) => {
                tracing::debug!(%url, "extracted video URL");
                return Ok(ResolvedStream { url });
            }
            Err(e) => {
                tracing::warn!(%candidate, error = %e, "invalid video URL extracted");
            }
        }
    }

    tracing::warn!("no suitable video URL found in HTML content");
    Err(ResolutionError::VideoUrlNotFound)
}

/// Undo the page's JSON escaping and percent-encoding, then drop the query.
///
/// Percent-decoding is all or nothing: a malformed escape such as `%ZZ`, or
/// escapes that decode to invalid UTF-8, leave the whole string undecoded.
pub fn normalize_candidate(raw: &str) -> String {
    let unescaped = raw.replace("%5C/", "/").replace('\\', "");
    let mut decoded = if has_malformed_escape(&unescaped) {
        unescaped
    } else {
        urlencoding::decode(&unescaped)
            .map(|s| s.into_owned())
            .unwrap_or(unescaped)
    };
    if let Some(idx) = decoded.find('?') {
        decoded.truncate(idx);
    }
    decoded
}

fn has_malformed_escape(s: &str) -> bool {
    let bytes = s.as_bytes();
    bytes.iter().enumerate().any(|(i, &b)| {
        b == b'%'
            && !bytes
                .get(i + 1..i + 3)
                .is_some_and(|hex| hex.iter().all(u8::is_ascii_hexdigit))
    })
}

fn is_bumper(candidate: &str) -> bool {
    candidate.to_lowercase().contains(BUMPER_MARKER)
}

fn parse_candidate(candidate: &str) -> Result<Url, url::ParseError> {
    // Scheme-relative links are served over https.
    match candidate.strip_prefix("//") {
        Some(rest) => Url::parse(&format!("https://{rest}")),
        None => Url::parse(candidate),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(html: &str) -> Result<ResolvedStream, ResolutionError> {
        extract(&HtmlDocument::new(html))
    }

    #[test]
    fn test_skips_bumper_and_strips_query() {
        let html = r#"
<script>
  var config = {
    "playlist": [
      {"file": "https://cdn.example/pre/bumper.mp4", "type": "mp4"},
      {"file": "https://cdn.example/stream.m3u8?v=5iip:1.2.3.4", "type": "hls"}
    ]
  };
</script>"#;
        assert_eq!(run(html).unwrap().as_str(), "https://cdn.example/stream.m3u8");
    }

    #[test]
    fn test_unescapes_slashes() {
        let html = r#"{"file": "https:\/\/cdn.example\/a%5C/b.m3u8"}"#;
        assert_eq!(run(html).unwrap().as_str(), "https://cdn.example/a/b.m3u8");
        assert_eq!(
            normalize_candidate(r"https:\/\/cdn.example\/a%5C/b.m3u8"),
            "https://cdn.example/a/b.m3u8"
        );
    }

    #[test]
    fn test_percent_decoding() {
        assert_eq!(
            normalize_candidate("https%3A%2F%2Fcdn.example%2Flive%20hd.m3u8"),
            "https://cdn.example/live hd.m3u8"
        );
        // Decodes to invalid UTF-8: keep the undecoded text.
        assert_eq!(normalize_candidate("https://cdn.example/%FF.m3u8"), "https://cdn.example/%FF.m3u8");
    }

    #[test]
    fn test_malformed_escape_keeps_whole_string() {
        assert_eq!(normalize_candidate("a%20b%ZZ"), "a%20b%ZZ");
        assert_eq!(normalize_candidate("live%2"), "live%2");
        assert_eq!(normalize_candidate("a%20b%2F"), "a b/");
    }

    #[test]
    fn test_query_stripped_after_decoding() {
        assert_eq!(
            normalize_candidate("https://cdn.example/live.m3u8%3Ftoken%3Dabc"),
            "https://cdn.example/live.m3u8"
        );
    }

    #[test]
    fn test_all_bumpers_not_found() {
        let html = r#"
{"file": "https://cdn.example/bumper.mp4"}
{"file": "https://cdn.example/Intro_BUMPER_v2.mp4?x=1"}
"#;
        assert!(matches!(run(html), Err(ResolutionError::VideoUrlNotFound)));
    }

    #[test]
    fn test_no_candidates() {
        assert!(matches!(run(""), Err(ResolutionError::VideoUrlNotFound)));
        assert!(matches!(
            run(r#"<html><body>"source": "https://cdn.example/x.m3u8"</body></html>"#),
            Err(ResolutionError::VideoUrlNotFound)
        ));
    }

    #[test]
    fn test_invalid_candidate_does_not_abort_scan() {
        let html = r#"{"file": "not a url"}, {"file": ""}, {"file": "https://cdn.example/ok.m3u8"}"#;
        assert_eq!(run(html).unwrap().as_str(), "https://cdn.example/ok.m3u8");
    }

    #[test]
    fn test_first_acceptable_wins() {
        let html = r#"{"file": "https://a.example/one.m3u8"}{"file": "https://b.example/two.m3u8"}"#;
        assert_eq!(run(html).unwrap().as_str(), "https://a.example/one.m3u8");
    }

    #[test]
    fn test_key_and_value_on_separate_lines() {
        let html = "{\n  \"file\":\n    \"https://cdn.example/pretty.m3u8\"\n}";
        assert_eq!(run(html).unwrap().as_str(), "https://cdn.example/pretty.m3u8");
    }

    #[test]
    fn test_scheme_relative_candidate() {
        let html = r#"{"file": "\/\/c201-node61-cdn.connectmedia.hu\/1100\/index.m3u8?v=5iip:10.0.0.1"}"#;
        assert_eq!(
            run(html).unwrap().as_str(),
            "https://c201-node61-cdn.connectmedia.hu/1100/index.m3u8"
        );
    }

    #[test]
    fn test_extraction_is_repeatable() {
        let doc = HtmlDocument::new(r#"{"file": "https://cdn.example/bumper.mp4"} {"file": "https://cdn.example/x.m3u8"}"#);
        assert_eq!(extract(&doc).unwrap(), extract(&doc).unwrap());
    }
}
