//! URL extraction from console lines

use crate::config::{HTTP_SCHEME, MatchConfig};
use crate::error::{Error, Result};
use regex::{Regex, RegexBuilder};

const HTTPS_SCHEME: &str = "https://";

/// Finds forwardable URLs in decoded serial lines
///
/// A line matches when it contains the configured URL prefix followed by at
/// least one non-whitespace character, optionally preceded by the marker tag.
/// Matching is case-insensitive. The capture runs from the prefix to the next
/// whitespace.
#[derive(Debug, Clone)]
pub struct UrlMatcher {
    pattern: Regex,
}

impl UrlMatcher {
    /// Compiles the extraction pattern for the given settings
    pub fn new(config: &MatchConfig) -> Result<Self> {
        let marker = regex::escape(&config.marker);
        let prefix = regex::escape(&config.url_prefix);
        let source = if config.require_marker {
            format!(r"{marker}({prefix}\S+)")
        } else {
            format!(r"(?:{marker})?({prefix}\S+)")
        };

        let pattern = RegexBuilder::new(&source)
            .case_insensitive(true)
            .build()
            .map_err(|e| Error::config("match", e.to_string()))?;

        Ok(Self { pattern })
    }

    /// Returns the captured URL exactly as it appeared on the line
    pub fn extract<'a>(&self, line: &'a str) -> Option<&'a str> {
        self.pattern
            .captures(line)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str())
    }

    /// Returns the captured URL with its scheme upgraded to `https://`
    pub fn forward_url(&self, line: &str) -> Option<String> {
        self.extract(line).map(upgrade_scheme)
    }
}

/// Replaces the first `http://` (in any letter case) with `https://`
///
/// Text without an `http://` occurrence is returned unchanged.
pub fn upgrade_scheme(url: &str) -> String {
    // ASCII lowercasing keeps byte offsets intact
    match url.to_ascii_lowercase().find(HTTP_SCHEME) {
        Some(at) => format!(
            "{}{}{}",
            &url[..at],
            HTTPS_SCHEME,
            &url[at + HTTP_SCHEME.len()..]
        ),
        None => url.to_string(),
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    fn default_matcher() -> UrlMatcher {
        UrlMatcher::new(&MatchConfig::default()).unwrap()
    }

    #[test]
    fn marked_line_is_forwarded_over_https() {
        let matcher = default_matcher();
        assert_eq!(
            matcher
                .forward_url("[SERIALFWD]http://script.google.com/macros/abc?x=1")
                .as_deref(),
            Some("https://script.google.com/macros/abc?x=1")
        );
    }

    #[test]
    fn unrelated_lines_do_not_match() {
        let matcher = default_matcher();
        for line in [
            "random debug text",
            "",
            "[SERIALFWD]",
            "[SERIALFWD]http://example.com/macros/abc",
            "https://script.google.com/macros/abc",
            // prefix with nothing after it
            "[SERIALFWD]http://script.google.com",
            "http://script.google.com next",
        ] {
            assert_eq!(matcher.extract(line), None, "{line:?} must not match");
        }
    }

    #[test]
    fn capture_stops_at_whitespace() {
        let matcher = default_matcher();
        assert_eq!(
            matcher.extract("[SERIALFWD]http://script.google.com/macros/s/1/exec?v=3 (sent)"),
            Some("http://script.google.com/macros/s/1/exec?v=3")
        );
    }

    #[test]
    fn unmarked_url_inside_noisy_line_still_matches() {
        let matcher = default_matcher();
        assert_eq!(
            matcher
                .forward_url("I (4821) app: GET http://script.google.com/macros/s/X/exec?t=1")
                .as_deref(),
            Some("https://script.google.com/macros/s/X/exec?t=1")
        );
    }

    #[test]
    fn matching_ignores_letter_case() {
        let matcher = default_matcher();
        assert_eq!(
            matcher
                .forward_url("[serialfwd]HTTP://Script.Google.COM/macros/abc")
                .as_deref(),
            Some("https://Script.Google.COM/macros/abc")
        );
    }

    #[test]
    fn required_marker_rejects_bare_urls() {
        let matcher = UrlMatcher::new(&MatchConfig {
            require_marker: true,
            ..Default::default()
        })
        .unwrap();

        assert_eq!(
            matcher.extract("log: http://script.google.com/macros/abc"),
            None
        );
        assert_eq!(
            matcher.extract("log: [SERIALFWD]http://script.google.com/macros/abc"),
            Some("http://script.google.com/macros/abc")
        );
    }

    #[test]
    fn custom_prefix_is_matched_literally() {
        let matcher = UrlMatcher::new(&MatchConfig {
            url_prefix: "http://127.0.0.1:8080".into(),
            ..Default::default()
        })
        .unwrap();

        assert_eq!(
            matcher.forward_url("[SERIALFWD]http://127.0.0.1:8080/hook").as_deref(),
            Some("https://127.0.0.1:8080/hook")
        );
        // '.' in the prefix is not a wildcard
        assert_eq!(matcher.extract("http://127x0.0.1:8080/hook"), None);
    }

    #[test]
    fn forwarded_urls_always_use_https() {
        let matcher = default_matcher();
        let lines = [
            "[SERIALFWD]http://script.google.com/a",
            "HTTP://SCRIPT.GOOGLE.COM/b",
            "x http://script.google.com/c?next=http://script.google.com/d",
        ];
        for line in lines {
            let url = matcher.forward_url(line).unwrap();
            assert!(url.starts_with("https://"), "{line:?} -> {url:?}");
        }
    }

    #[test]
    fn upgrade_replaces_only_the_first_scheme() {
        assert_eq!(
            upgrade_scheme("http://script.google.com/c?next=http://other"),
            "https://script.google.com/c?next=http://other"
        );
        assert_eq!(upgrade_scheme("Http://a/b"), "https://a/b");
        assert_eq!(upgrade_scheme("https://a/b"), "https://a/b");
        assert_eq!(upgrade_scheme("ftp://a/b"), "ftp://a/b");
    }
}
