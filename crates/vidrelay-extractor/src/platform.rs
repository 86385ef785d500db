//! Host-based platform recognition.
//!
//! Matching is deliberately shallow: parse the URL, look at the host, and
//! require some path beyond the bare domain. Whether the link actually
//! resolves to a video is the extraction backend's problem.

use std::fmt::{Display, Formatter, Result as FmtResult};

use url::Url;

/// Supported video platforms.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Youtube,
    Tiktok,
    Instagram,
    Facebook,
    Twitter,
    Vimeo,
}

impl Platform {
    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Youtube => "youtube",
            Platform::Tiktok => "tiktok",
            Platform::Instagram => "instagram",
            Platform::Facebook => "facebook",
            Platform::Twitter => "twitter",
            Platform::Vimeo => "vimeo",
        }
    }

    fn domains(&self) -> &'static [&'static str] {
        match self {
            Platform::Youtube => &["youtube.com", "youtu.be"],
            Platform::Tiktok => &["tiktok.com"],
            Platform::Instagram => &["instagram.com"],
            Platform::Facebook => &["facebook.com", "fb.watch"],
            Platform::Twitter => &["twitter.com", "x.com"],
            Platform::Vimeo => &["vimeo.com"],
        }
    }

    const ALL: [Platform; 6] = [
        Platform::Youtube,
        Platform::Tiktok,
        Platform::Instagram,
        Platform::Facebook,
        Platform::Twitter,
        Platform::Vimeo,
    ];

    /// Match a URL against the supported platforms.
    ///
    /// A scheme-less `www.youtube.com/watch?v=x` is accepted; a bare domain
    /// with no path is not a video link and does not match.
    pub fn match_url(raw: &str) -> Option<Platform> {
        let parsed = parse_lenient(raw)?;
        let host = parsed.host_str()?.to_lowercase();
        let host = host.strip_prefix("www.").unwrap_or(&host);

        if parsed.path().trim_matches('/').is_empty() && parsed.query().is_none() {
            return None;
        }

        Platform::ALL.into_iter().find(|platform| {
            platform
                .domains()
                .iter()
                .any(|domain| host == *domain || host.ends_with(&format!(".{}", domain)))
        })
    }
}

impl Display for Platform {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.as_str())
    }
}

/// Parse a URL, tolerating a missing scheme.
fn parse_lenient(raw: &str) -> Option<Url> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed.contains(char::is_whitespace) {
        return None;
    }

    match Url::parse(trimmed) {
        Ok(url) if url.scheme() == "http" || url.scheme() == "https" => Some(url),
        Ok(_) => None,
        Err(url::ParseError::RelativeUrlWithoutBase) => {
            Url::parse(&format!("https://{}", trimmed)).ok()
        }
        Err(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_match_url_supported_platforms() {
        assert_eq!(
            Platform::match_url("https://www.youtube.com/watch?v=dQw4w9WgXcQ"),
            Some(Platform::Youtube)
        );
        assert_eq!(
            Platform::match_url("https://youtu.be/dQw4w9WgXcQ"),
            Some(Platform::Youtube)
        );
        assert_eq!(
            Platform::match_url("https://www.tiktok.com/@user/video/123"),
            Some(Platform::Tiktok)
        );
        assert_eq!(
            Platform::match_url("https://www.instagram.com/reel/abc/"),
            Some(Platform::Instagram)
        );
        assert_eq!(
            Platform::match_url("https://fb.watch/abcdef/"),
            Some(Platform::Facebook)
        );
        assert_eq!(
            Platform::match_url("https://x.com/user/status/123"),
            Some(Platform::Twitter)
        );
        assert_eq!(
            Platform::match_url("https://vimeo.com/123456"),
            Some(Platform::Vimeo)
        );
    }

    #[test]
    fn test_match_url_accepts_missing_scheme() {
        assert_eq!(
            Platform::match_url("www.youtube.com/watch?v=dQw4w9WgXcQ"),
            Some(Platform::Youtube)
        );
    }

    #[test]
    fn test_match_url_rejects_garbage() {
        assert_eq!(Platform::match_url("not-a-url"), None);
        assert_eq!(Platform::match_url(""), None);
        assert_eq!(Platform::match_url("ftp://youtube.com/watch?v=x"), None);
        assert_eq!(Platform::match_url("https://example.com/video"), None);
    }

    #[test]
    fn test_match_url_rejects_bare_domains() {
        assert_eq!(Platform::match_url("https://www.youtube.com"), None);
        assert_eq!(Platform::match_url("https://tiktok.com/"), None);
    }

    #[test]
    fn test_match_url_rejects_lookalike_hosts() {
        assert_eq!(Platform::match_url("https://notyoutube.com/watch?v=x"), None);
        assert_eq!(
            Platform::match_url("https://youtube.com.evil.example/watch?v=x"),
            None
        );
    }
}
