use once_cell::sync::Lazy;
use regex::Regex;

static URL_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    vec![
        Regex::new(r"v=([A-Za-z0-9_-]{11})").expect("Invalid regex: watch URL"),
        Regex::new(r"youtu\.be/([A-Za-z0-9_-]{11})").expect("Invalid regex: short URL"),
        Regex::new(r"youtube\.com/embed/([A-Za-z0-9_-]{11})").expect("Invalid regex: embed URL"),
        Regex::new(r"youtube\.com/v/([A-Za-z0-9_-]{11})").expect("Invalid regex: legacy URL"),
    ]
});

static BARE_ID: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9_-]{11}$").expect("Invalid regex: bare id"));

/// Pull the 11-character video id out of a URL or accept a bare id.
///
/// Returns `None` for empty input or anything that matches no known shape.
pub fn extract_video_id(input: &str) -> Option<String> {
    let s = input.trim();
    if s.is_empty() {
        return None;
    }

    for pattern in URL_PATTERNS.iter() {
        if let Some(caps) = pattern.captures(s) {
            return caps.get(1).map(|m| m.as_str().to_string());
        }
    }

    BARE_ID.is_match(s).then(|| s.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    const ID: &str = "dQw4w9WgXcQ";

    #[test]
    fn test_url_shapes() {
        for url in [
            "https://www.youtube.com/watch?v=dQw4w9WgXcQ",
            "https://www.youtube.com/watch?feature=share&v=dQw4w9WgXcQ&t=42",
            "https://youtu.be/dQw4w9WgXcQ",
            "https://www.youtube.com/embed/dQw4w9WgXcQ?autoplay=1",
            "http://youtube.com/v/dQw4w9WgXcQ",
        ] {
            assert_eq!(extract_video_id(url).as_deref(), Some(ID), "{}", url);
        }
    }

    #[test]
    fn test_bare_id() {
        assert_eq!(extract_video_id("  dQw4w9WgXcQ \n").as_deref(), Some(ID));
    }

    #[test]
    fn test_malformed() {
        assert_eq!(extract_video_id(""), None);
        assert_eq!(extract_video_id("   "), None);
        assert_eq!(extract_video_id("dQw4w9WgXc"), None);
        assert_eq!(extract_video_id("dQw4w9WgXcQQ"), None);
        assert_eq!(extract_video_id("https://example.com/watch"), None);
        assert_eq!(extract_video_id("https://youtu.be/short"), None);
    }
}
