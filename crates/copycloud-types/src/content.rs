use std::sync::LazyLock;

use regex::Regex;

use crate::models::ContentType;

static YOUTUBE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)(?:https?://)?(?:www\.)?(?:youtube\.com/(?:watch\?v=|embed/|shorts/)|youtu\.be/)[A-Za-z0-9_-]+",
    )
    .expect("youtube pattern")
});

static GOOGLE_MAPS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)(?:https?://)?(?:www\.)?(?:google\.com/maps|maps\.google\.com|goo\.gl/maps|maps\.app\.goo\.gl)[A-Za-z0-9_\-.~:/?#\[\]@!$&'()*+,;=%]*",
    )
    .expect("maps pattern")
});

static URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^https?://[A-Za-z0-9_\-.~:/?#\[\]@!$&'()*+,;=%]+$").expect("url pattern")
});

/// Classify pasted text.
///
/// Checked in priority order: YouTube, Google Maps, bare URL, then plain text.
/// YouTube and Maps links are valid URLs too, so they must be tested first.
/// Both are matched anywhere in the input; the generic URL must span all of it.
/// Images never go through here.
pub fn classify(text: &str) -> ContentType {
    let trimmed = text.trim();

    if YOUTUBE.is_match(trimmed) {
        return ContentType::Youtube;
    }

    if GOOGLE_MAPS.is_match(trimmed) {
        return ContentType::Map;
    }

    if URL.is_match(trimmed) {
        return ContentType::Url;
    }

    ContentType::Text
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn youtube_links() {
        assert_eq!(classify("https://youtu.be/abc123"), ContentType::Youtube);
        assert_eq!(
            classify("https://www.youtube.com/watch?v=dQw4w9WgXcQ"),
            ContentType::Youtube
        );
        assert_eq!(classify("youtube.com/shorts/xyz_-9"), ContentType::Youtube);
        assert_eq!(
            classify("HTTPS://WWW.YOUTUBE.COM/EMBED/AbC"),
            ContentType::Youtube
        );
    }

    #[test]
    fn youtube_link_inside_prose() {
        assert_eq!(
            classify("watch this https://youtu.be/abc123 later"),
            ContentType::Youtube
        );
    }

    #[test]
    fn youtube_channel_page_is_plain_url() {
        assert_eq!(
            classify("https://www.youtube.com/@somechannel"),
            ContentType::Url
        );
    }

    #[test]
    fn map_links() {
        assert_eq!(
            classify("https://maps.google.com/?q=1+Main+St"),
            ContentType::Map
        );
        assert_eq!(
            classify("https://www.google.com/maps/place/Somewhere"),
            ContentType::Map
        );
        assert_eq!(classify("https://goo.gl/maps/abcd"), ContentType::Map);
        assert_eq!(classify("https://maps.app.goo.gl/xyz"), ContentType::Map);
    }

    #[test]
    fn map_link_is_never_plain_url() {
        assert_ne!(
            classify("https://maps.google.com/?q=1+Main+St"),
            ContentType::Url
        );
    }

    #[test]
    fn generic_urls() {
        assert_eq!(classify("https://example.com/path"), ContentType::Url);
        assert_eq!(classify("  http://example.com  "), ContentType::Url);
        assert_eq!(
            classify("https://example.com/search?q=a&b=[1]#frag"),
            ContentType::Url
        );
    }

    #[test]
    fn plain_text() {
        assert_eq!(classify("hello world"), ContentType::Text);
        assert_eq!(classify(""), ContentType::Text);
        assert_eq!(classify("example.com"), ContentType::Text);
        assert_eq!(classify("ftp://example.com/file"), ContentType::Text);
    }

    #[test]
    fn url_with_surrounding_words_is_text() {
        assert_eq!(
            classify("see https://example.com/path for details"),
            ContentType::Text
        );
    }
}
