//! Media attachment collection
//!
//! Structured attachment tags come first, in tag order; image URLs matched
//! in free text follow, in body order. A URL already collected is never
//! collected again.

use indexmap::IndexMap;
use notefeed_model::{ContentItem, MediaAttachment, Tag};
use once_cell::sync::Lazy;
use regex::Regex;

static IMAGE_URL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)https?://\S+\.(?:jpg|jpeg|png|gif|webp|svg)")
        .expect("image url pattern compiles")
});

/// Parse one structured attachment tag
///
/// Fields are matched by literal prefix (`"url "`, `"m "`, `"alt "`);
/// later fields win, unknown fields are ignored, and a tag without a URL
/// yields nothing.
#[must_use]
pub fn parse_attachment(tag: &Tag) -> Option<MediaAttachment> {
    let mut url = None;
    let mut mime_type = None;
    let mut alt_text = None;

    for field in tag.values() {
        if let Some(rest) = field.strip_prefix("url ") {
            url = Some(rest);
        } else if let Some(rest) = field.strip_prefix("m ") {
            mime_type = Some(rest);
        } else if let Some(rest) = field.strip_prefix("alt ") {
            alt_text = Some(rest);
        }
    }

    let url = url.filter(|u| !u.is_empty())?;
    Some(MediaAttachment {
        url: url.to_string(),
        mime_type: mime_type.filter(|m| !m.is_empty()).map(str::to_string),
        alt_text: alt_text.filter(|a| !a.is_empty()).map(str::to_string),
    })
}

/// Image URLs found in free text, in order of appearance
pub fn image_urls(body: &str) -> impl Iterator<Item = &str> {
    IMAGE_URL.find_iter(body).map(|m| m.as_str())
}

/// Collect every media attachment of an item, deduplicated by URL
#[must_use]
pub fn collect_media(item: &ContentItem) -> Vec<MediaAttachment> {
    let mut media: IndexMap<String, MediaAttachment> = IndexMap::new();

    for attachment in item.attachments.iter().filter_map(parse_attachment) {
        media.entry(attachment.url.clone()).or_insert(attachment);
    }
    for url in image_urls(&item.body) {
        if !media.contains_key(url) {
            media.insert(url.to_string(), MediaAttachment::from_url(url));
        }
    }

    media.into_values().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn item(body: &str, attachments: &[&[&str]]) -> ContentItem {
        ContentItem::new("01", "02", 0, 1, body)
            .with_tags(attachments.iter().map(|fields| Tag::new(fields.iter().copied())))
    }

    #[test]
    fn attachment_fields_are_positional_prefixes() {
        let tag = Tag::new(["imeta", "url https://x/a.png", "m image/png", "alt a cat", "dim 10x10"]);
        let media = parse_attachment(&tag).unwrap();
        assert_eq!(media.url, "https://x/a.png");
        assert_eq!(media.mime_type.as_deref(), Some("image/png"));
        assert_eq!(media.alt_text.as_deref(), Some("a cat"));
    }

    #[test]
    fn attachment_without_url_is_ignored() {
        let tag = Tag::new(["imeta", "m image/png"]);
        assert!(parse_attachment(&tag).is_none());
        let tag = Tag::new(["imeta", "url "]);
        assert!(parse_attachment(&tag).is_none());
    }

    #[test]
    fn body_urls_match_image_extensions_only() {
        let body = "see https://x/a.JPG and https://x/clip.mp4 then http://y/b.webp!";
        let urls: Vec<_> = image_urls(body).collect();
        assert_eq!(urls, vec!["https://x/a.JPG", "http://y/b.webp"]);
    }

    #[test]
    fn structured_entries_precede_and_suppress_inline_duplicates() {
        let media = collect_media(&item(
            "inline https://x/b.gif and again https://x/img.png and https://x/b.gif",
            &[&["imeta", "url https://x/img.png", "m image/png"]],
        ));

        let urls: Vec<_> = media.iter().map(|m| m.url.as_str()).collect();
        assert_eq!(urls, vec!["https://x/img.png", "https://x/b.gif"]);
        assert_eq!(media[0].mime_type.as_deref(), Some("image/png"));
    }

    #[test]
    fn repeated_structured_urls_keep_first() {
        let media = collect_media(&item(
            "",
            &[
                &["imeta", "url https://x/a.png", "alt first"],
                &["imeta", "url https://x/a.png", "alt second"],
            ],
        ));
        assert_eq!(media.len(), 1);
        assert_eq!(media[0].alt_text.as_deref(), Some("first"));
    }
}
