//! SEO helpers for processed product images.
//!
//! Both functions are pure formatting: they never touch pixels.
//!
//! ## Alt text
//!
//! The subject is the product name when one is given, otherwise the file
//! name turned into words:
//! - `001-blue-business-card.jpg` → "blue business card"
//! - `IMG_2041.png` → "IMG 2041"
//!
//! A category, when present, is appended after a dash, and thumbnails get a
//! trailing "thumbnail".

use crate::types::Metadata;
use serde_json::{Value, json};
use std::path::Path;

/// Alt text used when neither a product name nor a usable file name exists.
pub const FALLBACK_ALT_TEXT: &str = "Product image";

/// Inputs for [`generate_alt_text`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AltTextInput<'a> {
    pub filename: &'a str,
    pub product_name: Option<&'a str>,
    pub category_name: Option<&'a str>,
    pub is_thumbnail: bool,
}

/// Turn a file name into display words.
///
/// The extension and any `NNN-` number prefix are dropped, and dashes and
/// underscores become spaces.
pub fn humanize_filename(filename: &str) -> String {
    let stem = Path::new(filename)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or_default();

    let name = match stem.split_once('-') {
        Some((prefix, rest)) if !prefix.is_empty() && prefix.parse::<u32>().is_ok() => rest,
        _ => stem,
    };

    name.replace(['-', '_'], " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Descriptive alt text for one image.
pub fn generate_alt_text(input: &AltTextInput<'_>) -> String {
    let subject = non_empty(input.product_name)
        .map(str::to_string)
        .unwrap_or_else(|| humanize_filename(input.filename));
    let mut alt = if subject.is_empty() {
        FALLBACK_ALT_TEXT.to_string()
    } else {
        subject
    };

    if let Some(category) = non_empty(input.category_name) {
        alt.push_str(" - ");
        alt.push_str(category);
    }
    if input.is_thumbnail {
        alt.push_str(" thumbnail");
    }
    alt
}

/// Inputs for [`generate_image_structured_data`].
#[derive(Debug, Clone, Copy)]
pub struct ImageObjectInput<'a> {
    pub name: &'a str,
    pub description: Option<&'a str>,
    /// Public URL of the `optimized` buffer.
    pub content_url: &'a str,
    /// Public URL of the `thumbnail` buffer.
    pub thumbnail_url: Option<&'a str>,
    pub metadata: &'a Metadata,
}

/// schema.org `ImageObject` for embedding as JSON-LD.
///
/// Width and height are those of the `optimized` master, which is always JPEG.
pub fn generate_image_structured_data(input: &ImageObjectInput<'_>) -> Value {
    let mut object = json!({
        "@context": "https://schema.org",
        "@type": "ImageObject",
        "name": input.name,
        "contentUrl": input.content_url,
        "width": input.metadata.width,
        "height": input.metadata.height,
        "encodingFormat": "image/jpeg",
    });
    if let Some(description) = non_empty(input.description) {
        object["description"] = json!(description);
    }
    if let Some(thumbnail) = non_empty(input.thumbnail_url) {
        object["thumbnailUrl"] = json!(thumbnail);
    }
    object
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::ProfileKey;

    #[test]
    fn humanize_strips_number_prefix_and_extension() {
        assert_eq!(humanize_filename("001-blue-business-card.jpg"), "blue business card");
    }

    #[test]
    fn humanize_underscores_become_spaces() {
        assert_eq!(humanize_filename("IMG_2041.png"), "IMG 2041");
        assert_eq!(humanize_filename("summer__sale--poster.webp"), "summer sale poster");
    }

    #[test]
    fn humanize_keeps_non_numeric_prefix() {
        assert_eq!(humanize_filename("wip-drafts.jpg"), "wip drafts");
    }

    #[test]
    fn humanize_number_only() {
        assert_eq!(humanize_filename("2041.jpg"), "2041");
        assert_eq!(humanize_filename("001-.jpg"), "");
    }

    #[test]
    fn alt_prefers_product_name() {
        let alt = generate_alt_text(&AltTextInput {
            filename: "IMG_0001.jpg",
            product_name: Some("Matte Business Cards"),
            ..AltTextInput::default()
        });
        assert_eq!(alt, "Matte Business Cards");
    }

    #[test]
    fn alt_falls_back_to_filename() {
        let alt = generate_alt_text(&AltTextInput {
            filename: "010-vinyl-banner.jpg",
            product_name: Some("   "),
            ..AltTextInput::default()
        });
        assert_eq!(alt, "vinyl banner");
    }

    #[test]
    fn alt_with_category_and_thumbnail() {
        let alt = generate_alt_text(&AltTextInput {
            filename: "flyer.png",
            product_name: Some("A5 Flyer"),
            category_name: Some("Flyers"),
            is_thumbnail: true,
        });
        assert_eq!(alt, "A5 Flyer - Flyers thumbnail");
    }

    #[test]
    fn alt_never_empty() {
        let alt = generate_alt_text(&AltTextInput {
            filename: "001-.jpg",
            ..AltTextInput::default()
        });
        assert_eq!(alt, FALLBACK_ALT_TEXT);
    }

    fn metadata() -> Metadata {
        Metadata {
            width: 1000,
            height: 750,
            format: "png".to_string(),
            size: 1234,
            original_size: 5678,
            compression_ratio: 1234.0 / 5678.0,
            profile_used: ProfileKey::Default,
        }
    }

    #[test]
    fn structured_data_required_fields() {
        let meta = metadata();
        let value = generate_image_structured_data(&ImageObjectInput {
            name: "Vinyl Banner",
            description: None,
            content_url: "https://cdn.example.com/banner.jpg",
            thumbnail_url: None,
            metadata: &meta,
        });

        assert_eq!(value["@context"], "https://schema.org");
        assert_eq!(value["@type"], "ImageObject");
        assert_eq!(value["name"], "Vinyl Banner");
        assert_eq!(value["contentUrl"], "https://cdn.example.com/banner.jpg");
        assert_eq!(value["width"], 1000);
        assert_eq!(value["height"], 750);
        assert_eq!(value["encodingFormat"], "image/jpeg");
        assert!(value.get("description").is_none());
        assert!(value.get("thumbnailUrl").is_none());
    }

    #[test]
    fn structured_data_optional_fields() {
        let meta = metadata();
        let value = generate_image_structured_data(&ImageObjectInput {
            name: "Vinyl Banner",
            description: Some("Outdoor vinyl banner, 2x1m"),
            content_url: "https://cdn.example.com/banner.jpg",
            thumbnail_url: Some("https://cdn.example.com/banner-thumb.jpg"),
            metadata: &meta,
        });

        assert_eq!(value["description"], "Outdoor vinyl banner, 2x1m");
        assert_eq!(value["thumbnailUrl"], "https://cdn.example.com/banner-thumb.jpg");
    }
}
