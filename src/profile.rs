//! Product optimization profiles.
//!
//! A profile bundles the encoding defaults tuned for one kind of printed
//! product. The catalog is a plain value: built once, never mutated, and safe
//! to read from any number of threads without synchronization.
//!
//! | Key | Quality | Thumbnail quality | Max dimension |
//! |---|---|---|---|
//! | `DEFAULT` | 70 | 60 | 1000 |
//! | `BUSINESS_CARD` | 80 | 70 | 1200 |
//! | `BANNER` | 75 | 65 | 2000 |
//! | `FLYER` | 75 | 65 | 1500 |
//! | `PREMIUM` | 85 | 75 | 1600 |
//!
//! [`determine_profile`] picks a key from free-text product and category
//! names. Keyword groups are checked in a fixed priority order and the first
//! hit wins, so "Premium Business Cards" is a business card, not premium.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Name of a catalog entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProfileKey {
    #[default]
    Default,
    BusinessCard,
    Banner,
    Flyer,
    Premium,
}

impl ProfileKey {
    pub const ALL: [ProfileKey; 5] = [
        ProfileKey::Default,
        ProfileKey::BusinessCard,
        ProfileKey::Banner,
        ProfileKey::Flyer,
        ProfileKey::Premium,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ProfileKey::Default => "DEFAULT",
            ProfileKey::BusinessCard => "BUSINESS_CARD",
            ProfileKey::Banner => "BANNER",
            ProfileKey::Flyer => "FLYER",
            ProfileKey::Premium => "PREMIUM",
        }
    }
}

impl fmt::Display for ProfileKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error for a profile name that is not in the catalog.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown profile: {0}")]
pub struct UnknownProfile(pub String);

impl FromStr for ProfileKey {
    type Err = UnknownProfile;

    /// Case-insensitive; `-` and spaces are accepted in place of `_`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_uppercase().replace(['-', ' '], "_");
        ProfileKey::ALL
            .into_iter()
            .find(|key| key.as_str() == normalized)
            .ok_or_else(|| UnknownProfile(s.to_string()))
    }
}

/// Encoding defaults for one product category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessingProfile {
    pub quality: u8,
    pub thumbnail_quality: u8,
    pub max_dimension: u32,
}

/// Immutable lookup table from [`ProfileKey`] to [`ProcessingProfile`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProfileCatalog {
    entries: [ProcessingProfile; 5],
}

/// The process-wide catalog.
pub static BUILTIN_PROFILES: ProfileCatalog = ProfileCatalog::builtin();

impl ProfileCatalog {
    pub const fn builtin() -> Self {
        Self {
            entries: [
                // DEFAULT
                ProcessingProfile {
                    quality: 70,
                    thumbnail_quality: 60,
                    max_dimension: 1000,
                },
                // BUSINESS_CARD
                ProcessingProfile {
                    quality: 80,
                    thumbnail_quality: 70,
                    max_dimension: 1200,
                },
                // BANNER
                ProcessingProfile {
                    quality: 75,
                    thumbnail_quality: 65,
                    max_dimension: 2000,
                },
                // FLYER
                ProcessingProfile {
                    quality: 75,
                    thumbnail_quality: 65,
                    max_dimension: 1500,
                },
                // PREMIUM
                ProcessingProfile {
                    quality: 85,
                    thumbnail_quality: 75,
                    max_dimension: 1600,
                },
            ],
        }
    }

    /// Copy of this catalog with one entry replaced.
    pub fn with_profile(mut self, key: ProfileKey, profile: ProcessingProfile) -> Self {
        self.entries[Self::index(key)] = profile;
        self
    }

    fn index(key: ProfileKey) -> usize {
        match key {
            ProfileKey::Default => 0,
            ProfileKey::BusinessCard => 1,
            ProfileKey::Banner => 2,
            ProfileKey::Flyer => 3,
            ProfileKey::Premium => 4,
        }
    }

    pub fn get(&self, key: ProfileKey) -> ProcessingProfile {
        self.entries[Self::index(key)]
    }

    /// Look up by name, falling back to `DEFAULT` for unknown names.
    pub fn resolve(&self, name: &str) -> ProcessingProfile {
        self.get(name.parse().unwrap_or_default())
    }

    pub fn iter(&self) -> impl Iterator<Item = (ProfileKey, ProcessingProfile)> + '_ {
        ProfileKey::ALL.into_iter().map(|key| (key, self.get(key)))
    }
}

impl Default for ProfileCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

/// Resolve a profile by name from the built-in catalog (`DEFAULT` on miss).
pub fn resolve_profile(name: &str) -> ProcessingProfile {
    BUILTIN_PROFILES.resolve(name)
}

/// Keyword groups in priority order. The first group with a hit wins.
const KEYWORD_RULES: &[(ProfileKey, &[&str])] = &[
    (ProfileKey::BusinessCard, &["business card", "card"]),
    (ProfileKey::Banner, &["banner", "poster", "large format"]),
    (ProfileKey::Flyer, &["flyer", "brochure", "leaflet"]),
    (ProfileKey::Premium, &["premium", "luxury", "high quality"]),
];

/// Pick a profile from product and category names.
///
/// Both hints are lower-cased and joined before matching; either may be absent.
pub fn determine_profile(product_name: Option<&str>, category_name: Option<&str>) -> ProfileKey {
    let haystack = format!(
        "{} {}",
        product_name.unwrap_or_default(),
        category_name.unwrap_or_default()
    )
    .to_lowercase();

    KEYWORD_RULES
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|kw| haystack.contains(kw)))
        .map(|(key, _)| *key)
        .unwrap_or_default()
}
