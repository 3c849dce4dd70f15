//! Catalog references.
//!
//! The stores never own product data. They keep an identifier plus a
//! denormalised snapshot (names, image, price) captured when the shopper
//! added the product. The types here are the pieces both stores share.

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;

/// Identifier of a catalog product
///
/// Serialised as a bare JSON string.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductId(String);

impl ProductId {
    /// Creates a `ProductId` from any string-like value
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as a string slice
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ProductId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ProductId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for ProductId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Display language of the storefront
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    /// English
    #[default]
    En,
    /// Bangla
    Bn,
}

/// Returned when a locale tag is neither `en` nor `bn`
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Unsupported locale '{0}' (expected 'en' or 'bn')")]
pub struct UnknownLocale(pub String);

impl FromStr for Locale {
    type Err = UnknownLocale;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "en" => Ok(Self::En),
            "bn" => Ok(Self::Bn),
            other => Err(UnknownLocale(other.to_string())),
        }
    }
}

impl std::fmt::Display for Locale {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::En => f.write_str("en"),
            Self::Bn => f.write_str("bn"),
        }
    }
}

/// A snapshot that carries both an English and a Bangla product name
pub trait Bilingual {
    /// English display name
    fn name_en(&self) -> &str;

    /// Bangla display name
    fn name_bn(&self) -> &str;

    /// Name to show for `locale`
    ///
    /// Products without a Bangla translation fall back to English.
    fn display_name(&self, locale: Locale) -> &str {
        match locale {
            Locale::Bn if !self.name_bn().trim().is_empty() => self.name_bn(),
            _ => self.name_en(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Named {
        en: &'static str,
        bn: &'static str,
    }

    impl Bilingual for Named {
        fn name_en(&self) -> &str {
            self.en
        }

        fn name_bn(&self) -> &str {
            self.bn
        }
    }

    #[test]
    fn product_id_serializes_as_plain_string() {
        let id = ProductId::new("prod-42");
        assert_eq!(serde_json::to_string(&id).ok().as_deref(), Some("\"prod-42\""));
    }

    #[test]
    fn locale_parses_case_insensitively() {
        assert_eq!("EN".parse::<Locale>(), Ok(Locale::En));
        assert_eq!(" bn ".parse::<Locale>(), Ok(Locale::Bn));
        assert!("fr".parse::<Locale>().is_err());
    }

    #[test]
    fn display_name_falls_back_to_english() {
        let translated = Named { en: "Saree", bn: "শাড়ি" };
        assert_eq!(translated.display_name(Locale::Bn), "শাড়ি");
        assert_eq!(translated.display_name(Locale::En), "Saree");

        let untranslated = Named { en: "Kurta", bn: "  " };
        assert_eq!(untranslated.display_name(Locale::Bn), "Kurta");
    }
}
