//! Domain types for the wishlist store.

use commerce_state_core::catalog::{Bilingual, ProductId};
use commerce_state_runtime::{HydrateAction, PersistedState};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A saved product with a denormalised snapshot
///
/// No variant dimension: a product is either on the wishlist or not.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WishlistItem {
    /// Catalog product
    pub product_id: ProductId,
    /// English display name
    pub name_en: String,
    /// Bangla display name
    pub name_bn: String,
    /// Thumbnail reference
    pub image_url: String,
    /// Price when the product was saved
    pub price: Decimal,
}

impl WishlistItem {
    /// Creates a wishlist entry
    #[must_use]
    pub fn new(product_id: impl Into<ProductId>, name_en: impl Into<String>, price: Decimal) -> Self {
        Self {
            product_id: product_id.into(),
            name_en: name_en.into(),
            name_bn: String::new(),
            image_url: String::new(),
            price,
        }
    }

    /// Sets the Bangla display name
    #[must_use]
    pub fn with_name_bn(mut self, name_bn: impl Into<String>) -> Self {
        self.name_bn = name_bn.into();
        self
    }

    /// Sets the thumbnail reference
    #[must_use]
    pub fn with_image_url(mut self, image_url: impl Into<String>) -> Self {
        self.image_url = image_url.into();
        self
    }
}

impl Bilingual for WishlistItem {
    fn name_en(&self) -> &str {
        &self.name_en
    }

    fn name_bn(&self) -> &str {
        &self.name_bn
    }
}

/// State of the wishlist store
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct WishlistState {
    /// Saved products in the order they were added
    pub items: Vec<WishlistItem>,
}

impl WishlistState {
    /// Creates an empty wishlist
    #[must_use]
    pub const fn new() -> Self {
        Self { items: Vec::new() }
    }

    /// Number of saved products
    #[must_use]
    pub fn count(&self) -> usize {
        self.items.len()
    }

    /// Whether `product_id` is saved
    #[must_use]
    pub fn is_in_wishlist(&self, product_id: &ProductId) -> bool {
        self.items.iter().any(|item| &item.product_id == product_id)
    }
}

impl PersistedState for WishlistState {
    type Item = WishlistItem;

    fn items(&self) -> &[WishlistItem] {
        &self.items
    }
}

/// Actions accepted by the wishlist store
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum WishlistAction {
    /// Replace all entries with a stored snapshot
    Hydrate {
        /// Entries read from durable storage
        items: Vec<WishlistItem>,
    },

    /// Save a product; ignored when it is already saved
    AddItem {
        /// Entry to save
        item: WishlistItem,
    },

    /// Forget a product
    RemoveItem {
        /// Product to forget
        product_id: ProductId,
    },

    /// Save the product if absent, forget it if present
    Toggle {
        /// Entry to toggle
        item: WishlistItem,
    },

    /// Forget everything
    ClearWishlist,
}

impl HydrateAction for WishlistAction {
    type Item = WishlistItem;

    fn hydrate(items: Vec<WishlistItem>) -> Self {
        Self::Hydrate { items }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use commerce_state_core::catalog::Locale;

    #[test]
    fn serialises_with_camel_case_keys() {
        let item = WishlistItem::new("saree", "Saree", Decimal::from(1500))
            .with_name_bn("শাড়ি")
            .with_image_url("/img/saree.jpg");

        let json = serde_json::to_value(&item).unwrap_or_default();

        assert_eq!(json["productId"], "saree");
        assert_eq!(json["nameBn"], "শাড়ি");
        assert_eq!(json["imageUrl"], "/img/saree.jpg");
        assert_eq!(json["price"], 1500.0);
    }

    #[test]
    fn display_name_follows_locale() {
        let item = WishlistItem::new("saree", "Saree", Decimal::from(1500)).with_name_bn("শাড়ি");

        assert_eq!(item.display_name(Locale::Bn), "শাড়ি");
        assert_eq!(item.display_name(Locale::En), "Saree");
    }
}
