//! Domain types for the cart store.
//!
//! A cart is an ordered list of line items. A line is identified by the
//! product plus the shopper's variant selection, so "shirt, size M" and
//! "shirt, size L" are two lines while adding "shirt, size M" twice grows
//! one line's quantity.

use commerce_state_core::catalog::{Bilingual, ProductId};
use commerce_state_runtime::{HydrateAction, PersistedState};
use rust_decimal::Decimal;
use serde::de::{Error as _, Unexpected};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

/// Variant type (e.g. "size") to the chosen value (e.g. "M")
///
/// Backed by an ordered map, so two selections built in a different order
/// compare equal and serialise identically.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VariantSelection(BTreeMap<String, String>);

impl VariantSelection {
    /// Creates an empty selection
    #[must_use]
    pub const fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// Returns the selection with `variant` set to `value`
    #[must_use]
    pub fn with(mut self, variant: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(variant, value);
        self
    }

    /// Sets `variant` to `value`, replacing an earlier choice
    pub fn insert(&mut self, variant: impl Into<String>, value: impl Into<String>) {
        self.0.insert(variant.into(), value.into());
    }

    /// Chosen value for `variant`
    #[must_use]
    pub fn get(&self, variant: &str) -> Option<&str> {
        self.0.get(variant).map(String::as_str)
    }

    /// Whether no variant was chosen
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Choices in variant-type order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Canonical JSON object text, keys sorted
    #[must_use]
    pub fn canonical(&self) -> String {
        let object: serde_json::Map<String, serde_json::Value> = self
            .0
            .iter()
            .map(|(k, v)| (k.clone(), serde_json::Value::String(v.clone())))
            .collect();
        serde_json::Value::Object(object).to_string()
    }
}

impl<K, V> FromIterator<(K, V)> for VariantSelection
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

/// Stable identity of a cart line
///
/// `"{product_id}"` for a product without variants, otherwise
/// `"{product_id}-{canonical selection JSON}"`.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LineId(String);

impl LineId {
    /// Derives the id of the line for `product_id` with `variants`
    #[must_use]
    pub fn for_selection(product_id: &ProductId, variants: &VariantSelection) -> Self {
        if variants.is_empty() {
            Self(product_id.to_string())
        } else {
            Self(format!("{product_id}-{}", variants.canonical()))
        }
    }

    /// Returns the id as a string slice
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for LineId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for LineId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// One cart entry with a denormalised product snapshot
///
/// Names, image and prices are captured when the product is first added and
/// are never refreshed from the catalog.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLineItem {
    /// Line identity, derived from product and variants
    pub id: LineId,
    /// Catalog product this line refers to
    pub product_id: ProductId,
    /// English display name
    pub name_en: String,
    /// Bangla display name
    pub name_bn: String,
    /// Thumbnail reference
    pub image_url: String,
    /// List price per unit
    pub base_price: Decimal,
    /// Discounted price per unit, if the product was on sale
    #[serde(default)]
    pub sale_price: Option<Decimal>,
    /// Variant choices
    #[serde(default)]
    pub selected_variants: VariantSelection,
    /// Number of units, never zero
    #[serde(deserialize_with = "positive_quantity")]
    pub quantity: u32,
}

impl CartLineItem {
    /// Creates a line for one unit of `product_id` without variants
    #[must_use]
    pub fn new(product_id: impl Into<ProductId>, name_en: impl Into<String>, base_price: Decimal) -> Self {
        let product_id = product_id.into();
        let selected_variants = VariantSelection::new();
        Self {
            id: LineId::for_selection(&product_id, &selected_variants),
            product_id,
            name_en: name_en.into(),
            name_bn: String::new(),
            image_url: String::new(),
            base_price,
            sale_price: None,
            selected_variants,
            quantity: 1,
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

    /// Sets the sale price
    #[must_use]
    pub const fn with_sale_price(mut self, sale_price: Decimal) -> Self {
        self.sale_price = Some(sale_price);
        self
    }

    /// Adds a variant choice and re-derives the line id
    #[must_use]
    pub fn with_variant(mut self, variant: impl Into<String>, value: impl Into<String>) -> Self {
        self.selected_variants.insert(variant, value);
        self.id = LineId::for_selection(&self.product_id, &self.selected_variants);
        self
    }

    /// Replaces the whole variant selection and re-derives the line id
    #[must_use]
    pub fn with_variants(mut self, variants: VariantSelection) -> Self {
        self.selected_variants = variants;
        self.id = LineId::for_selection(&self.product_id, &self.selected_variants);
        self
    }

    /// Sets the quantity
    #[must_use]
    pub const fn with_quantity(mut self, quantity: u32) -> Self {
        self.quantity = quantity;
        self
    }

    /// Whether `other` denotes the same product and variant selection
    #[must_use]
    pub fn same_line_as(&self, other: &Self) -> bool {
        self.product_id == other.product_id && self.selected_variants == other.selected_variants
    }

    /// Price charged per unit: the sale price when there is one
    #[must_use]
    pub fn unit_price(&self) -> Decimal {
        self.sale_price.unwrap_or(self.base_price)
    }

    /// `unit_price * quantity`
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.unit_price() * Decimal::from(self.quantity)
    }

    /// Discount on this line, zero when not on sale
    #[must_use]
    pub fn savings(&self) -> Decimal {
        self.sale_price.map_or(Decimal::ZERO, |sale| {
            (self.base_price - sale).max(Decimal::ZERO) * Decimal::from(self.quantity)
        })
    }
}

impl Bilingual for CartLineItem {
    fn name_en(&self) -> &str {
        &self.name_en
    }

    fn name_bn(&self) -> &str {
        &self.name_bn
    }
}

fn positive_quantity<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let quantity = u32::deserialize(deserializer)?;
    if quantity == 0 {
        return Err(D::Error::invalid_value(
            Unexpected::Unsigned(0),
            &"a positive quantity",
        ));
    }
    Ok(quantity)
}

/// State of the cart store
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CartState {
    /// Lines in display (insertion) order
    pub items: Vec<CartLineItem>,
}

impl CartState {
    /// Creates an empty cart
    #[must_use]
    pub const fn new() -> Self {
        Self { items: Vec::new() }
    }

    /// Total number of units across all lines
    #[must_use]
    pub fn item_count(&self) -> u64 {
        self.items.iter().map(|item| u64::from(item.quantity)).sum()
    }

    /// Sum of line totals
    #[must_use]
    pub fn subtotal(&self) -> Decimal {
        self.items.iter().map(CartLineItem::line_total).sum()
    }

    /// Sum of discounts over lines that are on sale
    #[must_use]
    pub fn savings(&self) -> Decimal {
        self.items.iter().map(CartLineItem::savings).sum()
    }

    /// Line with the given id
    #[must_use]
    pub fn line(&self, id: &LineId) -> Option<&CartLineItem> {
        self.items.iter().find(|item| &item.id == id)
    }

    /// Whether any line (any variant) refers to `product_id`
    #[must_use]
    pub fn contains_product(&self, product_id: &ProductId) -> bool {
        self.items.iter().any(|item| &item.product_id == product_id)
    }

    /// Units of `product_id` summed over all its variant lines
    #[must_use]
    pub fn quantity_of(&self, product_id: &ProductId) -> u64 {
        self.items
            .iter()
            .filter(|item| &item.product_id == product_id)
            .map(|item| u64::from(item.quantity))
            .sum()
    }

    /// Whether the cart has no lines
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl PersistedState for CartState {
    type Item = CartLineItem;

    fn items(&self) -> &[CartLineItem] {
        &self.items
    }
}

/// Actions accepted by the cart store
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CartAction {
    /// Replace all lines with a stored snapshot
    Hydrate {
        /// Lines read from durable storage
        items: Vec<CartLineItem>,
    },

    /// Add units, merging into an existing line with the same identity
    AddItem {
        /// Line to add; its quantity is the number of units added
        item: CartLineItem,
    },

    /// Drop a line
    RemoveItem {
        /// Line to drop
        id: LineId,
    },

    /// Set a line's quantity; zero or less drops the line
    UpdateQuantity {
        /// Line to update
        id: LineId,
        /// New absolute quantity
        quantity: i64,
    },

    /// Empty the cart
    ClearCart,
}

impl HydrateAction for CartAction {
    type Item = CartLineItem;

    fn hydrate(items: Vec<CartLineItem>) -> Self {
        Self::Hydrate { items }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shirt() -> CartLineItem {
        CartLineItem::new("shirt", "Shirt", Decimal::from(100))
    }

    #[test]
    fn line_id_without_variants_is_product_id() {
        assert_eq!(shirt().id.as_str(), "shirt");
    }

    #[test]
    fn line_id_is_independent_of_variant_order() {
        let a = shirt().with_variant("size", "M").with_variant("color", "red");
        let b = shirt().with_variant("color", "red").with_variant("size", "M");

        assert_eq!(a.id, b.id);
        assert_eq!(a.id.as_str(), r#"shirt-{"color":"red","size":"M"}"#);
        assert!(a.same_line_as(&b));
    }

    #[test]
    fn different_variants_give_different_ids() {
        let medium = shirt().with_variant("size", "M");
        let large = shirt().with_variant("size", "L");

        assert_ne!(medium.id, large.id);
        assert!(!medium.same_line_as(&large));
    }

    #[test]
    fn unit_price_prefers_sale_price() {
        let item = shirt().with_sale_price(Decimal::from(80)).with_quantity(2);

        assert_eq!(item.unit_price(), Decimal::from(80));
        assert_eq!(item.line_total(), Decimal::from(160));
        assert_eq!(item.savings(), Decimal::from(40));
    }

    #[test]
    fn serialises_with_camel_case_keys() {
        let item = shirt().with_variant("size", "M");
        let json = serde_json::to_value(&item).unwrap_or_default();

        assert_eq!(json["productId"], "shirt");
        assert_eq!(json["nameEn"], "Shirt");
        assert_eq!(json["selectedVariants"]["size"], "M");
        assert!(json["salePrice"].is_null());
        assert_eq!(json["quantity"], 1);
    }

    #[test]
    fn deserialises_stored_line() {
        let raw = r#"{
            "id": "shirt",
            "productId": "shirt",
            "nameEn": "Shirt",
            "nameBn": "শার্ট",
            "imageUrl": "/img/shirt.jpg",
            "basePrice": 100,
            "salePrice": 80,
            "selectedVariants": {},
            "quantity": 2
        }"#;

        let item: CartLineItem = serde_json::from_str(raw).unwrap_or_else(|_| shirt());

        assert_eq!(item.quantity, 2);
        assert_eq!(item.sale_price, Some(Decimal::from(80)));
        assert_eq!(item.name_bn, "শার্ট");
    }

    #[test]
    fn zero_quantity_is_rejected() {
        let raw = r#"{"id":"x","productId":"x","nameEn":"X","nameBn":"","imageUrl":"","basePrice":1,"salePrice":null,"selectedVariants":{},"quantity":0}"#;
        assert!(serde_json::from_str::<CartLineItem>(raw).is_err());
    }

    #[test]
    fn negative_quantity_is_rejected() {
        let raw = r#"{"id":"x","productId":"x","nameEn":"X","nameBn":"","imageUrl":"","basePrice":1,"salePrice":null,"selectedVariants":{},"quantity":-3}"#;
        assert!(serde_json::from_str::<CartLineItem>(raw).is_err());
    }

    #[test]
    fn quantity_of_sums_variant_lines() {
        let state = CartState {
            items: vec![
                shirt().with_variant("size", "M").with_quantity(2),
                shirt().with_variant("size", "L").with_quantity(3),
                CartLineItem::new("hat", "Hat", Decimal::from(20)),
            ],
        };

        assert_eq!(state.quantity_of(&ProductId::new("shirt")), 5);
        assert!(state.contains_product(&ProductId::new("hat")));
        assert!(!state.contains_product(&ProductId::new("shoe")));
        assert_eq!(state.item_count(), 6);
    }
}
