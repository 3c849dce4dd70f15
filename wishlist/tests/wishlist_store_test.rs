//! Integration tests for the persisted wishlist

use commerce_state_core::catalog::ProductId;
use commerce_state_core::reducer::Reducer;
use commerce_state_runtime::{PersistenceConfig, Scope, StoreError};
use commerce_state_testing::{properties, RecordingStorage, UnavailableStorage};
use commerce_wishlist::{
    use_wishlist, Wishlist, WishlistAction, WishlistEnvironment, WishlistItem, WishlistReducer,
    WishlistState, DEFAULT_WISHLIST_KEY,
};
use proptest::prelude::*;
use rust_decimal::Decimal;
use std::sync::Arc;

const STORED: &str = r#"[
    {"productId":"saree","nameEn":"Saree","nameBn":"শাড়ি","imageUrl":"/img/saree.jpg","price":1500},
    {"productId":"kurta","nameEn":"Kurta","nameBn":"","imageUrl":"/img/kurta.jpg","price":800}
]"#;

fn item(id: &str) -> WishlistItem {
    WishlistItem::new(id, id.to_uppercase(), Decimal::from(10))
}

async fn mount(storage: &Arc<RecordingStorage>) -> Wishlist {
    Wishlist::mount(storage.clone(), PersistenceConfig::new(DEFAULT_WISHLIST_KEY)).await
}

#[tokio::test]
async fn test_stored_wishlist_is_restored_exactly() {
    let storage = Arc::new(RecordingStorage::seeded(DEFAULT_WISHLIST_KEY, STORED));

    let wishlist = mount(&storage).await;

    let ids: Vec<_> = wishlist
        .items()
        .await
        .into_iter()
        .map(|i| i.product_id.to_string())
        .collect();
    assert_eq!(ids, vec!["saree", "kurta"]);
    assert_eq!(wishlist.count().await, 2);
    assert_eq!(storage.set_calls(DEFAULT_WISHLIST_KEY), 0);
}

#[tokio::test]
async fn test_duplicate_add_is_ignored_but_written() {
    let storage = Arc::new(RecordingStorage::new());
    let wishlist = mount(&storage).await;

    wishlist.add_item(item("saree")).await;
    wishlist
        .add_item(WishlistItem::new("saree", "Other name", Decimal::from(1)))
        .await;

    assert_eq!(wishlist.items().await, vec![item("saree")]);
    assert_eq!(storage.set_calls(DEFAULT_WISHLIST_KEY), 2);
}

#[tokio::test]
async fn test_toggle_remove_and_clear_are_persisted() {
    let storage = Arc::new(RecordingStorage::seeded(DEFAULT_WISHLIST_KEY, STORED));
    let wishlist = mount(&storage).await;
    let saree = ProductId::new("saree");

    wishlist.toggle(item("saree")).await;
    assert!(!wishlist.is_in_wishlist(&saree).await);

    wishlist.toggle(item("saree")).await;
    assert!(wishlist.is_in_wishlist(&saree).await);

    wishlist.remove_item(&ProductId::new("kurta")).await;
    assert_eq!(wishlist.count().await, 1);

    wishlist.clear().await;
    assert_eq!(storage.last_value(DEFAULT_WISHLIST_KEY).as_deref(), Some("[]"));
}

#[tokio::test]
async fn test_non_array_payload_starts_empty() {
    let storage = Arc::new(RecordingStorage::seeded(DEFAULT_WISHLIST_KEY, r#"{"saree":true}"#));
    let wishlist = mount(&storage).await;

    assert_eq!(wishlist.count().await, 0);

    wishlist.add_item(item("saree")).await;
    assert_eq!(wishlist.count().await, 1);
}

#[tokio::test]
async fn test_unavailable_storage_degrades_to_memory() {
    let wishlist = Wishlist::mount(
        Arc::new(UnavailableStorage),
        PersistenceConfig::new(DEFAULT_WISHLIST_KEY),
    )
    .await;

    wishlist.add_item(item("saree")).await;

    assert!(wishlist.is_in_wishlist(&ProductId::new("saree")).await);
}

#[tokio::test]
async fn test_use_wishlist_requires_provider() {
    let root = Scope::root();
    assert!(matches!(
        use_wishlist(&root.child()),
        Err(StoreError::OutsideScope { type_name }) if type_name.contains("Wishlist")
    ));

    root.provide(Wishlist::ephemeral());
    assert!(use_wishlist(&root.child()).is_ok());
}

proptest! {
    #[test]
    fn prop_product_ids_stay_unique(
        ops in proptest::collection::vec((any::<bool>(), properties::product_ids()), 0..40),
    ) {
        let reducer = WishlistReducer::new();
        let mut state = WishlistState::new();
        for (toggle, id) in ops {
            let action = if toggle {
                WishlistAction::Toggle { item: item(&id) }
            } else {
                WishlistAction::AddItem { item: item(&id) }
            };
            let _ = reducer.reduce(&mut state, action, &WishlistEnvironment);

            let mut ids: Vec<_> = state.items.iter().map(|i| i.product_id.clone()).collect();
            ids.sort();
            ids.dedup();
            prop_assert_eq!(ids.len(), state.count());
        }
    }
}
