//! Storefront demo binary
//!
//! Mounts the commerce stores over file-backed storage and runs a short
//! scripted shopping session. Run it twice to see the cart restored from
//! the previous run.

use anyhow::Context;
use commerce_cart::{use_cart, CartLineItem};
use commerce_state_core::catalog::Bilingual;
use commerce_state_runtime::metrics::MetricsRecorder;
use commerce_storefront::{CommerceProvider, FileStorage, StorefrontConfig};
use commerce_wishlist::{use_wishlist, WishlistItem};
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Log filter used when `RUST_LOG` is unset
const DEFAULT_LOG_FILTER: &str = "storefront=info,commerce_storefront=info,commerce_state_runtime=info";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| DEFAULT_LOG_FILTER.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = StorefrontConfig::from_env().context("invalid storefront configuration")?;
    let recorder = if config.metrics_enabled {
        Some(MetricsRecorder::install().context("failed to install metrics recorder")?)
    } else {
        None
    };

    tracing::info!(dir = %config.storage_dir.display(), locale = %config.locale, "Starting storefront");
    let storage = Arc::new(FileStorage::new(&config.storage_dir));
    let provider = CommerceProvider::mount(&config, storage).await;

    let page = provider.child();
    let cart = use_cart(&page)?;
    let wishlist = use_wishlist(&page)?;

    println!("=== Storefront session ===\n");
    println!("Restored cart: {} units, subtotal {}", cart.item_count().await, cart.subtotal().await);

    let saree = CartLineItem::new("saree-01", "Jamdani Saree", Decimal::from(4500))
        .with_name_bn("জামদানি শাড়ি")
        .with_image_url("/images/saree-01.jpg")
        .with_sale_price(Decimal::from(3900))
        .with_variant("color", "red");
    let kurta = CartLineItem::new("kurta-07", "Cotton Kurta", Decimal::from(1200))
        .with_name_bn("সুতি কুর্তা")
        .with_variant("size", "M")
        .with_variant("color", "white");

    println!("\n>>> Adding saree and two kurtas");
    cart.add_item(saree).await;
    cart.add_item(kurta.clone().with_quantity(2)).await;

    println!(">>> Adding the same kurta again (merges into one line)");
    cart.add_item(kurta.clone()).await;
    cart.update_quantity(&kurta.id, 2).await;

    println!(">>> Saving a panjabi to the wishlist");
    wishlist
        .toggle(
            WishlistItem::new("panjabi-03", "Silk Panjabi", Decimal::from(2800))
                .with_name_bn("সিল্ক পাঞ্জাবি"),
        )
        .await;

    let locale = provider.locale();
    println!("\n--- Cart ({locale}) ---");
    for line in cart.items().await {
        println!(
            "{:>3} x {:<24} {:>8}",
            line.quantity,
            line.display_name(locale),
            line.line_total()
        );
    }
    println!("Items:    {}", cart.item_count().await);
    println!("Savings:  {}", cart.savings().await);
    println!("Subtotal: {}", cart.subtotal().await);

    println!("\n--- Wishlist ({}) ---", wishlist.count().await);
    for item in wishlist.items().await {
        println!("  {} ({})", item.display_name(locale), item.price);
    }

    if let Some(text) = recorder.as_ref().and_then(MetricsRecorder::render) {
        println!("\n--- Metrics ---\n{text}");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_filter_covers_library_targets() {
        assert!(tracing_subscriber::EnvFilter::try_new(DEFAULT_LOG_FILTER).is_ok());

        let targets: Vec<_> = DEFAULT_LOG_FILTER
            .split(',')
            .filter_map(|directive| directive.split('=').next())
            .collect();
        assert!(targets.contains(&env!("CARGO_CRATE_NAME")));
        assert!(targets.contains(&"commerce_storefront"));
        assert!(targets.contains(&"commerce_state_runtime"));
    }
}
