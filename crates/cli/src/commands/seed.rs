//! Seed the storefront database with a demo catalog.
//!
//! Safe to run more than once: categories that already exist (by slug) are
//! skipped together with their products, and the banner and UPI details are
//! only written when none are set.

use thiserror::Error;
use tracing::info;

use loomline_core::Money;
use loomline_storefront::db::{
    BannerRepository, CategoryRepository, ProductRepository, RepositoryError, SettingsRepository,
};
use loomline_storefront::models::UpiSettings;
use loomline_storefront::models::catalog::{BannerInput, CategoryInput, ProductInput};

use super::{CommandError, connect};

#[derive(Debug, Error)]
pub enum SeedError {
    #[error(transparent)]
    Connect(#[from] CommandError),

    #[error("Database error: {0}")]
    Repository(#[from] RepositoryError),
}

struct SeedCategory {
    name: &'static str,
    slug: &'static str,
    description: &'static str,
    /// (name, price in rupees)
    products: &'static [(&'static str, i64)],
}

const CATALOG: &[SeedCategory] = &[
    SeedCategory {
        name: "Kurtas",
        slug: "kurtas",
        description: "Cotton and linen kurtas, packed in sets of ten",
        products: &[
            ("Block-print cotton kurta", 450),
            ("Linen straight kurta", 620),
            ("Chikankari kurta", 890),
        ],
    },
    SeedCategory {
        name: "Sarees",
        slug: "sarees",
        description: "Surat georgette and silk blend sarees",
        products: &[("Georgette printed saree", 780), ("Silk blend saree", 1450)],
    },
    SeedCategory {
        name: "Shirts",
        slug: "shirts",
        description: "Men's formal and casual shirts",
        products: &[("Oxford cotton shirt", 520), ("Mandarin collar linen shirt", 690)],
    },
];

const DEMO_IMAGE_BASE: &str = "https://cdn.loomline.in/demo";

/// Seed categories, products, a hero banner and UPI payment details.
pub async fn catalog() -> Result<(), SeedError> {
    let pool = connect().await?;
    let categories = CategoryRepository::new(&pool);
    let products = ProductRepository::new(&pool);

    let mut created = 0usize;
    for seed in CATALOG {
        if categories.get_by_slug(seed.slug).await?.is_some() {
            info!(slug = seed.slug, "Category exists, skipping");
            continue;
        }

        let category = categories
            .create(&CategoryInput {
                name: seed.name.to_owned(),
                slug: seed.slug.to_owned(),
                description: Some(seed.description.to_owned()),
            })
            .await?;

        for (index, &(name, price)) in seed.products.iter().enumerate() {
            products
                .create(&ProductInput {
                    name: name.to_owned(),
                    description: None,
                    price: Money::from_major(price),
                    images: vec![format!("{DEMO_IMAGE_BASE}/{}-{}.jpg", seed.slug, index + 1)],
                    category_id: Some(category.id),
                })
                .await?;
            created += 1;
        }
    }
    info!(products = created, "Catalog seeded");

    let banners = BannerRepository::new(&pool);
    if banners.list(Some("hero")).await?.is_empty() {
        banners
            .create(&BannerInput {
                placement: "hero".to_owned(),
                title: "Festive wholesale collection".to_owned(),
                description: "Minimum order of ten pieces per design".to_owned(),
                desktop_image_url: format!("{DEMO_IMAGE_BASE}/hero-desktop.jpg"),
                mobile_image_url: format!("{DEMO_IMAGE_BASE}/hero-mobile.jpg"),
                link_url: Some("/categories/sarees".to_owned()),
                position: 0,
            })
            .await?;
        info!("Hero banner created");
    }

    let settings = SettingsRepository::new(&pool);
    if settings.get::<UpiSettings>(UpiSettings::KEY).await?.is_none() {
        settings
            .set(
                UpiSettings::KEY,
                &UpiSettings {
                    upi_id: "loomline@upi".to_owned(),
                    qr_code_url: format!("{DEMO_IMAGE_BASE}/upi-qr.png"),
                },
            )
            .await?;
        info!("UPI payment details set");
    }

    Ok(())
}
