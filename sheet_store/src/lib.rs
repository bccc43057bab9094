mod api;
mod config;
mod error;
mod helpers;
mod product;
mod sync;

pub use api::SheetStoreApi;
pub use config::{StoreConfig, ENDPOINT_ENV_VAR, HARDCODED_ENDPOINT};
pub use error::SheetStoreError;
pub use helpers::direct_image_url;
pub use product::{
    featured_flag,
    images_from_value,
    new_product_id,
    split_images,
    CategoryFilter,
    Product,
    ProductFilter,
    CATEGORIES,
};
pub use sync::{CatalogSync, POLL_INTERVAL};
