use std::time::Duration;

use anyhow::{anyhow, Result};
use log::*;
use sheet_store::{split_images, CatalogSync, CategoryFilter, Product, ProductFilter, SheetStoreApi, StoreConfig};
use url::Url;

use crate::{
    endpoint_store::EndpointStore,
    formatting::{format_catalog, format_product, whatsapp_link, DEFAULT_WHATSAPP_NUMBER},
    Command,
    ListParams,
    ProductParams,
};

pub async fn handle_command(command: Command) -> Result<()> {
    let store = EndpointStore::open()?;
    let api = SheetStoreApi::new(StoreConfig::resolve(store.sheet_url()))?;
    match command {
        Command::List(params) => list(&api, params).await,
        Command::Get { id } => get(&api, &id).await,
        Command::Add(params) => add(&api, params).await,
        Command::Edit { id, params } => edit(&api, &id, params).await,
        Command::Delete { id } => delete(&api, &id).await,
        Command::Watch => watch(api).await,
        Command::Contact { id } => contact(&api, &store, &id).await,
        Command::Setup { url } => setup(&store, &url),
        Command::Reset => reset(&store),
    }
}

async fn list(api: &SheetStoreApi, params: ListParams) -> Result<()> {
    let filter = filter_from(&params);
    let products = fetch_newest_first(api).await;
    let matched = filter.apply(&products);
    println!("{}", format_catalog(&matched, params.all));
    println!("{} of {} products", matched.len(), products.len());
    if products.is_empty() && !api.is_configured() {
        println!("No sheet endpoint configured. Run `catalogtools setup <url>` first.");
    }
    Ok(())
}

async fn get(api: &SheetStoreApi, id: &str) -> Result<()> {
    let product = find_product(api, id).await?;
    println!("{}", format_product(&product, true)?);
    Ok(())
}

async fn add(api: &SheetStoreApi, params: ProductParams) -> Result<()> {
    let name = params.name.clone().filter(|n| !n.trim().is_empty()).ok_or_else(|| anyhow!("--name is required"))?;
    let mut product = Product { name, ..Product::default() };
    overlay(&mut product, params);
    let id = api.create(&product).await?;
    println!("Created product {id}");
    // Foreground re-list after a successful mutation
    let visible = api.list().await.into_iter().any(|p| p.id == id);
    if visible {
        println!("The new row is live in the catalog.");
    } else {
        info!("Row {id} not visible yet; the sheet will catch up on the next poll");
    }
    Ok(())
}

async fn edit(api: &SheetStoreApi, id: &str, params: ProductParams) -> Result<()> {
    let mut product = find_product(api, id).await?;
    overlay(&mut product, params);
    api.update(id, &product).await?;
    println!("Updated product {id}");
    // Foreground re-list after a successful mutation
    match api.list().await.into_iter().find(|p| p.id == id.trim()) {
        Some(updated) => println!("{}", format_product(&updated, true)?),
        None => info!("Row {id} not visible yet; the sheet will catch up on the next poll"),
    }
    Ok(())
}

async fn delete(api: &SheetStoreApi, id: &str) -> Result<()> {
    api.delete(id).await?;
    println!("Deleted product {id}");
    // Foreground re-list after a successful mutation
    if api.list().await.iter().any(|p| p.id == id.trim()) {
        info!("Row {id} still visible; the sheet will catch up on the next poll");
    } else {
        println!("The row is gone from the catalog.");
    }
    Ok(())
}

/// Runs the polling loop and re-renders the public catalog whenever the product set changes,
/// until Ctrl-C.
async fn watch(api: SheetStoreApi) -> Result<()> {
    let mut sync = CatalogSync::new(api);
    sync.start().await;
    if !sync.is_running() {
        return Err(anyhow!("No sheet endpoint configured. Run `catalogtools setup <url>` first."));
    }
    let mut shown: Option<Vec<Product>> = None;
    let mut ticker = tokio::time::interval(Duration::from_millis(500));
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            _ = ticker.tick() => {
                let current = sync.products().await;
                if shown.as_ref() != Some(&current) {
                    let visible: Vec<&Product> = current.iter().collect();
                    println!("{}", format_catalog(&visible, false));
                    println!("{} products. Watching for changes, Ctrl-C to exit.", current.len());
                    shown = Some(current);
                }
            }
        }
    }
    sync.stop();
    println!("Bye!");
    Ok(())
}

async fn contact(api: &SheetStoreApi, store: &EndpointStore, id: &str) -> Result<()> {
    let product = find_product(api, id).await?;
    let number = store
        .whatsapp_number()
        .or_else(|| std::env::var("FD_WHATSAPP_NUMBER").ok())
        .unwrap_or_else(|| DEFAULT_WHATSAPP_NUMBER.to_string());
    println!("{}", whatsapp_link(&product, &number));
    Ok(())
}

fn setup(store: &EndpointStore, url: &str) -> Result<()> {
    let parsed = Url::parse(url.trim()).map_err(|e| anyhow!("That does not look like a valid URL: {e}"))?;
    if parsed.scheme() != "https" && parsed.scheme() != "http" {
        return Err(anyhow!("The endpoint must be an http(s) URL"));
    }
    store.save_sheet_url(url)?;
    println!("Endpoint saved. The catalog is now configured.");
    Ok(())
}

fn reset(store: &EndpointStore) -> Result<()> {
    store.clear()?;
    println!("Endpoint cleared. The catalog is now unconfigured.");
    Ok(())
}

async fn find_product(api: &SheetStoreApi, id: &str) -> Result<Product> {
    let id = id.trim();
    if id.is_empty() {
        return Err(anyhow!("A product id is required"));
    }
    api.list().await.into_iter().find(|p| p.id == id).ok_or_else(|| anyhow!("No product with id {id}"))
}

async fn fetch_newest_first(api: &SheetStoreApi) -> Vec<Product> {
    let mut products = api.list().await;
    products.reverse();
    products
}

fn filter_from(params: &ListParams) -> ProductFilter {
    let category = if params.featured {
        CategoryFilter::Featured
    } else {
        match &params.category {
            Some(cat) => CategoryFilter::Category(cat.clone()),
            None => CategoryFilter::All,
        }
    };
    ProductFilter { category, search: params.search.clone().unwrap_or_default() }
}

fn overlay(product: &mut Product, params: ProductParams) {
    if let Some(name) = params.name {
        product.name = name;
    }
    if let Some(category) = params.category {
        product.category = category;
    }
    if let Some(format) = params.format {
        product.format = format;
    }
    if let Some(yield_m2) = params.yield_m2 {
        product.yield_m2 = yield_m2;
    }
    if let Some(price) = params.price {
        product.price = price.into();
    }
    if let Some(cost) = params.cost {
        product.cost = cost.into();
    }
    if let Some(finish) = params.finish {
        product.finish = finish;
    }
    if let Some(code) = params.code {
        product.code = code;
    }
    if let Some(description) = params.description {
        product.description = description;
    }
    if let Some(provider) = params.provider {
        product.provider = provider;
    }
    if let Some(images) = params.images {
        product.images = split_images(&images);
    }
    if let Some(featured) = params.featured {
        product.is_featured = featured;
    }
}
