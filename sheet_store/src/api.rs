use std::{
    sync::Arc,
    time::{SystemTime, UNIX_EPOCH},
};

use log::*;
use reqwest::{header::CONTENT_TYPE, Client};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::{
    config::StoreConfig,
    error::SheetStoreError,
    product::{new_product_id, Product},
};

/// The adapter between the application and the spreadsheet script. All knowledge of the wire
/// contract (action payloads, field casing, boolean encodings) stays behind this type.
#[derive(Clone)]
pub struct SheetStoreApi {
    config: StoreConfig,
    client: Arc<Client>,
}

#[derive(Debug, Deserialize)]
struct SheetResponse {
    status: String,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    data: Option<Value>,
    #[serde(default)]
    #[allow(dead_code)]
    action: Option<String>,
}

impl SheetStoreApi {
    pub fn new(config: StoreConfig) -> Result<Self, SheetStoreError> {
        let client = Client::builder().build().map_err(|e| SheetStoreError::Initialization(e.to_string()))?;
        Ok(Self { config, client: Arc::new(client) })
    }

    pub fn is_configured(&self) -> bool {
        self.config.is_configured()
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Fetches the full catalog. Never fails: configuration, transport, and script errors are
    /// logged and degrade to an empty list, so readers see "no data yet" instead of an error.
    pub async fn list(&self) -> Vec<Product> {
        match self.try_list().await {
            Ok(products) => {
                debug!("Fetched {} catalog rows", products.len());
                products
            },
            Err(e) => {
                error!("Error fetching catalog: {e}");
                Vec::new()
            },
        }
    }

    /// The fallible version of [`list`](Self::list), for callers that need the error.
    /// An unconfigured adapter yields an empty list rather than an error.
    pub async fn try_list(&self) -> Result<Vec<Product>, SheetStoreError> {
        let url = match self.config.endpoint() {
            Some(url) => url,
            None => return Ok(Vec::new()),
        };
        // The timestamp defeats the script host's response cache.
        let t = now_millis().to_string();
        trace!("Fetching catalog rows from sheet");
        let response = self
            .client
            .get(url)
            .query(&[("action", "read"), ("t", t.as_str())])
            .send()
            .await
            .map_err(|e| SheetStoreError::Transport(e.to_string()))?;
        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response.text().await.map_err(|e| SheetStoreError::Transport(e.to_string()))?;
            return Err(SheetStoreError::HttpStatus { status, message });
        }
        let body = response.json::<SheetResponse>().await.map_err(|e| SheetStoreError::Json(e.to_string()))?;
        if body.status == "error" {
            return Err(SheetStoreError::Store(body.message.unwrap_or_else(|| "Unknown script error".to_string())));
        }
        let rows = match body.data {
            Some(Value::Array(rows)) => rows,
            _ => return Ok(Vec::new()),
        };
        Ok(rows.iter().map(Product::from_row).collect())
    }

    /// Creates a new product row. A fresh id is assigned here (the sheet does not generate ids)
    /// and returned so the caller can find the row in the next fetch.
    pub async fn create(&self, product: &Product) -> Result<String, SheetStoreError> {
        let mut row = product.clone();
        row.id = new_product_id();
        let payload = json!({ "action": "create", "data": row.to_row() });
        self.post_action(&payload).await?;
        info!("Created product {} ({})", row.id, row.name);
        Ok(row.id)
    }

    /// Replaces the row with the given id. The script preserves `id` and `createdAt`; everything
    /// else is overwritten. An unknown id surfaces as the script's own not-found error.
    pub async fn update(&self, id: &str, product: &Product) -> Result<(), SheetStoreError> {
        let id = id.trim();
        if id.is_empty() {
            return Err(SheetStoreError::InvalidId("update requires a non-empty id".to_string()));
        }
        let payload = json!({ "action": "update", "id": id, "data": product.to_row() });
        self.post_action(&payload).await?;
        info!("Updated product {id}");
        Ok(())
    }

    /// Deletes the row with the given id. Rejected before any network call if the id is empty.
    pub async fn delete(&self, id: &str) -> Result<(), SheetStoreError> {
        let id = id.trim();
        if id.is_empty() {
            return Err(SheetStoreError::InvalidId("delete requires a non-empty id".to_string()));
        }
        let payload = json!({ "action": "delete", "id": id });
        self.post_action(&payload).await?;
        info!("Deleted product {id}");
        Ok(())
    }

    async fn post_action(&self, payload: &Value) -> Result<SheetResponse, SheetStoreError> {
        let url = self.config.endpoint().ok_or(SheetStoreError::NotConfigured)?;
        let body = serde_json::to_string(payload).map_err(|e| SheetStoreError::Json(e.to_string()))?;
        trace!("Posting to sheet: {body}");
        // Sent as text/plain so browser-origin clients of the same script never trigger a CORS
        // preflight, which Apps Script cannot answer. The script parses the body as JSON
        // regardless of the declared content type.
        let response = self
            .client
            .post(url)
            .header(CONTENT_TYPE, "text/plain;charset=utf-8")
            .body(body)
            .send()
            .await
            .map_err(|e| SheetStoreError::Transport(e.to_string()))?;
        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response.text().await.map_err(|e| SheetStoreError::Transport(e.to_string()))?;
            return Err(SheetStoreError::HttpStatus { status, message });
        }
        let parsed = response.json::<SheetResponse>().await.map_err(|e| SheetStoreError::Json(e.to_string()))?;
        if parsed.status == "error" {
            return Err(SheetStoreError::Store(parsed.message.unwrap_or_else(|| "Unknown script error".to_string())));
        }
        Ok(parsed)
    }
}

fn now_millis() -> u128 {
    SystemTime::now().duration_since(UNIX_EPOCH).map(|d| d.as_millis()).unwrap_or_default()
}
