//! Product catalog sources
//!
//! The catalog is a read-only `{ "products": [...] }` document, fetched once
//! per session from a local file or an http(s) URL.

use crate::config::CatalogLocation;
use crate::types::{Product, ProductId};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// Categories offered before the catalog has been fetched
pub const DEFAULT_CATEGORIES: &[&str] = &[
    "cleanser",
    "moisturizer",
    "skincare",
    "haircare",
    "makeup",
    "hair color",
    "hair styling",
    "men's grooming",
    "suncare",
    "fragrance",
];

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("failed to read catalog {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("catalog request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("catalog endpoint returned {status}")]
    Status { status: u16 },

    #[error("catalog is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),
}

#[derive(Deserialize)]
struct CatalogDocument {
    products: Vec<Product>,
}

pub fn parse_catalog(body: &str) -> Result<Vec<Product>, CatalogError> {
    let document: CatalogDocument = serde_json::from_str(body)?;
    Ok(document.products)
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Catalog {
    products: Vec<Product>,
}

impl Catalog {
    pub fn new(products: Vec<Product>) -> Self {
        Self { products }
    }

    pub fn products(&self) -> &[Product] {
        &self.products
    }

    pub fn find(&self, id: ProductId) -> Option<&Product> {
        self.products.iter().find(|product| product.id == id)
    }

    /// Distinct categories in order of first appearance
    pub fn categories(&self) -> Vec<String> {
        let mut seen: Vec<String> = Vec::new();
        for product in &self.products {
            if !seen.iter().any(|category| *category == product.category) {
                seen.push(product.category.clone());
            }
        }
        seen
    }
}

#[async_trait]
pub trait CatalogSource: Send + Sync {
    async fn fetch(&self) -> Result<Vec<Product>, CatalogError>;
}

pub struct FileCatalog {
    path: PathBuf,
}

impl FileCatalog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl CatalogSource for FileCatalog {
    async fn fetch(&self) -> Result<Vec<Product>, CatalogError> {
        let body = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|source| CatalogError::Io {
                path: self.path.clone(),
                source,
            })?;
        let products = parse_catalog(&body)?;
        info!(path = %self.path.display(), count = products.len(), "loaded catalog");
        Ok(products)
    }
}

/// Remote catalog. A fetch that outlives `timeout` fails like any other
/// transport error, so the caller can show it and retry.
pub struct HttpCatalog {
    client: Client,
    url: String,
    timeout: Duration,
}

impl HttpCatalog {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Self {
        Self::with_client(Client::new(), url, timeout)
    }

    pub fn with_client(client: Client, url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            client,
            url: url.into(),
            timeout,
        }
    }
}

#[async_trait]
impl CatalogSource for HttpCatalog {
    async fn fetch(&self) -> Result<Vec<Product>, CatalogError> {
        let response = self
            .client
            .get(&self.url)
            .timeout(self.timeout)
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Err(CatalogError::Status {
                status: status.as_u16(),
            });
        }
        let body = response.text().await?;
        let products = parse_catalog(&body)?;
        info!(url = %self.url, count = products.len(), "loaded catalog");
        Ok(products)
    }
}

/// Catalog held in memory, for embedding and tests
pub struct StaticCatalog {
    products: Vec<Product>,
}

impl StaticCatalog {
    pub fn new(products: Vec<Product>) -> Self {
        Self { products }
    }
}

#[async_trait]
impl CatalogSource for StaticCatalog {
    async fn fetch(&self) -> Result<Vec<Product>, CatalogError> {
        Ok(self.products.clone())
    }
}

pub fn source_for(location: &CatalogLocation, timeout: Duration) -> Arc<dyn CatalogSource> {
    match location {
        CatalogLocation::File(path) => Arc::new(FileCatalog::new(path.clone())),
        CatalogLocation::Url(url) => Arc::new(HttpCatalog::new(url.clone(), timeout)),
    }
}
