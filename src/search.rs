use std::sync::LazyLock;

use regex::Regex;
use reqwest::Client;
use serde::Deserialize;
use uuid::Uuid;

use crate::core::item::SearchResult;

/// Vendor suffix noise on shopping prices ("R$ 9,99 agora"), stripped
/// before the strings reach the list.
static PRICE_NOISE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\s*agora\s*").unwrap());

const MIN_QUERY_LEN: usize = 3;

/// Shopping-search adapter over a SerpAPI-style endpoint.
///
/// Failures never reach callers: a missing key, a network error, or an
/// unexpected payload all yield an empty result set.
pub struct ProductSearch {
    endpoint: String,
    api_key: Option<String>,
    location: String,
    http: Client,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    shopping_results: Vec<ShoppingResult>,
}

#[derive(Debug, Deserialize)]
struct ShoppingResult {
    product_id: Option<String>,
    title: String,
    thumbnail: Option<String>,
    source: Option<String>,
    merchant: Option<String>,
    price: Option<String>,
}

impl ProductSearch {
    pub fn new(
        endpoint: &str,
        api_key: Option<String>,
        location: &str,
    ) -> Result<Self, String> {
        let http = Client::builder()
            .build()
            .map_err(|e| format!("Failed to build HTTP client: {}", e))?;
        Ok(Self {
            endpoint: endpoint.to_string(),
            api_key,
            location: location.to_string(),
            http,
        })
    }

    /// Search for product candidates. Queries under three characters and
    /// all failures return an empty list.
    pub async fn search(&self, query: &str) -> Vec<SearchResult> {
        let query = query.trim();
        if query.chars().count() < MIN_QUERY_LEN {
            return Vec::new();
        }
        let Some(api_key) = self.api_key.as_deref() else {
            log::warn!("Product search skipped: no API key configured");
            return Vec::new();
        };
        match self.request(query, api_key).await {
            Ok(results) => results,
            Err(e) => {
                log::warn!("Product search failed: {}", e);
                Vec::new()
            }
        }
    }

    async fn request(&self, query: &str, api_key: &str) -> Result<Vec<SearchResult>, String> {
        let resp = self
            .http
            .get(&self.endpoint)
            .query(&[
                ("engine", "google_shopping_light"),
                ("q", query),
                ("location", self.location.as_str()),
                ("google_domain", "google.com.br"),
                ("hl", "pt-br"),
                ("gl", "br"),
                ("device", "mobile"),
                ("num", "5"),
                ("api_key", api_key),
            ])
            .send()
            .await
            .map_err(|e| format!("search request failed: {}", e))?;

        if !resp.status().is_success() {
            return Err(format!("search returned {}", resp.status()));
        }

        let body: SearchResponse = resp
            .json()
            .await
            .map_err(|e| format!("decode search response: {}", e))?;

        Ok(body.shopping_results.into_iter().map(map_result).collect())
    }
}

/// Map a raw shopping result into a product candidate.
fn map_result(raw: ShoppingResult) -> SearchResult {
    SearchResult {
        id: raw
            .product_id
            .unwrap_or_else(|| Uuid::new_v4().to_string()),
        name: raw.title,
        image: raw.thumbnail,
        brands: raw.source.or(raw.merchant),
        price: raw.price.map(|p| clean_price(&p)),
    }
}

/// Strip vendor suffix noise and surrounding whitespace from a price
/// display string.
fn clean_price(raw: &str) -> String {
    PRICE_NOISE_RE.replace_all(raw, " ").trim().to_string()
}
