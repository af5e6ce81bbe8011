use anyhow::{anyhow, Context, Result};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION};
use reqwest::Url;
use serde::de::DeserializeOwned;

use crate::config::SourceConfig;

const BODY_EXCERPT_CHARS: usize = 200;

/// Read-only client for the club's table store (PostgREST dialect).
///
/// The API key goes into default headers and is never logged.
#[derive(Debug, Clone)]
pub struct StoreClient {
    http: reqwest::Client,
    base_url: String,
    page_size: usize,
}

impl StoreClient {
    pub fn new(config: &SourceConfig) -> Result<Self> {
        // rustls 0.23+ needs a process-level crypto provider; later calls are no-ops
        let _ = rustls::crypto::ring::default_provider().install_default();

        let mut headers = HeaderMap::new();
        let mut key = HeaderValue::from_str(&config.api_key)
            .context("API key contains characters not allowed in a header")?;
        key.set_sensitive(true);
        let mut bearer = HeaderValue::from_str(&format!("Bearer {}", config.api_key))
            .context("API key contains characters not allowed in a header")?;
        bearer.set_sensitive(true);

        headers.insert("apikey", key);
        headers.insert(AUTHORIZATION, bearer);
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .user_agent(concat!("aoy-audit/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            http,
            base_url: config.url.trim_end_matches('/').to_string(),
            page_size: config.page_size,
        })
    }

    fn page_url(&self, table: &str, columns: &[&str], offset: usize) -> Result<Url> {
        let mut url = Url::parse(&format!("{}/rest/v1/{}", self.base_url, table))
            .with_context(|| format!("Invalid store URL: {}", self.base_url))?;

        let order = columns
            .iter()
            .map(|c| format!("{}.asc", c))
            .collect::<Vec<_>>()
            .join(",");

        url.query_pairs_mut()
            .append_pair("select", &columns.join(","))
            .append_pair("order", &order)
            .append_pair("limit", &self.page_size.to_string())
            .append_pair("offset", &offset.to_string());

        Ok(url)
    }

    async fn fetch_page<T: DeserializeOwned>(&self, url: Url, table: &str) -> Result<Vec<T>> {
        let response = self
            .http
            .get(url)
            .send()
            .await
            .with_context(|| format!("Request for {} failed", table))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let excerpt: String = body.chars().take(BODY_EXCERPT_CHARS).collect();
            return Err(anyhow!(
                "Store returned HTTP {} for {}: {}",
                status.as_u16(),
                table,
                excerpt
            ));
        }

        response
            .json()
            .await
            .with_context(|| format!("Failed to decode rows from {}", table))
    }

    /// Fetch every row of `table`, page by page, until an empty page arrives.
    ///
    /// The server may cap rows per response below `page_size`, so a short
    /// page does not mean the table is exhausted.
    pub async fn fetch_table<T: DeserializeOwned>(
        &self,
        table: &str,
        columns: &[&str],
    ) -> Result<Vec<T>> {
        let mut rows = Vec::new();
        let mut offset = 0;

        loop {
            let url = self.page_url(table, columns, offset)?;
            let page: Vec<T> = self.fetch_page(url, table).await?;
            let fetched = page.len();
            tracing::debug!(table, offset, fetched, "fetched page");

            if fetched == 0 {
                break;
            }
            rows.extend(page);
            offset += fetched;
        }

        tracing::info!(table, rows = rows.len(), "fetched table");
        Ok(rows)
    }
}
