//! J-Quants daily quotes client.

use async_trait::async_trait;
use chrono::NaiveDate;
use marketlens_core::error::DataError;
use marketlens_core::traits::PriceSource;
use marketlens_core::types::RawQuote;
use reqwest::{header, Client};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info};

/// Client configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JQuantsConfig {
    pub base_url: String,
    pub id_token: String,
    pub timeout: Duration,
}

impl JQuantsConfig {
    pub const DEFAULT_BASE_URL: &'static str = "https://api.jquants.com/v1";

    /// Read the ID token from the environment variable `token_env`.
    pub fn from_env(
        base_url: &str,
        token_env: &str,
        timeout: Duration,
    ) -> Result<Self, DataError> {
        let id_token = std::env::var(token_env).map_err(|_| {
            DataError::Internal(format!("{} environment variable not set", token_env))
        })?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            id_token,
            timeout,
        })
    }
}

/// One page of the daily quotes endpoint.
#[derive(Debug, Deserialize)]
struct DailyQuotesPage {
    #[serde(default)]
    daily_quotes: Vec<RawQuote>,
    #[serde(default)]
    pagination_key: Option<String>,
}

/// HTTP client for `/prices/daily_quotes`.
pub struct JQuantsClient {
    config: JQuantsConfig,
    client: Client,
}

impl JQuantsClient {
    pub fn new(config: JQuantsConfig) -> Result<Self, DataError> {
        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            header::HeaderValue::from_str(&format!("Bearer {}", config.id_token))
                .map_err(|e| DataError::Internal(format!("invalid ID token: {}", e)))?,
        );

        let client = Client::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .build()
            .map_err(|e| DataError::Connection(e.to_string()))?;

        Ok(Self { config, client })
    }

    async fn fetch_page(
        &self,
        code: &str,
        from: NaiveDate,
        to: NaiveDate,
        pagination_key: Option<&str>,
    ) -> Result<DailyQuotesPage, DataError> {
        let url = format!("{}/prices/daily_quotes", self.config.base_url);

        let mut params = vec![
            ("code", code.to_string()),
            ("from", from.format("%Y-%m-%d").to_string()),
            ("to", to.format("%Y-%m-%d").to_string()),
        ];
        if let Some(key) = pagination_key {
            params.push(("pagination_key", key.to_string()));
        }

        let resp = self
            .client
            .get(&url)
            .query(&params)
            .send()
            .await
            .map_err(map_request_error)?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let message = resp.text().await.unwrap_or_default();
            return Err(DataError::Http { status, message });
        }

        let body = resp.text().await.map_err(map_request_error)?;
        parse_page(&body)
    }
}

#[async_trait]
impl PriceSource for JQuantsClient {
    async fn daily_quotes(
        &self,
        code: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<RawQuote>, DataError> {
        let mut quotes = Vec::new();
        let mut pagination_key: Option<String> = None;
        let mut pages = 0usize;

        loop {
            let page = self.fetch_page(code, from, to, pagination_key.as_deref()).await?;
            pages += 1;
            quotes.extend(page.daily_quotes);
            match page.pagination_key {
                Some(key) if !key.is_empty() => pagination_key = Some(key),
                _ => break,
            }
            debug!(code, pages, "Following pagination key");
        }

        for quote in &mut quotes {
            if let Some(c) = quote.code.as_mut() {
                *c = normalize_code(c);
            }
        }

        info!(code, %from, %to, records = quotes.len(), pages, "Fetched daily quotes");
        Ok(quotes)
    }

    fn name(&self) -> &str {
        "jquants"
    }
}

fn parse_page(body: &str) -> Result<DailyQuotesPage, DataError> {
    serde_json::from_str(body).map_err(|e| DataError::ParseError(e.to_string()))
}

fn map_request_error(err: reqwest::Error) -> DataError {
    if err.is_timeout() {
        DataError::Timeout { after_ms: 0 }
    } else if let Some(status) = err.status() {
        DataError::Http {
            status: status.as_u16(),
            message: err.to_string(),
        }
    } else {
        DataError::Connection(err.to_string())
    }
}

/// Local security code: the 5-digit form with a trailing `0` drops it.
pub fn normalize_code(code: &str) -> String {
    let code = code.trim();
    if code.len() == 5 && code.ends_with('0') && code.bytes().all(|b| b.is_ascii_digit()) {
        code[..4].to_string()
    } else {
        code.to_string()
    }
}
