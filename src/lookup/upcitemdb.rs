use anyhow::{Context, Result, anyhow};
use serde::Deserialize;
use tracing::debug;

use super::{LookupConfig, LookupFuture, ProductInfo, ProductLookup};

/// UPC/EAN lookup against an upcitemdb-compatible endpoint (`?upc=<code>`).
#[derive(Debug, Clone)]
pub struct UpcItemDbLookup {
    client: reqwest::Client,
    config: LookupConfig,
}

impl UpcItemDbLookup {
    pub fn new(config: LookupConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .with_context(|| "failed to build lookup HTTP client")?;
        Ok(Self { client, config })
    }

    async fn fetch(&self, code: &str) -> Result<Option<ProductInfo>> {
        let mut request = self
            .client
            .get(&self.config.endpoint)
            .query(&[("upc", code)])
            .header("Accept", "application/json");
        if let Some(key) = self.config.api_key.as_deref() {
            request = request.bearer_auth(key);
        }
        let response = request
            .send()
            .await
            .with_context(|| format!("lookup request for {} failed", code))?;

        let status = response.status();
        let text = response.text().await.unwrap_or_default();
        if !status.is_success() {
            return Err(anyhow!("lookup API error ({})", status));
        }
        debug!("lookup: {} returned {} bytes", code, text.len());
        parse_lookup_body(&text)
    }
}

impl ProductLookup for UpcItemDbLookup {
    fn lookup<'a>(&'a self, code: &'a str) -> LookupFuture<'a> {
        Box::pin(self.fetch(code))
    }
}

#[derive(Debug, Deserialize)]
struct LookupBody {
    #[serde(default)]
    items: Vec<LookupItem>,
}

#[derive(Debug, Deserialize)]
struct LookupItem {
    title: Option<String>,
}

/// First item with a non-blank title wins; no items is a miss.
pub fn parse_lookup_body(text: &str) -> Result<Option<ProductInfo>> {
    let body: LookupBody =
        serde_json::from_str(text).with_context(|| "malformed lookup response body")?;
    let product = body.items.into_iter().find_map(|item| {
        let name = item.title?.trim().to_string();
        if name.is_empty() {
            return None;
        }
        Some(ProductInfo { name })
    });
    Ok(product)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn parses_first_titled_item() {
        let body = r#"{
            "code": "OK",
            "total": 2,
            "items": [
                {"ean": "4006381333931", "title": "  "},
                {"ean": "4006381333931", "title": "Paracetamol 500mg", "brand": "Acme"}
            ]
        }"#;
        let product = parse_lookup_body(body).expect("parse").expect("hit");
        assert_eq!(product.name, "Paracetamol 500mg");
    }

    #[test]
    fn empty_items_is_a_miss() {
        let body = r#"{"code": "OK", "total": 0, "items": []}"#;
        assert_eq!(parse_lookup_body(body).expect("parse"), None);
        assert_eq!(parse_lookup_body("{}").expect("parse"), None);
    }

    #[test]
    fn malformed_body_is_an_error() {
        assert!(parse_lookup_body("<html>rate limited</html>").is_err());
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_an_error() {
        let lookup = UpcItemDbLookup::new(LookupConfig {
            endpoint: "http://127.0.0.1:9/prod/trial/lookup".to_string(),
            api_key: None,
            timeout: Duration::from_millis(500),
        })
        .expect("client");
        assert!(lookup.lookup("4006381333931").await.is_err());
    }
}
