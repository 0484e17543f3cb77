use anyhow::Result;
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

mod upcitemdb;

pub use upcitemdb::{UpcItemDbLookup, parse_lookup_body};

use crate::settings::Settings;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductInfo {
    pub name: String,
}

pub type LookupFuture<'a> = Pin<Box<dyn Future<Output = Result<Option<ProductInfo>>> + Send + 'a>>;

/// Product database capability for retail codes (EAN/UPC).
///
/// `Ok(None)` is a miss. Callers treat `Err` as a miss as well.
pub trait ProductLookup: Send + Sync {
    fn lookup<'a>(&'a self, code: &'a str) -> LookupFuture<'a>;
}

/// Used when lookups are disabled; every code is a miss.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoLookup;

impl ProductLookup for NoLookup {
    fn lookup<'a>(&'a self, _code: &'a str) -> LookupFuture<'a> {
        Box::pin(async { Ok(None) })
    }
}

#[derive(Debug, Clone)]
pub struct LookupConfig {
    pub endpoint: String,
    pub api_key: Option<String>,
    pub timeout: Duration,
}

impl LookupConfig {
    /// Resolves the API key from the environment variable named in settings.
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            endpoint: settings.lookup_endpoint.clone(),
            api_key: get_env(&settings.lookup_api_key_env),
            timeout: Duration::from_secs(settings.lookup_timeout_secs),
        }
    }
}

pub fn build_lookup(settings: &Settings) -> Result<Box<dyn ProductLookup>> {
    if !settings.lookup_enabled {
        return Ok(Box::new(NoLookup));
    }
    let lookup = UpcItemDbLookup::new(LookupConfig::from_settings(settings))?;
    Ok(Box::new(lookup))
}

fn get_env(key: &str) -> Option<String> {
    if key.trim().is_empty() {
        return None;
    }
    std::env::var(key)
        .ok()
        .filter(|value| !value.trim().is_empty())
}
