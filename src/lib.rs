use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};
use std::path::Path;

pub mod barcode;
pub mod label;
pub mod logging;
pub mod lookup;
pub mod medicine;
pub mod server;
pub mod settings;
#[cfg(test)]
mod test_util;

pub use barcode::{DecodedSymbol, Dispatcher, RxingDecoder, ScanError, Scanner, Symbology};
pub use medicine::{MedicineInfo, PartialMedicineInfo, assemble};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScanType {
    Image,
    Barcode,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub image: Option<String>,
    pub settings_path: Option<String>,
    pub server: Option<String>,
}

pub fn build_scanner(settings: &settings::Settings) -> Result<Scanner> {
    let lookup = lookup::build_lookup(settings)?;
    let work_dir = settings.resolve_work_dir()?;
    let scanner = Scanner::new(Box::new(RxingDecoder::default()), Dispatcher::new(lookup));
    Ok(scanner.with_work_dir(work_dir))
}

/// Scans `config.image` and returns the record as pretty JSON, or runs the
/// HTTP server when `config.server` is set.
pub async fn run(config: Config) -> Result<String> {
    let settings_path = config.settings_path.as_deref().map(Path::new);
    let settings = settings::load_settings(settings_path)?;
    let scanner = build_scanner(&settings)?;

    if let Some(addr) = config.server {
        let addr = if addr.trim().is_empty() {
            settings.server_addr.clone()
        } else {
            addr
        };
        let upload_dir = settings.resolve_work_dir()?;
        server::run_server(
            server::ServerState {
                scanner,
                upload_dir,
            },
            addr,
        )
        .await?;
        return Ok(String::new());
    }

    let image = config
        .image
        .ok_or_else(|| anyhow!("no image given (pass a path or --server)"))?;
    let path = Path::new(image.trim());
    if !path.exists() {
        return Err(anyhow!("image not found: {}", path.display()));
    }
    let record = scanner.scan_barcode(path).await?;
    serde_json::to_string_pretty(&record).with_context(|| "failed to serialize scan result")
}
