mod decoder;
mod dispatch;
mod enhance;
mod gs1;

use image::DynamicImage;
use std::fmt;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::medicine::{MedicineInfo, assemble};

pub use decoder::{RxingDecoder, SymbolDecoder};
pub use dispatch::Dispatcher;
pub use enhance::{BLUR_KERNEL_SIZE, THRESHOLD_BLOCK_SIZE, THRESHOLD_OFFSET, enhance};
pub use gs1::{Gs1Ai, Gs1Field, Gs1Parser, RegexGs1Parser, parse_fields, parse_gs1};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Symbology {
    Ean13,
    Ean8,
    UpcA,
    UpcE,
    Code128,
    DataMatrix,
    Other(String),
}

impl Symbology {
    pub fn as_str(&self) -> &str {
        match self {
            Symbology::Ean13 => "EAN13",
            Symbology::Ean8 => "EAN8",
            Symbology::UpcA => "UPCA",
            Symbology::UpcE => "UPCE",
            Symbology::Code128 => "CODE128",
            Symbology::DataMatrix => "DATAMATRIX",
            Symbology::Other(name) => name,
        }
    }
}

impl fmt::Display for Symbology {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedSymbol {
    pub payload: String,
    pub symbology: Symbology,
}

impl DecodedSymbol {
    pub fn new(payload: impl Into<String>, symbology: Symbology) -> Self {
        Self {
            payload: payload.into(),
            symbology,
        }
    }
}

/// The only failures `Scanner::scan_barcode` reports to its caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanError {
    NoBarcodeDetected,
    ScanFailed(String),
}

impl ScanError {
    fn failed(context: &str, err: impl fmt::Display) -> Self {
        ScanError::ScanFailed(format!("{}: {}", context, err))
    }
}

impl fmt::Display for ScanError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScanError::NoBarcodeDetected => f.write_str("no barcode detected in the image"),
            ScanError::ScanFailed(reason) => write!(f, "barcode scanning failed: {}", reason),
        }
    }
}

impl std::error::Error for ScanError {}

/// Barcode pipeline: decode, enhance-and-retry once, dispatch, assemble.
pub struct Scanner {
    decoder: Box<dyn SymbolDecoder>,
    dispatcher: Dispatcher,
    work_dir: PathBuf,
}

impl Scanner {
    pub fn new(decoder: Box<dyn SymbolDecoder>, dispatcher: Dispatcher) -> Self {
        Self {
            decoder,
            dispatcher,
            work_dir: std::env::temp_dir(),
        }
    }

    /// Directory that receives the temporary enhanced image.
    pub fn with_work_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.work_dir = dir.into();
        self
    }

    pub async fn scan_barcode(&self, image_path: &Path) -> Result<MedicineInfo, ScanError> {
        let symbol = self.detect(image_path)?;
        info!(
            "scan: decoded {} symbol ({} bytes)",
            symbol.symbology,
            symbol.payload.len()
        );
        let parsed = self
            .dispatcher
            .route(&symbol.payload, &symbol.symbology)
            .await;
        if parsed.is_empty() {
            debug!("scan: no medicine fields recovered from {}", symbol.symbology);
        }
        Ok(assemble(&parsed, &symbol.payload, &symbol.symbology))
    }

    fn detect(&self, image_path: &Path) -> Result<DecodedSymbol, ScanError> {
        let image = image::open(image_path).map_err(|err| {
            ScanError::failed(&format!("failed to open {}", image_path.display()), err)
        })?;
        let mut symbols = self.decode(&image)?;
        if symbols.is_empty() {
            info!("scan: nothing decoded, retrying on enhanced image");
            symbols = self.decode_enhanced(&image, image_path)?;
        }
        symbols
            .into_iter()
            .next()
            .ok_or(ScanError::NoBarcodeDetected)
    }

    fn decode(&self, image: &DynamicImage) -> Result<Vec<DecodedSymbol>, ScanError> {
        self.decoder
            .decode(image)
            .map_err(|err| ScanError::failed("decoder error", format!("{:#}", err)))
    }

    // The temp file is removed when `enhanced_file` drops, on every return path.
    fn decode_enhanced(
        &self,
        image: &DynamicImage,
        source_path: &Path,
    ) -> Result<Vec<DecodedSymbol>, ScanError> {
        let enhanced = enhance(image);
        let prefix = format!("{}_enhanced-", file_stem(source_path));
        let mut enhanced_file = tempfile::Builder::new()
            .prefix(&prefix)
            .suffix(".png")
            .tempfile_in(&self.work_dir)
            .map_err(|err| ScanError::failed("failed to create enhanced image file", err))?;
        DynamicImage::ImageLuma8(enhanced)
            .write_to(&mut enhanced_file, image::ImageFormat::Png)
            .map_err(|err| ScanError::failed("failed to write enhanced image", err))?;
        enhanced_file
            .flush()
            .map_err(|err| ScanError::failed("failed to write enhanced image", err))?;
        debug!("scan: enhanced image at {}", enhanced_file.path().display());

        let reloaded = image::open(enhanced_file.path())
            .map_err(|err| ScanError::failed("failed to reload enhanced image", err))?;
        self.decode(&reloaded)
    }
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .and_then(|stem| stem.to_str())
        .filter(|stem| !stem.is_empty())
        .unwrap_or("scan")
        .to_string()
}
