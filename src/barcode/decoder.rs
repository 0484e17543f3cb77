use anyhow::{Result, anyhow};
use image::DynamicImage;
use rxing::common::HybridBinarizer;
use rxing::multi::{GenericMultipleBarcodeReader, MultipleBarcodeReader};
use rxing::{
    BarcodeFormat, BinaryBitmap, DecodeHintType, DecodeHintValue, DecodingHintDictionary,
    Exceptions, Luma8LuminanceSource, MultiFormatReader,
};
use std::collections::HashSet;

use super::{DecodedSymbol, Symbology};

/// Pluggable symbol decoding capability.
///
/// Returns every symbol found, in decoder order. An image without a readable
/// symbol yields an empty list; `Err` is reserved for decoder failures.
pub trait SymbolDecoder: Send + Sync {
    fn decode(&self, image: &DynamicImage) -> Result<Vec<DecodedSymbol>>;
}

/// Symbology identifier rxing puts in front of GS1-128 payloads.
const GS1_128_PREFIX: &str = "]C1";

#[derive(Debug, Clone, Copy, Default)]
pub struct RxingDecoder;

impl RxingDecoder {
    fn hints(&self) -> DecodingHintDictionary {
        let mut hints = DecodingHintDictionary::new();
        hints.insert(DecodeHintType::TRY_HARDER, DecodeHintValue::TryHarder(true));
        // FNC1 separators come back as GS (0x1D) instead of being dropped
        hints.insert(DecodeHintType::ASSUME_GS1, DecodeHintValue::AssumeGs1(true));
        let formats: HashSet<BarcodeFormat> = [
            BarcodeFormat::EAN_13,
            BarcodeFormat::EAN_8,
            BarcodeFormat::UPC_A,
            BarcodeFormat::UPC_E,
            BarcodeFormat::CODE_128,
            BarcodeFormat::DATA_MATRIX,
            BarcodeFormat::QR_CODE,
        ]
        .into_iter()
        .collect();
        hints.insert(
            DecodeHintType::POSSIBLE_FORMATS,
            DecodeHintValue::PossibleFormats(formats),
        );
        hints
    }
}

impl SymbolDecoder for RxingDecoder {
    fn decode(&self, image: &DynamicImage) -> Result<Vec<DecodedSymbol>> {
        let gray = image.to_luma8();
        let (width, height) = gray.dimensions();
        let source = Luma8LuminanceSource::new(gray.into_raw(), width, height);
        let mut bitmap = BinaryBitmap::new(HybridBinarizer::new(source));
        let mut reader = GenericMultipleBarcodeReader::new(MultiFormatReader::default());

        match reader.decode_multiple_with_hints(&mut bitmap, &self.hints()) {
            Ok(results) => Ok(results
                .iter()
                .map(|result| {
                    DecodedSymbol::new(
                        strip_gs1_prefix(result.getText()),
                        symbology_from_format(result.getBarcodeFormat()),
                    )
                })
                .collect()),
            Err(
                Exceptions::NotFoundException(_)
                | Exceptions::FormatException(_)
                | Exceptions::ChecksumException(_),
            ) => Ok(Vec::new()),
            Err(err) => Err(anyhow!("rxing decode failed: {}", err)),
        }
    }
}

fn strip_gs1_prefix(text: &str) -> &str {
    text.strip_prefix(GS1_128_PREFIX).unwrap_or(text)
}

fn symbology_from_format(format: &BarcodeFormat) -> Symbology {
    match format {
        BarcodeFormat::EAN_13 => Symbology::Ean13,
        BarcodeFormat::EAN_8 => Symbology::Ean8,
        BarcodeFormat::UPC_A => Symbology::UpcA,
        BarcodeFormat::UPC_E => Symbology::UpcE,
        BarcodeFormat::CODE_128 => Symbology::Code128,
        BarcodeFormat::DATA_MATRIX => Symbology::DataMatrix,
        other => Symbology::Other(format!("{:?}", other).replace('_', "")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::render_symbol;
    use image::{GrayImage, Luma};

    fn render(contents: &str, format: BarcodeFormat) -> DynamicImage {
        DynamicImage::ImageLuma8(render_symbol(contents, format))
    }

    fn decode_one(image: &DynamicImage) -> DecodedSymbol {
        let symbols = RxingDecoder.decode(image).expect("decode");
        symbols.into_iter().next().expect("one symbol")
    }

    #[test]
    fn formats_map_to_scanner_names() {
        assert_eq!(symbology_from_format(&BarcodeFormat::EAN_13), Symbology::Ean13);
        assert_eq!(
            symbology_from_format(&BarcodeFormat::DATA_MATRIX),
            Symbology::DataMatrix
        );
        assert_eq!(
            symbology_from_format(&BarcodeFormat::QR_CODE).as_str(),
            "QRCODE"
        );
    }

    #[test]
    fn gs1_prefix_is_stripped_only_at_the_start() {
        assert_eq!(strip_gs1_prefix("]C1011234"), "011234");
        assert_eq!(strip_gs1_prefix("01]C1"), "01]C1");
        assert_eq!(strip_gs1_prefix("4006381333931"), "4006381333931");
    }

    #[test]
    fn blank_image_decodes_to_nothing() {
        let image = DynamicImage::ImageLuma8(GrayImage::from_pixel(48, 48, Luma([255])));
        let symbols = RxingDecoder.decode(&image).expect("decode");
        assert!(symbols.is_empty());
    }

    #[test]
    fn decodes_rendered_ean13() {
        let image = render("4006381333931", BarcodeFormat::EAN_13);
        let symbol = decode_one(&image);
        assert_eq!(symbol.payload, "4006381333931");
        assert_eq!(symbol.symbology, Symbology::Ean13);
    }

    #[test]
    fn decodes_rendered_code128() {
        let payload = "0112345678901231172406151012345678";
        let image = render(payload, BarcodeFormat::CODE_128);
        let symbol = decode_one(&image);
        assert_eq!(symbol.payload, payload);
        assert_eq!(symbol.symbology, Symbology::Code128);
    }

    #[test]
    fn gs1_128_separators_survive_decoding() {
        let image = render(
            "\u{f1}011234567890123110LOT42\u{f1}21SER9",
            BarcodeFormat::CODE_128,
        );
        let symbol = decode_one(&image);
        assert_eq!(symbol.payload, "011234567890123110LOT42\u{1D}21SER9");
        assert_eq!(symbol.symbology, Symbology::Code128);
    }
}
