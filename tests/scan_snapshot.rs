use anyhow::Result;
use image::DynamicImage;
use medscan::barcode::SymbolDecoder;
use medscan::lookup::NoLookup;
use medscan::{DecodedSymbol, Dispatcher, Scanner, Symbology};

struct StaticDecoder(DecodedSymbol);

impl SymbolDecoder for StaticDecoder {
    fn decode(&self, _image: &DynamicImage) -> Result<Vec<DecodedSymbol>> {
        Ok(vec![self.0.clone()])
    }
}

fn blank_image(dir: &std::path::Path) -> std::path::PathBuf {
    let path = dir.join("carton.png");
    image::GrayImage::from_pixel(20, 20, image::Luma([255]))
        .save(&path)
        .expect("write image");
    path
}

#[tokio::test]
async fn code128_gs1_scan_snapshot() {
    let dir = tempfile::tempdir().expect("tempdir");
    let image_path = blank_image(dir.path());
    let decoder = StaticDecoder(DecodedSymbol::new(
        "0112345678901231172406151012345678",
        Symbology::Code128,
    ));
    let scanner = Scanner::new(Box::new(decoder), Dispatcher::new(Box::new(NoLookup)))
        .with_work_dir(dir.path());

    let record = scanner.scan_barcode(&image_path).await.expect("scan");
    insta::assert_json_snapshot!(record, @r###"
    {
      "medicineName": "",
      "price": "",
      "manufacturingDate": "",
      "expiryDate": "2024-06-15",
      "batchNumber": "12345678",
      "quantity": "",
      "barcodeData": "0112345678901231172406151012345678",
      "barcodeType": "CODE128"
    }
    "###);
}

#[tokio::test]
async fn datamatrix_without_gtin_prefix_keeps_raw_payload_only() {
    let dir = tempfile::tempdir().expect("tempdir");
    let image_path = blank_image(dir.path());
    let decoder = StaticDecoder(DecodedSymbol::new("10LOT9\u{1D}17991231", Symbology::DataMatrix));
    let scanner = Scanner::new(Box::new(decoder), Dispatcher::new(Box::new(NoLookup)));

    let record = scanner.scan_barcode(&image_path).await.expect("scan");
    assert_eq!(record.batch_number, "");
    assert_eq!(record.expiry_date, "");
    assert_eq!(record.barcode_data.as_deref(), Some("10LOT9\u{1D}17991231"));
    assert_eq!(record.barcode_type.as_deref(), Some("DATAMATRIX"));
}
