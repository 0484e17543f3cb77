use std::path::{Path, PathBuf};

/// Writes a plain white image; the format follows the file extension.
pub(crate) fn write_blank_image(dir: &Path, name: &str, width: u32, height: u32) -> PathBuf {
    let path = dir.join(name);
    image::GrayImage::from_pixel(width, height, image::Luma([255]))
        .save(&path)
        .expect("write blank image");
    path
}

/// Renders `contents` as a printed symbol with the writer's quiet zone.
pub(crate) fn render_symbol(contents: &str, format: rxing::BarcodeFormat) -> image::GrayImage {
    use rxing::Writer;

    let (width, height) = match format {
        rxing::BarcodeFormat::DATA_MATRIX | rxing::BarcodeFormat::QR_CODE => (200, 200),
        _ => (600, 150),
    };
    let matrix = rxing::MultiFormatWriter
        .encode(contents, &format, width, height)
        .expect("encode symbol");
    image::GrayImage::from_fn(matrix.getWidth(), matrix.getHeight(), |x, y| {
        if matrix.get(x, y) {
            image::Luma([0])
        } else {
            image::Luma([255])
        }
    })
}

pub(crate) fn write_symbol_image(
    dir: &Path,
    name: &str,
    contents: &str,
    format: rxing::BarcodeFormat,
) -> PathBuf {
    let path = dir.join(name);
    render_symbol(contents, format)
        .save(&path)
        .expect("write symbol image");
    path
}
