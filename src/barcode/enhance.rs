use image::{DynamicImage, GrayImage, ImageBuffer, Luma};
use imageproc::definitions::Image;
use imageproc::filter::separable_filter_equal;

pub const BLUR_KERNEL_SIZE: usize = 5;
pub const THRESHOLD_BLOCK_SIZE: usize = 11;
pub const THRESHOLD_OFFSET: f32 = 2.0;

/// Contrast boost for the decode retry: grayscale, 5x5 Gaussian blur, then
/// adaptive Gaussian thresholding into a black/white image.
pub fn enhance(image: &DynamicImage) -> GrayImage {
    let gray = flatten_to_luma(image);
    let blurred = gaussian_filter(&gray, BLUR_KERNEL_SIZE);
    adaptive_gaussian_threshold(&blurred, THRESHOLD_BLOCK_SIZE, THRESHOLD_OFFSET)
}

fn flatten_to_luma(image: &DynamicImage) -> GrayImage {
    let rgba = image.to_rgba8();
    let (width, height) = rgba.dimensions();
    let mut luma = GrayImage::new(width, height);

    for (x, y, pixel) in rgba.enumerate_pixels() {
        let [r, g, b, a] = pixel.0;
        let alpha = a as f32 / 255.0;
        let r = r as f32 * alpha + 255.0 * (1.0 - alpha);
        let g = g as f32 * alpha + 255.0 * (1.0 - alpha);
        let b = b as f32 * alpha + 255.0 * (1.0 - alpha);
        let value = (0.299 * r + 0.587 * g + 0.114 * b).round() as u8;
        luma.put_pixel(x, y, Luma([value]));
    }
    luma
}

/// Normalized 1D Gaussian kernel with sigma derived from the size.
/// Sizes up to 7 use the fixed binomial taps.
fn gaussian_kernel(size: usize) -> Vec<f32> {
    match size {
        1 => return vec![1.0],
        3 => return vec![0.25, 0.5, 0.25],
        5 => return vec![0.0625, 0.25, 0.375, 0.25, 0.0625],
        7 => {
            return vec![
                0.03125, 0.109375, 0.21875, 0.28125, 0.21875, 0.109375, 0.03125,
            ];
        }
        _ => {}
    }

    let sigma = 0.3 * ((size as f32 - 1.0) * 0.5 - 1.0) + 0.8;
    let center = (size / 2) as f32;
    let mut kernel = (0..size)
        .map(|i| {
            let d = i as f32 - center;
            (-(d * d) / (2.0 * sigma * sigma)).exp()
        })
        .collect::<Vec<_>>();
    let sum: f32 = kernel.iter().sum();
    for weight in &mut kernel {
        *weight /= sum;
    }
    kernel
}

/// Filters in f32 and rounds once at the end; filtering a `GrayImage` directly
/// truncates after each pass.
fn gaussian_filter(image: &GrayImage, size: usize) -> GrayImage {
    let widened: Image<Luma<f32>> = ImageBuffer::from_fn(image.width(), image.height(), |x, y| {
        Luma([f32::from(image.get_pixel(x, y)[0])])
    });
    let filtered = separable_filter_equal(&widened, &gaussian_kernel(size));
    GrayImage::from_fn(image.width(), image.height(), |x, y| {
        let value = filtered.get_pixel(x, y)[0].round().clamp(0.0, 255.0);
        Luma([value as u8])
    })
}

fn adaptive_gaussian_threshold(image: &GrayImage, block_size: usize, offset: f32) -> GrayImage {
    let local_mean = gaussian_filter(image, block_size | 1);
    let mut output = image.clone();
    for (pixel, mean) in output.pixels_mut().zip(local_mean.pixels()) {
        let value = f32::from(pixel[0]);
        let cutoff = f32::from(mean[0]) - offset;
        pixel[0] = if value > cutoff { 255 } else { 0 };
    }
    output
}
