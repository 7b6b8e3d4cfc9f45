//! Image stream decoding
//!
//! Converts the bytes of an Image XObject into a pixel buffer. JPEG streams
//! go through the `image` crate; raw samples are unpacked according to the
//! stream's colour space and bit depth.

use std::io::Cursor;

use image::{DynamicImage, GrayImage, ImageFormat, RgbImage};

use crate::document::{ColorSpace, ImageEncoding, PageImage};
use crate::ocr::OcrError;

/// Decode an embedded image into pixels
pub fn decode_image(image: &PageImage) -> Result<DynamicImage, OcrError> {
    match &image.encoding {
        ImageEncoding::Jpeg => image::load_from_memory_with_format(&image.data, ImageFormat::Jpeg)
            .map_err(|e| OcrError::Decode(format!("Invalid JPEG data: {}", e))),
        ImageEncoding::Unsupported(filter) => Err(OcrError::Decode(format!(
            "Unsupported image filter: {}",
            filter
        ))),
        ImageEncoding::Raw => decode_samples(image),
    }
}

/// Decode an embedded image and re-encode it as PNG for the OCR engine
pub fn decode_to_png(image: &PageImage) -> Result<Vec<u8>, OcrError> {
    let pixels = decode_image(image)?;

    let mut buffer = Vec::new();
    pixels
        .write_to(&mut Cursor::new(&mut buffer), ImageFormat::Png)
        .map_err(|e| OcrError::Decode(format!("Failed to encode PNG: {}", e)))?;

    Ok(buffer)
}

fn decode_samples(image: &PageImage) -> Result<DynamicImage, OcrError> {
    let (width, height) = (image.width, image.height);
    if width == 0 || height == 0 {
        return Err(OcrError::Decode(format!(
            "Invalid image dimensions {}x{}",
            width, height
        )));
    }

    match (&image.color_space, image.bits_per_component) {
        (ColorSpace::Gray, 1) => Ok(DynamicImage::ImageLuma8(unpack_bilevel(image)?)),
        (ColorSpace::Gray, 8) => {
            let data = samples(image, 1)?;
            GrayImage::from_raw(width, height, data.to_vec())
                .map(DynamicImage::ImageLuma8)
                .ok_or_else(|| buffer_error(image))
        }
        (ColorSpace::Rgb, 8) => {
            let data = samples(image, 3)?;
            RgbImage::from_raw(width, height, data.to_vec())
                .map(DynamicImage::ImageRgb8)
                .ok_or_else(|| buffer_error(image))
        }
        (ColorSpace::Cmyk, 8) => {
            let data = samples(image, 4)?;
            let rgb: Vec<u8> = data.chunks_exact(4).flat_map(cmyk_to_rgb).collect();
            RgbImage::from_raw(width, height, rgb)
                .map(DynamicImage::ImageRgb8)
                .ok_or_else(|| buffer_error(image))
        }
        (ColorSpace::Indexed { base, hival, lookup }, 8) => {
            let data = samples(image, 1)?;
            let rgb = expand_palette(data, base, *hival, lookup)?;
            RgbImage::from_raw(width, height, rgb)
                .map(DynamicImage::ImageRgb8)
                .ok_or_else(|| buffer_error(image))
        }
        (color_space, bits) => Err(OcrError::Decode(format!(
            "Unsupported colour space {:?} at {} bits per component",
            color_space, bits
        ))),
    }
}

/// The first `width * height * components` sample bytes
fn samples(image: &PageImage, components: usize) -> Result<&[u8], OcrError> {
    let expected = (image.width as usize)
        .checked_mul(image.height as usize)
        .and_then(|n| n.checked_mul(components))
        .ok_or_else(|| buffer_error(image))?;

    image.data.get(..expected).ok_or_else(|| {
        OcrError::Decode(format!(
            "Image data too short: {} bytes, expected {}",
            image.data.len(),
            expected
        ))
    })
}

/// 1 bit per pixel, rows padded to a byte boundary, 1 is white
fn unpack_bilevel(image: &PageImage) -> Result<GrayImage, OcrError> {
    let (width, height) = (image.width as usize, image.height as usize);
    let row_bytes = width.div_ceil(8);
    let expected = row_bytes
        .checked_mul(height)
        .ok_or_else(|| buffer_error(image))?;

    if image.data.len() < expected {
        return Err(OcrError::Decode(format!(
            "Image data too short: {} bytes, expected {}",
            image.data.len(),
            expected
        )));
    }

    let mut pixels = Vec::with_capacity(width * height);
    for row in image.data[..expected].chunks_exact(row_bytes) {
        for x in 0..width {
            let bit = (row[x / 8] >> (7 - (x % 8))) & 1;
            pixels.push(if bit == 1 { 255 } else { 0 });
        }
    }

    GrayImage::from_raw(image.width, image.height, pixels).ok_or_else(|| buffer_error(image))
}

fn expand_palette(
    indices: &[u8],
    base: &ColorSpace,
    hival: u8,
    lookup: &[u8],
) -> Result<Vec<u8>, OcrError> {
    let components = base
        .components()
        .filter(|_| !matches!(base, ColorSpace::Indexed { .. }))
        .ok_or_else(|| OcrError::Decode(format!("Unsupported palette base {:?}", base)))?;

    let mut rgb = Vec::with_capacity(indices.len() * 3);
    for &index in indices {
        let start = index.min(hival) as usize * components;
        let entry = lookup.get(start..start + components).ok_or_else(|| {
            OcrError::Decode(format!("Palette index {} outside lookup table", index))
        })?;

        match components {
            1 => rgb.extend_from_slice(&[entry[0], entry[0], entry[0]]),
            3 => rgb.extend_from_slice(entry),
            _ => rgb.extend(cmyk_to_rgb(entry)),
        }
    }

    Ok(rgb)
}

fn cmyk_to_rgb(cmyk: &[u8]) -> [u8; 3] {
    let k = 255 - cmyk[3] as u16;
    let channel = |c: u8| ((255 - c as u16) * k / 255) as u8;
    [channel(cmyk[0]), channel(cmyk[1]), channel(cmyk[2])]
}

fn buffer_error(image: &PageImage) -> OcrError {
    OcrError::Decode(format!(
        "Sample buffer does not match {}x{} image",
        image.width, image.height
    ))
}
