use std::io::Cursor;

use image::codecs::jpeg::JpegEncoder;
use image::imageops::{self, FilterType};
use image::{DynamicImage, GenericImageView, ImageError, ImageFormat, RgbaImage};
use thiserror::Error;

use crate::core::config::CompressionSettings;

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct CompressionOptions {
    /// Inputs at or below this size are passed through untouched.
    pub(crate) max_size_kb: u64,
    /// Encoder quality in `(0, 1]`; only lossy formats honour it.
    pub(crate) quality: f32,
    /// Bound for the longer side after downscaling.
    pub(crate) max_dimension: u32,
}

impl Default for CompressionOptions {
    fn default() -> Self {
        Self { max_size_kb: 1024, quality: 0.8, max_dimension: 1920 }
    }
}

impl From<&CompressionSettings> for CompressionOptions {
    fn from(settings: &CompressionSettings) -> Self {
        Self {
            max_size_kb: settings.max_size_kb,
            quality: settings.quality,
            max_dimension: settings.max_dimension,
        }
    }
}

#[derive(Debug, Error)]
pub(crate) enum CompressionError {
    #[error("failed to load image: {0}")]
    Decode(#[source] ImageError),
    #[error("failed to get a {width}x{height} drawing surface")]
    Surface { width: u32, height: u32 },
    #[error("failed to compress image: {0}")]
    Encode(#[source] ImageError),
    #[error("image compression task did not complete")]
    Aborted,
}

impl CompressionError {
    pub(crate) fn stage(&self) -> &'static str {
        match self {
            Self::Decode(_) => "decode",
            Self::Surface { .. } => "surface",
            Self::Encode(_) => "encode",
            Self::Aborted => "aborted",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct CompressedImage {
    pub(crate) bytes: Vec<u8>,
    pub(crate) mime_type: String,
    pub(crate) recompressed: bool,
}

pub(crate) fn needs_compression(len: usize, options: &CompressionOptions) -> bool {
    len as u64 > options.max_size_kb.saturating_mul(1024)
}

/// Downscales and re-encodes oversized images off the async executor.
pub(crate) async fn compress(
    bytes: Vec<u8>,
    mime_type: &str,
    options: CompressionOptions,
) -> Result<CompressedImage, CompressionError> {
    if !needs_compression(bytes.len(), &options) {
        metrics::counter!("image_compressions_total", "outcome" => "passthrough").increment(1);
        return Ok(CompressedImage {
            bytes,
            mime_type: mime_type.to_string(),
            recompressed: false,
        });
    }

    let mime_type = mime_type.to_string();
    let result = tokio::task::spawn_blocking(move || recompress(&bytes, &mime_type, &options))
        .await
        .map_err(|err| {
            tracing::error!(error = %err, "Image compression task panicked or was cancelled");
            CompressionError::Aborted
        })
        .and_then(|inner| inner);

    let outcome = match &result {
        Ok(_) => "recompressed",
        Err(err) => err.stage(),
    };
    metrics::counter!("image_compressions_total", "outcome" => outcome).increment(1);

    result
}

pub(crate) fn recompress(
    bytes: &[u8],
    mime_type: &str,
    options: &CompressionOptions,
) -> Result<CompressedImage, CompressionError> {
    let decoded = image::load_from_memory(bytes).map_err(CompressionError::Decode)?;
    let (source_width, source_height) = decoded.dimensions();
    let (width, height) = target_dimensions(source_width, source_height, options.max_dimension);

    let mut surface = allocate_surface(width, height)?;
    draw(&decoded, &mut surface);
    drop(decoded);

    let (format, output_mime) = output_format(mime_type);
    let encoded = encode(surface, format, options.quality)?;

    tracing::debug!(
        source_bytes = bytes.len(),
        output_bytes = encoded.len(),
        source_width,
        source_height,
        width,
        height,
        mime_type = output_mime,
        "Recompressed image"
    );

    Ok(CompressedImage { bytes: encoded, mime_type: output_mime.to_string(), recompressed: true })
}

/// Fits the larger side within `max_dimension`, keeping the aspect ratio.
/// Never upscales; fractional results are truncated.
pub(crate) fn target_dimensions(width: u32, height: u32, max_dimension: u32) -> (u32, u32) {
    if width <= max_dimension && height <= max_dimension {
        return (width, height);
    }

    let bound = f64::from(max_dimension);
    let (scaled_width, scaled_height) = if width > height {
        (bound, f64::from(height) / f64::from(width) * bound)
    } else {
        (f64::from(width) / f64::from(height) * bound, bound)
    };

    ((scaled_width as u32).max(1), (scaled_height as u32).max(1))
}

fn allocate_surface(width: u32, height: u32) -> Result<RgbaImage, CompressionError> {
    let surface_error = || CompressionError::Surface { width, height };

    let len = (width as usize)
        .checked_mul(height as usize)
        .and_then(|pixels| pixels.checked_mul(4))
        .filter(|len| *len > 0)
        .ok_or_else(surface_error)?;

    let mut raw = Vec::new();
    raw.try_reserve_exact(len).map_err(|_| surface_error())?;
    raw.resize(len, 0);

    RgbaImage::from_raw(width, height, raw).ok_or_else(surface_error)
}

fn draw(source: &DynamicImage, surface: &mut RgbaImage) {
    if source.dimensions() == surface.dimensions() {
        imageops::replace(surface, source, 0, 0);
    } else {
        let scaled =
            imageops::resize(source, surface.width(), surface.height(), FilterType::Triangle);
        imageops::replace(surface, &scaled, 0, 0);
    }
}

/// Formats without an encoder here fall back to PNG.
fn output_format(mime_type: &str) -> (ImageFormat, &'static str) {
    match mime_type.trim().to_ascii_lowercase().as_str() {
        "image/jpeg" | "image/jpg" => (ImageFormat::Jpeg, "image/jpeg"),
        "image/webp" => (ImageFormat::WebP, "image/webp"),
        "image/gif" => (ImageFormat::Gif, "image/gif"),
        _ => (ImageFormat::Png, "image/png"),
    }
}

fn encode(surface: RgbaImage, format: ImageFormat, quality: f32) -> Result<Vec<u8>, CompressionError> {
    let mut buffer = Vec::new();

    match format {
        ImageFormat::Jpeg => {
            // JPEG has no alpha channel.
            let rgb = DynamicImage::ImageRgba8(surface).to_rgb8();
            let mut encoder = JpegEncoder::new_with_quality(&mut buffer, jpeg_quality(quality));
            encoder.encode_image(&rgb).map_err(CompressionError::Encode)?;
        }
        other => {
            DynamicImage::ImageRgba8(surface)
                .write_to(&mut Cursor::new(&mut buffer), other)
                .map_err(CompressionError::Encode)?;
        }
    }

    Ok(buffer)
}

fn jpeg_quality(quality: f32) -> u8 {
    (quality * 100.0).round().clamp(1.0, 100.0) as u8
}
