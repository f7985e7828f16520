use std::path::Path;

use crate::core::{ChannelOrder, ColorImageView, GrayImage, GrayImageView};
use crate::tracker::{
    ConfigError, FrameCombinations, FrameReport, GlyphRecognizer, LabelDictionary,
    MarkerDetector, TrackerConfig, TrackerIoError, TrackerState,
};

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Errors produced by the high-level facade helpers.
#[derive(thiserror::Error, Debug)]
pub enum DetectError {
    #[error("invalid grayscale image buffer length (expected {expected} bytes, got {got})")]
    InvalidGrayBuffer { expected: usize, got: usize },

    #[error("invalid grayscale image dimensions (width={width}, height={height})")]
    InvalidGrayDimensions { width: u32, height: u32 },

    #[error(transparent)]
    Image(#[from] ::image::ImageError),

    #[error(transparent)]
    ConfigIo(#[from] TrackerIoError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Borrow an `image::GrayImage` as a core view.
pub fn gray_view(img: &::image::GrayImage) -> GrayImageView<'_> {
    GrayImageView {
        width: img.width() as usize,
        height: img.height() as usize,
        data: img.as_raw(),
    }
}

/// Borrow an `image::RgbImage` as a core color view.
pub fn rgb_view(img: &::image::RgbImage) -> ColorImageView<'_> {
    ColorImageView {
        width: img.width() as usize,
        height: img.height() as usize,
        order: ChannelOrder::Rgb,
        data: img.as_raw(),
    }
}

/// Validate a raw row-major 8-bit buffer and view it.
pub fn gray_view_from_raw(
    width: u32,
    height: u32,
    data: &[u8],
) -> Result<GrayImageView<'_>, DetectError> {
    if width == 0 || height == 0 {
        return Err(DetectError::InvalidGrayDimensions { width, height });
    }
    let expected = width as usize * height as usize;
    if data.len() != expected {
        return Err(DetectError::InvalidGrayBuffer {
            expected,
            got: data.len(),
        });
    }
    Ok(GrayImageView {
        width: width as usize,
        height: height as usize,
        data,
    })
}

/// Copy a core image into an `image::GrayImage`.
pub fn to_luma_image(img: &GrayImage) -> Result<::image::GrayImage, DetectError> {
    let (width, height) = (img.width as u32, img.height as u32);
    ::image::GrayImage::from_raw(width, height, img.data.clone()).ok_or(
        DetectError::InvalidGrayBuffer {
            expected: img.width * img.height,
            got: img.data.len(),
        },
    )
}

/// Load a tracker config and its dictionary; a relative `dictionary_path`
/// is resolved against the config's directory.
pub fn load_config(
    path: impl AsRef<Path>,
) -> Result<(TrackerConfig, LabelDictionary), DetectError> {
    let path = path.as_ref();
    let config = TrackerConfig::load_json(path)?;
    let base = path.parent().unwrap_or_else(|| Path::new("."));
    let dictionary = config.load_dictionary(base)?;
    Ok((config, dictionary))
}

/// Detect on any decoded image. Color input goes through the BT.601 luma
/// conversion of the core crate.
#[cfg_attr(
    feature = "tracing",
    instrument(level = "info", skip(detector, img), fields(width = img.width(), height = img.height()))
)]
pub fn detect_image<R: GlyphRecognizer>(
    detector: &MarkerDetector<R>,
    img: &::image::DynamicImage,
    threshold: u8,
) -> TrackerState {
    match img {
        ::image::DynamicImage::ImageLuma8(gray) => detector.detect(&gray_view(gray), threshold),
        other => {
            let rgb = other.to_rgb8();
            detector.detect_color(&rgb_view(&rgb), threshold)
        }
    }
}

/// Detection, combinations and (if `collect_debug` is set) diagnostics for
/// one image.
pub fn detect_report<R: GlyphRecognizer>(
    detector: &MarkerDetector<R>,
    img: &::image::DynamicImage,
    threshold: u8,
) -> FrameReport {
    let gray = match img {
        ::image::DynamicImage::ImageLuma8(gray) => gray_view(gray).to_owned_image(),
        other => rgb_view(&other.to_rgb8()).to_gray(),
    };
    let frame = detector.detect_frame(&gray.view(), threshold);
    let combinations = FrameCombinations::resolve(
        &frame.markers,
        detector.dictionary(),
        detector.estimator(),
        detector.params().marker_size_m,
    );
    let mut report = FrameReport::new(threshold, &frame.markers, combinations);
    report.debug = frame.debug;
    report
}
